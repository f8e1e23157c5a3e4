use crate::election::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    #[serde(rename = "numberOfWinners")]
    pub number_of_winners: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
    #[serde(rename = "noOpinionLabel")]
    pub no_opinion_label: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl FileSource {
    pub fn new(file_path: &str, provider: &str) -> FileSource {
        FileSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            id_column_index: None,
            no_opinion_label: None,
            excel_worksheet_name: None,
        }
    }

    /// The position of the column holding voter identifiers, starting at 0.
    pub fn id_column_index_int(&self) -> TabResult<Option<usize>> {
        match &self.id_column_index {
            Some(js) => read_js_int(js).map(|x| Some(x - 1)),
            None => Ok(None),
        }
    }

    pub fn no_opinion_label(&self) -> String {
        self.no_opinion_label
            .clone()
            .unwrap_or_else(|| NO_OPINION_LABEL.to_string())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionCandidate {
    pub name: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElectionRulesConfig {
    #[serde(rename = "numberOfWinners")]
    pub number_of_winners: Option<u32>,
    #[serde(rename = "rejectUnknownCandidates")]
    pub reject_unknown_candidates: Option<bool>,
}

impl ElectionRulesConfig {
    pub fn to_rules(&self) -> ElectionRules {
        ElectionRules {
            number_of_winners: self
                .number_of_winners
                .unwrap_or(ElectionRules::DEFAULT_RULES.number_of_winners),
            unknown_candidate_policy: match self.reject_unknown_candidates {
                Some(true) => UnknownCandidatePolicy::Reject,
                _ => UnknownCandidatePolicy::Ignore,
            },
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "cvrFileSources")]
    pub cvr_file_sources: Vec<FileSource>,
    #[serde(default)]
    pub candidates: Vec<ElectionCandidate>,
    #[serde(default)]
    pub rules: ElectionRulesConfig,
}

impl ElectionConfig {
    /// The configuration used when only an input file is given.
    pub fn for_input(file_path: &str, provider: &str) -> ElectionConfig {
        ElectionConfig {
            output_settings: OutputSettings {
                contest_name: simplify_file_name(file_path),
                output_directory: None,
                contest_date: None,
                contest_jurisdiction: None,
                contest_office: None,
            },
            cvr_file_sources: vec![FileSource::new(file_path, provider)],
            candidates: Vec::new(),
            rules: ElectionRulesConfig::default(),
        }
    }
}

pub fn read_config(path: &str) -> TabResult<ElectionConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ElectionConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> TabResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

// Column indexes start at 1, either as numbers or as Excel-style letters.
fn read_js_int(x: &JSValue) -> TabResult<usize> {
    let res = match x {
        JSValue::Number(n) => n.as_u64().map(|x| x as usize),
        JSValue::String(s) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            // None when the column name does not fit in a usize.
            s.to_ascii_uppercase().chars().try_fold(0usize, |acc, c| {
                acc.checked_mul(26)?
                    .checked_add(c as usize - 'A' as usize + 1)
            })
        }
        JSValue::String(s) => s.parse::<usize>().ok(),
        _ => None,
    };
    match res {
        Some(idx) if idx >= 1 => Ok(idx),
        _ => ParsingJsonNumberSnafu {
            content: x.to_string(),
        }
        .fail(),
    }
}
