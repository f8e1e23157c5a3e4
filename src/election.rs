use log::{debug, info, warn};

use schulze_voting::*;
use snafu::prelude::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::election::config_reader::*;
use crate::election::io_common::{simplify_file_name, NO_OPINION_LABEL};

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod io_records;

#[derive(Debug, Snafu)]
pub enum TabError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet named {name} in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("No content found in {path}"))]
    EmptyTable { path: String },
    #[snafu(display("Line {lineno}: could not understand cell {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },
    #[snafu(display("Line {lineno}: the row is too short"))]
    ExcelRowTooShort { lineno: usize },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno}: the line is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Error writing CSV file {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Could not read a column index from {content}"))]
    ParsingJsonNumber { content: String },
    #[snafu(display("Could not find the directory of {path}"))]
    MissingParentDir { path: String },
    #[snafu(display("Either a configuration file or an input file must be provided"))]
    MissingInput {},
    #[snafu(display("No file source in the configuration"))]
    NoFileSources {},
    #[snafu(display("Provider not implemented: {provider}"))]
    UnknownProvider { provider: String },
    #[snafu(display(
        "Voter {voter}: could not understand rank {content:?} for candidate {candidate}"
    ))]
    InvalidRankCell {
        voter: String,
        candidate: String,
        content: String,
    },
    #[snafu(display("No candidate found"))]
    NoCandidates {},
    #[snafu(display("Voting error: {source}"))]
    Voting { source: VotingErrors },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},
}

pub type TabResult<T> = Result<T, TabError>;

/// A ballot, as parsed by the table readers.
/// This is before interpreting the content of the cells.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: String,
    /// (candidate, cell content), in column order.
    pub choices: Vec<(String, String)>,
}

/// The candidates and the ballots found in one file source.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SourceData {
    pub candidates: Vec<String>,
    pub ballots: Vec<Ballot>,
}

fn read_rank_cell(voter: &str, candidate: &str, content: &str, no_opinion_label: &str) -> TabResult<Rank> {
    if content.is_empty() || content == no_opinion_label {
        return Ok(Rank::NoOpinion);
    }
    content
        .parse::<u64>()
        .ok()
        .and_then(Rank::from_raw)
        .context(InvalidRankCellSnafu {
            voter,
            candidate,
            content,
        })
}

/// Turns the cells of the parsed ballots into ranks. Unranked candidates are dropped.
fn validate_ballots(parsed_ballots: &[ParsedBallot], no_opinion_label: &str) -> TabResult<Vec<Ballot>> {
    let mut res: Vec<Ballot> = Vec::new();
    for pb in parsed_ballots.iter() {
        let mut entries: Vec<(String, Rank)> = Vec::new();
        for (candidate, content) in pb.choices.iter() {
            match read_rank_cell(&pb.id, candidate, content.trim(), no_opinion_label)? {
                Rank::NoOpinion => {}
                r => entries.push((candidate.clone(), r)),
            }
        }
        debug!("Entries for ballot {:?}: {:?}", pb.id, entries);
        if entries.is_empty() {
            debug!("Ballot {:?} does not rank any candidate", pb.id);
        }
        res.push(Ballot {
            voter: pb.id.clone(),
            entries,
        });
    }
    Ok(res)
}

fn read_ranking_data(root_path: &Path, cfs: &FileSource) -> TabResult<SourceData> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read rank file {:?}", p2);
    let (candidates, parsed_ballots) = match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_columnar(&p2, cfs)?,
        "xlsx" => io_excel::read_excel_columnar(&p2, cfs)?,
        "records" => return io_records::read_json_records(&p2),
        x => {
            return UnknownProviderSnafu { provider: x }.fail();
        }
    };
    let ballots = validate_ballots(&parsed_ballots, &cfs.no_opinion_label())?;
    Ok(SourceData {
        candidates,
        ballots,
    })
}

fn ranking_to_json(res: &SchulzeResult) -> JSValue {
    let mut ranking: Vec<JSValue> = Vec::new();
    for (idx, group) in res.ranking.best_first().enumerate() {
        ranking.push(json!({
            "rank": idx + 1,
            "wins": group.wins,
            "candidates": group.candidates
        }));
    }

    let mut pairwise: Vec<JSValue> = Vec::new();
    for v in res.defeats.candidates() {
        let mut defeats: JSMap<String, JSValue> = JSMap::new();
        for w in res.defeats.candidates() {
            if v != w {
                defeats.insert(w.clone(), json!(res.defeats.get(v, w)));
            }
        }
        pairwise.push(json!({"candidate": v, "defeats": defeats}));
    }

    json!({
        "ranking": ranking,
        "winners": res.winners,
        "pairwise": pairwise,
        "summary": summary_lines(res)
    })
}

// One line per candidate, from the winners down. Each group is compared with the
// first candidate of the group above it.
fn summary_lines(res: &SchulzeResult) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut previous: Option<&RankGroup> = None;
    for (idx, group) in res.ranking.best_first().enumerate() {
        let pos = idx + 1;
        match previous.and_then(|g| g.candidates.first()) {
            None => match group.candidates.as_slice() {
                [single] => lines.push(format!("{} {} is the schulze winner", pos, single)),
                all => lines.push(format!("{} {} are tied winners", pos, all.join(", "))),
            },
            Some(leader) => {
                for c in group.candidates.iter() {
                    lines.push(format!(
                        "{} {} loses to {} by {}-{}",
                        pos,
                        c,
                        leader,
                        res.defeats.get(leader, c),
                        res.defeats.get(c, leader)
                    ));
                }
            }
        }
        previous = Some(group);
    }
    lines
}

fn build_summary_js(config: &ElectionConfig, rules: &ElectionRules, res: &SchulzeResult) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.contest_jurisdiction.clone(),
        office: config.output_settings.contest_office.clone(),
        number_of_winners: rules.number_of_winners,
    };
    json!({
        "config": c,
        "results": ranking_to_json(res)
    })
}

fn write_summary(
    pretty_js_stats: &str,
    out: &Option<String>,
    config: &ElectionConfig,
    root_path: &Path,
) -> TabResult<()> {
    let out_path: Option<String> = match (out, &config.output_settings.output_directory) {
        (Some(x), _) if x == "stdout" => None,
        (Some(x), _) => Some(x.clone()),
        (None, Some(dir)) => Some(
            root_path
                .join(dir)
                .join("summary.json")
                .display()
                .to_string(),
        ),
        (None, None) => None,
    };
    match out_path {
        Some(path) => {
            info!("Writing summary to {:?}", path);
            fs::write(&path, pretty_js_stats).context(WritingOutputSnafu { path })
        }
        None => {
            println!("{}", pretty_js_stats);
            Ok(())
        }
    }
}

/// Applies the command line options on top of the configuration file, if any.
fn load_config(args: &Args) -> TabResult<(ElectionConfig, PathBuf)> {
    let (mut config, root_path) = match (&args.config, &args.input) {
        (Some(config_path), _) => {
            let config = read_config(config_path)?;
            let root_p = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu { path: config_path })?;
            (config, root_p.to_path_buf())
        }
        (None, Some(input)) => {
            let provider = args.input_type.clone().unwrap_or_else(|| "csv".to_string());
            (ElectionConfig::for_input(input, &provider), PathBuf::new())
        }
        (None, None) => return MissingInputSnafu {}.fail(),
    };

    if args.config.is_some() {
        if let Some(input) = &args.input {
            // Keep the settings of the first configured source.
            let mut cfs = config
                .cvr_file_sources
                .first()
                .cloned()
                .unwrap_or_else(|| FileSource::new(input, "csv"));
            cfs.file_path = input.clone();
            config.cvr_file_sources = vec![cfs];
        }
    }
    for cfs in config.cvr_file_sources.iter_mut() {
        if let Some(input_type) = &args.input_type {
            cfs.provider = input_type.clone();
        }
        if let Some(ws) = &args.excel_worksheet_name {
            cfs.excel_worksheet_name = Some(ws.clone());
        }
    }
    if let Some(n) = args.winners {
        config.rules.number_of_winners = Some(n);
    }
    Ok((config, root_path))
}

pub fn run_election(args: &Args) -> TabResult<()> {
    let (config, root_path) = load_config(args)?;
    info!("config: {:?}", config);
    ensure!(!config.cvr_file_sources.is_empty(), NoFileSourcesSnafu {});

    let rules = config.rules.to_rules();

    // Declared candidates come first. Otherwise, they are read from the sources.
    let mut candidates: Vec<String> = config.candidates.iter().map(|c| c.name.clone()).collect();
    let infer_candidates = candidates.is_empty();
    let mut ballots: Vec<Ballot> = Vec::new();
    for cfs in config.cvr_file_sources.iter() {
        let data = read_ranking_data(&root_path, cfs)?;
        if infer_candidates {
            for c in data.candidates {
                if !candidates.contains(&c) {
                    candidates.push(c);
                }
            }
        }
        ballots.extend(data.ballots);
    }
    ensure!(!candidates.is_empty(), NoCandidatesSnafu {});
    info!("Read {} ballots for candidates {:?}", ballots.len(), candidates);

    if let Some(export_path) = &args.export_ballots {
        let label = config
            .cvr_file_sources
            .first()
            .map(|cfs| cfs.no_opinion_label())
            .unwrap_or_else(|| NO_OPINION_LABEL.to_string());
        io_csv::write_csv_ballots(export_path, &candidates, &ballots, &label)?;
    }

    let result = run_schulze(&candidates, &ballots, &rules).context(VotingSnafu {})?;
    debug!("result: {:?}", result);

    // Assemble the final json
    let result_js = build_summary_js(&config, &rules, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_summary(&pretty_js_stats, &args.out, &config, &root_path)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return ReferenceMismatchSnafu {}.fail();
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) fn test_data_path(name: &str) -> String {
    format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
}
