// Primitives for reading and writing CSV files.

use std::collections::HashMap;

use crate::election::{
    io_common::{candidate_columns, make_default_id},
    *,
};

/// Reads a table with one column per candidate and one row per voter.
///
/// Returns the candidates found in the header, and the ballots with the raw content
/// of their cells.
pub fn read_csv_columnar(
    path: &str,
    cfs: &FileSource,
) -> TabResult<(Vec<String>, Vec<ParsedBallot>)> {
    let default_id = make_default_id(path);
    let id_idx_o = cfs.id_column_index_int()?;

    let mut records = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path })?
        .into_records();

    let header: Vec<String> = match records.next() {
        Some(line_r) => line_r
            .context(CsvLineParseSnafu { lineno: 1usize })?
            .iter()
            .map(|s| s.to_string())
            .collect(),
        None => return EmptyTableSnafu { path }.fail(),
    };
    let columns = candidate_columns(&header, id_idx_o);
    debug!("read_csv_columnar: columns: {:?}", columns);

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let id = if let Some(id_idx) = id_idx_o {
            line.get(id_idx)
                .context(CsvLineTooShortSnafu { lineno })?
                .to_string()
        } else {
            default_id(lineno)
        };

        // Missing trailing cells are not ranked.
        let choices: Vec<(String, String)> = columns
            .iter()
            .map(|(col, name)| (name.clone(), line.get(*col).unwrap_or("").to_string()))
            .collect();
        debug!("read_csv_columnar: lineno: {:?} row: {:?}", lineno, &choices);

        res.push(ParsedBallot { id, choices });
    }
    Ok((
        columns.into_iter().map(|(_, name)| name).collect(),
        res,
    ))
}

/// Writes the ballots as a table with one column per candidate.
///
/// Voter identifiers are not written out.
pub fn write_csv_ballots(
    path: &str,
    candidates: &[String],
    ballots: &[Ballot],
    no_opinion_label: &str,
) -> TabResult<()> {
    let mut wtr = csv::Writer::from_path(path).context(CsvWriteSnafu { path })?;
    wtr.write_record(candidates)
        .context(CsvWriteSnafu { path })?;
    for b in ballots.iter() {
        let mut ranks: HashMap<&str, u32> = HashMap::new();
        for (c, r) in b.entries.iter() {
            if let Rank::Ranked(x) = r {
                ranks.entry(c.as_str()).or_insert(*x);
            }
        }
        let row: Vec<String> = candidates
            .iter()
            .map(|c| match ranks.get(c.as_str()) {
                Some(x) => x.to_string(),
                None => no_opinion_label.to_string(),
            })
            .collect();
        wtr.write_record(&row).context(CsvWriteSnafu { path })?;
    }
    wtr.flush().context(WritingOutputSnafu { path })?;
    info!("Wrote {} ballots to {}", ballots.len(), path);
    Ok(())
}
