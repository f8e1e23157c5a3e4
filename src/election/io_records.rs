// Ballots exported from a ballot store: one JSON object per (voter, candidate).

use crate::election::*;

use serde::Deserialize;

#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
struct RecordRow {
    voter: String,
    candidate: String,
    rank: u64,
}

/// Reads the records and groups them per voter.
///
/// The candidates are listed in the order in which they first appear, including
/// the ones that only received "no opinion" records.
pub fn read_json_records(path: &str) -> TabResult<SourceData> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let rows: Vec<RecordRow> =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_json_records: {} records", rows.len());

    let mut candidates: Vec<String> = Vec::new();
    for r in rows.iter() {
        if !candidates.contains(&r.candidate) {
            candidates.push(r.candidate.clone());
        }
    }

    let records: Vec<BallotRecord> = rows
        .into_iter()
        .map(|r| BallotRecord {
            voter: r.voter,
            candidate: r.candidate,
            rank: r.rank,
        })
        .collect();
    let ballots = group_records(&records).context(VotingSnafu {})?;
    Ok(SourceData {
        candidates,
        ballots,
    })
}
