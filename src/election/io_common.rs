use std::path::Path;

/// The label used in tables for candidates that a voter did not rank.
pub const NO_OPINION_LABEL: &str = "No opinion";

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// The columns holding candidates: every column of the header except the id column.
pub fn candidate_columns(header: &[String], id_idx: Option<usize>) -> Vec<(usize, String)> {
    header
        .iter()
        .enumerate()
        .filter(|(idx, name)| Some(*idx) != id_idx && !name.is_empty())
        .map(|(idx, name)| (idx, name.clone()))
        .collect()
}
