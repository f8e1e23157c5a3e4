use clap::Parser;

/// This is a tabulation program for elections decided with the Schulze method.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the election configuration in JSON.
    /// For more information about the file format, read the manual of the schulze_voting crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the outcome of an election in JSON format. If provided, schulzerank will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The file containing the ballots. Setting this option overrides the file sources
    /// that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv, xlsx or records.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (number, optional) The number of seats to fill. Tied candidates at the cutoff are all selected.
    #[clap(short, long, value_parser)]
    pub winners: Option<u32>,

    /// (file path, optional) If specified, the ballots will be written to this location as a CSV
    /// file with one column per candidate.
    #[clap(long, value_parser)]
    pub export_ballots: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use. The first worksheet is used by default.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
