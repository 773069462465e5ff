use clap::{Parser, Subcommand};

/// Converts the vote exports of the WinEDS Reporting Tool into summary reports.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. It can change the column widths of
    /// the export file, the name of the city-wide rows and the precincts used by the
    /// test and audit commands.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Writes the TSV and Excel summary reports of an election.
    Convert {
        /// The name of the election, written at the top of the reports.
        #[clap(value_parser)]
        election_name: String,
        /// (file path) The precinct index (CSV).
        #[clap(value_parser)]
        precincts: String,
        /// (file path) The export of the WinEDS Reporting Tool.
        #[clap(value_parser)]
        export: String,
        /// (file path without extension) The reports are written to OUTPUT_BASE.tsv and
        /// OUTPUT_BASE.xlsx.
        #[clap(value_parser)]
        output_base: String,
        /// (file path) A reference TSV report. If provided, the command checks that the
        /// TSV report matches the reference (except for the generation time).
        #[clap(short, long, value_parser)]
        reference: Option<String>,
        /// Only writes the TSV report.
        #[clap(long, takes_value = false)]
        no_xlsx: bool,
    },
    /// Checks the input files and prints a JSON summary of the contests and choices.
    Inspect {
        #[clap(value_parser)]
        precincts: String,
        #[clap(value_parser)]
        export: String,
    },
    /// Prints a reduced precinct index that still covers every district and neighborhood.
    MakeTestPrecincts {
        #[clap(value_parser)]
        precincts: String,
    },
    /// Prints the lines of the export file for the precincts of the given index and the
    /// test contests.
    MakeTestExport {
        #[clap(value_parser)]
        precincts: String,
        #[clap(value_parser)]
        export: String,
    },
    /// Writes the input lines of the audit precincts to OUTPUT_BASE-precincts.csv and
    /// OUTPUT_BASE-export.txt.
    Audit {
        #[clap(value_parser)]
        precincts: String,
        #[clap(value_parser)]
        export: String,
        #[clap(value_parser)]
        output_base: String,
    },
}
