mod args;
mod convert;

use clap::Parser;
use log::{debug, LevelFilter};

use crate::args::{Args, Command};
use crate::convert::config_reader::load_settings;
use crate::convert::*;

fn run(args: &Args) -> ConvertResult<()> {
    let settings = load_settings(args.config.as_deref())?;
    match &args.command {
        Command::Convert {
            election_name,
            precincts,
            export,
            output_base,
            reference,
            no_xlsx,
        } => run_convert(
            &settings,
            election_name,
            precincts,
            export,
            output_base,
            reference.as_deref(),
            !no_xlsx,
        ),
        Command::Inspect { precincts, export } => run_inspect(&settings, precincts, export),
        Command::MakeTestPrecincts { precincts } => run_make_test_precincts(&settings, precincts),
        Command::MakeTestExport { precincts, export } => {
            run_make_test_export(&settings, precincts, export)
        }
        Command::Audit {
            precincts,
            export,
            output_base,
        } => run_audit(&settings, precincts, export, output_base),
    }
}

fn main() {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
    debug!("args: {:?}", args);

    if let Err(e) = run(&args) {
        eprintln!("An error occured: {}", e);
        std::process::exit(1);
    }
}
