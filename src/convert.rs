use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::time::Instant;

use chrono::Local;
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;
use wineds::*;

use crate::convert::config_reader::Settings;
use crate::convert::io_common::{output_path, simplify_file_name, strip_volatile_lines};
use crate::convert::io_tsv::{format_generated_on, write_tsv, GENERATED_ON_PREFIX};
use crate::convert::io_xlsx::write_xlsx;

pub mod config_reader;
mod io_common;
mod io_tsv;
mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum ConvertError {
    #[snafu(display("{source}"))]
    ReadingInputs { source: WinedsError },
    #[snafu(display("error reading configuration file {path}: {source}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("error parsing configuration file {path}: {source}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("layout width {field} must be at least {minimum}, but it was {width}"))]
    InvalidLayout {
        field: String,
        width: usize,
        minimum: usize,
    },
    #[snafu(display("error writing {path}: {source}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("error writing Excel file {path}: {source}"))]
    WritingXlsx {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },
    #[snafu(display("error reading reference report {path}: {source}"))]
    OpeningReference {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("no audit precincts: set auditPrecincts in the configuration file"))]
    NoAuditPrecincts {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ConvertResult<T> = Result<T, ConvertError>;

/// Reads the input files and writes the TSV report and (optionally) the
/// Excel report next to each other.
///
/// When a reference report is given, the TSV report must match it, except
/// for the generation time.
pub fn run_convert(
    settings: &Settings,
    election_name: &str,
    precincts_path: &str,
    export_path: &str,
    output_base: &str,
    reference_path: Option<&str>,
    write_excel: bool,
) -> ConvertResult<()> {
    let data = digest_input_files(precincts_path, export_path, settings.layout)
        .context(ReadingInputsSnafu {})?;

    let generated_on = format_generated_on(&Local::now());
    let report = data.report(election_name, &generated_on, &settings.city_name);
    info!(
        "report {:?}: {} contests from {}",
        election_name,
        report.contests.len(),
        simplify_file_name(export_path)
    );

    let tsv_path = output_path(output_base, ".tsv");
    let tsv = write_tsv(&report, &tsv_path)?;
    if write_excel {
        write_xlsx(&report, &output_path(output_base, ".xlsx"))?;
    }

    if let Some(reference_path) = reference_path {
        check_reference(&tsv, reference_path)?;
    }
    Ok(())
}

/// Compares a TSV report with a reference report. The lines with the
/// generation time are not compared.
pub fn check_reference(tsv: &str, reference_path: &str) -> ConvertResult<()> {
    let reference =
        fs::read_to_string(reference_path).context(OpeningReferenceSnafu { path: reference_path })?;
    let expected = strip_volatile_lines(&reference, GENERATED_ON_PREFIX);
    let computed = strip_volatile_lines(tsv, GENERATED_ON_PREFIX);
    if expected != computed {
        warn!("Found differences with the reference report {}", reference_path);
        print_diff(expected.as_str(), computed.as_str(), "\n");
        whatever!("Difference detected between calculated report and reference report")
    }
    info!("report matches the reference {}", reference_path);
    Ok(())
}

/// Runs the first pass and the cross-file check, and prints a summary of
/// what was found.
pub fn run_inspect(settings: &Settings, precincts_path: &str, export_path: &str) -> ConvertResult<()> {
    let index = read_precinct_index(precincts_path).context(ReadingInputsSnafu {})?;
    let meta = build_election_meta(export_path, settings.layout).context(ReadingInputsSnafu {})?;
    check_precincts(&index, &meta, export_path).context(ReadingInputsSnafu {})?;
    let js = inspect_json(&meta);
    let pretty = serde_json::to_string_pretty(&js).whatever_context("error formatting the summary")?;
    println!("{}", pretty);
    Ok(())
}

pub fn inspect_json(meta: &ElectionMeta) -> JSValue {
    let contests: Vec<JSValue> = meta
        .contests
        .values()
        .map(|c| {
            let choices: Vec<&str> = c
                .choice_ids
                .iter()
                .filter_map(|cid| meta.choice_name(*cid))
                .collect();
            json!({
                "number": c.id.number,
                "name": c.id.name,
                "displayName": c.display_name,
                "district": c.district_name,
                "party": c.party_code,
                "precincts": c.precinct_ids.len(),
                "choices": choices,
            })
        })
        .collect();

    let mut choices: JSMap<String, JSValue> = JSMap::new();
    for (choice_id, choice) in meta.choices.iter() {
        let contest = choice.contest.as_ref().map(|c| c.number);
        choices.insert(
            choice_id.to_string(),
            json!({"name": choice.name, "contest": contest}),
        );
    }
    let mut parties: JSMap<String, JSValue> = JSMap::new();
    for (choice_id, party) in meta.parties.iter() {
        parties.insert(
            choice_id.to_string(),
            json!({"code": party.code, "name": party.name}),
        );
    }

    json!({
        "format": if meta.has_reporting_type { "complete" } else { "simple" },
        "precincts": meta.precinct_names.len(),
        "contests": contests,
        "choices": choices,
        "parties": parties,
        "undervoteId": meta.undervote_id,
        "overvoteId": meta.overvote_id,
    })
}

/// Writes the rows of a small set of precincts that still covers every
/// district and neighborhood.
pub fn make_test_precincts<W: Write>(
    settings: &Settings,
    precincts_path: &str,
    writer: &mut W,
) -> ConvertResult<()> {
    let index = read_precinct_index(precincts_path).context(ReadingInputsSnafu {})?;
    let keep = sample_precincts(&index, &settings.test_precincts);
    debug!("test precincts: {:?}", keep);
    let lines = open_lines(precincts_path).context(ReadingInputsSnafu {})?;
    filter_precinct_index(lines, writer, &keep).context(ReadingInputsSnafu {})?;
    Ok(())
}

/// Writes the export lines of the precincts of the given index, for the
/// test contests only.
pub fn make_test_export<W: Write>(
    settings: &Settings,
    precincts_path: &str,
    export_path: &str,
    writer: &mut W,
) -> ConvertResult<()> {
    let index = read_precinct_index(precincts_path).context(ReadingInputsSnafu {})?;
    let lines = open_lines(export_path).context(ReadingInputsSnafu {})?;
    filter_export(
        lines,
        writer,
        &settings.layout,
        &index.all_precinct_ids,
        Some(&settings.test_contests),
    )
    .context(ReadingInputsSnafu {})?;
    Ok(())
}

pub fn run_make_test_precincts(settings: &Settings, precincts_path: &str) -> ConvertResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    make_test_precincts(settings, precincts_path, &mut out)
}

pub fn run_make_test_export(
    settings: &Settings,
    precincts_path: &str,
    export_path: &str,
) -> ConvertResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    make_test_export(settings, precincts_path, export_path, &mut out)
}

/// Copies the input lines of the audit precincts, for all the contests.
pub fn run_audit(
    settings: &Settings,
    precincts_path: &str,
    export_path: &str,
    output_base: &str,
) -> ConvertResult<()> {
    ensure!(!settings.audit_precincts.is_empty(), NoAuditPrecinctsSnafu {});
    let keep = &settings.audit_precincts;

    let path = output_path(output_base, "-precincts.csv");
    let mut writer = create_output(&path)?;
    let lines = open_lines(precincts_path).context(ReadingInputsSnafu {})?;
    let kept = filter_precinct_index(lines, &mut writer, keep).context(ReadingInputsSnafu {})?;
    writer.flush().context(WritingOutputSnafu { path: path.as_str() })?;
    if kept < keep.len() {
        warn!(
            "only {} of the {} audit precincts are in {}",
            kept,
            keep.len(),
            precincts_path
        );
    }

    let path = output_path(output_base, "-export.txt");
    let mut writer = create_output(&path)?;
    let lines = open_lines(export_path).context(ReadingInputsSnafu {})?;
    filter_export(lines, &mut writer, &settings.layout, keep, None).context(ReadingInputsSnafu {})?;
    writer.flush().context(WritingOutputSnafu { path: path.as_str() })?;
    Ok(())
}

fn create_output(path: &str) -> ConvertResult<BufWriter<File>> {
    let file = File::create(path).context(WritingOutputSnafu { path })?;
    Ok(BufWriter::new(file))
}
