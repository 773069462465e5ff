// Loading of the precinct index (CSV).
//
// Columns:
// VotingPrecinctID,VotingPrecinctName,MailBallotPrecinct,BalType,Assembly,
// BART,Congressional,Neighborhood,Senatorial,Supervisorial

use log::{info, warn};
use snafu::{ensure, OptionExt, ResultExt};

use std::fs::File;
use std::io::Read;
use std::time::Instant;

use crate::error::*;
use crate::model::*;

const ID_COLUMN: usize = 0;
const NAME_COLUMN: usize = 1;
const NEIGHBORHOOD_COLUMN: usize = 7;
const MIN_COLUMNS: usize = 10;

// The index columns of the district types, same order as DistrictType::INDEX_COLUMNS.
const DISTRICT_COLUMNS: [usize; 5] = [4, 5, 6, 8, 9];

/// Reads the precinct index at the given path.
pub fn read_precinct_index(path: &str) -> WinedsResult<PrecinctIndex> {
    info!("opening: {}", path);
    let f = File::open(path).context(OpeningFileSnafu { path })?;
    read_precinct_index_from(f, path)
}

/// Reads a precinct index from any reader. `path` is only used in messages.
pub fn read_precinct_index_from<R: Read>(reader: R, path: &str) -> WinedsResult<PrecinctIndex> {
    let started = Instant::now();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .quoting(false)
        .flexible(true)
        .from_reader(reader);

    let mut index = PrecinctIndex::default();
    let mut count = 0;
    for record_r in rdr.records() {
        let record = record_r.context(ReadingCsvSnafu { path })?;
        let lineno = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or_default();
        let fields: Vec<&str> = record.iter().collect();
        let line_context = || LineSnafu {
            path,
            lineno,
            line: fields.join(","),
        };
        let precinct_id =
            parse_column(fields[ID_COLUMN], "VotingPrecinctID").context(line_context())?;
        count += 1;
        // A repeated id is not checked further: only its first row counts.
        if index.precinct_names.contains_key(&precinct_id) {
            warn!(
                "{}: line {}: precinct {} already listed, keeping the first occurrence: {:?}",
                path,
                lineno,
                precinct_id,
                fields.join(",")
            );
            continue;
        }
        let row = parse_row(precinct_id, &fields).context(line_context())?;
        index.add_precinct(row.precinct_id, &row.name, &row.districts, &row.neighborhood);
    }
    info!(
        "parsed: {} precinct rows from {} ({} precincts) in {:.3} seconds",
        count,
        path,
        index.all_precinct_ids.len(),
        started.elapsed().as_secs_f64()
    );
    Ok(index)
}

/// The precinct id in the first column of an index row.
pub fn precinct_id_of_row(line: &str) -> LineResult<PrecinctId> {
    let text = line.split(',').next().unwrap_or_default();
    parse_column(text, "VotingPrecinctID")
}

struct PrecinctRow {
    precinct_id: PrecinctId,
    name: String,
    districts: Vec<(DistrictType, u32)>,
    neighborhood: String,
}

fn parse_row(precinct_id: PrecinctId, fields: &[&str]) -> LineResult<PrecinctRow> {
    ensure!(
        fields.len() >= MIN_COLUMNS,
        PrecinctRowTooShortSnafu {
            count: fields.len(),
            expected: MIN_COLUMNS,
        }
    );
    let mut districts = Vec::with_capacity(DISTRICT_COLUMNS.len());
    for (district_type, col) in DistrictType::INDEX_COLUMNS.iter().zip(DISTRICT_COLUMNS) {
        let district = parse_column(fields[col], district_type.header())?;
        districts.push((*district_type, district));
    }
    Ok(PrecinctRow {
        precinct_id,
        name: fields[NAME_COLUMN].trim().to_string(),
        districts,
        neighborhood: fields[NEIGHBORHOOD_COLUMN].trim().to_string(),
    })
}

fn parse_column(text: &str, column: &'static str) -> LineResult<u32> {
    text.trim()
        .parse::<u32>()
        .ok()
        .context(PrecinctRowNotNumericSnafu { column, text })
}
