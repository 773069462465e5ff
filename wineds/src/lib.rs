mod aggregate;
mod decoder;
mod error;
mod filter;
mod lines;
mod metadata;
mod model;
mod precincts;
mod report;
#[cfg(test)]
mod testing;

pub mod manual;

use log::info;

use std::time::Instant;

pub use crate::aggregate::*;
pub use crate::decoder::*;
pub use crate::error::*;
pub use crate::filter::*;
pub use crate::lines::*;
pub use crate::metadata::*;
pub use crate::model::*;
pub use crate::precincts::*;
pub use crate::report::*;

/// The three aggregates read from the input files.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionData {
    pub index: PrecinctIndex,
    pub meta: ElectionMeta,
    pub results: ResultsTree,
}

impl ElectionData {
    /// Builds the report over this data.
    pub fn report(&self, title: &str, generated_on: &str, city_name: &str) -> ElectionReport {
        ReportBuilder::new(&self.index, &self.meta, &self.results)
            .city_name(city_name)
            .build(title, generated_on)
    }
}

/// Reads the precinct index and the export file.
///
/// Arguments:
/// * `precinct_index_path` the CSV file mapping the precincts to their districts
/// * `export_path` the export of the WinEDS Reporting Tool. It is read twice,
/// once for the metadata and once for the totals.
/// * `layout` the column widths of the export lines
pub fn digest_input_files(
    precinct_index_path: &str,
    export_path: &str,
    layout: LineLayout,
) -> WinedsResult<ElectionData> {
    let started = Instant::now();
    let index = read_precinct_index(precinct_index_path)?;

    info!("pass 1: parsing the election metadata: {}", export_path);
    let meta = build_election_meta(export_path, layout)?;
    check_precincts(&index, &meta, export_path)?;

    info!("pass 2: parsing the vote totals: {}", export_path);
    let results = aggregate_results(export_path, &meta, layout)?;

    info!(
        "read the input files in {:.3} seconds",
        started.elapsed().as_secs_f64()
    );
    Ok(ElectionData {
        index,
        meta,
        results,
    })
}
