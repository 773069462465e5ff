// Reduced copies of the input files, for the test fixtures and the audits.

use log::{info, warn};
use snafu::ResultExt;

use std::collections::BTreeSet;
use std::io::{BufRead, Write};

use crate::decoder::{DataChunk, LineLayout};
use crate::error::*;
use crate::lines::NumberedLines;
use crate::model::*;
use crate::precincts::precinct_id_of_row;

/// Copies the header and the rows of the given precincts of a precinct
/// index. Returns the number of rows kept.
pub fn filter_precinct_index<R: BufRead, W: Write>(
    lines: NumberedLines<R>,
    writer: &mut W,
    keep: &BTreeSet<PrecinctId>,
) -> WinedsResult<usize> {
    let path = lines.path().to_string();
    let mut kept = 0;
    for line_r in lines {
        let (lineno, line) = line_r?;
        if line.trim().is_empty() {
            continue;
        }
        if lineno > 1 {
            let precinct_id = precinct_id_of_row(&line).context(LineSnafu {
                path: path.as_str(),
                lineno,
                line: line.as_str(),
            })?;
            if !keep.contains(&precinct_id) {
                continue;
            }
            kept += 1;
        }
        writeln!(writer, "{}", line).context(WritingFileSnafu {})?;
    }
    info!("kept {} precinct rows from {}", kept, path);
    Ok(kept)
}

/// Copies the export lines of the given precincts, and of the given
/// contests when some are given. Returns the number of lines kept.
pub fn filter_export<R: BufRead, W: Write>(
    lines: NumberedLines<R>,
    writer: &mut W,
    layout: &LineLayout,
    precincts: &BTreeSet<PrecinctId>,
    contests: Option<&BTreeSet<u32>>,
) -> WinedsResult<usize> {
    let path = lines.path().to_string();
    let mut kept = 0;
    for line_r in lines {
        let (lineno, line) = line_r?;
        if line.trim().is_empty() {
            continue;
        }
        let chunk = layout.split(&line).chunk().context(LineSnafu {
            path: path.as_str(),
            lineno,
            line: line.as_str(),
        })?;
        if !precincts.contains(&chunk.precinct_id) {
            continue;
        }
        if let Some(contests) = contests {
            if !contests.contains(&chunk.contest_number) {
                continue;
            }
        }
        if chunk.vote_total < 0 {
            warn_negative(&path, lineno, &chunk, &line);
        }
        writeln!(writer, "{}", line).context(WritingFileSnafu {})?;
        kept += 1;
    }
    info!("kept {} lines from {}", kept, path);
    Ok(kept)
}

fn warn_negative(path: &str, lineno: usize, chunk: &DataChunk, line: &str) {
    warn!(
        "{}: line {}: negative ballot total {}: choice_id={}, contest_id={}, precinct_id={}: {:?}",
        path, lineno, chunk.vote_total, chunk.choice_id, chunk.contest_number, chunk.precinct_id, line
    );
}

/// Selects a small set of precincts that still covers every district and
/// neighborhood: the lowest precinct id of each area, plus the extra ids.
pub fn sample_precincts(index: &PrecinctIndex, extra: &[PrecinctId]) -> BTreeSet<PrecinctId> {
    let mut selected: BTreeSet<PrecinctId> = BTreeSet::new();
    let areas = index
        .districts
        .values()
        .flat_map(|by_district| by_district.values())
        .chain(index.neighborhoods.values());
    for precinct_ids in areas {
        if let Some(first) = precinct_ids.iter().next() {
            selected.insert(*first);
        }
    }
    for precinct_id in extra.iter() {
        if index.all_precinct_ids.contains(precinct_id) {
            selected.insert(*precinct_id);
        } else {
            warn!("extra test precinct {} is not in the precinct index", precinct_id);
        }
    }
    info!(
        "selected {} precincts out of {}",
        selected.len(),
        index.all_precinct_ids.len()
    );
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{line, INDEX_HEADER};
    use std::io::Cursor;

    fn run_index_filter(input: &str, keep: &[PrecinctId]) -> WinedsResult<String> {
        let keep: BTreeSet<PrecinctId> = keep.iter().cloned().collect();
        let mut out: Vec<u8> = Vec::new();
        filter_precinct_index(NumberedLines::new(Cursor::new(input), "p.csv"), &mut out, &keep)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn index_filter_keeps_header() {
        let input = format!(
            "{}\r\n1101,Pct 1101,N,,17,8,12,SOMA,11,6\r\n1102,Pct 1102,N,,17,8,12,SOMA,11,6\r\n",
            INDEX_HEADER
        );
        let out = run_index_filter(&input, &[1102]).unwrap();
        assert_eq!(
            out,
            format!("{}\n1102,Pct 1102,N,,17,8,12,SOMA,11,6\n", INDEX_HEADER)
        );
        assert!(matches!(
            run_index_filter(&format!("{}\nabc,x\n", INDEX_HEADER), &[1102]),
            Err(WinedsError::Line { lineno: 2, .. })
        ));
    }

    #[test]
    fn export_filter() {
        let lines = vec![
            line("0001001110100484", "REGISTERED VOTERS - TOTAL", "VOTERS", "Pct 1101", ""),
            line("0001001110200484", "REGISTERED VOTERS - TOTAL", "VOTERS", "Pct 1102", ""),
            line("0100001110100010", "Mayor", "ALICE", "Pct 1101", "CITY/COUNTY"),
            line("0120001110100-01", "Measure A", "YES", "Pct 1101", "CITY/COUNTY"),
            line("01200011101000-1", "Measure A", "YES", "Pct 1101", "CITY/COUNTY"),
        ];
        let input = lines.join("\n");
        let precincts: BTreeSet<PrecinctId> = [1101].into_iter().collect();
        let contests: BTreeSet<u32> = [1, 120].into_iter().collect();

        // The fourth line has a malformed vote total.
        let mut out: Vec<u8> = Vec::new();
        let err = filter_export(
            NumberedLines::new(Cursor::new(input.clone()), "e.txt"),
            &mut out,
            &LineLayout::DEFAULT_LAYOUT,
            &precincts,
            Some(&contests),
        )
        .unwrap_err();
        assert!(matches!(err, WinedsError::Line { lineno: 4, .. }));

        let input = [&lines[..3], &lines[4..]].concat().join("\n");
        let mut out: Vec<u8> = Vec::new();
        let kept = filter_export(
            NumberedLines::new(Cursor::new(input), "e.txt"),
            &mut out,
            &LineLayout::DEFAULT_LAYOUT,
            &precincts,
            Some(&contests),
        )
        .unwrap();
        assert_eq!(kept, 2);
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, format!("{}\n{}\n", lines[0], lines[4]));
    }

    #[test]
    fn sample_covers_every_area() {
        let mut index = PrecinctIndex::default();
        let d = |assembly| vec![(DistrictType::Assembly, assembly), (DistrictType::Bart, 8)];
        index.add_precinct(1101, "a", &d(17), "SOMA");
        index.add_precinct(1102, "b", &d(17), "MISSION");
        index.add_precinct(1103, "c", &d(19), "SOMA");
        index.add_precinct(1104, "d", &d(19), "SOMA");
        index.add_precinct(1105, "e", &d(19), "SOMA");
        let selected = sample_precincts(&index, &[1105, 9999]);
        assert_eq!(
            selected.into_iter().collect::<Vec<_>>(),
            vec![1101, 1102, 1103, 1105]
        );
    }
}
