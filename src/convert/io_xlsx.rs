// The spreadsheet report: one worksheet per contest.

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

use std::collections::HashSet;

use crate::convert::*;

const MAX_SHEET_NAME_LEN: usize = 31;
const INVALID_SHEET_NAME_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Makes a name acceptable as a worksheet name.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if INVALID_SHEET_NAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    let truncated: String = cleaned.chars().take(MAX_SHEET_NAME_LEN).collect();
    if truncated.trim().is_empty() {
        "Sheet".to_string()
    } else {
        truncated
    }
}

/// The worksheet names of the contests, in order. Names are compared
/// without case, as in the spreadsheet applications.
pub fn sheet_names(report: &ElectionReport) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::new();
    for contest in report.contests.iter() {
        let base = sanitize_sheet_name(&contest.sheet_name);
        let mut name = base.clone();
        let mut counter = 2;
        while seen.contains(&name.to_lowercase()) {
            let suffix = format!(" ({})", counter);
            let stem: String = base
                .chars()
                .take(MAX_SHEET_NAME_LEN - suffix.chars().count())
                .collect();
            name = format!("{}{}", stem, suffix);
            counter += 1;
        }
        if name != contest.sheet_name {
            debug!("sheet name {:?} changed to {:?}", contest.sheet_name, name);
        }
        seen.insert(name.to_lowercase());
        names.push(name);
    }
    names
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<(), XlsxError> {
    match cell {
        Cell::Text(s) => {
            sheet.write_string(row, col, s.as_str())?;
        }
        Cell::Number(n) => {
            sheet.write_number(row, col, *n as f64)?;
        }
    }
    Ok(())
}

fn write_contest(sheet: &mut Worksheet, contest: &ContestReport) -> Result<(), XlsxError> {
    let mut row: u32 = 0;
    for line in contest.lines.iter() {
        match line {
            ReportLine::ContestStart(title) => {
                sheet.write_string(row, 0, title.as_str())?;
                // Followed by an empty row.
                row += 1;
            }
            ReportLine::Text(s) => {
                sheet.write_string(row, 0, s.as_str())?;
            }
            ReportLine::Header(names) => {
                for (col, name) in names.iter().enumerate() {
                    sheet.write_string(row, col as u16, name.as_str())?;
                }
            }
            ReportLine::Row(area_row) => {
                for (col, cell) in area_row.cells().iter().enumerate() {
                    write_cell(sheet, row, col as u16, cell)?;
                }
            }
            ReportLine::Blank => {}
        }
        row += 1;
    }
    Ok(())
}

pub fn write_xlsx(report: &ElectionReport, path: &str) -> ConvertResult<()> {
    let started = Instant::now();
    let mut workbook = Workbook::new();
    let names = sheet_names(report);
    for (contest, name) in report.contests.iter().zip(names.iter()) {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(name.as_str())
            .context(WritingXlsxSnafu { path })?;
        write_contest(sheet, contest).context(WritingXlsxSnafu { path })?;
    }
    workbook.save(path).context(WritingXlsxSnafu { path })?;
    info!(
        "wrote Excel report {} ({} worksheets) in {:.3} seconds",
        path,
        names.len(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::tests::sample_report;

    use calamine::{open_workbook, Data as DataType, Reader, Xlsx};

    #[test]
    fn sanitize() {
        assert_eq!(sanitize_sheet_name("100 - Mayor"), "100 - Mayor");
        assert_eq!(
            sanitize_sheet_name("12 - Proposition A: Bonds [2014]"),
            "12 - Proposition A_ Bonds _2014"
        );
        assert_eq!(sanitize_sheet_name("7 - a/b\\c?d*"), "7 - a_b_c_d_");
        assert_eq!(sanitize_sheet_name("'quoted'"), "quoted");
        assert_eq!(sanitize_sheet_name(""), "Sheet");
    }

    #[test]
    fn unique_names() {
        let mut report = sample_report();
        let mut other = report.contests[0].clone();
        other.sheet_name = "100 - MAYOR".to_string();
        report.contests.push(other);
        let mut long = report.contests[0].clone();
        long.sheet_name = "300 - Member, Board of Supervisors, District 7".to_string();
        report.contests.push(long.clone());
        report.contests.push(long);
        assert_eq!(
            sheet_names(&report),
            vec![
                "100 - Mayor",
                "100 - MAYOR (2)",
                "300 - Member, Board of Supervis",
                "300 - Member, Board of Supe (2)",
            ]
        );
    }

    #[test]
    fn write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let path = path.to_str().unwrap();
        write_xlsx(&sample_report(), path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
        assert_eq!(workbook.sheet_names().to_vec(), vec!["100 - Mayor".to_string()]);
        let range = workbook.worksheet_range("100 - Mayor").unwrap();
        assert_eq!(
            range.get_value((0, 0)),
            Some(&DataType::String("Mayor - CITY/COUNTY (100)".to_string()))
        );
        assert_eq!(
            range.get_value((2, 0)),
            Some(&DataType::String("Precinct Totals".to_string()))
        );
        // The precinct row: name, id, count, registration, ballots, turnout.
        assert_eq!(
            range.get_value((4, 0)),
            Some(&DataType::String("Pct 1101".to_string()))
        );
        assert_eq!(range.get_value((4, 1)), Some(&DataType::Float(1101.0)));
        assert_eq!(range.get_value((4, 3)), Some(&DataType::Float(200.0)));
        assert_eq!(
            range.get_value((4, 5)),
            Some(&DataType::String("25.00".to_string()))
        );
        assert_eq!(range.get_value((4, 6)), Some(&DataType::Float(30.0)));
        assert_eq!(
            range.get_value((5, 1)),
            Some(&DataType::String("City:0".to_string()))
        );
    }
}
