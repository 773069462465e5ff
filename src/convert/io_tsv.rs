// The tab-separated text report.

use chrono::{DateTime, TimeZone};

use std::fmt::Display;

use crate::convert::*;

pub const GENERATED_ON_PREFIX: &str = "Report generated on: ";
/// Starts every contest section, so that the sections are easy to find.
pub const CONTEST_START_MARKER: &str = "***";

/// Formats the generation time: `Friday, September 12, 2014 at 09:06:26 PM`.
pub fn format_generated_on<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    now.format("%A, %B %-d, %Y at %I:%M:%S %p").to_string()
}

fn join_cells<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("\t")
}

pub fn render_tsv(report: &ElectionReport) -> String {
    let mut out: Vec<String> = vec![
        report.title.clone(),
        String::new(),
        format!("{}{}", GENERATED_ON_PREFIX, report.generated_on),
    ];
    for contest in report.contests.iter() {
        out.push(String::new());
        out.push(String::new());
        for line in contest.lines.iter() {
            let s = match line {
                ReportLine::ContestStart(title) => format!("{} {}", CONTEST_START_MARKER, title),
                ReportLine::Text(s) => s.clone(),
                ReportLine::Header(names) => join_cells(names),
                ReportLine::Row(row) => join_cells(&row.cells()),
                ReportLine::Blank => String::new(),
            };
            out.push(s);
        }
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Writes the report and returns its content.
pub fn write_tsv(report: &ElectionReport, path: &str) -> ConvertResult<String> {
    let started = Instant::now();
    let text = render_tsv(report);
    fs::write(path, &text).context(WritingOutputSnafu { path })?;
    info!(
        "wrote TSV report {} in {:.3} seconds",
        path,
        started.elapsed().as_secs_f64()
    );
    Ok(text)
}
