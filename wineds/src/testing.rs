// Fixture builders shared by the unit tests.

use crate::decoder::LineLayout;

/// An export line of the simple format, padded to the default layout.
pub fn line(chunk: &str, contest: &str, choice: &str, precinct: &str, district: &str) -> String {
    let l = LineLayout::DEFAULT_LAYOUT;
    format!(
        "{:w0$}{:w1$}{:w2$}{:w3$}{:w4$}",
        chunk,
        contest,
        choice,
        precinct,
        district,
        w0 = l.data_width,
        w1 = l.contest_name_width,
        w2 = l.choice_name_width,
        w3 = l.precinct_name_width,
        w4 = l.district_name_width,
    )
}

/// Adds the reporting type column to a simple line.
pub fn with_channel(line: String, reporting_type: &str) -> String {
    format!(
        "{}{:w$}",
        line,
        reporting_type,
        w = LineLayout::DEFAULT_LAYOUT.reporting_type_width
    )
}

pub const INDEX_HEADER: &str = "VotingPrecinctID,VotingPrecinctName,MailBallotPrecinct,BalType,Assembly,BART,Congressional,Neighborhood,Senatorial,Supervisorial";
