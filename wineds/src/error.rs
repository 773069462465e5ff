use snafu::Snafu;

use crate::model::*;

/// What went wrong while processing a single line of an input file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LineError {
    #[snafu(display("data chunk {chunk:?} is shorter than {min_len} characters"))]
    ChunkTooShort { chunk: String, min_len: usize },
    #[snafu(display("data chunk {chunk:?} does not start with '0'"))]
    ChunkLeadingChar { chunk: String },
    #[snafu(display("data chunk {chunk:?}: {field} {text:?} is not a number"))]
    ChunkNotNumeric {
        chunk: String,
        field: &'static str,
        text: String,
    },
    #[snafu(display(
        "unexpected number of characters in first line: {char_count} (expected {simple} or {complete})"
    ))]
    UnexpectedLineLength {
        char_count: usize,
        simple: usize,
        complete: usize,
    },
    #[snafu(display("unrecognized reporting-type field: {text:?}"))]
    UnknownReportingType { text: String },

    #[snafu(display("precinct row has {count} columns, expected at least {expected}"))]
    PrecinctRowTooShort { count: usize, expected: usize },
    #[snafu(display("precinct row: column {column} {text:?} is not a number"))]
    PrecinctRowNotNumeric { column: &'static str, text: String },

    #[snafu(display("precinct {precinct_id} is named {new:?} but was named {old:?} before"))]
    PrecinctNameMismatch {
        precinct_id: PrecinctId,
        old: String,
        new: String,
    },
    #[snafu(display("summary line has unexpected contest number {contest_number}"))]
    UnexpectedSummaryContest { contest_number: u32 },
    #[snafu(display("summary line for contest {contest_number}: expected a name like {expected:?}, found {actual:?}"))]
    SummaryContestName {
        contest_number: u32,
        expected: &'static str,
        actual: String,
    },
    #[snafu(display("summary total line for contest {contest_number}: expected choice {expected:?}, found {actual:?}"))]
    SummaryChoiceName {
        contest_number: u32,
        expected: &'static str,
        actual: String,
    },
    #[snafu(display("summary total line has choice id {choice_id} and party code {party_code:?} (expected 1 and none)"))]
    SummaryTotalChoice { choice_id: ChoiceId, party_code: String },
    #[snafu(display("party id {choice_id} is {new} but was {old} before"))]
    PartyMismatch {
        choice_id: ChoiceId,
        old: Party,
        new: Party,
    },
    #[snafu(display("contest {contest} has district {new:?} but had district {old:?} before"))]
    DistrictNameMismatch {
        contest: ContestId,
        old: String,
        new: String,
    },
    #[snafu(display("choice id {choice_id} is {new} but was already assigned to {old}"))]
    ChoiceMismatch {
        choice_id: ChoiceId,
        old: Choice,
        new: Choice,
    },

    #[snafu(display("contest {contest} was not seen in the metadata pass"))]
    MissingContest { contest: ContestId },
    #[snafu(display("precinct {precinct_id} was not seen for contest {contest} in the metadata pass"))]
    MissingPrecinct {
        contest: String,
        precinct_id: PrecinctId,
    },
    #[snafu(display("reporting channel {channel:?} is not present in this file (contest {contest}, precinct {precinct_id})"))]
    MissingChannel {
        contest: String,
        precinct_id: PrecinctId,
        channel: ReportingChannel,
    },
    #[snafu(display("choice id {choice_id} is not a choice of contest {contest}"))]
    MissingChoice { contest: ContestId, choice_id: ChoiceId },
    #[snafu(display("total for {target} was already stored (previous value {previous}, new value {total})"))]
    DuplicateTotal {
        target: String,
        previous: VoteTotal,
        total: VoteTotal,
    },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum WinedsError {
    #[snafu(display("error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("error reading {path} after line {lineno}"))]
    ReadingFile {
        source: std::io::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("error reading CSV file {path}"))]
    ReadingCsv { source: csv::Error, path: String },
    #[snafu(display("error writing filtered output"))]
    WritingFile { source: std::io::Error },
    #[snafu(display("{path}: error while parsing line {lineno}: {source}\n>>> [L{lineno}]:{line:?}"))]
    Line {
        source: LineError,
        path: String,
        lineno: usize,
        line: String,
    },
    #[snafu(display("{path} contains no data lines"))]
    EmptyFile { path: String },
    #[snafu(display("export file does not contain precinct id {precinct_id}: {path}"))]
    PrecinctMissingFromExport { precinct_id: PrecinctId, path: String },
    #[snafu(display("export file contains unknown precinct id {precinct_id}: {path}"))]
    PrecinctUnknownToIndex { precinct_id: PrecinctId, path: String },
}

pub type WinedsResult<T> = Result<T, WinedsError>;
pub type LineResult<T> = Result<T, LineError>;
