//! Decoding of the fixed-width lines of a WinEDS Reporting Tool export.
//!
//! A sample line (wrapped here):
//!
//! ```text
//! 0010073990000000PF        US Representative, District 13                          \
//! LAWERENCE N. ALLEN                    Pct 9900 MB                   \
//! 13TH CONGRESSIONAL DISTRITC-Election Day Reporting
//! ```
//!
//! The columns are not always separated by whitespace ("DISTRITC-Election"
//! above), so the fields are sliced at fixed character offsets.

use snafu::{ensure, OptionExt};

use crate::error::*;
use crate::model::*;

/// The length of the positional part of the data chunk: `0AAACCCPPPPTTTTT`.
pub const DATA_CHUNK_MIN_LEN: usize = 16;

/// The vote-total text standing for -1.
pub const NEGATIVE_SENTINEL_TEXT: &str = "000-1";
pub const NEGATIVE_SENTINEL: VoteTotal = -1;

/// Widths of the fixed columns of an export line.
///
/// The widths depend on the version of the reporting tool. The reporting
/// type column is only present in the "complete" variant of the format.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct LineLayout {
    pub data_width: usize,
    pub contest_name_width: usize,
    pub choice_name_width: usize,
    pub precinct_name_width: usize,
    pub district_name_width: usize,
    pub reporting_type_width: usize,
}

impl LineLayout {
    /// The layout of the files produced by the WinEDS Reporting Tool
    /// (lines of 175 or 205 characters).
    pub const DEFAULT_LAYOUT: LineLayout = LineLayout {
        data_width: 26,
        contest_name_width: 56,
        choice_name_width: 38,
        precinct_name_width: 30,
        district_name_width: 25,
        reporting_type_width: 30,
    };

    /// The length of a line without the reporting type column.
    pub fn simple_line_len(&self) -> usize {
        self.data_width
            + self.contest_name_width
            + self.choice_name_width
            + self.precinct_name_width
            + self.district_name_width
    }

    /// The length of a line with the reporting type column.
    pub fn complete_line_len(&self) -> usize {
        self.simple_line_len() + self.reporting_type_width
    }

    /// Detects the format variant from the first line of a file.
    ///
    /// Returns whether the file has a reporting type column.
    pub fn detect_reporting_type(&self, line: &str) -> LineResult<bool> {
        let char_count = line.trim_end_matches(&['\r', '\n'][..]).chars().count();
        if char_count == self.complete_line_len() {
            Ok(true)
        } else if char_count == self.simple_line_len() {
            Ok(false)
        } else {
            UnexpectedLineLengthSnafu {
                char_count,
                simple: self.simple_line_len(),
                complete: self.complete_line_len(),
            }
            .fail()
        }
    }

    /// Splits a line into its fields. The fields are trimmed.
    pub fn split<'a>(&self, line: &'a str) -> LineFields<'a> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        let b1 = self.data_width;
        let b2 = b1 + self.contest_name_width;
        let b3 = b2 + self.choice_name_width;
        let b4 = b3 + self.precinct_name_width;
        let b5 = b4 + self.district_name_width;
        LineFields {
            data: slice_chars(line, 0, Some(b1)).trim(),
            contest_name: slice_chars(line, b1, Some(b2)).trim(),
            choice_name: slice_chars(line, b2, Some(b3)).trim(),
            precinct_name: slice_chars(line, b3, Some(b4)).trim(),
            district_name: slice_chars(line, b4, Some(b5)).trim(),
            reporting_type: slice_chars(line, b5, None).trim(),
        }
    }
}

impl Default for LineLayout {
    fn default() -> Self {
        LineLayout::DEFAULT_LAYOUT
    }
}

// Slices by character positions, clamping to the end of the line.
fn slice_chars(line: &str, start: usize, end: Option<usize>) -> &str {
    let byte_pos = |n: usize| {
        line.char_indices()
            .nth(n)
            .map(|(idx, _)| idx)
            .unwrap_or(line.len())
    };
    let start_b = byte_pos(start);
    let end_b = match end {
        Some(e) => byte_pos(e),
        None => line.len(),
    };
    &line[start_b..end_b.max(start_b)]
}

/// The fields of one export line.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct LineFields<'a> {
    pub data: &'a str,
    pub contest_name: &'a str,
    pub choice_name: &'a str,
    pub precinct_name: &'a str,
    pub district_name: &'a str,
    pub reporting_type: &'a str,
}

impl<'a> LineFields<'a> {
    pub fn chunk(&self) -> LineResult<DataChunk> {
        DataChunk::decode(self.data)
    }

    pub fn channel(&self) -> LineResult<ReportingChannel> {
        classify_reporting_type(self.reporting_type)
    }
}

/// The positional content of the first field of a line:
///
/// ```text
/// 0AAACCCPPPPTTTTT[PTY]
///
/// AAA   = contest number
/// CCC   = choice id
/// PPPP  = precinct id
/// TTTTT = vote total
/// PTY   = party code (optional, variable length)
/// ```
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DataChunk {
    pub contest_number: u32,
    pub choice_id: ChoiceId,
    pub precinct_id: PrecinctId,
    pub vote_total: VoteTotal,
    pub party_code: String,
}

impl DataChunk {
    pub fn decode(chunk: &str) -> LineResult<DataChunk> {
        ensure!(
            chunk.chars().count() >= DATA_CHUNK_MIN_LEN,
            ChunkTooShortSnafu {
                chunk,
                min_len: DATA_CHUNK_MIN_LEN,
            }
        );
        ensure!(chunk.starts_with('0'), ChunkLeadingCharSnafu { chunk });
        // The fixed positions are sliced by byte below.
        ensure!(
            chunk.chars().take(DATA_CHUNK_MIN_LEN).all(|c| c.is_ascii()),
            ChunkNotNumericSnafu {
                chunk,
                field: "data chunk",
                text: chunk,
            }
        );

        let contest_number = parse_digits(chunk, 1, 4, "contest number")?;
        let choice_id = parse_digits(chunk, 4, 7, "choice id")?;
        let precinct_id = parse_digits(chunk, 7, 11, "precinct id")?;
        let vote_total = if &chunk[11..16] == NEGATIVE_SENTINEL_TEXT {
            NEGATIVE_SENTINEL
        } else {
            parse_digits(chunk, 11, 16, "vote total")? as VoteTotal
        };
        let party_code = chunk[16..].to_string();
        Ok(DataChunk {
            contest_number,
            choice_id,
            precinct_id,
            vote_total,
            party_code,
        })
    }

    /// Encodes the chunk back to its textual form.
    pub fn encode(&self) -> String {
        let total = if self.vote_total == NEGATIVE_SENTINEL {
            NEGATIVE_SENTINEL_TEXT.to_string()
        } else {
            format!("{:05}", self.vote_total)
        };
        format!(
            "0{:03}{:03}{:04}{}{}",
            self.contest_number, self.choice_id, self.precinct_id, total, self.party_code
        )
    }
}

// The chunk is known to be ASCII over its first 16 characters here.
fn parse_digits(chunk: &str, start: usize, end: usize, field: &'static str) -> LineResult<u32> {
    let text = &chunk[start..end];
    let all_digits = text.chars().all(|c| c.is_ascii_digit());
    let parsed = if all_digits { text.parse::<u32>().ok() } else { None };
    parsed.context(ChunkNotNumericSnafu { chunk, field, text })
}

/// Classifies the reporting type column.
///
/// Accepts both "TC-Election Day Reporting" and "Election Day" styles.
pub fn classify_reporting_type(text: &str) -> LineResult<ReportingChannel> {
    let channel = if text.is_empty() {
        ReportingChannel::All
    } else if text.contains("Election Day") {
        ReportingChannel::ElectionDay
    } else if text.contains("VBM") {
        ReportingChannel::VoteByMail
    } else {
        return UnknownReportingTypeSnafu { text }.fail();
    };
    Ok(channel)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad(s: &str, width: usize) -> String {
        format!("{:width$}", s, width = width)
    }

    fn sample_line(reporting: Option<&str>) -> String {
        let l = LineLayout::DEFAULT_LAYOUT;
        let mut s = String::new();
        s.push_str(&pad("0010073990000000PF", l.data_width));
        s.push_str(&pad("US Representative, District 13", l.contest_name_width));
        s.push_str(&pad("LAWERENCE N. ALLEN", l.choice_name_width));
        s.push_str(&pad("Pct 9900 MB", l.precinct_name_width));
        if let Some(r) = reporting {
            s.push_str("13TH CONGRESSIONAL DISTRITC");
            s.push_str(&pad(r, l.reporting_type_width - 2));
        } else {
            s.push_str(&pad("13TH CONGRESSIONAL DISTRI", l.district_name_width));
        }
        s
    }

    #[test]
    fn decode_chunk() {
        let c = DataChunk::decode("0010073990000000PF").unwrap();
        assert_eq!(
            c,
            DataChunk {
                contest_number: 10,
                choice_id: 73,
                precinct_id: 9900,
                vote_total: 0,
                party_code: "PF".to_string(),
            }
        );
        let c = DataChunk::decode("0001001110100484").unwrap();
        assert_eq!(c.contest_number, 1);
        assert_eq!(c.choice_id, 1);
        assert_eq!(c.precinct_id, 1101);
        assert_eq!(c.vote_total, 484);
        assert_eq!(c.party_code, "");
    }

    #[test]
    fn decode_sentinel() {
        let c = DataChunk::decode("0120003110100-1").unwrap_err();
        assert!(matches!(c, LineError::ChunkTooShort { .. }));
        let c = DataChunk::decode("01200031101000-1").unwrap();
        assert_eq!(c.vote_total, -1);
        assert_eq!(c.encode(), "01200031101000-1");
    }

    #[test]
    fn decode_round_trip() {
        let cases = [
            (0, 0, 0, 0, ""),
            (999, 999, 9999, 99999, ""),
            (145, 12, 7509, -1, "DEM"),
            (2, 1, 1101, 141, "AI"),
        ];
        for (contest_number, choice_id, precinct_id, vote_total, party) in cases {
            let chunk = DataChunk {
                contest_number,
                choice_id,
                precinct_id,
                vote_total,
                party_code: party.to_string(),
            };
            assert_eq!(DataChunk::decode(&chunk.encode()).unwrap(), chunk);
        }
    }

    #[test]
    fn decode_round_trip_all_contests_and_choices() {
        let tails = [
            (0, 0, ""),
            (9999, 1, "DEM"),
            (1101, 99999, "AI"),
            (7509, -1, ""),
        ];
        for contest_number in 0..=999 {
            for choice_id in 0..=999 {
                // Every tail meets every contest number and every choice id.
                let picks = [
                    tails[(contest_number + choice_id) as usize % 4],
                    tails[choice_id as usize % 4],
                ];
                for (precinct_id, vote_total, party) in picks {
                    let chunk = DataChunk {
                        contest_number,
                        choice_id,
                        precinct_id,
                        vote_total,
                        party_code: party.to_string(),
                    };
                    let text = chunk.encode();
                    assert_eq!(text.len(), 16 + party.len());
                    assert_eq!(DataChunk::decode(&text).unwrap(), chunk);
                }
            }
        }
    }

    #[test]
    fn decode_rejects_bad_chunks() {
        assert!(matches!(
            DataChunk::decode("1001001110100484"),
            Err(LineError::ChunkLeadingChar { .. })
        ));
        assert!(matches!(
            DataChunk::decode("00A1001110100484"),
            Err(LineError::ChunkNotNumeric {
                field: "contest number",
                ..
            })
        ));
        assert!(matches!(
            DataChunk::decode("000100111010 484"),
            Err(LineError::ChunkNotNumeric {
                field: "vote total",
                ..
            })
        ));
        assert!(matches!(
            DataChunk::decode("0001001110100-84"),
            Err(LineError::ChunkNotNumeric { .. })
        ));
        assert!(matches!(
            DataChunk::decode("0001é01110100484"),
            Err(LineError::ChunkNotNumeric { .. })
        ));
    }

    #[test]
    fn split_complete_line() {
        let line = sample_line(Some("-Election Day Reporting"));
        let layout = LineLayout::DEFAULT_LAYOUT;
        assert_eq!(line.chars().count(), layout.complete_line_len());
        assert_eq!(layout.detect_reporting_type(&line).unwrap(), true);
        let f = layout.split(&line);
        assert_eq!(f.data, "0010073990000000PF");
        assert_eq!(f.contest_name, "US Representative, District 13");
        assert_eq!(f.choice_name, "LAWERENCE N. ALLEN");
        assert_eq!(f.precinct_name, "Pct 9900 MB");
        assert_eq!(f.district_name, "13TH CONGRESSIONAL DISTRI");
        assert_eq!(f.reporting_type, "TC-Election Day Reporting");
        assert_eq!(f.channel().unwrap(), ReportingChannel::ElectionDay);
    }

    #[test]
    fn split_simple_line() {
        let line = format!("{}\r\n", sample_line(None));
        let layout = LineLayout::DEFAULT_LAYOUT;
        assert_eq!(layout.detect_reporting_type(&line).unwrap(), false);
        let f = layout.split(&line);
        assert_eq!(f.district_name, "13TH CONGRESSIONAL DISTRI");
        assert_eq!(f.reporting_type, "");
        assert_eq!(f.channel().unwrap(), ReportingChannel::All);
    }

    #[test]
    fn detect_rejects_other_lengths() {
        let layout = LineLayout::DEFAULT_LAYOUT;
        let err = layout.detect_reporting_type("0001001110100484  REGISTERED").unwrap_err();
        assert!(matches!(
            err,
            LineError::UnexpectedLineLength {
                simple: 175,
                complete: 205,
                ..
            }
        ));
    }

    #[test]
    fn short_lines_have_empty_fields() {
        let f = LineLayout::DEFAULT_LAYOUT.split("0001001110100484");
        assert_eq!(f.data, "0001001110100484");
        assert_eq!(f.contest_name, "");
        assert_eq!(f.district_name, "");
    }

    #[test]
    fn reporting_types() {
        assert_eq!(classify_reporting_type("").unwrap(), ReportingChannel::All);
        assert_eq!(
            classify_reporting_type("Election Day").unwrap(),
            ReportingChannel::ElectionDay
        );
        assert_eq!(
            classify_reporting_type("TC-VBM Reporting").unwrap(),
            ReportingChannel::VoteByMail
        );
        assert!(matches!(
            classify_reporting_type("Early Voting"),
            Err(LineError::UnknownReportingType { .. })
        ));
    }
}
