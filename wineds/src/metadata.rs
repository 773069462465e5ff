// First pass over the export file: the election metadata.

use log::{debug, info};
use snafu::{ensure, OptionExt};

use std::io::BufRead;

use crate::decoder::{DataChunk, LineFields, LineLayout};
use crate::error::*;
use crate::lines::{open_lines, NumberedLines};
use crate::model::*;

const REGISTERED_VOTERS: &str = "REGISTERED VOTERS";
const BALLOTS_CAST: &str = "BALLOTS CAST";
const REGISTERED_CHOICE: &str = "VOTERS";
const SUMMARY_TOTAL: &str = "TOTAL";

/// Builds the [ElectionMeta] from the lines of an export file.
///
/// Every line is checked against what was seen on the previous lines.
/// Once all the lines are parsed, [MetadataBuilder::finish] links the
/// choices to their contests.
pub struct MetadataBuilder {
    layout: LineLayout,
    meta: ElectionMeta,
    format_detected: bool,
}

impl MetadataBuilder {
    pub fn new(layout: LineLayout) -> MetadataBuilder {
        MetadataBuilder {
            layout,
            meta: ElectionMeta::default(),
            format_detected: false,
        }
    }

    pub fn parse_line(&mut self, line: &str) -> LineResult<()> {
        if !self.format_detected {
            let has_reporting_type = self.layout.detect_reporting_type(line)?;
            info!(
                "detected file format: has_reporting_type={}",
                has_reporting_type
            );
            self.meta.has_reporting_type = has_reporting_type;
            self.format_detected = true;
        }

        let fields = self.layout.split(line);
        let chunk = fields.chunk()?;
        // Only checks the format here, the channels are checked by the
        // results pass.
        fields.channel()?;

        self.check_precinct_name(chunk.precinct_id, fields.precinct_name)?;

        if fields.district_name.is_empty() {
            self.parse_summary_line(&chunk, &fields)
        } else {
            self.parse_contest_line(&chunk, &fields)
        }
    }

    fn check_precinct_name(&mut self, precinct_id: PrecinctId, name: &str) -> LineResult<()> {
        match self.meta.precinct_names.get(&precinct_id) {
            Some(old) => {
                ensure!(
                    old == name,
                    PrecinctNameMismatchSnafu {
                        precinct_id,
                        old: old.as_str(),
                        new: name,
                    }
                );
            }
            None => {
                self.meta
                    .precinct_names
                    .insert(precinct_id, name.to_string());
            }
        }
        Ok(())
    }

    // The summary lines carry no district:
    //   0001001110100484  REGISTERED VOTERS - TOTAL  VOTERS  Pct 1101
    //   0002001110100141  BALLOTS CAST - TOTAL  BALLOTS CAST  Pct 1101
    // Files with party breakdowns also have one line per party, where the
    // choice id identifies the party:
    //   0001003110100120AI  REGISTERED VOTERS - American Independent ...
    fn parse_summary_line(&mut self, chunk: &DataChunk, fields: &LineFields) -> LineResult<()> {
        let (expected, expected_choice) = match chunk.contest_number {
            1 => (REGISTERED_VOTERS, REGISTERED_CHOICE),
            2 => (BALLOTS_CAST, BALLOTS_CAST),
            contest_number => {
                return UnexpectedSummaryContestSnafu { contest_number }.fail();
            }
        };
        let (prefix, suffix) = fields
            .contest_name
            .split_once(" - ")
            .context(SummaryContestNameSnafu {
                contest_number: chunk.contest_number,
                expected,
                actual: fields.contest_name,
            })?;
        ensure!(
            prefix == expected,
            SummaryContestNameSnafu {
                contest_number: chunk.contest_number,
                expected,
                actual: fields.contest_name,
            }
        );

        if suffix == SUMMARY_TOTAL {
            ensure!(
                chunk.choice_id == 1 && chunk.party_code.is_empty(),
                SummaryTotalChoiceSnafu {
                    choice_id: chunk.choice_id,
                    party_code: chunk.party_code.as_str(),
                }
            );
            ensure!(
                fields.choice_name == expected_choice,
                SummaryChoiceNameSnafu {
                    contest_number: chunk.contest_number,
                    expected: expected_choice,
                    actual: fields.choice_name,
                }
            );
            return Ok(());
        }

        let party = Party {
            code: chunk.party_code.clone(),
            name: suffix.to_string(),
        };
        match self.meta.parties.get(&chunk.choice_id) {
            Some(old) => {
                ensure!(
                    *old == party,
                    PartyMismatchSnafu {
                        choice_id: chunk.choice_id,
                        old: old.clone(),
                        new: party,
                    }
                );
            }
            None => {
                info!("adding party {}: {}", chunk.choice_id, party);
                self.meta.parties.insert(chunk.choice_id, party);
            }
        }
        Ok(())
    }

    fn parse_contest_line(&mut self, chunk: &DataChunk, fields: &LineFields) -> LineResult<()> {
        let contest_id = ContestId::new(chunk.contest_number, fields.contest_name);

        match self.meta.contests.get_mut(&contest_id) {
            Some(contest) => {
                ensure!(
                    contest.district_name == fields.district_name,
                    DistrictNameMismatchSnafu {
                        contest: contest_id.clone(),
                        old: contest.district_name.as_str(),
                        new: fields.district_name,
                    }
                );
                contest.precinct_ids.insert(chunk.precinct_id);
            }
            None => {
                debug!("adding contest: {}", contest_id);
                let mut contest =
                    Contest::new(contest_id.clone(), fields.district_name, &chunk.party_code);
                contest.precinct_ids.insert(chunk.precinct_id);
                self.meta.contests.insert(contest_id.clone(), contest);
            }
        }

        let choice = Choice::for_contest(&contest_id, fields.choice_name);
        if choice.contest.is_none() {
            self.note_pseudo_choice(chunk.choice_id, &choice.name);
        }
        match self.meta.choices.get(&chunk.choice_id) {
            Some(old) => {
                ensure!(
                    *old == choice,
                    ChoiceMismatchSnafu {
                        choice_id: chunk.choice_id,
                        old: old.clone(),
                        new: choice,
                    }
                );
            }
            None => {
                debug!("adding choice {}: {}", chunk.choice_id, choice);
                self.meta.choices.insert(chunk.choice_id, choice);
            }
        }
        Ok(())
    }

    fn note_pseudo_choice(&mut self, choice_id: ChoiceId, name: &str) {
        let slot = if name == UNDER_VOTE {
            &mut self.meta.undervote_id
        } else {
            &mut self.meta.overvote_id
        };
        if slot.is_none() {
            info!("setting {:?} choice id: {}", name, choice_id);
            *slot = Some(choice_id);
        }
    }

    /// Completes the metadata once all the lines have been parsed.
    pub fn finish(mut self) -> ElectionMeta {
        self.meta.link_choices_to_contests();
        self.meta.disambiguate_contest_names();
        info!(
            "parsed metadata: {} contests, {} choices, {} parties, {} precincts",
            self.meta.contests.len(),
            self.meta.choices.len(),
            self.meta.parties.len(),
            self.meta.precinct_names.len()
        );
        self.meta
    }
}

/// Reads the election metadata from an export file (first pass).
pub fn build_election_meta(path: &str, layout: LineLayout) -> WinedsResult<ElectionMeta> {
    build_election_meta_from(open_lines(path)?, layout)
}

pub fn build_election_meta_from<R: BufRead>(
    lines: NumberedLines<R>,
    layout: LineLayout,
) -> WinedsResult<ElectionMeta> {
    let path = lines.path().to_string();
    let mut builder = MetadataBuilder::new(layout);
    let count = lines.process(|_, line| builder.parse_line(line))?;
    ensure!(count > 0, EmptyFileSnafu { path });
    Ok(builder.finish())
}

/// Checks that the precincts of the index are exactly the precincts of the
/// export file.
pub fn check_precincts(index: &PrecinctIndex, meta: &ElectionMeta, path: &str) -> WinedsResult<()> {
    let mut index_ids = index.all_precinct_ids.iter().peekable();
    let mut export_ids = meta.precinct_names.keys().peekable();
    loop {
        match (index_ids.peek().copied(), export_ids.peek().copied()) {
            (None, None) => return Ok(()),
            (Some(a), Some(b)) if a == b => {
                index_ids.next();
                export_ids.next();
            }
            (Some(a), Some(b)) if a < b => {
                return PrecinctMissingFromExportSnafu {
                    precinct_id: *a,
                    path,
                }
                .fail();
            }
            (Some(a), None) => {
                return PrecinctMissingFromExportSnafu {
                    precinct_id: *a,
                    path,
                }
                .fail();
            }
            (_, Some(b)) => {
                return PrecinctUnknownToIndexSnafu {
                    precinct_id: *b,
                    path,
                }
                .fail();
            }
        }
    }
}
