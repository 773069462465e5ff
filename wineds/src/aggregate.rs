// Second pass over the export file: the vote totals.

use log::{info, warn};
use snafu::OptionExt;

use std::io::BufRead;

use crate::decoder::LineLayout;
use crate::error::*;
use crate::lines::{open_lines, NumberedLines};
use crate::model::*;

/// Folds the totals of the export lines into a [ResultsTree].
///
/// The tree is shaped from the metadata up front. Every line must land on
/// an existing slot that has not been filled yet.
pub struct ResultsAggregator<'a> {
    layout: LineLayout,
    meta: &'a ElectionMeta,
    results: ResultsTree,
    negative_totals: usize,
}

impl<'a> ResultsAggregator<'a> {
    pub fn new(meta: &'a ElectionMeta, layout: LineLayout) -> ResultsAggregator<'a> {
        ResultsAggregator {
            layout,
            meta,
            results: ResultsTree::zeroed(meta),
            negative_totals: 0,
        }
    }

    pub fn parse_line(&mut self, lineno: usize, line: &str) -> LineResult<()> {
        let fields = self.layout.split(line);
        let chunk = fields.chunk()?;
        let channel = fields.channel()?;

        if matches!(chunk.contest_number, 1 | 2) && !chunk.party_code.is_empty() {
            // Party breakdowns of the registration and turnout.
            return Ok(());
        }

        if chunk.vote_total < 0 {
            self.negative_totals += 1;
            warn!(
                "line {}: negative ballot total {}: choice_id={}, contest_id={}, precinct_id={}: {:?}",
                lineno, chunk.vote_total, chunk.choice_id, chunk.contest_number, chunk.precinct_id, line
            );
        }

        let precinct_id = chunk.precinct_id;
        let total = chunk.vote_total;
        match chunk.contest_number {
            1 => {
                let slot = self
                    .results
                    .registered
                    .get_mut(&precinct_id)
                    .context(MissingPrecinctSnafu {
                        contest: "REGISTERED VOTERS",
                        precinct_id,
                    })?;
                fill_slot(slot, total, || {
                    format!("registered voters in precinct {}", precinct_id)
                })
            }
            2 => {
                let by_channel = self
                    .results
                    .voted
                    .get_mut(&precinct_id)
                    .context(MissingPrecinctSnafu {
                        contest: "BALLOTS CAST",
                        precinct_id,
                    })?;
                let slot = by_channel.get_mut(&channel).context(MissingChannelSnafu {
                    contest: "BALLOTS CAST",
                    precinct_id,
                    channel,
                })?;
                fill_slot(slot, total, || {
                    format!("ballots cast in precinct {} ({:?})", precinct_id, channel)
                })
            }
            contest_number => {
                let contest_id = ContestId::new(contest_number, fields.contest_name);
                let contest_results = self
                    .results
                    .contests
                    .get_mut(&contest_id)
                    .context(MissingContestSnafu {
                        contest: contest_id.clone(),
                    })?;
                let by_channel =
                    contest_results
                        .get_mut(&precinct_id)
                        .context(MissingPrecinctSnafu {
                            contest: contest_id.to_string(),
                            precinct_id,
                        })?;
                let choices = by_channel.get_mut(&channel).context(MissingChannelSnafu {
                    contest: contest_id.to_string(),
                    precinct_id,
                    channel,
                })?;
                let choice_id = chunk.choice_id;
                let slot = choices.get_mut(&choice_id).context(MissingChoiceSnafu {
                    contest: contest_id.clone(),
                    choice_id,
                })?;
                fill_slot(slot, total, || {
                    format!(
                        "choice {} of contest {} in precinct {} ({:?})",
                        choice_id, contest_id, precinct_id, channel
                    )
                })
            }
        }
    }

    pub fn finish(self) -> ResultsTree {
        if self.negative_totals > 0 {
            warn!(
                "{} negative totals found, they are kept as they are",
                self.negative_totals
            );
        }
        info!(
            "aggregated totals for {} contests over {} precincts",
            self.results.contests.len(),
            self.meta.precinct_names.len()
        );
        self.results
    }
}

fn fill_slot<F>(slot: &mut VoteSlot, total: VoteTotal, target: F) -> LineResult<()>
where
    F: FnOnce() -> String,
{
    slot.fill(total).map_err(|previous| LineError::DuplicateTotal {
        target: target(),
        previous,
        total,
    })
}

/// Reads the vote totals from an export file (second pass).
pub fn aggregate_results(
    path: &str,
    meta: &ElectionMeta,
    layout: LineLayout,
) -> WinedsResult<ResultsTree> {
    aggregate_results_from(open_lines(path)?, meta, layout)
}

pub fn aggregate_results_from<R: BufRead>(
    lines: NumberedLines<R>,
    meta: &ElectionMeta,
    layout: LineLayout,
) -> WinedsResult<ResultsTree> {
    let mut aggregator = ResultsAggregator::new(meta, layout);
    lines.process(|lineno, line| aggregator.parse_line(lineno, line))?;
    Ok(aggregator.finish())
}
