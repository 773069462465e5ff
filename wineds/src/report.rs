//! The rows of the summary report.
//!
//! The report is first built as a list of [ReportLine]s per contest. The
//! sinks (tab-separated text, spreadsheet) only decide how to lay out each
//! line.

use log::{info, warn};

use std::collections::BTreeSet;
use std::fmt::Display;

use crate::model::*;

pub const GRAND_TOTALS: &str = "Grand Totals";
pub const DEFAULT_CITY_NAME: &str = "CITY/COUNTY OF SAN FRANCISCO";
/// Placeholder area id of the city-wide rows, so that the column has the
/// same format for all the rows.
pub const CITY_AREA_ID: &str = "City:0";

const PRECINCT_TOTALS: &str = "Precinct Totals";
const DISTRICT_TOTALS: &str = "District and Neighborhood Totals";

/// A cell of a report row.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(i64),
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(n) => write!(f, "{}", n),
        }
    }
}

/// The totals over a set of precincts (a precinct, a district, the city...)
/// for one contest.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AreaRow {
    pub name: String,
    /// Only set in the files split by reporting channel. Empty when the
    /// row spans all the channels.
    pub channel_label: Option<&'static str>,
    pub area_id: Cell,
    pub precinct_count: usize,
    pub registered: VoteTotal,
    pub voted: VoteTotal,
    /// In the order of the choice ids.
    pub choice_totals: Vec<VoteTotal>,
}

impl AreaRow {
    /// The turnout, as a percentage with two decimals.
    pub fn turnout(&self) -> String {
        if self.registered == 0 {
            "0.00".to_string()
        } else {
            format!(
                "{:.2}",
                100.0 * self.voted as f64 / self.registered as f64
            )
        }
    }

    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = vec![Cell::Text(self.name.clone())];
        if let Some(label) = self.channel_label {
            cells.push(Cell::Text(label.to_string()));
        }
        cells.push(self.area_id.clone());
        cells.push(Cell::Number(self.precinct_count as i64));
        cells.push(Cell::Number(self.registered));
        cells.push(Cell::Number(self.voted));
        cells.push(Cell::Text(self.turnout()));
        cells.extend(self.choice_totals.iter().map(|t| Cell::Number(*t)));
        cells
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ReportLine {
    /// The start of a contest section, with the contest title.
    ContestStart(String),
    Text(String),
    Header(Vec<String>),
    Row(AreaRow),
    Blank,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ContestReport {
    pub title: String,
    /// The name of the worksheet, before any sanitizing.
    pub sheet_name: String,
    pub lines: Vec<ReportLine>,
}

impl ContestReport {
    pub fn rows(&self) -> impl Iterator<Item = &AreaRow> {
        self.lines.iter().filter_map(|l| match l {
            ReportLine::Row(r) => Some(r),
            _ => None,
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionReport {
    pub title: String,
    pub generated_on: String,
    pub channel_split: bool,
    pub contests: Vec<ContestReport>,
}

/// Builds the report from the three inputs.
pub struct ReportBuilder<'a> {
    index: &'a PrecinctIndex,
    meta: &'a ElectionMeta,
    results: &'a ResultsTree,
    city_name: String,
    // (display name, label), sorted by display name.
    neighborhoods: Vec<(String, String)>,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(
        index: &'a PrecinctIndex,
        meta: &'a ElectionMeta,
        results: &'a ResultsTree,
    ) -> ReportBuilder<'a> {
        let mut neighborhoods: Vec<(String, String)> = index
            .neighborhoods
            .keys()
            .map(|label| {
                let name = match neighborhood_name(label) {
                    Some(name) => name.to_string(),
                    None => {
                        warn!("unknown neighborhood label, using it as the name: {:?}", label);
                        label.clone()
                    }
                };
                (name, label.clone())
            })
            .collect();
        neighborhoods.sort();
        ReportBuilder {
            index,
            meta,
            results,
            city_name: DEFAULT_CITY_NAME.to_string(),
            neighborhoods,
        }
    }

    /// Sets the name of the city-wide row of the district totals.
    pub fn city_name(mut self, city_name: &str) -> ReportBuilder<'a> {
        self.city_name = city_name.to_string();
        self
    }

    pub fn build(&self, title: &str, generated_on: &str) -> ElectionReport {
        let contests = self
            .meta
            .contests
            .values()
            .map(|c| self.contest_report(c))
            .collect();
        ElectionReport {
            title: title.to_string(),
            generated_on: generated_on.to_string(),
            channel_split: self.meta.has_reporting_type,
            contests,
        }
    }

    fn contest_report(&self, contest: &Contest) -> ContestReport {
        info!(
            "building contest: {} ({} precincts)",
            contest.display_name,
            contest.precinct_ids.len()
        );
        let title = contest.title();
        let split = self.meta.has_reporting_type;
        let channels: &[ReportingChannel] = &self.results.channels;
        let mut lines = vec![
            ReportLine::ContestStart(title.clone()),
            ReportLine::Text(PRECINCT_TOTALS.to_string()),
            ReportLine::Header(self.header(contest, "PrecinctName", "PrecinctID")),
        ];

        for precinct_id in contest.precinct_ids.iter() {
            let name = self
                .meta
                .precinct_names
                .get(precinct_id)
                .cloned()
                .unwrap_or_default();
            let area_id = Cell::Number(*precinct_id as i64);
            if split {
                for channel in channels.iter() {
                    lines.push(ReportLine::Row(self.totals_row(
                        contest,
                        Some(*precinct_id).iter(),
                        &name,
                        area_id.clone(),
                        std::slice::from_ref(channel),
                    )));
                }
            } else {
                lines.push(ReportLine::Row(self.totals_row(
                    contest,
                    Some(*precinct_id).iter(),
                    &name,
                    area_id,
                    channels,
                )));
            }
        }
        if split {
            for channel in channels.iter() {
                lines.push(ReportLine::Row(
                    self.city_row(contest, GRAND_TOTALS, std::slice::from_ref(channel)),
                ));
            }
        }
        lines.push(ReportLine::Row(self.city_row(contest, GRAND_TOTALS, channels)));

        lines.push(ReportLine::Blank);
        lines.push(ReportLine::Text(title.clone()));
        lines.push(ReportLine::Text(DISTRICT_TOTALS.to_string()));
        lines.push(ReportLine::Header(self.header(
            contest,
            "DistrictName",
            "DistrictLabel",
        )));
        for district_type in DistrictType::REPORT_ORDER {
            if let Some(areas) = self.index.district_areas(district_type) {
                for (district, precinct_ids) in areas.iter() {
                    let name = district_type.area_name(*district);
                    let label = format!("{}:{}", district_type.header(), district);
                    if let Some(row) = self.area_row(contest, precinct_ids, &name, &label) {
                        lines.push(ReportLine::Row(row));
                    }
                }
            }
        }
        lines.push(ReportLine::Row(self.city_row(contest, &self.city_name, channels)));
        for (name, label) in self.neighborhoods.iter() {
            if let Some(precinct_ids) = self.index.neighborhoods.get(label) {
                let label = format!("Neighborhood:{}", label);
                if let Some(row) = self.area_row(contest, precinct_ids, name, &label) {
                    lines.push(ReportLine::Row(row));
                }
            }
        }
        lines.push(ReportLine::Row(self.city_row(contest, GRAND_TOTALS, channels)));

        ContestReport {
            sheet_name: format!("{} - {}", contest.id.number, contest.display_name),
            title,
            lines,
        }
    }

    fn header(&self, contest: &Contest, name_header: &str, id_header: &str) -> Vec<String> {
        let mut values = vec![name_header.to_string()];
        if self.meta.has_reporting_type {
            values.push("ReportingType".to_string());
        }
        for h in [id_header, "Precincts", "Registration", "Ballots Cast", "Turnout (%)"] {
            values.push(h.to_string());
        }
        values.extend(
            contest
                .choice_ids
                .iter()
                .map(|cid| self.meta.choice_name(*cid).unwrap_or_default().to_string()),
        );
        values
    }

    fn area_row(
        &self,
        contest: &Contest,
        precinct_ids: &BTreeSet<PrecinctId>,
        name: &str,
        label: &str,
    ) -> Option<AreaRow> {
        if precinct_ids.is_disjoint(&contest.precinct_ids) {
            info!("skipping area: contest has no precincts in: {}", name);
            return None;
        }
        Some(self.totals_row(
            contest,
            precinct_ids.iter(),
            name,
            Cell::Text(label.to_string()),
            &self.results.channels,
        ))
    }

    fn city_row(&self, contest: &Contest, name: &str, channels: &[ReportingChannel]) -> AreaRow {
        self.totals_row(
            contest,
            self.index.all_precinct_ids.iter(),
            name,
            Cell::Text(CITY_AREA_ID.to_string()),
            channels,
        )
    }

    // Only the precincts of the area that take part in the contest count.
    fn totals_row<'p, I>(
        &self,
        contest: &Contest,
        precinct_ids: I,
        name: &str,
        area_id: Cell,
        channels: &[ReportingChannel],
    ) -> AreaRow
    where
        I: Iterator<Item = &'p PrecinctId>,
    {
        let contest_results = self.results.contests.get(&contest.id);
        let mut row = AreaRow {
            name: name.to_string(),
            channel_label: self.channel_label(channels),
            area_id,
            precinct_count: 0,
            registered: 0,
            voted: 0,
            choice_totals: vec![0; contest.choice_ids.len()],
        };
        for precinct_id in precinct_ids {
            let by_channel = match contest_results.and_then(|r| r.get(precinct_id)) {
                Some(by_channel) => by_channel,
                None => continue,
            };
            row.precinct_count += 1;
            row.registered += self.results.registered_total(*precinct_id);
            for channel in channels.iter() {
                row.voted += self.results.voted_total(*precinct_id, *channel);
                if let Some(choices) = by_channel.get(channel) {
                    for (total, choice_id) in row.choice_totals.iter_mut().zip(contest.choice_ids.iter()) {
                        *total += choices.get(choice_id).map(|s| s.total()).unwrap_or(0);
                    }
                }
            }
        }
        row
    }

    fn channel_label(&self, channels: &[ReportingChannel]) -> Option<&'static str> {
        if !self.meta.has_reporting_type {
            None
        } else if channels.len() == 1 {
            Some(channels[0].label())
        } else {
            Some("")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ResultsAggregator;
    use crate::decoder::LineLayout;
    use crate::metadata::MetadataBuilder;
    use crate::testing::{line, with_channel};

    fn index() -> PrecinctIndex {
        let mut index = PrecinctIndex::default();
        let d = |assembly, sup| {
            vec![
                (DistrictType::Assembly, assembly),
                (DistrictType::Bart, 8),
                (DistrictType::Congressional, 12),
                (DistrictType::Senatorial, 11),
                (DistrictType::Supervisorial, sup),
            ]
        };
        index.add_precinct(1101, "Pct 1101", &d(17, 6), "SOMA");
        index.add_precinct(1102, "Pct 1102", &d(17, 6), "MISSION");
        index.add_precinct(1103, "Pct 1103", &d(19, 9), "ZZ TOP");
        index
    }

    fn digest(lines: &[String]) -> (ElectionMeta, ResultsTree) {
        let mut b = MetadataBuilder::new(LineLayout::DEFAULT_LAYOUT);
        for l in lines {
            b.parse_line(l).unwrap();
        }
        let meta = b.finish();
        let mut agg = ResultsAggregator::new(&meta, LineLayout::DEFAULT_LAYOUT);
        for (i, l) in lines.iter().enumerate() {
            agg.parse_line(i + 1, l).unwrap();
        }
        let results = agg.finish();
        (meta, results)
    }

    fn simple_lines() -> Vec<String> {
        let mut lines = Vec::new();
        for (pid, reg, cast, a, b) in [(1101, 400, 100, 60, 40), (1102, 200, 50, 20, 30), (1103, 0, 0, 0, 0)] {
            let name = format!("Pct {}", pid);
            lines.push(line(&format!("0001001{}{:05}", pid, reg), "REGISTERED VOTERS - TOTAL", "VOTERS", &name, ""));
            lines.push(line(&format!("0002001{}{:05}", pid, cast), "BALLOTS CAST - TOTAL", "BALLOTS CAST", &name, ""));
            if pid != 1103 {
                lines.push(line(&format!("0100001{}{:05}", pid, a), "Mayor", "ALICE", &name, "CITY/COUNTY"));
                lines.push(line(&format!("0100002{}{:05}", pid, b), "Mayor", "BOB", &name, "CITY/COUNTY"));
            }
        }
        lines
    }

    #[test]
    fn turnout() {
        let mut row = AreaRow {
            name: "x".to_string(),
            channel_label: None,
            area_id: Cell::Text(CITY_AREA_ID.to_string()),
            precinct_count: 1,
            registered: 0,
            voted: 0,
            choice_totals: vec![],
        };
        assert_eq!(row.turnout(), "0.00");
        row.registered = 3;
        row.voted = 1;
        assert_eq!(row.turnout(), "33.33");
        row.registered = 150;
        row.voted = 150;
        assert_eq!(row.turnout(), "100.00");
    }

    #[test]
    fn simple_report() {
        let index = index();
        let (meta, results) = digest(&simple_lines());
        let report = ReportBuilder::new(&index, &meta, &results)
            .city_name("THE CITY")
            .build("Test Election", "today");
        assert!(!report.channel_split);
        assert_eq!(report.contests.len(), 1);
        let contest = &report.contests[0];
        assert_eq!(contest.title, "Mayor - CITY/COUNTY (100)");
        assert_eq!(contest.sheet_name, "100 - Mayor");

        assert_eq!(contest.lines[0], ReportLine::ContestStart(contest.title.clone()));
        assert_eq!(
            contest.lines[2],
            ReportLine::Header(
                [
                    "PrecinctName",
                    "PrecinctID",
                    "Precincts",
                    "Registration",
                    "Ballots Cast",
                    "Turnout (%)",
                    "ALICE",
                    "BOB"
                ]
                .iter()
                .map(|s| s.to_string())
                .collect()
            )
        );

        let names: Vec<&str> = contest.rows().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Pct 1101",
                "Pct 1102",
                GRAND_TOTALS,
                "12TH CONGRESSIONAL DISTRICT",
                "11TH SENATORIAL DISTRICT",
                "17TH ASSEMBLY DISTRICT",
                "BART DISTRICT 8",
                "SUPERVISORIAL DISTRICT 6",
                "THE CITY",
                "MISSION",
                "SOUTH OF MARKET",
                GRAND_TOTALS,
            ]
        );

        let rows: Vec<&AreaRow> = contest.rows().collect();
        assert_eq!(
            rows[0].cells(),
            vec![
                Cell::Text("Pct 1101".to_string()),
                Cell::Number(1101),
                Cell::Number(1),
                Cell::Number(400),
                Cell::Number(100),
                Cell::Text("25.00".to_string()),
                Cell::Number(60),
                Cell::Number(40),
            ]
        );
        let grand = rows[2];
        assert_eq!(grand.area_id, Cell::Text(CITY_AREA_ID.to_string()));
        assert_eq!(grand.precinct_count, 2);
        assert_eq!(grand.registered, 600);
        assert_eq!(grand.voted, 150);
        assert_eq!(grand.turnout(), "25.00");
        assert_eq!(grand.choice_totals, vec![80, 70]);
        assert_eq!(rows[5].area_id, Cell::Text("Assembly:17".to_string()));
        assert_eq!(rows[10].area_id, Cell::Text("Neighborhood:SOMA".to_string()));
        assert_eq!(rows.last().unwrap(), &grand);
    }

    #[test]
    fn channel_split_report() {
        let mut lines = Vec::new();
        for (pid, ed, vbm) in [(1101, (30, 20), (10, 5)), (1102, (1, 2), (3, 4)), (1103, (0, 0), (0, 0))] {
            let name = format!("Pct {}", pid);
            lines.push(with_channel(
                line(&format!("0001001{}00100", pid), "REGISTERED VOTERS - TOTAL", "VOTERS", &name, ""),
                "Election Day",
            ));
            for (channel, (a, cast)) in [("Election Day", ed), ("VBM", vbm)] {
                lines.push(with_channel(
                    line(&format!("0002001{}{:05}", pid, cast), "BALLOTS CAST - TOTAL", "BALLOTS CAST", &name, ""),
                    channel,
                ));
                lines.push(with_channel(
                    line(&format!("0100001{}{:05}", pid, a), "Mayor", "ALICE", &name, "CITY/COUNTY"),
                    channel,
                ));
            }
        }
        let index = index();
        let (meta, results) = digest(&lines);
        let report = ReportBuilder::new(&index, &meta, &results).build("Test Election", "today");
        assert!(report.channel_split);
        let contest = &report.contests[0];
        match &contest.lines[2] {
            ReportLine::Header(h) => assert_eq!(h[1], "ReportingType"),
            l => panic!("unexpected line: {:?}", l),
        }
        let rows: Vec<&AreaRow> = contest.rows().collect();
        // 3 precincts x 2 channels, then the grand totals per channel and overall.
        assert_eq!(rows[0].channel_label, Some("Election Day"));
        assert_eq!(rows[0].choice_totals, vec![30]);
        assert_eq!(rows[0].registered, 100);
        assert_eq!(rows[1].channel_label, Some("VBM"));
        assert_eq!(rows[1].choice_totals, vec![10]);
        assert_eq!(rows[1].registered, 100);
        assert_eq!(rows[6].name, GRAND_TOTALS);
        assert_eq!(rows[6].channel_label, Some("Election Day"));
        assert_eq!(rows[6].choice_totals, vec![31]);
        assert_eq!(rows[6].voted, 22);
        assert_eq!(rows[7].channel_label, Some("VBM"));
        assert_eq!(rows[7].voted, 9);
        assert_eq!(rows[8].channel_label, Some(""));
        assert_eq!(rows[8].choice_totals, vec![44]);
        assert_eq!(rows[8].voted, 31);
        assert_eq!(rows[8].registered, 300);
        assert_eq!(
            rows[8].cells()[..3],
            [
                Cell::Text(GRAND_TOTALS.to_string()),
                Cell::Text("".to_string()),
                Cell::Text(CITY_AREA_ID.to_string())
            ]
        );
    }

    #[test]
    fn unknown_neighborhood_uses_label() {
        let index = index();
        let mut lines = simple_lines();
        lines.push(line("0101003110300007", "Measure A", "YES", "Pct 1103", "DISTRICT 9"));
        let (meta, results) = digest(&lines);
        let report = ReportBuilder::new(&index, &meta, &results).build("T", "now");
        let measure = &report.contests[1];
        let names: Vec<&str> = measure.rows().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Pct 1103",
                GRAND_TOTALS,
                "12TH CONGRESSIONAL DISTRICT",
                "11TH SENATORIAL DISTRICT",
                "19TH ASSEMBLY DISTRICT",
                "BART DISTRICT 8",
                "SUPERVISORIAL DISTRICT 9",
                DEFAULT_CITY_NAME,
                "ZZ TOP",
                GRAND_TOTALS,
            ]
        );
    }
}
