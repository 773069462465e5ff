// ********* Catalog data structures ***********

use log::{info, warn};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

pub type PrecinctId = u32;
pub type ChoiceId = u32;
pub type VoteTotal = i64;

/// The name given to the undervote pseudo-choice by the reporting tool.
pub const UNDER_VOTE: &str = "Under Vote";
/// The name given to the overvote pseudo-choice by the reporting tool.
pub const OVER_VOTE: &str = "Over Vote";

/// Identifies a contest.
///
/// Contest numbers are reused by unrelated contests in some exports, so the
/// raw contest name is part of the key. Ordering is by number, then name.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct ContestId {
    pub number: u32,
    pub name: String,
}

impl ContestId {
    pub fn new(number: u32, name: &str) -> ContestId {
        ContestId {
            number,
            name: name.to_string(),
        }
    }
}

impl Display for ContestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.number)
    }
}

/// Metadata about a contest (but not results).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Contest {
    pub id: ContestId,
    /// Name shown in reports. Equal to the raw name unless another contest
    /// number uses the same raw name.
    pub display_name: String,
    pub district_name: String,
    /// Set when the contest is specific to one party.
    pub party_code: String,
    /// Filled in after the whole metadata pass, see
    /// [ElectionMeta::link_choices_to_contests].
    pub choice_ids: BTreeSet<ChoiceId>,
    pub precinct_ids: BTreeSet<PrecinctId>,
}

impl Contest {
    pub fn new(id: ContestId, district_name: &str, party_code: &str) -> Contest {
        Contest {
            display_name: id.name.clone(),
            id,
            district_name: district_name.to_string(),
            party_code: party_code.to_string(),
            choice_ids: BTreeSet::new(),
            precinct_ids: BTreeSet::new(),
        }
    }

    /// The contest title used at the start of each report section.
    pub fn title(&self) -> String {
        format!(
            "{} - {} ({})",
            self.display_name, self.district_name, self.id.number
        )
    }
}

/// A candidate or option, or one of the undervote/overvote pseudo-choices.
///
/// `contest` is `None` for the pseudo-choices since they belong to every
/// contest.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Choice {
    pub contest: Option<ContestId>,
    pub name: String,
}

impl Choice {
    /// Builds the choice seen on a contest line.
    pub fn for_contest(contest: &ContestId, name: &str) -> Choice {
        let contest = if Choice::is_pseudo_choice(name) {
            None
        } else {
            Some(contest.clone())
        };
        Choice {
            contest,
            name: name.to_string(),
        }
    }

    pub fn is_pseudo_choice(name: &str) -> bool {
        name == UNDER_VOTE || name == OVER_VOTE
    }
}

impl Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.contest {
            Some(c) => write!(f, "{:?} in contest {}", self.name, c),
            None => write!(f, "{:?} in every contest", self.name),
        }
    }
}

/// A party subgroup found on the "REGISTERED VOTERS - <subgroup>" and
/// "BALLOTS CAST - <subgroup>" summary lines.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Party {
    pub code: String,
    pub name: String,
}

impl Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// The sub-total dimension of the vote totals.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum ReportingChannel {
    /// The file does not split totals.
    All,
    ElectionDay,
    VoteByMail,
}

impl ReportingChannel {
    pub const SIMPLE: &'static [ReportingChannel] = &[ReportingChannel::All];
    pub const COMPLETE: &'static [ReportingChannel] =
        &[ReportingChannel::ElectionDay, ReportingChannel::VoteByMail];

    /// The channels present in a file, depending on its format variant.
    pub fn active(has_reporting_type: bool) -> &'static [ReportingChannel] {
        if has_reporting_type {
            ReportingChannel::COMPLETE
        } else {
            ReportingChannel::SIMPLE
        }
    }

    /// The label of the channel in the reports.
    pub fn label(&self) -> &'static str {
        match self {
            ReportingChannel::All => "",
            ReportingChannel::ElectionDay => "Election Day",
            ReportingChannel::VoteByMail => "VBM",
        }
    }
}

/// Election metadata (but not results), as built by the first pass.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ElectionMeta {
    pub contests: BTreeMap<ContestId, Contest>,
    pub choices: BTreeMap<ChoiceId, Choice>,
    pub parties: BTreeMap<ChoiceId, Party>,
    pub precinct_names: BTreeMap<PrecinctId, String>,
    pub undervote_id: Option<ChoiceId>,
    pub overvote_id: Option<ChoiceId>,
    pub has_reporting_type: bool,
}

impl ElectionMeta {
    pub fn channels(&self) -> &'static [ReportingChannel] {
        ReportingChannel::active(self.has_reporting_type)
    }

    /// Adds every choice to the contests it belongs to. The undervote and
    /// overvote choices belong to all the contests.
    pub fn link_choices_to_contests(&mut self) {
        for (choice_id, choice) in self.choices.iter() {
            match &choice.contest {
                Some(contest_id) => {
                    if let Some(contest) = self.contests.get_mut(contest_id) {
                        contest.choice_ids.insert(*choice_id);
                    }
                }
                None => {
                    for contest in self.contests.values_mut() {
                        contest.choice_ids.insert(*choice_id);
                    }
                }
            }
        }
    }

    /// Prefixes the party code to the display name of the contests whose
    /// raw name is shared by several contest numbers.
    pub fn disambiguate_contest_names(&mut self) {
        let mut numbers_by_name: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
        for id in self.contests.keys() {
            numbers_by_name
                .entry(id.name.clone())
                .or_default()
                .insert(id.number);
        }
        for contest in self.contests.values_mut() {
            let shared = numbers_by_name
                .get(&contest.id.name)
                .map(|numbers| numbers.len() > 1)
                .unwrap_or(false);
            if !shared {
                continue;
            }
            if contest.party_code.is_empty() {
                warn!(
                    "contest {} shares its name with another contest number but has no party code",
                    contest.id
                );
                continue;
            }
            contest.display_name = format!("{} {}", contest.party_code, contest.id.name);
            info!(
                "renamed contest {} to: {}",
                contest.id,
                contest.display_name
            );
        }
    }

    /// The name of a choice, as displayed in the reports.
    pub fn choice_name(&self, choice_id: ChoiceId) -> Option<&str> {
        self.choices.get(&choice_id).map(|c| c.name.as_str())
    }
}

// ********* Results data structures ***********

/// A single vote total in the results tree.
///
/// Every slot starts at zero and may be filled exactly once.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct VoteSlot {
    total: VoteTotal,
    filled: bool,
}

impl VoteSlot {
    pub fn total(&self) -> VoteTotal {
        self.total
    }

    pub fn is_filled(&self) -> bool {
        self.filled
    }

    /// Stores a total. Returns the previous total if the slot was already filled.
    pub fn fill(&mut self, total: VoteTotal) -> Result<(), VoteTotal> {
        if self.filled {
            return Err(self.total);
        }
        self.total = total;
        self.filled = true;
        Ok(())
    }
}

pub type ChoiceTotals = BTreeMap<ChoiceId, VoteSlot>;
pub type ChannelTotals = BTreeMap<ReportingChannel, ChoiceTotals>;
pub type ContestResults = BTreeMap<PrecinctId, ChannelTotals>;

/// The vote totals, as built by the second pass.
///
/// The shape is fixed from the [ElectionMeta] before any total is read.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ResultsTree {
    pub channels: Vec<ReportingChannel>,
    pub contests: BTreeMap<ContestId, ContestResults>,
    pub registered: BTreeMap<PrecinctId, VoteSlot>,
    pub voted: BTreeMap<PrecinctId, BTreeMap<ReportingChannel, VoteSlot>>,
}

impl ResultsTree {
    /// Builds a zeroed tree with an entry for every contest, precinct,
    /// channel and choice known to the metadata.
    pub fn zeroed(meta: &ElectionMeta) -> ResultsTree {
        let channels = meta.channels().to_vec();
        let mut contests: BTreeMap<ContestId, ContestResults> = BTreeMap::new();
        for (contest_id, contest) in meta.contests.iter() {
            let zero_choices: ChoiceTotals = contest
                .choice_ids
                .iter()
                .map(|cid| (*cid, VoteSlot::default()))
                .collect();
            let contest_results: ContestResults = contest
                .precinct_ids
                .iter()
                .map(|pid| {
                    let by_channel: ChannelTotals = channels
                        .iter()
                        .map(|ch| (*ch, zero_choices.clone()))
                        .collect();
                    (*pid, by_channel)
                })
                .collect();
            contests.insert(contest_id.clone(), contest_results);
        }

        let registered = meta
            .precinct_names
            .keys()
            .map(|pid| (*pid, VoteSlot::default()))
            .collect();
        let voted = meta
            .precinct_names
            .keys()
            .map(|pid| {
                let by_channel = channels
                    .iter()
                    .map(|ch| (*ch, VoteSlot::default()))
                    .collect();
                (*pid, by_channel)
            })
            .collect();

        ResultsTree {
            channels,
            contests,
            registered,
            voted,
        }
    }

    pub fn registered_total(&self, precinct_id: PrecinctId) -> VoteTotal {
        self.registered
            .get(&precinct_id)
            .map(|s| s.total())
            .unwrap_or(0)
    }

    pub fn voted_total(&self, precinct_id: PrecinctId, channel: ReportingChannel) -> VoteTotal {
        self.voted
            .get(&precinct_id)
            .and_then(|m| m.get(&channel))
            .map(|s| s.total())
            .unwrap_or(0)
    }
}

// ********* Areas ***********

/// The district types found in the precinct index.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum DistrictType {
    Assembly,
    Bart,
    Congressional,
    Senatorial,
    Supervisorial,
}

impl DistrictType {
    /// The order of the district columns in the precinct index.
    pub const INDEX_COLUMNS: [DistrictType; 5] = [
        DistrictType::Assembly,
        DistrictType::Bart,
        DistrictType::Congressional,
        DistrictType::Senatorial,
        DistrictType::Supervisorial,
    ];

    /// The order of the district rollups in the reports.
    pub const REPORT_ORDER: [DistrictType; 5] = [
        DistrictType::Congressional,
        DistrictType::Senatorial,
        DistrictType::Assembly,
        DistrictType::Bart,
        DistrictType::Supervisorial,
    ];

    /// The column header in the precinct index, also used in area labels.
    pub fn header(&self) -> &'static str {
        match self {
            DistrictType::Assembly => "Assembly",
            DistrictType::Bart => "BART",
            DistrictType::Congressional => "Congressional",
            DistrictType::Senatorial => "Senatorial",
            DistrictType::Supervisorial => "Supervisorial",
        }
    }

    /// The human-readable name of a district, as in the Statement of Vote.
    pub fn area_name(&self, district: u32) -> String {
        match self {
            DistrictType::Assembly => format!("{}TH ASSEMBLY DISTRICT", district),
            DistrictType::Bart => format!("BART DISTRICT {}", district),
            DistrictType::Congressional => format!("{}TH CONGRESSIONAL DISTRICT", district),
            DistrictType::Senatorial => format!("{}TH SENATORIAL DISTRICT", district),
            DistrictType::Supervisorial => format!("SUPERVISORIAL DISTRICT {}", district),
        }
    }
}

/// Mapping from the neighborhood labels of the precinct index to the names
/// used in the Statement of Vote.
pub const NEIGHBORHOODS: &[(&str, &str)] = &[
    ("BAYVW/HTRSPT", "BAYVIEW/HUNTERS POINT"),
    ("CHINA", "CHINATOWN"),
    ("CVC CTR/DWTN", "CIVIC CENTER/DOWNTOWN"),
    ("DIAMD HTS", "DIAMOND HEIGHTS"),
    ("EXCELSIOR", "EXCELSIOR (OUTER MISSION)"),
    ("HAIGHT ASH", "HAIGHT ASHBURY"),
    ("INGLESIDE", "INGLESIDE"),
    ("INNER SUNSET", "INNER SUNSET"),
    ("LAKE MERCED", "LAKE MERCED"),
    ("LRL HTS/ANZA", "LAUREL HEIGHTS/ANZA VISTA"),
    ("MAR/PAC HTS", "MARINA/PACIFIC HEIGHTS"),
    ("MISSION", "MISSION"),
    ("N BERNAL HTS", "NORTH BERNAL HTS"),
    ("N EMBRCDRO", "NORTH EMBARCADERO"),
    ("NOE VALLEY", "NOE VALLEY"),
    ("PORTOLA", "PORTOLA"),
    ("POTRERO HILL", "POTRERO HILL"),
    ("RICHMOND", "RICHMOND"),
    ("S BERNAL HTS", "SOUTH BERNAL HEIGHT"),
    ("SECLF/PREHTS", "SEA CLIFF/PRESIDIO HEIGHTS"),
    ("SOMA", "SOUTH OF MARKET"),
    ("SUNSET", "SUNSET"),
    ("UPRMKT/EURKA", "UPPER MARKET/EUREKA VALLEY"),
    ("VISITA VLY", "VISITATION VALLEY"),
    ("W TWIN PKS", "WEST OF TWIN PEAKS"),
    ("WST ADDITION", "WESTERN ADDITION"),
];

pub fn neighborhood_name(label: &str) -> Option<&'static str> {
    NEIGHBORHOODS
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, name)| *name)
}

/// The precinct-to-district index.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PrecinctIndex {
    pub all_precinct_ids: BTreeSet<PrecinctId>,
    pub precinct_names: BTreeMap<PrecinctId, String>,
    pub districts: BTreeMap<DistrictType, BTreeMap<u32, BTreeSet<PrecinctId>>>,
    pub neighborhoods: BTreeMap<String, BTreeSet<PrecinctId>>,
}

impl PrecinctIndex {
    pub fn district_areas(&self, district_type: DistrictType) -> Option<&BTreeMap<u32, BTreeSet<PrecinctId>>> {
        self.districts.get(&district_type)
    }

    /// Adds a precinct. Returns false (and changes nothing) if the precinct
    /// was already registered.
    pub fn add_precinct(
        &mut self,
        precinct_id: PrecinctId,
        name: &str,
        districts: &[(DistrictType, u32)],
        neighborhood: &str,
    ) -> bool {
        if self.precinct_names.contains_key(&precinct_id) {
            return false;
        }
        self.precinct_names.insert(precinct_id, name.to_string());
        for (district_type, district) in districts.iter() {
            self.districts
                .entry(*district_type)
                .or_default()
                .entry(*district)
                .or_default()
                .insert(precinct_id);
        }
        self.neighborhoods
            .entry(neighborhood.to_string())
            .or_default()
            .insert(precinct_id);
        self.all_precinct_ids.insert(precinct_id);
        true
    }
}
