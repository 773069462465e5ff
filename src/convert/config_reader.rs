use crate::convert::*;

use serde::{Deserialize, Serialize};

use std::collections::BTreeSet;

/// The contests kept by default in the test exports: the registration and
/// turnout summaries, plus a few contests of the reference elections.
pub const DEFAULT_TEST_CONTESTS: [u32; 6] = [1, 2, 120, 145, 150, 180];

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct LayoutSettings {
    #[serde(rename = "dataWidth")]
    pub data_width: Option<usize>,
    #[serde(rename = "contestNameWidth")]
    pub contest_name_width: Option<usize>,
    #[serde(rename = "choiceNameWidth")]
    pub choice_name_width: Option<usize>,
    #[serde(rename = "precinctNameWidth")]
    pub precinct_name_width: Option<usize>,
    #[serde(rename = "districtNameWidth")]
    pub district_name_width: Option<usize>,
    #[serde(rename = "reportingTypeWidth")]
    pub reporting_type_width: Option<usize>,
}

/// The content of the JSON configuration file. All the fields are optional.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConverterConfig {
    pub layout: Option<LayoutSettings>,
    #[serde(rename = "cityName")]
    pub city_name: Option<String>,
    #[serde(rename = "auditPrecincts")]
    pub audit_precincts: Option<Vec<PrecinctId>>,
    #[serde(rename = "testContests")]
    pub test_contests: Option<Vec<u32>>,
    #[serde(rename = "testPrecincts")]
    pub test_precincts: Option<Vec<PrecinctId>>,
}

/// The configuration once validated, with all the defaults filled in.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub layout: LineLayout,
    pub city_name: String,
    pub audit_precincts: BTreeSet<PrecinctId>,
    pub test_contests: BTreeSet<u32>,
    pub test_precincts: Vec<PrecinctId>,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            layout: LineLayout::DEFAULT_LAYOUT,
            city_name: DEFAULT_CITY_NAME.to_string(),
            audit_precincts: BTreeSet::new(),
            test_contests: DEFAULT_TEST_CONTESTS.iter().cloned().collect(),
            test_precincts: Vec::new(),
        }
    }
}

pub fn read_config(path: &str) -> ConvertResult<ConverterConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read config: {:?}", contents);
    parse_config(&contents, path)
}

pub fn parse_config(contents: &str, path: &str) -> ConvertResult<ConverterConfig> {
    serde_json::from_str(contents).context(ParsingJsonSnafu { path })
}

/// Reads and validates the configuration file, or returns the default
/// settings when no file is given.
pub fn load_settings(config_path: Option<&str>) -> ConvertResult<Settings> {
    match config_path {
        Some(path) => {
            info!("reading configuration: {}", path);
            let config = read_config(path)?;
            validate_config(&config)
        }
        None => Ok(Settings::default()),
    }
}

pub fn validate_config(config: &ConverterConfig) -> ConvertResult<Settings> {
    let defaults = Settings::default();
    let layout = match &config.layout {
        Some(layout) => validate_layout(layout)?,
        None => defaults.layout,
    };
    let city_name = match &config.city_name {
        Some(name) if name.trim().is_empty() => {
            whatever!("cityName may not be empty")
        }
        Some(name) => name.clone(),
        None => defaults.city_name,
    };
    let settings = Settings {
        layout,
        city_name,
        audit_precincts: config
            .audit_precincts
            .clone()
            .map(|ids| ids.into_iter().collect())
            .unwrap_or(defaults.audit_precincts),
        test_contests: config
            .test_contests
            .clone()
            .map(|ids| ids.into_iter().collect())
            .unwrap_or(defaults.test_contests),
        test_precincts: config
            .test_precincts
            .clone()
            .unwrap_or(defaults.test_precincts),
    };
    debug!("settings: {:?}", settings);
    Ok(settings)
}

fn check_width(field: &str, width: Option<usize>, default: usize, minimum: usize) -> ConvertResult<usize> {
    let width = width.unwrap_or(default);
    ensure!(
        width >= minimum,
        InvalidLayoutSnafu {
            field,
            width,
            minimum
        }
    );
    Ok(width)
}

pub fn validate_layout(layout: &LayoutSettings) -> ConvertResult<LineLayout> {
    let d = LineLayout::DEFAULT_LAYOUT;
    Ok(LineLayout {
        data_width: check_width("dataWidth", layout.data_width, d.data_width, DATA_CHUNK_MIN_LEN)?,
        contest_name_width: check_width(
            "contestNameWidth",
            layout.contest_name_width,
            d.contest_name_width,
            1,
        )?,
        choice_name_width: check_width(
            "choiceNameWidth",
            layout.choice_name_width,
            d.choice_name_width,
            1,
        )?,
        precinct_name_width: check_width(
            "precinctNameWidth",
            layout.precinct_name_width,
            d.precinct_name_width,
            1,
        )?,
        district_name_width: check_width(
            "districtNameWidth",
            layout.district_name_width,
            d.district_name_width,
            1,
        )?,
        reporting_type_width: check_width(
            "reportingTypeWidth",
            layout.reporting_type_width,
            d.reporting_type_width,
            1,
        )?,
    })
}
