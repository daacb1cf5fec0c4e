extern crate serde;
extern crate serde_json;

use crate::result;

use anyhow::Context;

// Upper bound on the rows any layout draws, and on what DisplayState keeps.
pub const MAX_ROWS: usize = 4;

pub const NO_SERVICE: &str = "No Service";

fn default_line() -> String {
    return "--".to_string();
}

fn default_name() -> String {
    return "Unknown".to_string();
}

fn default_min() -> String {
    return "-".to_string();
}

// Upstream sometimes sends null, or a bare number where a string belongs.
// Numbers keep their text; anything else reads as absent.
fn loose_text(value: Option<serde_json::Value>) -> Option<String> {
    match value {
        Some(serde_json::Value::String(text)) => return Some(text),
        Some(serde_json::Value::Number(n)) => return Some(n.to_string()),
        _ => return None,
    }
}

fn deserialize_loose<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = <Option<serde_json::Value> as serde::Deserialize>::deserialize(deserializer)?;
    return Ok(loose_text(value));
}

fn loose_line<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    return Ok(deserialize_loose(deserializer)?.unwrap_or_else(default_line));
}

fn loose_name<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    return Ok(deserialize_loose(deserializer)?.unwrap_or_else(default_name));
}

fn loose_min<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    return Ok(deserialize_loose(deserializer)?.unwrap_or_else(default_min));
}

fn loose_trains<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Vec<ArrivalRecord>, D::Error> {
    let trains = <Option<Vec<ArrivalRecord>> as serde::Deserialize>::deserialize(deserializer)?;
    return Ok(trains.unwrap_or_default());
}

// One entry of the "Trains" array of a StationPrediction response. Missing
// keys, nulls and values of the wrong type fall back to the same
// placeholders the board prints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArrivalRecord {
    #[serde(rename = "Line", default = "default_line", deserialize_with = "loose_line")]
    pub line: String,

    #[serde(rename = "DestinationName", default = "default_name", deserialize_with = "loose_name")]
    pub destination_name: String,

    #[serde(rename = "LocationName", default = "default_name", deserialize_with = "loose_name")]
    pub location_name: String,

    #[serde(rename = "Car", default, deserialize_with = "deserialize_loose")]
    pub car: Option<String>,

    #[serde(rename = "Min", default = "default_min", deserialize_with = "loose_min")]
    pub min: String,
}

impl ArrivalRecord {
    pub fn minutes(&self) -> Minutes {
        return Minutes::parse(&self.min);
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArrivalsSnapshot {
    #[serde(rename = "Trains", default, deserialize_with = "loose_trains")]
    pub trains: Vec<ArrivalRecord>,

    // Not part of the upstream payload; the configured station name, used
    // when the first train's LocationName is missing.
    #[serde(skip)]
    pub station_name: Option<String>,
}

impl ArrivalsSnapshot {
    pub fn empty() -> ArrivalsSnapshot {
        return ArrivalsSnapshot{
            trains: vec![],
            station_name: None,
        };
    }

    pub fn from_json(raw_json: &str) -> result::MetroResult<ArrivalsSnapshot> {
        let snapshot: ArrivalsSnapshot = serde_json::from_str(raw_json)
            .context("while parsing arrivals snapshot")?;
        return Ok(snapshot);
    }

    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> result::MetroResult<ArrivalsSnapshot> {
        let debug_path = path.as_ref().display().to_string();
        let raw_json = std::fs::read_to_string(path)
            .with_context(|| format!("Reading arrivals snapshot from '{}'", debug_path))?;
        return ArrivalsSnapshot::from_json(&raw_json);
    }

    // Header text for this snapshot: the first train's location, or the
    // fixed no-service banner when nothing is predicted.
    pub fn header(&self) -> String {
        match self.trains.first() {
            None => return NO_SERVICE.to_string(),
            Some(first) => {
                if first.location_name != default_name() || self.station_name.is_none() {
                    return first.location_name.clone();
                }
                return self.station_name.clone().unwrap_or_else(default_name);
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Minutes {
    Arriving,
    Boarding,
    Count(u32),
    Unknown,
}

impl Minutes {
    pub fn parse(raw: &str) -> Minutes {
        let raw = raw.trim();
        match raw {
            "ARR" => return Minutes::Arriving,
            "BRD" => return Minutes::Boarding,
            _ => {},
        }
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
            return Minutes::Unknown;
        }
        // All digits, so the only failure left is overflow.
        return Minutes::Count(raw.parse::<u32>().unwrap_or(u32::MAX));
    }
}
