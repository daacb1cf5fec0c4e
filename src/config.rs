extern crate anyhow;
extern crate chrono_tz;
extern crate serde;
extern crate serde_json;

use anyhow::Context;

use crate::layout::LayoutVariant;
use crate::result;
use crate::structs::ArrivalsSnapshot;

// sudo apt-get install fonts-dejavu-core (or fonts-roboto)
const REGULAR_FONTS: [&str; 3] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/roboto/hinted/RobotoCondensed-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
];

const BOLD_FONTS: [&str; 3] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/roboto/hinted/RobotoCondensed-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub variant: String,
    pub timezone: String,
    pub snapshot_path: Option<String>,
    // Header to show when the first train carries no LocationName.
    pub station_name: Option<String>,
    pub poll_seconds: u64,
    pub tick_seconds: u64,
    // Overrides the variant's own interval when set.
    pub full_clear_interval: Option<u32>,
    pub regular_fonts: Vec<String>,
    pub bold_fonts: Vec<String>,
}

impl Default for Settings {
    fn default() -> Settings {
        return Settings {
            variant: LayoutVariant::CompactLedger.name().to_string(),
            timezone: "America/New_York".to_string(),
            snapshot_path: None,
            station_name: None,
            poll_seconds: 60,
            tick_seconds: 5,
            full_clear_interval: None,
            regular_fonts: REGULAR_FONTS.iter().map(|s| s.to_string()).collect(),
            bold_fonts: BOLD_FONTS.iter().map(|s| s.to_string()).collect(),
        };
    }
}

impl Settings {
    pub fn from_json(raw_json: &str) -> result::MetroResult<Settings> {
        let settings: Settings = serde_json::from_str(raw_json)
            .context("while parsing settings")?;
        return Ok(settings);
    }

    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> result::MetroResult<Settings> {
        let debug_path = path.as_ref().display().to_string();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Opening settings from '{}'", debug_path))?;
        let reader = std::io::BufReader::new(file);
        let settings: Settings = serde_json::from_reader(reader)
            .with_context(|| format!("while parsing settings from '{}'", debug_path))?;
        return Ok(settings);
    }

    pub fn variant(&self) -> result::MetroResult<LayoutVariant> {
        return LayoutVariant::from_name(&self.variant).ok_or_else(|| {
            let known: Vec<&str> = LayoutVariant::ALL.iter().map(|v| v.name()).collect();
            result::make_error(&format!("Unknown variant '{}', expected one of {:?}", self.variant, known))
        });
    }

    pub fn timezone(&self) -> result::MetroResult<chrono_tz::Tz> {
        return self.timezone.parse::<chrono_tz::Tz>().map_err(|err| result::make_error(
            &format!("Unknown timezone '{}': {}", self.timezone, err)));
    }

    // Reads the snapshot file and names its station from these settings.
    pub fn load_snapshot(&self, path: &str) -> result::MetroResult<ArrivalsSnapshot> {
        let mut snapshot = ArrivalsSnapshot::from_file(path)?;
        snapshot.station_name = self.station_name.clone();
        return Ok(snapshot);
    }

    pub fn full_clear_interval(&self) -> u32 {
        return self.full_clear_interval.unwrap_or(self.variant().map(|v| v.spec().full_clear_interval).unwrap_or(10));
    }
}
