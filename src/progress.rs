use crate::structs::{ArrivalRecord, Minutes};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    // Train is in the station (or its countdown is unusable); nothing to draw.
    Arrived,
    Filling { px_per_minute: f32 },
}

pub fn progress(total_minutes: i64, panel_width: u32) -> Progress {
    if total_minutes <= 0 {
        return Progress::Arrived;
    }
    return Progress::Filling {
        px_per_minute: panel_width as f32 / total_minutes as f32,
    };
}

// First countdown seen for the highlighted train, so later snapshots can
// report how much of the wait has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    line: String,
    destination: String,
    total_minutes: u32,
}

impl Baseline {
    // Returns the baseline to carry forward after `train` became the
    // highlighted one. A different train, or one whose countdown went up,
    // starts a new wait.
    pub fn track(previous: Option<&Baseline>, train: &ArrivalRecord) -> Option<Baseline> {
        let remaining = match train.minutes() {
            Minutes::Count(n) => n,
            _ => {
                return previous
                    .filter(|b| b.line == train.line && b.destination == train.destination_name)
                    .cloned();
            },
        };

        if let Some(prev) = previous {
            if prev.line == train.line
                && prev.destination == train.destination_name
                && remaining <= prev.total_minutes {
                return Some(prev.clone());
            }
        }

        return Some(Baseline {
            line: train.line.clone(),
            destination: train.destination_name.clone(),
            total_minutes: remaining,
        });
    }

    pub fn total_minutes(&self) -> u32 {
        return self.total_minutes;
    }
}

// Width in pixels of the filled part of a `track_width` wide bar.
pub fn fill_width(baseline: &Baseline, remaining: Minutes, track_width: u32) -> Option<u32> {
    let remaining = match remaining {
        Minutes::Count(n) => n,
        _ => return None,
    };
    match progress(baseline.total_minutes as i64, track_width) {
        Progress::Arrived => return None,
        Progress::Filling { px_per_minute } => {
            let elapsed = baseline.total_minutes.saturating_sub(remaining);
            let px = (elapsed as f32 * px_per_minute).round() as u32;
            return Some(std::cmp::min(px, track_width));
        },
    }
}
