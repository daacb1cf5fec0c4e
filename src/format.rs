extern crate chrono;

use crate::structs::Minutes;

pub const TRUNCATION_MARKER: char = '.';
pub const UNKNOWN_DASH: &str = "-";

// How a variant spells out a numeric countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinutesStyle {
    // "12 mins" in a single run of text.
    Suffix,
    // "12" in the numeral face followed by a small "min" caption.
    Split,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrivalText {
    Plain(String),
    Split { numeral: String, unit: String },
}

impl std::fmt::Display for ArrivalText {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            ArrivalText::Plain(ref text) => return write!(f, "{}", text),
            ArrivalText::Split { ref numeral, ref unit } => return write!(f, "{} {}", numeral, unit),
        }
    }
}

pub fn format_time<T: chrono::Timelike>(now: &T) -> String {
    let (is_pm, hour) = now.hour12();
    return format!("{}:{:02} {}", hour, now.minute(), if is_pm { "PM" } else { "AM" });
}

pub fn format_destination(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut truncated: String = text.chars().take(max_chars - 1).collect();
    truncated.push(TRUNCATION_MARKER);
    return truncated;
}

// Countdowns keep the digits exactly as they arrived ("007" stays "007").
pub fn format_minutes(raw: &str, style: MinutesStyle) -> ArrivalText {
    match Minutes::parse(raw) {
        Minutes::Arriving => return ArrivalText::Plain("ARR".to_string()),
        Minutes::Boarding => return ArrivalText::Plain("BRD".to_string()),
        Minutes::Unknown => return ArrivalText::Plain(UNKNOWN_DASH.to_string()),
        Minutes::Count(_) => {
            let digits = raw.trim();
            match style {
                MinutesStyle::Suffix => return ArrivalText::Plain(format!("{} mins", digits)),
                MinutesStyle::Split => return ArrivalText::Split {
                    numeral: digits.to_string(),
                    unit: "min".to_string(),
                },
            }
        },
    }
}

pub fn format_car(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(car) if !car.is_empty() => return car.to_string(),
        _ => return UNKNOWN_DASH.to_string(),
    }
}
