use crate::drawing::{Face, Glyphs};
use crate::format;
use crate::format::{ArrivalText, MinutesStyle};
use crate::structs::{ArrivalRecord, MAX_ROWS};

// Space kept between a truncated header and the clock.
const HEADER_GAP: i32 = 4;
// Space between a split numeral and its unit caption.
const CAPTION_GAP: i32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text { x: i32, y: i32, content: String, face: Face, size: f32 },
    Line { x0: i32, y0: i32, x1: i32, y1: i32 },
    Rect { x: i32, y: i32, w: u32, h: u32, filled: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutVariant {
    CompactLedger,
    ShiftedLedger,
    LargeSingleTrain,
}

impl LayoutVariant {
    pub const ALL: [LayoutVariant; 3] = [
        LayoutVariant::CompactLedger,
        LayoutVariant::ShiftedLedger,
        LayoutVariant::LargeSingleTrain,
    ];

    pub fn spec(self) -> &'static VariantSpec {
        match self {
            LayoutVariant::CompactLedger => return &COMPACT_LEDGER,
            LayoutVariant::ShiftedLedger => return &SHIFTED_LEDGER,
            LayoutVariant::LargeSingleTrain => return &LARGE_SINGLE_TRAIN,
        }
    }

    pub fn name(self) -> &'static str {
        return self.spec().name;
    }

    pub fn from_name(name: &str) -> Option<LayoutVariant> {
        return LayoutVariant::ALL.iter().cloned().find(|v| v.name() == name);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Line,
    Destination,
    Car,
    Arrival,
}

#[derive(Debug)]
pub struct Column {
    pub field: Field,
    pub label: &'static str,
    pub x: i32,
}

// What happens to a station name that runs into the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPolicy {
    // Drawn as-is; a long name may overlap the time.
    Untruncated,
    MaxChars(usize),
    // Shortened (with the truncation marker) until it ends before the time.
    FitBeforeTime,
}

#[derive(Debug)]
pub struct FontSizes {
    pub header: f32,
    pub caption: f32,
    pub row: f32,
    pub numeral: f32,
}

#[derive(Debug)]
pub enum Body {
    Ledger {
        column_header_y: i32,
        columns: &'static [Column],
        row_origin_y: i32,
        row_pitch: i32,
        max_rows: usize,
    },
    SingleTrain {
        line_size: f32,
        top_y: i32,
        destination_x: i32,
        numeral_x: i32,
        next_y: i32,
        bar_height: u32,
    },
}

// Everything that differs between the board designs.
#[derive(Debug)]
pub struct VariantSpec {
    pub name: &'static str,
    pub inset: i32,
    pub header_y: i32,
    pub separator_y: Option<i32>,
    pub header_policy: HeaderPolicy,
    pub sizes: FontSizes,
    pub destination_max_chars: usize,
    pub minutes_style: MinutesStyle,
    pub full_clear_interval: u32,
    pub body: Body,
}

impl VariantSpec {
    pub fn shows_progress(&self) -> bool {
        match self.body {
            Body::SingleTrain { .. } => return true,
            Body::Ledger { .. } => return false,
        }
    }

    pub fn row_limit(&self) -> usize {
        match self.body {
            Body::Ledger { max_rows, .. } => return std::cmp::min(max_rows, MAX_ROWS),
            // the highlighted train plus the "next" caption
            Body::SingleTrain { .. } => return 2,
        }
    }

    pub fn progress_track_width(&self, panel_width: u32) -> u32 {
        return panel_width.saturating_sub(2 * self.inset as u32);
    }
}

static COMPACT_COLUMNS: [Column; 4] = [
    Column { field: Field::Line, label: "Ln", x: 5 },
    Column { field: Field::Destination, label: "Destination", x: 40 },
    Column { field: Field::Car, label: "Car", x: 160 },
    Column { field: Field::Arrival, label: "Arrival", x: 195 },
];

static SHIFTED_COLUMNS: [Column; 4] = [
    Column { field: Field::Line, label: "Ln", x: 4 },
    Column { field: Field::Car, label: "Car", x: 30 },
    Column { field: Field::Destination, label: "Destination", x: 58 },
    Column { field: Field::Arrival, label: "Min", x: 184 },
];

pub static COMPACT_LEDGER: VariantSpec = VariantSpec {
    name: "compact-ledger",
    inset: 5,
    header_y: 2,
    separator_y: Some(17),
    header_policy: HeaderPolicy::Untruncated,
    sizes: FontSizes { header: 14.0, caption: 12.0, row: 16.0, numeral: 16.0 },
    destination_max_chars: 14,
    minutes_style: MinutesStyle::Suffix,
    full_clear_interval: 10,
    body: Body::Ledger {
        column_header_y: 20,
        columns: &COMPACT_COLUMNS,
        row_origin_y: 38,
        row_pitch: 20,
        max_rows: 4,
    },
};

pub static SHIFTED_LEDGER: VariantSpec = VariantSpec {
    name: "shifted-ledger",
    inset: 4,
    header_y: 2,
    separator_y: Some(18),
    header_policy: HeaderPolicy::FitBeforeTime,
    sizes: FontSizes { header: 14.0, caption: 11.0, row: 15.0, numeral: 18.0 },
    destination_max_chars: 13,
    minutes_style: MinutesStyle::Split,
    full_clear_interval: 10,
    body: Body::Ledger {
        column_header_y: 21,
        columns: &SHIFTED_COLUMNS,
        row_origin_y: 36,
        row_pitch: 20,
        max_rows: 4,
    },
};

pub static LARGE_SINGLE_TRAIN: VariantSpec = VariantSpec {
    name: "large-single-train",
    inset: 5,
    header_y: 2,
    separator_y: Some(17),
    header_policy: HeaderPolicy::FitBeforeTime,
    sizes: FontSizes { header: 14.0, caption: 12.0, row: 16.0, numeral: 40.0 },
    destination_max_chars: 13,
    minutes_style: MinutesStyle::Split,
    full_clear_interval: 60,
    body: Body::SingleTrain {
        line_size: 30.0,
        top_y: 24,
        destination_x: 50,
        numeral_x: 170,
        next_y: 76,
        bar_height: 10,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct RowFields {
    pub line: String,
    pub destination: String,
    pub car: String,
    pub arrival: ArrivalText,
}

impl RowFields {
    pub fn from_record(spec: &VariantSpec, train: &ArrivalRecord) -> RowFields {
        return RowFields {
            line: train.line.clone(),
            destination: format::format_destination(&train.destination_name, spec.destination_max_chars),
            car: format::format_car(train.car.as_ref().map(String::as_str)),
            arrival: format::format_minutes(&train.min, spec.minutes_style),
        };
    }
}

// Display-ready content of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub header: String,
    pub time_text: String,
    pub rows: Vec<RowFields>,
    // Filled pixels of the progress bar; None leaves the bar off entirely.
    pub progress_fill: Option<u32>,
}

impl Frame {
    pub fn build(spec: &VariantSpec, header: &str, time_text: &str,
                 trains: &[ArrivalRecord], progress_fill: Option<u32>) -> Frame {
        return Frame {
            header: header.to_string(),
            time_text: time_text.to_string(),
            rows: trains.iter()
                .take(spec.row_limit())
                .map(|t| RowFields::from_record(spec, t))
                .collect(),
            progress_fill: progress_fill,
        };
    }
}

pub fn layout(spec: &VariantSpec, frame: &Frame, width: u32, height: u32, glyphs: &dyn Glyphs) -> Vec<DrawOp> {
    let mut ops = vec![];

    header_ops(&mut ops, spec, frame, width, glyphs);

    if let Some(y) = spec.separator_y {
        ops.push(DrawOp::Line { x0: 0, y0: y, x1: width as i32 - 1, y1: y });
    }

    match spec.body {
        Body::Ledger { column_header_y, columns, row_origin_y, row_pitch, max_rows } => {
            for column in columns {
                ops.push(text(column.x, column_header_y, column.label, Face::Regular, spec.sizes.caption));
            }

            let mut y = row_origin_y;
            for row in frame.rows.iter().take(std::cmp::min(max_rows, MAX_ROWS)) {
                for column in columns {
                    match column.field {
                        Field::Line => ops.push(text(column.x, y, &row.line, Face::Bold, spec.sizes.row)),
                        Field::Destination => ops.push(text(column.x, y, &row.destination, Face::Bold, spec.sizes.row)),
                        Field::Car => ops.push(text(column.x, y, &row.car, Face::Bold, spec.sizes.row)),
                        Field::Arrival => arrival_ops(&mut ops, spec, &row.arrival, column.x, y, spec.sizes.row, glyphs),
                    }
                }
                y += row_pitch;
            }
        },
        Body::SingleTrain { line_size, top_y, destination_x, numeral_x, next_y, bar_height } => {
            let hero = match frame.rows.first() {
                Some(hero) => hero,
                None => return ops,
            };

            ops.push(text(spec.inset, top_y, &hero.line, Face::Bold, line_size));
            ops.push(text(destination_x, top_y, &hero.destination, Face::Bold, spec.sizes.row));
            ops.push(text(destination_x, top_y + spec.sizes.row as i32 + 4,
                          &format!("{} car", hero.car), Face::Regular, spec.sizes.caption));
            arrival_ops(&mut ops, spec, &hero.arrival, numeral_x, top_y - 4, spec.sizes.row * 2.0, glyphs);

            if let Some(next) = frame.rows.get(1) {
                ops.push(text(spec.inset, next_y,
                              &format!("Next: {} {} {}", next.line, next.destination, next.arrival),
                              Face::Regular, spec.sizes.caption));
            }

            if let Some(fill) = frame.progress_fill {
                let track = spec.progress_track_width(width);
                let bar_y = height as i32 - spec.inset - bar_height as i32;
                ops.push(DrawOp::Rect { x: spec.inset, y: bar_y, w: track, h: bar_height, filled: false });
                ops.push(DrawOp::Rect { x: spec.inset, y: bar_y, w: std::cmp::min(fill, track), h: bar_height, filled: true });
            }
        },
    }

    return ops;
}

fn text(x: i32, y: i32, content: &str, face: Face, size: f32) -> DrawOp {
    return DrawOp::Text { x: x, y: y, content: content.to_string(), face: face, size: size };
}

fn header_ops(ops: &mut Vec<DrawOp>, spec: &VariantSpec, frame: &Frame, width: u32, glyphs: &dyn Glyphs) {
    let time_width = glyphs.text_width(Face::Bold, spec.sizes.header, &frame.time_text);
    let time_x = width as i32 - spec.inset - time_width;

    let station = fit_header(spec, &frame.header, time_x, glyphs);
    ops.push(text(spec.inset, spec.header_y, &station, Face::Bold, spec.sizes.header));
    if !frame.time_text.is_empty() {
        ops.push(text(time_x, spec.header_y, &frame.time_text, Face::Bold, spec.sizes.header));
    }
}

// Applies the variant's header policy to `header`, given the clock starts
// at `time_x`.
pub fn fit_header(spec: &VariantSpec, header: &str, time_x: i32, glyphs: &dyn Glyphs) -> String {
    match spec.header_policy {
        HeaderPolicy::Untruncated => return header.to_string(),
        HeaderPolicy::MaxChars(max_chars) => return format::format_destination(header, max_chars),
        HeaderPolicy::FitBeforeTime => {
            let fits = |s: &str| spec.inset + glyphs.text_width(Face::Bold, spec.sizes.header, s) + HEADER_GAP <= time_x;
            let mut max_chars = header.chars().count();
            let mut station = header.to_string();
            while max_chars > 0 && !fits(&station) {
                max_chars -= 1;
                station = format::format_destination(header, max_chars);
            }
            return station;
        },
    }
}

fn arrival_ops(ops: &mut Vec<DrawOp>, spec: &VariantSpec, arrival: &ArrivalText,
               x: i32, y: i32, plain_size: f32, glyphs: &dyn Glyphs) {
    match *arrival {
        ArrivalText::Plain(ref content) => {
            ops.push(text(x, y, content, Face::Bold, plain_size));
        },
        ArrivalText::Split { ref numeral, ref unit } => {
            // Caption sits after the numeral and shares its baseline, so it
            // depends on how wide this particular numeral renders.
            let numeral_size = spec.sizes.numeral;
            let numeral_width = glyphs.text_width(Face::Bold, numeral_size, numeral);
            let caption_y = y + (numeral_size - spec.sizes.caption) as i32 - 2;
            ops.push(text(x, y, numeral, Face::Bold, numeral_size));
            ops.push(text(x + numeral_width + CAPTION_GAP, caption_y, unit, Face::Regular, spec.sizes.caption));
        },
    }
}
