extern crate image;

use crate::display::Panel;
use crate::drawing;
use crate::drawing::Glyphs;
use crate::layout;
use crate::layout::{Frame, VariantSpec};
use crate::progress;
use crate::progress::Baseline;
use crate::refresh::RefreshController;
use crate::result;
use crate::structs::{ArrivalsSnapshot, ArrivalRecord, MAX_ROWS, NO_SERVICE};

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub station_name: String,
    pub trains: Vec<ArrivalRecord>,
    pub time_text: String,
    pub baseline: Option<Baseline>,
}

impl DisplayState {
    pub fn new(time_text: &str) -> DisplayState {
        return DisplayState {
            station_name: NO_SERVICE.to_string(),
            trains: vec![],
            time_text: time_text.to_string(),
            baseline: None,
        };
    }
}

pub struct DisplaySession<'a, P: Panel> {
    spec: &'static VariantSpec,
    glyphs: &'a dyn Glyphs,
    panel: P,
    state: DisplayState,
    refresh: RefreshController,
}

impl<'a, P: Panel> DisplaySession<'a, P> {
    pub fn new(spec: &'static VariantSpec, glyphs: &'a dyn Glyphs, panel: P, time_text: &str) -> DisplaySession<'a, P> {
        return DisplaySession::with_interval(spec, glyphs, panel, time_text, spec.full_clear_interval);
    }

    pub fn with_interval(spec: &'static VariantSpec, glyphs: &'a dyn Glyphs, panel: P,
                         time_text: &str, full_clear_interval: u32) -> DisplaySession<'a, P> {
        info!("Starting {} session on {}x{} panel, full clear every {} refreshes",
              spec.name, panel.width(), panel.height(), full_clear_interval);
        return DisplaySession {
            spec: spec,
            glyphs: glyphs,
            panel: panel,
            state: DisplayState::new(time_text),
            refresh: RefreshController::new(full_clear_interval),
        };
    }

    pub fn state(&self) -> &DisplayState {
        return &self.state;
    }

    pub fn panel(&self) -> &P {
        return &self.panel;
    }

    pub fn refresh_count(&self) -> u64 {
        return self.refresh.refresh_count();
    }

    // Takes a new set of predictions and redraws.
    pub fn on_snapshot(&mut self, snapshot: &ArrivalsSnapshot) -> result::MetroResult<()> {
        if snapshot.trains.is_empty() {
            debug!("Empty snapshot, showing {}", NO_SERVICE);
            self.state.station_name = NO_SERVICE.to_string();
            self.state.trains = vec![];
            self.state.baseline = None;
        } else {
            self.state.station_name = snapshot.header();
            self.state.trains = snapshot.trains.iter().take(MAX_ROWS).cloned().collect();
            if self.spec.shows_progress() {
                self.state.baseline = Baseline::track(self.state.baseline.as_ref(), &self.state.trains[0]);
            }
        }
        debug!("Snapshot for {} with {} trains", self.state.station_name, snapshot.trains.len());
        return self.render();
    }

    // Updates only the clock and redraws.
    pub fn on_tick(&mut self, now_text: &str) -> result::MetroResult<()> {
        self.set_time(now_text);
        return self.render();
    }

    // Updates the clock without drawing, ahead of an on_snapshot.
    pub fn set_time(&mut self, now_text: &str) {
        self.state.time_text = now_text.to_string();
    }

    pub fn render(&mut self) -> result::MetroResult<()> {
        let cycle = self.refresh.next_cycle();
        debug!("Refresh {} is {:?}", self.refresh.refresh_count(), cycle);

        let imgbuf = self.frame();
        return self.refresh.commit(cycle, &mut self.panel, &imgbuf);
    }

    // The pixel buffer for the current state. Depends on nothing but the
    // state, so it can be called any number of times.
    pub fn frame(&self) -> image::GrayImage {
        let width = self.panel.width();
        let height = self.panel.height();

        let fill = match (self.state.baseline.as_ref(), self.state.trains.first()) {
            (Some(baseline), Some(hero)) if self.spec.shows_progress() => progress::fill_width(
                baseline, hero.minutes(), self.spec.progress_track_width(width)),
            _ => None,
        };

        let frame = Frame::build(self.spec, &self.state.station_name, &self.state.time_text,
                                 &self.state.trains, fill);
        let ops = layout::layout(self.spec, &frame, width, height, self.glyphs);
        return drawing::rasterize(&ops, width, height, self.glyphs);
    }
}

#[cfg(test)]
mod tests {
    use super::DisplaySession;
    use crate::display::{PanelCall, RecordingPanel};
    use crate::drawing::BlockGlyphs;
    use crate::layout::LayoutVariant;
    use crate::structs::ArrivalsSnapshot;

    const METRO_CENTER: &str = r#"{"Trains":[
        {"LocationName":"Metro Center","DestinationName":"Shady Grove","Line":"RD","Car":"8","Min":"12"},
        {"LocationName":"Metro Center","DestinationName":"Glenmont","Line":"RD","Car":"6","Min":"ARR"}
    ]}"#;

    fn session(variant: LayoutVariant) -> DisplaySession<'static, RecordingPanel> {
        return DisplaySession::new(variant.spec(), &BlockGlyphs, RecordingPanel::new(250, 122), "2:45 PM");
    }

    #[test]
    fn render_is_idempotent() {
        for variant in LayoutVariant::ALL.iter() {
            let mut session = session(*variant);
            session.on_snapshot(&ArrivalsSnapshot::from_json(METRO_CENTER).expect("parse")).expect("snapshot");
            session.render().expect("render");

            let frames = &session.panel().frames;
            assert_eq!(2, frames.len());
            assert_eq!(frames[0].as_raw(), frames[1].as_raw(), "{:?}", variant);
            assert_eq!(session.frame().as_raw(), frames[1].as_raw());
        }
    }

    #[test]
    fn first_update_full_clears() {
        let mut session = session(LayoutVariant::CompactLedger);
        session.on_snapshot(&ArrivalsSnapshot::from_json(METRO_CENTER).expect("parse")).expect("snapshot");
        session.on_tick("2:46 PM").expect("tick");

        assert_eq!(
            vec![PanelCall::FillWhite, PanelCall::Display, PanelCall::Image, PanelCall::Display,
                 PanelCall::Image, PanelCall::Display],
            session.panel().calls);
        assert_eq!(2, session.refresh_count());
    }

    #[test]
    fn full_clear_interval_follows_variant() {
        let mut compact = session(LayoutVariant::CompactLedger);
        let mut single = session(LayoutVariant::LargeSingleTrain);
        for _ in 0..11 {
            compact.render().expect("render");
            single.render().expect("render");
        }

        let clears = |calls: &Vec<PanelCall>| calls.iter().filter(|c| **c == PanelCall::FillWhite).count();
        assert_eq!(2, clears(&compact.panel().calls));
        assert_eq!(1, clears(&single.panel().calls));
    }

    #[test]
    fn interval_override() {
        let mut session = DisplaySession::with_interval(
            LayoutVariant::CompactLedger.spec(), &BlockGlyphs, RecordingPanel::new(250, 122), "", 3);
        for _ in 0..7 {
            session.render().expect("render");
        }
        let clears = session.panel().calls.iter().filter(|c| **c == PanelCall::FillWhite).count();
        assert_eq!(3, clears);
    }

    #[test]
    fn tick_changes_only_time() {
        let mut session = session(LayoutVariant::CompactLedger);
        session.on_snapshot(&ArrivalsSnapshot::from_json(METRO_CENTER).expect("parse")).expect("snapshot");
        let before = session.state().clone();

        session.on_tick("10:02 PM").expect("tick");

        assert_eq!(before.trains, session.state().trains);
        assert_eq!(before.station_name, session.state().station_name);
        assert_eq!("10:02 PM", session.state().time_text);
        let frames = &session.panel().frames;
        assert_ne!(frames[0].as_raw(), frames[1].as_raw());
    }

    #[test]
    fn empty_snapshot_shows_no_service() {
        let mut session = session(LayoutVariant::CompactLedger);
        session.on_snapshot(&ArrivalsSnapshot::from_json(METRO_CENTER).expect("parse")).expect("snapshot");
        session.on_snapshot(&ArrivalsSnapshot::from_json(r#"{"Trains":[]}"#).expect("parse")).expect("snapshot");

        assert_eq!("No Service", session.state().station_name);
        assert!(session.state().trains.is_empty());

        // nothing below the column headers
        let frame = session.frame();
        for y in 38..122 {
            for x in 0..250 {
                assert_eq!(255, frame.get_pixel(x, y)[0], "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn state_keeps_at_most_four_trains() {
        let trains: Vec<String> = (0..10)
            .map(|i| format!(r#"{{"LocationName":"Rosslyn","DestinationName":"Stop {}","Line":"BL","Car":"6","Min":"{}"}}"#, i, i))
            .collect();
        let raw_json = format!(r#"{{"Trains":[{}]}}"#, trains.join(","));

        let mut session = session(LayoutVariant::ShiftedLedger);
        session.on_snapshot(&ArrivalsSnapshot::from_json(&raw_json).expect("parse")).expect("snapshot");

        assert_eq!(4, session.state().trains.len());
        assert_eq!("Stop 3", session.state().trains[3].destination_name);
    }

    #[test]
    fn progress_tracks_highlighted_train() {
        let snapshot = |min: &str| ArrivalsSnapshot::from_json(&format!(
            r#"{{"Trains":[{{"LocationName":"Pentagon","DestinationName":"Huntington","Line":"YL","Car":"6","Min":"{}"}}]}}"#, min))
            .expect("parse");

        let mut session = session(LayoutVariant::LargeSingleTrain);
        session.on_snapshot(&snapshot("8")).expect("snapshot");
        assert_eq!(8, session.state().baseline.as_ref().expect("baseline").total_minutes());

        session.on_snapshot(&snapshot("2")).expect("snapshot");
        assert_eq!(8, session.state().baseline.as_ref().expect("baseline").total_minutes());

        // 6 of 8 minutes elapsed on a 240px track
        let frame = session.frame();
        assert_eq!(0, frame.get_pixel(5 + 178, 112)[0]);
        assert_eq!(255, frame.get_pixel(5 + 182, 112)[0]);

        session.on_snapshot(&snapshot("BRD")).expect("snapshot");
        let frame = session.frame();
        assert_eq!(255, frame.get_pixel(5 + 100, 112)[0]);
        assert_eq!(255, frame.get_pixel(5, 107)[0]);
    }

    #[test]
    fn unreadable_countdown_hides_progress() {
        let snapshot = |min: &str| ArrivalsSnapshot::from_json(&format!(
            r#"{{"Trains":[{{"LocationName":"Pentagon","DestinationName":"Huntington","Line":"YL","Car":"6","Min":"{}"}}]}}"#, min))
            .expect("parse");

        let mut session = session(LayoutVariant::LargeSingleTrain);
        session.on_snapshot(&snapshot("8")).expect("snapshot");
        let bar_drawn = session.frame();
        assert_eq!(0, bar_drawn.get_pixel(5, 107)[0]);

        // same train, so the wait it started is kept for when a count returns
        session.on_snapshot(&snapshot("soon")).expect("snapshot");
        assert_eq!(8, session.state().baseline.as_ref().expect("baseline").total_minutes());

        let frame = session.frame();
        for y in 100..122 {
            for x in 0..250 {
                assert_eq!(255, frame.get_pixel(x, y)[0], "({}, {})", x, y);
            }
        }

        session.on_snapshot(&snapshot("5")).expect("snapshot");
        assert_eq!(8, session.state().baseline.as_ref().expect("baseline").total_minutes());
        assert_eq!(0, session.frame().get_pixel(5, 107)[0]);
    }

    #[test]
    fn panel_failure_propagates() {
        let mut panel = RecordingPanel::new(250, 122);
        panel.fail_on_display = true;
        let mut session = DisplaySession::new(LayoutVariant::CompactLedger.spec(), &BlockGlyphs, panel, "");

        let err = session.on_snapshot(&ArrivalsSnapshot::empty()).expect_err("should fail");
        assert!(err.downcast_ref::<crate::result::PanelError>().is_some());
    }
}
