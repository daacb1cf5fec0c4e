// sudo apt-get install fonts-dejavu-core
extern crate ab_glyph;
extern crate anyhow;
extern crate chrono;
extern crate chrono_tz;
extern crate flexi_logger;
extern crate getopts;
extern crate image;
extern crate imageproc;
#[macro_use]
extern crate log;
extern crate rppal;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;

mod config;
mod display;
mod drawing;
mod format;
mod layout;
mod progress;
mod refresh;
mod result;
mod session;
mod structs;

use display::Panel;

fn build_panel(use_epd: bool, png_out: Option<String>) -> result::MetroResult<Box<dyn Panel>> {
    match (use_epd, png_out) {
        (true, None) => {
            return Ok(Box::new(display::Ssd1680Panel::new()?));
        },
        (true, Some(png_out)) => {
            let epd = display::Ssd1680Panel::new()?;
            let png = display::PngPanel::new(&png_out, epd.width(), epd.height());
            return Ok(Box::new(display::Tee { first: epd, second: png }));
        },
        (false, Some(png_out)) => {
            // Same geometry as the bonnet in landscape.
            return Ok(Box::new(display::PngPanel::new(&png_out, 250, 122)));
        },
        (false, None) => {
            return Err(result::make_error("--skip-display needs --save-image"));
        },
    }
}

fn start_logging(level: &str, log_dir: Option<String>) -> result::MetroResult<flexi_logger::LoggerHandle> {
    let logger = flexi_logger::Logger::try_with_env_or_str(level)?;
    let logger = match log_dir {
        Some(dir) => logger
            .log_to_file(flexi_logger::FileSpec::default().directory(dir))
            .duplicate_to_stderr(flexi_logger::Duplicate::Warn),
        None => logger.log_to_stderr(),
    };
    return Ok(logger.start()?);
}

// One pass of the update loop. A freshly loaded snapshot redraws
// everything; otherwise the clock is redrawn once per new minute.
// `last_time_text` only moves when something was drawn.
fn update<P: Panel>(session: &mut session::DisplaySession<P>,
                    loaded: Option<result::MetroResult<structs::ArrivalsSnapshot>>,
                    now_text: &str, last_time_text: &mut String) -> result::MetroResult<()> {
    let mut outcome = None;
    match loaded {
        Some(Ok(snapshot)) => {
            session.set_time(now_text);
            outcome = Some(session.on_snapshot(&snapshot));
        },
        Some(Err(err)) => warn!("Keeping previous frame: {:#}", err),
        None => {},
    }
    if outcome.is_none() && now_text != last_time_text.as_str() {
        outcome = Some(session.on_tick(now_text));
    }

    match outcome {
        Some(outcome) => {
            *last_time_text = now_text.to_string();
            return outcome;
        },
        None => return Ok(()),
    }
}

fn usage(opts: &getopts::Options) -> String {
    return opts.usage("Usage: metrodash --snapshot FILE [options]");
}

fn run() -> result::MetroResult<()> {
    let args: Vec<String> = std::env::args().collect();
    let mut opts = getopts::Options::new();
    opts.optflag("d", "skip-display", "don't draw to the epd device");
    opts.optflag("o", "one-shot", "draw once and exit instead of keeping the display up to date");
    opts.optopt("i", "save-image", "Where to put a png of each frame.", "FILENAME");
    opts.optopt("s", "snapshot", "Arrivals JSON kept fresh by the fetcher.", "FILENAME");
    opts.optopt("v", "variant", "compact-ledger, shifted-ledger or large-single-train", "NAME");
    opts.optopt("c", "config", "JSON settings file.", "FILENAME");
    opts.optopt("z", "timezone", "Zone for the clock, e.g. America/New_York", "TZ");
    opts.optopt("l", "log-level", "flexi_logger spec, overridden by RUST_LOG", "LEVEL");
    opts.optopt("", "log-dir", "Log to files in this directory instead of stderr.", "DIR");
    opts.optflag("h", "help", "print this help");

    let matches = opts.parse(&args[1..])?;
    if matches.opt_present("help") {
        println!("{}", usage(&opts));
        return Ok(());
    }

    let _logger = start_logging(
        &matches.opt_str("log-level").unwrap_or("info".to_string()),
        matches.opt_str("log-dir"))?;

    let mut settings = match matches.opt_str("config") {
        Some(path) => config::Settings::from_file(&path)?,
        None => config::Settings::default(),
    };
    if let Some(variant) = matches.opt_str("variant") {
        settings.variant = variant;
    }
    if let Some(timezone) = matches.opt_str("timezone") {
        settings.timezone = timezone;
    }
    if let Some(snapshot_path) = matches.opt_str("snapshot") {
        settings.snapshot_path = Some(snapshot_path);
    }

    let variant = settings.variant()?;
    let tz = settings.timezone()?;
    let snapshot_path = settings.snapshot_path.clone().ok_or_else(
        || result::make_error(&format!("--snapshot is required\n{}", usage(&opts))))?;

    let use_epd = !matches.opt_present("skip-display");
    let one_shot = matches.opt_present("one-shot");
    info!("Running. variant={} display={} one-shot={} snapshot={}",
          variant.name(), use_epd, one_shot, snapshot_path);

    let styles = drawing::Styles::load(&settings.regular_fonts, &settings.bold_fonts)?;
    let panel = build_panel(use_epd, matches.opt_str("save-image"))?;

    let clock_text = || format::format_time(&chrono::Utc::now().with_timezone(&tz));
    let mut session = session::DisplaySession::with_interval(
        variant.spec(), &styles, panel, &clock_text(), settings.full_clear_interval());

    let poll_interval = std::time::Duration::from_secs(settings.poll_seconds);
    let mut last_poll: Option<std::time::Instant> = None;
    let mut last_time_text = String::new();

    loop {
        let now_text = clock_text();

        let loaded = if last_poll.map_or(true, |t| t.elapsed() >= poll_interval) {
            last_poll = Some(std::time::Instant::now());
            Some(settings.load_snapshot(&snapshot_path))
        } else {
            None
        };
        let outcome = update(&mut session, loaded, &now_text, &mut last_time_text);

        if let Err(err) = outcome {
            error!("Render failed: {:#}", err);
            if one_shot {
                return Err(err);
            }
        }

        if one_shot {
            return Ok(());
        }
        std::thread::sleep(std::time::Duration::from_secs(settings.tick_seconds));
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use crate::display::RecordingPanel;
    use crate::drawing::BlockGlyphs;
    use crate::layout::LayoutVariant;
    use crate::result;
    use crate::session::DisplaySession;
    use crate::structs::ArrivalsSnapshot;

    fn session() -> DisplaySession<'static, RecordingPanel> {
        return DisplaySession::new(LayoutVariant::CompactLedger.spec(), &BlockGlyphs, RecordingPanel::new(250, 122), "");
    }

    #[test]
    fn failed_read_still_draws_the_clock() {
        let mut session = session();
        let mut last_time_text = String::new();

        super::update(&mut session, Some(Err(result::make_error("no such file"))), "6:10 AM", &mut last_time_text)
            .expect("update");

        assert_eq!(1, session.panel().frames.len());
        assert_eq!("6:10 AM", session.state().time_text);
        assert_eq!("6:10 AM", last_time_text);

        // same minute, nothing new to draw
        super::update(&mut session, None, "6:10 AM", &mut last_time_text).expect("update");
        assert_eq!(1, session.panel().frames.len());
    }

    #[test]
    fn failed_read_keeps_minute_pending() {
        let mut session = session();
        let mut last_time_text = String::new();
        let snapshot = ArrivalsSnapshot::from_json(
            r#"{"Trains":[{"LocationName":"Anacostia","DestinationName":"Greenbelt","Line":"GR","Car":"8","Min":"4"}]}"#)
            .expect("parse");

        super::update(&mut session, Some(Ok(snapshot)), "6:10 AM", &mut last_time_text).expect("update");
        assert_eq!("6:10 AM", last_time_text);

        super::update(&mut session, Some(Err(result::make_error("truncated"))), "6:11 AM", &mut last_time_text)
            .expect("update");

        assert_eq!(2, session.panel().frames.len());
        assert_eq!("6:11 AM", session.state().time_text);
        assert_eq!("6:11 AM", last_time_text);
        assert_eq!("Anacostia", session.state().station_name);
    }
}
