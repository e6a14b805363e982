mod dump;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    thread,
    time::{Duration, SystemTime},
};

use clap::{Parser, Subcommand};
use ratings_core::{
    BlendComposer, DisplaySink, PanelValues, PlaybackClock, PlaybackInstant, RatingSnapshot,
    RatingsConfig, RatingsSession, ReloadDebouncer, TriangleReadout, WindowedRatings,
    DEFAULT_MAX_RATING,
};
use tracing_subscriber::EnvFilter;

use crate::dump::{DumpAccuracy, DumpAnalyzer, RatingDump};

const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> ratings_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Static { input } => run_static(config, &input),
        Commands::Window {
            input,
            beat,
            seconds,
        } => run_window(config, &input, PlaybackInstant::new(beat, seconds)),
        Commands::Scrub {
            input,
            bpm,
            from,
            to,
            step,
        } => run_scrub(config, &input, bpm, from, to, step),
        Commands::Watch { input } => run_watch(config, input),
        Commands::InitConfig { output } => run_init_config(&output),
    }
}

type CliSession = RatingsSession<DumpAnalyzer, DumpAccuracy, BlendComposer, StdoutSink>;

fn load_session(config: RatingsConfig, input: &Path) -> ratings_core::Result<CliSession> {
    let dump = RatingDump::load(input)?;
    let mut session = RatingsSession::new(
        config,
        DumpAnalyzer,
        DumpAccuracy,
        BlendComposer::default(),
        StdoutSink,
    )?;

    session.on_map_loaded(&dump.into_map_load())?;

    Ok(session)
}

fn run_static(config: RatingsConfig, input: &Path) -> ratings_core::Result<()> {
    tracing::info!(?input, "computing whole-map ratings");

    load_session(config, input).map(drop)
}

fn run_window(
    config: RatingsConfig,
    input: &Path,
    instant: PlaybackInstant,
) -> ratings_core::Result<()> {
    tracing::info!(?input, beat = instant.beat, seconds = instant.seconds, "rating one instant");

    let mut session = load_session(config, input)?;
    print_tick(&mut session, instant);

    Ok(())
}

fn run_scrub(
    config: RatingsConfig,
    input: &Path,
    bpm: Option<f64>,
    from: f64,
    to: f64,
    step: f64,
) -> ratings_core::Result<()> {
    if !(step.is_finite() && step > 0.0) {
        return Err(ratings_core::RatingsError::msg("scrub step must be positive"));
    }

    let dump = RatingDump::load(input)?;
    let mut clock = PlaybackClock::new(bpm.unwrap_or(dump.bpm));
    let mut session = RatingsSession::new(
        config,
        DumpAnalyzer,
        DumpAccuracy,
        BlendComposer::default(),
        StdoutSink,
    )?;
    session.on_map_loaded(&dump.into_map_load())?;

    tracing::info!(?input, bpm = clock.bpm(), from, to, step, "scrubbing");

    clock.seek(from);
    while clock.time_seconds() <= to {
        let instant = clock.instant();
        print!("{:>8.2}s {:>8.2}b  ", instant.seconds, instant.beat);
        print_tick(&mut session, instant);
        clock.advance(step);
    }

    Ok(())
}

fn print_tick(session: &mut CliSession, instant: PlaybackInstant) {
    let enabled = session.config().enabled;
    let rated = session.on_playback_tick(instant);

    println!("{}", live_line(enabled, rated.as_ref()));
}

/// "no data" comes from the missing window result, never from the values:
/// a window with data may still rate all zeros.
fn live_line(enabled: bool, rated: Option<&WindowedRatings>) -> String {
    match rated {
        Some(rated) => {
            let labels = TriangleReadout::new(&rated.values, DEFAULT_MAX_RATING).labels();

            format!(
                "tech {}  pass {}  acc {}  stars {}",
                labels.tech, labels.pass, labels.acc, labels.star
            )
        }
        None if enabled => "no data".to_owned(),
        None => "live ratings disabled".to_owned(),
    }
}

fn run_watch(config: RatingsConfig, input: PathBuf) -> ratings_core::Result<()> {
    tracing::info!(?input, "watching dump for changes");

    let snapshot = Arc::new(RatingSnapshot::new());
    let composer = BlendComposer::default();
    let window = Duration::from_millis(config.reload_debounce_ms);

    let reload_input = input.clone();
    let reload_snapshot = Arc::clone(&snapshot);
    let debouncer = ReloadDebouncer::spawn(window, move || {
        let map = match RatingDump::load(&reload_input) {
            Ok(dump) => dump.into_map_load(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read dump");
                return;
            }
        };

        let ticket = reload_snapshot.begin();
        match reload_snapshot.recompute(ticket, &map, &DumpAnalyzer, &DumpAccuracy, &composer, &config) {
            Ok(pair) => StdoutSink.show_static(&PanelValues::from(&pair.ratings)),
            Err(err) => tracing::warn!(error = %err, "reload failed"),
        }
    })?;

    let mut last_modified: Option<SystemTime> = None;

    loop {
        let modified = std::fs::metadata(&input).and_then(|meta| meta.modified()).ok();

        if modified.is_some() && modified != last_modified {
            last_modified = modified;
            debouncer.trigger();
        }

        thread::sleep(WATCH_POLL_INTERVAL);
    }
}

fn run_init_config(output: &Path) -> ratings_core::Result<()> {
    tracing::info!(?output, "writing default config");

    let json = RatingsConfig::default().to_json_string()?;
    std::fs::write(output, json)?;

    Ok(())
}

fn load_config(path: Option<&Path>) -> ratings_core::Result<RatingsConfig> {
    let Some(path) = path else {
        return Ok(RatingsConfig::default());
    };

    if !path.exists() {
        tracing::warn!(?path, "config file not found, using defaults");

        return Ok(RatingsConfig::default());
    }

    let json = std::fs::read_to_string(path)?;

    RatingsConfig::from_json_str(&json)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Prints whatever the overlay would show.
#[derive(Debug, Default, Clone, Copy)]
struct StdoutSink;

impl DisplaySink for StdoutSink {
    fn show_static(&mut self, panel: &PanelValues) {
        println!(
            "pred. {}%  acc {}  stars {}  tech {}  pass {}",
            panel.predicted_acc, panel.acc_rating, panel.stars, panel.tech, panel.pass
        );
    }

    // * live lines are printed from the tick result, see `print_tick`
    fn show_live(&mut self, readout: &TriangleReadout) {
        tracing::trace!(
            tech = readout.tech,
            pass = readout.pass,
            acc = readout.acc_rating,
            "live readout"
        );
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Live difficulty ratings for Beat Saber maps", long_about = None)]
struct Cli {
    /// Settings file, e.g. `Ratings.json`.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the whole-map ratings of a dump.
    Static {
        /// Analyzer dump of the difficulty.
        input: PathBuf,
    },
    /// Print the windowed ratings around one playback position.
    Window {
        input: PathBuf,
        #[arg(long)]
        beat: f64,
        #[arg(long)]
        seconds: f64,
    },
    /// Simulate playback and print the live ratings at every tick.
    Scrub {
        input: PathBuf,
        /// Tempo used to derive beats from seconds; defaults to the map's.
        #[arg(long)]
        bpm: Option<f64>,
        #[arg(long, default_value_t = 0.0)]
        from: f64,
        #[arg(long)]
        to: f64,
        #[arg(long, default_value_t = 0.5)]
        step: f64,
    },
    /// Recompute whenever the dump file changes.
    Watch { input: PathBuf },
    /// Write the default settings file.
    InitConfig { output: PathBuf },
}

#[cfg(test)]
mod tests {
    use ratings_core::RatingValues;

    use super::*;

    fn rated(values: RatingValues) -> WindowedRatings {
        WindowedRatings {
            instant: PlaybackInstant::new(4.0, 2.0),
            values,
            samples: 161,
        }
    }

    #[test]
    fn zero_valued_window_is_still_data() {
        let zeros = rated(RatingValues {
            acc: 0.9,
            ..RatingValues::zeroed()
        });

        assert_eq!(live_line(true, Some(&zeros)), "tech 0.0  pass 0.0  acc 0.0  stars 0.0");
    }

    #[test]
    fn missing_window_reports_no_data() {
        assert_eq!(live_line(true, None), "no data");
        assert_eq!(live_line(false, None), "live ratings disabled");

        let values = RatingValues {
            tech: 4.26,
            pass: 10.0,
            acc_rating: 8.04,
            stars: 9.96,
            acc: 0.95,
        };
        assert_eq!(
            live_line(true, Some(&rated(values))),
            "tech 4.3  pass 10.0  acc 8.0  stars 10.0"
        );
    }
}
