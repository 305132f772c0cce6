//! spark-typewriter demo
//!
//! Types its arguments into the terminal. One argument is typed as a script
//! (a backslash starts a new screen); several are typed in turn, each deleted
//! before the next.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use spark_typewriter::{run, Options, OptionsPatch, Pace, SystemScheduler, TerminalSurface, Typewriter};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "spark-typewriter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Type text into the terminal, one character at a time", long_about = None)]
struct Cli {
    /// Text to type
    #[arg(required = true)]
    texts: Vec<String>,

    /// Start over when the script ends
    #[arg(short, long = "loop")]
    looping: bool,

    /// TOML file with option overrides (camelCase keys)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Milliseconds to hold each text before deleting it
    #[arg(long, default_value = "1500")]
    hold: u64,

    /// Seed for natural typing speed
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many seconds
    #[arg(short, long)]
    duration: Option<u64>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // stderr, so the animation on stdout stays intact
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut options = Options {
        type_color: "reset".to_string(),
        cursor_color: "reset".to_string(),
        ..Default::default()
    };
    if let Some(path) = &cli.config {
        let source = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        options = options.merged(OptionsPatch::from_toml_str(&source)?)?;
        info!(path = %path.display(), "loaded options");
    }
    if cli.looping {
        options.looping = true;
    }

    let mut typewriter = Typewriter::new(SystemScheduler::new(), TerminalSurface::stdout(), options)?;
    if let Some(seed) = cli.seed {
        typewriter = typewriter.with_pace(Pace::seeded(seed));
    }

    match cli.texts.as_slice() {
        [single] => {
            typewriter.type_text(single);
        }
        many => {
            typewriter.strings(cli.hold, many);
        }
    }

    typewriter.start()?;

    let deadline = cli.duration.map(|secs| Instant::now() + Duration::from_secs(secs));
    run(&mut typewriter, |tw| {
        !tw.is_running() || deadline.is_some_and(|at| Instant::now() >= at)
    })?;

    typewriter.stop();
    typewriter.surface_mut().finish()?;
    Ok(())
}
