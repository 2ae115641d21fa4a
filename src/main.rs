//! Blockfall: falling-block puzzle in the terminal.

mod app;
mod input;
mod logging;
mod theme;
mod ui;

use anyhow::{Result, bail};
use app::App;
use blockfall::{DeathCheck, Engine, EngineConfig};
use clap::{Parser, ValueEnum};

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref(), args.log_level.into())?;
    if !(args.tick_rate.is_finite() && args.tick_rate > 0.0) {
        bail!("--tick-rate must be a positive number, got {}", args.tick_rate);
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "theme not loaded, using defaults");
        let mut t = theme::Theme::default();
        t.apply_palette(args.palette);
        t
    });
    let config = EngineConfig {
        width: usize::from(args.width),
        height: usize::from(args.height),
        death_check: args.death_check.into(),
        ..EngineConfig::default()
    };
    tracing::info!(?config, seed = ?args.seed, tick_rate = args.tick_rate, "starting");
    let engine = Engine::new(config, args.seed)?;
    let mut app = App::new(engine, theme, args.tick_rate);
    app.run()?;
    Ok(())
}

/// Falling-block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockfall",
    version,
    about = "Falling-block puzzle in the terminal. Fill a row to clear it.",
    long_about = "Blockfall is a small falling-block puzzle.\n\n\
        Pieces fall one row per tick. Move and rotate them; a piece locks when it cannot fall \
        further, and any completely filled row is removed.\n\n\
        CONTROLS:\n  Left/Right  Move    Up         Rotate     Down   Soft drop\n  \
        Space       Hard drop   Esc / p    Pause      r      Reset    q  Quit\n\n\
        Vim aliases: h/l move, k rotate, j soft drop."
)]
pub struct Args {
    /// Grid width in columns (7-100; a spawned I piece needs columns 3..=6).
    #[arg(long, default_value = "10", value_name = "COLS", value_parser = clap::value_parser!(u16).range(7..=100))]
    pub width: u16,

    /// Grid height in rows (4-100).
    #[arg(long, default_value = "20", value_name = "ROWS", value_parser = clap::value_parser!(u16).range(4..=100))]
    pub height: u16,

    /// Gravity ticks per second.
    #[arg(long, default_value = "10.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Seed for the piece generator (reproducible sessions).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Game-over rule run after each lock: off (never ends by itself), top-row, or zone.
    #[arg(long, default_value = "off")]
    pub death_check: DeathCheckArg,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Write engine logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,

    /// Log level used with --log-file.
    #[arg(long, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DeathCheckArg {
    #[default]
    Off,
    TopRow,
    Zone,
}

impl From<DeathCheckArg> for DeathCheck {
    fn from(arg: DeathCheckArg) -> Self {
        match arg {
            DeathCheckArg::Off => Self::Off,
            DeathCheckArg::TopRow => Self::TopRow,
            DeathCheckArg::Zone => Self::Zone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
