//! Tracing setup. The terminal UI owns stdout, so logs only go to a file when asked for.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

/// Install a plain-text `fmt` subscriber writing to `path`. Without a path nothing is installed
/// and engine events are discarded.
pub fn init(path: Option<&Path>, level: tracing::Level) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot install tracing subscriber: {e}"))?;
    tracing::info!(path = %path.display(), "logging started");
    Ok(())
}
