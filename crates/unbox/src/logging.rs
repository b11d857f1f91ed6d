use std::fs::{File, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};
use env_logger::{Env, Target};

pub const LOG_FILE: &str = "installer.log";

/// Send all log records to `path`. `RUST_LOG` overrides the default `info`.
pub fn init(path: &Path) -> Result<()> {
    let file = open_log(path)?;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .context("Failed to install logger")?;
    Ok(())
}

/// Earlier runs stay in the log; each run appends.
fn open_log(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}
