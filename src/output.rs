use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::app::{FetchResult, ProgressEvent, ProgressSink, RunResult, ScoreResult};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_score(result: &ScoreResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_fetch(result: &FetchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_run(result: &RunResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Forwards progress to the log.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => tracing::info!("{} ({:.2?})", event.message, elapsed),
            None => tracing::info!("{}", event.message),
        }
    }
}

/// Per-run log file, `<dir>/<timestamp>_score.log`, with `:` kept out of the timestamp.
pub fn log_file_path(dir: &Utf8Path, started: NaiveDateTime) -> Utf8PathBuf {
    let stamp = started.format("%Y-%m-%dT%H.%M.%S%.6f");
    dir.join(format!("{stamp}_score.log"))
}
