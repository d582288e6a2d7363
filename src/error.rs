use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

use crate::config::SCHEMA_VERSION;

#[derive(Debug, Error, Diagnostic)]
pub enum ScoreError {
    #[error("invalid shard data in {path}{}: {message}", line_suffix(.line))]
    #[diagnostic(code(kira_er::data_source))]
    DataSource {
        path: Utf8PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("no .json shard files found under {0}")]
    #[diagnostic(
        code(kira_er::no_shards),
        help("run `kira-er fetch` or point the input directory at downloaded shards")
    )]
    NoShards(Utf8PathBuf),

    #[error("empty score group for disease {disease_id} / target {target_id}")]
    EmptyGroup {
        disease_id: String,
        target_id: String,
    },

    #[error("failed to write output {path}: {message}")]
    #[diagnostic(code(kira_er::output))]
    Output { path: Utf8PathBuf, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("unsupported config schema_version {0} (expected {expected})", expected = SCHEMA_VERSION)]
    UnsupportedSchema(u32),

    #[error("invalid release: {0}")]
    InvalidRelease(String),

    #[error("invalid evidence source: {0}")]
    InvalidSource(String),

    #[error("release request failed: {0}")]
    ReleaseHttp(String),

    #[error("release mirror returned status {status}: {message}")]
    ReleaseStatus { status: u16, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl ScoreError {
    pub fn data_source(
        path: impl Into<Utf8PathBuf>,
        line: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        ScoreError::DataSource {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub fn output(path: impl Into<Utf8PathBuf>, message: impl ToString) -> Self {
        ScoreError::Output {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" (line {line})"),
        None => String::new(),
    }
}
