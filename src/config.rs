use std::fs;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{EvidenceSource, Release};
use crate::error::ScoreError;
use crate::release::DEFAULT_BASE_URL;
use crate::store::DataLayout;

pub const SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_CONFIG_FILE: &str = "kira-er.json";
pub const DEFAULT_RELEASE: &str = "21.11";
pub const DEFAULT_EVIDENCE_SOURCE: &str = "eva";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub data_root: Option<Utf8PathBuf>,
    #[serde(default)]
    pub diseases: Option<Utf8PathBuf>,
    #[serde(default)]
    pub targets: Option<Utf8PathBuf>,
    #[serde(default)]
    pub evidence: Option<Utf8PathBuf>,
    #[serde(default)]
    pub output: Option<Utf8PathBuf>,
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub evidence_source: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Values given on the command line; each one wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_root: Option<Utf8PathBuf>,
    pub diseases: Option<Utf8PathBuf>,
    pub targets: Option<Utf8PathBuf>,
    pub evidence: Option<Utf8PathBuf>,
    pub output: Option<Utf8PathBuf>,
    pub release: Option<String>,
    pub evidence_source: Option<String>,
}

/// Inputs and output of one scoring run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    pub diseases: Utf8PathBuf,
    pub targets: Utf8PathBuf,
    pub evidence: Utf8PathBuf,
    pub output: Utf8PathBuf,
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub base_url: String,
    pub release: Release,
    pub evidence_source: EvidenceSource,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub layout: DataLayout,
    pub paths: PipelinePaths,
    pub fetch: FetchSettings,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `kira-er.json` when present in the current directory.
    pub fn load(path: Option<&str>) -> Result<Config, ScoreError> {
        let config_path = match path {
            Some(path) => Utf8PathBuf::from(path),
            None => Utf8PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.as_std_path().exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path.as_std_path())
            .map_err(|_| ScoreError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| ScoreError::ConfigParse(err.to_string()))
    }

    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, ScoreError> {
        Self::resolve_config(Self::load(path)?, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, ScoreError> {
        if let Some(version) = config.schema_version
            && version != SCHEMA_VERSION
        {
            return Err(ScoreError::UnsupportedSchema(version));
        }

        let layout = overrides
            .data_root
            .or(config.data_root)
            .map(DataLayout::new)
            .unwrap_or_default();

        let release: Release = overrides
            .release
            .or(config.release)
            .as_deref()
            .unwrap_or(DEFAULT_RELEASE)
            .parse()?;
        let evidence_source: EvidenceSource = overrides
            .evidence_source
            .or(config.evidence_source)
            .as_deref()
            .unwrap_or(DEFAULT_EVIDENCE_SOURCE)
            .parse()?;

        let paths = PipelinePaths {
            diseases: overrides
                .diseases
                .or(config.diseases)
                .unwrap_or_else(|| layout.diseases_dir()),
            targets: overrides
                .targets
                .or(config.targets)
                .unwrap_or_else(|| layout.targets_dir()),
            evidence: overrides
                .evidence
                .or(config.evidence)
                .unwrap_or_else(|| layout.evidence_dir(&evidence_source)),
            output: overrides
                .output
                .or(config.output)
                .unwrap_or_else(|| layout.output_path()),
        };

        Ok(ResolvedConfig {
            layout,
            paths,
            fetch: FetchSettings {
                base_url: config
                    .base_url
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                release,
                evidence_source,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_data_root() {
        let resolved =
            ConfigLoader::resolve_config(Config::default(), ConfigOverrides::default()).unwrap();
        assert_eq!(resolved.paths.diseases, Utf8PathBuf::from("data/in/diseases"));
        assert_eq!(
            resolved.paths.evidence,
            Utf8PathBuf::from("data/in/evidence/sourceId=eva")
        );
        assert_eq!(resolved.paths.output, Utf8PathBuf::from("data/out/data.json"));
        assert_eq!(resolved.fetch.release.as_str(), DEFAULT_RELEASE);
    }

    #[test]
    fn current_schema_version_is_accepted() {
        let config = Config {
            schema_version: Some(SCHEMA_VERSION),
            ..Config::default()
        };
        assert!(ConfigLoader::resolve_config(config, ConfigOverrides::default()).is_ok());
    }
}
