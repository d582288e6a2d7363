use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::Builder;

use crate::domain::EvidenceSource;
use crate::error::ScoreError;

/// On-disk layout of downloaded shards and results below a data root.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: Utf8PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn input_root(&self) -> Utf8PathBuf {
        self.root.join("in")
    }

    pub fn diseases_dir(&self) -> Utf8PathBuf {
        self.input_root().join("diseases")
    }

    pub fn targets_dir(&self) -> Utf8PathBuf {
        self.input_root().join("targets")
    }

    pub fn evidence_root(&self) -> Utf8PathBuf {
        self.input_root().join("evidence")
    }

    pub fn evidence_dir(&self, source: &EvidenceSource) -> Utf8PathBuf {
        self.evidence_root().join(source.partition_dir())
    }

    pub fn output_path(&self) -> Utf8PathBuf {
        self.root.join("out").join("data.json")
    }
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::new("data")
    }
}

/// Writes `content` to a temp file next to `path` and renames it into place.
pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), ScoreError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path()).map_err(|err| ScoreError::output(path, err))?;

    let mut temp = Builder::new()
        .prefix(".kira-er")
        .suffix(".tmp")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| ScoreError::output(path, err))?;
    temp.write_all(content)
        .map_err(|err| ScoreError::output(path, err))?;
    temp.as_file()
        .sync_all()
        .map_err(|err| ScoreError::output(path, err))?;
    temp.persist(path.as_std_path())
        .map_err(|err| ScoreError::output(path, err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let layout = DataLayout::default();
        let source: EvidenceSource = "eva".parse().unwrap();

        assert!(layout.diseases_dir().ends_with("in/diseases"));
        assert!(layout.targets_dir().ends_with("in/targets"));
        assert!(layout.evidence_dir(&source).ends_with("in/evidence/sourceId=eva"));
        assert!(layout.output_path().ends_with("out/data.json"));
    }
}
