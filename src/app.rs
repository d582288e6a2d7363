use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::config::{FetchSettings, PipelinePaths};
use crate::enrich::enrich;
use crate::error::ScoreError;
use crate::export::export_result;
use crate::loader::load_folder;
use crate::records::{
    DISEASE_COLUMNS, DiseaseRecord, EVIDENCE_COLUMNS, EvidenceRecord, TARGET_COLUMNS,
    TargetRecord,
};
use crate::release::{ReleaseClient, fetch_folder, fetch_subfolders, release_json_dir};
use crate::store::DataLayout;
use crate::summary::summarize;

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub all_sources: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub release: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreResult {
    pub output: String,
    pub diseases: usize,
    pub targets: usize,
    pub evidence_records: usize,
    pub groups: usize,
    pub rows_written: usize,
    pub unmatched_diseases: usize,
    pub unmatched_targets: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub fetch: FetchResult,
    pub score: ScoreResult,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Clone)]
pub struct App<C: ReleaseClient> {
    layout: DataLayout,
    client: C,
}

impl<C: ReleaseClient> App<C> {
    pub fn new(layout: DataLayout, client: C) -> Self {
        Self { layout, client }
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Load, group, join and export. Nothing is written unless every earlier stage succeeds.
    pub fn score(
        &self,
        paths: &PipelinePaths,
        sink: &dyn ProgressSink,
    ) -> Result<ScoreResult, ScoreError> {
        let started = Instant::now();

        sink.event(ProgressEvent {
            message: format!("phase=Load; diseases from {}", paths.diseases),
            elapsed: None,
        });
        let diseases = DiseaseRecord::from_table(&load_folder(&paths.diseases, &DISEASE_COLUMNS)?)?;

        sink.event(ProgressEvent {
            message: format!("phase=Load; targets from {}", paths.targets),
            elapsed: Some(started.elapsed()),
        });
        let targets = TargetRecord::from_table(&load_folder(&paths.targets, &TARGET_COLUMNS)?)?;

        sink.event(ProgressEvent {
            message: format!("phase=Load; evidence from {}", paths.evidence),
            elapsed: Some(started.elapsed()),
        });
        let evidence =
            EvidenceRecord::from_table(&load_folder(&paths.evidence, &EVIDENCE_COLUMNS)?)?;
        tracing::debug!(
            diseases = diseases.len(),
            targets = targets.len(),
            evidence = evidence.len(),
            "loaded inputs"
        );

        sink.event(ProgressEvent {
            message: format!("phase=Group; {} evidence records", evidence.len()),
            elapsed: Some(started.elapsed()),
        });
        let summaries = summarize(&evidence)?;
        let groups = summaries.len();

        sink.event(ProgressEvent {
            message: format!("phase=Join; {groups} pairs"),
            elapsed: Some(started.elapsed()),
        });
        let enriched = enrich(summaries, &diseases, &targets);

        sink.event(ProgressEvent {
            message: format!("phase=Export; writing {}", paths.output),
            elapsed: Some(started.elapsed()),
        });
        let rows_written = export_result(enriched.rows, &paths.output)?;

        sink.event(ProgressEvent {
            message: "phase=Done".to_string(),
            elapsed: Some(started.elapsed()),
        });

        Ok(ScoreResult {
            output: paths.output.to_string(),
            diseases: diseases.len(),
            targets: targets.len(),
            evidence_records: evidence.len(),
            groups,
            rows_written,
            unmatched_diseases: enriched.unmatched_diseases,
            unmatched_targets: enriched.unmatched_targets,
        })
    }

    /// Downloads the disease, target and evidence folders of a release into the data layout.
    pub fn fetch(
        &self,
        settings: &FetchSettings,
        options: &FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<FetchResult, ScoreError> {
        let root = release_json_dir(&settings.release);
        sink.event(ProgressEvent {
            message: format!("phase=Fetch; release {} from {}", settings.release, settings.base_url),
            elapsed: None,
        });

        let mut files: Vec<Utf8PathBuf> = Vec::new();
        files.extend(fetch_folder(
            &self.client,
            &format!("{root}/diseases"),
            &self.layout.diseases_dir(),
            sink,
        )?);
        files.extend(fetch_folder(
            &self.client,
            &format!("{root}/targets"),
            &self.layout.targets_dir(),
            sink,
        )?);
        if options.all_sources {
            files.extend(fetch_subfolders(
                &self.client,
                &format!("{root}/evidence"),
                &self.layout.evidence_root(),
                sink,
            )?);
        } else {
            files.extend(fetch_folder(
                &self.client,
                &format!(
                    "{root}/evidence/{}",
                    settings.evidence_source.partition_dir()
                ),
                &self.layout.evidence_dir(&settings.evidence_source),
                sink,
            )?);
        }

        Ok(FetchResult {
            release: settings.release.to_string(),
            files: files.into_iter().map(|path| path.to_string()).collect(),
        })
    }

    /// Fetch followed by score.
    pub fn run(
        &self,
        settings: &FetchSettings,
        options: &FetchOptions,
        paths: &PipelinePaths,
        sink: &dyn ProgressSink,
    ) -> Result<RunResult, ScoreError> {
        let fetch = self.fetch(settings, options, sink)?;
        let score = self.score(paths, sink)?;
        Ok(RunResult { fetch, score })
    }
}
