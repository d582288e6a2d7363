use std::sync::OnceLock;
use std::time::{Duration, Instant};

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::Release;
use crate::error::ScoreError;
use crate::store::write_bytes_atomic;

pub const DEFAULT_BASE_URL: &str = "https://ftp.ebi.ac.uk/pub/databases/opentargets/platform";

/// Spark completion marker present in every exported folder.
const SUCCESS_MARKER: &str = "_SUCCESS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_dir: bool,
}

pub trait ReleaseClient: Send + Sync {
    /// Entries of a directory relative to the mirror root.
    fn list(&self, remote_dir: &str) -> Result<Vec<RemoteEntry>, ScoreError>;
    /// Downloads one file relative to the mirror root. Returns the number of bytes written.
    fn download(&self, remote_path: &str, destination: &Utf8Path) -> Result<u64, ScoreError>;
}

/// JSON export directory of a release, relative to the mirror root.
pub fn release_json_dir(release: &Release) -> String {
    format!("{}/output/etl/json", release.as_str())
}

#[derive(Clone)]
pub struct ReleaseHttpClient {
    client: Client,
    base_url: String,
}

impl ReleaseHttpClient {
    pub fn new(base_url: &str) -> Result<Self, ScoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-er/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ScoreError::ReleaseHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|err| ScoreError::ReleaseHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, ScoreError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| ScoreError::ReleaseHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| format!("request for {url} failed"));
            return Err(ScoreError::ReleaseStatus { status, message });
        }
        Ok(response)
    }
}

impl ReleaseClient for ReleaseHttpClient {
    fn list(&self, remote_dir: &str) -> Result<Vec<RemoteEntry>, ScoreError> {
        let url = format!("{}/{}/", self.base_url, remote_dir.trim_matches('/'));
        let body = self
            .get(&url)?
            .text()
            .map_err(|err| ScoreError::ReleaseHttp(err.to_string()))?;
        Ok(parse_index(&body))
    }

    fn download(&self, remote_path: &str, destination: &Utf8Path) -> Result<u64, ScoreError> {
        let url = format!("{}/{}", self.base_url, remote_path.trim_start_matches('/'));
        let bytes = self
            .get(&url)?
            .bytes()
            .map_err(|err| ScoreError::ReleaseHttp(err.to_string()))?;
        write_bytes_atomic(destination, &bytes)?;
        Ok(bytes.len() as u64)
    }
}

/// Extracts the entries of an HTML directory listing.
pub fn parse_index(html: &str) -> Vec<RemoteEntry> {
    static HREF: OnceLock<Regex> = OnceLock::new();
    let href = HREF.get_or_init(|| Regex::new(r#"href\s*=\s*"([^"]+)""#).expect("valid regex"));

    let mut entries: Vec<RemoteEntry> = Vec::new();
    for capture in href.captures_iter(html) {
        let link = &capture[1];
        if link.starts_with('?')
            || link.starts_with('/')
            || link.starts_with('#')
            || link.starts_with("..")
            || link.contains("://")
        {
            continue;
        }
        let is_dir = link.ends_with('/');
        let name = link.trim_end_matches('/').to_string();
        if !is_plain_name(&name) || entries.iter().any(|entry| entry.name == name) {
            continue;
        }
        entries.push(RemoteEntry { name, is_dir });
    }
    entries
}

/// A single path component: no separators, no `.` or `..`.
pub fn is_plain_name(name: &str) -> bool {
    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return false;
    }
    let mut components = Utf8Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Utf8Component::Normal(_)), None)
    )
}

/// Downloads every file of `remote_dir` into `local_dir`, skipping the completion marker.
pub fn fetch_folder(
    client: &dyn ReleaseClient,
    remote_dir: &str,
    local_dir: &Utf8Path,
    sink: &dyn ProgressSink,
) -> Result<Vec<Utf8PathBuf>, ScoreError> {
    std::fs::create_dir_all(local_dir.as_std_path())
        .map_err(|err| ScoreError::Filesystem(format!("create {local_dir}: {err}")))?;

    let entries = client.list(remote_dir)?;
    tracing::debug!(remote_dir, entries = entries.len(), "listed remote folder");

    let mut saved = Vec::new();
    for entry in entries
        .iter()
        .filter(|entry| !entry.is_dir && entry.name != SUCCESS_MARKER)
    {
        if !is_plain_name(&entry.name) {
            tracing::warn!("skipping remote entry {:?} in {remote_dir}", entry.name);
            continue;
        }
        let remote_path = format!("{}/{}", remote_dir.trim_end_matches('/'), entry.name);
        let destination = local_dir.join(&entry.name);
        let started = Instant::now();
        let bytes = client.download(&remote_path, &destination)?;
        tracing::info!(bytes, "{remote_path} saved to {destination}");
        sink.event(ProgressEvent {
            message: format!("phase=Fetch; saved {destination}"),
            elapsed: Some(started.elapsed()),
        });
        saved.push(destination);
    }
    Ok(saved)
}

/// Downloads every subfolder of `remote_dir`, e.g. all evidence sources.
pub fn fetch_subfolders(
    client: &dyn ReleaseClient,
    remote_dir: &str,
    local_dir: &Utf8Path,
    sink: &dyn ProgressSink,
) -> Result<Vec<Utf8PathBuf>, ScoreError> {
    let folders = client.list(remote_dir)?;
    let mut saved = Vec::new();
    for folder in folders.iter().filter(|entry| entry.is_dir) {
        if !is_plain_name(&folder.name) {
            tracing::warn!("skipping remote folder {:?} in {remote_dir}", folder.name);
            continue;
        }
        let remote = format!("{}/{}", remote_dir.trim_end_matches('/'), folder.name);
        saved.extend(fetch_folder(
            client,
            &remote,
            &local_dir.join(&folder.name),
            sink,
        )?);
    }
    Ok(saved)
}
