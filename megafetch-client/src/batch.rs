//! Sequential download of several links.
//!
//! Failures while fetching a file (API codes on `g`, content transport,
//! integrity, local writes) are recorded and the batch moves on. Only
//! session-level failures abort the run.

use crate::api_client::MegaClient;
use crate::error::{MegaError, MegaResult};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One file to fetch, as supplied by whatever discovered the links.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRequest {
    pub display_name: String,
    pub link: String,
    pub filename: Option<String>,
}

impl DownloadRequest {
    pub fn new(display_name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            link: link.into(),
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// What happened to one request.
#[derive(Debug)]
pub enum DownloadOutcome {
    Downloaded(PathBuf),
    /// A folder named after this entry already exists.
    AlreadyPresent,
    Failed(MegaError),
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<(String, DownloadOutcome)>,
}

impl BatchReport {
    pub fn downloaded(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().filter_map(|(name, outcome)| match outcome {
            DownloadOutcome::Downloaded(path) => Some((name.as_str(), path.as_path())),
            _ => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &MegaError)> {
        self.entries.iter().filter_map(|(name, outcome)| match outcome {
            DownloadOutcome::Failed(err) => Some((name.as_str(), err)),
            _ => None,
        })
    }

    pub fn skipped(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, outcome)| matches!(outcome, DownloadOutcome::AlreadyPresent))
            .count()
    }
}

/// Downloads every request whose display name is not already contained in
/// one of `present` (names of existing version folders).
pub async fn download_all(
    client: &MegaClient,
    requests: &[DownloadRequest],
    dest_dir: &Path,
    present: &[String],
) -> MegaResult<BatchReport> {
    let mut report = BatchReport::default();

    for request in requests {
        if present.iter().any(|folder| folder.contains(&request.display_name)) {
            info!("{} is already present", request.display_name);
            report
                .entries
                .push((request.display_name.clone(), DownloadOutcome::AlreadyPresent));
            continue;
        }

        info!("downloading {} to {}", request.display_name, dest_dir.display());
        let outcome = match client
            .download(&request.link, dest_dir, request.filename.as_deref())
            .await
        {
            Ok(path) => DownloadOutcome::Downloaded(path),
            Err(err) if err.is_per_file() => {
                warn!("skipping {}: {err}", request.display_name);
                DownloadOutcome::Failed(err)
            }
            Err(err) => return Err(err),
        };
        report.entries.push((request.display_name.clone(), outcome));
    }

    Ok(report)
}
