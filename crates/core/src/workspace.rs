//! The destination directory: the one mutable resource a run owns.

use std::{future::Future, io::ErrorKind, path::Path, path::PathBuf};

use serde::Serialize;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::FileDeletionError;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failures: Vec<FileDeletionError>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Delete every regular file directly inside `dir`.
///
/// Subdirectories are left alone. A file that cannot be removed is recorded
/// and the sweep continues; a missing directory has nothing to clear.
pub async fn clear_directory(dir: &Path) -> CleanupReport {
    clear_directory_with(dir, |path| async move { fs::remove_file(path).await }).await
}

async fn clear_directory_with<F, Fut>(dir: &Path, mut remove: F) -> CleanupReport
where
    F: FnMut(PathBuf) -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    let mut report = CleanupReport::default();

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return report,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "could not list directory");
            report.failures.push(FileDeletionError {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            });
            return report;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                report.failures.push(FileDeletionError {
                    path: dir.to_path_buf(),
                    reason: e.to_string(),
                });
                break;
            }
        };

        let path = entry.path();
        let is_file = match entry.file_type().await {
            Ok(file_type) => file_type.is_file() || is_symlink_to_file(&path, file_type).await,
            Err(e) => {
                record_failure(&mut report, path, e);
                continue;
            }
        };
        if !is_file {
            continue;
        }

        match remove(path.clone()).await {
            Ok(()) => {
                debug!(path = %path.display(), "deleted");
                report.removed.push(path);
            }
            Err(e) => record_failure(&mut report, path, e),
        }
    }

    report
}

async fn is_symlink_to_file(path: &Path, file_type: std::fs::FileType) -> bool {
    file_type.is_symlink()
        && fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
}

fn record_failure(report: &mut CleanupReport, path: PathBuf, e: std::io::Error) {
    let failure = FileDeletionError {
        path,
        reason: e.to_string(),
    };
    warn!("{failure}");
    report.failures.push(failure);
}
