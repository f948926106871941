//! Download folder polling

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Suffixes browsers use while a download is still being written.
const PARTIAL_SUFFIXES: [&str; 3] = [".crdownload", ".part", ".tmp"];

/// Extension of the exported reports.
pub const REPORT_EXTENSION: &str = "csv";

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s)))
        .unwrap_or(false)
}

/// All entries currently in `dir`.
pub async fn snapshot(dir: &Path) -> std::io::Result<HashSet<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut paths = HashSet::new();
    while let Some(entry) = entries.next_entry().await? {
        paths.insert(entry.path());
    }
    Ok(paths)
}

/// First completed file in `dir` that is not in `before`.
pub async fn new_file(dir: &Path, before: &HashSet<PathBuf>) -> std::io::Result<Option<PathBuf>> {
    let mut fresh: Vec<PathBuf> = snapshot(dir)
        .await?
        .into_iter()
        .filter(|p| !before.contains(p) && !is_partial(p) && p.is_file())
        .collect();
    fresh.sort();
    Ok(fresh.into_iter().next())
}

/// Every report in `dir`, sorted by path.
pub async fn list_reports(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut reports: Vec<PathBuf> = snapshot(dir)
        .await?
        .into_iter()
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(REPORT_EXTENSION))
        .filter(|p| p.is_file())
        .collect();
    reports.sort();
    Ok(reports)
}
