use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

const MARKER_SUBDIR: &str = ".markers";
const MARKER_EXT: &str = "marker";
const PERMANENT_SUFFIX: &str = "forbidden";

/// What the localizer should do for one asset filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStatus {
    /// Asset file present and success marker recorded: rewrite, no fetch.
    SkipSuccess,
    /// A permanent failure was recorded on an earlier run: never fetch again.
    SkipPermanent,
    /// Never tried, or a prior transient failure: fetch (again).
    Attempt,
}

#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("failed to create marker directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write marker {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Durable record of asset-fetch outcomes, one small file per asset in a
/// hidden subdirectory of the marker directory. The files are the only
/// cross-run state in the pipeline:
///
/// - `{filename}.marker`, empty: fetched successfully, skip forever;
/// - `{filename}.marker`, non-empty: transient failure, retry next run;
/// - `{filename}.marker.forbidden`: permanent failure, never retry.
#[derive(Debug, Clone)]
pub struct MarkerStore {
    asset_dir: PathBuf,
    marker_dir: PathBuf,
}

impl MarkerStore {
    /// `asset_dir` is where completed assets live; `marker_dir` is where
    /// markers are kept. They differ only when many documents share one
    /// asset pool.
    pub fn new(asset_dir: &Path, marker_dir: &Path) -> Self {
        Self {
            asset_dir: asset_dir.to_path_buf(),
            marker_dir: marker_dir.to_path_buf(),
        }
    }

    pub fn status(&self, filename: &str) -> AssetStatus {
        let asset = self.asset_dir.join(filename);
        let marker = self.marker_path(filename);
        if asset.is_file() && is_empty_file(&marker) {
            return AssetStatus::SkipSuccess;
        }
        if self.permanent_path(filename).is_file() {
            return AssetStatus::SkipPermanent;
        }
        AssetStatus::Attempt
    }

    pub fn record_success(&self, filename: &str) -> Result<(), MarkerError> {
        self.write_marker(&self.marker_path(filename), "")
    }

    pub fn record_transient(&self, filename: &str, error: &str) -> Result<(), MarkerError> {
        // Non-emptiness is what flags the next run to retry; never record
        // a transient failure as an empty file.
        let content = if error.is_empty() { "unknown error" } else { error };
        self.write_marker(&self.marker_path(filename), content)
    }

    pub fn record_permanent(&self, filename: &str, error: &str) -> Result<(), MarkerError> {
        self.write_marker(&self.permanent_path(filename), error)
    }

    fn marker_path(&self, filename: &str) -> PathBuf {
        self.marker_dir
            .join(MARKER_SUBDIR)
            .join(format!("{filename}.{MARKER_EXT}"))
    }

    fn permanent_path(&self, filename: &str) -> PathBuf {
        self.marker_dir
            .join(MARKER_SUBDIR)
            .join(format!("{filename}.{MARKER_EXT}.{PERMANENT_SUFFIX}"))
    }

    // The hidden subdirectory is created lazily: it is an implementation
    // detail the caller never has to set up.
    fn write_marker(&self, path: &Path, content: &str) -> Result<(), MarkerError> {
        let dir = self.marker_dir.join(MARKER_SUBDIR);
        fs::create_dir_all(&dir).map_err(|source| MarkerError::CreateDir { path: dir, source })?;
        fs::write(path, content).map_err(|source| MarkerError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn is_empty_file(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() == 0)
        .unwrap_or(false)
}
