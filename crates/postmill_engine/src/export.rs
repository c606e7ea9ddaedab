use std::fs;
use std::path::Path;

use serde::Deserialize;

/// One post as it appears in the export file. Fields are optional here;
/// validation happens in the metadata extractor so a single incomplete
/// post cannot take down the run.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RawPost {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub published_at: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub cover_image: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct Export {
    posts: Option<Vec<RawPost>>,
}

/// Run-fatal export problems; nothing is converted when these occur.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to read export file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("export file {path} is not valid JSON: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("export file {path} has no `posts` collection")]
    MissingPosts { path: String },
}

pub fn load_export(path: &Path) -> Result<Vec<RawPost>, ExportError> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| ExportError::Read {
        path: display.clone(),
        source,
    })?;
    let export: Export = serde_json::from_str(&content).map_err(|source| ExportError::Json {
        path: display.clone(),
        source,
    })?;
    export
        .posts
        .ok_or(ExportError::MissingPosts { path: display })
}
