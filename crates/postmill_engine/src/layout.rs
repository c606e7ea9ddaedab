use std::path::{Path, PathBuf};

pub const DEFAULT_ASSET_DIR: &str = "_images";
pub const DEFAULT_ASSET_PREFIX: &str = "/images";

/// Where a post's asset downloads land, how rewritten links are prefixed,
/// and where fetch markers are kept. The marker directory usually equals
/// the asset directory; a shared asset pool points both at the pool so
/// deduplication spans every document using it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetContext {
    pub asset_dir: PathBuf,
    pub link_prefix: String,
    pub marker_dir: PathBuf,
}

/// The one strategy value distinguishing the two output layouts; every
/// other pipeline stage is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLayout {
    /// `{out}/{slug}/index.{ext}` with assets in the same per-post
    /// directory, referenced relative to the document.
    Nested,
    /// `{out}/{slug}.{ext}` with assets pooled in one sibling directory,
    /// referenced by an absolute prefix.
    Flat {
        asset_dir: String,
        asset_prefix: String,
    },
}

impl OutputLayout {
    pub fn flat_default() -> Self {
        OutputLayout::Flat {
            asset_dir: DEFAULT_ASSET_DIR.to_string(),
            asset_prefix: DEFAULT_ASSET_PREFIX.to_string(),
        }
    }

    pub fn document_path(&self, output_dir: &Path, slug: &str, extension: &str) -> PathBuf {
        match self {
            OutputLayout::Nested => output_dir.join(slug).join(format!("index.{extension}")),
            OutputLayout::Flat { .. } => output_dir.join(format!("{slug}.{extension}")),
        }
    }

    /// The skip-if-converted check mirrors the layout: nested mode keys on
    /// the per-post directory, flat mode on the single output file.
    pub fn is_converted(&self, output_dir: &Path, slug: &str, extension: &str) -> bool {
        match self {
            OutputLayout::Nested => output_dir.join(slug).is_dir(),
            OutputLayout::Flat { .. } => self.document_path(output_dir, slug, extension).is_file(),
        }
    }

    pub fn asset_context(&self, output_dir: &Path, slug: &str) -> AssetContext {
        match self {
            OutputLayout::Nested => {
                let dir = output_dir.join(slug);
                AssetContext {
                    asset_dir: dir.clone(),
                    link_prefix: ".".to_string(),
                    marker_dir: dir,
                }
            }
            OutputLayout::Flat {
                asset_dir,
                asset_prefix,
            } => {
                let dir = output_dir.join(asset_dir);
                AssetContext {
                    asset_dir: dir.clone(),
                    link_prefix: asset_prefix.clone(),
                    marker_dir: dir,
                }
            }
        }
    }
}
