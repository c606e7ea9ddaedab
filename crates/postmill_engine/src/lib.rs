//! Postmill engine: export loading, conversion pipeline, asset localization.
mod orchestrator;
mod localize;
mod download;
mod markers;
mod export;
mod metadata;
mod cleanup;
mod frontmatter;
mod slug;
mod persist;
mod layout;
mod types;

pub use cleanup::clean_body;
pub use download::{
    AssetFetcher, DownloadSettings, FetchError, FetchFailure, ReqwestDownloader,
};
pub use export::{load_export, ExportError, RawPost};
pub use frontmatter::build_document;
pub use layout::{AssetContext, OutputLayout, DEFAULT_ASSET_DIR, DEFAULT_ASSET_PREFIX};
pub use localize::{
    AssetDisposition, AssetLocalizer, AssetOutcome, LocalizeError, LocalizeReport,
    LocalizeSettings, DEFAULT_CDN_HOST,
};
pub use markers::{AssetStatus, MarkerError, MarkerStore};
pub use metadata::{extract_metadata, MetadataError, PostMeta};
pub use orchestrator::{ConvertSettings, Orchestrator, RunError};
pub use persist::{ensure_output_dir, write_document, AtomicFileWriter, PersistError};
pub use slug::{validate_slug, SlugError};
pub use types::{
    ChannelEventSink, ConversionOutcome, ConvertEvent, EventSink, NullEventSink, OutcomeStatus,
    PostError, PostErrorKind, PostFailure, RunSummary,
};
