use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use pipeline_logging::pipeline_debug;
use thiserror::Error;

use crate::cleanup::clean_body;
use crate::download::{AssetFetcher, DownloadSettings, ReqwestDownloader};
use crate::export::{load_export, ExportError, RawPost};
use crate::frontmatter::build_document;
use crate::layout::OutputLayout;
use crate::localize::{
    AssetDisposition, AssetLocalizer, AssetOutcome, LocalizeError, LocalizeSettings,
};
use crate::metadata::extract_metadata;
use crate::persist::{ensure_output_dir, write_document};
use crate::slug::validate_slug;
use crate::types::{
    ConversionOutcome, ConvertEvent, EventSink, OutcomeStatus, PostError, PostErrorKind,
    PostFailure, RunSummary,
};

#[derive(Debug, Clone)]
pub struct ConvertSettings {
    pub output_dir: PathBuf,
    pub layout: OutputLayout,
    pub extension: String,
    /// Leave posts whose output already exists untouched; re-running the
    /// whole pipeline is the supported retry mechanism.
    pub skip_existing: bool,
    pub localize: LocalizeSettings,
    pub download: DownloadSettings,
}

impl ConvertSettings {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            layout: OutputLayout::Nested,
            extension: "md".to_string(),
            skip_existing: true,
            localize: LocalizeSettings::default(),
            download: DownloadSettings::default(),
        }
    }
}

/// Run-fatal problems: the run aborts with nothing claimed converted.
/// Everything else is caught at the post boundary.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("output directory {path}: {message}")]
    OutputDir { path: PathBuf, message: String },
    #[error(transparent)]
    Localizer(LocalizeError),
}

pub struct Orchestrator {
    settings: ConvertSettings,
    localizer: AssetLocalizer,
}

impl Orchestrator {
    pub fn new(settings: ConvertSettings) -> Result<Self, RunError> {
        let fetcher = Arc::new(ReqwestDownloader::new(settings.download.clone()));
        Self::with_fetcher(settings, fetcher)
    }

    /// Inject a custom fetcher; the rest of the pipeline is unchanged.
    pub fn with_fetcher(
        settings: ConvertSettings,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> Result<Self, RunError> {
        let localizer = AssetLocalizer::new(fetcher, settings.localize.clone())
            .map_err(RunError::Localizer)?;
        Ok(Self {
            settings,
            localizer,
        })
    }

    /// Convert every post in the export, strictly in order. Per-post
    /// failures are recorded and reported but never stop the loop.
    pub async fn run(
        &self,
        export_path: &Path,
        sink: &dyn EventSink,
    ) -> Result<RunSummary, RunError> {
        let started = Instant::now();

        let posts = load_export(export_path).map_err(|err| {
            sink.emit(ConvertEvent::Error {
                kind: PostErrorKind::Fatal,
                slug: None,
                message: err.to_string(),
            });
            err
        })?;
        pipeline_debug!(
            "loaded {} posts from {}",
            posts.len(),
            export_path.display()
        );

        if let Err(err) = ensure_output_dir(&self.settings.output_dir) {
            let message = err.to_string();
            sink.emit(ConvertEvent::Error {
                kind: PostErrorKind::Fatal,
                slug: None,
                message: message.clone(),
            });
            return Err(RunError::OutputDir {
                path: self.settings.output_dir.clone(),
                message,
            });
        }

        let total = posts.len();
        let mut converted = 0usize;
        let mut skipped = 0usize;
        let mut failed = 0usize;
        let mut failures = Vec::new();

        for (i, raw) in posts.iter().enumerate() {
            let index = i + 1;
            let post_started = Instant::now();
            let slug_hint = slug_hint(raw, index);
            sink.emit(ConvertEvent::PostStarted {
                slug: slug_hint.clone(),
                index,
                total,
            });

            let outcome = match self.run_post(raw, index, sink).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    failures.push(PostFailure {
                        slug: slug_hint.clone(),
                        message: err.message.clone(),
                    });
                    sink.emit(ConvertEvent::Error {
                        kind: err.kind,
                        slug: Some(slug_hint.clone()),
                        message: err.message.clone(),
                    });
                    ConversionOutcome {
                        slug: slug_hint,
                        title: raw.title.clone().unwrap_or_default(),
                        output_path: None,
                        status: OutcomeStatus::Failed,
                        error: Some(err.message),
                    }
                }
            };

            match outcome.status {
                OutcomeStatus::Converted => converted += 1,
                OutcomeStatus::Skipped => skipped += 1,
                OutcomeStatus::Failed => failed += 1,
            }
            sink.emit(ConvertEvent::PostCompleted {
                outcome,
                index,
                total,
                elapsed: post_started.elapsed(),
            });
        }

        Ok(RunSummary {
            converted,
            skipped,
            failed,
            failures,
            elapsed: started.elapsed(),
        })
    }

    async fn run_post(
        &self,
        raw: &RawPost,
        index: usize,
        sink: &dyn EventSink,
    ) -> Result<ConversionOutcome, PostError> {
        let settings = &self.settings;
        let meta = extract_metadata(raw, index)
            .map_err(|err| PostError::new(PostErrorKind::Parse, err.to_string()))?;
        validate_slug(&meta.slug)
            .map_err(|err| PostError::new(PostErrorKind::Parse, err.to_string()))?;

        if settings.skip_existing
            && settings
                .layout
                .is_converted(&settings.output_dir, &meta.slug, &settings.extension)
        {
            let path =
                settings
                    .layout
                    .document_path(&settings.output_dir, &meta.slug, &settings.extension);
            return Ok(ConversionOutcome {
                slug: meta.slug.clone(),
                title: meta.title.clone(),
                output_path: Some(path),
                status: OutcomeStatus::Skipped,
                error: None,
            });
        }

        let cleaned = clean_body(&meta.body);

        let ctx = settings.layout.asset_context(&settings.output_dir, &meta.slug);
        ensure_output_dir(&ctx.asset_dir)
            .map_err(|err| PostError::new(PostErrorKind::Write, err.to_string()))?;
        let report = self
            .localizer
            .localize_with(&cleaned, &ctx)
            .await
            .map_err(classify_localize_error)?;
        for outcome in &report.outcomes {
            if let Some(event) = asset_event(&meta.slug, outcome) {
                sink.emit(event);
            }
        }

        let document = build_document(&meta, &report.body);
        let path = write_document(
            &settings.output_dir,
            &meta.slug,
            &settings.layout,
            &settings.extension,
            &document,
        )
        .map_err(|err| PostError::new(PostErrorKind::Write, err.to_string()))?;

        Ok(ConversionOutcome {
            slug: meta.slug.clone(),
            title: meta.title.clone(),
            output_path: Some(path),
            status: OutcomeStatus::Converted,
            error: None,
        })
    }
}

fn slug_hint(raw: &RawPost, index: usize) -> String {
    raw.slug
        .as_deref()
        .map(str::trim)
        .filter(|slug| !slug.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("post-{index}"))
}

fn classify_localize_error(err: LocalizeError) -> PostError {
    let kind = match &err {
        // Precondition violation: the caller failed to set up the asset
        // directory.
        LocalizeError::AssetDirMissing(_) => PostErrorKind::Write,
        LocalizeError::Pattern(_) => PostErrorKind::Fatal,
    };
    PostError::new(kind, err.to_string())
}

// Unresolved references carry no event; they exist only in the report's
// error list.
fn asset_event(slug: &str, outcome: &AssetOutcome) -> Option<ConvertEvent> {
    let (success, permanent) = match outcome.disposition {
        AssetDisposition::Downloaded | AssetDisposition::AlreadyLocal => (true, false),
        AssetDisposition::SkippedPermanent | AssetDisposition::FailedPermanent => (false, true),
        AssetDisposition::FailedTransient => (false, false),
        AssetDisposition::Unresolved => return None,
    };
    Some(ConvertEvent::AssetProcessed {
        slug: slug.to_string(),
        filename: outcome.filename.clone(),
        success,
        permanent,
        error: outcome.error.clone(),
    })
}
