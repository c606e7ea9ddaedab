use std::path::PathBuf;
use std::sync::Arc;

use pipeline_logging::pipeline_warn;
use regex::Regex;
use thiserror::Error;

use crate::download::AssetFetcher;
use crate::layout::AssetContext;
use crate::markers::{AssetStatus, MarkerStore};

pub const DEFAULT_CDN_HOST: &str = "substackcdn.com";

#[derive(Debug, Clone)]
pub struct LocalizeSettings {
    /// Only image references whose URL contains this host are localized;
    /// everything else in the body is left alone.
    pub cdn_host: String,
}

impl Default for LocalizeSettings {
    fn default() -> Self {
        Self {
            cdn_host: DEFAULT_CDN_HOST.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetDisposition {
    /// Fetched during this pass; reference rewritten.
    Downloaded,
    /// Success marker from an earlier pass; reference rewritten, no fetch.
    AlreadyLocal,
    /// Permanent marker from an earlier pass; remote URL left in place.
    SkippedPermanent,
    FailedPermanent,
    FailedTransient,
    /// No filename could be derived from the URL; reference left untouched.
    Unresolved,
}

/// One record per distinguishable asset outcome in a localization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetOutcome {
    pub filename: String,
    pub url: String,
    pub disposition: AssetDisposition,
    pub error: Option<String>,
}

impl AssetOutcome {
    pub fn is_permanent(&self) -> bool {
        matches!(
            self.disposition,
            AssetDisposition::SkippedPermanent | AssetDisposition::FailedPermanent
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizeReport {
    pub body: String,
    /// Distinct references scanned, resolvable or not.
    pub processed: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub outcomes: Vec<AssetOutcome>,
}

impl LocalizeReport {
    pub fn errors(&self) -> impl Iterator<Item = &AssetOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }
}

#[derive(Debug, Error)]
pub enum LocalizeError {
    #[error("asset directory {} does not exist; create it before localizing", .0.display())]
    AssetDirMissing(PathBuf),
    #[error("invalid reference pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// An image reference grouped by URL: duplicate URLs are fetched once but
/// every literal occurrence is rewritten.
#[derive(Debug)]
struct Reference {
    url: String,
    literals: Vec<String>,
}

pub struct AssetLocalizer {
    fetcher: Arc<dyn AssetFetcher>,
    image_pattern: Regex,
    token_pattern: Regex,
}

impl AssetLocalizer {
    pub fn new(
        fetcher: Arc<dyn AssetFetcher>,
        settings: LocalizeSettings,
    ) -> Result<Self, LocalizeError> {
        let host = regex::escape(&settings.cdn_host);
        let image_pattern = Regex::new(&format!(
            r"!\[[^\]]*\]\(\s*(https?://[^)\s]*{host}[^)\s]*)\s*\)"
        ))?;
        let token_pattern =
            Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")?;
        Ok(Self {
            fetcher,
            image_pattern,
            token_pattern,
        })
    }

    /// One-asset-folder-per-document mode: assets land next to the
    /// document and references become `./{filename}`.
    pub async fn localize_in_place(
        &self,
        body: &str,
        doc_dir: &std::path::Path,
    ) -> Result<LocalizeReport, LocalizeError> {
        let ctx = AssetContext {
            asset_dir: doc_dir.to_path_buf(),
            link_prefix: ".".to_string(),
            marker_dir: doc_dir.to_path_buf(),
        };
        self.localize_with(body, &ctx).await
    }

    /// Shared-asset-pool mode: the caller supplies the directory, link
    /// prefix, and marker directory. The asset directory must already
    /// exist; creating it is caller setup, not localization.
    pub async fn localize_with(
        &self,
        body: &str,
        ctx: &AssetContext,
    ) -> Result<LocalizeReport, LocalizeError> {
        if !ctx.asset_dir.is_dir() {
            return Err(LocalizeError::AssetDirMissing(ctx.asset_dir.clone()));
        }

        let references = self.extract_references(body);
        let store = MarkerStore::new(&ctx.asset_dir, &ctx.marker_dir);
        let mut report = LocalizeReport {
            body: body.to_string(),
            processed: references.len(),
            ..Default::default()
        };

        for reference in &references {
            let Some(filename) = self.derive_filename(&reference.url) else {
                report.outcomes.push(AssetOutcome {
                    filename: "unknown".to_string(),
                    url: reference.url.clone(),
                    disposition: AssetDisposition::Unresolved,
                    error: Some(format!(
                        "could not derive an asset filename from {}",
                        reference.url
                    )),
                });
                continue;
            };

            match store.status(&filename) {
                AssetStatus::SkipSuccess => {
                    report.skipped += 1;
                    rewrite_reference(&mut report.body, reference, &ctx.link_prefix, &filename);
                    report.outcomes.push(AssetOutcome {
                        filename,
                        url: reference.url.clone(),
                        disposition: AssetDisposition::AlreadyLocal,
                        error: None,
                    });
                }
                AssetStatus::SkipPermanent => {
                    // The remote URL stays visible in the document rather
                    // than dangling at a local file that will never exist.
                    report.skipped += 1;
                    report.outcomes.push(AssetOutcome {
                        filename,
                        url: reference.url.clone(),
                        disposition: AssetDisposition::SkippedPermanent,
                        error: Some("permanent failure recorded on an earlier run".to_string()),
                    });
                }
                AssetStatus::Attempt => {
                    let outcome = self
                        .attempt_fetch(reference, &filename, ctx, &store, &mut report)
                        .await;
                    report.outcomes.push(outcome);
                }
            }
        }

        Ok(report)
    }

    async fn attempt_fetch(
        &self,
        reference: &Reference,
        filename: &str,
        ctx: &AssetContext,
        store: &MarkerStore,
        report: &mut LocalizeReport,
    ) -> AssetOutcome {
        let destination = ctx.asset_dir.join(filename);
        match self.fetcher.fetch(&reference.url, &destination).await {
            Ok(()) => {
                if let Err(err) = store.record_success(filename) {
                    // The asset is on disk; losing the marker only costs a
                    // re-download on the next run.
                    pipeline_warn!("success marker write failed for {filename}: {err}");
                }
                report.downloaded += 1;
                rewrite_reference(&mut report.body, reference, &ctx.link_prefix, filename);
                AssetOutcome {
                    filename: filename.to_string(),
                    url: reference.url.clone(),
                    disposition: AssetDisposition::Downloaded,
                    error: None,
                }
            }
            Err(err) if err.is_permanent() => {
                let message = err.to_string();
                if let Err(marker_err) = store.record_permanent(filename, &message) {
                    pipeline_warn!("permanent marker write failed for {filename}: {marker_err}");
                }
                AssetOutcome {
                    filename: filename.to_string(),
                    url: reference.url.clone(),
                    disposition: AssetDisposition::FailedPermanent,
                    error: Some(message),
                }
            }
            Err(err) => {
                let message = err.to_string();
                if let Err(marker_err) = store.record_transient(filename, &message) {
                    pipeline_warn!("transient marker write failed for {filename}: {marker_err}");
                }
                AssetOutcome {
                    filename: filename.to_string(),
                    url: reference.url.clone(),
                    disposition: AssetDisposition::FailedTransient,
                    error: Some(message),
                }
            }
        }
    }

    fn extract_references(&self, body: &str) -> Vec<Reference> {
        let mut references: Vec<Reference> = Vec::new();
        for caps in self.image_pattern.captures_iter(body) {
            let literal = caps[0].to_string();
            let url = caps[1].to_string();
            match references.iter_mut().find(|r| r.url == url) {
                Some(existing) => {
                    if !existing.literals.contains(&literal) {
                        existing.literals.push(literal);
                    }
                }
                None => references.push(Reference {
                    url,
                    literals: vec![literal],
                }),
            }
        }
        references
    }

    /// `{uuid}.{ext}`: the UUID-shaped token in the URL plus the URL
    /// path's extension. Returns None when either part is missing.
    fn derive_filename(&self, url: &str) -> Option<String> {
        let token = self
            .token_pattern
            .find(url)?
            .as_str()
            .to_ascii_lowercase();
        let path = match url::Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => url
                .split(['?', '#'])
                .next()
                .unwrap_or(url)
                .to_string(),
        };
        let (_, ext) = path.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        if ext.is_empty() || ext.len() > 5 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(format!("{token}.{ext}"))
    }
}

// Literal text substitution: every occurrence of each matched reference
// text is replaced, so repeated identical references stay consistent.
fn rewrite_reference(body: &mut String, reference: &Reference, prefix: &str, filename: &str) {
    let local = format!("{prefix}/{filename}");
    for literal in &reference.literals {
        let replacement = literal.replace(reference.url.as_str(), &local);
        *body = body.replace(literal.as_str(), &replacement);
    }
}
