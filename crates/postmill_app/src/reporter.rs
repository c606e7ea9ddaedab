use pipeline_logging::{pipeline_error, pipeline_info, pipeline_warn};
use postmill_engine::{ConvertEvent, EventSink, OutcomeStatus, RunSummary};

/// Bridges pipeline events onto the global logger. The engine runs just as
/// well with a `NullEventSink`; this is the CLI's console surface.
pub struct LogReporter;

impl EventSink for LogReporter {
    fn emit(&self, event: ConvertEvent) {
        match event {
            ConvertEvent::PostStarted { slug, index, total } => {
                pipeline_info!("[{index}/{total}] converting {slug}");
            }
            ConvertEvent::AssetProcessed {
                slug,
                filename,
                success: true,
                ..
            } => {
                pipeline_info!("  localized {filename} for {slug}");
            }
            ConvertEvent::AssetProcessed {
                slug,
                filename,
                permanent,
                error,
                ..
            } => {
                let reason = error.unwrap_or_else(|| "unknown error".to_string());
                if permanent {
                    pipeline_warn!("  {filename} for {slug} is permanently unavailable: {reason}");
                } else {
                    pipeline_warn!("  {filename} for {slug} failed, will retry next run: {reason}");
                }
            }
            ConvertEvent::PostCompleted { outcome, .. } => match outcome.status {
                OutcomeStatus::Converted => {
                    if let Some(path) = outcome.output_path {
                        pipeline_info!("  wrote {}", path.display());
                    }
                }
                OutcomeStatus::Skipped => {
                    pipeline_info!("  {} already converted, skipping", outcome.slug);
                }
                // The matching Error event already logged the details.
                OutcomeStatus::Failed => {}
            },
            ConvertEvent::Error {
                kind,
                slug,
                message,
            } => match slug {
                Some(slug) => pipeline_error!("{slug}: {kind} error: {message}"),
                None => pipeline_error!("{kind} error: {message}"),
            },
        }
    }
}

pub fn log_summary(summary: &RunSummary) {
    pipeline_info!(
        "done: {} converted, {} skipped, {} failed in {:.2?}",
        summary.converted,
        summary.skipped,
        summary.failed,
        summary.elapsed
    );
    for failure in &summary.failures {
        pipeline_warn!("  {}: {}", failure.slug, failure.message);
    }
}
