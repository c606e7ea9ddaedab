mod config;
mod logging;
mod reporter;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use postmill_engine::{ConvertSettings, Orchestrator, OutputLayout};

#[derive(Debug, Parser)]
#[command(
    name = "postmill",
    version,
    about = "Convert a blog export into portable markdown documents"
)]
struct Cli {
    /// Path to the JSON export file.
    export: PathBuf,

    /// Directory receiving the converted documents.
    #[arg(short, long, default_value = "posts")]
    output: PathBuf,

    /// Write `{slug}.md` files with one shared asset directory instead of
    /// a directory per post.
    #[arg(long)]
    flat: bool,

    /// Re-convert posts whose output already exists.
    #[arg(long)]
    force: bool,

    /// Optional RON settings file; flags win where they overlap.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where log output goes.
    #[arg(long, value_enum, default_value = "terminal")]
    log: logging::LogDestination,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log);

    let file_config = config::load(cli.config.as_deref())?;
    let settings = build_settings(&cli, &file_config);

    let orchestrator = Orchestrator::new(settings).context("building the conversion pipeline")?;
    let reporter = reporter::LogReporter;

    let runtime = tokio::runtime::Runtime::new().context("starting the async runtime")?;
    let summary = runtime
        .block_on(orchestrator.run(&cli.export, &reporter))
        .with_context(|| format!("converting {}", cli.export.display()))?;

    reporter::log_summary(&summary);
    // Partial failure is reported through the summary, not an error value;
    // the process exit code is where the CLI surfaces it.
    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn build_settings(cli: &Cli, file: &config::AppConfig) -> ConvertSettings {
    let mut settings = ConvertSettings::new(cli.output.clone());
    settings.skip_existing = !cli.force;
    settings.layout = if cli.flat {
        OutputLayout::Flat {
            asset_dir: file
                .asset_dir
                .clone()
                .unwrap_or_else(|| postmill_engine::DEFAULT_ASSET_DIR.to_string()),
            asset_prefix: file
                .asset_prefix
                .clone()
                .unwrap_or_else(|| postmill_engine::DEFAULT_ASSET_PREFIX.to_string()),
        }
    } else {
        OutputLayout::Nested
    };

    if let Some(host) = &file.cdn_host {
        settings.localize.cdn_host = host.clone();
    }
    if let Some(extension) = &file.extension {
        settings.extension = extension.clone();
    }
    if let Some(attempts) = file.max_attempts {
        settings.download.max_attempts = attempts;
    }
    if let Some(ms) = file.retry_delay_ms {
        settings.download.retry_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = file.request_timeout_ms {
        settings.download.request_timeout = Duration::from_millis(ms);
    }
    settings.download.fetch_pause = Duration::from_millis(file.fetch_pause_ms.unwrap_or(150));
    settings
}
