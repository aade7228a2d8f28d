//! `clean-html`: sanitize a tree of saved pages into a clean mirror.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use snapshot_cleaner::{AppConfig, FsStorage, Sanitizer, batch, logging};
use tracing::info;

const MIB: f64 = 1024.0 * 1024.0;

/// Strip tracking artifacts from saved HTML pages without changing how they render.
#[derive(Parser)]
#[command(name = "clean-html", version, long_about = None)]
struct Cli {
    /// Directory holding the saved pages.
    #[arg(default_value = "original")]
    input_dir: PathBuf,

    /// Directory the cleaned tree is written to.
    #[arg(default_value = "clean")]
    output_dir: PathBuf,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Re-indent the output instead of preserving the parsed layout.
    #[arg(long)]
    pretty: bool,

    /// Strip vendor tracking attributes and classes.
    #[arg(long)]
    strip_tracking: bool,

    /// Merge every <style> block into one at the top of <head>.
    #[arg(long)]
    consolidate_styles: bool,

    /// Number of files processed at once.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    logging::init_tracing(env!("CARGO_CRATE_NAME"), cli.verbose);

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if cli.pretty {
        config.sanitizer = config.sanitizer.preserve_formatting(false);
    }
    if cli.strip_tracking {
        config.sanitizer = config.sanitizer.strip_tracking(true);
    }
    if cli.consolidate_styles {
        config.sanitizer = config.sanitizer.consolidate_styles(true);
    }
    if let Some(concurrency) = cli.concurrency {
        config.batch.concurrency = concurrency;
        config.validate()?;
    }

    info!("Input directory:  {}", cli.input_dir.display());
    info!("Output directory: {}", cli.output_dir.display());

    let sanitizer = Sanitizer::from_config(&config.sanitizer, Arc::new(config.signature))?;
    info!("Passes: {}", sanitizer.pass_names().join(", "));

    let storage = FsStorage::new(&cli.output_dir);
    storage.ensure_base_dir().await?;
    let report = batch::sanitize_tree(&cli.input_dir, &storage, &sanitizer, &config.batch).await?;

    if report.processed() == 0 && report.is_success() {
        info!("No HTML files found in {}", cli.input_dir.display());
        return Ok(());
    }

    let totals = report.totals();
    info!(
        "Removed {} iframes, {} vendor comments, {} canonical links, {} meta tags",
        totals.iframes, totals.comments, totals.canonical_links, totals.meta_tags
    );
    if config.sanitizer.strip_tracking_attrs || config.sanitizer.strip_tracking_classes {
        info!(
            "Stripped {} tracking attributes, {} tracking classes",
            totals.attributes, totals.classes
        );
    }
    if config.sanitizer.consolidate_styles {
        info!("Merged {} style blocks", totals.styles_merged);
    }
    info!(
        "Size: {:.2}MB -> {:.2}MB ({:.1}% reduction)",
        report.bytes_in() as f64 / MIB,
        report.bytes_out() as f64 / MIB,
        snapshot_cleaner::stats::reduction_percent(report.bytes_in(), report.bytes_out()),
    );
    info!("Cleaned {} files", report.processed());
    if report.assets_copied() > 0 {
        info!("Copied {} asset folders", report.assets_copied());
    }

    if !report.is_success() {
        for failure in &report.failures {
            tracing::error!("{}: {}", failure.path.display(), failure.error);
        }
        return Err(eyre!(
            "{} of {} files failed",
            report.failed(),
            report.failed() + report.processed()
        ));
    }
    Ok(())
}
