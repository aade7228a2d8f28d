//! `update-links`: point internal links of a cleaned tree at itself.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use snapshot_cleaner::{AppConfig, FsStorage, LinkRewriter, batch, logging};
use tracing::info;

/// Rewrite internal links so pages in the cleaned tree reference each other.
#[derive(Parser)]
#[command(name = "update-links", version, long_about = None)]
struct Cli {
    /// Cleaned tree to rewrite in place.
    #[arg(default_value = "clean")]
    target_dir: PathBuf,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory name of the original snapshot tree.
    #[arg(long)]
    source_root: Option<String>,

    /// Directory name of the cleaned tree.
    #[arg(long)]
    dest_root: Option<String>,

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
    if let Some(source) = cli.source_root {
        config.links.source_root_name = source;
    }
    if let Some(dest) = cli.dest_root {
        config.links.dest_root_name = dest;
    }

    info!("Directory: {}", cli.target_dir.display());
    info!(
        "Rewriting /{}/ -> /{}/",
        config.links.source_root_name, config.links.dest_root_name
    );

    let rewriter = LinkRewriter::new(&config.links)?;
    let storage = FsStorage::new(&cli.target_dir);
    let report = batch::rewrite_tree(&cli.target_dir, &storage, &rewriter, &config.batch).await?;

    if report.processed() == 0 && report.is_success() {
        info!("No HTML files found in {}", cli.target_dir.display());
        return Ok(());
    }

    for file in &report.files {
        if file.stats.links_rewritten > 0 {
            info!("{}: {} links updated", file.path.display(), file.stats.links_rewritten);
        } else {
            info!("{}: no changes needed", file.path.display());
        }
    }
    info!(
        "Done. {} links updated in {} files",
        report.totals().links_rewritten,
        report.processed()
    );

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
