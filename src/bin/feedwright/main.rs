use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use spdlog::{error, info, warn};

use feedwright::config::LogLevel;
use feedwright::logger::configure_logger;
use feedwright::pipeline::FeedPipeline;

use crate::config::open_config;
use crate::config_data::write_sample_cfg;

mod config;
mod config_data;

const CFG_FILE_NAME: &str = "feedwright.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long)]
    config_path: Option<String>,

    /// Publish draft articles too
    #[arg(long)]
    include_drafts: bool,

    /// Maximum number of articles in the feed
    #[arg(short, long)]
    limit: Option<usize>,

    /// Report failures as warnings and exit successfully
    #[arg(long)]
    warn_only: bool,

    /// Log at debug level regardless of the configuration
    #[arg(short, long)]
    verbose: bool,

    /// Write a sample configuration file and exit
    #[arg(long)]
    generate_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let warn_only = args.warn_only;

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if warn_only => {
            warn!("Feed generation failed: {:#}", err);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Feed generation failed: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config_path = args.config_path.map(PathBuf::from);

    if args.generate_config {
        let path = config_path.unwrap_or_else(|| PathBuf::from(CFG_FILE_NAME));
        if path.exists() {
            bail!("{} already exists. Not overwriting it", path.display());
        }
        write_sample_cfg(&path).with_context(|| format!("writing {}", path.display()))?;
        println!("Sample configuration written to {}", path.display());
        return Ok(());
    }

    let mut config = open_config(config_path)?;

    let level_override = args.verbose.then_some(LogLevel::Debug);
    if let Err(err) = configure_logger(&config, level_override) {
        eprintln!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    if args.include_drafts {
        config.defaults.include_drafts = true;
    }
    if args.limit.is_some() {
        config.defaults.item_limit = args.limit;
    }

    info!("Starting feedwright =-=-=-=-=-=-=-=-=-=-=-=-=-=-=-");
    info!("Reading articles from {}", config.paths.content_dir.display());

    let report = FeedPipeline::from_config(config).on_build_done().await?;

    for skipped in &report.skipped {
        warn!("Skipped {}: {}", skipped.slug, skipped.error);
    }
    for path in report.writes.written() {
        info!("Feed available at {}", path.display());
    }
    info!("{} of {} selected articles published", report.processed, report.selected);
    Ok(())
}
