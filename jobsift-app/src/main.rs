use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use jobsift_common::observability::{LogConfig, init_logging};
use jobsift_common::query::KeywordProcessor;
use jobsift_config::{JobsiftConfig, JobsiftConfigLoader};
use jobsift_engine::Aggregator;
use jobsift_store::{ExportFormat, Exporter, FileStore, Storage};
use tracing::{info, warn};

mod report;

/// Aggregate job postings from every configured board, feed and API.
#[derive(Debug, Parser)]
#[command(name = "jobsift", version)]
struct Args {
    /// Comma-separated search keywords.
    #[arg(long, env = "DEFAULT_KEYWORDS")]
    keywords: Option<String>,

    #[arg(long, env = "DEFAULT_LOCATION", default_value = "Remote")]
    location: String,

    /// Source configuration document.
    #[arg(long, default_value = "config/sources.yaml")]
    config: PathBuf,

    /// Directory holding the posting store.
    #[arg(long, default_value = "data")]
    data: PathBuf,

    /// Debug logging mirrored to stderr, plus per-source outcomes.
    #[arg(long)]
    verbose: bool,

    /// Export stored postings in this format and exit.
    #[arg(long, value_parser = ["csv", "json"])]
    export: Option<String>,

    /// File name for `--export`, relative to the export directory.
    #[arg(long, requires = "export")]
    export_file: Option<String>,

    /// Add default synonyms for each keyword.
    #[arg(long)]
    expand_synonyms: bool,

    /// Probe every API provider's credentials and exit.
    #[arg(long)]
    validate_credentials: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let log_path = init_logging(LogConfig::default().verbose(args.verbose))?;
    info!(log = %log_path.display(), "jobsift.start");

    let config = JobsiftConfigLoader::new()
        .with_file(&args.config)
        .load()
        .with_context(|| format!("loading {}", args.config.display()))?;

    if let Some(format) = &args.export {
        return export_stored(&args, &config, format.parse()?).await;
    }

    let aggregator = Aggregator::from_config(&config).await?;
    if args.validate_credentials {
        return validate_credentials(&aggregator).await;
    }

    let Some(keywords) = args.keywords.as_deref().filter(|k| !k.trim().is_empty()) else {
        bail!("no keywords given; pass --keywords or set DEFAULT_KEYWORDS");
    };
    let query = KeywordProcessor::new()
        .with_synonym_expansion(args.expand_synonyms)
        .process(keywords)
        .into_query(args.location.as_str());
    info!(keywords = ?query.keywords, location = %query.location, "jobsift.query");

    let result = aggregator.run(&query).await?;

    let store = FileStore::open(&args.data).await?;
    let saved = store.store(&result.postings).await?;
    let stats = store.stats().await?;
    let stored = store.all().await?;

    println!("{}", report::run_summary(&result, &saved, &stats));
    println!("{}", report::recent_jobs(&stored, 10));

    let exporter = Exporter::new(&config.global.export_path);
    for name in &config.global.export_formats {
        let exported = name
            .parse::<ExportFormat>()
            .and_then(|format| exporter.export(format, &stored, Some(&stats), None));
        match exported {
            Ok(path) => println!("Exported {} to {}", name, path.display()),
            Err(err) => warn!(format = %name, error = %err, "jobsift.export.failed"),
        }
    }

    if args.verbose {
        println!("{}", report::outcomes(&result.outcomes));
        println!("{}", report::provider_stats(&aggregator.registry().stats().await));
    }

    store.close().await?;
    Ok(())
}

async fn export_stored(args: &Args, config: &JobsiftConfig, format: ExportFormat) -> Result<()> {
    let store = FileStore::open(&args.data).await?;
    let postings = store.all().await?;
    let stats = store.stats().await?;
    let path = Exporter::new(&config.global.export_path).export(
        format,
        &postings,
        Some(&stats),
        args.export_file.as_deref(),
    )?;
    println!("Exported {} postings to {}", postings.len(), path.display());
    Ok(())
}

async fn validate_credentials(aggregator: &Aggregator) -> Result<()> {
    let results = aggregator.registry().validate_all().await;
    if results.is_empty() {
        println!("No API providers configured.");
        return Ok(());
    }
    for (name, result) in &results {
        match result {
            Ok(()) => println!("  {name}: ok"),
            Err(err) => println!("  {name}: {err}"),
        }
    }
    Ok(())
}
