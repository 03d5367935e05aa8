//! Obit-Harvest main entry point
//!
//! This is the command-line interface for the obituary harvester.

use chrono::{Local, Utc};
use clap::Parser;
use obit_harvest::browser::HttpAccessorFactory;
use obit_harvest::config::{load_config_with_hash, Config};
use obit_harvest::names::normalize_name;
use obit_harvest::output::{
    export_file_name, write_with_fallback, CsvFileSink, ExportSink, SqliteSink,
};
use obit_harvest::pipeline::PipelineRun;
use obit_harvest::retry::SystemClock;
use obit_harvest::CorrelationPipeline;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Obit-Harvest: obituary listings joined with property records
///
/// Obit-Harvest scrolls obituary listings, normalizes the names it finds,
/// looks each person up on a property-records site and exports the merged
/// table as CSV.
#[derive(Parser, Debug)]
#[command(name = "obit-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Obituary harvester with property-record lookup", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", required_unless_present = "normalize")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without harvesting
    #[arg(long)]
    dry_run: bool,

    /// Print how a raw name is split and exit (repeatable)
    #[arg(long, value_name = "NAME")]
    normalize: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if !cli.normalize.is_empty() {
        handle_normalize(&cli.normalize);
        return Ok(());
    }

    let Some(config_path) = cli.config else {
        return Err("a configuration file is required".into());
    };

    tracing::info!("Loading configuration from: {}", config_path.display());
    let (config, config_hash) = match load_config_with_hash(&config_path) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_run(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("obit_harvest=info,warn"),
            1 => EnvFilter::new("obit_harvest=debug,info"),
            2 => EnvFilter::new("obit_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --normalize: prints the split of each name
fn handle_normalize(names: &[String]) {
    for raw in names {
        let name = normalize_name(raw);
        println!(
            "{:?} -> first: {:?}, last: {:?}, full: {:?}",
            raw, name.first_name, name.last_name, name.full_name
        );
    }
}

/// Handles the --dry-run mode: shows what would be harvested
fn handle_dry_run(config: &Config) {
    println!("=== Obit-Harvest Dry Run ===\n");

    println!("Harvest:");
    println!(
        "  Scroll step: {}px (+0..{}px)",
        config.harvest.scroll_step, config.harvest.scroll_jitter
    );
    println!("  Settle delay: {}ms", config.harvest.settle_delay_ms);
    println!(
        "  Stop after {} empty passes or {} rounds",
        config.harvest.stagnant_threshold, config.harvest.max_scroll_rounds
    );

    println!("\nRetry:");
    println!("  Max retries: {}", config.retry.max_retries);
    println!(
        "  Delay: {}-{}ms",
        config.retry.min_delay_ms, config.retry.max_delay_ms
    );

    println!("\nProperty Lookup:");
    println!("  Search URL: {}", config.lookup.search_url);
    println!("  Workers: {}", config.lookup.workers);
    println!(
        "  Interval: {}-{}ms",
        config.lookup.min_interval_ms, config.lookup.max_interval_ms
    );

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!(
        "  File: {}",
        export_file_name(&config.output.file_prefix, Local::now().date_naive())
    );
    if let Some(db) = &config.output.database_path {
        println!("  Archive: {}", db);
    }

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        println!("  - {} {}", source.kind, source.url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main run: harvest, look up, export
async fn handle_run(config: Config, config_hash: &str) -> Result<(), Box<dyn std::error::Error>> {
    let started_at = Utc::now();
    let output = config.output.clone();

    tracing::info!("Sources: {}, lookup workers: {}", config.sources.len(), config.lookup.workers);

    let factory = Arc::new(HttpAccessorFactory::from_config(&config.user_agent)?);
    let pipeline = CorrelationPipeline::new(config, factory, Arc::new(SystemClock));

    let run = match pipeline.run().await {
        Ok(run) => run,
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            return Err(e.into());
        }
    };

    println!("{}\n", run.summary);

    if run.is_empty() {
        tracing::warn!("Nothing harvested; no export written");
        return Ok(());
    }

    export(&run, &output, config_hash, started_at)?;
    Ok(())
}

/// Writes the table to the output directory, falling back to the working
/// directory, then appends it to the archive if one is configured
fn export(
    run: &PipelineRun,
    output: &obit_harvest::config::OutputConfig,
    config_hash: &str,
    started_at: chrono::DateTime<Utc>,
) -> Result<(), Box<dyn std::error::Error>> {
    let name = export_file_name(&output.file_prefix, Local::now().date_naive());
    let primary = CsvFileSink::new(&output.directory);
    let fallback = CsvFileSink::new(".");

    let receipt = write_with_fallback(&run.records, &name, &primary, &fallback)?;
    println!("✓ Exported {} rows to {}", receipt.rows, receipt.location);

    if let Some(db) = &output.database_path {
        match SqliteSink::new(Path::new(db), config_hash, started_at)
            .and_then(|archive| archive.write(&run.records, &name))
        {
            Ok(receipt) => println!("✓ Archived to {}", receipt.location),
            Err(e) => tracing::warn!("Could not archive run: {}", e),
        }
    }

    Ok(())
}
