//! Trawline main entry point
//!
//! This is the command-line interface for the Trawline results harvester.

use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use trawline::config::load_config_with_hash;
use trawline::harvest::harvest;

/// Trawline: an advisory-guided results harvester
///
/// Trawline runs bounded data-collection sessions over paginated results,
/// combining an external advisory signal with local heuristics, and persists
/// deduplicated records incrementally so partial results always survive.
#[derive(Parser, Debug)]
#[command(name = "trawline")]
#[command(version = "1.0.0")]
#[command(about = "An advisory-guided results harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would run without harvesting
    #[arg(long, conflicts_with_all = ["stats", "export"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export"])]
    stats: bool,

    /// Rewrite the JSON export from existing data and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export {
        handle_export(&config)?;
    } else {
        handle_harvest(config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("trawline=info,warn"),
            1 => EnvFilter::new("trawline=debug,info"),
            2 => EnvFilter::new("trawline=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &trawline::config::Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Trawline Dry Run ===\n");

    println!("Harvest Configuration:");
    println!("  Record quota: {}", config.harvest.max_records);
    println!(
        "  Max concurrent sessions: {}",
        config.harvest.max_concurrent_sessions
    );
    println!(
        "  Max session runtime: {}s",
        config.harvest.max_session_runtime_secs
    );
    println!("  Max iterations per session: {}", config.harvest.max_iterations);
    println!("  Stall threshold: {}", config.harvest.stall_threshold);
    println!("  Login retries: {}", config.harvest.login_retries);
    println!("  Pagination retries: {}", config.harvest.pagination_retries);

    println!("\nPacing:");
    println!(
        "  Base delay: {}-{}ms",
        config.pacing.base_delay_min_ms, config.pacing.base_delay_max_ms
    );
    println!(
        "  Long pause: {:.0}% chance of {}-{}ms",
        config.pacing.long_pause_chance * 100.0,
        config.pacing.long_pause_min_ms,
        config.pacing.long_pause_max_ms
    );

    println!("\nAdvisory:");
    println!("  Endpoint: {}", config.advisory.base_url);
    println!("  Model: {}", config.advisory.model);
    println!("  API key env: {}", config.advisory.api_key_env);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Export: {}", config.output.export_path);

    println!("\nSearches ({}):", config.searches.len());
    for search in &config.searches {
        println!("  - \"{}\" in \"{}\"", search.keyword, search.location);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would run {} search session(s)", config.searches.len());

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &trawline::config::Config) -> Result<(), Box<dyn std::error::Error>> {
    use std::path::Path;
    use trawline::output::{load_statistics, print_statistics};
    use trawline::storage::open_store;

    println!("Database: {}\n", config.output.database_path);

    let store = open_store(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export mode: rewrites the JSON export from existing data
fn handle_export(config: &trawline::config::Config) -> Result<(), Box<dyn std::error::Error>> {
    use std::path::Path;
    use trawline::output::flush_export;
    use trawline::storage::open_store;

    println!("=== Exporting Collected Records ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.export_path);
    println!();

    let store = open_store(Path::new(&config.output.database_path))?;
    let total = flush_export(&store, Path::new(&config.output.export_path))?;

    println!(
        "✓ Exported {} record(s) to: {}",
        total, config.output.export_path
    );

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: trawline::config::Config,
    config_hash: String,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Searches: {}, quota: {}, concurrency: {}",
        config.searches.len(),
        config.harvest.max_records,
        config.harvest.max_concurrent_sessions
    );

    // Ctrl-C ends sessions at their next iteration boundary; collected
    // records are already persisted and exported at that point
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing current iterations");
            signal_cancel.cancel();
        }
    });

    match harvest(config, config_hash, cancel).await {
        Ok(total) => {
            tracing::info!("Harvest completed with {} record(s) collected", total);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
