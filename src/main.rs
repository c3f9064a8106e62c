//! Quote Sync - manage a local quote collection from the terminal.
//!
//! Quotes live in a small `SQLite` key-value store. A best-effort sync pulls
//! a batch of records from a remote endpoint and appends the ones that are
//! not already present locally.
//!
//! QUICK START:
//!   quotes show                      # Random quote from the selected category
//!   quotes add "Be bold" Courage     # Add a quote
//!   quotes filter Courage            # Remember a category for show/list
//!   quotes export -o quotes.json     # Save every quote as JSON
//!   quotes sync                      # Merge quotes from the server once
//!   quotes daemon                    # Keep syncing every 30 seconds

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tokio::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    format_categories, format_quote, format_quotes, format_sync_report, format_sync_state,
    CycleOutcome, OutputFormat, QuoteStore, SyncService,
};
use cli::{Cli, Commands};
use domain::{derive_categories, filter, pick_random, AppConfig, CategorySelector};
use infrastructure::{config::save_config, ensure_config_exists, load_config, HttpRemote};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(cli: Cli) -> domain::Result<()> {
    let format = cli
        .output_format()
        .map_err(|e| domain::AppError::Config { message: e })?;

    let config = load_config(cli.data_dir.as_deref())?;

    match cli.command {
        Commands::Show { category } => {
            cmd_show(&config, category)?;
        }
        Commands::Add { text, category } => {
            cmd_add(&config, &text, &category)?;
        }
        Commands::List { category } => {
            cmd_list(&config, category, format)?;
        }
        Commands::Categories => {
            cmd_categories(&config)?;
        }
        Commands::Filter { category } => {
            cmd_filter(&config, category)?;
        }
        Commands::Export { output } => {
            cmd_export(&config, &output)?;
        }
        Commands::Import { file } => {
            cmd_import(&config, &file)?;
        }
        Commands::Sync => {
            cmd_sync(&config).await?;
        }
        Commands::Daemon { interval } => {
            cmd_daemon(config, interval).await?;
        }
        Commands::Paths => {
            cmd_paths(&config);
        }
        Commands::InitConfig { force } => {
            cmd_init_config(&config, force)?;
        }
    }

    Ok(())
}

fn open_store(config: &AppConfig) -> domain::Result<QuoteStore> {
    QuoteStore::open(&config.storage_db_path())
}

/// Resolve an explicit category argument, falling back to the stored selection.
fn resolve_selector(store: &QuoteStore, category: Option<String>) -> CategorySelector {
    category.map_or_else(|| store.last_selected_category(), CategorySelector::from)
}

/// Print a random quote from the given selection.
fn print_random(store: &QuoteStore, selector: &CategorySelector) {
    let collection = store.load();
    let subset = filter(&collection, selector);
    let picked = pick_random(&subset, &mut rand::thread_rng());
    println!("{}", format_quote(picked));
}

/// Show a random quote.
fn cmd_show(config: &AppConfig, category: Option<String>) -> domain::Result<()> {
    let store = open_store(config)?;
    let selector = resolve_selector(&store, category);
    print_random(&store, &selector);
    Ok(())
}

/// Add a quote and persist it.
fn cmd_add(config: &AppConfig, text: &str, category: &str) -> domain::Result<()> {
    let store = open_store(config)?;
    let collection = QuoteStore::add(store.try_load()?, text, category)?;
    store.save(&collection)?;

    println!(
        "{} Added quote ({} total)",
        "✓".green().bold(),
        collection.len()
    );
    print_random(&store, &store.last_selected_category());

    Ok(())
}

/// List quotes, optionally restricted to a category.
fn cmd_list(
    config: &AppConfig,
    category: Option<String>,
    format: OutputFormat,
) -> domain::Result<()> {
    let store = open_store(config)?;
    let selector = resolve_selector(&store, category);
    let collection = store.load();
    let subset = filter(&collection, &selector);

    let output = format_quotes(&subset, format).map_err(domain::AppError::json_parse)?;
    println!("{output}");

    if !matches!(format, OutputFormat::Json) {
        println!();
        println!(
            "Showing {} of {} quotes (category: {})",
            subset.len(),
            collection.len(),
            selector.to_string().cyan()
        );
    }

    Ok(())
}

/// List the category index.
fn cmd_categories(config: &AppConfig) -> domain::Result<()> {
    let store = open_store(config)?;
    let categories = derive_categories(&store.load());
    println!(
        "{}",
        format_categories(&categories, &store.last_selected_category())
    );
    Ok(())
}

/// Persist a category selection and show a quote from it.
fn cmd_filter(config: &AppConfig, category: String) -> domain::Result<()> {
    let store = open_store(config)?;
    let selector = CategorySelector::from(category);

    if !derive_categories(&store.load()).contains(&selector) {
        return Err(domain::AppError::validation(format!(
            "Unknown category: {selector}"
        )));
    }

    store.set_last_selected_category(&selector)?;
    tracing::info!(category = %selector, "Category selected");

    print_random(&store, &selector);
    Ok(())
}

/// Export every quote as pretty JSON.
fn cmd_export(config: &AppConfig, output: &Path) -> domain::Result<()> {
    let store = open_store(config)?;
    let collection = store.load();
    let content = QuoteStore::export(&collection)?;

    std::fs::write(output, content)
        .map_err(|e| domain::AppError::io(format!("Failed to write {}", output.display()), e))?;

    println!(
        "{} Exported {} quotes to {}",
        "✓".green().bold(),
        collection.len(),
        output.display()
    );

    Ok(())
}

/// Import quotes from a JSON file.
fn cmd_import(config: &AppConfig, file: &Path) -> domain::Result<()> {
    let raw = std::fs::read_to_string(file)
        .map_err(|e| domain::AppError::io(format!("Failed to read {}", file.display()), e))?;

    let store = open_store(config)?;
    let before = store.try_load()?;
    let before_len = before.len();
    let collection = QuoteStore::import_batch(before, &raw)?;
    store.save(&collection)?;

    println!(
        "{} Quotes imported successfully! ({} new, {} total)",
        "✓".green().bold(),
        collection.len() - before_len,
        collection.len()
    );
    print_random(&store, &store.last_selected_category());

    Ok(())
}

fn sync_service(config: &AppConfig) -> domain::Result<SyncService<HttpRemote>> {
    let store = Arc::new(Mutex::new(open_store(config)?));
    let remote = HttpRemote::new(&config.sync)?;
    Ok(SyncService::new(config.sync.clone(), store, remote))
}

/// Run a single manual sync cycle.
///
/// A failed cycle is logged and leaves the collection as it was; it does not
/// fail the command.
async fn cmd_sync(config: &AppConfig) -> domain::Result<()> {
    let service = sync_service(config)?;

    match service.tick().await {
        CycleOutcome::Completed(report) => {
            println!("{}", format_sync_report(&report));

            let store = service.store();
            let store = store.lock().await;
            let selected = store.last_selected_category();
            println!();
            println!("{}", format_categories(&derive_categories(&store.load()), &selected));
            println!();
            print_random(&store, &selected);
        }
        CycleOutcome::Skipped => {
            println!("{}", "Sync already in progress".yellow());
        }
        CycleOutcome::Abandoned => {}
    }

    Ok(())
}

/// Sync on a timer until Ctrl-C.
async fn cmd_daemon(mut config: AppConfig, interval: Option<u64>) -> domain::Result<()> {
    if !config.sync.enabled {
        println!(
            "{} Sync is disabled in {}",
            "!".yellow().bold(),
            config.config_file_path().display()
        );
        return Ok(());
    }

    if let Some(secs) = interval {
        config.sync.interval_secs = secs;
    }

    let service = sync_service(&config)?;

    println!(
        "{} Syncing every {}s from {} (Ctrl-C to stop)",
        "🔄".bold(),
        config.sync.interval_secs,
        config.sync.endpoint.cyan()
    );

    service
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Cannot listen for Ctrl-C, running until killed");
                std::future::pending::<()>().await;
            }
        })
        .await;

    println!();
    println!("{}", format_sync_state(&service.state().await));

    Ok(())
}

/// Show paths in use.
fn cmd_paths(config: &AppConfig) {
    println!("{}", "📂 Quote Sync Paths".bold());
    println!();
    println!("  Data dir: {}", config.data_dir().display());
    println!("  Database: {}", config.storage_db_path().display());
    println!("  Config:   {}", config.config_file_path().display());
}

/// Write the config file.
fn cmd_init_config(config: &AppConfig, force: bool) -> domain::Result<()> {
    let path = config.config_file_path();

    if force {
        save_config(config)?;
        println!("{} Wrote {}", "✓".green().bold(), path.display());
    } else if ensure_config_exists(config)? {
        println!("{} Created {}", "✓".green().bold(), path.display());
    } else {
        println!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    Ok(())
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
