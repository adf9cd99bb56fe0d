//! Pricewatch CLI: scrape grocery prices and inspect the history.
//!
//! Usage:
//!   pricewatch run [--config path] [--db path] [--webdriver url] [--item name]... [--top n]
//!   pricewatch top [--db path] [--top n]
//!   pricewatch history [--db path] [--item name] [--source label] [--limit n] [--json]

use clap::{Parser, Subcommand};
use pricewatch::{
    adapters_from_config, CancellationToken, Config, ItemRanking, Navigator, ObservationFilter, OpenStore,
    Orchestrator, PriceStore, SqliteStore, WebDriverLauncher,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;

#[derive(Parser)]
#[command(name = "pricewatch", version, about = "Grocery price tracker")]
struct Cli {
    /// Log verbosity (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every enabled retailer for the tracked items now
    Run {
        /// Path to YAML config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Path to SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
        /// WebDriver server URL
        #[arg(long)]
        webdriver: Option<String>,
        /// Item to search for (repeatable); defaults to the most purchased items
        #[arg(long = "item")]
        items: Vec<String>,
        /// How many ranked items to track when no --item is given
        #[arg(long)]
        top: Option<usize>,
    },
    /// List the most frequently purchased items
    Top {
        /// Path to SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
        /// Number of items to show
        #[arg(long, default_value_t = pricewatch::config::DEFAULT_TOP_ITEMS)]
        top: usize,
    },
    /// Show stored price observations
    History {
        /// Path to YAML config file (for the display offset)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Path to SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
        /// Only observations for this searched item
        #[arg(long)]
        item: Option<String>,
        /// Only observations from this retailer (label or config key)
        #[arg(long)]
        source: Option<String>,
        /// Show only the most recent N rows
        #[arg(long)]
        limit: Option<usize>,
        /// Print rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Get the default database path (~/.local/share/pricewatch/pricewatch.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir().unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("pricewatch").join("pricewatch.db")
}

fn load_config(path: Option<&Path>) -> Result<Config, String> {
    match path {
        Some(path) => Config::load(path).map_err(|e| format!("Failed to load config: {}", e)),
        None => Ok(Config::default()),
    }
}

fn open_store(db: Option<PathBuf>) -> Result<SqliteStore, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database {}: {}", db_path.display(), e))
}

fn cmd_run(
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    webdriver: Option<String>,
    items: Vec<String>,
    top: Option<usize>,
) -> i32 {
    let mut config = match load_config(config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Some(url) = webdriver {
        config.webdriver_url = url;
    }
    if let Some(db) = db {
        config.database = Some(db);
    }
    if let Err(e) = config.validate() {
        eprintln!("Error: invalid configuration: {}", e);
        return 1;
    }

    let store = match open_store(config.database.clone()) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let items = if items.is_empty() {
        match store.top_items(top.unwrap_or(config.top_items)) {
            Ok(ranked) => ranked,
            Err(e) => {
                eprintln!("Error: failed to rank items: {}", e);
                return 1;
            }
        }
    } else {
        items
    };
    if items.is_empty() {
        println!("No items to track.");
        return 0;
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    rt.block_on(async {
        let launcher = WebDriverLauncher::new(config.webdriver_url.clone(), config.navigation_timeout);
        let navigator = Navigator::new(Arc::new(launcher)).with_navigation_timeout(config.navigation_timeout);

        let token = CancellationToken::new();
        let mut orchestrator = Orchestrator::new(navigator, store.clone()).with_cancellation(token.clone());
        for adapter in adapters_from_config(&config) {
            orchestrator.register(adapter);
        }

        // First Ctrl-C stops after the pair in flight
        token.cancel_on_interrupt();

        let summary = orchestrator.run_once(&items).await;
        println!("{}", summary);
        for failure in &summary.failures {
            println!("  failed: {} @ {}: {}", failure.item, failure.source, failure.error);
        }
        0
    })
}

fn cmd_top(db: Option<PathBuf>, top: usize) -> i32 {
    let store = match open_store(db) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match store.top_items(top) {
        Ok(items) if items.is_empty() => {
            println!("No purchase history.");
            0
        }
        Ok(items) => {
            for (rank, item) in items.iter().enumerate() {
                println!("{:>3}. {}", rank + 1, item);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_history(
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    item: Option<String>,
    source: Option<String>,
    limit: Option<usize>,
    json: bool,
) -> i32 {
    let config = match load_config(config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let store = match open_store(db.or_else(|| config.database.clone())) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let mut filter = ObservationFilter::new();
    if let Some(item) = item {
        filter = filter.with_item(item);
    }
    if let Some(source) = source {
        filter = filter.with_source(source);
    }
    if let Some(limit) = limit {
        filter = filter.with_limit(limit);
    }

    let rows = match store.observations(&filter) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if json {
        return match serde_json::to_string_pretty(&rows) {
            Ok(out) => {
                println!("{}", out);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        };
    }
    if rows.is_empty() {
        println!("No observations.");
        return 0;
    }

    let offset = config.display_offset();
    println!("{:<16}  {:<12}  {:<20}  {:>9}  {}", "OBSERVED", "SOURCE", "SEARCHED", "PRICE", "ITEM");
    println!("{}", "-".repeat(96));
    for row in rows {
        println!(
            "{:<16}  {:<12}  {:<20}  {:>9}  {}",
            row.observed_local(offset).format("%Y-%m-%d %H:%M"),
            row.source,
            row.searched_item,
            row.price,
            row.item_name
        );
    }
    0
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let code = match cli.command {
        Commands::Run {
            config,
            db,
            webdriver,
            items,
            top,
        } => cmd_run(config, db, webdriver, items, top),
        Commands::Top { db, top } => cmd_top(db, top),
        Commands::History {
            config,
            db,
            item,
            source,
            limit,
            json,
        } => cmd_history(config, db, item, source, limit, json),
    };
    std::process::exit(code);
}
