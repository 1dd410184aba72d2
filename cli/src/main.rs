//! extscan - watch directories and find files by extension

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use extscan_file_scanner::{
    CoordinatorOptions, ExtensionFilter, JsonWatchListStore, ScanCommand, ScanCoordinator,
    ScanEvent, ScannerConfig, WatchListStore,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Keep a list of watched directories and scan them for matching files
#[derive(Parser)]
#[command(name = "extscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the watch list (overrides the config file)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start watching directories
    Add {
        /// Directories to watch
        #[arg(required = true)]
        dirs: Vec<String>,
    },
    /// Stop watching directories
    Remove {
        /// Directories to forget
        #[arg(required = true)]
        dirs: Vec<String>,
    },
    /// List watched directories
    List,
    /// Scan every watched directory
    Scan {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print the result event as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add, remove and optionally scan in a single pass
    Process {
        /// Directories to watch
        #[arg(long = "add")]
        add: Vec<String>,

        /// Directories to forget
        #[arg(long = "remove")]
        remove: Vec<String>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Scan after updating the watch list
        #[arg(long)]
        scan: bool,

        /// Print the result event as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Extension suffix to match, e.g. `.txt` (repeatable; omit to match everything)
    #[arg(short = 'e', long = "ext")]
    extensions: Vec<String>,
}

impl FilterArgs {
    fn into_filter(self) -> ExtensionFilter {
        if self.extensions.is_empty() {
            ExtensionFilter::any()
        } else {
            ExtensionFilter::extensions(self.extensions)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => ScannerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ScannerConfig::default(),
    };
    if let Some(store) = cli.store {
        config = config.with_store_dir(store);
    }
    debug!("Using store directory {}", config.store_dir.display());

    let store = JsonWatchListStore::open(&config.store_dir)
        .with_context(|| format!("failed to open watch list in {}", config.store_dir.display()))?;
    let (coordinator, mut events) =
        ScanCoordinator::new(Arc::new(store), CoordinatorOptions::from(&config));

    let (command, json) = match cli.command {
        Commands::Add { dirs } => (ScanCommand::add(dirs), false),
        Commands::Remove { dirs } => (ScanCommand::remove(dirs), false),
        Commands::List => {
            coordinator.process(ScanCommand::default()).await;
            for entry in coordinator.store().entries() {
                println!("{}\t{}", entry.id, entry.path);
            }
            return Ok(());
        }
        Commands::Scan { filter, json } => (ScanCommand::scan(filter.into_filter()), json),
        Commands::Process {
            add,
            remove,
            filter,
            scan,
            json,
        } => {
            let mut command = ScanCommand::add(add)
                .with_remove(remove)
                .with_filter(filter.into_filter());
            command.should_scan = scan;
            (command, json)
        }
    };

    if coordinator.process(command).await.is_none() {
        print_watched(coordinator.store().as_ref());
        return Ok(());
    }

    // The coordinator sends exactly one event per scan.
    if let Some(event) = events.recv().await {
        print_event(&event, json)?;
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_watched(store: &dyn WatchListStore) {
    let count = store.len();
    eprintln!("{count} watched director{}", if count == 1 { "y" } else { "ies" });
}

fn print_event(event: &ScanEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(event)?);
        return Ok(());
    }

    for path in event.matched_paths() {
        println!("{path}");
    }
    Ok(())
}
