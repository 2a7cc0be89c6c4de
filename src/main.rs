use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pagestore::repl::Shell;
use pagestore::{RecordStore, StoreConfig};

/// Paged record store with an LRU buffer cache
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backing store file, created and zero-filled if missing
    #[arg(short, long, default_value = "/tmp/sgbd.fs")]
    path: PathBuf,

    /// JSON file with store geometry and cache settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of buffer cache frames
    #[arg(short, long)]
    frames: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Open the store, print its statistics and exit
    #[arg(long)]
    no_shell: bool,
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<StoreConfig, pagestore::ConfigError> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    if let Some(frames) = args.frames {
        config.frame_count = frames;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);
    info!(verbose = args.verbose, "Starting pagestore");

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let store = match RecordStore::open(&args.path, config) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: failed to open {}: {}", args.path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if args.no_shell {
        println!("{}", pagestore::repl::format_stats(&store.stats()));
        return ExitCode::SUCCESS;
    }

    let mut shell = Shell::new(store);
    match shell.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
