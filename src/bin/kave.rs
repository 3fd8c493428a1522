//! Kave CLI
//!
//! Command-line interface operating directly on a Kave data directory.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use kave::logfile::LogFile;
use kave::{Command, Config, Lookup, StoreManager, SyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// Kave CLI
#[derive(Parser, Debug)]
#[command(name = "kave")]
#[command(about = "CLI for the Kave log-structured key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./kave_data")]
    data_dir: PathBuf,

    /// Store registry file (defaults to <data-dir>/store_data.json)
    #[arg(short, long)]
    registry: Option<PathBuf>,

    /// Rotate a store's active log file once it grows past this many bytes
    #[arg(long, default_value_t = 64 * 1024 * 1024)]
    rotate_bytes: u64,

    /// Skip the fsync after each append
    #[arg(long)]
    no_fsync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a store
    Create {
        /// The store name
        store: String,
    },

    /// Remove a store and delete its files
    Drop {
        /// The store name
        store: String,
    },

    /// List stores
    List,

    /// Set a key-value pair
    Put {
        store: String,
        key: String,
        value: String,
    },

    /// Get a value by key
    Get { store: String, key: String },

    /// Delete a key
    Del { store: String, key: String },

    /// Replay a single log file and report what it holds
    Verify {
        /// Path to a .gkv log file
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kave=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> kave::Result<ExitCode> {
    // verify works on a bare file and needs no manager
    if let Commands::Verify { file } = &args.command {
        let stats = LogFile::verify(file)?;
        println!(
            "{}: {} records ({} written, {} tombstones, {} legacy), {} bytes",
            file.display(),
            stats.records,
            stats.written,
            stats.tombstones,
            stats.legacy_records,
            stats.bytes
        );
        return Ok(ExitCode::SUCCESS);
    }

    let mut builder = Config::builder()
        .data_dir(&args.data_dir)
        .rotation_threshold(args.rotate_bytes)
        .sync_strategy(if args.no_fsync {
            SyncStrategy::OsBuffered
        } else {
            SyncStrategy::EveryWrite
        });
    if let Some(registry) = &args.registry {
        builder = builder.registry_path(registry);
    }

    tracing::debug!("Kave CLI v{}", kave::VERSION);
    let manager = StoreManager::initialise(builder.build())?;

    let code = match args.command {
        Commands::Create { store } => {
            manager.execute(Command::AddStore { name: store })?;
            ExitCode::SUCCESS
        }
        Commands::Drop { store } => {
            manager.execute(Command::RemoveStore { name: store })?;
            ExitCode::SUCCESS
        }
        Commands::List => {
            for name in manager.store_names() {
                println!("{}", name);
            }
            ExitCode::SUCCESS
        }
        Commands::Put { store, key, value } => {
            manager.execute(Command::Write {
                store,
                key: key.into_bytes(),
                value: value.into_bytes(),
            })?;
            ExitCode::SUCCESS
        }
        Commands::Get { store, key } => match manager.lookup(&store, key.as_bytes())? {
            Lookup::Found(value) => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&value)?;
                stdout.write_all(b"\n")?;
                ExitCode::SUCCESS
            }
            Lookup::Deleted => {
                eprintln!("(deleted)");
                ExitCode::FAILURE
            }
            Lookup::NotPresent => {
                eprintln!("(not found)");
                ExitCode::FAILURE
            }
        },
        Commands::Del { store, key } => {
            manager.execute(Command::Delete {
                store,
                key: key.into_bytes(),
            })?;
            ExitCode::SUCCESS
        }
        Commands::Verify { .. } => ExitCode::SUCCESS,
    };

    manager.close()?;
    Ok(code)
}
