//! memwal CLI
//!
//! Command-line interface over a local memwal data directory.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use memwal::env::PosixEnv;
use memwal::wal::WalRecovery;
use memwal::{Config, Engine, WalSyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// memwal CLI
#[derive(Parser, Debug)]
#[command(name = "memwal-cli")]
#[command(about = "CLI for the memwal key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./memwal_data")]
    data_dir: PathBuf,

    /// When to fsync the WAL
    #[arg(short, long, value_enum, default_value = "flush-only")]
    sync: SyncMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SyncMode {
    /// Flush every record, leave fsync to the OS
    FlushOnly,
    /// fsync every record
    EveryWrite,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    #[command(alias = "del")]
    Delete {
        /// The key to delete
        key: String,
    },

    /// Print every live key-value pair in key order
    Scan,

    /// Decode the WAL without opening the store
    Verify,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,memwal=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> memwal::Result<()> {
    if let Commands::Verify = args.command {
        let wal_path = args.data_dir.join("wal.log");
        let result = WalRecovery::verify(&PosixEnv, &wal_path)?;
        println!("records:       {}", result.records_replayed);
        println!("puts:          {}", result.puts);
        println!("deletes:       {}", result.deletes);
        println!("last sequence: {}", result.last_sequence);
        println!("valid bytes:   {}", result.valid_bytes);
        println!("torn tail:     {}", result.torn_tail);
        return Ok(());
    }

    let sync = match args.sync {
        SyncMode::FlushOnly => WalSyncStrategy::FlushOnly,
        SyncMode::EveryWrite => WalSyncStrategy::EveryWrite,
    };
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .wal_sync_strategy(sync)
        .build();

    let mut engine = Engine::open(config)?;

    match args.command {
        Commands::Get { key } => match engine.get(key.as_bytes())? {
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => println!("(nil)"),
        },
        Commands::Put { key, value } => {
            let sequence = engine.put(key.as_bytes(), value.as_bytes())?;
            println!("OK (seq {})", sequence);
        }
        Commands::Delete { key } => {
            let sequence = engine.delete(key.as_bytes())?;
            println!("OK (seq {})", sequence);
        }
        Commands::Scan => {
            for (key, value) in engine.scan() {
                println!(
                    "{}\t{}",
                    String::from_utf8_lossy(&key),
                    String::from_utf8_lossy(&value)
                );
            }
        }
        Commands::Verify => unreachable!("handled before the engine is opened"),
    }

    engine.close()
}
