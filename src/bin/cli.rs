//! nvstore CLI
//!
//! Inspect and edit a persistence directory from the host: read and write
//! individual parameters, dump the whole record space, verify integrity.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use nvstore::{Config, FileStore, FlushOutcome, StoreError, WriteStatus};

/// nvstore CLI
#[derive(Parser, Debug)]
#[command(name = "nvstore-cli")]
#[command(about = "Inspect and edit a crash-safe parameter store")]
#[command(version)]
struct Args {
    /// Root directory holding the persistence ring
    #[arg(short, long, default_value = "./nvstore_data")]
    root: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read a value by index
    Get {
        /// The record index
        index: u16,
    },

    /// Write a value and commit it immediately
    Set {
        /// The record index
        index: u16,

        /// The value to store
        value: f32,
    },

    /// Print every record in the active file
    Dump,

    /// Verify the active file's checksum trailer
    Verify,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,nvstore=info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();

    // Host-side tool: no rate limiting, commit on demand.
    let config = Config::builder().min_commit_interval_ms(0).build();
    let mut store = FileStore::open_path(&args.root, config);

    let outcome = match args.command {
        Commands::Get { index } => store.read_value(index).map(|value| {
            println!("{index}: {value}");
        }),
        Commands::Set { index, value } => set(&mut store, index, value),
        Commands::Dump => dump(&mut store),
        Commands::Verify => store.verify().map(|()| {
            println!("OK: active file validates");
        }),
    };

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn set(
    store: &mut FileStore<nvstore::DiskMedia>,
    index: u16,
    value: f32,
) -> nvstore::Result<()> {
    match store.write_value(index, value)? {
        WriteStatus::Unchanged => {
            println!("{index}: unchanged ({value})");
            return Ok(());
        }
        WriteStatus::Busy => {
            println!("{index}: busy, not written");
            return Ok(());
        }
        WriteStatus::Accepted => {}
    }
    match store.flush()? {
        FlushOutcome::Committed => println!("{index}: {value} committed"),
        other => println!("{index}: {value} pending ({other:?})"),
    }
    Ok(())
}

fn dump(store: &mut FileStore<nvstore::DiskMedia>) -> nvstore::Result<()> {
    let count = store.record_count()?;
    let count = u16::try_from(count).map_err(|_| {
        StoreError::Media(format!("record space too large to dump: {count} records"))
    })?;
    for index in 0..count {
        let value = store.read_value(index)?;
        println!("{index}: {value}");
    }
    Ok(())
}
