//! scdb command-line tool
//!
//! Builds databases from `key<sep>value` text files, looks keys up, and
//! dumps database contents.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use scdb::make::make_from_file;
use scdb::{Config, DatabaseReader};
use tracing_subscriber::{fmt, EnvFilter};

/// scdb CLI
#[derive(Parser, Debug)]
#[command(name = "scdb")]
#[command(about = "Build and query constant databases")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a database from a text file of `key<sep>value` lines
    Make {
        /// Input text file
        input: PathBuf,

        /// Separator between key and value (first byte is used)
        sep: String,

        /// Database file to create or replace
        output: PathBuf,

        /// Skip fsync around the install rename
        #[arg(long)]
        no_sync: bool,
    },

    /// Look up a key
    Get {
        /// Database file
        db: PathBuf,

        /// The key to look up
        key: String,

        /// Print every value stored under the key
        #[arg(short, long)]
        all: bool,

        /// Read with positioned reads instead of a memory map
        #[arg(long)]
        no_mmap: bool,
    },

    /// Print every record as `key<sep>value`
    Dump {
        /// Database file
        db: PathBuf,

        /// Separator to print between key and value
        #[arg(short, long, default_value = "=")]
        sep: String,
    },
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match run(args.command) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> scdb::Result<ExitCode> {
    match command {
        Commands::Make {
            input,
            sep,
            output,
            no_sync,
        } => {
            let Some(&sep) = sep.as_bytes().first() else {
                return Err(scdb::ScdbError::Config("separator must not be empty".into()));
            };
            let config = Config::builder().sync_on_install(!no_sync).build()?;
            let count = make_from_file(&input, sep, &output, &config)?;
            println!("{}", count);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Get {
            db,
            key,
            all,
            no_mmap,
        } => {
            let config = Config::builder().use_mmap(!no_mmap).build()?;
            let reader = DatabaseReader::open(&db, &config)?;
            let mut out = BufWriter::new(io::stdout().lock());

            let mut found = false;
            for value in reader.find_all(key.as_bytes()) {
                let value = value?;
                out.write_all(&value)?;
                out.write_all(b"\n")?;
                found = true;
                if !all {
                    break;
                }
            }
            out.flush()?;

            if found {
                Ok(ExitCode::SUCCESS)
            } else {
                tracing::info!("Key not found: {}", key);
                Ok(ExitCode::from(100))
            }
        }

        Commands::Dump { db, sep } => {
            let reader = DatabaseReader::open(&db, &Config::default())?;
            let mut out = BufWriter::new(io::stdout().lock());

            for record in reader.records()? {
                let (key, data) = record?;
                out.write_all(&key)?;
                out.write_all(sep.as_bytes())?;
                out.write_all(&data)?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
