//! # Herd Intake CLI (`intake`)
//!
//! The `intake` binary drives the intake workflow from the command line:
//! database initialization, one-off document ingestion, profile creation
//! from a form payload plus documents, and profile management.
//!
//! ## Usage
//!
//! ```bash
//! intake --config ./config/intake.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `intake init` | Create the SQLite database and key-value table |
//! | `intake ingest --category <cat> <files..>` | Extract files and print the results |
//! | `intake create --form <json> [--bank F]..` | Generate and store a new profile |
//! | `intake list` | List stored profiles, newest first |
//! | `intake get <id>` | Print a stored profile as JSON |
//! | `intake delete <id>` | Delete a stored profile |
//! | `intake report <id>` | Render a plain-text report |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `warn`).

mod config;
mod db;
mod extract;
mod ingest;
mod kv_sqlite;
mod migrate;
mod profiles;
mod report;
mod session;
#[allow(dead_code)]
mod traits;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use herd_intake_core::models::Category;

/// Herd Intake CLI: livestock intake profiles from forms and documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Every setting has a default, so an empty file is valid.
#[derive(Parser)]
#[command(
    name = "intake",
    about = "Herd Intake: livestock intake profiles from forms and documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/intake.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite file and the key-value table. Idempotent.
    Init,

    /// Run files through the extraction pipeline without storing anything.
    ///
    /// Prints one JSON result per file, in the order given.
    Ingest {
        /// Category the files belong to: id, bank, herd, or health.
        #[arg(long)]
        category: Category,

        /// Files to extract.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Generate and store a profile from a form payload and documents.
    Create {
        /// JSON object with the form answers (farmerName, species, ...).
        #[arg(long)]
        form: PathBuf,

        /// Identity documents.
        #[arg(long = "id")]
        id_docs: Vec<PathBuf>,

        /// Bank statements and ledgers.
        #[arg(long)]
        bank: Vec<PathBuf>,

        /// Herd registers.
        #[arg(long)]
        herd: Vec<PathBuf>,

        /// Veterinary and health records.
        #[arg(long)]
        health: Vec<PathBuf>,

        /// Seed for the mock scorer; overrides `scoring.seed`.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List stored profiles, newest first.
    List,

    /// Print a stored profile as JSON.
    Get {
        /// Profile ID (CER-...).
        id: String,
    },

    /// Delete a stored profile. Unknown IDs are not an error.
    Delete {
        /// Profile ID (CER-...).
        id: String,
    },

    /// Render a plain-text report for a stored profile.
    Report {
        /// Profile ID (CER-...).
        id: String,

        /// Write the report here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { category, files } => {
            ingest::run_ingest(&cfg, category, &files).await?;
        }
        Commands::Create {
            form,
            id_docs,
            bank,
            herd,
            health,
            seed,
        } => {
            let uploads: Vec<(Category, PathBuf)> = [
                (Category::Id, id_docs),
                (Category::Bank, bank),
                (Category::Herd, herd),
                (Category::Health, health),
            ]
            .into_iter()
            .flat_map(|(category, paths)| paths.into_iter().map(move |p| (category, p)))
            .collect();
            session::run_create(&cfg, &form, &uploads, seed).await?;
        }
        Commands::List => {
            profiles::run_list(&cfg).await?;
        }
        Commands::Get { id } => {
            profiles::run_get(&cfg, &id).await?;
        }
        Commands::Delete { id } => {
            profiles::run_delete(&cfg, &id).await?;
        }
        Commands::Report { id, output } => {
            report::run_report(&cfg, &id, output.as_deref()).await?;
        }
    }

    Ok(())
}
