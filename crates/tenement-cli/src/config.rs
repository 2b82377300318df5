use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tenement_core::Jurisdiction;

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "tenement-sync")]
#[command(
    author,
    version,
    about = "Synchronise Australian mining tenements into PostgreSQL"
)]
#[command(after_help = "Examples:
  tenement-sync sync WA
  tenement-sync sync-all
  tenement-sync status
  tenement-sync derive-id WA \"M 15/1789\"

Jurisdictions: WA (live ArcGIS feed), NSW, VIC, NT, QLD, TAS (generated)")]
pub struct Config {
    /// PostgreSQL database connection URL (required by sync and status)
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Path to jurisdictions.toml configuration file
    #[arg(short, long, env = "JURISDICTIONS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sync a single jurisdiction
    #[command(after_help = "Example: tenement-sync sync TAS")]
    Sync {
        /// Jurisdiction code (case-insensitive)
        jurisdiction: Jurisdiction,
    },
    /// Sync every enabled jurisdiction in order
    SyncAll,
    /// Show stored tenement counts and last sync time per jurisdiction
    Status,
    /// Print the stable UUID for a tenement
    #[command(after_help = "Example: tenement-sync derive-id WA \"M 15/1789\"")]
    DeriveId {
        /// Jurisdiction code (case-insensitive)
        jurisdiction: Jurisdiction,
        /// Tenement number as published by the jurisdiction
        number: String,
    },
}
