use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tenement_cli::{Command, Config};
use tenement_client::DataSourceFactory;
use tenement_core::{
    FullSyncSummary, HttpConfig, Jurisdiction, ProgressStore, SyncConfig, SyncService,
    SyncSummary, identity, load_jurisdictions_config,
};
use tenement_db::TenementRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    let config = Config::parse();

    if let Command::DeriveId {
        jurisdiction,
        number,
    } = &config.command
    {
        println!("{}", identity::derive(*jurisdiction, number));
        return Ok(());
    }

    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| {
            anyhow::anyhow!("DATABASE_URL is required (set it or pass --database-url)")
        })?;

    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;
    let repo = TenementRepository::new(pool);

    let jurisdictions = load_jurisdictions_config(config.config.clone())
        .context("Failed to load jurisdictions config")?;
    let factory = DataSourceFactory::with_config(jurisdictions.clone(), HttpConfig::from_env());
    let service = SyncService::with_config(
        repo.clone(),
        factory,
        ProgressStore::new(),
        SyncConfig::from_env(),
    )
    .with_jurisdictions(jurisdictions);

    let cancel_token = CancellationToken::new();
    spawn_ctrl_c_handler(cancel_token.clone());

    match config.command {
        Command::Sync { jurisdiction } => {
            let summary = service
                .sync_jurisdiction_cancellable(jurisdiction, cancel_token)
                .await;
            print_sync_summary(&summary);
            if !summary.success {
                anyhow::bail!("{}", summary.message);
            }
        }
        Command::SyncAll => {
            let summary = service.sync_all_cancellable(cancel_token).await;
            print_full_sync_summary(&summary);
            if !summary.success {
                anyhow::bail!("{}", summary.message);
            }
        }
        Command::Status => {
            show_status(&repo).await?;
        }
        Command::DeriveId { .. } => {}
    }

    Ok(())
}

/// Cancels the token on the first Ctrl+C so runs stop between batches.
fn spawn_ctrl_c_handler(cancel_token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Ctrl+C received, cancelling after the current batch...");
                cancel_token.cancel();
            }
            Err(e) => error!(error = %e, "Failed to install Ctrl+C handler"),
        }
    });
}

fn print_sync_summary(summary: &SyncSummary) {
    eprintln!();
    eprintln!("═══════════════════════════════════════════════════════");
    eprintln!("Sync {}: {}", summary.status, summary.jurisdiction.display_name());
    eprintln!("═══════════════════════════════════════════════════════");
    eprintln!("  Source records:      {}", summary.total_records);
    eprintln!("  Imported:            {}", summary.imported);
    eprintln!("  Errors:              {}", summary.errors.len());
    for err in &summary.errors {
        eprintln!("    - {}", err);
    }
    eprintln!("  Started:             {}", summary.timestamp);
    eprintln!("───────────────────────────────────────────────────────");
    eprintln!("  {}", summary.message);
    eprintln!("═══════════════════════════════════════════════════════");
}

fn print_full_sync_summary(summary: &FullSyncSummary) {
    eprintln!();
    eprintln!("═══════════════════════════════════════════════════════");
    eprintln!("FULL SYNC {}", if summary.cancelled { "CANCELLED" } else { "COMPLETE" });
    eprintln!("═══════════════════════════════════════════════════════");
    for result in &summary.results {
        eprintln!(
            "  {:<4} {:<10} {:>7} imported  {:>3} errors",
            result.jurisdiction.code(),
            result.status,
            result.imported,
            result.errors.len()
        );
    }
    eprintln!("───────────────────────────────────────────────────────");
    eprintln!(
        "  Successful:          {}/{}",
        summary.successful_syncs, summary.total_jurisdictions
    );
    eprintln!("  Total imported:      {}", summary.total_imported);
    eprintln!("═══════════════════════════════════════════════════════");
}

async fn show_status(repo: &TenementRepository) -> anyhow::Result<()> {
    println!("\nStored tenements\n");
    for jurisdiction in Jurisdiction::ALL {
        let count = repo.count(Some(jurisdiction)).await?;
        let last_sync = repo
            .last_sync_at(jurisdiction)
            .await?
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "  {:<4} {:<20} {:>8}   last sync: {}",
            jurisdiction.code(),
            jurisdiction.display_name(),
            count,
            last_sync
        );
    }
    println!("\n  Total: {}\n", repo.count(None).await?);
    Ok(())
}
