//! # DORA Metrics Engine Main Entry Point

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use tokio_util::sync::CancellationToken;

use dorametrics::config::ConfigLoader;
use dorametrics::db::init_pool;
use dorametrics::logging::init_subscriber;
use dorametrics::scheduler::{BatchScheduler, SourceSet};

#[derive(Parser)]
#[command(name = "dorametrics", about = "DORA metrics correlation and aggregation engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending database migrations and exit.
    Migrate,
    /// Run the scheduled batch passes until interrupted.
    Serve,
    /// Run a single batch pass and exit.
    RunOnce,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new().load().context("Failed to load configuration")?;
    init_subscriber(&config);

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted) = config.redacted_json() {
        tracing::debug!(config = %redacted, "Effective configuration");
    }

    let db = init_pool(&config).await?;

    match cli.command {
        Command::Migrate => {
            Migrator::up(&db, None).await.context("Migration failed")?;
            tracing::info!("Migrations applied");
        }
        Command::Serve => {
            Migrator::up(&db, None).await.context("Migration failed")?;

            // Collaborator sources are wired by the deployment that embeds
            // this binary; without them the scheduler still attributes and
            // aggregates whatever the out-of-process collectors mirror.
            let scheduler = BatchScheduler::new(
                Arc::new(config),
                Arc::new(db),
                SourceSet::default(),
            );

            let shutdown = CancellationToken::new();
            let signal_token = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    signal_token.cancel();
                }
            });

            scheduler.run(shutdown).await?;
        }
        Command::RunOnce => {
            let scheduler = BatchScheduler::new(
                Arc::new(config),
                Arc::new(db),
                SourceSet::default(),
            );
            scheduler.run_pass().await?;
        }
    }

    Ok(())
}
