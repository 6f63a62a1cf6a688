mod cli;

use crate::cli::{Command, StorageBackendArg, CLI};
use anyhow::Context;
use burrow_generator::RandomGenerator;
use burrow_shortener::{RelationService, ServiceSettings, Shortener, ShortenerError};
use burrow_storage::{InMemoryRepository, PostgresRepository, RelationStore};
use clap::Parser;
use std::process::ExitCode;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = CLI::parse();
    burrow_telemetry::init(config.log_format.into())?;

    info!(
        storage_backend = %config.storage,
        base_url = %config.base_url,
        max_attempts = config.max_attempts,
        "starting burrow"
    );

    let settings = ServiceSettings::builder()
        .base_url(config.base_url)
        .max_attempts(config.max_attempts)
        .build();

    match config.storage {
        StorageBackendArg::InMemory => {
            run(InMemoryRepository::new(), settings, config.command).await
        }
        StorageBackendArg::Postgres => {
            let dsn = config
                .postgres_dsn
                .context("postgres dsn is required when storage backend is postgres")?;
            let repository = PostgresRepository::connect(&dsn)
                .await
                .context("failed to connect to postgres")?;
            run(repository, settings, config.command).await
        }
    }
}

async fn run<S: RelationStore>(
    store: S,
    settings: ServiceSettings,
    command: Command,
) -> anyhow::Result<ExitCode> {
    let service = RelationService::with_settings(store, RandomGenerator::new(), settings);

    let outcome = match command {
        Command::Shorten { urls } => {
            for url in urls {
                let relation = service.create_short_link(&url).await?;
                println!("{} -> {}", relation.long_url, relation.short_url);
            }
            Ok(())
        }
        Command::Resolve { code } => service
            .resolve_short(&code)
            .await
            .map(|relation| println!("{}", relation.long_url)),
        Command::LookupLong { url } => service
            .resolve_long(&url)
            .await
            .map(|relation| println!("{}", relation.short_url)),
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err @ ShortenerError::NotFound(_)) => {
            eprintln!("{err}");
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}
