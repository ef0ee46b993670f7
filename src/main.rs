mod client;
mod error;
mod views;

use std::sync::Arc;

use clap::Parser;
use opentelemetry_otlp::WithExportConfig as _;

use client::Client;
use client::Color;
use client::Commands;
use client::TelemetryKind;
use client::healthcheck::healthcheck_cmd;
use client::runserver::runserver;
use client::search_commands;
use client::search_commands::SearchCommands;
use common::tracing::Stream;
use common::tracing::TracingConfig;
use common::tracing::create_tracing_subscriber;
use database::DbConnectionPoolV2;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(()) => (),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(2);
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let Client {
        postgres_config,
        search_config,
        telemetry_config,
        color,
        app_version,
        command,
    } = Client::parse();

    match color {
        Color::Never => colored::control::set_override(false),
        Color::Always => colored::control::set_override(true),
        Color::Auto => {}
    }

    let telemetry = match telemetry_config.telemetry_kind {
        TelemetryKind::None => None,
        TelemetryKind::Opentelemetry => Some(telemetry_config.clone().into()),
    };
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(telemetry_config.telemetry_endpoint.to_string())
        .build()?;
    let subscriber = create_tracing_subscriber(
        TracingConfig {
            stream: Stream::Stderr,
            telemetry,
            directives: vec![],
        },
        tracing_subscriber::filter::LevelFilter::INFO,
        exporter,
    );
    tracing::subscriber::set_global_default(subscriber)?;

    match command {
        Commands::Runserver(args) => {
            runserver(args, postgres_config, search_config, app_version).await
        }
        Commands::Openapi => {
            client::print_openapi();
            Ok(())
        }
        Commands::Search(command) => {
            let search_client = Arc::new(search_config.into_client()?);
            match command {
                SearchCommands::CreateIndices => {
                    search_commands::create_indices(search_client).await
                }
                SearchCommands::Reindex(args) => {
                    let db_pool = Arc::new(
                        DbConnectionPoolV2::try_initialize(
                            postgres_config.database_url,
                            postgres_config.database_pool_size,
                        )
                        .await?,
                    );
                    search_commands::reindex(args, db_pool, search_client).await
                }
            }
        }
        Commands::Healthcheck => {
            let db_pool = Arc::new(
                DbConnectionPoolV2::try_initialize(
                    postgres_config.database_url,
                    postgres_config.database_pool_size,
                )
                .await?,
            );
            healthcheck_cmd(db_pool, search_config).await
        }
    }
}
