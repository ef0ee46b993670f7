use chrono::Duration;
use clap::Args;

use crate::views;

use super::PostgresConfig;
use super::SearchConfig;

#[derive(Args, Debug)]
#[command(about, long_about = "Launch the server")]
pub struct RunserverArgs {
    #[arg(long, env = "DOSSIER_PORT", default_value_t = 8080)]
    port: u16,
    #[arg(long, env = "DOSSIER_ADDRESS", default_value_t = String::from("0.0.0.0"))]
    address: String,
    /// The timeout to use when performing the healthcheck, in milliseconds
    #[clap(long, env = "DOSSIER_HEALTH_CHECK_TIMEOUT_MS", default_value_t = 1000)]
    health_check_timeout_ms: u64,
}

/// Create and run the server
pub async fn runserver(
    RunserverArgs {
        port,
        address,
        health_check_timeout_ms,
    }: RunserverArgs,
    postgres: PostgresConfig,
    search: SearchConfig,
    app_version: Option<String>,
) -> anyhow::Result<()> {
    let config = views::ServerConfig {
        port,
        address,
        health_check_timeout: Duration::milliseconds(health_check_timeout_ms as i64),
        postgres_config: postgres.into(),
        search_config: search.into(),
        app_version,
    };

    let server = views::Server::new(config).await?;
    Ok(server.start().await?)
}
