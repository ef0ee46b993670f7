pub mod healthcheck;
mod postgres_config;
pub mod runserver;
mod search_config;
pub mod search_commands;
mod telemetry_config;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
pub use postgres_config::PostgresConfig;
use runserver::RunserverArgs;
pub use search_config::SearchConfig;
use search_commands::SearchCommands;
pub use telemetry_config::TelemetryConfig;
pub use telemetry_config::TelemetryKind;

use crate::views::OpenApiRoot;

#[derive(Parser, Debug)]
#[command(author, version)]
pub struct Client {
    #[command(flatten)]
    pub postgres_config: PostgresConfig,
    #[command(flatten)]
    pub search_config: SearchConfig,
    #[command(flatten)]
    pub telemetry_config: TelemetryConfig,
    #[arg(long, env, value_enum, default_value_t = Color::Auto)]
    pub color: Color,
    /// Dossier version (reported by /version, always provide in production)
    #[clap(long, env = "DOSSIER_GIT_DESCRIBE")]
    pub app_version: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Debug, Default, Clone)]
pub enum Color {
    Never,
    Always,
    #[default]
    Auto,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Runserver(RunserverArgs),
    #[command(about, long_about = "Prints the OpenApi of the service")]
    Openapi,
    #[command(subcommand, about, long_about = "Search index related commands")]
    Search(SearchCommands),
    #[command(about, long_about = "Healthcheck")]
    Healthcheck,
}

/// Prints the OpenApi to stdout
pub fn print_openapi() {
    let openapi = OpenApiRoot::build_openapi();
    print!("{}", serde_yaml::to_string(&openapi).unwrap());
}
