mod contents;
mod documents;
mod openapi;
mod people;
#[cfg(test)]
mod test_app;

pub use openapi::OpenApiRoot;

use std::env;
use std::sync::Arc;

use axum::Router;
use axum::ServiceExt;
use axum::extract::DefaultBodyLimit;
use axum::extract::FromRef;
use axum::extract::Json;
use axum::extract::State;
use axum::routing::get;
use chrono::Duration;
use common::Version;
use database::DbConnectionPoolV2;
use database::db_connection_pool::ping_database;
use futures::TryFutureExt;
use search::OpensearchClient;
use search::SearchClient;
use thiserror::Error;
use tokio::time::timeout;
use tower::Layer as _;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::normalize_path::NormalizePath;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use tracing::info;
use url::Url;

use crate::error::DossierError;
use crate::error::Result;

fn service_router() -> Router<AppState> {
    // One sub-router per entity, all mounted under /api like the original
    // surface. Paths ordered by number of segments, then alphabetically.
    let api = Router::new()
        .route(
            "/people",
            get(people::list).post(people::create).put(people::update),
        )
        .route("/people/{id}", get(people::get).delete(people::delete))
        .route("/_search/people", get(people::search))
        .route(
            "/documents",
            get(documents::list)
                .post(documents::create)
                .put(documents::update),
        )
        .route(
            "/documents/{id}",
            get(documents::get).delete(documents::delete),
        )
        .route("/documents/{id}/$content", get(documents::content))
        .route("/_search/documents", get(documents::search))
        .route(
            "/contents",
            get(contents::list)
                .post(contents::create)
                .put(contents::update),
        )
        .route(
            "/contents/{id}",
            get(contents::get).delete(contents::delete),
        )
        .route("/_search/contents", get(contents::search));

    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .nest("/api", api)
}

#[derive(Debug, Error)]
pub enum AppHealthError {
    #[error("Timeout error")]
    Timeout,
    #[error(transparent)]
    Database(#[from] database::db_connection_pool::PingError),
    #[error(transparent)]
    Search(#[from] search::Error),
}

impl DossierError for AppHealthError {
    fn get_status(&self) -> axum::http::StatusCode {
        axum::http::StatusCode::INTERNAL_SERVER_ERROR
    }

    fn get_type(&self) -> &str {
        match self {
            Self::Timeout => "dossier:health:Timeout",
            Self::Database(_) => "dossier:health:Database",
            Self::Search(_) => "dossier:health:Search",
        }
    }
}

#[utoipa::path(
    get, path = "/health",
    responses(
        (status = 200, description = "Check if dossier is running correctly", body = String)
    )
)]
async fn health(
    State(AppState {
        db_pool,
        search_client,
        health_check_timeout,
        ..
    }): State<AppState>,
) -> Result<&'static str> {
    timeout(
        health_check_timeout
            .to_std()
            .expect("timeout should be valid at this point"),
        check_health(db_pool, search_client),
    )
    .await
    .map_err(|_| AppHealthError::Timeout)??;
    Ok("ok")
}

pub async fn check_health(
    db_pool: Arc<DbConnectionPoolV2>,
    search_client: Arc<SearchClient>,
) -> Result<()> {
    let mut db_connection = db_pool.clone().get().await?;
    tokio::try_join!(
        ping_database(&mut db_connection).map_err(AppHealthError::Database),
        search_client.health().map_err(AppHealthError::Search),
    )?;
    Ok(())
}

#[utoipa::path(
    get, path = "/version",
    responses(
        (status = 200, description = "Return the service version", body = Version),
    ),
)]
pub(in crate::views) async fn version(
    State(AppState { config, .. }): State<AppState>,
) -> Json<Version> {
    Json(Version {
        git_describe: config.app_version.clone(),
    })
}

#[derive(Clone)]
pub struct PostgresConfig {
    pub database_url: Url,
    pub pool_size: usize,
}

#[derive(Clone)]
pub struct SearchConfig {
    pub url: Url,
    pub username: String,
    pub password: String,
}

pub struct ServerConfig {
    pub port: u16,
    pub address: String,
    pub health_check_timeout: Duration,
    pub postgres_config: PostgresConfig,
    pub search_config: SearchConfig,
    pub app_version: Option<String>,
}

pub struct Server {
    app_state: AppState,
    router: NormalizePath<Router>,
}

/// The state of the whole dossier service, available to all handlers
///
/// If only the database is needed, use `State<Arc<DbConnectionPoolV2>>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub db_pool: Arc<DbConnectionPoolV2>,
    pub search_client: Arc<SearchClient>,
    pub health_check_timeout: Duration,
}

impl FromRef<AppState> for Arc<DbConnectionPoolV2> {
    fn from_ref(input: &AppState) -> Self {
        input.db_pool.clone()
    }
}

impl FromRef<AppState> for Arc<SearchClient> {
    fn from_ref(input: &AppState) -> Self {
        input.search_client.clone()
    }
}

impl AppState {
    #[tracing::instrument(skip_all, level = "info", err, name = "AppState initialization")]
    async fn init(config: ServerConfig) -> anyhow::Result<Self> {
        #[tracing::instrument(skip_all, level = "info", err, name = "PostgreSQL connection")]
        async fn connect_db(
            PostgresConfig {
                database_url,
                pool_size,
            }: PostgresConfig,
        ) -> anyhow::Result<Arc<DbConnectionPoolV2>> {
            let pool = DbConnectionPoolV2::try_initialize(database_url, pool_size).await?;
            Ok(Arc::new(pool))
        }
        let db_pool_fut = tokio::spawn(connect_db(config.postgres_config.clone()).in_current_span());

        #[tracing::instrument(skip_all, level = "info", err, name = "Search cluster connection")]
        async fn connect_search(
            SearchConfig {
                url,
                username,
                password,
            }: SearchConfig,
        ) -> anyhow::Result<Arc<SearchClient>> {
            let client = SearchClient::Opensearch(OpensearchClient::new(url, username, password)?);
            for index in search::INDICES {
                client.ensure_index_exists(index).await?;
            }
            Ok(Arc::new(client))
        }
        let search_client_fut =
            tokio::spawn(connect_search(config.search_config.clone()).in_current_span());

        let (db_pool, search_client) = tokio::try_join!(
            async { db_pool_fut.await? },
            async { search_client_fut.await? }
        )?;

        Ok(Self {
            db_pool,
            search_client,
            health_check_timeout: config.health_check_timeout,
            config: Arc::new(config),
        })
    }
}

impl Server {
    #[tracing::instrument(skip_all, err, level = "info", name = "server initialization")]
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        info!("Building server...");
        let app_state = AppState::init(config).await?;

        // Uploaded payloads travel base64-encoded in JSON bodies
        let request_payload_limit = RequestBodyLimitLayer::new(100 * 1024 * 1024); // 100MiB

        // Build CORS layer
        let cors = {
            let allowed_origin = env::var("DOSSIER_ALLOWED_ORIGIN").ok();
            match allowed_origin {
                Some(origin) => CorsLayer::new()
                    .allow_methods(Any)
                    .allow_headers(Any)
                    .allow_origin(
                        origin
                            .parse::<axum::http::header::HeaderValue>()
                            .expect("invalid allowed origin"),
                    ),
                None => CorsLayer::new()
                    .allow_methods(Any)
                    .allow_headers(Any)
                    .allow_origin(Any),
            }
        };

        // Configure the axum router
        let router: Router<()> = service_router()
            .layer(DefaultBodyLimit::disable())
            .layer(request_payload_limit)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(app_state.clone());
        let normalizing_router = NormalizePathLayer::trim_trailing_slash().layer(router);

        Ok(Self {
            app_state,
            router: normalizing_router,
        })
    }

    pub async fn start(self) -> std::io::Result<()> {
        let Self { app_state, router } = self;
        let ServerConfig { address, port, .. } = app_state.config.as_ref();

        info!("Running server...");
        let service = ServiceExt::<axum::extract::Request>::into_make_service(router);
        let listener = tokio::net::TcpListener::bind((address.as_str(), *port)).await?;
        axum::serve(listener, service).await
    }
}
