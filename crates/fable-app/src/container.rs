//! # App Container
//!
//! Wires configuration into live dependencies. The HTTP client is built
//! HERE and handed to the API client; nothing in the codebase reaches for
//! a process-wide HTTP singleton, so tests and multi-account setups can
//! construct isolated containers.

use std::time::Duration;

use fable_db::{Database, DbConfig};
use fable_remote::{ApiClient, ApiConfig};
use fable_sync::RefreshPolicy;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::session::Session;

/// All wired dependencies for the Fable client.
///
/// Cloning is cheap; clones share the pool, the change bus, and the session.
#[derive(Clone)]
pub struct AppContainer {
    pub db: Database,
    pub api: ApiClient,
    pub session: Session,
    pub policy: RefreshPolicy,
}

impl AppContainer {
    /// Builds the full dependency graph from a config.
    pub async fn init(config: &AppConfig) -> AppResult<Self> {
        info!(base_url = %config.api.base_url, "Initializing app container");

        let base_url = url::Url::parse(&config.api.base_url)
            .map_err(|e| AppError::InvalidConfig(format!("api.base_url: {e}")))?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::InvalidConfig(format!("http client: {e}")))?;

        let api = ApiClient::new(
            http,
            ApiConfig::new(base_url)
                .request_timeout(Duration::from_secs(config.api.request_timeout_secs)),
        );

        let db = Database::new(DbConfig::new(config.database_path()?)).await?;

        let policy = RefreshPolicy::with_max_age(chrono::Duration::minutes(
            config.cache.max_age_minutes,
        ));

        Ok(AppContainer {
            db,
            api,
            session: Session::new(),
            policy,
        })
    }

    /// A container over an in-memory database, for tests.
    #[cfg(test)]
    pub(crate) async fn for_tests(api: ApiClient) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppContainer {
            db,
            api,
            session: Session::new(),
            policy: RefreshPolicy::default(),
        }
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter. Call once at startup;
/// calling again is a no-op.
pub fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.filter.clone()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
