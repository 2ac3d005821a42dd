//! Configuration loading and representation.
//!
//! Read from the process environment:
//!
//! - `GUESTBOOK_STORAGE`: `memory` (default) or `postgres`
//! - `GUESTBOOK_DATABASE_URL`: required when storage is `postgres`
//! - `GUESTBOOK_DB_MAX_CONNECTIONS`: pool size, default 5

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::repository::{
    GuestbookRepository, InMemoryGuestbookRepository, PostgresGuestbookRepository,
    RepositoryError,
};

pub const STORAGE_VAR: &str = "GUESTBOOK_STORAGE";
pub const DATABASE_URL_VAR: &str = "GUESTBOOK_DATABASE_URL";
pub const MAX_CONNECTIONS_VAR: &str = "GUESTBOOK_DB_MAX_CONNECTIONS";

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown storage backend `{0}` (expected `memory` or `postgres`)")]
    UnknownBackend(String),
    #[error("{0} must be set when GUESTBOOK_STORAGE=postgres")]
    MissingDatabaseUrl(&'static str),
    #[error("invalid value for {var}: `{value}`")]
    InvalidValue { var: &'static str, value: String },
}

/// Where guestbook entries are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres { database_url: String },
}

/// Infrastructure configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfraConfig {
    pub storage: StorageBackend,
    pub max_connections: u32,
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Memory,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl InfraConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let storage = match read(STORAGE_VAR).map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("memory") => StorageBackend::Memory,
            Some("postgres") => {
                let database_url = read(DATABASE_URL_VAR)
                    .ok_or(ConfigError::MissingDatabaseUrl(DATABASE_URL_VAR))?;
                StorageBackend::Postgres { database_url }
            }
            Some(other) => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let max_connections = match read(MAX_CONNECTIONS_VAR) {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: MAX_CONNECTIONS_VAR,
                        value: raw,
                    });
                }
            },
        };

        Ok(Self {
            storage,
            max_connections,
        })
    }

    pub fn with_storage(mut self, storage: StorageBackend) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// Build the repository selected by `config`.
///
/// For Postgres this opens the pool and creates the table if needed.
pub async fn connect_repository(
    config: &InfraConfig,
) -> Result<Arc<dyn GuestbookRepository>, RepositoryError> {
    match &config.storage {
        StorageBackend::Memory => {
            info!("using in-memory guestbook storage");
            Ok(Arc::new(InMemoryGuestbookRepository::new()))
        }
        StorageBackend::Postgres { database_url } => {
            info!(max_connections = config.max_connections, "using postgres guestbook storage");
            let repo =
                PostgresGuestbookRepository::connect(database_url, config.max_connections).await?;
            repo.ensure_schema().await?;
            Ok(Arc::new(repo))
        }
    }
}
