//! Infrastructure layer: persistence adapters and configuration.

pub mod config;
pub mod repository;

pub use config::{ConfigError, InfraConfig, StorageBackend};
pub use repository::{
    GuestbookRepository, InMemoryGuestbookRepository, PostgresGuestbookRepository,
    RepositoryError,
};
