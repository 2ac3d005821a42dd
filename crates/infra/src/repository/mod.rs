//! Guestbook entry persistence boundary.
//!
//! The repository is the only place where entries receive their identifier:
//! `save` takes a validated, unpersisted entry and hands it back with an
//! [`EntryId`] attached.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryGuestbookRepository;
pub use postgres::PostgresGuestbookRepository;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use guestbook_core::{DomainError, EntryId};
use guestbook_entries::GuestbookEntry;

/// Repository error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("guestbook entry not found: {0}")]
    NotFound(EntryId),
    #[error("guestbook entry already persisted with id {0}")]
    AlreadyPersisted(EntryId),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Storage for guestbook entries.
#[async_trait]
pub trait GuestbookRepository: Send + Sync {
    /// Store a new entry and return it with its freshly assigned id.
    ///
    /// Entries that already carry an id are rejected with
    /// [`RepositoryError::AlreadyPersisted`].
    async fn save(&self, entry: GuestbookEntry) -> Result<GuestbookEntry, RepositoryError>;

    async fn find_by_id(&self, id: EntryId) -> Result<Option<GuestbookEntry>, RepositoryError>;

    /// All entries, oldest first (ties broken by id).
    async fn find_all(&self) -> Result<Vec<GuestbookEntry>, RepositoryError>;

    async fn delete(&self, id: EntryId) -> Result<(), RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;
}

#[async_trait]
impl<R> GuestbookRepository for Arc<R>
where
    R: GuestbookRepository + ?Sized,
{
    async fn save(&self, entry: GuestbookEntry) -> Result<GuestbookEntry, RepositoryError> {
        (**self).save(entry).await
    }

    async fn find_by_id(&self, id: EntryId) -> Result<Option<GuestbookEntry>, RepositoryError> {
        (**self).find_by_id(id).await
    }

    async fn find_all(&self) -> Result<Vec<GuestbookEntry>, RepositoryError> {
        (**self).find_all().await
    }

    async fn delete(&self, id: EntryId) -> Result<(), RepositoryError> {
        (**self).delete(id).await
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        (**self).count().await
    }
}

pub(crate) fn ensure_unpersisted(entry: &GuestbookEntry) -> Result<(), RepositoryError> {
    match entry.id() {
        Some(id) => Err(RepositoryError::AlreadyPersisted(id)),
        None => Ok(()),
    }
}
