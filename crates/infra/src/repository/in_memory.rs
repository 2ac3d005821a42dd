use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tracing::{info, instrument};

use guestbook_core::EntryId;
use guestbook_entries::{GuestbookEntry, GuestbookEntryRecord};

use super::{GuestbookRepository, RepositoryError, ensure_unpersisted};

/// In-memory guestbook repository.
///
/// Intended for tests/dev. Ids start at 1 and are never reused, even after
/// deletes.
#[derive(Debug)]
pub struct InMemoryGuestbookRepository {
    rows: RwLock<BTreeMap<EntryId, GuestbookEntryRecord>>,
    next_id: AtomicI64,
}

impl InMemoryGuestbookRepository {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryGuestbookRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::Storage("lock poisoned".to_string())
}

#[async_trait]
impl GuestbookRepository for InMemoryGuestbookRepository {
    #[instrument(skip(self, entry), err)]
    async fn save(&self, entry: GuestbookEntry) -> Result<GuestbookEntry, RepositoryError> {
        ensure_unpersisted(&entry)?;

        let mut rows = self.rows.write().map_err(|_| poisoned())?;

        // Allocate under the write lock so ids follow insertion order.
        let id = EntryId::new(self.next_id.fetch_add(1, Ordering::SeqCst))?;
        let stored = entry.assign_id(id)?;
        rows.insert(id, GuestbookEntryRecord::from_entry(&stored)?);

        info!(entry_id = %id, "guestbook entry saved");
        Ok(stored)
    }

    async fn find_by_id(&self, id: EntryId) -> Result<Option<GuestbookEntry>, RepositoryError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        match rows.get(&id) {
            Some(record) => Ok(Some(record.clone().into_entry()?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<GuestbookEntry>, RepositoryError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;

        let mut entries = rows
            .values()
            .cloned()
            .map(GuestbookEntryRecord::into_entry)
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|e| (e.date(), e.id()));

        Ok(entries)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: EntryId) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        if rows.remove(&id).is_none() {
            return Err(RepositoryError::NotFound(id));
        }

        info!("guestbook entry deleted");
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use guestbook_core::FixedClock;
    use guestbook_entries::DefaultEmailValidator;

    fn entry(name: &str) -> GuestbookEntry {
        GuestbookEntry::new(name, "ollie@ollie.de", "May the 4th be with you!").unwrap()
    }

    fn entry_at(name: &str, minutes: i64) -> GuestbookEntry {
        let at = Utc.with_ymd_and_hms(2019, 5, 4, 12, 0, 0).unwrap() + Duration::minutes(minutes);
        GuestbookEntry::new_with(
            name,
            "ollie@ollie.de",
            "Hi",
            &DefaultEmailValidator,
            &FixedClock::new(at),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_assigns_distinct_increasing_ids() {
        let repo = InMemoryGuestbookRepository::new();

        let first = repo.save(entry("Ollie")).await.unwrap();
        let second = repo.save(entry("Paul")).await.unwrap();

        assert_eq!(first.id(), Some(EntryId::new(1).unwrap()));
        assert_eq!(second.id(), Some(EntryId::new(2).unwrap()));
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn save_keeps_content_and_date() {
        let repo = InMemoryGuestbookRepository::new();
        let original = entry("Ollie");

        let saved = repo.save(original.clone()).await.unwrap();

        assert_eq!(saved.name(), original.name());
        assert_eq!(saved.email(), original.email());
        assert_eq!(saved.text(), original.text());
        assert_eq!(saved.date(), original.date());

        let loaded = repo.find_by_id(saved.id().unwrap()).await.unwrap();
        assert_eq!(loaded, Some(saved));
    }

    #[tokio::test]
    async fn refuses_to_save_persisted_entry_twice() {
        let repo = InMemoryGuestbookRepository::new();
        let saved = repo.save(entry("Ollie")).await.unwrap();
        let id = saved.id().unwrap();

        let err = repo.save(saved).await.unwrap_err();
        assert_eq!(err, RepositoryError::AlreadyPersisted(id));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn find_all_orders_by_creation_date() {
        let repo = InMemoryGuestbookRepository::new();
        repo.save(entry_at("late", 30)).await.unwrap();
        repo.save(entry_at("early", 0)).await.unwrap();
        repo.save(entry_at("middle", 10)).await.unwrap();

        let names: Vec<_> = repo
            .find_all()
            .await
            .unwrap()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, ["early", "middle", "late"]);
    }

    #[tokio::test]
    async fn delete_removes_entry_and_never_reuses_ids() {
        let repo = InMemoryGuestbookRepository::new();
        let saved = repo.save(entry("Ollie")).await.unwrap();
        let id = saved.id().unwrap();

        repo.delete(id).await.unwrap();
        assert_eq!(repo.find_by_id(id).await.unwrap(), None);
        assert_eq!(repo.delete(id).await, Err(RepositoryError::NotFound(id)));

        let next = repo.save(entry("Paul")).await.unwrap();
        assert_ne!(next.id(), Some(id));
    }

    #[tokio::test]
    async fn reads_back_entries_built_with_a_custom_validator() {
        let repo = InMemoryGuestbookRepository::new();
        let at = Utc.with_ymd_and_hms(2019, 5, 4, 11, 0, 0).unwrap();
        let accept_all = |_: &str| true;
        let lenient = GuestbookEntry::new_with(
            "Ollie",
            "ollie@[10.0.0.1]",
            "Hi",
            &accept_all,
            &FixedClock::new(at),
        )
        .unwrap();

        let lenient = repo.save(lenient).await.unwrap();
        let regular = repo.save(entry_at("Paul", 0)).await.unwrap();

        let loaded = repo.find_by_id(lenient.id().unwrap()).await.unwrap();
        assert_eq!(loaded.as_ref().map(|e| e.email()), Some("ollie@[10.0.0.1]"));
        assert_eq!(loaded, Some(lenient.clone()));

        let listed = repo.find_all().await.unwrap();
        assert_eq!(listed, vec![lenient, regular]);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn unknown_id_is_absent() {
        let repo = InMemoryGuestbookRepository::new();
        let missing = EntryId::new(99).unwrap();
        assert_eq!(repo.find_by_id(missing).await.unwrap(), None);
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
