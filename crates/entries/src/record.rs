//! Storage mapping for guestbook entries.
//!
//! Storage adapters never build a [`GuestbookEntry`] field by field. They read
//! and write [`GuestbookEntryRecord`] and convert through
//! [`GuestbookEntryRecord::into_entry`], which re-checks that every field is
//! present, so a corrupted row surfaces as an error instead of an invalid
//! entry. Email syntax is not re-checked: it belongs to the validator the entry
//! was built with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use guestbook_core::{DomainError, DomainResult, EntryId};

use crate::entry::GuestbookEntry;

/// Raw-field shape of a stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestbookEntryRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub text: String,
    pub date: DateTime<Utc>,
}

impl GuestbookEntryRecord {
    /// Flatten a persisted entry. Entries without an id have no record form.
    pub fn from_entry(entry: &GuestbookEntry) -> DomainResult<Self> {
        let id = entry.id().ok_or_else(|| {
            DomainError::invariant("only persisted guestbook entries can be mapped to a record")
        })?;

        Ok(Self {
            id: id.get(),
            name: entry.name().to_owned(),
            email: entry.email().to_owned(),
            text: entry.text().to_owned(),
            date: entry.date(),
        })
    }

    /// Rebuild the entry, keeping the stored id and creation date.
    pub fn into_entry(self) -> DomainResult<GuestbookEntry> {
        let id = EntryId::new(self.id)?;
        GuestbookEntry::restore(id, self.name, self.email, self.text, self.date)
    }
}

impl TryFrom<GuestbookEntryRecord> for GuestbookEntry {
    type Error = DomainError;

    fn try_from(record: GuestbookEntryRecord) -> Result<Self, Self::Error> {
        record.into_entry()
    }
}
