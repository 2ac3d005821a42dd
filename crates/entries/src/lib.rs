//! Guestbook entries domain module.
//!
//! This crate contains the guestbook entry entity and the rules it enforces at
//! construction time, implemented purely as deterministic domain logic (no IO,
//! no HTTP, no storage).

pub mod email;
pub mod entry;
pub mod record;

pub use email::{DefaultEmailValidator, EmailValidator};
pub use entry::GuestbookEntry;
pub use record::GuestbookEntryRecord;
