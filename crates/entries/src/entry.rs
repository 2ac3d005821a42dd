use chrono::{DateTime, Utc};
use serde::Serialize;

use guestbook_core::{Clock, DomainError, DomainResult, Entity, EntryId, SystemClock};

use crate::email::{DefaultEmailValidator, EmailValidator};

pub(crate) const NAME: &str = "name";
pub(crate) const EMAIL: &str = "email";
pub(crate) const TEXT: &str = "text";

/// A guestbook entry: who wrote it, how to reach them, what they wrote and when.
///
/// `name`, `email`, `text` and `date` are fixed at construction. The identifier
/// is absent until the persistence layer stores the entry and calls
/// [`GuestbookEntry::assign_id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuestbookEntry {
    id: Option<EntryId>,
    name: String,
    email: String,
    text: String,
    date: DateTime<Utc>,
}

impl GuestbookEntry {
    /// Create a new entry, validating every field and stamping it with the
    /// current time.
    ///
    /// Checks run in order (name, email present, text, email well-formed) and
    /// the first failure is returned as [`DomainError::InvalidArgument`].
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        text: impl Into<String>,
    ) -> DomainResult<Self> {
        Self::new_with(name, email, text, &DefaultEmailValidator, &SystemClock)
    }

    /// Same as [`GuestbookEntry::new`] with an explicit email rule and time source.
    pub fn new_with<V, C>(
        name: impl Into<String>,
        email: impl Into<String>,
        text: impl Into<String>,
        validator: &V,
        clock: &C,
    ) -> DomainResult<Self>
    where
        V: EmailValidator + ?Sized,
        C: Clock + ?Sized,
    {
        let name = name.into();
        let email = email.into();
        let text = text.into();

        validate(&name, &email, &text, validator)?;

        Ok(Self {
            id: None,
            name,
            email,
            text,
            date: clock.now(),
        })
    }

    /// Rebuild a stored entry from its raw fields (storage mapping only).
    ///
    /// Only the presence rules are re-checked. Email syntax was settled by
    /// whichever validator built the entry, so a stored address is trusted.
    pub(crate) fn restore(
        id: EntryId,
        name: String,
        email: String,
        text: String,
        date: DateTime<Utc>,
    ) -> DomainResult<Self> {
        check_present(&name, &email, &text)?;

        Ok(Self {
            id: Some(id),
            name,
            email,
            text,
            date,
        })
    }

    /// Attach the identifier chosen by the persistence layer.
    ///
    /// Succeeds once; an entry that already carries an id is a conflict.
    pub fn assign_id(mut self, id: EntryId) -> DomainResult<Self> {
        if let Some(existing) = self.id {
            return Err(DomainError::conflict(format!(
                "guestbook entry already has id {existing}, refusing to assign {id}"
            )));
        }
        self.id = Some(id);
        Ok(self)
    }

    pub fn id(&self) -> Option<EntryId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }
}

impl Entity for GuestbookEntry {
    type Id = EntryId;

    fn id(&self) -> Option<&Self::Id> {
        self.id.as_ref()
    }
}

fn has_text(value: &str) -> bool {
    !value.trim().is_empty()
}

fn reject(field: &'static str, message: &str) -> DomainError {
    tracing::debug!(field, reason = message, "guestbook entry rejected");
    DomainError::invalid_argument(field, message)
}

fn check_present(name: &str, email: &str, text: &str) -> DomainResult<()> {
    if !has_text(name) {
        return Err(reject(NAME, "Name must not be null or empty!"));
    }
    if !has_text(email) {
        return Err(reject(EMAIL, "Email must not be null or empty!"));
    }
    if !has_text(text) {
        return Err(reject(TEXT, "Text must not be null or empty!"));
    }
    Ok(())
}

fn validate<V>(name: &str, email: &str, text: &str, validator: &V) -> DomainResult<()>
where
    V: EmailValidator + ?Sized,
{
    check_present(name, email, text)?;
    if !validator.is_valid(email) {
        return Err(reject(EMAIL, "Email must be valid"));
    }
    Ok(())
}
