//! Email address syntax checking.
//!
//! Entries depend on the [`EmailValidator`] capability rather than on a fixed
//! grammar, so callers can swap the rule (or stub it in tests).

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of a whole address (RFC 5321 path limit minus the brackets).
const MAX_ADDRESS_LEN: usize = 254;
/// Maximum length of the local part.
const MAX_LOCAL_LEN: usize = 64;

static LOCAL_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*$")
        .expect("local part pattern is valid")
});

static DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$")
        .expect("domain pattern is valid")
});

/// Decides whether a string is a syntactically valid email address.
pub trait EmailValidator: Send + Sync {
    fn is_valid(&self, email: &str) -> bool;
}

impl<F> EmailValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_valid(&self, email: &str) -> bool {
        self(email)
    }
}

/// `local-part@domain` grammar.
///
/// - local part: dot-separated atoms (no leading, trailing or doubled dots)
/// - domain: at least two labels, alphabetic top-level label of 2+ chars
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DefaultEmailValidator;

impl DefaultEmailValidator {
    pub fn new() -> Self {
        Self
    }
}

impl EmailValidator for DefaultEmailValidator {
    fn is_valid(&self, email: &str) -> bool {
        if email.is_empty() || email.len() > MAX_ADDRESS_LEN {
            return false;
        }

        let Some((local, domain)) = email.rsplit_once('@') else {
            return false;
        };

        if local.is_empty() || local.len() > MAX_LOCAL_LEN {
            return false;
        }

        LOCAL_PART.is_match(local) && DOMAIN.is_match(domain)
    }
}
