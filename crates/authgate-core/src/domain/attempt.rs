use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a single ledger record.
pub type RecordId = Uuid;

/// Throttling bucket: one network origin paired with one claimed account.
///
/// The email half is trimmed and lower-cased so that case variants of the
/// same account land in the same bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptKey {
    ip_address: String,
    email: String,
}

impl AttemptKey {
    pub fn new(ip_address: impl Into<String>, email: &str) -> Self {
        Self {
            ip_address: ip_address.into(),
            email: email.trim().to_lowercase(),
        }
    }

    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Unambiguous encoding for external stores. The address is
    /// length-prefixed since it may contain the separator.
    pub fn storage_key(&self) -> String {
        format!("{}:{}|{}", self.ip_address.len(), self.ip_address, self.email)
    }

    /// Email with the local part masked, for log output.
    pub fn masked_email(&self) -> String {
        mask_email(&self.email)
    }
}

impl fmt::Display for AttemptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.ip_address, self.email)
    }
}

/// Outcome of a completed verifier call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptOutcome {
    Success,
    Failure,
}

impl AttemptOutcome {
    pub fn is_failure(self) -> bool {
        matches!(self, AttemptOutcome::Failure)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::Failure => "failure",
        }
    }
}

/// Append-only ledger entry. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: RecordId,
    pub key: AttemptKey,
    pub outcome: AttemptOutcome,
    pub attempted_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(key: AttemptKey, outcome: AttemptOutcome, attempted_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            outcome,
            attempted_at,
        }
    }
}

/// Mask the local part of an email so logs carry no PII.
pub fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            match local.chars().next() {
                Some(first) if local.chars().count() > 1 => format!("{first}***{domain}"),
                _ => format!("***{domain}"),
            }
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalizes_email() {
        let a = AttemptKey::new("10.0.0.1", "  Alice@Example.COM ");
        let b = AttemptKey::new("10.0.0.1", "alice@example.com");
        assert_eq!(a, b);
        assert_eq!(a.email(), "alice@example.com");
        assert_eq!(a.to_string(), "10.0.0.1|alice@example.com");
    }

    #[test]
    fn test_keys_differ_by_either_dimension() {
        let base = AttemptKey::new("10.0.0.1", "x@example.com");
        assert_ne!(base, AttemptKey::new("10.0.0.2", "x@example.com"));
        assert_ne!(base, AttemptKey::new("10.0.0.1", "y@example.com"));
    }

    #[test]
    fn test_storage_key_separates_components() {
        let a = AttemptKey::new("1.2.3.4|evil", "x@example.com");
        let b = AttemptKey::new("1.2.3.4", "evil|x@example.com");
        assert_eq!(a.to_string(), b.to_string());
        assert_ne!(a.storage_key(), b.storage_key());
        assert_eq!(
            AttemptKey::new("10.0.0.1", "a@example.com").storage_key(),
            "8:10.0.0.1|a@example.com"
        );
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("alice@example.com"), "a***@example.com");
        assert_eq!(mask_email("a@example.com"), "***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }
}
