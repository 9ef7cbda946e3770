//! Failed-attempt records and tracking-key derivation
//!
//! One authentication attempt is tracked under up to three independent
//! keys: the identity alone, the network origin alone, and the
//! identity+origin pair. A lock on any one of them blocks the attempt.

use std::fmt;

use chrono::{DateTime, Utc};

/// Key under which failed attempts are accumulated
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrackingKey {
    /// Normalized account identifier alone
    Identity(String),
    /// Network origin alone (e.g. a source address)
    Origin(String),
    /// Identity and origin combined
    Pair(String, String),
}

impl fmt::Display for TrackingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity(identity) => write!(f, "identity:{}", identity),
            Self::Origin(origin) => write!(f, "origin:{}", origin),
            Self::Pair(identity, origin) => write!(f, "pair:{}|{}", identity, origin),
        }
    }
}

/// Normalize an account identifier for tracking
///
/// Identities are matched case-insensitively; normalization happens here
/// and nowhere else.
pub(crate) fn normalize_identity(identity: &str) -> String {
    identity.trim().to_lowercase()
}

/// Derive the tracking keys for one attempt
///
/// A missing origin narrows tracking to the identity-only key. The identity
/// key always comes first in the returned set.
pub(crate) fn derive_keys(identity: &str, origin: Option<&str>) -> Vec<TrackingKey> {
    let identity = normalize_identity(identity);
    match origin {
        Some(origin) => vec![
            TrackingKey::Identity(identity.clone()),
            TrackingKey::Origin(origin.to_string()),
            TrackingKey::Pair(identity, origin.to_string()),
        ],
        None => vec![TrackingKey::Identity(identity)],
    }
}

/// Per-key bookkeeping for failed authentication attempts
///
/// Records are created lazily on first failure, mutated on every recorded
/// outcome, and deleted by the periodic sweep or an explicit full reset.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// Failed attempts since the last reset or lock
    pub failed_count: u32,
    /// Set while a lockout is active
    pub locked_until: Option<DateTime<Utc>>,
    /// Lifetime number of lockouts for this key; never decreases
    pub total_lockouts: u32,
    /// Most recent failed attempt, used by garbage collection
    pub last_attempt_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub(crate) fn new(now: DateTime<Utc>) -> Self {
        Self {
            failed_count: 0,
            locked_until: None,
            total_lockouts: 0,
            last_attempt_at: now,
        }
    }

    /// Whether the record is locked at `now`
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Clear an elapsed lock, returning whether one was cleared
    pub(crate) fn expire_lock_at(&mut self, now: DateTime<Utc>) -> bool {
        match self.locked_until {
            Some(until) if until <= now => {
                self.locked_until = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_derive_keys_with_origin() {
        let keys = derive_keys("User@Example.COM", Some("203.0.113.7"));
        assert_eq!(
            keys,
            vec![
                TrackingKey::Identity("user@example.com".to_string()),
                TrackingKey::Origin("203.0.113.7".to_string()),
                TrackingKey::Pair("user@example.com".to_string(), "203.0.113.7".to_string()),
            ]
        );
    }

    #[test]
    fn test_derive_keys_without_origin() {
        let keys = derive_keys(" alice@example.com ", None);
        assert_eq!(
            keys,
            vec![TrackingKey::Identity("alice@example.com".to_string())]
        );
    }

    #[test]
    fn test_key_display() {
        assert_eq!(
            TrackingKey::Identity("bob@example.com".to_string()).to_string(),
            "identity:bob@example.com"
        );
        assert_eq!(
            TrackingKey::Origin("198.51.100.4".to_string()).to_string(),
            "origin:198.51.100.4"
        );
        assert_eq!(
            TrackingKey::Pair("bob@example.com".to_string(), "198.51.100.4".to_string())
                .to_string(),
            "pair:bob@example.com|198.51.100.4"
        );
    }

    #[test]
    fn test_fresh_record_is_unlocked() {
        let record = AttemptRecord::new(now());
        assert_eq!(record.failed_count, 0);
        assert_eq!(record.total_lockouts, 0);
        assert!(!record.is_locked_at(now()));
    }

    #[test]
    fn test_expire_lock_clears_only_elapsed_locks() {
        let mut record = AttemptRecord::new(now());
        record.locked_until = Some(now() + chrono::Duration::minutes(15));

        // Still active: nothing cleared
        assert!(!record.expire_lock_at(now()));
        assert!(record.is_locked_at(now()));

        // Elapsed: cleared exactly once
        let later = now() + chrono::Duration::minutes(16);
        assert!(record.expire_lock_at(later));
        assert!(!record.is_locked_at(later));
        assert!(!record.expire_lock_at(later));
    }
}
