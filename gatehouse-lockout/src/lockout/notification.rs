//! Lockout notification hooks
//!
//! Provides a trait for receiving lockout lifecycle events (failed attempts,
//! threshold warnings, key locks/unlocks). Notifications are dispatched via
//! `tokio::spawn` so they never block authentication responses.

use async_trait::async_trait;

/// Events emitted during the lockout lifecycle
///
/// Dispatched to [`LockoutNotification`] handlers via fire-and-forget
/// `tokio::spawn`, so handlers should be lightweight and non-blocking.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum LockoutEvent {
    /// An authentication attempt failed
    FailedAttempt {
        /// The identity (email, username, etc.) that failed
        identity: String,
        /// Network origin of the attempt, if known
        origin: Option<String>,
        /// Failed attempts recorded against the identity key
        attempt_count: u32,
        /// Maximum attempts before lockout
        max_attempts: u32,
    },
    /// The warning threshold has been reached for an identity
    ApproachingThreshold {
        /// The identity approaching lockout
        identity: String,
        /// Current number of failed attempts
        attempt_count: u32,
        /// Remaining attempts before lockout
        remaining_attempts: u32,
    },
    /// A tracking key has been locked due to too many failures
    AccountLocked {
        /// Display form of the locked key (identity, origin, or pair)
        key: String,
        /// The identity involved in the attempt that triggered the lock
        identity: String,
        /// Network origin of the attempt, if known
        origin: Option<String>,
        /// Number of failed attempts that triggered the lock
        attempt_count: u32,
        /// How long the key is locked (seconds)
        lockout_duration_secs: u64,
        /// Lifetime number of lockouts for this key, including this one
        total_lockouts: u32,
    },
    /// A previously locked tracking key has been unlocked
    AccountUnlocked {
        /// Display form of the unlocked key
        key: String,
        /// The identity the unlock applies to
        identity: String,
        /// Why the key was unlocked
        reason: UnlockReason,
    },
}

/// Reason a tracking key was unlocked
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UnlockReason {
    /// Lockout duration expired naturally
    Expired,
    /// A successful login cleared the lockout
    SuccessfulLogin,
    /// An administrator manually unlocked the key
    AdminAction,
    /// A verified password change erased the tracking history
    PasswordChanged,
}

impl std::fmt::Display for UnlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expired => write!(f, "expired"),
            Self::SuccessfulLogin => write!(f, "successful_login"),
            Self::AdminAction => write!(f, "admin_action"),
            Self::PasswordChanged => write!(f, "password_changed"),
        }
    }
}

/// Trait for receiving lockout lifecycle notifications
///
/// Implement this trait to react to lockout events (e.g., send emails,
/// emit metrics, write audit logs). Handlers are invoked asynchronously
/// and must not panic.
///
/// # Example
///
/// ```rust,ignore
/// use gatehouse_lockout::lockout::{LockoutNotification, LockoutEvent};
///
/// struct EmailNotifier { /* ... */ }
///
/// #[async_trait]
/// impl LockoutNotification for EmailNotifier {
///     async fn on_event(&self, event: LockoutEvent) {
///         if let LockoutEvent::AccountLocked { identity, .. } = event {
///             // send_lockout_email(&identity).await;
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait LockoutNotification: Send + Sync + 'static {
    /// Called when a lockout lifecycle event occurs
    ///
    /// This method is invoked inside `tokio::spawn`, so it will not block
    /// the authentication response. Implementations should handle their
    /// own errors internally (log and continue).
    async fn on_event(&self, event: LockoutEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_reason_display() {
        assert_eq!(UnlockReason::Expired.to_string(), "expired");
        assert_eq!(UnlockReason::SuccessfulLogin.to_string(), "successful_login");
        assert_eq!(UnlockReason::AdminAction.to_string(), "admin_action");
        assert_eq!(UnlockReason::PasswordChanged.to_string(), "password_changed");
    }
}
