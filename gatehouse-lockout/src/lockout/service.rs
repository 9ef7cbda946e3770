//! Login lockout engine
//!
//! Core service for tracking failed authentication attempts, locking
//! tracking keys after repeated failures, and escalating the lockout
//! window on repeat offenses. State lives in an in-process concurrent map;
//! a horizontally scaled deployment therefore sees an effective threshold
//! of N times the configured value and must back this interface with a
//! shared store to get fleet-wide accuracy.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::LockoutConfig;
use super::notification::{LockoutEvent, LockoutNotification, UnlockReason};
use super::record::{derive_keys, normalize_identity, AttemptRecord, TrackingKey};

/// Aggregate lockout state for an (identity, origin) pair
///
/// Returned by [`LoginLockout::status`] for observability and logging.
/// Values are maxima across the derived tracking keys.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct LockoutStatus {
    /// Whether any derived key is currently locked
    pub locked: bool,
    /// Highest failed-attempt count across the derived keys
    pub failed_attempts: u32,
    /// Ceiling-rounded minutes until the latest lock expires (0 if unlocked)
    pub remaining_minutes: u64,
    /// Highest lifetime lock count across the derived keys
    pub total_lockouts: u32,
}

/// Login lockout engine
///
/// Each failed attempt is recorded under up to three tracking keys (the
/// identity, the origin, and the identity+origin pair); a lock on any one
/// of them blocks the attempt. Construct once at startup and share via
/// axum `State` or `Extension`.
///
/// # Example
///
/// ```rust,ignore
/// let lockout = LoginLockout::new(config.lockout.clone());
/// let sweeper = lockout.spawn_sweeper();
///
/// // In your login handler:
/// if lockout.is_locked(&email, origin) {
///     let minutes = lockout.remaining_lockout_minutes(&email, origin);
///     return Err(Error::AccountLocked { retry_after_secs: minutes * 60 });
/// }
/// ```
#[derive(Clone)]
pub struct LoginLockout {
    config: LockoutConfig,
    records: Arc<DashMap<TrackingKey, AttemptRecord>>,
    notifications: Vec<Arc<dyn LockoutNotification>>,
    sweeper_shutdown: CancellationToken,
}

impl LoginLockout {
    /// Create a new lockout engine
    pub fn new(config: LockoutConfig) -> Self {
        Self {
            config,
            records: Arc::new(DashMap::new()),
            notifications: Vec::new(),
            sweeper_shutdown: CancellationToken::new(),
        }
    }

    /// Register a notification handler for lockout events
    ///
    /// Multiple handlers can be registered. Events are dispatched
    /// via `tokio::spawn` (fire-and-forget).
    pub fn with_notification(mut self, handler: Arc<dyn LockoutNotification>) -> Self {
        self.notifications.push(handler);
        self
    }

    /// Whether the (identity, origin) pair is currently blocked
    ///
    /// Checks every derived tracking key; an elapsed lock found along the
    /// way is cleared (lazy expiry). Never creates records, so an unseen
    /// identity from a clean origin always reads unlocked — but an unseen
    /// identity from a locked origin is blocked, which is the intended
    /// defense against credential stuffing. Deployments behind large NATs
    /// that find this too aggressive should raise `max_attempts` or pass
    /// no origin.
    pub fn is_locked(&self, identity: &str, origin: Option<&str>) -> bool {
        self.is_locked_at(identity, origin, Utc::now())
    }

    fn is_locked_at(&self, identity: &str, origin: Option<&str>, now: DateTime<Utc>) -> bool {
        if !self.config.enabled {
            return false;
        }

        let mut locked = false;
        for key in derive_keys(identity, origin) {
            if let Some(mut record) = self.records.get_mut(&key) {
                if record.expire_lock_at(now) {
                    debug!(key = %key, "Lockout expired");
                }
                if record.is_locked_at(now) {
                    locked = true;
                }
            }
        }
        locked
    }

    /// Record a failed authentication attempt
    ///
    /// Increments the failure counter on every derived key and locks each
    /// key that reaches the attempt threshold. Returns `true` if this call
    /// triggered a new lock on any key.
    ///
    /// Fires notification events for every failed attempt, for the warning
    /// threshold, and for each key that locks.
    pub fn record_failure(&self, identity: &str, origin: Option<&str>) -> bool {
        self.record_failure_at(identity, origin, Utc::now())
    }

    fn record_failure_at(
        &self,
        identity: &str,
        origin: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.config.enabled {
            return false;
        }

        let identity = normalize_identity(identity);
        let mut newly_locked = false;
        let mut identity_count = 0;

        for key in derive_keys(&identity, origin) {
            let mut record = self
                .records
                .entry(key.clone())
                .or_insert_with(|| AttemptRecord::new(now));

            // A lock that ran out starts a fresh accumulation cycle
            if record.expire_lock_at(now) {
                self.notify(LockoutEvent::AccountUnlocked {
                    key: key.to_string(),
                    identity: identity.clone(),
                    reason: UnlockReason::Expired,
                });
            }

            record.failed_count += 1;
            record.last_attempt_at = now;

            if matches!(key, TrackingKey::Identity(_)) {
                identity_count = record.failed_count;
            }

            if record.failed_count >= self.config.max_attempts {
                record.total_lockouts += 1;
                let duration = self.lockout_duration(record.total_lockouts);
                record.locked_until = Some(now + duration);
                record.failed_count = 0;
                newly_locked = true;

                warn!(
                    key = %key,
                    attempt_count = self.config.max_attempts,
                    lockout_duration_secs = duration.num_seconds(),
                    total_lockouts = record.total_lockouts,
                    "Tracking key locked after repeated failures"
                );

                self.notify(LockoutEvent::AccountLocked {
                    key: key.to_string(),
                    identity: identity.clone(),
                    origin: origin.map(str::to_string),
                    attempt_count: self.config.max_attempts,
                    lockout_duration_secs: duration.num_seconds().max(0) as u64,
                    total_lockouts: record.total_lockouts,
                });
            }
        }

        debug!(
            identity = %identity,
            attempt_count = identity_count,
            max_attempts = self.config.max_attempts,
            "Authentication failure recorded"
        );

        self.notify(LockoutEvent::FailedAttempt {
            identity: identity.clone(),
            origin: origin.map(str::to_string),
            attempt_count: identity_count,
            max_attempts: self.config.max_attempts,
        });

        if self.config.warning_threshold > 0
            && identity_count == self.config.warning_threshold
            && identity_count < self.config.max_attempts
        {
            self.notify(LockoutEvent::ApproachingThreshold {
                identity,
                attempt_count: identity_count,
                remaining_attempts: self.config.max_attempts - identity_count,
            });
        }

        newly_locked
    }

    /// Record a successful authentication, clearing the current cycle
    ///
    /// Resets the failure counter and clears any active lock on every
    /// derived key, preserving each key's lifetime lock count so a future
    /// lockout still escalates.
    pub fn record_success(&self, identity: &str, origin: Option<&str>) {
        self.clear_attempts(identity, origin, UnlockReason::SuccessfulLogin, Utc::now());
    }

    /// Manually unlock an (identity, origin) pair (admin action)
    ///
    /// Same state transition as [`record_success`](Self::record_success),
    /// reported with a distinct audit reason.
    pub fn unlock(&self, identity: &str, origin: Option<&str>) {
        self.clear_attempts(identity, origin, UnlockReason::AdminAction, Utc::now());
    }

    fn clear_attempts(
        &self,
        identity: &str,
        origin: Option<&str>,
        reason: UnlockReason,
        now: DateTime<Utc>,
    ) {
        if !self.config.enabled {
            return;
        }

        let identity = normalize_identity(identity);
        for key in derive_keys(&identity, origin) {
            if let Some(mut record) = self.records.get_mut(&key) {
                let was_locked = record.is_locked_at(now);
                record.failed_count = 0;
                record.locked_until = None;
                if was_locked {
                    info!(key = %key, reason = %reason, "Tracking key unlocked");
                    self.notify(LockoutEvent::AccountUnlocked {
                        key: key.to_string(),
                        identity: identity.clone(),
                        reason: reason.clone(),
                    });
                }
            }
        }
    }

    /// Erase all tracking history for an (identity, origin) pair
    ///
    /// Deletes every derived record outright, including the lifetime lock
    /// count. Used sparingly — after a verified password change, when the
    /// attacker's leverage is moot.
    pub fn full_reset(&self, identity: &str, origin: Option<&str>) {
        let now = Utc::now();
        let identity = normalize_identity(identity);
        for key in derive_keys(&identity, origin) {
            if let Some((key, record)) = self.records.remove(&key) {
                if record.is_locked_at(now) {
                    self.notify(LockoutEvent::AccountUnlocked {
                        key: key.to_string(),
                        identity: identity.clone(),
                        reason: UnlockReason::PasswordChanged,
                    });
                }
            }
        }
        info!(identity = %identity, "Lockout history erased");
    }

    /// Minutes until the latest active lock on the pair expires
    ///
    /// Ceiling-rounded so a caller-facing retry hint never undershoots.
    /// Returns 0 when nothing is locked.
    pub fn remaining_lockout_minutes(&self, identity: &str, origin: Option<&str>) -> u64 {
        self.remaining_lockout_minutes_at(identity, origin, Utc::now())
    }

    fn remaining_lockout_minutes_at(
        &self,
        identity: &str,
        origin: Option<&str>,
        now: DateTime<Utc>,
    ) -> u64 {
        derive_keys(identity, origin)
            .into_iter()
            .filter_map(|key| self.records.get(&key).and_then(|record| record.locked_until))
            .filter(|until| *until > now)
            .max()
            .map_or(0, |until| ceil_minutes(until - now))
    }

    /// Aggregate lockout state for observability
    ///
    /// Read-only: reports maxima across the derived keys without touching
    /// any record, so it is safe to call from logging paths.
    pub fn status(&self, identity: &str, origin: Option<&str>) -> LockoutStatus {
        self.status_at(identity, origin, Utc::now())
    }

    fn status_at(
        &self,
        identity: &str,
        origin: Option<&str>,
        now: DateTime<Utc>,
    ) -> LockoutStatus {
        let mut status = LockoutStatus {
            locked: false,
            failed_attempts: 0,
            remaining_minutes: 0,
            total_lockouts: 0,
        };
        let mut latest: Option<DateTime<Utc>> = None;

        for key in derive_keys(identity, origin) {
            if let Some(record) = self.records.get(&key) {
                status.failed_attempts = status.failed_attempts.max(record.failed_count);
                status.total_lockouts = status.total_lockouts.max(record.total_lockouts);
                if let Some(until) = record.locked_until {
                    if until > now {
                        status.locked = true;
                        latest = Some(latest.map_or(until, |t| t.max(until)));
                    }
                }
            }
        }

        if let Some(until) = latest {
            status.remaining_minutes = ceil_minutes(until - now);
        }
        status
    }

    /// Lockout window for the given lifetime lock count
    ///
    /// `min(base * 2^min(locks - 1, cap), max)`: the first lock serves the
    /// base window, each repeat doubles it, bounded by the cap exponent and
    /// the absolute ceiling.
    fn lockout_duration(&self, total_lockouts: u32) -> Duration {
        let exponent = total_lockouts
            .saturating_sub(1)
            .min(self.config.backoff_cap_exponent);
        let secs = self
            .config
            .base_lockout_secs
            .saturating_mul(1u64 << exponent)
            .min(self.config.max_lockout_secs);
        Duration::seconds(secs as i64)
    }

    /// Remove records that are both unlocked and stale
    ///
    /// A record is stale once its last failed attempt is older than the
    /// retention window. Locked records are never collected while the lock
    /// is active. Returns how many records were dropped.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let retention = Duration::seconds(self.config.retention_secs as i64);
        let before = self.records.len();
        self.records
            .retain(|_, record| record.is_locked_at(now) || now - record.last_attempt_at < retention);
        let removed = before.saturating_sub(self.records.len());
        if removed > 0 {
            debug!(
                removed,
                remaining = self.records.len(),
                "Swept stale lockout records"
            );
        }
        removed
    }

    /// Spawn the periodic garbage-collection sweep
    ///
    /// The task ticks every `gc_interval_secs` and runs until
    /// [`shutdown`](Self::shutdown) is called. Correctness never depends on
    /// the sweep — elapsed locks are cleared lazily on read — it only
    /// bounds memory.
    pub fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let engine = self.clone();
        let token = self.sweeper_shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(
                engine.config.gc_interval_secs,
            ));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Lockout sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        engine.sweep();
                    }
                }
            }
        })
    }

    /// Stop the background sweeper
    ///
    /// Idempotent; also stops sweepers spawned from clones of this engine.
    pub fn shutdown(&self) {
        self.sweeper_shutdown.cancel();
    }

    /// Number of tracking keys currently held in memory
    pub fn tracked_keys(&self) -> usize {
        self.records.len()
    }

    /// Dispatch a notification event to all registered handlers
    fn notify(&self, event: LockoutEvent) {
        for handler in &self.notifications {
            let handler = Arc::clone(handler);
            let event = event.clone();
            tokio::spawn(async move {
                handler.on_event(event).await;
            });
        }
    }
}

fn ceil_minutes(duration: Duration) -> u64 {
    let secs = duration.num_seconds().max(0);
    ((secs + 59) / 60) as u64
}
