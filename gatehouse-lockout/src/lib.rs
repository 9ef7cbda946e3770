//! # gatehouse-lockout
//!
//! Brute-force defense engine for the Gatehouse authentication gateway.
//! Tracks failed login attempts per identity, per network origin, and per
//! identity+origin pair; locks tracking keys after repeated failures with
//! progressively longer windows; and self-expires stale state so memory
//! stays bounded without a backing store.
//!
//! The engine is in-process by design: each instance has an independent
//! view of lockout state, so a horizontally scaled deployment must back
//! the same operation surface with a shared store for fleet-wide accuracy.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gatehouse_lockout::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let lockout = LoginLockout::new(config.lockout.clone());
//!     let sweeper = lockout.spawn_sweeper();
//!
//!     // In your login handler:
//!     let email = "user@example.com";
//!     let origin = Some("203.0.113.7");
//!     if lockout.is_locked(email, origin) {
//!         let minutes = lockout.remaining_lockout_minutes(email, origin);
//!         return Err(Error::AccountLocked {
//!             retry_after_secs: minutes * 60,
//!         });
//!     }
//!     match authenticate(email).await {
//!         Ok(()) => lockout.record_success(email, origin),
//!         Err(_) => {
//!             lockout.record_failure(email, origin);
//!         }
//!     }
//!
//!     lockout.shutdown();
//!     sweeper.await.ok();
//!     Ok(())
//! }
//! # async fn authenticate(_email: &str) -> Result<()> { Ok(()) }
//! ```

pub mod config;
pub mod error;
pub mod lockout;
pub mod observability;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, ServiceConfig};
    pub use crate::error::{Error, ErrorResponse, Result};
    pub use crate::lockout::{
        AttemptRecord, LockoutConfig, LockoutEvent, LockoutMiddleware, LockoutNotification,
        LockoutStatus, LoginLockout, TrackingKey, UnlockReason,
    };
    pub use crate::observability::init_tracing;
}
