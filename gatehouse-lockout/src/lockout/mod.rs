//! Login lockout with composite-key tracking and progressive backoff
//!
//! Provides brute force protection for authentication endpoints by tracking
//! failed attempts per identity, per network origin, and per identity+origin
//! pair in an in-process map. A lock on any tracking key blocks the attempt,
//! and each repeat lock doubles the window up to a configured ceiling.
//!
//! # Architecture
//!
//! - **Service approach**: Construct [`LoginLockout`] once, pass via `State`
//! - **Middleware approach**: Use [`LockoutMiddleware`] for automatic enforcement
//! - **Notifications**: Register [`LockoutNotification`] handlers for events
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use gatehouse_lockout::lockout::{LoginLockout, LockoutConfig};
//!
//! let lockout = LoginLockout::new(config.lockout.clone());
//! let sweeper = lockout.spawn_sweeper();
//!
//! // In your login handler:
//! if lockout.is_locked(&email, origin) { /* return 423 */ }
//!
//! match authenticate(&creds).await {
//!     Ok(tokens) => { lockout.record_success(&email, origin); Ok(tokens) }
//!     Err(_) => {
//!         lockout.record_failure(&email, origin);
//!         Err(Error::Unauthorized("Invalid credentials".into()))
//!     }
//! }
//! ```

pub mod config;
pub mod middleware;
pub mod notification;
pub mod record;
pub mod service;

pub use config::LockoutConfig;
pub use middleware::LockoutMiddleware;
pub use notification::{LockoutEvent, LockoutNotification, UnlockReason};
pub use record::{AttemptRecord, TrackingKey};
pub use service::{LockoutStatus, LoginLockout};
