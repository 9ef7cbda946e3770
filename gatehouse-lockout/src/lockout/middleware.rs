//! Lockout middleware for automatic enforcement
//!
//! Optional convenience middleware that automatically enforces login lockout
//! on routes. Extracts the identity from the JSON request body and the
//! origin from the forwarded chain or socket peer, checks lock status, and
//! records failures/successes based on the response status code.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use super::service::LoginLockout;
use crate::error::Error;

/// Middleware state for automatic lockout enforcement
///
/// Wraps a [`LoginLockout`] engine and a JSON field name to extract the
/// identity from the request body. Apply to login routes using
/// `axum::middleware::from_fn_with_state`.
///
/// # Behavior
///
/// 1. Buffers the request body and extracts the identity from the specified JSON field
/// 2. If the content is not JSON or the field is absent, the request passes through without enforcement
/// 3. If the pair is locked, returns HTTP 423 with a `Retry-After` header
/// 4. Forwards the request to the inner handler
/// 5. If the response is 401, records a failure; if 2xx, records a success
///
/// # Example
///
/// ```rust,ignore
/// use gatehouse_lockout::lockout::{LoginLockout, LockoutMiddleware};
///
/// let lockout = LoginLockout::new(config.lockout.clone());
/// let mw = LockoutMiddleware::new(lockout, "email");
///
/// let app = Router::new()
///     .route("/login", post(login_handler))
///     .route_layer(axum::middleware::from_fn_with_state(
///         mw,
///         LockoutMiddleware::middleware,
///     ));
/// ```
#[derive(Clone)]
pub struct LockoutMiddleware {
    lockout: LoginLockout,
    identity_field: String,
}

impl LockoutMiddleware {
    /// Create a new lockout middleware
    ///
    /// `identity_field` is the JSON field name to extract from the request
    /// body (e.g., `"email"`, `"username"`).
    pub fn new(lockout: LoginLockout, identity_field: &str) -> Self {
        Self {
            lockout,
            identity_field: identity_field.to_string(),
        }
    }

    /// Middleware function for axum
    ///
    /// Use with `axum::middleware::from_fn_with_state`.
    pub async fn middleware(
        State(mw): State<Self>,
        request: Request,
        next: Next,
    ) -> Result<Response, Error> {
        // Only process JSON content types
        let is_json = request
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);

        if !is_json {
            return Ok(next.run(request).await);
        }

        let origin = client_origin(&request);

        // Buffer the body to extract the identity
        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, 1024 * 1024) // 1MB limit
            .await
            .map_err(|e| Error::BadRequest(format!("Failed to read request body: {}", e)))?;

        let identity = serde_json::from_slice::<serde_json::Value>(&bytes)
            .ok()
            .and_then(|v| v.get(&mw.identity_field).cloned())
            .and_then(|v| v.as_str().map(|s| s.to_string()));

        let identity = match identity {
            Some(identity) => identity,
            None => {
                // Can't extract identity — pass through without enforcement
                let request = Request::from_parts(parts, Body::from(bytes));
                return Ok(next.run(request).await);
            }
        };

        if mw.lockout.is_locked(&identity, origin.as_deref()) {
            let minutes = mw
                .lockout
                .remaining_lockout_minutes(&identity, origin.as_deref());
            return Err(Error::AccountLocked {
                retry_after_secs: minutes * 60,
            });
        }

        // Reconstruct the request with the buffered body and forward
        let request = Request::from_parts(parts, Body::from(bytes));
        let response = next.run(request).await;

        // Record the outcome based on the response status
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            mw.lockout.record_failure(&identity, origin.as_deref());
        } else if status.is_success() {
            mw.lockout.record_success(&identity, origin.as_deref());
        }

        Ok(response)
    }
}

/// Network origin of a request: first `X-Forwarded-For` hop, else the peer address
fn client_origin(request: &Request) -> Option<String> {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_request() -> Request {
        axum::http::Request::builder()
            .header("content-type", "application/json")
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_origin_prefers_first_forwarded_hop() {
        let mut request = json_request();
        request.headers_mut().insert(
            "x-forwarded-for",
            "203.0.113.7, 10.0.0.1".parse().unwrap(),
        );
        assert_eq!(client_origin(&request), Some("203.0.113.7".to_string()));
    }

    #[test]
    fn test_origin_falls_back_to_peer_address() {
        let mut request = json_request();
        let peer: SocketAddr = "198.51.100.4:45912".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(client_origin(&request), Some("198.51.100.4".to_string()));
    }

    #[test]
    fn test_origin_absent_when_unknown() {
        assert_eq!(client_origin(&json_request()), None);
    }

    #[test]
    fn test_empty_forwarded_header_falls_through() {
        let mut request = json_request();
        request
            .headers_mut()
            .insert("x-forwarded-for", " ".parse().unwrap());
        assert_eq!(client_origin(&request), None);
    }
}
