//! Request id assignment
//!
//! Every request carries an id that is logged by handlers, echoed in the
//! `X-Request-ID` response header and included in error bodies.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use uuid::Uuid;

/// Header used to propagate request ids in and out.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// The id of the request being handled, available via request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(RequestId::generate))
    }
}

/// Middleware that assigns the request id and echoes it on the response.
///
/// An inbound `X-Request-ID` header is reused so callers can correlate
/// their own logs with ours.
pub async fn assign_request_id(mut req: Request<Body>, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| RequestId(v.to_string()))
        .unwrap_or_else(RequestId::generate);

    req.extensions_mut().insert(id.clone());

    let mut response = REQUEST_ID.scope(id.0.clone(), next.run(req)).await;
    if let Ok(value) = HeaderValue::from_str(&id.0) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// The id of the request currently being handled on this task, if any.
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_request_outside_scope() {
        assert!(current_request_id().is_none());
    }

    #[tokio::test]
    async fn test_scope_exposes_id() {
        let seen = REQUEST_ID
            .scope("req-42".to_string(), async { current_request_id() })
            .await;
        assert_eq!(seen.as_deref(), Some("req-42"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(RequestId::generate(), RequestId::generate());
    }
}
