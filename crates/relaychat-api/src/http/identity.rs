//! Caller identity extractor.
//!
//! Authentication is an external collaborator; this extractor only carries
//! the resolved identity across the boundary. The owner id is read from the
//! `x-user-id` header (set by whatever auth proxy fronts the API), falling
//! back to `"local"` for single-user deployments. Every store call is
//! scoped through it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

/// Default owner for deployments without an auth layer in front.
const LOCAL_OWNER: &str = "local";

/// The resolved owner identity for a request.
#[derive(Debug, Clone)]
pub struct Identity(pub String);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(LOCAL_OWNER);

        Ok(Identity(owner.to_string()))
    }
}
