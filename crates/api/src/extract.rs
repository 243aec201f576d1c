//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use common::{Role, UserId};
use domain::Actor;

use crate::error::ApiError;

/// Header carrying the authenticated user's id.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// Header carrying the authenticated user's role.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The caller's identity, as set by the authenticating gateway in front of
/// this service.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedActor(pub Actor);

impl AuthenticatedActor {
    fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let id = UserId::parse(header(headers, ACTOR_ID_HEADER)?)
            .map_err(|e| ApiError::Unauthorized(format!("invalid {ACTOR_ID_HEADER}: {e}")))?;
        let role: Role = header(headers, ACTOR_ROLE_HEADER)?
            .parse()
            .map_err(|e| ApiError::Unauthorized(format!("invalid {ACTOR_ROLE_HEADER}: {e}")))?;

        Ok(Self(Actor::new(id, role)))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ApiError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {name} header")))
}

impl<S> FromRequestParts<S> for AuthenticatedActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}
