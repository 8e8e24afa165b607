//! Request extractors for the gateway endpoints.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::endpoints::common::ApiError;

/// Extracts the bearer token from the `Authorization` header.
///
/// Only the presence and shape of the header are checked here; token
/// verification happens in the handler, which owns the token service.
#[derive(Debug)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        match header.strip_prefix("Bearer ") {
            Some(token) if !token.is_empty() => Ok(BearerToken(token.to_owned())),
            _ => Err(ApiError::Unauthorized("Token ausente")),
        }
    }
}
