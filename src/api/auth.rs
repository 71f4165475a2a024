//! Request authentication.
//!
//! Credentials come from an `Authorization: Bearer` header or from the
//! identity provider's session cookie. The bearer header wins when both are
//! present.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;

use super::error::ApiErrorResponse;
use super::handlers::AppState;
use crate::domain::UserIdentity;
use crate::infrastructure::{CredentialSource, Credentials, Session};

/// Cookie names the identity provider uses for the session token.
///
/// The `__Secure-` variant is set when the site is served over HTTPS.
pub const SESSION_COOKIE_NAMES: [&str; 2] = [
    "better-auth.session_token",
    "__Secure-better-auth.session_token",
];

// =============================================================================
// Header Parsing
// =============================================================================

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
}

fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| SESSION_COOKIE_NAMES.contains(name))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Extracts credentials from request headers.
///
/// A signed cookie value (`token.signature`) is reduced to the token.
#[must_use]
pub fn credentials_from_headers(headers: &HeaderMap) -> Option<Credentials> {
    bearer_token(headers)
        .map(|token| Credentials::new(token, CredentialSource::Bearer))
        .or_else(|| {
            session_cookie(headers).map(|value| {
                let token = value.split_once('.').map_or(value, |(token, _)| token);
                Credentials::new(token, CredentialSource::Cookie)
            })
        })
}

/// Returns `true` if the request carries a non-empty session cookie.
///
/// Presence only; the cookie is not verified.
#[must_use]
pub fn has_session_cookie(headers: &HeaderMap) -> bool {
    session_cookie(headers).is_some()
}

// =============================================================================
// AuthenticatedUser Extractor
// =============================================================================

/// The verified caller of a task endpoint.
///
/// Rejects with 401 when the request has no live session and with 500 when
/// the session store cannot be queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserIdentity);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credentials = credentials_from_headers(&parts.headers);

        match state.session_verifier.verify(credentials).await? {
            Session::Authenticated(identity) => Ok(Self(identity)),
            Session::Anonymous => {
                tracing::debug!(path = %parts.uri.path(), "Rejected unauthenticated request");
                Err(ApiErrorResponse::unauthorized())
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
