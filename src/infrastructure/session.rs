//! Session verification.
//!
//! The identity provider issues sessions; this module only resolves an
//! opaque token to a [`UserIdentity`]. Whatever the provider's payload looks
//! like, callers only ever see the normalized [`Session`] result.
//!
//! # Implementations
//!
//! - [`StaticTokenVerifier`]: fixed token table, for development and tests
//! - [`PostgresSessionVerifier`]: reads the provider's `session` and `user`
//!   tables and rejects expired sessions

use std::collections::HashMap;
use std::str::FromStr;

use futures::future::BoxFuture;
use sqlx::PgPool;
use thiserror::Error;

use crate::domain::UserIdentity;

// =============================================================================
// Credentials and Session
// =============================================================================

/// Where the token was found on the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// `Authorization: Bearer <token>` header.
    Bearer,
    /// Session cookie set by the identity provider.
    Cookie,
}

/// Credential material taken from an inbound request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    source: CredentialSource,
}

impl Credentials {
    /// Creates credentials from a token and the place it was found.
    #[must_use]
    pub fn new(token: impl Into<String>, source: CredentialSource) -> Self {
        Self {
            token: token.into(),
            source,
        }
    }

    /// Returns the opaque session token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns where the token was found.
    #[must_use]
    pub const fn source(&self) -> CredentialSource {
        self.source
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Result of verifying a request's credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// The token maps to a live session.
    Authenticated(UserIdentity),
    /// No token, or the token is unknown or expired.
    Anonymous,
}

impl Session {
    /// Returns the identity if authenticated.
    #[must_use]
    pub fn into_identity(self) -> Option<UserIdentity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Anonymous => None,
        }
    }
}

/// Errors raised when the verifier itself cannot answer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session store could not be queried.
    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Session Verifier
// =============================================================================

/// Resolves credentials to a session. Must not touch the task store.
pub trait SessionVerifier: Send + Sync {
    /// Verifies the given credentials.
    ///
    /// `None` means the request carried no credentials at all.
    fn verify(
        &self,
        credentials: Option<Credentials>,
    ) -> BoxFuture<'static, Result<Session, SessionError>>;
}

// =============================================================================
// Static Token Verifier
// =============================================================================

/// Verifier backed by a fixed token table.
///
/// The table is parsed from `token=user_id[:name[:email]]` entries separated
/// by commas, e.g. `SESSION_TOKENS="dev-token=alice:Alice:alice@example.com"`.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, UserIdentity>,
}

impl StaticTokenVerifier {
    /// Creates an empty verifier that rejects every token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new verifier that also accepts `token` for `identity`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, identity: UserIdentity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }

    /// Returns the number of known tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if no tokens are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Error parsing a static token table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid session token entry '{0}'. Expected 'token=user_id[:name[:email]]'")]
pub struct TokenTableError(pub String);

impl FromStr for StaticTokenVerifier {
    type Err = TokenTableError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .try_fold(Self::new(), |verifier, entry| {
                let (token, identity) = entry
                    .split_once('=')
                    .ok_or_else(|| TokenTableError(entry.to_string()))?;

                let mut parts = identity.splitn(3, ':');
                let user_id = parts.next().unwrap_or_default().trim();
                if token.trim().is_empty() || user_id.is_empty() {
                    return Err(TokenTableError(entry.to_string()));
                }

                let mut identity = UserIdentity::new(user_id);
                if let Some(name) = parts.next().filter(|name| !name.is_empty()) {
                    identity = identity.with_display_name(name);
                }
                if let Some(email) = parts.next().filter(|email| !email.is_empty()) {
                    identity = identity.with_email(email);
                }

                Ok(verifier.with_token(token.trim(), identity))
            })
    }
}

impl SessionVerifier for StaticTokenVerifier {
    fn verify(
        &self,
        credentials: Option<Credentials>,
    ) -> BoxFuture<'static, Result<Session, SessionError>> {
        let session = credentials
            .and_then(|credentials| self.tokens.get(credentials.token()).cloned())
            .map_or(Session::Anonymous, Session::Authenticated);

        Box::pin(futures::future::ready(Ok(session)))
    }
}

// =============================================================================
// PostgreSQL Session Verifier
// =============================================================================

/// Verifier that reads the identity provider's tables.
///
/// Expected provider schema (read-only):
///
/// ```sql
/// CREATE TABLE "user" (id TEXT PRIMARY KEY, name TEXT, email TEXT);
/// CREATE TABLE session (
///     token TEXT UNIQUE NOT NULL,
///     "userId" TEXT NOT NULL REFERENCES "user"(id),
///     "expiresAt" TIMESTAMPTZ NOT NULL
/// );
/// ```
#[derive(Debug, Clone)]
pub struct PostgresSessionVerifier {
    pool: PgPool,
}

impl PostgresSessionVerifier {
    /// Creates a verifier over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SessionVerifier for PostgresSessionVerifier {
    fn verify(
        &self,
        credentials: Option<Credentials>,
    ) -> BoxFuture<'static, Result<Session, SessionError>> {
        let pool = self.pool.clone();

        Box::pin(async move {
            let Some(credentials) = credentials else {
                return Ok(Session::Anonymous);
            };

            let row: Option<(String, Option<String>, Option<String>)> = sqlx::query_as(
                "SELECT u.id, u.name, u.email FROM session s \
                 JOIN \"user\" u ON u.id = s.\"userId\" \
                 WHERE s.token = $1 AND s.\"expiresAt\" > NOW()",
            )
            .bind(credentials.token())
            .fetch_optional(&pool)
            .await
            .map_err(|error| SessionError::Unavailable(error.to_string()))?;

            Ok(row.map_or(Session::Anonymous, |(user_id, name, email)| {
                Session::Authenticated(UserIdentity {
                    user_id: user_id.into(),
                    display_name: name,
                    email,
                })
            }))
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
