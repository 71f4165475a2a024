//! User identity as reported by the session verifier.
//!
//! Users are owned by the identity provider; this crate only reads them.

use serde::{Deserialize, Serialize};

use super::OwnerId;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Opaque user identifier; becomes the owner of created tasks.
    pub user_id: OwnerId,
    /// Display name, if the provider has one.
    pub display_name: Option<String>,
    /// E-mail address, if the provider has one.
    pub email: Option<String>,
}

impl UserIdentity {
    /// Creates an identity with only a user id.
    #[must_use]
    pub fn new(user_id: impl Into<OwnerId>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            email: None,
        }
    }

    /// Returns a new identity with the given display name.
    #[must_use]
    pub fn with_display_name(self, display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            ..self
        }
    }

    /// Returns a new identity with the given e-mail address.
    #[must_use]
    pub fn with_email(self, email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..self
        }
    }
}

impl From<String> for OwnerId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
