//! Session gate for role-based dashboards.
//!
//! Tokens are issued and verified by the backend. The client only checks that
//! one is present and that the stored user type matches the dashboard.

use std::fmt;
use std::str::FromStr;

/// Dashboard roles known to the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Platform administrator.
    Admin,
    /// Organization running events.
    Organization,
    /// Individual volunteer.
    Volunteer,
}

impl Role {
    /// Value stored as `user_type` after login.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Organization => "organization",
            Self::Volunteer => "volunteer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SessionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "admin" => Ok(Self::Admin),
            "organization" => Ok(Self::Organization),
            "volunteer" => Ok(Self::Volunteer),
            other => Err(SessionError::UnknownRole {
                user_type: other.to_owned(),
            }),
        }
    }
}

/// Reasons a session cannot open a dashboard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No bearer token is stored.
    #[error("no session token; log in first")]
    MissingToken,
    /// Stored user type is not a known role.
    #[error("unknown user type `{user_type}`")]
    UnknownRole {
        /// Raw stored value.
        user_type: String,
    },
    /// Stored role differs from the one the dashboard needs.
    #[error("dashboard requires role {expected}, session has {}", .actual.map_or("none", Role::as_str))]
    RoleMismatch {
        /// Role the dashboard needs.
        expected: Role,
        /// Role found in the session, if any.
        actual: Option<Role>,
    },
}

/// Raw values persisted by the login flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    /// Bearer token.
    pub token: Option<String>,
    /// Stored user type (`admin`, `organization`, `volunteer`).
    pub user_type: Option<String>,
    /// Stored user identifier.
    pub user_id: Option<String>,
}

impl SessionCredentials {
    /// Check token presence and role.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingToken`] for an absent or blank token,
    /// [`SessionError::UnknownRole`] for an unrecognised user type and
    /// [`SessionError::RoleMismatch`] when the role differs from `expected`.
    ///
    /// # Examples
    ///
    /// ```
    /// use vconnect_client::domain::{Role, SessionCredentials, SessionError};
    ///
    /// let credentials = SessionCredentials {
    ///     token: Some("abc".into()),
    ///     user_type: Some("organization".into()),
    ///     user_id: Some("4".into()),
    /// };
    /// let session = credentials.require_role(Role::Organization)?;
    /// assert_eq!(session.bearer_token(), "abc");
    /// # Ok::<(), SessionError>(())
    /// ```
    pub fn require_role(&self, expected: Role) -> Result<AuthorizedSession, SessionError> {
        let token = self
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::MissingToken)?;
        let actual = self
            .user_type
            .as_deref()
            .filter(|user_type| !user_type.trim().is_empty())
            .map(Role::from_str)
            .transpose()?;
        if actual != Some(expected) {
            return Err(SessionError::RoleMismatch { expected, actual });
        }
        Ok(AuthorizedSession {
            token: token.to_owned(),
            role: expected,
            user_id: self.user_id.clone(),
        })
    }
}

/// Session that passed the presence and role checks.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizedSession {
    token: String,
    role: Role,
    user_id: Option<String>,
}

impl AuthorizedSession {
    /// Token for the `Authorization: Bearer` header.
    pub fn bearer_token(&self) -> &str {
        &self.token
    }

    /// Role the session was authorized for.
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Stored user identifier, if any.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

impl fmt::Debug for AuthorizedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizedSession")
            .field("token", &"<redacted>")
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .finish()
    }
}
