use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Opaque session identifier.
///
/// Issued by the server at login. The client only ever holds a value the
/// server returned; it never constructs one of its own.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First characters of the id, safe to put in logs.
    #[must_use]
    pub fn log_prefix(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

// Session ids are bearer credentials: keep them out of debug output.
impl std::fmt::Debug for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionId({}…)", self.log_prefix())
    }
}

/// Identifier of an authenticated admin account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct Principal(pub String);

impl Principal {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `POST /login` request body.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `POST /login` success body. The session id is echoed so the client can
/// keep it as a fallback bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub session_id: SessionId,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// `GET /auth-status` body. Always returned with `200`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub is_authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
}

impl AuthStatus {
    #[must_use]
    pub fn authenticated(principal: Principal) -> Self {
        Self {
            is_authenticated: true,
            principal: Some(principal),
        }
    }

    #[must_use]
    pub fn unauthenticated() -> Self {
        Self {
            is_authenticated: false,
            principal: None,
        }
    }
}

/// `POST /logout` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
}
