use time::OffsetDateTime;

use crate::types::{Principal, SessionId};

/// Session data from a successful credential check.
///
/// Passed to [`SessionStore::create`](super::SessionStore::create), which
/// assigns the identifier.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// Authenticated admin account.
    pub principal: Principal,
    /// Expiry chosen by the issuer from the configured TTL.
    pub expires_at: OffsetDateTime,
    /// Client `User-Agent` header value.
    pub user_agent: Option<String>,
    /// Client IP address.
    pub ip_address: Option<String>,
}

/// A stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub principal: Principal,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl SessionRecord {
    /// A record is live until the current time passes `expires_at`.
    #[must_use]
    pub fn is_live_at(&self, now: OffsetDateTime) -> bool {
        now <= self.expires_at
    }
}
