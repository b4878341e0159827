use std::future::Future;

use super::types::{NewSession, SessionRecord};
use crate::types::{Principal, SessionId};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Consumer-provided credential check.
///
/// Returns `Ok(Some(principal))` when the secret matches the stored
/// credential, `Ok(None)` otherwise. Implementations must not reveal whether
/// the username exists: the work done for an unknown user has to match the
/// work done for a wrong secret.
///
/// # Example
///
/// ```rust,ignore
/// impl CredentialVerifier for MyAdmins {
///     async fn verify(&self, username: &str, secret: &str) -> Result<Option<Principal>, BoxError> {
///         let hash = self.db.password_hash(username).await?.unwrap_or(self.decoy.clone());
///         Ok(check(&hash, secret).then(|| Principal::from(username.to_string())))
///     }
/// }
/// ```
pub trait CredentialVerifier: Send + Sync + 'static {
    fn verify(
        &self,
        username: &str,
        secret: &str,
    ) -> impl Future<Output = Result<Option<Principal>, BoxError>> + Send;
}

/// Consumer-provided session persistence.
///
/// Implementations must support concurrent reads and writes from many
/// requests; atomicity per record is enough.
///
/// # Example
///
/// ```rust,ignore
/// impl SessionStore for MyAppState {
///     async fn create(&self, session: NewSession) -> Result<SessionRecord, BoxError> {
///         let id = generate_session_id();
///         self.db.insert_session(&id, &session).await
///     }
///
///     async fn find(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, BoxError> {
///         self.db.find_live_session(session_id).await
///     }
///
///     async fn delete(&self, session_id: &SessionId) -> Result<(), BoxError> {
///         self.db.delete_session(session_id).await
///     }
/// }
/// ```
pub trait SessionStore: Send + Sync + 'static {
    /// Create a new session and assign it an unguessable id.
    fn create(
        &self,
        session: NewSession,
    ) -> impl Future<Output = Result<SessionRecord, BoxError>> + Send;

    /// Look up a live session. Expired or unknown ids yield `None`.
    ///
    /// Must not modify the record.
    fn find(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<Option<SessionRecord>, BoxError>> + Send;

    /// Delete a session. Deleting an unknown id is not an error.
    fn delete(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}
