use std::future::Future;

use crate::error::Error;
use crate::types::{AuthStatus, LoginRequest, LoginResponse, LogoutResponse, SessionId};

/// Calls to the admin auth endpoints.
///
/// The cookie channel is the transport's business (e.g. a cookie jar); the
/// bearer fallback is passed in explicitly from the client's cache.
pub trait AuthTransport: Send + Sync + 'static {
    /// `POST /login`. A rejected login is [`Error::InvalidCredentials`].
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<LoginResponse, Error>> + Send;

    /// `GET /auth-status`. Any error is a transport failure.
    fn check_status(
        &self,
        bearer: Option<&SessionId>,
    ) -> impl Future<Output = Result<AuthStatus, Error>> + Send;

    /// `POST /logout`.
    fn logout(
        &self,
        bearer: Option<&SessionId>,
    ) -> impl Future<Output = Result<LogoutResponse, Error>> + Send;
}

/// Persisted copy of the last issued session id (survives reloads).
pub trait FallbackStore: Send {
    fn load(&self) -> Result<Option<SessionId>, Error>;
    fn save(&mut self, session_id: &SessionId) -> Result<(), Error>;
    fn clear(&mut self) -> Result<(), Error>;
}

/// Current view and navigation, injected so redirects are testable.
pub trait Navigator: Send {
    fn current_path(&self) -> String;
    fn navigate(&mut self, path: &str);
}
