use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::PrivateCookieJar;
use time::OffsetDateTime;

use super::error::AuthError;
use super::state::AuthState;
use super::traits::{CredentialVerifier, SessionStore};
use super::types::SessionRecord;
use crate::types::{Principal, SessionId};

/// Which transport carried the session id that resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChannel {
    Cookie,
    Bearer,
}

/// Authenticated admin attached to requests behind
/// [`AuthService::protect`](super::AuthService::protect).
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(admin: AdminSession) -> impl IntoResponse {
///     format!("Hello, {}", admin.principal)
/// }
///
/// // Optional: accessible to both admins and anonymous callers
/// async fn landing(admin: Option<AdminSession>) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub session_id: SessionId,
    pub principal: Principal,
    pub expires_at: OffsetDateTime,
    pub channel: SessionChannel,
}

impl<S: Send + Sync> FromRequestParts<S> for AdminSession {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminSession>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for AdminSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AdminSession>().cloned())
    }
}

/// Read the session id from `Authorization: Bearer <id>`.
pub(super) fn bearer_session_id(headers: &HeaderMap) -> Option<SessionId> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| SessionId(token.to_string()))
}

/// Read the session id from the private session cookie.
pub(super) fn cookie_session_id(jar: &PrivateCookieJar, cookie_name: &str) -> Option<SessionId> {
    jar.get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .map(SessionId)
}

/// Resolve the current admin session, cookie first, bearer fallback second.
///
/// A cookie that does not resolve to a live record does not block the bearer
/// channel. Unknown and expired ids both yield `Ok(None)`.
///
/// # Errors
///
/// Returns [`AuthError::Store`] if the session store fails.
pub async fn resolve_session<S: SessionStore>(
    session_store: &S,
    jar: &PrivateCookieJar,
    headers: &HeaderMap,
    cookie_name: &str,
) -> Result<Option<AdminSession>, AuthError> {
    let candidates = [
        (cookie_session_id(jar, cookie_name), SessionChannel::Cookie),
        (bearer_session_id(headers), SessionChannel::Bearer),
    ];

    for (session_id, channel) in candidates {
        let Some(session_id) = session_id else {
            continue;
        };
        let found = session_store
            .find(&session_id)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        match found {
            Some(record) => return Ok(Some(AdminSession::from_record(record, channel))),
            None => {
                tracing::debug!(
                    session = session_id.log_prefix(),
                    ?channel,
                    "Session id did not resolve"
                );
            }
        }
    }

    Ok(None)
}

impl AdminSession {
    fn from_record(record: SessionRecord, channel: SessionChannel) -> Self {
        Self {
            session_id: record.session_id,
            principal: record.principal,
            expires_at: record.expires_at,
            channel,
        }
    }
}

/// Middleware guarding admin routes: rejects with `401` unless a session
/// resolves, otherwise stores an [`AdminSession`] in request extensions.
pub(super) async fn require_session<V: CredentialVerifier, S: SessionStore>(
    State(state): State<AuthState<V, S>>,
    mut req: Request,
    next: Next,
) -> Response {
    let jar = PrivateCookieJar::from_headers(req.headers(), state.settings.cookie_key.clone());

    let resolved = resolve_session(
        state.session_store.as_ref(),
        &jar,
        req.headers(),
        &state.settings.session_cookie_name,
    )
    .await;

    match resolved {
        Ok(Some(session)) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        Ok(None) => AuthError::Unauthenticated.into_response(),
        Err(e) => e.into_response(),
    }
}
