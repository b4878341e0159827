use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, header::USER_AGENT};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::PrivateCookieJar;
use time::OffsetDateTime;

use super::config::AuthConfig;
use super::cookies;
use super::error::AuthError;
use super::extractor::{bearer_session_id, cookie_session_id, require_session, resolve_session};
use super::state::AuthState;
use super::traits::{CredentialVerifier, SessionStore};
use super::types::NewSession;
use crate::types::{AuthStatus, LoginRequest, LoginResponse, LogoutResponse};

/// Admin session service: owns the shared state behind the auth routes and
/// the guard layer for protected admin routes.
pub struct AuthService<V, S> {
    state: AuthState<V, S>,
}

impl<V: CredentialVerifier, S: SessionStore> AuthService<V, S> {
    #[must_use]
    pub fn new(config: AuthConfig, verifier: V, session_store: S) -> Self {
        Self::from_shared(config, Arc::new(verifier), Arc::new(session_store))
    }

    /// Build from already shared collaborators, e.g. to keep a handle on the
    /// store for an expiry sweep.
    #[must_use]
    pub fn from_shared(config: AuthConfig, verifier: Arc<V>, session_store: Arc<S>) -> Self {
        Self {
            state: AuthState {
                verifier,
                session_store,
                settings: config.settings,
            },
        }
    }

    /// `POST /login`, `GET /auth-status` and `POST /logout` under the
    /// configured auth path.
    pub fn routes(&self) -> Router {
        let auth_path = &self.state.settings.auth_path;

        Router::new()
            .route(&format!("{auth_path}/login"), post(login::<V, S>))
            .route(&format!("{auth_path}/auth-status"), get(auth_status::<V, S>))
            .route(&format!("{auth_path}/logout"), post(logout::<V, S>))
            .with_state(self.state.clone())
    }

    /// Require a live admin session on every route of `router`.
    pub fn protect(&self, router: Router) -> Router {
        router.layer(axum::middleware::from_fn_with_state(
            self.state.clone(),
            require_session::<V, S>,
        ))
    }
}

/// Create the admin authentication router.
pub fn auth_routes<V, S>(config: AuthConfig, verifier: V, session_store: S) -> Router
where
    V: CredentialVerifier,
    S: SessionStore,
{
    AuthService::new(config, verifier, session_store).routes()
}

// ── Login ──────────────────────────────────────────────────────────

async fn login<V: CredentialVerifier, S: SessionStore>(
    State(state): State<AuthState<V, S>>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<(PrivateCookieJar, Json<LoginResponse>), AuthError> {
    let principal = state
        .verifier
        .verify(&body.username, &body.password)
        .await
        .map_err(|e| AuthError::Verifier(e.to_string()))?;

    let Some(principal) = principal else {
        tracing::info!(username = %body.username, "Admin login rejected");
        return Err(AuthError::InvalidCredentials);
    };

    let session = NewSession {
        principal,
        expires_at: OffsetDateTime::now_utc() + state.settings.session_ttl,
        user_agent: extract_user_agent(&headers),
        ip_address: extract_client_ip(&headers),
    };

    let record = state
        .session_store
        .create(session)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

    let session_cookie = cookies::session_cookie(
        &state.settings.session_cookie_name,
        record.session_id.as_str(),
        record.expires_at,
        state.settings.secure_cookies,
    );

    tracing::info!(
        principal = %record.principal,
        session = record.session_id.log_prefix(),
        "Admin login successful"
    );

    let body = LoginResponse {
        session_id: record.session_id,
        expires_at: record.expires_at,
    };

    Ok((jar.add(session_cookie), Json(body)))
}

// ── Status ─────────────────────────────────────────────────────────

async fn auth_status<V: CredentialVerifier, S: SessionStore>(
    State(state): State<AuthState<V, S>>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
) -> Json<AuthStatus> {
    let resolved = resolve_session(
        state.session_store.as_ref(),
        &jar,
        &headers,
        &state.settings.session_cookie_name,
    )
    .await;

    match resolved {
        Ok(Some(session)) => Json(AuthStatus::authenticated(session.principal)),
        Ok(None) => Json(AuthStatus::unauthenticated()),
        Err(e) => {
            tracing::error!(error = %e, "Session lookup failed during status check");
            Json(AuthStatus::unauthenticated())
        }
    }
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout<V: CredentialVerifier, S: SessionStore>(
    State(state): State<AuthState<V, S>>,
    jar: PrivateCookieJar,
    headers: HeaderMap,
) -> (PrivateCookieJar, Json<LogoutResponse>) {
    // Same precedence as the status check, so the session reported there is
    // the one that goes away.
    let resolved = resolve_session(
        state.session_store.as_ref(),
        &jar,
        &headers,
        &state.settings.session_cookie_name,
    )
    .await;

    let session_id = match resolved {
        Ok(session) => session.map(|s| s.session_id),
        Err(e) => {
            tracing::warn!(error = %e, "Session lookup failed during logout");
            cookie_session_id(&jar, &state.settings.session_cookie_name)
                .or_else(|| bearer_session_id(&headers))
        }
    };

    if let Some(session_id) = session_id {
        match state.session_store.delete(&session_id).await {
            Ok(()) => tracing::info!(session = session_id.log_prefix(), "Admin logged out"),
            Err(e) => tracing::warn!(error = %e, "Session deletion failed during logout"),
        }
    }

    let clear_cookie = cookies::clear_session_cookie(&state.settings.session_cookie_name);
    (jar.remove(clear_cookie), Json(LogoutResponse { success: true }))
}

// ── Helpers ────────────────────────────────────────────────────────

fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}
