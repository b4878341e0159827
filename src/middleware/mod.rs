//! Admin session authentication for Axum.
//!
//! Sessions are issued at login, carried by an encrypted `HttpOnly` cookie,
//! and echoed in the login body so clients that lose the cookie can fall
//! back to `Authorization: Bearer <sessionId>`. The cookie wins whenever it
//! resolves.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use admin_session::middleware::{Argon2Verifier, AuthConfig, AuthService, MemorySessionStore};
//!
//! let verifier = Argon2Verifier::new()?.with_account("admin", "admin123")?;
//! let service = AuthService::new(AuthConfig::from_env()?, verifier, MemorySessionStore::new());
//!
//! let app = axum::Router::new()
//!     .merge(service.routes())
//!     .merge(service.protect(admin_api));
//! ```

mod config;
mod cookies;
mod error;
mod extractor;
mod routes;
mod state;
mod store;
mod traits;
mod types;
mod verifier;

pub use config::{AuthConfig, SESSION_COOKIE_NAME};
pub use error::AuthError;
pub use extractor::{AdminSession, SessionChannel, resolve_session};
pub use routes::{AuthService, auth_routes};
pub use store::{MIN_SWEEP_INTERVAL, MemorySessionStore, spawn_expiry_sweep};
pub use traits::{BoxError, CredentialVerifier, SessionStore};
pub use types::{NewSession, SessionRecord};
pub use verifier::Argon2Verifier;

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
