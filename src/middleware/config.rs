use axum_extra::extract::cookie::Key;
use time::Duration;

use super::error::AuthError;

/// Name of the admin session cookie.
pub const SESSION_COOKIE_NAME: &str = "__admin_session";

/// Shared auth settings used by both config and runtime state.
#[derive(Clone)]
pub(crate) struct AuthSettings {
    pub(crate) cookie_key: Key,
    pub(crate) session_cookie_name: String,
    pub(crate) session_ttl: Duration,
    pub(crate) secure_cookies: bool,
    pub(crate) auth_path: String,
}

impl AuthSettings {
    fn defaults() -> Self {
        Self {
            cookie_key: Key::generate(),
            session_cookie_name: SESSION_COOKIE_NAME.into(),
            session_ttl: Duration::hours(24),
            secure_cookies: true,
            auth_path: String::new(),
        }
    }
}

/// Admin session configuration.
///
/// Use [`from_env()`](AuthConfig::from_env) for convention-based setup,
/// or [`new()`](AuthConfig::new) with `with_*` methods for full control.
pub struct AuthConfig {
    pub(super) settings: AuthSettings,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    /// Create config with defaults: 24h sessions, secure cookies, routes
    /// mounted at the root, ephemeral cookie key.
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: AuthSettings::defaults(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Optional env vars
    /// - `COOKIE_KEY`: Cookie encryption key bytes (at least 64)
    /// - `DEV_AUTH`: Set to `"1"` or `"true"` to drop the `Secure` cookie attribute
    /// - `SESSION_TTL_HOURS`: Session lifetime in hours
    /// - `AUTH_PATH`: Prefix for the login, status and logout routes
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if a variable is set but invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        let dev_auth = matches!(
            std::env::var("DEV_AUTH").as_deref(),
            Ok("1") | Ok("true"),
        );

        let cookie_key = match std::env::var("COOKIE_KEY") {
            Ok(k) => Key::try_from(k.as_bytes()).map_err(|_| {
                AuthError::Config(
                    "COOKIE_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key."
                        .into(),
                )
            })?,
            Err(_) => {
                tracing::warn!("COOKIE_KEY not set, sessions will not survive a restart");
                Key::generate()
            }
        };

        let mut config = Self::new()
            .with_cookie_key(cookie_key)
            .with_secure_cookies(!dev_auth);

        if let Ok(hours) = std::env::var("SESSION_TTL_HOURS") {
            let hours: i64 = hours
                .parse()
                .ok()
                .filter(|h| *h > 0)
                .ok_or_else(|| {
                    AuthError::Config(format!(
                        "SESSION_TTL_HOURS: expected a positive integer, got {hours:?}"
                    ))
                })?;
            config = config.with_session_ttl(Duration::hours(hours));
        }
        if let Ok(path) = std::env::var("AUTH_PATH") {
            config = config.with_auth_path(path);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.settings.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.settings.session_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    /// Route prefix, e.g. `"/api/admin"`. A trailing slash is dropped and a
    /// missing leading slash is added.
    #[must_use]
    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = path.trim_matches('/');
        self.settings.auth_path = if path.is_empty() {
            String::new()
        } else {
            format!("/{path}")
        };
        self
    }

    #[must_use]
    pub fn session_cookie_name(&self) -> &str {
        &self.settings.session_cookie_name
    }

    #[must_use]
    pub fn auth_path(&self) -> &str {
        &self.settings.auth_path
    }
}
