use reqwest::StatusCode;
use url::Url;

use super::traits::AuthTransport;
use crate::error::Error;
use crate::types::{AuthStatus, LoginRequest, LoginResponse, LogoutResponse, SessionId};

/// HTTP client for the admin auth endpoints.
///
/// Keeps a cookie jar so the session cookie round-trips; the cached session
/// id is additionally sent as a bearer token when one is passed in.
#[derive(Clone)]
pub struct AdminClient {
    base_url: Url,
    auth_path: String,
    http: reqwest::Client,
}

impl AdminClient {
    /// Create a client with its own cookie store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: Url) -> Result<Self, Error> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            base_url,
            auth_path: String::new(),
            http,
        })
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Route prefix the server was configured with.
    #[must_use]
    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.auth_path = path.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, name: &str) -> Url {
        let mut url = self.base_url.clone();
        let base = self.base_url.path().trim_end_matches('/');
        url.set_path(&format!("{base}{}/{name}", self.auth_path));
        url
    }

    fn with_bearer(
        request: reqwest::RequestBuilder,
        bearer: Option<&SessionId>,
    ) -> reqwest::RequestBuilder {
        match bearer {
            Some(id) => request.bearer_auth(id.as_str()),
            None => request,
        }
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Status {
            operation,
            status,
            detail: body,
        })
    }
}

impl AuthTransport for AdminClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, Error> {
        let response = self
            .http
            .post(self.endpoint("login"))
            .json(request)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::InvalidCredentials);
        }
        let response = Self::ensure_success(response, "login").await?;
        response.json::<LoginResponse>().await.map_err(Into::into)
    }

    async fn check_status(&self, bearer: Option<&SessionId>) -> Result<AuthStatus, Error> {
        let request = Self::with_bearer(self.http.get(self.endpoint("auth-status")), bearer);
        let response = request.send().await?;

        let response = Self::ensure_success(response, "auth status").await?;
        response.json::<AuthStatus>().await.map_err(Into::into)
    }

    async fn logout(&self, bearer: Option<&SessionId>) -> Result<LogoutResponse, Error> {
        let request = Self::with_bearer(self.http.post(self.endpoint("logout")), bearer);
        let response = request.send().await?;

        let response = Self::ensure_success(response, "logout").await?;
        response.json::<LogoutResponse>().await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> AdminClient {
        AdminClient::new(base.parse().unwrap()).unwrap()
    }

    #[test]
    fn endpoints_at_root() {
        let c = client("http://localhost:3000");
        assert_eq!(c.endpoint("login").as_str(), "http://localhost:3000/login");
        assert_eq!(
            c.endpoint("auth-status").as_str(),
            "http://localhost:3000/auth-status"
        );
    }

    #[test]
    fn endpoints_with_prefix() {
        let c = client("https://shop.example.com/").with_auth_path("/api/admin/");
        assert_eq!(
            c.endpoint("logout").as_str(),
            "https://shop.example.com/api/admin/logout"
        );
    }

    #[test]
    fn endpoints_keep_base_path() {
        let c = client("https://shop.example.com/store/");
        assert_eq!(
            c.endpoint("login").as_str(),
            "https://shop.example.com/store/login"
        );
    }
}
