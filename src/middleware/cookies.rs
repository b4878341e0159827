use axum_extra::extract::cookie::{Cookie, SameSite};
use time::OffsetDateTime;

/// Create the session cookie. Its expiry mirrors the record's `expires_at`.
pub(super) fn session_cookie(
    name: &str,
    session_id: &str,
    expires_at: OffsetDateTime,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name.to_string(), session_id.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .expires(expires_at)
        .build()
}

/// Create removal cookie for session.
pub(super) fn clear_session_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .path("/".to_string())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_attributes() {
        let expires_at = time::macros::datetime!(2030-01-01 00:00 UTC);
        let cookie = session_cookie("sid", "abc", expires_at, true);

        assert_eq!(cookie.name(), "sid");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.expires_datetime(), Some(expires_at));
    }

    #[test]
    fn insecure_cookie_for_dev() {
        let expires_at = time::macros::datetime!(2030-01-01 00:00 UTC);
        let cookie = session_cookie("sid", "abc", expires_at, false);
        assert_eq!(cookie.secure(), Some(false));
    }
}
