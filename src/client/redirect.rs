use super::machine::{AuthEvent, AuthListener, Cause, SessionState};
use super::traits::Navigator;

/// Sends the user to the login view when the session is lost on a
/// protected view.
///
/// Fires at most once per unauthenticated episode: after a redirect, further
/// `Unauthenticated` events are ignored until the session is `Authenticated`
/// again. Never fires when the current view is the login view itself.
pub struct RedirectToLogin<N> {
    navigator: N,
    login_path: String,
    protected_prefix: String,
    armed: bool,
}

impl<N: Navigator> RedirectToLogin<N> {
    /// Protect everything under `/admin`, redirecting to `/admin/login`.
    pub fn new(navigator: N) -> Self {
        Self {
            navigator,
            login_path: "/admin/login".into(),
            protected_prefix: "/admin".into(),
            armed: true,
        }
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    #[must_use]
    pub fn with_protected_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.protected_prefix = prefix.into();
        self
    }

    fn is_protected(&self, path: &str) -> bool {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let under = |base: &str| {
            path == base
                || path
                    .strip_prefix(base)
                    .is_some_and(|rest| rest.starts_with('/'))
        };
        under(&self.protected_prefix) && !under(&self.login_path)
    }
}

impl<N: Navigator> AuthListener for RedirectToLogin<N> {
    fn on_transition(&mut self, event: &AuthEvent) {
        if event.to == SessionState::Authenticated {
            self.armed = true;
            return;
        }
        if event.to != SessionState::Unauthenticated || !self.armed {
            return;
        }
        let current = self.navigator.current_path();
        if !self.is_protected(&current) {
            return;
        }
        self.armed = false;
        tracing::info!(
            from = %current,
            transport_failure = event.cause == Cause::TransportFailure,
            "Session lost on protected view, redirecting to login"
        );
        self.navigator.navigate(&self.login_path);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Clone, Default)]
    struct FakeNav {
        path: Arc<Mutex<String>>,
        visits: Arc<Mutex<Vec<String>>>,
    }

    impl FakeNav {
        fn at(path: &str) -> Self {
            let nav = Self::default();
            *nav.path.lock() = path.to_string();
            nav
        }
    }

    impl Navigator for FakeNav {
        fn current_path(&self) -> String {
            self.path.lock().clone()
        }

        fn navigate(&mut self, path: &str) {
            *self.path.lock() = path.to_string();
            self.visits.lock().push(path.to_string());
        }
    }

    fn lost(seq: u64) -> AuthEvent {
        AuthEvent {
            from: SessionState::Checking,
            to: SessionState::Unauthenticated,
            cause: Cause::Rejected,
            seq,
        }
    }

    #[test]
    fn redirects_from_protected_view() {
        let nav = FakeNav::at("/admin/products");
        let mut redirect = RedirectToLogin::new(nav.clone());
        redirect.on_transition(&lost(1));
        assert_eq!(*nav.visits.lock(), vec!["/admin/login".to_string()]);
    }

    #[test]
    fn duplicate_event_redirects_once() {
        let nav = FakeNav::at("/admin/orders");
        let mut redirect = RedirectToLogin::new(nav.clone());
        redirect.on_transition(&lost(3));
        *nav.path.lock() = "/admin/orders".into();
        redirect.on_transition(&lost(3));
        assert_eq!(nav.visits.lock().len(), 1);
    }

    #[test]
    fn repeated_failures_redirect_once_per_episode() {
        let nav = FakeNav::at("/admin/orders");
        let mut redirect = RedirectToLogin::new(nav.clone());
        for seq in 1..=3 {
            *nav.path.lock() = "/admin/orders".into();
            redirect.on_transition(&lost(seq));
        }
        assert_eq!(*nav.visits.lock(), vec!["/admin/login".to_string()]);
    }

    #[test]
    fn authenticated_rearms_redirect() {
        let nav = FakeNav::at("/admin/orders");
        let mut redirect = RedirectToLogin::new(nav.clone());
        redirect.on_transition(&lost(1));

        *nav.path.lock() = "/admin/orders".into();
        redirect.on_transition(&AuthEvent {
            from: SessionState::Checking,
            to: SessionState::Authenticated,
            cause: Cause::Confirmed,
            seq: 2,
        });
        redirect.on_transition(&lost(3));
        assert_eq!(nav.visits.lock().len(), 2);
    }

    #[test]
    fn login_view_never_redirects() {
        let nav = FakeNav::at("/admin/login?next=%2Fadmin");
        let mut redirect = RedirectToLogin::new(nav.clone());
        redirect.on_transition(&lost(1));
        redirect.on_transition(&lost(2));
        assert!(nav.visits.lock().is_empty());
    }

    #[test]
    fn public_views_ignored() {
        let nav = FakeNav::at("/products/42");
        let mut redirect = RedirectToLogin::new(nav.clone());
        redirect.on_transition(&lost(1));
        let nav2 = FakeNav::at("/administrator");
        let mut redirect2 = RedirectToLogin::new(nav2.clone());
        redirect2.on_transition(&lost(1));
        assert!(nav.visits.lock().is_empty());
        assert!(nav2.visits.lock().is_empty());
    }

    #[test]
    fn authenticated_events_ignored() {
        let nav = FakeNav::at("/admin");
        let mut redirect = RedirectToLogin::new(nav.clone());
        redirect.on_transition(&AuthEvent {
            from: SessionState::Checking,
            to: SessionState::Authenticated,
            cause: Cause::Confirmed,
            seq: 1,
        });
        assert!(nav.visits.lock().is_empty());
    }

    #[test]
    fn custom_paths() {
        let nav = FakeNav::at("/backoffice/users");
        let mut redirect = RedirectToLogin::new(nav.clone())
            .with_protected_prefix("/backoffice")
            .with_login_path("/signin");
        redirect.on_transition(&lost(1));
        assert_eq!(*nav.visits.lock(), vec!["/signin".to_string()]);
    }
}
