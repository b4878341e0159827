use std::sync::Arc;

use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};

use super::machine::{AuthMachine, AuthSnapshot, SessionState, Trigger};
use super::traits::{AuthTransport, FallbackStore};
use crate::error::Error;
use crate::types::LoginRequest;

/// Drives an [`AuthMachine`] against the server.
///
/// Clones share the machine, so mount, focus and manual refetches issued
/// from different places can overlap; the machine's sequencing decides
/// which response sticks. Listeners are notified after the machine lock is
/// released.
pub struct SessionMonitor<T, F> {
    machine: Arc<Mutex<AuthMachine<F>>>,
    transport: Arc<T>,
    max_age: Duration,
}

impl<T, F> Clone for SessionMonitor<T, F> {
    fn clone(&self) -> Self {
        Self {
            machine: self.machine.clone(),
            transport: self.transport.clone(),
            max_age: self.max_age,
        }
    }
}

impl<T: AuthTransport, F: FallbackStore> SessionMonitor<T, F> {
    pub fn new(transport: T, mut machine: AuthMachine<F>) -> Self {
        machine.defer_events();
        Self {
            machine: Arc::new(Mutex::new(machine)),
            transport: Arc::new(transport),
            max_age: Duration::minutes(5),
        }
    }

    /// How old a snapshot may get before [`tick`](Self::tick) re-checks.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.machine.lock().state()
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.machine.lock().snapshot().clone()
    }

    /// Run `f` on the machine, then notify listeners without the lock held.
    fn update<R>(&self, f: impl FnOnce(&mut AuthMachine<F>) -> R) -> R {
        let (out, pending) = {
            let mut machine = self.machine.lock();
            let out = f(&mut machine);
            (out, machine.take_events())
        };
        pending.deliver();
        out
    }

    /// Run one status check and return the state afterwards.
    pub async fn check(&self, trigger: Trigger) -> SessionState {
        let ticket = self.update(|m| m.begin_check(trigger));
        let result = self.transport.check_status(ticket.bearer()).await;

        self.update(|m| {
            m.complete_check(ticket, result, OffsetDateTime::now_utc());
            m.state()
        })
    }

    pub async fn mount(&self) -> SessionState {
        self.check(Trigger::Mount).await
    }

    pub async fn focus(&self) -> SessionState {
        self.check(Trigger::Focus).await
    }

    pub async fn refetch(&self) -> SessionState {
        self.check(Trigger::Manual).await
    }

    /// Re-check if the snapshot is older than the max age.
    pub async fn tick(&self) -> Option<SessionState> {
        let stale = self
            .machine
            .lock()
            .is_stale(OffsetDateTime::now_utc(), self.max_age);
        if stale {
            Some(self.check(Trigger::Stale).await)
        } else {
            None
        }
    }

    /// Log in, cache the issued id, then re-verify immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] for a rejected login, or a
    /// transport error. The state is left untouched in both cases.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionState, Error> {
        let response = self
            .transport
            .login(&LoginRequest::new(username, password))
            .await?;
        self.update(|m| m.record_login(&response));
        Ok(self.refetch().await)
    }

    /// Log out on the server and purge local state.
    ///
    /// The local purge happens even when the request fails.
    ///
    /// # Errors
    ///
    /// Returns the transport error, after the local state was reset.
    pub async fn logout(&self) -> Result<(), Error> {
        let bearer = self.machine.lock().cached_session_id();
        let result = self.transport.logout(bearer.as_ref()).await;
        self.update(AuthMachine::record_logout);

        match result {
            Ok(response) if response.success => Ok(()),
            Ok(_) => Err(Error::Status {
                operation: "logout",
                status: 200,
                detail: "server reported failure".into(),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Logout request failed, local session purged anyway");
                Err(e)
            }
        }
    }
}
