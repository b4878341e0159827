use std::sync::Arc;

use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};

use super::traits::FallbackStore;
use crate::error::Error;
use crate::types::{AuthStatus, LoginResponse, Principal, SessionId};

/// Client view of the admin session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unknown,
    Checking,
    Authenticated,
    Unauthenticated,
}

/// What started a status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Mount,
    Focus,
    Manual,
    Stale,
}

/// Why a transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    Check(Trigger),
    Confirmed,
    Rejected,
    TransportFailure,
    Logout,
}

/// Emitted to every listener on each state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    pub from: SessionState,
    pub to: SessionState,
    pub cause: Cause,
    /// Sequence number of the check (or the watermark for logout).
    pub seq: u64,
}

/// Subscriber to [`AuthEvent`]s.
///
/// Behind a [`SessionMonitor`](super::SessionMonitor) listeners run after the
/// machine lock is released, so they may read the monitor's state. They must
/// not subscribe further listeners from inside `on_transition`.
pub trait AuthListener: Send {
    fn on_transition(&mut self, event: &AuthEvent);
}

impl<F: FnMut(&AuthEvent) + Send> AuthListener for F {
    fn on_transition(&mut self, event: &AuthEvent) {
        self(event)
    }
}

/// Last known authentication state. A cache, never an authority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub is_authenticated: bool,
    pub principal: Option<Principal>,
    pub last_checked_at: Option<OffsetDateTime>,
    /// The last check could not reach the server.
    pub verification_failed: bool,
}

/// Handle for one in-flight status check.
#[derive(Debug)]
pub struct CheckTicket {
    seq: u64,
    bearer: Option<SessionId>,
}

impl CheckTicket {
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Fallback id to send as `Authorization: Bearer`.
    #[must_use]
    pub fn bearer(&self) -> Option<&SessionId> {
        self.bearer.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Applied(SessionState),
    /// A newer check, login or logout already superseded this response.
    Stale,
}

type Listeners = Arc<Mutex<Vec<Box<dyn AuthListener>>>>;

/// Client auth state machine.
///
/// Checks are numbered as they start. A response is applied only if its
/// number is above the last applied one, so the final state follows start
/// order, not arrival order. Login and logout move the watermark past every
/// check already started.
pub struct AuthMachine<F> {
    state: SessionState,
    snapshot: AuthSnapshot,
    fallback: F,
    issued: u64,
    applied: u64,
    listeners: Listeners,
    outbox: Vec<AuthEvent>,
    deferred: bool,
}

impl<F: FallbackStore> AuthMachine<F> {
    pub fn new(fallback: F) -> Self {
        Self {
            state: SessionState::Unknown,
            snapshot: AuthSnapshot::default(),
            fallback,
            issued: 0,
            applied: 0,
            listeners: Listeners::default(),
            outbox: Vec::new(),
            deferred: false,
        }
    }

    pub fn subscribe(&mut self, listener: impl AuthListener + 'static) {
        self.listeners.lock().push(Box::new(listener));
    }

    /// Queue events instead of notifying listeners inline. The owner hands
    /// them out with [`take_events`](Self::take_events).
    pub(crate) fn defer_events(&mut self) {
        self.deferred = true;
    }

    /// Queued events plus the listeners to deliver them to.
    pub(crate) fn take_events(&mut self) -> PendingEvents {
        PendingEvents {
            events: std::mem::take(&mut self.outbox),
            listeners: self.listeners.clone(),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn snapshot(&self) -> &AuthSnapshot {
        &self.snapshot
    }

    /// The persisted fallback id, if any. Storage errors read as "none".
    #[must_use]
    pub fn cached_session_id(&self) -> Option<SessionId> {
        self.fallback.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not read fallback session id");
            None
        })
    }

    /// Whether the snapshot is older than `max_age` (or was never taken).
    #[must_use]
    pub fn is_stale(&self, now: OffsetDateTime, max_age: Duration) -> bool {
        self.snapshot
            .last_checked_at
            .is_none_or(|checked| now - checked > max_age)
    }

    /// Enter `Checking` and hand out a numbered ticket for the request.
    pub fn begin_check(&mut self, trigger: Trigger) -> CheckTicket {
        self.issued += 1;
        let seq = self.issued;
        self.transition(SessionState::Checking, Cause::Check(trigger), seq);
        CheckTicket {
            seq,
            bearer: self.cached_session_id(),
        }
    }

    /// Apply a status response, unless something newer already was.
    ///
    /// Transport failures fail closed: the state becomes `Unauthenticated`
    /// with `verification_failed` set.
    pub fn complete_check(
        &mut self,
        ticket: CheckTicket,
        result: Result<AuthStatus, Error>,
        now: OffsetDateTime,
    ) -> CheckOutcome {
        if ticket.seq <= self.applied {
            tracing::debug!(
                seq = ticket.seq,
                applied = self.applied,
                "Discarding stale status response"
            );
            return CheckOutcome::Stale;
        }
        self.applied = ticket.seq;

        let (next, cause) = match result {
            Ok(status) if status.is_authenticated => {
                self.snapshot = AuthSnapshot {
                    is_authenticated: true,
                    principal: status.principal,
                    last_checked_at: Some(now),
                    verification_failed: false,
                };
                (SessionState::Authenticated, Cause::Confirmed)
            }
            Ok(_) => {
                self.reset_snapshot(Some(now), false);
                (SessionState::Unauthenticated, Cause::Rejected)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Auth status check failed, treating as signed out");
                self.reset_snapshot(Some(now), true);
                (SessionState::Unauthenticated, Cause::TransportFailure)
            }
        };

        if next == SessionState::Unauthenticated {
            self.clear_fallback();
        }
        self.transition(next, cause, ticket.seq);
        CheckOutcome::Applied(next)
    }

    /// Cache the session id the server issued at login.
    ///
    /// Checks started before the login are discarded when they return; the
    /// caller is expected to refetch.
    pub fn record_login(&mut self, response: &LoginResponse) {
        self.applied = self.issued;
        if let Err(e) = self.fallback.save(&response.session_id) {
            tracing::warn!(error = %e, "Could not persist fallback session id");
        }
    }

    /// Purge the cache and go to `Unauthenticated` right away, discarding
    /// every in-flight check.
    pub fn record_logout(&mut self) {
        self.applied = self.issued;
        self.clear_fallback();
        let checked = self.snapshot.last_checked_at;
        self.reset_snapshot(checked, false);
        self.transition(SessionState::Unauthenticated, Cause::Logout, self.issued);
    }

    fn reset_snapshot(&mut self, checked: Option<OffsetDateTime>, failed: bool) {
        self.snapshot = AuthSnapshot {
            is_authenticated: false,
            principal: None,
            last_checked_at: checked,
            verification_failed: failed,
        };
    }

    fn clear_fallback(&mut self) {
        if let Err(e) = self.fallback.clear() {
            tracing::warn!(error = %e, "Could not clear fallback session id");
        }
    }

    fn transition(&mut self, to: SessionState, cause: Cause, seq: u64) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        tracing::debug!(?from, ?to, ?cause, seq, "Auth state transition");

        self.outbox.push(AuthEvent {
            from,
            to,
            cause,
            seq,
        });
        if !self.deferred {
            self.take_events().deliver();
        }
    }
}

/// Events taken out of an [`AuthMachine`], delivered once its lock is gone.
#[must_use]
pub(crate) struct PendingEvents {
    events: Vec<AuthEvent>,
    listeners: Listeners,
}

impl PendingEvents {
    pub(crate) fn deliver(self) {
        if self.events.is_empty() {
            return;
        }
        let mut listeners = self.listeners.lock();
        for event in &self.events {
            for listener in listeners.iter_mut() {
                listener.on_transition(event);
            }
        }
    }
}
