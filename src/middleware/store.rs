use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use time::OffsetDateTime;
use tokio::task::JoinHandle;

use super::traits::{BoxError, SessionStore};
use super::types::{NewSession, SessionRecord};
use crate::token::generate_session_id;
use crate::types::SessionId;

/// In-process session store.
///
/// Suitable for a single server instance. Records are kept until logout or
/// until [`purge_expired`](Self::purge_expired) drops them.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Raw lookup, ignoring expiry.
    #[must_use]
    pub fn get(&self, session_id: &SessionId) -> Option<SessionRecord> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Insert a fully formed record.
    pub fn insert(&self, record: SessionRecord) {
        self.sessions
            .write()
            .insert(record.session_id.clone(), record);
    }

    /// Drop every record that expired before `now`. Returns how many were removed.
    pub fn purge_expired(&self, now: OffsetDateTime) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, record| record.is_live_at(now));
        before - sessions.len()
    }
}

impl SessionStore for MemorySessionStore {
    async fn create(&self, session: NewSession) -> Result<SessionRecord, BoxError> {
        let record = SessionRecord {
            session_id: generate_session_id(),
            principal: session.principal,
            created_at: OffsetDateTime::now_utc(),
            expires_at: session.expires_at,
            user_agent: session.user_agent,
            ip_address: session.ip_address,
        };
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&record.session_id) {
            return Err("session id collision".into());
        }
        sessions.insert(record.session_id.clone(), record.clone());
        Ok(record)
    }

    async fn find(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, BoxError> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .sessions
            .read()
            .get(session_id)
            .filter(|record| record.is_live_at(now))
            .cloned())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), BoxError> {
        self.sessions.write().remove(session_id);
        Ok(())
    }
}

/// Shortest period [`spawn_expiry_sweep`] will run at.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Periodically purge expired sessions from `store`.
///
/// `every` is raised to [`MIN_SWEEP_INTERVAL`] if shorter. The task runs
/// until the returned handle is aborted.
pub fn spawn_expiry_sweep(store: Arc<MemorySessionStore>, every: Duration) -> JoinHandle<()> {
    let every = every.max(MIN_SWEEP_INTERVAL);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = store.purge_expired(OffsetDateTime::now_utc());
            if removed > 0 {
                tracing::debug!(removed, remaining = store.len(), "Purged expired sessions");
            }
        }
    })
}
