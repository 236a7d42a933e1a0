use crate::config::ServerConfig;
use crate::controller::{Dashboard, EventEnvelope, Outcome, Session, View};
use crate::error::SelectionResult;
use moka::sync::Cache;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Independent per-user sessions over one shared [`Dashboard`].
///
/// Each session sits behind its own lock, so events within a session are
/// applied one at a time while different sessions never contend. Sessions
/// idle past the configured timeout are evicted.
pub struct SessionRegistry {
    dashboard: Arc<Dashboard>,
    sessions: Cache<Uuid, Arc<Mutex<Session>>>,
}

impl SessionRegistry {
    pub fn new(dashboard: Arc<Dashboard>, config: &ServerConfig) -> Self {
        let sessions = Cache::builder()
            .max_capacity(config.max_sessions)
            .time_to_idle(Duration::from_secs(config.session_idle_secs))
            .eviction_listener(|id: Arc<Uuid>, _, cause| {
                debug!(session = %id, ?cause, "Session evicted");
            })
            .build();

        Self { dashboard, sessions }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn create(&self) -> (Uuid, View) {
        let id = Uuid::new_v4();
        let session = Session::new(&self.dashboard);
        let view = session.view(&self.dashboard);
        self.sessions.insert(id, Arc::new(Mutex::new(session)));
        info!(session = %id, "Session created");
        (id, view)
    }

    #[cfg(test)]
    fn contains(&self, id: &Uuid) -> bool {
        self.sessions.contains_key(id)
    }

    /// Current view of a session, `None` when the session is unknown or expired.
    pub fn view(&self, id: &Uuid) -> Option<View> {
        let session = self.sessions.get(id)?;
        let guard = session.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Some(guard.view(&self.dashboard))
    }

    /// Applies one event to a session, `None` when the session is unknown.
    pub fn handle(&self, id: &Uuid, envelope: EventEnvelope) -> Option<SelectionResult<Outcome>> {
        let session = self.sessions.get(id)?;
        let mut guard = session.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Some(guard.handle(&self.dashboard, envelope))
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            info!(session = %id, "Session closed");
        }
        removed
    }
}
