//! Application state shared by console actions.
//!
//! Holds the logged-in user, the session id and the last data loaded from
//! the backend. All mutation goes through methods on [`AppState`], each of
//! which publishes a [`StateEvent`] to subscribers.

pub mod events;

pub use events::StateEvent;

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::api::{DashboardSummary, Insight, Owner, SystemStatus, UserContext, UserDashboard};
use crate::session::Session;

/// Capacity of the event channel. Slow subscribers lag instead of blocking.
const EVENT_CAPACITY: usize = 128;

/// Data last loaded from the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cache {
    pub summary: Option<DashboardSummary>,
    pub dashboard: Option<UserDashboard>,
    pub context: Option<UserContext>,
    pub insights: Vec<Insight>,
    pub system_status: Option<SystemStatus>,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Inner {
    current_user: Option<String>,
    session_id: Option<String>,
    user: Option<Owner>,
    cache: Cache,
}

/// State container. Clones share the same state and event channel.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<StateEvent>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("current_user", &self.current_user())
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

impl AppState {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Publishes an event. Having no subscribers is fine.
    fn emit(&self, event: StateEvent) {
        trace!(event = event.name(), "State event");
        let _ = self.events.send(event);
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    /// Identifier of the logged-in owner, if any.
    pub fn current_user(&self) -> Option<String> {
        self.lock().current_user.clone()
    }

    pub fn session_id(&self) -> Option<String> {
        self.lock().session_id.clone()
    }

    pub fn user(&self) -> Option<Owner> {
        self.lock().user.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.lock().current_user.is_some()
    }

    /// Snapshot of the cached backend data.
    pub fn cache(&self) -> Cache {
        self.lock().cache.clone()
    }

    /// Sets the logged-in user from a session.
    pub fn set_session(&self, session: &Session) {
        {
            let mut inner = self.lock();
            inner.current_user = Some(session.current_user.clone());
            inner.session_id = Some(session.session_id.clone());
            inner.user = Some(session.user.clone());
        }
        debug!(user = %session.current_user, "User set");
        self.emit(StateEvent::UserChanged {
            user: session.current_user.clone(),
        });
    }

    /// Forgets the user and everything cached for them.
    pub fn logout(&self) {
        {
            let mut inner = self.lock();
            inner.current_user = None;
            inner.session_id = None;
            inner.user = None;
            inner.cache = Cache::default();
        }
        debug!("User cleared");
        self.emit(StateEvent::LoggedOut);
    }

    pub fn set_summary(&self, summary: DashboardSummary) {
        self.update_cache(|cache| cache.summary = Some(summary));
        self.emit(StateEvent::DashboardUpdated);
    }

    pub fn set_dashboard(&self, dashboard: UserDashboard) {
        self.update_cache(|cache| cache.dashboard = Some(dashboard));
        self.emit(StateEvent::DashboardUpdated);
    }

    pub fn set_context(&self, context: UserContext) {
        self.update_cache(|cache| cache.context = Some(context));
        self.emit(StateEvent::ContextLoaded);
    }

    pub fn set_insights(&self, insights: Vec<Insight>) {
        let count = insights.len();
        self.update_cache(|cache| cache.insights = insights);
        self.emit(StateEvent::InsightsUpdated { count });
    }

    pub fn set_system_status(&self, status: SystemStatus) {
        self.update_cache(|cache| cache.system_status = Some(status));
        self.emit(StateEvent::SystemStatusUpdated);
    }

    /// Drops cached data but keeps the user.
    pub fn clear_cache(&self) {
        self.lock().cache = Cache::default();
        self.emit(StateEvent::CacheCleared);
    }

    fn update_cache(&self, apply: impl FnOnce(&mut Cache)) {
        let mut inner = self.lock();
        apply(&mut inner.cache);
        inner.cache.last_update = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new("carlos", "session_1", Owner::new("carlos", "Carlos", "admin"))
    }

    #[test]
    fn test_set_session_and_logout() {
        let state = AppState::new();
        assert!(!state.is_logged_in());

        state.set_session(&session());
        assert_eq!(state.current_user().as_deref(), Some("carlos"));
        assert_eq!(state.session_id().as_deref(), Some("session_1"));

        state.set_insights(Vec::new());
        state.logout();
        assert!(!state.is_logged_in());
        assert!(state.cache().last_update.is_none());
    }

    #[test]
    fn test_events_in_mutation_order() {
        let state = AppState::new();
        let mut rx = state.subscribe();

        state.set_session(&session());
        state.set_summary(DashboardSummary::default());
        state.set_system_status(serde_json::json!({"status": "ok"}));
        state.clear_cache();
        state.logout();

        assert_eq!(
            rx.try_recv().unwrap(),
            StateEvent::UserChanged {
                user: "carlos".to_string()
            }
        );
        assert_eq!(rx.try_recv().unwrap(), StateEvent::DashboardUpdated);
        assert_eq!(rx.try_recv().unwrap(), StateEvent::SystemStatusUpdated);
        assert_eq!(rx.try_recv().unwrap(), StateEvent::CacheCleared);
        assert_eq!(rx.try_recv().unwrap(), StateEvent::LoggedOut);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_mutation_without_subscribers() {
        let state = AppState::new();
        state.set_context(UserContext::default());
        assert!(state.cache().context.is_some());
        assert!(state.cache().last_update.is_some());
    }

    #[test]
    fn test_clear_cache_keeps_user() {
        let state = AppState::new();
        state.set_session(&session());
        state.set_summary(DashboardSummary::default());
        state.clear_cache();
        assert!(state.is_logged_in());
        assert!(state.cache().summary.is_none());
    }
}
