//! Events published by [`AppState`](super::AppState).

use std::fmt;

/// A change to the application state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateEvent {
    /// A user logged in or a session was restored.
    UserChanged { user: String },
    /// The user logged out; the cache was dropped with them.
    LoggedOut,
    /// Summary or per-user dashboard data changed.
    DashboardUpdated,
    /// Per-user context was loaded.
    ContextLoaded,
    /// Insights were replaced.
    InsightsUpdated { count: usize },
    /// System status was replaced.
    SystemStatusUpdated,
    /// Cached data was dropped.
    CacheCleared,
}

impl StateEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserChanged { .. } => "user_changed",
            Self::LoggedOut => "logged_out",
            Self::DashboardUpdated => "dashboard_updated",
            Self::ContextLoaded => "context_loaded",
            Self::InsightsUpdated { .. } => "insights_updated",
            Self::SystemStatusUpdated => "system_status_updated",
            Self::CacheCleared => "cache_cleared",
        }
    }
}

impl fmt::Display for StateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserChanged { user } => write!(f, "user changed to {}", user),
            Self::InsightsUpdated { count } => write!(f, "{} insights loaded", count),
            other => write!(f, "{}", other.name().replace('_', " ")),
        }
    }
}
