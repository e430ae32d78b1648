//! Transient notices for action outcomes.
//!
//! Every failed action produces an error notice and some successful actions
//! produce a success notice. Notices are independent entries in an unbounded
//! queue: each one expires on its own timer unless dismissed first, and both
//! dismissal and expiry are idempotent.

mod renderer;

pub use renderer::NotificationRenderer;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, info, warn};

use crate::error::{ClassifiedError, FailureReason};

/// How long an error notice stays up.
pub const ERROR_DISPLAY: Duration = Duration::from_secs(8);

/// How long a success notice stays up.
pub const SUCCESS_DISPLAY: Duration = Duration::from_secs(4);

/// Identifier of a notice, unique per notifier.
pub type NoticeId = u64;

/// What a notice reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    /// A classified failure.
    Error(ClassifiedError),
    /// A completed action.
    Success,
}

/// A transient notice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub kind: NoticeKind,
    /// Text shown in the notice body.
    pub message: String,
    /// The action the notice is about, e.g. "send a chat message".
    pub action: String,
    pub created_at: DateTime<Utc>,
    /// How long the notice stays up if not dismissed.
    pub display_for: Duration,
}

impl Notice {
    /// Returns true if this notice reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(self.kind, NoticeKind::Error(_))
    }

    /// The classified error, for error notices.
    pub fn error(&self) -> Option<&ClassifiedError> {
        match &self.kind {
            NoticeKind::Error(error) => Some(error),
            NoticeKind::Success => None,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NoticeKind::Error(error) => write!(
                f,
                "[{}] Failed to {}: {}",
                error.category, self.action, self.message
            ),
            NoticeKind::Success => write!(f, "{}", self.message),
        }
    }
}

/// Why a notice went away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DismissReason {
    /// The user closed it.
    Dismissed,
    /// Its display time ran out.
    Expired,
}

/// Events published to notice subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoticeEvent {
    Shown(Notice),
    Removed { id: NoticeId, reason: DismissReason },
}

struct NotifierInner {
    active: Mutex<Vec<Notice>>,
    next_id: AtomicU64,
    events: broadcast::Sender<NoticeEvent>,
    error_display: Duration,
    success_display: Duration,
}

/// Queue of active notices.
///
/// Cloning a `Notifier` yields another handle to the same queue. Expiry timers
/// are spawned on the current Tokio runtime; outside a runtime notices stay
/// up until dismissed.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    /// Creates a notifier with the default display durations.
    pub fn new() -> Self {
        Self::with_durations(ERROR_DISPLAY, SUCCESS_DISPLAY)
    }

    /// Creates a notifier with custom display durations.
    pub fn with_durations(error_display: Duration, success_display: Duration) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(NotifierInner {
                active: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                events,
                error_display,
                success_display,
            }),
        }
    }

    fn active_guard(&self) -> MutexGuard<'_, Vec<Notice>> {
        self.inner
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Subscribes to shown/removed events.
    pub fn subscribe(&self) -> broadcast::Receiver<NoticeEvent> {
        self.inner.events.subscribe()
    }

    /// Starts recording every notice shown from now on.
    pub fn log(&self) -> NoticeLog {
        NoticeLog {
            events: self.subscribe(),
        }
    }

    /// Classifies a failure and shows an error notice for it.
    ///
    /// Never fails: unrecognized failures are classified as `unknown`.
    pub fn classify_and_notify(
        &self,
        failure: &FailureReason,
        action_description: &str,
    ) -> ClassifiedError {
        let error = ClassifiedError::from_failure(failure, action_description);
        warn!(
            category = %error.category,
            action = action_description,
            cause = %failure,
            "Action failed"
        );
        self.report(error.clone());
        error
    }

    /// Shows an error notice for an already classified error.
    pub fn report(&self, error: ClassifiedError) -> NoticeId {
        let message = error.message.clone();
        let action = error.source_action.clone();
        let display_for = self.inner.error_display;
        self.push(NoticeKind::Error(error), message, action, display_for)
    }

    /// Shows a success notice.
    pub fn notify_success(&self, message: impl Into<String>, action: impl Into<String>) -> NoticeId {
        let message = message.into();
        info!(notice = %message, "Action succeeded");
        let display_for = self.inner.success_display;
        self.push(NoticeKind::Success, message, action.into(), display_for)
    }

    fn push(
        &self,
        kind: NoticeKind,
        message: String,
        action: String,
        display_for: Duration,
    ) -> NoticeId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let notice = Notice {
            id,
            kind,
            message,
            action,
            created_at: Utc::now(),
            display_for,
        };

        self.active_guard().push(notice.clone());
        let _ = self.inner.events.send(NoticeEvent::Shown(notice));

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let notifier = self.clone();
            handle.spawn(async move {
                tokio::time::sleep(display_for).await;
                notifier.remove(id, DismissReason::Expired);
            });
        }

        id
    }

    /// Dismisses a notice. Returns false if it was already gone.
    pub fn dismiss(&self, id: NoticeId) -> bool {
        self.remove(id, DismissReason::Dismissed)
    }

    fn remove(&self, id: NoticeId, reason: DismissReason) -> bool {
        let removed = {
            let mut active = self.active_guard();
            match active.iter().position(|n| n.id == id) {
                Some(index) => {
                    active.remove(index);
                    true
                }
                None => false,
            }
        };

        if removed {
            debug!(id, ?reason, "Notice removed");
            let _ = self.inner.events.send(NoticeEvent::Removed { id, reason });
        }
        removed
    }

    /// Snapshot of the notices currently shown, oldest first.
    pub fn active(&self) -> Vec<Notice> {
        self.active_guard().clone()
    }

    /// Returns true if the notice is still shown.
    pub fn is_active(&self, id: NoticeId) -> bool {
        self.active_guard().iter().any(|n| n.id == id)
    }
}

/// Every notice shown since the log was created, whether or not it is still
/// active. Expired and dismissed notices are still reported.
pub struct NoticeLog {
    events: broadcast::Receiver<NoticeEvent>,
}

impl NoticeLog {
    /// Waits for the next shown notice. Returns `None` once the notifier is
    /// gone.
    pub async fn next_shown(&mut self) -> Option<Notice> {
        loop {
            match self.events.recv().await {
                Ok(NoticeEvent::Shown(notice)) => return Some(notice),
                Ok(NoticeEvent::Removed { .. }) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Notice events dropped"),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Notices shown but not yet taken, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        let mut shown = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(NoticeEvent::Shown(notice)) => shown.push(notice),
                Ok(NoticeEvent::Removed { .. }) => {}
                Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "Notice events dropped"),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return shown,
            }
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("active", &self.active_guard().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[tokio::test(start_paused = true)]
    async fn test_classify_and_notify_returns_category() {
        let notifier = Notifier::new();
        let error = notifier.classify_and_notify(&FailureReason::http(503, ""), "load the dashboard");

        assert_eq!(error.category, ErrorCategory::Server);
        assert_eq!(error.source_action, "load the dashboard");
        let active = notifier.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].error(), Some(&error));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_notice_expires_after_eight_seconds() {
        let notifier = Notifier::new();
        let error = ClassifiedError::new(ErrorCategory::Network, "send a chat message");
        let id = notifier.report(error);

        tokio::time::sleep(Duration::from_millis(7_900)).await;
        assert!(notifier.is_active(id));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!notifier.is_active(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_notice_expires_sooner() {
        let notifier = Notifier::new();
        let id = notifier.notify_success("Client saved", "create a client");

        tokio::time::sleep(Duration::from_millis(3_900)).await;
        assert!(notifier.is_active(id));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!notifier.is_active(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_before_expiry_is_idempotent() {
        let notifier = Notifier::new();
        let mut events = notifier.subscribe();
        let id = notifier.report(ClassifiedError::new(ErrorCategory::Timeout, "refresh"));

        assert!(notifier.dismiss(id));
        assert!(!notifier.dismiss(id));

        // Let the expiry timer fire on an already removed notice.
        tokio::time::sleep(ERROR_DISPLAY + Duration::from_secs(1)).await;
        assert!(notifier.active().is_empty());

        assert!(matches!(events.recv().await, Ok(NoticeEvent::Shown(_))));
        assert_eq!(
            events.recv().await.unwrap(),
            NoticeEvent::Removed {
                id,
                reason: DismissReason::Dismissed
            }
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notices_are_independent() {
        let notifier = Notifier::new();
        let first = notifier.report(ClassifiedError::new(ErrorCategory::Network, "a"));
        let second = notifier.report(ClassifiedError::new(ErrorCategory::Network, "a"));

        assert_ne!(first, second);
        assert_eq!(notifier.active().len(), 2);
        notifier.dismiss(first);
        assert_eq!(notifier.active().len(), 1);
        assert!(notifier.is_active(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_keeps_expired_notices() {
        let notifier = Notifier::new();
        let mut log = notifier.log();

        notifier.report(ClassifiedError::new(ErrorCategory::NotFound, "load your context"));
        tokio::time::sleep(ERROR_DISPLAY + Duration::from_secs(1)).await;
        notifier.notify_success("Data refreshed", "refresh the data");

        assert_eq!(notifier.active().len(), 1);
        let shown = log.drain();
        assert_eq!(shown.len(), 2);
        assert_eq!(
            shown[0].error().map(|e| e.category),
            Some(ErrorCategory::NotFound)
        );
        assert!(!shown[1].is_error());
        assert!(log.drain().is_empty());
    }

    #[tokio::test]
    async fn test_log_next_shown_skips_removals() {
        let notifier = Notifier::new();
        let mut log = notifier.log();

        let id = notifier.notify_success("Saved", "save");
        notifier.dismiss(id);
        notifier.report(ClassifiedError::new(ErrorCategory::Server, "save"));

        assert_eq!(log.next_shown().await.map(|n| n.id), Some(id));
        assert!(log.next_shown().await.is_some_and(|n| n.is_error()));
    }

    #[test]
    fn test_without_runtime_notice_stays_until_dismissed() {
        let notifier = Notifier::new();
        let id = notifier.notify_success("Saved", "save");
        assert!(notifier.is_active(id));
        assert!(notifier.dismiss(id));
    }

    #[test]
    fn test_display() {
        let notifier = Notifier::new();
        notifier.report(ClassifiedError::new(ErrorCategory::NotFound, "list prospects"));
        let notice = &notifier.active()[0];
        assert_eq!(
            notice.to_string(),
            "[not_found] Failed to list prospects: The requested resource was not found."
        );
    }
}
