//! Console actions.
//!
//! Each action calls the backend through the [`ApiClient`], records results
//! in [`AppState`] and reports its outcome through the [`Notifier`]. Failed
//! network calls are classified and shown as error notices before being
//! returned as [`ConsoleError::Action`].

mod export;

pub use export::ExportReport;

use std::future::Future;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{
    Ack, ApiClient, ApiResult, ChatRequest, Client, DashboardSummary, EnhancedChatRequest, Insight,
    Listing, NewClient, Owner, Prospect, QuickAction, SystemStatus, UserContext, UserDashboard,
};
use crate::error::{ClassifiedError, ErrorCategory};
use crate::notification::Notifier;
use crate::session::{generate_session_id, Session, SessionError, SessionStore};
use crate::state::AppState;
use crate::validation::{validate, FieldRecord, RecordKind, ValidationResult};

/// Reply shown when the agent could not be reached.
pub const CHAT_FALLBACK_REPLY: &str =
    "Sorry, I could not process your message right now. Please try again in a moment.";

/// Reply shown when the agent answered without any text.
pub const CHAT_EMPTY_REPLY: &str = "The agent sent no reply.";

/// Messages sent for the agent's quick actions.
const QUICK_ACTION_MESSAGES: &[(&str, &str)] = &[
    ("get_stats", "Muéstrame las estadísticas del negocio"),
    ("check_incidents", "Incidentes pendientes que necesitan atención"),
    ("client_search", "Necesito buscar información de un cliente"),
    ("add_client", "Quiero agregar un nuevo cliente"),
    ("view_client_history", "Muéstrame el historial completo del cliente"),
    ("create_incident", "Quiero crear un nuevo incidente"),
    ("list_all_clients", "Lista todos mis clientes activos"),
    ("detailed_analytics", "Análisis detallado del negocio"),
];

/// The chat message behind a quick action. Unknown ids are sent as they are.
pub fn quick_action_message(id: &str) -> &str {
    QUICK_ACTION_MESSAGES
        .iter()
        .find(|(action, _)| *action == id)
        .map_or(id, |&(_, message)| message)
}

/// Errors returned by console actions.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// A backend call failed; the error was already shown as a notice.
    #[error(transparent)]
    Action(#[from] ClassifiedError),

    /// A record failed local validation; nothing was sent.
    #[error("invalid record: {}", .0.errors.join("; "))]
    Invalid(ValidationResult),

    /// The action needs a logged-in owner.
    #[error("not logged in; run `redsol login <owner>` first")]
    NotLoggedIn,

    /// The session file could not be read or written.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// The export file could not be written.
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),

    /// The export could not be serialized.
    #[error("failed to serialize export: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for console actions.
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// An agent reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutcome {
    /// Reply text, or [`CHAT_FALLBACK_REPLY`] when the call failed.
    pub reply: String,
    pub suggestions: Vec<String>,
    pub quick_actions: Vec<QuickAction>,
    /// Set when the agent could not be reached or refused the message.
    pub error: Option<ClassifiedError>,
}

impl ChatOutcome {
    fn failed(error: Option<ClassifiedError>, suggestions: Vec<String>) -> Self {
        Self {
            reply: CHAT_FALLBACK_REPLY.to_string(),
            suggestions,
            quick_actions: Vec::new(),
            error,
        }
    }
}

/// Outcome of a refresh: which loads succeeded and which failed.
#[derive(Debug, Default)]
pub struct RefreshSummary {
    pub reloaded: Vec<&'static str>,
    pub failed: Vec<ClassifiedError>,
}

impl RefreshSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record<T>(&mut self, name: &'static str, result: ConsoleResult<T>) {
        match result {
            Ok(_) => self.reloaded.push(name),
            Err(ConsoleError::Action(error)) => self.failed.push(error),
            Err(other) => warn!(load = name, error = %other, "Reload failed"),
        }
    }
}

/// The console: API client, state, notices and session file.
#[derive(Debug, Clone)]
pub struct Console {
    api: ApiClient,
    state: AppState,
    notifier: Notifier,
    sessions: SessionStore,
}

impl Console {
    pub fn new(api: ApiClient, sessions: SessionStore, notifier: Notifier) -> Self {
        Self {
            api,
            state: AppState::new(),
            notifier,
            sessions,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Awaits a backend call, turning a failure into a shown error notice.
    async fn run<T>(&self, action: &str, call: impl Future<Output = ApiResult<T>>) -> ConsoleResult<T> {
        call.await.map_err(|failure| {
            ConsoleError::Action(self.notifier.classify_and_notify(&failure, action))
        })
    }

    /// Reports a locally detected problem as a validation notice.
    fn reject(&self, message: impl Into<String>, action: &str) -> ClassifiedError {
        let error = ClassifiedError::with_message(ErrorCategory::Validation, message, action);
        self.notifier.report(error.clone());
        error
    }

    /// Reports a call the backend answered with `success: false`.
    fn refused(&self, message: Option<String>, action: &str) -> ClassifiedError {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| ErrorCategory::Server.template().to_string());
        warn!(action, reason = %message, "Backend refused the request");
        let error = ClassifiedError::with_message(ErrorCategory::Server, message, action);
        self.notifier.report(error.clone());
        error
    }

    async fn run_listing<T>(
        &self,
        action: &str,
        call: impl Future<Output = ApiResult<Listing<T>>>,
    ) -> ConsoleResult<Vec<T>> {
        let listing = self.run(action, call).await?;
        listing
            .into_rows()
            .map_err(|message| self.refused(message, action).into())
    }

    fn require_user(&self) -> ConsoleResult<String> {
        self.state.current_user().ok_or(ConsoleError::NotLoggedIn)
    }

    /// Loads the session file into state. Returns the restored session.
    pub fn restore_session(&self) -> ConsoleResult<Option<Session>> {
        let session = self.sessions.load()?;
        if let Some(session) = &session {
            debug!(user = %session.current_user, "Session restored");
            self.state.set_session(session);
        }
        Ok(session)
    }

    /// Lists owners who can log in.
    pub async fn owners(&self) -> ConsoleResult<Vec<Owner>> {
        self.run("load the owner list", self.api.owners()).await
    }

    /// Logs in as `owner_name` and persists the session.
    pub async fn login(&self, owner_name: &str) -> ConsoleResult<Session> {
        const ACTION: &str = "log in";
        let owner_name = owner_name.trim();
        if owner_name.is_empty() {
            return Err(self.reject("Owner name is required", ACTION).into());
        }

        let response = self.run(ACTION, self.api.login(owner_name)).await?;
        if !response.success {
            let mut message = if response.message.is_empty() {
                format!("Unknown owner '{}'", owner_name)
            } else {
                response.message
            };
            if !response.available_owners.is_empty() {
                message.push_str(&format!(
                    " (available: {})",
                    response.available_owners.join(", ")
                ));
            }
            return Err(self.reject(message, ACTION).into());
        }

        let owner = response
            .owner
            .unwrap_or_else(|| Owner::new(owner_name, owner_name, ""));
        let current_user = if owner.id.is_empty() {
            owner_name.to_lowercase()
        } else {
            owner.id.clone()
        };
        let session_id = response.session_id.unwrap_or_else(generate_session_id);
        let session = Session::new(current_user, session_id, owner);

        self.sessions.save(&session)?;
        self.state.set_session(&session);
        info!(user = %session.current_user, "Logged in");
        self.notifier
            .notify_success(format!("Welcome, {}", session.user.name), ACTION);
        Ok(session)
    }

    /// Logs out. The local session is cleared even if the backend call fails.
    pub async fn logout(&self) -> ConsoleResult<()> {
        const ACTION: &str = "log out";
        let session_id = match self.state.session_id() {
            Some(id) => Some(id),
            None => self.sessions.load().ok().flatten().map(|s| s.session_id),
        };

        if let Some(session_id) = session_id {
            if let Err(ConsoleError::Action(error)) =
                self.run(ACTION, self.api.logout(&session_id)).await
            {
                debug!(category = %error.category, "Logout call failed, clearing local session anyway");
            }
        }

        self.sessions.clear()?;
        self.state.logout();
        self.notifier.notify_success("Logged out", ACTION);
        Ok(())
    }

    /// Loads the summary dashboard.
    pub async fn load_dashboard(&self) -> ConsoleResult<DashboardSummary> {
        let summary = self.run("load the dashboard", self.api.dashboard()).await?;
        self.state.set_summary(summary.clone());
        Ok(summary)
    }

    /// Loads the logged-in owner's dashboard.
    pub async fn load_user_dashboard(&self) -> ConsoleResult<UserDashboard> {
        let user = self.require_user()?;
        let dashboard = self
            .run("load your dashboard", self.api.user_dashboard(&user))
            .await?;
        self.state.set_dashboard(dashboard.clone());
        Ok(dashboard)
    }

    pub async fn load_context(&self) -> ConsoleResult<UserContext> {
        let user = self.require_user()?;
        let context = self.run("load your context", self.api.context(&user)).await?;
        self.state.set_context(context.clone());
        Ok(context)
    }

    pub async fn load_insights(&self) -> ConsoleResult<Vec<Insight>> {
        let user = self.require_user()?;
        let insights = self.run("load insights", self.api.insights(&user)).await?;
        self.state.set_insights(insights.clone());
        Ok(insights)
    }

    pub async fn load_system_status(&self) -> ConsoleResult<SystemStatus> {
        let status = self
            .run("load the system status", self.api.system_status())
            .await?;
        self.state.set_system_status(status.clone());
        Ok(status)
    }

    /// Sends a chat message. Returns `None` for a blank message.
    ///
    /// Logged-in owners use the enhanced agent. A failed call still yields
    /// an outcome carrying the fallback reply and the classified error.
    pub async fn send_chat(&self, message: &str) -> Option<ChatOutcome> {
        const ACTION: &str = "send the message";
        let message = message.trim();
        if message.is_empty() {
            return None;
        }

        let outcome = match (self.state.current_user(), self.state.session_id()) {
            (Some(user), Some(session_id)) => {
                let request = EnhancedChatRequest {
                    message,
                    user_name: &user,
                    session_id: &session_id,
                };
                match self.run(ACTION, self.api.enhanced_chat(&request)).await {
                    Ok(reply) if reply.success => ChatOutcome {
                        reply: reply.message,
                        suggestions: reply.suggestions,
                        quick_actions: reply.quick_actions,
                        error: None,
                    },
                    Ok(reply) => ChatOutcome::failed(
                        Some(self.refused(Some(reply.message), ACTION)),
                        reply.suggestions,
                    ),
                    Err(err) => ChatOutcome::failed(action_error(err), Vec::new()),
                }
            }
            _ => {
                let request = ChatRequest {
                    message: message.to_string(),
                    ..ChatRequest::default()
                };
                match self.run(ACTION, self.api.chat(&request)).await {
                    Ok(reply) => ChatOutcome {
                        reply: reply
                            .response
                            .filter(|r| !r.trim().is_empty())
                            .unwrap_or_else(|| CHAT_EMPTY_REPLY.to_string()),
                        suggestions: reply.suggestions,
                        quick_actions: Vec::new(),
                        error: None,
                    },
                    Err(err) => ChatOutcome::failed(action_error(err), Vec::new()),
                }
            }
        };
        Some(outcome)
    }

    /// Runs one of the agent's quick actions by sending its preset message.
    pub async fn run_quick_action(&self, id: &str) -> Option<ChatOutcome> {
        let id = id.trim();
        debug!(action = id, "Running quick action");
        self.send_chat(quick_action_message(id)).await
    }

    pub async fn list_clients(&self) -> ConsoleResult<Vec<Client>> {
        self.run_listing("load clients", self.api.clients()).await
    }

    /// Searches clients. A blank term lists all of them.
    pub async fn search_clients(&self, term: &str) -> ConsoleResult<Vec<Client>> {
        let term = term.trim();
        if term.is_empty() {
            return self.list_clients().await;
        }
        self.run_listing("search clients", self.api.search_clients(term))
            .await
    }

    pub async fn list_prospects(&self) -> ConsoleResult<Vec<Prospect>> {
        self.run_listing("load prospects", self.api.prospects())
            .await
    }

    /// Validates and creates a client. Invalid records never reach the
    /// backend.
    pub async fn create_client(&self, record: &FieldRecord) -> ConsoleResult<Ack> {
        const ACTION: &str = "create the client";
        let result = validate(record, RecordKind::Client);
        if !result.is_valid {
            self.reject(result.errors.join("; "), ACTION);
            return Err(ConsoleError::Invalid(result));
        }

        let body = NewClient::from_record(record);
        let ack = self.run(ACTION, self.api.create_client(&body)).await?;
        if !ack.success {
            return Err(self.refused(Some(ack.message), ACTION).into());
        }
        info!(client = %body.nombre, "Client created");
        self.notifier
            .notify_success(format!("Client {} created", body.nombre), ACTION);
        Ok(ack)
    }

    /// Reloads status, and for a logged-in owner context, dashboard and
    /// insights, all concurrently.
    pub async fn reload(&self) -> RefreshSummary {
        let mut summary = RefreshSummary::default();
        if self.state.is_logged_in() {
            let (status, context, dashboard, insights) = futures::join!(
                self.load_system_status(),
                self.load_context(),
                self.load_user_dashboard(),
                self.load_insights(),
            );
            summary.record("system status", status);
            summary.record("context", context);
            summary.record("dashboard", dashboard);
            summary.record("insights", insights);
        } else {
            summary.record("system status", self.load_system_status().await);
        }
        summary
    }

    /// Asks the backend to refresh its data, then reloads.
    pub async fn refresh(&self) -> ConsoleResult<RefreshSummary> {
        const ACTION: &str = "refresh the data";
        let result = self.run(ACTION, self.api.refresh()).await?;
        if !result.success {
            return Err(self.refused(result.error.or(result.message), ACTION).into());
        }

        self.state.clear_cache();
        let summary = self.reload().await;
        if summary.is_complete() {
            self.notifier.notify_success("Data refreshed", ACTION);
        }
        Ok(summary)
    }

    /// Writes the owner's dashboard, insights and system status to `path`.
    /// Loads them first if nothing is cached.
    pub async fn export(&self, path: &Path) -> ConsoleResult<ExportReport> {
        const ACTION: &str = "export the report";
        let user = self.require_user()?;
        if self.state.cache().dashboard.is_none() {
            let summary = self.reload().await;
            if let Some(error) = summary.failed.into_iter().next() {
                return Err(error.into());
            }
        }

        let report = ExportReport::from_cache(user, &self.state.cache());
        report.write_to(path)?;
        info!(path = %path.display(), "Report exported");
        self.notifier
            .notify_success(format!("Report saved to {}", path.display()), ACTION);
        Ok(report)
    }
}

/// The classified error behind a failed call, if there was one.
fn action_error(err: ConsoleError) -> Option<ClassifiedError> {
    match err {
        ConsoleError::Action(error) => Some(error),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::error::FailureReason;
    use crate::notification::NoticeKind;
    use crate::request::{ApiResponse, RequestOptions, Transport};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Transport answering every call with the same response and recording
    /// the targets it saw.
    struct FixedTransport {
        response: Result<ApiResponse, FailureReason>,
        targets: Mutex<Vec<String>>,
    }

    impl FixedTransport {
        fn new(response: Result<ApiResponse, FailureReason>) -> Arc<Self> {
            Arc::new(Self {
                response,
                targets: Mutex::new(Vec::new()),
            })
        }

        fn targets(&self) -> Vec<String> {
            self.targets.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FixedTransport {
        async fn send(
            &self,
            target: &str,
            _options: &RequestOptions,
        ) -> Result<ApiResponse, FailureReason> {
            self.targets.lock().unwrap().push(target.to_string());
            self.response.clone()
        }
    }

    /// Transport answering by URL suffix, each answer after its own delay.
    struct RoutedTransport {
        routes: Vec<(&'static str, Duration, ApiResponse)>,
    }

    #[async_trait]
    impl Transport for RoutedTransport {
        async fn send(
            &self,
            target: &str,
            _options: &RequestOptions,
        ) -> Result<ApiResponse, FailureReason> {
            let (_, delay, response) = self
                .routes
                .iter()
                .find(|(suffix, _, _)| target.ends_with(suffix))
                .cloned()
                .unwrap_or((
                    "",
                    Duration::ZERO,
                    ApiResponse::new(200, "{}"),
                ));
            tokio::time::sleep(delay).await;
            Ok(response)
        }
    }

    fn console(transport: Arc<dyn Transport>, dir: &TempDir) -> Console {
        let config = ApiConfig {
            max_retries: 1,
            ..ApiConfig::default()
        };
        let api = ApiClient::new(&config, transport).unwrap();
        Console::new(
            api,
            SessionStore::new(dir.path().join("session.json")),
            Notifier::new(),
        )
    }

    #[tokio::test]
    async fn test_invalid_client_never_sent() {
        let dir = TempDir::new().unwrap();
        let transport = FixedTransport::new(Ok(ApiResponse::new(200, "{}")));
        let console = console(transport.clone(), &dir);

        let record = FieldRecord::named("").with_email("bad");
        let err = console.create_client(&record).await.unwrap_err();

        assert!(matches!(err, ConsoleError::Invalid(ref r) if r.errors.len() == 2));
        assert!(transport.targets().is_empty());
        let notices = console.notifier().active();
        assert_eq!(notices.len(), 1);
        assert_eq!(
            notices[0].error().map(|e| e.category),
            Some(ErrorCategory::Validation)
        );
    }

    #[tokio::test]
    async fn test_blank_chat_is_noop() {
        let dir = TempDir::new().unwrap();
        let transport = FixedTransport::new(Ok(ApiResponse::new(200, "{}")));
        let console = console(transport.clone(), &dir);

        assert!(console.send_chat("   ").await.is_none());
        assert!(transport.targets().is_empty());
    }

    #[tokio::test]
    async fn test_chat_failure_returns_fallback() {
        let dir = TempDir::new().unwrap();
        let transport = FixedTransport::new(Ok(ApiResponse::new(503, "down")));
        let console = console(transport, &dir);

        let outcome = console.send_chat("hola").await.unwrap();
        assert_eq!(outcome.reply, CHAT_FALLBACK_REPLY);
        assert_eq!(
            outcome.error.map(|e| e.category),
            Some(ErrorCategory::Server)
        );
    }

    #[tokio::test]
    async fn test_plain_chat_when_logged_out() {
        let dir = TempDir::new().unwrap();
        let transport = FixedTransport::new(Ok(ApiResponse::new(
            200,
            r#"{"response":"Tienes **534** clientes","suggestions":["Ver zonas"]}"#,
        )));
        let console = console(transport.clone(), &dir);

        let outcome = console.send_chat("¿cuántos clientes?").await.unwrap();
        assert_eq!(outcome.reply, "Tienes **534** clientes");
        assert!(outcome.error.is_none());
        assert_eq!(transport.targets(), vec!["http://localhost:8000/api/chat"]);
    }

    #[tokio::test]
    async fn test_logout_clears_session_even_if_call_fails() {
        let dir = TempDir::new().unwrap();
        let transport = FixedTransport::new(Err(FailureReason::network("connection refused")));
        let console = console(transport.clone(), &dir);
        logged_in(&console);
        assert!(console.state().is_logged_in());

        console.logout().await.unwrap();

        assert!(!console.state().is_logged_in());
        assert!(!console.sessions().exists());
        assert_eq!(transport.targets(), vec!["http://localhost:8000/api/auth/logout"]);
        let kinds: Vec<bool> = console.notifier().active().iter().map(|n| n.is_error()).collect();
        assert_eq!(kinds, vec![true, false]);
    }

    #[tokio::test]
    async fn test_rejected_login_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let transport = FixedTransport::new(Ok(ApiResponse::new(
            200,
            r#"{"success":false,"message":"Propietario no encontrado","available_owners":["carlos","eduardo"]}"#,
        )));
        let console = console(transport, &dir);

        let err = console.login("pedro").await.unwrap_err();
        match err {
            ConsoleError::Action(error) => {
                assert_eq!(error.category, ErrorCategory::Validation);
                assert!(error.message.contains("Propietario no encontrado"));
                assert!(error.message.contains("carlos, eduardo"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!console.sessions().exists());
    }

    #[tokio::test]
    async fn test_login_generates_session_id_when_missing() {
        let dir = TempDir::new().unwrap();
        let transport = FixedTransport::new(Ok(ApiResponse::new(
            200,
            r#"{"success":true,"owner":{"id":"eduardo","name":"Eduardo","role":"owner"}}"#,
        )));
        let console = console(transport, &dir);

        let session = console.login("Eduardo").await.unwrap();
        assert_eq!(session.current_user, "eduardo");
        assert!(session.session_id.starts_with("session_"));
        assert!(matches!(
            console.notifier().active()[0].kind,
            NoticeKind::Success
        ));
    }

    fn logged_in(console: &Console) {
        console
            .sessions()
            .save(&Session::new("carlos", "s1", Owner::new("carlos", "Carlos", "admin")))
            .unwrap();
        console.restore_session().unwrap();
    }

    #[tokio::test]
    async fn test_enhanced_chat_refusal_is_reported() {
        let dir = TempDir::new().unwrap();
        let transport = FixedTransport::new(Ok(ApiResponse::new(
            200,
            r#"{"success":false,"message":"Sistema de IA no disponible","suggestions":["Intentar más tarde"]}"#,
        )));
        let console = console(transport, &dir);
        logged_in(&console);

        let outcome = console.send_chat("hola").await.unwrap();
        assert_eq!(outcome.reply, CHAT_FALLBACK_REPLY);
        assert_eq!(outcome.suggestions, vec!["Intentar más tarde"]);
        let error = outcome.error.unwrap();
        assert_eq!(error.category, ErrorCategory::Server);
        assert_eq!(error.message, "Sistema de IA no disponible");
        assert_eq!(console.notifier().active().len(), 1);
    }

    #[tokio::test]
    async fn test_plain_chat_without_text_uses_placeholder() {
        let dir = TempDir::new().unwrap();
        let transport = FixedTransport::new(Ok(ApiResponse::new(200, r#"{"suggestions":[]}"#)));
        let console = console(transport, &dir);

        let outcome = console.send_chat("hola").await.unwrap();
        assert_eq!(outcome.reply, CHAT_EMPTY_REPLY);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_quick_action_messages() {
        assert_eq!(
            quick_action_message("get_stats"),
            "Muéstrame las estadísticas del negocio"
        );
        assert_eq!(
            quick_action_message("list_all_clients"),
            "Lista todos mis clientes activos"
        );
        assert_eq!(quick_action_message("show_zones"), "show_zones");
    }

    #[tokio::test]
    async fn test_quick_action_goes_to_enhanced_agent() {
        let dir = TempDir::new().unwrap();
        let transport = FixedTransport::new(Ok(ApiResponse::new(
            200,
            r#"{"success":true,"message":"534 clientes"}"#,
        )));
        let console = console(transport.clone(), &dir);
        logged_in(&console);

        let outcome = console.run_quick_action("get_stats").await.unwrap();
        assert_eq!(outcome.reply, "534 clientes");
        assert_eq!(
            transport.targets(),
            vec!["http://localhost:8000/api/v2/chat/enhanced"]
        );
    }

    #[tokio::test]
    async fn test_refused_client_write_is_not_success() {
        let dir = TempDir::new().unwrap();
        let transport = FixedTransport::new(Ok(ApiResponse::new(
            200,
            r#"{"success":false,"message":"Error al agregar cliente"}"#,
        )));
        let console = console(transport, &dir);

        let record = FieldRecord::named("Ana").with_zone("Sur");
        let err = console.create_client(&record).await.unwrap_err();
        match err {
            ConsoleError::Action(error) => {
                assert_eq!(error.category, ErrorCategory::Server);
                assert_eq!(error.message, "Error al agregar cliente");
            }
            other => panic!("unexpected error: {other}"),
        }
        let notices = console.notifier().active();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_error());
    }

    #[tokio::test]
    async fn test_refused_listing_is_reported() {
        let dir = TempDir::new().unwrap();
        let transport = FixedTransport::new(Ok(ApiResponse::new(
            200,
            r#"{"success":false,"message":"Servicio de Google Sheets no disponible","data":[]}"#,
        )));
        let console = console(transport, &dir);

        let err = console.list_prospects().await.unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::Action(ref e) if e.message == "Servicio de Google Sheets no disponible"
        ));
    }

    #[tokio::test]
    async fn test_wrapped_client_list_decodes() {
        let dir = TempDir::new().unwrap();
        let transport = FixedTransport::new(Ok(ApiResponse::new(
            200,
            r#"{"success":true,"data":[{"Nombre":"Juan"}],"count":1}"#,
        )));
        let console = console(transport, &dir);

        let clients = console.list_clients().await.unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].name.as_deref(), Some("Juan"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_failure_notice_outlives_slow_reload() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(RoutedTransport {
            routes: vec![
                ("/system/refresh", Duration::ZERO, ApiResponse::new(200, r#"{"success":true}"#)),
                ("/context/carlos", Duration::ZERO, ApiResponse::new(404, "")),
                ("/dashboard/carlos", Duration::from_secs(9), ApiResponse::new(200, "{}")),
            ],
        });
        let console = console(transport, &dir);
        logged_in(&console);
        let mut log = console.notifier().log();

        let summary = console.refresh().await.unwrap();

        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].category, ErrorCategory::NotFound);
        assert!(console.notifier().active().iter().all(|n| !n.is_error()));
        let shown: Vec<ErrorCategory> = log
            .drain()
            .iter()
            .filter_map(|n| n.error().map(|e| e.category))
            .collect();
        assert_eq!(shown, vec![ErrorCategory::NotFound]);
    }

    #[tokio::test]
    async fn test_export_requires_login() {
        let dir = TempDir::new().unwrap();
        let transport = FixedTransport::new(Ok(ApiResponse::new(200, "{}")));
        let console = console(transport, &dir);

        let err = console.export(&dir.path().join("out.json")).await.unwrap_err();
        assert!(matches!(err, ConsoleError::NotLoggedIn));
    }
}
