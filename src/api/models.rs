//! Request and response bodies of the backend API.
//!
//! Field names follow the backend (partly Spanish). Fields the console does
//! not use are still accepted; unknown fields are ignored.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validation::FieldRecord;

/// A business owner who can log in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
}

impl Owner {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
        }
    }
}

/// `GET /auth/users`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnersResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub owners: Vec<Owner>,
}

/// `POST /auth/login` body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub owner_name: &'a str,
}

/// `POST /auth/login` response. `success` is false for unknown owners.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub owner: Option<Owner>,
    pub session_id: Option<String>,
    #[serde(default)]
    pub available_owners: Vec<String>,
}

/// `POST /auth/logout` body.
#[derive(Debug, Clone, Serialize)]
pub struct LogoutRequest<'a> {
    pub session_id: &'a str,
}

/// Generic `{success, message}` acknowledgement. The backend answers 200
/// with `success: false` when a write did not go through.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

fn succeeded() -> bool {
    true
}

/// Body of a list endpoint: a bare list, or `{success, data, message}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    List(Vec<T>),
    Wrapped {
        #[serde(default = "succeeded")]
        success: bool,
        #[serde(default = "Vec::new")]
        data: Vec<T>,
        #[serde(default)]
        message: Option<String>,
    },
}

impl<T> Listing<T> {
    /// The rows, or the server's message when it reported a failure.
    pub fn into_rows(self) -> Result<Vec<T>, Option<String>> {
        match self {
            Listing::List(rows) => Ok(rows),
            Listing::Wrapped {
                success: true,
                data,
                ..
            } => Ok(data),
            Listing::Wrapped { message, .. } => Err(message.filter(|m| !m.is_empty())),
        }
    }
}

/// `GET /dashboard`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_clients: Option<u64>,
    pub active_users: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// `POST /chat` body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// `POST /chat` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReply {
    pub response: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub confidence: Option<f64>,
    #[serde(rename = "type")]
    pub action_type: Option<String>,
    pub data: Option<Value>,
}

/// A suggested follow-up action offered by the agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickAction {
    pub action: String,
    #[serde(default)]
    pub label: String,
    pub icon: Option<String>,
}

/// `POST /chat/enhanced` body.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancedChatRequest<'a> {
    pub message: &'a str,
    pub user_name: &'a str,
    pub session_id: &'a str,
}

/// `POST /chat/enhanced` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnhancedChatReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub action_type: Option<String>,
    pub confidence: Option<f64>,
    pub data: Option<Value>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub quick_actions: Vec<QuickAction>,
    pub context_used: Option<Value>,
}

/// Service package attached to a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub speed: Option<String>,
    pub status: Option<String>,
}

/// A client row from `GET /clients`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Client {
    #[serde(rename = "Nombre", default)]
    pub name: Option<String>,
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
    #[serde(rename = "Teléfono", default)]
    pub phone: Option<Value>,
    #[serde(rename = "Zona", default)]
    pub zone: Option<String>,
    /// Number or string depending on the sheet the row came from.
    #[serde(rename = "Pago", default)]
    pub payment: Option<Value>,
    #[serde(default)]
    pub paquete_info: Option<PackageInfo>,
}

/// A prospect row from `GET /prospects`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prospect {
    #[serde(rename = "Nombre", default)]
    pub name: Option<String>,
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
    #[serde(rename = "Teléfono", default)]
    pub phone: Option<Value>,
    #[serde(rename = "Zona", default)]
    pub zone: Option<String>,
    #[serde(rename = "Estado", default)]
    pub status: Option<String>,
    #[serde(rename = "Accion", default)]
    pub action: Option<String>,
}

/// `POST /clients` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewClient {
    pub nombre: String,
    pub email: String,
    pub zona: String,
    pub telefono: String,
    pub pago_mensual: f64,
}

impl NewClient {
    /// Builds the request body from a record that already passed validation.
    pub fn from_record(record: &FieldRecord) -> Self {
        let text = |field: &Option<String>| field.as_deref().unwrap_or("").trim().to_string();
        Self {
            nombre: record.name.trim().to_string(),
            email: text(&record.email),
            zona: text(&record.zone),
            telefono: text(&record.phone),
            pago_mensual: record
                .payment
                .as_deref()
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(0.0),
        }
    }
}

/// Business-wide metrics shown on the v2 dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalMetrics {
    pub total_clientes: u64,
    pub clientes_activos: u64,
    pub ingresos_mensuales: f64,
    pub arpu: f64,
    pub incidentes_abiertos: u64,
    pub churn_rate: f64,
}

/// `GET /dashboard/{user}` (v2)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDashboard {
    pub global_metrics: Option<GlobalMetrics>,
    pub personal_metrics: Option<Value>,
    pub quick_stats: Option<Value>,
    pub system_status: Option<Value>,
}

/// Kind of an automatically generated insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Warning,
    Opportunity,
    Success,
    #[serde(other)]
    Info,
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightKind::Warning => write!(f, "warning"),
            InsightKind::Opportunity => write!(f, "opportunity"),
            InsightKind::Success => write!(f, "success"),
            InsightKind::Info => write!(f, "info"),
        }
    }
}

/// An automatically generated business insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub impact_level: String,
    #[serde(default)]
    pub recommended_action: String,
}

/// `GET /insights/{user}` (v2). The backend answers either with a bare list
/// or with an object holding one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InsightsResponse {
    List(Vec<Insight>),
    Wrapped {
        #[serde(default)]
        insights: Vec<Insight>,
    },
}

impl InsightsResponse {
    pub fn into_insights(self) -> Vec<Insight> {
        match self {
            InsightsResponse::List(insights) => insights,
            InsightsResponse::Wrapped { insights } => insights,
        }
    }
}

/// `POST /system/refresh` (v2)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshResult {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

/// `GET /system/status` (v2). Kept as raw JSON; the console prints it.
pub type SystemStatus = Value;

/// `GET /context/{user}` (v2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub quick_actions: Vec<QuickAction>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}
