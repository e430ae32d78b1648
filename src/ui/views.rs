//! Plain-text views of backend data.
//!
//! Each `render_*` method returns a string ready to print; nothing here
//! writes to the terminal itself.

use owo_colors::{OwoColorize, Rgb};
use serde_json::Value;

use super::markdown;
use super::Theme;
use crate::api::{
    Client, DashboardSummary, Insight, InsightKind, Owner, Prospect, QuickAction, SystemStatus,
    UserDashboard,
};
use crate::validation::ValidationResult;

/// Renders console output with the configured theme.
#[derive(Debug, Clone)]
pub struct ConsoleView {
    theme: Theme,
    /// Panel width (characters)
    width: usize,
    colored: bool,
}

impl Default for ConsoleView {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

/// Formats a JSON scalar for a table cell.
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn text_cell(value: Option<&str>) -> String {
    value.filter(|s| !s.is_empty()).unwrap_or("-").to_string()
}

fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        format!("{}{}", text, " ".repeat(width - count))
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

impl ConsoleView {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            width: 72,
            colored: true,
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(40);
        self
    }

    pub fn with_color(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    pub fn colored(&self) -> bool {
        self.colored
    }

    fn paint(&self, text: &str, color: Rgb) -> String {
        if self.colored {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn heading(&self, title: &str) -> String {
        let title = if self.colored {
            title.color(self.theme.accent).bold().to_string()
        } else {
            title.to_string()
        };
        format!("{}\n{}\n", title, self.paint(&"─".repeat(self.width), self.theme.muted))
    }

    fn metric(&self, label: &str, value: impl std::fmt::Display) -> String {
        format!(
            "  {} {}\n",
            self.paint(&format!("{:<22}", label), self.theme.muted),
            value
        )
    }

    /// Summary cards from `GET /dashboard`.
    pub fn render_summary(&self, summary: &DashboardSummary) -> String {
        let mut output = self.heading("Dashboard");
        let count = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
        output.push_str(&self.metric("Total clients", count(summary.total_clients)));
        output.push_str(&self.metric("Active users", count(summary.active_users)));
        for (key, value) in &summary.extra {
            output.push_str(&self.metric(key, cell(Some(value))));
        }
        output
    }

    /// Per-user dashboard from the v2 API.
    pub fn render_user_dashboard(&self, user: &str, dashboard: &UserDashboard) -> String {
        let mut output = self.heading(&format!("Dashboard · {}", user));
        if let Some(global) = &dashboard.global_metrics {
            output.push_str(&self.metric("Total clients", global.total_clientes));
            output.push_str(&self.metric("Active clients", global.clientes_activos));
            output.push_str(&self.metric(
                "Monthly revenue",
                format!("${:.2}", global.ingresos_mensuales),
            ));
            output.push_str(&self.metric("ARPU", format!("${:.2}", global.arpu)));
            output.push_str(&self.metric("Open incidents", global.incidentes_abiertos));
            output.push_str(&self.metric("Churn rate", format!("{:.1}%", global.churn_rate)));
        }
        if let Some(Value::Object(personal)) = &dashboard.personal_metrics {
            output.push('\n');
            output.push_str(&self.paint("  Personal\n", self.theme.accent));
            for (key, value) in personal {
                output.push_str(&self.metric(key, cell(Some(value))));
            }
        }
        output
    }

    /// Table of clients.
    pub fn render_clients(&self, clients: &[Client]) -> String {
        let mut output = self.heading(&format!("Clients ({})", clients.len()));
        if clients.is_empty() {
            output.push_str(&self.paint("  No clients found\n", self.theme.muted));
            return output;
        }
        output.push_str(&self.paint(
            &format!(
                "  {} {} {} {}\n",
                fit("Name", 24),
                fit("Zone", 10),
                fit("Payment", 10),
                "Package"
            ),
            self.theme.muted,
        ));
        for client in clients {
            let package = client
                .paquete_info
                .as_ref()
                .and_then(|p| p.speed.as_deref())
                .unwrap_or("-");
            output.push_str(&format!(
                "  {} {} {} {}\n",
                fit(&text_cell(client.name.as_deref()), 24),
                fit(&text_cell(client.zone.as_deref()), 10),
                fit(&cell(client.payment.as_ref()), 10),
                package
            ));
        }
        output
    }

    /// Table of prospects.
    pub fn render_prospects(&self, prospects: &[Prospect]) -> String {
        let mut output = self.heading(&format!("Prospects ({})", prospects.len()));
        if prospects.is_empty() {
            output.push_str(&self.paint("  No prospects found\n", self.theme.muted));
            return output;
        }
        for prospect in prospects {
            output.push_str(&format!(
                "  {} {} {} {}\n",
                fit(&text_cell(prospect.name.as_deref()), 24),
                fit(&text_cell(prospect.zone.as_deref()), 10),
                fit(&text_cell(prospect.status.as_deref()), 12),
                text_cell(prospect.action.as_deref())
            ));
        }
        output
    }

    /// Owners who can log in.
    pub fn render_owners(&self, owners: &[Owner]) -> String {
        let mut output = self.heading("Owners");
        for owner in owners {
            output.push_str(&format!(
                "  {} {} {}\n",
                self.paint(&fit(&owner.id, 14), self.theme.accent),
                fit(&owner.name, 24),
                self.paint(&owner.role, self.theme.muted)
            ));
        }
        output
    }

    /// The logged-in owner.
    pub fn render_whoami(&self, owner: &Owner, session_id: &str) -> String {
        format!(
            "{} ({})\n{}\n",
            self.paint(&owner.name, self.theme.accent),
            owner.role,
            self.paint(&format!("session {}", session_id), self.theme.muted)
        )
    }

    fn insight_color(&self, kind: InsightKind) -> Rgb {
        match kind {
            InsightKind::Warning => self.theme.warning,
            InsightKind::Opportunity => self.theme.accent,
            InsightKind::Success => self.theme.success,
            InsightKind::Info => self.theme.muted,
        }
    }

    /// Business insights.
    pub fn render_insights(&self, insights: &[Insight]) -> String {
        let mut output = self.heading(&format!("Insights ({})", insights.len()));
        for insight in insights {
            let tag = format!("[{}]", insight.kind);
            output.push_str(&format!(
                "  {} {}\n",
                self.paint(&tag, self.insight_color(insight.kind)),
                insight.title
            ));
            if !insight.description.is_empty() {
                output.push_str(&format!("    {}\n", insight.description));
            }
            if !insight.recommended_action.is_empty() {
                output.push_str(&self.paint(
                    &format!("    → {}\n", insight.recommended_action),
                    self.theme.muted,
                ));
            }
        }
        output
    }

    /// System status as key/value lines. Nested objects are indented.
    pub fn render_system_status(&self, status: &SystemStatus) -> String {
        let mut output = self.heading("System status");
        self.push_value(&mut output, status, 1);
        output
    }

    fn push_value(&self, output: &mut String, value: &Value, depth: usize) {
        let indent = "  ".repeat(depth);
        match value {
            Value::Object(map) => {
                for (key, value) in map {
                    if value.is_object() {
                        output.push_str(&format!("{}{}\n", indent, self.paint(key, self.theme.accent)));
                        self.push_value(output, value, depth + 1);
                    } else {
                        output.push_str(&format!(
                            "{}{} {}\n",
                            indent,
                            self.paint(&format!("{}:", key), self.theme.muted),
                            cell(Some(value))
                        ));
                    }
                }
            }
            other => output.push_str(&format!("{}{}\n", indent, cell(Some(other)))),
        }
    }

    /// An agent reply with its suggestions.
    pub fn render_chat_reply(
        &self,
        reply: &str,
        suggestions: &[String],
        quick_actions: &[QuickAction],
    ) -> String {
        let mut output = format!("{}\n", markdown::render(reply, self.colored));
        if !suggestions.is_empty() {
            output.push('\n');
            for suggestion in suggestions {
                output.push_str(&self.paint(&format!("  • {}\n", suggestion), self.theme.muted));
            }
        }
        if !quick_actions.is_empty() {
            output.push_str(&self.paint(
                "\n  Quick actions (redsol chat --action <id>):\n",
                self.theme.muted,
            ));
            for action in quick_actions {
                let line = if action.label.is_empty() {
                    format!("    {}\n", action.action)
                } else {
                    format!("    {:<20} {}\n", action.action, action.label)
                };
                output.push_str(&self.paint(&line, self.theme.muted));
            }
        }
        output
    }

    /// Outcome of a field validation.
    pub fn render_validation(&self, result: &ValidationResult) -> String {
        if result.is_valid {
            return format!("{}\n", self.paint("✓ Record is valid", self.theme.success));
        }
        let mut output = format!("{}\n", self.paint("✗ Record is invalid", self.theme.error));
        for error in &result.errors {
            output.push_str(&format!("  - {}\n", error));
        }
        output
    }
}
