//! Field validation for client and prospect records.
//!
//! Validation runs locally before any network call. It is a pure function of
//! the record and its kind, and reports every violated rule in a fixed order
//! instead of stopping at the first one.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Zones the backend accepts for clients and prospects.
pub const ALLOWED_ZONES: [&str; 5] = ["Norte", "Sur", "Centro", "Este", "Oeste"];

/// Kind of record being validated. Only clients carry a payment amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// A paying client (`cliente`).
    Client,
    /// A prospect that has not signed up yet (`prospecto`).
    Prospect,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Client => write!(f, "cliente"),
            RecordKind::Prospect => write!(f, "prospecto"),
        }
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cliente" | "client" => Ok(RecordKind::Client),
            "prospecto" | "prospect" => Ok(RecordKind::Prospect),
            other => Err(format!("unknown record kind: {}", other)),
        }
    }
}

/// User-entered fields of a client or prospect, keyed the way the backend
/// names them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    #[serde(rename = "Nombre", default)]
    pub name: String,
    #[serde(rename = "Teléfono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "Email", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "Zona", default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(rename = "Pago", default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<String>,
}

impl FieldRecord {
    /// Creates a record with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn with_payment(mut self, payment: impl Into<String>) -> Self {
        self.payment = Some(payment.into());
        self
    }
}

/// Outcome of validating a record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    /// True when `errors` is empty.
    pub is_valid: bool,
    /// Violated rules, in the order they were checked.
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^[0-9 ()+.\-]{10,15}$").expect("valid phone regex"))
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

/// Returns the trimmed value when the optional field is present and non-empty.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Validates a record of the given kind.
///
/// Rules are checked in this order: name, phone, email, zone, payment.
/// Optional fields are only checked when present.
pub fn validate(record: &FieldRecord, kind: RecordKind) -> ValidationResult {
    let mut errors = Vec::new();

    let name = record.name.trim();
    if name.is_empty() {
        errors.push("Name is required".to_string());
    } else if name.chars().count() < 2 {
        errors.push("Name must be at least 2 characters".to_string());
    }

    if let Some(phone) = present(&record.phone) {
        if !phone_pattern().is_match(phone) {
            errors.push("Phone must be 10 to 15 digits or separators".to_string());
        }
    }

    if let Some(email) = present(&record.email) {
        if !email_pattern().is_match(email) {
            errors.push("Email must look like name@domain.tld".to_string());
        }
    }

    if let Some(zone) = present(&record.zone) {
        if !ALLOWED_ZONES.iter().any(|z| z.eq_ignore_ascii_case(zone)) {
            errors.push(format!("Zone must be one of: {}", ALLOWED_ZONES.join(", ")));
        }
    }

    if kind == RecordKind::Client {
        if let Some(payment) = present(&record.payment) {
            let valid = payment
                .parse::<f64>()
                .map(|amount| amount.is_finite() && amount >= 0.0)
                .unwrap_or(false);
            if !valid {
                errors.push("Payment must be a non-negative number".to_string());
            }
        }
    }

    ValidationResult::from_errors(errors)
}
