//! Report export of the cached dashboard data.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::api::{GlobalMetrics, Insight, SystemStatus};
use crate::state::Cache;

/// JSON document written by `export`. Key names follow the backend.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub usuario: String,
    pub fecha_exportacion: DateTime<Utc>,
    pub metricas_globales: Option<GlobalMetrics>,
    pub metricas_personales: Option<Value>,
    pub insights: Vec<Insight>,
    pub sistema: Option<SystemStatus>,
}

impl ExportReport {
    /// Builds a report from a cache snapshot.
    pub fn from_cache(user: impl Into<String>, cache: &Cache) -> Self {
        let dashboard = cache.dashboard.as_ref();
        Self {
            usuario: user.into(),
            fecha_exportacion: Utc::now(),
            metricas_globales: dashboard.and_then(|d| d.global_metrics.clone()),
            metricas_personales: dashboard.and_then(|d| d.personal_metrics.clone()),
            insights: cache.insights.clone(),
            sistema: cache.system_status.clone(),
        }
    }

    /// Writes the report as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<(), super::ConsoleError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
