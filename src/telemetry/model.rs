//! Typed telemetry records and their wire normalization
//!
//! The API hands out loosely shaped JSON: fields go missing, numbers arrive as
//! `null`, identifiers are sometimes numbers and sometimes strings. Each record
//! passes through exactly one normalization step on the way in, so the rest of
//! the crate works with plain typed values and never re-checks for absence.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::telemetry::error::ApiError;

/// Name given to processes the API reports without one.
pub const UNKNOWN_PROCESS: &str = "Unknown Process";

/// Reported state of a monitored system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum SystemStatus {
    Active,
    Inactive,
    #[default]
    Unknown,
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl From<&str> for SystemStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "active" => Self::Active,
            "inactive" => Self::Inactive,
            _ => Self::Unknown,
        }
    }
}

/// One polled telemetry record for one system at one point in time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatSnapshot {
    pub id: Option<String>,
    pub user: Option<String>,
    pub ip_address: Option<String>,
    pub status: SystemStatus,
    /// Percent, expected in `[0, 100]`.
    pub cpu_usage: f64,
    /// Gigabytes.
    pub memory_used: f64,
    pub memory_total: f64,
    pub disk_used: f64,
    pub disk_total: f64,
}

/// One process reported by a monitored system.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessRecord {
    pub user: Option<String>,
    pub process_name: String,
    pub cpu_usage: f64,
    /// Megabytes.
    pub memory_usage: f64,
}

/// Per-user summary shown on the selection screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserSummary {
    pub user: Option<String>,
    pub ip_address: Option<String>,
    pub status: SystemStatus,
}

/// Filter scope of a poll.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PollContext {
    All,
    User(String),
}

impl PollContext {
    pub fn user(name: impl Into<String>) -> Self {
        Self::User(name.into())
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => "All systems",
            Self::User(name) => name,
        }
    }

    /// The user a command would be sent to, if this context names one.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::User(name) => Some(name),
        }
    }

    /// Lower-cased filter key, computed once per poll.
    pub(crate) fn filter_key(&self) -> Option<String> {
        self.target().map(str::to_lowercase)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawStat {
    id: Value,
    user: Value,
    ip_address: Value,
    status: Value,
    cpu_usage: Value,
    memory_used: Value,
    memory_total: Value,
    disk_used: Value,
    disk_total: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawProcess {
    user: Value,
    process_name: Value,
    cpu_usage: Value,
    memory_usage: Value,
}

impl From<RawStat> for StatSnapshot {
    fn from(raw: RawStat) -> Self {
        Self {
            id: text(&raw.id),
            user: text(&raw.user),
            ip_address: text(&raw.ip_address),
            status: text(&raw.status)
                .map(|s| SystemStatus::from(s.as_str()))
                .unwrap_or_default(),
            cpu_usage: number(&raw.cpu_usage),
            memory_used: number(&raw.memory_used),
            memory_total: number(&raw.memory_total),
            disk_used: number(&raw.disk_used),
            disk_total: number(&raw.disk_total),
        }
    }
}

impl From<RawProcess> for ProcessRecord {
    fn from(raw: RawProcess) -> Self {
        Self {
            user: text(&raw.user),
            process_name: text(&raw.process_name)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNKNOWN_PROCESS.to_string()),
            cpu_usage: number(&raw.cpu_usage),
            memory_usage: number(&raw.memory_usage),
        }
    }
}

/// Decode a `/api/stats` body. Anything but an array of objects is rejected.
pub fn decode_stats(body: Value) -> Result<Vec<StatSnapshot>, ApiError> {
    records(body, "stats")?
        .into_iter()
        .map(|map| -> Result<StatSnapshot, ApiError> {
            let raw: RawStat = serde_json::from_value(Value::Object(map))?;
            Ok(StatSnapshot::from(raw))
        })
        .collect()
}

/// Decode a `/api/processes` body. Anything but an array of objects is rejected.
pub fn decode_processes(body: Value) -> Result<Vec<ProcessRecord>, ApiError> {
    records(body, "processes")?
        .into_iter()
        .map(|map| -> Result<ProcessRecord, ApiError> {
            let raw: RawProcess = serde_json::from_value(Value::Object(map))?;
            Ok(ProcessRecord::from(raw))
        })
        .collect()
}

fn records(body: Value, what: &str) -> Result<Vec<Map<String, Value>>, ApiError> {
    let Value::Array(items) = body else {
        return Err(ApiError::Format(format!(
            "expected an array of {}, got {}",
            what,
            kind(&body)
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(ApiError::Format(format!(
                "{}[{}] is {}, not an object",
                what,
                i,
                kind(&other)
            ))),
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_status_from_str() {
        assert_eq!(SystemStatus::from("active"), SystemStatus::Active);
        assert_eq!(SystemStatus::from("ACTIVE"), SystemStatus::Active);
        assert_eq!(SystemStatus::from("Inactive"), SystemStatus::Inactive);
        assert_eq!(SystemStatus::from("rebooting"), SystemStatus::Unknown);
    }

    #[test]
    fn decodes_full_stat_record() {
        let stats = decode_stats(json!([{
            "id": 7,
            "user": "Alice",
            "ipAddress": "10.0.0.4",
            "status": "Active",
            "cpuUsage": 12.5,
            "memoryUsed": 3.25,
            "memoryTotal": 16,
            "diskUsed": 120.0,
            "diskTotal": 512.0
        }]))
        .unwrap();

        assert_eq!(
            stats,
            vec![StatSnapshot {
                id: Some("7".to_string()),
                user: Some("Alice".to_string()),
                ip_address: Some("10.0.0.4".to_string()),
                status: SystemStatus::Active,
                cpu_usage: 12.5,
                memory_used: 3.25,
                memory_total: 16.0,
                disk_used: 120.0,
                disk_total: 512.0,
            }]
        );
    }

    #[test]
    fn missing_stat_fields_become_defaults() {
        let stats = decode_stats(json!([{ "user": "bob", "cpuUsage": null }])).unwrap();
        assert_eq!(stats[0].status, SystemStatus::Unknown);
        assert_eq!(stats[0].cpu_usage, 0.0);
        assert_eq!(stats[0].memory_total, 0.0);
        assert_eq!(stats[0].ip_address, None);
    }

    #[test]
    fn process_defaults_are_substituted() {
        let processes = decode_processes(json!([{ "user": "bob" }])).unwrap();
        assert_eq!(
            processes,
            vec![ProcessRecord {
                user: Some("bob".to_string()),
                process_name: UNKNOWN_PROCESS.to_string(),
                cpu_usage: 0.0,
                memory_usage: 0.0,
            }]
        );
    }

    #[test]
    fn empty_process_name_counts_as_missing() {
        let processes =
            decode_processes(json!([{ "processName": "", "cpuUsage": "4.5" }])).unwrap();
        assert_eq!(processes[0].process_name, UNKNOWN_PROCESS);
        assert_eq!(processes[0].cpu_usage, 4.5);
    }

    #[test]
    fn non_array_body_is_a_format_error() {
        let err = decode_stats(json!({})).unwrap_err();
        assert_eq!(
            err,
            ApiError::Format("expected an array of stats, got an object".to_string())
        );
    }

    #[test]
    fn non_object_element_is_a_format_error() {
        let err = decode_processes(json!([{ "user": "a" }, 3])).unwrap_err();
        assert!(matches!(err, ApiError::Format(msg) if msg.contains("processes[1]")));
    }

    #[test]
    fn context_filter_key_is_lowercase() {
        assert_eq!(PollContext::user("ALICE").filter_key().as_deref(), Some("alice"));
        assert_eq!(PollContext::All.filter_key(), None);
        assert_eq!(PollContext::All.label(), "All systems");
    }
}
