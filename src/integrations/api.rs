//! HTTP client for the remote telemetry API
//!
//! All network access goes through [`TelemetryApi`]; the dashboard, the
//! aggregator and the one-shot CLI commands only ever see the trait.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::ApiConfig;
use crate::telemetry::error::ApiError;

/// Where the API lives. Resolved once per session and injected everywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    pub host: String,
    pub port: u16,
}

impl ApiEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Url::parse(&format!("{}{}", self.base_url(), path))
            .map_err(|e| ApiError::Network(format!("invalid URL for {}: {}", path, e)))
    }
}

impl Default for ApiEndpoint {
    fn default() -> Self {
        Self::new("localhost", 9090)
    }
}

/// Single-record shape served by the legacy `/api/user/:id` route.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LegacyRecord {
    #[serde(default)]
    pub id: Value,
    pub user: Option<String>,
    pub cpu_usage: Option<f64>,
    pub memory_used: Option<f64>,
    pub disk_used: Option<f64>,
}

/// Row of the legacy `/api/users` listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LegacyUser {
    #[serde(default)]
    pub id: Value,
    pub user: Option<String>,
}

#[derive(Debug, Serialize)]
struct CommandRequest<'a> {
    system: &'a str,
    command: &'a str,
}

/// Operations the dashboard needs from the remote API.
///
/// Stats and process bodies are returned as decoded JSON; checking their
/// shape is the aggregator's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemetryApi: Send + Sync {
    async fn fetch_stats(&self) -> Result<Value, ApiError>;

    async fn fetch_processes(&self) -> Result<Value, ApiError>;

    async fn send_command(&self, system: &str, command: &str) -> Result<(), ApiError>;

    async fn command_output(&self, system: &str) -> Result<String, ApiError>;

    /// `Ok(None)` when the API answers 404.
    async fn lookup_user(&self, id: &str) -> Result<Option<LegacyRecord>, ApiError>;

    async fn legacy_users(&self) -> Result<Vec<LegacyUser>, ApiError>;
}

/// reqwest-backed [`TelemetryApi`].
pub struct ApiClient {
    endpoint: ApiEndpoint,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(endpoint: ApiEndpoint, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("telemon/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { endpoint, http })
    }

    pub fn from_config(config: &ApiConfig) -> anyhow::Result<Self> {
        Self::new(
            ApiEndpoint::new(config.host.clone(), config.port),
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }

    pub fn endpoint(&self) -> &ApiEndpoint {
        &self.endpoint
    }

    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.endpoint.url(path)?;
        trace!(%url, "GET");
        let response = self.http.get(url).send().await?;
        let response = ok_or_status(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn ok_or_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl TelemetryApi for ApiClient {
    async fn fetch_stats(&self) -> Result<Value, ApiError> {
        self.get_json("/api/stats").await
    }

    async fn fetch_processes(&self) -> Result<Value, ApiError> {
        self.get_json("/api/processes").await
    }

    async fn send_command(&self, system: &str, command: &str) -> Result<(), ApiError> {
        let url = self.endpoint.url("/api/command")?;
        debug!(system, command, "sending remote command");
        let response = self
            .http
            .post(url)
            .json(&CommandRequest { system, command })
            .send()
            .await?;
        ok_or_status(response).await?;
        Ok(())
    }

    async fn command_output(&self, system: &str) -> Result<String, ApiError> {
        let mut url = self.endpoint.url("/api/command/output")?;
        url.query_pairs_mut().append_pair("system", system);
        let response = self.http.get(url).send().await?;
        let response = ok_or_status(response).await?;
        Ok(response.text().await?)
    }

    async fn lookup_user(&self, id: &str) -> Result<Option<LegacyRecord>, ApiError> {
        let mut url = self.endpoint.url("/api/user")?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Network("base URL cannot hold a path".to_string()))?
            .push(id);
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ok_or_status(response).await?;
        let body = response.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn legacy_users(&self) -> Result<Vec<LegacyUser>, ApiError> {
        let body = self.get_json("/api/users").await?;
        if !body.is_array() {
            return Err(ApiError::Format("expected an array of users".to_string()));
        }
        Ok(serde_json::from_value(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn base_url_uses_fixed_port() {
        let endpoint = ApiEndpoint::new("monitor.lan", 9090);
        assert_eq!(endpoint.base_url(), "http://monitor.lan:9090");
        assert_eq!(ApiEndpoint::default().base_url(), "http://localhost:9090");
    }

    #[test]
    fn output_url_encodes_system_name() {
        let endpoint = ApiEndpoint::default();
        let mut url = endpoint.url("/api/command/output").unwrap();
        url.query_pairs_mut().append_pair("system", "lab box&1");
        assert_eq!(
            url.as_str(),
            "http://localhost:9090/api/command/output?system=lab+box%261"
        );
    }

    #[test]
    fn command_request_body_shape() {
        let body = serde_json::to_value(CommandRequest {
            system: "alice",
            command: "uptime",
        })
        .unwrap();
        assert_eq!(body, json!({ "system": "alice", "command": "uptime" }));
    }

    #[test]
    fn legacy_record_reads_snake_case_fields() {
        let record: LegacyRecord = serde_json::from_value(json!({
            "id": 3,
            "user": "carol",
            "cpu_usage": 41.5,
            "memory_used": 2.0,
            "disk_used": 80.25
        }))
        .unwrap();
        assert_eq!(record.id, json!(3));
        assert_eq!(record.cpu_usage, Some(41.5));
        assert_eq!(record.disk_used, Some(80.25));
    }
}
