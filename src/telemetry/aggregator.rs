//! Turns raw poll responses into filtered, display-ready batches

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::integrations::api::TelemetryApi;
use crate::telemetry::error::ApiError;
use crate::telemetry::model::{
    decode_processes, decode_stats, PollContext, ProcessRecord, StatSnapshot, UserSummary,
};
use crate::telemetry::view::TelemetryView;

/// Result of one successful poll cycle, already filtered for its context.
#[derive(Debug, Clone, PartialEq)]
pub struct PollBatch {
    pub context: PollContext,
    /// Stats in the order the API returned them.
    pub stats: Vec<StatSnapshot>,
    pub processes: Vec<ProcessRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl PollBatch {
    /// Keep only the records that belong to `context`.
    pub fn filtered(
        context: &PollContext,
        stats: Vec<StatSnapshot>,
        processes: Vec<ProcessRecord>,
    ) -> Self {
        let (stats, processes) = match context.filter_key() {
            None => (stats, processes),
            Some(key) => {
                let owned_by = |user: &Option<String>| {
                    user.as_deref()
                        .map(|u| u.to_lowercase() == key)
                        .unwrap_or(false)
                };
                (
                    stats.into_iter().filter(|s| owned_by(&s.user)).collect(),
                    processes
                        .into_iter()
                        .filter(|p| owned_by(&p.user))
                        .collect(),
                )
            }
        };

        Self {
            context: context.clone(),
            stats,
            processes,
            fetched_at: Utc::now(),
        }
    }
}

/// Polls the stats and process endpoints and shapes the result per context.
pub struct TelemetryAggregator {
    api: Arc<dyn TelemetryApi>,
}

impl TelemetryAggregator {
    pub fn new(api: Arc<dyn TelemetryApi>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Arc<dyn TelemetryApi> {
        &self.api
    }

    /// Fetch both endpoints concurrently and build a batch.
    ///
    /// Either both bodies are valid arrays and a batch comes back, or the whole
    /// poll is discarded with an error. Nothing is ever half applied.
    pub async fn fetch(&self, context: &PollContext) -> Result<PollBatch, ApiError> {
        let (stats, processes) = tokio::join!(self.api.fetch_stats(), self.api.fetch_processes());

        let stats = decode_stats(stats?)?;
        let processes = decode_processes(processes?)?;

        let batch = PollBatch::filtered(context, stats, processes);
        debug!(
            context = context.label(),
            stats = batch.stats.len(),
            processes = batch.processes.len(),
            "poll succeeded"
        );
        Ok(batch)
    }

    /// Fetch and apply in one step, for callers that own their view directly.
    pub async fn poll(&self, view: &mut TelemetryView) -> Result<(), ApiError> {
        let context = view.context.clone();
        match self.fetch(&context).await {
            Ok(batch) => {
                view.apply(batch);
                Ok(())
            }
            Err(e) => {
                warn!(context = context.label(), error = %e, "poll failed");
                view.record_failure(&e);
                Err(e)
            }
        }
    }

    /// One stats fetch reduced to a per-user summary list.
    pub async fn users(&self) -> Result<Vec<UserSummary>, ApiError> {
        let stats = decode_stats(self.api.fetch_stats().await?)?;
        Ok(derive_unique_users(&stats))
    }
}

/// First-seen summary per distinct user, in first-occurrence order.
///
/// Keys are compared exactly as received: "Alice" and "alice" are two users
/// here, unlike the poll filter.
pub fn derive_unique_users(stats: &[StatSnapshot]) -> Vec<UserSummary> {
    let mut seen: IndexMap<Option<&str>, UserSummary> = IndexMap::new();
    for stat in stats {
        seen.entry(stat.user.as_deref())
            .or_insert_with(|| UserSummary {
                user: stat.user.clone(),
                ip_address: stat.ip_address.clone(),
                status: stat.status,
            });
    }
    seen.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::api::MockTelemetryApi;
    use crate::telemetry::model::{SystemStatus, UNKNOWN_PROCESS};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn aggregator(stats: Value, processes: Value) -> TelemetryAggregator {
        let mut api = MockTelemetryApi::new();
        api.expect_fetch_stats()
            .returning(move || Ok(stats.clone()));
        api.expect_fetch_processes()
            .returning(move || Ok(processes.clone()));
        TelemetryAggregator::new(Arc::new(api))
    }

    fn users_of(batch: &PollBatch) -> Vec<Option<String>> {
        batch.stats.iter().map(|s| s.user.clone()).collect()
    }

    fn mixed_stats() -> Value {
        json!([
            { "id": 1, "user": "Alice", "cpuUsage": 10 },
            { "id": 2, "user": "bob", "cpuUsage": 20 },
            { "id": 3, "user": "ALICE", "cpuUsage": 30 },
            { "id": 4, "cpuUsage": 40 }
        ])
    }

    #[tokio::test]
    async fn user_filter_ignores_case() {
        let agg = aggregator(mixed_stats(), json!([]));

        let lower = agg.fetch(&PollContext::user("alice")).await.unwrap();
        let upper = agg.fetch(&PollContext::user("ALICE")).await.unwrap();

        assert_eq!(lower.stats, upper.stats);
        assert_eq!(
            users_of(&lower),
            vec![Some("Alice".to_string()), Some("ALICE".to_string())]
        );
    }

    #[tokio::test]
    async fn all_context_passes_everything_through() {
        let agg = aggregator(mixed_stats(), json!([{ "user": "bob" }, {}]));
        let batch = agg.fetch(&PollContext::All).await.unwrap();
        assert_eq!(batch.stats.len(), 4);
        assert_eq!(batch.processes.len(), 2);
    }

    #[tokio::test]
    async fn processes_are_filtered_and_normalized() {
        let agg = aggregator(
            json!([]),
            json!([
                { "user": "Bob" },
                { "user": "alice", "processName": "sshd", "cpuUsage": 1.5, "memoryUsage": 12 },
                { "processName": "orphan" }
            ]),
        );

        let batch = agg.fetch(&PollContext::user("bob")).await.unwrap();

        assert_eq!(
            batch.processes,
            vec![ProcessRecord {
                user: Some("Bob".to_string()),
                process_name: UNKNOWN_PROCESS.to_string(),
                cpu_usage: 0.0,
                memory_usage: 0.0,
            }]
        );
    }

    #[tokio::test]
    async fn malformed_stats_discard_the_whole_poll() {
        let agg = aggregator(json!({}), json!([{ "user": "x", "processName": "top" }]));
        let mut view = TelemetryView::new(PollContext::user("x"), 50);
        view.history.push(StatSnapshot {
            user: Some("x".to_string()),
            cpu_usage: 5.0,
            ..Default::default()
        });
        let before_history: Vec<StatSnapshot> = view.history.iter().cloned().collect();

        let result = agg.poll(&mut view).await;

        assert!(matches!(result, Err(ApiError::Format(_))));
        assert_eq!(view.history.iter().cloned().collect::<Vec<_>>(), before_history);
        assert!(view.processes.is_empty());
        assert!(view.last_error.is_some());
    }

    #[tokio::test]
    async fn failed_process_fetch_discards_the_whole_poll() {
        let mut api = MockTelemetryApi::new();
        api.expect_fetch_stats()
            .returning(|| Ok(json!([{ "user": "x", "cpuUsage": 10 }])));
        api.expect_fetch_processes()
            .returning(|| Err(ApiError::Network("connection refused".to_string())));
        let agg = TelemetryAggregator::new(Arc::new(api));
        let mut view = TelemetryView::new(PollContext::user("x"), 50);

        let result = agg.poll(&mut view).await;

        assert_eq!(
            result,
            Err(ApiError::Network("connection refused".to_string()))
        );
        assert!(view.history.is_empty());
    }

    #[tokio::test]
    async fn two_polls_accumulate_history_and_replace_processes() {
        let mut api = MockTelemetryApi::new();
        let mut stat_calls = 0;
        api.expect_fetch_stats().returning(move || {
            stat_calls += 1;
            Ok(json!([{ "id": stat_calls, "user": "x", "cpuUsage": stat_calls * 10 }]))
        });
        let mut process_calls = 0;
        api.expect_fetch_processes().returning(move || {
            process_calls += 1;
            if process_calls == 1 {
                Ok(json!([{ "user": "x", "processName": "a" }, { "user": "x", "processName": "b" }]))
            } else {
                Ok(json!([{ "user": "x", "processName": "c" }]))
            }
        });
        let agg = TelemetryAggregator::new(Arc::new(api));
        let mut view = TelemetryView::new(PollContext::user("x"), 50);

        agg.poll(&mut view).await.unwrap();
        agg.poll(&mut view).await.unwrap();

        let cpu: Vec<f64> = view.history.iter().map(|s| s.cpu_usage).collect();
        assert_eq!(cpu, vec![10.0, 20.0]);
        assert_eq!(view.latest().map(|s| s.cpu_usage), Some(20.0));
        let names: Vec<&str> = view.processes.iter().map(|p| p.process_name.as_str()).collect();
        assert_eq!(names, vec!["c"]);
    }

    #[tokio::test]
    async fn users_come_from_a_single_stats_fetch() {
        let agg = aggregator(mixed_stats(), json!([]));
        let users = agg.users().await.unwrap();
        let names: Vec<Option<String>> = users.into_iter().map(|u| u.user).collect();
        assert_eq!(
            names,
            vec![
                Some("Alice".to_string()),
                Some("bob".to_string()),
                Some("ALICE".to_string()),
                None
            ]
        );
    }

    #[test]
    fn unique_users_keep_first_occurrence_order() {
        let stats: Vec<StatSnapshot> = ["b", "a", "b"]
            .iter()
            .map(|u| StatSnapshot {
                user: Some(u.to_string()),
                ..Default::default()
            })
            .collect();

        let users: Vec<Option<String>> = derive_unique_users(&stats)
            .into_iter()
            .map(|u| u.user)
            .collect();

        assert_eq!(users, vec![Some("b".to_string()), Some("a".to_string())]);
    }

    #[test]
    fn unique_users_take_the_first_record_fields() {
        let stats = vec![
            StatSnapshot {
                user: Some("a".to_string()),
                ip_address: Some("10.0.0.1".to_string()),
                status: SystemStatus::Active,
                ..Default::default()
            },
            StatSnapshot {
                user: Some("a".to_string()),
                ip_address: Some("10.0.0.2".to_string()),
                status: SystemStatus::Inactive,
                ..Default::default()
            },
        ];

        assert_eq!(
            derive_unique_users(&stats),
            vec![UserSummary {
                user: Some("a".to_string()),
                ip_address: Some("10.0.0.1".to_string()),
                status: SystemStatus::Active,
            }]
        );
    }

    #[test]
    fn unique_users_of_nothing_is_nothing() {
        assert!(derive_unique_users(&[]).is_empty());
    }
}
