//! Per-view telemetry state

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{trace, warn};

use crate::telemetry::aggregator::PollBatch;
use crate::telemetry::error::ApiError;
use crate::telemetry::history::HistoryBuffer;
use crate::telemetry::model::{PollContext, ProcessRecord, StatSnapshot};

/// Everything one mounted dashboard shows.
///
/// Owned by exactly one view and dropped with it; nothing here outlives an
/// unmount.
#[derive(Debug, Clone)]
pub struct TelemetryView {
    pub id: uuid::Uuid,
    pub context: PollContext,
    pub history: HistoryBuffer,
    pub processes: Vec<ProcessRecord>,
    /// True until the first poll resolves, successfully or not.
    pub loading: bool,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub polls_applied: u64,
}

impl TelemetryView {
    pub fn new(context: PollContext, history_capacity: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            context,
            history: HistoryBuffer::new(history_capacity),
            processes: Vec::new(),
            loading: true,
            last_success: None,
            last_error: None,
            polls_applied: 0,
        }
    }

    /// Append the batch's stats to history and replace the process list.
    ///
    /// Returns `false` and leaves the view untouched if the batch was fetched
    /// for a different context.
    pub fn apply(&mut self, batch: PollBatch) -> bool {
        if batch.context != self.context {
            warn!(
                expected = self.context.label(),
                got = batch.context.label(),
                "dropping batch for another context"
            );
            return false;
        }

        trace!(
            stats = batch.stats.len(),
            processes = batch.processes.len(),
            "applying poll batch"
        );
        self.history.extend(batch.stats);
        self.processes = batch.processes;
        self.loading = false;
        self.last_success = Some(batch.fetched_at);
        self.last_error = None;
        self.polls_applied += 1;
        true
    }

    /// Keep the previous data and remember why this cycle failed.
    pub fn record_failure(&mut self, err: &ApiError) {
        self.loading = false;
        self.last_error = Some(err.to_string());
    }

    pub fn latest(&self) -> Option<&StatSnapshot> {
        self.history.latest()
    }

    /// Stale once two whole poll periods pass without a successful poll.
    pub fn is_stale(&self, now: DateTime<Utc>, period: Duration) -> bool {
        match self.last_success {
            None => !self.loading,
            Some(at) => {
                let elapsed = now.signed_duration_since(at).num_milliseconds().max(0) as u128;
                elapsed > period.as_millis() * 2
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(context: PollContext, cpu: &[f64]) -> PollBatch {
        PollBatch {
            context,
            stats: cpu
                .iter()
                .map(|&c| StatSnapshot {
                    cpu_usage: c,
                    ..Default::default()
                })
                .collect(),
            processes: vec![ProcessRecord::default()],
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn apply_updates_everything() {
        let mut view = TelemetryView::new(PollContext::All, 50);
        view.last_error = Some("old".to_string());

        assert!(view.apply(batch(PollContext::All, &[1.0, 2.0])));

        assert_eq!(view.history.len(), 2);
        assert_eq!(view.processes.len(), 1);
        assert!(!view.loading);
        assert!(view.last_success.is_some());
        assert!(view.last_error.is_none());
        assert_eq!(view.polls_applied, 1);
    }

    #[test]
    fn batch_for_another_context_is_ignored() {
        let mut view = TelemetryView::new(PollContext::user("a"), 50);
        assert!(!view.apply(batch(PollContext::user("b"), &[1.0])));
        assert!(view.history.is_empty());
        assert!(view.loading);
    }

    #[test]
    fn failure_keeps_previous_data() {
        let mut view = TelemetryView::new(PollContext::All, 50);
        view.apply(batch(PollContext::All, &[7.0]));

        view.record_failure(&ApiError::Network("timeout".to_string()));

        assert_eq!(view.latest().map(|s| s.cpu_usage), Some(7.0));
        assert_eq!(view.last_error.as_deref(), Some("request failed: timeout"));
    }

    #[test]
    fn staleness_follows_last_success() {
        let period = Duration::from_millis(3000);
        let mut view = TelemetryView::new(PollContext::All, 50);
        let now = Utc::now();
        assert!(!view.is_stale(now, period));

        view.last_success = Some(now - chrono::Duration::milliseconds(5000));
        assert!(!view.is_stale(now, period));

        view.last_success = Some(now - chrono::Duration::milliseconds(7000));
        assert!(view.is_stale(now, period));
    }
}
