//! Single-flight poll scheduler bound to one view's lifetime
//!
//! One scheduler exists per mounted dashboard. It polls once immediately,
//! then once per period. A tick that arrives while the previous poll is still
//! in flight is skipped, never queued, so batches reach the view in the order
//! they were requested. Unmounting cancels the view's token; a poll that
//! resolves afterwards is dropped on the floor.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::core::events::Event;
use crate::telemetry::{PollContext, TelemetryAggregator};

pub struct PollScheduler {
    view_id: uuid::Uuid,
    cancel: CancellationToken,
    in_flight: Arc<AtomicBool>,
    skipped: Arc<AtomicU64>,
    poll_now: Arc<Notify>,
}

#[derive(Clone)]
struct PollTask {
    view_id: uuid::Uuid,
    context: PollContext,
    aggregator: Arc<TelemetryAggregator>,
    tx: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    in_flight: Arc<AtomicBool>,
}

impl PollScheduler {
    /// Start polling for a freshly mounted view.
    pub fn mount(
        view_id: uuid::Uuid,
        context: PollContext,
        aggregator: Arc<TelemetryAggregator>,
        period: Duration,
        tx: mpsc::UnboundedSender<Event>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let in_flight = Arc::new(AtomicBool::new(false));
        let skipped = Arc::new(AtomicU64::new(0));
        let poll_now = Arc::new(Notify::new());

        debug!(%view_id, context = context.label(), ?period, "mounting poll scheduler");

        let task = PollTask {
            view_id,
            context,
            aggregator,
            tx,
            cancel: cancel.clone(),
            in_flight: Arc::clone(&in_flight),
        };
        tokio::spawn(Self::run(
            task,
            period,
            Arc::clone(&skipped),
            Arc::clone(&poll_now),
        ));

        Self {
            view_id,
            cancel,
            in_flight,
            skipped,
            poll_now,
        }
    }

    async fn run(task: PollTask, period: Duration, skipped: Arc<AtomicU64>, poll_now: Arc<Notify>) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // The first interval tick completes immediately: that is the poll at mount.
            tokio::select! {
                _ = task.cancel.cancelled() => break,
                _ = ticker.tick() => {}
                _ = poll_now.notified() => {}
            }

            if task.in_flight.swap(true, Ordering::AcqRel) {
                skipped.fetch_add(1, Ordering::Relaxed);
                trace!(view_id = %task.view_id, "previous poll still in flight, skipping tick");
                continue;
            }

            tokio::spawn(task.clone().poll_once());
        }

        debug!(view_id = %task.view_id, "poll scheduler stopped");
    }

    pub fn view_id(&self) -> uuid::Uuid {
        self.view_id
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn skipped_ticks(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Request a poll outside the regular period. Still single-flight.
    pub fn poll_now(&self) {
        self.poll_now.notify_one();
    }

    /// Stop future polls and discard any result still on its way.
    pub fn unmount(&self) {
        if !self.cancel.is_cancelled() {
            debug!(view_id = %self.view_id, "unmounting poll scheduler");
            self.cancel.cancel();
        }
    }
}

impl PollTask {
    async fn poll_once(self) {
        let result = self.aggregator.fetch(&self.context).await;

        if self.cancel.is_cancelled() {
            debug!(view_id = %self.view_id, "view unmounted, discarding poll result");
        } else {
            if let Err(e) = &result {
                warn!(context = self.context.label(), error = %e, "poll failed");
            }
            let _ = self.tx.send(Event::PollCompleted {
                view_id: self.view_id,
                result,
            });
        }

        // Released only after delivery so the next batch cannot overtake this one.
        self.in_flight.store(false, Ordering::Release);
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::api::{LegacyRecord, LegacyUser, TelemetryApi};
    use crate::telemetry::ApiError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::AtomicUsize;

    /// Answers every fetch after a fixed delay, recording concurrency.
    #[derive(Default)]
    struct SlowApi {
        delay: Duration,
        calls: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl SlowApi {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl TelemetryApi for SlowApi {
        async fn fetch_stats(&self) -> Result<Value, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(json!([{ "id": n, "user": "x", "cpuUsage": n }]))
        }

        async fn fetch_processes(&self) -> Result<Value, ApiError> {
            Ok(json!([]))
        }

        async fn send_command(&self, _system: &str, _command: &str) -> Result<(), ApiError> {
            Ok(())
        }

        async fn command_output(&self, _system: &str) -> Result<String, ApiError> {
            Ok(String::new())
        }

        async fn lookup_user(&self, _id: &str) -> Result<Option<LegacyRecord>, ApiError> {
            Ok(None)
        }

        async fn legacy_users(&self) -> Result<Vec<LegacyUser>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn aggregator(api: &Arc<SlowApi>) -> Arc<TelemetryAggregator> {
        let api: Arc<dyn TelemetryApi> = api.clone();
        Arc::new(TelemetryAggregator::new(api))
    }

    #[tokio::test]
    async fn polls_immediately_at_mount() {
        let api = SlowApi::new(Duration::ZERO);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let view_id = uuid::Uuid::new_v4();

        let _scheduler = PollScheduler::mount(
            view_id,
            PollContext::user("x"),
            aggregator(&api),
            Duration::from_secs(60),
            tx,
        );

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("first poll should not wait for the period")
            .expect("channel open");
        match event {
            Event::PollCompleted { view_id: id, result } => {
                assert_eq!(id, view_id);
                assert_eq!(result.unwrap().stats.len(), 1);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn slow_polls_never_overlap() {
        let api = SlowApi::new(Duration::from_millis(120));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let scheduler = PollScheduler::mount(
            uuid::Uuid::new_v4(),
            PollContext::All,
            aggregator(&api),
            Duration::from_millis(20),
            tx,
        );

        tokio::time::sleep(Duration::from_millis(500)).await;
        scheduler.unmount();

        assert_eq!(api.max_active.load(Ordering::SeqCst), 1);
        assert!(scheduler.skipped_ticks() > 0);

        let mut ids = Vec::new();
        while let Ok(Event::PollCompleted { result: Ok(batch), .. }) = rx.try_recv() {
            ids.extend(batch.stats.into_iter().filter_map(|s| s.id));
        }
        let mut sorted = ids.clone();
        sorted.sort_by_key(|id| id.parse::<u32>().unwrap_or(0));
        assert!(!ids.is_empty());
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn result_after_unmount_is_discarded() {
        let api = SlowApi::new(Duration::from_millis(150));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let scheduler = PollScheduler::mount(
            uuid::Uuid::new_v4(),
            PollContext::All,
            aggregator(&api),
            Duration::from_secs(60),
            tx,
        );

        // Let the mount poll start, then tear the view down mid-flight.
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(scheduler.is_in_flight());
        scheduler.unmount();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn poll_now_triggers_an_extra_cycle() {
        let api = SlowApi::new(Duration::ZERO);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let scheduler = PollScheduler::mount(
            uuid::Uuid::new_v4(),
            PollContext::All,
            aggregator(&api),
            Duration::from_secs(60),
            tx,
        );

        let first = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(first.is_ok());

        // Give the mount poll time to release its in-flight flag.
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.poll_now();

        let second = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(matches!(second, Ok(Some(Event::PollCompleted { .. }))));
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }
}
