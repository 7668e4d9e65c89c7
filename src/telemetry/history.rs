//! Bounded, insertion-ordered snapshot history

use std::collections::VecDeque;

use crate::telemetry::model::StatSnapshot;

/// Number of snapshots a view keeps unless configured otherwise.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Oldest-first ring of snapshots with FIFO eviction.
///
/// The tail is always the most recently observed snapshot, which the summary
/// cards read as "latest stats".
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<StatSnapshot>,
    capacity: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryBuffer {
    /// A capacity of zero is bumped to one so `latest` stays meaningful.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, snapshot: StatSnapshot) {
        self.entries.push_back(snapshot);
        self.evict();
    }

    /// Append in order; each push evicts from the front once full.
    pub fn extend<I>(&mut self, snapshots: I)
    where
        I: IntoIterator<Item = StatSnapshot>,
    {
        for snapshot in snapshots {
            self.push(snapshot);
        }
    }

    fn evict(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&StatSnapshot> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &StatSnapshot> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snap(n: usize) -> StatSnapshot {
        StatSnapshot {
            id: Some(n.to_string()),
            cpu_usage: n as f64,
            ..Default::default()
        }
    }

    fn ids(buffer: &HistoryBuffer) -> Vec<String> {
        buffer.iter().filter_map(|s| s.id.clone()).collect()
    }

    #[test]
    fn keeps_last_records_across_polls() {
        let mut buffer = HistoryBuffer::new(DEFAULT_HISTORY_CAPACITY);
        let mut appended = 0;

        for poll in 0..13 {
            let batch: Vec<_> = (0..7).map(|k| snap(poll * 7 + k)).collect();
            appended += batch.len();
            buffer.extend(batch);
            assert_eq!(buffer.len(), appended.min(50));
        }

        let expected: Vec<String> = (appended - 50..appended).map(|n| n.to_string()).collect();
        assert_eq!(ids(&buffer), expected);
    }

    #[test]
    fn full_buffer_drops_exactly_the_oldest() {
        let mut buffer = HistoryBuffer::new(50);
        buffer.extend((0..50).map(snap));
        assert_eq!(buffer.len(), 50);

        buffer.push(snap(50));

        assert_eq!(buffer.len(), 50);
        assert_eq!(buffer.iter().next().and_then(|s| s.id.as_deref()), Some("1"));
        assert_eq!(buffer.latest().and_then(|s| s.id.as_deref()), Some("50"));
    }

    #[test]
    fn oversized_batch_keeps_its_tail() {
        let mut buffer = HistoryBuffer::new(50);
        buffer.push(snap(999));
        buffer.extend((0..120).map(snap));

        let expected: Vec<String> = (70..120).map(|n| n.to_string()).collect();
        assert_eq!(ids(&buffer), expected);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut buffer = HistoryBuffer::new(0);
        buffer.extend((0..3).map(snap));
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(ids(&buffer), vec!["2".to_string()]);
    }

    #[test]
    fn empty_buffer_has_no_latest() {
        let buffer = HistoryBuffer::default();
        assert!(buffer.is_empty());
        assert!(buffer.latest().is_none());
    }
}
