//! Chart projection of a history buffer

use crate::telemetry::history::HistoryBuffer;

/// Memory axis bound used when the latest snapshot reports no total.
pub const DEFAULT_MEMORY_BOUND_GB: f64 = 10.0;
/// Disk axis bound used when the latest snapshot reports no total.
pub const DEFAULT_DISK_BOUND_GB: f64 = 50.0;
pub const CPU_BOUND_PERCENT: f64 = 100.0;

/// Three time series, x = sample index, ready for `ratatui::widgets::Chart`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartData {
    pub cpu: Vec<(f64, f64)>,
    pub memory: Vec<(f64, f64)>,
    pub disk: Vec<(f64, f64)>,
    pub memory_bound: f64,
    pub disk_bound: f64,
}

impl ChartData {
    /// `None` for an empty history; there is nothing to plot.
    pub fn from_history(history: &HistoryBuffer) -> Option<Self> {
        let latest = history.latest()?;

        let mut data = Self {
            memory_bound: axis_bound(latest.memory_total, DEFAULT_MEMORY_BOUND_GB),
            disk_bound: axis_bound(latest.disk_total, DEFAULT_DISK_BOUND_GB),
            ..Default::default()
        };

        for (i, snap) in history.iter().enumerate() {
            let x = i as f64;
            data.cpu.push((x, snap.cpu_usage));
            data.memory.push((x, round3(snap.memory_used)));
            data.disk.push((x, round3(snap.disk_used)));
        }

        Some(data)
    }

    /// Upper bound of the x axis; never zero so a single sample still plots.
    pub fn x_bound(&self) -> f64 {
        (self.cpu.len().saturating_sub(1) as f64).max(1.0)
    }
}

fn axis_bound(total: f64, fallback: f64) -> f64 {
    let rounded = round3(total);
    if rounded > 0.0 {
        rounded
    } else {
        fallback
    }
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::model::StatSnapshot;

    fn history(snaps: Vec<StatSnapshot>) -> HistoryBuffer {
        let mut buffer = HistoryBuffer::default();
        buffer.extend(snaps);
        buffer
    }

    #[test]
    fn memory_bound_falls_back_without_total() {
        let data = ChartData::from_history(&history(vec![StatSnapshot::default()])).unwrap();
        assert_eq!(data.memory_bound, DEFAULT_MEMORY_BOUND_GB);
        assert_eq!(data.disk_bound, DEFAULT_DISK_BOUND_GB);
    }

    #[test]
    fn bounds_come_from_the_latest_snapshot() {
        let data = ChartData::from_history(&history(vec![
            StatSnapshot {
                memory_total: 8.0,
                disk_total: 100.0,
                ..Default::default()
            },
            StatSnapshot {
                memory_total: 16.0,
                disk_total: 256.1234,
                ..Default::default()
            },
        ]))
        .unwrap();

        assert_eq!(data.memory_bound, 16.0);
        assert_eq!(data.disk_bound, 256.123);
    }

    #[test]
    fn series_follow_history_order() {
        let data = ChartData::from_history(&history(vec![
            StatSnapshot {
                cpu_usage: 10.0,
                memory_used: 1.23456,
                ..Default::default()
            },
            StatSnapshot {
                cpu_usage: 20.0,
                disk_used: 3.0,
                ..Default::default()
            },
        ]))
        .unwrap();

        assert_eq!(data.cpu, vec![(0.0, 10.0), (1.0, 20.0)]);
        assert_eq!(data.memory, vec![(0.0, 1.235), (1.0, 0.0)]);
        assert_eq!(data.disk[1], (1.0, 3.0));
        assert_eq!(data.x_bound(), 1.0);
    }

    #[test]
    fn empty_history_has_no_chart() {
        assert!(ChartData::from_history(&HistoryBuffer::default()).is_none());
    }
}
