//! Telemetry aggregation: typed records, bounded history and poll shaping

pub mod aggregator;
pub mod chart;
pub mod error;
pub mod history;
pub mod model;
pub mod view;

pub use aggregator::{derive_unique_users, PollBatch, TelemetryAggregator};
pub use error::ApiError;
pub use history::HistoryBuffer;
pub use model::{PollContext, ProcessRecord, StatSnapshot, SystemStatus, UserSummary};
pub use view::TelemetryView;
