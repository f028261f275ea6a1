//! Metric recomputation.
//!
//! Every number the exported report prints is re-derived here from the raw
//! source records, independent of whatever the live views have painted.

pub mod dataset;
pub mod metric;
pub mod recompute;
pub mod sanitize;

pub use dataset::{MetricDataset, PeriodMetrics};
pub use metric::Metric;
pub use recompute::{recompute, recompute_detailed, RawValue, Recomputation, SourceRecord};
pub use sanitize::{sanitize_number, Sanitized};
