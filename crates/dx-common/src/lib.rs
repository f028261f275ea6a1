//! Shared types for the divisional comprehensive-report exporter.
//!
//! This crate provides the value types every other crate builds on:
//! - The fixed [`ViewId`] enumeration of capturable report surfaces
//! - Reporting period columns and their colour schemes
//! - The unified export [`Error`] with stable codes
//! - Number and delta formatting shared with the replay runtime
//! - The single chart-construction module used by live views and the artifact

pub mod chart;
pub mod color;
pub mod error;
pub mod format;
pub mod period;
pub mod view;

pub use chart::{ChartContext, ChartKind, ChartPeriod, ChartSeries};
pub use color::{ColorScheme, COLOR_SCHEMES};
pub use error::{Error, ErrorCategory, Result};
pub use format::{format_delta, format_value, percent_delta, NEUTRAL_GLYPH};
pub use period::{validate_column_order, MonthRange, PeriodColumn};
pub use view::ViewId;
