//! Artifact sections.

pub mod cards;
pub mod charts;
pub mod details;
pub mod kpis;

pub use cards::CardView;
pub use charts::{chart_detail, ChartDetail, ChartSlot, RowFormat, ValueRow, ValueTable};
pub use details::DetailView;
pub use kpis::{kpi_values, rewrite_metric_cells};

use dx_common::{ColorScheme, PeriodColumn};
use serde::Serialize;

/// A visible period as shown in headers, axes and the data block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodInfo {
    pub key: String,
    pub label: String,
    pub color: String,
    pub text_color: String,
}

impl PeriodInfo {
    /// Periods in visible column order, with their colour schemes.
    pub fn from_columns(columns: &[PeriodColumn]) -> Vec<PeriodInfo> {
        columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let scheme = ColorScheme::for_column(col, i);
                PeriodInfo {
                    key: col.key().to_string(),
                    label: col.label(),
                    color: scheme.primary.to_string(),
                    text_color: scheme.text_color().to_string(),
                }
            })
            .collect()
    }
}
