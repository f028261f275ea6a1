//! Chart-bearing views rebuilt from the metric dataset.
//!
//! Each view gets one or more chart contexts (rendered by the runtime via
//! `setOption`) and a value table whose every cell is formatted here, so the
//! printed numbers never depend on the chart library loading.

use super::PeriodInfo;
use dx_common::format::to_fixed;
use dx_common::{
    format_delta, format_value, percent_delta, ChartContext, ChartKind, ChartPeriod, ChartSeries,
    ViewId, COLOR_SCHEMES,
};
use dx_metrics::{Metric, MetricDataset};

/// Number format for a value-table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    /// `n.nn M` / `n.n K` / integer.
    Magnitude,
    /// Two decimals, for per-kg figures.
    PerUnit,
    /// One decimal with a percent sign.
    Percent,
}

impl RowFormat {
    /// Default format for a metric's values.
    pub fn for_metric(metric: Metric) -> Self {
        match metric {
            Metric::MarginPerKg => RowFormat::PerUnit,
            _ => RowFormat::Magnitude,
        }
    }

    pub fn apply(&self, value: f64) -> String {
        match self {
            RowFormat::Magnitude => format_value(value),
            RowFormat::PerUnit => to_fixed(value, 2),
            RowFormat::Percent => format!("{}%", to_fixed(value, 1)),
        }
    }
}

/// One row of pre-formatted values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRow {
    pub label: String,
    pub cells: Vec<String>,
    /// Delta against the previous visible period; empty for the first.
    pub deltas: Vec<String>,
}

impl ValueRow {
    pub fn new(label: impl Into<String>, values: &[f64], format: RowFormat) -> Self {
        let cells = values.iter().map(|v| format.apply(*v)).collect();
        let deltas = values
            .iter()
            .enumerate()
            .map(|(i, curr)| match i {
                0 => String::new(),
                _ => format_delta(percent_delta(values[i - 1], *curr)),
            })
            .collect();
        Self {
            label: label.into(),
            cells,
            deltas,
        }
    }

    /// `(cell, delta)` pairs in period order.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &String)> {
        self.cells.iter().zip(self.deltas.iter())
    }
}

/// Period-by-row value table.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTable {
    pub headers: Vec<PeriodInfo>,
    pub rows: Vec<ValueRow>,
}

/// A chart mount point inside a detail region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSlot {
    /// Element id, `chart-<context id>`.
    pub id: String,
    pub title: String,
}

/// Everything a chart-bearing detail region needs.
#[derive(Debug, Clone)]
pub struct ChartDetail {
    pub slots: Vec<ChartSlot>,
    pub contexts: Vec<ChartContext>,
    pub table: ValueTable,
}

fn series_color(i: usize) -> &'static str {
    COLOR_SCHEMES[i % COLOR_SCHEMES.len()].primary
}

/// Margin over material as a percentage of sales, per period.
pub(crate) fn margin_percent(dataset: &MetricDataset) -> Vec<f64> {
    dataset
        .iter()
        .map(|(_, m)| {
            if m.sales == 0.0 {
                0.0
            } else {
                m.margin_over_material / m.sales * 100.0
            }
        })
        .collect()
}

fn metric_series(dataset: &MetricDataset, metric: Metric) -> ChartSeries {
    ChartSeries::new(metric.label(), dataset.series(metric))
}

fn metric_rows(dataset: &MetricDataset, metrics: &[Metric]) -> Vec<ValueRow> {
    metrics
        .iter()
        .map(|m| ValueRow::new(m.label(), &dataset.series(*m), RowFormat::Magnitude))
        .collect()
}

fn stacked(base: ChartContext, dataset: &MetricDataset, metrics: &[Metric]) -> ChartContext {
    metrics.iter().enumerate().fold(base, |c, (i, m)| {
        c.with_series(metric_series(dataset, *m).with_color(series_color(i)))
    })
}

/// Build the chart detail for a chart-bearing view; `None` for other views.
pub fn chart_detail(
    view: ViewId,
    periods: &[PeriodInfo],
    dataset: &MetricDataset,
) -> Option<ChartDetail> {
    let chart_periods: Vec<ChartPeriod> = periods
        .iter()
        .map(|p| ChartPeriod {
            key: p.key.clone(),
            label: p.label.clone(),
            color: p.color.clone(),
        })
        .collect();
    let ctx = |suffix: &str, title: &str, kind: ChartKind| {
        ChartContext::new(format!("{}-{}", view.as_str(), suffix), title, kind)
            .with_periods(chart_periods.clone())
    };
    let (contexts, table_rows) = match view {
        ViewId::SalesVolume => (
            vec![
                ctx("sales", "Sales", ChartKind::Bar).with_series(metric_series(dataset, Metric::Sales)),
                ctx("volume", "Sales Volume", ChartKind::Bar)
                    .with_series(metric_series(dataset, Metric::SalesVolume))
                    .with_unit("kg"),
            ],
            metric_rows(dataset, &[Metric::Sales, Metric::SalesVolume, Metric::ProductionVolume]),
        ),
        ViewId::MarginAnalysis => {
            let pct = margin_percent(dataset);
            let mut table = metric_rows(dataset, &[
                Metric::Sales,
                Metric::MaterialCost,
                Metric::MarginOverMaterial,
            ]);
            table.push(ValueRow::new(
                Metric::MarginPerKg.label(),
                &dataset.series(Metric::MarginPerKg),
                RowFormat::PerUnit,
            ));
            table.push(ValueRow::new("Margin % of Sales", &pct, RowFormat::Percent));
            (
                vec![
                    ctx("margin", "Margin over Material", ChartKind::Bar)
                        .with_series(metric_series(dataset, Metric::MarginOverMaterial))
                        .with_series(
                            metric_series(dataset, Metric::MarginPerKg)
                                .with_color(series_color(2))
                                .on_secondary_axis(),
                        ),
                    ctx("margin-pct", "Margin % of Sales", ChartKind::Gauge)
                        .with_series(ChartSeries::new("Margin % of Sales", pct)),
                ],
                table,
            )
        }
        ViewId::ManufacturingCost => {
            let parts = [
                Metric::Labour,
                Metric::Depreciation,
                Metric::Electricity,
                Metric::OtherOverheads,
            ];
            let mut table = metric_rows(dataset, &parts);
            table.extend(metric_rows(dataset, &[Metric::TotalManufacturingCost]));
            (vec![stacked(ctx("stack", view.title(), ChartKind::StackedBar), dataset, &parts)], table)
        }
        ViewId::BelowGpExpenses => {
            let parts = [Metric::Selling, Metric::Administration, Metric::FinanceCost];
            let mut table = metric_rows(dataset, &parts);
            table.extend(metric_rows(dataset, &[Metric::TotalBelowGp]));
            (vec![stacked(ctx("stack", view.title(), ChartKind::StackedBar), dataset, &parts)], table)
        }
        ViewId::CombinedTrends => {
            let lines = [Metric::Sales, Metric::GrossProfit, Metric::NetProfit];
            let context = lines
                .iter()
                .enumerate()
                .fold(ctx("trend", "Combined Trends", ChartKind::Line), |c, (i, m)| {
                    c.with_series(metric_series(dataset, *m).with_color(series_color(i)))
                });
            (vec![context], metric_rows(dataset, &lines))
        }
        _ => return None,
    };

    let slots = contexts
        .iter()
        .map(|c| ChartSlot {
            id: format!("chart-{}", c.id),
            title: c.title.clone(),
        })
        .collect();

    Some(ChartDetail {
        slots,
        contexts,
        table: ValueTable {
            headers: periods.to_vec(),
            rows: table_rows,
        },
    })
}
