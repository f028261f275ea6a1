//! Dataset-driven figures for captured views.
//!
//! Captured markup is a snapshot of what the dashboard painted. The KPI
//! detail carries a headline table built from the dataset, and any captured
//! cell tagged with `data-metric` / `data-period` has its text replaced by
//! the recomputed value.

use super::charts::{margin_percent, RowFormat, ValueRow, ValueTable};
use super::PeriodInfo;
use dx_metrics::{Metric, MetricDataset};
use regex::{Captures, Regex};
use std::sync::OnceLock;

const HEADLINE: &[Metric] = &[
    Metric::Sales,
    Metric::SalesVolume,
    Metric::MarginOverMaterial,
    Metric::MarginPerKg,
    Metric::GrossProfit,
    Metric::NetProfit,
];

/// Headline figures for the KPI detail, one column per visible period.
pub fn kpi_values(periods: &[PeriodInfo], dataset: &MetricDataset) -> ValueTable {
    let mut rows: Vec<ValueRow> = HEADLINE
        .iter()
        .map(|m| ValueRow::new(m.label(), &dataset.series(*m), RowFormat::for_metric(*m)))
        .collect();
    rows.push(ValueRow::new(
        "Margin % of Sales",
        &margin_percent(dataset),
        RowFormat::Percent,
    ));
    ValueTable {
        headers: periods.to_vec(),
        rows,
    }
}

fn tagged_element() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"<([A-Za-z][A-Za-z0-9-]*)(\s[^>]*\bdata-metric\s*=\s*"[^"]*"[^>]*)>([^<]*)</([A-Za-z][A-Za-z0-9-]*)\s*>"#,
        )
        .ok()
    })
    .as_ref()
}

fn data_attr() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\bdata-(metric|period)\s*=\s*"([^"]*)""#).ok())
        .as_ref()
}

/// Replace the text of tagged leaf elements with dataset values.
///
/// Returns the rewritten markup and the number of cells replaced. Cells whose
/// metric or period is unknown keep their captured text.
pub fn rewrite_metric_cells(markup: &str, dataset: &MetricDataset) -> (String, usize) {
    let (Some(element), Some(attr)) = (tagged_element(), data_attr()) else {
        return (markup.to_string(), 0);
    };

    let mut replaced = 0;
    let out = element.replace_all(markup, |caps: &Captures| {
        if !caps[1].eq_ignore_ascii_case(&caps[4]) {
            return caps[0].to_string();
        }
        let mut metric = None;
        let mut period = None;
        for a in attr.captures_iter(&caps[2]) {
            match &a[1] {
                "metric" => metric = Metric::from_key(a[2].trim()),
                _ => period = Some(a[2].trim().to_string()),
            }
        }
        let value = match (metric, period) {
            (Some(m), Some(p)) => dataset.get(&p).map(|pm| (m, pm.get(m))),
            _ => None,
        };
        match value {
            Some((m, v)) => {
                replaced += 1;
                format!(
                    "<{}{}>{}</{}>",
                    &caps[1],
                    &caps[2],
                    RowFormat::for_metric(m).apply(v),
                    &caps[4]
                )
            }
            None => caps[0].to_string(),
        }
    });
    (out.into_owned(), replaced)
}
