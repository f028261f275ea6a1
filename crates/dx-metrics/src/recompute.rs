//! Per-period metric recomputation from source records.

use crate::metric::Metric;
use crate::sanitize::{sanitize_number, Sanitized};
use dx_common::PeriodColumn;
use serde::{Deserialize, Serialize};

/// A source value as delivered by the dashboard: a number or formatted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    pub fn sanitize(&self) -> Sanitized {
        match self {
            RawValue::Number(n) if n.is_finite() => Sanitized::Value(*n),
            RawValue::Number(_) => Sanitized::Invalid,
            RawValue::Text(s) => sanitize_number(s),
        }
    }
}

/// One ledger row for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
    /// Data type, e.g. `Actual` or `Budget`.
    #[serde(rename = "type")]
    pub data_type: String,
    /// Ledger row index (see [`Metric::index`]).
    pub ledger: u32,
    /// Missing values count as zero without being flagged.
    #[serde(default)]
    pub value: Option<RawValue>,
}

impl SourceRecord {
    pub fn new(
        year: i32,
        month: u32,
        data_type: impl Into<String>,
        ledger: u32,
        value: RawValue,
    ) -> Self {
        Self {
            year,
            month,
            data_type: data_type.into(),
            ledger,
            value: Some(value),
        }
    }

    fn matches(&self, column: &PeriodColumn, months: &[u32], ledger: u32) -> bool {
        self.ledger == ledger
            && self.year == column.year
            && self.data_type.eq_ignore_ascii_case(&column.data_type)
            && months.contains(&self.month)
    }
}

/// A recomputed value plus the number of values that failed to sanitize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recomputation {
    pub value: f64,
    pub invalid: usize,
}

/// Recompute one metric for one period column.
pub fn recompute(records: &[SourceRecord], column: &PeriodColumn, metric: Metric) -> f64 {
    recompute_detailed(records, column, metric).value
}

/// Recompute one metric, also reporting sanitization failures.
///
/// Base metrics sum matching ledger rows in record order. Derived metrics
/// combine base recomputations through [`Metric::derive`]. A non-finite sum
/// is replaced by zero and counted as invalid.
pub fn recompute_detailed(
    records: &[SourceRecord],
    column: &PeriodColumn,
    metric: Metric,
) -> Recomputation {
    let months = column.months();

    if metric.is_derived() {
        let invalid = std::cell::Cell::new(0usize);
        let value = metric
            .derive(|base| {
                let r = sum_base(records, column, &months, base);
                invalid.set(invalid.get() + r.invalid);
                r.value
            })
            .unwrap_or(0.0);
        return finite(Recomputation {
            value,
            invalid: invalid.get(),
        });
    }

    sum_base(records, column, &months, metric)
}

fn sum_base(
    records: &[SourceRecord],
    column: &PeriodColumn,
    months: &[u32],
    metric: Metric,
) -> Recomputation {
    let ledger = metric.index();
    let mut value = 0.0;
    let mut invalid = 0;
    for record in records.iter().filter(|r| r.matches(column, months, ledger)) {
        match record.value.as_ref().map(RawValue::sanitize) {
            Some(Sanitized::Value(v)) => value += v,
            Some(Sanitized::Invalid) => invalid += 1,
            None => {}
        }
    }
    finite(Recomputation { value, invalid })
}

fn finite(r: Recomputation) -> Recomputation {
    if r.value.is_finite() {
        r
    } else {
        Recomputation {
            value: 0.0,
            invalid: r.invalid + 1,
        }
    }
}
