//! Reporting period columns.
//!
//! A column is one year/period/type combination selected in the dashboard's
//! period picker, or a custom month range. Columns are read-only to the
//! exporter and immutable for the duration of one export.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Inclusive month range for custom-range columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRange {
    /// First month (1-12).
    pub start: u32,
    /// Last month (1-12), inclusive.
    pub end: u32,
}

impl MonthRange {
    /// Months covered by the range; empty when the bounds are invalid.
    pub fn months(&self) -> Vec<u32> {
        if self.start == 0 || self.end > 12 || self.start > self.end {
            return Vec::new();
        }
        (self.start..=self.end).collect()
    }
}

/// One reporting column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodColumn {
    /// Stable identifier, unique within the active column order.
    pub id: String,
    /// Calendar year.
    pub year: i32,
    /// Month name, quarter (`Q1`..`Q4`), half (`HY1`/`HY2`), or `FY`.
    /// `None` means the full year.
    #[serde(default)]
    pub month: Option<String>,
    /// Data type, e.g. `Actual`, `Budget`, `Estimate`, `Forecast`.
    #[serde(rename = "type")]
    pub data_type: String,
    /// Whether this column is a custom month range.
    #[serde(default)]
    pub is_custom_range: bool,
    /// Month range when `is_custom_range` is set.
    #[serde(default)]
    pub custom_range: Option<MonthRange>,
    /// Label override from the period picker.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Colour scheme name chosen by the user.
    #[serde(default)]
    pub custom_color: Option<String>,
}

impl PeriodColumn {
    /// Create a full-year column.
    pub fn new(id: impl Into<String>, year: i32, data_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            year,
            month: None,
            data_type: data_type.into(),
            is_custom_range: false,
            custom_range: None,
            display_name: None,
            custom_color: None,
        }
    }

    /// Set the month/quarter/half selector.
    pub fn with_month(mut self, month: impl Into<String>) -> Self {
        self.month = Some(month.into());
        self
    }

    /// Turn the column into a custom month range.
    pub fn with_range(mut self, start: u32, end: u32) -> Self {
        self.is_custom_range = true;
        self.custom_range = Some(MonthRange { start, end });
        self
    }

    /// Set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set the colour scheme name.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.custom_color = Some(color.into());
        self
    }

    /// Key under which the column's figures are stored in a dataset.
    pub fn key(&self) -> &str {
        &self.id
    }

    /// Months (1-12) aggregated by this column.
    pub fn months(&self) -> Vec<u32> {
        if self.is_custom_range {
            return self.custom_range.map(|r| r.months()).unwrap_or_default();
        }

        let Some(selector) = self.month.as_deref() else {
            return (1..=12).collect();
        };
        let selector = selector.trim();
        let upper = selector.to_ascii_uppercase();
        match upper.as_str() {
            "" | "FY" | "YEAR" | "FULL YEAR" => (1..=12).collect(),
            "Q1" => vec![1, 2, 3],
            "Q2" => vec![4, 5, 6],
            "Q3" => vec![7, 8, 9],
            "Q4" => vec![10, 11, 12],
            "HY1" | "H1" => (1..=6).collect(),
            "HY2" | "H2" => (7..=12).collect(),
            _ => month_number(selector).map(|m| vec![m]).unwrap_or_default(),
        }
    }

    /// Human label for headers and chart axes.
    pub fn label(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        if self.is_custom_range {
            if let Some(range) = self.custom_range {
                let start = short_month(range.start);
                let end = short_month(range.end);
                return format!("{}-{} {} {}", start, end, self.year, self.data_type);
            }
        }
        match self.month.as_deref() {
            None => format!("FY {} {}", self.year, self.data_type),
            Some(m) if m.eq_ignore_ascii_case("FY") || m.eq_ignore_ascii_case("year") => {
                format!("FY {} {}", self.year, self.data_type)
            }
            Some(m) => format!("{} {} {}", m, self.year, self.data_type),
        }
    }
}

/// Resolve a month name or number to 1-12.
fn month_number(s: &str) -> Option<u32> {
    if let Ok(n) = s.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let lower = s.to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .position(|name| {
            let name = name.to_ascii_lowercase();
            name == lower || (lower.len() >= 3 && name.starts_with(&lower))
        })
        .map(|idx| idx as u32 + 1)
}

fn short_month(m: u32) -> &'static str {
    MONTH_NAMES
        .get((m as usize).wrapping_sub(1))
        .map(|n| &n[..3])
        .unwrap_or("?")
}

/// Check that every column id is unique within the active order.
pub fn validate_column_order(columns: &[PeriodColumn]) -> Result<()> {
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.id.as_str()) {
            return Err(Error::DuplicatePeriod {
                id: column.id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_year_months() {
        let col = PeriodColumn::new("2025-fy-actual", 2025, "Actual");
        assert_eq!(col.months(), (1..=12).collect::<Vec<_>>());
        assert_eq!(col.label(), "FY 2025 Actual");
    }

    #[test]
    fn test_quarter_half_and_month_selectors() {
        let q2 = PeriodColumn::new("q2", 2025, "Budget").with_month("Q2");
        assert_eq!(q2.months(), vec![4, 5, 6]);

        let hy2 = PeriodColumn::new("hy2", 2025, "Actual").with_month("HY2");
        assert_eq!(hy2.months(), vec![7, 8, 9, 10, 11, 12]);

        let march = PeriodColumn::new("mar", 2025, "Actual").with_month("March");
        assert_eq!(march.months(), vec![3]);

        let sept = PeriodColumn::new("sep", 2025, "Actual").with_month("sep");
        assert_eq!(sept.months(), vec![9]);

        let bogus = PeriodColumn::new("x", 2025, "Actual").with_month("Smarch");
        assert!(bogus.months().is_empty());
    }

    #[test]
    fn test_custom_range() {
        let col = PeriodColumn::new("custom", 2024, "Actual").with_range(2, 5);
        assert_eq!(col.months(), vec![2, 3, 4, 5]);
        assert_eq!(col.label(), "Feb-May 2024 Actual");

        let inverted = PeriodColumn::new("bad", 2024, "Actual").with_range(9, 3);
        assert!(inverted.months().is_empty());
    }

    #[test]
    fn test_display_name_wins() {
        let col = PeriodColumn::new("a", 2025, "Actual").with_display_name("This Year");
        assert_eq!(col.label(), "This Year");
    }

    #[test]
    fn test_camel_case_wire_format() {
        let json = r#"{"id":"p1","year":2025,"month":"Q1","type":"Actual",
            "isCustomRange":false,"displayName":"Q1 25","customColor":"green"}"#;
        let col: PeriodColumn = serde_json::from_str(json).unwrap();
        assert_eq!(col.data_type, "Actual");
        assert_eq!(col.display_name.as_deref(), Some("Q1 25"));
        assert_eq!(col.custom_color.as_deref(), Some("green"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let cols = vec![
            PeriodColumn::new("a", 2024, "Actual"),
            PeriodColumn::new("b", 2025, "Actual"),
            PeriodColumn::new("a", 2025, "Budget"),
        ];
        match validate_column_order(&cols) {
            Err(Error::DuplicatePeriod { id }) => assert_eq!(id, "a"),
            other => panic!("expected DuplicatePeriod, got {:?}", other),
        }
        assert!(validate_column_order(&cols[..2]).is_ok());
    }
}
