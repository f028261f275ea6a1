//! Data-driven chart construction.
//!
//! A [`ChartContext`] is a plain value (labels, colours, numbers) with no
//! reference into the running dashboard. [`ChartContext::to_option`] turns it
//! into an ECharts option object; the live views and the exported artifact
//! both hand that object straight to `setOption`, so there is one source of
//! truth for how a chart looks.

use crate::format::{format_value, to_fixed};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Chart layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// One bar per period per series.
    Bar,
    /// Series stacked into one bar per period.
    StackedBar,
    /// One line per series.
    Line,
    /// Single percentage dial, last series value of the last period.
    Gauge,
}

/// One x-axis category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPeriod {
    /// Dataset key of the period.
    pub key: String,
    /// Axis label.
    pub label: String,
    /// Period colour (used for single-series bars).
    pub color: String,
}

/// One plotted series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    /// One value per period, same order as [`ChartContext::periods`].
    pub values: Vec<f64>,
    /// Optional fixed colour; single-series bars use period colours instead.
    #[serde(default)]
    pub color: Option<String>,
    /// Plot on the secondary y axis.
    #[serde(default)]
    pub secondary_axis: bool,
}

impl ChartSeries {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
            color: None,
            secondary_axis: false,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn on_secondary_axis(mut self) -> Self {
        self.secondary_axis = true;
        self
    }
}

/// Everything needed to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartContext {
    /// Element id suffix inside the detail region.
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub periods: Vec<ChartPeriod>,
    pub series: Vec<ChartSeries>,
    /// Unit appended to axis names, e.g. `MT` or `AED`.
    #[serde(default)]
    pub unit: Option<String>,
}

impl ChartContext {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: ChartKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            periods: Vec::new(),
            series: Vec::new(),
            unit: None,
        }
    }

    pub fn with_periods(mut self, periods: Vec<ChartPeriod>) -> Self {
        self.periods = periods;
        self
    }

    pub fn with_series(mut self, series: ChartSeries) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Build the ECharts option object.
    pub fn to_option(&self) -> Value {
        match self.kind {
            ChartKind::Gauge => self.gauge_option(),
            _ => self.axis_option(),
        }
    }

    fn axis_option(&self) -> Value {
        let labels: Vec<&str> = self.periods.iter().map(|p| p.label.as_str()).collect();
        let single = self.series.len() == 1;
        let uses_secondary = self.series.iter().any(|s| s.secondary_axis);

        let series: Vec<Value> = self
            .series
            .iter()
            .map(|s| {
                let data: Vec<Value> = s
                    .values
                    .iter()
                    .zip(self.periods.iter())
                    .map(|(v, p)| {
                        let mut item = json!({
                            "value": sanitize(*v),
                            "label": { "formatter": format_value(*v) },
                        });
                        if single && self.kind == ChartKind::Bar && s.color.is_none() {
                            item["itemStyle"] = json!({ "color": p.color });
                        }
                        item
                    })
                    .collect();

                let mut entry = json!({
                    "name": s.name,
                    "type": if self.kind == ChartKind::Line { "line" } else { "bar" },
                    "data": data,
                    "label": {
                        "show": self.kind != ChartKind::StackedBar,
                        "position": "top",
                    },
                    "emphasis": { "focus": "series" },
                });
                if self.kind == ChartKind::StackedBar {
                    entry["stack"] = json!("total");
                }
                if s.secondary_axis {
                    entry["yAxisIndex"] = json!(1);
                    entry["type"] = json!("line");
                }
                if let Some(color) = &s.color {
                    entry["itemStyle"] = json!({ "color": color });
                }
                entry
            })
            .collect();

        let axis_name = self.unit.clone().unwrap_or_default();
        let mut y_axis = vec![json!({ "type": "value", "name": axis_name })];
        if uses_secondary {
            y_axis.push(json!({ "type": "value", "splitLine": { "show": false } }));
        }

        json!({
            "title": { "text": self.title, "left": "center" },
            "tooltip": { "trigger": "axis" },
            "legend": { "show": !single, "bottom": 0 },
            "grid": { "left": 48, "right": 48, "top": 56, "bottom": 48, "containLabel": true },
            "xAxis": { "type": "category", "data": labels },
            "yAxis": y_axis,
            "series": series,
        })
    }

    fn gauge_option(&self) -> Value {
        let value = self
            .series
            .last()
            .and_then(|s| s.values.last())
            .copied()
            .map(sanitize)
            .unwrap_or(0.0);
        let label = self
            .periods
            .last()
            .map(|p| p.label.clone())
            .unwrap_or_default();
        let color = self
            .periods
            .last()
            .map(|p| p.color.clone())
            .unwrap_or_else(|| "#288cfa".to_string());

        json!({
            "title": { "text": self.title, "left": "center" },
            "series": [{
                "type": "gauge",
                "min": 0,
                "max": 100,
                "progress": { "show": true, "itemStyle": { "color": color } },
                "detail": { "formatter": format!("{}%", to_fixed(value, 1)) },
                "data": [{ "value": value, "name": label }],
            }],
        })
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
