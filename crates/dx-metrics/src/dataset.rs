//! The per-export metric dataset.

use crate::metric::Metric;
use crate::recompute::{recompute_detailed, SourceRecord};
use dx_common::{validate_column_order, Error, PeriodColumn, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Recomputed figures for one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodMetrics {
    pub sales: f64,
    pub material_cost: f64,
    pub sales_volume: f64,
    pub production_volume: f64,
    pub labour: f64,
    pub depreciation: f64,
    pub electricity: f64,
    pub other_overheads: f64,
    pub selling: f64,
    pub administration: f64,
    pub finance_cost: f64,
    pub margin_over_material: f64,
    pub margin_per_kg: f64,
    pub total_manufacturing_cost: f64,
    pub gross_profit: f64,
    pub total_below_gp: f64,
    pub net_profit: f64,
}

impl PeriodMetrics {
    pub fn get(&self, metric: Metric) -> f64 {
        *self.slot(metric)
    }

    fn set(&mut self, metric: Metric, value: f64) {
        *self.slot_mut(metric) = value;
    }

    fn slot(&self, metric: Metric) -> &f64 {
        match metric {
            Metric::Sales => &self.sales,
            Metric::MaterialCost => &self.material_cost,
            Metric::SalesVolume => &self.sales_volume,
            Metric::ProductionVolume => &self.production_volume,
            Metric::Labour => &self.labour,
            Metric::Depreciation => &self.depreciation,
            Metric::Electricity => &self.electricity,
            Metric::OtherOverheads => &self.other_overheads,
            Metric::Selling => &self.selling,
            Metric::Administration => &self.administration,
            Metric::FinanceCost => &self.finance_cost,
            Metric::MarginOverMaterial => &self.margin_over_material,
            Metric::MarginPerKg => &self.margin_per_kg,
            Metric::TotalManufacturingCost => &self.total_manufacturing_cost,
            Metric::GrossProfit => &self.gross_profit,
            Metric::TotalBelowGp => &self.total_below_gp,
            Metric::NetProfit => &self.net_profit,
        }
    }

    fn slot_mut(&mut self, metric: Metric) -> &mut f64 {
        match metric {
            Metric::Sales => &mut self.sales,
            Metric::MaterialCost => &mut self.material_cost,
            Metric::SalesVolume => &mut self.sales_volume,
            Metric::ProductionVolume => &mut self.production_volume,
            Metric::Labour => &mut self.labour,
            Metric::Depreciation => &mut self.depreciation,
            Metric::Electricity => &mut self.electricity,
            Metric::OtherOverheads => &mut self.other_overheads,
            Metric::Selling => &mut self.selling,
            Metric::Administration => &mut self.administration,
            Metric::FinanceCost => &mut self.finance_cost,
            Metric::MarginOverMaterial => &mut self.margin_over_material,
            Metric::MarginPerKg => &mut self.margin_per_kg,
            Metric::TotalManufacturingCost => &mut self.total_manufacturing_cost,
            Metric::GrossProfit => &mut self.gross_profit,
            Metric::TotalBelowGp => &mut self.total_below_gp,
            Metric::NetProfit => &mut self.net_profit,
        }
    }

    fn is_empty_period(&self) -> bool {
        self.sales == 0.0 && self.sales_volume == 0.0
    }
}

/// Recomputed figures for every visible period, in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDataset {
    /// Period keys in visible column order.
    pub order: Vec<String>,
    /// Figures keyed by period key.
    pub periods: BTreeMap<String, PeriodMetrics>,
}

impl MetricDataset {
    /// Recompute every metric for every visible column.
    ///
    /// Fails with `DuplicatePeriod` on a repeated column id, and with
    /// `ComputationInvalid` when there are no columns or every column has
    /// zero sales and zero sales volume (data not generated yet).
    pub fn build(records: &[SourceRecord], columns: &[PeriodColumn]) -> Result<Self> {
        validate_column_order(columns)?;

        let mut order = Vec::with_capacity(columns.len());
        let mut periods = BTreeMap::new();
        let mut invalid_total = 0usize;

        for column in columns {
            let mut metrics = PeriodMetrics::default();
            for &metric in Metric::BASE.iter().chain(Metric::DERIVED) {
                let r = recompute_detailed(records, column, metric);
                // Derived metrics re-count their inputs; count base failures once.
                if !metric.is_derived() {
                    invalid_total += r.invalid;
                }
                metrics.set(metric, r.value);
            }
            debug!(
                period = column.key(),
                sales = metrics.sales,
                sales_volume = metrics.sales_volume,
                "period recomputed"
            );
            order.push(column.key().to_string());
            periods.insert(column.key().to_string(), metrics);
        }

        if invalid_total > 0 {
            warn!(
                invalid_values = invalid_total,
                "source values failed to parse and were counted as zero"
            );
        }

        if periods.values().all(PeriodMetrics::is_empty_period) {
            return Err(Error::ComputationInvalid {
                periods: columns.len(),
            });
        }

        Ok(Self { order, periods })
    }

    /// Figures for a period key.
    pub fn get(&self, key: &str) -> Option<&PeriodMetrics> {
        self.periods.get(key)
    }

    /// Periods in visible order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PeriodMetrics)> {
        self.order
            .iter()
            .filter_map(|k| self.periods.get(k).map(|m| (k.as_str(), m)))
    }

    /// One metric across all periods, in visible order.
    pub fn series(&self, metric: Metric) -> Vec<f64> {
        self.iter().map(|(_, m)| m.get(metric)).collect()
    }

    /// Deterministic JSON serialization.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
