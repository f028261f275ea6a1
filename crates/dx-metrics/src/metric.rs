//! Ledger metrics and their derivations.

use serde::{Deserialize, Serialize};

/// One recomputable figure.
///
/// Base metrics are summed straight from ledger rows with the matching
/// [`Metric::index`]. Derived metrics are combined from base metrics by
/// [`Metric::derive`], the one place their formulas live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Sales,
    MaterialCost,
    SalesVolume,
    ProductionVolume,
    Labour,
    Depreciation,
    Electricity,
    OtherOverheads,
    Selling,
    Administration,
    FinanceCost,
    // Derived
    MarginOverMaterial,
    MarginPerKg,
    TotalManufacturingCost,
    GrossProfit,
    TotalBelowGp,
    NetProfit,
}

impl Metric {
    /// Metrics summed directly from ledger rows.
    pub const BASE: &'static [Metric] = &[
        Metric::Sales,
        Metric::MaterialCost,
        Metric::SalesVolume,
        Metric::ProductionVolume,
        Metric::Labour,
        Metric::Depreciation,
        Metric::Electricity,
        Metric::OtherOverheads,
        Metric::Selling,
        Metric::Administration,
        Metric::FinanceCost,
    ];

    /// Metrics computed from base metrics.
    pub const DERIVED: &'static [Metric] = &[
        Metric::MarginOverMaterial,
        Metric::MarginPerKg,
        Metric::TotalManufacturingCost,
        Metric::GrossProfit,
        Metric::TotalBelowGp,
        Metric::NetProfit,
    ];

    /// Ledger row index. Derived metrics carry the row they occupy in the
    /// P&L layout; no source record is ever summed under those rows.
    pub fn index(&self) -> u32 {
        match self {
            Metric::Sales => 3,
            Metric::MarginOverMaterial => 4,
            Metric::MaterialCost => 5,
            Metric::MarginPerKg => 6,
            Metric::SalesVolume => 7,
            Metric::ProductionVolume => 8,
            Metric::Labour => 9,
            Metric::Depreciation => 10,
            Metric::Electricity => 12,
            Metric::OtherOverheads => 13,
            Metric::TotalManufacturingCost => 14,
            Metric::GrossProfit => 19,
            Metric::Selling => 31,
            Metric::Administration => 40,
            Metric::FinanceCost => 42,
            Metric::TotalBelowGp => 52,
            Metric::NetProfit => 54,
        }
    }

    pub fn is_derived(&self) -> bool {
        Metric::DERIVED.contains(self)
    }

    /// Every metric, base first.
    pub fn all() -> impl Iterator<Item = Metric> {
        Metric::BASE.iter().chain(Metric::DERIVED).copied()
    }

    /// Stable key, as used in the dataset JSON and `data-metric` attributes.
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Sales => "sales",
            Metric::MaterialCost => "materialCost",
            Metric::SalesVolume => "salesVolume",
            Metric::ProductionVolume => "productionVolume",
            Metric::Labour => "labour",
            Metric::Depreciation => "depreciation",
            Metric::Electricity => "electricity",
            Metric::OtherOverheads => "otherOverheads",
            Metric::Selling => "selling",
            Metric::Administration => "administration",
            Metric::FinanceCost => "financeCost",
            Metric::MarginOverMaterial => "marginOverMaterial",
            Metric::MarginPerKg => "marginPerKg",
            Metric::TotalManufacturingCost => "totalManufacturingCost",
            Metric::GrossProfit => "grossProfit",
            Metric::TotalBelowGp => "totalBelowGp",
            Metric::NetProfit => "netProfit",
        }
    }

    pub fn from_key(key: &str) -> Option<Metric> {
        Metric::all().find(|m| m.key() == key)
    }

    /// Row label in the P&L layout.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Sales => "Sales",
            Metric::MaterialCost => "Material",
            Metric::SalesVolume => "Sales Volume (kg)",
            Metric::ProductionVolume => "Production Volume (kg)",
            Metric::Labour => "Labour",
            Metric::Depreciation => "Depreciation",
            Metric::Electricity => "Electricity",
            Metric::OtherOverheads => "Others Mfg. Overheads",
            Metric::Selling => "Selling expenses",
            Metric::Administration => "Administration",
            Metric::FinanceCost => "Bank interest",
            Metric::MarginOverMaterial => "Margin over Material",
            Metric::MarginPerKg => "Margin per kg",
            Metric::TotalManufacturingCost => "Actual Direct Cost Spent",
            Metric::GrossProfit => "Gross profit (after Depn.)",
            Metric::TotalBelowGp => "Total Below GP Expenses",
            Metric::NetProfit => "Net Profit",
        }
    }

    /// Combine base values into a derived value.
    ///
    /// Returns `None` for base metrics. `base` must return the recomputed
    /// value of each base metric it is asked for.
    pub fn derive(&self, base: impl Fn(Metric) -> f64) -> Option<f64> {
        self.derive_with(&base)
    }

    fn derive_with(&self, base: &dyn Fn(Metric) -> f64) -> Option<f64> {
        let value = match self {
            Metric::MarginOverMaterial => base(Metric::Sales) - base(Metric::MaterialCost),
            Metric::MarginPerKg => {
                let volume = base(Metric::SalesVolume);
                if volume == 0.0 {
                    0.0
                } else {
                    (base(Metric::Sales) - base(Metric::MaterialCost)) / volume
                }
            }
            Metric::TotalManufacturingCost => {
                base(Metric::Labour)
                    + base(Metric::Depreciation)
                    + base(Metric::Electricity)
                    + base(Metric::OtherOverheads)
            }
            Metric::GrossProfit => {
                base(Metric::Sales)
                    - base(Metric::MaterialCost)
                    - (base(Metric::Labour)
                        + base(Metric::Depreciation)
                        + base(Metric::Electricity)
                        + base(Metric::OtherOverheads))
            }
            Metric::TotalBelowGp => {
                base(Metric::Selling) + base(Metric::Administration) + base(Metric::FinanceCost)
            }
            Metric::NetProfit => {
                let gross = Metric::GrossProfit.derive_with(base)?;
                let below = Metric::TotalBelowGp.derive_with(base)?;
                gross - below
            }
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_indices_are_unique() {
        let all: Vec<Metric> = Metric::BASE.iter().chain(Metric::DERIVED).copied().collect();
        let indices: HashSet<u32> = all.iter().map(|m| m.index()).collect();
        assert_eq!(indices.len(), all.len());
    }

    #[test]
    fn test_keys_match_serde_names() {
        for metric in Metric::all() {
            let json = serde_json::to_value(metric).unwrap();
            assert_eq!(json, serde_json::json!(metric.key()));
            assert_eq!(Metric::from_key(metric.key()), Some(metric));
        }
        assert_eq!(Metric::from_key("Sales"), None);
    }

    #[test]
    fn test_net_profit_derivation() {
        let base = |m: Metric| match m {
            Metric::Sales => 1_000.0,
            Metric::MaterialCost => 600.0,
            Metric::Labour => 50.0,
            Metric::Depreciation => 20.0,
            Metric::Electricity => 20.0,
            Metric::OtherOverheads => 10.0,
            Metric::Selling => 30.0,
            Metric::Administration => 40.0,
            Metric::FinanceCost => 5.0,
            _ => 0.0,
        };
        assert_eq!(Metric::MarginOverMaterial.derive(base), Some(400.0));
        assert_eq!(Metric::TotalManufacturingCost.derive(base), Some(100.0));
        assert_eq!(Metric::GrossProfit.derive(base), Some(300.0));
        assert_eq!(Metric::TotalBelowGp.derive(base), Some(75.0));
        assert_eq!(Metric::NetProfit.derive(base), Some(225.0));
        assert_eq!(Metric::Sales.derive(base), None);
    }

    #[test]
    fn test_margin_per_kg_guards_zero_volume() {
        assert_eq!(Metric::MarginPerKg.derive(|_| 0.0), Some(0.0));
    }
}
