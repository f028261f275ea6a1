//! The fixed set of capturable report surfaces.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one capturable report view.
///
/// The set is closed: the replay runtime renders exactly one summary card and
/// one detail region per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewId {
    DivisionalKpis,
    PlFinancial,
    ProductGroup,
    SalesCustomer,
    SalesRep,
    SalesCountry,
    SalesVolume,
    MarginAnalysis,
    ManufacturingCost,
    BelowGpExpenses,
    CombinedTrends,
}

impl ViewId {
    /// All views, in the order cards appear in the artifact.
    pub const ALL: &'static [ViewId] = &[
        ViewId::DivisionalKpis,
        ViewId::PlFinancial,
        ViewId::ProductGroup,
        ViewId::SalesCustomer,
        ViewId::SalesRep,
        ViewId::SalesCountry,
        ViewId::SalesVolume,
        ViewId::MarginAnalysis,
        ViewId::ManufacturingCost,
        ViewId::BelowGpExpenses,
        ViewId::CombinedTrends,
    ];

    /// Stable string identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewId::DivisionalKpis => "divisional-kpis",
            ViewId::PlFinancial => "pl-financial",
            ViewId::ProductGroup => "product-group",
            ViewId::SalesCustomer => "sales-customer",
            ViewId::SalesRep => "sales-rep",
            ViewId::SalesCountry => "sales-country",
            ViewId::SalesVolume => "sales-volume",
            ViewId::MarginAnalysis => "margin-analysis",
            ViewId::ManufacturingCost => "manufacturing-cost",
            ViewId::BelowGpExpenses => "below-gp-expenses",
            ViewId::CombinedTrends => "combined-trends",
        }
    }

    /// Card title shown in the summary grid.
    pub fn title(&self) -> &'static str {
        match self {
            ViewId::DivisionalKpis => "Divisional KPIs",
            ViewId::PlFinancial => "P&L Financial",
            ViewId::ProductGroup => "Product Groups",
            ViewId::SalesCustomer => "Sales by Customer",
            ViewId::SalesRep => "Sales by Sales Rep",
            ViewId::SalesCountry => "Sales by Country",
            ViewId::SalesVolume => "Sales & Volume",
            ViewId::MarginAnalysis => "Margin Analysis",
            ViewId::ManufacturingCost => "Manufacturing Cost",
            ViewId::BelowGpExpenses => "Below GP Expenses",
            ViewId::CombinedTrends => "Combined Trends",
        }
    }

    /// One-line card description.
    pub fn description(&self) -> &'static str {
        match self {
            ViewId::DivisionalKpis => "Headline performance indicators for the division",
            ViewId::PlFinancial => "Profit and loss ledger by period",
            ViewId::ProductGroup => "Sales and margin by product group",
            ViewId::SalesCustomer => "Top customers by sales",
            ViewId::SalesRep => "Sales by representative",
            ViewId::SalesCountry => "Sales by country with world map",
            ViewId::SalesVolume => "Sales value and volume per period",
            ViewId::MarginAnalysis => "Margin over material, total and per kg",
            ViewId::ManufacturingCost => "Labour, depreciation, power and overheads",
            ViewId::BelowGpExpenses => "Selling, administration and finance cost",
            ViewId::CombinedTrends => "Sales, gross profit and net profit trends",
        }
    }

    /// Whether the artifact rebuilds this view from the metric dataset.
    ///
    /// Chart-bearing views are replayed interactively from numbers rather
    /// than from captured markup.
    pub fn is_chart_bearing(&self) -> bool {
        matches!(
            self,
            ViewId::SalesVolume
                | ViewId::MarginAnalysis
                | ViewId::ManufacturingCost
                | ViewId::BelowGpExpenses
                | ViewId::CombinedTrends
        )
    }

    /// Parse a view identifier.
    pub fn parse(s: &str) -> Option<ViewId> {
        ViewId::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ViewId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewId::parse(s).ok_or_else(|| format!("unknown view id: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_views_round_trip_through_str() {
        assert_eq!(ViewId::ALL.len(), 11);
        for view in ViewId::ALL {
            assert_eq!(ViewId::parse(view.as_str()), Some(*view));
            let json = serde_json::to_string(view).unwrap();
            assert_eq!(json, format!("\"{}\"", view.as_str()));
        }
    }

    #[test]
    fn test_chart_bearing_views() {
        let charts: Vec<_> = ViewId::ALL
            .iter()
            .filter(|v| v.is_chart_bearing())
            .map(|v| v.as_str())
            .collect();
        assert_eq!(
            charts,
            vec![
                "sales-volume",
                "margin-analysis",
                "manufacturing-cost",
                "below-gp-expenses",
                "combined-trends"
            ]
        );
    }

    #[test]
    fn test_unknown_view_is_rejected() {
        assert!("kpi".parse::<ViewId>().is_err());
    }
}
