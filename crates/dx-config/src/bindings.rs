//! Per-view bindings to the live dashboard.
//!
//! A binding is the declarative half of a view accessor: which tab holds the
//! view, which exact labels open and dismiss it, where its container lives
//! and how to tell that its data has arrived.

use dx_common::ViewId;
use serde::{Deserialize, Serialize};

/// Which readiness predicate guards a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessKind {
    /// At least one data row beyond the header.
    TableRows,
    /// Enough value cells parse as finite, non-placeholder, not-all-zero numbers.
    Numeric,
}

/// Readiness parameters for one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessBinding {
    pub kind: ReadinessKind,
    /// Selector for the observed elements, scoped to the view container.
    pub selector: String,
    /// Minimum element count.
    #[serde(default = "default_min_count")]
    pub min_count: usize,
    /// Minimum fraction of elements satisfying the predicate.
    #[serde(default)]
    pub min_fraction: f64,
}

fn default_min_count() -> usize {
    1
}

/// One cosmetic text substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub from: String,
    pub to: String,
}

/// Cosmetic rewrites applied to captured markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostProcessRules {
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
    /// Keep `width` declarations on table, col, th and td.
    #[serde(default)]
    pub preserve_column_widths: bool,
}

/// Nested presentation switch inside a view (e.g. table vs map).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubviewBinding {
    /// Visible label of the switch.
    pub label: String,
    /// Directly exposed command, preferred over pointer events.
    #[serde(default)]
    pub command: Option<String>,
}

/// How to open, observe and close one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewBinding {
    pub view: ViewId,
    /// Dashboard tab that hosts the view's open control.
    pub tab: String,
    /// Exact visible label of the open control.
    pub open_label: String,
    /// Exact visible label of the dismiss control.
    pub dismiss_label: String,
    /// Selector of the view's root container once open.
    pub container: String,
    #[serde(default)]
    pub subview: Option<SubviewBinding>,
    pub readiness: ReadinessBinding,
    #[serde(default)]
    pub post_process: PostProcessRules,
    /// Name of the style concept that styles this view.
    pub style_concept: String,
}

/// Tab hosting every view card in the default layout.
pub const DEFAULT_TAB: &str = "Divisional Dashboard";

fn binding(
    view: ViewId,
    readiness: ReadinessBinding,
    style_concept: &str,
) -> ViewBinding {
    ViewBinding {
        view,
        tab: DEFAULT_TAB.to_string(),
        open_label: view.title().to_string(),
        dismiss_label: "Close".to_string(),
        container: format!("[data-view=\"{}\"]", view.as_str()),
        subview: None,
        readiness,
        post_process: PostProcessRules::default(),
        style_concept: style_concept.to_string(),
    }
}

fn table_rows() -> ReadinessBinding {
    ReadinessBinding {
        kind: ReadinessKind::TableRows,
        selector: "table tr".to_string(),
        min_count: 2,
        min_fraction: 0.0,
    }
}

fn numeric(selector: &str, min_count: usize, min_fraction: f64) -> ReadinessBinding {
    ReadinessBinding {
        kind: ReadinessKind::Numeric,
        selector: selector.to_string(),
        min_count,
        min_fraction,
    }
}

fn pluralize(from: &str, to: &str) -> PostProcessRules {
    PostProcessRules {
        substitutions: vec![Substitution {
            from: from.to_string(),
            to: to.to_string(),
        }],
        preserve_column_widths: false,
    }
}

/// One binding per [`ViewId`], in card order.
pub fn default_bindings() -> Vec<ViewBinding> {
    ViewId::ALL
        .iter()
        .map(|&view| match view {
            ViewId::DivisionalKpis => binding(view, numeric(".kpi-value", 6, 0.6), "kpi"),
            ViewId::PlFinancial => {
                let mut b = binding(view, table_rows(), "pl-table");
                b.post_process.preserve_column_widths = true;
                b
            }
            ViewId::ProductGroup => {
                let mut b = binding(view, table_rows(), "sales-tables");
                b.post_process.preserve_column_widths = true;
                b
            }
            ViewId::SalesCustomer => {
                let mut b = binding(view, table_rows(), "sales-tables");
                b.post_process = pluralize(">Customer<", ">Customers<");
                b
            }
            ViewId::SalesRep => {
                let mut b = binding(view, table_rows(), "sales-tables");
                b.post_process = pluralize(">Sales Rep<", ">Sales Reps<");
                b
            }
            ViewId::SalesCountry => {
                let mut b = binding(view, table_rows(), "sales-tables");
                b.subview = Some(SubviewBinding {
                    label: "Table".to_string(),
                    command: Some("salesCountry.showTable".to_string()),
                });
                b
            }
            _ => binding(view, numeric(".chart-value-label", 1, 0.5), "charts"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings_cover_every_view_once() {
        let bindings = default_bindings();
        assert_eq!(bindings.len(), ViewId::ALL.len());
        for (binding, view) in bindings.iter().zip(ViewId::ALL) {
            assert_eq!(binding.view, *view);
        }
    }

    #[test]
    fn test_pl_table_preserves_widths() {
        let pl = default_bindings()
            .into_iter()
            .find(|b| b.view == ViewId::PlFinancial)
            .unwrap();
        assert!(pl.post_process.preserve_column_widths);
        assert_eq!(pl.readiness.kind, ReadinessKind::TableRows);
        assert_eq!(pl.readiness.min_count, 2);
    }

    #[test]
    fn test_country_prefers_exposed_command() {
        let country = default_bindings()
            .into_iter()
            .find(|b| b.view == ViewId::SalesCountry)
            .unwrap();
        let subview = country.subview.unwrap();
        assert_eq!(subview.command.as_deref(), Some("salesCountry.showTable"));
    }
}
