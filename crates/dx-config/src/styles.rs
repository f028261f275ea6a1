//! Style concepts: named targets for stylesheet extraction.

use serde::{Deserialize, Serialize};

/// Minimal rules used when a concept's configured fallback is blank.
pub const BUILTIN_FALLBACK_CSS: &str = "table{border-collapse:collapse;width:100%}\
th,td{padding:4px 8px;border:1px solid #d0d7de;text-align:right}\
th{background:#103766;color:#fff}";

/// A named, declarative target for style extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConcept {
    /// Concept name referenced by view bindings.
    pub name: String,

    /// Resource-path fragment identifying the concept's own stylesheet.
    #[serde(default)]
    pub path_signature: Option<String>,

    /// Selector or custom-property substrings used by the rule filter.
    #[serde(default)]
    pub selector_signatures: Vec<String>,

    /// Minimum acceptable CSS length in bytes.
    #[serde(default = "default_min_bytes")]
    pub min_bytes: usize,

    /// Relative paths tried by the direct-fetch strategy, in order.
    #[serde(default)]
    pub candidate_paths: Vec<String>,

    /// Concept-specific minimal CSS used when every strategy fails.
    #[serde(default)]
    pub fallback_css: String,
}

fn default_min_bytes() -> usize {
    200
}

impl StyleConcept {
    /// Fallback CSS, never empty.
    pub fn effective_fallback(&self) -> &str {
        if self.fallback_css.trim().is_empty() {
            BUILTIN_FALLBACK_CSS
        } else {
            &self.fallback_css
        }
    }
}

/// Built-in concepts for the dashboard's stylesheets.
pub fn default_concepts() -> Vec<StyleConcept> {
    vec![
        StyleConcept {
            name: "kpi".to_string(),
            path_signature: Some("KPIExecutiveSummary".to_string()),
            selector_signatures: vec![
                ".kpi-section".to_string(),
                ".kpi-card".to_string(),
                "--kpi-".to_string(),
            ],
            min_bytes: 1_000,
            candidate_paths: vec![
                "/static/css/KPIExecutiveSummary.css".to_string(),
                "/src/components/dashboard/KPIExecutiveSummary.css".to_string(),
            ],
            fallback_css: ".kpi-section{display:grid;grid-template-columns:repeat(auto-fit,minmax(220px,1fr));gap:12px}\
.kpi-card{border-radius:8px;padding:12px;background:#f7f9fc}\
.kpi-value{font-size:1.6em;font-weight:700}"
                .to_string(),
        },
        StyleConcept {
            name: "pl-table".to_string(),
            path_signature: Some("TableView".to_string()),
            selector_signatures: vec![
                ".financial-table".to_string(),
                ".pl-table".to_string(),
            ],
            min_bytes: 1_000,
            candidate_paths: vec![
                "/static/css/TableView.css".to_string(),
                "/src/components/dashboard/TableView.css".to_string(),
            ],
            fallback_css: ".financial-table{border-collapse:collapse;width:100%;table-layout:fixed}\
.financial-table th,.financial-table td{padding:3px 6px;border:1px solid #ccc;text-align:right}\
.financial-table td:first-child{text-align:left}"
                .to_string(),
        },
        StyleConcept {
            name: "sales-tables".to_string(),
            path_signature: Some("SalesBy".to_string()),
            selector_signatures: vec![
                ".sales-by-".to_string(),
                ".product-group-table".to_string(),
            ],
            min_bytes: 500,
            candidate_paths: vec![
                "/static/css/SalesByCountryTable.css".to_string(),
                "/static/css/SalesByCustomerTable.css".to_string(),
            ],
            fallback_css: ".sales-table{border-collapse:collapse;width:100%}\
.sales-table th,.sales-table td{padding:4px 8px;border-bottom:1px solid #e5e7eb;text-align:right}\
.sales-table td:first-child{text-align:left}"
                .to_string(),
        },
        StyleConcept {
            name: "charts".to_string(),
            path_signature: Some("ChartContainer".to_string()),
            selector_signatures: vec![
                ".chart-container".to_string(),
                ".modern-margin-gauge".to_string(),
            ],
            min_bytes: 300,
            candidate_paths: vec!["/static/css/ChartContainer.css".to_string()],
            fallback_css: ".chart-container{width:100%;min-height:420px}\
.value-table{border-collapse:collapse;margin-top:12px}\
.value-table td,.value-table th{padding:3px 8px;text-align:right}"
                .to_string(),
        },
    ]
}
