//! Style extraction for captured views.
//!
//! Resolves a named concept to CSS text, trying in order:
//! 1. whole stylesheets whose resource path carries the concept's signature
//! 2. individual rules, from any inspectable sheet, that mention one of the
//!    concept's selector or variable signatures
//! 3. the concept's candidate source files, fetched through the driver
//! 4. the concept's built-in fallback, with a warning
//!
//! Every strategy but the last must clear the concept's minimum size, so the
//! result is either substantial or exactly the fallback. Never empty.

use crate::host::{LiveApp, StyleSheet};
use dx_common::Error;
use dx_config::StyleConcept;
use serde::Serialize;
use tracing::{debug, warn};

/// Which strategy produced the CSS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleStrategy {
    WholeSheet,
    RuleFilter,
    Fetch,
    Fallback,
}

impl std::fmt::Display for StyleStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StyleStrategy::WholeSheet => write!(f, "whole_sheet"),
            StyleStrategy::RuleFilter => write!(f, "rule_filter"),
            StyleStrategy::Fetch => write!(f, "fetch"),
            StyleStrategy::Fallback => write!(f, "fallback"),
        }
    }
}

/// CSS resolved for one concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedStyle {
    pub concept: String,
    pub css: String,
    pub strategy: StyleStrategy,
}

/// Stateless extractor; callers cache results per concept.
pub struct StyleExtractor;

impl StyleExtractor {
    pub async fn extract(app: &dyn LiveApp, concept: &StyleConcept) -> ExtractedStyle {
        let sheets = match app.stylesheets().await {
            Ok(sheets) => sheets,
            Err(e) => {
                debug!(concept = %concept.name, error = %e, "Stylesheet listing failed");
                Vec::new()
            }
        };

        let found = whole_sheet(&sheets, concept)
            .map(|css| (css, StyleStrategy::WholeSheet))
            .or_else(|| rule_filter(&sheets, concept).map(|css| (css, StyleStrategy::RuleFilter)));

        let (css, strategy) = match found {
            Some(hit) => hit,
            None => match fetch_candidates(app, concept).await {
                Some(css) => (css, StyleStrategy::Fetch),
                None => {
                    let err = Error::StyleExtraction {
                        concept: concept.name.clone(),
                    };
                    warn!(concept = %concept.name, error = %err, "Using fallback CSS");
                    (concept.effective_fallback().to_string(), StyleStrategy::Fallback)
                }
            },
        };

        debug!(
            concept = %concept.name,
            strategy = %strategy,
            bytes = css.len(),
            "Style resolved"
        );
        ExtractedStyle {
            concept: concept.name.clone(),
            css,
            strategy,
        }
    }
}

/// Widest sheet whose href carries the path signature.
fn whole_sheet(sheets: &[StyleSheet], concept: &StyleConcept) -> Option<String> {
    let signature = concept.path_signature.as_deref()?;
    sheets
        .iter()
        .filter(|s| s.href.as_deref().is_some_and(|h| h.contains(signature)))
        .filter_map(StyleSheet::joined_rules)
        .max_by_key(|css| css.len())
        .filter(|css| css.len() >= concept.min_bytes)
}

fn rule_filter(sheets: &[StyleSheet], concept: &StyleConcept) -> Option<String> {
    if concept.selector_signatures.is_empty() {
        return None;
    }
    let kept: Vec<&str> = sheets
        .iter()
        .filter_map(|s| s.rules.as_ref())
        .flatten()
        .filter(|rule| {
            concept
                .selector_signatures
                .iter()
                .any(|sig| rule.contains(sig.as_str()))
        })
        .map(String::as_str)
        .collect();
    let css = kept.join("\n");
    (css.len() >= concept.min_bytes).then_some(css)
}

async fn fetch_candidates(app: &dyn LiveApp, concept: &StyleConcept) -> Option<String> {
    for path in &concept.candidate_paths {
        match app.fetch_text(path).await {
            Ok(text) if text.trim().len() >= concept.min_bytes => return Some(text),
            Ok(text) => {
                debug!(path = %path, bytes = text.len(), "Fetched stylesheet too small")
            }
            Err(e) => debug!(path = %path, error = %e, "Stylesheet fetch failed"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorded::{Recording, RecordedApp};
    use std::collections::BTreeMap;

    fn concept() -> StyleConcept {
        StyleConcept {
            name: "pl-table".to_string(),
            path_signature: Some("TableView".to_string()),
            selector_signatures: vec![".financial-table".to_string()],
            min_bytes: 40,
            candidate_paths: vec!["/css/missing.css".to_string(), "/css/TableView.css".to_string()],
            fallback_css: ".financial-table{width:100%}".to_string(),
        }
    }

    fn sheet(href: Option<&str>, rules: Option<&[&str]>) -> StyleSheet {
        StyleSheet {
            href: href.map(String::from),
            rules: rules.map(|r| r.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn app(sheets: Vec<StyleSheet>, resources: &[(&str, &str)]) -> RecordedApp {
        RecordedApp::new(Recording {
            stylesheets: sheets,
            resources: resources
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            ..Recording::default()
        })
    }

    #[tokio::test]
    async fn test_widest_matching_sheet_wins() {
        let app = app(
            vec![
                sheet(Some("/a/TableView.css"), Some(&[".financial-table td{padding:2px 4px}"])),
                sheet(
                    Some("/b/TableView.chunk.css"),
                    Some(&[
                        ".financial-table{border-collapse:collapse}",
                        ".financial-table th{font-weight:700}",
                    ]),
                ),
                sheet(Some("https://cdn.example/TableView.css"), None),
            ],
            &[],
        );
        let style = StyleExtractor::extract(&app, &concept()).await;
        assert_eq!(style.strategy, StyleStrategy::WholeSheet);
        assert!(style.css.contains("border-collapse"));
        assert!(style.css.len() >= 40);
    }

    #[tokio::test]
    async fn test_rule_filter_skips_cross_origin() {
        let app = app(
            vec![
                sheet(None, Some(&[
                    ".financial-table{border-collapse:collapse}",
                    ".unrelated{color:red}",
                    ".financial-table td{padding:2px 4px}",
                ])),
                sheet(Some("https://fonts.example/css"), None),
            ],
            &[],
        );
        let style = StyleExtractor::extract(&app, &concept()).await;
        assert_eq!(style.strategy, StyleStrategy::RuleFilter);
        assert!(!style.css.contains(".unrelated"));
    }

    #[tokio::test]
    async fn test_fetch_then_fallback() {
        let css = ".financial-table{border-collapse:collapse;width:100%}";
        let fetched = StyleExtractor::extract(&app(vec![], &[("/css/TableView.css", css)]), &concept()).await;
        assert_eq!(fetched.strategy, StyleStrategy::Fetch);
        assert_eq!(fetched.css, css);

        let fallback = StyleExtractor::extract(&app(vec![], &[]), &concept()).await;
        assert_eq!(fallback.strategy, StyleStrategy::Fallback);
        assert_eq!(fallback.css, concept().fallback_css);
    }

    #[tokio::test]
    async fn test_result_is_substantial_or_fallback() {
        let small = app(
            vec![sheet(Some("/TableView.css"), Some(&[".financial-table{}"]))],
            &[("/css/TableView.css", ".x{}")],
        );
        let mut c = concept();
        c.fallback_css = "   ".to_string();
        let style = StyleExtractor::extract(&small, &c).await;
        assert_eq!(style.strategy, StyleStrategy::Fallback);
        assert_eq!(style.css, dx_config::BUILTIN_FALLBACK_CSS);
        assert!(!style.css.is_empty());
    }
}
