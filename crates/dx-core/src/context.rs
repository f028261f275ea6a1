//! Per-export mutable state.
//!
//! One [`ExportContext`] is created per export and threaded through every
//! stage. It records which views are open, so a failing export can still
//! dismiss them, and caches extracted styles per concept.

use crate::host::LiveApp;
use crate::style::{ExtractedStyle, StyleExtractor};
use dx_common::ViewId;
use dx_config::StyleConcept;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct ExportContext {
    pub run_id: String,
    /// Tab active when the export started.
    pub original_tab: Option<String>,
    /// Views opened and not yet confirmed closed.
    pub open_views: BTreeSet<ViewId>,
    pub style_cache: HashMap<String, ExtractedStyle>,
    /// Non-fatal problems, reported with the summary.
    pub warnings: Vec<String>,
}

impl ExportContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Self::default()
        }
    }

    pub fn mark_open(&mut self, view: ViewId) {
        self.open_views.insert(view);
    }

    pub fn mark_closed(&mut self, view: ViewId) {
        self.open_views.remove(&view);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// CSS for `concept`, extracted on first use.
    pub async fn style_for(&mut self, app: &dyn LiveApp, concept: &StyleConcept) -> ExtractedStyle {
        if let Some(hit) = self.style_cache.get(&concept.name) {
            return hit.clone();
        }
        let style = StyleExtractor::extract(app, concept).await;
        self.style_cache.insert(concept.name.clone(), style.clone());
        style
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorded::{RecordedApp, Recording};
    use crate::style::StyleStrategy;

    #[tokio::test]
    async fn test_style_extracted_once_per_concept() {
        let concept = dx_config::ExportConfig::default()
            .concept("kpi")
            .cloned()
            .unwrap();
        let app = RecordedApp::new(Recording::default());
        let mut ctx = ExportContext::new("run-test");

        let first = ctx.style_for(&app, &concept).await;
        assert_eq!(first.strategy, StyleStrategy::Fallback);
        let second = ctx.style_for(&app, &concept).await;
        assert_eq!(first, second);
        assert_eq!(ctx.style_cache.len(), 1);
    }

    #[test]
    fn test_open_view_bookkeeping() {
        let mut ctx = ExportContext::new("run-test");
        ctx.mark_open(ViewId::SalesRep);
        ctx.mark_open(ViewId::DivisionalKpis);
        ctx.mark_closed(ViewId::SalesRep);
        assert_eq!(
            ctx.open_views.iter().copied().collect::<Vec<_>>(),
            vec![ViewId::DivisionalKpis]
        );
    }
}
