//! Hidden detail regions, one per view.

use super::charts::{ChartDetail, ValueTable};
use crate::escape::CapturedMarkup;
use dx_common::ViewId;

/// One detail region. Exactly one of `markup`, `chart` or `placeholder` is
/// set; `values` may accompany captured markup or a placeholder.
#[derive(Debug, Clone)]
pub struct DetailView {
    /// Element id, `detail-<view>`.
    pub id: String,
    pub view: &'static str,
    pub title: &'static str,
    pub markup: Option<CapturedMarkup>,
    pub chart: Option<ChartDetail>,
    pub placeholder: Option<String>,
    /// Dataset figures shown above the captured view.
    pub values: Option<ValueTable>,
}

impl DetailView {
    fn empty(view: ViewId) -> Self {
        Self {
            id: format!("detail-{}", view.as_str()),
            view: view.as_str(),
            title: view.title(),
            markup: None,
            chart: None,
            placeholder: None,
            values: None,
        }
    }

    pub fn captured(view: ViewId, markup: CapturedMarkup) -> Self {
        Self {
            markup: Some(markup),
            ..Self::empty(view)
        }
    }

    pub fn chart(view: ViewId, chart: ChartDetail) -> Self {
        Self {
            chart: Some(chart),
            ..Self::empty(view)
        }
    }

    pub fn placeholder(view: ViewId, text: impl Into<String>) -> Self {
        Self {
            placeholder: Some(text.into()),
            ..Self::empty(view)
        }
    }

    pub fn with_values(mut self, table: ValueTable) -> Self {
        self.values = Some(table);
        self
    }
}
