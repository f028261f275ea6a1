//! Summary grid cards.

use dx_common::ViewId;

/// One card in the summary grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    /// Element id, `card-<view>`.
    pub id: String,
    pub view: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    /// Short badge describing where the detail comes from.
    pub badge: &'static str,
    pub unavailable: bool,
}

impl CardView {
    pub fn new(view: ViewId, badge: &'static str, unavailable: bool) -> Self {
        Self {
            id: format!("card-{}", view.as_str()),
            view: view.as_str(),
            title: view.title(),
            description: view.description(),
            badge,
            unavailable,
        }
    }
}
