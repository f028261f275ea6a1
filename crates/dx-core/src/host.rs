//! Driver boundary to the running dashboard.
//!
//! Everything the exporter does to the live application goes through
//! [`LiveApp`]: reading the visible period columns and source records,
//! clicking controls, polling element text, swapping canvases for images,
//! reading markup and stylesheets. Implementations decide how those commands
//! reach the UI; the exporter only awaits them.

use async_trait::async_trait;
use dx_common::{PeriodColumn, Result};
use dx_metrics::SourceRecord;
use serde::{Deserialize, Serialize};

/// A loaded stylesheet as seen by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSheet {
    /// Resource path the sheet was loaded from; `None` for inline `<style>`.
    #[serde(default)]
    pub href: Option<String>,
    /// Rule texts, or `None` when the sheet is not inspectable (cross-origin).
    #[serde(default)]
    pub rules: Option<Vec<String>>,
}

impl StyleSheet {
    /// Joined rule text, if inspectable.
    pub fn joined_rules(&self) -> Option<String> {
        self.rules.as_ref().map(|rules| rules.join("\n"))
    }
}

/// Commands the exporter issues against the running dashboard.
///
/// Lookups that find nothing fail with `Error::ElementNotFound`; transport
/// failures are `Error::Driver`.
#[async_trait]
pub trait LiveApp: Send + Sync {
    /// Division the dashboard is currently showing.
    async fn division_name(&self) -> Result<String>;

    /// Visible period columns, in display order.
    async fn visible_columns(&self) -> Result<Vec<PeriodColumn>>;

    /// Raw source records the views render from.
    async fn source_records(&self) -> Result<Vec<SourceRecord>>;

    async fn active_tab(&self) -> Result<String>;

    async fn set_active_tab(&self, tab: &str) -> Result<()>;

    /// Click the control whose visible text equals `label` exactly,
    /// optionally searching only inside `scope`.
    async fn click_label(&self, label: &str, scope: Option<&str>) -> Result<()>;

    /// Invoke a command the dashboard exposes directly.
    async fn run_command(&self, command: &str) -> Result<()>;

    /// Dispatch a pointer down/up/click sequence on the control labelled
    /// `label` inside `scope`.
    async fn pointer_sequence(&self, label: &str, scope: &str) -> Result<()>;

    /// Text content of every element matching `selector` inside `container`.
    async fn element_texts(&self, container: &str, selector: &str) -> Result<Vec<String>>;

    /// Identifiers of the canvases inside `container`.
    async fn canvases(&self, container: &str) -> Result<Vec<String>>;

    /// Rasterize a canvas to a `data:` URI.
    async fn rasterize_canvas(&self, canvas: &str) -> Result<String>;

    /// Replace a canvas with an `<img>` showing `image`.
    async fn swap_canvas(&self, canvas: &str, image: &str) -> Result<()>;

    /// Undo [`LiveApp::swap_canvas`].
    async fn restore_canvas(&self, canvas: &str) -> Result<()>;

    async fn outer_html(&self, container: &str) -> Result<String>;

    async fn stylesheets(&self) -> Result<Vec<StyleSheet>>;

    /// Fetch a static resource from the dashboard's origin.
    async fn fetch_text(&self, path: &str) -> Result<String>;
}
