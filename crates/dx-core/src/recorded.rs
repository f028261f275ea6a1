//! A [`LiveApp`] replayed from a JSON recording.
//!
//! Recordings describe a dashboard session: the division, visible columns,
//! source records, and for each view the markup it renders once open and the
//! value texts it shows while loading and after. The CLI exports from a
//! recording; tests use it to script readiness and failure scenarios.
//!
//! # Example
//!
//! ```ignore
//! use dx_core::recorded::RecordedApp;
//!
//! let app = RecordedApp::from_path(Path::new("session.json"))?;
//! let summary = exporter.export(&app, &request).await?;
//! ```

use crate::host::{LiveApp, StyleSheet};
use async_trait::async_trait;
use dx_common::{Error, PeriodColumn, Result};
use dx_metrics::SourceRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Pixel data returned for every rasterized canvas.
const RASTER_STUB: &str = "data:image/png;base64,iVBORw0KGgo=";

/// One view as the recorded dashboard renders it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordedView {
    pub open_label: String,
    pub dismiss_label: String,
    pub container: String,
    /// Outer markup of the container once loaded.
    pub html: String,
    /// Value texts per selector once loaded.
    pub texts: BTreeMap<String, Vec<String>>,
    /// Number of polls that see nothing before the texts appear.
    pub ready_after_polls: u32,
    /// The texts never appear.
    pub never_ready: bool,
    /// Canvas ids inside the container.
    pub canvases: Vec<String>,
    /// Reading the markup fails.
    pub fail_outer_html: bool,
}

/// A recorded dashboard session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recording {
    pub division: String,
    pub active_tab: String,
    pub columns: Vec<PeriodColumn>,
    pub records: Vec<SourceRecord>,
    pub views: Vec<RecordedView>,
    /// Commands the dashboard exposes directly.
    pub commands: Vec<String>,
    /// Labels that exist nowhere in the UI.
    pub missing_labels: Vec<String>,
    pub stylesheets: Vec<StyleSheet>,
    /// Static resources served by the dashboard's origin.
    pub resources: BTreeMap<String, String>,
}

impl Default for Recording {
    fn default() -> Self {
        Self {
            division: "Division".to_string(),
            active_tab: dx_config::bindings::DEFAULT_TAB.to_string(),
            columns: Vec::new(),
            records: Vec::new(),
            views: Vec::new(),
            commands: Vec::new(),
            missing_labels: Vec::new(),
            stylesheets: Vec::new(),
            resources: BTreeMap::new(),
        }
    }
}

impl Recording {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("invalid recording {}: {}", path.display(), e))
        })
    }
}

#[derive(Debug, Default)]
struct SessionState {
    active_tab: String,
    open: BTreeSet<usize>,
    polls: BTreeMap<usize, u32>,
    swapped: BTreeMap<String, String>,
    history: Vec<String>,
}

/// Replays a [`Recording`] behind the [`LiveApp`] interface.
#[derive(Debug)]
pub struct RecordedApp {
    recording: Recording,
    state: Mutex<SessionState>,
}

impl RecordedApp {
    pub fn new(recording: Recording) -> Self {
        let state = SessionState {
            active_tab: recording.active_tab.clone(),
            ..SessionState::default()
        };
        Self {
            recording,
            state: Mutex::new(state),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(Recording::from_path(path)?))
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every command issued so far, e.g. `click:Close@[data-view="kpi"]`.
    pub fn history(&self) -> Vec<String> {
        self.state().history.clone()
    }

    pub fn active_tab_now(&self) -> String {
        self.state().active_tab.clone()
    }

    /// Containers of the views currently open.
    pub fn open_containers(&self) -> Vec<String> {
        self.state()
            .open
            .iter()
            .filter_map(|&i| self.recording.views.get(i))
            .map(|v| v.container.clone())
            .collect()
    }

    /// Canvases currently replaced by images.
    pub fn swapped_canvases(&self) -> Vec<String> {
        self.state().swapped.keys().cloned().collect()
    }

    fn view_index(&self, container: &str) -> Option<usize> {
        self.recording
            .views
            .iter()
            .position(|v| v.container == container)
    }

    fn open_view(&self, container: &str) -> Result<(usize, &RecordedView)> {
        let index = self
            .view_index(container)
            .filter(|i| self.state().open.contains(i))
            .ok_or_else(|| Error::ElementNotFound {
                what: container.to_string(),
            })?;
        Ok((index, &self.recording.views[index]))
    }
}

#[async_trait]
impl LiveApp for RecordedApp {
    async fn division_name(&self) -> Result<String> {
        Ok(self.recording.division.clone())
    }

    async fn visible_columns(&self) -> Result<Vec<PeriodColumn>> {
        Ok(self.recording.columns.clone())
    }

    async fn source_records(&self) -> Result<Vec<SourceRecord>> {
        Ok(self.recording.records.clone())
    }

    async fn active_tab(&self) -> Result<String> {
        Ok(self.state().active_tab.clone())
    }

    async fn set_active_tab(&self, tab: &str) -> Result<()> {
        let mut state = self.state();
        state.history.push(format!("tab:{}", tab));
        state.active_tab = tab.to_string();
        Ok(())
    }

    async fn click_label(&self, label: &str, scope: Option<&str>) -> Result<()> {
        if self.recording.missing_labels.iter().any(|l| l == label) {
            return Err(Error::ElementNotFound {
                what: format!("control labelled '{}'", label),
            });
        }
        let mut state = self.state();
        state.history.push(match scope {
            Some(scope) => format!("click:{}@{}", label, scope),
            None => format!("click:{}", label),
        });

        match scope {
            Some(scope) => {
                if let Some(i) = self.view_index(scope) {
                    if self.recording.views[i].dismiss_label == label {
                        state.open.remove(&i);
                    }
                }
            }
            None => {
                if let Some(i) = self
                    .recording
                    .views
                    .iter()
                    .position(|v| v.open_label == label)
                {
                    state.open.insert(i);
                    state.polls.insert(i, 0);
                }
            }
        }
        Ok(())
    }

    async fn run_command(&self, command: &str) -> Result<()> {
        if !self.recording.commands.iter().any(|c| c == command) {
            return Err(Error::Driver(format!("unknown command '{}'", command)));
        }
        self.state().history.push(format!("command:{}", command));
        Ok(())
    }

    async fn pointer_sequence(&self, label: &str, _scope: &str) -> Result<()> {
        self.state().history.push(format!("pointer:{}", label));
        Ok(())
    }

    async fn element_texts(&self, container: &str, selector: &str) -> Result<Vec<String>> {
        let (index, view) = self.open_view(container)?;
        let mut state = self.state();
        let polls = state.polls.entry(index).or_insert(0);
        *polls += 1;
        if view.never_ready || *polls <= view.ready_after_polls {
            return Ok(Vec::new());
        }
        Ok(view.texts.get(selector).cloned().unwrap_or_default())
    }

    async fn canvases(&self, container: &str) -> Result<Vec<String>> {
        let (_, view) = self.open_view(container)?;
        Ok(view.canvases.clone())
    }

    async fn rasterize_canvas(&self, canvas: &str) -> Result<String> {
        let known = self
            .recording
            .views
            .iter()
            .any(|v| v.canvases.iter().any(|c| c == canvas));
        if !known {
            return Err(Error::ElementNotFound {
                what: format!("canvas '{}'", canvas),
            });
        }
        Ok(RASTER_STUB.to_string())
    }

    async fn swap_canvas(&self, canvas: &str, image: &str) -> Result<()> {
        let mut state = self.state();
        state.history.push(format!("swap:{}", canvas));
        state.swapped.insert(canvas.to_string(), image.to_string());
        Ok(())
    }

    async fn restore_canvas(&self, canvas: &str) -> Result<()> {
        let mut state = self.state();
        state.history.push(format!("restore:{}", canvas));
        state.swapped.remove(canvas);
        Ok(())
    }

    async fn outer_html(&self, container: &str) -> Result<String> {
        let (_, view) = self.open_view(container)?;
        if view.fail_outer_html {
            return Err(Error::Driver(format!("could not read markup of {}", container)));
        }
        let state = self.state();
        let mut html = view.html.clone();
        for (canvas, image) in &state.swapped {
            html = html.replace(
                &format!("<canvas id=\"{}\"></canvas>", canvas),
                &format!("<img id=\"{}\" src=\"{}\">", canvas, image),
            );
        }
        Ok(html)
    }

    async fn stylesheets(&self) -> Result<Vec<StyleSheet>> {
        Ok(self.recording.stylesheets.clone())
    }

    async fn fetch_text(&self, path: &str) -> Result<String> {
        self.recording
            .resources
            .get(path)
            .cloned()
            .ok_or_else(|| Error::Driver(format!("404 for {}", path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kpi_view() -> RecordedView {
        RecordedView {
            open_label: "Divisional KPIs".to_string(),
            dismiss_label: "Close".to_string(),
            container: "[data-view=\"divisional-kpis\"]".to_string(),
            html: "<div><canvas id=\"spark\"></canvas></div>".to_string(),
            texts: BTreeMap::from([(".kpi-value".to_string(), vec!["1.2 M".to_string()])]),
            ready_after_polls: 1,
            canvases: vec!["spark".to_string()],
            ..RecordedView::default()
        }
    }

    #[tokio::test]
    async fn test_texts_appear_after_configured_polls() {
        let view = kpi_view();
        let container = view.container.clone();
        let app = RecordedApp::new(Recording {
            views: vec![view],
            ..Recording::default()
        });

        assert!(matches!(
            app.element_texts(&container, ".kpi-value").await,
            Err(Error::ElementNotFound { .. })
        ));
        app.click_label("Divisional KPIs", None).await.unwrap();
        assert!(app.element_texts(&container, ".kpi-value").await.unwrap().is_empty());
        assert_eq!(
            app.element_texts(&container, ".kpi-value").await.unwrap(),
            vec!["1.2 M".to_string()]
        );

        app.click_label("Close", Some(&container)).await.unwrap();
        assert!(app.open_containers().is_empty());
    }

    #[tokio::test]
    async fn test_swapped_canvas_shows_in_markup() {
        let view = kpi_view();
        let container = view.container.clone();
        let app = RecordedApp::new(Recording {
            views: vec![view],
            ..Recording::default()
        });
        app.click_label("Divisional KPIs", None).await.unwrap();

        let image = app.rasterize_canvas("spark").await.unwrap();
        app.swap_canvas("spark", &image).await.unwrap();
        let html = app.outer_html(&container).await.unwrap();
        assert!(html.contains("<img id=\"spark\" src=\"data:image/png;base64,"));
        assert!(!html.contains("<canvas"));

        app.restore_canvas("spark").await.unwrap();
        assert!(app.swapped_canvases().is_empty());
        assert!(app.outer_html(&container).await.unwrap().contains("<canvas"));
    }

    #[test]
    fn test_recording_parses_with_defaults() {
        let rec: Recording = serde_json::from_str(r#"{"division": "Films"}"#).unwrap();
        assert_eq!(rec.division, "Films");
        assert_eq!(rec.active_tab, dx_config::bindings::DEFAULT_TAB);
        assert!(rec.views.is_empty());
    }
}
