//! Stage and event names attached to structured log records.

use serde::{Deserialize, Serialize};

/// Phases of one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Reading columns and records, recomputing metrics.
    Dataset,
    /// Locating the chart library.
    Bundle,
    /// Opening, waiting on and cloning views.
    Capture,
    /// Building the HTML document.
    Assemble,
    /// Writing the artifact.
    Write,
    /// Closing leftover views and returning to the original tab.
    Restore,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Dataset => "dataset",
            Stage::Bundle => "bundle",
            Stage::Capture => "capture",
            Stage::Assemble => "assemble",
            Stage::Write => "write",
            Stage::Restore => "restore",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Export lifecycle
    pub const EXPORT_STARTED: &str = "export.started";
    pub const EXPORT_FINISHED: &str = "export.finished";
    pub const EXPORT_FAILED: &str = "export.failed";
    pub const EXPORT_REJECTED_BUSY: &str = "export.rejected_busy";

    pub const DATASET_BUILT: &str = "dataset.built";
    pub const BUNDLE_LOADED: &str = "bundle.loaded";
    pub const CAPTURE_FINISHED: &str = "capture.finished";
    pub const ARTIFACT_ASSEMBLED: &str = "artifact.assembled";
    pub const ARTIFACT_WRITTEN: &str = "artifact.written";

    pub const RESTORE_VIEW_CLOSED: &str = "restore.view_closed";
    pub const RESTORE_TAB: &str = "restore.tab";
    pub const RESTORE_FAILED: &str = "restore.failed";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
}
