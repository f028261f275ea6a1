//! Error types for the report exporter.
//!
//! Every failure an export can hit is one variant of [`Error`], with:
//! - Stable error codes for machine parsing
//! - Category classification for grouping
//! - A hard/soft split that decides whether the export aborts
//! - Remediation hints for humans
//!
//! # Propagation
//!
//! Soft failures (`ReadinessTimeout`, `ElementNotFound` during capture,
//! `StyleExtraction`) are absorbed where they happen and turn into a
//! placeholder or fallback CSS. Hard failures unwind to the export handler,
//! which restores the original view and writes no file.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for exporter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration files and validation.
    Config,
    /// Driving the live dashboard (controls, containers, readiness).
    Capture,
    /// Style extraction.
    Style,
    /// Metric recomputation.
    Data,
    /// Chart bundle and other embedded assets.
    Asset,
    /// Document assembly.
    Render,
    /// File I/O and serialization.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Capture => write!(f, "capture"),
            ErrorCategory::Style => write!(f, "style"),
            ErrorCategory::Data => write!(f, "data"),
            ErrorCategory::Asset => write!(f, "asset"),
            ErrorCategory::Render => write!(f, "render"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the exporter.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("duplicate period column id '{id}' in the active column order")]
    DuplicatePeriod { id: String },

    // Capture errors (20-29)
    #[error(
        "view '{view}' not ready after {attempts} attempts ({count} elements, {fraction:.2} matched)"
    )]
    ReadinessTimeout {
        view: String,
        count: usize,
        fraction: f64,
        attempts: u32,
    },

    #[error("element not found: {what}")]
    ElementNotFound { what: String },

    #[error("driver command failed: {0}")]
    Driver(String),

    #[error("an export is already running")]
    ExportInProgress,

    // Style errors (30-39)
    #[error("no stylesheet matched concept '{concept}'")]
    StyleExtraction { concept: String },

    // Data errors (40-49)
    #[error("recomputed sales and volume are zero for all {periods} visible periods")]
    ComputationInvalid { periods: usize },

    // Asset errors (50-59)
    #[error("chart library could not be loaded: {reason}")]
    AssetLoad { reason: String },

    // Render errors (60-69)
    #[error("document assembly failed: {0}")]
    Render(String),

    // I/O errors (70-79)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the stable error code.
    ///
    /// - 10-19: Configuration errors
    /// - 20-29: Capture errors
    /// - 30-39: Style errors
    /// - 40-49: Data errors
    /// - 50-59: Asset errors
    /// - 60-69: Render errors
    /// - 70-79: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::DuplicatePeriod { .. } => 11,
            Error::ReadinessTimeout { .. } => 20,
            Error::ElementNotFound { .. } => 21,
            Error::Driver(_) => 22,
            Error::ExportInProgress => 23,
            Error::StyleExtraction { .. } => 30,
            Error::ComputationInvalid { .. } => 40,
            Error::AssetLoad { .. } => 50,
            Error::Render(_) => 60,
            Error::Io(_) => 70,
            Error::Json(_) => 71,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::DuplicatePeriod { .. } => ErrorCategory::Config,
            Error::ReadinessTimeout { .. }
            | Error::ElementNotFound { .. }
            | Error::Driver(_)
            | Error::ExportInProgress => ErrorCategory::Capture,
            Error::StyleExtraction { .. } => ErrorCategory::Style,
            Error::ComputationInvalid { .. } => ErrorCategory::Data,
            Error::AssetLoad { .. } => ErrorCategory::Asset,
            Error::Render(_) => ErrorCategory::Render,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Whether this error is soft when raised while capturing a single view.
    ///
    /// Soft errors demote the view to a placeholder and the export continues.
    /// The same `ElementNotFound` raised while computing the shared dataset is
    /// hard; that decision belongs to the caller, not the variant.
    pub fn is_soft_capture_failure(&self) -> bool {
        matches!(
            self,
            Error::ReadinessTimeout { .. } | Error::ElementNotFound { .. }
        )
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::DuplicatePeriod { .. } => "Duplicate Period Column",
            Error::ReadinessTimeout { .. } => "View Not Ready",
            Error::ElementNotFound { .. } => "Element Not Found",
            Error::Driver(_) => "Dashboard Driver Error",
            Error::ExportInProgress => "Export Already Running",
            Error::StyleExtraction { .. } => "Style Extraction Failed",
            Error::ComputationInvalid { .. } => "Report Data Not Generated",
            Error::AssetLoad { .. } => "Chart Library Unavailable",
            Error::Render(_) => "Document Assembly Failed",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => "Run 'dx-core check' to validate the export configuration.",
            Error::DuplicatePeriod { .. } => {
                "Remove the repeated column from the period selection and export again."
            }
            Error::ReadinessTimeout { .. } => {
                "Wait for the dashboard to finish loading, or raise the readiness attempt budget."
            }
            Error::ElementNotFound { .. } => {
                "Check that the view bindings match the labels shown in the dashboard."
            }
            Error::Driver(_) => "Reload the dashboard and retry the export.",
            Error::ExportInProgress => "Wait for the running export to finish.",
            Error::StyleExtraction { .. } => {
                "Serve the view stylesheet from the same origin or one of the candidate paths."
            }
            Error::ComputationInvalid { .. } => {
                "Generate the report data for the selected periods before exporting."
            }
            Error::AssetLoad { .. } => {
                "Place the chart library next to the dashboard or allow access to the CDN mirror."
            }
            Error::Render(_) => "Retry the export; report a bug if it persists.",
            Error::Io(_) => "Check disk space and permissions on the output directory.",
            Error::Json(_) => "Check the syntax of the input files.",
        }
    }

    /// One-line message for the person who pressed the export button.
    pub fn user_message(&self) -> String {
        format!("{}: {}", self.headline(), self)
    }
}
