//! Comprehensive report export engine.
//!
//! This library drives a running dashboard through a [`host::LiveApp`] driver
//! and produces one self-contained HTML report:
//! - Readiness polling for views that never signal completion
//! - Style extraction with layered fallbacks
//! - View capture (open, wait, clone, post-process, close)
//! - Export orchestration with tab restore and a single-export gate
//! - Exit codes and logging for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod capture;
pub mod context;
pub mod exit_codes;
pub mod export;
pub mod host;
pub mod logging;
pub mod readiness;
pub mod recorded;
pub mod style;
pub mod views;

pub use capture::{capture_all, capture_view, post_process, CaptureState};
pub use context::ExportContext;
pub use export::{ComprehensiveExporter, ExportGate, ExportRequest, ExportSummary};
pub use host::{LiveApp, StyleSheet};
pub use readiness::{await_condition, Check, PollOutcome, PollPolicy, ReadinessSpec};
pub use recorded::{RecordedApp, Recording};
pub use style::{ExtractedStyle, StyleExtractor, StyleStrategy};
pub use views::{BoundView, ViewAccessor, ViewRegistry};
