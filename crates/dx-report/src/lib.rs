//! Comprehensive report artifact assembly.
//!
//! Produces one self-contained HTML document from the recomputed metric
//! dataset and the captured views.
//!
//! # Features
//!
//! - **Single-file output**: styles, chart bundle, data and runtime are inlined
//! - **Typed templating**: the skeleton is an askama template; raw insertions
//!   go through newtypes that neutralize closing tags
//! - **Interactive replay**: chart-bearing views are rebuilt from numbers
//! - **Graceful degradation**: a banner and placeholders if the chart
//!   library fails to evaluate, with tables still usable
//!
//! # Example
//!
//! ```no_run
//! use dx_report::{ArtifactInput, ReportGenerator};
//! # fn input() -> ArtifactInput { unimplemented!() }
//!
//! let generator = ReportGenerator::default_config();
//! let artifact = generator.assemble(&input()).unwrap();
//! std::fs::write(&artifact.filename, artifact.html).unwrap();
//! ```

pub mod assets;
pub mod capture;
pub mod config;
pub mod error;
pub mod escape;
pub mod filename;
pub mod generator;
pub mod sections;

pub use assets::{BundleSource, ChartBundle};
pub use capture::{CaptureContent, CapturedView};
pub use config::{Logo, ReportConfig};
pub use error::{ReportError, Result};
pub use filename::{artifact_filename, sanitize_division_name};
pub use generator::{ArtifactInput, ReportArtifact, ReportGenerator};
