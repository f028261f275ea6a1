//! Export configuration loading and validation.
//!
//! This crate provides:
//! - Typed structs for the export configuration file (TOML or JSON)
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation (view coverage, poll budgets, style concepts)

pub mod bindings;
pub mod resolve;
pub mod styles;
pub mod validate;

pub use bindings::{
    PostProcessRules, ReadinessBinding, ReadinessKind, Substitution, SubviewBinding, ViewBinding,
};
pub use resolve::{resolve_config, ConfigSource, ResolvedPath};
pub use styles::{StyleConcept, BUILTIN_FALLBACK_CSS};
pub use validate::{validate_config, ValidationError, ValidationResult};

use dx_common::ViewId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl From<ConfigError> for dx_common::Error {
    fn from(err: ConfigError) -> Self {
        dx_common::Error::Config(err.to_string())
    }
}

/// Polling budgets for the readiness detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessSettings {
    /// Delay between polls.
    pub interval_ms: u64,
    /// Attempt budget for table readiness.
    pub table_max_attempts: u32,
    /// Attempt budget for numeric readiness (late-arriving data gets more).
    pub numeric_max_attempts: u32,
    /// Re-check delay after the condition first holds.
    pub settle_ms: u64,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            table_max_attempts: 20,
            numeric_max_attempts: 40,
            settle_ms: 300,
        }
    }
}

impl ReadinessSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Attempt budget for a predicate kind.
    pub fn max_attempts(&self, kind: ReadinessKind) -> u32 {
        match kind {
            ReadinessKind::TableRows => self.table_max_attempts,
            ReadinessKind::Numeric => self.numeric_max_attempts,
        }
    }
}

/// Fixed settle delays after UI commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiTiming {
    /// After switching tabs.
    pub tab_settle_ms: u64,
    /// After clicking an open control or driving a subview.
    pub open_settle_ms: u64,
    /// After clicking a dismiss control.
    pub close_settle_ms: u64,
}

impl Default for UiTiming {
    fn default() -> Self {
        Self {
            tab_settle_ms: 400,
            open_settle_ms: 600,
            close_settle_ms: 300,
        }
    }
}

/// Where to find the charting library bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Local files tried first.
    pub local_paths: Vec<PathBuf>,
    /// Paths fetched through the dashboard's own origin.
    pub driver_paths: Vec<String>,
    /// CDN mirror used last, and by the artifact's runtime retry.
    pub cdn_url: String,
    /// Maximum accepted bundle size.
    pub embed_size_limit_mb: u64,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            local_paths: vec![
                PathBuf::from("node_modules/echarts/dist/echarts.min.js"),
                PathBuf::from("public/libs/echarts.min.js"),
            ],
            driver_paths: vec![
                "/libs/echarts.min.js".to_string(),
                "/static/js/echarts.min.js".to_string(),
            ],
            cdn_url: "https://cdn.jsdelivr.net/npm/echarts@5.4.3/dist/echarts.min.js".to_string(),
            embed_size_limit_mb: 5,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the artifact is written into.
    pub dir: PathBuf,
    /// Text shown in place of a view that could not be captured.
    pub placeholder_text: String,
    /// Text shown in chart regions when the chart library failed to load.
    pub chart_unavailable_text: String,
    /// Minify inline CSS in the artifact.
    pub minify: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            placeholder_text: "This view could not be captured. Open it in the dashboard and export again."
                .to_string(),
            chart_unavailable_text: "Chart unavailable: the chart library could not be loaded."
                .to_string(),
            minify: false,
        }
    }
}

/// Complete export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub schema_version: String,
    pub readiness: ReadinessSettings,
    pub ui: UiTiming,
    pub styles: Vec<StyleConcept>,
    pub views: Vec<ViewBinding>,
    pub bundle: BundleConfig,
    pub output: OutputConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION.to_string(),
            readiness: ReadinessSettings::default(),
            ui: UiTiming::default(),
            styles: styles::default_concepts(),
            views: bindings::default_bindings(),
            bundle: BundleConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Parse a config file; `.toml` files are TOML, everything else JSON.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);
        if is_toml {
            Self::from_toml_str(&content).map_err(|message| ConfigError::ParseError {
                path: path.to_path_buf(),
                message,
            })
        } else {
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    }

    /// Parse TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Binding for a view.
    pub fn binding(&self, view: ViewId) -> Option<&ViewBinding> {
        self.views.iter().find(|b| b.view == view)
    }

    /// Style concept by name.
    pub fn concept(&self, name: &str) -> Option<&StyleConcept> {
        self.styles.iter().find(|c| c.name == name)
    }

    /// Pretty JSON for `config show`.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A validated configuration with provenance.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ExportConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Resolve, parse and validate the export configuration.
///
/// With no file found anywhere the built-in defaults are used.
pub fn load_config(cli_path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
    }

    let resolved = resolve_config(cli_path);
    let config = match &resolved.path {
        Some(path) => ExportConfig::from_file(path)?,
        None => ExportConfig::default(),
    };
    validate_config(&config)?;

    Ok(LoadedConfig {
        config,
        path: resolved.path,
        source: resolved.source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = ExportConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.views.len(), ViewId::ALL.len());
    }

    #[test]
    fn test_numeric_readiness_gets_more_attempts() {
        let settings = ReadinessSettings::default();
        assert!(
            settings.max_attempts(ReadinessKind::Numeric)
                > settings.max_attempts(ReadinessKind::TableRows)
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ExportConfig::from_toml_str(
            r#"
            [readiness]
            interval_ms = 100

            [output]
            dir = "/tmp/reports"
            "#,
        )
        .unwrap();
        assert_eq!(config.readiness.interval_ms, 100);
        assert_eq!(config.readiness.table_max_attempts, 20);
        assert_eq!(config.output.dir, PathBuf::from("/tmp/reports"));
        assert_eq!(config.views.len(), ViewId::ALL.len());
    }

    #[test]
    fn test_lookup_helpers() {
        let config = ExportConfig::default();
        let kpi = config.binding(ViewId::DivisionalKpis).unwrap();
        assert!(config.concept(&kpi.style_concept).is_some());
        assert!(config.concept("missing").is_none());
    }
}
