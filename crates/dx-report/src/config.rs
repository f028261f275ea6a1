//! Artifact configuration types.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Resource limits for artifact assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLimits {
    /// Maximum size of the embedded chart bundle (MB).
    #[serde(default = "default_embed_size_limit")]
    pub embed_size_limit_mb: u64,
}

fn default_embed_size_limit() -> u64 {
    5
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            embed_size_limit_mb: default_embed_size_limit(),
        }
    }
}

/// Complete artifact configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Schema version.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Title suffix after the division name.
    #[serde(default = "default_title_suffix")]
    pub title_suffix: String,
    /// Text shown in place of an uncaptured view.
    #[serde(default = "default_placeholder_text")]
    pub placeholder_text: String,
    /// Text shown in chart regions when the chart library is unavailable.
    #[serde(default = "default_chart_unavailable_text")]
    pub chart_unavailable_text: String,
    /// CDN mirror the runtime retries once if the inline bundle fails.
    #[serde(default = "default_cdn_url")]
    pub cdn_url: String,
    /// Minify inline CSS; scripts are never touched.
    #[serde(default)]
    pub minify: bool,
    /// Resource limits.
    #[serde(default)]
    pub limits: ReportLimits,
}

fn default_schema_version() -> String {
    "1.0.0".to_string()
}

fn default_title_suffix() -> String {
    "Comprehensive Report".to_string()
}

fn default_placeholder_text() -> String {
    "This view could not be captured. Open it in the dashboard and export again.".to_string()
}

fn default_chart_unavailable_text() -> String {
    "Chart unavailable: the chart library could not be loaded.".to_string()
}

fn default_cdn_url() -> String {
    "https://cdn.jsdelivr.net/npm/echarts@5.4.3/dist/echarts.min.js".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            title_suffix: default_title_suffix(),
            placeholder_text: default_placeholder_text(),
            chart_unavailable_text: default_chart_unavailable_text(),
            cdn_url: default_cdn_url(),
            minify: false,
            limits: ReportLimits::default(),
        }
    }
}

impl ReportConfig {
    /// Create a new report configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the placeholder text.
    pub fn with_placeholder_text(mut self, text: impl Into<String>) -> Self {
        self.placeholder_text = text.into();
        self
    }

    /// Set the chart-unavailable text.
    pub fn with_chart_unavailable_text(mut self, text: impl Into<String>) -> Self {
        self.chart_unavailable_text = text.into();
        self
    }

    /// Set the CDN mirror URL.
    pub fn with_cdn_url(mut self, url: impl Into<String>) -> Self {
        self.cdn_url = url.into();
        self
    }

    /// Enable or disable CSS minification.
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    /// Set the bundle size limit.
    pub fn with_embed_size_limit_mb(mut self, limit: u64) -> Self {
        self.limits.embed_size_limit_mb = limit;
        self
    }

    /// Load configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Brand logo embedded as a data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logo {
    pub mime: String,
    pub data: Vec<u8>,
}

impl Logo {
    pub fn new(mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            data,
        }
    }

    /// Read a logo file; the MIME type follows the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        let mime = match ext.as_str() {
            "svg" => "image/svg+xml",
            "jpg" | "jpeg" => "image/jpeg",
            "webp" => "image/webp",
            "gif" => "image/gif",
            _ => "image/png",
        };
        Ok(Self::new(mime, data))
    }

    /// `data:` URI for an `<img src>`.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReportConfig::default();
        assert_eq!(config.schema_version, "1.0.0");
        assert_eq!(config.title_suffix, "Comprehensive Report");
        assert_eq!(config.limits.embed_size_limit_mb, 5);
    }

    #[test]
    fn test_config_builder() {
        let config = ReportConfig::new()
            .with_cdn_url("https://mirror.example/echarts.js")
            .with_embed_size_limit_mb(2)
            .with_placeholder_text("n/a");

        assert_eq!(config.cdn_url, "https://mirror.example/echarts.js");
        assert_eq!(config.limits.embed_size_limit_mb, 2);
        assert_eq!(config.placeholder_text, "n/a");
    }

    #[test]
    fn test_config_serialization() {
        let config = ReportConfig::default();
        let json = config.to_json().unwrap();
        let parsed = ReportConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_logo_data_uri() {
        let logo = Logo::new("image/png", vec![0x89, b'P', b'N', b'G']);
        assert_eq!(logo.data_uri(), "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn test_logo_mime_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brand.SVG");
        std::fs::write(&path, "<svg/>").unwrap();
        assert_eq!(Logo::from_path(&path).unwrap().mime, "image/svg+xml");
    }
}
