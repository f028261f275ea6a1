//! Error types for artifact assembly.

use thiserror::Error;

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur during artifact assembly.
#[derive(Error, Debug)]
pub enum ReportError {
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Template rendering error.
    #[error("template error: {0}")]
    TemplateError(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Chart bundle fetch error.
    #[error("failed to fetch asset '{url}': {reason}")]
    AssetFetchError { url: String, reason: String },

    /// Asset size limit exceeded.
    #[error("embedded asset exceeds size limit ({size_mb:.1} MB > {limit_mb} MB)")]
    AssetSizeLimitExceeded { size_mb: f64, limit_mb: u64 },

    /// No location yielded a usable chart bundle.
    #[error("chart library not found (tried: {tried})")]
    AssetNotFound { tried: String },

    /// Missing required data.
    #[error("missing required data: {0}")]
    MissingData(String),
}

impl From<askama::Error> for ReportError {
    fn from(err: askama::Error) -> Self {
        ReportError::TemplateError(err.to_string())
    }
}

impl From<ReportError> for dx_common::Error {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::AssetFetchError { .. }
            | ReportError::AssetSizeLimitExceeded { .. }
            | ReportError::AssetNotFound { .. } => dx_common::Error::AssetLoad {
                reason: err.to_string(),
            },
            ReportError::IoError(e) => dx_common::Error::Io(e),
            ReportError::JsonError(e) => dx_common::Error::Json(e),
            ReportError::TemplateError(msg) => dx_common::Error::Render(msg),
            ReportError::MissingData(msg) => dx_common::Error::Render(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_errors_map_to_asset_load() {
        let err: dx_common::Error = ReportError::AssetNotFound {
            tried: "a.js, b.js".into(),
        }
        .into();
        assert_eq!(err.code(), 50);
        assert!(err.to_string().contains("a.js, b.js"));

        let err: dx_common::Error = ReportError::AssetSizeLimitExceeded {
            size_mb: 12.0,
            limit_mb: 5,
        }
        .into();
        assert_eq!(err.code(), 50);
    }

    #[test]
    fn test_template_error_maps_to_render() {
        let err: dx_common::Error = ReportError::TemplateError("bad".into()).into();
        assert_eq!(err.code(), 60);
    }
}
