//! Chart library bundle loading.
//!
//! Locations are tried in order: local files, paths served by the dashboard
//! itself (fetched by the caller through its driver), then the CDN mirror.
//! Every candidate must be non-empty and within the embed size limit.

use crate::error::{ReportError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the embedded bundle came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum BundleSource {
    Local(PathBuf),
    Origin(String),
    Cdn(String),
}

impl std::fmt::Display for BundleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BundleSource::Local(path) => write!(f, "file {}", path.display()),
            BundleSource::Origin(path) => write!(f, "dashboard path {}", path),
            BundleSource::Cdn(url) => write!(f, "CDN {}", url),
        }
    }
}

/// The charting library source, ready to inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartBundle {
    pub source: BundleSource,
    pub text: String,
}

impl ChartBundle {
    /// Accept bundle text if it is non-empty and within `limit_mb`.
    pub fn new(source: BundleSource, text: String, limit_mb: u64) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(ReportError::AssetFetchError {
                url: source.to_string(),
                reason: "empty response".to_string(),
            });
        }
        check_size(text.len(), limit_mb)?;
        Ok(Self { source, text })
    }
}

fn limit_bytes(limit_mb: u64) -> u64 {
    limit_mb.saturating_mul(1024 * 1024)
}

/// Reject bundles larger than `limit_mb`.
pub fn check_size(len: usize, limit_mb: u64) -> Result<()> {
    if len as u64 > limit_bytes(limit_mb) {
        return Err(ReportError::AssetSizeLimitExceeded {
            size_mb: len as f64 / (1024.0 * 1024.0),
            limit_mb,
        });
    }
    Ok(())
}

/// First usable bundle among local files.
pub fn load_local(paths: &[PathBuf], limit_mb: u64) -> Option<ChartBundle> {
    paths.iter().find_map(|path| match load_file(path, limit_mb) {
        Ok(bundle) => {
            info!(path = %path.display(), bytes = bundle.text.len(), "Chart bundle loaded");
            Some(bundle)
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Chart bundle candidate rejected");
            None
        }
    })
}

fn load_file(path: &Path, limit_mb: u64) -> Result<ChartBundle> {
    let meta = std::fs::metadata(path)?;
    check_size(meta.len() as usize, limit_mb)?;
    let text = std::fs::read_to_string(path)?;
    ChartBundle::new(BundleSource::Local(path.to_path_buf()), text, limit_mb)
}

/// Fetch the bundle from the CDN mirror (blocking).
#[cfg(feature = "embed")]
pub fn fetch_cdn(url: &str, limit_mb: u64) -> Result<ChartBundle> {
    use std::io::Read;

    let fetch_err = |reason: String| ReportError::AssetFetchError {
        url: url.to_string(),
        reason,
    };

    let response = ureq::get(url)
        .timeout(std::time::Duration::from_secs(30))
        .call()
        .map_err(|e| fetch_err(e.to_string()))?;

    let mut text = String::new();
    response
        .into_reader()
        .take(limit_bytes(limit_mb) + 1)
        .read_to_string(&mut text)
        .map_err(|e| fetch_err(e.to_string()))?;

    info!(url, bytes = text.len(), "Chart bundle fetched from CDN");
    ChartBundle::new(BundleSource::Cdn(url.to_string()), text, limit_mb)
}

/// Built without the `embed` feature: the CDN is never contacted.
#[cfg(not(feature = "embed"))]
pub fn fetch_cdn(url: &str, _limit_mb: u64) -> Result<ChartBundle> {
    Err(ReportError::AssetFetchError {
        url: url.to_string(),
        reason: "built without the embed feature".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_usable_local_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.js");
        let good = dir.path().join("echarts.min.js");
        std::fs::write(&empty, "  ").unwrap();
        std::fs::write(&good, "window.echarts={};").unwrap();

        let paths = vec![dir.path().join("missing.js"), empty, good.clone()];
        let bundle = load_local(&paths, 1).unwrap();
        assert_eq!(bundle.source, BundleSource::Local(good));
        assert_eq!(bundle.text, "window.echarts={};");
    }

    #[test]
    fn test_nothing_usable_locally() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_local(&[dir.path().join("nope.js")], 1).is_none());
        assert!(load_local(&[], 1).is_none());
    }

    #[test]
    fn test_size_limit() {
        assert!(check_size(1024 * 1024, 1).is_ok());
        match check_size(1024 * 1024 + 1, 1) {
            Err(ReportError::AssetSizeLimitExceeded { limit_mb, .. }) => assert_eq!(limit_mb, 1),
            other => panic!("expected size limit error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_bundle_rejected() {
        let err = ChartBundle::new(BundleSource::Origin("/libs/e.js".into()), String::new(), 1)
            .unwrap_err();
        assert!(err.to_string().contains("/libs/e.js"));
    }
}
