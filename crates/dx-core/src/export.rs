//! End-to-end comprehensive export.
//!
//! ```text
//! gate -> read tab -> dataset -> bundle -> capture views -> assemble -> write
//!                                                                    |
//!                    close leftover views, restore tab  <-----------+ (always)
//! ```
//!
//! Dataset and bundle failures are hard and happen before any view is
//! touched, so nothing is written. View failures only degrade the artifact.

use crate::capture::capture_all;
use crate::context::ExportContext;
use crate::host::LiveApp;
use crate::logging::{event_names, generate_run_id, Stage};
use crate::views::ViewRegistry;
use chrono::{DateTime, Utc};
use dx_common::{Error, Result};
use dx_config::{BundleConfig, ExportConfig};
use dx_metrics::MetricDataset;
use dx_report::assets::{self, BundleSource, ChartBundle};
use dx_report::{ArtifactInput, Logo, ReportArtifact, ReportConfig, ReportError, ReportGenerator};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// Rejects a second export while one is running.
#[derive(Debug, Default)]
pub struct ExportGate {
    busy: AtomicBool,
}

/// Releases the gate on drop.
#[derive(Debug)]
pub struct GateGuard<'a> {
    gate: &'a ExportGate,
}

impl ExportGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Result<GateGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::ExportInProgress)?;
        Ok(GateGuard { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

/// Per-invocation inputs.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    /// Overrides the configured output directory.
    pub out_dir: Option<PathBuf>,
    /// Overrides the division name read from the dashboard.
    pub division: Option<String>,
    pub logo: Option<Logo>,
    /// Local bundle files tried before the configured ones.
    pub extra_bundle_paths: Vec<PathBuf>,
    /// Fixed run id instead of a generated one.
    pub run_id: Option<String>,
    /// Fixed timestamp instead of now.
    pub generated_at: Option<DateTime<Utc>>,
}

/// Outcome of a successful export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub run_id: String,
    pub path: PathBuf,
    pub filename: String,
    pub bytes: usize,
    pub placeholders: usize,
    pub bundle_source: String,
    pub warnings: Vec<String>,
}

/// Drives one export at a time against a [`LiveApp`].
pub struct ComprehensiveExporter {
    config: ExportConfig,
    registry: ViewRegistry,
    gate: ExportGate,
}

impl ComprehensiveExporter {
    pub fn new(config: ExportConfig) -> Result<Self> {
        let registry = ViewRegistry::from_config(&config)?;
        Ok(Self::with_registry(config, registry))
    }

    pub fn with_registry(config: ExportConfig, registry: ViewRegistry) -> Self {
        Self {
            config,
            registry,
            gate: ExportGate::new(),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Run a full export.
    ///
    /// The original tab is restored and every view opened by this export is
    /// dismissed on every path, including errors.
    pub async fn export(&self, app: &dyn LiveApp, request: &ExportRequest) -> Result<ExportSummary> {
        let _guard = self.gate.try_acquire().map_err(|e| {
            warn!(event = event_names::EXPORT_REJECTED_BUSY, "Export already running");
            e
        })?;

        let mut ctx = ExportContext::new(request.run_id.clone().unwrap_or_else(generate_run_id));
        info!(
            event = event_names::EXPORT_STARTED,
            stage = %Stage::Init,
            run_id = %ctx.run_id,
            views = self.registry.len(),
            "Export started"
        );
        ctx.original_tab = Some(app.active_tab().await?);

        let result = self.run(app, request, &mut ctx).await;
        self.restore(app, &mut ctx).await;

        match &result {
            Ok(summary) => info!(
                event = event_names::EXPORT_FINISHED,
                run_id = %summary.run_id,
                path = %summary.path.display(),
                placeholders = summary.placeholders,
                "Export finished"
            ),
            Err(e) => error!(
                event = event_names::EXPORT_FAILED,
                run_id = %ctx.run_id,
                code = e.code(),
                error = %e,
                "Export failed"
            ),
        }
        result
    }

    async fn run(
        &self,
        app: &dyn LiveApp,
        request: &ExportRequest,
        ctx: &mut ExportContext,
    ) -> Result<ExportSummary> {
        let division = match &request.division {
            Some(name) => name.clone(),
            None => app.division_name().await?,
        };
        let columns = app.visible_columns().await?;
        let records = app.source_records().await?;
        let dataset = MetricDataset::build(&records, &columns)?;
        info!(
            event = event_names::DATASET_BUILT,
            stage = %Stage::Dataset,
            periods = columns.len(),
            records = records.len(),
            "Dataset recomputed"
        );

        let bundle = load_bundle(app, &self.config.bundle, &request.extra_bundle_paths).await?;
        info!(
            event = event_names::BUNDLE_LOADED,
            stage = %Stage::Bundle,
            source = %bundle.source,
            bytes = bundle.text.len(),
            "Chart bundle ready"
        );

        let views = capture_all(app, &self.registry, &self.config, ctx).await;
        let placeholders = views.iter().filter(|v| v.is_placeholder()).count();
        info!(
            event = event_names::CAPTURE_FINISHED,
            stage = %Stage::Capture,
            placeholders,
            "Capture finished"
        );

        let bundle_source = bundle.source.to_string();
        let input = ArtifactInput {
            division,
            generated_at: request.generated_at.unwrap_or_else(Utc::now),
            columns,
            dataset,
            views,
            logo: request.logo.clone(),
            bundle,
            run_id: ctx.run_id.clone(),
        };
        let artifact = ReportGenerator::new(report_config(&self.config)).assemble(&input)?;
        info!(
            event = event_names::ARTIFACT_ASSEMBLED,
            stage = %Stage::Assemble,
            filename = %artifact.filename,
            bytes = artifact.html.len(),
            "Artifact assembled"
        );

        let out_dir = request
            .out_dir
            .clone()
            .unwrap_or_else(|| self.config.output.dir.clone());
        let path = write_atomic(&out_dir, &artifact)?;
        info!(
            event = event_names::ARTIFACT_WRITTEN,
            stage = %Stage::Write,
            path = %path.display(),
            bytes = artifact.html.len(),
            "Artifact written"
        );

        Ok(ExportSummary {
            run_id: ctx.run_id.clone(),
            path,
            filename: artifact.filename,
            bytes: artifact.html.len(),
            placeholders,
            bundle_source,
            warnings: ctx.warnings.clone(),
        })
    }

    /// Close views left open, then return to the original tab.
    async fn restore(&self, app: &dyn LiveApp, ctx: &mut ExportContext) {
        let open: Vec<_> = ctx.open_views.iter().copied().collect();
        for view in open {
            let Some(accessor) = self.registry.get(view) else {
                continue;
            };
            match accessor.close(app, &self.config.ui).await {
                Ok(()) => {
                    ctx.mark_closed(view);
                    debug!(event = event_names::RESTORE_VIEW_CLOSED, view = %view, "Leftover view closed");
                }
                Err(e) => warn!(
                    event = event_names::RESTORE_FAILED,
                    stage = %Stage::Restore,
                    view = %view,
                    error = %e,
                    "Could not close view"
                ),
            }
        }

        let Some(original) = ctx.original_tab.clone() else {
            return;
        };
        let current = app.active_tab().await.ok();
        if current.as_deref() == Some(original.as_str()) {
            return;
        }
        match app.set_active_tab(&original).await {
            Ok(()) => info!(
                event = event_names::RESTORE_TAB,
                stage = %Stage::Restore,
                tab = %original,
                "Original tab restored"
            ),
            Err(e) => warn!(
                event = event_names::RESTORE_FAILED,
                stage = %Stage::Restore,
                tab = %original,
                error = %e,
                "Could not restore original tab"
            ),
        }
    }
}

/// Assembler settings derived from the export configuration.
pub fn report_config(config: &ExportConfig) -> ReportConfig {
    ReportConfig::new()
        .with_placeholder_text(config.output.placeholder_text.clone())
        .with_chart_unavailable_text(config.output.chart_unavailable_text.clone())
        .with_cdn_url(config.bundle.cdn_url.clone())
        .with_embed_size_limit_mb(config.bundle.embed_size_limit_mb)
        .with_minify(config.output.minify)
}

/// Locate the chart library: local files, the dashboard's origin, the CDN.
pub async fn load_bundle(
    app: &dyn LiveApp,
    config: &BundleConfig,
    extra_paths: &[PathBuf],
) -> Result<ChartBundle> {
    let limit = config.embed_size_limit_mb;
    let mut tried = Vec::new();

    let local: Vec<PathBuf> = extra_paths
        .iter()
        .chain(config.local_paths.iter())
        .cloned()
        .collect();
    if let Some(bundle) = assets::load_local(&local, limit) {
        return Ok(bundle);
    }
    tried.extend(local.iter().map(|p| p.display().to_string()));

    for path in &config.driver_paths {
        tried.push(path.clone());
        let text = match app.fetch_text(path).await {
            Ok(text) => text,
            Err(e) => {
                debug!(path = %path, error = %e, "Origin bundle fetch failed");
                continue;
            }
        };
        match ChartBundle::new(BundleSource::Origin(path.clone()), text, limit) {
            Ok(bundle) => return Ok(bundle),
            Err(e) => debug!(path = %path, error = %e, "Origin bundle rejected"),
        }
    }

    let url = config.cdn_url.trim().to_string();
    if !url.is_empty() {
        tried.push(url.clone());
        let fetch_url = url.clone();
        match tokio::task::spawn_blocking(move || assets::fetch_cdn(&fetch_url, limit)).await {
            Ok(Ok(bundle)) => return Ok(bundle),
            Ok(Err(e)) => warn!(url = %url, error = %e, "CDN bundle fetch failed"),
            Err(e) => warn!(url = %url, error = %e, "CDN bundle task failed"),
        }
    }

    Err(ReportError::AssetNotFound {
        tried: tried.join(", "),
    }
    .into())
}

/// Write into `dir` via a temporary file, so a partial artifact never appears.
fn write_atomic(dir: &Path, artifact: &ReportArtifact) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(&artifact.filename);
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(artifact.html.as_bytes())?;
    tmp.flush()?;
    tmp.persist(&path).map_err(|e| Error::Io(e.error))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorded::{RecordedApp, Recording};

    #[test]
    fn test_gate_rejects_second_holder() {
        let gate = ExportGate::new();
        let guard = gate.try_acquire().unwrap();
        assert!(gate.is_busy());
        assert!(matches!(gate.try_acquire(), Err(Error::ExportInProgress)));
        drop(guard);
        assert!(!gate.is_busy());
        assert!(gate.try_acquire().is_ok());
    }

    #[test]
    fn test_report_config_follows_export_config() {
        let mut config = ExportConfig::default();
        config.bundle.cdn_url = "https://mirror.example/e.js".to_string();
        config.output.placeholder_text = "gone".to_string();
        let report = report_config(&config);
        assert_eq!(report.cdn_url, "https://mirror.example/e.js");
        assert_eq!(report.placeholder_text, "gone");
        assert_eq!(report.limits.embed_size_limit_mb, config.bundle.embed_size_limit_mb);
    }

    fn no_cdn() -> BundleConfig {
        BundleConfig {
            local_paths: vec![],
            driver_paths: vec!["/libs/echarts.min.js".to_string()],
            cdn_url: String::new(),
            embed_size_limit_mb: 1,
        }
    }

    #[tokio::test]
    async fn test_bundle_prefers_local_then_origin() {
        let app = RecordedApp::new(Recording {
            resources: [("/libs/echarts.min.js".to_string(), "window.echarts={o:1};".to_string())]
                .into_iter()
                .collect(),
            ..Recording::default()
        });

        let bundle = load_bundle(&app, &no_cdn(), &[]).await.unwrap();
        assert_eq!(bundle.source, BundleSource::Origin("/libs/echarts.min.js".into()));

        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("echarts.js");
        std::fs::write(&local, "window.echarts={l:1};").unwrap();
        let bundle = load_bundle(&app, &no_cdn(), &[local.clone()]).await.unwrap();
        assert_eq!(bundle.source, BundleSource::Local(local));
    }

    #[tokio::test]
    async fn test_bundle_missing_everywhere_is_asset_load() {
        let app = RecordedApp::new(Recording::default());
        let err = load_bundle(&app, &no_cdn(), &[]).await.unwrap_err();
        assert!(matches!(err, Error::AssetLoad { .. }));
        assert!(err.to_string().contains("/libs/echarts.min.js"));
    }

    #[test]
    fn test_write_atomic_leaves_only_the_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");
        let artifact = ReportArtifact {
            filename: "Films - Comprehensive Report - 2025-06-30.html".to_string(),
            html: "<!DOCTYPE html>".to_string(),
        };
        let path = write_atomic(&out, &artifact).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<!DOCTYPE html>");
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
    }
}
