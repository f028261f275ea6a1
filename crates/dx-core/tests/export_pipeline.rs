//! End-to-end export tests against a recorded dashboard session.
//!
//! Poll and settle delays run on paused time, so the full default budgets
//! cost nothing.

use chrono::{TimeZone, Utc};
use dx_common::{Error, ViewId};
use dx_config::ExportConfig;
use dx_core::export::{ComprehensiveExporter, ExportRequest};
use dx_core::recorded::{RecordedApp, Recording};
use dx_metrics::RawValue;
use regex::Regex;
use std::path::{Path, PathBuf};

fn fixture() -> Recording {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/recording.json");
    Recording::from_path(&path).expect("fixture recording")
}

/// Defaults, minus anything that would touch the network or the cwd.
fn config(out: &Path) -> ExportConfig {
    let mut config = ExportConfig::default();
    config.bundle.local_paths.clear();
    config.bundle.cdn_url.clear();
    config.output.dir = out.to_path_buf();
    config
}

fn request() -> ExportRequest {
    ExportRequest {
        run_id: Some("run-fixed".to_string()),
        generated_at: Some(Utc.with_ymd_and_hms(2025, 6, 30, 9, 0, 0).unwrap()),
        ..ExportRequest::default()
    }
}

fn files_in(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

fn data_block(html: &str) -> serde_json::Value {
    let re = Regex::new(r#"(?s)<script type="application/json" id="report-data">(.*?)</script>"#)
        .unwrap();
    serde_json::from_str(&re.captures(html).expect("data block")[1]).unwrap()
}

mod success {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_full_export_writes_one_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let app = RecordedApp::new(fixture());
        let exporter = ComprehensiveExporter::new(config(dir.path())).unwrap();

        let summary = exporter.export(&app, &request()).await.unwrap();

        assert_eq!(summary.run_id, "run-fixed");
        assert_eq!(summary.placeholders, 0, "warnings: {:?}", summary.warnings);
        assert_eq!(
            summary.filename,
            "Flexible Packaging - Comprehensive Report - 2025-06-30.html"
        );
        assert!(summary.bundle_source.contains("/libs/echarts.min.js"));
        assert_eq!(files_in(dir.path()), vec![summary.path.clone()]);

        let html = std::fs::read_to_string(&summary.path).unwrap();
        for view in ViewId::ALL {
            assert_eq!(
                html.matches(&format!(r#"id="detail-{}""#, view.as_str())).count(),
                1
            );
        }
        assert_eq!(html.matches(r#"id="detail-back""#).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_captured_markup_is_post_processed() {
        let dir = tempfile::tempdir().unwrap();
        let app = RecordedApp::new(fixture());
        let exporter = ComprehensiveExporter::new(config(dir.path())).unwrap();
        let summary = exporter.export(&app, &request()).await.unwrap();
        let html = std::fs::read_to_string(&summary.path).unwrap();

        // Pluralized headers.
        assert!(html.contains(">Customers<"));
        assert!(html.contains(">Sales Reps<"));
        // Colors survive, padding does not; P&L keeps its column widths.
        assert!(html.contains(r#"<td style="color: #1b5e20">"#));
        assert!(html.contains(r#"<col style="width: 32%">"#));
        // KPI sparkline was swapped for an image.
        assert!(html.contains(r#"<img id="kpi-spark" src="data:image/png;base64,"#));
    }

    #[tokio::test(start_paused = true)]
    async fn test_kpi_figures_follow_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let app = RecordedApp::new(fixture());
        let exporter = ComprehensiveExporter::new(config(dir.path())).unwrap();
        let summary = exporter.export(&app, &request()).await.unwrap();
        let html = std::fs::read_to_string(&summary.path).unwrap();

        // The dashboard painted a stale sales figure; the dataset wins.
        assert!(html.contains(r#"data-period="fy-2025-actual">1.30 M</span>"#));
        assert!(!html.contains("1.28 M"));

        let start = html.find(r#"id="detail-divisional-kpis""#).unwrap();
        let detail = &html[start..];
        let detail = &detail[..detail.find("</section>").unwrap()];
        assert!(detail.contains(r#"data-source="dataset""#));
        assert!(detail.contains("<td>Sales</td>"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_styles_resolved_and_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let app = RecordedApp::new(fixture());
        let exporter = ComprehensiveExporter::new(config(dir.path())).unwrap();
        let summary = exporter.export(&app, &request()).await.unwrap();
        let html = std::fs::read_to_string(&summary.path).unwrap();

        // Whole-sheet match for the P&L concept.
        assert!(html.contains("font-variant-numeric:tabular-nums"));
        // Four table views share one fallback fragment.
        let fallback = ExportConfig::default()
            .concept("sales-tables")
            .unwrap()
            .fallback_css
            .clone();
        assert_eq!(html.matches(fallback.as_str()).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_views_closed_and_country_table_selected() {
        let dir = tempfile::tempdir().unwrap();
        let app = RecordedApp::new(fixture());
        let exporter = ComprehensiveExporter::new(config(dir.path())).unwrap();
        exporter.export(&app, &request()).await.unwrap();

        assert!(app.open_containers().is_empty());
        assert!(app.swapped_canvases().is_empty());
        let history = app.history();
        assert!(history.contains(&"command:salesCountry.showTable".to_string()));
        let opens = history
            .iter()
            .filter(|h| h.starts_with("click:") && !h.contains('@'))
            .count();
        assert_eq!(opens, ViewId::ALL.len());
    }
}

mod restore {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_original_tab_restored_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut recording = fixture();
        recording.active_tab = "Map View".to_string();
        let app = RecordedApp::new(recording);
        let exporter = ComprehensiveExporter::new(config(dir.path())).unwrap();

        exporter.export(&app, &request()).await.unwrap();

        assert_eq!(app.active_tab_now(), "Map View");
        assert_eq!(app.history().last().unwrap(), "tab:Map View");
    }

    #[tokio::test(start_paused = true)]
    async fn test_original_tab_restored_on_error() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the output directory should be.
        let blocker = dir.path().join("out");
        std::fs::write(&blocker, "not a directory").unwrap();

        let mut recording = fixture();
        recording.active_tab = "Map View".to_string();
        let app = RecordedApp::new(recording);
        let exporter = ComprehensiveExporter::new(config(&blocker)).unwrap();

        let err = exporter.export(&app, &request()).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(app.active_tab_now(), "Map View");
        assert!(app.open_containers().is_empty());
        assert!(!exporter.is_busy());
    }
}

mod hard_failures {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_all_zero_data_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut recording = fixture();
        for record in &mut recording.records {
            record.value = Some(RawValue::Number(0.0));
        }
        let app = RecordedApp::new(recording);
        let exporter = ComprehensiveExporter::new(config(dir.path())).unwrap();

        let err = exporter.export(&app, &request()).await.unwrap_err();
        assert!(matches!(err, Error::ComputationInvalid { periods: 3 }));
        assert!(files_in(dir.path()).is_empty());
        // No view was touched.
        assert!(!app.history().iter().any(|h| h.starts_with("click:")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_chart_library_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut recording = fixture();
        recording.resources.clear();
        let app = RecordedApp::new(recording);
        let exporter = ComprehensiveExporter::new(config(dir.path())).unwrap();

        let err = exporter.export(&app, &request()).await.unwrap_err();
        assert!(matches!(err, Error::AssetLoad { .. }));
        assert_eq!(err.code(), 50);
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_concurrent_export_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = RecordedApp::new(fixture());
        let exporter = ComprehensiveExporter::new(config(dir.path())).unwrap();

        let (req_a, req_b) = (request(), request());
        let (first, second) = tokio::join!(
            exporter.export(&app, &req_a),
            exporter.export(&app, &req_b)
        );
        assert!(first.is_ok());
        assert!(matches!(second, Err(Error::ExportInProgress)));
        assert_eq!(files_in(dir.path()).len(), 1);
    }
}

mod degraded {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_view_that_never_loads_becomes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let mut recording = fixture();
        let rep = recording
            .views
            .iter_mut()
            .find(|v| v.open_label == "Sales by Sales Rep")
            .unwrap();
        rep.never_ready = true;
        let app = RecordedApp::new(recording);
        let exporter = ComprehensiveExporter::new(config(dir.path())).unwrap();

        let summary = exporter.export(&app, &request()).await.unwrap();
        assert_eq!(summary.placeholders, 1);
        assert!(summary.warnings.iter().any(|w| w.contains("sales-rep")));

        let html = std::fs::read_to_string(&summary.path).unwrap();
        assert!(html.contains(r#"class="report-card unavailable" data-view="sales-rep""#));
        assert!(html.contains(&ExportConfig::default().output.placeholder_text));
        assert!(app.open_containers().is_empty());
    }
}

mod determinism {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_data_gives_identical_dataset_json() {
        let first_dir = tempfile::tempdir().unwrap();
        let second_dir = tempfile::tempdir().unwrap();

        let mut htmls = Vec::new();
        for dir in [&first_dir, &second_dir] {
            let app = RecordedApp::new(fixture());
            let exporter = ComprehensiveExporter::new(config(dir.path())).unwrap();
            let summary = exporter.export(&app, &request()).await.unwrap();
            htmls.push(std::fs::read_to_string(&summary.path).unwrap());
        }

        let first = data_block(&htmls[0]);
        let second = data_block(&htmls[1]);
        assert_eq!(
            serde_json::to_string(&first["dataset"]).unwrap(),
            serde_json::to_string(&second["dataset"]).unwrap()
        );
        assert_eq!(htmls[0], htmls[1]);
    }
}
