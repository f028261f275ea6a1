//! Artifact assembly.

use crate::assets::ChartBundle;
use crate::capture::{CaptureContent, CapturedView};
use crate::config::{Logo, ReportConfig};
use crate::error::{ReportError, Result};
use crate::escape::{CapturedMarkup, InlineScript, ScriptJson, StyleText};
use crate::filename::artifact_filename;
use crate::sections::*;

use askama::Template;
use chrono::{DateTime, Utc};
use dx_common::{PeriodColumn, ViewId};
use dx_metrics::MetricDataset;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

const REPLAY_RUNTIME: &str = include_str!("../assets/replay_runtime.js");

/// Everything the assembler needs for one artifact.
#[derive(Debug, Clone)]
pub struct ArtifactInput {
    pub division: String,
    pub generated_at: DateTime<Utc>,
    /// Visible period columns, in display order.
    pub columns: Vec<PeriodColumn>,
    pub dataset: MetricDataset,
    /// Capture results; a view missing here renders as a placeholder.
    pub views: Vec<CapturedView>,
    pub logo: Option<Logo>,
    pub bundle: ChartBundle,
    pub run_id: String,
}

/// A finished artifact, not yet written anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub filename: String,
    pub html: String,
}

#[derive(Template)]
#[template(path = "artifact.html")]
struct ArtifactTemplate<'a> {
    title: String,
    division: &'a str,
    generated_at: String,
    run_id: &'a str,
    version: &'static str,
    logo: Option<String>,
    periods: &'a [PeriodInfo],
    cards: Vec<CardView>,
    details: Vec<DetailView>,
    styles: StyleText,
    bundle: InlineScript,
    bundle_source: String,
    data: ScriptJson,
    runtime: InlineScript,
}

#[derive(Serialize)]
struct ChartEntry {
    id: String,
    option: serde_json::Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeConfig<'a> {
    cdn_url: &'a str,
    chart_unavailable_text: &'a str,
}

/// The `application/json` block read by the replay runtime.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayData<'a> {
    run_id: &'a str,
    division: &'a str,
    generated_at: String,
    views: Vec<&'static str>,
    periods: &'a [PeriodInfo],
    dataset: &'a MetricDataset,
    charts: BTreeMap<&'static str, Vec<ChartEntry>>,
    config: RuntimeConfig<'a>,
}

/// Report generator.
pub struct ReportGenerator {
    config: ReportConfig,
}

impl ReportGenerator {
    /// Create a new report generator with configuration.
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// Create a generator with default configuration.
    pub fn default_config() -> Self {
        Self::new(ReportConfig::default())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Assemble the self-contained artifact.
    pub fn assemble(&self, input: &ArtifactInput) -> Result<ReportArtifact> {
        if input.columns.is_empty() {
            return Err(ReportError::MissingData(
                "no visible period columns".to_string(),
            ));
        }
        debug!(
            views = input.views.len(),
            periods = input.columns.len(),
            "Assembling artifact"
        );

        let periods = PeriodInfo::from_columns(&input.columns);
        let mut cards = Vec::with_capacity(ViewId::ALL.len());
        let mut details = Vec::with_capacity(ViewId::ALL.len());
        let mut charts = BTreeMap::new();

        for view in ViewId::ALL {
            let captured = input.views.iter().find(|v| v.view_id == *view);

            if let Some(detail) = chart_detail(*view, &periods, &input.dataset) {
                let entries = detail
                    .contexts
                    .iter()
                    .zip(detail.slots.iter())
                    .map(|(ctx, slot)| ChartEntry {
                        id: slot.id.clone(),
                        option: ctx.to_option(),
                    })
                    .collect();
                charts.insert(view.as_str(), entries);
                cards.push(CardView::new(*view, "Interactive chart", false));
                details.push(DetailView::chart(*view, detail));
                continue;
            }

            let detail = match captured.and_then(|c| c.markup()) {
                Some(markup) => {
                    let (markup, rewritten) = rewrite_metric_cells(markup, &input.dataset);
                    if rewritten > 0 {
                        debug!(view = %view, cells = rewritten, "Tagged cells set from dataset");
                    }
                    cards.push(CardView::new(*view, "Captured view", false));
                    DetailView::captured(*view, CapturedMarkup::new(&markup))
                }
                None => {
                    let reason = match captured.map(|c| &c.content) {
                        Some(CaptureContent::Placeholder { reason }) => reason.as_str(),
                        _ => "not captured",
                    };
                    debug!(view = %view, reason, "View rendered as placeholder");
                    cards.push(CardView::new(*view, "Unavailable", true));
                    DetailView::placeholder(*view, self.config.placeholder_text.clone())
                }
            };
            details.push(match view {
                ViewId::DivisionalKpis => detail.with_values(kpi_values(&periods, &input.dataset)),
                _ => detail,
            });
        }

        let styles = StyleText::join(input.views.iter().filter_map(|v| v.style_fragment()));
        let generated_at = input.generated_at.format("%Y-%m-%d %H:%M UTC").to_string();

        let data = ScriptJson::new(&ReplayData {
            run_id: &input.run_id,
            division: &input.division,
            generated_at: input.generated_at.to_rfc3339(),
            views: ViewId::ALL.iter().map(|v| v.as_str()).collect(),
            periods: &periods,
            dataset: &input.dataset,
            charts,
            config: RuntimeConfig {
                cdn_url: &self.config.cdn_url,
                chart_unavailable_text: &self.config.chart_unavailable_text,
            },
        })?;

        let template = ArtifactTemplate {
            title: format!("{} - {}", input.division, self.config.title_suffix),
            division: &input.division,
            generated_at,
            run_id: &input.run_id,
            version: env!("CARGO_PKG_VERSION"),
            logo: input.logo.as_ref().map(Logo::data_uri),
            periods: &periods,
            cards,
            details,
            styles,
            bundle: InlineScript::new(&input.bundle.text),
            bundle_source: input.bundle.source.to_string(),
            data,
            runtime: InlineScript::new(REPLAY_RUNTIME),
        };
        let html = self.finish(template.render()?);

        let artifact = ReportArtifact {
            filename: artifact_filename(&input.division, input.generated_at.date_naive()),
            html,
        };
        debug!(
            bytes = artifact.html.len(),
            minified = self.config.minify,
            "Artifact rendered"
        );
        Ok(artifact)
    }

    fn finish(&self, html: String) -> String {
        if !self.config.minify {
            return html;
        }
        // Scripts carry the chart bundle and the runtime verbatim.
        let cfg = minify_html::Cfg {
            minify_js: false,
            minify_css: true,
            keep_closing_tags: true,
            ..Default::default()
        };
        String::from_utf8(minify_html::minify(html.as_bytes(), &cfg)).unwrap_or(html)
    }
}
