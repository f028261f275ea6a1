//! View capture: open a view, wait for its data, clone its markup, close it.
//!
//! Each view walks a small state machine:
//!
//! ```text
//! Idle -> Opening -> WaitingReady -> Cloning -> PostProcessing -> Closing -> Captured
//!                         |
//!                         +-> (timeout) -> Closing -> Placeholder
//! ```
//!
//! Closing runs on every path. Readiness timeouts and missing elements
//! demote the view to a placeholder; anything else propagates after closing
//! and [`capture_all`] turns it into a placeholder before moving on.

use crate::context::ExportContext;
use crate::host::LiveApp;
use crate::readiness::{wait_until_ready, PollPolicy};
use crate::views::{ViewAccessor, ViewRegistry};
use dx_common::{Error, Result, ViewId};
use dx_config::{ExportConfig, PostProcessRules};
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

pub use dx_report::{CaptureContent, CapturedView};

/// Where a view is in its capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Opening,
    WaitingReady,
    Cloning,
    PostProcessing,
    Closing,
    Captured,
    Placeholder,
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CaptureState::Idle => "idle",
            CaptureState::Opening => "opening",
            CaptureState::WaitingReady => "waiting_ready",
            CaptureState::Cloning => "cloning",
            CaptureState::PostProcessing => "post_processing",
            CaptureState::Closing => "closing",
            CaptureState::Captured => "captured",
            CaptureState::Placeholder => "placeholder",
        };
        f.write_str(name)
    }
}

struct Tracker {
    view: ViewId,
    state: CaptureState,
}

impl Tracker {
    fn to(&mut self, next: CaptureState) {
        debug!(view = %self.view, from = %self.state, to = %next, "Capture transition");
        self.state = next;
    }
}

/// Capture one view.
///
/// Returns a placeholder for soft failures; other errors are returned after
/// the view has been closed.
pub async fn capture_view(
    app: &dyn LiveApp,
    accessor: &dyn ViewAccessor,
    config: &ExportConfig,
    ctx: &mut ExportContext,
) -> Result<CapturedView> {
    let view = accessor.view_id();
    let mut tracker = Tracker {
        view,
        state: CaptureState::Idle,
    };

    let result = run_capture(app, accessor, config, ctx, &mut tracker).await;

    tracker.to(CaptureState::Closing);
    match accessor.close(app, &config.ui).await {
        Ok(()) => ctx.mark_closed(view),
        Err(e) => {
            warn!(view = %view, error = %e, "Dismiss failed; view left open");
            ctx.warn(format!("{}: dismiss failed: {}", view, e));
        }
    }

    match result {
        Ok(captured) => {
            tracker.to(CaptureState::Captured);
            Ok(captured)
        }
        Err(e) if e.is_soft_capture_failure() => {
            tracker.to(CaptureState::Placeholder);
            warn!(view = %view, error = %e, "View captured as placeholder");
            ctx.warn(format!("{}: {}", view, e));
            Ok(CapturedView::placeholder(view, e.to_string()))
        }
        Err(e) => Err(e),
    }
}

async fn run_capture(
    app: &dyn LiveApp,
    accessor: &dyn ViewAccessor,
    config: &ExportConfig,
    ctx: &mut ExportContext,
    tracker: &mut Tracker,
) -> Result<CapturedView> {
    let view = accessor.view_id();

    tracker.to(CaptureState::Opening);
    ctx.mark_open(view);
    accessor.open(app, &config.ui).await?;

    tracker.to(CaptureState::WaitingReady);
    let spec = accessor.readiness();
    let policy = PollPolicy::for_kind(&config.readiness, spec.kind());
    wait_until_ready(app, view, accessor.container(), &spec, &policy).await?;

    tracker.to(CaptureState::Cloning);
    let raw = clone_container(app, accessor.container()).await?;

    tracker.to(CaptureState::PostProcessing);
    let markup = post_process(&raw, accessor.post_process());
    let concept = config.concept(accessor.style_concept()).ok_or_else(|| {
        Error::Config(format!(
            "view '{}' references unknown style concept '{}'",
            view,
            accessor.style_concept()
        ))
    })?;
    let style = ctx.style_for(app, concept).await;

    Ok(CapturedView::captured(view, markup, style.css))
}

/// Outer markup of `container` with every canvas shown as an image.
///
/// Swapped canvases are restored even when reading the markup fails.
async fn clone_container(app: &dyn LiveApp, container: &str) -> Result<String> {
    let canvases = app.canvases(container).await?;
    let mut swapped = Vec::with_capacity(canvases.len());

    for canvas in &canvases {
        let image = match app.rasterize_canvas(canvas).await {
            Ok(image) => image,
            Err(e) => {
                debug!(canvas = %canvas, error = %e, "Canvas left in place");
                continue;
            }
        };
        match app.swap_canvas(canvas, &image).await {
            Ok(()) => swapped.push(canvas),
            Err(e) => debug!(canvas = %canvas, error = %e, "Canvas swap failed"),
        }
    }

    let html = app.outer_html(container).await;

    for canvas in swapped {
        if let Err(e) = app.restore_canvas(canvas).await {
            warn!(canvas = %canvas, error = %e, "Canvas restore failed");
        }
    }
    html
}

fn tag_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<([A-Za-z][A-Za-z0-9-]*)(\s[^>]*)?>").ok())
        .as_ref()
}

fn style_attr_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\s+style\s*=\s*(?:"([^"]*)"|'([^']*)')"#).ok())
        .as_ref()
}

const COLOR_PROPERTIES: &[&str] = &["color", "background", "background-color"];
const WIDTH_TAGS: &[&str] = &["table", "col", "th", "td"];

/// Apply substitutions, then strip inline styles down to colors.
pub fn post_process(html: &str, rules: &PostProcessRules) -> String {
    let mut out = html.to_string();
    for sub in &rules.substitutions {
        if !sub.from.is_empty() {
            out = out.replace(&sub.from, &sub.to);
        }
    }

    let (Some(tag_re), Some(style_re)) = (tag_regex(), style_attr_regex()) else {
        return out;
    };

    tag_re
        .replace_all(&out, |caps: &Captures| {
            let tag = caps[1].to_ascii_lowercase();
            let Some(attrs) = caps.get(2).map(|m| m.as_str()) else {
                return caps[0].to_string();
            };
            let keep_width = rules.preserve_column_widths && WIDTH_TAGS.contains(&tag.as_str());
            let attrs = style_re.replace_all(attrs, |s: &Captures| {
                let decls = s.get(1).or_else(|| s.get(2)).map_or("", |m| m.as_str());
                let kept = filter_declarations(decls, keep_width);
                if kept.is_empty() {
                    String::new()
                } else {
                    format!(" style=\"{}\"", kept.replace('"', "&quot;"))
                }
            });
            format!("<{}{}>", &caps[1], attrs)
        })
        .into_owned()
}

fn filter_declarations(decls: &str, keep_width: bool) -> String {
    split_declarations(decls)
        .into_iter()
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim();
            let keep = COLOR_PROPERTIES.contains(&prop.as_str()) || (keep_width && prop == "width");
            (keep && !value.is_empty()).then(|| format!("{}: {}", prop, value))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Split a `style` attribute value on top-level `;`.
///
/// Semicolons inside parentheses, quotes or character references
/// (`&quot;`, `&#39;`) belong to the value.
fn split_declarations(decls: &str) -> Vec<&str> {
    let bytes = decls.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match (quote, b) {
            (_, b'&') => {
                if let Some(len) = char_reference_len(&bytes[i..]) {
                    i += len;
                    continue;
                }
            }
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'(') => depth += 1,
            (None, b')') => depth = depth.saturating_sub(1),
            (None, b';') if depth == 0 => {
                parts.push(&decls[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&decls[start..]);
    parts
}

/// Length of a character reference such as `&quot;` or `&#x27;` at the
/// start of `bytes`, including the `&` and `;`.
fn char_reference_len(bytes: &[u8]) -> Option<usize> {
    let body = bytes.get(1..)?;
    let end = body.iter().take(32).position(|b| *b == b';')?;
    let name = &body[..end];
    let valid = match name {
        [b'#', b'x' | b'X', hex @ ..] => !hex.is_empty() && hex.iter().all(u8::is_ascii_hexdigit),
        [b'#', digits @ ..] => !digits.is_empty() && digits.iter().all(u8::is_ascii_digit),
        _ => !name.is_empty() && name.iter().all(u8::is_ascii_alphanumeric),
    };
    valid.then_some(end + 2)
}

/// Capture every registered view in card order, one at a time.
///
/// A view that fails hard becomes a placeholder; the run continues.
pub async fn capture_all(
    app: &dyn LiveApp,
    registry: &ViewRegistry,
    config: &ExportConfig,
    ctx: &mut ExportContext,
) -> Vec<CapturedView> {
    let mut captured = Vec::with_capacity(registry.len());
    for accessor in registry.iter() {
        let view = accessor.view_id();
        match capture_view(app, accessor.as_ref(), config, ctx).await {
            Ok(result) => captured.push(result),
            Err(e) => {
                warn!(view = %view, error = %e, "View capture failed");
                ctx.warn(format!("{}: {}", view, e));
                captured.push(CapturedView::placeholder(view, e.to_string()));
            }
        }
    }
    let placeholders = captured.iter().filter(|v| v.is_placeholder()).count();
    info!(
        views = captured.len(),
        placeholders,
        "Views captured"
    );
    captured
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorded::{RecordedApp, RecordedView, Recording};
    use crate::views::BoundView;
    use dx_config::{ReadinessSettings, Substitution, UiTiming};
    use std::collections::BTreeMap;

    fn fast_config() -> ExportConfig {
        ExportConfig {
            readiness: ReadinessSettings {
                interval_ms: 10,
                table_max_attempts: 3,
                numeric_max_attempts: 3,
                settle_ms: 5,
            },
            ui: UiTiming {
                tab_settle_ms: 0,
                open_settle_ms: 0,
                close_settle_ms: 0,
            },
            ..ExportConfig::default()
        }
    }

    fn rep_view(ready_after_polls: u32) -> RecordedView {
        RecordedView {
            open_label: "Sales by Sales Rep".to_string(),
            dismiss_label: "Close".to_string(),
            container: "[data-view=\"sales-rep\"]".to_string(),
            html: concat!(
                "<div data-view=\"sales-rep\"><canvas id=\"rep-pie\"></canvas>",
                "<table style=\"width: 80%; color: #103766\"><tr><th style=\"padding: 4px\">Sales Rep</th></tr>",
                "<tr><td>Ana</td></tr></table></div>"
            )
            .to_string(),
            texts: BTreeMap::from([(
                "table tr".to_string(),
                vec!["Sales Rep".to_string(), "Ana 1.2 M".to_string()],
            )]),
            ready_after_polls,
            canvases: vec!["rep-pie".to_string()],
            ..RecordedView::default()
        }
    }

    fn accessor(config: &ExportConfig, view: ViewId) -> BoundView {
        BoundView::new(config.binding(view).cloned().unwrap())
    }

    #[test]
    fn test_post_process_keeps_only_colors() {
        let rules = PostProcessRules::default();
        let html = r#"<td style="padding: 2px; color: red; WIDTH: 40px">x</td><div style="margin:0">y</div>"#;
        assert_eq!(
            post_process(html, &rules),
            r#"<td style="color: red">x</td><div>y</div>"#
        );
    }

    #[test]
    fn test_post_process_preserves_column_widths() {
        let rules = PostProcessRules {
            substitutions: vec![],
            preserve_column_widths: true,
        };
        let html = r#"<col style="width: 30%"><div style="width: 10px; background: #fff">z</div>"#;
        assert_eq!(
            post_process(html, &rules),
            r#"<col style="width: 30%"><div style="background: #fff">z</div>"#
        );
    }

    #[test]
    fn test_post_process_substitutions_in_order() {
        let rules = PostProcessRules {
            substitutions: vec![
                Substitution {
                    from: ">Sales Rep<".to_string(),
                    to: ">Sales Reps<".to_string(),
                },
                Substitution {
                    from: "Reps".to_string(),
                    to: "Representatives".to_string(),
                },
            ],
            preserve_column_widths: false,
        };
        assert_eq!(
            post_process("<th>Sales Rep</th>", &rules),
            "<th>Sales Representatives</th>"
        );
    }

    #[test]
    fn test_post_process_keeps_quoted_urls_intact() {
        let html = r#"<td style="background: url(&quot;data:image/png;base64,AAA&quot;); padding: 2px">x</td>"#;
        assert_eq!(
            post_process(html, &PostProcessRules::default()),
            r#"<td style="background: url(&quot;data:image/png;base64,AAA&quot;)">x</td>"#
        );

        let html = r#"<span style="font-family: &quot;Inter&quot;; color: #1b5e20">a</span>"#;
        assert_eq!(
            post_process(html, &PostProcessRules::default()),
            r#"<span style="color: #1b5e20">a</span>"#
        );

        let html = r#"<div style='background: url("a;b.png"); margin: 0'>y</div>"#;
        assert_eq!(
            post_process(html, &PostProcessRules::default()),
            r#"<div style="background: url(&quot;a;b.png&quot;)">y</div>"#
        );
    }

    #[test]
    fn test_split_declarations_top_level_only() {
        assert_eq!(split_declarations("a: 1; b: 2"), vec!["a: 1", " b: 2"]);
        assert_eq!(
            split_declarations("background: rgb(1, 2, 3); x: url(a;b)"),
            vec!["background: rgb(1, 2, 3)", " x: url(a;b)"]
        );
        assert_eq!(split_declarations("x: &amp;; y: 1"), vec!["x: &amp;", " y: 1"]);
        assert_eq!(split_declarations("x: a & b; y: 1"), vec!["x: a & b", " y: 1"]);
        assert_eq!(char_reference_len(b"&quot;rest"), Some(6));
        assert_eq!(char_reference_len(b"&#x27;"), Some(6));
        assert_eq!(char_reference_len(b"& b;"), None);
    }

    proptest::proptest! {
        #[test]
        fn prop_only_color_declarations_survive(
            props in proptest::collection::vec(
                proptest::sample::select(vec!["color", "padding", "margin", "background", "width", "font-size"]),
                0..6,
            )
        ) {
            let decls: Vec<String> = props.iter().map(|p| format!("{}: 1px", p)).collect();
            let html = format!("<div style=\"{}\">x</div>", decls.join("; "));
            let out = post_process(&html, &PostProcessRules::default());
            for banned in ["padding", "margin", "width", "font-size"] {
                proptest::prop_assert!(!out.contains(banned));
            }
            proptest::prop_assert!(!out.contains("style=\"\""));
            proptest::prop_assert!(out.ends_with(">x</div>"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_swaps_and_restores_canvases() {
        let config = fast_config();
        let app = RecordedApp::new(Recording {
            views: vec![rep_view(1)],
            ..Recording::default()
        });
        let mut ctx = ExportContext::new("run-test");

        let captured = capture_view(&app, &accessor(&config, ViewId::SalesRep), &config, &mut ctx)
            .await
            .unwrap();

        let markup = captured.markup().unwrap();
        assert!(markup.contains("<img id=\"rep-pie\""));
        assert!(markup.contains(">Sales Reps<"));
        assert!(markup.contains("<table style=\"color: #103766\">"));
        assert!(!markup.contains("padding"));
        assert!(!captured.style_fragment().unwrap().is_empty());

        assert!(app.swapped_canvases().is_empty());
        assert!(app.open_containers().is_empty());
        assert!(ctx.open_views.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_placeholder_and_closes() {
        let config = fast_config();
        let mut view = rep_view(0);
        view.never_ready = true;
        let app = RecordedApp::new(Recording {
            views: vec![view],
            ..Recording::default()
        });
        let mut ctx = ExportContext::new("run-test");

        let captured = capture_view(&app, &accessor(&config, ViewId::SalesRep), &config, &mut ctx)
            .await
            .unwrap();
        assert!(captured.is_placeholder());
        assert!(app.history().last().unwrap().starts_with("click:Close@"));
        assert_eq!(ctx.warnings.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_failure_restores_canvas_and_propagates() {
        let config = fast_config();
        let mut view = rep_view(0);
        view.fail_outer_html = true;
        let app = RecordedApp::new(Recording {
            views: vec![view],
            ..Recording::default()
        });
        let mut ctx = ExportContext::new("run-test");

        let err = capture_view(&app, &accessor(&config, ViewId::SalesRep), &config, &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Driver(_)));
        assert!(app.swapped_canvases().is_empty());
        assert!(app.open_containers().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_all_continues_past_failures() {
        let config = fast_config();
        let registry = ViewRegistry::from_config(&config).unwrap();
        // Only the sales-rep view exists; every other open label is missing.
        let app = RecordedApp::new(Recording {
            views: vec![rep_view(0)],
            missing_labels: ViewId::ALL
                .iter()
                .filter(|v| **v != ViewId::SalesRep)
                .map(|v| v.title().to_string())
                .collect(),
            ..Recording::default()
        });
        let mut ctx = ExportContext::new("run-test");

        let captured = capture_all(&app, &registry, &config, &mut ctx).await;
        assert_eq!(captured.len(), ViewId::ALL.len());
        let order: Vec<ViewId> = captured.iter().map(|v| v.view_id).collect();
        assert_eq!(order, ViewId::ALL.to_vec());
        assert_eq!(captured.iter().filter(|v| !v.is_placeholder()).count(), 1);
        assert!(ctx.open_views.is_empty());
    }
}
