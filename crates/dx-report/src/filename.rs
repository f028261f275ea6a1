//! Artifact file naming.

use chrono::NaiveDate;

/// Keep `[A-Za-z0-9\-_ ]`, collapse whitespace runs, trim.
///
/// An empty result falls back to `Division`.
pub fn sanitize_division_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' '))
        .collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        "Division".to_string()
    } else {
        collapsed
    }
}

/// `<SanitizedDivisionName> - Comprehensive Report - <YYYY-MM-DD>.html`
pub fn artifact_filename(division: &str, date: NaiveDate) -> String {
    format!(
        "{} - Comprehensive Report - {}.html",
        sanitize_division_name(division),
        date.format("%Y-%m-%d")
    )
}
