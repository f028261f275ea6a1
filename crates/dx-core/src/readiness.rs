//! Readiness detection for eventually-consistent views.
//!
//! The dashboard never signals that a view has finished loading, so the
//! exporter polls: evaluate a predicate over the text of the view's value
//! elements, sleep, repeat. A condition that holds is re-checked once after a
//! short settle delay to absorb a final re-render.

use crate::host::LiveApp;
use dx_common::{Error, Result, ViewId};
use dx_config::{ReadinessBinding, ReadinessKind, ReadinessSettings};
use dx_metrics::{sanitize_number, Sanitized};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Timing budget for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub settle: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32, settle: Duration) -> Self {
        Self {
            interval,
            max_attempts,
            settle,
        }
    }

    /// Budget for a predicate kind from the configured settings.
    pub fn for_kind(settings: &ReadinessSettings, kind: ReadinessKind) -> Self {
        Self::new(
            settings.interval(),
            settings.max_attempts(kind),
            settings.settle(),
        )
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Check<T> {
    Ready(T),
    Pending(T),
}

/// Result of a whole wait.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// The condition held, and still held after the settle delay.
    Ready { value: T, attempts: u32 },
    /// The attempt budget ran out; `last` is the final observation.
    TimedOut { attempts: u32, last: Option<T> },
}

/// Poll `check` until it is ready and stays ready across the settle delay.
pub async fn await_condition<T, F, Fut>(mut check: F, policy: &PollPolicy) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Check<T>>,
{
    let mut last = None;
    let mut attempts = 0;

    while attempts < policy.max_attempts {
        attempts += 1;
        match check().await {
            Check::Ready(_) => {
                tokio::time::sleep(policy.settle).await;
                match check().await {
                    Check::Ready(value) => return PollOutcome::Ready { value, attempts },
                    Check::Pending(value) => last = Some(value),
                }
            }
            Check::Pending(value) => last = Some(value),
        }
        if attempts < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    PollOutcome::TimedOut { attempts, last }
}

/// What counts as a loaded value element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessPredicate {
    /// A table with at least one data row beyond its header.
    TableRows,
    /// Numeric value elements that have been filled in.
    Numeric,
}

/// Snapshot of the value elements at one poll.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Elements found.
    pub count: usize,
    /// Elements satisfying the predicate.
    pub matched: usize,
    /// `matched / count`, zero when nothing was found.
    pub fraction: f64,
    pub satisfied: bool,
}

impl Observation {
    fn empty() -> Self {
        Self {
            count: 0,
            matched: 0,
            fraction: 0.0,
            satisfied: false,
        }
    }
}

/// A readiness condition over one view.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadinessSpec {
    pub selector: String,
    pub predicate: ReadinessPredicate,
    pub min_count: usize,
    pub min_fraction: f64,
}

impl ReadinessSpec {
    pub fn from_binding(binding: &ReadinessBinding) -> Self {
        Self {
            selector: binding.selector.clone(),
            predicate: match binding.kind {
                ReadinessKind::TableRows => ReadinessPredicate::TableRows,
                ReadinessKind::Numeric => ReadinessPredicate::Numeric,
            },
            min_count: binding.min_count,
            min_fraction: binding.min_fraction,
        }
    }

    pub fn kind(&self) -> ReadinessKind {
        match self.predicate {
            ReadinessPredicate::TableRows => ReadinessKind::TableRows,
            ReadinessPredicate::Numeric => ReadinessKind::Numeric,
        }
    }

    /// Evaluate the condition over the current element texts.
    pub fn evaluate(&self, texts: &[String]) -> Observation {
        let count = texts.len();
        if count == 0 {
            return Observation::empty();
        }

        match self.predicate {
            ReadinessPredicate::TableRows => Observation {
                count,
                matched: count,
                fraction: 1.0,
                satisfied: count >= self.min_count.max(2),
            },
            ReadinessPredicate::Numeric => {
                let values: Vec<f64> = texts.iter().filter_map(|t| loaded_number(t)).collect();
                let matched = values.len();
                let fraction = matched as f64 / count as f64;
                let any_nonzero = values.iter().any(|v| *v != 0.0);
                Observation {
                    count,
                    matched,
                    fraction,
                    satisfied: count >= self.min_count
                        && fraction >= self.min_fraction
                        && any_nonzero,
                }
            }
        }
    }
}

const PLACEHOLDERS: &[&str] = &["", "-", "—", "–", "n/a", "na", "nan", "...", "…", "0"];

/// Whether a value element still shows loading placeholder text.
///
/// A bare `0` counts as a placeholder: views paint it before data arrives, and
/// a legitimately zero figure only delays readiness until the budget runs out.
pub fn is_placeholder(text: &str) -> bool {
    let text = text.trim();
    let lower = text.to_lowercase();
    PLACEHOLDERS.contains(&lower.as_str()) || lower.starts_with("loading")
}

fn loaded_number(text: &str) -> Option<f64> {
    if is_placeholder(text) {
        return None;
    }
    match sanitize_number(text) {
        Sanitized::Value(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

/// Poll `container` until `spec` holds.
///
/// A missing container or a failed driver read counts as an empty
/// observation; the view may simply not be mounted yet.
pub async fn wait_until_ready(
    app: &dyn LiveApp,
    view: ViewId,
    container: &str,
    spec: &ReadinessSpec,
    policy: &PollPolicy,
) -> Result<Observation> {
    let outcome = await_condition(
        move || async move {
            let observation = match app.element_texts(container, &spec.selector).await {
                Ok(texts) => spec.evaluate(&texts),
                Err(e) => {
                    debug!(view = %view, error = %e, "Readiness read failed");
                    Observation::empty()
                }
            };
            if observation.satisfied {
                Check::Ready(observation)
            } else {
                Check::Pending(observation)
            }
        },
        policy,
    )
    .await;

    match outcome {
        PollOutcome::Ready { value, attempts } => {
            debug!(view = %view, attempts, count = value.count, "View ready");
            Ok(value)
        }
        PollOutcome::TimedOut { attempts, last } => {
            let last = last.unwrap_or_else(Observation::empty);
            Err(Error::ReadinessTimeout {
                view: view.as_str().to_string(),
                count: last.count,
                fraction: last.fraction,
                attempts,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn numeric(min_count: usize, min_fraction: f64) -> ReadinessSpec {
        ReadinessSpec {
            selector: ".kpi-value".to_string(),
            predicate: ReadinessPredicate::Numeric,
            min_count,
            min_fraction,
        }
    }

    #[test]
    fn test_placeholder_vocabulary() {
        for text in ["", " - ", "—", "–", "N/A", "NaN", "...", "…", "Loading", "loading…", "0"] {
            assert!(is_placeholder(text), "{:?}", text);
        }
        for text in ["0.0", "12", "1.2 M", "-5%"] {
            assert!(!is_placeholder(text), "{:?}", text);
        }
    }

    #[test]
    fn test_numeric_predicate() {
        let spec = numeric(4, 0.6);
        let obs = spec.evaluate(&texts(&["1.2 M", "340 K", "45.1%", "—"]));
        assert_eq!(obs.count, 4);
        assert_eq!(obs.matched, 3);
        assert!(obs.satisfied);

        // Too few parse.
        let obs = spec.evaluate(&texts(&["1.2 M", "—", "Loading", "N/A"]));
        assert!(!obs.satisfied);
        assert!((obs.fraction - 0.25).abs() < 1e-9);

        // All zero is not loaded.
        let obs = spec.evaluate(&texts(&["0.0", "0.00", "0.0%", "0.0"]));
        assert_eq!(obs.matched, 4);
        assert!(!obs.satisfied);

        // Too few elements.
        assert!(!spec.evaluate(&texts(&["1", "2"])).satisfied);
    }

    #[test]
    fn test_table_predicate_needs_a_data_row() {
        let spec = ReadinessSpec {
            selector: "table tr".to_string(),
            predicate: ReadinessPredicate::TableRows,
            min_count: 1,
            min_fraction: 0.0,
        };
        assert!(!spec.evaluate(&texts(&["Ledger FY2024"])).satisfied);
        assert!(spec.evaluate(&texts(&["Ledger FY2024", "Sales 100"])).satisfied);
        assert!(!spec.evaluate(&[]).satisfied);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_condition_settles() {
        let calls = Cell::new(0u32);
        let policy = PollPolicy::new(Duration::from_millis(500), 10, Duration::from_millis(300));
        let start = tokio::time::Instant::now();

        let outcome = await_condition(
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n >= 3 {
                        Check::Ready(n)
                    } else {
                        Check::Pending(n)
                    }
                }
            },
            &policy,
        )
        .await;

        // Pending, pending, ready, settle, ready.
        assert_eq!(outcome, PollOutcome::Ready { value: 4, attempts: 3 });
        assert_eq!(start.elapsed(), Duration::from_millis(500 * 2 + 300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_condition_flicker_keeps_polling() {
        let calls = Cell::new(0u32);
        let policy = PollPolicy::new(Duration::from_millis(100), 10, Duration::from_millis(50));

        // Ready on the first check, gone on the settle re-check, then stable.
        let outcome = await_condition(
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n == 2 {
                        Check::Pending(n)
                    } else {
                        Check::Ready(n)
                    }
                }
            },
            &policy,
        )
        .await;
        assert_eq!(outcome, PollOutcome::Ready { value: 4, attempts: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_condition_times_out() {
        let policy = PollPolicy::new(Duration::from_millis(500), 4, Duration::from_millis(300));
        let start = tokio::time::Instant::now();
        let outcome = await_condition(|| async { Check::Pending(7u8) }, &policy).await;
        assert_eq!(
            outcome,
            PollOutcome::TimedOut {
                attempts: 4,
                last: Some(7)
            }
        );
        assert_eq!(start.elapsed(), Duration::from_millis(500 * 3));
    }
}
