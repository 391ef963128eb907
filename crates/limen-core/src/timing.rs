//! CSS timing discovery for transition end detection.
//!
//! Computed style exposes `transition-delay` / `transition-duration` (and
//! the animation equivalents) as comma-separated second values. This module
//! parses those lists and derives, per timing kind, the total wait an end
//! watcher needs: the maximum of `delay + duration` across declared
//! properties, with the delay list cycled when it is shorter than the
//! duration list. The winning kind also fixes how many end events to expect
//! before a phase may settle.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Which native timing effect ends a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndKind {
    Transition,
    Animation,
}

/// Raw computed-style timing lists sampled from one element.
///
/// Values are kept verbatim as the host reports them (`"0.3s, 1s"`); an
/// empty string reads as a single zero entry, matching how an element
/// without any declared transition computes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingStyles {
    pub transition_delays: String,
    pub transition_durations: String,
    pub animation_delays: String,
    pub animation_durations: String,
}

impl TimingStyles {
    /// Timing for an element with only a transition declared.
    pub fn transition(delays: impl Into<String>, durations: impl Into<String>) -> Self {
        Self {
            transition_delays: delays.into(),
            transition_durations: durations.into(),
            ..Self::default()
        }
    }

    /// Timing for an element with only an animation declared.
    pub fn animation(delays: impl Into<String>, durations: impl Into<String>) -> Self {
        Self {
            animation_delays: delays.into(),
            animation_durations: durations.into(),
            ..Self::default()
        }
    }
}

/// Timing computed for one phase wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionInfo {
    /// Winning kind, or `None` when no timed effect is declared.
    pub kind: Option<EndKind>,
    /// Total wait in milliseconds: the maximum `delay + duration`.
    pub timeout_ms: u64,
    /// Number of end events expected from the winning kind.
    pub property_count: usize,
}

impl TransitionInfo {
    /// Info describing an element without any timed effect.
    pub fn none() -> Self {
        Self { kind: None, timeout_ms: 0, property_count: 0 }
    }
}

/// Compute the end-detection info for one element.
///
/// With `expected` set, only that kind's timing is considered; otherwise
/// the kind with the larger total timeout wins, ties favoring transitions.
/// A kind with a zero timeout never wins: the caller settles the phase
/// immediately instead of waiting for events that will not come.
pub fn transition_info(styles: &TimingStyles, expected: Option<EndKind>) -> TransitionInfo {
    let (transition_timeout, transition_count) =
        kind_timeout(&styles.transition_delays, &styles.transition_durations);
    let (animation_timeout, animation_count) =
        kind_timeout(&styles.animation_delays, &styles.animation_durations);

    let (kind, timeout, count) = match expected {
        Some(EndKind::Transition) => {
            (EndKind::Transition, transition_timeout, transition_count)
        }
        Some(EndKind::Animation) => (EndKind::Animation, animation_timeout, animation_count),
        None => {
            if transition_timeout >= animation_timeout {
                (EndKind::Transition, transition_timeout, transition_count)
            } else {
                (EndKind::Animation, animation_timeout, animation_count)
            }
        }
    };

    if timeout <= 0.0 {
        return TransitionInfo::none();
    }
    TransitionInfo { kind: Some(kind), timeout_ms: timeout.round() as u64, property_count: count }
}

/// Maximum `delay + duration` in milliseconds for one kind, plus the number
/// of declared durations. Delays cycle when the list is shorter.
fn kind_timeout(delays: &str, durations: &str) -> (f64, usize) {
    let delays: Vec<f64> = split_time_list(delays);
    let durations: Vec<f64> = split_time_list(durations);
    let timeout = durations
        .iter()
        .enumerate()
        .map(|(index, duration)| duration + delays[index % delays.len()])
        .fold(0.0, f64::max);
    (timeout, durations.len())
}

/// Parse a comma-separated list of CSS second values into milliseconds.
///
/// Never empty: an empty input yields a single zero, the computed-style
/// behavior for elements without the property.
fn split_time_list(list: &str) -> Vec<f64> {
    list.split(", ").map(parse_seconds_ms).collect()
}

/// Parse one CSS time like `"0.35s"` into milliseconds.
///
/// Some locales render computed values with a comma decimal separator;
/// those parse too. Anything else unparseable counts as zero.
fn parse_seconds_ms(value: &str) -> f64 {
    let trimmed = value.trim();
    let digits = trimmed.strip_suffix('s').unwrap_or(trimmed);
    if digits.is_empty() {
        return 0.0;
    }
    match digits.replace(',', ".").parse::<f64>() {
        Ok(seconds) => seconds * 1000.0,
        Err(_) => {
            trace!(value, "unparseable css time, counting as zero");
            0.0
        }
    }
}
