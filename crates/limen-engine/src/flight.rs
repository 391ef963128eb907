//! Single-flight completion guards.

use serde::{Deserialize, Serialize};

/// Lifecycle of a one-shot completion token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightState {
    Pending,
    Fired,
    Cancelled,
}

/// A completion token that settles at most once.
///
/// Natural completion (end event or timeout fallback) and pre-emption by
/// the opposite phase race for the same token; whichever settles it first
/// wins and every later attempt is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightGuard {
    state: FlightState,
}

impl FlightGuard {
    pub fn new() -> Self {
        Self { state: FlightState::Pending }
    }

    /// Settle as completed. Returns whether this call won the race.
    pub fn fire(&mut self) -> bool {
        if self.state != FlightState::Pending {
            return false;
        }
        self.state = FlightState::Fired;
        true
    }

    /// Settle as cancelled. Returns whether this call won the race.
    pub fn cancel(&mut self) -> bool {
        if self.state != FlightState::Pending {
            return false;
        }
        self.state = FlightState::Cancelled;
        true
    }

    pub fn state(&self) -> FlightState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == FlightState::Pending
    }
}

impl Default for FlightGuard {
    fn default() -> Self {
        Self::new()
    }
}
