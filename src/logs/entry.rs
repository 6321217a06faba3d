// src/logs/entry.rs
use crate::check::{Check, CheckState};
use crate::outcome::Transition;
use crate::probe::ProbeOutcome;
use serde::{Deserialize, Serialize};

/// One line of a check's log: the check as persisted after the probe, what
/// the probe returned, and what was decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub check: Check,
    pub outcome: ProbeOutcome,
    pub state: CheckState,
    /// Whether the owner is alerted for this probe. A state change whose
    /// write-back failed is not alerted, so it is logged as `false`.
    pub alert: bool,
    /// Epoch milliseconds of the probe.
    pub time: i64,
}

impl LogEntry {
    pub fn new(transition: &Transition, outcome: &ProbeOutcome, alert: bool) -> Self {
        Self {
            check: transition.check.clone(),
            outcome: outcome.clone(),
            state: transition.state(),
            alert,
            time: transition.check.last_checked.unwrap_or_default(),
        }
    }

    pub fn log_id(&self) -> &str {
        &self.check.id
    }
}
