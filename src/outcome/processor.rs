// src/outcome/processor.rs
use crate::check::{Check, CheckState};
use crate::probe::ProbeOutcome;
use chrono::{DateTime, Utc};

/// Result of folding one probe outcome into a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The check with `state` and `last_checked` advanced.
    pub check: Check,
    pub previous: CheckState,
    pub alert: bool,
}

impl Transition {
    pub fn state(&self) -> CheckState {
        self.check.state
    }

    pub fn changed(&self) -> bool {
        self.previous != self.check.state
    }
}

/// `up` iff the probe completed and its status is one the check accepts.
pub fn derive_state(check: &Check, outcome: &ProbeOutcome) -> CheckState {
    match (outcome.error.as_ref(), outcome.response_code) {
        (None, Some(status)) if check.accepts(status) => CheckState::Up,
        _ => CheckState::Down,
    }
}

/// Advance `prior` by one probe outcome observed at `now`.
///
/// An alert is raised only when the check had been probed before and the
/// derived state differs from the persisted one; a first probe never alerts.
pub fn process(prior: &Check, outcome: &ProbeOutcome, now: DateTime<Utc>) -> Transition {
    let state = derive_state(prior, outcome);
    let alert = prior.has_been_checked() && prior.state != state;

    let mut check = prior.clone();
    check.state = state;
    check.last_checked = Some(now.timestamp_millis());

    Transition {
        check,
        previous: prior.state,
        alert,
    }
}
