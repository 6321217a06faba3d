// src/alert/dispatcher.rs
use super::{Notifier, NotifyError};
use crate::check::Check;
use std::sync::Arc;
use tracing::{debug, warn};

/// Human-readable state-change notice for a check.
pub fn alert_message(check: &Check) -> String {
    format!(
        "Alert: Your check for {} {} is currently {}",
        check.method.as_str().to_uppercase(),
        check.target(),
        check.state
    )
}

/// Turns a state change into one notifier call. Best effort: failures are
/// returned for the caller to report, never retried here.
#[derive(Clone)]
pub struct AlertDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl AlertDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub async fn dispatch(&self, check: &Check) -> Result<(), NotifyError> {
        let message = alert_message(check);
        match self.notifier.send(&check.owner_phone, &message).await {
            Ok(()) => {
                debug!(check = %check.id, %message, "owner alerted");
                Ok(())
            }
            Err(e) => {
                warn!(check = %check.id, error = %e, "could not alert owner");
                Err(e)
            }
        }
    }
}
