// src/scheduler/pipeline.rs
use crate::alert::AlertDispatcher;
use crate::check::{validate, Check, CheckState, ValidationError, CHECKS};
use crate::logs::{CheckLogger, LogEntry};
use crate::metrics::{MetricsCollector, Timer};
use crate::outcome::process;
use crate::probe::Prober;
use crate::store::RecordStore;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertResult {
    /// No state change worth alerting on.
    NotNeeded,
    Sent,
    Failed,
    /// A change was detected but the new state did not persist; the next
    /// cycle re-derives it from what did.
    Withheld,
}

/// What happened to one check during one probe cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    Unreadable,
    Malformed(ValidationError),
    Probed {
        state: CheckState,
        persisted: bool,
        logged: bool,
        alert: AlertResult,
    },
}

/// read -> validate -> probe -> process -> persist -> log -> maybe alert,
/// for a single check. Every failure stays inside the check's own pass.
pub struct CheckPipeline {
    store: Arc<dyn RecordStore>,
    prober: Arc<dyn Prober>,
    logger: CheckLogger,
    dispatcher: AlertDispatcher,
    metrics: Option<Arc<MetricsCollector>>,
}

impl CheckPipeline {
    pub fn new(
        store: Arc<dyn RecordStore>,
        prober: Arc<dyn Prober>,
        logger: CheckLogger,
        dispatcher: AlertDispatcher,
    ) -> Self {
        Self {
            store,
            prober,
            logger,
            dispatcher,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn metrics(&self) -> Option<&Arc<MetricsCollector>> {
        self.metrics.as_ref()
    }

    pub async fn run(&self, id: &str) -> CheckResult {
        let record = match self.store.read(CHECKS, id).await {
            Ok(record) => record,
            Err(e) => {
                debug!(check = %id, error = %e, "could not read check");
                self.skip("unreadable");
                return CheckResult::Unreadable;
            }
        };

        let check = match validate(&record) {
            Ok(check) => check,
            Err(e) => {
                debug!(check = %id, error = %e, "check is not properly formatted, skipping");
                self.skip("malformed");
                return CheckResult::Malformed(e);
            }
        };

        let timer = Timer::new();
        let outcome = self.prober.probe(&check).await;
        let transition = process(&check, &outcome, Utc::now());

        if let Some(metrics) = &self.metrics {
            metrics.record_probe(
                check.protocol.as_str(),
                outcome.kind(),
                transition.state(),
                timer.elapsed(),
            );
        }

        let persisted = match self
            .store
            .update(CHECKS, id, &with_state(record, &transition.check))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!(check = %id, error = %e, "failed to save check state");
                if let Some(metrics) = &self.metrics {
                    metrics.store_failures_total.inc();
                }
                false
            }
        };

        let raise_alert = transition.alert && persisted;
        let entry = LogEntry::new(&transition, &outcome, raise_alert);
        let logged = match self.logger.log(&entry).await {
            Ok(()) => true,
            Err(e) => {
                error!(check = %id, error = %e, "failed to append check log");
                if let Some(metrics) = &self.metrics {
                    metrics.log_append_failures_total.inc();
                }
                false
            }
        };

        let alert = if !transition.alert {
            debug!(check = %id, state = %transition.state(), "check outcome has not changed, no alert needed");
            AlertResult::NotNeeded
        } else if !raise_alert {
            warn!(check = %id, "state change not persisted, alert withheld");
            AlertResult::Withheld
        } else {
            info!(
                check = %id,
                from = %transition.previous,
                to = %transition.state(),
                "check changed state"
            );
            let delivered = self.dispatcher.dispatch(&transition.check).await.is_ok();
            if let Some(metrics) = &self.metrics {
                metrics.record_alert(delivered);
            }
            if delivered {
                AlertResult::Sent
            } else {
                AlertResult::Failed
            }
        };

        CheckResult::Probed {
            state: transition.state(),
            persisted,
            logged,
            alert,
        }
    }

    fn skip(&self, reason: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_skip(reason);
        }
    }
}

/// The stored record with only the monitor-owned fields replaced.
fn with_state(mut record: Value, check: &Check) -> Value {
    if let Some(obj) = record.as_object_mut() {
        obj.insert("state".to_string(), Value::from(check.state.as_str()));
        obj.insert(
            "lastChecked".to_string(),
            check.last_checked.map(Value::from).unwrap_or(Value::Null),
        );
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_state_keeps_other_fields() {
        let record = json!({"id": "x", "extra": [1, 2], "state": "down"});
        let check = validate(&json!({
            "id": "abcdefghij0123456789",
            "phone": "5551234567",
            "protocol": "https",
            "url": "example.com",
            "method": "get",
            "successCodes": [200],
            "timeoutSeconds": 1,
            "state": "up",
            "lastChecked": 42
        }))
        .unwrap();

        let merged = with_state(record, &check);
        assert_eq!(merged, json!({"id": "x", "extra": [1, 2], "state": "up", "lastChecked": 42}));
    }
}
