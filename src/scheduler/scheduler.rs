// src/scheduler/scheduler.rs
use super::pipeline::{AlertResult, CheckPipeline, CheckResult};
use crate::check::{CheckState, CHECKS};
use crate::config::SchedulerConfig;
use crate::logs::{LogRotator, Rotation};
use crate::metrics::MetricsCollector;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProbeCycleReport {
    pub listed: usize,
    pub skipped: usize,
    pub up: usize,
    pub down: usize,
    pub alerts_sent: usize,
    pub alerts_failed: usize,
    pub store_failures: usize,
    pub log_failures: usize,
    pub aborted: usize,
}

impl ProbeCycleReport {
    pub fn probed(&self) -> usize {
        self.up + self.down
    }

    fn add(&mut self, result: CheckResult) {
        match result {
            CheckResult::Unreadable | CheckResult::Malformed(_) => self.skipped += 1,
            CheckResult::Probed {
                state,
                persisted,
                logged,
                alert,
            } => {
                match state {
                    CheckState::Up => self.up += 1,
                    CheckState::Down => self.down += 1,
                }
                if !persisted {
                    self.store_failures += 1;
                }
                if !logged {
                    self.log_failures += 1;
                }
                match alert {
                    AlertResult::Sent => self.alerts_sent += 1,
                    AlertResult::Failed => self.alerts_failed += 1,
                    AlertResult::NotNeeded | AlertResult::Withheld => {}
                }
            }
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RotationReport {
    pub rotated: usize,
    pub empty: usize,
    pub failed: usize,
}

/// Drives the probe cycle and the log rotation cycle on their own timers.
pub struct Scheduler {
    config: SchedulerConfig,
    pipeline: Arc<CheckPipeline>,
    rotator: LogRotator,
    probing: AtomicBool,
    rotating: AtomicBool,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, pipeline: CheckPipeline, rotator: LogRotator) -> Self {
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        Self {
            config,
            pipeline: Arc::new(pipeline),
            rotator,
            probing: AtomicBool::new(false),
            rotating: AtomicBool::new(false),
            shutdown_tx,
            shutdown_rx,
        }
    }

    fn metrics(&self) -> Option<&Arc<MetricsCollector>> {
        self.pipeline.metrics()
    }

    /// Run both cycles until [`Scheduler::shutdown`] is called. Each fires
    /// once immediately, then on its interval.
    pub async fn start(self: Arc<Self>) {
        info!(
            "Starting scheduler: probe every {:?}, rotate logs every {:?}",
            self.config.probe_interval(),
            self.config.rotation_interval()
        );

        let probes = tokio::spawn(self.clone().probe_loop());
        let rotations = tokio::spawn(self.clone().rotation_loop());

        for task in [probes, rotations] {
            if let Err(e) = task.await {
                error!("Scheduler loop failed: {}", e);
            }
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    async fn probe_loop(self: Arc<Self>) {
        let mut interval = interval(self.config.probe_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut shutdown_rx = self.shutdown_rx.clone();
        if *shutdown_rx.borrow() {
            return;
        }

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    // The timer re-arms while the cycle fans out.
                    let scheduler = self.clone();
                    tokio::spawn(async move {
                        scheduler.run_probe_cycle().await;
                    });
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Probe loop shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn rotation_loop(self: Arc<Self>) {
        let mut interval = interval(self.config.rotation_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut shutdown_rx = self.shutdown_rx.clone();
        if *shutdown_rx.borrow() {
            return;
        }

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let scheduler = self.clone();
                    tokio::spawn(async move {
                        scheduler.run_rotation_cycle().await;
                    });
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Rotation loop shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Probe every check once, concurrently. Returns `None` if the previous
    /// cycle is still running, in which case this one is skipped.
    pub async fn run_probe_cycle(&self) -> Option<ProbeCycleReport> {
        let Some(_guard) = CycleGuard::acquire(&self.probing) else {
            warn!("Previous probe cycle still running, skipping this one");
            if let Some(metrics) = self.metrics() {
                metrics.probe_cycles_overlapped_total.inc();
            }
            return None;
        };

        let span = info_span!("probe_cycle", cycle_id = %Uuid::new_v4());
        Some(self.probe_all().instrument(span).await)
    }

    async fn probe_all(&self) -> ProbeCycleReport {
        let mut report = ProbeCycleReport::default();

        let ids = match self.pipeline.store().list(CHECKS).await {
            Ok(ids) => ids,
            Err(e) => {
                error!("Could not list checks: {}", e);
                return report;
            }
        };
        report.listed = ids.len();
        if ids.is_empty() {
            debug!("No checks to process");
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_probes));
        let mut tasks = Vec::with_capacity(ids.len());

        for id in ids {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let pipeline = self.pipeline.clone();
            let task = tokio::spawn(
                async move {
                    let result = pipeline.run(&id).await;
                    drop(permit);
                    result
                }
                .in_current_span(),
            );
            tasks.push(task);
        }

        for result in futures::future::join_all(tasks).await {
            match result {
                Ok(check_result) => report.add(check_result),
                Err(e) => {
                    error!("Check task failed: {}", e);
                    report.aborted += 1;
                }
            }
        }

        if let Some(metrics) = self.metrics() {
            metrics.update_check_counts(report.up, report.down);
        }

        info!(
            "Probe cycle complete: {} checks, {} up, {} down, {} skipped, {} alerts",
            report.listed, report.up, report.down, report.skipped, report.alerts_sent
        );
        report
    }

    /// Rotate every check's log. Returns `None` if a rotation is already running.
    pub async fn run_rotation_cycle(&self) -> Option<RotationReport> {
        let Some(_guard) = CycleGuard::acquire(&self.rotating) else {
            warn!("Previous rotation still running, skipping this one");
            return None;
        };

        let mut report = RotationReport::default();
        let logs = match self.rotator.files().list(false).await {
            Ok(logs) => logs,
            Err(e) => {
                error!("Could not list logs to rotate: {}", e);
                return Some(report);
            }
        };

        let tasks: Vec<_> = logs
            .into_iter()
            .map(|log_id| {
                let rotator = self.rotator.clone();
                tokio::spawn(async move {
                    let result = rotator.rotate(&log_id).await;
                    (log_id, result)
                })
            })
            .collect();

        for joined in futures::future::join_all(tasks).await {
            let outcome = match joined {
                Ok((_, Ok(Rotation::Archived(_)))) => {
                    report.rotated += 1;
                    "rotated"
                }
                Ok((_, Ok(Rotation::Empty))) => {
                    report.empty += 1;
                    "empty"
                }
                Ok((log_id, Err(e))) => {
                    error!(log = %log_id, "Error rotating log: {}", e);
                    report.failed += 1;
                    "failed"
                }
                Err(e) => {
                    error!("Rotation task failed: {}", e);
                    report.failed += 1;
                    "failed"
                }
            };
            if let Some(metrics) = self.metrics() {
                metrics.record_rotation(outcome);
            }
        }

        info!(
            "Log rotation complete: {} rotated, {} empty, {} failed",
            report.rotated, report.empty, report.failed
        );
        Some(report)
    }
}

/// Holds a cycle's running flag for as long as the cycle runs.
struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CycleGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_guard_is_exclusive_until_dropped() {
        let flag = AtomicBool::new(false);
        let guard = CycleGuard::acquire(&flag);
        assert!(guard.is_some());
        assert!(CycleGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(CycleGuard::acquire(&flag).is_some());
    }
}
