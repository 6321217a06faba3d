// src/metrics/collector.rs
use crate::check::CheckState;
use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Instant;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
        }
        buffer
    }
}

pub struct MetricsCollector {
    // Probe metrics
    pub probes_total: IntCounterVec,
    pub probe_outcomes_total: IntCounterVec,
    pub probe_duration_seconds: HistogramVec,

    // Pipeline failures and skips
    pub checks_skipped_total: IntCounterVec,
    pub store_failures_total: IntCounter,
    pub log_append_failures_total: IntCounter,

    // Alerts
    pub alerts_total: IntCounterVec,

    // Rotation
    pub rotations_total: IntCounterVec,

    // Cycle metrics
    pub probe_cycles_total: IntCounter,
    pub probe_cycles_overlapped_total: IntCounter,
    pub checks_up: IntGauge,
    pub checks_down: IntGauge,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let probes_total = IntCounterVec::new(
            Opts::new("monitor_probes_total", "Probes by derived check state"),
            &["state"],
        )?;
        registry.register(Box::new(probes_total.clone()))?;

        let probe_outcomes_total = IntCounterVec::new(
            Opts::new(
                "monitor_probe_outcomes_total",
                "Probes by outcome kind (response, timeout, network_error)",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(probe_outcomes_total.clone()))?;

        let probe_duration_seconds = HistogramVec::new(
            HistogramOpts::new("monitor_probe_duration_seconds", "Probe duration in seconds"),
            &["protocol"],
        )?;
        registry.register(Box::new(probe_duration_seconds.clone()))?;

        let checks_skipped_total = IntCounterVec::new(
            Opts::new(
                "monitor_checks_skipped_total",
                "Checks skipped for a cycle (unreadable or malformed)",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(checks_skipped_total.clone()))?;

        let store_failures_total = IntCounter::new(
            "monitor_store_failures_total",
            "Failed check state write-backs",
        )?;
        registry.register(Box::new(store_failures_total.clone()))?;

        let log_append_failures_total = IntCounter::new(
            "monitor_log_append_failures_total",
            "Failed check log appends",
        )?;
        registry.register(Box::new(log_append_failures_total.clone()))?;

        let alerts_total = IntCounterVec::new(
            Opts::new("monitor_alerts_total", "State change alerts by delivery result"),
            &["result"],
        )?;
        registry.register(Box::new(alerts_total.clone()))?;

        let rotations_total = IntCounterVec::new(
            Opts::new("monitor_log_rotations_total", "Log rotations by result"),
            &["result"],
        )?;
        registry.register(Box::new(rotations_total.clone()))?;

        let probe_cycles_total =
            IntCounter::new("monitor_probe_cycles_total", "Completed probe cycles")?;
        registry.register(Box::new(probe_cycles_total.clone()))?;

        let probe_cycles_overlapped_total = IntCounter::new(
            "monitor_probe_cycles_overlapped_total",
            "Probe cycles skipped because the previous one was still running",
        )?;
        registry.register(Box::new(probe_cycles_overlapped_total.clone()))?;

        let checks_up = IntGauge::new("monitor_checks_up", "Checks up after the last cycle")?;
        registry.register(Box::new(checks_up.clone()))?;

        let checks_down =
            IntGauge::new("monitor_checks_down", "Checks down after the last cycle")?;
        registry.register(Box::new(checks_down.clone()))?;

        Ok(Self {
            probes_total,
            probe_outcomes_total,
            probe_duration_seconds,
            checks_skipped_total,
            store_failures_total,
            log_append_failures_total,
            alerts_total,
            rotations_total,
            probe_cycles_total,
            probe_cycles_overlapped_total,
            checks_up,
            checks_down,
        })
    }

    pub fn record_probe(
        &self,
        protocol: &str,
        kind: &str,
        state: CheckState,
        duration: std::time::Duration,
    ) {
        self.probes_total.with_label_values(&[state.as_str()]).inc();
        self.probe_outcomes_total.with_label_values(&[kind]).inc();
        self.probe_duration_seconds
            .with_label_values(&[protocol])
            .observe(duration.as_secs_f64());
    }

    pub fn record_skip(&self, reason: &str) {
        self.checks_skipped_total.with_label_values(&[reason]).inc();
    }

    pub fn record_alert(&self, delivered: bool) {
        let result = if delivered { "sent" } else { "failed" };
        self.alerts_total.with_label_values(&[result]).inc();
    }

    pub fn record_rotation(&self, result: &str) {
        self.rotations_total.with_label_values(&[result]).inc();
    }

    pub fn update_check_counts(&self, up: usize, down: usize) {
        self.probe_cycles_total.inc();
        self.checks_up.set(up as i64);
        self.checks_down.set(down as i64);
    }
}

// Helper for timing operations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
