// src/scheduler/mod.rs
mod pipeline;
mod scheduler;

pub use pipeline::{AlertResult, CheckPipeline, CheckResult};
pub use scheduler::{ProbeCycleReport, RotationReport, Scheduler};
