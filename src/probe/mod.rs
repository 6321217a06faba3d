// src/probe/mod.rs
mod executor;
mod outcome;

pub use executor::{HttpProber, Prober};
pub use outcome::{ProbeError, ProbeOutcome};
