// src/outcome/mod.rs
mod processor;

pub use processor::{derive_state, process, Transition};
