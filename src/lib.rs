// src/lib.rs
pub mod alert;
pub mod check;
pub mod config;
pub mod logs;
pub mod metrics;
pub mod outcome;
pub mod probe;
pub mod scheduler;
pub mod server;
pub mod store;
