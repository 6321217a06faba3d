// src/check/mod.rs
mod model;
mod validator;

pub use model::{
    Check, CheckState, HttpMethod, Protocol, CHECKS, CHECK_ID_LEN, MAX_TIMEOUT_SECS,
    MIN_TIMEOUT_SECS, PHONE_LEN,
};
pub use validator::{validate, ValidationError};
