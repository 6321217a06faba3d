// src/probe/outcome.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProbeError {
    Timeout,
    NetworkError { detail: String },
}

/// Raw result of one probe. Exactly one of `response_code` or `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOutcome {
    pub response_code: Option<u16>,
    pub error: Option<ProbeError>,
}

impl ProbeOutcome {
    pub fn response(status: u16) -> Self {
        Self {
            response_code: Some(status),
            error: None,
        }
    }

    pub fn timeout() -> Self {
        Self {
            response_code: None,
            error: Some(ProbeError::Timeout),
        }
    }

    pub fn network_error(detail: impl Into<String>) -> Self {
        Self {
            response_code: None,
            error: Some(ProbeError::NetworkError {
                detail: detail.into(),
            }),
        }
    }

    /// Metric label for the outcome kind.
    pub fn kind(&self) -> &'static str {
        match &self.error {
            None => "response",
            Some(ProbeError::Timeout) => "timeout",
            Some(ProbeError::NetworkError { .. }) => "network_error",
        }
    }
}
