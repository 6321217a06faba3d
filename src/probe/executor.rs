// src/probe/executor.rs
use super::outcome::ProbeOutcome;
use crate::check::Check;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use tokio::time::{timeout, Duration};
use tracing::debug;
use url::Url;

/// Issues one bounded-time request for a check.
///
/// Implementations resolve to a single value, so each probe yields exactly
/// one outcome no matter which of completion, error or timeout wins.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, check: &Check) -> ProbeOutcome;
}

pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new() -> Result<Self, reqwest::Error> {
        // The first response's status is the outcome; redirects are not chased.
        let client = Client::builder().redirect(Policy::none()).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, check: &Check) -> ProbeOutcome {
        let target = match Url::parse(&check.target()) {
            Ok(url) => url,
            Err(e) => return ProbeOutcome::network_error(format!("invalid target: {}", e)),
        };

        let request = self
            .client
            .request(check.method.verb(), target)
            .send();

        let outcome = match timeout(Duration::from_secs(check.timeout_seconds), request).await {
            Ok(Ok(response)) => ProbeOutcome::response(response.status().as_u16()),
            Ok(Err(e)) if e.is_timeout() => ProbeOutcome::timeout(),
            Ok(Err(e)) => ProbeOutcome::network_error(e.to_string()),
            Err(_) => ProbeOutcome::timeout(),
        };

        debug!(check = %check.id, outcome = outcome.kind(), "probe finished");
        outcome
    }
}
