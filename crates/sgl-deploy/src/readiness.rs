use std::time::Duration;

use tokio::time::Instant;

use crate::error::ProbeError;

pub const HEALTH_PATH: &str = "/get_model_info";
pub const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Polls the server's health endpoint on a fixed interval.
#[derive(Debug, Clone)]
pub struct ReadinessPoller {
    http: reqwest::Client,
    interval: Duration,
}

impl ReadinessPoller {
    pub fn new(interval: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(PROBE_CONNECT_TIMEOUT)
            .timeout(PROBE_TIMEOUT)
            .build()?;
        Ok(Self::with_client(http, interval))
    }

    pub fn with_client(http: reqwest::Client, interval: Duration) -> Self {
        Self { http, interval }
    }

    pub fn health_url(port: u16) -> String {
        format!("http://127.0.0.1:{port}{HEALTH_PATH}")
    }

    /// One GET against the health endpoint. Only 200 counts as ready.
    pub async fn probe(&self, url: &str) -> Result<(), ProbeError> {
        let resp = self.http.get(url).send().await?;
        if resp.status() == reqwest::StatusCode::OK {
            Ok(())
        } else {
            Err(ProbeError::Status(resp.status()))
        }
    }

    /// Probe until the server answers 200 or `timeout` has elapsed.
    ///
    /// Returns on the first success. Failed probes are logged at debug and
    /// followed by a fixed sleep; a probe is only started while the deadline
    /// has not passed.
    pub async fn wait_for_ready(&self, port: u16, timeout: Duration) -> bool {
        let url = Self::health_url(port);
        let start = Instant::now();
        let mut attempt: u32 = 0;

        while start.elapsed() < timeout {
            attempt += 1;
            match self.probe(&url).await {
                Ok(()) => {
                    tracing::info!(
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "server ready"
                    );
                    return true;
                }
                Err(e) => {
                    tracing::debug!(attempt, error=%e, "server not ready");
                }
            }
            tokio::time::sleep(self.interval).await;
        }

        tracing::debug!(attempt, ?timeout, %url, "readiness deadline passed");
        false
    }
}
