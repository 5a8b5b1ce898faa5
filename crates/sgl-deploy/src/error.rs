use std::time::Duration;

use thiserror::Error;

/// The server process could not be started. Not retried.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// One failed readiness probe. Only ever logged; the poll loop retries.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("health probe transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("health probe returned {0}")]
    Status(reqwest::StatusCode),
}

/// The completion request never got an HTTP response.
#[derive(Debug, Error)]
#[error("inference request to {url} failed: {source}")]
pub struct InferenceTransportError {
    pub url: String,
    #[source]
    pub source: reqwest::Error,
}

/// Conditions that end a run.
///
/// Readiness failures only land here in strict mode; otherwise they are
/// logged and the run carries on.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error("server did not become ready within {0:?}")]
    ReadinessTimeout(Duration),
    #[error("server process `{name}` exited before becoming ready: {status}")]
    ServerExited { name: String, status: String },
}
