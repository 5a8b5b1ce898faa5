use std::time::Duration;

use tokio::time::Instant;

use crate::config::DeployConfig;
use crate::diagnostics::collect_diagnostics;
use crate::error::DeployError;
use crate::inference::{InferenceResult, RequestRunner};
use crate::process::ServerProcess;
use crate::readiness::ReadinessPoller;
use crate::runtime::ContainerRuntime;

/// What a completed run observed.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub container_name: String,
    pub ready: bool,
    /// Time spent waiting for readiness.
    pub ready_wait: Duration,
    /// Server output pulled after a failed readiness wait.
    pub diagnostics: Option<String>,
    pub inference: InferenceResult,
}

enum Readiness {
    Ready,
    TimedOut,
    Exited(String),
}

/// Launch the server, wait for it, send the sample request.
///
/// Only a launch failure ends the run early; readiness failures are logged
/// and the request is sent anyway, unless `strict_readiness` is set. With
/// `teardown_on_exit` the server is stopped on every path after launch,
/// otherwise it is left running for the caller to stop.
pub async fn run(
    config: &DeployConfig,
    runtime: &dyn ContainerRuntime,
    poller: &ReadinessPoller,
    runner: &RequestRunner,
) -> Result<RunOutcome, DeployError> {
    let mut process = runtime.launch(config).await?;

    let result = drive(config, runtime, &mut process, poller, runner).await;

    if config.teardown_on_exit {
        runtime.stop(&mut process).await;
    } else {
        tracing::info!(
            container=%process.name(),
            runtime=%runtime.runtime_type(),
            "leaving server running; stop it separately when done"
        );
    }
    result
}

async fn drive(
    config: &DeployConfig,
    runtime: &dyn ContainerRuntime,
    process: &mut ServerProcess,
    poller: &ReadinessPoller,
    runner: &RequestRunner,
) -> Result<RunOutcome, DeployError> {
    tracing::info!(
        port = config.port,
        timeout_secs = config.ready_timeout.as_secs(),
        "waiting for the server to become ready"
    );
    let started = Instant::now();
    let readiness = tokio::select! {
        ready = poller.wait_for_ready(config.port, config.ready_timeout) => {
            if ready { Readiness::Ready } else { Readiness::TimedOut }
        }
        status = process.exited() => {
            let status = match status {
                Ok(s) => s.to_string(),
                Err(e) => format!("unknown ({e})"),
            };
            Readiness::Exited(status)
        }
    };
    let ready_wait = started.elapsed();
    let ready = matches!(readiness, Readiness::Ready);

    let mut diagnostics = None;
    let failure = match readiness {
        Readiness::Ready => {
            tracing::info!(wait_ms = ready_wait.as_millis() as u64, "server is up and running");
            None
        }
        Readiness::TimedOut => {
            tracing::error!(
                timeout_secs = config.ready_timeout.as_secs(),
                "server did not become ready within the timeout period"
            );
            Some(DeployError::ReadinessTimeout(config.ready_timeout))
        }
        Readiness::Exited(status) => {
            tracing::error!(container=%process.name(), %status, "server process exited before becoming ready");
            Some(DeployError::ServerExited {
                name: process.name().to_string(),
                status,
            })
        }
    };

    if let Some(err) = failure {
        let logs = collect_diagnostics(runtime, process).await;
        tracing::error!(container=%process.name(), "server logs:\n{logs}");
        diagnostics = Some(logs);

        if config.strict_readiness {
            return Err(err);
        }
        tracing::warn!(error=%err, "continuing to inference despite readiness failure");
    }

    tracing::info!(model=%config.model_id, "running inference against the model");
    let inference = runner
        .run_inference(config.port, config.temperature, config.max_tokens)
        .await;

    Ok(RunOutcome {
        container_name: process.name().to_string(),
        ready,
        ready_wait,
        diagnostics,
        inference,
    })
}
