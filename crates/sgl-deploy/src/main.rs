mod args;

use clap::Parser;

use sgl_deploy::{DockerRuntime, ReadinessPoller, RequestRunner};

use crate::args::Args;

const DEFAULT_LOG_DIRECTIVE: &str = "info,sgl_deploy=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let telemetry = sgl_deploy_common::telemetry::build_dispatch(
        "sgl-deploy",
        DEFAULT_LOG_DIRECTIVE,
        args.otlp_endpoint.as_deref(),
        args.otlp_token.as_deref(),
    );
    telemetry.install()?;

    let config = args.into_config()?;
    tracing::info!(
        model=%config.model_id,
        port=config.port,
        tp=config.tp_degree,
        temperature=config.temperature,
        max_tokens=config.max_tokens,
        otlp=telemetry.otlp_enabled(),
        "sgl-deploy starting"
    );

    let runtime = DockerRuntime::new(&config);
    let poller = ReadinessPoller::new(config.poll_interval)?;
    let runner = RequestRunner::new(config.api_key.clone(), config.request_timeout)?;

    let result = sgl_deploy::run(&config, &runtime, &poller, &runner).await;
    match &result {
        Ok(outcome) => tracing::info!(
            container=%outcome.container_name,
            ready=outcome.ready,
            ready_wait_ms=outcome.ready_wait.as_millis() as u64,
            status=?outcome.inference.status,
            "run finished"
        ),
        Err(e) => tracing::error!(error=%e, "run failed"),
    }

    telemetry.shutdown();
    result?;
    Ok(())
}
