use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::*;
use crate::error::LaunchError;
use crate::process::ServerProcess;
use crate::runtime::ContainerRuntime;

pub(crate) fn test_config(port: u16) -> DeployConfig {
    DeployConfig {
        model_id: DEFAULT_MODEL_ID.to_string(),
        port,
        temperature: DEFAULT_TEMPERATURE,
        max_tokens: DEFAULT_MAX_TOKENS,
        tp_degree: DEFAULT_TP_DEGREE,
        image: DEFAULT_IMAGE.to_string(),
        container_name: DEFAULT_CONTAINER_NAME.to_string(),
        hf_cache_dir: "/tmp/hf-cache".into(),
        docker_bin: "docker".to_string(),
        extra_server_args: Vec::new(),
        replace_existing: true,
        ready_timeout: Duration::from_secs(DEFAULT_READY_TIMEOUT_SECS),
        poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        request_timeout: Duration::from_secs(5),
        api_key: DEFAULT_API_KEY.to_string(),
        strict_readiness: false,
        teardown_on_exit: false,
    }
}

/// Serve `router` on an ephemeral localhost port.
pub(crate) async fn spawn_server(router: axum::Router) -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    port
}

/// A localhost port with nothing listening on it.
pub(crate) async fn unused_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Runtime that hands out external handles and counts calls.
#[derive(Default)]
pub(crate) struct StubRuntime {
    logs: String,
    launches: AtomicUsize,
    log_calls: AtomicUsize,
    stops: AtomicUsize,
}

impl StubRuntime {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_logs(mut self, logs: &str) -> Self {
        self.logs = logs.to_string();
        self
    }

    pub(crate) fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub(crate) fn log_calls(&self) -> usize {
        self.log_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContainerRuntime for StubRuntime {
    fn runtime_type(&self) -> &str {
        "stub"
    }

    async fn launch(&self, config: &DeployConfig) -> Result<ServerProcess, LaunchError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(ServerProcess::external(config.container_name.clone()))
    }

    async fn logs(&self, _name: &str) -> anyhow::Result<String> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.logs.clone())
    }

    async fn stop(&self, _process: &mut ServerProcess) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}
