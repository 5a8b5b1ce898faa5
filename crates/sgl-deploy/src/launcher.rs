use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::DeployConfig;
use crate::error::LaunchError;
use crate::process::{drain_output, OutputTail, ProcessKind, ServerProcess};
use crate::runtime::ContainerRuntime;

/// Shared memory given to the container; sglang workers exchange tensors through /dev/shm.
pub const SHM_SIZE: &str = "32g";
/// Where the host cache directory is mounted inside the container.
pub const CONTAINER_HF_CACHE: &str = "/root/.cache/huggingface";
pub const SERVER_ENTRYPOINT: [&str; 3] = ["python3", "-m", "sglang.launch_server"];

/// Arguments for `docker run` (without the docker binary itself).
pub fn docker_run_args(config: &DeployConfig) -> Vec<String> {
    let port = config.port.to_string();

    let mut args: Vec<String> = vec![
        "run".into(),
        "--rm".into(),
        "--gpus".into(),
        "all".into(),
        "--shm-size".into(),
        SHM_SIZE.into(),
        "-p".into(),
        format!("{port}:{port}"),
        "-v".into(),
        format!("{}:{}", config.hf_cache_dir.display(), CONTAINER_HF_CACHE),
        "--ipc".into(),
        "host".into(),
        "--network".into(),
        "host".into(),
        "--privileged".into(),
        "--name".into(),
        config.container_name.clone(),
        config.image.clone(),
    ];
    args.extend(SERVER_ENTRYPOINT.iter().map(|s| s.to_string()));
    args.extend(sglang_args(config));
    args
}

/// Arguments for `sglang.launch_server`.
pub fn sglang_args(config: &DeployConfig) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--model".into(),
        config.model_id.clone(),
        "--tp".into(),
        config.tp_degree.to_string(),
        "--trust-remote-code".into(),
        "--port".into(),
        config.port.to_string(),
    ];
    args.extend(config.extra_server_args.iter().cloned());
    args
}

/// Runs the server through the docker CLI.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker_bin: String,
    replace_existing: bool,
}

impl DockerRuntime {
    pub fn new(config: &DeployConfig) -> Self {
        Self {
            docker_bin: config.docker_bin.clone(),
            replace_existing: config.replace_existing,
        }
    }

    async fn docker(&self, args: &[&str]) -> std::io::Result<std::process::Output> {
        Command::new(&self.docker_bin).args(args).output().await
    }

    /// Stop and remove a container by name. Errors are ignored; the
    /// container may not exist.
    async fn remove_container(&self, name: &str) {
        let _ = self.docker(&["stop", "-t", "10", name]).await;
        let _ = self.docker(&["rm", "-f", name]).await;
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    fn runtime_type(&self) -> &str {
        "docker"
    }

    async fn launch(&self, config: &DeployConfig) -> Result<ServerProcess, LaunchError> {
        let name = config.container_name.clone();

        if self.replace_existing {
            tracing::debug!(container=%name, "removing leftover container, if any");
            self.remove_container(&name).await;
        }

        let args = docker_run_args(config);
        tracing::info!(
            image=%config.image,
            container=%name,
            model=%config.model_id,
            port=config.port,
            tp=config.tp_degree,
            "starting docker container with sglang server"
        );
        tracing::info!(command=%format!("{} {}", self.docker_bin, args.join(" ")), "launch command");

        let mut child = Command::new(&self.docker_bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: self.docker_bin.clone(),
                source,
            })?;

        let output = OutputTail::default();
        let mut drains = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            drains.push(drain_output(stdout, "stdout", name.clone(), output.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            drains.push(drain_output(stderr, "stderr", name.clone(), output.clone()));
        }

        tracing::info!(container=%name, pid=?child.id(), "docker client started");
        Ok(ServerProcess::new(name, ProcessKind::Child(child), output).with_drains(drains))
    }

    async fn logs(&self, name: &str) -> anyhow::Result<String> {
        let output = self.docker(&["logs", name]).await?;
        if !output.status.success() {
            anyhow::bail!(
                "`{} logs {}` failed ({}): {}",
                self.docker_bin,
                name,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        // docker replays the container's stdout and stderr on the matching
        // streams. They arrive on separate pipes, so stderr is appended after
        // stdout and lines are not interleaved in the order they were written.
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }

    async fn stop(&self, process: &mut ServerProcess) {
        tracing::info!(container=%process.name(), "stopping docker container");
        self.remove_container(process.name()).await;
        process.kill().await;
    }
}
