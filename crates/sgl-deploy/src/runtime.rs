use async_trait::async_trait;

use crate::config::DeployConfig;
use crate::error::LaunchError;
use crate::process::ServerProcess;

/// Starts, inspects and stops the isolated environment the server runs in.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Runtime identifier, e.g. "docker".
    fn runtime_type(&self) -> &str;

    /// Start the server and return as soon as the process exists.
    /// Does not wait for the server to accept requests.
    async fn launch(&self, config: &DeployConfig) -> Result<ServerProcess, LaunchError>;

    /// Output accumulated by the named server, for diagnostics.
    async fn logs(&self, name: &str) -> anyhow::Result<String>;

    /// Request termination of the server and release the local process.
    async fn stop(&self, process: &mut ServerProcess);
}
