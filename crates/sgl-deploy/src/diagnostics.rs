use crate::process::ServerProcess;
use crate::runtime::ContainerRuntime;

/// Gather the server's output after a failed readiness wait.
///
/// Prefers the runtime's own log store. Falls back to the output captured
/// from the launched process, which is all that is left once a `--rm`
/// container has exited.
pub async fn collect_diagnostics(runtime: &dyn ContainerRuntime, process: &ServerProcess) -> String {
    match runtime.logs(process.name()).await {
        Ok(logs) if !logs.trim().is_empty() => return logs,
        Ok(_) => {
            tracing::warn!(container=%process.name(), "container logs are empty, using captured output");
        }
        Err(e) => {
            tracing::warn!(container=%process.name(), error=%e, "failed to fetch container logs, using captured output");
        }
    }
    process.output().render().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{OutputTail, ProcessKind};
    use crate::test_support::StubRuntime;

    #[tokio::test]
    async fn test_prefers_runtime_logs() {
        let runtime = StubRuntime::new().with_logs("CUDA out of memory");
        let process = ServerProcess::external("c");
        assert_eq!(collect_diagnostics(&runtime, &process).await, "CUDA out of memory");
        assert_eq!(runtime.log_calls(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_captured_output() {
        let runtime = StubRuntime::new();
        let tail = OutputTail::new(10);
        tail.push("Unable to find image 'lmsysorg/sglang:latest' locally".into()).await;
        tail.push("pull access denied".into()).await;
        let process = ServerProcess::new("c", ProcessKind::External, tail);

        let diag = collect_diagnostics(&runtime, &process).await;
        assert_eq!(
            diag,
            "Unable to find image 'lmsysorg/sglang:latest' locally\npull access denied"
        );
    }
}
