use std::collections::VecDeque;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Lines of server output kept for diagnostics.
pub const OUTPUT_TAIL_LINES: usize = 500;
/// How long an exited process's output readers get to reach EOF.
pub const OUTPUT_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Bounded buffer of the most recent lines a child wrote to stdout/stderr.
#[derive(Debug, Clone)]
pub struct OutputTail {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl OutputTail {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity: capacity.max(1),
        }
    }

    pub async fn push(&self, line: String) {
        let mut lines = self.lines.lock().await;
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    pub async fn snapshot(&self) -> Vec<String> {
        self.lines.lock().await.iter().cloned().collect()
    }

    pub async fn render(&self) -> String {
        self.snapshot().await.join("\n")
    }
}

impl Default for OutputTail {
    fn default() -> Self {
        Self::new(OUTPUT_TAIL_LINES)
    }
}

/// Copy `reader` line by line into `tail` until EOF.
///
/// Keeps the child's pipe drained so it never blocks on a full buffer.
pub(crate) fn drain_output<R>(
    reader: R,
    stream: &'static str,
    name: String,
    tail: OutputTail,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    tracing::debug!(target: "sgl_deploy::server", container=%name, stream, "{line}");
                    tail.push(line).await;
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(container=%name, stream, error=%e, "stopped reading server output");
                    break;
                }
            }
        }
    })
}

/// How the server process is held.
#[derive(Debug)]
pub enum ProcessKind {
    /// A locally spawned client process (e.g. the attached `docker run`).
    Child(Child),
    /// Lifecycle owned elsewhere; nothing to wait on or kill.
    External,
}

/// Handle to a launched model server.
///
/// Dropping it does not stop anything: the child is not killed on drop and the
/// container keeps running until someone stops it.
#[derive(Debug)]
pub struct ServerProcess {
    name: String,
    kind: ProcessKind,
    output: OutputTail,
    /// Tasks copying the child's pipes into `output`.
    drains: Vec<JoinHandle<()>>,
}

impl ServerProcess {
    pub fn new(name: impl Into<String>, kind: ProcessKind, output: OutputTail) -> Self {
        Self {
            name: name.into(),
            kind,
            output,
            drains: Vec::new(),
        }
    }

    /// Attach the tasks filling `output`, so an exit can wait for the last lines.
    pub fn with_drains(mut self, drains: Vec<JoinHandle<()>>) -> Self {
        self.drains = drains;
        self
    }

    pub fn external(name: impl Into<String>) -> Self {
        Self::new(name, ProcessKind::External, OutputTail::default())
    }

    /// Container name, used for `docker logs` and teardown.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output(&self) -> &OutputTail {
        &self.output
    }

    pub fn pid(&self) -> Option<u32> {
        match &self.kind {
            ProcessKind::Child(child) => child.id(),
            ProcessKind::External => None,
        }
    }

    /// Resolves when the local process exits. Never resolves for external servers.
    ///
    /// Before returning, waits up to [`OUTPUT_FLUSH_TIMEOUT`] for the output
    /// readers, so the tail holds everything the process wrote.
    pub async fn exited(&mut self) -> std::io::Result<ExitStatus> {
        let status = match &mut self.kind {
            ProcessKind::Child(child) => child.wait().await?,
            ProcessKind::External => std::future::pending().await,
        };
        self.flush_output().await;
        Ok(status)
    }

    /// Wait for the output readers to hit EOF, bounded by [`OUTPUT_FLUSH_TIMEOUT`].
    ///
    /// A reader is dropped from the list only once it has finished, so this
    /// stays safe to cancel and to call again.
    pub async fn flush_output(&mut self) {
        let deadline = tokio::time::Instant::now() + OUTPUT_FLUSH_TIMEOUT;
        while let Some(handle) = self.drains.last_mut() {
            if tokio::time::timeout_at(deadline, handle).await.is_err() {
                tracing::debug!(container=%self.name, "server output still open after exit");
                return;
            }
            self.drains.pop();
        }
    }

    pub async fn kill(&mut self) {
        if let ProcessKind::Child(child) = &mut self.kind {
            if let Err(e) = child.kill().await {
                tracing::debug!(container=%self.name, error=%e, "failed to kill server process");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tail_keeps_most_recent_lines() {
        let tail = OutputTail::new(2);
        tail.push("a".into()).await;
        tail.push("b".into()).await;
        tail.push("c".into()).await;
        assert_eq!(tail.snapshot().await, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(tail.render().await, "b\nc");
    }

    #[tokio::test]
    async fn test_drain_output_collects_lines() {
        let tail = OutputTail::new(10);
        let reader: &'static [u8] = b"loading weights\nserver started\n";
        drain_output(reader, "stdout", "t".into(), tail.clone())
            .await
            .unwrap();
        assert_eq!(
            tail.snapshot().await,
            vec!["loading weights".to_string(), "server started".to_string()]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_waits_for_last_output_line() {
        let mut child = tokio::process::Command::new("sh")
            .args(["-c", "echo 'pull access denied' >&2; exit 3"])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .unwrap();
        let tail = OutputTail::new(10);
        let drain = drain_output(child.stderr.take().unwrap(), "stderr", "t".into(), tail.clone());
        let mut p = ServerProcess::new("t", ProcessKind::Child(child), tail).with_drains(vec![drain]);

        let status = p.exited().await.unwrap();
        assert_eq!(status.code(), Some(3));
        assert_eq!(p.output().render().await, "pull access denied");
        // already flushed; a second wait returns straight away
        assert_eq!(p.exited().await.unwrap().code(), Some(3));
    }

    #[tokio::test]
    async fn test_external_process_has_no_pid() {
        let mut p = ServerProcess::external("ext");
        assert_eq!(p.name(), "ext");
        assert_eq!(p.pid(), None);
        p.kill().await;
        let exited = tokio::time::timeout(std::time::Duration::from_millis(50), p.exited()).await;
        assert!(exited.is_err(), "external process must never report exit");
    }
}
