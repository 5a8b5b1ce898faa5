//! Launch an SGLang server container, wait until it answers its health
//! probe, and send it one sample chat-completion request.

pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod inference;
pub mod launcher;
pub mod process;
pub mod readiness;
pub mod runtime;

#[cfg(test)]
mod test_support;

pub use config::DeployConfig;
pub use driver::{run, RunOutcome};
pub use error::{DeployError, InferenceTransportError, LaunchError, ProbeError};
pub use inference::{InferenceResult, RequestRunner};
pub use launcher::DockerRuntime;
pub use process::{OutputTail, ProcessKind, ServerProcess};
pub use readiness::ReadinessPoller;
pub use runtime::ContainerRuntime;
