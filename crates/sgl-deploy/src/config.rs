use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL_ID: &str = "deepseek-ai/DeepSeek-R1-Distill-Qwen-1.5B";
pub const DEFAULT_PORT: u16 = 30000;
pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_MAX_TOKENS: u32 = 64;
pub const DEFAULT_TP_DEGREE: u32 = 1;
pub const DEFAULT_IMAGE: &str = "lmsysorg/sglang:latest";
pub const DEFAULT_CONTAINER_NAME: &str = "sglang_deepseek_container";
pub const DEFAULT_READY_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_API_KEY: &str = "EMPTY";

/// Everything a run needs, resolved once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub model_id: String,
    pub port: u16,
    pub temperature: f64,
    pub max_tokens: u32,
    pub tp_degree: u32,

    pub image: String,
    pub container_name: String,
    /// Host directory bind-mounted as the container's Hugging Face cache.
    pub hf_cache_dir: PathBuf,
    pub docker_bin: String,
    /// Appended verbatim after the fixed `sglang.launch_server` arguments.
    pub extra_server_args: Vec<String>,
    /// Remove a leftover container with the same name before `docker run`.
    pub replace_existing: bool,

    pub ready_timeout: Duration,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub api_key: String,

    /// Fail the run when the server never becomes ready.
    pub strict_readiness: bool,
    /// Stop the container when the run ends. Off by default: the server is
    /// left running and the caller owns its shutdown.
    pub teardown_on_exit: bool,
}

/// `$HOME/.cache/huggingface`, or `None` when `HOME` is unset.
pub fn default_hf_cache_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(|home| PathBuf::from(home).join(".cache").join("huggingface"))
}
