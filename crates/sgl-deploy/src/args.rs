use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use sgl_deploy::config::*;

#[derive(Debug, Parser)]
#[command(name = "sgl-deploy")]
#[command(about = "Launch an SGLang server in docker, wait for it and run a sample request", long_about = None)]
pub struct Args {
    /// Model to serve (Hugging Face id or path inside the container)
    #[arg(long, env = "MODEL_ID", default_value = DEFAULT_MODEL_ID)]
    pub model_id: String,

    #[arg(long, env = "SERVER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, env = "TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f64,

    #[arg(long, env = "MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Tensor parallel degree passed to sglang as --tp
    #[arg(long, env = "TP_DEGREE", default_value_t = DEFAULT_TP_DEGREE)]
    pub tp_degree: u32,

    #[arg(long, env = "SGLANG_IMAGE", default_value = DEFAULT_IMAGE)]
    pub image: String,

    #[arg(long, env = "CONTAINER_NAME", default_value = DEFAULT_CONTAINER_NAME)]
    pub container_name: String,

    /// Host Hugging Face cache to mount. Default: $HOME/.cache/huggingface
    #[arg(long, env = "HF_CACHE_DIR")]
    pub hf_cache_dir: Option<PathBuf>,

    #[arg(long, env = "DOCKER_BIN", default_value = "docker")]
    pub docker_bin: String,

    /// Extra argument for sglang.launch_server (repeatable, or comma separated)
    #[arg(
        long = "server-arg",
        env = "SGLANG_EXTRA_ARGS",
        value_delimiter = ',',
        allow_hyphen_values = true
    )]
    pub server_args: Vec<String>,

    /// Remove an existing container with the same name before launching.
    #[arg(long, env = "REPLACE_EXISTING", default_value_t = true, action = clap::ArgAction::Set)]
    pub replace_existing: bool,

    #[arg(long, env = "READY_TIMEOUT_SECS", default_value_t = DEFAULT_READY_TIMEOUT_SECS)]
    pub ready_timeout_secs: u64,

    #[arg(
        long,
        env = "POLL_INTERVAL_SECS",
        default_value_t = DEFAULT_POLL_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_secs: u64,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Bearer token for the completion request
    #[arg(long, env = "API_KEY", default_value = DEFAULT_API_KEY)]
    pub api_key: String,

    /// Exit with an error when the server never becomes ready.
    #[arg(long = "strict", env = "STRICT_READINESS")]
    pub strict_readiness: bool,

    /// Stop the container when the run ends instead of leaving it running.
    #[arg(long = "teardown", env = "TEARDOWN_ON_EXIT")]
    pub teardown_on_exit: bool,

    /// OTLP/HTTP base URL for span export. Disabled if not set.
    #[arg(long, env = "OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    #[arg(long, env = "OTLP_TOKEN")]
    pub otlp_token: Option<String>,
}

impl Args {
    pub fn into_config(self) -> anyhow::Result<DeployConfig> {
        let hf_cache_dir = match self.hf_cache_dir {
            Some(dir) => dir,
            None => default_hf_cache_dir()
                .ok_or_else(|| anyhow::anyhow!("HOME is not set; pass --hf-cache-dir"))?,
        };

        Ok(DeployConfig {
            model_id: self.model_id,
            port: self.port,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tp_degree: self.tp_degree,
            image: self.image,
            container_name: self.container_name,
            hf_cache_dir,
            docker_bin: self.docker_bin,
            extra_server_args: self.server_args,
            replace_existing: self.replace_existing,
            ready_timeout: Duration::from_secs(self.ready_timeout_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            api_key: self.api_key,
            strict_readiness: self.strict_readiness,
            teardown_on_exit: self.teardown_on_exit,
        })
    }
}
