//! Server configuration.
//!
//! Everything is explicit: components receive config structs at construction
//! instead of reading the process environment themselves. `clap`'s `env`
//! attributes (plus `dotenvy` in `main`) keep the familiar `.env` workflow.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::llm::LlmConfig;

/// Command-line / environment configuration for the EMS portal server.
#[derive(Debug, Clone, Parser)]
#[command(name = "ems-portal", about = "EMS reference-data query assistant API")]
pub struct ServerConfig {
    /// Path to the SQLite reference database.
    #[arg(long, env = "EMS_PORTAL_DB", default_value = "ems-portal.db")]
    pub database: PathBuf,

    /// Address to bind the HTTP API on.
    #[arg(long, env = "EMS_PORTAL_BIND", default_value = "127.0.0.1:3001")]
    pub bind: SocketAddr,

    /// API key for the LLM provider. Empty means unconfigured; the health
    /// endpoint reports this without ever echoing the value.
    #[arg(long, env = "OPENAI_API_KEY", default_value = "", hide_env_values = true)]
    pub openai_api_key: String,

    /// Base URL of an OpenAI-compatible chat completions endpoint.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com")]
    pub openai_base_url: String,

    /// Model identifier to request from the provider.
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o-mini")]
    pub openai_model: String,

    /// Per-request timeout for LLM calls, in seconds.
    #[arg(long, env = "EMS_PORTAL_LLM_TIMEOUT", default_value_t = 60)]
    pub llm_timeout_secs: u64,

    /// Marker separating the bucket host from the object key inside a
    /// document reference URL.
    #[arg(long, env = "EMS_PORTAL_STORAGE_MARKER", default_value = ".amazonaws.com/")]
    pub storage_key_marker: String,

    /// Per-request timeout for document fetches, in seconds.
    #[arg(long, env = "EMS_PORTAL_FETCH_TIMEOUT", default_value_t = 30)]
    pub fetch_timeout_secs: u64,
}

impl ServerConfig {
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            api_key: self.openai_api_key.clone(),
            base_url: self.openai_base_url.clone(),
            model: self.openai_model.clone(),
            timeout_secs: self.llm_timeout_secs,
        }
    }
}

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> &'static str {
    "ems_portal=info,tower_http=info"
}
