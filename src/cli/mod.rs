use clap::Parser;

use crate::llm::{ DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// API key for the Gemini generative-language API. Required.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model used for chat replies.
    #[arg(long, env = "CHAT_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    pub chat_model: String,

    /// Base URL of the Gemini API, without the model path.
    #[arg(long, env = "CHAT_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    pub chat_base_url: String,

    /// Upper bound in seconds for a single call to the provider.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value = "60")]
    pub upstream_timeout_secs: u64,

    // --- Conversation Context Args ---
    /// Optional JSON file with `system_prompt` and `biography` overriding the built-in context.
    #[arg(long, env = "CONTEXT_PATH")]
    pub context_path: Option<String>,

    // --- Server Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:3000")]
    pub server_addr: String,

    /// Port to listen on across all interfaces. Takes precedence over SERVER_ADDR.
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Comma separated list of allowed CORS origins, or `*` for any origin.
    #[arg(long, env = "CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,
}
