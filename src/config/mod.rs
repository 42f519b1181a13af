pub mod context;

use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

use crate::cli::Args;
use crate::error::ChatError;
use crate::llm::LlmConfig;
use self::context::{ load_context, ConversationContext };

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<HeaderValue>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_path: String,
    pub key_path: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub cors: CorsOrigins,
    pub tls: Option<TlsConfig>,
}

/// Everything the service needs, validated once before the listener is bound.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub context: ConversationContext,
    pub upstream_timeout: Duration,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Result<Self, ChatError> {
        let api_key = args.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ChatError::configuration("GEMINI_API_KEY is not configured"))?
            .to_string();

        let base_url = Url::parse(&args.chat_base_url).map_err(|e| {
            ChatError::configuration(format!("Invalid CHAT_BASE_URL '{}': {}", args.chat_base_url, e))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(
                ChatError::configuration(
                    format!("CHAT_BASE_URL must use http or https, got '{}'", base_url.scheme())
                )
            );
        }

        if args.chat_model.trim().is_empty() {
            return Err(ChatError::configuration("CHAT_MODEL must not be empty"));
        }

        if args.upstream_timeout_secs == 0 {
            return Err(ChatError::configuration("UPSTREAM_TIMEOUT_SECS must be greater than 0"));
        }

        let context = match &args.context_path {
            Some(path) =>
                load_context(path).map_err(|e| {
                    ChatError::configuration(format!("Failed to load context '{}': {}", path, e))
                })?,
            None => ConversationContext::default(),
        };

        Ok(Self {
            llm: LlmConfig {
                api_key,
                model: args.chat_model.trim().to_string(),
                base_url: args.chat_base_url.trim_end_matches('/').to_string(),
            },
            context,
            upstream_timeout: Duration::from_secs(args.upstream_timeout_secs),
            server: ServerConfig {
                addr: parse_listen_addr(args)?,
                cors: parse_cors_origins(&args.cors_origins)?,
                tls: parse_tls(args)?,
            },
        })
    }
}

fn parse_listen_addr(args: &Args) -> Result<SocketAddr, ChatError> {
    if let Some(port) = args.port {
        return Ok(SocketAddr::from(([0, 0, 0, 0], port)));
    }
    args.server_addr
        .parse::<SocketAddr>()
        .map_err(|e| {
            ChatError::configuration(format!("Invalid SERVER_ADDR '{}': {}", args.server_addr, e))
        })
}

pub fn parse_cors_origins(raw: &str) -> Result<CorsOrigins, ChatError> {
    let origins: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .collect();

    if origins.is_empty() || origins.contains(&"*") {
        return Ok(CorsOrigins::Any);
    }

    origins
        .into_iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| {
                ChatError::configuration(format!("Invalid CORS origin '{}': {}", origin, e))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(CorsOrigins::List)
}

fn parse_tls(args: &Args) -> Result<Option<TlsConfig>, ChatError> {
    if !args.enable_tls {
        return Ok(None);
    }
    match (&args.tls_cert_path, &args.tls_key_path) {
        (Some(cert_path), Some(key_path)) =>
            Ok(
                Some(TlsConfig {
                    cert_path: cert_path.clone(),
                    key_path: key_path.clone(),
                })
            ),
        _ =>
            Err(
                ChatError::configuration(
                    "Both --tls-cert-path and --tls-key-path must be provided to enable TLS"
                )
            ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn base_args() -> Args {
        let mut args = Args::parse_from(["portfolio-bot"]);
        args.gemini_api_key = Some("test-key".to_string());
        args.chat_model = "gemini-2.5-flash".to_string();
        args.chat_base_url = "https://generativelanguage.googleapis.com/v1beta/".to_string();
        args.server_addr = "127.0.0.1:3000".to_string();
        args.port = None;
        args.cors_origins = "*".to_string();
        args.upstream_timeout_secs = 60;
        args.context_path = None;
        args.enable_tls = false;
        args.tls_cert_path = None;
        args.tls_key_path = None;
        args
    }

    fn config_error(args: &Args) -> String {
        match AppConfig::from_args(args) {
            Err(ChatError::Configuration(msg)) => msg,
            other => panic!("expected Configuration error, got {:?}", other),
        }
    }

    #[test]
    fn builds_config_from_defaults() {
        let config = AppConfig::from_args(&base_args()).unwrap();
        assert_eq!(config.llm.api_key, "test-key");
        assert_eq!(config.llm.base_url, "https://generativelanguage.googleapis.com/v1beta");
        assert_eq!(config.upstream_timeout, Duration::from_secs(60));
        assert_eq!(config.server.addr, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.server.cors, CorsOrigins::Any);
        assert!(config.server.tls.is_none());
        assert_eq!(config.context, ConversationContext::default());
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let mut args = base_args();
        args.gemini_api_key = None;
        assert_eq!(config_error(&args), "GEMINI_API_KEY is not configured");

        args.gemini_api_key = Some("   ".to_string());
        assert_eq!(config_error(&args), "GEMINI_API_KEY is not configured");
    }

    #[test]
    fn rejects_bad_base_url_and_timeout() {
        let mut args = base_args();
        args.chat_base_url = "not a url".to_string();
        assert!(config_error(&args).starts_with("Invalid CHAT_BASE_URL"));

        let mut args = base_args();
        args.chat_base_url = "ftp://example.com".to_string();
        assert!(config_error(&args).contains("http or https"));

        let mut args = base_args();
        args.upstream_timeout_secs = 0;
        assert_eq!(config_error(&args), "UPSTREAM_TIMEOUT_SECS must be greater than 0");
    }

    #[test]
    fn port_overrides_server_addr() {
        let mut args = base_args();
        args.port = Some(8080);
        let config = AppConfig::from_args(&args).unwrap();
        assert_eq!(config.server.addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn tls_requires_both_paths() {
        let mut args = base_args();
        args.enable_tls = true;
        args.tls_cert_path = Some("cert.pem".to_string());
        assert!(config_error(&args).contains("--tls-key-path"));

        args.tls_key_path = Some("key.pem".to_string());
        let config = AppConfig::from_args(&args).unwrap();
        assert_eq!(
            config.server.tls,
            Some(TlsConfig { cert_path: "cert.pem".to_string(), key_path: "key.pem".to_string() })
        );
    }

    #[test]
    fn parses_cors_origin_lists() {
        assert_eq!(parse_cors_origins("*").unwrap(), CorsOrigins::Any);
        assert_eq!(parse_cors_origins("").unwrap(), CorsOrigins::Any);
        assert_eq!(
            parse_cors_origins("https://a.github.io, https://b.dev").unwrap(),
            CorsOrigins::List(
                vec![
                    HeaderValue::from_static("https://a.github.io"),
                    HeaderValue::from_static("https://b.dev")
                ]
            )
        );
        assert!(parse_cors_origins("https://ok.dev,bad\norigin").is_err());
    }

    #[test]
    fn missing_context_file_is_fatal() {
        let mut args = base_args();
        args.context_path = Some("/definitely/not/here.json".to_string());
        assert!(config_error(&args).starts_with("Failed to load context"));
    }
}
