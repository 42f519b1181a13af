use async_trait::async_trait;
use log::{ debug, warn };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE } };
use serde::{ Deserialize, Serialize };
use std::time::Duration;

use super::{ ChatClient, Completion };
use crate::error::ChatError;
use crate::llm::{ GenerationConfig, LlmConfig };
use crate::models::chat::{ Role, TokenInfo, Turn };

const API_KEY_HEADER: &str = "x-goog-api-key";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize, Debug)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize, Debug)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<TokenInfo>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize, Debug)]
struct GeminiErrorResponse {
    error: GeminiErrorBody,
}

#[derive(Deserialize, Debug)]
struct GeminiErrorBody {
    message: String,
}

fn gemini_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

fn build_request(turns: &[Turn], generation: &GenerationConfig) -> GeminiRequest {
    GeminiRequest {
        contents: turns
            .iter()
            .map(|turn| GeminiContent {
                role: gemini_role(turn.role).to_string(),
                parts: vec![GeminiPart { text: turn.text.clone() }],
            })
            .collect(),
        generation_config: GeminiGenerationConfig {
            max_output_tokens: generation.max_output_tokens,
            temperature: generation.temperature,
        },
    }
}

impl GeminiResponse {
    /// Joins the text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }
}

fn upstream_error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<GeminiErrorResponse>(body) {
        Ok(parsed) => format!("Gemini API error {}: {}", status, parsed.error.message),
        Err(_) if body.trim().is_empty() => format!("Gemini API error {}", status),
        Err(_) => format!("Gemini API error {}: {}", status, body.trim()),
    }
}

pub struct GeminiChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
}

impl GeminiChatClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String
    ) -> Result<Self, ChatError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut key_value = HeaderValue::from_str(&api_key).map_err(|e|
            ChatError::configuration(format!("Invalid API key format: {}", e))
        )?;
        key_value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key_value);

        let http = HttpClient::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ChatError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ChatError> {
        Self::new(config.api_key.clone(), config.model.clone(), config.base_url.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    async fn generate(
        &self,
        turns: &[Turn],
        generation: &GenerationConfig
    ) -> Result<Completion, ChatError> {
        let payload = build_request(turns, generation);
        debug!(
            "GeminiChatClient::generate() → model={} turns={}",
            self.model,
            payload.contents.len()
        );

        let response = self.http
            .post(self.endpoint())
            .json(&payload)
            .send().await
            .map_err(|e| ChatError::upstream(format!("Request to Gemini failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text().await
            .map_err(|e| ChatError::upstream(format!("Failed to read Gemini response: {}", e)))?;

        if !status.is_success() {
            let message = upstream_error_message(status, &body);
            warn!("{}", message);
            return Err(ChatError::upstream(message));
        }

        let parsed: GeminiResponse = serde_json
            ::from_str(&body)
            .map_err(|e| ChatError::upstream(format!("Failed to parse Gemini response: {}", e)))?;

        Ok(Completion {
            text: parsed.text(),
            usage: parsed.usage_metadata,
        })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}
