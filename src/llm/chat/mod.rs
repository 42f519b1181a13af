pub mod gemini;

use async_trait::async_trait;
use std::sync::Arc;

use super::{ GenerationConfig, LlmConfig };
use self::gemini::GeminiChatClient;
use crate::error::ChatError;
use crate::models::chat::{ TokenInfo, Turn };

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Generated text, `None` when the provider returned nothing usable.
    pub text: Option<String>,
    pub usage: Option<TokenInfo>,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Submits the whole ordered conversation in one call.
    async fn generate(
        &self,
        turns: &[Turn],
        generation: &GenerationConfig
    ) -> Result<Completion, ChatError>;

    fn get_model(&self) -> String;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, ChatError> {
    let client = GeminiChatClient::from_config(config)?;
    Ok(Arc::new(client))
}
