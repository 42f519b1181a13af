use log::{ error, info, warn };
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::context::ConversationContext;
use crate::error::ChatError;
use crate::llm::GenerationConfig;
use crate::llm::chat::ChatClient;
use crate::models::chat::{ ChatMessage, ChatReply, ChatRequest, Turn };

pub const FALLBACK_REPLY: &str = "No response generated";

/// Stateless chat handler. One instance is shared by every request.
#[derive(Clone)]
pub struct PortfolioAgent {
    chat_client: Arc<dyn ChatClient>,
    context: Arc<ConversationContext>,
    generation: GenerationConfig,
    upstream_timeout: Duration,
}

impl PortfolioAgent {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        context: ConversationContext,
        upstream_timeout: Duration
    ) -> Self {
        Self {
            chat_client,
            context: Arc::new(context),
            generation: GenerationConfig::default(),
            upstream_timeout,
        }
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn model(&self) -> String {
        self.chat_client.get_model()
    }

    /// Preamble followed by the caller's messages, roles normalized.
    pub fn build_turns(&self, messages: &[ChatMessage]) -> Vec<Turn> {
        let mut turns = self.context.preamble();
        turns.extend(messages.iter().map(Turn::from));
        turns
    }

    pub async fn handle_chat(&self, body: &JsonValue) -> Result<ChatReply, ChatError> {
        let request_id = Uuid::new_v4();

        let request = ChatRequest::from_value(body).map_err(|e| {
            warn!("[{}] rejected chat request: {}", request_id, e);
            e
        })?;
        info!(
            "[{}] chat request with {} messages, last {} chars",
            request_id,
            request.messages.len(),
            request.last_user_message().content.len()
        );

        let turns = self.build_turns(&request.messages);
        let completion = match
            tokio::time::timeout(
                self.upstream_timeout,
                self.chat_client.generate(&turns, &self.generation)
            ).await
        {
            Ok(Ok(completion)) => completion,
            Ok(Err(e)) => {
                error!("[{}] provider call failed: {}", request_id, e);
                return Err(e);
            }
            Err(_) => {
                let e = ChatError::upstream(
                    format!("Provider did not respond within {}s", self.upstream_timeout.as_secs_f32())
                );
                error!("[{}] {}", request_id, e);
                return Err(e);
            }
        };

        if let Some(usage) = &completion.usage {
            info!(
                "[{}] token usage: prompt={} candidates={} total={}",
                request_id,
                usage.prompt_token_count,
                usage.candidates_token_count,
                usage.total_token_count
            );
        }

        let reply = completion.text.unwrap_or_else(|| {
            warn!("[{}] provider returned no text, using fallback reply", request_id);
            FALLBACK_REPLY.to_string()
        });

        Ok(ChatReply { reply, token_info: completion.usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::Completion;
    use crate::models::chat::{ Role, TokenInfo };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    enum Behaviour {
        Reply(Completion),
        Fail(&'static str),
        Hang,
    }

    struct RecordingClient {
        behaviour: Behaviour,
        seen: Mutex<Vec<Vec<Turn>>>,
    }

    impl RecordingClient {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self { behaviour, seen: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl ChatClient for RecordingClient {
        async fn generate(
            &self,
            turns: &[Turn],
            generation: &GenerationConfig
        ) -> Result<Completion, ChatError> {
            assert_eq!(*generation, GenerationConfig::default());
            self.seen.lock().unwrap().push(turns.to_vec());
            match &self.behaviour {
                Behaviour::Reply(c) => Ok(c.clone()),
                Behaviour::Fail(msg) => Err(ChatError::upstream(*msg)),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(Completion::default())
                }
            }
        }

        fn get_model(&self) -> String {
            "test-model".to_string()
        }
    }

    fn agent(client: Arc<RecordingClient>, timeout: Duration) -> PortfolioAgent {
        PortfolioAgent::new(client, ConversationContext::new("SYSTEM", "BIO"), timeout)
    }

    fn text_reply(text: &str) -> Behaviour {
        Behaviour::Reply(Completion { text: Some(text.to_string()), usage: None })
    }

    #[tokio::test]
    async fn forwards_preamble_then_messages_in_order() {
        let client = RecordingClient::new(text_reply("Unity and React."));
        let agent = agent(client.clone(), Duration::from_secs(5));

        let body = json!({
            "messages": [
                { "role": "user", "content": "hi" },
                { "role": "assistant", "content": "hello!" },
                { "role": "system", "content": "odd role" },
                { "role": "user", "content": "What skills do you have?" }
            ]
        });
        let reply = agent.handle_chat(&body).await.unwrap();
        assert_eq!(reply.reply, "Unity and React.");
        assert_eq!(reply.token_info, None);

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let turns = &seen[0];
        assert_eq!(turns.len(), 8);
        assert_eq!(turns[..4], agent.context().preamble()[..]);
        assert_eq!(turns[4], Turn::user("hi"));
        assert_eq!(turns[5], Turn::assistant("hello!"));
        assert_eq!(turns[6], Turn { role: Role::Assistant, text: "odd role".to_string() });
        assert_eq!(turns[7], Turn::user("What skills do you have?"));
    }

    #[tokio::test]
    async fn invalid_requests_never_reach_the_provider() {
        let client = RecordingClient::new(text_reply("unused"));
        let agent = agent(client.clone(), Duration::from_secs(5));

        let err = agent.handle_chat(&json!({ "messages": [] })).await.unwrap_err();
        assert_eq!(err, ChatError::invalid_request("Invalid request: messages array required"));

        let err = agent
            .handle_chat(
                &json!({
                "messages": [
                    { "role": "user", "content": "hi" },
                    { "role": "assistant", "content": "hi back" }
                ]
            })
            ).await
            .unwrap_err();
        assert_eq!(err, ChatError::invalid_request("Last message must be from user"));

        assert!(client.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_provider_text_uses_fallback() {
        let usage = TokenInfo { prompt_token_count: 3, candidates_token_count: 0, total_token_count: 3 };
        let client = RecordingClient::new(
            Behaviour::Reply(Completion { text: None, usage: Some(usage) })
        );
        let agent = agent(client, Duration::from_secs(5));

        let reply = agent
            .handle_chat(&json!({ "messages": [{ "role": "user", "content": "hi" }] })).await
            .unwrap();
        assert_eq!(reply.reply, FALLBACK_REPLY);
        assert_eq!(reply.token_info, Some(usage));
    }

    #[tokio::test]
    async fn provider_failure_is_upstream_error() {
        let client = RecordingClient::new(Behaviour::Fail("quota exceeded"));
        let agent = agent(client, Duration::from_secs(5));

        let err = agent
            .handle_chat(&json!({ "messages": [{ "role": "user", "content": "hi" }] })).await
            .unwrap_err();
        assert_eq!(err, ChatError::upstream("quota exceeded"));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let client = RecordingClient::new(Behaviour::Hang);
        let agent = agent(client, Duration::from_millis(50));

        let err = agent
            .handle_chat(&json!({ "messages": [{ "role": "user", "content": "hi" }] })).await
            .unwrap_err();
        assert!(matches!(err, ChatError::Upstream(msg) if msg.contains("did not respond")));
    }
}
