use serde::{ Deserialize, Serialize };
use serde_json::Value as JsonValue;

use crate::error::ChatError;

pub const MESSAGES_REQUIRED: &str = "Invalid request: messages array required";
pub const LAST_MESSAGE_NOT_USER: &str = "Last message must be from user";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }

    pub fn is_user(&self) -> bool {
        self.role == "user"
    }
}

/// A validated conversation: non-empty and ending with a user message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn from_value(body: &JsonValue) -> Result<Self, ChatError> {
        let raw = match body.get("messages").and_then(JsonValue::as_array) {
            Some(items) if !items.is_empty() => items,
            _ => {
                return Err(ChatError::invalid_request(MESSAGES_REQUIRED));
            }
        };

        let messages = raw
            .iter()
            .enumerate()
            .map(|(index, item)| {
                ChatMessage::deserialize(item).map_err(|_| {
                    ChatError::invalid_request(
                        format!("Invalid request: message {} is malformed", index)
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        match messages.last() {
            Some(last) if last.is_user() => Ok(Self { messages }),
            _ => Err(ChatError::invalid_request(LAST_MESSAGE_NOT_USER)),
        }
    }

    pub fn last_user_message(&self) -> &ChatMessage {
        // from_value guarantees a trailing user message
        &self.messages[self.messages.len() - 1]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Anything that is not exactly "user" is forwarded as the assistant side.
    pub fn from_wire(role: &str) -> Self {
        if role == "user" { Role::User } else { Role::Assistant }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, text: text.into() }
    }
}

impl From<&ChatMessage> for Turn {
    fn from(message: &ChatMessage) -> Self {
        Self { role: Role::from_wire(&message.role), text: message.content.clone() }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
    #[serde(default)]
    pub total_token_count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_info: Option<TokenInfo>,
}
