//! Persisted records and the JSON views handed back by the API.

use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };
use sqlx::FromRow;

pub const USER_ROLE: &str = "user";
pub const ASSISTANT_ROLE: &str = "assistant";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    pub id: i64,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub content: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /conversations/`. Unknown fields such as a client-supplied
/// `id` are ignored; the store assigns identifiers.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewConversation {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /messages/`.
#[derive(Clone, Debug, Deserialize)]
pub struct NewMessage {
    pub conversation_id: i64,
    pub content: String,
    pub role: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewMessage {
    pub fn new(conversation_id: i64, role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            conversation_id,
            content: content.into(),
            role: role.into(),
            created_at: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: i64,
    pub conversation_id: i64,
    pub content: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            content: m.content,
            role: m.role,
            created_at: m.created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub id: i64,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<MessageResponse>,
}

impl ConversationResponse {
    pub fn new(conversation: Conversation, messages: Vec<Message>) -> Self {
        Self {
            id: conversation.id,
            title: conversation.title,
            created_at: conversation.created_at,
            messages: messages.into_iter().map(MessageResponse::from).collect(),
        }
    }
}

/// Result of `POST /messages/`: the user turn paired with the stored reply, or
/// the single non-user message that was stored as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreatedMessages {
    Exchange {
        user: MessageResponse,
        assistant: MessageResponse,
    },
    Single {
        message: MessageResponse,
    },
}
