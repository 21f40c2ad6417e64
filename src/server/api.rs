use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{ FromRequestParts, Path, Query, State },
    http::request::Parts,
    routing::{ get, post },
    Json,
    Router,
};
use log::{ error, info, warn };
use serde::Deserialize;
use serde_json::{ json, Value };
use tower_http::cors::{ Any, CorsLayer };
use tower_http::services::ServeDir;

use super::error::ApiError;
use crate::db::{ Database, Session };
use crate::llm::chat::{ generate_llm_response, ChatClient };
use crate::models::chat::{ ChatMessage, ChatRole };
use crate::models::conversation::{
    Conversation,
    ConversationResponse,
    CreatedMessages,
    NewConversation,
    NewMessage,
    ASSISTANT_ROLE,
    USER_ROLE,
};

const DEFAULT_PAGE_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub chat_client: Arc<dyn ChatClient>,
}

impl AppState {
    pub fn new(db: Database, chat_client: Arc<dyn ChatClient>) -> Self {
        Self { db, chat_client }
    }
}

/// Every handler taking a `Session` gets its own pooled connection, released
/// when the handler returns.
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState
    ) -> Result<Self, Self::Rejection> {
        Ok(state.db.get_session().await?)
    }
}

#[derive(Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let mut app = Router::new()
        .route("/conversations/", post(create_conversation).get(list_conversations))
        .route("/conversations", post(create_conversation).get(list_conversations))
        .route("/conversations/{conversation_id}", get(read_conversation).delete(delete_conversation))
        .route("/messages/", post(create_message))
        .route("/messages", post(create_message));

    if let Some(dir) = static_dir {
        info!("Serving static assets from {} under /app", dir.display());
        app = app.nest_service("/app", ServeDir::new(dir).append_index_html_on_directories(true));
    }

    app.layer(cors).with_state(state)
}

async fn create_conversation(
    mut session: Session,
    Json(body): Json<NewConversation>
) -> Result<Json<Conversation>, ApiError> {
    let conversation = session.insert_conversation(body).await?;
    info!("Created conversation {}", conversation.id);
    Ok(Json(conversation))
}

async fn list_conversations(
    mut session: Session,
    Query(page): Query<Pagination>
) -> Result<Json<Vec<ConversationResponse>>, ApiError> {
    let conversations = session.list_conversations(page.offset, page.limit).await?;

    let mut out = Vec::with_capacity(conversations.len());
    for conversation in conversations {
        let messages = session.list_messages(conversation.id).await?;
        out.push(ConversationResponse::new(conversation, messages));
    }
    Ok(Json(out))
}

async fn read_conversation(
    mut session: Session,
    Path(conversation_id): Path<i64>
) -> Result<Json<ConversationResponse>, ApiError> {
    let (conversation, messages) = session
        .get_conversation_with_messages(conversation_id).await
        .inspect_err(|e| warn!("Read of conversation {} failed: {}", conversation_id, e))?;
    Ok(Json(ConversationResponse::new(conversation, messages)))
}

async fn delete_conversation(
    mut session: Session,
    Path(conversation_id): Path<i64>
) -> Result<Json<Value>, ApiError> {
    session
        .delete_conversation(conversation_id).await
        .inspect_err(|e| warn!("Delete of conversation {} failed: {}", conversation_id, e))?;
    info!("Deleted conversation {}", conversation_id);
    Ok(Json(json!({ "ok": true })))
}

/// Stores the incoming message. A `user` message is followed by a relay call
/// with the whole conversation and the reply is stored as an `assistant`
/// message. The user message stays stored if the relay fails.
///
/// The pooled connection is released for the duration of the relay call,
/// which has no timeout, so a slow completion never holds a connection.
async fn create_message(
    State(state): State<AppState>,
    mut session: Session,
    Json(body): Json<NewMessage>
) -> Result<Json<CreatedMessages>, ApiError> {
    let conversation_id = body.conversation_id;
    if session.get_conversation(conversation_id).await?.is_none() {
        warn!("Message posted to missing conversation {}", conversation_id);
        return Err(ApiError::NotFound("Conversation"));
    }

    let message = session.insert_message(body).await?;
    info!("Stored {} message {} in conversation {}", message.role, message.id, conversation_id);

    if message.role != USER_ROLE {
        return Ok(Json(CreatedMessages::Single { message: message.into() }));
    }

    let history: Vec<ChatMessage> = session
        .list_messages(conversation_id).await?
        .into_iter()
        .map(|m| ChatMessage::new(ChatRole::normalize(&m.role), m.content))
        .collect();
    drop(session);

    let reply = generate_llm_response(state.chat_client.as_ref(), &history, None).await.map_err(
        |e| {
            error!("Relay for conversation {} failed: {}", conversation_id, e);
            ApiError::Llm(e)
        }
    )?;

    let mut session = state.db.get_session().await?;
    let assistant = session
        .insert_message(NewMessage::new(conversation_id, ASSISTANT_ROLE, reply)).await?;
    info!("Stored assistant reply {} in conversation {}", assistant.id, conversation_id);

    Ok(
        Json(CreatedMessages::Exchange {
            user: message.into(),
            assistant: assistant.into(),
        })
    )
}
