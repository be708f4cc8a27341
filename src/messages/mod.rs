pub mod log;
pub mod registry;

use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    auth::CurrentUser,
    users::{store, UserBrief},
    AppResult, AppState,
};

pub use log::Message;
pub use registry::Conversation;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations",
            get(list_conversations).post(open_conversation),
        )
        .route("/conversations/{id}", get(list_messages))
        .route("/", post(send_message))
        .route("/{id}/read", put(mark_read))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConversationView {
    id: Uuid,
    participants: Vec<UserBrief>,
    last_message: String,
    last_message_at: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageView {
    id: Uuid,
    conversation_id: Uuid,
    sender: UserBrief,
    content: String,
    created_at: i64,
    read: bool,
}

async fn conversation_view(
    pool: &SqlitePool,
    conversation: Conversation,
) -> AppResult<ConversationView> {
    let mut participants = Vec::with_capacity(2);
    for id in conversation.participants {
        participants.push(store::brief(pool, id).await?);
    }

    Ok(ConversationView {
        id: conversation.id,
        participants,
        last_message: conversation.last_message,
        last_message_at: conversation.last_message_at,
    })
}

async fn message_view(pool: &SqlitePool, message: Message) -> AppResult<MessageView> {
    Ok(MessageView {
        id: message.id,
        conversation_id: message.conversation_id,
        sender: store::brief(pool, message.sender_id).await?,
        content: message.content,
        created_at: message.created_at,
        read: message.read,
    })
}

#[debug_handler(state = AppState)]
async fn list_conversations(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<ConversationView>>> {
    let conversations = registry::list_for_user(&db_pool, user.id).await?;

    let mut views = Vec::with_capacity(conversations.len());
    for conversation in conversations {
        views.push(conversation_view(&db_pool, conversation).await?);
    }

    Ok(Json(views))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenConversation {
    participant_id: Uuid,
}

#[debug_handler(state = AppState)]
async fn open_conversation(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Json(OpenConversation { participant_id }): Json<OpenConversation>,
) -> AppResult<Json<ConversationView>> {
    let conversation = registry::get_or_create(&db_pool, user.id, participant_id).await?;
    Ok(Json(conversation_view(&db_pool, conversation).await?))
}

#[debug_handler(state = AppState)]
async fn list_messages(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<Vec<MessageView>>> {
    let messages = log::list_for(&db_pool, conversation_id, user.id).await?;

    let mut views = Vec::with_capacity(messages.len());
    for message in messages {
        views.push(message_view(&db_pool, message).await?);
    }

    Ok(Json(views))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessage {
    conversation_id: Uuid,
    content: String,
}

#[debug_handler(state = AppState)]
async fn send_message(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Json(SendMessage {
        conversation_id,
        content,
    }): Json<SendMessage>,
) -> AppResult<(StatusCode, Json<MessageView>)> {
    let message = log::append(&db_pool, conversation_id, user.id, &content).await?;
    Ok((
        StatusCode::CREATED,
        Json(message_view(&db_pool, message).await?),
    ))
}

#[debug_handler(state = AppState)]
async fn mark_read(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<Uuid>,
) -> AppResult<Json<MessageView>> {
    let message = log::mark_read(&db_pool, message_id, user.id).await?;
    Ok(Json(message_view(&db_pool, message).await?))
}
