use axum::{body::Bytes, extract::State, routing::get, Json, Router};
use roadsheet_core::Audience;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::ResourceId;
use crate::auth::{MaybeSession, Session};
use crate::db::models::{Message, MessageView, NewMessage};
use crate::error::AppError;
use crate::AppState;

const UNREAD_LIMIT: i64 = 10;

/// Request to publish an announcement
#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default)]
    pub ids: Vec<Uuid>,
}

/// Visible messages with the caller's read state
async fn list_messages(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Json<Vec<MessageView>>, AppError> {
    let Some(session) = session else {
        return Ok(Json(Vec::new()));
    };
    let messages = state
        .store
        .list_messages(session.user_id, session.role)
        .await?;
    Ok(Json(messages))
}

/// Publish an announcement; the role is checked before the body is read
async fn create_message(
    State(state): State<AppState>,
    session: Session,
    body: Bytes,
) -> Result<Json<Message>, AppError> {
    if !session.actor().can_publish_messages() {
        return Err(AppError::unauthorized());
    }
    let req: CreateMessageRequest = serde_json::from_slice(&body)?;

    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    let audience = match req.audience.as_deref().map(str::trim) {
        None | Some("") => Audience::All,
        Some(tag) => tag
            .to_uppercase()
            .parse()
            .map_err(|e| AppError::BadRequest(format!("{}", e)))?,
    };

    let message = state
        .store
        .create_message(NewMessage {
            title,
            body: req.body,
            audience,
            published: req.published.unwrap_or(true),
        })
        .await?;
    tracing::info!("Message {} published to {}", message.id, message.audience);

    Ok(Json(message))
}

/// Newest unread messages
async fn unread_messages(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Json<Vec<Message>>, AppError> {
    let Some(session) = session else {
        return Ok(Json(Vec::new()));
    };
    let messages = state
        .store
        .unread_messages(session.user_id, session.role, UNREAD_LIMIT)
        .await?;
    Ok(Json(messages))
}

/// Mark messages read
async fn mark_read(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<MarkReadRequest>,
) -> Result<Json<Value>, AppError> {
    state.store.mark_read(session.user_id, &req.ids).await?;
    Ok(Json(json!({ "ok": true })))
}

/// Get a message by ID and mark it read
async fn get_message(
    State(state): State<AppState>,
    session: Session,
    ResourceId(id): ResourceId,
) -> Result<Json<Message>, AppError> {
    let message = state
        .store
        .get_message(id)
        .await?
        .filter(|message| message.published && message.audience.is_visible_to(session.role))
        .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;

    state.store.mark_read(session.user_id, &[id]).await?;
    Ok(Json(message))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/messages", get(list_messages).post(create_message))
        .route("/api/messages/unread", get(unread_messages).post(mark_read))
        .route("/api/messages/{id}", get(get_message))
}
