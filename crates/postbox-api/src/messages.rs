use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;

use postbox_db::models::{MessageChanges, MessageRow, NewMessage};
use postbox_types::api::{
    CreateMessageRequest, DELETED, MessageEnvelope, MessagesEnvelope, UpdateMessageRequest,
};
use postbox_types::ids::MessageId;
use postbox_types::models::Message;

use crate::error::ApiError;
use crate::parse_id;
use crate::state::{AppState, run_blocking};

const MAX_TITLE_LEN: usize = 200;
const MAX_BODY_LEN: usize = 10_000;

/// GET /messages
pub async fn list_messages(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = run_blocking(&state, |store| store.list_messages()).await?;

    let messages = rows
        .into_iter()
        .map(MessageRow::into_model)
        .collect::<anyhow::Result<Vec<Message>>>()?;

    Ok(Json(MessagesEnvelope { messages }))
}

/// GET /messages/{message_id}
pub async fn get_message(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: MessageId = parse_id(&raw_id, "message")?;

    let row = run_blocking(&state, move |store| store.get_message(id))
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(MessageEnvelope {
        message: row.into_model()?,
    }))
}

/// POST /messages — echoes the stored message back in the envelope.
pub async fn create_message(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateMessageRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    validate_field("title", &req.title, MAX_TITLE_LEN)?;
    validate_field("body", &req.body, MAX_BODY_LEN)?;

    let author = req.author;
    let new = NewMessage {
        title: req.title,
        body: req.body,
        author,
    };

    let row = run_blocking(&state, move |store| {
        if store.get_user_by_id(author)?.is_none() {
            return Ok(None);
        }
        store.create_message(&new).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::Validation(format!("author {} does not exist", author)))?;

    info!("Message {} created by {}", row.id, row.author_id);

    Ok(Json(MessageEnvelope {
        message: row.into_model()?,
    }))
}

/// PUT /messages/{message_id} — partial update of title and/or body.
pub async fn update_message(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateMessageRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let id: MessageId = parse_id(&raw_id, "message")?;

    if req.is_empty() {
        return Err(ApiError::Validation(
            "request must contain at least one of: title, body".into(),
        ));
    }
    if let Some(title) = &req.title {
        validate_field("title", title, MAX_TITLE_LEN)?;
    }
    if let Some(body) = &req.body {
        validate_field("body", body, MAX_BODY_LEN)?;
    }

    let changes = MessageChanges {
        title: req.title,
        body: req.body,
    };

    let row = run_blocking(&state, move |store| store.update_message(id, &changes))
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(MessageEnvelope {
        message: row.into_model()?,
    }))
}

/// DELETE /messages/{message_id}
pub async fn delete_message(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: MessageId = parse_id(&raw_id, "message")?;

    let deleted = run_blocking(&state, move |store| store.delete_message(id)).await?;
    if !deleted {
        return Err(not_found(id));
    }

    info!("Message {} deleted", id);
    Ok(Json(MessageEnvelope { message: DELETED }))
}

fn not_found(id: MessageId) -> ApiError {
    ApiError::NotFound(format!("message {} not found", id))
}

fn validate_field(name: &str, value: &str, max_len: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} must not be empty", name)));
    }
    if value.chars().count() > max_len {
        return Err(ApiError::Validation(format!(
            "{} must be at most {} characters",
            name, max_len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_and_oversized_fields() {
        assert!(validate_field("title", "Test Message 1", MAX_TITLE_LEN).is_ok());
        assert!(matches!(
            validate_field("title", "   ", MAX_TITLE_LEN),
            Err(ApiError::Validation(_))
        ));

        let long = "x".repeat(MAX_TITLE_LEN + 1);
        let err = validate_field("title", &long, MAX_TITLE_LEN).unwrap_err();
        assert_eq!(err.to_string(), "title must be at most 200 characters");
    }
}
