use axum::extract::{Path, State};
use axum::Json;
use bevy_log::info;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{success, Admin, ApiJson, ApiState};
use crate::mail::OutgoingEmail;
use crate::models::{now, ContactSubmission, Message};
use crate::store::RecordId;
use crate::{PortfolioError, PortfolioResult};

pub(super) async fn submit_contact(
    State(state): State<ApiState>,
    ApiJson(submission): ApiJson<ContactSubmission>,
) -> PortfolioResult<Json<Value>> {
    submission
        .validate()
        .map_err(|field| PortfolioError::invalid_input(format!("{} is required", field)))?;

    let message = state
        .messages
        .create(&mut |id| submission.clone().into_message(id))?;
    info!("New contact message #{} from {}", message.id, message.email);

    Ok(Json(json!({
        "success": true,
        "message": "Thank you for your message! I will get back to you soon.",
    })))
}

pub(super) async fn list_messages(
    _admin: Admin,
    State(state): State<ApiState>,
) -> PortfolioResult<Json<Value>> {
    let mut messages = state.messages.list()?;
    messages.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(Json(json!({ "success": true, "messages": messages })))
}

pub(super) async fn mark_read(
    _admin: Admin,
    State(state): State<ApiState>,
    Path(id): Path<RecordId>,
) -> PortfolioResult<Json<Value>> {
    update_message(&state, id, |message| message.read = true)
}

pub(super) async fn mark_replied(
    _admin: Admin,
    State(state): State<ApiState>,
    Path(id): Path<RecordId>,
) -> PortfolioResult<Json<Value>> {
    update_message(&state, id, |message| {
        message.replied = true;
        message.replied_date = Some(now());
    })
}

fn update_message(
    state: &ApiState,
    id: RecordId,
    mut apply: impl FnMut(&mut Message),
) -> PortfolioResult<Json<Value>> {
    state
        .messages
        .update(id, &mut apply)?
        .ok_or_else(|| PortfolioError::not_found("Message", id))?;
    Ok(success())
}

pub(super) async fn delete_message(
    _admin: Admin,
    State(state): State<ApiState>,
    Path(id): Path<RecordId>,
) -> PortfolioResult<Json<Value>> {
    state.messages.delete(id)?;
    Ok(success())
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ReplyRequest {
    to: Option<String>,
    subject: Option<String>,
    message: Option<String>,
}

/// Queues the reply and answers before the SMTP exchange happens.
pub(super) async fn send_reply_email(
    _admin: Admin,
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<ReplyRequest>,
) -> PortfolioResult<Json<Value>> {
    let (Some(to), Some(subject), Some(body)) = (request.to, request.subject, request.message)
    else {
        return Err(PortfolioError::invalid_input(
            "Missing required fields: to, subject, or message",
        ));
    };

    if !state.outbox.is_configured() {
        return Err(PortfolioError::http_error(
            500,
            "Email credentials not configured. Please set the GMAIL_USER and GMAIL_PASS environment variables.",
        ));
    }

    info!("Queueing email to {} with subject '{}'", to, subject);
    state.outbox.enqueue(OutgoingEmail { to, subject, body });

    Ok(Json(json!({
        "success": true,
        "message": "Email is being sent. You will receive a confirmation once it's delivered.",
    })))
}

pub(super) async fn test_email_endpoint(_admin: Admin) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Email endpoint is working! Backend is responding quickly.",
        "timestamp": now(),
    }))
}
