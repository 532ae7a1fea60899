use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, error};

use crate::AppState;
use crate::email::OutgoingEmail;
use crate::error::ApplyError;
use crate::submission::{ApplicationRequest, ValidationError};

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
    #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// POST handler for application submissions. The body is read raw so that a
/// missing, mistyped or oversized body is reported as a validation failure.
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match process_submission(&state, body).await {
        Ok(message_id) => (
            StatusCode::OK,
            Json(SendEmailResponse {
                success: true,
                message_id,
            }),
        )
            .into_response(),
        Err(e) => {
            if e.status().is_server_error() {
                error!("Submission failed: {}", e);
            } else {
                info!("Submission rejected: {}", e);
            }
            e.into_response_for(state.mode)
        }
    }
}

pub async fn process_submission(
    state: &AppState,
    body: Result<Bytes, BytesRejection>,
) -> Result<Option<String>, ApplyError> {
    let (mailer, duplicates) = state.services()?;

    let body = body.map_err(|rejection| ValidationError::MalformedBody(rejection.body_text()))?;
    let submission = ApplicationRequest::from_body(&body)?.validate()?;

    let exists = duplicates
        .is_duplicate(&submission.lookup_email)
        .await
        .map_err(ApplyError::Infrastructure)?;

    if exists {
        info!(email = %submission.email, "Email already used");
        return Err(ApplyError::Duplicate);
    }

    let rendered = state.templates.render_confirmation(&submission, Utc::now())?;

    info!(email = %submission.email, locale = ?submission.locale, "Attempting to send email");

    let message = OutgoingEmail::new(&submission.email, &rendered.subject, rendered.html);
    let message_id = mailer.send(&message).await?;

    info!(email = %submission.email, id = ?message_id, "Email sent successfully");

    Ok(message_id)
}

pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed(State(state): State<Arc<AppState>>) -> Response {
    ApplyError::MethodNotAllowed.into_response_for(state.mode)
}
