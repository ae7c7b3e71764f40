use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::intake::compose::compose_message;
use crate::intake::payload::SubmissionPayload;
use crate::intake::validation::validate_submission;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// POST /contact
///
/// Validates an application and relays it to the recruiting inbox. The staged
/// resume (if any) is owned by this function and deleted when it returns,
/// whether dispatch succeeded or not.
pub async fn handle_contact(
    State(state): State<AppState>,
    payload: SubmissionPayload,
) -> Result<Json<ContactResponse>, AppError> {
    let SubmissionPayload { fields, attachment } = payload;

    let submission = validate_submission(&fields)?;

    let credentials = state
        .config
        .mail_credentials()
        .ok_or(AppError::Configuration)?;
    let recipient = state
        .config
        .recipient()
        .unwrap_or(&credentials.account)
        .to_string();

    let message = compose_message(
        &submission,
        attachment.as_ref(),
        &credentials.account,
        &recipient,
    );

    info!(
        applicant = %submission.full_name,
        resume_bytes = attachment.as_ref().map_or(0, |a| a.size()),
        to = %recipient,
        "Dispatching application"
    );
    let receipt = state.dispatcher.dispatch(&message).await;
    drop(attachment);
    let receipt = receipt?;

    info!(message_id = %receipt.message_id, "Application delivered");

    Ok(Json(ContactResponse {
        success: true,
        message: "Application submitted successfully".to_string(),
        message_id: Some(receipt.message_id),
    }))
}
