//! Payload decoding: one extractor for every body shape `POST /contact` accepts.
//!
//! JSON and urlencoded bodies carry fields only. Multipart bodies may also carry
//! a single `resume` part, which is size/type checked while it streams and then
//! staged to disk before the handler runs.

use axum::{
    async_trait,
    extract::{multipart::Field, FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Form, Json,
};
use bytes::BytesMut;
use tracing::debug;

use crate::errors::AppError;
use crate::intake::staging::{
    AttachmentRejection, AttachmentStager, IncomingAttachment, StagedAttachment, ATTACHMENT_FIELD,
};
use crate::models::submission::RawSubmission;
use crate::state::AppState;

/// A decoded request: the raw fields plus the staged resume, if one was sent.
#[derive(Debug)]
pub struct SubmissionPayload {
    pub fields: RawSubmission,
    pub attachment: Option<StagedAttachment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PayloadShape {
    Json,
    UrlEncoded,
    Multipart,
}

impl PayloadShape {
    fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case("application/json") || essence.ends_with("+json") {
            Some(Self::Json)
        } else if essence.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            Some(Self::UrlEncoded)
        } else if essence.eq_ignore_ascii_case("multipart/form-data") {
            Some(Self::Multipart)
        } else {
            None
        }
    }
}

#[async_trait]
impl FromRequest<AppState> for SubmissionPayload {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let shape = PayloadShape::from_content_type(&content_type).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Unsupported content type '{content_type}'. Send JSON or form data."
            ))
        })?;
        debug!(?shape, "Decoding submission payload");

        match shape {
            PayloadShape::Json => {
                let Json(fields) = Json::<RawSubmission>::from_request(req, state)
                    .await
                    .map_err(|e| {
                        AppError::BadRequest(format!("Invalid JSON body: {}", e.body_text()))
                    })?;
                Ok(Self {
                    fields,
                    attachment: None,
                })
            }
            PayloadShape::UrlEncoded => {
                let Form(fields) = Form::<RawSubmission>::from_request(req, state)
                    .await
                    .map_err(|e| {
                        AppError::BadRequest(format!("Invalid form body: {}", e.body_text()))
                    })?;
                Ok(Self {
                    fields,
                    attachment: None,
                })
            }
            PayloadShape::Multipart => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| {
                        AppError::BadRequest(format!("Invalid multipart body: {}", e.body_text()))
                    })?;
                decode_multipart(multipart, &state.stager).await
            }
        }
    }
}

async fn decode_multipart(
    mut multipart: Multipart,
    stager: &AttachmentStager,
) -> Result<SubmissionPayload, AppError> {
    let mut fields = RawSubmission::default();
    let mut attachment: Option<StagedAttachment> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .file_name()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        match filename {
            None if name == ATTACHMENT_FIELD => {
                // Browsers send an empty file input as a nameless, bodiless part.
                drain(&mut field).await?;
                continue;
            }
            Some(_) if name != ATTACHMENT_FIELD || attachment.is_some() => {
                return Err(AttachmentRejection::Unexpected { field: name }.into());
            }
            Some(filename) => {
                if let Some(upload) = read_attachment(field, filename, stager).await? {
                    attachment = Some(stager.stage(upload).await?);
                }
                continue;
            }
            None => {}
        }

        let value = field.text().await.map_err(multipart_error)?;
        if !fields.set_field(&name, value) {
            debug!(field = %name, "Ignoring unknown form field");
        }
    }

    Ok(SubmissionPayload { fields, attachment })
}

/// Buffers a file part, rejecting on type once the part is known to be
/// non-empty and on size as soon as the running total passes the limit.
/// A zero-byte part yields `None`.
async fn read_attachment(
    mut field: Field<'_>,
    filename: String,
    stager: &AttachmentStager,
) -> Result<Option<IncomingAttachment>, AppError> {
    let content_type = field.content_type().unwrap_or_default().to_string();

    let Some(first) = field.chunk().await.map_err(multipart_error)? else {
        debug!(%filename, "Skipping empty resume part");
        return Ok(None);
    };
    stager.check_content_type(Some(&content_type))?;

    let mut buffer = BytesMut::new();
    let mut next = Some(first);
    while let Some(chunk) = next {
        stager.check_size(buffer.len() + chunk.len())?;
        buffer.extend_from_slice(&chunk);
        next = field.chunk().await.map_err(multipart_error)?;
    }

    Ok(Some(IncomingAttachment {
        filename,
        content_type,
        bytes: buffer.freeze(),
    }))
}

async fn drain(field: &mut Field<'_>) -> Result<(), AppError> {
    while field.chunk().await.map_err(multipart_error)?.is_some() {}
    Ok(())
}

/// A body that blew the route's byte limit is, in practice, an oversize resume.
fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AttachmentRejection::TooLarge.into()
    } else {
        AppError::BadRequest(format!("Invalid multipart body: {}", e.body_text()))
    }
}
