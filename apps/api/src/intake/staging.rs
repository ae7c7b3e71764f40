//! Attachment staging: transient on-disk storage for an uploaded resume.
//!
//! A staged file lives exactly as long as its `StagedAttachment`. The handle
//! wraps a `tempfile::TempPath`, so the file is unlinked when the handle drops,
//! whichever way the request ends.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;
use thiserror::Error;
use tempfile::TempPath;
use tracing::{debug, info};

use crate::errors::AppError;

/// The only MIME type accepted for a resume.
pub const ACCEPTED_CONTENT_TYPE: &str = "application/pdf";
/// 5 MiB.
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;
/// Multipart part name carrying the resume.
pub const ATTACHMENT_FIELD: &str = "resume";

const RANDOM_SUFFIX_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentRejection {
    #[error("Please upload a PDF file only.")]
    WrongType { content_type: String },

    #[error("File size must be less than 5MB.")]
    TooLarge,

    #[error("Only one resume file can be attached.")]
    Unexpected { field: String },
}

/// An attachment fully received from the client but not yet written anywhere.
#[derive(Debug, Clone)]
pub struct IncomingAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// A resume written to transient storage. Dropping it deletes the file.
#[derive(Debug)]
pub struct StagedAttachment {
    path: TempPath,
    original_name: String,
    content_type: String,
    size: usize,
}

impl StagedAttachment {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// Writes accepted attachments into the upload directory under unique names.
#[derive(Debug, Clone)]
pub struct AttachmentStager {
    upload_dir: PathBuf,
    max_bytes: usize,
}

impl AttachmentStager {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_bytes: MAX_ATTACHMENT_BYTES,
        }
    }

    /// Creates the upload directory if it does not exist yet.
    pub async fn prepare(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create upload directory {}",
                    self.upload_dir.display()
                )
            })?;
        info!(dir = %self.upload_dir.display(), "Upload directory ready");
        Ok(())
    }

    /// MIME type must be exactly `application/pdf`; parameters such as
    /// `; charset=...` are ignored.
    pub fn check_content_type(
        &self,
        content_type: Option<&str>,
    ) -> Result<(), AttachmentRejection> {
        let essence = content_type
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .unwrap_or_default();

        if essence.eq_ignore_ascii_case(ACCEPTED_CONTENT_TYPE) {
            Ok(())
        } else {
            Err(AttachmentRejection::WrongType {
                content_type: essence.to_string(),
            })
        }
    }

    pub fn check_size(&self, len: usize) -> Result<(), AttachmentRejection> {
        if len > self.max_bytes {
            Err(AttachmentRejection::TooLarge)
        } else {
            Ok(())
        }
    }

    /// Validates and writes an attachment. Nothing touches the disk unless both
    /// the type and size checks pass.
    pub async fn stage(&self, upload: IncomingAttachment) -> Result<StagedAttachment, AppError> {
        self.check_content_type(Some(&upload.content_type))?;
        self.check_size(upload.bytes.len())?;

        let dir = self.upload_dir.clone();
        let prefix = format!("resume-{}-", chrono::Utc::now().timestamp_millis());
        let suffix = extension_suffix(&upload.filename);
        let bytes = upload.bytes;
        let size = bytes.len();

        let path = tokio::task::spawn_blocking(move || -> anyhow::Result<TempPath> {
            let mut file = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(&suffix)
                .rand_bytes(RANDOM_SUFFIX_LEN)
                .tempfile_in(&dir)
                .with_context(|| format!("Failed to create staged file in {}", dir.display()))?;
            file.write_all(&bytes)
                .context("Failed to write staged attachment")?;
            file.flush().context("Failed to flush staged attachment")?;
            Ok(file.into_temp_path())
        })
        .await
        .context("Attachment staging task failed")??;

        debug!(path = %path.display(), size, "Attachment staged");

        Ok(StagedAttachment {
            path,
            original_name: upload.filename,
            content_type: ACCEPTED_CONTENT_TYPE.to_string(),
            size,
        })
    }
}

/// `.ext` from the original filename, restricted to short alphanumeric
/// extensions so client-supplied names cannot steer the staged path.
fn extension_suffix(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}
