use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;

use crate::form::{ApplicationFields, FormState, ResumeFile};

/// Multipart part name the server reads the resume from.
pub const RESUME_PART: &str = "resume";

/// A frozen submission. Either all-JSON or all-multipart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedSubmission {
    Json(ApplicationFields),
    Multipart {
        fields: ApplicationFields,
        resume: ResumeFile,
    },
}

/// Snapshots the form. Multipart is used only when a resume is selected.
pub fn encode(form: &FormState) -> EncodedSubmission {
    let fields = form.fields().clone();
    match form.resume() {
        Some(resume) => EncodedSubmission::Multipart {
            fields,
            resume: resume.clone(),
        },
        None => EncodedSubmission::Json(fields),
    }
}

impl EncodedSubmission {
    pub fn is_multipart(&self) -> bool {
        matches!(self, EncodedSubmission::Multipart { .. })
    }

    pub fn fields(&self) -> &ApplicationFields {
        match self {
            EncodedSubmission::Json(fields) | EncodedSubmission::Multipart { fields, .. } => fields,
        }
    }

    /// Attaches the body (and its content type) to a request.
    pub(crate) fn apply(self, request: RequestBuilder) -> Result<RequestBuilder, reqwest::Error> {
        match self {
            EncodedSubmission::Json(fields) => Ok(request.json(&fields)),
            EncodedSubmission::Multipart { fields, resume } => {
                let mut form = Form::new();
                for (name, value) in fields.wire_pairs() {
                    form = form.text(name, value.to_string());
                }
                let part = Part::bytes(resume.bytes)
                    .file_name(resume.filename)
                    .mime_str(&resume.content_type)?;
                Ok(request.multipart(form.part(RESUME_PART, part)))
            }
        }
    }
}
