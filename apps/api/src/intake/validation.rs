use std::sync::LazyLock;

use regex::Regex;

use crate::errors::AppError;
use crate::models::submission::{ApplicationSubmission, RawSubmission};

/// Basic `local@domain.tld` shape. Deliverability is the relay's problem.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

pub const INVALID_EMAIL_MESSAGE: &str = "Please provide a valid email address";

/// Returns the display labels of every required field that is absent or blank,
/// in form order.
pub fn missing_required_fields(raw: &RawSubmission) -> Vec<&'static str> {
    let required: [(&'static str, &Option<String>); 7] = [
        ("Full Name", &raw.full_name),
        ("Contact Number", &raw.contact_number),
        ("Highest Education", &raw.education),
        ("Notice Period", &raw.notice_period),
        ("Email", &raw.email),
        ("Current CTC", &raw.current_ctc),
        ("Experience", &raw.experience),
    ];

    required
        .into_iter()
        .filter(|(_, value)| trimmed(value).is_none())
        .map(|(label, _)| label)
        .collect()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Validates a raw submission and returns its trimmed, typed form.
///
/// Missing fields are reported together; the email shape is only checked once
/// every required field is present.
pub fn validate_submission(raw: &RawSubmission) -> Result<ApplicationSubmission, AppError> {
    let missing = missing_required_fields(raw);
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Please fill all required fields: {}",
            missing.join(", ")
        )));
    }

    let required = |value: &Option<String>| trimmed(value).unwrap_or_default();

    let email = required(&raw.email);
    if !is_valid_email(&email) {
        return Err(AppError::Validation(INVALID_EMAIL_MESSAGE.to_string()));
    }

    Ok(ApplicationSubmission {
        full_name: required(&raw.full_name),
        contact_number: required(&raw.contact_number),
        email,
        education: required(&raw.education),
        notice_period: required(&raw.notice_period),
        linkedin_url: trimmed(&raw.linkedin_url),
        current_ctc: required(&raw.current_ctc),
        experience: required(&raw.experience),
        portfolio_link: trimmed(&raw.portfolio_link),
    })
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[cfg(test)]
pub(crate) fn complete_raw_submission() -> RawSubmission {
    RawSubmission {
        full_name: Some("Asha Rao".to_string()),
        contact_number: Some("+91 98765 43210".to_string()),
        education: Some("Master's Degree".to_string()),
        notice_period: Some("30 Days".to_string()),
        email: Some("asha@example.com".to_string()),
        linkedin_url: Some("https://linkedin.com/in/asha".to_string()),
        current_ctc: Some("12 LPA".to_string()),
        experience: Some("3-5 Years".to_string()),
        portfolio_link: None,
    }
}
