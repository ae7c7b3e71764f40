//! Message composition: turns a validated submission into an `OutboundMessage`.
//!
//! Pure construction: no I/O, no clock. HTML escaping happens here, exactly once
//! per field, and nowhere else in the pipeline.

use std::path::PathBuf;

use crate::intake::staging::StagedAttachment;
use crate::models::submission::ApplicationSubmission;

/// Reference to a staged file; the dispatcher reads the bytes at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub path: PathBuf,
    pub filename: String,
    pub content_type: String,
}

/// A fully composed notification for the recruiting inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub attachment: Option<AttachmentRef>,
}

/// Replaces the five HTML-significant characters with entities.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn compose_message(
    submission: &ApplicationSubmission,
    attachment: Option<&StagedAttachment>,
    from: &str,
    to: &str,
) -> OutboundMessage {
    let safe = SafeFields::escape(submission);

    OutboundMessage {
        from: from.to_string(),
        to: to.to_string(),
        subject: format!("Application Form Submission from {}", safe.full_name),
        html_body: render_html(&safe, attachment),
        text_body: render_text(submission, attachment),
        attachment: attachment.map(|staged| AttachmentRef {
            path: staged.path().to_path_buf(),
            filename: staged.original_name().to_string(),
            content_type: staged.content_type().to_string(),
        }),
    }
}

/// Every submission field, escaped once.
struct SafeFields {
    full_name: String,
    contact_number: String,
    email: String,
    education: String,
    experience: String,
    current_ctc: String,
    notice_period: String,
    portfolio_link: Option<String>,
    linkedin_url: Option<String>,
}

impl SafeFields {
    fn escape(s: &ApplicationSubmission) -> Self {
        Self {
            full_name: escape_html(&s.full_name),
            contact_number: escape_html(&s.contact_number),
            email: escape_html(&s.email),
            education: escape_html(&s.education),
            experience: escape_html(&s.experience),
            current_ctc: escape_html(&s.current_ctc),
            notice_period: escape_html(&s.notice_period),
            portfolio_link: non_empty(&s.portfolio_link).map(escape_html),
            linkedin_url: non_empty(&s.linkedin_url).map(escape_html),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

const LABEL_CELL: &str = "padding: 8px 0; font-weight: bold; color: #374151; width: 40%;";
const VALUE_CELL: &str = "padding: 8px 0; color: #1f2937;";
const LINK_STYLE: &str = "color: #3b82f6; text-decoration: none;";
const CARD_STYLE: &str = "background-color: white; padding: 20px; border-radius: 8px; margin-top: 20px; box-shadow: 0 1px 3px rgba(0,0,0,0.1);";

fn row(label: &str, value_html: &str) -> String {
    format!(
        "<tr><td style=\"{LABEL_CELL}\">{label}:</td><td style=\"{VALUE_CELL}\">{value_html}</td></tr>\n"
    )
}

fn link_row(label: &str, safe_url: &str) -> String {
    row(
        label,
        &format!("<a href=\"{safe_url}\" style=\"{LINK_STYLE}\">{safe_url}</a>"),
    )
}

fn card(title: &str, rows: &str) -> String {
    format!(
        "<div style=\"{CARD_STYLE}\">\n\
         <h3 style=\"color: #3b82f6; margin-top: 0;\">{title}</h3>\n\
         <table style=\"width: 100%; border-collapse: collapse;\">\n{rows}</table>\n\
         </div>\n"
    )
}

fn render_html(safe: &SafeFields, attachment: Option<&StagedAttachment>) -> String {
    let mut personal = String::new();
    personal.push_str(&row("Full Name", &safe.full_name));
    personal.push_str(&row("Contact Number", &safe.contact_number));
    personal.push_str(&row("Email Address", &safe.email));
    if let Some(link) = &safe.portfolio_link {
        personal.push_str(&link_row("Portfolio/Resume Link", link));
    }
    if let Some(url) = &safe.linkedin_url {
        personal.push_str(&link_row("LinkedIn URL", url));
    }
    if let Some(staged) = attachment {
        personal.push_str(&row(
            "Resume",
            &format!("{} (attached)", escape_html(staged.original_name())),
        ));
    }

    let mut professional = String::new();
    professional.push_str(&row("Highest Education", &safe.education));
    professional.push_str(&row("Experience", &safe.experience));
    professional.push_str(&row("Current CTC", &safe.current_ctc));
    professional.push_str(&row("Notice Period", &safe.notice_period));

    format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; background-color: #f9fafb;\">\n\
         <h2 style=\"color: #1f2937; border-bottom: 2px solid #3b82f6; padding-bottom: 10px;\">New Application Form Submission</h2>\n\
         {}{}</div>\n",
        card("Personal Information", &personal),
        card("Professional Information", &professional),
    )
}

fn render_text(s: &ApplicationSubmission, attachment: Option<&StagedAttachment>) -> String {
    let mut lines = vec![
        "New Application Form Submission".to_string(),
        String::new(),
        "Personal Information:".to_string(),
        format!("Full Name: {}", s.full_name),
        format!("Contact Number: {}", s.contact_number),
        format!("Email Address: {}", s.email),
    ];
    if let Some(link) = non_empty(&s.portfolio_link) {
        lines.push(format!("Portfolio/Resume Link: {link}"));
    }
    if let Some(url) = non_empty(&s.linkedin_url) {
        lines.push(format!("LinkedIn URL: {url}"));
    }
    if let Some(staged) = attachment {
        lines.push(format!("Resume: {} (attached)", staged.original_name()));
    }
    lines.extend([
        String::new(),
        "Professional Information:".to_string(),
        format!("Highest Education: {}", s.education),
        format!("Experience: {}", s.experience),
        format!("Current CTC: {}", s.current_ctc),
        format!("Notice Period: {}", s.notice_period),
    ]);

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::staging::{AttachmentStager, IncomingAttachment, ACCEPTED_CONTENT_TYPE};

    fn submission() -> ApplicationSubmission {
        ApplicationSubmission {
            full_name: "A & B".to_string(),
            contact_number: "555-0100".to_string(),
            email: "ab@example.com".to_string(),
            education: "Bachelor's Degree".to_string(),
            notice_period: "Immediate".to_string(),
            linkedin_url: None,
            current_ctc: "<10 LPA>".to_string(),
            experience: "1-2 Years".to_string(),
            portfolio_link: None,
        }
    }

    fn compose(s: &ApplicationSubmission) -> OutboundMessage {
        compose_message(s, None, "careers@test.local", "hiring@test.local")
    }

    #[test]
    fn test_escape_html_all_five() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#039;&amp;&#039;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_text_body_raw_and_html_body_escaped() {
        let message = compose(&submission());
        assert!(message.text_body.contains("Full Name: A & B"));
        assert!(message.html_body.contains("A &amp; B"));
        assert!(!message.html_body.contains("A & B"));
        assert!(message.html_body.contains("&lt;10 LPA&gt;"));
        assert!(message.text_body.contains("Current CTC: <10 LPA>"));
    }

    #[test]
    fn test_already_escaped_value_is_escaped_exactly_once() {
        let mut s = submission();
        s.full_name = "Tom &amp; Jerry".to_string();
        let message = compose(&s);

        assert!(message.html_body.contains("Tom &amp;amp; Jerry"));
        assert!(!message.html_body.contains("&amp;amp;amp;"));
        assert!(message.text_body.contains("Tom &amp; Jerry"));
    }

    #[test]
    fn test_subject_carries_escaped_name() {
        let message = compose(&submission());
        assert_eq!(message.subject, "Application Form Submission from A &amp; B");
    }

    #[test]
    fn test_optional_links_only_when_present() {
        let message = compose(&submission());
        assert!(!message.html_body.contains("LinkedIn URL"));
        assert!(!message.text_body.contains("Portfolio/Resume Link"));

        let mut s = submission();
        s.linkedin_url = Some("https://linkedin.com/in/ab?x=1&y=2".to_string());
        s.portfolio_link = Some("https://ab.dev".to_string());
        let message = compose(&s);
        assert!(message
            .html_body
            .contains("href=\"https://linkedin.com/in/ab?x=1&amp;y=2\""));
        assert!(message
            .text_body
            .contains("LinkedIn URL: https://linkedin.com/in/ab?x=1&y=2"));
        assert!(message.text_body.contains("Portfolio/Resume Link: https://ab.dev"));
    }

    #[test]
    fn test_addresses_and_no_attachment() {
        let message = compose(&submission());
        assert_eq!(message.from, "careers@test.local");
        assert_eq!(message.to, "hiring@test.local");
        assert!(message.attachment.is_none());
    }

    #[tokio::test]
    async fn test_attachment_reference_points_at_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let stager = AttachmentStager::new(dir.path());
        let staged = stager
            .stage(IncomingAttachment {
                filename: "cv <final>.pdf".to_string(),
                content_type: ACCEPTED_CONTENT_TYPE.to_string(),
                bytes: bytes::Bytes::from_static(b"%PDF-1.4"),
            })
            .await
            .unwrap();

        let message = compose_message(&submission(), Some(&staged), "f@x.io", "t@x.io");
        let attachment = message.attachment.unwrap();
        assert_eq!(attachment.path, staged.path());
        assert_eq!(attachment.filename, "cv <final>.pdf");
        assert_eq!(attachment.content_type, ACCEPTED_CONTENT_TYPE);
        assert!(message.html_body.contains("cv &lt;final&gt;.pdf (attached)"));
        assert!(message.text_body.contains("Resume: cv <final>.pdf (attached)"));
    }
}
