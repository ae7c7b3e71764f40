//! Delivery of an encoded submission to `POST /contact`.
//!
//! `SubmissionClient` is the raw call with a one-in-flight guard shared by all
//! clones. `FormController` ties a client to a `FormState` and exposes the
//! idle → pending → success | error status a UI renders.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::encode::{encode, EncodedSubmission};
use crate::form::FormState;

pub const SUCCESS_MESSAGE: &str = "Form submitted successfully! We'll get back to you soon.";
pub const FALLBACK_FAILURE_MESSAGE: &str = "Failed to submit form. Please try again.";
pub const NETWORK_FAILURE_MESSAGE: &str = "Network error. Please check if the server is running.";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("A submission is already in progress.")]
    AlreadyPending,

    /// The server answered with `success: false`.
    #[error("{}", .0.as_deref().unwrap_or(FALLBACK_FAILURE_MESSAGE))]
    Rejected(Option<String>),

    /// No usable response: connection failure, timeout, or a body that is not
    /// the expected JSON.
    #[error("Network error. Please check if the server is running.")]
    Network(#[source] reqwest::Error),
}

/// Server acknowledgment of a delivered application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    pub message: String,
    pub message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerReply {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    message_id: Option<String>,
}

/// Clears the in-flight flag on every exit, including a dropped future.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct SubmissionClient {
    http: reqwest::Client,
    endpoint: String,
    in_flight: Arc<AtomicBool>,
}

impl SubmissionClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_http_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Sends one submission. No retries; a second call while one is in flight
    /// fails immediately with `AlreadyPending`.
    pub async fn send(&self, payload: EncodedSubmission) -> Result<Acknowledgement, SubmitError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(SubmitError::AlreadyPending)?;

        debug!(
            endpoint = %self.endpoint,
            multipart = payload.is_multipart(),
            "Submitting application"
        );

        let request = payload
            .apply(self.http.post(&self.endpoint))
            .map_err(SubmitError::Network)?;
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Submission request failed");
            SubmitError::Network(e)
        })?;
        let status = response.status();
        let reply: ServerReply = response.json().await.map_err(|e| {
            warn!(%status, error = %e, "Unreadable submission response");
            SubmitError::Network(e)
        })?;

        if reply.success {
            Ok(Acknowledgement {
                message: reply.message.unwrap_or_default(),
                message_id: reply.message_id,
            })
        } else {
            debug!(%status, message = ?reply.message, "Submission rejected");
            Err(SubmitError::Rejected(
                reply.message.filter(|m| !m.trim().is_empty()),
            ))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmitStatus {
    #[default]
    Idle,
    Pending,
    Success(String),
    Error(String),
}

impl SubmitStatus {
    pub fn message(&self) -> Option<&str> {
        match self {
            SubmitStatus::Success(msg) | SubmitStatus::Error(msg) => Some(msg),
            SubmitStatus::Idle | SubmitStatus::Pending => None,
        }
    }
}

/// A form bound to a client. Every submit attempt ends in `Success` or
/// `Error`; resubmitting takes another call.
pub struct FormController {
    form: FormState,
    client: SubmissionClient,
    status: SubmitStatus,
}

impl FormController {
    pub fn new(client: SubmissionClient) -> Self {
        Self {
            form: FormState::new(),
            client,
            status: SubmitStatus::Idle,
        }
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn status(&self) -> &SubmitStatus {
        &self.status
    }

    /// Submit is disabled while a submission on this client is in flight.
    pub fn can_submit(&self) -> bool {
        !self.client.is_pending() && self.status != SubmitStatus::Pending
    }

    pub async fn submit(&mut self) -> &SubmitStatus {
        let payload = encode(&self.form);
        self.status = SubmitStatus::Pending;

        self.status = match self.client.send(payload).await {
            Ok(_) => {
                self.form.reset();
                SubmitStatus::Success(SUCCESS_MESSAGE.to_string())
            }
            Err(e) => SubmitStatus::Error(e.to_string()),
        };
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use axum::{
        extract::Multipart,
        http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    use super::*;
    use crate::form::{filled_form, ResumeFile, RESUME_CONTENT_TYPE};

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn client_for(addr: SocketAddr) -> SubmissionClient {
        SubmissionClient::new(format!("http://{addr}/contact"))
    }

    /// Accepts JSON or multipart and reports what it saw in `message`.
    async fn echo_shape(headers: HeaderMap, body: axum::body::Bytes) -> Json<Value> {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let shape = if content_type.starts_with("application/json") {
            let value: Value = serde_json::from_slice(&body).unwrap();
            format!("json:{}", value["email"].as_str().unwrap_or_default())
        } else {
            format!("other:{}", body.len())
        };
        Json(json!({ "success": true, "message": shape, "messageId": "<m-1@test>" }))
    }

    async fn count_resume(mut multipart: Multipart) -> Json<Value> {
        let mut fields = 0;
        let mut resume = None;
        while let Some(field) = multipart.next_field().await.unwrap() {
            if field.name() == Some("resume") {
                let name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let len = field.bytes().await.unwrap().len();
                resume = Some(format!("{name}:{content_type}:{len}"));
            } else {
                fields += 1;
            }
        }
        Json(json!({
            "success": true,
            "message": format!("{fields}|{}", resume.unwrap_or_default()),
        }))
    }

    #[tokio::test]
    async fn test_json_submission_success_resets_form() {
        let addr = serve(Router::new().route("/contact", post(echo_shape))).await;
        let mut controller = FormController::new(client_for(addr));
        *controller.form_mut() = filled_form();

        let status = controller.submit().await.clone();
        assert_eq!(status, SubmitStatus::Success(SUCCESS_MESSAGE.to_string()));
        assert!(controller.form().fields().full_name.is_empty());
        assert!(controller.can_submit());
    }

    #[tokio::test]
    async fn test_send_reports_server_acknowledgement() {
        let addr = serve(Router::new().route("/contact", post(echo_shape))).await;
        let ack = client_for(addr)
            .send(encode(&filled_form()))
            .await
            .unwrap();
        assert_eq!(ack.message, "json:asha@example.com");
        assert_eq!(ack.message_id.as_deref(), Some("<m-1@test>"));
    }

    #[tokio::test]
    async fn test_resume_goes_out_as_multipart() {
        let addr = serve(Router::new().route("/contact", post(count_resume))).await;
        let mut form = filled_form();
        form.select_resume(ResumeFile {
            filename: "cv.pdf".to_string(),
            content_type: RESUME_CONTENT_TYPE.to_string(),
            bytes: vec![7; 2048],
        })
        .unwrap();

        let ack = client_for(addr).send(encode(&form)).await.unwrap();
        assert_eq!(ack.message, "9|cv.pdf:application/pdf:2048");
    }

    #[tokio::test]
    async fn test_server_rejection_keeps_form_and_shows_message() {
        let router = Router::new().route(
            "/contact",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "success": false,
                        "message": "Please fill all required fields: Email"
                    })),
                )
            }),
        );
        let addr = serve(router).await;
        let mut controller = FormController::new(client_for(addr));
        *controller.form_mut() = filled_form();

        let status = controller.submit().await.clone();
        assert_eq!(
            status,
            SubmitStatus::Error("Please fill all required fields: Email".to_string())
        );
        assert_eq!(controller.form().fields().full_name, "Asha Rao");
    }

    #[tokio::test]
    async fn test_rejection_without_message_uses_fallback() {
        let router = Router::new().route(
            "/contact",
            post(|| async { Json(json!({ "success": false })) }),
        );
        let addr = serve(router).await;
        let mut controller = FormController::new(client_for(addr));

        let status = controller.submit().await;
        assert_eq!(status.message(), Some(FALLBACK_FAILURE_MESSAGE));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut controller = FormController::new(client_for(addr));
        let status = controller.submit().await;
        assert_eq!(status.message(), Some(NETWORK_FAILURE_MESSAGE));
    }

    #[tokio::test]
    async fn test_non_json_reply_is_a_network_error() {
        let router = Router::new().route("/contact", post(|| async { "<html>502</html>" }));
        let addr = serve(router).await;

        let err = client_for(addr)
            .send(encode(&filled_form()))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Network(_)));
        assert_eq!(err.to_string(), NETWORK_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_second_send_while_pending_is_refused() {
        let router = Router::new().route(
            "/contact",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Json(json!({ "success": true, "message": "ok" }))
            }),
        );
        let addr = serve(router).await;
        let client = client_for(addr);

        let first = {
            let client = client.clone();
            tokio::spawn(async move { client.send(encode(&filled_form())).await })
        };
        while !client.is_pending() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let second = client.send(encode(&filled_form())).await;
        assert!(matches!(second, Err(SubmitError::AlreadyPending)));

        assert!(first.await.unwrap().is_ok());
        assert!(!client.is_pending());
    }

    #[tokio::test]
    async fn test_cancelled_send_releases_the_guard() {
        let router = Router::new().route(
            "/contact",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "success": true }))
            }),
        );
        let addr = serve(router).await;
        let client = client_for(addr);

        let attempt = tokio::time::timeout(
            Duration::from_millis(50),
            client.send(encode(&filled_form())),
        )
        .await;
        assert!(attempt.is_err());
        assert!(!client.is_pending());
    }
}
