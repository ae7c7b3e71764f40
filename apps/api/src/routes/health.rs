use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsResponse {
    pub status: &'static str,
    pub smtp_configured: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
}

/// GET /
pub async fn liveness_handler() -> &'static str {
    "Careers intake API is running"
}

/// GET /test
/// Reports whether mail credentials are present and which relay is in effect.
/// Never echoes the credentials themselves.
pub async fn diagnostics_handler(State(state): State<AppState>) -> Json<DiagnosticsResponse> {
    Json(DiagnosticsResponse {
        status: "Server is running",
        smtp_configured: state.config.mail_credentials().is_some(),
        smtp_host: state.config.smtp_host.clone(),
        smtp_port: state.config.smtp_port,
    })
}
