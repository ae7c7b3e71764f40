use std::sync::Arc;

use crate::config::Config;
use crate::intake::dispatch::MessageDispatcher;
use crate::intake::staging::AttachmentStager;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Mail transport. `SmtpDispatcher` in production, a fake in tests.
    pub dispatcher: Arc<dyn MessageDispatcher>,
    pub stager: AttachmentStager,
}
