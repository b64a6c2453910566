//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data`, so they depend
//! only on the domain services and ports and remain testable without
//! infrastructure.

use std::sync::Arc;

use crate::domain::ports::{FlashStore, FormTokenService};
use crate::domain::{AdminFeedbackService, SubmissionService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// The public submission pipeline.
    pub submissions: Arc<SubmissionService>,
    /// The admin list/detail/delete service.
    pub admin: Arc<AdminFeedbackService>,
    /// One-time flash store consumed by the form-state endpoint.
    pub flash: Arc<dyn FlashStore>,
    /// Anti-forgery token service.
    pub form_tokens: Arc<dyn FormTokenService>,
}

impl HttpState {
    /// Bundle the handler dependencies.
    pub fn new(
        submissions: Arc<SubmissionService>,
        admin: Arc<AdminFeedbackService>,
        flash: Arc<dyn FlashStore>,
        form_tokens: Arc<dyn FormTokenService>,
    ) -> Self {
        Self {
            submissions,
            admin,
            flash,
            form_tokens,
        }
    }
}
