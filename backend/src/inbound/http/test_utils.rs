//! Fixtures shared by the HTTP handler tests.

use std::sync::Arc;

use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::web;

use crate::domain::ports::{
    FixtureFormTokenService, FixtureRateLimiter, MemoryFeedbackRepository, RateLimiter,
};
use crate::domain::{AdminFeedbackService, SubmissionService};
use crate::inbound::http::state::HttpState;
use crate::outbound::cache::MemoryCacheStore;
use crate::outbound::flash::MemoryFlashStore;

/// Cookie-session middleware with a throwaway key.
pub(crate) fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".into())
        .cookie_secure(false)
        .build()
}

/// Handler state over in-memory adapters, plus a handle on the repository
/// for asserting stored rows.
pub(crate) struct TestState {
    pub repository: Arc<MemoryFeedbackRepository>,
    pub state: web::Data<HttpState>,
}

/// State with a fixture limiter that always allows.
pub(crate) fn test_state() -> TestState {
    test_state_with_limiter(Arc::new(FixtureRateLimiter))
}

/// State with the given limiter, for exercising the 429 path.
pub(crate) fn test_state_with_limiter(limiter: Arc<dyn RateLimiter>) -> TestState {
    let repository = Arc::new(MemoryFeedbackRepository::new());
    let cache = Arc::new(MemoryCacheStore::with_default_clock());
    let flash = Arc::new(MemoryFlashStore::with_default_clock());
    let submissions = Arc::new(SubmissionService::new(
        repository.clone(),
        limiter,
        flash.clone(),
        cache.clone(),
    ));
    let admin = Arc::new(AdminFeedbackService::new(repository.clone(), cache));
    let state = web::Data::new(HttpState::new(
        submissions,
        admin,
        flash,
        Arc::new(FixtureFormTokenService),
    ));
    TestState { repository, state }
}
