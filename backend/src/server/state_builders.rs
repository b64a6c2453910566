//! Builders wiring outbound adapters into the HTTP handler state.

use std::sync::Arc;

use actix_web::web;
use tracing::warn;

use backend::domain::ports::{FeedbackRepository, FixtureFeedbackRepository};
use backend::domain::{AdminFeedbackService, SubmissionService};
use backend::inbound::http::state::HttpState;
use backend::outbound::cache::MemoryCacheStore;
use backend::outbound::flash::MemoryFlashStore;
use backend::outbound::persistence::DieselFeedbackRepository;
use backend::outbound::rate_limit::FixedWindowRateLimiter;
use backend::outbound::security::Sha256FormTokenService;

use super::ServerConfig;

/// Build the handler state: the Diesel repository when a pool is configured,
/// the fixture otherwise, with the in-process cache, flash store, limiter,
/// and token service around it.
pub(crate) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let repository: Arc<dyn FeedbackRepository> = match &config.db_pool {
        Some(pool) => Arc::new(DieselFeedbackRepository::new(pool.clone())),
        None => {
            warn!("no database pool configured; submissions will not be persisted");
            Arc::new(FixtureFeedbackRepository)
        }
    };

    let cache = Arc::new(MemoryCacheStore::with_default_clock());
    let flash = Arc::new(MemoryFlashStore::with_default_clock());
    let rate_limiter = Arc::new(FixedWindowRateLimiter::with_default_clock());
    let form_tokens = Arc::new(Sha256FormTokenService::with_default_clock(
        config.form_token_secret.clone(),
    ));

    let submissions = Arc::new(SubmissionService::new(
        repository.clone(),
        rate_limiter,
        flash.clone(),
        cache.clone(),
    ));
    let admin = Arc::new(AdminFeedbackService::new(repository, cache));

    web::Data::new(HttpState::new(submissions, admin, flash, form_tokens))
}
