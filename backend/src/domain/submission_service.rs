//! The public submission pipeline.
//!
//! Single pass, no retries: rate limit → sanitize → validate → insert →
//! flash + redirect. Anti-forgery verification happens in the HTTP adapter
//! before the pipeline is entered (it needs the raw form fields); everything
//! from the rate limiter onwards lives here.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::ports::{
    cache_groups, CacheStore, FeedbackRepository, FlashStore, RateLimiter,
};
use crate::domain::validation::{sanitize_fields, validate_fields};
use crate::domain::{Error, FlashMessage, FlashToken, NewFeedbackSubmission, OldInput};

/// A submission as received by the HTTP adapter, fields still raw.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    /// Resolved client address, if any. Absence fail-opens the rate limit.
    pub client_key: Option<String>,
    /// Raw name field.
    pub name: String,
    /// Raw email field.
    pub email: String,
    /// Raw message field.
    pub message: String,
    /// Path to redirect back to, query already stripped.
    pub redirect_path: String,
}

/// Where the pipeline sends the submitter next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The row was stored; the location carries a success token.
    Stored {
        /// Redirect target with `feedback_token` appended.
        location: String,
    },
    /// Validation failed; the location carries an error token.
    Invalid {
        /// Redirect target with `error_token` appended.
        location: String,
    },
}

impl SubmissionOutcome {
    /// The redirect target for this outcome.
    pub fn location(&self) -> &str {
        match self {
            Self::Stored { location } | Self::Invalid { location } => location,
        }
    }
}

/// Driving service for the public feedback form.
#[derive(Clone)]
pub struct SubmissionService {
    repository: Arc<dyn FeedbackRepository>,
    rate_limiter: Arc<dyn RateLimiter>,
    flash: Arc<dyn FlashStore>,
    cache: Arc<dyn CacheStore>,
}

impl SubmissionService {
    /// Create the pipeline over its collaborators.
    pub fn new(
        repository: Arc<dyn FeedbackRepository>,
        rate_limiter: Arc<dyn RateLimiter>,
        flash: Arc<dyn FlashStore>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            repository,
            rate_limiter,
            flash,
            cache,
        }
    }

    /// Run the pipeline for one submission.
    ///
    /// # Errors
    ///
    /// - [`ErrorCode::RateLimited`](crate::domain::ErrorCode::RateLimited)
    ///   when the client's window budget is exhausted.
    /// - [`ErrorCode::InternalError`](crate::domain::ErrorCode::InternalError)
    ///   when the insert or the flash store fails; nothing is persisted.
    ///
    /// Validation failures are NOT errors: they produce
    /// [`SubmissionOutcome::Invalid`] with the raw input preserved for
    /// refill.
    pub async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionOutcome, Error> {
        self.enforce_rate_limit(request.client_key.as_deref()).await?;

        let sanitized = sanitize_fields(&request.name, &request.email, &request.message);
        let errors = validate_fields(&request.name, &request.email, &request.message, &sanitized);

        if !errors.is_empty() {
            let token = FlashToken::generate();
            let message = FlashMessage::ValidationFailure {
                errors,
                old_input: OldInput {
                    name: request.name,
                    email: request.email,
                    message: request.message,
                },
            };
            self.store_flash(&token, &message).await?;
            return Ok(SubmissionOutcome::Invalid {
                location: redirect_to(&request.redirect_path, "error_token", &token),
            });
        }

        let submission = NewFeedbackSubmission {
            name: sanitized.name,
            email: sanitized.email,
            message: sanitized.message,
        };
        let stored = self.repository.insert(&submission).await.map_err(|e| {
            error!(error = %e, "feedback insert failed");
            Error::internal("Failed to save feedback. Please try again.")
        })?;

        // Every cached list page and count may now be stale.
        if let Err(e) = self.cache.flush_group(cache_groups::LIST).await {
            warn!(error = %e, "list cache flush failed after insert");
        }

        let token = FlashToken::generate();
        self.store_flash(&token, &FlashMessage::Success).await?;
        info!(id = %stored.id, "feedback stored");
        Ok(SubmissionOutcome::Stored {
            location: redirect_to(&request.redirect_path, "feedback_token", &token),
        })
    }

    /// Deny once the window budget is spent. No resolvable client key, or a
    /// limiter outage, fail open: the limit is advisory.
    async fn enforce_rate_limit(&self, client_key: Option<&str>) -> Result<(), Error> {
        let Some(key) = client_key.filter(|key| !key.is_empty()) else {
            return Ok(());
        };
        match self.rate_limiter.check(key).await {
            Ok(decision) if decision.is_allowed() => Ok(()),
            Ok(_) => Err(Error::rate_limited(
                "Submission limit exceeded. Please try again later.",
            )),
            Err(e) => {
                warn!(error = %e, "rate limiter unavailable, allowing submission");
                Ok(())
            }
        }
    }

    async fn store_flash(&self, token: &FlashToken, message: &FlashMessage) -> Result<(), Error> {
        self.flash
            .put(token, message, message.ttl())
            .await
            .map_err(|e| Error::internal(format!("failed to store flash message: {e}")))
    }
}

/// Append the one-time token to the redirect path, dropping any query the
/// caller left behind.
fn redirect_to(path: &str, param: &str, token: &FlashToken) -> String {
    let base = path.split('?').next().unwrap_or_default();
    format!("{base}?{param}={token}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        MockCacheStore, MockFeedbackRepository, MockFlashStore, MockRateLimiter,
        RateLimitDecision, RateLimiterError,
    };
    use crate::domain::validation::EMAIL_INVALID;
    use crate::domain::{ErrorCode, FeedbackId, FeedbackSubmission, ReadStatus};
    use rstest::rstest;

    fn stored_row() -> FeedbackSubmission {
        FeedbackSubmission {
            id: FeedbackId::new(1).expect("positive"),
            name: "Jane Doe".to_owned(),
            email: "jane@example.com".to_owned(),
            message: "Great form.".to_owned(),
            created_at: chrono::Utc::now(),
            read_status: ReadStatus::Unread,
        }
    }

    fn valid_request() -> SubmissionRequest {
        SubmissionRequest {
            client_key: Some("203.0.113.7".to_owned()),
            name: "Jane Doe".to_owned(),
            email: "jane@example.com".to_owned(),
            message: "Great form.".to_owned(),
            redirect_path: "/feedback".to_owned(),
        }
    }

    fn service(
        repository: MockFeedbackRepository,
        rate_limiter: MockRateLimiter,
        flash: MockFlashStore,
        cache: MockCacheStore,
    ) -> SubmissionService {
        SubmissionService::new(
            Arc::new(repository),
            Arc::new(rate_limiter),
            Arc::new(flash),
            Arc::new(cache),
        )
    }

    #[tokio::test]
    async fn valid_submission_inserts_once_and_redirects_with_success_token() {
        let mut repository = MockFeedbackRepository::new();
        repository
            .expect_insert()
            .withf(|submission| {
                submission.name == "Jane Doe" && submission.email == "jane@example.com"
            })
            .times(1)
            .return_once(|_| Ok(stored_row()));

        let mut rate_limiter = MockRateLimiter::new();
        rate_limiter
            .expect_check()
            .times(1)
            .return_once(|_| Ok(RateLimitDecision::Allowed));

        let mut flash = MockFlashStore::new();
        flash
            .expect_put()
            .withf(|_, message, ttl| {
                matches!(message, FlashMessage::Success) && *ttl == crate::domain::flash::SUCCESS_TTL
            })
            .times(1)
            .return_once(|_, _, _| Ok(()));

        let mut cache = MockCacheStore::new();
        cache
            .expect_flush_group()
            .withf(|group| group == cache_groups::LIST)
            .times(1)
            .return_once(|_| Ok(()));

        let outcome = service(repository, rate_limiter, flash, cache)
            .submit(valid_request())
            .await
            .expect("pipeline succeeds");

        let SubmissionOutcome::Stored { location } = outcome else {
            panic!("expected a stored outcome");
        };
        let token = location
            .strip_prefix("/feedback?feedback_token=")
            .expect("redirect carries the success token");
        assert!(FlashToken::parse(token).is_ok());
    }

    #[tokio::test]
    async fn invalid_email_flashes_errors_and_raw_input_without_inserting() {
        let mut repository = MockFeedbackRepository::new();
        repository.expect_insert().times(0);

        let mut rate_limiter = MockRateLimiter::new();
        rate_limiter
            .expect_check()
            .times(1)
            .return_once(|_| Ok(RateLimitDecision::Allowed));

        let mut flash = MockFlashStore::new();
        flash
            .expect_put()
            .withf(|_, message, ttl| {
                let FlashMessage::ValidationFailure { errors, old_input } = message else {
                    return false;
                };
                errors == &vec![EMAIL_INVALID.to_owned()]
                    && old_input.name == "Al"
                    && old_input.email == "not-an-email"
                    && old_input.message == "hi"
                    && *ttl == crate::domain::flash::ERROR_TTL
            })
            .times(1)
            .return_once(|_, _, _| Ok(()));

        let cache = MockCacheStore::new();

        let request = SubmissionRequest {
            name: "Al".to_owned(),
            email: "not-an-email".to_owned(),
            message: "hi".to_owned(),
            ..valid_request()
        };
        let outcome = service(repository, rate_limiter, flash, cache)
            .submit(request)
            .await
            .expect("validation failures are not errors");

        let SubmissionOutcome::Invalid { location } = outcome else {
            panic!("expected an invalid outcome");
        };
        assert!(location.starts_with("/feedback?error_token="));
    }

    #[tokio::test]
    async fn denied_client_is_rejected_before_validation() {
        let mut repository = MockFeedbackRepository::new();
        repository.expect_insert().times(0);

        let mut rate_limiter = MockRateLimiter::new();
        rate_limiter
            .expect_check()
            .withf(|key| key == "203.0.113.7")
            .times(1)
            .return_once(|_| Ok(RateLimitDecision::Denied));

        let mut flash = MockFlashStore::new();
        flash.expect_put().times(0);

        let error = service(repository, rate_limiter, flash, MockCacheStore::new())
            .submit(valid_request())
            .await
            .expect_err("denied clients fail the request");
        assert_eq!(error.code(), ErrorCode::RateLimited);
    }

    #[tokio::test]
    async fn missing_client_key_skips_the_limiter_entirely() {
        let mut repository = MockFeedbackRepository::new();
        repository
            .expect_insert()
            .times(1)
            .return_once(|_| Ok(stored_row()));

        let mut rate_limiter = MockRateLimiter::new();
        rate_limiter.expect_check().times(0);

        let mut flash = MockFlashStore::new();
        flash.expect_put().times(1).return_once(|_, _, _| Ok(()));

        let mut cache = MockCacheStore::new();
        cache
            .expect_flush_group()
            .times(1)
            .return_once(|_| Ok(()));

        let request = SubmissionRequest {
            client_key: None,
            ..valid_request()
        };
        service(repository, rate_limiter, flash, cache)
            .submit(request)
            .await
            .expect("fail-open submission succeeds");
    }

    #[tokio::test]
    async fn limiter_outage_fails_open() {
        let mut repository = MockFeedbackRepository::new();
        repository
            .expect_insert()
            .times(1)
            .return_once(|_| Ok(stored_row()));

        let mut rate_limiter = MockRateLimiter::new();
        rate_limiter
            .expect_check()
            .times(1)
            .return_once(|_| Err(RateLimiterError::store("counter store down")));

        let mut flash = MockFlashStore::new();
        flash.expect_put().times(1).return_once(|_, _, _| Ok(()));

        let mut cache = MockCacheStore::new();
        cache
            .expect_flush_group()
            .times(1)
            .return_once(|_| Ok(()));

        service(repository, rate_limiter, flash, cache)
            .submit(valid_request())
            .await
            .expect("limiter outages must not block submissions");
    }

    #[tokio::test]
    async fn insert_failure_surfaces_as_internal_error() {
        use crate::domain::ports::FeedbackRepositoryError;

        let mut repository = MockFeedbackRepository::new();
        repository
            .expect_insert()
            .times(1)
            .return_once(|_| Err(FeedbackRepositoryError::query("constraint violation")));

        let mut rate_limiter = MockRateLimiter::new();
        rate_limiter
            .expect_check()
            .times(1)
            .return_once(|_| Ok(RateLimitDecision::Allowed));

        let mut flash = MockFlashStore::new();
        flash.expect_put().times(0);

        let error = service(repository, rate_limiter, flash, MockCacheStore::new())
            .submit(valid_request())
            .await
            .expect_err("storage failures are terminal");
        assert_eq!(error.code(), ErrorCode::InternalError);
    }

    #[rstest]
    #[case("/feedback", "/feedback?feedback_token=")]
    #[case("/feedback?paged=2&x=1", "/feedback?feedback_token=")]
    fn redirects_strip_any_existing_query(#[case] path: &str, #[case] prefix: &str) {
        let token = FlashToken::generate();
        let location = redirect_to(path, "feedback_token", &token);
        assert!(location.starts_with(prefix));
        assert!(!location.contains("paged"));
    }
}
