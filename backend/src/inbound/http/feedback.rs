//! Public feedback form handlers.
//!
//! ```text
//! POST /feedback        submit the form, redirect with a one-time token
//! GET  /feedback/form   consume redirect tokens, issue a fresh form nonce
//! ```
//!
//! The two anti-forgery steps of the pipeline live here: a post without the
//! nonce field is a deliberate silent no-op, and a post with a bad nonce is
//! refused outright. Everything after that is the submission service.

use actix_web::http::header;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::SUBMIT_FEEDBACK_ACTION;
use crate::domain::{Error, FlashMessage, FlashToken, OldInput, SubmissionRequest};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Urlencoded body of the public feedback form.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FeedbackForm {
    /// Submitter name.
    pub name: Option<String>,
    /// Submitter email.
    pub email: Option<String>,
    /// Feedback message.
    pub message: Option<String>,
    /// Anti-forgery token issued with the form.
    pub feedback_nonce: Option<String>,
}

/// Query parameters of the form-state endpoint.
#[derive(Debug, Deserialize)]
pub struct FormStateQuery {
    /// Success token from a post-submit redirect.
    pub feedback_token: Option<String>,
    /// Error token from a post-submit redirect.
    pub error_token: Option<String>,
}

/// Raw field values echoed back after a validation failure.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct OldInputDto {
    /// Raw name field.
    pub name: String,
    /// Raw email field.
    pub email: String,
    /// Raw message field.
    pub message: String,
}

impl From<OldInput> for OldInputDto {
    fn from(value: OldInput) -> Self {
        Self {
            name: value.name,
            email: value.email,
            message: value.message,
        }
    }
}

/// Everything the renderer needs to draw the form.
#[derive(Debug, Serialize, ToSchema)]
pub struct FormStateResponse {
    /// Fresh anti-forgery token for the next submission.
    pub nonce: String,
    /// True when a success token was consumed.
    pub success: bool,
    /// Validation errors from a consumed error token.
    pub errors: Vec<String>,
    /// Raw input from a consumed error token, for refill.
    pub old_input: OldInputDto,
}

/// Accept a feedback form submission.
#[utoipa::path(
    post,
    path = "/feedback",
    request_body(content = FeedbackForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Redirect carrying a success or error token"),
        (status = 204, description = "Not a recognised form post; deliberately ignored"),
        (status = 403, description = "Anti-forgery verification failed"),
        (status = 429, description = "Submission limit exceeded"),
        (status = 500, description = "Storage failure; nothing persisted")
    ),
    tags = ["feedback"],
    operation_id = "submitFeedback"
)]
#[post("/feedback")]
pub async fn submit_feedback(
    state: web::Data<HttpState>,
    request: HttpRequest,
    form: web::Form<FeedbackForm>,
) -> ApiResult<HttpResponse> {
    let form = form.into_inner();

    // Posts without the nonce field are not ours to handle.
    let Some(nonce) = form.feedback_nonce else {
        return Ok(HttpResponse::NoContent().finish());
    };
    if !state.form_tokens.verify(&nonce, SUBMIT_FEEDBACK_ACTION) {
        return Err(Error::forbidden("Security check failed").into());
    }

    let outcome = state
        .submissions
        .submit(SubmissionRequest {
            client_key: client_key(&request),
            name: form.name.unwrap_or_default(),
            email: form.email.unwrap_or_default(),
            message: form.message.unwrap_or_default(),
            redirect_path: safe_redirect_path(request.path()),
        })
        .await?;

    Ok(redirect(outcome.location()))
}

/// Report the one-time state for rendering the form.
#[utoipa::path(
    get,
    path = "/feedback/form",
    params(
        ("feedback_token" = Option<String>, Query, description = "Success token to consume"),
        ("error_token" = Option<String>, Query, description = "Error token to consume")
    ),
    responses(
        (status = 200, description = "Form state", body = FormStateResponse),
        (status = 500, description = "Flash store failure")
    ),
    tags = ["feedback"],
    operation_id = "feedbackFormState"
)]
#[get("/feedback/form")]
pub async fn form_state(
    state: web::Data<HttpState>,
    query: web::Query<FormStateQuery>,
) -> ApiResult<web::Json<FormStateResponse>> {
    let query = query.into_inner();
    let mut response = FormStateResponse {
        nonce: state.form_tokens.issue(SUBMIT_FEEDBACK_ACTION),
        success: false,
        errors: Vec::new(),
        old_input: OldInputDto::default(),
    };

    // Malformed tokens are ignored the same way unknown ones are: the form
    // simply renders without a message.
    if let Some(token) = query.feedback_token.as_deref().and_then(parse_token) {
        if let Some(FlashMessage::Success) = take_flash(&state, &token).await? {
            response.success = true;
        }
    }

    if let Some(token) = query.error_token.as_deref().and_then(parse_token) {
        if let Some(FlashMessage::ValidationFailure { errors, old_input }) =
            take_flash(&state, &token).await?
        {
            response.errors = errors;
            response.old_input = old_input.into();
        }
    }

    Ok(web::Json(response))
}

fn parse_token(raw: &str) -> Option<FlashToken> {
    FlashToken::parse(raw).ok()
}

async fn take_flash(
    state: &web::Data<HttpState>,
    token: &FlashToken,
) -> Result<Option<FlashMessage>, Error> {
    state
        .flash
        .take(token)
        .await
        .map_err(|e| Error::internal(format!("flash store failed: {e}")))
}

/// Resolve the client key the rate limiter counts by. `None` (no resolvable
/// peer address) fail-opens downstream.
pub(crate) fn client_key(request: &HttpRequest) -> Option<String> {
    request
        .connection_info()
        .realip_remote_addr()
        .map(str::to_owned)
}

/// Reduce the redirect target to a same-host path, mirroring safe-redirect
/// behaviour: anything that parses as an absolute URL loses its origin, and
/// any query string is dropped.
pub(crate) fn safe_redirect_path(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(absolute) => absolute.path().to_owned(),
        Err(_) => {
            let path = raw.split('?').next().unwrap_or_default();
            if path.is_empty() {
                "/".to_owned()
            } else {
                path.to_owned()
            }
        }
    }
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/feedback", "/feedback")]
    #[case("/feedback?paged=2", "/feedback")]
    #[case("https://evil.example/phish?x=1", "/phish")]
    #[case("", "/")]
    fn redirect_targets_are_reduced_to_paths(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(safe_redirect_path(raw), expected);
    }
}
