//! Admin review handlers: paginated list, detail view, delete.
//!
//! ```text
//! GET /admin/feedback                      one page of submissions
//! GET /admin/feedback/view?feedback_id=    single submission, marks it read
//! GET /admin/feedback/delete?feedback_id=  delete + reindex, then redirect
//! ```
//!
//! Every route requires the session manage capability. The view and delete
//! links are guarded by id-scoped tokens issued with the list; delete
//! verifies its token against the RAW id string before parsing, so a
//! tampered id dies as a security failure, not a parse error.

use actix_web::http::header;
use actix_web::{get, web, HttpResponse};
use pagination::PageRequest;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::ports::{delete_action, view_action};
use crate::domain::{Error, FeedbackId, FeedbackSubmission};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Number of whitespace-separated words kept in a list excerpt.
const EXCERPT_WORDS: usize = 10;

/// Query parameters of the list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// 1-based page number; defaults to the first page.
    pub paged: Option<u32>,
}

/// Query parameters shared by the view and delete endpoints.
#[derive(Debug, Deserialize)]
pub struct TargetQuery {
    /// Raw submission id from the link.
    pub feedback_id: Option<String>,
    /// Id-scoped anti-forgery token from the link.
    pub token: Option<String>,
}

/// One row of the admin list.
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackListItem {
    /// Dense sequential id.
    pub id: i32,
    /// Submitter name.
    pub name: String,
    /// Submitter email.
    pub email: String,
    /// First words of the message.
    pub excerpt: String,
    /// RFC 3339 submission time.
    pub created_at: String,
    /// `unread` or `read`.
    pub status: String,
    /// Token for this row's view link.
    pub view_token: String,
    /// Token for this row's delete link.
    pub delete_token: String,
}

/// One page of the admin list plus pagination totals.
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackListResponse {
    /// Rows on this page, newest first.
    pub items: Vec<FeedbackListItem>,
    /// 1-based page number.
    pub page: u32,
    /// Page size used.
    pub per_page: u32,
    /// Total rows across all pages.
    pub total_items: u64,
    /// Total pages at this size.
    pub total_pages: u64,
    /// Rows still unread, for the menu badge.
    pub unread_count: u64,
}

/// Full detail of one submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackDetailResponse {
    /// Dense sequential id.
    pub id: i32,
    /// Submitter name.
    pub name: String,
    /// Submitter email.
    pub email: String,
    /// Full message body.
    pub message: String,
    /// RFC 3339 submission time.
    pub created_at: String,
    /// `unread` or `read`; the fetch itself flips unread rows to read.
    pub status: String,
    /// Token for the footer delete link.
    pub delete_token: String,
}

fn status_label(submission: &FeedbackSubmission) -> String {
    if submission.read_status.is_unread() {
        "unread".to_owned()
    } else {
        "read".to_owned()
    }
}

fn excerpt(message: &str) -> String {
    let words: Vec<&str> = message.split_whitespace().take(EXCERPT_WORDS + 1).collect();
    if words.len() > EXCERPT_WORDS {
        let mut trimmed = words
            .get(..EXCERPT_WORDS)
            .unwrap_or_default()
            .join(" ");
        trimmed.push_str("...");
        trimmed
    } else {
        words.join(" ")
    }
}

fn list_item(state: &HttpState, submission: FeedbackSubmission) -> FeedbackListItem {
    let raw_id = submission.id.to_string();
    FeedbackListItem {
        id: submission.id.get(),
        status: status_label(&submission),
        excerpt: excerpt(&submission.message),
        created_at: submission.created_at.to_rfc3339(),
        view_token: state.form_tokens.issue(&view_action(&raw_id)),
        delete_token: state.form_tokens.issue(&delete_action(&raw_id)),
        name: submission.name,
        email: submission.email,
    }
}

/// List one page of submissions.
#[utoipa::path(
    get,
    path = "/admin/feedback",
    params(("paged" = Option<u32>, Query, description = "1-based page number")),
    responses(
        (status = 200, description = "One page of submissions", body = FeedbackListResponse),
        (status = 403, description = "Manage capability missing")
    ),
    tags = ["admin"],
    operation_id = "listFeedback"
)]
#[get("/admin/feedback")]
pub async fn list_feedback(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ListQuery>,
) -> ApiResult<web::Json<FeedbackListResponse>> {
    session.require_manage()?;

    let request = PageRequest::new(
        query.paged.unwrap_or(1),
        PageRequest::DEFAULT_PER_PAGE,
    )
    .map_err(|e| Error::invalid_request(e.to_string()))?;

    let page = state.admin.list_page(request).await?;
    let unread_count = state.admin.unread_count().await?;

    let response = FeedbackListResponse {
        page: page.page,
        per_page: page.per_page,
        total_items: page.total_items,
        total_pages: page.total_pages,
        unread_count,
        items: page
            .items
            .into_iter()
            .map(|submission| list_item(&state, submission))
            .collect(),
    };
    Ok(web::Json(response))
}

/// View a single submission, marking it read.
#[utoipa::path(
    get,
    path = "/admin/feedback/view",
    params(
        ("feedback_id" = Option<String>, Query, description = "Submission id"),
        ("token" = Option<String>, Query, description = "View-scoped token")
    ),
    responses(
        (status = 200, description = "Submission detail", body = FeedbackDetailResponse),
        (status = 400, description = "Missing or invalid id"),
        (status = 403, description = "Bad token or manage capability missing"),
        (status = 404, description = "No such submission")
    ),
    tags = ["admin"],
    operation_id = "viewFeedback"
)]
#[get("/admin/feedback/view")]
pub async fn view_feedback(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<TargetQuery>,
) -> ApiResult<web::Json<FeedbackDetailResponse>> {
    session.require_manage()?;

    let query = query.into_inner();
    let (Some(raw_id), Some(token)) = (query.feedback_id, query.token) else {
        return Err(Error::invalid_request("Invalid feedback ID").into());
    };
    if !state.form_tokens.verify(&token, &view_action(&raw_id)) {
        return Err(Error::forbidden("Security check failed").into());
    }
    let id: FeedbackId = raw_id
        .parse()
        .map_err(|_| Error::invalid_request("Invalid feedback ID"))?;

    let submission = state.admin.get_and_mark_read(id).await?;
    let response = FeedbackDetailResponse {
        id: submission.id.get(),
        status: status_label(&submission),
        created_at: submission.created_at.to_rfc3339(),
        delete_token: state.form_tokens.issue(&delete_action(&raw_id)),
        name: submission.name,
        email: submission.email,
        message: submission.message,
    };
    Ok(web::Json(response))
}

/// Delete a submission and reindex the survivors, then redirect to the list.
#[utoipa::path(
    get,
    path = "/admin/feedback/delete",
    params(
        ("feedback_id" = Option<String>, Query, description = "Submission id"),
        ("token" = Option<String>, Query, description = "Delete-scoped token")
    ),
    responses(
        (status = 302, description = "Redirect to the list with deleted=1 or error=1"),
        (status = 403, description = "Bad token or manage capability missing")
    ),
    tags = ["admin"],
    operation_id = "deleteFeedback"
)]
#[get("/admin/feedback/delete")]
pub async fn delete_feedback(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<TargetQuery>,
) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    // The token is bound to the raw id string; verify before parsing.
    let raw_id = query.feedback_id.unwrap_or_default();
    let token = query.token.unwrap_or_default();
    if !state.form_tokens.verify(&token, &delete_action(&raw_id)) {
        return Err(Error::forbidden("Security check failed").into());
    }
    session.require_manage()?;

    let outcome = match raw_id.parse::<FeedbackId>() {
        Ok(id) => state.admin.delete(id).await,
        Err(e) => Err(Error::invalid_request(e.to_string())),
    };

    let location = match outcome {
        Ok(()) => "/admin/feedback?deleted=1",
        Err(e) => {
            error!(error = %e, raw_id = %raw_id, "feedback delete failed");
            "/admin/feedback?error=1"
        }
    };
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish())
}
