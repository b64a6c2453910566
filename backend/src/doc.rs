//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] generates the OpenAPI specification for the REST surface:
//! the public form endpoints, the admin review endpoints, and the health
//! probes. Swagger UI serves it in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ErrorCode;
use crate::inbound::http::admin::{
    FeedbackDetailResponse, FeedbackListItem, FeedbackListResponse,
};
use crate::inbound::http::error::ApiError;
use crate::inbound::http::feedback::{FeedbackForm, FormStateResponse, OldInputDto};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie carrying the admin manage capability.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Feedback backend API",
        description = "Public feedback form submission plus an admin review surface."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::feedback::submit_feedback,
        crate::inbound::http::feedback::form_state,
        crate::inbound::http::admin::list_feedback,
        crate::inbound::http::admin::view_feedback,
        crate::inbound::http::admin::delete_feedback,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ApiError,
        ErrorCode,
        FeedbackForm,
        FormStateResponse,
        OldInputDto,
        FeedbackListResponse,
        FeedbackListItem,
        FeedbackDetailResponse,
    )),
    tags(
        (name = "feedback", description = "Public feedback form"),
        (name = "admin", description = "Admin review surface"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/feedback",
            "/feedback/form",
            "/admin/feedback",
            "/admin/feedback/view",
            "/admin/feedback/delete",
            "/health/ready",
            "/health/live",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing path {path}");
        }
    }
}
