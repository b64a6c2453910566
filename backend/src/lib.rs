//! Feedback backend library modules.
//!
//! A small HTTP service that collects visitor feedback through a public form
//! endpoint and exposes a paginated admin list/detail/delete surface over a
//! single PostgreSQL table.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
/// Request-id middleware attached to every route.
pub use middleware::request_id::RequestTrace;
