//! Domain types, ports, and services for the feedback backend.
//!
//! Everything here is transport agnostic: inbound adapters translate
//! [`Error`] values into HTTP responses, and outbound adapters implement the
//! traits under [`ports`]. The two driving services are
//! [`SubmissionService`] (the public form pipeline) and
//! [`AdminFeedbackService`] (list/detail/delete with read-through caching).

pub mod admin_service;
pub mod error;
pub mod flash;
pub mod ports;
pub mod sanitize;
pub mod submission;
pub mod submission_service;
pub mod validation;

pub use self::admin_service::AdminFeedbackService;
pub use self::error::{Error, ErrorCode};
pub use self::flash::{FlashMessage, FlashToken, InvalidFlashToken, OldInput};
pub use self::submission::{
    FeedbackId, FeedbackSubmission, InvalidFeedbackId, NewFeedbackSubmission, ReadStatus,
};
pub use self::submission_service::{SubmissionOutcome, SubmissionRequest, SubmissionService};

/// Convenient result alias for fallible domain operations.
pub type DomainResult<T> = Result<T, Error>;
