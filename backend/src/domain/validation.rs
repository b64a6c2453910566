//! Field validation for the submission pipeline.
//!
//! Every violated rule is reported, not just the first. Length ceilings are
//! checked against the RAW byte length, emptiness against the sanitized
//! value; that ordering is what stops sanitization-stripped characters from
//! defeating the ceilings.

use super::sanitize;

/// Raw byte ceiling for the name field.
pub const MAX_NAME_BYTES: usize = 100;
/// Raw byte ceiling for the email field.
pub const MAX_EMAIL_BYTES: usize = 100;
/// Raw byte ceiling for the message field.
pub const MAX_MESSAGE_BYTES: usize = 1000;

/// Error shown when the raw name exceeds its ceiling.
pub const NAME_TOO_LONG: &str = "Please provide a valid name (maximum 100 characters).";
/// Error shown when the sanitized name is empty.
pub const NAME_REQUIRED: &str = "Please provide a valid name.";
/// Error shown when the email is over-long or fails the format check.
pub const EMAIL_INVALID: &str =
    "Please provide a valid email address (maximum 100 characters).";
/// Error shown when the raw message exceeds its ceiling.
pub const MESSAGE_TOO_LONG: &str = "Please provide a message (maximum 1000 characters).";
/// Error shown when the sanitized message is empty.
pub const MESSAGE_REQUIRED: &str = "Please provide a message.";

/// The three submitted fields after sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedFields {
    /// Cleaned single-line name.
    pub name: String,
    /// Cleaned email address.
    pub email: String,
    /// Cleaned multi-line message.
    pub message: String,
}

/// Apply the per-field cleaning rules.
pub fn sanitize_fields(raw_name: &str, raw_email: &str, raw_message: &str) -> SanitizedFields {
    SanitizedFields {
        name: sanitize::text_field(raw_name),
        email: sanitize::email_field(raw_email),
        message: sanitize::textarea_field(raw_message),
    }
}

/// Check the submitted fields, returning every violated rule's message.
///
/// An empty vector means the submission is valid.
pub fn validate_fields(
    raw_name: &str,
    raw_email: &str,
    raw_message: &str,
    sanitized: &SanitizedFields,
) -> Vec<String> {
    let mut errors = Vec::new();

    if raw_name.len() > MAX_NAME_BYTES {
        errors.push(NAME_TOO_LONG.to_owned());
    } else if sanitized.name.is_empty() {
        errors.push(NAME_REQUIRED.to_owned());
    }

    if raw_email.len() > MAX_EMAIL_BYTES || !sanitize::is_valid_email(&sanitized.email) {
        errors.push(EMAIL_INVALID.to_owned());
    }

    if raw_message.len() > MAX_MESSAGE_BYTES {
        errors.push(MESSAGE_TOO_LONG.to_owned());
    } else if sanitized.message.is_empty() {
        errors.push(MESSAGE_REQUIRED.to_owned());
    }

    errors
}
