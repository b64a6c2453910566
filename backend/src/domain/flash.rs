//! One-time flash messages carried across the post-submit redirect.
//!
//! A successful or invalid submission stores a short-lived message under an
//! opaque token and redirects with the token in the query string. The form
//! renderer consumes the token exactly once; the store deletes the value on
//! first read.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifetime of a success flash.
pub const SUCCESS_TTL: Duration = Duration::from_secs(30);
/// Lifetime of a validation-failure flash.
pub const ERROR_TTL: Duration = Duration::from_secs(60);

/// Opaque 32-hex-character token keying a one-time flash message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlashToken(String);

/// Raised when a query-string token is not 32 hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("flash token must be 32 hexadecimal characters")]
pub struct InvalidFlashToken;

impl FlashToken {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Parse a token taken from a query string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFlashToken`] unless the input is exactly 32
    /// hexadecimal characters.
    pub fn parse(raw: &str) -> Result<Self, InvalidFlashToken> {
        if raw.len() == 32 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(raw.to_ascii_lowercase()))
        } else {
            Err(InvalidFlashToken)
        }
    }

    /// The token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FlashToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The raw field values echoed back into the form after a validation failure.
///
/// Deliberately the pre-sanitization input, so the submitter sees exactly
/// what they typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OldInput {
    /// Raw name field.
    pub name: String,
    /// Raw email field.
    pub email: String,
    /// Raw message field.
    pub message: String,
}

/// The value stored under a flash token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlashMessage {
    /// The submission was stored.
    Success,
    /// Validation failed; carries the errors and the raw input for refill.
    ValidationFailure {
        /// Every violated rule's message.
        errors: Vec<String>,
        /// Raw input for re-display.
        old_input: OldInput,
    },
}

impl FlashMessage {
    /// The lifetime this message should be stored for.
    pub const fn ttl(&self) -> Duration {
        match self {
            Self::Success => SUCCESS_TTL,
            Self::ValidationFailure { .. } => ERROR_TTL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn generated_tokens_parse_back() {
        let token = FlashToken::generate();
        assert_eq!(FlashToken::parse(token.as_str()), Ok(token));
    }

    #[rstest]
    #[case("short")]
    #[case("zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz")]
    #[case("")]
    fn malformed_tokens_are_rejected(#[case] raw: &str) {
        assert_eq!(FlashToken::parse(raw), Err(InvalidFlashToken));
    }

    #[rstest]
    fn ttl_depends_on_the_message_kind() {
        assert_eq!(FlashMessage::Success.ttl(), SUCCESS_TTL);
        let failure = FlashMessage::ValidationFailure {
            errors: vec!["nope".to_owned()],
            old_input: OldInput::default(),
        };
        assert_eq!(failure.ttl(), ERROR_TTL);
    }

    #[rstest]
    fn flash_messages_round_trip_through_json() {
        let failure = FlashMessage::ValidationFailure {
            errors: vec!["Please provide a valid name.".to_owned()],
            old_input: OldInput {
                name: "  ".to_owned(),
                email: "jane@example.com".to_owned(),
                message: "hi".to_owned(),
            },
        };
        let raw = serde_json::to_string(&failure).expect("serializable");
        let back: FlashMessage = serde_json::from_str(&raw).expect("deserializable");
        assert_eq!(back, failure);
    }
}
