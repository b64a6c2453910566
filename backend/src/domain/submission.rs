//! Feedback submission entity and its identifier.
//!
//! ## Invariants
//! - Ids are positive and, immediately after any delete, densely sequential
//!   in creation order (the repository's delete/reindex renumbers survivors).
//!   An id is therefore a display ordinal, not a stable external reference.
//! - `read_status` only ever transitions unread → read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a stored feedback submission.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FeedbackId(i32);

/// Raised when an id is zero or negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("feedback id must be a positive integer")]
pub struct InvalidFeedbackId;

impl FeedbackId {
    /// Validate a raw database id.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFeedbackId`] when `raw` is not positive.
    pub fn new(raw: i32) -> Result<Self, InvalidFeedbackId> {
        if raw <= 0 {
            return Err(InvalidFeedbackId);
        }
        Ok(Self(raw))
    }

    /// The underlying integer value.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for FeedbackId {
    type Err = InvalidFeedbackId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i32 = s.trim().parse().map_err(|_| InvalidFeedbackId)?;
        Self::new(raw)
    }
}

/// Whether a submission has been opened in the admin detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStatus {
    /// Never opened; shown as "New" in the admin list.
    Unread,
    /// Opened at least once.
    Read,
}

impl ReadStatus {
    /// Decode the stored integer flag (0 = unread, anything else = read).
    pub const fn from_flag(flag: i16) -> Self {
        if flag == 0 { Self::Unread } else { Self::Read }
    }

    /// Encode as the stored integer flag.
    pub const fn as_flag(self) -> i16 {
        match self {
            Self::Unread => 0,
            Self::Read => 1,
        }
    }

    /// True when the submission has not been opened yet.
    pub const fn is_unread(self) -> bool {
        matches!(self, Self::Unread)
    }
}

/// A stored feedback submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    /// Dense sequential identifier.
    pub id: FeedbackId,
    /// Sanitized submitter name, 1–100 characters.
    pub name: String,
    /// Sanitized submitter email, 1–100 characters, format checked.
    pub email: String,
    /// Sanitized message body, 1–1000 characters.
    pub message: String,
    /// Set by the database at insert time; immutable.
    pub created_at: DateTime<Utc>,
    /// Flips to read on first detail view.
    pub read_status: ReadStatus,
}

/// A validated, sanitized submission ready for insertion.
///
/// Constructed only by the submission pipeline after validation has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedbackSubmission {
    /// Sanitized submitter name.
    pub name: String,
    /// Sanitized submitter email.
    pub email: String,
    /// Sanitized message body.
    pub message: String,
}
