//! Internal Diesel row structs for database operations.
//!
//! Implementation details of the persistence layer; never exposed to the
//! domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::feedback_submissions;

/// Row struct for reading from the feedback_submissions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = feedback_submissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FeedbackRow {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read_status: i16,
}

/// Insertable struct for creating feedback records.
///
/// `id` and `created_at` come from the database (sequence and `now()`).
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = feedback_submissions)]
pub(crate) struct NewFeedbackRow<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub message: &'a str,
    pub read_status: i16,
}
