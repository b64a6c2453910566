//! Diesel table definitions for the PostgreSQL schema.
//!
//! Must match the embedded migrations exactly; regenerate with
//! `diesel print-schema` after a migration changes the table.

diesel::table! {
    /// Visitor feedback submissions.
    ///
    /// `id` is a `SERIAL` primary key kept densely sequential by the
    /// repository's delete/reindex routine.
    feedback_submissions (id) {
        /// Dense sequential primary key.
        id -> Int4,
        /// Sanitized submitter name (max 100 characters).
        #[max_length = 100]
        name -> Varchar,
        /// Sanitized submitter email (max 100 characters).
        #[max_length = 100]
        email -> Varchar,
        /// Sanitized message body.
        message -> Text,
        /// Insert timestamp, set by the database.
        created_at -> Timestamptz,
        /// 0 = unread, 1 = read.
        read_status -> Int2,
    }
}
