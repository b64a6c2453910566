//! PostgreSQL-backed `FeedbackRepository` implementation using Diesel.
//!
//! Hosts the one operation that needs real care: the reindexing delete,
//! which must commit the row deletion, the dense renumbering of every
//! survivor, and the sequence reset together or not at all.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{FeedbackRepository, FeedbackRepositoryError};
use crate::domain::{FeedbackId, FeedbackSubmission, NewFeedbackSubmission, ReadStatus};

use super::models::{FeedbackRow, NewFeedbackRow};
use super::pool::{DbPool, PoolError};
use super::schema::feedback_submissions;

/// Renumber every surviving row to its creation-order ordinal, negated.
///
/// The remap is split into two statements because a single UPDATE may apply
/// row updates in any order: assigning `5 -> 4` while another row still
/// holds 4 would trip the primary-key constraint mid-statement. Negative
/// intermediates can never collide with real ids.
const REINDEX_ASSIGN_SQL: &str = "\
WITH renumbered AS (
    SELECT id, ROW_NUMBER() OVER (ORDER BY created_at ASC, id ASC) AS new_id
    FROM feedback_submissions
)
UPDATE feedback_submissions AS f
SET id = -r.new_id
FROM renumbered AS r
WHERE f.id = r.id";

/// Flip the negated intermediates to their final dense ids.
const REINDEX_FLIP_SQL: &str = "UPDATE feedback_submissions SET id = -id WHERE id < 0";

/// Point the id sequence at the next free ordinal.
const RESET_SEQUENCE_SQL: &str =
    "SELECT setval(pg_get_serial_sequence('feedback_submissions', 'id'), $1, false)";

/// Diesel-backed implementation of the `FeedbackRepository` port.
#[derive(Clone)]
pub struct DieselFeedbackRepository {
    pool: DbPool,
}

impl DieselFeedbackRepository {
    /// Create a repository over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> FeedbackRepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            FeedbackRepositoryError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> FeedbackRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => FeedbackRepositoryError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            FeedbackRepositoryError::connection("database connection error")
        }
        _ => FeedbackRepositoryError::query("database error"),
    }
}

fn row_to_submission(row: FeedbackRow) -> Result<FeedbackSubmission, FeedbackRepositoryError> {
    let id = FeedbackId::new(row.id)
        .map_err(|e| FeedbackRepositoryError::query(format!("stored id {}: {e}", row.id)))?;
    Ok(FeedbackSubmission {
        id,
        name: row.name,
        email: row.email,
        message: row.message,
        created_at: row.created_at,
        read_status: ReadStatus::from_flag(row.read_status),
    })
}

fn count_to_u64(count: i64) -> Result<u64, FeedbackRepositoryError> {
    u64::try_from(count)
        .map_err(|_| FeedbackRepositoryError::query(format!("negative row count {count}")))
}

#[async_trait]
impl FeedbackRepository for DieselFeedbackRepository {
    async fn insert(
        &self,
        submission: &NewFeedbackSubmission,
    ) -> Result<FeedbackSubmission, FeedbackRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewFeedbackRow {
            name: &submission.name,
            email: &submission.email,
            message: &submission.message,
            read_status: ReadStatus::Unread.as_flag(),
        };

        let row: FeedbackRow = diesel::insert_into(feedback_submissions::table)
            .values(&new_row)
            .returning(FeedbackRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        row_to_submission(row)
    }

    async fn find_by_id(
        &self,
        id: FeedbackId,
    ) -> Result<Option<FeedbackSubmission>, FeedbackRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<FeedbackRow> = feedback_submissions::table
            .filter(feedback_submissions::id.eq(id.get()))
            .select(FeedbackRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_submission).transpose()
    }

    async fn list_page(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<FeedbackSubmission>, FeedbackRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<FeedbackRow> = feedback_submissions::table
            .order((
                feedback_submissions::created_at.desc(),
                feedback_submissions::id.desc(),
            ))
            .offset(offset)
            .limit(limit)
            .select(FeedbackRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_submission).collect()
    }

    async fn count(&self) -> Result<u64, FeedbackRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let count: i64 = feedback_submissions::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        count_to_u64(count)
    }

    async fn unread_count(&self) -> Result<u64, FeedbackRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let count: i64 = feedback_submissions::table
            .filter(feedback_submissions::read_status.eq(ReadStatus::Unread.as_flag()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        count_to_u64(count)
    }

    async fn mark_read(&self, id: FeedbackId) -> Result<(), FeedbackRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(feedback_submissions::table.filter(feedback_submissions::id.eq(id.get())))
            .set(feedback_submissions::read_status.eq(ReadStatus::Read.as_flag()))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn delete_and_reindex(&self, id: FeedbackId) -> Result<(), FeedbackRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let target = id.get();

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::delete(
                    feedback_submissions::table.filter(feedback_submissions::id.eq(target)),
                )
                .execute(conn)
                .await?;

                let remaining: i64 = feedback_submissions::table.count().get_result(conn).await?;

                diesel::sql_query(REINDEX_ASSIGN_SQL).execute(conn).await?;
                diesel::sql_query(REINDEX_FLIP_SQL).execute(conn).await?;
                diesel::sql_query(RESET_SEQUENCE_SQL)
                    .bind::<diesel::sql_types::BigInt, _>(remaining + 1)
                    .execute(conn)
                    .await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|e| FeedbackRepositoryError::transaction(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the error and row mappings; the reindex SQL
    //! itself is exercised against a live database by operational tooling.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_errors_map_to_connection_errors() {
        let repo_err = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(
            repo_err,
            FeedbackRepositoryError::Connection { .. }
        ));
        assert!(repo_err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn diesel_not_found_maps_to_query_error() {
        let repo_err = map_diesel_error(diesel::result::Error::NotFound);
        assert!(matches!(repo_err, FeedbackRepositoryError::Query { .. }));
        assert!(repo_err.to_string().contains("record not found"));
    }

    #[rstest]
    fn rows_convert_to_domain_submissions() {
        let row = FeedbackRow {
            id: 3,
            name: "Jane".to_owned(),
            email: "jane@example.com".to_owned(),
            message: "hi".to_owned(),
            created_at: chrono::Utc::now(),
            read_status: 0,
        };

        let submission = row_to_submission(row).expect("valid row");
        assert_eq!(submission.id.get(), 3);
        assert!(submission.read_status.is_unread());
    }

    #[rstest]
    fn corrupt_row_ids_are_query_errors() {
        let row = FeedbackRow {
            id: 0,
            name: String::new(),
            email: String::new(),
            message: String::new(),
            created_at: chrono::Utc::now(),
            read_status: 1,
        };

        let error = row_to_submission(row).expect_err("id 0 is invalid");
        assert!(matches!(error, FeedbackRepositoryError::Query { .. }));
    }

    #[rstest]
    fn reindex_statements_renumber_in_creation_order() {
        assert!(REINDEX_ASSIGN_SQL.contains("ORDER BY created_at ASC, id ASC"));
        assert!(REINDEX_ASSIGN_SQL.contains("SET id = -r.new_id"));
        assert!(RESET_SEQUENCE_SQL.contains("setval"));
    }
}
