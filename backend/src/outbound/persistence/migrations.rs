//! Embedded schema migrations, run once at startup.
//!
//! The schema is versioned by the migration history, so the running code
//! never probes for column existence: after startup the table always has its
//! full shape.

use diesel::pg::PgConnection;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

/// Migrations compiled into the binary from `backend/migrations/`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Errors raised while applying migrations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    /// The database was unreachable.
    #[error("migration connection failed: {message}")]
    Connection {
        /// Underlying connection error text.
        message: String,
    },

    /// A migration failed to apply.
    #[error("migration failed: {message}")]
    Migration {
        /// Underlying migration error text.
        message: String,
    },
}

/// Apply any pending migrations against `database_url`.
///
/// Diesel's migration harness is synchronous, so the work runs on a blocking
/// thread.
///
/// # Errors
///
/// Returns [`MigrationError::Connection`] when the database is unreachable
/// and [`MigrationError::Migration`] when a migration fails to apply.
pub async fn run_migrations(database_url: &str) -> Result<(), MigrationError> {
    let url = database_url.to_owned();
    tokio::task::spawn_blocking(move || -> Result<(), MigrationError> {
        let mut conn = PgConnection::establish(&url).map_err(|e| MigrationError::Connection {
            message: e.to_string(),
        })?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| MigrationError::Migration {
                message: e.to_string(),
            })?;
        for version in applied {
            tracing::info!(%version, "applied migration");
        }
        Ok(())
    })
    .await
    .map_err(|e| MigrationError::Migration {
        message: format!("migration task panicked: {e}"),
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_errors_carry_their_message() {
        let err = MigrationError::Connection {
            message: "refused".to_owned(),
        };
        assert!(err.to_string().contains("refused"));
    }
}
