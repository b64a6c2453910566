//! PostgreSQL persistence: connection pool, schema, and the Diesel-backed
//! feedback repository.

mod diesel_feedback_repository;
mod migrations;
mod models;
mod pool;
pub(crate) mod schema;

pub use diesel_feedback_repository::DieselFeedbackRepository;
pub use migrations::{run_migrations, MigrationError};
pub use pool::{DbPool, PoolConfig, PoolError};
