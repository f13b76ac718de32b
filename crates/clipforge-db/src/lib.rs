//! Video row persistence.
//!
//! The worker performs exactly two operations against the video table:
//! a single-row read by id and a single-statement update of the processed
//! columns. Rows are created and deleted by the upload API, never here.

pub mod error;
pub mod repository;

use async_trait::async_trait;

use clipforge_models::VideoRecord;

pub use error::{DbError, DbResult};
pub use repository::PgVideoRepository;

/// Contract for reading and updating video rows.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Fetch the full record, or [`DbError::NotFound`].
    async fn find_by_id(&self, id: &str) -> DbResult<VideoRecord>;

    /// Write status and the processed columns in one statement. The caller
    /// supplies the target state; no read-modify-write.
    async fn update(&self, video: &VideoRecord) -> DbResult<()>;
}

/// Open a connection pool and verify the database is reachable.
pub async fn connect(dsn: &str) -> DbResult<sqlx::PgPool> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(dsn)
        .await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(pool)
}
