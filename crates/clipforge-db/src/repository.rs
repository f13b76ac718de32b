//! Postgres video repository.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;

use async_trait::async_trait;

use clipforge_models::{VideoRecord, VideoStatus};

use crate::error::{DbError, DbResult};
use crate::VideoRepository;

const FIND_BY_ID: &str = r#"
SELECT id,
       user_id,
       raw_video_id,
       processed_video_id,
       title,
       status,
       uploaded_at,
       processed_at,
       original_url,
       processed_url,
       votes
FROM "VIDEO"
WHERE id = $1"#;

const UPDATE: &str = r#"
UPDATE "VIDEO"
SET status = $2,
    processed_video_id = $3,
    processed_url = $4,
    processed_at = $5
WHERE id = $1"#;

/// Video repository on a shared Postgres pool.
#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    async fn find_by_id(&self, id: &str) -> DbResult<VideoRecord> {
        let row = sqlx::query(FIND_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(id))?;

        map_row(&row)
    }

    async fn update(&self, video: &VideoRecord) -> DbResult<()> {
        // Empty strings never reach the database; options carry the nulls.
        sqlx::query(UPDATE)
            .bind(&video.id)
            .bind(video.status.as_str())
            .bind(video.processed_video_id.as_deref())
            .bind(video.processed_url.as_deref())
            .bind(video.processed_at)
            .execute(&self.pool)
            .await?;

        debug!(video_id = %video.id, status = %video.status, "updated video row");
        Ok(())
    }
}

fn map_row(row: &PgRow) -> DbResult<VideoRecord> {
    let status: String = row.try_get("status")?;
    let processed_at: Option<DateTime<Utc>> = row.try_get("processed_at")?;

    Ok(VideoRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        raw_video_id: row.try_get("raw_video_id")?,
        processed_video_id: row.try_get("processed_video_id")?,
        title: row.try_get("title")?,
        status: VideoStatus::from_db(&status),
        uploaded_at: row.try_get("uploaded_at")?,
        processed_at,
        original_url: row.try_get("original_url")?,
        processed_url: row.try_get("processed_url")?,
        votes: row.try_get("votes")?,
    })
}
