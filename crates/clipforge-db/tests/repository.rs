//! Postgres repository integration tests.
//!
//! The table is owned by the upload API; these tests assume its schema is
//! already present and seed their own rows.

use chrono::Utc;

use clipforge_db::{DbError, PgVideoRepository, VideoRepository};
use clipforge_models::{VideoRecord, VideoStatus};

async fn repository() -> (sqlx::PgPool, PgVideoRepository) {
    dotenvy::dotenv().ok();
    let dsn = std::env::var("POSTGRES_DSN").expect("POSTGRES_DSN set");
    let pool = clipforge_db::connect(&dsn).await.expect("connect");
    (pool.clone(), PgVideoRepository::new(pool))
}

async fn seed(pool: &sqlx::PgPool, id: &str) {
    sqlx::query(
        r#"INSERT INTO "VIDEO"
           (id, user_id, raw_video_id, title, status, uploaded_at, original_url, votes)
           VALUES ($1, 'u-1', 'raw-1', 'clip', 'uploaded', $2, 'src/a.mp4', 0)
           ON CONFLICT (id) DO NOTHING"#,
    )
    .bind(id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("seed row");
}

fn test_id() -> String {
    format!("it-{}", std::process::id())
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_find_missing_row_is_not_found() {
    let (_pool, repo) = repository().await;
    let err = repo.find_by_id("does-not-exist").await.unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_update_round_trips_processed_fields() {
    let (pool, repo) = repository().await;
    let id = test_id();
    seed(&pool, &id).await;

    let mut video: VideoRecord = repo.find_by_id(&id).await.expect("find");
    assert_eq!(video.status, VideoStatus::Uploaded);

    video.mark_processed(Utc::now(), "p-1", "p-1.mp4");
    repo.update(&video).await.expect("update");

    let stored = repo.find_by_id(&id).await.expect("find again");
    assert_eq!(stored.status, VideoStatus::Processed);
    assert_eq!(stored.processed_video_id.as_deref(), Some("p-1"));
    assert_eq!(stored.processed_url.as_deref(), Some("p-1.mp4"));
    assert!(stored.processed_at.is_some());

    // Successive updates converge to the last written value.
    video.reset_to_uploaded();
    repo.update(&video).await.expect("reset");
    let stored = repo.find_by_id(&id).await.expect("find reset");
    assert_eq!(stored.status, VideoStatus::Uploaded);
    assert!(stored.processed_video_id.is_none());
    assert!(stored.processed_url.is_none());
    assert!(stored.processed_at.is_none());
}
