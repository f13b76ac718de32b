//! Redis Streams backend integration tests.

use std::time::Duration;

use clipforge_queue::{QueueError, RedisStreamQueue, TaskQueue};

async fn queue(stream: &str, consumer: &str, max_deliveries: u32) -> RedisStreamQueue {
    dotenvy::dotenv().ok();
    let addr = std::env::var("REDIS_ADDR").unwrap_or_else(|_| "localhost:6379".to_string());
    let client = redis::Client::open(format!("redis://{addr}")).expect("redis client");
    RedisStreamQueue::new(
        client,
        stream,
        "clipforge-test-group",
        consumer,
        Duration::from_millis(200),
        max_deliveries,
    )
    .await
    .expect("create queue")
}

async fn enqueue(stream: &str, fields: &[(&str, &str)]) {
    let addr = std::env::var("REDIS_ADDR").unwrap_or_else(|_| "localhost:6379".to_string());
    let client = redis::Client::open(format!("redis://{addr}")).expect("redis client");
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .expect("connect");
    let mut cmd = redis::cmd("XADD");
    cmd.arg(stream).arg("*");
    for (field, value) in fields {
        cmd.arg(*field).arg(*value);
    }
    cmd.query_async::<String>(&mut conn).await.expect("xadd");
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_group_creation_is_idempotent() {
    let stream = format!("clipforge-test-{}", uuid::Uuid::new_v4());
    queue(&stream, "c1", 5).await;
    // A second construction against the same stream must not error.
    queue(&stream, "c2", 5).await;
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_fetch_ack_removes_message() {
    let stream = format!("clipforge-test-{}", uuid::Uuid::new_v4());
    let q = queue(&stream, "c1", 5).await;

    enqueue(
        &stream,
        &[
            ("task_id", "t-1"),
            ("video_id", "v-1"),
            ("source_path", "src/a.mp4"),
        ],
    )
    .await;

    let msg = q.fetch().await.expect("fetch");
    assert_eq!(msg.task.id, "t-1");
    assert_eq!(msg.task.attempt, 0);

    q.ack(&msg).await.expect("ack");
    assert_eq!(q.depth().await.expect("depth"), 0);
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_fail_requeues_with_incremented_attempt() {
    let stream = format!("clipforge-test-{}", uuid::Uuid::new_v4());
    let q = queue(&stream, "c1", 5).await;

    enqueue(
        &stream,
        &[
            ("task_id", "t-1"),
            ("video_id", "v-1"),
            ("source_path", "src/a.mp4"),
            ("trace_id", "abc"),
        ],
    )
    .await;

    let msg = q.fetch().await.expect("fetch");
    q.fail(&msg, "simulated failure").await.expect("fail");

    let retried = q.fetch().await.expect("fetch retried");
    assert_eq!(retried.task.attempt, 1);
    assert_eq!(
        retried.task.metadata.get("trace_id").map(String::as_str),
        Some("abc")
    );
    assert_eq!(
        retried.task.metadata.get("error").map(String::as_str),
        Some("simulated failure")
    );
    q.ack(&retried).await.expect("ack");
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_fail_at_max_deliveries_dead_letters() {
    let stream = format!("clipforge-test-{}", uuid::Uuid::new_v4());
    let q = queue(&stream, "c1", 2).await;

    enqueue(
        &stream,
        &[
            ("task_id", "t-1"),
            ("video_id", "v-1"),
            ("source_path", "src/a.mp4"),
            ("attempt", "1"),
        ],
    )
    .await;

    let msg = q.fetch().await.expect("fetch");
    assert_eq!(msg.task.attempt, 1);
    q.fail(&msg, "simulated failure").await.expect("fail");

    // attempt+1 reached max_deliveries, so nothing was re-enqueued.
    let next = q.fetch().await;
    assert!(matches!(next, Err(QueueError::NoMessages)));
}
