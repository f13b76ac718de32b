//! Consumer-group stream backend on Redis Streams.

use std::time::Duration;

use redis::streams::StreamReadReply;
use redis::AsyncCommands;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use async_trait::async_trait;

use crate::error::{QueueError, QueueResult};
use crate::message::{hydrate_task, retry_payload, value_to_string, TaskMessage};
use crate::{exhausted, TaskQueue};

/// Task queue backed by one Redis stream and a consumer group.
///
/// Each worker holds its own instance with a distinct consumer name so
/// pending-entry ownership stays per-worker.
pub struct RedisStreamQueue {
    client: redis::Client,
    stream: String,
    group: String,
    consumer: String,
    block_timeout: Duration,
    max_deliveries: u32,
}

impl RedisStreamQueue {
    /// Create the queue and idempotently create the consumer group.
    pub async fn new(
        client: redis::Client,
        stream: impl Into<String>,
        group: impl Into<String>,
        consumer: impl Into<String>,
        block_timeout: Duration,
        max_deliveries: u32,
    ) -> QueueResult<Self> {
        let stream = stream.into();
        let group = group.into();

        let mut conn = client.get_multiplexed_async_connection().await?;
        let created: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&stream)
            .arg(&group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match created {
            Ok(()) => debug!(group = %group, "created consumer group"),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!(group = %group, "consumer group already exists");
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(Self {
            client,
            stream,
            group,
            consumer: consumer.into(),
            block_timeout,
            max_deliveries,
        })
    }
}

#[async_trait]
impl TaskQueue for RedisStreamQueue {
    async fn fetch(&self) -> QueueResult<TaskMessage> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let reply: Option<StreamReadReply> = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.group)
            .arg(&self.consumer)
            .arg("COUNT")
            .arg(1)
            .arg("BLOCK")
            .arg(self.block_timeout.as_millis() as u64)
            .arg("STREAMS")
            .arg(&self.stream)
            .arg(">")
            .query_async(&mut conn)
            .await?;

        let reply = reply.ok_or(QueueError::NoMessages)?;
        let entry = reply
            .keys
            .into_iter()
            .next()
            .and_then(|key| key.ids.into_iter().next())
            .ok_or(QueueError::NoMessages)?;

        let mut raw = Map::new();
        for (field, value) in &entry.map {
            raw.insert(field.clone(), Value::String(stringify(value)));
        }

        let task = hydrate_task(&raw);
        debug!(task_id = %task.id, entry_id = %entry.id, "fetched task from stream");

        Ok(TaskMessage {
            id: entry.id,
            task,
            raw,
        })
    }

    async fn ack(&self, msg: &TaskMessage) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        redis::cmd("XACK")
            .arg(&self.stream)
            .arg(&self.group)
            .arg(&msg.id)
            .query_async::<()>(&mut conn)
            .await?;

        redis::cmd("XDEL")
            .arg(&self.stream)
            .arg(&msg.id)
            .query_async::<()>(&mut conn)
            .await?;

        debug!(entry_id = %msg.id, "acknowledged task");
        Ok(())
    }

    async fn fail(&self, msg: &TaskMessage, reason: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // Best effort: a failed XACK leaves the entry pending, where group
        // reclaim will re-deliver it after this copy retires.
        let acked: Result<(), redis::RedisError> = redis::cmd("XACK")
            .arg(&self.stream)
            .arg(&self.group)
            .arg(&msg.id)
            .query_async(&mut conn)
            .await;
        if let Err(e) = acked {
            error!(entry_id = %msg.id, error = %e, "failed to ack failed message");
        }

        if exhausted(msg.task.attempt, self.max_deliveries) {
            warn!(
                task_id = %msg.task.id,
                attempt = msg.task.attempt + 1,
                "discarding message after max deliveries"
            );
            return Ok(());
        }

        let values = retry_payload(msg, reason);
        let mut cmd = redis::cmd("XADD");
        cmd.arg(&self.stream).arg("*");
        for (field, value) in &values {
            cmd.arg(field).arg(value_to_string(value));
        }
        cmd.query_async::<()>(&mut conn).await?;

        debug!(task_id = %msg.task.id, attempt = msg.task.attempt + 1, "re-enqueued task");
        Ok(())
    }

    async fn depth(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.stream).await?;
        Ok(len)
    }
}

fn stringify(value: &redis::Value) -> String {
    match value {
        redis::Value::BulkString(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        redis::Value::SimpleString(s) => s.clone(),
        redis::Value::Int(n) => n.to_string(),
        other => format!("{other:?}"),
    }
}
