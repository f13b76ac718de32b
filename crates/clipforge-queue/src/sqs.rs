//! Visibility-timeout backend on SQS.

use aws_sdk_sqs::types::{MessageSystemAttributeName, QueueAttributeName};
use aws_sdk_sqs::Client;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use async_trait::async_trait;

use crate::error::{QueueError, QueueResult};
use crate::message::{hydrate_task, retry_payload, TaskMessage};
use crate::{exhausted, TaskQueue};

/// Task queue backed by an SQS-style queue.
///
/// Redelivery is driven by the broker's visibility timeout; the attempt
/// counter is seeded from the receive count and overridden by an explicit
/// `attempt` payload field written on retry.
pub struct SqsQueue {
    client: Client,
    queue_url: String,
    wait_time_secs: i32,
    max_deliveries: u32,
}

impl SqsQueue {
    pub fn new(
        client: Client,
        queue_url: impl Into<String>,
        wait_time_secs: i32,
        max_deliveries: u32,
    ) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
            wait_time_secs,
            max_deliveries,
        }
    }

    async fn delete(&self, receipt_handle: &str) -> QueueResult<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::sqs(format!("delete message: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl TaskQueue for SqsQueue {
    async fn fetch(&self) -> QueueResult<TaskMessage> {
        let result = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(1)
            .wait_time_seconds(self.wait_time_secs)
            .message_system_attribute_names(MessageSystemAttributeName::ApproximateReceiveCount)
            .send()
            .await
            .map_err(|e| QueueError::sqs(format!("receive message: {e}")))?;

        let msg = match result.messages.and_then(|mut m| m.pop()) {
            Some(msg) => msg,
            None => return Err(QueueError::NoMessages),
        };

        let receipt_handle = msg
            .receipt_handle
            .ok_or_else(|| QueueError::sqs("message without receipt handle"))?;
        let body = msg.body.unwrap_or_default();

        let raw: Map<String, Value> = match serde_json::from_str(&body) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                // Undecodable payloads can never succeed on retry; drop them.
                error!(body_len = body.len(), "undecodable message payload, deleting");
                self.delete(&receipt_handle).await.ok();
                return Err(QueueError::malformed("payload is not a JSON object"));
            }
        };

        let mut task = hydrate_task(&raw);
        // Receive count starts at 1; only trust it when the payload does not
        // carry its own attempt counter from a previous retry.
        if !raw.contains_key("attempt") {
            task.attempt = msg
                .attributes
                .as_ref()
                .and_then(|attrs| attrs.get(&MessageSystemAttributeName::ApproximateReceiveCount))
                .and_then(|count| count.parse::<u32>().ok())
                .map(|count| count.saturating_sub(1))
                .unwrap_or(0);
        }

        debug!(task_id = %task.id, attempt = task.attempt, "fetched task from queue");

        Ok(TaskMessage {
            id: receipt_handle,
            task,
            raw,
        })
    }

    async fn ack(&self, msg: &TaskMessage) -> QueueResult<()> {
        self.delete(&msg.id).await
    }

    async fn fail(&self, msg: &TaskMessage, reason: &str) -> QueueResult<()> {
        if exhausted(msg.task.attempt, self.max_deliveries) {
            warn!(
                task_id = %msg.task.id,
                attempt = msg.task.attempt + 1,
                "discarding message after max deliveries"
            );
            return self.delete(&msg.id).await;
        }

        let body = serde_json::to_string(&Value::Object(retry_payload(msg, reason)))?;
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| QueueError::sqs(format!("send retry message: {e}")))?;

        if let Err(e) = self.delete(&msg.id).await {
            error!(task_id = %msg.task.id, error = %e, "failed to delete failed message");
        }

        debug!(task_id = %msg.task.id, attempt = msg.task.attempt + 1, "re-enqueued task");
        Ok(())
    }

    async fn depth(&self) -> QueueResult<u64> {
        let attrs = self
            .client
            .get_queue_attributes()
            .queue_url(&self.queue_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await
            .map_err(|e| QueueError::sqs(format!("get queue attributes: {e}")))?;

        let depth = attrs
            .attributes
            .and_then(|map| {
                map.get(&QueueAttributeName::ApproximateNumberOfMessages)
                    .and_then(|count| count.parse().ok())
            })
            .unwrap_or(0);

        Ok(depth)
    }
}
