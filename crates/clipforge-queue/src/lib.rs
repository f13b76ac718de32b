//! Task queue adapters.
//!
//! Two interchangeable backends behind one [`TaskQueue`] contract: Redis
//! Streams with a consumer group, and SQS-style visibility-timeout queues.
//! The worker never sees broker specifics; it fetches, acks, or fails.

pub mod error;
pub mod message;
pub mod redis_stream;
pub mod sqs;

use async_trait::async_trait;

pub use error::{QueueError, QueueResult};
pub use message::TaskMessage;
pub use redis_stream::RedisStreamQueue;
pub use sqs::SqsQueue;

/// Contract for consuming task messages.
///
/// Every message ends in exactly one of three ways: acked, re-enqueued with
/// an incremented attempt, or dropped after `max_deliveries` attempts.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Retrieve the next message, blocking up to the backend's poll bound.
    /// Returns [`QueueError::NoMessages`] on an empty poll.
    async fn fetch(&self) -> QueueResult<TaskMessage>;

    /// Permanently remove a processed message. Idempotent on redelivery.
    async fn ack(&self, msg: &TaskMessage) -> QueueResult<()>;

    /// Mark a message failed: re-enqueue a copy with attempt+1 and an
    /// `error` field, or drop it once deliveries are exhausted.
    async fn fail(&self, msg: &TaskMessage, reason: &str) -> QueueResult<()>;

    /// Current number of messages waiting on the broker.
    async fn depth(&self) -> QueueResult<u64>;
}

/// Whether the next failure of a message at `attempt` must dead-letter
/// instead of retrying. `max_deliveries` of 0 disables the bound.
pub(crate) fn exhausted(attempt: u32, max_deliveries: u32) -> bool {
    max_deliveries > 0 && attempt + 1 >= max_deliveries
}
