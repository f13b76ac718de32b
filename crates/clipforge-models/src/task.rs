//! Queue task model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One unit of work pulled from the queue. References exactly one video row.
///
/// The metadata map carries every payload field the worker does not interpret
/// itself; those fields ride along unchanged when a task is re-enqueued.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque task id assigned by the producer.
    pub id: String,
    /// Primary key of the video row this task processes.
    pub video_id: String,
    /// Logical storage path of the raw upload.
    pub source_path: String,
    /// Delivery attempt, starting at 0.
    pub attempt: u32,
    /// Producer-supplied fields the worker round-trips untouched.
    pub metadata: HashMap<String, String>,
}

impl Task {
    pub fn increment_attempt(&mut self) {
        self.attempt += 1;
    }
}
