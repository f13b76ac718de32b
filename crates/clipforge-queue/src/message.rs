//! Message envelope and payload round-tripping.

use serde_json::{Map, Value};

use clipforge_models::Task;

/// Reserved payload keys the worker interprets itself.
const RESERVED_KEYS: [&str; 4] = ["task_id", "video_id", "source_path", "attempt"];

/// One fetched message: the broker's handle, the decoded task, and the raw
/// payload kept around so unknown fields survive a retry.
#[derive(Debug, Clone)]
pub struct TaskMessage {
    /// Receipt handle or stream entry id, depending on the backend.
    pub id: String,
    pub task: Task,
    pub raw: Map<String, Value>,
}

/// Decode a task from a flat payload map. Unrecognized keys land in the
/// task's metadata; a non-numeric `attempt` is treated as 0.
pub(crate) fn hydrate_task(values: &Map<String, Value>) -> Task {
    let mut task = Task::default();

    for (key, value) in values {
        let text = value_to_string(value);
        match key.as_str() {
            "task_id" => task.id = text,
            "video_id" => task.video_id = text,
            "source_path" => task.source_path = text,
            "attempt" => task.attempt = text.parse().unwrap_or(0),
            _ => {
                task.metadata.insert(key.clone(), text);
            }
        }
    }

    task
}

/// Build the payload for a retried copy of `msg`: typed fields with the
/// attempt incremented, an `error` field carrying the failure reason, and
/// every unknown raw field preserved verbatim.
pub(crate) fn retry_payload(msg: &TaskMessage, reason: &str) -> Map<String, Value> {
    let mut values = Map::new();
    values.insert("task_id".to_string(), Value::String(msg.task.id.clone()));
    values.insert(
        "video_id".to_string(),
        Value::String(msg.task.video_id.clone()),
    );
    values.insert(
        "source_path".to_string(),
        Value::String(msg.task.source_path.clone()),
    );
    values.insert(
        "attempt".to_string(),
        Value::Number((msg.task.attempt + 1).into()),
    );
    values.insert("error".to_string(), Value::String(reason.to_string()));

    for (key, value) in &msg.raw {
        if !RESERVED_KEYS.contains(&key.as_str()) && !values.contains_key(key) {
            values.insert(key.clone(), value.clone());
        }
    }

    values
}

/// Render a payload value the way it would appear as a flat string field.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
