//! Video row model and status transitions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a video row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Raw upload present, no processed artifact yet.
    #[default]
    Uploaded,
    /// Processed artifact uploaded and recorded.
    Processed,
    /// Soft-deleted by the owner.
    Deleted,
    /// Terminal failure.
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Uploaded => "uploaded",
            VideoStatus::Processed => "processed",
            VideoStatus::Deleted => "deleted",
            VideoStatus::Failed => "failed",
        }
    }

    /// Parse a status column value. Unknown text maps to `Uploaded` so a
    /// row written by a newer schema never wedges the worker.
    pub fn from_db(raw: &str) -> Self {
        match raw {
            "processed" => VideoStatus::Processed,
            "deleted" => VideoStatus::Deleted,
            "failed" => VideoStatus::Failed,
            _ => VideoStatus::Uploaded,
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The authoritative video record.
///
/// The worker only ever transitions `uploaded` → `processed` and back; rows
/// are created and deleted elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub user_id: String,
    pub raw_video_id: String,
    pub processed_video_id: Option<String>,
    pub title: String,
    pub status: VideoStatus,
    pub uploaded_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub original_url: String,
    pub processed_url: Option<String>,
    pub votes: i32,
}

impl VideoRecord {
    /// Record a successful processing run. Empty ids/urls are stored as NULL.
    pub fn mark_processed(
        &mut self,
        processed_at: DateTime<Utc>,
        processed_video_id: impl Into<String>,
        processed_url: impl Into<String>,
    ) {
        self.status = VideoStatus::Processed;
        self.processed_at = Some(processed_at);
        self.processed_video_id = non_empty(processed_video_id.into());
        self.processed_url = non_empty(processed_url.into());
    }

    /// Undo any processed state, returning the row to its post-upload shape.
    pub fn reset_to_uploaded(&mut self) {
        self.status = VideoStatus::Uploaded;
        self.processed_at = None;
        self.processed_video_id = None;
        self.processed_url = None;
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> VideoRecord {
        VideoRecord {
            id: "v-1".to_string(),
            user_id: "u-1".to_string(),
            raw_video_id: "raw-1".to_string(),
            processed_video_id: None,
            title: "clip".to_string(),
            status: VideoStatus::Uploaded,
            uploaded_at: Utc::now(),
            processed_at: None,
            original_url: "src/a.mp4".to_string(),
            processed_url: None,
            votes: 0,
        }
    }

    #[test]
    fn test_mark_processed_sets_all_fields() {
        let mut video = record();
        let at = Utc::now();
        video.mark_processed(at, "p-1", "p-1.mp4");

        assert_eq!(video.status, VideoStatus::Processed);
        assert_eq!(video.processed_at, Some(at));
        assert_eq!(video.processed_video_id.as_deref(), Some("p-1"));
        assert_eq!(video.processed_url.as_deref(), Some("p-1.mp4"));
    }

    #[test]
    fn test_mark_processed_empty_values_stay_null() {
        let mut video = record();
        video.mark_processed(Utc::now(), "", "");
        assert!(video.processed_video_id.is_none());
        assert!(video.processed_url.is_none());
    }

    #[test]
    fn test_reset_to_uploaded_clears_processed_fields() {
        let mut video = record();
        video.mark_processed(Utc::now(), "p-1", "p-1.mp4");
        video.reset_to_uploaded();

        assert_eq!(video.status, VideoStatus::Uploaded);
        assert!(video.processed_at.is_none());
        assert!(video.processed_video_id.is_none());
        assert!(video.processed_url.is_none());
    }

    #[test]
    fn test_status_from_db_unknown_falls_back_to_uploaded() {
        assert_eq!(VideoStatus::from_db("processed"), VideoStatus::Processed);
        assert_eq!(VideoStatus::from_db("deleted"), VideoStatus::Deleted);
        assert_eq!(VideoStatus::from_db("failed"), VideoStatus::Failed);
        assert_eq!(VideoStatus::from_db("archived"), VideoStatus::Uploaded);
        assert_eq!(VideoStatus::from_db(""), VideoStatus::Uploaded);
    }
}
