//! The process-task use case: drive one task end-to-end.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use clipforge_db::VideoRepository;
use clipforge_media::Transcoder;
use clipforge_models::{Task, TranscodeOptions, VideoStatus};
use clipforge_queue::{TaskMessage, TaskQueue};
use clipforge_storage::Storage;

use crate::error::{WorkerError, WorkerResult};
use crate::metrics::WorkerMetrics;

/// Processes at most one task per call, walking the row back to `uploaded`
/// whenever processing fails before the success update lands.
pub struct TaskProcessor {
    queue: Arc<dyn TaskQueue>,
    storage: Arc<dyn Storage>,
    repository: Arc<dyn VideoRepository>,
    transcoder: Arc<dyn Transcoder>,
    metrics: Arc<dyn WorkerMetrics>,
    transcode_options: TranscodeOptions,
    processing_timeout: Duration,
    max_deliveries: u32,
}

impl TaskProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        storage: Arc<dyn Storage>,
        repository: Arc<dyn VideoRepository>,
        transcoder: Arc<dyn Transcoder>,
        metrics: Arc<dyn WorkerMetrics>,
        transcode_options: TranscodeOptions,
        processing_timeout: Duration,
        max_deliveries: u32,
    ) -> Self {
        Self {
            queue,
            storage,
            repository,
            transcoder,
            metrics,
            transcode_options,
            processing_timeout,
            max_deliveries,
        }
    }

    /// Fetch and handle the next message. An empty poll is a successful
    /// no-op; a queue transport failure is surfaced so the caller can back
    /// off before retrying.
    pub async fn handle_next(&self, worker_id: &str) -> WorkerResult<()> {
        match self.queue.depth().await {
            Ok(depth) => self.metrics.queue_depth(worker_id, depth),
            Err(e) => debug!(worker_id, error = %e, "failed to read queue depth"),
        }

        let msg = match self.queue.fetch().await {
            Ok(msg) => msg,
            Err(e) if e.is_no_messages() => return Ok(()),
            Err(e) => {
                self.metrics.queue_error(worker_id);
                error!(worker_id, error = %e, "failed to fetch message from queue");
                return Err(e.into());
            }
        };

        let started = Instant::now();
        let (status, result) = self.handle_message(&msg, worker_id).await;
        self.metrics
            .processing_duration(status.as_str(), worker_id, started.elapsed().as_secs_f64());
        result
    }

    /// Run one fetched message to a terminal outcome, returning the status
    /// label for the duration histogram alongside the result.
    async fn handle_message(
        &self,
        msg: &TaskMessage,
        worker_id: &str,
    ) -> (VideoStatus, WorkerResult<()>) {
        let task = &msg.task;

        let mut video = match self.repository.find_by_id(&task.video_id).await {
            Ok(video) => video,
            Err(e) => {
                self.metrics
                    .task_processed(VideoStatus::Failed.as_str(), worker_id);
                error!(
                    task_id = %task.id,
                    video_id = %task.video_id,
                    error = %e,
                    "video not found"
                );
                self.fail_message(msg, &e.to_string()).await;
                return (VideoStatus::Uploaded, Err(e.into()));
            }
        };

        match self.process_bounded(task).await {
            Ok((processed_id, output_path)) => {
                video.mark_processed(Utc::now(), &processed_id, &output_path);
                if let Err(e) = self.repository.update(&video).await {
                    self.metrics
                        .task_processed(VideoStatus::Failed.as_str(), worker_id);
                    error!(
                        task_id = %task.id,
                        video_id = %task.video_id,
                        error = %e,
                        "failed to mark video processed"
                    );
                    self.fail_message(msg, &e.to_string()).await;
                    return (VideoStatus::Failed, Err(e.into()));
                }

                self.metrics
                    .task_processed(VideoStatus::Processed.as_str(), worker_id);
                info!(
                    task_id = %task.id,
                    video_id = %task.video_id,
                    processed_video_id = %processed_id,
                    "video processed successfully"
                );

                // The row is authoritative past this point; a failed ack only
                // means the broker redelivers an already-terminal task.
                if let Err(e) = self.queue.ack(msg).await {
                    error!(task_id = %task.id, error = %e, "acknowledgement failed");
                }

                (VideoStatus::Processed, Ok(()))
            }
            Err(e) => {
                video.reset_to_uploaded();
                if let Err(update_err) = self.repository.update(&video).await {
                    error!(
                        video_id = %task.video_id,
                        error = %update_err,
                        "failed to reset video after processing error"
                    );
                }

                self.metrics
                    .task_processed(VideoStatus::Failed.as_str(), worker_id);
                error!(task_id = %task.id, error = %e, "video processing failed");

                if self.max_deliveries > 0 && task.attempt + 1 >= self.max_deliveries {
                    warn!(task_id = %task.id, "max retry attempts reached");
                }

                self.fail_message(msg, &e.to_string()).await;
                (VideoStatus::Failed, Err(e))
            }
        }
    }

    /// Download, transcode, and upload, bounded by the per-task timeout
    /// when one is configured. Returns the fresh processed id and path.
    async fn process_bounded(&self, task: &Task) -> WorkerResult<(String, String)> {
        if self.processing_timeout.is_zero() {
            return self.process(task).await;
        }

        match tokio::time::timeout(self.processing_timeout, self.process(task)).await {
            Ok(result) => result,
            Err(_) => Err(WorkerError::ProcessingTimeout(self.processing_timeout)),
        }
    }

    async fn process(&self, task: &Task) -> WorkerResult<(String, String)> {
        let raw = self.storage.download(&task.source_path).await?;
        let artifact = self.transcoder.process(&raw, &self.transcode_options).await?;

        let processed_id = Uuid::new_v4().to_string();
        let output_path = format!("{}.{}", processed_id, artifact.format());

        let rendition = artifact.read_bytes().await?;
        self.storage.upload(&output_path, rendition).await?;

        Ok((processed_id, output_path))
    }

    /// Hand the message back to the queue for retry or dead-lettering. Queue
    /// errors here are logged; the broker's redelivery covers the loss.
    async fn fail_message(&self, msg: &TaskMessage, reason: &str) {
        if let Err(e) = self.queue.fail(msg, reason).await {
            error!(task_id = %msg.task.id, error = %e, "failed to fail message");
        }
    }
}
