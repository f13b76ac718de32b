//! In-memory adapter fakes for use-case tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use clipforge_db::{DbError, DbResult, VideoRepository};
use clipforge_media::{MediaError, MediaResult, ProcessedVideo, Transcoder};
use clipforge_models::{Task, TranscodeOptions, VideoRecord, VideoStatus};
use clipforge_queue::{QueueError, QueueResult, TaskMessage, TaskQueue};
use clipforge_storage::{Storage, StorageError, StorageResult};
use clipforge_worker::metrics::WorkerMetrics;
use clipforge_worker::TaskProcessor;

/// Queue fake with broker-like retry semantics: failed messages reappear
/// with attempt+1 and an `error` metadata field, or dead-letter once
/// deliveries are exhausted.
#[derive(Default)]
pub struct MemoryQueue {
    pending: Mutex<VecDeque<Task>>,
    pub max_deliveries: u32,
    next_id: AtomicU32,
    /// Simulated long-poll block on an empty queue.
    fetch_delay: Mutex<Duration>,
    pub acked: AtomicU32,
    pub dead_lettered: AtomicU32,
    pub fail_fetches: AtomicU32,
    pub fail_acks: AtomicU32,
}

impl MemoryQueue {
    pub fn new(max_deliveries: u32) -> Self {
        Self {
            max_deliveries,
            ..Default::default()
        }
    }

    pub fn push(&self, task: Task) {
        self.pending.lock().unwrap().push_back(task);
    }

    pub fn pending_tasks(&self) -> Vec<Task> {
        self.pending.lock().unwrap().iter().cloned().collect()
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = delay;
    }

    fn pop(&self) -> Option<TaskMessage> {
        let task = self.pending.lock().unwrap().pop_front()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Some(TaskMessage {
            id: format!("m-{id}"),
            task,
            raw: serde_json::Map::new(),
        })
    }
}

#[async_trait]
impl TaskQueue for MemoryQueue {
    async fn fetch(&self) -> QueueResult<TaskMessage> {
        if self.fail_fetches.load(Ordering::SeqCst) > 0 {
            self.fail_fetches.fetch_sub(1, Ordering::SeqCst);
            return Err(QueueError::sqs("injected fetch failure"));
        }

        if let Some(msg) = self.pop() {
            return Ok(msg);
        }

        let delay = *self.fetch_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
            if let Some(msg) = self.pop() {
                return Ok(msg);
            }
        }

        Err(QueueError::NoMessages)
    }

    async fn ack(&self, _msg: &TaskMessage) -> QueueResult<()> {
        if self.fail_acks.load(Ordering::SeqCst) > 0 {
            self.fail_acks.fetch_sub(1, Ordering::SeqCst);
            return Err(QueueError::sqs("injected ack failure"));
        }
        self.acked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fail(&self, msg: &TaskMessage, reason: &str) -> QueueResult<()> {
        if self.max_deliveries > 0 && msg.task.attempt + 1 >= self.max_deliveries {
            self.dead_lettered.fetch_add(1, Ordering::SeqCst);
            return Ok(());
        }

        let mut task = msg.task.clone();
        task.increment_attempt();
        task.metadata.insert("error".to_string(), reason.to_string());
        self.pending.lock().unwrap().push_back(task);
        Ok(())
    }

    async fn depth(&self) -> QueueResult<u64> {
        Ok(self.pending.lock().unwrap().len() as u64)
    }
}

/// Storage fake over a hash map, with transient fault injection.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_downloads: AtomicU32,
    pub fail_uploads: AtomicU32,
}

impl MemoryStorage {
    pub fn put(&self, path: &str, data: Vec<u8>) {
        self.objects.lock().unwrap().insert(path.to_string(), data);
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        if self.fail_downloads.load(Ordering::SeqCst) > 0 {
            self.fail_downloads.fetch_sub(1, Ordering::SeqCst);
            return Err(StorageError::transport("injected download failure"));
        }
        self.objects
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::not_found(path))
    }

    async fn upload(&self, path: &str, data: Vec<u8>) -> StorageResult<()> {
        if self.fail_uploads.load(Ordering::SeqCst) > 0 {
            self.fail_uploads.fetch_sub(1, Ordering::SeqCst);
            return Err(StorageError::transport("injected upload failure"));
        }
        self.objects.lock().unwrap().insert(path.to_string(), data);
        Ok(())
    }
}

/// Repository fake over a hash map, with update fault injection.
#[derive(Default)]
pub struct MemoryRepository {
    rows: Mutex<HashMap<String, VideoRecord>>,
    pub fail_updates: AtomicU32,
}

impl MemoryRepository {
    pub fn insert(&self, video: VideoRecord) {
        self.rows.lock().unwrap().insert(video.id.clone(), video);
    }

    pub fn get(&self, id: &str) -> Option<VideoRecord> {
        self.rows.lock().unwrap().get(id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl VideoRepository for MemoryRepository {
    async fn find_by_id(&self, id: &str) -> DbResult<VideoRecord> {
        self.rows
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| DbError::not_found(id))
    }

    async fn update(&self, video: &VideoRecord) -> DbResult<()> {
        if self.fail_updates.load(Ordering::SeqCst) > 0 {
            self.fail_updates.fetch_sub(1, Ordering::SeqCst);
            return Err(DbError::Sqlx(sqlx::Error::PoolClosed));
        }
        self.rows
            .lock()
            .unwrap()
            .insert(video.id.clone(), video.clone());
        Ok(())
    }
}

/// Transcoder fake: prepends a marker to the input and writes it to a temp
/// file, so output artifacts are distinguishable from raw bytes. Optional
/// delay drives timeout tests.
#[derive(Default)]
pub struct StubTranscoder {
    pub delay: Duration,
    pub fail: bool,
}

#[async_trait]
impl Transcoder for StubTranscoder {
    async fn process(&self, input: &[u8], _opts: &TranscodeOptions) -> MediaResult<ProcessedVideo> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(MediaError::ffmpeg_failed("stub failure", None, Some(1)));
        }

        let path = std::env::temp_dir().join(format!("stub-{}.mp4", uuid::Uuid::new_v4()));
        let mut rendition = b"processed:".to_vec();
        rendition.extend_from_slice(input);
        tokio::fs::write(&path, &rendition).await?;

        Ok(ProcessedVideo::new(
            path,
            "mp4",
            Duration::from_secs(35),
            HashMap::new(),
        ))
    }
}

/// Metrics fake counting every observation.
#[derive(Default)]
pub struct CountingMetrics {
    processed: Mutex<HashMap<String, u64>>,
    durations: Mutex<Vec<String>>,
    pub queue_errors: AtomicU32,
    depth_samples: Mutex<Vec<u64>>,
}

impl CountingMetrics {
    pub fn processed_count(&self, status: &str) -> u64 {
        self.processed
            .lock()
            .unwrap()
            .get(status)
            .copied()
            .unwrap_or(0)
    }

    pub fn observed_statuses(&self) -> Vec<String> {
        self.durations.lock().unwrap().clone()
    }

    pub fn depth_samples(&self) -> Vec<u64> {
        self.depth_samples.lock().unwrap().clone()
    }
}

impl WorkerMetrics for CountingMetrics {
    fn task_processed(&self, status: &str, _worker_id: &str) {
        *self
            .processed
            .lock()
            .unwrap()
            .entry(status.to_string())
            .or_insert(0) += 1;
    }

    fn processing_duration(&self, status: &str, _worker_id: &str, _seconds: f64) {
        self.durations.lock().unwrap().push(status.to_string());
    }

    fn queue_error(&self, _worker_id: &str) {
        self.queue_errors.fetch_add(1, Ordering::SeqCst);
    }

    fn queue_depth(&self, _worker_id: &str, depth: u64) {
        self.depth_samples.lock().unwrap().push(depth);
    }
}

/// Everything a scenario needs, wired into one processor.
pub struct Harness {
    pub queue: Arc<MemoryQueue>,
    pub storage: Arc<MemoryStorage>,
    pub repository: Arc<MemoryRepository>,
    pub metrics: Arc<CountingMetrics>,
    pub processor: TaskProcessor,
}

pub fn harness(
    transcoder: Arc<dyn Transcoder>,
    processing_timeout: Duration,
    max_deliveries: u32,
) -> Harness {
    let queue = Arc::new(MemoryQueue::new(max_deliveries));
    let storage = Arc::new(MemoryStorage::default());
    let repository = Arc::new(MemoryRepository::default());
    let metrics = Arc::new(CountingMetrics::default());

    let processor = TaskProcessor::new(
        queue.clone(),
        storage.clone(),
        repository.clone(),
        transcoder,
        metrics.clone(),
        TranscodeOptions::default(),
        processing_timeout,
        max_deliveries,
    );

    Harness {
        queue,
        storage,
        repository,
        metrics,
        processor,
    }
}

pub fn uploaded_record(id: &str, source_path: &str) -> VideoRecord {
    VideoRecord {
        id: id.to_string(),
        user_id: "u-1".to_string(),
        raw_video_id: "raw-1".to_string(),
        processed_video_id: None,
        title: "clip".to_string(),
        status: VideoStatus::Uploaded,
        uploaded_at: Utc::now(),
        processed_at: None,
        original_url: source_path.to_string(),
        processed_url: None,
        votes: 0,
    }
}

pub fn task(id: &str, video_id: &str, source_path: &str) -> Task {
    Task {
        id: id.to_string(),
        video_id: video_id.to_string(),
        source_path: source_path.to_string(),
        attempt: 0,
        metadata: HashMap::new(),
    }
}
