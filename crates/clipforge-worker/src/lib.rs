//! Video processing worker.
//!
//! Pulls tasks from a queue, downloads the raw upload, renders the curtain
//! rendition with ffmpeg, uploads the result, and commits the outcome to the
//! video table. Runs a configurable number of concurrent workers, each with
//! its own queue consumer, and exposes Prometheus metrics over HTTP.

pub mod config;
pub mod error;
pub mod metrics;
pub mod process_task;
pub mod runtime;

pub use config::{QueueBackend, StorageBackend, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use process_task::TaskProcessor;
pub use runtime::run;
