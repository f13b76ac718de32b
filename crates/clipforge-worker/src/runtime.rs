//! Worker pool bootstrap and lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use clipforge_db::{PgVideoRepository, VideoRepository};
use clipforge_media::{FfmpegTranscoder, Transcoder};
use clipforge_queue::{RedisStreamQueue, SqsQueue, TaskQueue};
use clipforge_storage::{S3Storage, Storage, WebDavStorage};

use crate::config::{QueueBackend, StorageBackend, WorkerConfig};
use crate::error::{WorkerError, WorkerResult};
use crate::metrics::{init_recorder, metrics_router, PrometheusMetrics, WorkerMetrics};
use crate::process_task::TaskProcessor;

/// Cool-down after a failed iteration so a broken broker is not hammered.
const ITERATION_BACKOFF: Duration = Duration::from_millis(500);

enum BrokerClient {
    Redis(redis::Client),
    Sqs(aws_sdk_sqs::Client),
}

/// Bootstrap all adapters and run the worker pool until cancellation or a
/// fatal metrics-server error. Blocks for the lifetime of the process.
pub async fn run(config: WorkerConfig) -> WorkerResult<()> {
    let pool = clipforge_db::connect(&config.postgres_dsn).await?;
    let repository: Arc<dyn VideoRepository> = Arc::new(PgVideoRepository::new(pool));

    let storage: Arc<dyn Storage> = match config.storage_backend {
        StorageBackend::Webdav => Arc::new(WebDavStorage::new(
            &config.webdav.base_url,
            &config.webdav.root,
            &config.webdav.username,
            &config.webdav.password,
        )?),
        StorageBackend::S3 => Arc::new(S3Storage::new(config.s3.clone()).await?),
    };

    let transcoder: Arc<dyn Transcoder> = Arc::new(FfmpegTranscoder::new(
        config.ffmpeg_path.clone(),
        config.ffprobe_path.clone(),
        config.temp_dir.clone(),
    )?);

    let metrics: Arc<dyn WorkerMetrics> = Arc::new(PrometheusMetrics);
    let handle = init_recorder()?;

    let (shutdown_tx, _) = watch::channel(false);
    let (fatal_tx, mut fatal_rx) = mpsc::channel::<WorkerError>(1);

    let listener = tokio::net::TcpListener::bind(&config.metrics_addr).await?;
    info!(addr = %config.metrics_addr, "metrics server listening");
    let mut metrics_shutdown = shutdown_tx.subscribe();
    let metrics_server = tokio::spawn(async move {
        let serve = axum::serve(listener, metrics_router(handle)).with_graceful_shutdown(
            async move {
                let _ = metrics_shutdown.wait_for(|stop| *stop).await;
            },
        );
        if let Err(e) = serve.await {
            let _ = fatal_tx.send(WorkerError::Io(e)).await;
        }
    });

    // One shared broker client; each worker still gets its own adapter so
    // consumer names and receive sessions stay disjoint.
    let broker = match config.queue_backend {
        QueueBackend::Redis => {
            BrokerClient::Redis(redis::Client::open(config.redis.url().as_str()).map_err(
                clipforge_queue::QueueError::from,
            )?)
        }
        QueueBackend::Sqs => {
            let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(config.sqs.region.clone()))
                .load()
                .await;
            BrokerClient::Sqs(aws_sdk_sqs::Client::new(&sdk_config))
        }
    };

    let mut workers = JoinSet::new();
    for i in 0..config.worker_pool_size {
        let worker_id = (i + 1).to_string();

        let queue: Arc<dyn TaskQueue> = match &broker {
            BrokerClient::Redis(client) => {
                let consumer = format!("{}-{}", config.redis.consumer_prefix, i + 1);
                Arc::new(
                    RedisStreamQueue::new(
                        client.clone(),
                        config.redis.stream.clone(),
                        config.redis.group.clone(),
                        consumer,
                        config.redis.block_timeout,
                        config.max_deliveries,
                    )
                    .await?,
                )
            }
            BrokerClient::Sqs(client) => Arc::new(SqsQueue::new(
                client.clone(),
                config.sqs.queue_url.clone(),
                config.sqs.wait_time_secs,
                config.max_deliveries,
            )),
        };

        let processor = TaskProcessor::new(
            queue,
            storage.clone(),
            repository.clone(),
            transcoder.clone(),
            metrics.clone(),
            config.transcode_options(),
            config.processing_timeout,
            config.max_deliveries,
        );

        let shutdown_rx = shutdown_tx.subscribe();
        workers.spawn(worker_loop(processor, worker_id, shutdown_rx));
    }

    info!(
        worker_pool_size = config.worker_pool_size,
        processing_timeout_secs = config.processing_timeout.as_secs(),
        "video worker running"
    );

    let run_err = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            None
        }
        Some(e) = fatal_rx.recv() => {
            error!(error = %e, "metrics server failed");
            Some(e)
        }
    };

    let _ = shutdown_tx.send(true);

    let drain = async {
        while workers.join_next().await.is_some() {}
    };
    if tokio::time::timeout(config.shutdown_grace, drain).await.is_err() {
        warn!(
            grace_secs = config.shutdown_grace.as_secs(),
            "worker shutdown timed out, abandoning in-flight tasks"
        );
        workers.abort_all();
    }

    metrics_server.abort();
    info!("worker shutdown complete");

    match run_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// One worker's fetch→process→ack loop. Exits when the shutdown flag flips;
/// failed iterations pause briefly so transport errors do not spin.
pub async fn worker_loop(
    processor: TaskProcessor,
    worker_id: String,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
            result = processor.handle_next(&worker_id) => {
                if let Err(e) = result {
                    error!(worker_id = %worker_id, error = %e, "worker iteration failed");
                    tokio::time::sleep(ITERATION_BACKOFF).await;
                }
            }
        }
    }

    info!(worker_id = %worker_id, "worker stopped");
}
