//! Durable job queue with a pool of worker tasks.
//!
//! Accepts named units of work with typed metadata, runs them on a fixed
//! pool of workers, and records per-job status, result and failure detail
//! for polling consumers. Chaining is achieved by a handler enqueueing the
//! successor job itself, carrying the correlation id and chain flag forward
//! in [`JobMeta`]; a worker never blocks waiting for a successor.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{QueueError, Result};

/// A unit of work the queue knows how to describe.
pub trait TaskSpec: fmt::Debug + Clone + Send + Sync + 'static {
    /// Stable task name, used for job records and logging.
    fn name(&self) -> &'static str;

    /// Human-readable target of the task (an address or device id).
    fn target(&self) -> String;
}

/// Typed job metadata carried from step to step.
///
/// Replaces the open-ended metadata bag of ad-hoc queues: only these two
/// keys exist, so unknown keys cannot appear by construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobMeta {
    /// Correlation (session) id linking the steps and progress messages of
    /// one provisioning run.
    pub correlation_id: Option<String>,
    /// True when the originating call intends full automation rather than a
    /// single manual step.
    pub run_chain: bool,
}

impl JobMeta {
    /// Metadata for a full automated chain with the given session id.
    #[must_use]
    pub fn chained(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: Some(correlation_id.into()),
            run_chain: true,
        }
    }

    /// Metadata for a single manual step without a session.
    #[must_use]
    pub fn manual() -> Self {
        Self::default()
    }
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, waiting for a worker.
    Queued,
    /// Picked up by a worker.
    Started,
    /// Completed successfully; the result value is set.
    Finished,
    /// Failed; the failure detail is set.
    Failed,
}

/// One job as seen by polling consumers.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    /// Job id.
    pub id: Uuid,
    /// Task name.
    pub task: String,
    /// Human-readable target.
    pub target: String,
    /// Current status.
    pub status: JobStatus,
    /// Result value, set when finished.
    pub result: Option<Value>,
    /// Failure diagnostic, set when failed.
    pub error: Option<String>,
    /// Metadata the job was enqueued with.
    pub meta: JobMeta,
    /// When the job was accepted.
    pub created_at: DateTime<Utc>,
    /// When the job finished or failed.
    pub ended_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Maps the status to the friendly form used by job listings.
    #[must_use]
    pub const fn display_status(&self) -> &'static str {
        match self.status {
            JobStatus::Queued | JobStatus::Started => "running",
            JobStatus::Finished => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// Executes tasks pulled from the queue.
#[async_trait]
pub trait JobHandler<T: TaskSpec>: Send + Sync + 'static {
    /// Runs one task to completion.
    ///
    /// The queue handle allows a step to enqueue its successor. The returned
    /// value becomes the job's result; an error becomes its failure detail.
    async fn run(&self, task: &T, meta: &JobMeta, queue: &JobQueue<T>) -> Result<Value>;
}

enum WorkerMessage<T> {
    Job(Envelope<T>),
    Stop,
}

struct Envelope<T> {
    id: Uuid,
    task: T,
    meta: JobMeta,
}

struct Inner<T: TaskSpec> {
    jobs: RwLock<HashMap<Uuid, JobRecord>>,
    tx: mpsc::UnboundedSender<WorkerMessage<T>>,
    pending: AtomicUsize,
    idle: Notify,
    shutdown: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// Handle to a running job queue. Cheap to clone.
pub struct JobQueue<T: TaskSpec> {
    inner: Arc<Inner<T>>,
}

impl<T: TaskSpec> Clone for JobQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: TaskSpec> JobQueue<T> {
    /// Starts a queue with the given handler and worker-pool size.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(handler: Arc<dyn JobHandler<T>>, workers: usize) -> Self {
        let workers = workers.max(1);
        let (tx, rx) = mpsc::unbounded_channel();

        let queue = Self {
            inner: Arc::new(Inner {
                jobs: RwLock::new(HashMap::new()),
                tx,
                pending: AtomicUsize::new(0),
                idle: Notify::new(),
                shutdown: AtomicBool::new(false),
                workers: Mutex::new(Vec::new()),
            }),
        };

        let rx = Arc::new(Mutex::new(rx));
        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let queue = queue.clone();
            let handler = Arc::clone(&handler);
            let rx = Arc::clone(&rx);
            handles.push(tokio::spawn(async move {
                worker_loop(worker_id, queue, handler, rx).await;
            }));
        }

        // No other handle exists yet, so the lock is free.
        if let Ok(mut guard) = queue.inner.workers.try_lock() {
            *guard = handles;
        }

        info!("Job queue started with {workers} workers");
        queue
    }

    /// Enqueues a task and returns the job id.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::ShutDown`] after [`shutdown`](Self::shutdown).
    pub async fn enqueue(&self, task: T, meta: JobMeta) -> Result<Uuid> {
        if self.inner.shutdown.load(Ordering::Acquire) {
            return Err(QueueError::ShutDown.into());
        }

        let id = Uuid::new_v4();
        let record = JobRecord {
            id,
            task: task.name().to_string(),
            target: task.target(),
            status: JobStatus::Queued,
            result: None,
            error: None,
            meta: meta.clone(),
            created_at: Utc::now(),
            ended_at: None,
        };

        self.inner.jobs.write().await.insert(id, record);
        self.inner.pending.fetch_add(1, Ordering::AcqRel);

        if self
            .inner
            .tx
            .send(WorkerMessage::Job(Envelope { id, task, meta }))
            .is_err()
        {
            self.inner.jobs.write().await.remove(&id);
            self.settle_one();
            return Err(QueueError::ShutDown.into());
        }

        debug!("Enqueued job {id}");
        Ok(id)
    }

    /// Fetches a job record by id.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::JobNotFound`] for unknown ids.
    pub async fn fetch(&self, id: Uuid) -> Result<JobRecord> {
        self.inner
            .jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| {
                QueueError::JobNotFound {
                    job_id: id.to_string(),
                }
                .into()
            })
    }

    /// Lists all known jobs, newest first.
    pub async fn list(&self) -> Vec<JobRecord> {
        let mut jobs: Vec<JobRecord> = self.inner.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Number of jobs accepted but not yet settled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Waits until no job is queued or running.
    ///
    /// Because a step enqueues its successor before it settles, a chain
    /// keeps the queue non-idle until its terminal step completes.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.inner.pending.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Stops accepting work, drains queued jobs and joins the workers.
    pub async fn shutdown(&self) {
        if self.inner.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        let handles = {
            let mut guard = self.inner.workers.lock().await;
            std::mem::take(&mut *guard)
        };

        for _ in 0..handles.len() {
            let _ = self.inner.tx.send(WorkerMessage::Stop);
        }
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Worker task panicked: {e}");
            }
        }

        info!("Job queue shut down");
    }

    async fn update(&self, id: Uuid, f: impl FnOnce(&mut JobRecord)) {
        if let Some(job) = self.inner.jobs.write().await.get_mut(&id) {
            f(job);
        }
    }

    fn settle_one(&self) {
        if self.inner.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.idle.notify_waiters();
        }
    }

    async fn process(&self, worker_id: usize, handler: &dyn JobHandler<T>, envelope: Envelope<T>) {
        let Envelope { id, task, meta } = envelope;
        debug!("Worker {worker_id} picked up {} job {id}", task.name());

        self.update(id, |job| job.status = JobStatus::Started).await;

        let outcome = handler.run(&task, &meta, self).await;
        let now = Utc::now();
        match outcome {
            Ok(result) => {
                self.update(id, move |job| {
                    job.status = JobStatus::Finished;
                    job.result = Some(result);
                    job.ended_at = Some(now);
                })
                .await;
            }
            Err(err) => {
                warn!("Job {id} ({}) failed: {err}", task.name());
                let detail = err.to_string();
                self.update(id, move |job| {
                    job.status = JobStatus::Failed;
                    job.error = Some(detail);
                    job.ended_at = Some(now);
                })
                .await;
            }
        }

        self.settle_one();
    }
}

async fn worker_loop<T: TaskSpec>(
    worker_id: usize,
    queue: JobQueue<T>,
    handler: Arc<dyn JobHandler<T>>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<WorkerMessage<T>>>>,
) {
    loop {
        let message = { rx.lock().await.recv().await };
        match message {
            Some(WorkerMessage::Job(envelope)) => {
                queue.process(worker_id, handler.as_ref(), envelope).await;
            }
            Some(WorkerMessage::Stop) | None => break,
        }
    }
    debug!("Worker {worker_id} stopped");
}
