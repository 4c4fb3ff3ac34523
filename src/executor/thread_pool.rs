use super::job::Job;
use super::panic_handler::PanicHandler;
use super::worker::{Worker, WorkerId, WorkerState};
use super::Executor;
use crate::config::Config;
use crate::error::{Error, Result};
use crossbeam_channel::{unbounded, Sender};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// A fixed set of worker threads fed from one shared queue.
pub struct ThreadPool {
    sender: RwLock<Option<Sender<Job>>>,
    workers: Mutex<Vec<WorkerHandle>>,
    num_threads: usize,
    pending_jobs: Arc<AtomicUsize>,
    panic_handler: Arc<PanicHandler>,
}

struct WorkerHandle {
    id: WorkerId,
    thread: Option<JoinHandle<()>>,
    state: Arc<WorkerState>,
}

impl ThreadPool {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let num_threads = config.worker_threads();
        let (sender, receiver) = unbounded::<Job>();
        let pending_jobs = Arc::new(AtomicUsize::new(0));
        let panic_handler = Arc::new(PanicHandler::new(config.panic_strategy));

        let mut handles = Vec::with_capacity(num_threads);

        for id in 0..num_threads {
            let worker = Worker::new(id, panic_handler.clone());
            let state = worker.state.clone();
            let receiver = receiver.clone();
            let pending = pending_jobs.clone();
            let name = format!("{}-{}", config.thread_name_prefix, id);

            let mut builder = thread::Builder::new().name(name);

            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            let thread = builder
                .spawn(move || worker.run(receiver, pending))
                .map_err(|e| Error::executor(format!("spawn failed: {}", e)))?;

            handles.push(WorkerHandle {
                id,
                thread: Some(thread),
                state,
            });
        }

        debug!(threads = num_threads, prefix = %config.thread_name_prefix, "thread pool started");

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(handles),
            num_threads,
            pending_jobs,
            panic_handler,
        })
    }

    /// Pool with `n` workers and otherwise default settings.
    pub fn with_threads(n: usize) -> Result<Self> {
        let config = Config::builder().num_threads(n).build()?;
        Self::new(&config)
    }

    pub fn spawn<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Job::new(f))
    }

    fn submit(&self, job: Job) -> Result<()> {
        let sender = self.sender.read();
        let sender = sender.as_ref().ok_or(Error::ShutDown)?;

        self.pending_jobs.fetch_add(1, Ordering::Relaxed);
        if sender.send(job).is_err() {
            self.pending_jobs.fetch_sub(1, Ordering::Relaxed);
            return Err(Error::ShutDown);
        }

        Ok(())
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Jobs queued or running.
    pub fn pending_jobs(&self) -> usize {
        self.pending_jobs.load(Ordering::Relaxed)
    }

    pub fn jobs_executed(&self) -> u64 {
        self.workers
            .lock()
            .iter()
            .map(|w| w.state.jobs_executed.load(Ordering::Relaxed))
            .sum()
    }

    /// Total time workers spent running jobs.
    pub fn busy_time(&self) -> Duration {
        let nanos: u64 = self
            .workers
            .lock()
            .iter()
            .map(|w| w.state.busy_time_ns.load(Ordering::Relaxed))
            .sum();
        Duration::from_nanos(nanos)
    }

    pub fn panic_count(&self) -> usize {
        self.panic_handler.panic_count()
    }

    pub fn is_shut_down(&self) -> bool {
        self.sender.read().is_none()
    }

    /// Stop accepting jobs, let the workers drain the queue, then join them.
    pub fn shutdown(&self) {
        // dropping the only sender disconnects the queue once it is empty
        self.sender.write().take();

        // jobs may read pool stats while we wait, so join without the lock
        let threads: Vec<_> = self
            .workers
            .lock()
            .iter_mut()
            .filter_map(|w| w.thread.take().map(|t| (w.id, t)))
            .collect();

        let current = thread::current().id();
        for (id, thread) in threads {
            // a job may drop the last handle to its own pool
            if thread.thread().id() == current {
                continue;
            }
            if thread.join().is_err() {
                tracing::error!(worker = id, "worker thread panicked");
            }
        }

        debug!(threads = self.num_threads, "thread pool shut down");
    }
}

impl Executor for ThreadPool {
    fn execute(&self, job: Job) -> Result<()> {
        self.submit(job)
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("num_threads", &self.num_threads)
            .field("pending_jobs", &self.pending_jobs())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
