// worker thread stuff
use super::job::Job;
use super::panic_handler::PanicHandler;
use crossbeam_channel::Receiver;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

pub type WorkerId = usize;

// stats for each worker
#[derive(Debug)]
pub struct WorkerState {
    pub jobs_executed: AtomicU64,
    pub busy_time_ns: AtomicU64,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            jobs_executed: AtomicU64::new(0),
            busy_time_ns: AtomicU64::new(0),
        }
    }
}

pub(crate) struct Worker {
    pub id: WorkerId,
    pub state: Arc<WorkerState>,
    panic_handler: Arc<PanicHandler>,
}

impl Worker {
    pub fn new(id: WorkerId, panic_handler: Arc<PanicHandler>) -> Self {
        Self {
            id,
            state: Arc::new(WorkerState::new()),
            panic_handler,
        }
    }

    // main loop, ends once every sender is gone and the queue is drained
    pub fn run(&self, jobs: Receiver<Job>, pending_jobs: Arc<AtomicUsize>) {
        while let Ok(job) = jobs.recv() {
            self.execute_job(job);
            pending_jobs.fetch_sub(1, Ordering::Relaxed);
        }

        debug!(
            worker = self.id,
            executed = self.state.jobs_executed.load(Ordering::Relaxed),
            "worker exiting"
        );
    }

    fn execute_job(&self, job: Job) {
        let id = job.id();
        let queued_for = job.submit_time().elapsed();
        let start = Instant::now();

        trace!(worker = self.id, job = id.as_u64(), ?queued_for, "running job");

        // the handler counts and logs panics
        let _ = self.panic_handler.execute(|| job.run());

        let duration_ns = start.elapsed().as_nanos() as u64;
        self.state
            .busy_time_ns
            .fetch_add(duration_ns, Ordering::Relaxed);
        self.state.jobs_executed.fetch_add(1, Ordering::Relaxed);
    }
}
