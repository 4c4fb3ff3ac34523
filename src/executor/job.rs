//! Job representation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

static JOB_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

impl JobId {
    fn next() -> Self {
        JobId(JOB_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// A unit of work handed to an [`Executor`](super::Executor).
pub struct Job {
    id: JobId,
    func: Box<dyn FnOnce() + Send + 'static>,
    submit_time: Instant,
}

impl Job {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Job {
            id: JobId::next(),
            func: Box::new(f),
            submit_time: Instant::now(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn submit_time(&self) -> Instant {
        self.submit_time
    }

    /// Run the job on the current thread
    pub fn run(self) {
        (self.func)();
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("submit_time", &self.submit_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[test]
    fn test_ids_are_unique() {
        let a = Job::new(|| {});
        let b = Job::new(|| {});
        assert_ne!(a.id(), b.id());
        assert!(b.id().as_u64() > a.id().as_u64());
    }

    #[test]
    fn test_run_invokes_closure() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        Job::new(move || flag.store(true, Ordering::SeqCst)).run();
        assert!(ran.load(Ordering::SeqCst));
    }
}
