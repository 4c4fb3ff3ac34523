use super::job::Job;
use super::panic_handler::{PanicHandler, PanicStrategy};
use super::Executor;
use crate::error::{Error, Result};
use std::sync::Arc;
use std::thread;

/// Runs every job on its own freshly spawned thread.
#[derive(Debug)]
pub struct ThreadPerTask {
    thread_name_prefix: String,
    panic_handler: Arc<PanicHandler>,
}

impl ThreadPerTask {
    pub fn new<S: Into<String>>(thread_name_prefix: S) -> Self {
        Self {
            thread_name_prefix: thread_name_prefix.into(),
            panic_handler: Arc::new(PanicHandler::new(PanicStrategy::default())),
        }
    }

    pub fn with_panic_strategy(mut self, strategy: PanicStrategy) -> Self {
        self.panic_handler = Arc::new(PanicHandler::new(strategy));
        self
    }

    pub fn panic_count(&self) -> usize {
        self.panic_handler.panic_count()
    }
}

impl Default for ThreadPerTask {
    fn default() -> Self {
        Self::new("handoff-task")
    }
}

impl Executor for ThreadPerTask {
    fn execute(&self, job: Job) -> Result<()> {
        let name = format!("{}-{}", self.thread_name_prefix, job.id().as_u64());
        let panic_handler = self.panic_handler.clone();

        thread::Builder::new()
            .name(name)
            .spawn(move || {
                let _ = panic_handler.execute(|| job.run());
            })
            .map_err(|e| Error::executor(format!("spawn failed: {}", e)))?;

        Ok(())
    }
}
