//! Execution contexts.
//!
//! An [`Executor`] takes a [`Job`] and runs it on some thread other than the
//! caller's. Two implementations are provided: a fixed-size [`ThreadPool`]
//! and [`ThreadPerTask`], which spawns a fresh thread for every job.

pub mod job;
pub mod panic_handler;
pub mod thread_per_task;
pub mod thread_pool;
mod worker;

pub use job::{Job, JobId};
pub use panic_handler::{PanicHandler, PanicInfo, PanicStrategy};
pub use thread_per_task::ThreadPerTask;
pub use thread_pool::ThreadPool;

use crate::error::Result;
use std::sync::Arc;

/// Something that can run jobs off the calling thread.
pub trait Executor: Send + Sync {
    /// Hand `job` over for execution.
    ///
    /// Returns an error if the job was not accepted, in which case it is
    /// dropped without running.
    fn execute(&self, job: Job) -> Result<()>;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, job: Job) -> Result<()> {
        (**self).execute(job)
    }
}
