use super::{AsyncTask, TaskHandle};
use crate::config::Config;
use crate::error::Result;
use crate::executor::{Executor, ThreadPool};
use crate::looper::Looper;
use std::fmt;
use std::sync::Arc;

/// Runs tasks on a shared default executor.
#[derive(Clone)]
pub struct TaskRunner {
    executor: Arc<dyn Executor>,
}

impl TaskRunner {
    pub fn new<X>(executor: X) -> Self
    where
        X: Executor + 'static,
    {
        Self {
            executor: Arc::new(executor),
        }
    }

    pub fn from_arc(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Runner backed by a fresh [`ThreadPool`].
    pub fn with_config(config: &Config) -> Result<Self> {
        Ok(Self::new(ThreadPool::new(config)?))
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    pub fn run<R, E>(&self, task: AsyncTask<R, E>, looper: &Looper) -> Result<TaskHandle>
    where
        R: Send + 'static,
        E: Send + 'static,
    {
        task.execute(&*self.executor, looper)
    }
}

impl fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRunner").finish_non_exhaustive()
    }
}
