use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a task execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Lifecycle of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    /// Accepted, waiting for a worker.
    Pending = 0,
    /// The unit of work is running.
    Running = 1,
    /// The success hook has been invoked.
    Finished = 2,
    /// The failure hook has been invoked.
    Failed = 3,
}

impl Status {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Status::Pending,
            1 => Status::Running,
            2 => Status::Finished,
            _ => Status::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Finished | Status::Failed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Pending => "pending",
            Status::Running => "running",
            Status::Finished => "finished",
            Status::Failed => "failed",
        };
        f.write_str(s)
    }
}

// shared between the handle, the worker and the looper
#[derive(Debug)]
pub(crate) struct StatusCell(AtomicU8);

impl StatusCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(Status::Pending as u8))
    }

    pub fn get(&self) -> Status {
        Status::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, status: Status) {
        self.0.store(status as u8, Ordering::Release);
    }
}
