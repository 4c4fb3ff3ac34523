use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure errors.
///
/// Errors raised by a task's unit of work never end up here: they are handed
/// to the task's failure hook untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("executor error: {0}")]
    Executor(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("executor has been shut down")]
    ShutDown,

    #[error("looper is gone")]
    LooperGone,

    #[error("timed out after {0:?} with completions outstanding")]
    Timeout(Duration),
}

impl Error {
    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
}
