pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::executor::{Executor, Job, PanicStrategy, ThreadPerTask, ThreadPool};
pub use crate::looper::{Looper, LooperHandle};
pub use crate::task::{AsyncTask, Caught, Status, TaskHandle, TaskRunner};
