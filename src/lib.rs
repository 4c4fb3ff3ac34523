//! handoff - single-shot background tasks that report back home
//!
//! Run a unit of work on a worker thread and get its result, or whatever it
//! failed with, delivered to a hook on the thread that started it.
//!
//! # Quick Start
//!
//! ```no_run
//! use handoff::prelude::*;
//! use std::time::Duration;
//!
//! let pool = ThreadPool::with_threads(2).unwrap();
//! let looper = Looper::new();
//!
//! AsyncTask::new(|| Ok::<_, std::io::Error>(std::thread::current().id()))
//!     .on_before_execute(|| println!("starting"))
//!     .on_finish(|worker| println!("ran on {:?}", worker))
//!     .on_catch(|caught| eprintln!("failed: {}", caught))
//!     .execute(&pool, &looper)
//!     .unwrap();
//!
//! // hooks run here, on this thread
//! looper.run_until_idle(Duration::from_secs(1)).unwrap();
//! ```
//!
//! # Pieces
//!
//! - [`executor`]: where work runs (a fixed [`ThreadPool`] or [`ThreadPerTask`])
//! - [`looper`]: the per-thread queue completion hooks are delivered through
//! - [`task`]: [`AsyncTask`] itself, its [`TaskHandle`] and the [`TaskRunner`]
//! - [`snippet`]: first-paragraph share text for article pages
//!
//! The library emits `tracing` events but never installs a subscriber.

#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod looper;
pub mod prelude;
pub mod snippet;
pub mod task;

pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use executor::{Executor, Job, PanicStrategy, ThreadPerTask, ThreadPool};
pub use looper::{Looper, LooperHandle};
pub use task::{AsyncTask, Caught, Status, TaskHandle, TaskId, TaskRunner};
