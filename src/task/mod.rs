//! Single-shot background tasks.
//!
//! An [`AsyncTask`] pairs a unit of work with up to three hooks:
//!
//! - `on_before_execute` runs synchronously on the calling thread, before the
//!   work is dispatched;
//! - `on_finish` receives the value the work produced;
//! - `on_catch` receives whatever the work failed with, including a panic.
//!
//! The work runs on the supplied [`Executor`]. Exactly one of `on_finish` and
//! `on_catch` then runs, once, on the thread that owns the [`Looper`] passed
//! to [`AsyncTask::execute`], the next time that looper is drained.
//!
//! ```no_run
//! use handoff::prelude::*;
//! use std::time::Duration;
//!
//! let pool = ThreadPool::with_threads(1).unwrap();
//! let looper = Looper::new();
//!
//! AsyncTask::new(|| "42".parse::<u32>())
//!     .on_finish(|n| println!("parsed {}", n))
//!     .on_catch(|caught| eprintln!("failed: {}", caught))
//!     .execute(&pool, &looper)
//!     .unwrap();
//!
//! looper.run_until_idle(Duration::from_secs(1)).unwrap();
//! ```

pub mod runner;
pub mod status;

pub use runner::TaskRunner;
pub use status::{Status, TaskId};

use crate::error::Result;
use crate::executor::{Executor, Job, PanicInfo};
use crate::looper::{Looper, Outcome};
use status::StatusCell;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, warn};

type Work<R, E> = Box<dyn FnOnce() -> std::result::Result<R, E> + Send>;

/// What a failed unit of work left behind.
#[derive(Debug)]
pub enum Caught<E> {
    /// The work returned `Err`.
    Error(E),
    /// The work panicked.
    Panic(PanicInfo),
}

impl<E> Caught<E> {
    pub fn is_panic(&self) -> bool {
        matches!(self, Caught::Panic(_))
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            Caught::Error(e) => Some(e),
            Caught::Panic(_) => None,
        }
    }

    pub fn into_error(self) -> Option<E> {
        match self {
            Caught::Error(e) => Some(e),
            Caught::Panic(_) => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for Caught<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caught::Error(e) => e.fmt(f),
            Caught::Panic(info) => write!(f, "task panicked: {}", info),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for Caught<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Caught::Error(e) => Some(e),
            Caught::Panic(_) => None,
        }
    }
}

/// A unit of work plus the hooks to run around it.
pub struct AsyncTask<R, E> {
    work: Work<R, E>,
    before: Option<Box<dyn FnOnce()>>,
    finish: Option<Box<dyn FnOnce(R)>>,
    catch: Option<Box<dyn FnOnce(Caught<E>)>>,
}

impl<R, E> AsyncTask<R, E>
where
    R: Send + 'static,
    E: Send + 'static,
{
    pub fn new<W>(work: W) -> Self
    where
        W: FnOnce() -> std::result::Result<R, E> + Send + 'static,
    {
        Self {
            work: Box::new(work),
            before: None,
            finish: None,
            catch: None,
        }
    }

    pub fn on_before_execute<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        self.before = Some(Box::new(f));
        self
    }

    pub fn on_finish<F>(mut self, f: F) -> Self
    where
        F: FnOnce(R) + 'static,
    {
        self.finish = Some(Box::new(f));
        self
    }

    pub fn on_catch<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Caught<E>) + 'static,
    {
        self.catch = Some(Box::new(f));
        self
    }

    /// Run the before hook, then hand the work to `executor`.
    ///
    /// Completion hooks run on `looper`'s thread when it is drained. If the
    /// executor refuses the job no completion hook will ever run and the
    /// executor's error is returned.
    pub fn execute<X>(self, executor: &X, looper: &Looper) -> Result<TaskHandle>
    where
        X: Executor + ?Sized,
    {
        let id = TaskId::next();
        let status = Arc::new(StatusCell::new());

        if let Some(before) = self.before {
            before();
        }

        looper.register(id, completion(id, status.clone(), self.finish, self.catch));

        let job = dispatch(id, status.clone(), self.work, looper);
        if let Err(e) = executor.execute(job) {
            looper.withdraw(id);
            warn!(task = %id, error = %e, "executor rejected task");
            return Err(e);
        }

        debug!(task = %id, "task dispatched");
        Ok(TaskHandle { id, status })
    }
}

impl<R, E> fmt::Debug for AsyncTask<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncTask")
            .field("on_before_execute", &self.before.is_some())
            .field("on_finish", &self.finish.is_some())
            .field("on_catch", &self.catch.is_some())
            .finish()
    }
}

// runs on the worker
fn dispatch<R, E>(id: TaskId, status: Arc<StatusCell>, work: Work<R, E>, looper: &Looper) -> Job
where
    R: Send + 'static,
    E: Send + 'static,
{
    let handle = looper.handle();

    Job::new(move || {
        status.set(Status::Running);

        let result: std::result::Result<R, Caught<E>> = match catch_unwind(AssertUnwindSafe(work))
        {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(Caught::Error(e)),
            Err(payload) => {
                let info = PanicInfo::from_payload(payload);
                warn!(task = %id, message = %info, "task panicked");
                Err(Caught::Panic(info))
            }
        };

        if handle.complete(id, Box::new(result)).is_err() {
            warn!(task = %id, "looper gone, dropping task outcome");
        }
    })
}

// runs on the looper
fn completion<R, E>(
    id: TaskId,
    status: Arc<StatusCell>,
    finish: Option<Box<dyn FnOnce(R)>>,
    catch: Option<Box<dyn FnOnce(Caught<E>)>>,
) -> Box<dyn FnOnce(Outcome)>
where
    R: Send + 'static,
    E: Send + 'static,
{
    Box::new(move |outcome: Outcome| {
        let result = match outcome.downcast::<std::result::Result<R, Caught<E>>>() {
            Ok(result) => *result,
            Err(_) => {
                error!(task = %id, "task outcome has unexpected type");
                return;
            }
        };

        match result {
            Ok(value) => {
                status.set(Status::Finished);
                debug!(task = %id, "task finished");
                if let Some(finish) = finish {
                    finish(value);
                }
            }
            Err(caught) => {
                status.set(Status::Failed);
                match catch {
                    Some(catch) => {
                        debug!(task = %id, panic = caught.is_panic(), "task failed");
                        catch(caught);
                    }
                    None => warn!(task = %id, panic = caught.is_panic(), "task failed with no failure hook"),
                }
            }
        }
    })
}

/// Observes one execution after it has been dispatched.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    status: Arc<StatusCell>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn status(&self) -> Status {
        self.status.get()
    }

    /// True once a completion hook has been invoked.
    pub fn is_done(&self) -> bool {
        self.status().is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::executor::{ThreadPerTask, ThreadPool};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(1);

    struct Rejecting;

    impl Executor for Rejecting {
        fn execute(&self, _job: Job) -> Result<()> {
            Err(Error::ShutDown)
        }
    }

    #[test]
    fn test_status_progression() {
        let pool = ThreadPool::with_threads(1).unwrap();
        let looper = Looper::new();
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);

        let handle = AsyncTask::new(move || -> std::result::Result<(), ()> {
            release_rx.recv().unwrap();
            Ok(())
        })
        .execute(&pool, &looper)
        .unwrap();

        assert!(!handle.is_done());
        release_tx.send(()).unwrap();

        looper.run_until_idle(TIMEOUT).unwrap();
        assert_eq!(handle.status(), Status::Finished);
        assert!(handle.is_done());
    }

    #[test]
    fn test_failure_status() {
        let pool = ThreadPool::with_threads(1).unwrap();
        let looper = Looper::new();

        let handle = AsyncTask::new(|| Err::<(), _>("nope"))
            .execute(&pool, &looper)
            .unwrap();

        looper.run_until_idle(TIMEOUT).unwrap();
        assert_eq!(handle.status(), Status::Failed);
    }

    #[test]
    fn test_panic_reaches_failure_hook() {
        let pool = ThreadPool::with_threads(1).unwrap();
        let looper = Looper::new();
        let caught = Rc::new(RefCell::new(None));
        let caught_clone = caught.clone();

        AsyncTask::new(|| -> std::result::Result<u8, String> { panic!("worker blew up") })
            .on_finish(|_| panic!("finish called despite panic"))
            .on_catch(move |c| *caught_clone.borrow_mut() = Some(c))
            .execute(&pool, &looper)
            .unwrap();

        looper.run_until_idle(TIMEOUT).unwrap();

        let caught = caught.borrow_mut().take().unwrap();
        assert!(caught.is_panic());
        assert_eq!(caught.to_string(), "task panicked: worker blew up");
        assert_eq!(pool.panic_count(), 0);
    }

    #[test]
    fn test_panicking_hook_keeps_looper_alive() {
        let pool = ThreadPool::with_threads(1).unwrap();
        let looper = Looper::new();
        let delivered = Rc::new(RefCell::new(None));
        let delivered_clone = delivered.clone();

        let first = AsyncTask::new(|| Ok::<_, ()>(1))
            .on_finish(|_| panic!("hook blew up"))
            .execute(&pool, &looper)
            .unwrap();
        looper.run_until_idle(TIMEOUT).unwrap();

        assert_eq!(looper.panic_count(), 1);
        assert_eq!(first.status(), Status::Finished);

        let second = AsyncTask::new(|| Ok::<_, ()>(2))
            .on_finish(move |v| *delivered_clone.borrow_mut() = Some(v))
            .execute(&pool, &looper)
            .unwrap();
        looper.run_until_idle(TIMEOUT).unwrap();

        assert_eq!(*delivered.borrow(), Some(2));
        assert_eq!(second.status(), Status::Finished);
        assert_eq!(looper.panic_count(), 1);
    }

    #[test]
    fn test_rejected_task_runs_no_completion() {
        let looper = Looper::new();
        let before = Rc::new(RefCell::new(false));
        let before_clone = before.clone();

        let result = AsyncTask::new(|| Ok::<_, ()>(1))
            .on_before_execute(move || *before_clone.borrow_mut() = true)
            .on_finish(|_| panic!("finish on rejected task"))
            .on_catch(|_| panic!("catch on rejected task"))
            .execute(&Rejecting, &looper);

        assert!(matches!(result, Err(Error::ShutDown)));
        assert!(*before.borrow());
        assert_eq!(looper.outstanding(), 0);
        assert_eq!(looper.poll(), 0);
    }

    #[test]
    fn test_no_hooks_is_fine() {
        let looper = Looper::new();

        AsyncTask::new(|| Err::<(), _>(std::io::Error::other("ignored")))
            .execute(&ThreadPerTask::default(), &looper)
            .unwrap();

        looper.run_until_idle(TIMEOUT).unwrap();
        assert_eq!(looper.panic_count(), 0);
    }

    #[test]
    fn test_dropped_looper_discards_outcome() {
        let pool = ThreadPool::with_threads(1).unwrap();
        let looper = Looper::new();

        let handle = AsyncTask::new(|| Ok::<_, ()>(3))
            .on_finish(|_| panic!("finish after looper dropped"))
            .execute(&pool, &looper)
            .unwrap();
        drop(looper);

        pool.shutdown();
        assert_eq!(handle.status(), Status::Running);
        assert_eq!(pool.panic_count(), 0);
    }

    #[test]
    fn test_hook_may_start_another_task() {
        let pool = Arc::new(ThreadPool::with_threads(2).unwrap());
        let looper = Rc::new(Looper::new());
        let results = Rc::new(RefCell::new(Vec::new()));

        let pool_inner = pool.clone();
        let looper_inner = looper.clone();
        let results_outer = results.clone();
        let results_inner = results.clone();

        AsyncTask::new(|| Ok::<_, ()>(1))
            .on_finish(move |first| {
                results_outer.borrow_mut().push(first);
                AsyncTask::new(move || Ok::<_, ()>(first + 1))
                    .on_finish(move |second| results_inner.borrow_mut().push(second))
                    .execute(&pool_inner, &looper_inner)
                    .unwrap();
            })
            .execute(&pool, &looper)
            .unwrap();

        looper.run_until_idle(TIMEOUT).unwrap();
        assert_eq!(*results.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_caught_accessors() {
        let caught: Caught<&str> = Caught::Error("bad");
        assert_eq!(caught.error(), Some(&"bad"));
        assert!(!caught.is_panic());
        assert_eq!(caught.into_error(), Some("bad"));

        let panicked: Caught<&str> = Caught::Panic(PanicInfo {
            message: "x".to_string(),
        });
        assert!(panicked.error().is_none());
        assert!(panicked.into_error().is_none());
    }
}
