//! A message queue bound to the thread that created it.
//!
//! Worker threads cannot call back into the initiating thread directly, so
//! they post to its [`Looper`] instead and the owning thread drains the queue
//! with [`Looper::poll`], [`Looper::run_once`] or [`Looper::run_until_idle`].
//!
//! Completion hooks are registered on the owning thread and never leave it:
//! only the task's outcome crosses threads. This is why hooks do not need to
//! be `Send`.

use crate::error::{Error, Result};
use crate::executor::{PanicHandler, PanicStrategy};
use crate::task::TaskId;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// Type-erased task outcome carried from a worker back to the looper.
pub(crate) type Outcome = Box<dyn Any + Send>;

type Completion = Box<dyn FnOnce(Outcome)>;

enum Message {
    Run(Box<dyn FnOnce() + Send>),
    Complete { id: TaskId, outcome: Outcome },
}

pub struct Looper {
    sender: Sender<Message>,
    receiver: Receiver<Message>,
    completions: RefCell<HashMap<TaskId, Completion>>,
    thread_id: ThreadId,
    panic_handler: PanicHandler,
}

impl Looper {
    /// Create a looper bound to the current thread.
    pub fn new() -> Self {
        Self::with_panic_strategy(PanicStrategy::LogAndContinue)
    }

    pub fn with_panic_strategy(strategy: PanicStrategy) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            completions: RefCell::new(HashMap::new()),
            thread_id: thread::current().id(),
            panic_handler: PanicHandler::new(strategy),
        }
    }

    pub fn handle(&self) -> LooperHandle {
        LooperHandle {
            sender: self.sender.clone(),
            thread_id: self.thread_id,
        }
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Completions registered but not yet delivered.
    pub fn outstanding(&self) -> usize {
        self.completions.borrow().len()
    }

    /// Panics caught while running posted callbacks or hooks.
    pub fn panic_count(&self) -> usize {
        self.panic_handler.panic_count()
    }

    /// Run every message already queued, without blocking.
    ///
    /// Messages posted by the callbacks themselves wait for the next call.
    pub fn poll(&self) -> usize {
        let ready = self.receiver.len();
        let mut ran = 0;
        for _ in 0..ready {
            match self.receiver.try_recv() {
                Ok(msg) => {
                    self.dispatch(msg);
                    ran += 1;
                }
                Err(_) => break,
            }
        }
        ran
    }

    /// Wait up to `timeout` for one message and run it.
    pub fn run_once(&self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(msg) => {
                self.dispatch(msg);
                true
            }
            Err(_) => false,
        }
    }

    /// Run messages until no completion is outstanding.
    pub fn run_until_idle(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;

        while self.outstanding() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(msg) => self.dispatch(msg),
                Err(RecvTimeoutError::Timeout) => return Err(Error::Timeout(timeout)),
                Err(RecvTimeoutError::Disconnected) => return Err(Error::LooperGone),
            }
        }

        Ok(())
    }

    pub(crate) fn register(&self, id: TaskId, completion: Completion) {
        debug_assert!(self.is_current());
        self.completions.borrow_mut().insert(id, completion);
    }

    pub(crate) fn withdraw(&self, id: TaskId) -> bool {
        self.completions.borrow_mut().remove(&id).is_some()
    }

    fn dispatch(&self, msg: Message) {
        match msg {
            Message::Run(f) => {
                let _ = self.panic_handler.execute(f);
            }
            Message::Complete { id, outcome } => {
                // release the borrow first, the hook may register new tasks
                let completion = self.completions.borrow_mut().remove(&id);
                match completion {
                    Some(completion) => {
                        trace!(task = id.as_u64(), "delivering completion");
                        let _ = self.panic_handler.execute(|| completion(outcome));
                    }
                    None => warn!(task = id.as_u64(), "completion for unknown task"),
                }
            }
        }
    }
}

impl Default for Looper {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Looper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Looper")
            .field("thread_id", &self.thread_id)
            .field("queued", &self.receiver.len())
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

/// Sendable handle for posting to a [`Looper`] from any thread.
#[derive(Clone)]
pub struct LooperHandle {
    sender: Sender<Message>,
    thread_id: ThreadId,
}

impl LooperHandle {
    /// Queue `f` to run on the looper's thread.
    pub fn post<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.send(Message::Run(Box::new(f)))
    }

    /// The thread the looper is bound to.
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    pub(crate) fn complete(&self, id: TaskId, outcome: Outcome) -> Result<()> {
        self.send(Message::Complete { id, outcome })
    }

    fn send(&self, msg: Message) -> Result<()> {
        self.sender.send(msg).map_err(|_| Error::LooperGone)
    }
}

impl fmt::Debug for LooperHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LooperHandle")
            .field("thread_id", &self.thread_id)
            .finish()
    }
}
