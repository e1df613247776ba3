use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::FetchError;
use crate::options::WakeCallback;

/// One `fetch_more` result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch<T> {
    pub items: Vec<T>,
    /// `true` once the data source has nothing more to yield.
    pub completed: bool,
}

impl<T> Batch<T> {
    /// A batch after which more data may follow.
    pub fn more(items: Vec<T>) -> Self {
        Self {
            items,
            completed: false,
        }
    }

    /// The final batch.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            completed: true,
        }
    }
}

pub(crate) struct Completion<T> {
    pub(crate) ticket: u64,
    pub(crate) outcome: Result<Batch<T>, FetchError>,
}

type Queue<T> = Mutex<VecDeque<Completion<T>>>;

/// The shared queue completions are posted into.
pub(crate) struct Inbox<T> {
    queue: Arc<Queue<T>>,
}

impl<T> Inbox<T> {
    pub(crate) fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub(crate) fn completer(&self, ticket: u64, wake: Option<WakeCallback>) -> FetchCompleter<T> {
        FetchCompleter {
            queue: Arc::downgrade(&self.queue),
            ticket,
            wake,
            resolved: false,
        }
    }

    pub(crate) fn take(&self) -> VecDeque<Completion<T>> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        core::mem::take(&mut *queue)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

/// Delivers the outcome of one `fetch_more` back to the engine.
///
/// The completer is `Send` (for `T: Send`), so a data source may resolve it from any thread or
/// task. Resolving never touches engine state directly: the outcome is queued and applied at
/// the start of the next pass, and the configured wake callback is invoked so the host can
/// schedule that pass.
///
/// Dropping a completer without resolving it delivers [`FetchError::Cancelled`]. Resolving
/// after the engine is gone is a no-op.
pub struct FetchCompleter<T> {
    queue: Weak<Queue<T>>,
    ticket: u64,
    wake: Option<WakeCallback>,
    resolved: bool,
}

impl<T> FetchCompleter<T> {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Whether the engine that issued this completer still exists.
    pub fn is_live(&self) -> bool {
        self.queue.strong_count() > 0
    }

    pub fn complete(self, batch: Batch<T>) -> bool {
        self.resolve(Ok(batch))
    }

    pub fn fail(self, message: impl Into<String>) -> bool {
        self.resolve(Err(FetchError::failed(message)))
    }

    /// Posts `outcome`. Returns `false` if the engine has been torn down.
    pub fn resolve(mut self, outcome: Result<Batch<T>, FetchError>) -> bool {
        self.deliver(outcome)
    }

    fn deliver(&mut self, outcome: Result<Batch<T>, FetchError>) -> bool {
        self.resolved = true;
        let Some(queue) = self.queue.upgrade() else {
            idebug!(ticket = self.ticket, "fetch resolved after teardown");
            return false;
        };
        queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Completion {
                ticket: self.ticket,
                outcome,
            });
        drop(queue);
        if let Some(wake) = &self.wake {
            wake();
        }
        true
    }
}

impl<T> Drop for FetchCompleter<T> {
    fn drop(&mut self) {
        if !self.resolved {
            self.deliver(Err(FetchError::Cancelled));
        }
    }
}

impl<T> fmt::Debug for FetchCompleter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchCompleter")
            .field("ticket", &self.ticket)
            .field("live", &self.is_live())
            .field("resolved", &self.resolved)
            .finish_non_exhaustive()
    }
}
