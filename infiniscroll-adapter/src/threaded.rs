use std::sync::Arc;
use std::thread::{self, JoinHandle};

use infiniscroll::{Batch, DataSource, FetchCompleter};
use thiserror::Error;

/// Describes the page a worker is asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageRequest {
    /// Zero-based page number (one per `fetch_more`).
    pub page: usize,
    /// Number of items already in the sequence.
    pub offset: usize,
}

/// The worker could not be started.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to spawn fetch worker: {0}")]
    Spawn(#[from] std::io::Error),
}

type FetchFn<T> = Arc<dyn Fn(PageRequest) -> Result<Batch<T>, String> + Send + Sync>;

/// A data source whose fetches run on a worker thread.
///
/// Every `fetch_more` spawns a named thread that calls the fetch function and resolves the
/// completer from there. If the fetch function panics, the completer is dropped during unwinding
/// and the engine sees a cancelled fetch.
pub struct ThreadedSource<T> {
    items: Vec<T>,
    fetch: FetchFn<T>,
    page: usize,
    worker: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> ThreadedSource<T> {
    pub fn new(
        fetch: impl Fn(PageRequest) -> Result<Batch<T>, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            items: Vec::new(),
            fetch: Arc::new(fetch),
            page: 0,
            worker: None,
        }
    }

    pub fn with_items(mut self, items: Vec<T>) -> Self {
        self.items = items;
        self
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of fetches started so far.
    pub fn pages_requested(&self) -> usize {
        self.page
    }

    /// Whether a worker has been started and not yet joined.
    pub fn has_worker(&self) -> bool {
        self.worker.is_some()
    }

    /// Waits for the most recent worker. Returns `false` if it panicked.
    pub fn join(&mut self) -> bool {
        match self.worker.take() {
            Some(worker) => worker.join().is_ok(),
            None => true,
        }
    }

    fn spawn(&mut self, completer: FetchCompleter<T>) -> Result<(), WorkerError> {
        let request = PageRequest {
            page: self.page,
            offset: self.items.len(),
        };
        self.page += 1;
        let fetch = Arc::clone(&self.fetch);
        let worker = thread::Builder::new()
            .name(format!("infiniscroll-fetch-{}", request.page))
            .spawn(move || {
                let outcome = fetch(request);
                completer.resolve(outcome.map_err(infiniscroll::FetchError::Failed));
            })?;
        self.worker = Some(worker);
        Ok(())
    }
}

impl<T: Send + 'static> DataSource for ThreadedSource<T> {
    type Item = T;

    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn item_at(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    fn fetch_more(&mut self, completer: FetchCompleter<T>) {
        // Only the spawn can fail here, and the completer moved into the closure is dropped
        // with it, which reports the fetch as cancelled.
        if let Err(_err) = self.spawn(completer) {
            awarn!(err = %_err, "fetch worker not started");
        }
    }

    fn append(&mut self, items: Vec<T>) {
        self.items.extend(items);
    }
}

impl<T> core::fmt::Debug for ThreadedSource<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ThreadedSource")
            .field("items", &self.items.len())
            .field("page", &self.page)
            .field("worker", &self.worker.is_some())
            .finish_non_exhaustive()
    }
}
