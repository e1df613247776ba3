use core::fmt;

use infiniscroll::{Batch, DataSource, FetchCompleter};

/// A data source that pages through a lazy, fallible item iterator.
///
/// Each `fetch_more` pulls up to `batch_size` items. Running out of items completes the
/// sequence; the iterator is dropped at that point and never polled again.
///
/// An item error fails the fetch. Items pulled earlier in the same batch are delivered first,
/// and the error then fails the following fetch. A retry keeps pulling from the same iterator.
pub struct PagedSource<I, T> {
    items: Vec<T>,
    iter: Option<I>,
    batch_size: usize,
    deferred_error: Option<String>,
}

impl<I, T, E> PagedSource<I, T>
where
    I: Iterator<Item = Result<T, E>>,
    E: fmt::Display,
{
    /// `batch_size` is clamped to at least one item per fetch.
    pub fn new(iter: impl IntoIterator<IntoIter = I>, batch_size: usize) -> Self {
        Self {
            items: Vec::new(),
            iter: Some(iter.into_iter()),
            batch_size: batch_size.max(1),
            deferred_error: None,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size.max(1);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Whether the underlying iterator has been exhausted.
    pub fn is_exhausted(&self) -> bool {
        self.iter.is_none()
    }

    fn next_batch(&mut self) -> Result<Batch<T>, String> {
        if let Some(message) = self.deferred_error.take() {
            return Err(message);
        }
        let Some(iter) = self.iter.as_mut() else {
            return Ok(Batch::last(Vec::new()));
        };

        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            match iter.next() {
                Some(Ok(item)) => batch.push(item),
                Some(Err(err)) if batch.is_empty() => return Err(err.to_string()),
                Some(Err(err)) => {
                    self.deferred_error = Some(err.to_string());
                    return Ok(Batch::more(batch));
                }
                None => {
                    self.iter = None;
                    return Ok(Batch::last(batch));
                }
            }
        }
        Ok(Batch::more(batch))
    }
}

impl<I, T, E> DataSource for PagedSource<I, T>
where
    I: Iterator<Item = Result<T, E>>,
    E: fmt::Display,
{
    type Item = T;

    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn item_at(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    fn fetch_more(&mut self, completer: FetchCompleter<T>) {
        match self.next_batch() {
            Ok(batch) => {
                completer.complete(batch);
            }
            Err(message) => {
                completer.fail(message);
            }
        }
    }

    fn append(&mut self, items: Vec<T>) {
        self.items.extend(items);
    }
}

impl<I, T: fmt::Debug> fmt::Debug for PagedSource<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedSource")
            .field("items", &self.items)
            .field("exhausted", &self.iter.is_none())
            .field("batch_size", &self.batch_size)
            .field("deferred_error", &self.deferred_error)
            .finish()
    }
}
