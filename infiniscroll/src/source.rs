use crate::FetchCompleter;

/// The collaborator that owns the logical item sequence and knows how to grow it.
///
/// The engine only ever calls `fetch_more` from `Idle` (so never while a previous fetch is
/// unresolved), and applies a delivered batch through `append` at the start of the next pass.
pub trait DataSource {
    type Item;

    fn item_count(&self) -> usize;

    fn item_at(&self, index: usize) -> Option<&Self::Item>;

    /// Starts fetching the next batch.
    ///
    /// Must not block on the fetch: resolve `completer` later (from any thread), or right away
    /// when the batch is already at hand.
    fn fetch_more(&mut self, completer: FetchCompleter<Self::Item>);

    /// Appends a delivered batch to the logical sequence.
    fn append(&mut self, items: Vec<Self::Item>);
}

impl<T> DataSource for Vec<T> {
    type Item = T;

    fn item_count(&self) -> usize {
        self.len()
    }

    fn item_at(&self, index: usize) -> Option<&T> {
        self.get(index)
    }

    /// A plain vector is already complete.
    fn fetch_more(&mut self, completer: FetchCompleter<T>) {
        completer.complete(crate::Batch::last(Vec::new()));
    }

    fn append(&mut self, items: Vec<T>) {
        self.extend(items);
    }
}
