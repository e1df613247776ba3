use crate::fetch::Inbox;
use crate::options::WakeCallback;
use crate::{DataSource, LoadState, LoadTrigger, SentinelProbe, VisibilityEvent, Window};

/// What applying queued fetch outcomes did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Drained {
    /// Items appended to the data source.
    pub appended: usize,
    /// Whether the load state changed.
    pub state_changed: bool,
}

/// Couples a [`DataSource`] with the [`LoadTrigger`] and the completion inbox.
///
/// Trigger evaluation only *posts* a fetch decision; [`Loader::dispatch`] acts on it. Callers
/// run the dispatch after their layout pass has fully completed so `fetch_more` never runs in
/// the middle of one.
pub struct Loader<D: DataSource> {
    source: D,
    trigger: LoadTrigger,
    inbox: Inbox<D::Item>,
    ticket: u64,
    posted: bool,
    wake: Option<WakeCallback>,
}

impl<D: DataSource> Loader<D> {
    pub fn new(source: D, wake: Option<WakeCallback>) -> Self {
        Self {
            source,
            trigger: LoadTrigger::new(),
            inbox: Inbox::new(),
            ticket: 0,
            posted: false,
            wake,
        }
    }

    pub fn source(&self) -> &D {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut D {
        &mut self.source
    }

    pub fn into_source(self) -> D {
        self.source
    }

    pub fn state(&self) -> &LoadState {
        self.trigger.state()
    }

    /// Whether the trailing sentinel slot exists (the source has not signaled completion).
    pub fn has_sentinel(&self) -> bool {
        !self.trigger.state().is_completed()
    }

    /// Whether a fetch decision is waiting for [`Loader::dispatch`].
    pub fn is_posted(&self) -> bool {
        self.posted
    }

    /// Whether fetch outcomes are waiting for [`Loader::drain`].
    pub fn has_completions(&self) -> bool {
        !self.inbox.is_empty()
    }

    pub fn evaluate_window(&mut self, window: &Window) -> bool {
        let fired = self.trigger.evaluate_window(window);
        self.post(fired)
    }

    pub fn evaluate_visibility(&mut self, event: VisibilityEvent, probe: SentinelProbe) -> bool {
        let fired = self.trigger.evaluate_visibility(event, probe);
        self.post(fired)
    }

    /// Host-initiated load request (e.g. an explicit "load more" action).
    pub fn request(&mut self) -> bool {
        let fired = self.trigger.fire();
        self.post(fired)
    }

    /// Leaves `Errored` and posts a new fetch.
    pub fn retry(&mut self) -> bool {
        self.trigger.retry() && self.request()
    }

    fn post(&mut self, fired: bool) -> bool {
        if fired {
            idebug!(items = self.source.item_count(), "load-more fired");
            self.posted = true;
        }
        fired
    }

    /// Calls `fetch_more` for a posted decision. Returns `true` if a fetch was dispatched.
    pub fn dispatch(&mut self) -> bool {
        if !std::mem::take(&mut self.posted) {
            return false;
        }
        self.ticket = self.ticket.wrapping_add(1);
        idebug!(ticket = self.ticket, "fetch_more");
        let completer = self.inbox.completer(self.ticket, self.wake.clone());
        self.source.fetch_more(completer);
        true
    }

    /// Applies queued fetch outcomes.
    ///
    /// Outcomes from abandoned fetches (see [`Loader::cancel`]) are discarded.
    pub fn drain(&mut self) -> Drained {
        let mut drained = Drained::default();
        for completion in self.inbox.take() {
            if completion.ticket != self.ticket || !self.trigger.state().is_loading() {
                idebug!(ticket = completion.ticket, "discarding stale fetch outcome");
                continue;
            }
            match completion.outcome {
                Ok(batch) => {
                    let n = batch.items.len();
                    if n > 0 {
                        self.source.append(batch.items);
                    }
                    drained.appended += n;
                    drained.state_changed |= self.trigger.on_batch(batch.completed);
                    idebug!(appended = n, completed = batch.completed, "fetch completed");
                }
                Err(err) => {
                    iwarn!(%err, "fetch failed");
                    drained.state_changed |= self.trigger.on_error(err.to_string());
                }
            }
        }
        drained
    }

    /// Abandons an in-flight fetch: its outcome will be ignored and the trigger returns to
    /// `Idle`.
    pub fn cancel(&mut self) -> bool {
        self.posted = false;
        if !self.trigger.cancel() {
            return false;
        }
        self.ticket = self.ticket.wrapping_add(1);
        true
    }
}

impl<D: DataSource + core::fmt::Debug> core::fmt::Debug for Loader<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Loader")
            .field("source", &self.source)
            .field("state", self.trigger.state())
            .field("ticket", &self.ticket)
            .field("posted", &self.posted)
            .finish_non_exhaustive()
    }
}
