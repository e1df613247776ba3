use std::sync::Arc;

use infiniscroll::{
    DataSource, Drained, LoadState, LoadStateCallback, Loader, SentinelProbe, VisibilityEvent,
    WakeCallback,
};

/// What [`UnvirtualizedFeed::poll`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeedUpdate {
    pub appended: usize,
    pub state_changed: bool,
    pub dispatched: bool,
}

/// Callbacks for [`UnvirtualizedFeed`], installed before the initial load fires.
#[derive(Clone, Default)]
pub struct FeedOptions {
    pub on_load_state: Option<LoadStateCallback>,
    pub on_wake: Option<WakeCallback>,
}

impl FeedOptions {
    pub fn with_on_load_state(
        mut self,
        on_load_state: Option<impl Fn(&LoadState) + Send + Sync + 'static>,
    ) -> Self {
        self.on_load_state = on_load_state.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_wake(mut self, on_wake: Option<impl Fn() + Send + Sync + 'static>) -> Self {
        self.on_wake = on_wake.map(|f| Arc::new(f) as _);
        self
    }
}

impl core::fmt::Debug for FeedOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FeedOptions")
            .field("on_load_state", &self.on_load_state.is_some())
            .field("on_wake", &self.on_wake.is_some())
            .finish()
    }
}

/// Infinite loading for a list that renders every item (no virtualization).
///
/// The host owns layout. It reports where the trailing sentinel sits after each layout or
/// scroll event, and calls [`UnvirtualizedFeed::poll`] once its own layout work is done (and
/// whenever the wake callback fires) to apply delivered batches and start posted fetches.
///
/// Attaching a source fires one load immediately; the `Loading` transition reaches
/// [`FeedOptions::on_load_state`] before the fetch is dispatched.
pub struct UnvirtualizedFeed<D: DataSource> {
    loader: Loader<D>,
    on_load_state: Option<LoadStateCallback>,
}

impl<D: DataSource> UnvirtualizedFeed<D> {
    pub fn attach(source: D, options: FeedOptions) -> Self {
        let mut feed = Self {
            loader: Loader::new(source, options.on_wake),
            on_load_state: options.on_load_state,
        };
        adebug!(items = feed.loader.source().item_count(), "feed attached");
        if feed.request_load() {
            feed.loader.dispatch();
        }
        feed
    }

    pub fn source(&self) -> &D {
        self.loader.source()
    }

    pub fn source_mut(&mut self) -> &mut D {
        self.loader.source_mut()
    }

    pub fn state(&self) -> &LoadState {
        self.loader.state()
    }

    /// Whether the host should keep rendering the trailing sentinel.
    pub fn has_sentinel(&self) -> bool {
        self.loader.has_sentinel()
    }

    /// Whether [`UnvirtualizedFeed::poll`] has work to do.
    pub fn needs_poll(&self) -> bool {
        self.loader.is_posted() || self.loader.has_completions()
    }

    /// The content was laid out; `probe` locates the sentinel.
    pub fn on_layout(&mut self, probe: SentinelProbe) -> bool {
        self.evaluate(VisibilityEvent::Layout, probe)
    }

    /// The host scrolled by `vertical_delta`; `probe` locates the sentinel afterwards.
    pub fn on_scroll(&mut self, vertical_delta: f64, probe: SentinelProbe) -> bool {
        self.evaluate(VisibilityEvent::Scrolled { vertical_delta }, probe)
    }

    fn evaluate(&mut self, event: VisibilityEvent, probe: SentinelProbe) -> bool {
        let fired = self.loader.evaluate_visibility(event, probe);
        if fired {
            self.notify();
        }
        fired
    }

    /// Host-initiated load (e.g. a "load more" button).
    pub fn request_load(&mut self) -> bool {
        let fired = self.loader.request();
        if fired {
            self.notify();
        }
        fired
    }

    pub fn retry(&mut self) -> bool {
        let retried = self.loader.retry();
        if retried {
            self.notify();
        }
        retried
    }

    /// Applies delivered batches, then dispatches a posted fetch.
    pub fn poll(&mut self) -> FeedUpdate {
        let Drained {
            appended,
            state_changed,
        } = self.loader.drain();
        if state_changed {
            self.notify();
        }
        FeedUpdate {
            appended,
            state_changed,
            dispatched: self.loader.dispatch(),
        }
    }

    /// Abandons any in-flight fetch and hands the source back.
    pub fn detach(mut self) -> D {
        self.loader.cancel();
        self.loader.into_source()
    }

    fn notify(&self) {
        if let Some(cb) = &self.on_load_state {
            cb(self.loader.state());
        }
    }
}

impl<D: DataSource + core::fmt::Debug> core::fmt::Debug for UnvirtualizedFeed<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UnvirtualizedFeed")
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}
