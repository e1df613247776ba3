use crate::{LoadState, Window};

/// What made a sentinel-visibility check run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VisibilityEvent {
    /// The content was laid out (or resized).
    Layout,
    /// The host scrolled; only a non-zero vertical delta can trigger a load.
    Scrolled { vertical_delta: f64 },
}

/// Where the trailing sentinel currently sits relative to its container.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SentinelProbe {
    /// Top edge of the sentinel, relative to the container's top edge.
    pub sentinel_top: f64,
    /// The container's visible height.
    pub container_height: f64,
}

impl SentinelProbe {
    pub fn new(sentinel_top: f64, container_height: f64) -> Self {
        Self {
            sentinel_top,
            container_height,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.sentinel_top < self.container_height
    }
}

/// The load-more state machine.
///
/// ```text
/// Idle --fire--> Loading --batch--> Idle
///                        --completed--> Completed
///                        --error--> Errored --retry--> Idle
/// ```
///
/// `fire` only succeeds from `Idle`, which is what keeps at most one fetch in flight.
#[derive(Clone, Debug, Default)]
pub struct LoadTrigger {
    state: LoadState,
}

impl LoadTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// `Idle -> Loading`. Returns `true` if the caller should dispatch a fetch.
    pub fn fire(&mut self) -> bool {
        if self.state != LoadState::Idle {
            return false;
        }
        self.state = LoadState::Loading;
        true
    }

    /// Fires when the window's upper bound reaches index `item_count` or the sentinel slot.
    pub fn evaluate_window(&mut self, window: &Window) -> bool {
        window.reaches_tail() && self.fire()
    }

    /// Fires when the sentinel has scrolled into the container.
    ///
    /// Scroll notifications without vertical movement never fire.
    pub fn evaluate_visibility(&mut self, event: VisibilityEvent, probe: SentinelProbe) -> bool {
        if let VisibilityEvent::Scrolled { vertical_delta } = event {
            if vertical_delta == 0.0 || vertical_delta.is_nan() {
                return false;
            }
        }
        probe.is_visible() && self.fire()
    }

    /// `Loading -> Idle | Completed`.
    pub fn on_batch(&mut self, completed: bool) -> bool {
        if !self.state.is_loading() {
            return false;
        }
        self.state = if completed {
            LoadState::Completed
        } else {
            LoadState::Idle
        };
        true
    }

    /// `Loading -> Errored`.
    pub fn on_error(&mut self, message: impl Into<String>) -> bool {
        if !self.state.is_loading() {
            return false;
        }
        self.state = LoadState::Errored(message.into());
        true
    }

    /// `Errored -> Idle`. A later evaluation may then fire again.
    pub fn retry(&mut self) -> bool {
        if !matches!(self.state, LoadState::Errored(_)) {
            return false;
        }
        self.state = LoadState::Idle;
        true
    }

    /// `Loading -> Idle` without an outcome, used when an in-flight fetch is abandoned.
    pub fn cancel(&mut self) -> bool {
        if !self.state.is_loading() {
            return false;
        }
        self.state = LoadState::Idle;
        true
    }
}
