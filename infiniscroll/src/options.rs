use std::sync::Arc;

use crate::{HeightStrategy, LoadState, ScrollInfo, Size};

/// A callback fired when the extent or offset changed for a reason other than the caller's
/// own request (aka "invalidate scroll info").
pub type InvalidateCallback = Arc<dyn Fn(ScrollInfo) + Send + Sync>;

/// A callback fired on every load-state transition. Fetch failures surface here as
/// [`LoadState::Errored`].
pub type LoadStateCallback = Arc<dyn Fn(&LoadState) + Send + Sync>;

/// A callback fired (possibly from another thread) when a fetch outcome has been queued and a
/// new pass should be scheduled.
pub type WakeCallback = Arc<dyn Fn() + Send + Sync>;

/// Configuration for [`crate::Engine`].
///
/// Cheap to clone: callbacks are stored in `Arc`s.
#[derive(Clone)]
pub struct EngineOptions {
    pub height_strategy: HeightStrategy,

    /// Extra slots realized past the last (partially) visible one.
    pub viewport_slack: usize,

    /// Upper bound on measure attempts per pass (at least one).
    ///
    /// A pass re-measures when the realized window does not cover the viewport. Items that
    /// report zero height would otherwise keep the engine re-measuring forever.
    pub max_remeasure_passes: usize,

    /// How many recycled handles are kept for reuse instead of being destroyed.
    pub pool_capacity: usize,

    /// Lines scrolled per mouse-wheel notch.
    pub wheel_lines: u32,

    /// Line step along the horizontal axis (the vertical line step is the item estimate).
    pub cross_line_step: f64,

    /// The initial viewport size.
    pub initial_viewport: Option<Size>,

    pub on_invalidate: Option<InvalidateCallback>,
    pub on_load_state: Option<LoadStateCallback>,
    pub on_wake: Option<WakeCallback>,
}

impl EngineOptions {
    pub fn new(height_strategy: HeightStrategy) -> Self {
        Self {
            height_strategy,
            viewport_slack: 1,
            max_remeasure_passes: 3,
            pool_capacity: 0,
            wheel_lines: 3,
            cross_line_step: 16.0,
            initial_viewport: None,
            on_invalidate: None,
            on_load_state: None,
            on_wake: None,
        }
    }

    /// Options for items that all share `item_height`.
    pub fn uniform(item_height: f64) -> Self {
        Self::new(HeightStrategy::Uniform(item_height))
    }

    /// Options for variable-height items whose height is learned from measurements.
    pub fn estimated() -> Self {
        Self::new(HeightStrategy::Estimated)
    }

    pub fn with_viewport_slack(mut self, viewport_slack: usize) -> Self {
        self.viewport_slack = viewport_slack;
        self
    }

    pub fn with_max_remeasure_passes(mut self, passes: usize) -> Self {
        self.max_remeasure_passes = passes.max(1);
        self
    }

    pub fn with_pool_capacity(mut self, pool_capacity: usize) -> Self {
        self.pool_capacity = pool_capacity;
        self
    }

    pub fn with_wheel_lines(mut self, wheel_lines: u32) -> Self {
        self.wheel_lines = wheel_lines;
        self
    }

    pub fn with_cross_line_step(mut self, step: f64) -> Self {
        self.cross_line_step = step;
        self
    }

    pub fn with_initial_viewport(mut self, viewport: Option<Size>) -> Self {
        self.initial_viewport = viewport;
        self
    }

    pub fn with_on_invalidate(
        mut self,
        on_invalidate: Option<impl Fn(ScrollInfo) + Send + Sync + 'static>,
    ) -> Self {
        self.on_invalidate = on_invalidate.map(|f| Arc::new(f) as _);
        self
    }

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

impl Default for EngineOptions {
    fn default() -> Self {
        Self::estimated()
    }
}

impl core::fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EngineOptions")
            .field("height_strategy", &self.height_strategy)
            .field("viewport_slack", &self.viewport_slack)
            .field("max_remeasure_passes", &self.max_remeasure_passes)
            .field("pool_capacity", &self.pool_capacity)
            .field("wheel_lines", &self.wheel_lines)
            .field("cross_line_step", &self.cross_line_step)
            .field("initial_viewport", &self.initial_viewport)
            .finish_non_exhaustive()
    }
}
