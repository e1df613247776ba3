//! A headless engine for virtualized, incrementally loaded lists.
//!
//! For host-side helpers (paged and threaded data sources, a non-virtualized feed), see the
//! `infiniscroll-adapter` crate.
//!
//! Only the items intersecting the viewport (plus a configurable slack) are realized as
//! rendering handles. Handles leaving the window are recycled, the total extent is estimated
//! from measured items, and a trailing sentinel slot triggers asynchronous "load more" fetches.
//!
//! It is UI-agnostic. A TUI/GUI layer is expected to provide:
//! - a [`RenderSurface`] that creates, measures and arranges handles
//! - a [`DataSource`] that holds the items and fetches more of them
//! - viewport size and scroll offset updates, followed by [`Engine::run_pass`]
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod engine;
mod error;
mod estimator;
mod fetch;
mod loader;
mod options;
mod recycler;
mod source;
mod state;
mod surface;
mod trigger;
mod types;
mod window;

#[cfg(test)]
mod tests;

pub use engine::Engine;
pub use error::{FetchError, InvariantViolation};
pub use estimator::{ExtentEstimator, HeightStrategy, MIN_ESTIMATE};
pub use fetch::{Batch, FetchCompleter};
pub use loader::{Drained, Loader};
pub use options::{EngineOptions, InvalidateCallback, LoadStateCallback, WakeCallback};
pub use recycler::{HandleLifecycle, Realized, Recycler};
pub use source::DataSource;
pub use state::{PassReport, PassTrigger, Phase, ScrollInfo};
pub use surface::RenderSurface;
pub use trigger::{LoadTrigger, SentinelProbe, VisibilityEvent};
pub use types::{
    Align, Axis, IndexRange, ItemsChange, LoadState, Point, ScrollDirection, Size, Slot, Window,
};
pub use window::{compute_range, leading_edge};
