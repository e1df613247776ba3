//! Host-side helpers for the `infiniscroll` crate.
//!
//! The `infiniscroll` crate is UI-agnostic and only knows its collaborators through the
//! `DataSource` and `RenderSurface` traits. This crate provides small, framework-neutral pieces
//! commonly needed around it:
//!
//! - [`PagedSource`]: pages through a lazy, fallible iterator in fixed-size batches
//! - [`ThreadedSource`]: runs each fetch on a worker thread
//! - [`UnvirtualizedFeed`]: infinite loading for lists that render every item
//!
//! This crate is intentionally framework-agnostic (no ratatui/egui bindings).
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod feed;
mod paged;
mod threaded;


pub use feed::{FeedOptions, FeedUpdate, UnvirtualizedFeed};
pub use paged::PagedSource;
pub use threaded::{PageRequest, ThreadedSource, WorkerError};
