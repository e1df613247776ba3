use crate::{Point, Size};

/// A lightweight snapshot of the host-facing scroll geometry.
///
/// This is what observers receive when the engine invalidates scroll info, and what hosts can
/// capture/restore across sessions without coupling to any UI framework.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollInfo {
    pub viewport: Size,
    pub offset: Point,
    pub extent: Size,
}

impl ScrollInfo {
    /// Largest valid offset along each axis: `max(0, extent - viewport)`.
    pub fn max_offset(&self) -> Point {
        Point {
            x: (self.extent.width - self.viewport.width).max(0.0),
            y: (self.extent.height - self.viewport.height).max(0.0),
        }
    }
}

/// Why a pass was scheduled. Only used for diagnostics.
///
/// A pass run without anything pending reports `Remeasure`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PassTrigger {
    Viewport,
    Offset,
    Items,
    Remeasure,
}

/// The engine's position in its measure/arrange cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Measuring,
    Arranging,
}

/// What a completed pass did.
#[derive(Clone, Debug, PartialEq)]
pub struct PassReport {
    pub trigger: PassTrigger,
    pub window: crate::Window,
    pub extent: Size,
    pub offset: Point,
    /// Number of measure attempts, including the first one.
    pub attempts: usize,
    /// `false` when the retry cap was hit before the viewport was covered.
    pub covered: bool,
    /// `true` when this pass dispatched a `fetch_more`.
    pub fetch_dispatched: bool,
}
