use crate::estimator::{ExtentEstimator, MIN_ESTIMATE};
use crate::types::non_negative;
use crate::{IndexRange, Point, Size, Window};

/// Computes the slots that must be realized for the given geometry.
///
/// The range is expressed over the slot sequence: `item_count` items followed by the sentinel
/// when `sentinel` is set.
///
/// - Until the estimator has a sample, the window is `[0, 1)`: realize one slot to get a
///   first measurement.
/// - Otherwise `first = floor(offset.y / estimate)` (clamped to `item_count`) and
///   `last = first + ceil(viewport.height / estimate) + slack`, capped at the slot count.
pub fn compute_range(
    offset: Point,
    viewport: Size,
    item_count: usize,
    sentinel: bool,
    estimator: &ExtentEstimator,
    slack: usize,
) -> Window {
    let slots = item_count + usize::from(sentinel);
    let window = |range| Window {
        range,
        item_count,
        sentinel,
    };

    let Some(estimate) = estimator.estimate() else {
        return window(IndexRange::new(0, slots.min(1)));
    };
    let estimate = estimate.max(MIN_ESTIMATE);
    let offset_y = non_negative(offset.y);
    let viewport_h = non_negative(viewport.height);

    let first = ((offset_y / estimate).floor() as usize).min(item_count);
    let visible = (viewport_h / estimate).ceil() as usize;
    let last = first
        .saturating_add(visible)
        .saturating_add(slack)
        .min(slots);
    window(IndexRange::new(first, last))
}

/// Leading-edge offset of the first realized slot: `-(offset.y mod estimate)`.
///
/// Returns `0.0` while the estimate is unknown.
pub fn leading_edge(offset: Point, estimator: &ExtentEstimator) -> f64 {
    match estimator.estimate() {
        Some(estimate) => -(non_negative(offset.y) % estimate.max(MIN_ESTIMATE)),
        None => 0.0,
    }
}
