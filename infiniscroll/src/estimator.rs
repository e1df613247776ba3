use std::collections::BTreeMap;

use crate::types::non_negative;

/// Smallest per-item extent the window math divides by.
///
/// Items may legitimately measure `0.0` high; the estimate itself keeps that value, but index
/// math uses at least one content unit so a window never spans an unbounded number of items.
pub const MIN_ESTIMATE: f64 = 1.0;

/// How per-item heights are obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeightStrategy {
    /// Every item is exactly this tall.
    Uniform(f64),
    /// Heights are learned from measurements (running mean).
    #[default]
    Estimated,
}

/// Estimates the per-item height and the resulting content extent.
///
/// With [`HeightStrategy::Estimated`], the estimate is the mean over one sample per item index.
/// Re-measuring an index replaces its previous sample, so repeating a pass without new sizes
/// never moves the estimate. Samples are keyed sparsely by index; jumping deep into a long list
/// stores only what was measured there.
#[derive(Clone, Debug)]
pub struct ExtentEstimator {
    strategy: HeightStrategy,
    samples: BTreeMap<usize, f64>,
    sum: f64,
    count: usize,
}

impl ExtentEstimator {
    pub fn new(strategy: HeightStrategy) -> Self {
        let strategy = match strategy {
            HeightStrategy::Uniform(h) => HeightStrategy::Uniform(non_negative(h)),
            HeightStrategy::Estimated => HeightStrategy::Estimated,
        };
        Self {
            strategy,
            samples: BTreeMap::new(),
            sum: 0.0,
            count: 0,
        }
    }

    pub fn strategy(&self) -> HeightStrategy {
        self.strategy
    }

    /// Records the measured height of the item at `index`.
    ///
    /// No-op for the uniform strategy. Non-finite or negative heights are recorded as `0.0`.
    pub fn record_measurement(&mut self, index: usize, height: f64) {
        if let HeightStrategy::Uniform(_) = self.strategy {
            return;
        }
        let height = non_negative(height);
        match self.samples.insert(index, height) {
            Some(prev) => self.sum += height - prev,
            None => {
                self.sum += height;
                self.count += 1;
            }
        }
        self.sum = self.sum.max(0.0);
    }

    /// The current per-item height estimate, or `None` while nothing has been measured yet.
    pub fn estimate(&self) -> Option<f64> {
        match self.strategy {
            HeightStrategy::Uniform(h) => Some(h),
            HeightStrategy::Estimated if self.count == 0 => None,
            HeightStrategy::Estimated => Some(self.sum / self.count as f64),
        }
    }

    pub fn has_samples(&self) -> bool {
        self.estimate().is_some()
    }

    pub fn sample_count(&self) -> usize {
        self.count
    }

    /// Total extent of `item_count` items; `0.0` while the estimate is unknown.
    pub fn total_extent(&self, item_count: usize) -> f64 {
        self.estimate().unwrap_or(0.0) * item_count as f64
    }

    /// Shifts samples at or after `index` up by `count` slots (items were inserted).
    pub fn insert(&mut self, index: usize, count: usize) {
        if count == 0 {
            return;
        }
        let tail = self.samples.split_off(&index);
        self.samples.extend(tail.into_iter().map(|(i, h)| (i.saturating_add(count), h)));
    }

    /// Drops the samples of `[index, index + count)` and shifts later samples down.
    pub fn remove(&mut self, index: usize, count: usize) {
        if count == 0 {
            return;
        }
        let end = index.saturating_add(count);
        let mut removed = self.samples.split_off(&index);
        let rest = removed.split_off(&end);
        for (_, sample) in removed {
            self.forget_sample(sample);
        }
        self.samples.extend(rest.into_iter().map(|(i, h)| (i - count, h)));
    }

    /// Forgets the samples of `[index, index + count)` without shifting.
    pub fn invalidate(&mut self, index: usize, count: usize) {
        let end = index.saturating_add(count);
        let mut removed = self.samples.split_off(&index);
        let mut rest = removed.split_off(&end);
        self.samples.append(&mut rest);
        for (_, sample) in removed {
            self.forget_sample(sample);
        }
    }

    /// Forgets every sample. Only used on full teardown/reset.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = 0.0;
        self.count = 0;
    }

    fn forget_sample(&mut self, sample: f64) {
        self.sum = (self.sum - sample).max(0.0);
        self.count -= 1;
        if self.count == 0 {
            self.sum = 0.0;
        }
    }
}
