/// A scroll axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollDirection {
    Forward,
    Backward,
}

impl ScrollDirection {
    pub(crate) fn signum(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    Start,
    Center,
    End,
    Auto,
}

/// A width/height pair in content units.
///
/// Used for the viewport, the content extent, and measured handle sizes. Hosts may hand in
/// transient garbage (negative or NaN sizes during layout); [`Size::sanitized`] maps those to
/// zero instead of failing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns a copy where every non-finite or negative component is replaced by `0.0`.
    pub fn sanitized(self) -> Self {
        Self {
            width: non_negative(self.width),
            height: non_negative(self.height),
        }
    }

    pub fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }
}

/// A position in content units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }

    pub(crate) fn with(mut self, axis: Axis, value: f64) -> Self {
        match axis {
            Axis::Horizontal => self.x = value,
            Axis::Vertical => self.y = value,
        }
        self
    }
}

/// A half-open index range `[first, last)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexRange {
    pub first: usize,
    pub last: usize, // exclusive
}

impl IndexRange {
    pub const EMPTY: Self = Self { first: 0, last: 0 };

    pub fn new(first: usize, last: usize) -> Self {
        Self {
            first,
            last: last.max(first),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first >= self.last
    }

    pub fn len(&self) -> usize {
        self.last.saturating_sub(self.first)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.first <= index && index < self.last
    }
}

/// A logical position a handle can be bound to.
///
/// Slots order by index, and the sentinel sorts after every item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Slot {
    Item(usize),
    /// The trailing "load more" position.
    Sentinel,
}

impl Slot {
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Item(i) => Some(*i),
            Self::Sentinel => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Sentinel)
    }
}

/// The set of slots that must be realized for one pass.
///
/// `range` is expressed over the slot sequence, where position `item_count` is the sentinel
/// when `sentinel` is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    pub range: IndexRange,
    pub item_count: usize,
    pub sentinel: bool,
}

impl Window {
    pub fn slot_count(&self) -> usize {
        self.item_count + usize::from(self.sentinel)
    }

    pub fn includes_sentinel(&self) -> bool {
        self.sentinel && self.range.last > self.item_count
    }

    /// Whether the range reaches the end of the items while the sentinel is modeled.
    ///
    /// True as soon as the last item is in range, whether or not the sentinel slot itself is.
    pub fn reaches_tail(&self) -> bool {
        self.sentinel && self.range.last >= self.item_count
    }

    pub fn contains(&self, slot: Slot) -> bool {
        match slot {
            Slot::Item(i) => i < self.item_count && self.range.contains(i),
            Slot::Sentinel => self.includes_sentinel(),
        }
    }

    /// Iterates the required slots in ascending order.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        let items_end = self.range.last.min(self.item_count);
        let first = self.range.first.min(items_end);
        (first..items_end)
            .map(Slot::Item)
            .chain(self.includes_sentinel().then_some(Slot::Sentinel))
    }
}

/// The state of the load-more state machine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Completed,
    Errored(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

pub(crate) fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

/// A change the host made to the item sequence outside of `fetch_more`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemsChange {
    Inserted { index: usize, count: usize },
    Removed { index: usize, count: usize },
    Replaced { index: usize, count: usize },
    Moved { from: usize, to: usize },
    Reset,
}

impl ItemsChange {
    /// Where the item that was at `slot` lives after the change, or `None` if its handle must
    /// be recycled.
    pub fn remap(&self, slot: Slot) -> Option<Slot> {
        let Slot::Item(i) = slot else {
            return Some(slot);
        };
        let mapped = match *self {
            Self::Inserted { index, count } if i >= index => i + count,
            Self::Inserted { .. } => i,
            Self::Removed { index, count } if i >= index && i - index < count => return None,
            Self::Removed { index, count } if i >= index => i - count,
            Self::Removed { .. } => i,
            Self::Replaced { index, count } if i >= index && i - index < count => return None,
            Self::Replaced { .. } => i,
            Self::Moved { from, .. } if i == from => return None,
            Self::Moved { from, to } if from < to && i > from && i <= to => i - 1,
            Self::Moved { from, to } if to < from && i >= to && i < from => i + 1,
            Self::Moved { .. } => i,
            Self::Reset => return None,
        };
        Some(Slot::Item(mapped))
    }
}
