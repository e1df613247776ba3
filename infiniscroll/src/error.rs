use thiserror::Error;

use crate::Slot;

/// Why a `fetch_more` did not produce a batch.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The data source reported a failure.
    #[error("{0}")]
    Failed(String),
    /// The completer was dropped without being resolved.
    #[error("fetch was dropped before it completed")]
    Cancelled,
}

impl FetchError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// A broken realized-set invariant.
///
/// These are bugs, not runtime conditions: debug builds assert, release builds log the
/// violation and recover by dropping the offending handle.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("two handles bound to {0:?}")]
    DoubleBinding(Slot),
    #[error("realized handles out of slot order")]
    Disordered,
    #[error("handle bound to {0:?} survived reconciliation outside the window")]
    Stale(Slot),
}

pub(crate) fn report(violation: InvariantViolation) {
    iwarn!(%violation, "realized-set invariant violated");
    if cfg!(debug_assertions) {
        panic!("realized-set invariant violated: {violation}");
    }
}
