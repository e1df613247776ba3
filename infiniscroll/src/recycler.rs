use core::mem;

use crate::error::{InvariantViolation, report};
use crate::{Slot, Window};

/// Creates and reclaims handles on behalf of the [`Recycler`].
///
/// `realize` is the factory (it may hand back a pooled handle rebound to `slot`); `recycle` is
/// the destroyer (it may pool the handle instead of destroying it).
pub trait HandleLifecycle<H> {
    fn realize(&mut self, slot: Slot) -> H;
    fn recycle(&mut self, slot: Slot, handle: H);
}

struct FnLifecycle<F, G> {
    factory: F,
    destroyer: G,
}

impl<H, F, G> HandleLifecycle<H> for FnLifecycle<F, G>
where
    F: FnMut(Slot) -> H,
    G: FnMut(Slot, H),
{
    fn realize(&mut self, slot: Slot) -> H {
        (self.factory)(slot)
    }

    fn recycle(&mut self, slot: Slot, handle: H) {
        (self.destroyer)(slot, handle)
    }
}

/// A handle together with the slot it is bound to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Realized<H> {
    pub slot: Slot,
    pub handle: H,
}

/// Owns the realized handles and keeps them in strictly ascending slot order.
///
/// Every reconciliation is a linear merge of the surviving handles with the required slots:
/// survivors are never rebound in place, so a slot that leaves and re-enters the window gets a
/// fresh (or freshly rebound) handle.
#[derive(Clone, Debug)]
pub struct Recycler<H> {
    realized: Vec<Realized<H>>,
}

impl<H> Default for Recycler<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Recycler<H> {
    pub fn new() -> Self {
        Self {
            realized: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.realized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.realized.is_empty()
    }

    pub fn realized(&self) -> &[Realized<H>] {
        &self.realized
    }

    pub fn realized_mut(&mut self) -> &mut [Realized<H>] {
        &mut self.realized
    }

    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.realized.iter().map(|r| r.slot)
    }

    pub fn get(&self, slot: Slot) -> Option<&H> {
        self.realized
            .binary_search_by(|r| r.slot.cmp(&slot))
            .ok()
            .map(|i| &self.realized[i].handle)
    }

    pub fn contains(&self, slot: Slot) -> bool {
        self.get(slot).is_some()
    }

    /// Reconciles the realized set against `window`.
    ///
    /// Handles bound outside the window are recycled first, then every missing slot is
    /// realized at its ordered position. Calling this again with the same window performs no
    /// lifecycle calls.
    pub fn reconcile(
        &mut self,
        window: &Window,
        lifecycle: &mut impl HandleLifecycle<H>,
    ) -> &[Realized<H>] {
        let previous = mem::take(&mut self.realized);
        let mut kept = Vec::with_capacity(previous.len());
        for r in previous {
            if window.contains(r.slot) {
                kept.push(r);
            } else {
                itrace!(slot = ?r.slot, "recycle");
                lifecycle.recycle(r.slot, r.handle);
            }
        }
        let kept = restore_order(kept, lifecycle);

        let mut out = Vec::with_capacity(window.range.len());
        let mut kept = kept.into_iter().peekable();
        for slot in window.slots() {
            if let Some(r) = kept.next_if(|r| r.slot == slot) {
                out.push(r);
            } else {
                itrace!(?slot, "realize");
                out.push(Realized {
                    slot,
                    handle: lifecycle.realize(slot),
                });
            }
        }
        for stale in kept {
            report(InvariantViolation::Stale(stale.slot));
            lifecycle.recycle(stale.slot, stale.handle);
        }

        self.realized = out;
        &self.realized
    }

    /// Closure flavour of [`Recycler::reconcile`].
    pub fn reconcile_with(
        &mut self,
        window: &Window,
        factory: impl FnMut(Slot) -> H,
        destroyer: impl FnMut(Slot, H),
    ) -> &[Realized<H>] {
        let mut lifecycle = FnLifecycle { factory, destroyer };
        self.reconcile(window, &mut lifecycle)
    }

    /// Recycles the handle bound to `slot`, if any.
    pub fn release(&mut self, slot: Slot, lifecycle: &mut impl HandleLifecycle<H>) -> bool {
        match self.realized.binary_search_by(|r| r.slot.cmp(&slot)) {
            Ok(i) => {
                let r = self.realized.remove(i);
                lifecycle.recycle(r.slot, r.handle);
                true
            }
            Err(_) => false,
        }
    }

    /// Rebinds every realized handle through `map`, recycling those mapped to `None`.
    ///
    /// Used when the item sequence changes underneath the window (inserts, removals, moves).
    /// `map` is expected to be monotonic on the slots it keeps.
    pub fn remap(
        &mut self,
        mut map: impl FnMut(Slot) -> Option<Slot>,
        lifecycle: &mut impl HandleLifecycle<H>,
    ) {
        let previous = mem::take(&mut self.realized);
        let mut kept = Vec::with_capacity(previous.len());
        for r in previous {
            match map(r.slot) {
                Some(slot) => kept.push(Realized {
                    slot,
                    handle: r.handle,
                }),
                None => lifecycle.recycle(r.slot, r.handle),
            }
        }
        self.realized = restore_order(kept, lifecycle);
    }

    /// Recycles every realized handle.
    pub fn clear(&mut self, lifecycle: &mut impl HandleLifecycle<H>) {
        for r in self.realized.drain(..) {
            lifecycle.recycle(r.slot, r.handle);
        }
    }
}

fn restore_order<H>(
    mut realized: Vec<Realized<H>>,
    lifecycle: &mut impl HandleLifecycle<H>,
) -> Vec<Realized<H>> {
    if realized.windows(2).all(|w| w[0].slot < w[1].slot) {
        return realized;
    }
    report(InvariantViolation::Disordered);
    realized.sort_by_key(|r| r.slot);

    let mut out: Vec<Realized<H>> = Vec::with_capacity(realized.len());
    for r in realized {
        if out.last().is_some_and(|prev| prev.slot == r.slot) {
            report(InvariantViolation::DoubleBinding(r.slot));
            lifecycle.recycle(r.slot, r.handle);
        } else {
            out.push(r);
        }
    }
    out
}
