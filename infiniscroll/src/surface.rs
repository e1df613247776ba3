use crate::{Point, Size, Slot};

/// The collaborator that turns realized slots into something on screen.
///
/// Handles are opaque to the engine. Measurement is expected to be synchronous and free of
/// side effects beyond returning a size.
pub trait RenderSurface<T> {
    type Handle;

    /// Creates a handle for `slot`. `item` is `None` for the sentinel.
    fn create_handle(&mut self, slot: Slot, item: Option<&T>) -> Self::Handle;

    fn destroy_handle(&mut self, handle: Self::Handle);

    /// Rebinds a pooled handle to a new slot.
    ///
    /// The default destroys the handle and creates a new one.
    fn rebind_handle(&mut self, handle: Self::Handle, slot: Slot, item: Option<&T>) -> Self::Handle {
        self.destroy_handle(handle);
        self.create_handle(slot, item)
    }

    /// Returns the desired size of `handle` under `constraint`.
    ///
    /// An infinite constraint component means "unconstrained".
    fn measure(&mut self, handle: &Self::Handle, constraint: Size) -> Size;

    /// Places `handle` at `position` (relative to the viewport's top-left corner).
    fn arrange(&mut self, handle: &mut Self::Handle, position: Point, size: Size);
}
