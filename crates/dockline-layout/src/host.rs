#![forbid(unsafe_code)]

//! The two seams between the engine and its embedder.
//!
//! The engine owns geometry decisions inside the host surface's bounds; it
//! never owns guests. Guests are held through `Weak` references and may be
//! dropped by the embedder at any moment — the embedder reports such events
//! through the hooks on [`LayoutTree`](crate::LayoutTree)
//! (`on_guest_destroyed`, `on_guest_reparented`, `on_layout_invalidated`).

use std::rc::Rc;

use dockline_core::geometry::{Rect, Size};

/// The bounded 2D region a layout tree paints into.
///
/// The root container's rectangle equals `bounds()`.
pub trait HostSurface {
    /// Current extent of the surface.
    fn bounds(&self) -> Size;

    /// Move an attached guest onto another host surface.
    ///
    /// Called only while retargeting a tree; must be a no-op when the guest
    /// is already on `new_host`.
    fn reparent(&self, guest: &Rc<dyn Guest>, new_host: &Rc<dyn HostSurface>);

    /// Instruct a guest to adopt a rectangle in host (root) coordinates.
    fn notify_guest_geometry(&self, guest: &Rc<dyn Guest>, rect: Rect);
}

/// The opaque payload a leaf presents.
pub trait Guest {
    /// Minimum size, queried on attach and whenever the guest invalidates
    /// its layout.
    fn minimum_size(&self) -> Size;

    /// Current rectangle in host coordinates, queried once on attach.
    fn geometry(&self) -> Rect;

    /// Shown/hidden together with placeholder transitions.
    fn set_visible(&self, visible: bool);
}
