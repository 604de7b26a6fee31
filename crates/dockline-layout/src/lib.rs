#![forbid(unsafe_code)]

//! Multi-splitter layout engine.
//!
//! A layout is a tree of rectangular items: leaves hold at most one opaque
//! guest payload, containers pack their visible children along a single
//! orientation, separated by a fixed gap, and span them across the other
//! axis. Hidden leaves stay in the tree as *placeholders* so a guest can be
//! restored to its previous position later.
//!
//! The engine is a pure geometric data structure: no rendering, no event
//! loop, no threads. It talks to the outside world through two narrow
//! seams — a [`HostSurface`] (the bounded region being laid out) and
//! [`Guest`]s (the leaf payloads) — and every operation completes
//! synchronously.
//!
//! ```no_run
//! use std::rc::Rc;
//! use dockline_layout::{LayoutTree, Location};
//! # use dockline_layout::host::HostSurface;
//! # fn host() -> Rc<dyn HostSurface> { unimplemented!() }
//!
//! let mut tree = LayoutTree::new(host());
//! let editor = tree.create_leaf("editor");
//! tree.insert_into_root(editor, Location::OnLeft);
//! let console = tree.create_leaf("console");
//! tree.insert_item(console, editor, Location::OnBottom);
//! assert!(tree.check_sanity());
//! ```

pub mod host;
pub mod item;
pub mod sizing;

pub use dockline_core::geometry::{Orientation, Point, Rect, Size};
pub use host::{Guest, HostSurface};
pub use item::{GrowthStrategy, ItemId, LayoutTree, RemoveMode};
pub use sizing::{
    HARD_MIN_HEIGHT, HARD_MIN_WIDTH, LengthOnSide, Location, SEPARATOR_THICKNESS, Side, SizingInfo,
};
