#![forbid(unsafe_code)]

//! Core: geometric primitives shared by the dockline layout engine.

pub mod geometry;

pub use geometry::{Orientation, Point, Rect, Size};
