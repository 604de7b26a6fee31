#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! All coordinates are `i32` pixels, origin at top-left. Right and bottom
//! edges are exclusive. Layout arithmetic (grow/shrink deltas, coordinate
//! mapping) may transiently produce negative values, so the types are signed
//! throughout.

use serde::{Deserialize, Serialize};

/// Packing axis of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Children packed left to right.
    Horizontal,
    /// Children packed top to bottom.
    Vertical,
}

impl Orientation {
    /// The perpendicular axis.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

/// A point in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate along the given axis.
    #[inline]
    #[must_use]
    pub const fn pos(self, o: Orientation) -> i32 {
        match o {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }

    /// Component-wise sum.
    #[inline]
    #[must_use]
    pub const fn translated(self, by: Point) -> Self {
        Self::new(self.x + by.x, self.y + by.y)
    }

    /// Component-wise difference.
    #[inline]
    #[must_use]
    pub const fn untranslated(self, by: Point) -> Self {
        Self::new(self.x - by.x, self.y - by.y)
    }
}

/// A size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Zero in both dimensions.
    pub const ZERO: Self = Self::new(0, 0);

    /// Check if either dimension is non-positive.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Check if both dimensions are zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.width == 0 && self.height == 0
    }

    /// Extent along the given axis.
    #[inline]
    #[must_use]
    pub const fn length(self, o: Orientation) -> i32 {
        match o {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    /// Copy with the extent along `o` replaced.
    #[inline]
    #[must_use]
    pub const fn with_length(self, len: i32, o: Orientation) -> Self {
        match o {
            Orientation::Horizontal => Self::new(len, self.height),
            Orientation::Vertical => Self::new(self.width, len),
        }
    }

    /// Component-wise maximum.
    #[inline]
    #[must_use]
    pub fn expanded_to(self, other: Size) -> Self {
        Self::new(self.width.max(other.width), self.height.max(other.height))
    }

    /// Component-wise minimum.
    #[inline]
    #[must_use]
    pub fn bounded_to(self, other: Size) -> Self {
        Self::new(self.width.min(other.width), self.height.min(other.height))
    }

    /// Component-wise sum.
    #[inline]
    #[must_use]
    pub const fn grown_by(self, other: Size) -> Self {
        Self::new(self.width + other.width, self.height + other.height)
    }

    /// Component-wise difference.
    #[inline]
    #[must_use]
    pub const fn shrunk_by(self, other: Size) -> Self {
        Self::new(self.width - other.width, self.height - other.height)
    }
}

/// A rectangle for layout bounds and hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Create a rectangle from a top-left point and a size.
    #[inline]
    pub const fn from_point_size(top_left: Point, size: Size) -> Self {
        Self::new(top_left.x, top_left.y, size.width, size.height)
    }

    /// Left edge (inclusive). Alias for `self.x`.
    #[inline]
    pub const fn left(&self) -> i32 {
        self.x
    }

    /// Top edge (inclusive). Alias for `self.y`.
    #[inline]
    pub const fn top(&self) -> i32 {
        self.y
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Top-left corner.
    #[inline]
    #[must_use]
    pub const fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Extent in both dimensions.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Check if either dimension is non-positive.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Extent along the given axis.
    #[inline]
    #[must_use]
    pub const fn length(&self, o: Orientation) -> i32 {
        self.size().length(o)
    }

    /// Position of the near edge along the given axis.
    #[inline]
    #[must_use]
    pub const fn pos(&self, o: Orientation) -> i32 {
        self.top_left().pos(o)
    }

    /// Position of the far (exclusive) edge along the given axis.
    #[inline]
    #[must_use]
    pub const fn end(&self, o: Orientation) -> i32 {
        self.pos(o) + self.length(o)
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Check if another rectangle is fully inside this one.
    ///
    /// Empty rectangles contain nothing and are contained by nothing.
    #[inline]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Copy with a new top-left corner, size preserved.
    #[inline]
    #[must_use]
    pub const fn moved_to(&self, top_left: Point) -> Self {
        Self::from_point_size(top_left, self.size())
    }

    /// Copy with a new size, position preserved.
    #[inline]
    #[must_use]
    pub const fn with_size(&self, size: Size) -> Self {
        Self::from_point_size(self.top_left(), size)
    }

    /// Copy shifted by an offset.
    #[inline]
    #[must_use]
    pub const fn translated(&self, by: Point) -> Self {
        Self::from_point_size(self.top_left().translated(by), self.size())
    }

    /// Copy with the near edge along `o` moved by `d_start` and the far edge
    /// moved by `d_end`.
    ///
    /// Positive deltas move both edges toward the far side: `(0, -n)` shrinks
    /// from the far edge, `(n, 0)` shrinks from the near edge.
    #[must_use]
    pub const fn adjusted_along(&self, o: Orientation, d_start: i32, d_end: i32) -> Self {
        match o {
            Orientation::Horizontal => Self::new(
                self.x + d_start,
                self.y,
                self.width + d_end - d_start,
                self.height,
            ),
            Orientation::Vertical => Self::new(
                self.x,
                self.y + d_start,
                self.width,
                self.height + d_end - d_start,
            ),
        }
    }

    /// Copy with the near edge along `o` at `pos`, far edge preserved.
    #[must_use]
    pub const fn with_near_edge(&self, o: Orientation, pos: i32) -> Self {
        match o {
            Orientation::Horizontal => Self::new(pos, self.y, self.right() - pos, self.height),
            Orientation::Vertical => Self::new(self.x, pos, self.width, self.bottom() - pos),
        }
    }

    /// Copy with the far (exclusive) edge along `o` at `end`, near edge
    /// preserved.
    #[must_use]
    pub const fn with_far_edge(&self, o: Orientation, end: i32) -> Self {
        match o {
            Orientation::Horizontal => Self::new(self.x, self.y, end - self.x, self.height),
            Orientation::Vertical => Self::new(self.x, self.y, self.width, end - self.y),
        }
    }

    /// Compute the intersection with another rectangle.
    ///
    /// Returns the default (empty) rectangle if there is no overlap.
    #[inline]
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Rect::new(x, y, right - x, bottom - y)
        } else {
            Rect::default()
        }
    }

    /// The smallest rectangle containing both inputs.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        Rect::new(x, y, right - x, bottom - y)
    }
}

#[cfg(test)]
mod tests {
    use super::{Orientation, Point, Rect, Size};

    // --- Orientation ---

    #[test]
    fn orientation_opposite_is_involutive() {
        assert_eq!(Orientation::Horizontal.opposite(), Orientation::Vertical);
        assert_eq!(Orientation::Vertical.opposite(), Orientation::Horizontal);
        assert_eq!(
            Orientation::Horizontal.opposite().opposite(),
            Orientation::Horizontal
        );
    }

    // --- Point ---

    #[test]
    fn point_pos_projects_axis() {
        let p = Point::new(3, 9);
        assert_eq!(p.pos(Orientation::Horizontal), 3);
        assert_eq!(p.pos(Orientation::Vertical), 9);
    }

    #[test]
    fn point_translate_round_trips() {
        let p = Point::new(10, -4);
        let by = Point::new(-3, 7);
        assert_eq!(p.translated(by).untranslated(by), p);
    }

    // --- Size ---

    #[test]
    fn size_length_and_with_length() {
        let sz = Size::new(100, 60);
        assert_eq!(sz.length(Orientation::Horizontal), 100);
        assert_eq!(sz.length(Orientation::Vertical), 60);
        assert_eq!(sz.with_length(80, Orientation::Horizontal), Size::new(80, 60));
        assert_eq!(sz.with_length(80, Orientation::Vertical), Size::new(100, 80));
    }

    #[test]
    fn size_is_empty_on_non_positive() {
        assert!(Size::new(0, 10).is_empty());
        assert!(Size::new(10, 0).is_empty());
        assert!(Size::new(-5, 10).is_empty());
        assert!(!Size::new(1, 1).is_empty());
    }

    #[test]
    fn size_expanded_and_bounded() {
        let a = Size::new(100, 40);
        let b = Size::new(60, 90);
        assert_eq!(a.expanded_to(b), Size::new(100, 90));
        assert_eq!(a.bounded_to(b), Size::new(60, 40));
    }

    #[test]
    fn size_grow_shrink_round_trips() {
        let a = Size::new(300, 200);
        let d = Size::new(17, -6);
        assert_eq!(a.grown_by(d).shrunk_by(d), a);
    }

    // --- Rect accessors ---

    #[test]
    fn rect_edges_are_exclusive() {
        let r = Rect::new(10, 20, 30, 40);
        assert_eq!(r.left(), 10);
        assert_eq!(r.top(), 20);
        assert_eq!(r.right(), 40);
        assert_eq!(r.bottom(), 60);
        assert_eq!(r.end(Orientation::Horizontal), 40);
        assert_eq!(r.end(Orientation::Vertical), 60);
    }

    #[test]
    fn rect_contains_boundary_conditions() {
        let r = Rect::new(0, 0, 5, 5);
        assert!(r.contains(Point::new(0, 0)));
        assert!(r.contains(Point::new(4, 4)));
        assert!(!r.contains(Point::new(5, 0)));
        assert!(!r.contains(Point::new(0, 5)));
    }

    #[test]
    fn rect_contains_rect_requires_full_overlap() {
        let outer = Rect::new(0, 0, 100, 100);
        assert!(outer.contains_rect(&Rect::new(10, 10, 50, 50)));
        assert!(outer.contains_rect(&outer));
        assert!(!outer.contains_rect(&Rect::new(60, 60, 50, 50)));
        assert!(!outer.contains_rect(&Rect::new(0, 0, 0, 10)));
    }

    // --- Rect algebra ---

    #[test]
    fn rect_intersection_overlaps() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(2, 2, 4, 4);
        assert_eq!(a.intersection(&b), Rect::new(2, 2, 2, 2));
    }

    #[test]
    fn rect_intersection_adjacent_is_empty() {
        let a = Rect::new(0, 0, 5, 5);
        let b = Rect::new(5, 0, 5, 5);
        assert!(a.intersection(&b).is_empty());
    }

    #[test]
    fn rect_union_contains_both() {
        let a = Rect::new(0, 0, 5, 5);
        let b = Rect::new(3, 3, 5, 5);
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0, 0, 8, 8));
        assert!(u.contains_rect(&a));
        assert!(u.contains_rect(&b));
    }

    // --- Edge adjustment ---

    #[test]
    fn rect_adjusted_along_shrinks_far_edge() {
        let r = Rect::new(0, 0, 100, 60);
        let shrunk = r.adjusted_along(Orientation::Horizontal, 0, -20);
        assert_eq!(shrunk, Rect::new(0, 0, 80, 60));
    }

    #[test]
    fn rect_adjusted_along_shrinks_near_edge() {
        let r = Rect::new(10, 10, 100, 60);
        let shrunk = r.adjusted_along(Orientation::Vertical, 20, 0);
        assert_eq!(shrunk, Rect::new(10, 30, 100, 40));
    }

    #[test]
    fn rect_near_far_edge_setters_preserve_opposite_edge() {
        let r = Rect::new(10, 10, 100, 60);
        let near = r.with_near_edge(Orientation::Horizontal, 30);
        assert_eq!(near, Rect::new(30, 10, 80, 60));
        assert_eq!(near.right(), r.right());

        let far = r.with_far_edge(Orientation::Vertical, 50);
        assert_eq!(far, Rect::new(10, 10, 100, 40));
        assert_eq!(far.top(), r.top());
    }

    // --- Mapping helpers ---

    #[test]
    fn rect_translated_moves_without_resizing() {
        let r = Rect::new(5, 5, 20, 30);
        let t = r.translated(Point::new(-5, 10));
        assert_eq!(t, Rect::new(0, 15, 20, 30));
        assert_eq!(t.size(), r.size());
    }

    #[test]
    fn rect_moved_to_and_with_size() {
        let r = Rect::new(5, 5, 20, 30);
        assert_eq!(r.moved_to(Point::new(0, 0)), Rect::new(0, 0, 20, 30));
        assert_eq!(r.with_size(Size::new(7, 8)), Rect::new(5, 5, 7, 8));
    }

    // --- Serde shape ---

    #[test]
    fn rect_serializes_as_flat_object() {
        let json = serde_json::to_value(Rect::new(1, 2, 3, 4)).expect("rect should serialize");
        assert_eq!(json["x"], 1);
        assert_eq!(json["y"], 2);
        assert_eq!(json["width"], 3);
        assert_eq!(json["height"], 4);
    }

    #[test]
    fn orientation_serializes_snake_case() {
        let json =
            serde_json::to_value(Orientation::Horizontal).expect("orientation should serialize");
        assert_eq!(json, serde_json::json!("horizontal"));
    }
}
