//! Property-based tests for the geometry primitives.
//!
//! Invariants covered:
//!
//! 1. Intersection is commutative and contained in both inputs.
//! 2. Union is commutative and contains both inputs.
//! 3. `contains` agrees with `intersection`.
//! 4. Axis adjustment preserves the cross axis and shifts edges by the
//!    requested deltas.
//! 5. Edge setters pin the opposite edge.

use dockline_core::geometry::{Orientation, Point, Rect};
use proptest::prelude::*;

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (-1000i32..1000, -1000i32..1000, 1i32..1000, 1i32..1000)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn orientation_strategy() -> impl Strategy<Value = Orientation> {
    prop_oneof![Just(Orientation::Horizontal), Just(Orientation::Vertical)]
}

proptest! {
    #[test]
    fn intersection_commutative(a in rect_strategy(), b in rect_strategy()) {
        prop_assert_eq!(a.intersection(&b), b.intersection(&a));
    }

    #[test]
    fn intersection_contained_in_both(a in rect_strategy(), b in rect_strategy()) {
        let i = a.intersection(&b);
        if !i.is_empty() {
            prop_assert!(a.contains_rect(&i), "a={a:?} i={i:?}");
            prop_assert!(b.contains_rect(&i), "b={b:?} i={i:?}");
        }
    }

    #[test]
    fn union_commutative(a in rect_strategy(), b in rect_strategy()) {
        prop_assert_eq!(a.union(&b), b.union(&a));
    }

    #[test]
    fn union_contains_both(a in rect_strategy(), b in rect_strategy()) {
        let u = a.union(&b);
        prop_assert!(u.contains_rect(&a));
        prop_assert!(u.contains_rect(&b));
    }

    #[test]
    fn contains_agrees_with_intersection(
        a in rect_strategy(),
        b in rect_strategy(),
        dx in 0i32..1000,
        dy in 0i32..1000,
    ) {
        let p = Point::new(a.x + dx % a.width.max(1), a.y + dy % a.height.max(1));
        if a.contains(p) && b.contains(p) {
            prop_assert!(a.intersection(&b).contains(p));
        }
    }

    #[test]
    fn adjusted_along_preserves_cross_axis(
        r in rect_strategy(),
        o in orientation_strategy(),
        d_start in -50i32..50,
        d_end in -50i32..50,
    ) {
        let adjusted = r.adjusted_along(o, d_start, d_end);
        prop_assert_eq!(adjusted.length(o.opposite()), r.length(o.opposite()));
        prop_assert_eq!(adjusted.pos(o), r.pos(o) + d_start);
        prop_assert_eq!(adjusted.end(o), r.end(o) + d_end);
    }

    #[test]
    fn edge_setters_pin_opposite_edge(
        r in rect_strategy(),
        o in orientation_strategy(),
        pos in -1000i32..1000,
    ) {
        prop_assert_eq!(r.with_near_edge(o, pos).end(o), r.end(o));
        prop_assert_eq!(r.with_far_edge(o, pos).pos(o), r.pos(o));
    }
}
