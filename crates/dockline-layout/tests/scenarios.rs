//! End-to-end layout scenarios: splits, nesting, placeholders, resize
//! propagation, minimum clamping, and drop-rect suggestions.

use std::cell::Cell;
use std::rc::Rc;

use dockline_core::geometry::{Orientation, Point, Rect, Size};
use dockline_layout::host::{Guest, HostSurface};
use dockline_layout::{ItemId, LayoutTree, Location, RemoveMode, SEPARATOR_THICKNESS};

struct FixedHost {
    bounds: Cell<Size>,
}

impl FixedHost {
    fn new(width: i32, height: i32) -> Rc<Self> {
        Rc::new(Self {
            bounds: Cell::new(Size::new(width, height)),
        })
    }
}

impl HostSurface for FixedHost {
    fn bounds(&self) -> Size {
        self.bounds.get()
    }

    fn reparent(&self, _guest: &Rc<dyn Guest>, _new_host: &Rc<dyn HostSurface>) {}

    fn notify_guest_geometry(&self, _guest: &Rc<dyn Guest>, _rect: Rect) {}
}

struct FixedGuest {
    min: Size,
}

impl Guest for FixedGuest {
    fn minimum_size(&self) -> Size {
        self.min
    }

    fn geometry(&self) -> Rect {
        Rect::default()
    }

    fn set_visible(&self, _visible: bool) {}
}

fn docked_leaf(tree: &mut LayoutTree, name: &str) -> ItemId {
    let id = tree.create_leaf(name);
    let guest: Rc<dyn Guest> = Rc::new(FixedGuest {
        min: Size::new(100, 100),
    });
    assert!(tree.attach_guest(id, &guest));
    id
}

/// Root 1000×600 with `a` alone, then `b` docked to its right.
fn two_way_split() -> (LayoutTree, Rc<FixedHost>, ItemId, ItemId) {
    let host = FixedHost::new(1000, 600);
    let mut tree = LayoutTree::new(host.clone());
    let a = docked_leaf(&mut tree, "a");
    tree.insert_into_root(a, Location::OnLeft);
    let b = docked_leaf(&mut tree, "b");
    tree.insert_item(b, a, Location::OnRight);
    (tree, host, a, b)
}

#[test]
fn two_way_split_shares_the_width() {
    let (tree, _host, a, b) = two_way_split();

    assert_eq!(tree.orientation(tree.root()), Some(Orientation::Horizontal));
    assert_eq!(tree.geometry(a), Rect::new(0, 0, 497, 600));
    assert_eq!(tree.geometry(b), Rect::new(502, 0, 498, 600));
    assert_eq!(
        tree.geometry(a).width + tree.geometry(b).width + SEPARATOR_THICKNESS,
        1000
    );
    assert!(tree.check_sanity());
}

#[test]
fn perpendicular_insert_nests_a_vertical_container() {
    let (mut tree, _host, a, b) = two_way_split();
    let c = docked_leaf(&mut tree, "c");
    tree.insert_item(c, b, Location::OnBottom);

    let wrapper = tree.parent(b).expect("b should have been wrapped");
    assert_ne!(wrapper, tree.root());
    assert_eq!(tree.orientation(tree.root()), Some(Orientation::Horizontal));
    assert_eq!(tree.orientation(wrapper), Some(Orientation::Vertical));

    assert_eq!(tree.geometry(a), Rect::new(0, 0, 497, 600));
    assert_eq!(tree.geometry(wrapper), Rect::new(502, 0, 498, 600));
    assert_eq!(tree.geometry(b), Rect::new(0, 0, 498, 297));
    assert_eq!(tree.geometry(c), Rect::new(0, 302, 498, 298));
    assert!(tree.check_sanity());
}

#[test]
fn placeholder_restore_reclaims_the_shared_half() {
    let (mut tree, _host, _a, b) = two_way_split();
    let c = docked_leaf(&mut tree, "c");
    tree.insert_item(c, b, Location::OnBottom);
    let wrapper = tree.parent(b).expect("wrapper");

    tree.remove_item(c, RemoveMode::Soft);

    assert_eq!(tree.geometry(b), Rect::new(0, 0, 498, 600));
    assert_eq!(tree.percentage_within_parent(b), 1.0);
    assert_eq!(tree.percentage_within_parent(c), 0.0);
    assert!(tree.check_sanity());

    tree.restore_placeholder(c);

    assert_eq!(tree.geometry(b), Rect::new(0, 0, 498, 297));
    assert_eq!(tree.geometry(c), Rect::new(0, 302, 498, 298));
    assert!((tree.percentage_within_parent(b) - 0.5).abs() < 0.01);
    assert!((tree.percentage_within_parent(c) - 0.5).abs() < 0.01);
    assert_eq!(tree.children(wrapper), [b, c]);
    assert!(tree.check_sanity());
}

#[test]
fn resize_keeps_thirds_with_the_last_absorbing_rounding() {
    let host = FixedHost::new(1000, 600);
    let mut tree = LayoutTree::new(host.clone());
    let a = docked_leaf(&mut tree, "a");
    tree.insert_into_root(a, Location::OnLeft);
    let b = docked_leaf(&mut tree, "b");
    tree.insert_into_root(b, Location::OnRight);
    let c = docked_leaf(&mut tree, "c");
    tree.insert_into_root(c, Location::OnRight);
    let widths = [a, b, c].map(|id| tree.geometry(id).width);
    assert!(widths.iter().all(|w| (w - 330).abs() <= 5), "{widths:?}");

    host.bounds.set(Size::new(1300, 600));
    tree.resize(Size::new(1300, 600));

    let widths = [a, b, c].map(|id| tree.geometry(id).width);
    assert!(widths.iter().all(|w| (w - 430).abs() <= 5), "{widths:?}");
    assert_eq!(widths.iter().sum::<i32>() + 2 * SEPARATOR_THICKNESS, 1300);
    for id in [a, b, c] {
        assert!((tree.percentage_within_parent(id) - 1.0 / 3.0).abs() < 0.01);
    }
    assert!(tree.check_sanity());
}

#[test]
fn resize_respects_minimums_and_splits_the_rest() {
    let host = FixedHost::new(1000, 600);
    let mut tree = LayoutTree::new(host.clone());
    let a = tree.create_leaf("a");
    tree.set_min_size(a, Size::new(400, 100));
    tree.insert_into_root(a, Location::OnLeft);
    let b = docked_leaf(&mut tree, "b");
    tree.insert_item(b, a, Location::OnRight);
    let c = docked_leaf(&mut tree, "c");
    tree.insert_item(c, b, Location::OnRight);
    assert!(tree.check_sanity());

    host.bounds.set(Size::new(700, 600));
    tree.resize(Size::new(700, 600));

    assert_eq!(tree.geometry(a).width, 400);
    let rest = tree.geometry(b).width + tree.geometry(c).width;
    assert_eq!(rest, 700 - 400 - 2 * SEPARATOR_THICKNESS);
    assert!(tree.geometry(b).width >= 100);
    assert!(tree.geometry(c).width >= 100);
    assert!(tree.check_sanity());
}

#[test]
fn drop_rects_on_an_empty_root_hug_the_edges() {
    let host = FixedHost::new(900, 600);
    let tree = LayoutTree::new(host);
    let min = Size::new(100, 100);

    assert_eq!(
        tree.suggested_drop_rect(min, None, Location::OnLeft),
        Rect::new(0, 0, 300, 600)
    );
    assert_eq!(
        tree.suggested_drop_rect(min, None, Location::OnRight),
        Rect::new(600, 0, 300, 600)
    );
    assert_eq!(
        tree.suggested_drop_rect(min, None, Location::OnTop),
        Rect::new(0, 0, 900, 200)
    );
    assert_eq!(
        tree.suggested_drop_rect(min, None, Location::OnBottom),
        Rect::new(0, 400, 900, 200)
    );
}

#[test]
fn drop_rect_suggestion_does_not_mutate_the_layout() {
    let (tree, _host, a, _b) = two_way_split();
    let before = tree.dump_layout();

    let _ = tree.suggested_drop_rect(Size::new(100, 100), Some(a), Location::OnRight);
    let _ = tree.suggested_drop_rect(Size::new(100, 100), None, Location::OnTop);

    assert_eq!(tree.dump_layout(), before);
}

#[test]
fn insert_then_hard_remove_is_a_round_trip() {
    let (mut tree, _host, _a, b) = two_way_split();
    let before = tree.dump_layout();

    let c = docked_leaf(&mut tree, "c");
    tree.insert_item(c, b, Location::OnBottom);
    tree.remove_item(c, RemoveMode::Hard);

    assert_eq!(tree.dump_layout(), before);
    assert!(tree.check_sanity());
}

#[test]
fn restored_length_never_exceeds_the_previous_length() {
    let (mut tree, _host, _a, b) = two_way_split();
    let previous = tree.geometry(b).width;

    tree.remove_item(b, RemoveMode::Soft);
    tree.restore_placeholder(b);

    let restored = tree.geometry(b).width;
    assert!(restored >= 100 && restored <= previous, "restored={restored}");
    assert!(tree.check_sanity());
}

#[test]
fn deep_alternating_tree_stays_sane() {
    let host = FixedHost::new(1600, 1200);
    let mut tree = LayoutTree::new(host);
    let first = docked_leaf(&mut tree, "leaf-0");
    tree.insert_into_root(first, Location::OnLeft);

    let mut anchor = first;
    let locations = [
        Location::OnRight,
        Location::OnBottom,
        Location::OnLeft,
        Location::OnTop,
    ];
    for i in 1..8 {
        let next = docked_leaf(&mut tree, &format!("leaf-{i}"));
        tree.insert_item(next, anchor, locations[i % locations.len()]);
        assert!(tree.check_sanity(), "insane after insert {i}:\n{}", tree.dump_layout());
        anchor = next;
    }

    assert_eq!(tree.visible_count_recursive(tree.root()), 8);
    assert!(tree.item_at(Point::new(1, 1)).is_some());
}
