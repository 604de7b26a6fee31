#![forbid(unsafe_code)]

//! The layout tree: items, containers, and every structural operation.
//!
//! Nodes live in an ID-keyed arena owned by [`LayoutTree`]. A node is either
//! a leaf (holds at most one guest, may be a hidden *placeholder*) or a
//! container (packs its visible children along one orientation, separated by
//! [`SEPARATOR_THICKNESS`], spanning them across the other axis). Containers
//! own their children; each child carries an ID back-edge to its parent.
//!
//! Failures never cross the public surface: programming errors are logged
//! (and assert in debug builds), geometry-constraint violations are logged
//! and clamped, invalid queries return empty sentinels.

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;
use std::rc::{Rc, Weak};

use dockline_core::geometry::{Orientation, Point, Rect, Size};
use serde::{Deserialize, Serialize};

use crate::host::{Guest, HostSurface};
use crate::sizing::{
    LengthOnSide, Location, SEPARATOR_THICKNESS, Side, SizingInfo, hard_minimum_size,
};

/// Stable identifier for items in a layout tree.
///
/// `0` is never allocated, so IDs are always non-zero.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a removal tears the subtree down or keeps it as a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoveMode {
    /// Drop the item from its parent and destroy the subtree.
    Hard,
    /// Hide the item in place so it can be restored later.
    Soft,
}

/// How freed or needed space is distributed among siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthStrategy {
    /// Take space from both sides alternately, halving the remainder.
    BothSidesEqually,
}

struct LeafState {
    guest: Option<Weak<dyn Guest>>,
    visible: bool,
    ref_count: u32,
}

struct ContainerState {
    orientation: Orientation,
    children: Vec<ItemId>,
    /// Transient: suppresses percentage recomputation during a resize.
    block_update_percentages: bool,
    /// Transient: set while a min-size overflow is being absorbed.
    is_resizing: bool,
}

enum NodeKind {
    Leaf(LeafState),
    Container(ContainerState),
}

struct Node {
    parent: Option<ItemId>,
    name: String,
    sizing: SizingInfo,
    kind: NodeKind,
}

/// A multi-splitter layout: one root container whose rectangle covers the
/// host surface, and a tree of leaves and nested containers below it.
pub struct LayoutTree {
    host: Rc<dyn HostSurface>,
    root: ItemId,
    next_id: u64,
    nodes: BTreeMap<ItemId, Node>,
}

impl LayoutTree {
    /// Build an empty layout whose root covers the host surface.
    #[must_use]
    pub fn new(host: Rc<dyn HostSurface>) -> Self {
        let bounds = host.bounds();
        let root = ItemId(1);
        let mut nodes = BTreeMap::new();
        nodes.insert(
            root,
            Node {
                parent: None,
                name: "root".to_owned(),
                sizing: SizingInfo {
                    geometry: Rect::from_size(bounds),
                    min_size: Size::ZERO,
                    ..SizingInfo::default()
                },
                kind: NodeKind::Container(ContainerState {
                    orientation: Orientation::Vertical,
                    children: Vec::new(),
                    block_update_percentages: false,
                    is_resizing: false,
                }),
            },
        );
        Self {
            host,
            root,
            next_id: 2,
            nodes,
        }
    }

    /// Root container ID.
    #[must_use]
    pub const fn root(&self) -> ItemId {
        self.root
    }

    /// The host surface this tree lays out into.
    #[must_use]
    pub fn host(&self) -> &Rc<dyn HostSurface> {
        &self.host
    }

    /// Stage a new hidden leaf, not yet inserted anywhere.
    pub fn create_leaf(&mut self, name: impl Into<String>) -> ItemId {
        let id = self.alloc_id();
        self.nodes.insert(
            id,
            Node {
                parent: None,
                name: name.into(),
                sizing: SizingInfo::default(),
                kind: NodeKind::Leaf(LeafState {
                    guest: None,
                    visible: false,
                    ref_count: 0,
                }),
            },
        );
        id
    }

    fn alloc_id(&mut self) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    fn new_container_node(&mut self, parent: Option<ItemId>, orientation: Orientation) -> ItemId {
        let id = self.alloc_id();
        self.nodes.insert(
            id,
            Node {
                parent,
                name: String::new(),
                sizing: SizingInfo::default(),
                kind: NodeKind::Container(ContainerState {
                    orientation,
                    children: Vec::new(),
                    block_update_percentages: false,
                    is_resizing: false,
                }),
            },
        );
        id
    }

    // ------------------------------------------------------------------
    // Basic queries
    // ------------------------------------------------------------------

    fn node(&self, id: ItemId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn node_mut(&mut self, id: ItemId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    fn container(&self, id: ItemId) -> Option<&ContainerState> {
        match self.node(id) {
            Some(Node {
                kind: NodeKind::Container(c),
                ..
            }) => Some(c),
            _ => None,
        }
    }

    fn container_mut(&mut self, id: ItemId) -> Option<&mut ContainerState> {
        match self.node_mut(id) {
            Some(Node {
                kind: NodeKind::Container(c),
                ..
            }) => Some(c),
            _ => None,
        }
    }

    fn leaf(&self, id: ItemId) -> Option<&LeafState> {
        match self.node(id) {
            Some(Node {
                kind: NodeKind::Leaf(l),
                ..
            }) => Some(l),
            _ => None,
        }
    }

    fn leaf_mut(&mut self, id: ItemId) -> Option<&mut LeafState> {
        match self.node_mut(id) {
            Some(Node {
                kind: NodeKind::Leaf(l),
                ..
            }) => Some(l),
            _ => None,
        }
    }

    /// Check if `id` names a container.
    #[must_use]
    pub fn is_container(&self, id: ItemId) -> bool {
        self.container(id).is_some()
    }

    /// Check if `id` is the tree's root.
    #[must_use]
    pub fn is_root(&self, id: ItemId) -> bool {
        id == self.root
    }

    /// Parent container of `id`, if inserted.
    #[must_use]
    pub fn parent(&self, id: ItemId) -> Option<ItemId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Diagnostic name of `id`.
    #[must_use]
    pub fn name(&self, id: ItemId) -> &str {
        self.node(id).map_or("", |n| n.name.as_str())
    }

    /// All children of a container, placeholders included. Empty for leaves.
    #[must_use]
    pub fn children(&self, id: ItemId) -> &[ItemId] {
        self.container(id).map_or(&[], |c| c.children.as_slice())
    }

    fn children_vec(&self, id: ItemId) -> Vec<ItemId> {
        self.children(id).to_vec()
    }

    /// Visible children of a container, in order.
    #[must_use]
    pub fn visible_children(&self, id: ItemId) -> Vec<ItemId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_visible(c))
            .collect()
    }

    fn num_visible_children(&self, id: ItemId) -> usize {
        self.children(id)
            .iter()
            .filter(|&&c| self.is_visible(c))
            .count()
    }

    fn has_visible_children(&self, id: ItemId) -> bool {
        self.children(id).iter().any(|&c| self.is_visible(c))
    }

    /// Whether the item participates in layout.
    ///
    /// Leaves carry an explicit flag; a container is visible exactly when it
    /// has a visible child.
    #[must_use]
    pub fn is_visible(&self, id: ItemId) -> bool {
        match self.node(id).map(|n| &n.kind) {
            Some(NodeKind::Leaf(l)) => l.visible,
            Some(NodeKind::Container(_)) => self.has_visible_children(id),
            None => false,
        }
    }

    /// A hidden leaf that preserves its position for later restoration.
    #[must_use]
    pub fn is_placeholder(&self, id: ItemId) -> bool {
        self.leaf(id).is_some_and(|l| !l.visible)
    }

    fn is_being_inserted(&self, id: ItemId) -> bool {
        self.node(id).is_some_and(|n| n.sizing.is_being_inserted)
    }

    /// Index of `item` in `container`'s full child list.
    #[must_use]
    pub fn index_of_child(&self, container: ItemId, item: ItemId) -> Option<usize> {
        self.children(container).iter().position(|&c| c == item)
    }

    /// Index of `item` among `container`'s visible children.
    #[must_use]
    pub fn index_of_visible_child(&self, container: ItemId, item: ItemId) -> Option<usize> {
        self.visible_children(container)
            .iter()
            .position(|&c| c == item)
    }

    /// Check if `item` is a direct child of `container`.
    #[must_use]
    pub fn contains(&self, container: ItemId, item: ItemId) -> bool {
        self.children(container).contains(&item)
    }

    /// Check if `item` is anywhere below `container`.
    #[must_use]
    pub fn contains_recursive(&self, container: ItemId, item: ItemId) -> bool {
        self.children(container)
            .iter()
            .any(|&c| c == item || self.contains_recursive(c, item))
    }

    /// Sibling of `item` on the given side, placeholders included.
    #[must_use]
    pub fn neighbour(&self, item: ItemId, side: Side) -> Option<ItemId> {
        let parent = self.parent(item)?;
        let index = self.index_of_child(parent, item)?;
        let neighbour_index = match side {
            Side::Side1 => index.checked_sub(1)?,
            Side::Side2 => index + 1,
        };
        self.children(parent).get(neighbour_index).copied()
    }

    fn visible_neighbour(&self, container: ItemId, item: ItemId, side: Side) -> Option<ItemId> {
        let visible = self.visible_children(container);
        let index = visible.iter().position(|&c| c == item)?;
        let neighbour_index = match side {
            Side::Side1 => index.checked_sub(1)?,
            Side::Side2 => index + 1,
        };
        visible.get(neighbour_index).copied()
    }

    /// Number of visible leaves below `id` (counting `id` itself for leaves).
    #[must_use]
    pub fn visible_count_recursive(&self, id: ItemId) -> usize {
        match self.node(id).map(|n| &n.kind) {
            Some(NodeKind::Leaf(_)) => usize::from(self.is_visible(id)),
            Some(NodeKind::Container(c)) => c
                .children
                .iter()
                .map(|&child| self.visible_count_recursive(child))
                .sum(),
            None => 0,
        }
    }

    /// Number of leaves below `id`, placeholders included.
    #[must_use]
    pub fn count_recursive(&self, id: ItemId) -> usize {
        match self.node(id).map(|n| &n.kind) {
            Some(NodeKind::Leaf(_)) => 1,
            Some(NodeKind::Container(c)) => c
                .children
                .iter()
                .map(|&child| self.count_recursive(child))
                .sum(),
            None => 0,
        }
    }

    /// All leaves below `id`, depth-first.
    #[must_use]
    pub fn items_recursive(&self, id: ItemId) -> Vec<ItemId> {
        let mut items = Vec::new();
        self.collect_leaves(id, &mut items);
        items
    }

    fn collect_leaves(&self, id: ItemId, out: &mut Vec<ItemId>) {
        match self.node(id).map(|n| &n.kind) {
            Some(NodeKind::Leaf(_)) => out.push(id),
            Some(NodeKind::Container(c)) => {
                for &child in &c.children {
                    self.collect_leaves(child, out);
                }
            }
            None => {}
        }
    }

    /// The leaf currently presenting `guest`, if any.
    #[must_use]
    pub fn item_for_guest(&self, guest: &Rc<dyn Guest>) -> Option<ItemId> {
        self.items_recursive(self.root).into_iter().find(|&id| {
            self.leaf(id)
                .and_then(|l| l.guest.as_ref())
                .and_then(Weak::upgrade)
                .is_some_and(|g| Rc::ptr_eq(&g, guest))
        })
    }

    // ------------------------------------------------------------------
    // Geometry queries
    // ------------------------------------------------------------------

    fn node_geometry(&self, id: ItemId) -> Rect {
        self.node(id).map_or(Rect::default(), |n| n.sizing.geometry)
    }

    /// Parent-relative rectangle of `id`.
    ///
    /// Empty while the item is being inserted.
    #[must_use]
    pub fn geometry(&self, id: ItemId) -> Rect {
        if self.is_being_inserted(id) {
            Rect::default()
        } else {
            self.node_geometry(id)
        }
    }

    /// Rectangle of `id` in root coordinates.
    #[must_use]
    pub fn rect_in_root(&self, id: ItemId) -> Rect {
        self.map_rect_to_root(id, self.node_geometry(id))
    }

    /// The container's own coordinate space: its rectangle moved to the
    /// origin. Children are positioned inside this.
    #[must_use]
    pub fn rect(&self, id: ItemId) -> Rect {
        self.node_geometry(id).moved_to(Point::new(0, 0))
    }

    fn size_of(&self, id: ItemId) -> Size {
        self.node_geometry(id).size()
    }

    fn length_of(&self, id: ItemId, o: Orientation) -> i32 {
        self.node_geometry(id).length(o)
    }

    /// Minimum size: a leaf's own constraint, a container's bottom-up
    /// aggregate over visible children.
    #[must_use]
    pub fn min_size(&self, id: ItemId) -> Size {
        let Some(node) = self.node(id) else {
            return Size::ZERO;
        };
        match &node.kind {
            NodeKind::Leaf(_) => node.sizing.min_size,
            NodeKind::Container(c) => {
                let visible = self.visible_children(id);
                if visible.is_empty() {
                    return Size::ZERO;
                }
                let o = c.orientation;
                let mut main = 0;
                let mut cross = 0;
                for &child in &visible {
                    let min = self.min_size(child);
                    main += min.length(o);
                    cross = cross.max(min.length(o.opposite()));
                }
                main += SEPARATOR_THICKNESS * (visible.len() as i32 - 1);
                match o {
                    Orientation::Horizontal => Size::new(main, cross),
                    Orientation::Vertical => Size::new(cross, main),
                }
            }
        }
    }

    /// Maximum size: a leaf's own constraint, a container's aggregate
    /// (sum along the orientation, minimum across it).
    #[must_use]
    pub fn max_size(&self, id: ItemId) -> Size {
        let Some(node) = self.node(id) else {
            return Size::ZERO;
        };
        match &node.kind {
            NodeKind::Leaf(_) => node.sizing.max_size,
            NodeKind::Container(c) => {
                let visible = self.visible_children(id);
                if visible.is_empty() {
                    return Size::ZERO;
                }
                let o = c.orientation;
                let mut main = 0i32;
                let mut cross = i32::MAX;
                for &child in &visible {
                    let max = self.max_size(child);
                    main = main.saturating_add(max.length(o));
                    cross = cross.min(max.length(o.opposite()));
                }
                main = main
                    .saturating_add(SEPARATOR_THICKNESS * (visible.len() as i32 - 1))
                    .min(crate::sizing::LAYOUT_MAX_LENGTH);
                cross = cross.min(crate::sizing::LAYOUT_MAX_LENGTH);
                match o {
                    Orientation::Horizontal => Size::new(main, cross),
                    Orientation::Vertical => Size::new(cross, main),
                }
            }
        }
    }

    /// How far below its minimum the item currently is (clamped ≥ 0 per
    /// dimension).
    #[must_use]
    pub fn missing_size(&self, id: ItemId) -> Size {
        let min = self.min_size(id);
        let size = self.size_of(id);
        Size::new(
            (min.width - size.width).max(0),
            (min.height - size.height).max(0),
        )
    }

    fn orientation_of(&self, container: ItemId) -> Orientation {
        self.container(container)
            .map_or(Orientation::Vertical, |c| c.orientation)
    }

    /// Packing orientation of a container.
    #[must_use]
    pub fn orientation(&self, id: ItemId) -> Option<Orientation> {
        self.container(id).map(|c| c.orientation)
    }

    /// Container length along its orientation.
    fn length(&self, container: ItemId) -> i32 {
        self.length_of(container, self.orientation_of(container))
    }

    /// Container length minus the separator waste between visible children.
    fn usable_length(&self, container: ItemId) -> i32 {
        let num_visible = self.num_visible_children(container) as i32;
        if num_visible <= 1 {
            return self.length(container);
        }
        self.length(container) - SEPARATOR_THICKNESS * (num_visible - 1)
    }

    /// Slack of the container along its orientation.
    fn available_length(&self, container: ItemId) -> i32 {
        let o = self.orientation_of(container);
        self.length(container) - self.min_size(container).length(o)
    }

    /// Slack held by `child`'s siblings on one side, along the container's
    /// orientation.
    #[must_use]
    pub fn available_on_side(&self, child: ItemId, side: Side) -> i32 {
        let Some(container) = self.parent(child) else {
            return 0;
        };
        let o = self.orientation_of(container);
        let sizes = self.sizes(container);
        let Some(index) = self.index_of_visible_child(container, child) else {
            return 0;
        };
        let run = match side {
            Side::Side1 => LengthOnSide::over(&sizes[..index], o),
            Side::Side2 => LengthOnSide::over(&sizes[index + 1..], o),
        };
        run.available()
    }

    // ------------------------------------------------------------------
    // Coordinate mapping
    // ------------------------------------------------------------------

    /// Map a point from `id`'s parent coordinates to root coordinates.
    #[must_use]
    pub fn map_to_root(&self, id: ItemId, p: Point) -> Point {
        let mut p = p;
        let mut cur = self.parent(id);
        while let Some(c) = cur {
            p = p.translated(self.node_geometry(c).top_left());
            cur = self.parent(c);
        }
        p
    }

    /// Map a point from root coordinates into `id`'s parent coordinates.
    #[must_use]
    pub fn map_from_root(&self, id: ItemId, p: Point) -> Point {
        let mut p = p;
        let mut cur = self.parent(id);
        while let Some(c) = cur {
            p = p.untranslated(self.node_geometry(c).top_left());
            cur = self.parent(c);
        }
        p
    }

    /// Map a point from `id`'s parent coordinates into `id`'s own space.
    #[must_use]
    pub fn map_from_parent(&self, id: ItemId, p: Point) -> Point {
        p.untranslated(self.node_geometry(id).top_left())
    }

    /// Rect variant of [`map_to_root`](Self::map_to_root).
    #[must_use]
    pub fn map_rect_to_root(&self, id: ItemId, r: Rect) -> Rect {
        r.moved_to(self.map_to_root(id, r.top_left()))
    }

    /// Rect variant of [`map_from_root`](Self::map_from_root).
    #[must_use]
    pub fn map_rect_from_root(&self, id: ItemId, r: Rect) -> Rect {
        r.moved_to(self.map_from_root(id, r.top_left()))
    }

    /// Origin of a container's child coordinate space, in root coordinates.
    fn origin_in_root(&self, container: ItemId) -> Point {
        let mut p = Point::new(0, 0);
        let mut cur = Some(container);
        while let Some(c) = cur {
            p = p.translated(self.node_geometry(c).top_left());
            cur = self.parent(c);
        }
        p
    }

    /// Deepest visible leaf under a root-coordinate point.
    #[must_use]
    pub fn item_at(&self, p: Point) -> Option<ItemId> {
        self.item_at_in(self.root, p)
    }

    fn item_at_in(&self, container: ItemId, p: Point) -> Option<ItemId> {
        let hit = self
            .children(container)
            .iter()
            .copied()
            .find(|&c| self.is_visible(c) && self.node_geometry(c).contains(p))?;
        if self.is_container(hit) {
            self.item_at_in(hit, self.map_from_parent(hit, p))
        } else {
            Some(hit)
        }
    }
}

impl LayoutTree {
    // ------------------------------------------------------------------
    // Geometry mutators
    // ------------------------------------------------------------------

    fn set_geometry(&mut self, id: ItemId, rect: Rect) {
        let Some(node) = self.node_mut(id) else {
            tracing::warn!("set_geometry on unknown item {id}");
            return;
        };
        if node.sizing.geometry == rect {
            return;
        }
        node.sizing.geometry = rect;

        if rect.is_empty() {
            tracing::error!(
                "empty geometry assigned to item {id}\n{}",
                self.dump_layout()
            );
            debug_assert!(false, "empty geometry assigned to item {id}");
        } else {
            let min = self.min_size(id);
            if rect.width < min.width || rect.height < min.height {
                tracing::warn!(
                    "geometry below minimum for item {id}: size={:?} min={min:?}",
                    rect.size()
                );
            }
        }

        self.update_guest_geometry(id);
    }

    fn set_size(&mut self, id: ItemId, size: Size) {
        let geo = self.node_geometry(id);
        self.set_geometry(id, geo.with_size(size));
    }

    fn set_pos_point(&mut self, id: ItemId, pos: Point) {
        let geo = self.node_geometry(id);
        self.set_geometry(id, geo.moved_to(pos));
    }

    fn set_length(&mut self, id: ItemId, len: i32, o: Orientation) {
        debug_assert!(len > 0, "set_length with non-positive length {len}");
        let size = self.size_of(id).with_length(len, o);
        self.set_size(id, size);
    }

    /// Assign a rectangle; containers re-lay their children to the new size.
    fn set_geometry_recursive(&mut self, id: ItemId, rect: Rect) {
        if self.is_container(id) {
            self.set_pos_point(id, rect.top_left());
            self.resize_container(id, rect.size());
        } else {
            self.set_geometry(id, rect);
        }
    }

    fn set_length_recursive(&mut self, id: ItemId, len: i32, o: Orientation) {
        if self.is_container(id) {
            let size = self.size_of(id).with_length(len, o);
            self.resize_container(id, size);
        } else {
            self.set_length(id, len, o);
        }
    }

    // ------------------------------------------------------------------
    // Leaf lifecycle: guests, visibility, reference counts
    // ------------------------------------------------------------------

    fn guest(&self, id: ItemId) -> Option<Rc<dyn Guest>> {
        self.leaf(id)?.guest.as_ref()?.upgrade()
    }

    /// Push the item's current root-coordinate rectangle to its guest.
    fn update_guest_geometry(&mut self, id: ItemId) {
        if let Some(guest) = self.guest(id) {
            let rect = self.map_rect_to_root(id, self.node_geometry(id));
            self.host.notify_guest_geometry(&guest, rect);
        }
    }

    /// Bind a guest to a leaf.
    ///
    /// The leaf adopts the guest's minimum size; if the leaf has no geometry
    /// yet it adopts the guest's current rectangle, mapped into local
    /// coordinates. A placeholder being re-occupied is restored into the
    /// layout. Returns `false` if the leaf already has a live guest.
    pub fn attach_guest(&mut self, id: ItemId, guest: &Rc<dyn Guest>) -> bool {
        let Some(leaf) = self.leaf(id) else {
            tracing::warn!("attach_guest on non-leaf item {id}");
            return false;
        };
        if leaf.guest.as_ref().is_some_and(|g| g.upgrade().is_some()) {
            tracing::warn!("attach_guest on already-occupied item {id}");
            return false;
        }

        if let Some(leaf) = self.leaf_mut(id) {
            leaf.guest = Some(Rc::downgrade(guest));
        }

        self.set_min_size(id, guest.minimum_size());

        let guest_geo = guest.geometry();
        if self.node_geometry(id).is_empty() && !guest_geo.is_empty() {
            let local = self.map_rect_from_root(id, guest_geo);
            self.set_geometry(id, local);
        } else {
            self.update_guest_geometry(id);
        }

        match self.parent(id) {
            Some(parent) if !self.is_visible(id) => {
                self.restore_placeholder_in(parent, id);
            }
            Some(_) => {
                guest.set_visible(true);
            }
            None => {
                // Staged leaf: shown now, sized at insertion.
                if let Some(leaf) = self.leaf_mut(id) {
                    leaf.visible = true;
                }
                guest.set_visible(true);
            }
        }
        true
    }

    /// Forget the guest. Visibility and reference counts are untouched; a
    /// subsequent [`attach_guest`](Self::attach_guest) is legal.
    pub fn detach_guest(&mut self, id: ItemId) {
        if let Some(leaf) = self.leaf_mut(id) {
            leaf.guest = None;
        }
    }

    /// Apply a new minimum size to a leaf, clamped to the hard floor, and
    /// propagate the change to the parent.
    pub fn set_min_size(&mut self, id: ItemId, min: Size) {
        let min = min.expanded_to(hard_minimum_size());
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if !matches!(node.kind, NodeKind::Leaf(_)) {
            tracing::warn!("set_min_size on container {id}");
            return;
        }
        if node.sizing.min_size == min {
            return;
        }
        node.sizing.min_size = min;
        if self.is_visible(id)
            && let Some(parent) = self.parent(id)
        {
            self.on_child_min_size_changed(parent, id);
        }
    }

    /// External hold on the item: it must survive at least as a placeholder
    /// while the count is positive.
    pub fn ref_item(&mut self, id: ItemId) {
        if let Some(leaf) = self.leaf_mut(id) {
            leaf.ref_count += 1;
        }
    }

    /// Drop one external hold. At zero the item is removed outright.
    pub fn unref_item(&mut self, id: ItemId) {
        let Some(leaf) = self.leaf_mut(id) else {
            return;
        };
        if leaf.ref_count == 0 {
            tracing::error!("unref below zero on item {id}");
            debug_assert!(false, "unref below zero on item {id}");
            return;
        }
        leaf.ref_count -= 1;
        if leaf.ref_count == 0 {
            if self.is_root(id) {
                tracing::error!("unref reached zero on the root");
                debug_assert!(false, "unref reached zero on the root");
                return;
            }
            self.remove_item(id, RemoveMode::Hard);
        }
    }

    /// Current external reference count.
    #[must_use]
    pub fn ref_count(&self, id: ItemId) -> u32 {
        self.leaf(id).map_or(0, |l| l.ref_count)
    }

    /// Hide the leaf in place, preserving its slot for later restoration.
    pub fn turn_into_placeholder(&mut self, id: ItemId) {
        if self.is_container(id) {
            tracing::warn!("turn_into_placeholder on container {id}");
            return;
        }
        self.remove_item(id, RemoveMode::Soft);
    }

    /// The guest was destroyed externally: keep the slot if someone still
    /// holds a reference, otherwise remove the leaf.
    pub fn on_guest_destroyed(&mut self, id: ItemId) {
        self.detach_guest(id);
        if self.ref_count(id) > 0 {
            self.turn_into_placeholder(id);
        } else {
            if self.is_root(id) {
                debug_assert!(false, "guest destroyed on the root");
                return;
            }
            self.remove_item(id, RemoveMode::Hard);
        }
    }

    /// The guest was reparented away from the host surface: treat as a
    /// detach and keep the slot as a placeholder.
    pub fn on_guest_reparented(&mut self, id: ItemId) {
        debug_assert!(self.is_visible(id), "reparent hook on a hidden item");
        self.turn_into_placeholder(id);
    }

    /// The guest invalidated its layout: re-query its minimum size.
    pub fn on_layout_invalidated(&mut self, id: ItemId) {
        if let Some(guest) = self.guest(id) {
            self.set_min_size(id, guest.minimum_size());
        }
    }

    /// Retarget the whole tree onto a new host surface, reparenting every
    /// attached guest.
    pub fn set_host_surface(&mut self, new_host: Rc<dyn HostSurface>) {
        if Rc::ptr_eq(&self.host, &new_host) {
            return;
        }
        let leaves = self.items_recursive(self.root);
        for &id in &leaves {
            if let Some(guest) = self.guest(id) {
                self.host.reparent(&guest, &new_host);
            }
        }
        self.host = new_host;
        for &id in &leaves {
            if let Some(guest) = self.guest(id) {
                guest.set_visible(self.is_visible(id));
                self.update_guest_geometry(id);
            }
        }
    }

    /// Flip a leaf's visibility, notifying the parent chain and the guest.
    /// For containers the flag is forwarded to every child.
    fn set_is_visible(&mut self, id: ItemId, visible: bool) {
        if self.is_container(id) {
            for child in self.children_vec(id) {
                self.set_is_visible(child, visible);
            }
            return;
        }
        let Some(leaf) = self.leaf(id) else {
            return;
        };
        if leaf.visible == visible {
            return;
        }

        if visible && let Some(node) = self.node_mut(id) {
            node.sizing.is_being_inserted = true;
        }
        if let Some(leaf) = self.leaf_mut(id) {
            leaf.visible = visible;
        }

        if let Some(parent) = self.parent(id) {
            self.on_child_min_size_changed(parent, id);
        }

        self.update_guest_geometry(id);
        if let Some(guest) = self.guest(id) {
            guest.set_visible(visible);
        }

        if let Some(node) = self.node_mut(id) {
            node.sizing.is_being_inserted = false;
        }
    }

    /// Quietly park a staged leaf as hidden before insertion, so the grow
    /// path runs the full placeholder-restore machinery.
    fn mark_hidden_for_insert(&mut self, id: ItemId) {
        if let Some(leaf) = self.leaf_mut(id) {
            leaf.visible = false;
        }
        if let Some(node) = self.node_mut(id) {
            node.sizing.percentage_within_parent = 0.0;
        }
    }
}

impl LayoutTree {
    // ------------------------------------------------------------------
    // Structural operations
    // ------------------------------------------------------------------

    /// A location is compatible when the container has at most one child
    /// (orientation still undefined) or already packs along the same axis.
    fn has_orientation_for(&self, container: ItemId, loc: Location) -> bool {
        let Some(c) = self.container(container) else {
            return false;
        };
        if c.children.len() <= 1 {
            return true;
        }
        loc.orientation() == Some(c.orientation)
    }

    fn set_orientation(&mut self, container: ItemId, o: Orientation) {
        if let Some(c) = self.container_mut(container) {
            c.orientation = o;
        }
    }

    /// Insert `item` next to `anchor`, on the side named by `loc`.
    ///
    /// When the anchor's container packs along the other axis, the anchor is
    /// first wrapped in a new nested container and the insertion recurses
    /// into it.
    pub fn insert_item(&mut self, item: ItemId, anchor: ItemId, loc: Location) {
        let Some(o) = loc.orientation() else {
            tracing::warn!("insert_item with Location::None");
            return;
        };
        if item == anchor {
            tracing::warn!("insert_item: item and anchor are the same ({item})");
            return;
        }
        if self.node(item).is_none() || self.node(anchor).is_none() {
            tracing::warn!("insert_item with unknown item {item} or anchor {anchor}");
            return;
        }
        if self.parent(item).is_some() {
            tracing::warn!("insert_item: {item} is already in the tree");
            return;
        }
        let Some(parent) = self.parent(anchor) else {
            tracing::warn!("insert_item: anchor {anchor} has no parent container");
            return;
        };

        if self.has_orientation_for(parent, loc) {
            let Some(mut index) = self.index_of_visible_child(parent, anchor) else {
                tracing::warn!("insert_item: anchor {anchor} is not visible");
                return;
            };
            if o != self.orientation_of(parent) {
                debug_assert_eq!(self.num_visible_children(parent), 1);
                self.set_orientation(parent, o);
            }
            if loc.side() == Some(Side::Side2) {
                index += 1;
            }
            self.give_default_size_next_to(item, anchor, o);
            self.mark_hidden_for_insert(item);
            self.insert_child(parent, item, index, true);
        } else {
            self.convert_child_to_container(parent, anchor);
            self.insert_item(item, anchor, loc);
            return;
        }

        debug_assert!(self.check_sanity(), "insert_item left the tree insane");
    }

    /// Insert `item` at an edge of the root, without an anchor.
    ///
    /// If the root packs along the other axis, its current children are
    /// first wrapped into a nested container and the root flips orientation.
    pub fn insert_into_root(&mut self, item: ItemId, loc: Location) {
        let Some(o) = loc.orientation() else {
            tracing::warn!("insert_into_root with Location::None");
            return;
        };
        if self.node(item).is_none() {
            tracing::warn!("insert_into_root with unknown item {item}");
            return;
        }
        if self.parent(item).is_some() {
            tracing::warn!("insert_into_root: {item} is already in the tree");
            return;
        }
        let root = self.root;

        if self.has_orientation_for(root, loc) {
            if self.children(root).len() == 1 {
                self.set_orientation(root, o);
            }
            let index = match loc.side() {
                Some(Side::Side1) => 0,
                _ => self.children(root).len(),
            };
            self.give_default_size_in_root(item, o);
            self.mark_hidden_for_insert(item);
            self.insert_child(root, item, index, true);
        } else {
            let old_orientation = self.orientation_of(root);
            let old_children = self.children_vec(root);
            let wrapper = self.new_container_node(Some(root), old_orientation);

            let root_rect = self.rect(root);
            if let Some(node) = self.node_mut(wrapper) {
                node.sizing.geometry = root_rect;
            }
            for &child in &old_children {
                if let Some(node) = self.node_mut(child) {
                    node.parent = Some(wrapper);
                }
            }
            if let Some(c) = self.container_mut(wrapper) {
                c.children = old_children;
            }
            if let Some(c) = self.container_mut(root) {
                c.children = vec![wrapper];
                c.orientation = old_orientation.opposite();
            }
            self.update_child_percentages(root);

            self.insert_into_root(item, loc);
            return;
        }

        debug_assert!(self.check_sanity(), "insert_into_root left the tree insane");
    }

    /// Give a fresh item (no geometry yet) half of the anchor's span along
    /// the insertion axis, and the anchor's full cross extent.
    fn give_default_size_next_to(&mut self, item: ItemId, anchor: ItemId, o: Orientation) {
        if !self.node_geometry(item).is_empty() {
            return;
        }
        let anchor_geo = self.node_geometry(anchor);
        let usable = anchor_geo.length(o) - SEPARATOR_THICKNESS;
        let len = (usable - usable / 2).max(1);
        let cross = anchor_geo.length(o.opposite()).max(1);
        if let Some(node) = self.node_mut(item) {
            node.sizing.geometry = node
                .sizing
                .geometry
                .with_size(Size::new(0, 0).with_length(len, o).with_length(cross, o.opposite()));
        }
    }

    /// Give a fresh item the equitable share of the root's usable length.
    fn give_default_size_in_root(&mut self, item: ItemId, o: Orientation) {
        if !self.node_geometry(item).is_empty() {
            return;
        }
        let num_after = self.num_visible_children(self.root) as i32 + 1;
        if num_after <= 1 {
            return;
        }
        let root = self.root;
        let usable = self.length_of(root, o) - SEPARATOR_THICKNESS * (num_after - 1);
        let len = (usable / num_after).max(1);
        let cross = self.length_of(root, o.opposite()).max(1);
        if let Some(node) = self.node_mut(item) {
            node.sizing.geometry = node
                .sizing
                .geometry
                .with_size(Size::new(0, 0).with_length(len, o).with_length(cross, o.opposite()));
        }
    }

    /// Adopt `item` at `index`; with `grow` the item is then enlarged out of
    /// its neighbours' slack via the placeholder-restore path.
    fn insert_child(&mut self, container: ItemId, item: ItemId, index: usize, grow: bool) {
        let Some(c) = self.container_mut(container) else {
            tracing::warn!("insert_child into non-container {container}");
            return;
        };
        let index = index.min(c.children.len());
        c.children.insert(index, item);
        if let Some(node) = self.node_mut(item) {
            node.parent = Some(container);
        }
        self.update_guest_geometry(item);

        if grow {
            self.restore_placeholder_in(container, item);
        }
    }

    /// Replace `leaf` with a new single-child container occupying the same
    /// slot and rectangle, ready to be split along the other axis.
    fn convert_child_to_container(&mut self, parent: ItemId, leaf: ItemId) -> Option<ItemId> {
        let Some(index) = self.index_of_child(parent, leaf) else {
            tracing::warn!("convert_child_to_container: {leaf} is not a child of {parent}");
            return None;
        };
        let geo = self.node_geometry(leaf);
        let pct = self
            .node(leaf)
            .map_or(0.0, |n| n.sizing.percentage_within_parent);

        let wrapper = self.new_container_node(Some(parent), Orientation::Vertical);
        if let Some(node) = self.node_mut(wrapper) {
            node.sizing.geometry = geo;
            node.sizing.percentage_within_parent = pct;
        }
        if let Some(c) = self.container_mut(parent) {
            c.children[index] = wrapper;
        }
        if let Some(node) = self.node_mut(leaf) {
            node.parent = Some(wrapper);
        }
        if let Some(c) = self.container_mut(wrapper) {
            c.children.push(leaf);
        }

        // The leaf's coordinates are wrapper-relative now.
        self.set_geometry(leaf, geo.moved_to(Point::new(0, 0)));
        self.update_child_percentages(wrapper);

        Some(wrapper)
    }

    /// Remove `item` from the tree.
    ///
    /// Hard removal destroys the subtree; soft removal hides it in place as
    /// a placeholder. Containers left empty (hard) or without visible
    /// children (soft) are removed from their own parent the same way.
    pub fn remove_item(&mut self, item: ItemId, mode: RemoveMode) {
        if self.is_root(item) {
            tracing::warn!("remove_item on the root");
            return;
        }
        let Some(parent) = self.parent(item) else {
            // Staged item, never inserted.
            match mode {
                RemoveMode::Hard => self.destroy_subtree(item),
                RemoveMode::Soft => tracing::warn!("soft remove of staged item {item}"),
            }
            return;
        };
        self.remove_in(parent, item, mode);
    }

    fn remove_in(&mut self, container: ItemId, item: ItemId, mode: RemoveMode) {
        if !self.contains(container, item) {
            let Some(parent) = self.parent(item) else {
                tracing::warn!("remove_in: {item} has no parent");
                return;
            };
            self.remove_in(parent, item, mode);
            return;
        }

        let side1 = self.visible_neighbour(container, item, Side::Side1);
        let side2 = self.visible_neighbour(container, item, Side::Side2);
        let item_is_container = self.is_container(item);
        let was_visible = !item_is_container && self.is_visible(item);

        match mode {
            RemoveMode::Hard => {
                if let Some(c) = self.container_mut(container) {
                    c.children.retain(|&c| c != item);
                }
                if let Some(node) = self.node_mut(item) {
                    node.parent = None;
                }
                self.destroy_subtree(item);
            }
            RemoveMode::Soft => {
                if item_is_container {
                    // A cascaded or explicit container hide: children first,
                    // then the space is reclaimed below.
                    if self.has_visible_children(item) {
                        self.set_is_visible(item, false);
                    }
                } else if was_visible {
                    self.set_is_visible(item, false);
                    self.detach_guest(item);
                } else {
                    // Already a placeholder.
                    return;
                }
            }
        }

        let container_should_be_removed = !self.is_root(container)
            && match mode {
                RemoveMode::Hard => self.children(container).is_empty(),
                RemoveMode::Soft => !self.has_visible_children(container),
            };

        if container_should_be_removed {
            if let Some(parent) = self.parent(container) {
                self.remove_in(parent, container, mode);
            }
        } else {
            self.grow_neighbours(container, side1, side2);
            self.update_child_percentages(container);
        }
    }

    fn destroy_subtree(&mut self, id: ItemId) {
        for child in self.children_vec(id) {
            self.destroy_subtree(child);
        }
        self.nodes.remove(&id);
    }

    /// Neighbours of a removed item reclaim its span: split evenly when both
    /// exist, otherwise the survivor grows to the container edge.
    fn grow_neighbours(
        &mut self,
        container: ItemId,
        side1: Option<ItemId>,
        side2: Option<ItemId>,
    ) {
        let o = self.orientation_of(container);
        match (side1, side2) {
            (Some(first), Some(second)) => {
                let geo1 = self.node_geometry(first);
                let geo2 = self.node_geometry(second);
                let available = geo2.pos(o) - geo1.end(o) - SEPARATOR_THICKNESS;

                let geo1 = geo1.with_far_edge(o, geo1.end(o) + available / 2);
                let geo2 = geo2.with_near_edge(o, geo1.end(o) + SEPARATOR_THICKNESS);
                self.set_geometry_recursive(first, geo1);
                self.set_geometry_recursive(second, geo2);
            }
            (Some(first), None) => {
                let end = self.rect(container).end(o);
                let geo = self.node_geometry(first).with_far_edge(o, end);
                self.set_geometry_recursive(first, geo);
            }
            (None, Some(second)) => {
                let geo = self.node_geometry(second).with_near_edge(o, 0);
                self.set_geometry_recursive(second, geo);
            }
            (None, None) => {}
        }
    }
}

impl LayoutTree {
    // ------------------------------------------------------------------
    // Resize and redistribution
    // ------------------------------------------------------------------

    /// Working copies of the visible children's sizing entries. Container
    /// entries get their minimum refreshed from the aggregate.
    fn sizes(&self, container: ItemId) -> Vec<SizingInfo> {
        self.visible_children(container)
            .into_iter()
            .map(|child| {
                let mut sizing = self
                    .node(child)
                    .map_or_else(SizingInfo::default, |n| n.sizing);
                if self.is_container(child) {
                    sizing.min_size = self.min_size(child);
                }
                sizing
            })
            .collect()
    }

    fn blocks_percentages(&self, container: ItemId) -> bool {
        self.container(container)
            .is_some_and(|c| c.block_update_percentages)
    }

    fn set_blocks_percentages(&mut self, container: ItemId, value: bool) {
        if let Some(c) = self.container_mut(container) {
            c.block_update_percentages = value;
        }
    }

    fn is_resizing(&self, container: ItemId) -> bool {
        self.container(container).is_some_and(|c| c.is_resizing)
    }

    fn set_resizing(&mut self, container: ItemId, value: bool) {
        if let Some(c) = self.container_mut(container) {
            c.is_resizing = value;
        }
    }

    /// Recompute each child's share of the usable length. Hidden children
    /// hold share `0.0`. Suppressed while a resize is in flight, so that
    /// proportional resizes never accumulate rounding drift.
    fn update_child_percentages(&mut self, container: ItemId) {
        if self.blocks_percentages(container) {
            return;
        }
        let o = self.orientation_of(container);
        let usable = self.usable_length(container);
        if usable <= 0 {
            return;
        }
        for child in self.children_vec(container) {
            let pct = if self.is_visible(child) {
                let pct = f64::from(self.length_of(child, o)) / f64::from(usable);
                debug_assert!(pct > 0.0, "visible child {child} has zero share");
                pct
            } else {
                0.0
            };
            if let Some(node) = self.node_mut(child) {
                node.sizing.percentage_within_parent = pct;
            }
        }
    }

    /// Retained shares of the visible children, in order.
    #[must_use]
    pub fn child_percentages(&self, container: ItemId) -> Vec<f64> {
        self.children(container)
            .iter()
            .filter(|&&c| self.is_visible(c))
            .map(|&c| {
                self.node(c)
                    .map_or(0.0, |n| n.sizing.percentage_within_parent)
            })
            .collect()
    }

    /// Retained share of one item within its parent.
    #[must_use]
    pub fn percentage_within_parent(&self, id: ItemId) -> f64 {
        self.node(id)
            .map_or(0.0, |n| n.sizing.percentage_within_parent)
    }

    /// Pack a working list: consecutive positions along the orientation,
    /// every entry spanning the cross axis. Entries being inserted keep
    /// their separator slot but are not positioned.
    fn position_pass(&self, sizes: &mut [SizingInfo], o: Orientation, cross_len: i32) {
        let mut next_pos = 0;
        for sizing in sizes.iter_mut() {
            if sizing.is_being_inserted {
                next_pos += SEPARATOR_THICKNESS;
                continue;
            }
            sizing.set_length(cross_len, o.opposite());
            sizing.set_pos(next_pos, o);
            next_pos += sizing.length(o) + SEPARATOR_THICKNESS;
        }
    }

    /// Re-pack the container's actual children and refresh percentages.
    fn position_items(&mut self, container: ItemId) {
        let o = self.orientation_of(container);
        let cross_len = self.length_of(container, o.opposite());
        let mut sizes = self.sizes(container);
        self.position_pass(&mut sizes, o, cross_len);
        self.apply_positions(container, &sizes);
        self.update_child_percentages(container);
    }

    fn apply_positions(&mut self, container: ItemId, sizes: &[SizingInfo]) {
        let o = self.orientation_of(container);
        let children = self.visible_children(container);
        debug_assert_eq!(children.len(), sizes.len());
        for (&child, sizing) in children.iter().zip(sizes) {
            if sizing.is_being_inserted {
                continue;
            }
            self.set_length_recursive(child, sizing.length(o.opposite()), o.opposite());
            self.set_pos_point(child, sizing.geometry.top_left());
        }
    }

    /// Push a working list's sizes down to the actual children (containers
    /// re-lay recursively), then re-pack.
    fn apply_sizes(&mut self, container: ItemId, sizes: &[SizingInfo]) {
        let children = self.visible_children(container);
        debug_assert_eq!(children.len(), sizes.len());
        for (&child, sizing) in children.iter().zip(sizes) {
            if sizing.is_being_inserted {
                continue;
            }
            if self.is_container(child) {
                self.resize_container(child, sizing.geometry.size());
            } else {
                self.set_size(child, sizing.geometry.size());
            }
        }
        self.position_items(container);
    }

    /// Resize the root. The new size must respect the aggregated minimum.
    pub fn resize(&mut self, new_size: Size) {
        let root = self.root;
        self.resize_container(root, new_size);
        debug_assert!(self.check_sanity(), "resize left the tree insane");
    }

    /// Recursive resize: children are re-assigned lengths proportional to
    /// their retained percentages, then clamped up to their minimums out of
    /// siblings' slack.
    fn resize_container(&mut self, container: ItemId, new_size: Size) {
        self.set_blocks_percentages(container, true);
        self.resize_container_inner(container, new_size);
        self.set_blocks_percentages(container, false);
    }

    fn resize_container_inner(&mut self, container: ItemId, new_size: Size) {
        let min_size = self.min_size(container);
        if new_size.width < min_size.width || new_size.height < min_size.height {
            tracing::warn!(
                "resize of {container} below minimum: new={new_size:?} min={min_size:?}"
            );
            return;
        }

        let old_size = self.size_of(container);
        let width_changed = old_size.width != new_size.width;
        let height_changed = old_size.height != new_size.height;
        if !width_changed && !height_changed {
            return;
        }

        let o = self.orientation_of(container);
        let length_changed = match o {
            Orientation::Horizontal => width_changed,
            Orientation::Vertical => height_changed,
        };

        self.set_size(container, new_size);

        if self.is_resizing(container) {
            return;
        }

        let total_new_length = self.usable_length(container);
        let mut remaining = total_new_length;

        let percentages = self.child_percentages(container);
        let mut child_sizes = self.sizes(container);
        let count = child_sizes.len();

        // First pass: proportional assignment, last child absorbing the
        // rounding remainder; cross-axis spans follow the container. Entries
        // being inserted are excluded from the accounting.
        let last_active = child_sizes.iter().rposition(|s| !s.is_being_inserted);
        for (i, sizing) in child_sizes.iter_mut().enumerate() {
            if sizing.is_being_inserted {
                continue;
            }
            let is_last = Some(i) == last_active;
            let new_length = if length_changed {
                if is_last {
                    remaining
                } else {
                    #[allow(clippy::cast_possible_truncation)]
                    let proportional =
                        (percentages[i] * f64::from(total_new_length)).round() as i32;
                    proportional
                }
            } else {
                sizing.length(o)
            };

            if new_length <= 0 {
                tracing::error!("resize of {container} produced a non-positive child length");
                debug_assert!(false, "non-positive child length during resize");
                return;
            }
            remaining -= new_length;

            let size = new_size
                .with_length(new_length, o)
                .with_length(new_size.length(o.opposite()), o.opposite());
            sizing.geometry = sizing.geometry.with_size(size);
        }

        let cross_len = new_size.length(o.opposite());
        self.position_pass(&mut child_sizes, o, cross_len);

        // Second pass: enforce minimums out of siblings' slack.
        for i in 0..count {
            if child_sizes[i].is_being_inserted {
                continue;
            }
            let missing = child_sizes[i].missing_length(o);
            if missing == 0 {
                continue;
            }
            self.grow_item_in(
                o,
                i,
                &mut child_sizes,
                missing,
                GrowthStrategy::BothSidesEqually,
            );
            let min_length = child_sizes[i].min_length(o);
            child_sizes[i].set_length(min_length, o);
        }

        self.apply_sizes(container, &child_sizes);
        self.position_items(container);
    }

    /// Fair-share squeeze: how much each donor gives up so that `needed`
    /// pixels are freed, never taking an entry below its minimum.
    fn calculate_squeezes(&self, range: &[SizingInfo], needed: i32, o: Orientation) -> Vec<i32> {
        let mut availabilities: Vec<i32> = range
            .iter()
            .map(|sizing| sizing.available_length(o).max(0))
            .collect();
        let mut squeezes = vec![0; availabilities.len()];

        let mut missing = needed;
        while missing > 0 {
            let num_donors = availabilities.iter().filter(|&&a| a > 0).count() as i32;
            if num_donors == 0 {
                tracing::error!("no donors left while squeezing {needed}px\n{}", self.dump_layout());
                debug_assert!(false, "calculate_squeezes ran out of donors");
                return squeezes;
            }

            let mut to_take = missing / num_donors;
            if to_take == 0 {
                to_take = missing;
            }

            for (availability, squeeze) in availabilities.iter_mut().zip(squeezes.iter_mut()) {
                if *availability == 0 {
                    continue;
                }
                let took = to_take.min(*availability);
                *availability -= took;
                missing -= took;
                *squeeze += took;
                if missing == 0 {
                    break;
                }
            }
        }

        squeezes
    }

    /// Free `amount` pixels around `sizes[index]` by squeezing the siblings
    /// on both sides, preferring an even split. The entry's own length is
    /// left to the caller.
    fn grow_item_in(
        &self,
        o: Orientation,
        index: usize,
        sizes: &mut [SizingInfo],
        amount: i32,
        strategy: GrowthStrategy,
    ) {
        let GrowthStrategy::BothSidesEqually = strategy;
        if amount == 0 {
            return;
        }
        if sizes.len() == 1 {
            let len = sizes[0].length(o);
            sizes[0].set_length(len + amount, o);
            return;
        }

        let side1 = LengthOnSide::over(&sizes[..index], o);
        let side2 = LengthOnSide::over(&sizes[index + 1..], o);
        let mut available1 = side1.available();
        let mut available2 = side2.available();

        let mut amount = amount;
        if amount > available1 + available2 {
            tracing::error!(
                "grow of {amount}px exceeds sibling slack {}px\n{}",
                available1 + available2,
                self.dump_layout()
            );
            debug_assert!(false, "grow amount exceeds sibling slack");
            amount = available1 + available2;
        }

        let mut side1_growth = 0;
        let mut side2_growth = 0;
        let mut missing = amount;
        while missing > 0 {
            if available1 == 0 {
                side2_growth += missing;
                break;
            }
            if available2 == 0 {
                side1_growth += missing;
                break;
            }

            let to_take = (missing / 2).max(1);
            let took1 = to_take.min(available1);
            missing -= took1;
            side1_growth += took1;
            available1 -= took1;
            if missing == 0 {
                break;
            }

            let took2 = to_take.min(available2);
            missing -= took2;
            side2_growth += took2;
            available2 -= took2;
        }

        self.apply_growth(o, index, sizes, side1_growth, side2_growth);
    }

    /// Shrink the donors on each side by their fair-share squeeze.
    fn apply_growth(
        &self,
        o: Orientation,
        index: usize,
        sizes: &mut [SizingInfo],
        side1_growth: i32,
        side2_growth: i32,
    ) {
        debug_assert!(side1_growth > 0 || side2_growth > 0);

        if side1_growth > 0 {
            let squeezes = self.calculate_squeezes(&sizes[..index], side1_growth, o);
            for (sizing, squeeze) in sizes[..index].iter_mut().zip(squeezes) {
                sizing.geometry = sizing.geometry.adjusted_along(o, 0, -squeeze);
            }
        }
        if side2_growth > 0 {
            let squeezes = self.calculate_squeezes(&sizes[index + 1..], side2_growth, o);
            for (sizing, squeeze) in sizes[index + 1..].iter_mut().zip(squeezes) {
                sizing.geometry = sizing.geometry.adjusted_along(o, squeeze, 0);
            }
        }
    }

    /// Give `item` `amount` more pixels out of its siblings' slack and apply
    /// the result.
    fn grow_item(&mut self, container: ItemId, item: ItemId, amount: i32) {
        let o = self.orientation_of(container);
        let children = self.visible_children(container);
        let Some(index) = children.iter().position(|&c| c == item) else {
            tracing::warn!("grow_item: {item} is not a visible child of {container}");
            return;
        };
        let mut sizes = self.sizes(container);
        self.grow_item_in(
            o,
            index,
            &mut sizes,
            amount,
            GrowthStrategy::BothSidesEqually,
        );
        let len = sizes[index].length(o);
        sizes[index].set_length(len + amount, o);
        self.apply_sizes(container, &sizes);
    }

    /// Bring a hidden (or just-inserted) item back into the layout.
    ///
    /// The restored length is the item's retained length, clamped between
    /// its minimum and what the siblings can give up; the siblings are
    /// squeezed by that length plus one separator.
    fn restore_placeholder_in(&mut self, container: ItemId, item: ItemId) {
        debug_assert!(self.contains(container, item));

        let container_was_hidden = self
            .children(container)
            .iter()
            .all(|&c| c == item || !self.is_visible(c));
        if !self.is_container(item) {
            self.set_is_visible(item, true);
        }
        if container_was_hidden
            && !self.is_root(container)
            && let Some(grandparent) = self.parent(container)
        {
            // The container itself was a hidden shell; re-pack it into its
            // own parent first.
            self.restore_placeholder_in(grandparent, container);
        }

        if self.num_visible_children(container) == 1 {
            let rect = self.rect(container);
            self.set_geometry_recursive(item, rect);
            self.update_child_percentages(container);
            return;
        }

        let o = self.orientation_of(container);
        let Some(index) = self.index_of_visible_child(container, item) else {
            tracing::warn!("restore_placeholder: {item} is not visible in {container}");
            return;
        };

        let mut sizes = self.sizes(container);
        let count = sizes.len() as i32;
        let mut others = 0;
        let mut donor_slack = 0;
        for (i, sizing) in sizes.iter().enumerate() {
            if i != index {
                others += sizing.length(o);
                donor_slack += sizing.available_length(o).max(0);
            }
        }

        // The largest length whose overflow the siblings can still absorb.
        let budget = self.length(container) + donor_slack
            - others
            - (count - 1) * SEPARATOR_THICKNESS;

        let available = self.available_length(container);
        let proposed = self.length_of(item, o);
        let min_length = self.min_size(item).length(o);

        let mut new_length = proposed.min(proposed + available).min(budget);
        if new_length < min_length {
            if min_length > budget {
                tracing::warn!(
                    "restoring {item} at its minimum despite siblings lacking slack"
                );
            }
            new_length = min_length;
        }

        sizes[index].set_length(new_length, o);

        // Squeeze the siblings by exactly the packing overflow the restored
        // item introduces.
        let occupied = sizes.iter().map(|s| s.length(o)).sum::<i32>()
            + (count - 1) * SEPARATOR_THICKNESS;
        let overflow = occupied - self.length(container);
        if overflow > 0 {
            self.grow_item_in(
                o,
                index,
                &mut sizes,
                overflow,
                GrowthStrategy::BothSidesEqually,
            );
        } else if overflow < 0 {
            sizes[index].set_length(new_length - overflow, o);
        }
        self.apply_sizes(container, &sizes);
    }

    /// Show a placeholder again, back in its retained slot.
    pub fn restore_placeholder(&mut self, item: ItemId) {
        let Some(parent) = self.parent(item) else {
            tracing::warn!("restore_placeholder on staged item {item}");
            return;
        };
        if self.is_visible(item) {
            tracing::warn!("restore_placeholder on visible item {item}");
            return;
        }
        self.restore_placeholder_in(parent, item);
        debug_assert!(
            self.check_sanity(),
            "restore_placeholder left the tree insane"
        );
    }

    /// A child's minimum grew or shrank. The root absorbs overflow by
    /// growing; otherwise the starved child is grown out of its siblings'
    /// slack.
    fn on_child_min_size_changed(&mut self, container: ItemId, child: ItemId) {
        let missing_self = self.missing_size(container);
        if !missing_self.is_zero() {
            self.set_resizing(container, true);
            if self.is_root(container) {
                let grown = self.size_of(container).grown_by(missing_self);
                self.resize_container(container, grown);

                let last = self
                    .visible_children(container)
                    .into_iter()
                    .rev()
                    .find(|&c| !self.is_being_inserted(c));
                if let Some(last) = last {
                    let geo = self.node_geometry(last);
                    self.set_geometry(
                        last,
                        Rect::new(
                            geo.x,
                            geo.y,
                            geo.width + missing_self.width,
                            geo.height + missing_self.height,
                        ),
                    );
                }
            }
            self.set_resizing(container, false);

            if let Some(parent) = self.parent(container) {
                self.on_child_min_size_changed(parent, container);
            }
        }

        if self.num_visible_children(container) == 1 {
            if self.is_visible(child) {
                let rect = self.rect(container);
                self.set_geometry_recursive(child, rect);
            }
            return;
        }

        if self.is_being_inserted(child) {
            return;
        }

        let o = self.orientation_of(container);
        let missing_for_child = self.missing_size(child).length(o);
        if missing_for_child > 0 {
            self.grow_item(container, child, missing_for_child);
        }
    }
}

impl LayoutTree {
    // ------------------------------------------------------------------
    // Drop-rect suggestion
    // ------------------------------------------------------------------

    /// Where a would-be-inserted item of the given minimum size would land,
    /// in root coordinates. Pure query; the layout is not touched.
    ///
    /// With no anchor the rectangle hugs the named edge of the root. Invalid
    /// arguments yield an empty rectangle.
    #[must_use]
    pub fn suggested_drop_rect(
        &self,
        min_size: Size,
        anchor: Option<ItemId>,
        loc: Location,
    ) -> Rect {
        if loc == Location::None {
            tracing::warn!("suggested_drop_rect with Location::None");
            return Rect::default();
        }

        let Some(anchor) = anchor else {
            return self.drop_rect_on_root(min_size, loc);
        };

        let Some(container) = self.parent(anchor) else {
            tracing::warn!("suggested_drop_rect: anchor {anchor} has no parent container");
            return Rect::default();
        };
        if !self.is_visible(anchor) {
            tracing::warn!("suggested_drop_rect: anchor {anchor} is not visible");
            return Rect::default();
        }

        if self.num_visible_children(container) == 1 {
            // Lone child: the drop is effectively relative to the whole
            // container, which must be the root for the edges to mean
            // anything.
            if self.is_root(container) {
                return self.drop_rect_on_root(min_size, loc);
            }
            tracing::warn!("suggested_drop_rect: lone anchor in a nested container");
            return Rect::default();
        }

        let local = self.drop_rect_next_to(container, min_size, anchor, loc);
        if local.is_empty() {
            return local;
        }
        local.translated(self.origin_in_root(container))
    }

    fn drop_rect_on_root(&self, min_size: Size, loc: Location) -> Rect {
        let Some(axis) = loc.orientation() else {
            return Rect::default();
        };
        let root = self.root;
        let length = self.length_of(root, axis);
        let available =
            length - self.min_size(root).length(axis) - SEPARATOR_THICKNESS;
        let one_third = length / 3;
        let suggested = available.min(one_third).max(min_size.length(axis));

        let rect = self.rect(root);
        match loc {
            Location::OnLeft => rect.with_far_edge(Orientation::Horizontal, suggested),
            Location::OnTop => rect.with_far_edge(Orientation::Vertical, suggested),
            Location::OnRight => {
                rect.with_near_edge(Orientation::Horizontal, rect.right() - suggested)
            }
            Location::OnBottom => {
                rect.with_near_edge(Orientation::Vertical, rect.bottom() - suggested)
            }
            Location::None => Rect::default(),
        }
    }

    fn drop_rect_next_to(
        &self,
        container: ItemId,
        min_size: Size,
        anchor: ItemId,
        loc: Location,
    ) -> Rect {
        let o = self.orientation_of(container);
        let anchor_geo = self.node_geometry(anchor);
        let sizes = self.sizes(container);
        let count = sizes.len();
        let Some(index) = self.index_of_visible_child(container, anchor) else {
            return Rect::default();
        };

        if loc.orientation() == Some(o) {
            let item_min = min_size.length(o);
            let available = self.available_length(container) - SEPARATOR_THICKNESS;
            let equitative = self.usable_length(container)
                / (self.children(container).len() as i32 + 1);
            let suggested = available.min(equitative).max(item_min);
            let anchor_pos = anchor_geo.pos(o);

            let suggested_pos = match loc.side() {
                Some(Side::Side1) => {
                    if index == 0 {
                        0
                    } else {
                        let side1 = LengthOnSide::over(&sizes[..index], o);
                        let side2 = LengthOnSide::over(&sizes[index..], o);
                        let min1 = anchor_pos - side1.available();
                        let max2 = anchor_pos + side2.available() - suggested;
                        clamp_preferring_min(anchor_pos - suggested / 2, min1, max2)
                    }
                }
                _ => {
                    if index == count - 1 {
                        self.length(container) - suggested
                    } else {
                        let boundary = anchor_pos + anchor_geo.length(o);
                        let side1 = LengthOnSide::over(&sizes[..=index], o);
                        let side2 = LengthOnSide::over(&sizes[index + 1..], o);
                        let min1 = boundary - side1.available();
                        let max2 = boundary + side2.available() - suggested;
                        clamp_preferring_min(boundary - suggested / 2, min1, max2)
                    }
                }
            };

            match o {
                Orientation::Horizontal => {
                    Rect::new(suggested_pos, anchor_geo.y, suggested, anchor_geo.height)
                }
                Orientation::Vertical => {
                    Rect::new(anchor_geo.x, suggested_pos, anchor_geo.width, suggested)
                }
            }
        } else {
            // Perpendicular drop: a slice off the anchor, hugging the
            // requested edge.
            let Some(axis) = loc.orientation() else {
                return Rect::default();
            };
            let item_min = min_size.length(axis);
            let available = self.length_of(container, axis)
                - self.min_size(container).length(axis)
                - SEPARATOR_THICKNESS;
            let one_third = self.length_of(container, axis) / 3;
            let suggested = available.min(one_third).max(item_min);

            match loc {
                Location::OnLeft => Rect::new(
                    anchor_geo.x,
                    anchor_geo.y,
                    suggested,
                    anchor_geo.height,
                ),
                Location::OnTop => Rect::new(
                    anchor_geo.x,
                    anchor_geo.y,
                    anchor_geo.width,
                    suggested,
                ),
                Location::OnRight => Rect::new(
                    anchor_geo.right() - suggested,
                    anchor_geo.y,
                    suggested,
                    anchor_geo.height,
                ),
                Location::OnBottom => Rect::new(
                    anchor_geo.x,
                    anchor_geo.bottom() - suggested,
                    anchor_geo.width,
                    suggested,
                ),
                Location::None => Rect::default(),
            }
        }
    }

    // ------------------------------------------------------------------
    // Sanity checking and dump
    // ------------------------------------------------------------------

    /// Validate every structural and geometric invariant from the root
    /// down. Violations are logged with a full layout dump.
    #[must_use]
    pub fn check_sanity(&self) -> bool {
        self.check_item_sanity(self.root, true)
    }

    /// Validate one item; with `recursive` the whole subtree is checked.
    #[must_use]
    pub fn check_item_sanity(&self, id: ItemId, recursive: bool) -> bool {
        let Some(node) = self.node(id) else {
            tracing::warn!("check_sanity on unknown item {id}");
            return false;
        };

        if self.is_visible(id) && !node.sizing.is_being_inserted {
            let min = self.min_size(id);
            let size = node.sizing.geometry.size();
            if min.width > size.width || min.height > size.height {
                tracing::warn!(
                    "size constraints not honoured on {id}: min={min:?} size={size:?}\n{}",
                    self.dump_layout()
                );
                return false;
            }
        }

        let NodeKind::Container(state) = &node.kind else {
            return true;
        };

        if state.children.is_empty() && !self.is_root(id) {
            tracing::warn!("container {id} is empty and should have been removed");
            return false;
        }
        if self.is_root(id) && node.sizing.geometry.top_left() != Point::new(0, 0) {
            tracing::warn!(
                "root origin is {:?}, expected (0, 0)",
                node.sizing.geometry.top_left()
            );
            return false;
        }

        let o = state.orientation;
        let mut seen = Vec::with_capacity(state.children.len());
        for &child in &state.children {
            if self.parent(child) != Some(id) {
                tracing::warn!("bad parent back-edge on {child}: expected {id}");
                return false;
            }
            if seen.contains(&child) {
                tracing::warn!("duplicate child {child} in container {id}");
                return false;
            }
            seen.push(child);
        }

        let visible = self.visible_children(id);
        let container_rect = self.rect(id);
        let cross_len = container_rect.length(o.opposite());
        let mut expected_pos = 0;
        for &child in &visible {
            let geo = self.node_geometry(child);
            if geo.pos(o) != expected_pos {
                tracing::warn!(
                    "unexpected position of {child}: {} (expected {expected_pos})\n{}",
                    geo.pos(o),
                    self.dump_layout()
                );
                return false;
            }
            expected_pos = geo.pos(o) + geo.length(o) + SEPARATOR_THICKNESS;

            if geo.length(o.opposite()) != cross_len {
                tracing::warn!(
                    "cross-axis mismatch on {child}: {} vs container {cross_len}\n{}",
                    geo.length(o.opposite()),
                    self.dump_layout()
                );
                return false;
            }
            if !container_rect.contains_rect(&geo) {
                tracing::warn!(
                    "geometry of {child} out of bounds: {geo:?} vs {container_rect:?}\n{}",
                    self.dump_layout()
                );
                return false;
            }
        }

        if !visible.is_empty() {
            let occupied = SEPARATOR_THICKNESS * (visible.len() as i32 - 1)
                + visible
                    .iter()
                    .map(|&c| self.length_of(c, o))
                    .sum::<i32>();
            if occupied != self.length(id) {
                tracing::warn!(
                    "unexpected occupied length in {id}: {occupied} vs {}\n{}",
                    self.length(id),
                    self.dump_layout()
                );
                return false;
            }

            let total: f64 = self.child_percentages(id).iter().sum();
            if (total - 1.0).abs() > 1e-6 {
                tracing::warn!(
                    "child percentages of {id} sum to {total}, expected 1.0\n{}",
                    self.dump_layout()
                );
                return false;
            }
        }

        if recursive {
            for &child in &state.children {
                if !self.check_item_sanity(child, true) {
                    return false;
                }
            }
        }

        true
    }

    /// Deterministic indented snapshot of the tree, for tests and debugging.
    #[must_use]
    pub fn dump_layout(&self) -> String {
        let mut out = String::new();
        self.dump_item(self.root, 0, &mut out);
        out
    }

    fn dump_item(&self, id: ItemId, level: usize, out: &mut String) {
        let indent = "  ".repeat(level);
        let Some(node) = self.node(id) else {
            let _ = writeln!(out, "{indent}? missing item {id}");
            return;
        };

        let mut flags = String::new();
        if !self.is_visible(id) {
            flags.push_str(" ;hidden;");
        }
        if node.sizing.is_being_inserted {
            flags.push_str(" ;being-inserted;");
        }
        let geo = fmt_rect(node.sizing.geometry);

        match &node.kind {
            NodeKind::Container(state) => {
                let tag = if self.is_root(id) { "Root" } else { "Layout" };
                let percentages = self
                    .child_percentages(id)
                    .iter()
                    .map(|p| format!("{p:.3}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = writeln!(
                    out,
                    "{indent}* {tag} {id} ({:?}) {geo}{flags} %=[{percentages}]",
                    state.orientation
                );
                for &child in &state.children {
                    self.dump_item(child, level + 1, out);
                }
            }
            NodeKind::Leaf(_) => {
                let _ = writeln!(out, "{indent}- Item {id} \"{}\" {geo}{flags}", node.name);
            }
        }
    }
}

fn fmt_rect(r: Rect) -> String {
    format!("({},{} {}x{})", r.x, r.y, r.width, r.height)
}

/// Clamp preferring the lower bound when the bounds cross.
fn clamp_preferring_min(value: i32, min: i32, max: i32) -> i32 {
    value.min(max).max(min)
}
