#![forbid(unsafe_code)]

//! Sizing vocabulary: sides, insertion locations, and the per-item
//! geometric cache.

use dockline_core::geometry::{Orientation, Rect, Size};
use serde::{Deserialize, Serialize};

/// Gap in pixels between sibling visible children along a container's
/// orientation.
pub const SEPARATOR_THICKNESS: i32 = 5;

/// Absolute floor for any leaf's minimum width.
pub const HARD_MIN_WIDTH: i32 = 80;

/// Absolute floor for any leaf's minimum height.
pub const HARD_MIN_HEIGHT: i32 = 90;

/// Sentinel coordinate for "effectively unbounded" maximum sizes.
pub const LAYOUT_MAX_LENGTH: i32 = 16_777_215;

/// The absolute floor for any leaf's minimum size.
#[must_use]
pub const fn hard_minimum_size() -> Size {
    Size::new(HARD_MIN_WIDTH, HARD_MIN_HEIGHT)
}

/// Low/high edge of a container along its orientation.
///
/// `Side1` is left (horizontal) or top (vertical); `Side2` is right or
/// bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Side1,
    Side2,
}

/// Where to insert an item relative to an anchor (or a container edge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// No placement. Mutators reject it; queries return an empty rect.
    None,
    OnLeft,
    OnTop,
    OnRight,
    OnBottom,
}

impl Location {
    /// The packing axis this location inserts along.
    #[must_use]
    pub const fn orientation(self) -> Option<Orientation> {
        match self {
            Self::None => None,
            Self::OnLeft | Self::OnRight => Some(Orientation::Horizontal),
            Self::OnTop | Self::OnBottom => Some(Orientation::Vertical),
        }
    }

    /// The edge this location inserts at.
    #[must_use]
    pub const fn side(self) -> Option<Side> {
        match self {
            Self::None => None,
            Self::OnLeft | Self::OnTop => Some(Side::Side1),
            Self::OnRight | Self::OnBottom => Some(Side::Side2),
        }
    }
}

/// Per-item geometric cache.
///
/// `geometry` is in parent-relative coordinates. `percentage_within_parent`
/// is the item's share of its parent's usable length, retained across
/// proportional resizes so consecutive resizes don't accumulate rounding
/// drift; it is `0.0` while the item is hidden.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingInfo {
    pub geometry: Rect,
    pub min_size: Size,
    pub max_size: Size,
    pub percentage_within_parent: f64,
    /// Transient: while set, the item is excluded from geometry accounting.
    pub is_being_inserted: bool,
}

impl Default for SizingInfo {
    fn default() -> Self {
        Self {
            geometry: Rect::default(),
            min_size: hard_minimum_size(),
            max_size: Size::new(LAYOUT_MAX_LENGTH, LAYOUT_MAX_LENGTH),
            percentage_within_parent: 0.0,
            is_being_inserted: false,
        }
    }
}

impl SizingInfo {
    /// Current extent along `o`.
    #[inline]
    #[must_use]
    pub const fn length(&self, o: Orientation) -> i32 {
        self.geometry.length(o)
    }

    /// Minimum extent along `o`.
    #[inline]
    #[must_use]
    pub const fn min_length(&self, o: Orientation) -> i32 {
        self.min_size.length(o)
    }

    /// Slack along `o`: current length minus minimum.
    #[inline]
    #[must_use]
    pub const fn available_length(&self, o: Orientation) -> i32 {
        self.length(o) - self.min_length(o)
    }

    /// How far below minimum the item currently is along `o` (clamped ≥ 0).
    #[inline]
    #[must_use]
    pub fn missing_length(&self, o: Orientation) -> i32 {
        (self.min_length(o) - self.length(o)).max(0)
    }

    /// Position of the near edge along `o`.
    #[inline]
    #[must_use]
    pub const fn pos(&self, o: Orientation) -> i32 {
        self.geometry.pos(o)
    }

    /// Replace the extent along `o`, position preserved.
    pub fn set_length(&mut self, len: i32, o: Orientation) {
        self.geometry = self.geometry.with_size(self.geometry.size().with_length(len, o));
    }

    /// Replace the near-edge position along `o`, size preserved.
    pub fn set_pos(&mut self, pos: i32, o: Orientation) {
        let mut top_left = self.geometry.top_left();
        match o {
            Orientation::Horizontal => top_left.x = pos,
            Orientation::Vertical => top_left.y = pos,
        }
        self.geometry = self.geometry.moved_to(top_left);
    }
}

/// Aggregate of a contiguous run of siblings on one side of an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LengthOnSide {
    pub length: i32,
    pub min_length: i32,
}

impl LengthOnSide {
    /// Slack the run can give up without violating minimums (clamped ≥ 0).
    #[inline]
    #[must_use]
    pub fn available(&self) -> i32 {
        (self.length - self.min_length).max(0)
    }

    /// Aggregate a run of sizing entries along `o`.
    #[must_use]
    pub fn over(sizes: &[SizingInfo], o: Orientation) -> Self {
        let mut result = Self::default();
        for size in sizes {
            result.length += size.length(o);
            result.min_length += size.min_length(o);
        }
        result
    }
}
