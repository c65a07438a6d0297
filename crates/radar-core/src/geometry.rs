#![forbid(unsafe_code)]

//! Geometric primitives and the clamp math behind panel drag/resize.
//!
//! Everything here is pure: given the same inputs the functions return the
//! same rectangle, and feeding a clamped rectangle back through
//! [`clamp_rect`] with the same bounds returns it unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Pointer or offset position in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub const fn delta_from(self, other: Point) -> Point {
        Point::new(
            self.x.saturating_sub(other.x),
            self.y.saturating_sub(other.y),
        )
    }
}

/// Absolute rectangle in viewport pixels (origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    #[must_use]
    pub const fn left(&self) -> i32 {
        self.x
    }

    #[inline]
    #[must_use]
    pub const fn top(&self) -> i32 {
        self.y
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    #[inline]
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }
}

/// Visible area the panels live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

/// Minimum/maximum panel size.
///
/// A `max` smaller than its `min` is treated as equal to the `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBounds {
    pub min_width: i32,
    pub min_height: i32,
    pub max_width: i32,
    pub max_height: i32,
}

impl SizeBounds {
    #[must_use]
    pub const fn new(min_width: i32, min_height: i32, max_width: i32, max_height: i32) -> Self {
        Self {
            min_width,
            min_height,
            max_width,
            max_height,
        }
    }
}

bitflags::bitflags! {
    /// Edges moved by a resize handle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResizeEdges: u8 {
        const NORTH = 1 << 0;
        const SOUTH = 1 << 1;
        const EAST = 1 << 2;
        const WEST = 1 << 3;

        const NORTH_EAST = Self::NORTH.bits() | Self::EAST.bits();
        const NORTH_WEST = Self::NORTH.bits() | Self::WEST.bits();
        const SOUTH_EAST = Self::SOUTH.bits() | Self::EAST.bits();
        const SOUTH_WEST = Self::SOUTH.bits() | Self::WEST.bits();
    }
}

impl ResizeEdges {
    /// Every handle a panel can expose, in the order the overlay draws them.
    pub const HANDLES: [ResizeEdges; 8] = [
        Self::NORTH,
        Self::SOUTH,
        Self::WEST,
        Self::EAST,
        Self::NORTH_WEST,
        Self::NORTH_EAST,
        Self::SOUTH_WEST,
        Self::SOUTH_EAST,
    ];

    /// Compass name of a single handle (`"n"`, `"se"`, ...).
    #[must_use]
    pub fn handle_name(self) -> Option<&'static str> {
        let name = match self {
            s if s == Self::NORTH => "n",
            s if s == Self::SOUTH => "s",
            s if s == Self::EAST => "e",
            s if s == Self::WEST => "w",
            s if s == Self::NORTH_EAST => "ne",
            s if s == Self::NORTH_WEST => "nw",
            s if s == Self::SOUTH_EAST => "se",
            s if s == Self::SOUTH_WEST => "sw",
            _ => return None,
        };
        Some(name)
    }
}

/// Unknown resize handle name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeHandleError {
    pub handle: String,
}

impl fmt::Display for ResizeHandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown resize handle {:?}", self.handle)
    }
}

impl std::error::Error for ResizeHandleError {}

impl FromStr for ResizeEdges {
    type Err = ResizeHandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::HANDLES
            .into_iter()
            .find(|edges| {
                edges
                    .handle_name()
                    .is_some_and(|name| name.eq_ignore_ascii_case(trimmed))
            })
            .ok_or_else(|| ResizeHandleError {
                handle: s.to_string(),
            })
    }
}

/// Clamp one dimension to `[min, max]`, also keeping it within `room` when
/// the room can hold the minimum.
fn clamp_extent(value: i32, min: i32, max: i32, room: i32) -> i32 {
    let upper = max.min(room).max(min);
    value.max(min).min(upper)
}

/// Clamp an origin coordinate so `[pos, pos + extent]` stays inside `[0, limit]`.
fn clamp_axis(pos: i32, extent: i32, limit: i32) -> i32 {
    pos.clamp(0, limit.saturating_sub(extent).max(0))
}

/// Clamp a proposed rectangle to the size bounds and the viewport.
///
/// Width and height are clamped first (to `[min, max]`, and to the viewport
/// when the viewport can hold the minimum size), then the origin is clamped
/// so the rectangle stays on screen. Axes are independent.
#[must_use]
pub fn clamp_rect(proposed: Rect, viewport: Viewport, bounds: SizeBounds) -> Rect {
    let width = clamp_extent(
        proposed.width,
        bounds.min_width,
        bounds.max_width,
        viewport.width,
    );
    let height = clamp_extent(
        proposed.height,
        bounds.min_height,
        bounds.max_height,
        viewport.height,
    );
    Rect::new(
        clamp_axis(proposed.x, width, viewport.width),
        clamp_axis(proposed.y, height, viewport.height),
        width,
        height,
    )
}

/// Rectangle for a drag: the pointer minus the grab offset, clamped.
#[must_use]
pub fn drag_rect(
    origin: Rect,
    pointer: Point,
    pointer_offset: Point,
    viewport: Viewport,
    bounds: SizeBounds,
) -> Rect {
    let proposed = Rect::new(
        pointer.x.saturating_sub(pointer_offset.x),
        pointer.y.saturating_sub(pointer_offset.y),
        origin.width,
        origin.height,
    );
    clamp_rect(proposed, viewport, bounds)
}

/// Rectangle for a resize of `edges` by the cumulative pointer `delta`.
///
/// The edge opposite each moving edge stays where it was in `origin`:
/// west/north growth stops at the viewport origin and east/south growth at
/// the viewport edge instead of pushing the panel.
#[must_use]
pub fn resize_rect(
    origin: Rect,
    edges: ResizeEdges,
    delta: Point,
    viewport: Viewport,
    bounds: SizeBounds,
) -> Rect {
    let mut next = origin;

    if edges.contains(ResizeEdges::EAST) {
        next.width = clamp_extent(
            origin.width.saturating_add(delta.x),
            bounds.min_width,
            bounds.max_width,
            viewport.width.saturating_sub(origin.x),
        );
    } else if edges.contains(ResizeEdges::WEST) {
        next.width = clamp_extent(
            origin.width.saturating_sub(delta.x),
            bounds.min_width,
            bounds.max_width,
            origin.right(),
        );
        next.x = origin.x + (origin.width - next.width);
    }

    if edges.contains(ResizeEdges::SOUTH) {
        next.height = clamp_extent(
            origin.height.saturating_add(delta.y),
            bounds.min_height,
            bounds.max_height,
            viewport.height.saturating_sub(origin.y),
        );
    } else if edges.contains(ResizeEdges::NORTH) {
        next.height = clamp_extent(
            origin.height.saturating_sub(delta.y),
            bounds.min_height,
            bounds.max_height,
            origin.bottom(),
        );
        next.y = origin.y + (origin.height - next.height);
    }

    clamp_rect(next, viewport, bounds)
}
