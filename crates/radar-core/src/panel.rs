#![forbid(unsafe_code)]

//! Overlay panels: identity, anchored rectangles, and the `px` wire format.
//!
//! Hosts persist panel placement as CSS-like strings (`"120px"`). Internally a
//! panel is an integer rectangle anchored either to the left or the right
//! viewport edge; any drag or resize converts it to left-anchored.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, ResizeEdges, SizeBounds, Viewport, clamp_rect};

/// The three movable overlay panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelId {
    Radar,
    Log,
    Bolo,
}

impl PanelId {
    pub const ALL: [PanelId; 3] = [Self::Radar, Self::Log, Self::Bolo];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Radar => "radar",
            Self::Log => "log",
            Self::Bolo => "bolo",
        }
    }

    /// Static layout for this panel.
    #[must_use]
    pub const fn spec(self) -> &'static PanelSpec {
        match self {
            Self::Radar => &RADAR_PANEL,
            Self::Log => &LOG_PANEL,
            Self::Bolo => &BOLO_PANEL,
        }
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Panel key that names none of the overlay panels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPanel(pub String);

impl fmt::Display for UnknownPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown panel {:?}", self.0)
    }
}

impl std::error::Error for UnknownPanel {}

impl FromStr for PanelId {
    type Err = UnknownPanel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownPanel(s.to_string()))
    }
}

/// Which horizontal offset of a [`PanelRect`] is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAnchor {
    Left,
    Right,
}

/// Panel placement as the host sees it: an offset from one horizontal edge,
/// a top offset, and a size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelRect {
    pub anchor: HorizontalAnchor,
    /// Distance from the anchored edge.
    pub offset: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl PanelRect {
    #[must_use]
    pub const fn left(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            anchor: HorizontalAnchor::Left,
            offset: left,
            top,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn right(right: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            anchor: HorizontalAnchor::Right,
            offset: right,
            top,
            width,
            height,
        }
    }

    /// Left-anchored placement of an absolute rectangle.
    #[must_use]
    pub const fn from_rect(rect: Rect) -> Self {
        Self::left(rect.x, rect.y, rect.width, rect.height)
    }

    /// Absolute rectangle in `viewport`.
    #[must_use]
    pub const fn resolve(&self, viewport: Viewport) -> Rect {
        let x = match self.anchor {
            HorizontalAnchor::Left => self.offset,
            HorizontalAnchor::Right => viewport
                .width
                .saturating_sub(self.offset)
                .saturating_sub(self.width),
        };
        Rect::new(x, self.top, self.width, self.height)
    }

    /// Clamp to `viewport` and `bounds`, keeping the current anchor.
    #[must_use]
    pub fn clamped(&self, viewport: Viewport, bounds: SizeBounds) -> Self {
        let rect = clamp_rect(self.resolve(viewport), viewport, bounds);
        match self.anchor {
            HorizontalAnchor::Left => Self::from_rect(rect),
            HorizontalAnchor::Right => Self::right(
                viewport.width.saturating_sub(rect.right()),
                rect.y,
                rect.width,
                rect.height,
            ),
        }
    }

    /// Wire form. Only the authoritative horizontal key is present.
    #[must_use]
    pub fn to_position(&self) -> PanelPosition {
        let (left, right) = match self.anchor {
            HorizontalAnchor::Left => (Some(format_px(self.offset)), None),
            HorizontalAnchor::Right => (None, Some(format_px(self.offset))),
        };
        PanelPosition {
            left,
            top: Some(format_px(self.top)),
            right,
            width: Some(format_px(self.width)),
            height: Some(format_px(self.height)),
        }
    }

    /// Overlay the parseable fields of `position`; the rest stay as they are.
    ///
    /// A parseable `left` wins over `right`.
    pub fn apply_position(&mut self, position: &PanelPosition) {
        if let Some(left) = position.left_px() {
            self.anchor = HorizontalAnchor::Left;
            self.offset = left;
        } else if let Some(right) = position.right_px() {
            self.anchor = HorizontalAnchor::Right;
            self.offset = right;
        }
        if let Some(top) = position.top_px() {
            self.top = top;
        }
        if let Some(width) = position.width_px() {
            self.width = width;
        }
        if let Some(height) = position.height_px() {
            self.height = height;
        }
    }
}

/// Persisted panel placement, every field a CSS-like pixel string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelPosition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
}

impl PanelPosition {
    #[must_use]
    pub fn left_px(&self) -> Option<i32> {
        self.left.as_deref().and_then(parse_px)
    }

    #[must_use]
    pub fn top_px(&self) -> Option<i32> {
        self.top.as_deref().and_then(parse_px)
    }

    #[must_use]
    pub fn right_px(&self) -> Option<i32> {
        self.right.as_deref().and_then(parse_px)
    }

    #[must_use]
    pub fn width_px(&self) -> Option<i32> {
        self.width.as_deref().and_then(parse_px)
    }

    #[must_use]
    pub fn height_px(&self) -> Option<i32> {
        self.height.as_deref().and_then(parse_px)
    }
}

/// Persisted placements keyed by panel, as carried by `loadPositions`.
pub type PanelPositions = BTreeMap<PanelId, PanelPosition>;

/// Parse `"123px"`, `"123"` or `"12.6px"` (rounded) into whole pixels.
///
/// Percentages, keywords such as `"auto"`, and non-finite numbers yield `None`.
#[must_use]
pub fn parse_px(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim_end();
    if number.is_empty() {
        return None;
    }
    let value: f64 = number.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let rounded = value.round();
    if rounded < f64::from(i32::MIN) || rounded > f64::from(i32::MAX) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(rounded as i32)
}

#[must_use]
pub fn format_px(value: i32) -> String {
    format!("{value}px")
}

/// Where a panel sits before the host restores a saved position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultPlacement {
    /// Centered on both axes.
    Centered,
    /// Offset from the left edge, top edge on the vertical midline.
    LeftMidline { left: i32 },
    /// Offset from the top-right corner.
    TopRight { right: i32, top: i32 },
}

/// Static layout of one panel: default placement, size limits and the
/// resize handles it exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSpec {
    pub id: PanelId,
    pub placement: DefaultPlacement,
    pub default_width: i32,
    pub default_height: i32,
    pub bounds: SizeBounds,
    pub handles: &'static [ResizeEdges],
}

impl PanelSpec {
    #[must_use]
    pub fn allows_handle(&self, edges: ResizeEdges) -> bool {
        self.handles.contains(&edges)
    }

    /// Placement at mount time in `viewport`, clamped.
    #[must_use]
    pub fn default_rect(&self, viewport: Viewport) -> PanelRect {
        let (w, h) = (self.default_width, self.default_height);
        let rect = match self.placement {
            DefaultPlacement::Centered => {
                PanelRect::left((viewport.width - w) / 2, (viewport.height - h) / 2, w, h)
            }
            DefaultPlacement::LeftMidline { left } => {
                PanelRect::left(left, viewport.height / 2, w, h)
            }
            DefaultPlacement::TopRight { right, top } => PanelRect::right(right, top, w, h),
        };
        rect.clamped(viewport, self.bounds)
    }
}

const ALL_HANDLES: &[ResizeEdges] = &ResizeEdges::HANDLES;

pub const RADAR_PANEL: PanelSpec = PanelSpec {
    id: PanelId::Radar,
    placement: DefaultPlacement::Centered,
    default_width: 500,
    default_height: 220,
    bounds: SizeBounds::new(500, 160, 800, 300),
    handles: &[ResizeEdges::WEST, ResizeEdges::EAST],
};

pub const LOG_PANEL: PanelSpec = PanelSpec {
    id: PanelId::Log,
    placement: DefaultPlacement::LeftMidline { left: 20 },
    default_width: 320,
    default_height: 400,
    bounds: SizeBounds::new(280, 200, 500, 600),
    handles: ALL_HANDLES,
};

pub const BOLO_PANEL: PanelSpec = PanelSpec {
    id: PanelId::Bolo,
    placement: DefaultPlacement::TopRight { right: 20, top: 20 },
    default_width: 280,
    default_height: 350,
    bounds: SizeBounds::new(250, 200, 450, 500),
    handles: ALL_HANDLES,
};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VIEW: Viewport = Viewport::new(1920, 1080);

    #[test]
    fn parse_px_accepts_plain_and_suffixed() {
        assert_eq!(parse_px("123px"), Some(123));
        assert_eq!(parse_px(" 123 "), Some(123));
        assert_eq!(parse_px("12.6px"), Some(13));
        assert_eq!(parse_px("-4px"), Some(-4));
    }

    #[test]
    fn parse_px_rejects_non_pixel_values() {
        for raw in ["50%", "auto", "", "px", "NaNpx", "1e400px", "12em"] {
            assert_eq!(parse_px(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn right_anchored_rect_resolves_from_right_edge() {
        let rect = PanelRect::right(20, 20, 280, 350);
        assert_eq!(rect.resolve(VIEW), Rect::new(1920 - 20 - 280, 20, 280, 350));
    }

    #[test]
    fn wire_form_omits_unused_horizontal_key() {
        let position = PanelRect::left(120, 40, 300, 310).to_position();
        assert_eq!(
            position,
            PanelPosition {
                left: Some("120px".into()),
                top: Some("40px".into()),
                right: None,
                width: Some("300px".into()),
                height: Some("310px".into()),
            }
        );
        let json = serde_json::to_value(&position).expect("serialize");
        assert!(json.get("right").is_none());
    }

    #[test]
    fn apply_position_is_partial_and_left_wins() {
        let mut rect = PanelRect::right(20, 20, 280, 350);
        rect.apply_position(&PanelPosition {
            left: Some("50%".into()),
            top: Some("64px".into()),
            ..PanelPosition::default()
        });
        assert_eq!(rect, PanelRect::right(20, 64, 280, 350));

        rect.apply_position(&PanelPosition {
            left: Some("10px".into()),
            right: Some("99px".into()),
            ..PanelPosition::default()
        });
        assert_eq!(rect, PanelRect::left(10, 64, 280, 350));
    }

    #[test]
    fn default_layout_matches_panel_table() {
        assert_eq!(
            RADAR_PANEL.default_rect(VIEW),
            PanelRect::left(710, 430, 500, 220)
        );
        assert_eq!(LOG_PANEL.default_rect(VIEW), PanelRect::left(20, 540, 320, 400));
        assert_eq!(BOLO_PANEL.default_rect(VIEW), PanelRect::right(20, 20, 280, 350));
    }

    #[test]
    fn radar_only_resizes_horizontally() {
        assert!(RADAR_PANEL.allows_handle(ResizeEdges::WEST));
        assert!(!RADAR_PANEL.allows_handle(ResizeEdges::SOUTH_EAST));
        assert!(LOG_PANEL.allows_handle(ResizeEdges::NORTH_WEST));
    }

    #[test]
    fn panel_ids_parse_and_serialize_lowercase() {
        assert_eq!("bolo".parse::<PanelId>(), Ok(PanelId::Bolo));
        assert!("Radar".parse::<PanelId>().is_err());
        assert_eq!(serde_json::to_string(&PanelId::Log).expect("json"), "\"log\"");
    }

    #[test]
    fn clamped_keeps_right_anchor() {
        let rect = PanelRect::right(-50, 20, 280, 350).clamped(VIEW, BOLO_PANEL.bounds);
        assert_eq!(rect, PanelRect::right(0, 20, 280, 350));
    }
}
