#![forbid(unsafe_code)]

//! Drag/resize session manager for the overlay panels.
//!
//! The controller owns every panel's placement and at most one active
//! [`Gesture`]. Pointer lifecycle calls return a [`PanelPointerDispatch`]
//! describing what happened:
//! - pointer-down in positioning mode starts a drag (body) or resize (handle),
//! - pointer moves are coalesced and applied once per [`frame`](InteractionController::frame),
//! - pointer-up or pointer-leave flushes the last sample and emits exactly one
//!   [`PositionCommit`].
//!
//! Ignored signals carry a [`PanelPointerIgnoredReason`]; nothing here fails.

use tracing::{debug, trace};

use crate::coalescer::PointerCoalescer;
use crate::geometry::{Point, Rect, ResizeEdges, Viewport, drag_rect, resize_rect};
use crate::panel::{PanelId, PanelPosition, PanelPositions, PanelRect};

/// Mutable per-panel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelState {
    pub rect: PanelRect,
    /// Positioning mode exposes the drag surface and resize handles.
    pub positioning: bool,
    /// CSS transitions are suppressed while the panel is being moved.
    pub transitions_enabled: bool,
}

/// Drag gesture: the panel follows the pointer minus the grab offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub panel: PanelId,
    pub pointer_offset: Point,
    pub origin_rect: Rect,
}

/// Resize gesture: `edges` follow the cumulative pointer delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSession {
    pub panel: PanelId,
    pub origin_pointer: Point,
    pub origin_rect: Rect,
    pub edges: ResizeEdges,
}

/// One pointer-down→pointer-up interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Drag(DragSession),
    Resize(ResizeSession),
}

impl Gesture {
    #[must_use]
    pub const fn panel(&self) -> PanelId {
        match self {
            Self::Drag(session) => session.panel,
            Self::Resize(session) => session.panel,
        }
    }

    /// Rectangle for `pointer`, always recomputed from the origin snapshot.
    #[must_use]
    pub fn rect_at(&self, pointer: Point, viewport: Viewport) -> Rect {
        match self {
            Self::Drag(session) => drag_rect(
                session.origin_rect,
                pointer,
                session.pointer_offset,
                viewport,
                session.panel.spec().bounds,
            ),
            Self::Resize(session) => resize_rect(
                session.origin_rect,
                session.edges,
                pointer.delta_from(session.origin_pointer),
                viewport,
                session.panel.spec().bounds,
            ),
        }
    }
}

/// Observable gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Dragging { panel: PanelId },
    Resizing { panel: PanelId, edges: ResizeEdges },
}

/// Why a pointer signal was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPointerIgnoredReason {
    NotPositioning,
    GestureInProgress,
    HandleNotAvailable,
    NoActiveGesture,
    NoPendingSample,
}

/// Outcome category for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPointerOutcome {
    Started,
    /// Sample buffered until the next frame.
    Queued,
    Updated,
    Committed,
    Ignored(PanelPointerIgnoredReason),
}

/// Final placement of a panel at the end of a gesture, in wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionCommit {
    pub panel: PanelId,
    pub position: PanelPosition,
}

/// Result of one pointer lifecycle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelPointerDispatch {
    pub panel: Option<PanelId>,
    /// Placement after this call, when it moved or started a gesture.
    pub rect: Option<Rect>,
    pub commit: Option<PositionCommit>,
    pub outcome: PanelPointerOutcome,
}

impl PanelPointerDispatch {
    fn ignored(panel: Option<PanelId>, reason: PanelPointerIgnoredReason) -> Self {
        trace!(target: "radar.panel", ?panel, ?reason, "pointer signal ignored");
        Self {
            panel,
            rect: None,
            commit: None,
            outcome: PanelPointerOutcome::Ignored(reason),
        }
    }

    fn with_rect(panel: PanelId, rect: Rect, outcome: PanelPointerOutcome) -> Self {
        Self {
            panel: Some(panel),
            rect: Some(rect),
            commit: None,
            outcome,
        }
    }

    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        matches!(self.outcome, PanelPointerOutcome::Ignored(_))
    }
}

/// Owns panel placements, the active gesture and the pointer coalescer.
#[derive(Debug, Clone)]
pub struct InteractionController {
    panels: [PanelState; 3],
    viewport: Viewport,
    active: Option<Gesture>,
    coalescer: PointerCoalescer,
}

const fn slot(panel: PanelId) -> usize {
    match panel {
        PanelId::Radar => 0,
        PanelId::Log => 1,
        PanelId::Bolo => 2,
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl InteractionController {
    /// Mount every panel at its default placement.
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        let panels = PanelId::ALL.map(|id| PanelState {
            rect: id.spec().default_rect(viewport),
            positioning: false,
            transitions_enabled: true,
        });
        Self {
            panels,
            viewport,
            active: None,
            coalescer: PointerCoalescer::new(),
        }
    }

    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub const fn panel(&self, panel: PanelId) -> &PanelState {
        &self.panels[slot(panel)]
    }

    /// Absolute rectangle of `panel` in the current viewport.
    #[must_use]
    pub const fn rect(&self, panel: PanelId) -> Rect {
        self.panels[slot(panel)].rect.resolve(self.viewport)
    }

    #[must_use]
    pub const fn active(&self) -> Option<&Gesture> {
        self.active.as_ref()
    }

    #[must_use]
    pub const fn state(&self) -> GestureState {
        match self.active {
            None => GestureState::Idle,
            Some(Gesture::Drag(session)) => GestureState::Dragging {
                panel: session.panel,
            },
            Some(Gesture::Resize(session)) => GestureState::Resizing {
                panel: session.panel,
                edges: session.edges,
            },
        }
    }

    #[must_use]
    pub fn coalesced_moves(&self) -> u64 {
        self.coalescer.coalesced_count()
    }

    /// Enter or leave positioning mode. Never interrupts an active gesture.
    ///
    /// Returns whether the flag changed.
    pub fn set_positioning(&mut self, panel: PanelId, on: bool) -> bool {
        let state = &mut self.panels[slot(panel)];
        if state.positioning == on {
            return false;
        }
        state.positioning = on;
        debug!(target: "radar.panel", %panel, positioning = on, "positioning mode changed");
        true
    }

    /// Flip positioning mode; returns the new value.
    pub fn toggle_positioning(&mut self, panel: PanelId) -> bool {
        let on = !self.panels[slot(panel)].positioning;
        self.set_positioning(panel, on);
        on
    }

    /// Later gestures clamp against the new viewport.
    pub fn set_viewport(&mut self, width: i32, height: i32) {
        self.viewport = Viewport::new(width, height);
        debug!(target: "radar.panel", width, height, "viewport changed");
    }

    /// Pointer-down on a panel body starts a drag.
    pub fn pointer_down_body(&mut self, panel: PanelId, position: Point) -> PanelPointerDispatch {
        if let Some(reason) = self.down_rejection(panel) {
            return PanelPointerDispatch::ignored(Some(panel), reason);
        }
        let origin_rect = self.rect(panel);
        self.begin(Gesture::Drag(DragSession {
            panel,
            pointer_offset: position.delta_from(origin_rect.origin()),
            origin_rect,
        }))
    }

    /// Pointer-down on a resize handle starts a resize.
    pub fn pointer_down_handle(
        &mut self,
        panel: PanelId,
        handle: ResizeEdges,
        position: Point,
    ) -> PanelPointerDispatch {
        if let Some(reason) = self.down_rejection(panel) {
            return PanelPointerDispatch::ignored(Some(panel), reason);
        }
        if !panel.spec().allows_handle(handle) {
            return PanelPointerDispatch::ignored(
                Some(panel),
                PanelPointerIgnoredReason::HandleNotAvailable,
            );
        }
        self.begin(Gesture::Resize(ResizeSession {
            panel,
            origin_pointer: position,
            origin_rect: self.rect(panel),
            edges: handle,
        }))
    }

    /// Buffer a pointer move until the next [`frame`](Self::frame).
    pub fn pointer_move(&mut self, position: Point) -> PanelPointerDispatch {
        let Some(gesture) = self.active else {
            return PanelPointerDispatch::ignored(None, PanelPointerIgnoredReason::NoActiveGesture);
        };
        self.coalescer.push(position);
        PanelPointerDispatch {
            panel: Some(gesture.panel()),
            rect: None,
            commit: None,
            outcome: PanelPointerOutcome::Queued,
        }
    }

    /// Apply the latest buffered move.
    pub fn frame(&mut self) -> PanelPointerDispatch {
        let Some(gesture) = self.active else {
            return PanelPointerDispatch::ignored(None, PanelPointerIgnoredReason::NoActiveGesture);
        };
        let Some(position) = self.coalescer.take() else {
            return PanelPointerDispatch::ignored(
                Some(gesture.panel()),
                PanelPointerIgnoredReason::NoPendingSample,
            );
        };
        let rect = self.apply(gesture, position);
        PanelPointerDispatch::with_rect(gesture.panel(), rect, PanelPointerOutcome::Updated)
    }

    /// Apply a move at once, discarding any buffered sample.
    pub fn pointer_move_immediate(&mut self, position: Point) -> PanelPointerDispatch {
        let Some(gesture) = self.active else {
            return PanelPointerDispatch::ignored(None, PanelPointerIgnoredReason::NoActiveGesture);
        };
        self.coalescer.clear();
        let rect = self.apply(gesture, position);
        PanelPointerDispatch::with_rect(gesture.panel(), rect, PanelPointerOutcome::Updated)
    }

    /// End the gesture and commit the final placement.
    pub fn pointer_up(&mut self) -> PanelPointerDispatch {
        let Some(gesture) = self.active else {
            return PanelPointerDispatch::ignored(None, PanelPointerIgnoredReason::NoActiveGesture);
        };
        if let Some(position) = self.coalescer.take() {
            self.apply(gesture, position);
        }
        self.active = None;

        let panel = gesture.panel();
        let rect = self.rect(panel);
        let state = &mut self.panels[slot(panel)];
        state.rect = PanelRect::from_rect(rect);
        state.transitions_enabled = true;
        let position = state.rect.to_position();
        debug!(
            target: "radar.panel",
            %panel,
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            "gesture committed"
        );
        PanelPointerDispatch {
            panel: Some(panel),
            rect: Some(rect),
            commit: Some(PositionCommit { panel, position }),
            outcome: PanelPointerOutcome::Committed,
        }
    }

    /// Leaving the window ends the gesture exactly like a release.
    pub fn pointer_leave(&mut self) -> PanelPointerDispatch {
        self.pointer_up()
    }

    /// Apply saved placements, field by field, clamped.
    ///
    /// The panel under an active gesture is skipped. Returns the panels that
    /// were updated.
    pub fn restore(&mut self, positions: &PanelPositions) -> Vec<PanelId> {
        let busy = self.active.map(|gesture| gesture.panel());
        let mut restored = Vec::with_capacity(positions.len());
        for (&panel, position) in positions {
            if busy == Some(panel) {
                debug!(target: "radar.panel", %panel, "restore skipped during gesture");
                continue;
            }
            let state = &mut self.panels[slot(panel)];
            state.rect.apply_position(position);
            state.rect = state.rect.clamped(self.viewport, panel.spec().bounds);
            restored.push(panel);
        }
        restored
    }

    fn down_rejection(&self, panel: PanelId) -> Option<PanelPointerIgnoredReason> {
        if !self.panels[slot(panel)].positioning {
            Some(PanelPointerIgnoredReason::NotPositioning)
        } else if self.active.is_some() {
            Some(PanelPointerIgnoredReason::GestureInProgress)
        } else {
            None
        }
    }

    fn begin(&mut self, gesture: Gesture) -> PanelPointerDispatch {
        let panel = gesture.panel();
        self.coalescer.clear();
        self.active = Some(gesture);
        self.panels[slot(panel)].transitions_enabled = false;
        let rect = self.rect(panel);
        debug!(target: "radar.panel", %panel, state = ?self.state(), "gesture started");
        PanelPointerDispatch::with_rect(panel, rect, PanelPointerOutcome::Started)
    }

    fn apply(&mut self, gesture: Gesture, position: Point) -> Rect {
        let rect = gesture.rect_at(position, self.viewport);
        self.panels[slot(gesture.panel())].rect = PanelRect::from_rect(rect);
        rect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn controller() -> InteractionController {
        let mut controller = InteractionController::new(Viewport::new(1920, 1080));
        controller.set_positioning(PanelId::Log, true);
        controller
    }

    #[test]
    fn pointer_down_requires_positioning() {
        let mut controller = InteractionController::default();
        let dispatch = controller.pointer_down_body(PanelId::Radar, Point::new(800, 500));
        assert_eq!(
            dispatch.outcome,
            PanelPointerOutcome::Ignored(PanelPointerIgnoredReason::NotPositioning)
        );
        assert_eq!(controller.state(), GestureState::Idle);
    }

    #[test]
    fn drag_follows_pointer_minus_grab_offset() {
        let mut controller = controller();
        // log panel mounts at (20, 540)
        let down = controller.pointer_down_body(PanelId::Log, Point::new(30, 550));
        assert_eq!(down.outcome, PanelPointerOutcome::Started);
        assert!(!controller.panel(PanelId::Log).transitions_enabled);

        controller.pointer_move(Point::new(200, 400));
        controller.pointer_move(Point::new(510, 110));
        let frame = controller.frame();
        assert_eq!(frame.rect, Some(Rect::new(500, 100, 320, 400)));
        assert_eq!(controller.coalesced_moves(), 1);

        let up = controller.pointer_up();
        let commit = up.commit.expect("commit");
        assert_eq!(commit.panel, PanelId::Log);
        assert_eq!(commit.position.left.as_deref(), Some("500px"));
        assert_eq!(commit.position.top.as_deref(), Some("100px"));
        assert_eq!(commit.position.right, None);
        assert!(controller.panel(PanelId::Log).transitions_enabled);
        assert_eq!(controller.state(), GestureState::Idle);
    }

    #[test]
    fn pointer_up_flushes_pending_sample() {
        let mut controller = controller();
        controller.pointer_down_handle(PanelId::Log, ResizeEdges::EAST, Point::new(340, 500));
        controller.pointer_move(Point::new(380, 500));
        let up = controller.pointer_up();
        assert_eq!(up.rect, Some(Rect::new(20, 540, 360, 400)));
        assert_eq!(
            up.commit.map(|c| c.position.width),
            Some(Some("360px".to_string()))
        );
    }

    #[test]
    fn second_pointer_down_is_ignored() {
        let mut controller = controller();
        controller.set_positioning(PanelId::Bolo, true);
        controller.pointer_down_body(PanelId::Log, Point::new(30, 550));
        let second = controller.pointer_down_body(PanelId::Bolo, Point::new(1700, 30));
        assert_eq!(
            second.outcome,
            PanelPointerOutcome::Ignored(PanelPointerIgnoredReason::GestureInProgress)
        );
        assert_eq!(controller.state(), GestureState::Dragging { panel: PanelId::Log });
    }

    #[test]
    fn positioning_other_panels_mid_drag_keeps_gesture() {
        let mut controller = controller();
        controller.pointer_down_body(PanelId::Log, Point::new(30, 550));
        controller.set_positioning(PanelId::Bolo, true);
        assert!(controller.toggle_positioning(PanelId::Radar));
        assert_eq!(controller.state(), GestureState::Dragging { panel: PanelId::Log });

        controller.pointer_move_immediate(Point::new(60, 580));
        let up = controller.pointer_up();
        assert_eq!(up.outcome, PanelPointerOutcome::Committed);
        assert_eq!(up.commit.map(|c| c.panel), Some(PanelId::Log));
        assert_eq!(controller.rect(PanelId::Log), Rect::new(50, 570, 320, 400));
        assert_eq!(controller.state(), GestureState::Idle);
    }

    #[test]
    fn radar_rejects_vertical_handles() {
        let mut controller = InteractionController::default();
        controller.set_positioning(PanelId::Radar, true);
        let dispatch =
            controller.pointer_down_handle(PanelId::Radar, ResizeEdges::SOUTH, Point::new(0, 0));
        assert_eq!(
            dispatch.outcome,
            PanelPointerOutcome::Ignored(PanelPointerIgnoredReason::HandleNotAvailable)
        );
    }

    #[test]
    fn leaving_positioning_mode_does_not_interrupt_gesture() {
        let mut controller = controller();
        controller.pointer_down_body(PanelId::Log, Point::new(30, 550));
        assert!(!controller.toggle_positioning(PanelId::Log));
        controller.pointer_move_immediate(Point::new(110, 550));
        let up = controller.pointer_leave();
        assert_eq!(up.outcome, PanelPointerOutcome::Committed);
        assert_eq!(up.rect, Some(Rect::new(100, 540, 320, 400)));
    }

    #[test]
    fn moves_without_gesture_are_ignored() {
        let mut controller = controller();
        assert!(controller.pointer_move(Point::new(1, 1)).is_ignored());
        assert!(controller.frame().is_ignored());
        assert!(controller.pointer_up().is_ignored());
    }

    #[test]
    fn frame_without_sample_reports_no_pending() {
        let mut controller = controller();
        controller.pointer_down_body(PanelId::Log, Point::new(30, 550));
        assert_eq!(
            controller.frame().outcome,
            PanelPointerOutcome::Ignored(PanelPointerIgnoredReason::NoPendingSample)
        );
    }

    #[test]
    fn restore_skips_panel_mid_gesture() {
        let mut controller = controller();
        controller.pointer_down_body(PanelId::Log, Point::new(30, 550));
        let mut positions = PanelPositions::new();
        positions.insert(
            PanelId::Log,
            PanelPosition {
                left: Some("900px".into()),
                ..PanelPosition::default()
            },
        );
        positions.insert(
            PanelId::Bolo,
            PanelPosition {
                left: Some("100px".into()),
                top: Some("5000px".into()),
                ..PanelPosition::default()
            },
        );
        assert_eq!(controller.restore(&positions), vec![PanelId::Bolo]);
        assert_eq!(controller.rect(PanelId::Log).x, 20);
        assert_eq!(controller.rect(PanelId::Bolo), Rect::new(100, 1080 - 350, 280, 350));
    }

    #[test]
    fn gestures_clamp_against_new_viewport() {
        let mut controller = controller();
        controller.set_viewport(1280, 720);
        controller.pointer_down_body(PanelId::Log, Point::new(20, 540));
        let moved = controller.pointer_move_immediate(Point::new(5000, 5000));
        assert_eq!(moved.rect, Some(Rect::new(1280 - 320, 720 - 400, 320, 400)));
    }
}
