use crate::geometry::{CropRect, Point};
use crate::surface::SubscriptionSet;

use super::InteractionMode;

/// Snapshot taken when a drag starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub mode: InteractionMode,
    /// Pointer position at press time, normalized.
    pub anchor: Point,
    /// Crop at press time.
    pub anchor_crop: CropRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Owns the Idle -> Dragging -> Idle cycle and the listeners that exist only
/// while a drag is active.
#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
    listeners: SubscriptionSet,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn session(&self) -> Option<DragSession> {
        match self.state {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Starts a drag. A `None` mode is a click-through: nothing is recorded
    /// and `listeners` are released immediately.
    pub fn begin(
        &mut self,
        mode: InteractionMode,
        anchor: Point,
        crop: CropRect,
        listeners: SubscriptionSet,
    ) -> Option<DragSession> {
        if !mode.is_active() {
            tracing::trace!("pointer press outside crop handles; ignoring");
            drop(listeners);
            return None;
        }
        if self.is_dragging() {
            tracing::warn!("drag started while another was active; releasing the previous one");
            self.release();
        }

        let session = DragSession {
            mode,
            anchor,
            anchor_crop: crop,
        };
        tracing::debug!(?mode, anchor_x = anchor.x, anchor_y = anchor.y, "drag begin");
        self.state = DragState::Dragging(session);
        self.listeners = listeners;
        Some(session)
    }

    /// Computes the crop for a pointer sample, or `None` while idle.
    pub fn update(&self, pointer: Point, current: CropRect) -> Option<CropRect> {
        let session = self.session()?;
        Some(apply_drag(&session, pointer, current))
    }

    /// Ends the drag and releases its listeners.
    pub fn release(&mut self) -> Option<DragSession> {
        let session = self.session();
        self.state = DragState::Idle;
        self.listeners.clear();
        if let Some(session) = session {
            tracing::debug!(mode = ?session.mode, "drag end");
        }
        session
    }
}

/// Applies one pointer sample to the crop.
///
/// Resize modes work against the live crop so the fixed edge stays put; move
/// works against the anchor crop so jitter never accumulates. Every output is
/// clamped into the unit square.
pub fn apply_drag(session: &DragSession, pointer: Point, current: CropRect) -> CropRect {
    let Point { x, y } = pointer;
    match session.mode {
        InteractionMode::ResizeBottom => CropRect {
            h: bounded(y - current.y, 0.0, 1.0 - current.y),
            ..current
        },
        InteractionMode::ResizeTop => {
            let bottom = current.bottom();
            let top = bounded(y, 0.0, bottom);
            CropRect {
                y: top,
                h: bottom - top,
                ..current
            }
        }
        InteractionMode::ResizeRight => CropRect {
            w: bounded(x - current.x, 0.0, 1.0 - current.x),
            ..current
        },
        InteractionMode::ResizeLeft => {
            let right = current.right();
            let left = bounded(x, 0.0, right);
            CropRect {
                x: left,
                w: right - left,
                ..current
            }
        }
        InteractionMode::Move => {
            let origin = session.anchor_crop;
            CropRect::new(
                bounded(x - session.anchor.x + origin.x, 0.0, 1.0 - origin.w),
                bounded(y - session.anchor.y + origin.y, 0.0, 1.0 - origin.h),
                origin.w,
                origin.h,
            )
        }
        InteractionMode::None => current,
    }
}

// `f64::clamp` panics when min > max; the upper bound wins here instead.
fn bounded(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn session(mode: InteractionMode, anchor: Point, crop: CropRect) -> DragSession {
        DragSession {
            mode,
            anchor,
            anchor_crop: crop,
        }
    }

    // Deterministic pseudo-random pointer samples, spread over [-0.5, 1.5].
    fn jitter(seed: &mut u64) -> f64 {
        *seed = seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let unit = (*seed >> 11) as f64 / (1_u64 << 53) as f64;
        unit * 2.0 - 0.5
    }

    #[test]
    fn resize_right_past_image_edge_stops_exactly_at_boundary() {
        let crop = CropRect::new(0.3, 0.2, 0.4, 0.5);
        let session = session(InteractionMode::ResizeRight, Point::new(0.7, 0.4), crop);
        let next = apply_drag(&session, Point::new(1.5, 0.4), crop);
        assert_eq!(next.w, 1.0 - crop.x);
        assert!((next.right() - 1.0).abs() < EPSILON);
        assert_eq!((next.x, next.y, next.h), (crop.x, crop.y, crop.h));
    }

    #[test]
    fn resize_bottom_never_goes_negative() {
        let crop = CropRect::new(0.1, 0.5, 0.5, 0.3);
        let session = session(InteractionMode::ResizeBottom, Point::new(0.3, 0.8), crop);
        let next = apply_drag(&session, Point::new(0.3, 0.2), crop);
        assert_eq!(next.h, 0.0);
        assert_eq!(next.y, 0.5);
    }

    #[test]
    fn resize_top_keeps_bottom_edge_fixed() {
        let crop = CropRect::new(0.1, 0.4, 0.5, 0.4);
        let session = session(InteractionMode::ResizeTop, Point::new(0.3, 0.4), crop);

        let raised = apply_drag(&session, Point::new(0.3, 0.1), crop);
        assert!((raised.y - 0.1).abs() < EPSILON);
        assert!((raised.bottom() - 0.8).abs() < EPSILON);

        let overshoot = apply_drag(&session, Point::new(0.3, -0.7), crop);
        assert_eq!(overshoot.y, 0.0);
        assert!((overshoot.h - 0.8).abs() < EPSILON);

        let collapsed = apply_drag(&session, Point::new(0.3, 0.95), crop);
        assert!((collapsed.y - 0.8).abs() < EPSILON);
        assert!(collapsed.h.abs() < EPSILON);
    }

    #[test]
    fn resize_left_keeps_right_edge_fixed() {
        let crop = CropRect::new(0.2, 0.1, 0.6, 0.5);
        let session = session(InteractionMode::ResizeLeft, Point::new(0.2, 0.3), crop);
        let next = apply_drag(&session, Point::new(-1.0, 0.3), crop);
        assert_eq!(next.x, 0.0);
        assert!((next.right() - 0.8).abs() < EPSILON);
        assert_eq!((next.y, next.h), (crop.y, crop.h));
    }

    #[test]
    fn move_clamps_against_anchor_crop() {
        let crop = CropRect::new(0.2, 0.2, 0.5, 0.5);
        let session = session(InteractionMode::Move, Point::new(0.4, 0.4), crop);
        let next = apply_drag(&session, Point::new(0.9, 0.0), crop);
        assert_eq!(next, CropRect::new(0.5, 0.0, 0.5, 0.5));
    }

    #[test]
    fn move_preserves_size_under_jitter() {
        let anchor_crop = CropRect::new(0.1, 0.3, 0.35, 0.25);
        let session = session(InteractionMode::Move, Point::new(0.2, 0.4), anchor_crop);
        let mut seed = 7_u64;
        let mut crop = anchor_crop;
        for _ in 0..500 {
            let pointer = Point::new(jitter(&mut seed), jitter(&mut seed));
            crop = apply_drag(&session, pointer, crop);
            assert_eq!((crop.w, crop.h), (anchor_crop.w, anchor_crop.h));
        }
    }

    #[test]
    fn random_drag_sequences_stay_inside_unit_square() {
        let modes = [
            InteractionMode::ResizeTop,
            InteractionMode::ResizeBottom,
            InteractionMode::ResizeLeft,
            InteractionMode::ResizeRight,
            InteractionMode::Move,
        ];
        let mut seed = 42_u64;
        let mut crop = CropRect::FULL;
        for round in 0..200 {
            let mode = modes[round % modes.len()];
            let anchor = Point::new(jitter(&mut seed), jitter(&mut seed));
            let session = session(mode, anchor, crop);
            for _ in 0..20 {
                let pointer = Point::new(jitter(&mut seed), jitter(&mut seed));
                crop = apply_drag(&session, pointer, crop);
                assert!(
                    crop.is_within_unit_square(EPSILON),
                    "{mode:?} produced {crop:?}"
                );
            }
        }
    }

    #[test]
    fn controller_ignores_press_without_mode() {
        let mut controller = DragController::new();
        let started = controller.begin(
            InteractionMode::None,
            Point::new(0.5, 0.5),
            CropRect::FULL,
            SubscriptionSet::new(),
        );
        assert!(started.is_none());
        assert_eq!(controller.state(), DragState::Idle);
        assert!(controller.update(Point::new(0.1, 0.1), CropRect::FULL).is_none());
    }

    #[test]
    fn controller_cycles_idle_dragging_idle() {
        let mut controller = DragController::new();
        let crop = CropRect::new(0.0, 0.0, 0.5, 0.5);
        controller
            .begin(
                InteractionMode::Move,
                Point::new(0.25, 0.25),
                crop,
                SubscriptionSet::new(),
            )
            .expect("move press should start a drag");
        assert!(controller.is_dragging());

        let moved = controller
            .update(Point::new(0.5, 0.5), crop)
            .expect("dragging controller should update");
        assert_eq!(moved, CropRect::new(0.25, 0.25, 0.5, 0.5));

        let ended = controller.release().expect("release should return the session");
        assert_eq!(ended.anchor_crop, crop);
        assert_eq!(controller.state(), DragState::Idle);
        assert!(controller.release().is_none());
    }
}
