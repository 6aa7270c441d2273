//! Pointer/wheel/touch state machine.
//!
//! Consumes raw input (already translated to canvas-local pixels by the
//! view layer) and produces [`MapAction`]s plus an optional clicked parcel.
//! The controller owns only what the reducer must not: the original
//! pointer-down position for click-vs-drag discrimination and the pinch
//! reference distance.

use crate::config::{
    CLICK_THRESHOLD_PX, MAX_ZOOM, MIN_ZOOM, WHEEL_ZOOM_IN_FACTOR, WHEEL_ZOOM_OUT_FACTOR,
};
use crate::coords::{ParcelCoord, pixels_per_parcel, screen_to_parcel};
use crate::state::{MapAction, MapState};

/// A raw input event in canvas-local pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    PointerLeave,
    /// `delta_y > 0` zooms out, matching wheel scroll direction.
    Wheel { x: f64, y: f64, delta_y: f64 },
    /// Positions of all active touches after the event.
    TouchStart { touches: Vec<(f64, f64)> },
    TouchMove { touches: Vec<(f64, f64)> },
    TouchEnd { touches: Vec<(f64, f64)> },
}

/// What one input event asks the owning view to do.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputOutcome {
    pub actions: Vec<MapAction>,
    pub clicked: Option<ParcelCoord>,
}

impl InputOutcome {
    fn push(&mut self, action: MapAction) {
        self.actions.push(action);
    }
}

#[derive(Debug, Default)]
pub struct InteractionController {
    /// Where the pointer/touch went down. Unlike the reducer's drag
    /// reference this never moves during the gesture; the click threshold
    /// is always measured against it, so accumulated small drag steps
    /// cannot suppress a legitimate click.
    click_start: Option<(f64, f64)>,
    /// Last observed single-touch position, used as the tap position on
    /// touch end (the lifted finger is absent from that event's touch list).
    last_touch: Option<(f64, f64)>,
    /// Inter-finger distance while a pinch is active.
    pinch_distance: Option<f64>,
}

fn touch_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    (dx * dx + dy * dy).sqrt()
}

fn within_click_threshold(from: (f64, f64), to: (f64, f64)) -> bool {
    (to.0 - from.0).abs() < CLICK_THRESHOLD_PX && (to.1 - from.1).abs() < CLICK_THRESHOLD_PX
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: InputEvent, state: &MapState) -> InputOutcome {
        let mut outcome = InputOutcome::default();
        match event {
            InputEvent::PointerDown { x, y } => {
                self.click_start = Some((x, y));
                outcome.push(MapAction::StartDrag { x, y });
            }
            InputEvent::PointerMove { x, y } => {
                if state.interaction.is_dragging {
                    self.pan_step(x, y, state, &mut outcome);
                } else {
                    outcome.push(MapAction::SetHoveredParcel(Some(screen_to_parcel(
                        x,
                        y,
                        &state.viewport,
                    ))));
                }
            }
            InputEvent::PointerUp { x, y } => {
                if let Some(start) = self.click_start.take()
                    && within_click_threshold(start, (x, y))
                {
                    outcome.clicked = Some(screen_to_parcel(x, y, &state.viewport));
                }
                outcome.push(MapAction::EndDrag);
            }
            InputEvent::PointerLeave => {
                self.click_start = None;
                outcome.push(MapAction::SetHoveredParcel(None));
                outcome.push(MapAction::EndDrag);
            }
            InputEvent::Wheel { x, y, delta_y } => {
                self.wheel_zoom(x, y, delta_y, state, &mut outcome);
            }
            InputEvent::TouchStart { touches } => match touches.as_slice() {
                [touch] => {
                    self.click_start = Some(*touch);
                    self.last_touch = Some(*touch);
                    outcome.push(MapAction::StartDrag {
                        x: touch.0,
                        y: touch.1,
                    });
                }
                [a, b, ..] => {
                    // Pinch suppresses drag-pan until fingers lift.
                    self.pinch_distance = Some(touch_distance(*a, *b));
                }
                [] => {}
            },
            InputEvent::TouchMove { touches } => match touches.as_slice() {
                [touch] => {
                    self.last_touch = Some(*touch);
                    if state.interaction.is_dragging {
                        self.pan_step(touch.0, touch.1, state, &mut outcome);
                    }
                }
                [a, b, ..] => {
                    let new_distance = touch_distance(*a, *b);
                    if let Some(previous) = self.pinch_distance
                        && previous > 0.0
                    {
                        outcome.push(MapAction::Zoom {
                            factor: new_distance / previous,
                        });
                    }
                    self.pinch_distance = Some(new_distance);
                }
                [] => {}
            },
            InputEvent::TouchEnd { touches } => match touches.as_slice() {
                [] => {
                    if let (Some(start), Some(last)) = (self.click_start.take(), self.last_touch)
                        && within_click_threshold(start, last)
                    {
                        outcome.clicked = Some(screen_to_parcel(last.0, last.1, &state.viewport));
                    }
                    self.click_start = None;
                    self.last_touch = None;
                    self.pinch_distance = None;
                    outcome.push(MapAction::EndDrag);
                }
                [touch] => {
                    // Pinch ended with one finger still down: rebase the drag
                    // reference so the pan does not jump.
                    self.pinch_distance = None;
                    self.last_touch = Some(*touch);
                    outcome.push(MapAction::UpdateDragStart {
                        x: touch.0,
                        y: touch.1,
                    });
                }
                _ => {}
            },
        }
        outcome
    }

    /// One incremental drag step: pan by the parcel-space equivalent of the
    /// pixel delta since the previous step, then move the reference.
    fn pan_step(&mut self, x: f64, y: f64, state: &MapState, outcome: &mut InputOutcome) {
        let delta_x = x - state.interaction.drag_start_x;
        let delta_y = y - state.interaction.drag_start_y;
        let ppp = pixels_per_parcel(state.viewport.zoom);

        outcome.push(MapAction::Pan {
            delta_x: -delta_x / ppp,
            delta_y: delta_y / ppp,
        });
        outcome.push(MapAction::UpdateDragStart { x, y });
    }

    /// Anchor-preserving wheel zoom: the parcel under the cursor before the
    /// zoom stays under the cursor after it. Solves `parcel_to_screen` for
    /// the new center with the screen position and parcel held fixed.
    fn wheel_zoom(
        &mut self,
        x: f64,
        y: f64,
        delta_y: f64,
        state: &MapState,
        outcome: &mut InputOutcome,
    ) {
        let vp = &state.viewport;
        let anchor = screen_to_parcel(x, y, vp);

        let factor = if delta_y > 0.0 {
            WHEEL_ZOOM_OUT_FACTOR
        } else {
            WHEEL_ZOOM_IN_FACTOR
        };
        let new_zoom = (vp.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let new_ppp = pixels_per_parcel(new_zoom);

        let new_center_x = anchor.x as f64 - (x - vp.width / 2.0) / new_ppp;
        let new_center_y = anchor.y as f64 + (y - vp.height / 2.0) / new_ppp;

        outcome.push(MapAction::SetZoom { value: new_zoom });
        outcome.push(MapAction::SetCenter {
            x: new_center_x,
            y: new_center_y,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAX_ZOOM, MIN_ZOOM};
    use crate::state::MapAction;

    fn state_800x600() -> MapState {
        MapState::default()
            .reduce(MapAction::SetViewportSize {
                width: 800.0,
                height: 600.0,
            })
    }

    /// Run events through controller and reducer together, collecting clicks.
    fn drive(
        controller: &mut InteractionController,
        state: &mut MapState,
        event: InputEvent,
    ) -> InputOutcome {
        let outcome = controller.handle(event, state);
        for &action in &outcome.actions {
            *state = state.reduce(action);
        }
        outcome
    }

    #[test]
    fn small_movement_is_a_click_at_the_release_point() {
        let mut controller = InteractionController::new();
        let mut state = state_800x600();

        drive(&mut controller, &mut state, InputEvent::PointerDown { x: 100.0, y: 100.0 });
        drive(&mut controller, &mut state, InputEvent::PointerMove { x: 102.0, y: 101.0 });
        let outcome = drive(
            &mut controller,
            &mut state,
            InputEvent::PointerUp { x: 102.0, y: 101.0 },
        );

        let expected = screen_to_parcel(102.0, 101.0, &state.viewport);
        assert_eq!(outcome.clicked, Some(expected));
        assert!(!state.interaction.is_dragging);
    }

    #[test]
    fn large_movement_pans_and_suppresses_the_click() {
        let mut controller = InteractionController::new();
        let mut state = state_800x600();
        let center_before = state.viewport.center_x;

        drive(&mut controller, &mut state, InputEvent::PointerDown { x: 100.0, y: 100.0 });
        let moved = drive(
            &mut controller,
            &mut state,
            InputEvent::PointerMove { x: 150.0, y: 100.0 },
        );
        assert!(
            moved
                .actions
                .iter()
                .any(|a| matches!(a, MapAction::Pan { .. })),
            "drag movement must dispatch a pan"
        );
        assert!(state.viewport.center_x < center_before);

        let outcome = drive(
            &mut controller,
            &mut state,
            InputEvent::PointerUp { x: 150.0, y: 100.0 },
        );
        assert_eq!(outcome.clicked, None);
    }

    #[test]
    fn click_threshold_uses_the_original_down_point() {
        // Many sub-threshold steps accumulate past the threshold; the
        // incremental drag reference must not hide that from the click test.
        let mut controller = InteractionController::new();
        let mut state = state_800x600();

        drive(&mut controller, &mut state, InputEvent::PointerDown { x: 100.0, y: 100.0 });
        for step in 1..=10 {
            let x = 100.0 + 2.0 * step as f64;
            drive(&mut controller, &mut state, InputEvent::PointerMove { x, y: 100.0 });
        }
        let outcome = drive(
            &mut controller,
            &mut state,
            InputEvent::PointerUp { x: 120.0, y: 100.0 },
        );
        assert_eq!(outcome.clicked, None);
    }

    #[test]
    fn drag_pan_is_incremental_and_inverts_axes() {
        let mut controller = InteractionController::new();
        let mut state = state_800x600();

        drive(&mut controller, &mut state, InputEvent::PointerDown { x: 400.0, y: 300.0 });
        let outcome = controller.handle(
            InputEvent::PointerMove { x: 410.0, y: 290.0 },
            &state,
        );
        let ppp = pixels_per_parcel(state.viewport.zoom);
        assert_eq!(
            outcome.actions[0],
            MapAction::Pan {
                delta_x: -10.0 / ppp,
                delta_y: -10.0 / ppp,
            }
        );
        assert_eq!(
            outcome.actions[1],
            MapAction::UpdateDragStart { x: 410.0, y: 290.0 }
        );
    }

    #[test]
    fn hover_updates_only_while_not_dragging() {
        let mut controller = InteractionController::new();
        let mut state = state_800x600();

        drive(&mut controller, &mut state, InputEvent::PointerMove { x: 400.0, y: 300.0 });
        assert_eq!(
            state.interaction.hovered_parcel,
            Some(ParcelCoord::new(0, 0))
        );

        drive(&mut controller, &mut state, InputEvent::PointerDown { x: 400.0, y: 300.0 });
        let outcome = drive(
            &mut controller,
            &mut state,
            InputEvent::PointerMove { x: 450.0, y: 300.0 },
        );
        assert!(
            !outcome
                .actions
                .iter()
                .any(|a| matches!(a, MapAction::SetHoveredParcel(_)))
        );
    }

    #[test]
    fn pointer_leave_clears_hover_drag_and_pending_click() {
        let mut controller = InteractionController::new();
        let mut state = state_800x600();

        drive(&mut controller, &mut state, InputEvent::PointerMove { x: 10.0, y: 10.0 });
        drive(&mut controller, &mut state, InputEvent::PointerDown { x: 10.0, y: 10.0 });
        drive(&mut controller, &mut state, InputEvent::PointerLeave);

        assert_eq!(state.interaction.hovered_parcel, None);
        assert!(!state.interaction.is_dragging);

        // Re-entry and release must not produce a stale click.
        let outcome = drive(
            &mut controller,
            &mut state,
            InputEvent::PointerUp { x: 11.0, y: 11.0 },
        );
        assert_eq!(outcome.clicked, None);
    }

    #[test]
    fn wheel_zoom_preserves_the_anchor_parcel() {
        let mut controller = InteractionController::new();
        let mut state = state_800x600();

        let before = screen_to_parcel(400.0, 300.0, &state.viewport);
        assert_eq!(before, ParcelCoord::new(0, 0));

        drive(
            &mut controller,
            &mut state,
            InputEvent::Wheel {
                x: 400.0,
                y: 300.0,
                delta_y: -1.0,
            },
        );
        assert!((state.viewport.zoom - 1.03).abs() < 1e-12);
        assert_eq!(screen_to_parcel(400.0, 300.0, &state.viewport), before);
    }

    #[test]
    fn wheel_zoom_holds_an_off_center_anchor_in_place() {
        let mut controller = InteractionController::new();
        let mut state = state_800x600().reduce(MapAction::SetZoom { value: 3.0 });
        let (x, y) = (620.0, 140.0);

        for delta in [-1.0, -1.0, 1.0, -1.0] {
            let anchor = screen_to_parcel(x, y, &state.viewport);
            drive(
                &mut controller,
                &mut state,
                InputEvent::Wheel { x, y, delta_y: delta },
            );
            // The solved center puts the anchor parcel's origin back under
            // the cursor (up to float rounding at the cell boundary).
            let ppp = pixels_per_parcel(state.viewport.zoom);
            let world_x = state.viewport.center_x + (x - state.viewport.width / 2.0) / ppp;
            let world_y = state.viewport.center_y - (y - state.viewport.height / 2.0) / ppp;
            assert!((world_x - anchor.x as f64).abs() < 1e-9);
            assert!((world_y - anchor.y as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn wheel_zoom_clamps_at_bounds() {
        let mut controller = InteractionController::new();
        let mut state = state_800x600().reduce(MapAction::SetZoom { value: MAX_ZOOM });

        drive(
            &mut controller,
            &mut state,
            InputEvent::Wheel { x: 400.0, y: 300.0, delta_y: -1.0 },
        );
        assert_eq!(state.viewport.zoom, MAX_ZOOM);

        state = state.reduce(MapAction::SetZoom { value: MIN_ZOOM });
        drive(
            &mut controller,
            &mut state,
            InputEvent::Wheel { x: 400.0, y: 300.0, delta_y: 1.0 },
        );
        assert_eq!(state.viewport.zoom, MIN_ZOOM);
    }

    #[test]
    fn single_touch_tap_clicks_like_a_pointer() {
        let mut controller = InteractionController::new();
        let mut state = state_800x600();

        drive(
            &mut controller,
            &mut state,
            InputEvent::TouchStart { touches: vec![(200.0, 200.0)] },
        );
        assert!(state.interaction.is_dragging);
        let outcome = drive(
            &mut controller,
            &mut state,
            InputEvent::TouchEnd { touches: vec![] },
        );
        assert_eq!(
            outcome.clicked,
            Some(screen_to_parcel(200.0, 200.0, &state.viewport))
        );
        assert!(!state.interaction.is_dragging);
    }

    #[test]
    fn dragged_touch_does_not_click() {
        let mut controller = InteractionController::new();
        let mut state = state_800x600();

        drive(
            &mut controller,
            &mut state,
            InputEvent::TouchStart { touches: vec![(200.0, 200.0)] },
        );
        drive(
            &mut controller,
            &mut state,
            InputEvent::TouchMove { touches: vec![(260.0, 200.0)] },
        );
        let outcome = drive(
            &mut controller,
            &mut state,
            InputEvent::TouchEnd { touches: vec![] },
        );
        assert_eq!(outcome.clicked, None);
    }

    #[test]
    fn pinch_dispatches_relative_zoom_from_distance_ratio() {
        let mut controller = InteractionController::new();
        let mut state = state_800x600();

        drive(
            &mut controller,
            &mut state,
            InputEvent::TouchStart {
                touches: vec![(300.0, 300.0), (400.0, 300.0)],
            },
        );
        let outcome = drive(
            &mut controller,
            &mut state,
            InputEvent::TouchMove {
                touches: vec![(250.0, 300.0), (450.0, 300.0)],
            },
        );
        assert_eq!(outcome.actions, vec![MapAction::Zoom { factor: 2.0 }]);
        assert_eq!(state.viewport.zoom, 2.0);

        // The reference distance advances with each step.
        let outcome = drive(
            &mut controller,
            &mut state,
            InputEvent::TouchMove {
                touches: vec![(300.0, 300.0), (400.0, 300.0)],
            },
        );
        assert_eq!(outcome.actions, vec![MapAction::Zoom { factor: 0.5 }]);
    }

    #[test]
    fn pinch_to_single_touch_rebases_the_drag_reference() {
        let mut controller = InteractionController::new();
        let mut state = state_800x600();

        drive(
            &mut controller,
            &mut state,
            InputEvent::TouchStart { touches: vec![(100.0, 100.0)] },
        );
        drive(
            &mut controller,
            &mut state,
            InputEvent::TouchStart {
                touches: vec![(100.0, 100.0), (200.0, 200.0)],
            },
        );
        let outcome = drive(
            &mut controller,
            &mut state,
            InputEvent::TouchEnd { touches: vec![(200.0, 200.0)] },
        );
        assert_eq!(
            outcome.actions,
            vec![MapAction::UpdateDragStart { x: 200.0, y: 200.0 }]
        );
        assert_eq!(state.interaction.drag_start_x, 200.0);

        // The next move pans relative to the rebased point, without a jump.
        let moved = controller.handle(InputEvent::TouchMove { touches: vec![(210.0, 200.0)] }, &state);
        let ppp = pixels_per_parcel(state.viewport.zoom);
        assert_eq!(
            moved.actions[0],
            MapAction::Pan {
                delta_x: -10.0 / ppp,
                delta_y: 0.0,
            }
        );
    }
}
