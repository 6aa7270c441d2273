//! Viewport and interaction state, mutated only through [`MapAction`]s.
//!
//! Reduction is pure: every transition that touches the center or zoom
//! re-applies clamping, so no action sequence can leave the state outside
//! the configured world/zoom bounds.

use crate::config::{
    DEFAULT_CENTER_X, DEFAULT_CENTER_Y, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM, WORLD_MAX_X, WORLD_MAX_Y,
    WORLD_MIN_X, WORLD_MIN_Y,
};
use crate::coords::ParcelCoord;

/// The visible window into world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    /// Center of the view, in parcel units (fractional).
    pub center_x: f64,
    pub center_y: f64,
    pub zoom: f64,
    /// Canvas dimensions in layout pixels.
    pub width: f64,
    pub height: f64,
}

/// Transient pointer state owned by the same reducer as the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteractionState {
    pub is_dragging: bool,
    /// Incremental drag reference in screen pixels; updated on every
    /// drag step, unlike the click-origin point kept by the controller.
    pub drag_start_x: f64,
    pub drag_start_y: f64,
    pub hovered_parcel: Option<ParcelCoord>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapState {
    pub viewport: ViewportState,
    pub interaction: InteractionState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapAction {
    SetViewportSize { width: f64, height: f64 },
    /// Relative pan in parcel units.
    Pan { delta_x: f64, delta_y: f64 },
    /// Relative, multiplicative zoom.
    Zoom { factor: f64 },
    SetCenter { x: f64, y: f64 },
    SetZoom { value: f64 },
    ResetView,
    StartDrag { x: f64, y: f64 },
    EndDrag,
    UpdateDragStart { x: f64, y: f64 },
    SetHoveredParcel(Option<ParcelCoord>),
}

fn clamp_center_x(x: f64) -> f64 {
    x.clamp(WORLD_MIN_X, WORLD_MAX_X)
}

fn clamp_center_y(y: f64) -> f64 {
    y.clamp(WORLD_MIN_Y, WORLD_MAX_Y)
}

fn clamp_zoom(zoom: f64) -> f64 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

impl Default for MapState {
    fn default() -> Self {
        Self {
            viewport: ViewportState {
                center_x: DEFAULT_CENTER_X,
                center_y: DEFAULT_CENTER_Y,
                zoom: DEFAULT_ZOOM,
                width: 0.0,
                height: 0.0,
            },
            interaction: InteractionState::default(),
        }
    }
}

impl MapState {
    /// Initial state with an optional starting center/zoom, both clamped so
    /// the invariants hold from the first frame.
    pub fn new(initial_center: Option<ParcelCoord>, initial_zoom: Option<f64>) -> Self {
        let mut state = Self::default();
        if let Some(center) = initial_center {
            state.viewport.center_x = clamp_center_x(center.x as f64);
            state.viewport.center_y = clamp_center_y(center.y as f64);
        }
        if let Some(zoom) = initial_zoom {
            state.viewport.zoom = clamp_zoom(zoom);
        }
        state
    }

    pub fn reduce(mut self, action: MapAction) -> Self {
        match action {
            MapAction::SetViewportSize { width, height } => {
                self.viewport.width = width;
                self.viewport.height = height;
            }
            MapAction::Pan { delta_x, delta_y } => {
                self.viewport.center_x = clamp_center_x(self.viewport.center_x + delta_x);
                self.viewport.center_y = clamp_center_y(self.viewport.center_y + delta_y);
            }
            MapAction::Zoom { factor } => {
                self.viewport.zoom = clamp_zoom(self.viewport.zoom * factor);
            }
            MapAction::SetCenter { x, y } => {
                self.viewport.center_x = clamp_center_x(x);
                self.viewport.center_y = clamp_center_y(y);
            }
            MapAction::SetZoom { value } => {
                self.viewport.zoom = clamp_zoom(value);
            }
            MapAction::ResetView => {
                self.viewport.center_x = DEFAULT_CENTER_X;
                self.viewport.center_y = DEFAULT_CENTER_Y;
                self.viewport.zoom = DEFAULT_ZOOM;
            }
            MapAction::StartDrag { x, y } => {
                self.interaction.is_dragging = true;
                self.interaction.drag_start_x = x;
                self.interaction.drag_start_y = y;
            }
            MapAction::EndDrag => {
                self.interaction.is_dragging = false;
            }
            MapAction::UpdateDragStart { x, y } => {
                self.interaction.drag_start_x = x;
                self.interaction.drag_start_y = y;
            }
            MapAction::SetHoveredParcel(parcel) => {
                self.interaction.hovered_parcel = parcel;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_zoom_clamps_to_bounds() {
        let state = MapState::default();
        for (requested, expected) in [
            (0.0, MIN_ZOOM),
            (0.5, 0.5),
            (3.7, 3.7),
            (10.0, 10.0),
            (250.0, MAX_ZOOM),
            (-1.0, MIN_ZOOM),
        ] {
            let next = state.reduce(MapAction::SetZoom { value: requested });
            assert_eq!(next.viewport.zoom, expected, "requested {requested}");
        }
    }

    #[test]
    fn relative_zoom_clamps_to_bounds() {
        let state = MapState::default().reduce(MapAction::Zoom { factor: 1000.0 });
        assert_eq!(state.viewport.zoom, MAX_ZOOM);
        let state = state.reduce(MapAction::Zoom { factor: 1e-6 });
        assert_eq!(state.viewport.zoom, MIN_ZOOM);
    }

    #[test]
    fn set_center_clamps_to_nearest_in_bounds_point() {
        let state = MapState::default().reduce(MapAction::SetCenter {
            x: -9_999.0,
            y: 9_999.0,
        });
        assert_eq!(state.viewport.center_x, WORLD_MIN_X);
        assert_eq!(state.viewport.center_y, WORLD_MAX_Y);

        let state = state.reduce(MapAction::SetCenter { x: 42.5, y: -10.0 });
        assert_eq!(state.viewport.center_x, 42.5);
        assert_eq!(state.viewport.center_y, -10.0);
    }

    #[test]
    fn pan_cannot_escape_world_bounds() {
        let mut state = MapState::default();
        for _ in 0..100 {
            state = state.reduce(MapAction::Pan {
                delta_x: 50.0,
                delta_y: -50.0,
            });
        }
        assert_eq!(state.viewport.center_x, WORLD_MAX_X);
        assert_eq!(state.viewport.center_y, WORLD_MIN_Y);
    }

    #[test]
    fn clamping_is_idempotent() {
        let once = MapState::default().reduce(MapAction::SetZoom { value: 99.0 });
        let twice = once.reduce(MapAction::SetZoom {
            value: once.viewport.zoom,
        });
        assert_eq!(once.viewport.zoom, twice.viewport.zoom);
    }

    #[test]
    fn reset_view_restores_defaults() {
        let state = MapState::default()
            .reduce(MapAction::SetCenter { x: 100.0, y: 50.0 })
            .reduce(MapAction::SetZoom { value: 4.0 })
            .reduce(MapAction::SetViewportSize {
                width: 640.0,
                height: 480.0,
            })
            .reduce(MapAction::ResetView);
        assert_eq!(state.viewport.center_x, DEFAULT_CENTER_X);
        assert_eq!(state.viewport.center_y, DEFAULT_CENTER_Y);
        assert_eq!(state.viewport.zoom, DEFAULT_ZOOM);
        // Reset keeps the canvas dimensions.
        assert_eq!(state.viewport.width, 640.0);
        assert_eq!(state.viewport.height, 480.0);
    }

    #[test]
    fn drag_lifecycle_updates_flags_and_reference() {
        let state = MapState::default().reduce(MapAction::StartDrag { x: 10.0, y: 20.0 });
        assert!(state.interaction.is_dragging);
        assert_eq!(state.interaction.drag_start_x, 10.0);

        let state = state.reduce(MapAction::UpdateDragStart { x: 15.0, y: 25.0 });
        assert_eq!(state.interaction.drag_start_x, 15.0);
        assert_eq!(state.interaction.drag_start_y, 25.0);
        assert!(state.interaction.is_dragging);

        let state = state.reduce(MapAction::EndDrag);
        assert!(!state.interaction.is_dragging);
    }

    #[test]
    fn hovered_parcel_is_set_and_cleared() {
        let state = MapState::default()
            .reduce(MapAction::SetHoveredParcel(Some(ParcelCoord::new(3, -4))));
        assert_eq!(
            state.interaction.hovered_parcel,
            Some(ParcelCoord::new(3, -4))
        );
        let state = state.reduce(MapAction::SetHoveredParcel(None));
        assert_eq!(state.interaction.hovered_parcel, None);
    }

    #[test]
    fn initial_center_and_zoom_are_clamped() {
        let state = MapState::new(Some(ParcelCoord::new(100_000, -100_000)), Some(64.0));
        assert_eq!(state.viewport.center_x, WORLD_MAX_X);
        assert_eq!(state.viewport.center_y, WORLD_MIN_Y);
        assert_eq!(state.viewport.zoom, MAX_ZOOM);
    }
}
