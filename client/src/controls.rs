#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use leptos::prelude::*;

use atlas_core::{MapAction, MapState};

const BUTTON_STYLE: &str = "width: 32px; height: 32px; border: none; border-radius: 4px; \
     background: rgba(40, 40, 40, 0.9); color: #eee; font-size: 16px; cursor: pointer;";

/// Zoom in / zoom out / reset buttons, overlaid on the map corner. Each
/// button dispatches the same actions the pointer gestures do, so clamping
/// behaves identically.
#[component]
pub fn MapControls() -> impl IntoView {
    let state: RwSignal<MapState> = expect_context();

    let dispatch = move |action: MapAction| {
        state.update(|s| *s = s.reduce(action));
    };

    view! {
        <div style="position: absolute; top: 12px; right: 12px; display: flex; flex-direction: column; gap: 6px;">
            <button
                style=BUTTON_STYLE
                title="Zoom in"
                on:click=move |_| dispatch(MapAction::Zoom { factor: 1.5 })
            >
                "+"
            </button>
            <button
                style=BUTTON_STYLE
                title="Zoom out"
                on:click=move |_| dispatch(MapAction::Zoom { factor: 1.0 / 1.5 })
            >
                "\u{2212}"
            </button>
            <button
                style=BUTTON_STYLE
                title="Reset view"
                on:click=move |_| dispatch(MapAction::ResetView)
            >
                "\u{2302}"
            </button>
        </div>
    }
}

/// Bottom-left readout of the parcel under the cursor. Empty while the
/// pointer is outside the canvas.
#[component]
pub fn CoordinateDisplay() -> impl IntoView {
    let state: RwSignal<MapState> = expect_context();

    let label = move || {
        state
            .with(|s| s.interaction.hovered_parcel)
            .map(|parcel| parcel.to_string())
            .unwrap_or_default()
    };

    view! {
        <div style="position: absolute; bottom: 12px; left: 12px; padding: 4px 10px; \
             border-radius: 4px; background: rgba(40, 40, 40, 0.9); color: #eee; \
             font-family: monospace; font-size: 13px; pointer-events: none;">
            {label}
        </div>
    }
}
