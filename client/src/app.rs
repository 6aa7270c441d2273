#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use leptos::prelude::*;
use send_wrapper::SendWrapper;

use atlas_core::coords::ParcelCoord;
use atlas_core::{MapAction, MapState};

use crate::canvas::MapCanvas;
use crate::controls::{CoordinateDisplay, MapControls};
use crate::tiles::{ImageTileCache, create_shared_cache};

/// Newtype wrapper so the highlight signal gets its own type for Leptos
/// context (a bare `RwSignal<Vec<ParcelCoord>>` would collide with any other
/// vec-of-parcels signal a caller provides).
#[derive(Clone, Copy)]
pub(crate) struct HighlightedParcels(pub RwSignal<Vec<ParcelCoord>>);

#[component]
pub fn App() -> impl IntoView {
    let state: RwSignal<MapState> = RwSignal::new(MapState::new(None, None));
    let highlighted: RwSignal<Vec<ParcelCoord>> = RwSignal::new(Vec::new());
    let cache: ImageTileCache = create_shared_cache();

    provide_context(state);
    provide_context(HighlightedParcels(highlighted));
    provide_context(SendWrapper::new(cache));

    // Clicking a parcel centers it and toggles its highlight. A real
    // deployment would swap this for navigation or a detail panel.
    let on_parcel_click = move |parcel: ParcelCoord| {
        state.update(|s| {
            *s = s.reduce(MapAction::SetCenter {
                x: parcel.x as f64,
                y: parcel.y as f64,
            });
        });
        highlighted.update(|parcels| {
            if let Some(pos) = parcels.iter().position(|p| *p == parcel) {
                parcels.remove(pos);
            } else {
                parcels.push(parcel);
            }
        });
    };

    view! {
        <div style="position: relative; width: 100%; height: 100%; background: #1a1a1a;">
            <MapCanvas on_parcel_click=Callback::new(on_parcel_click) />
            <MapControls />
            <CoordinateDisplay />
        </div>
    }
}
