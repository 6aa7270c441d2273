#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

//! The map canvas: event wiring, tile preloading, and frame drawing.
//!
//! DOM events are translated to canvas-local [`InputEvent`]s and fed through
//! the interaction controller; the resulting actions run through the reducer
//! in a single signal update. Drawing reads state snapshots only — the frame
//! function never mutates anything but the canvas.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use send_wrapper::SendWrapper;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use atlas_core::config::{BACKGROUND_COLOR, TILE_COUNT, TILE_PLACEHOLDER_COLOR};
use atlas_core::coords::{
    ParcelCoord, ScreenRect, TileCoord, parcel_to_screen, pixels_per_parcel, source_tile_row,
    tile_screen_rect, visible_tiles,
};
use atlas_core::{InputEvent, InputOutcome, InteractionController, MapAction, MapState};

use crate::app::HighlightedParcels;
use crate::render_loop::RenderScheduler;
use crate::tiles::ImageTileCache;

const HIGHLIGHT_FILL: &str = "rgba(74, 144, 226, 0.35)";
const HIGHLIGHT_STROKE: &str = "rgba(74, 144, 226, 0.9)";
const HOVER_MARKER_COLOR: &str = "white";

struct ResizeBinding {
    observer: web_sys::ResizeObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, web_sys::ResizeObserver)>,
}

#[component]
pub fn MapCanvas(
    #[prop(into, optional)] on_parcel_click: Option<Callback<ParcelCoord>>,
) -> impl IntoView {
    let state: RwSignal<MapState> = expect_context();
    let cache: ImageTileCache = expect_context::<SendWrapper<ImageTileCache>>().take();
    let HighlightedParcels(highlighted) = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let container_ref = NodeRef::<leptos::html::Div>::new();

    let controller = Rc::new(RefCell::new(InteractionController::new()));

    // Apply a controller outcome: all actions in one reducer pass, then the
    // click effect out to the business layer.
    let apply = move |outcome: InputOutcome| {
        if !outcome.actions.is_empty() {
            state.update(|s| {
                for action in outcome.actions {
                    *s = s.reduce(action);
                }
            });
        }
        if let (Some(parcel), Some(callback)) = (outcome.clicked, on_parcel_click) {
            callback.run(parcel);
        }
    };

    // Client coordinates -> canvas-local pixels.
    let local_origin = move || -> (f64, f64) {
        canvas_ref
            .get_untracked()
            .map(|el| {
                let rect = el.get_bounding_client_rect();
                (rect.left(), rect.top())
            })
            .unwrap_or((0.0, 0.0))
    };

    let handle = {
        let controller = controller.clone();
        move |event: InputEvent| {
            let outcome = controller
                .borrow_mut()
                .handle(event, &state.get_untracked());
            apply(outcome);
        }
    };

    let on_pointer_down = {
        let handle = handle.clone();
        move |e: web_sys::PointerEvent| {
            e.prevent_default();
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
            }
            let (ox, oy) = local_origin();
            handle(InputEvent::PointerDown {
                x: e.client_x() as f64 - ox,
                y: e.client_y() as f64 - oy,
            });
        }
    };

    let on_pointer_move = {
        let handle = handle.clone();
        move |e: web_sys::PointerEvent| {
            let (ox, oy) = local_origin();
            handle(InputEvent::PointerMove {
                x: e.client_x() as f64 - ox,
                y: e.client_y() as f64 - oy,
            });
        }
    };

    let on_pointer_up = {
        let handle = handle.clone();
        move |e: web_sys::PointerEvent| {
            let (ox, oy) = local_origin();
            handle(InputEvent::PointerUp {
                x: e.client_x() as f64 - ox,
                y: e.client_y() as f64 - oy,
            });
        }
    };

    let on_pointer_leave = {
        let handle = handle.clone();
        move |_: web_sys::PointerEvent| {
            handle(InputEvent::PointerLeave);
        }
    };

    let on_wheel = {
        let handle = handle.clone();
        move |e: web_sys::WheelEvent| {
            e.prevent_default();
            let (ox, oy) = local_origin();
            handle(InputEvent::Wheel {
                x: e.client_x() as f64 - ox,
                y: e.client_y() as f64 - oy,
                delta_y: e.delta_y(),
            });
        }
    };

    let touch_positions = move |e: &web_sys::TouchEvent| -> Vec<(f64, f64)> {
        let (ox, oy) = local_origin();
        let list = e.touches();
        (0..list.length())
            .filter_map(|i| list.get(i))
            .map(|t| (t.client_x() as f64 - ox, t.client_y() as f64 - oy))
            .collect()
    };

    let on_touch_start = {
        let handle = handle.clone();
        move |e: web_sys::TouchEvent| {
            e.prevent_default();
            handle(InputEvent::TouchStart {
                touches: touch_positions(&e),
            });
        }
    };

    let on_touch_move = {
        let handle = handle.clone();
        move |e: web_sys::TouchEvent| {
            e.prevent_default();
            handle(InputEvent::TouchMove {
                touches: touch_positions(&e),
            });
        }
    };

    let on_touch_end = {
        let handle = handle.clone();
        move |e: web_sys::TouchEvent| {
            handle(InputEvent::TouchEnd {
                touches: touch_positions(&e),
            });
        }
    };

    // Track the container with a ResizeObserver and mirror its size into the
    // viewport state.
    let resize_binding: Rc<RefCell<Option<ResizeBinding>>> = Rc::new(RefCell::new(None));
    Effect::new({
        let binding = resize_binding.clone();
        move || {
            if binding.borrow().is_some() {
                return;
            }
            let Some(container) = container_ref.get() else {
                return;
            };
            let el: web_sys::HtmlElement = (*container).clone().into();

            let dispatch_size = {
                let el = el.clone();
                move || {
                    let rect = el.get_bounding_client_rect();
                    state.update(|s| {
                        *s = s.reduce(MapAction::SetViewportSize {
                            width: rect.width(),
                            height: rect.height(),
                        });
                    });
                }
            };
            dispatch_size();

            let callback = Closure::<dyn FnMut(js_sys::Array, web_sys::ResizeObserver)>::new(
                move |_entries, _observer| dispatch_size(),
            );
            match web_sys::ResizeObserver::new(callback.as_ref().unchecked_ref()) {
                Ok(observer) => {
                    observer.observe(&el);
                    *binding.borrow_mut() = Some(ResizeBinding {
                        observer,
                        _callback: callback,
                    });
                }
                Err(_) => {
                    web_sys::console::warn_1(
                        &"ResizeObserver unavailable; map will not follow container resizes"
                            .into(),
                    );
                }
            }
        }
    });
    on_cleanup({
        let binding = SendWrapper::new(resize_binding);
        move || {
            if let Some(binding) = binding.borrow_mut().take() {
                binding.observer.disconnect();
            }
        }
    });

    // Kick off loads for every tile in or near the viewport. Failures are
    // deliberately dropped; unloaded tiles render as placeholders.
    Effect::new({
        let cache = cache.clone();
        move || {
            let vp = state.with(|s| s.viewport);
            if vp.width <= 0.0 || vp.height <= 0.0 {
                return;
            }
            let wanted: Vec<TileCoord> = visible_tiles(&vp)
                .into_iter()
                .map(|tile| TileCoord::new(tile.x, source_tile_row(tile.y)))
                .collect();
            cache.preload_tiles(&wanted);
        }
    });

    let scheduler = Rc::new(RenderScheduler::new({
        let cache = cache.clone();
        move || {
            let Some(canvas) = canvas_ref.get_untracked() else {
                return;
            };
            let snapshot = state.get_untracked();
            let highlights = highlighted.get_untracked();
            draw_frame(&canvas, &snapshot, &cache, &highlights);
        }
    }));

    // Repaint on any state, highlight, or mount change...
    Effect::new({
        let scheduler = scheduler.clone();
        move || {
            state.track();
            highlighted.track();
            let _ = canvas_ref.get();
            scheduler.mark_dirty();
        }
    });
    // ...and whenever a tile arrives. Weak so the shared cache does not keep
    // an unmounted view's scheduler alive.
    let scheduler_weak = Rc::downgrade(&scheduler);
    cache.set_on_tile_loaded(move || {
        if let Some(scheduler) = scheduler_weak.upgrade() {
            scheduler.mark_dirty();
        }
    });
    on_cleanup({
        let scheduler = SendWrapper::new(scheduler);
        move || drop(scheduler)
    });

    view! {
        <div
            node_ref=container_ref
            style="position: absolute; inset: 0; overflow: hidden;"
        >
            <canvas
                node_ref=canvas_ref
                style="display: block; touch-action: none;"
                style:cursor=move || {
                    if state.with(|s| s.interaction.is_dragging) { "grabbing" } else { "grab" }
                }
                on:pointerdown=on_pointer_down
                on:pointermove=on_pointer_move
                on:pointerup=on_pointer_up
                on:pointerleave=on_pointer_leave
                on:wheel=on_wheel
                on:touchstart=on_touch_start
                on:touchmove=on_touch_move
                on:touchend=on_touch_end
            />
        </div>
    }
}

fn rect_off_screen(rect: &ScreenRect, width: f64, height: f64) -> bool {
    rect.x + rect.width < 0.0 || rect.x > width || rect.y + rect.height < 0.0 || rect.y > height
}

/// Compose one frame: background, tiles (or placeholders), highlight
/// rectangles, hover marker. Never fails; missing tiles draw as placeholders.
fn draw_frame(
    canvas: &HtmlCanvasElement,
    state: &MapState,
    cache: &ImageTileCache,
    highlights: &[ParcelCoord],
) {
    let vp = &state.viewport;
    let (width, height) = (vp.width, vp.height);
    if width <= 0.0 || height <= 0.0 {
        return;
    }

    let Some(ctx) = canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
    else {
        return;
    };

    // Size the backing store for the device pixel ratio; CSS size stays in
    // layout pixels. Resizing resets the context, so the scale is reapplied.
    let dpr = web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0);
    let device_width = (width * dpr).round().max(1.0) as u32;
    let device_height = (height * dpr).round().max(1.0) as u32;
    if canvas.width() != device_width || canvas.height() != device_height {
        canvas.set_width(device_width);
        canvas.set_height(device_height);
        let style = web_sys::HtmlElement::style(canvas);
        style.set_property("width", &format!("{width}px")).ok();
        style.set_property("height", &format!("{height}px")).ok();
        ctx.scale(dpr, dpr).ok();
    }

    ctx.set_fill_style_str(BACKGROUND_COLOR);
    ctx.fill_rect(0.0, 0.0, width, height);

    // Full-grid tile pass with off-screen culling. The image source flips
    // tile rows relative to viewport rows; the same flip runs at preload
    // time, so cache keys line up.
    for tile_x in 0..TILE_COUNT {
        for tile_y in 0..TILE_COUNT {
            let rect = tile_screen_rect(TileCoord::new(tile_x, tile_y), vp);
            if rect_off_screen(&rect, width, height) {
                continue;
            }

            let source = TileCoord::new(tile_x, source_tile_row(tile_y));
            match cache.get_cached(source) {
                Some(image) => {
                    ctx.draw_image_with_html_image_element_and_dw_and_dh(
                        &image,
                        rect.x,
                        rect.y,
                        rect.width,
                        rect.height,
                    )
                    .ok();
                }
                None => {
                    ctx.set_fill_style_str(TILE_PLACEHOLDER_COLOR);
                    ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
                }
            }
        }
    }

    let ppp = pixels_per_parcel(vp.zoom);

    for parcel in highlights {
        let (screen_x, screen_y) = parcel_to_screen(parcel.x as f64, parcel.y as f64, vp);
        let top = screen_y - ppp;
        if rect_off_screen(
            &ScreenRect {
                x: screen_x,
                y: top,
                width: ppp,
                height: ppp,
            },
            width,
            height,
        ) {
            continue;
        }
        ctx.set_fill_style_str(HIGHLIGHT_FILL);
        ctx.fill_rect(screen_x, top, ppp, ppp);
        ctx.set_stroke_style_str(HIGHLIGHT_STROKE);
        ctx.set_line_width(1.0);
        ctx.stroke_rect(screen_x, top, ppp, ppp);
    }

    if let Some(parcel) = state.interaction.hovered_parcel {
        draw_hover_marker(&ctx, parcel, vp, ppp);
    }
}

/// Four corner brackets around the hovered parcel, scaled to its on-screen
/// size.
fn draw_hover_marker(
    ctx: &CanvasRenderingContext2d,
    parcel: ParcelCoord,
    vp: &atlas_core::ViewportState,
    ppp: f64,
) {
    let (screen_x, screen_y) = parcel_to_screen(parcel.x as f64, parcel.y as f64, vp);
    let left = screen_x;
    let top = screen_y - ppp;
    let size = ppp;

    let corner = (size * 0.25).max(4.0);
    let line_width = (size * 0.08).max(1.0);

    ctx.set_stroke_style_str(HOVER_MARKER_COLOR);
    ctx.set_line_width(line_width);
    ctx.set_line_cap("square");

    // Top-left
    ctx.begin_path();
    ctx.move_to(left, top + corner);
    ctx.line_to(left, top);
    ctx.line_to(left + corner, top);
    ctx.stroke();

    // Top-right
    ctx.begin_path();
    ctx.move_to(left + size - corner, top);
    ctx.line_to(left + size, top);
    ctx.line_to(left + size, top + corner);
    ctx.stroke();

    // Bottom-left
    ctx.begin_path();
    ctx.move_to(left, top + size - corner);
    ctx.line_to(left, top + size);
    ctx.line_to(left + corner, top + size);
    ctx.stroke();

    // Bottom-right
    ctx.begin_path();
    ctx.move_to(left + size - corner, top + size);
    ctx.line_to(left + size, top + size);
    ctx.line_to(left + size, top + size - corner);
    ctx.stroke();
}
