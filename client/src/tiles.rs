#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

//! `HtmlImageElement`-backed tile fetching.
//!
//! The browser's image pipeline does the HTTP fetch and decode; this module
//! only bridges the onload/onerror callbacks into a future the shared
//! [`TileCache`] can await.

use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlImageElement;

use atlas_core::cache::{TileCache, TileFetcher, TileLoadError};
use atlas_core::config::DEFAULT_TILE_CACHE_SIZE;
use atlas_core::coords::{TileCoord, tile_url};

pub type ImageTileCache = TileCache<ImageElementFetcher>;

/// Build the cache every mounted map view shares. Constructed once in the
/// application root and handed down via context, so concurrent views
/// requesting the same tile collapse into one network request.
pub fn create_shared_cache() -> ImageTileCache {
    TileCache::new(ImageElementFetcher, DEFAULT_TILE_CACHE_SIZE, |fut| {
        wasm_bindgen_futures::spawn_local(fut);
    })
}

pub struct ImageElementFetcher;

impl TileFetcher for ImageElementFetcher {
    type Image = HtmlImageElement;

    fn fetch(
        &self,
        tile: TileCoord,
    ) -> LocalBoxFuture<'static, Result<HtmlImageElement, TileLoadError>> {
        fetch_image(tile).boxed_local()
    }
}

async fn fetch_image(tile: TileCoord) -> Result<HtmlImageElement, TileLoadError> {
    let img = HtmlImageElement::new()
        .map_err(|_| TileLoadError::new(tile, "could not create image element"))?;
    img.set_cross_origin(Some("anonymous"));

    // onload and onerror race for the single sender.
    let (tx, rx) = oneshot::channel::<bool>();
    let tx = Rc::new(RefCell::new(Some(tx)));

    let tx_load = tx.clone();
    let onload = Closure::<dyn FnMut()>::new(move || {
        if let Some(tx) = tx_load.borrow_mut().take() {
            let _ = tx.send(true);
        }
    });
    let tx_error = tx.clone();
    let onerror = Closure::<dyn FnMut()>::new(move || {
        if let Some(tx) = tx_error.borrow_mut().take() {
            let _ = tx.send(false);
        }
    });
    img.set_onload(Some(onload.as_ref().unchecked_ref()));
    img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    img.set_src(&tile_url(tile));

    let loaded = rx.await.unwrap_or(false);
    img.set_onload(None);
    img.set_onerror(None);
    drop(onload);
    drop(onerror);

    if !loaded {
        web_sys::console::warn_1(&format!("tile {},{} failed to load", tile.x, tile.y).into());
        return Err(TileLoadError::new(tile, "image failed to load"));
    }

    // Decode before handing the image to the render loop so the first draw
    // doesn't stall the frame.
    let _ = JsFuture::from(img.decode()).await;
    Ok(img)
}
