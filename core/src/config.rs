//! Grid geometry, world bounds, and rendering constants.
//!
//! These are inputs to the engine, not derived by it. The tile grid is a
//! fixed `TILE_COUNT x TILE_COUNT` arrangement of satellite images, each
//! covering `PARCELS_PER_TILE` parcels per side, offset from the parcel
//! origin because the images include border parcels outside the world.

pub const PARCELS_PER_TILE: i32 = 40;
pub const TILE_COUNT: i32 = 8;
pub const TOTAL_PARCELS: i32 = TILE_COUNT * PARCELS_PER_TILE;

/// Parcel coordinate of the tile grid's bottom-left corner.
pub const TILE_ORIGIN_X: i32 = -152;
pub const TILE_ORIGIN_Y: i32 = -167;

/// World bounds the viewport center is clamped to.
pub const WORLD_MIN_X: f64 = -150.0;
pub const WORLD_MAX_X: f64 = 163.0;
pub const WORLD_MIN_Y: f64 = -150.0;
pub const WORLD_MAX_Y: f64 = 158.0;

/// On-screen size of one parcel at zoom 1.0.
pub const BASE_PIXELS_PER_PARCEL: f64 = 4.0;
pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 10.0;
pub const DEFAULT_ZOOM: f64 = 1.0;

pub const DEFAULT_CENTER_X: f64 = 0.0;
pub const DEFAULT_CENTER_Y: f64 = 0.0;

pub const TILE_BASE_URL: &str =
    "https://media.githubusercontent.com/media/genesis-city/parcels/new-client-images/maps/lod-0/3/";

/// Matches the edge color of the tile images so placeholders blend in.
pub const TILE_PLACEHOLDER_COLOR: &str = "#1a1a1a";
pub const BACKGROUND_COLOR: &str = "#1a1a1a";

pub const DEFAULT_TILE_CACHE_SIZE: usize = 100;

/// Pointer movement below this (per axis, in pixels) still counts as a click.
pub const CLICK_THRESHOLD_PX: f64 = 5.0;

/// Wheel zoom step per event, by scroll direction.
pub const WHEEL_ZOOM_OUT_FACTOR: f64 = 0.97;
pub const WHEEL_ZOOM_IN_FACTOR: f64 = 1.03;
