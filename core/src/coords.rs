//! Conversions between screen pixels, parcel coordinates, and tile indices.
//!
//! All functions are pure. Screen Y grows downward while parcel Y grows
//! upward, so every screen<->parcel conversion inverts the Y axis once.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{
    BASE_PIXELS_PER_PARCEL, PARCELS_PER_TILE, TILE_BASE_URL, TILE_COUNT, TILE_ORIGIN_X,
    TILE_ORIGIN_Y,
};
use crate::state::ViewportState;

/// One cell of world space, addressed by integer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParcelCoord {
    pub x: i32,
    pub y: i32,
}

/// Index into the fixed tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

/// Inclusive parcel bounds covered by one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParcelRange {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

/// An axis-aligned rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ParcelCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// "x,y" — the position format the surrounding CRUD layer stores.
impl fmt::Display for ParcelCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePositionError(String);

impl fmt::Display for ParsePositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid parcel position: {:?}", self.0)
    }
}

impl std::error::Error for ParsePositionError {}

impl From<ParseIntError> for ParsePositionError {
    fn from(err: ParseIntError) -> Self {
        Self(err.to_string())
    }
}

impl FromStr for ParcelCoord {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| ParsePositionError(s.to_string()))?;
        Ok(Self {
            x: x.trim().parse()?,
            y: y.trim().parse()?,
        })
    }
}

/// On-screen size of one parcel at the given zoom.
pub fn pixels_per_parcel(zoom: f64) -> f64 {
    BASE_PIXELS_PER_PARCEL * zoom
}

/// Convert a screen position to the parcel under it (floored to integers).
pub fn screen_to_parcel(screen_x: f64, screen_y: f64, vp: &ViewportState) -> ParcelCoord {
    let ppp = pixels_per_parcel(vp.zoom);

    let offset_x = screen_x - vp.width / 2.0;
    let offset_y = screen_y - vp.height / 2.0;

    ParcelCoord {
        x: (vp.center_x + offset_x / ppp).floor() as i32,
        y: (vp.center_y - offset_y / ppp).floor() as i32,
    }
}

/// Convert parcel coordinates to a screen position. Continuous (no flooring),
/// so parcels one unit apart always land `pixels_per_parcel` apart on screen.
pub fn parcel_to_screen(parcel_x: f64, parcel_y: f64, vp: &ViewportState) -> (f64, f64) {
    let ppp = pixels_per_parcel(vp.zoom);

    (
        vp.width / 2.0 + (parcel_x - vp.center_x) * ppp,
        vp.height / 2.0 - (parcel_y - vp.center_y) * ppp,
    )
}

/// Tile index containing the given parcel, clamped into the grid.
pub fn parcel_to_tile_index(parcel_x: f64, parcel_y: f64) -> TileCoord {
    let tile_x = ((parcel_x - TILE_ORIGIN_X as f64) / PARCELS_PER_TILE as f64).floor() as i32;
    let tile_y = ((parcel_y - TILE_ORIGIN_Y as f64) / PARCELS_PER_TILE as f64).floor() as i32;

    TileCoord {
        x: tile_x.clamp(0, TILE_COUNT - 1),
        y: tile_y.clamp(0, TILE_COUNT - 1),
    }
}

/// Inclusive parcel bounds of one tile.
pub fn tile_to_parcel_range(tile: TileCoord) -> ParcelRange {
    ParcelRange {
        min_x: TILE_ORIGIN_X + tile.x * PARCELS_PER_TILE,
        max_x: TILE_ORIGIN_X + (tile.x + 1) * PARCELS_PER_TILE - 1,
        min_y: TILE_ORIGIN_Y + tile.y * PARCELS_PER_TILE,
        max_y: TILE_ORIGIN_Y + (tile.y + 1) * PARCELS_PER_TILE - 1,
    }
}

/// All tile indices intersecting the viewport, padded by one tile per side
/// and clipped to the grid.
pub fn visible_tiles(vp: &ViewportState) -> Vec<TileCoord> {
    let ppp = pixels_per_parcel(vp.zoom);

    let half_width_parcels = vp.width / 2.0 / ppp + PARCELS_PER_TILE as f64;
    let half_height_parcels = vp.height / 2.0 / ppp + PARCELS_PER_TILE as f64;

    let min_tile = parcel_to_tile_index(
        vp.center_x - half_width_parcels,
        vp.center_y - half_height_parcels,
    );
    let max_tile = parcel_to_tile_index(
        vp.center_x + half_width_parcels,
        vp.center_y + half_height_parcels,
    );

    let mut tiles = Vec::new();
    for tx in min_tile.x..=max_tile.x {
        for ty in min_tile.y..=max_tile.y {
            tiles.push(TileCoord { x: tx, y: ty });
        }
    }
    tiles
}

/// Screen rectangle a tile occupies. The tile's parcel origin is its
/// bottom-left corner, so the screen Y accounts for the tile's height.
pub fn tile_screen_rect(tile: TileCoord, vp: &ViewportState) -> ScreenRect {
    let ppp = pixels_per_parcel(vp.zoom);
    let tile_pixel_size = PARCELS_PER_TILE as f64 * ppp;

    let origin_x = (TILE_ORIGIN_X + tile.x * PARCELS_PER_TILE) as f64;
    let origin_y = (TILE_ORIGIN_Y + tile.y * PARCELS_PER_TILE) as f64;

    ScreenRect {
        x: vp.width / 2.0 + (origin_x - vp.center_x) * ppp,
        y: vp.height / 2.0 - (origin_y + PARCELS_PER_TILE as f64 - vp.center_y) * ppp,
        width: tile_pixel_size,
        height: tile_pixel_size,
    }
}

/// Image-source row for a viewport-space tile row. The tile images address
/// row 0 at the top of the map while parcel Y grows upward, so the row index
/// flips. Every preload and draw site must go through this one helper.
pub fn source_tile_row(viewport_row: i32) -> i32 {
    TILE_COUNT - 1 - viewport_row
}

/// Fetch URL for a tile image. The comma is percent-encoded in the source
/// repository's file names.
pub fn tile_url(tile: TileCoord) -> String {
    format!("{TILE_BASE_URL}{}%2C{}.jpg", tile.x, tile.y)
}
