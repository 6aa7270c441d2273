pub mod cache;
pub mod config;
pub mod controller;
pub mod coords;
pub mod state;

pub use cache::{CacheStats, TileCache, TileFetcher, TileLoad, TileLoadError};
pub use controller::{InputEvent, InputOutcome, InteractionController};
pub use coords::{ParcelCoord, ParcelRange, ScreenRect, TileCoord};
pub use state::{InteractionState, MapAction, MapState, ViewportState};
