//! Minimap - segmented world map display for Bevy.
//!
//! Displays a persistent, segmented tile map around a location, with live
//! entity icons, markers and party members on top:
//!
//! - [`store`]: read-only adapter over the map store, never blocking the
//!   frame path
//! - [`location`]: locators resolving where the map should be centered
//! - [`window`]: the grid of display cells covering the viewport
//! - [`display`]: per-cell images, computed asynchronously and cached
//! - [`icons`]: reconciliation of live entities into icon proxies
//! - [`transform`]: tile and screen coordinate conversion
//! - [`minimap`]: the widget tying it together, with input handling
//!
//! Add [`MinimapPlugin`] and spawn a [`Minimap`] component; each frame its
//! [`MinimapDrawList`] holds the commands to render.

pub mod cache;
pub mod config;
pub mod coords;
pub mod display;
pub mod error;
pub mod highlight;
pub mod icons;
pub mod image;
pub mod location;
pub mod minimap;
pub mod painter;
pub mod plugin;
pub mod session;
pub mod store;
pub mod transform;
pub mod window;

pub use cache::CachedImage;
pub use config::{IconCategory, IconSetting, IconSettings, MinimapColors, MinimapConfig};
pub use coords::{
  Area, GRID_TILES, GridCoord, GridId, MAX_ZOOM, SERVER_GRID_TILES, SegmentId, TILE_SIZE,
  TileCoord, VIEW_GRIDS,
};
pub use display::{DisplayGrid, DisplayMarker};
pub use error::{ConfigError, Loading};
pub use highlight::TileHighlight;
pub use icons::{DisplayIcon, GROUP_COLORS};
pub use image::{Rgba, RgbaSurface, Surface};
pub use location::{Location, Locator};
pub use minimap::{ClickButton, ClickHandler, MapClick, Minimap, Pointer};
pub use painter::{DrawCmd, DrawList, Label, Painter};
pub use plugin::{MinimapDrawList, MinimapPlugin, MinimapSet};
pub use session::{EntityId, EntityTags, IconInfo, Kin, LiveEntity, Party, PartyMember, Session};
pub use store::{
  DataGrid, GridRef, MapFile, MapGrid, MapStore, Marker, MarkerId, MarkerKind, OverlayLayer,
  TileSet, ZoomGrid,
};
pub use transform::Projection;
pub use window::{DisplayWindow, WindowDelta};
