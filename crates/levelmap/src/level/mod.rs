mod atlas;
mod data;
mod document;
mod geometry;
mod layout;
mod pipeline;

pub use atlas::{atlas_grid, slice_atlas, AtlasError, AtlasGrid, AtlasSliceTable, SliceRect};
pub use data::{decode_tile_data, TileDataError, TileGrid, EMPTY_TILE};
pub use document::{
    parse_map_document, DocumentError, MapDocument, PixelPoint, SourceLocation, TileDataEncoding,
};
pub use geometry::{GeometryConfig, GeometryError, Vec3, DEFAULT_PIXELS_PER_UNIT};
pub use layout::{assemble_layout, LevelLayout, PlacedTile, SpawnPoint, TileDiagnostic};
pub use pipeline::{load_level, LevelLoadError, LoadOptions, LoadedLevel};
