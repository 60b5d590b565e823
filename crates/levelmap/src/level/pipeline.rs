use thiserror::Error;
use tracing::{info, warn};

use super::atlas::{atlas_grid, slice_atlas, AtlasError, AtlasSliceTable};
use super::data::{decode_tile_data, TileDataError};
use super::document::{parse_map_document, DocumentError, MapDocument};
use super::geometry::{GeometryConfig, GeometryError, DEFAULT_PIXELS_PER_UNIT};
use super::layout::{assemble_layout, LevelLayout};

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub pixels_per_unit: i32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            pixels_per_unit: DEFAULT_PIXELS_PER_UNIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LevelLoadError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    TileData(#[from] TileDataError),
    #[error(transparent)]
    Atlas(#[from] AtlasError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Everything a scene builder needs from one load: the parsed document, the
/// slice table a renderer cuts drawables from, the derived geometry, and the
/// assembled placements and spawn points.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedLevel {
    pub document: MapDocument,
    pub atlas_slices: AtlasSliceTable,
    pub geometry: GeometryConfig,
    pub layout: LevelLayout,
}

/// Runs the full pipeline over one map document: parse, decode, slice,
/// derive geometry, assemble. Structural errors abort the load; per-cell
/// atlas range problems are reported on the returned layout and logged.
pub fn load_level(source: &str, options: &LoadOptions) -> Result<LoadedLevel, LevelLoadError> {
    let document = parse_map_document(source)?;
    info!(
        map_columns = document.columns,
        map_rows = document.rows,
        tile_width_px = document.tile_width_px,
        tile_height_px = document.tile_height_px,
        atlas_tile_count = document.atlas_tile_count,
        encoding = ?document.encoding,
        object_marker_count = document.object_markers_px.len(),
        "map_document_parsed"
    );

    let grid = decode_tile_data(
        &document.raw_tile_data,
        document.encoding,
        document.columns,
        document.rows,
    )?;
    let atlas = atlas_grid(document.atlas_tile_count, document.atlas_columns)?;
    let atlas_slices = slice_atlas(atlas, document.tile_width_px, document.tile_height_px)?;
    let geometry = GeometryConfig::derive(
        document.tile_width_px,
        document.tile_height_px,
        options.pixels_per_unit,
        document.columns,
        document.rows,
    )?;
    let layout = assemble_layout(&grid, &atlas_slices, &geometry, &document.object_markers_px);

    for diagnostic in layout.diagnostics() {
        warn!(%diagnostic, "tile_outside_atlas");
    }
    info!(
        placed_tile_count = layout.placed_tiles().len(),
        spawn_point_count = layout.spawn_points().len(),
        diagnostic_count = layout.diagnostics().len(),
        "level_assembled"
    );

    Ok(LoadedLevel {
        document,
        atlas_slices,
        geometry,
        layout,
    })
}
