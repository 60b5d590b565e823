use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AtlasError {
    #[error("atlas grid must have positive dimensions, got {columns}x{rows}")]
    InvalidGeometry { columns: u32, rows: u32 },
    #[error("atlas tile count {tile_count} is not divisible by column count {columns}")]
    UnevenTileCount { tile_count: u32, columns: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasGrid {
    pub columns: u32,
    pub rows: u32,
}

/// One rectangular sub-region of the atlas image, in pixel coordinates with
/// the origin at the image's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceRect {
    pub x_px: u32,
    pub y_px: u32,
    pub width_px: u32,
    pub height_px: u32,
}

/// Slice enumeration convention:
/// - Index 0 is the atlas image's bottom-left cell, and indices advance
///   left-to-right within a row, rows bottom-to-top.
/// - Adjusted tile ids index this table directly; the inversion matches the
///   disagreement between image pixel origin and map row origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasSliceTable {
    slices: Vec<SliceRect>,
}

impl AtlasSliceTable {
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SliceRect> {
        self.slices.get(index)
    }

    pub fn slices(&self) -> &[SliceRect] {
        &self.slices
    }
}

/// Derives the atlas grid shape from the tileset's declared tile count and
/// column count. A count that does not fill its final row is rejected rather
/// than truncated.
pub fn atlas_grid(tile_count: u32, columns: u32) -> Result<AtlasGrid, AtlasError> {
    if columns == 0 {
        return Err(AtlasError::InvalidGeometry { columns, rows: 0 });
    }
    if tile_count % columns != 0 {
        return Err(AtlasError::UnevenTileCount {
            tile_count,
            columns,
        });
    }
    let rows = tile_count / columns;
    if rows == 0 {
        return Err(AtlasError::InvalidGeometry { columns, rows });
    }
    Ok(AtlasGrid { columns, rows })
}

pub fn slice_atlas(
    grid: AtlasGrid,
    tile_width_px: u32,
    tile_height_px: u32,
) -> Result<AtlasSliceTable, AtlasError> {
    if grid.columns == 0 || grid.rows == 0 {
        return Err(AtlasError::InvalidGeometry {
            columns: grid.columns,
            rows: grid.rows,
        });
    }

    let mut slices = Vec::with_capacity(grid.columns as usize * grid.rows as usize);
    for y in (0..grid.rows).rev() {
        for x in 0..grid.columns {
            slices.push(SliceRect {
                x_px: x * tile_width_px,
                y_px: y * tile_height_px,
                width_px: tile_width_px,
                height_px: tile_height_px,
            });
        }
    }
    Ok(AtlasSliceTable { slices })
}
