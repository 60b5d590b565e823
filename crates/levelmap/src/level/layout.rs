use thiserror::Error;

use super::atlas::AtlasSliceTable;
use super::data::{TileGrid, EMPTY_TILE};
use super::document::PixelPoint;
use super::geometry::{GeometryConfig, Vec3};

/// One tile placement: a world position plus the atlas slice to draw there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedTile {
    pub grid_x: u32,
    pub grid_y: u32,
    pub world_position: Vec3,
    pub atlas_slice_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    pub world_position: Vec3,
}

/// Per-cell problem found during assembly. Diagnostics ride along with the
/// otherwise-successful layout; one bad cell never discards the rest of the
/// map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileDiagnostic {
    #[error(
        "tile id {id} at cell ({grid_x}, {grid_y}) is outside the atlas slice table ({slice_count} slices)"
    )]
    AtlasIndexOutOfRange {
        grid_x: u32,
        grid_y: u32,
        id: i32,
        slice_count: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelLayout {
    placed_tiles: Vec<PlacedTile>,
    spawn_points: Vec<SpawnPoint>,
    diagnostics: Vec<TileDiagnostic>,
}

impl LevelLayout {
    pub fn placed_tiles(&self) -> &[PlacedTile] {
        &self.placed_tiles
    }

    pub fn spawn_points(&self) -> &[SpawnPoint] {
        &self.spawn_points
    }

    pub fn diagnostics(&self) -> &[TileDiagnostic] {
        &self.diagnostics
    }
}

/// Walks the decoded grid row-major (x fastest, map rows top to bottom) and
/// converts each occupied cell into a placement. Empty cells are omitted;
/// ids past the end of the slice table become diagnostics instead of
/// placements.
pub fn assemble_layout(
    grid: &TileGrid,
    slices: &AtlasSliceTable,
    geometry: &GeometryConfig,
    markers_px: &[PixelPoint],
) -> LevelLayout {
    let mut placed_tiles = Vec::new();
    let mut diagnostics = Vec::new();

    for (index, &id) in grid.ids().iter().enumerate() {
        if id == EMPTY_TILE {
            continue;
        }
        let grid_x = (index % grid.columns() as usize) as u32;
        let grid_y = (index / grid.columns() as usize) as u32;

        let atlas_slice_index = id as usize;
        if atlas_slice_index >= slices.len() {
            diagnostics.push(TileDiagnostic::AtlasIndexOutOfRange {
                grid_x,
                grid_y,
                id,
                slice_count: slices.len(),
            });
            continue;
        }

        let cell = Vec3 {
            x: grid_x as f32 * geometry.tile_width_world,
            y: -(grid_y as f32) * geometry.tile_height_world,
            z: 0.0,
        };
        placed_tiles.push(PlacedTile {
            grid_x,
            grid_y,
            world_position: cell + geometry.map_center_offset + geometry.tile_center_offset,
            atlas_slice_index,
        });
    }

    let spawn_points = markers_px
        .iter()
        .map(|marker| SpawnPoint {
            world_position: Vec3 {
                x: marker.x / geometry.pixels_per_unit,
                y: -(marker.y / geometry.pixels_per_unit),
                z: 0.0,
            } + geometry.map_center_offset,
        })
        .collect();

    LevelLayout {
        placed_tiles,
        spawn_points,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::atlas::{atlas_grid, slice_atlas};

    fn flat_geometry() -> GeometryConfig {
        GeometryConfig {
            pixels_per_unit: 32.0,
            tile_width_world: 1.0,
            tile_height_world: 1.0,
            tile_center_offset: Vec3::default(),
            map_center_offset: Vec3::default(),
        }
    }

    fn slices(tile_count: u32, columns: u32) -> AtlasSliceTable {
        let grid = atlas_grid(tile_count, columns).expect("grid");
        slice_atlas(grid, 32, 32).expect("slice")
    }

    #[test]
    fn cell_positions_compose_cell_offset_map_offset_and_tile_offset() {
        let grid = TileGrid::new(3, 1, vec![0, 1, 2]).expect("grid");
        let geometry = GeometryConfig::derive(32, 32, 32, 3, 1).expect("geometry");
        let layout = assemble_layout(&grid, &slices(4, 2), &geometry, &[]);

        let third = layout.placed_tiles()[2];
        assert_eq!(third.grid_x, 2);
        let expected_x =
            2.0 + geometry.map_center_offset.x + geometry.tile_center_offset.x;
        assert!((third.world_position.x - expected_x).abs() < f32::EPSILON);
    }

    #[test]
    fn rows_advance_downward_in_world_space() {
        let grid = TileGrid::new(1, 2, vec![0, 0]).expect("grid");
        let layout = assemble_layout(&grid, &slices(4, 2), &flat_geometry(), &[]);
        let [top, bottom] = layout.placed_tiles() else {
            panic!("expected two placements");
        };
        assert!(bottom.world_position.y < top.world_position.y);
    }

    #[test]
    fn empty_cells_produce_no_placement_and_no_diagnostic() {
        let grid = TileGrid::new(2, 2, vec![0, EMPTY_TILE, EMPTY_TILE, 1]).expect("grid");
        let layout = assemble_layout(&grid, &slices(4, 2), &flat_geometry(), &[]);
        assert_eq!(layout.placed_tiles().len(), 2);
        assert!(layout.diagnostics().is_empty());
    }

    #[test]
    fn id_one_past_the_table_is_a_single_diagnostic_not_an_abort() {
        let table = slices(4, 2);
        let grid = TileGrid::new(2, 2, vec![0, 4, 1, 2]).expect("grid");
        let layout = assemble_layout(&grid, &table, &flat_geometry(), &[]);

        assert_eq!(layout.placed_tiles().len(), 3);
        assert_eq!(
            layout.diagnostics(),
            &[TileDiagnostic::AtlasIndexOutOfRange {
                grid_x: 1,
                grid_y: 0,
                id: 4,
                slice_count: 4,
            }]
        );
    }

    #[test]
    fn placements_keep_row_major_order() {
        let grid = TileGrid::new(2, 2, vec![0, 1, 2, 3]).expect("grid");
        let layout = assemble_layout(&grid, &slices(4, 2), &flat_geometry(), &[]);
        let cells = layout
            .placed_tiles()
            .iter()
            .map(|tile| (tile.grid_x, tile.grid_y))
            .collect::<Vec<_>>();
        assert_eq!(cells, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn marker_conversion_divides_by_scale_and_negates_y() {
        let grid = TileGrid::new(1, 1, vec![0]).expect("grid");
        let layout = assemble_layout(
            &grid,
            &slices(4, 2),
            &flat_geometry(),
            &[PixelPoint { x: 32.0, y: 32.0 }],
        );
        assert_eq!(
            layout.spawn_points(),
            &[SpawnPoint {
                world_position: Vec3 {
                    x: 1.0,
                    y: -1.0,
                    z: 0.0
                }
            }]
        );
    }

    #[test]
    fn markers_receive_the_map_offset_but_not_the_tile_offset() {
        let mut geometry = flat_geometry();
        geometry.map_center_offset = Vec3 {
            x: -2.0,
            y: 2.0,
            z: 0.0,
        };
        geometry.tile_center_offset = Vec3 {
            x: 0.5,
            y: -0.5,
            z: 0.0,
        };
        let grid = TileGrid::new(1, 1, vec![EMPTY_TILE]).expect("grid");
        let layout = assemble_layout(
            &grid,
            &slices(4, 2),
            &geometry,
            &[PixelPoint { x: 64.0, y: 32.0 }],
        );
        assert_eq!(
            layout.spawn_points()[0].world_position,
            Vec3 {
                x: 0.0,
                y: 1.0,
                z: 0.0
            }
        );
    }

    #[test]
    fn spawn_points_preserve_marker_order() {
        let grid = TileGrid::new(1, 1, vec![EMPTY_TILE]).expect("grid");
        let markers = [
            PixelPoint { x: 0.0, y: 0.0 },
            PixelPoint { x: 32.0, y: 0.0 },
            PixelPoint { x: 64.0, y: 0.0 },
        ];
        let layout = assemble_layout(&grid, &slices(4, 2), &flat_geometry(), &markers);
        let xs = layout
            .spawn_points()
            .iter()
            .map(|spawn| spawn.world_position.x)
            .collect::<Vec<_>>();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }
}
