use std::ops::Add;

use thiserror::Error;

pub const DEFAULT_PIXELS_PER_UNIT: i32 = 32;

/// World-space position. The map itself is flat; placements carry a z
/// component so a scene builder can layer several maps without remapping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("pixels-per-unit must be positive, got {pixels_per_unit}")]
    InvalidScale { pixels_per_unit: i32 },
}

/// Coordinate conventions:
/// - Pixel-space y grows downward; world-space y grows upward. Every
///   pixel-to-world conversion negates y.
/// - `map_center_offset` shifts the whole grid so the map is centered on
///   the world origin.
/// - `tile_center_offset` is a half tile, shifting a placement from the
///   cell's top-left corner to its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryConfig {
    pub pixels_per_unit: f32,
    pub tile_width_world: f32,
    pub tile_height_world: f32,
    pub tile_center_offset: Vec3,
    pub map_center_offset: Vec3,
}

impl GeometryConfig {
    pub fn derive(
        tile_width_px: u32,
        tile_height_px: u32,
        pixels_per_unit: i32,
        map_columns: u32,
        map_rows: u32,
    ) -> Result<Self, GeometryError> {
        if pixels_per_unit <= 0 {
            return Err(GeometryError::InvalidScale { pixels_per_unit });
        }

        let scale = pixels_per_unit as f32;
        let tile_width_world = tile_width_px as f32 / scale;
        let tile_height_world = tile_height_px as f32 / scale;

        Ok(Self {
            pixels_per_unit: scale,
            tile_width_world,
            tile_height_world,
            tile_center_offset: Vec3 {
                x: 0.5 * tile_width_world,
                y: -0.5 * tile_height_world,
                z: 0.0,
            },
            map_center_offset: Vec3 {
                x: -(map_columns as f32 * tile_width_world) * 0.5,
                y: (map_rows as f32 * tile_height_world) * 0.5,
                z: 0.0,
            },
        })
    }
}
