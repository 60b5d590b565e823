use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use levelmap::{
    load_level, resolve_map_paths, LoadOptions, LoadedLevel, DEFAULT_PIXELS_PER_UNIT,
};

#[derive(Debug, Clone, Copy)]
pub struct CommonOptions {
    pub pixels_per_unit: i32,
}

impl Default for CommonOptions {
    fn default() -> Self {
        Self {
            pixels_per_unit: DEFAULT_PIXELS_PER_UNIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Summary { map: String },
    Tiles { map: String },
    Spawns { map: String },
    CheckAtlas { map: String },
}

pub fn run(
    kind: CommandKind,
    options: CommonOptions,
    out: &mut dyn Write,
) -> Result<(), String> {
    match kind {
        CommandKind::Summary { map } => {
            let (path, level) = load_map(&map, options)?;
            write_summary(out, &path, &level)
        }
        CommandKind::Tiles { map } => {
            let (_, level) = load_map(&map, options)?;
            write_tiles(out, &level)
        }
        CommandKind::Spawns { map } => {
            let (_, level) = load_map(&map, options)?;
            write_spawns(out, &level)
        }
        CommandKind::CheckAtlas { map } => {
            let (path, level) = load_map(&map, options)?;
            check_atlas(out, &path, &level)
        }
    }
}

fn load_map(map: &str, options: CommonOptions) -> Result<(PathBuf, LoadedLevel), String> {
    let path = resolve_map_file(map)?;
    let source = fs::read_to_string(&path)
        .map_err(|error| format!("failed to read map file {}: {error}", path.display()))?;
    let level = load_level(
        &source,
        &LoadOptions {
            pixels_per_unit: options.pixels_per_unit,
        },
    )
    .map_err(|error| format!("failed to load map {}: {error}", path.display()))?;
    Ok((path, level))
}

/// An argument naming an existing file wins; otherwise the name is looked up
/// under the resolved maps directory.
fn resolve_map_file(map: &str) -> Result<PathBuf, String> {
    let direct = PathBuf::from(map);
    if direct.is_file() {
        return Ok(direct);
    }
    let paths = resolve_map_paths().map_err(|error| {
        format!("map '{map}' is not a file and no maps root was found: {error}")
    })?;
    let resolved = paths.map_file(map);
    if resolved.is_file() {
        Ok(resolved)
    } else {
        Err(format!(
            "map '{map}' is neither a file nor present at {}",
            resolved.display()
        ))
    }
}

fn write_summary(
    out: &mut dyn Write,
    path: &Path,
    level: &LoadedLevel,
) -> Result<(), String> {
    let document = &level.document;
    let layout = &level.layout;
    writeln!(
        out,
        "map: {} ({}x{} cells, {}x{} px tiles)",
        path.display(),
        document.columns,
        document.rows,
        document.tile_width_px,
        document.tile_height_px
    )
    .map_err(write_failed)?;
    writeln!(
        out,
        "atlas: {} slices from '{}'",
        level.atlas_slices.len(),
        document.atlas_image_source
    )
    .map_err(write_failed)?;
    writeln!(out, "encoding: {:?}", document.encoding).map_err(write_failed)?;
    writeln!(out, "placed tiles: {}", layout.placed_tiles().len()).map_err(write_failed)?;
    writeln!(out, "spawn points: {}", layout.spawn_points().len()).map_err(write_failed)?;
    for diagnostic in layout.diagnostics() {
        writeln!(out, "warning: {diagnostic}").map_err(write_failed)?;
    }
    Ok(())
}

fn write_tiles(out: &mut dyn Write, level: &LoadedLevel) -> Result<(), String> {
    for tile in level.layout.placed_tiles() {
        writeln!(
            out,
            "({}, {}) slice={} world=({:.3}, {:.3}, {:.3})",
            tile.grid_x,
            tile.grid_y,
            tile.atlas_slice_index,
            tile.world_position.x,
            tile.world_position.y,
            tile.world_position.z
        )
        .map_err(write_failed)?;
    }
    Ok(())
}

fn write_spawns(out: &mut dyn Write, level: &LoadedLevel) -> Result<(), String> {
    for spawn in level.layout.spawn_points() {
        writeln!(
            out,
            "world=({:.3}, {:.3}, {:.3})",
            spawn.world_position.x, spawn.world_position.y, spawn.world_position.z
        )
        .map_err(write_failed)?;
    }
    Ok(())
}

/// Decodes only the atlas image header and compares its pixel dimensions
/// against what the tileset geometry requires.
fn check_atlas(out: &mut dyn Write, map_path: &Path, level: &LoadedLevel) -> Result<(), String> {
    let document = &level.document;
    let image_path = map_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&document.atlas_image_source);
    let (width, height) = image::image_dimensions(&image_path)
        .map_err(|error| format!("failed to read atlas image {}: {error}", image_path.display()))?;

    let atlas_rows = document.atlas_tile_count / document.atlas_columns;
    let expected_width = document.atlas_columns * document.tile_width_px;
    let expected_height = atlas_rows * document.tile_height_px;
    if (width, height) != (expected_width, expected_height) {
        return Err(format!(
            "atlas image {} is {width}x{height} px; tileset geometry needs {expected_width}x{expected_height} px",
            image_path.display()
        ));
    }

    writeln!(
        out,
        "atlas image {} matches tileset geometry ({width}x{height} px)",
        image_path.display()
    )
    .map_err(write_failed)?;
    Ok(())
}

fn write_failed(error: std::io::Error) -> String {
    format!("failed to write output: {error}")
}
