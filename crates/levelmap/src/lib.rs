use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod level;

pub use level::{
    load_level, parse_map_document, AtlasSliceTable, GeometryConfig, LevelLayout, LevelLoadError,
    LoadOptions, LoadedLevel, MapDocument, PlacedTile, SliceRect, SpawnPoint, TileDiagnostic,
    Vec3, DEFAULT_PIXELS_PER_UNIT,
};

pub const ROOT_ENV_VAR: &str = "LEVELMAP_ROOT";

/// Where map documents and their tileset images live on disk. The level
/// pipeline itself never touches the filesystem; callers resolve locations
/// here and pass document text in.
#[derive(Debug, Clone)]
pub struct MapPaths {
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub maps_dir: PathBuf,
}

impl MapPaths {
    pub fn at_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let data_dir = root.join("data");
        let maps_dir = data_dir.join("maps");
        Self {
            root,
            data_dir,
            maps_dir,
        }
    }

    pub fn map_file(&self, file_name: &str) -> PathBuf {
        self.maps_dir.join(file_name)
    }

    /// Tileset image sources are written relative to the map file, so they
    /// join against the maps directory.
    pub fn atlas_image_file(&self, source: &str) -> PathBuf {
        self.maps_dir.join(source)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current working directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    #[error("{env_var} is set but does not point to a directory containing data/maps: {path}")]
    InvalidEnvRoot {
        path: PathBuf,
        env_var: &'static str,
    },
    #[error(
        "could not find a data/maps directory walking upward from {start_dir}; \
set {env_var} to the directory that contains data/maps"
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_map_paths() -> Result<MapPaths, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_map_root(&normalized) {
                Ok(MapPaths::at_root(normalized))
            } else {
                Err(StartupError::InvalidEnvRoot {
                    path: normalized,
                    env_var: ROOT_ENV_VAR,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            let cwd = env::current_dir().map_err(StartupError::CurrentDir)?;
            for candidate in cwd.ancestors() {
                if is_map_root(candidate) {
                    return Ok(MapPaths::at_root(normalize_path(candidate)));
                }
            }
            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&cwd),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_map_root(path: &Path) -> bool {
    path.join("data").join("maps").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn map_root_marker_requires_the_maps_directory() {
        let temp = TempDir::new().expect("temp");
        assert!(!is_map_root(temp.path()));
        fs::create_dir_all(temp.path().join("data").join("maps")).expect("mkdir");
        assert!(is_map_root(temp.path()));
    }

    #[test]
    fn paths_join_under_the_maps_directory() {
        let paths = MapPaths::at_root("/srv/game");
        assert_eq!(
            paths.map_file("level1.tmx"),
            PathBuf::from("/srv/game/data/maps/level1.tmx")
        );
        assert_eq!(
            paths.atlas_image_file("tiles.png"),
            PathBuf::from("/srv/game/data/maps/tiles.png")
        );
    }
}
