//! Error types for map generation, grid editing and configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::entity::EntityId;
use crate::terrain::Terrain;

/// Precondition violations raised by the grid, generator and pathfinder.
///
/// A search that finds no route is not an error; see [`crate::pathfinding::find_path`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Coordinate outside the grid
    #[error("coordinate ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    /// Another physical entity already stands on the cell
    #[error("cell ({x}, {y}) is already occupied by {occupant}")]
    Occupied { x: usize, y: usize, occupant: EntityId },

    /// Terrain has no transition table, so a fill cannot start from it
    #[error("terrain '{0}' is not a biome and cannot seed generation")]
    NotABiome(Terrain),

    #[error("unknown terrain '{0}'")]
    UnknownTerrain(String),

    #[error("unknown tileset '{0}'")]
    UnknownTileset(String),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Map(#[from] MapError),
}

pub type MapResult<T> = Result<T, MapError>;
