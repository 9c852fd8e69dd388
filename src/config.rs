//! Session configuration.
//!
//! Loaded from an optional TOML file; command-line flags override individual
//! values afterwards. Every field has a default, so an empty file is valid.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, MapError};
use crate::mapgen::GenerationParams;
use crate::terrain::Terrain;
use crate::tileset::Tileset;
use crate::world::WorldSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WildernessConfig {
    /// Glyph/colour palette
    pub tileset: Tileset,
    /// Biome the flood fill starts from
    pub origin_terrain: Terrain,
    /// Master seed (None = random)
    pub seed: Option<u64>,
    /// Fixed map width in cells (None = fit the terminal)
    pub width: Option<usize>,
    /// Fixed map height in cells (None = fit the terminal)
    pub height: Option<usize>,
    /// Milliseconds between creature steps
    pub rover_interval_ms: u64,
    /// Write tracing output here; no logging when unset
    pub log_file: Option<PathBuf>,
    /// Terminal columns reserved for the border
    pub map_margin_cols: u16,
    /// Terminal rows reserved for the border and status panel
    pub map_margin_rows: u16,
    pub generation: GenerationParams,
}

impl Default for WildernessConfig {
    fn default() -> Self {
        WildernessConfig {
            tileset: Tileset::Default,
            origin_terrain: Terrain::Dirt,
            seed: None,
            width: None,
            height: None,
            rover_interval_ms: 250,
            log_file: None,
            map_margin_cols: 3,
            map_margin_rows: 6,
            generation: GenerationParams::default(),
        }
    }
}

impl WildernessConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: WildernessConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), MapError> {
        if !self.origin_terrain.is_biome() {
            return Err(MapError::NotABiome(self.origin_terrain));
        }
        Ok(())
    }

    pub fn rover_interval(&self) -> Duration {
        Duration::from_millis(self.rover_interval_ms)
    }

    pub fn world_settings(&self) -> WorldSettings {
        WorldSettings {
            tileset: self.tileset,
            origin_terrain: self.origin_terrain,
            generation: self.generation.clone(),
        }
    }

    /// Map size in cells for a terminal of `cols` x `rows`. Fixed
    /// dimensions win over the terminal-derived ones.
    pub fn map_size_for(&self, cols: u16, rows: u16) -> (usize, usize) {
        let width = self
            .width
            .unwrap_or(cols.saturating_sub(self.map_margin_cols) as usize / self.tileset.cell_width());
        let height = self
            .height
            .unwrap_or(rows.saturating_sub(self.map_margin_rows) as usize);
        (width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(WildernessConfig::from_toml_str("").unwrap(), WildernessConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config = WildernessConfig::from_toml_str(
            r#"
            tileset = "moon"
            origin_terrain = "water"
            seed = 77
            rover_interval_ms = 100

            [generation]
            initial_decay = 0.2
            "#,
        )
        .unwrap();

        assert_eq!(config.tileset, Tileset::Moon);
        assert_eq!(config.origin_terrain, Terrain::Water);
        assert_eq!(config.seed, Some(77));
        assert_eq!(config.rover_interval(), Duration::from_millis(100));
        assert_eq!(config.generation.initial_decay, 0.2);
        assert_eq!(config.generation.initial_continuation, 4.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            WildernessConfig::from_toml_str("origin_terrain = \"wall\""),
            Err(ConfigError::Map(MapError::NotABiome(Terrain::Wall)))
        ));
        assert!(matches!(
            WildernessConfig::from_toml_str("tileset = \"mars\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = WildernessConfig::load(Path::new("/nonexistent/wilderness.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_map_size_for_terminal() {
        let mut config = WildernessConfig::default();
        assert_eq!(config.map_size_for(80, 24), (77, 18));
        assert_eq!(config.map_size_for(2, 3), (0, 0));

        config.tileset = Tileset::Moon;
        assert_eq!(config.map_size_for(80, 24), (38, 18));

        config.width = Some(10);
        assert_eq!(config.map_size_for(80, 24), (10, 18));
        assert_eq!(config.map_size_for(200, 50), (10, 44));
    }
}
