//! Named palettes mapping terrain to glyphs and colours.
//!
//! Colours are plain RGB triples so the table stays independent of any
//! rendering backend; the explorer converts them to terminal colours.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::terrain::Terrain;

/// How one terrain is drawn in a tileset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileStyle {
    pub glyph: &'static str,
    /// Foreground colour of the glyph
    pub color: (u8, u8, u8),
    /// Secondary colour, used to tint the cell background
    pub shade: (u8, u8, u8),
}

const fn style(glyph: &'static str, color: (u8, u8, u8), shade: (u8, u8, u8)) -> TileStyle {
    TileStyle { glyph, color, shade }
}

// Classic 8-colour terminal values
const GREEN: (u8, u8, u8) = (0, 205, 0);
const WHITE: (u8, u8, u8) = (229, 229, 229);
const BLUE: (u8, u8, u8) = (0, 0, 238);
const YELLOW: (u8, u8, u8) = (205, 205, 0);
const RED: (u8, u8, u8) = (205, 0, 0);

/// Selectable palette. Purely cosmetic: generation never looks at it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tileset {
    #[default]
    Default,
    Moon,
}

impl Tileset {
    pub fn all() -> &'static [Tileset] {
        &[Tileset::Default, Tileset::Moon]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tileset::Default => "default",
            Tileset::Moon => "moon",
        }
    }

    pub fn style(&self, terrain: Terrain) -> TileStyle {
        match self {
            Tileset::Default => match terrain {
                Terrain::Tree => style("∆", GREEN, (0, 20, 0)),
                Terrain::Hill => style("☗", WHITE, (50, 50, 50)),
                Terrain::Water => style("w", BLUE, (0, 0, 255)),
                Terrain::Dirt => style("░", YELLOW, (200, 200, 200)),
                Terrain::Grass => style("░", GREEN, (0, 200, 0)),
                Terrain::Wall => style("#", WHITE, (200, 200, 200)),
                Terrain::Road => style("|", YELLOW, (255, 255, 0)),
                Terrain::Marker => style(".", RED, (200, 0, 0)),
            },
            Tileset::Moon => match terrain {
                Terrain::Tree => style("^^", (75, 75, 75), (255, 255, 255)),
                Terrain::Hill => style("))", (150, 75, 75), (50, 0, 0)),
                Terrain::Water => style("  ", (100, 20, 20), (200, 0, 0)),
                Terrain::Dirt => style("  ", (155, 100, 100), (200, 200, 200)),
                Terrain::Grass => style("..", (100, 100, 100), (20, 20, 20)),
                Terrain::Wall => style("##", (20, 20, 20), (200, 200, 200)),
                Terrain::Road => style("| ", (30, 30, 30), (255, 255, 0)),
                Terrain::Marker => style("..", (0, 0, 0), (200, 0, 0)),
            },
        }
    }

    pub fn glyph(&self, terrain: Terrain) -> &'static str {
        self.style(terrain).glyph
    }

    /// Terminal columns taken by one cell.
    pub fn cell_width(&self) -> usize {
        match self {
            Tileset::Default => 1,
            Tileset::Moon => 2,
        }
    }
}

impl fmt::Display for Tileset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tileset {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Tileset::all()
            .iter()
            .copied()
            .find(|t| t.name() == lower)
            .ok_or_else(|| MapError::UnknownTileset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_width_matches_cell_width() {
        for tileset in Tileset::all() {
            for terrain in Terrain::all() {
                let glyph = tileset.glyph(*terrain);
                assert_eq!(
                    glyph.chars().count(),
                    tileset.cell_width(),
                    "{} / {} glyph {:?}",
                    tileset, terrain, glyph
                );
            }
        }
    }

    #[test]
    fn test_parse_tileset() {
        assert_eq!("MOON".parse::<Tileset>().unwrap(), Tileset::Moon);
        assert_eq!("default".parse::<Tileset>().unwrap(), Tileset::Default);
        assert!(matches!("mars".parse::<Tileset>(), Err(MapError::UnknownTileset(_))));
    }

    #[test]
    fn test_palettes_differ() {
        assert_ne!(Tileset::Default.style(Terrain::Tree), Tileset::Moon.style(Terrain::Tree));
    }
}
