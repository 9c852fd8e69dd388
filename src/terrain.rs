//! Terrain categories and the biome transition model.
//!
//! The attributes here are independent of any tileset: glyphs and colours
//! live in [`crate::tileset`], while passability and transition weights are
//! properties of the terrain itself.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// Terrain category of a painted cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Tree,
    Hill,
    Water,
    Dirt,
    Grass,
    Wall,
    Road,
    Marker,
}

/// A transition table row: candidate terrain and its probability.
pub type Transition = (Terrain, f64);

const WATER_TRANSITIONS: &[Transition] = &[
    (Terrain::Water, 0.30),
    (Terrain::Dirt, 0.35),
    (Terrain::Tree, 0.20),
    (Terrain::Grass, 0.10),
    (Terrain::Hill, 0.05),
];

const DIRT_TRANSITIONS: &[Transition] = &[
    (Terrain::Dirt, 0.40),
    (Terrain::Grass, 0.25),
    (Terrain::Hill, 0.20),
    (Terrain::Water, 0.10),
    (Terrain::Tree, 0.05),
];

const GRASS_TRANSITIONS: &[Transition] = &[
    (Terrain::Tree, 0.40),
    (Terrain::Grass, 0.25),
    (Terrain::Dirt, 0.20),
    (Terrain::Water, 0.10),
    (Terrain::Hill, 0.05),
];

const HILL_TRANSITIONS: &[Transition] = &[
    (Terrain::Tree, 0.50),
    (Terrain::Hill, 0.15),
    (Terrain::Dirt, 0.20),
    (Terrain::Water, 0.10),
    (Terrain::Grass, 0.05),
];

const TREE_TRANSITIONS: &[Transition] = &[
    (Terrain::Tree, 0.40),
    (Terrain::Hill, 0.25),
    (Terrain::Grass, 0.20),
    (Terrain::Water, 0.10),
    (Terrain::Dirt, 0.05),
];

impl Terrain {
    pub fn all() -> &'static [Terrain] {
        &[
            Terrain::Tree,
            Terrain::Hill,
            Terrain::Water,
            Terrain::Dirt,
            Terrain::Grass,
            Terrain::Wall,
            Terrain::Road,
            Terrain::Marker,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Terrain::Tree => "tree",
            Terrain::Hill => "hill",
            Terrain::Water => "water",
            Terrain::Dirt => "dirt",
            Terrain::Grass => "grass",
            Terrain::Wall => "wall",
            Terrain::Road => "road",
            Terrain::Marker => "marker",
        }
    }

    /// Whether a physical entity may stand on this terrain.
    pub fn is_passable(&self) -> bool {
        match self {
            Terrain::Tree | Terrain::Dirt | Terrain::Grass | Terrain::Road | Terrain::Marker => true,
            Terrain::Hill | Terrain::Water | Terrain::Wall => false,
        }
    }

    /// Weighted list of biomes a fill may switch to from this one.
    ///
    /// Empty for edit-only terrains (wall, road, marker).
    pub fn transitions(&self) -> &'static [Transition] {
        match self {
            Terrain::Water => WATER_TRANSITIONS,
            Terrain::Dirt => DIRT_TRANSITIONS,
            Terrain::Grass => GRASS_TRANSITIONS,
            Terrain::Hill => HILL_TRANSITIONS,
            Terrain::Tree => TREE_TRANSITIONS,
            Terrain::Wall | Terrain::Road | Terrain::Marker => &[],
        }
    }

    /// Biomes can seed and continue a generation fill.
    pub fn is_biome(&self) -> bool {
        !self.transitions().is_empty()
    }

    /// The next terrain in [`Terrain::all`] order, wrapping around.
    pub fn next(&self) -> Terrain {
        let all = Terrain::all();
        let idx = all.iter().position(|t| t == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Terrain {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Terrain::all()
            .iter()
            .copied()
            .find(|t| t.name() == lower)
            .ok_or_else(|| MapError::UnknownTerrain(s.to_string()))
    }
}

/// Inverse-CDF sampling over a discrete probability list.
///
/// Walks the list subtracting weights from a uniform draw until the draw
/// falls inside an entry. Falls back to the last entry if rounding leaves a
/// sliver of the draw unconsumed. Returns `None` only for an empty list.
pub fn weighted_choice<T: Copy, R: Rng>(choices: &[(T, f64)], rng: &mut R) -> Option<T> {
    let mut n: f64 = rng.gen();
    for &(item, weight) in choices {
        if n < weight {
            return Some(item);
        }
        n -= weight;
    }
    choices.last().map(|&(item, _)| item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_transition_tables_sum_to_one() {
        for terrain in Terrain::all() {
            let table = terrain.transitions();
            if table.is_empty() {
                continue;
            }
            let total: f64 = table.iter().map(|(_, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-9, "{} sums to {}", terrain, total);
            assert!(table.iter().all(|(t, _)| t.is_biome()));
        }
    }

    #[test]
    fn test_edit_only_terrains_are_not_biomes() {
        assert!(!Terrain::Wall.is_biome());
        assert!(!Terrain::Road.is_biome());
        assert!(!Terrain::Marker.is_biome());
        assert!(Terrain::Dirt.is_biome());
    }

    #[test]
    fn test_passability() {
        let passable: Vec<_> = Terrain::all().iter().filter(|t| t.is_passable()).collect();
        assert_eq!(
            passable,
            vec![&Terrain::Tree, &Terrain::Dirt, &Terrain::Grass, &Terrain::Road, &Terrain::Marker]
        );
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("Water".parse::<Terrain>().unwrap(), Terrain::Water);
        assert_eq!(" dirt ".parse::<Terrain>().unwrap(), Terrain::Dirt);
        assert_eq!(
            "lava".parse::<Terrain>(),
            Err(MapError::UnknownTerrain("lava".to_string()))
        );
        for terrain in Terrain::all() {
            assert_eq!(terrain.to_string().parse::<Terrain>().unwrap(), *terrain);
        }
    }

    #[test]
    fn test_next_cycles_through_all() {
        let mut t = Terrain::Tree;
        for _ in 0..Terrain::all().len() {
            t = t.next();
        }
        assert_eq!(t, Terrain::Tree);
        assert_eq!(Terrain::Marker.next(), Terrain::Tree);
    }

    #[test]
    fn test_weighted_choice_distribution() {
        let table = [('A', 0.40), ('B', 0.25), ('C', 0.20), ('D', 0.10), ('E', 0.05)];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let draws = 20_000;

        let mut counts = [0usize; 5];
        for _ in 0..draws {
            let c = weighted_choice(&table, &mut rng).unwrap();
            counts[(c as u8 - b'A') as usize] += 1;
        }

        for (i, &(_, weight)) in table.iter().enumerate() {
            let observed = counts[i] as f64 / draws as f64;
            assert!(
                (observed - weight).abs() < 0.02,
                "entry {} observed {:.3}, expected {:.3}",
                i, observed, weight
            );
        }
    }

    #[test]
    fn test_weighted_choice_edge_cases() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let empty: [(u8, f64); 0] = [];
        assert_eq!(weighted_choice(&empty, &mut rng), None);

        // Weights short of 1.0 leave the remainder to the last entry.
        let short = [(1u8, 0.0), (2u8, 0.0)];
        assert_eq!(weighted_choice(&short, &mut rng), Some(2));
    }

    #[test]
    fn test_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            terrain: Terrain,
        }
        let w: Wrapper = toml::from_str("terrain = \"grass\"").unwrap();
        assert_eq!(w.terrain, Terrain::Grass);
    }
}
