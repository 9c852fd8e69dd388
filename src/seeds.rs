//! Seed management for map generation and autonomous movement
//!
//! One master seed fans out into a seed per random stream, so a whole session
//! (terrain, spawn points, creature wandering) can be replayed from a single
//! number while each stream stays independent of the others.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Seeds for every random stream in a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldSeeds {
    /// Master seed (used for display/reference)
    pub master: u64,
    /// Biome flood fill
    pub terrain: u64,
    /// Where physical entities are placed after each generation
    pub spawn: u64,
    /// Random walk of autonomous creatures
    pub roaming: u64,
}

impl WorldSeeds {
    /// Derive all sub-seeds deterministically from a master seed.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            terrain: derive_seed(master, "terrain"),
            spawn: derive_seed(master, "spawn"),
            roaming: derive_seed(master, "roaming"),
        }
    }

    /// Use `seed` if given, otherwise pick a random master seed.
    pub fn from_option(seed: Option<u64>) -> Self {
        Self::from_master(seed.unwrap_or_else(rand::random))
    }
}

impl Default for WorldSeeds {
    fn default() -> Self {
        Self::from_master(rand::random())
    }
}

/// Hash a master seed together with a stream name.
fn derive_seed(master: u64, stream: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    stream.hash(&mut hasher);
    hasher.finish()
}

impl std::fmt::Display for WorldSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "WorldSeeds {{ master: {}, terrain: {}, spawn: {}, roaming: {} }}",
            self.master, self.terrain, self.spawn, self.roaming,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_derivation() {
        let seeds1 = WorldSeeds::from_master(12345);
        let seeds2 = WorldSeeds::from_master(12345);
        assert_eq!(seeds1, seeds2);
    }

    #[test]
    fn test_streams_get_different_seeds() {
        let seeds = WorldSeeds::from_master(12345);
        assert_ne!(seeds.terrain, seeds.spawn);
        assert_ne!(seeds.spawn, seeds.roaming);
        assert_ne!(seeds.terrain, seeds.roaming);
    }

    #[test]
    fn test_from_option_respects_explicit_seed() {
        assert_eq!(WorldSeeds::from_option(Some(9)).master, 9);
        assert_eq!(WorldSeeds::from_option(Some(9)), WorldSeeds::from_master(9));
    }
}
