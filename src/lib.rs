//! Biome map generation and terminal exploration library
//!
//! Re-exports modules for use by the binary and tests.

pub mod config;
pub mod entity;
pub mod error;
pub mod explorer;
pub mod grid;
pub mod mapgen;
pub mod pathfinding;
pub mod rover;
pub mod seeds;
pub mod terrain;
pub mod tilemap;
pub mod tileset;
pub mod world;
