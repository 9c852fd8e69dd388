//! Movable things on the map: the player, the look/draw cursor, creatures.

use std::fmt;

use crate::grid::TileCoord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cardinal movement direction. North is towards row 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn all() -> &'static [Direction] {
        &[Direction::North, Direction::South, Direction::East, Direction::West]
    }

    /// (dx, dy) step for this direction.
    pub fn offset(&self) -> (i64, i64) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }
}

/// Character sheet. Displayed by the status panel, never read by the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stats {
    pub hp: i32,
    pub mp: i32,
    pub ac: i32,
    pub strength: i32,
    pub intelligence: i32,
    pub dexterity: i32,
    pub exp: u32,
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            hp: 10,
            mp: 10,
            ac: 10,
            strength: 8,
            intelligence: 8,
            dexterity: 8,
            exp: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub glyph: char,
    pub position: TileCoord,
    /// Ghosts ignore passability and never appear in the occupancy index.
    pub ghost: bool,
    /// Turns consumed per step
    pub step_factor: u32,
    pub stats: Stats,
}

impl Entity {
    pub fn new(id: EntityId, name: impl Into<String>, glyph: char, position: TileCoord) -> Self {
        Entity {
            id,
            name: name.into(),
            glyph,
            position,
            ghost: false,
            step_factor: 1,
            stats: Stats::default(),
        }
    }

    /// A non-physical cursor that can hover over any cell.
    pub fn cursor(id: EntityId, position: TileCoord) -> Self {
        Entity {
            ghost: true,
            ..Entity::new(id, "Cursor", '_', position)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_are_unit_steps() {
        for dir in Direction::all() {
            let (dx, dy) = dir.offset();
            assert_eq!(dx.abs() + dy.abs(), 1);
        }
        assert_eq!(Direction::North.offset(), (0, -1));
    }

    #[test]
    fn test_cursor_is_ghost() {
        let cursor = Entity::cursor(EntityId(0), TileCoord::new(1, 1));
        assert!(cursor.ghost);
        assert!(!Entity::new(EntityId(1), "Player", '@', TileCoord::new(1, 1)).ghost);
    }

    #[test]
    fn test_default_stats() {
        let stats = Stats::default();
        assert_eq!((stats.hp, stats.strength, stats.exp), (10, 8, 0));
    }
}
