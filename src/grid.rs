//! The painted map: cells, occupancy and the edit/move surface.

use std::collections::HashMap;
use std::fmt;

use crate::entity::{Direction, Entity, EntityId};
use crate::error::{MapError, MapResult};
use crate::terrain::Terrain;
use crate::tilemap::Tilemap;
use crate::tileset::Tileset;

/// Column (`x`) and row (`y`) of a grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: usize,
    pub y: usize,
}

impl TileCoord {
    pub fn new(x: usize, y: usize) -> Self {
        TileCoord { x, y }
    }

    /// Coordinate shifted by a signed offset, or `None` past the top/left edge.
    pub fn offset(&self, dx: i64, dy: i64) -> Option<TileCoord> {
        let x = self.x as i64 + dx;
        let y = self.y as i64 + dy;
        if x < 0 || y < 0 {
            return None;
        }
        Some(TileCoord::new(x as usize, y as usize))
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One grid position. Unpainted cells are empty and count as passable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cell {
    #[default]
    Empty,
    Terrain(Terrain),
}

impl Cell {
    pub fn is_passable(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Terrain(t) => t.is_passable(),
        }
    }

    pub fn terrain(&self) -> Option<Terrain> {
        match self {
            Cell::Empty => None,
            Cell::Terrain(t) => Some(*t),
        }
    }

    pub fn is_painted(&self) -> bool {
        matches!(self, Cell::Terrain(_))
    }
}

const DEFAULT_START: TileCoord = TileCoord { x: 1, y: 1 };

/// A fixed-size terrain map plus a weak index of who stands where.
///
/// The grid does not own entities. It only records which [`EntityId`] is on
/// each occupied coordinate; ghosts are never recorded.
#[derive(Clone, Debug)]
pub struct Grid {
    cells: Tilemap<Cell>,
    tileset: Tileset,
    occupants: HashMap<TileCoord, EntityId>,
    selected_terrain: Terrain,
    start: TileCoord,
}

impl Grid {
    /// An unpainted grid. The start coordinate is (1, 1), pulled inside the
    /// bounds for grids narrower or shorter than two cells.
    pub fn new(width: usize, height: usize, tileset: Tileset) -> Self {
        let start = TileCoord::new(
            DEFAULT_START.x.min(width.saturating_sub(1)),
            DEFAULT_START.y.min(height.saturating_sub(1)),
        );
        Grid {
            cells: Tilemap::new(width, height),
            tileset,
            occupants: HashMap::new(),
            selected_terrain: Terrain::Dirt,
            start,
        }
    }

    pub fn width(&self) -> usize {
        self.cells.width
    }

    pub fn height(&self) -> usize {
        self.cells.height
    }

    /// (width, height)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cells.width, self.cells.height)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn tileset(&self) -> Tileset {
        self.tileset
    }

    pub fn cells(&self) -> &Tilemap<Cell> {
        &self.cells
    }

    pub fn start(&self) -> TileCoord {
        self.start
    }

    pub fn in_bounds(&self, coord: TileCoord) -> bool {
        self.cells.in_bounds(coord.x, coord.y)
    }

    pub fn check_bounds(&self, coord: TileCoord) -> MapResult<()> {
        if self.in_bounds(coord) {
            Ok(())
        } else {
            Err(MapError::OutOfBounds {
                x: coord.x,
                y: coord.y,
                width: self.width(),
                height: self.height(),
            })
        }
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        self.cells.try_get(x, y).copied()
    }

    pub fn terrain_at(&self, coord: TileCoord) -> Option<Terrain> {
        self.cell(coord.x, coord.y).and_then(|c| c.terrain())
    }

    /// Out-of-bounds coordinates are never passable.
    pub fn is_passable(&self, x: usize, y: usize) -> bool {
        self.cell(x, y).is_some_and(|c| c.is_passable())
    }

    pub fn is_fully_painted(&self) -> bool {
        self.cells.iter().all(|(_, _, c)| c.is_painted())
    }

    /// Generator-time assignment; the caller guarantees bounds.
    pub(crate) fn paint(&mut self, coord: TileCoord, terrain: Terrain) {
        self.cells.set(coord.x, coord.y, Cell::Terrain(terrain));
    }

    pub(crate) fn is_painted(&self, coord: TileCoord) -> bool {
        self.cells.get(coord.x, coord.y).is_painted()
    }

    /// Overwrite one cell's terrain (the draw tool).
    pub fn set_terrain(&mut self, x: usize, y: usize, terrain: Terrain) -> MapResult<()> {
        self.check_bounds(TileCoord::new(x, y))?;
        self.cells.set(x, y, Cell::Terrain(terrain));
        Ok(())
    }

    pub fn selected_terrain(&self) -> Terrain {
        self.selected_terrain
    }

    pub fn set_selected_terrain(&mut self, terrain: Terrain) {
        self.selected_terrain = terrain;
    }

    pub fn cycle_selected_terrain(&mut self) -> Terrain {
        self.selected_terrain = self.selected_terrain.next();
        self.selected_terrain
    }

    pub fn occupant_at(&self, coord: TileCoord) -> Option<EntityId> {
        self.occupants.get(&coord).copied()
    }

    pub fn occupied_count(&self) -> usize {
        self.occupants.len()
    }

    /// Put an entity on the grid at `at`, registering it in the occupancy
    /// index unless it is a ghost. Placement ignores passability, but a
    /// physical entity cannot land on a cell another one holds.
    pub fn place_entity(&mut self, entity: &mut Entity, at: TileCoord) -> MapResult<()> {
        self.check_bounds(at)?;
        if !entity.ghost {
            if let Some(&occupant) = self.occupants.get(&at) {
                if occupant != entity.id {
                    return Err(MapError::Occupied { x: at.x, y: at.y, occupant });
                }
            }
        }
        self.remove_entity(entity);
        entity.position = at;
        if !entity.ghost {
            self.occupants.insert(at, entity.id);
        }
        Ok(())
    }

    pub fn remove_entity(&mut self, entity: &Entity) {
        if self.occupants.get(&entity.position) == Some(&entity.id) {
            self.occupants.remove(&entity.position);
        }
    }

    /// Step an entity one cell. Returns whether it moved.
    ///
    /// Physical entities are blocked by the border, impassable terrain and
    /// other physical entities; ghosts only by the border.
    pub fn move_entity(&mut self, entity: &mut Entity, direction: Direction) -> bool {
        let (dx, dy) = direction.offset();
        let dest = match entity.position.offset(dx, dy) {
            Some(dest) if self.in_bounds(dest) => dest,
            _ => return false,
        };

        if entity.ghost {
            entity.position = dest;
            return true;
        }

        if !self.is_passable(dest.x, dest.y) {
            return false;
        }
        if self.occupant_at(dest).is_some_and(|other| other != entity.id) {
            return false;
        }

        self.remove_entity(entity);
        entity.position = dest;
        self.occupants.insert(dest, entity.id);
        true
    }

    /// Plain-text rendering, one line per row, using the grid's tileset.
    pub fn render_text(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() * 3 + self.height());
        for row in self.cells.rows() {
            for cell in row {
                match cell {
                    Cell::Terrain(t) => out.push_str(self.tileset.glyph(*t)),
                    Cell::Empty => out.push_str(&" ".repeat(self.tileset.cell_width())),
                }
            }
            out.push('\n');
        }
        out
    }
}
