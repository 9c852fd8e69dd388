//! The live session state: the current grid plus every entity on it.
//!
//! All mutation goes through [`World`] methods, and threads share it as a
//! [`SharedWorld`] so that moves, edits and regeneration are serialized by a
//! single lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::entity::{Direction, Entity, EntityId};
use crate::error::{MapError, MapResult};
use crate::grid::{Grid, TileCoord};
use crate::mapgen::{self, GenerationParams};
use crate::pathfinding::{find_path, nearest_open_cell};
use crate::seeds::WorldSeeds;
use crate::terrain::Terrain;
use crate::tileset::Tileset;

pub type SharedWorld = Arc<Mutex<World>>;

/// Inputs that stay fixed across regenerations.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldSettings {
    pub tileset: Tileset,
    pub origin_terrain: Terrain,
    pub generation: GenerationParams,
}

impl Default for WorldSettings {
    fn default() -> Self {
        WorldSettings {
            tileset: Tileset::Default,
            origin_terrain: Terrain::Dirt,
            generation: GenerationParams::default(),
        }
    }
}

/// Where an entity goes when a new map is generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Spawn {
    /// Nearest open cell to the grid's start coordinate
    Start,
    /// Nearest open cell to a random coordinate
    Anywhere,
}

pub struct World {
    grid: Grid,
    entities: BTreeMap<EntityId, Entity>,
    spawns: HashMap<EntityId, Spawn>,
    next_id: u32,
    settings: WorldSettings,
    seeds: WorldSeeds,
    terrain_rng: ChaCha8Rng,
    spawn_rng: ChaCha8Rng,
    generation: u64,
}

impl World {
    /// A world with an empty grid; call [`World::regenerate`] to paint one.
    pub fn new(settings: WorldSettings, seeds: WorldSeeds) -> MapResult<Self> {
        if !settings.origin_terrain.is_biome() {
            return Err(MapError::NotABiome(settings.origin_terrain));
        }
        Ok(World {
            grid: Grid::new(0, 0, settings.tileset),
            entities: BTreeMap::new(),
            spawns: HashMap::new(),
            next_id: 0,
            terrain_rng: ChaCha8Rng::seed_from_u64(seeds.terrain),
            spawn_rng: ChaCha8Rng::seed_from_u64(seeds.spawn),
            settings,
            seeds,
            generation: 0,
        })
    }

    pub fn into_shared(self) -> SharedWorld {
        Arc::new(Mutex::new(self))
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    pub fn seeds(&self) -> WorldSeeds {
        self.seeds
    }

    /// Number of maps generated so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the grid wholesale with a freshly generated one, stamp the
    /// corner marker and put every entity back on the new map.
    pub fn regenerate(&mut self, width: usize, height: usize) -> MapResult<()> {
        let mut grid = mapgen::generate(
            width,
            height,
            self.settings.origin_terrain,
            self.settings.tileset,
            &self.settings.generation,
            &mut self.terrain_rng,
        )?;
        if !grid.is_empty() {
            grid.set_terrain(0, 0, Terrain::Marker)?;
        }

        self.grid = grid;
        self.generation += 1;
        self.respawn_all();

        info!(width, height, generation = self.generation, "map regenerated");
        Ok(())
    }

    /// Start over from a new master seed and regenerate at the current size.
    pub fn reseed(&mut self, seeds: WorldSeeds) -> MapResult<()> {
        self.seeds = seeds;
        self.terrain_rng = ChaCha8Rng::seed_from_u64(seeds.terrain);
        self.spawn_rng = ChaCha8Rng::seed_from_u64(seeds.spawn);
        let (width, height) = self.grid.dimensions();
        self.regenerate(width, height)
    }

    fn respawn_all(&mut self) {
        if self.grid.is_empty() {
            warn!("grid has no cells, entities left unplaced");
            return;
        }
        let ids: Vec<EntityId> = self.entities.keys().copied().collect();
        for id in ids {
            let spawn = self.spawns.get(&id).copied().unwrap_or(Spawn::Start);
            if let Err(err) = self.place(id, spawn) {
                warn!(entity = %id, %err, "could not place entity");
            }
        }
    }

    /// Where to put an entity, or None when a physical entity has no open
    /// cell left on the grid.
    fn spawn_point(&mut self, spawn: Spawn, ghost: bool) -> Option<TileCoord> {
        let anchor = match spawn {
            Spawn::Start => self.grid.start(),
            Spawn::Anywhere => TileCoord::new(
                self.spawn_rng.gen_range(0..self.grid.width()),
                self.spawn_rng.gen_range(0..self.grid.height()),
            ),
        };
        if ghost {
            return Some(anchor);
        }
        nearest_open_cell(&self.grid, anchor)
    }

    fn place(&mut self, id: EntityId, spawn: Spawn) -> MapResult<()> {
        let ghost = self.entities.get(&id).is_some_and(|e| e.ghost);
        let Some(at) = self.spawn_point(spawn, ghost) else {
            warn!(entity = %id, "no open cell, entity left unplaced");
            return Ok(());
        };
        if let Some(entity) = self.entities.get_mut(&id) {
            self.grid.place_entity(entity, at)?;
        }
        Ok(())
    }

    /// Add an entity, assign it an id and place it on the current grid.
    ///
    /// The entity's own id and position are overwritten.
    pub fn spawn(&mut self, mut entity: Entity, spawn: Spawn) -> MapResult<EntityId> {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        entity.id = id;

        self.entities.insert(id, entity);
        self.spawns.insert(id, spawn);
        if !self.grid.is_empty() {
            self.place(id, spawn)?;
        }
        Ok(id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// The physical entity standing on `coord`, if any.
    pub fn occupant(&self, coord: TileCoord) -> Option<&Entity> {
        self.grid.occupant_at(coord).and_then(|id| self.entities.get(&id))
    }

    /// Step an entity one cell; `false` if blocked or unknown.
    pub fn move_entity(&mut self, id: EntityId, direction: Direction) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => self.grid.move_entity(entity, direction),
            None => false,
        }
    }

    /// Put a ghost entity directly on `coord` (e.g. snapping the cursor to the player).
    pub fn teleport_ghost(&mut self, id: EntityId, coord: TileCoord) -> MapResult<()> {
        self.grid.check_bounds(coord)?;
        if let Some(entity) = self.entities.get_mut(&id) {
            if entity.ghost {
                entity.position = coord;
            }
        }
        Ok(())
    }

    pub fn set_terrain(&mut self, x: usize, y: usize, terrain: Terrain) -> MapResult<()> {
        self.grid.set_terrain(x, y, terrain)
    }

    /// Paint the selected terrain under an entity (the draw tool).
    pub fn paint_under(&mut self, id: EntityId) -> MapResult<Option<Terrain>> {
        let Some(pos) = self.entities.get(&id).map(|e| e.position) else {
            return Ok(None);
        };
        let terrain = self.grid.selected_terrain();
        self.grid.set_terrain(pos.x, pos.y, terrain)?;
        Ok(Some(terrain))
    }

    pub fn cycle_selected_terrain(&mut self) -> Terrain {
        self.grid.cycle_selected_terrain()
    }

    /// Walkable route between two entities' positions.
    pub fn path_between(&self, from: EntityId, to: EntityId) -> MapResult<Option<Vec<TileCoord>>> {
        let (Some(a), Some(b)) = (self.entities.get(&from), self.entities.get(&to)) else {
            return Ok(None);
        };
        find_path(a.position, b.position, &self.grid, true)
    }
}
