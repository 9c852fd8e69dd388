//! Biome map generation by randomized depth-first flood fill.
//!
//! The fill starts in the top-left corner and walks the grid depth first,
//! visiting orthogonal neighbours in shuffled order. Each step either keeps
//! painting the current biome or, with a probability that grows the longer a
//! run lasts, switches to a neighbouring biome drawn from the transition
//! table. Runs of one biome therefore form coherent, irregular patches.
//!
//! The walk keeps its own stack of frames instead of recursing, so a
//! serpentine fill over a full screen cannot exhaust the thread stack.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MapError, MapResult};
use crate::grid::{Grid, TileCoord};
use crate::terrain::{weighted_choice, Terrain};
use crate::tileset::Tileset;

/// Tuning for run length.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Chance of continuing a run, compared against a uniform [0, 1) draw.
    /// Values above 1.0 guarantee a minimum run length.
    pub initial_continuation: f64,
    /// Amount the continuation chance drops per painted cell
    pub initial_decay: f64,
    /// Amount the decay itself grows per painted cell
    pub decay_increment: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams {
            initial_continuation: 4.0,
            initial_decay: 0.10,
            decay_increment: 0.01,
        }
    }
}

/// Per-path fill state, handed from a cell to the neighbours it discovers.
#[derive(Clone, Copy, Debug)]
struct FillState {
    terrain: Terrain,
    continuation: f64,
    decay: f64,
}

impl FillState {
    fn fresh(terrain: Terrain, params: &GenerationParams) -> Self {
        FillState {
            terrain,
            continuation: params.initial_continuation,
            decay: params.initial_decay,
        }
    }
}

/// A painted cell whose neighbours are still being visited.
struct Frame {
    state: FillState,
    neighbors: Vec<(usize, usize)>,
    next: usize,
}

impl Frame {
    fn new<R: Rng>(coord: TileCoord, state: FillState, grid: &Grid, rng: &mut R) -> Self {
        let mut neighbors = grid.cells().neighbors(coord.x, coord.y);
        neighbors.shuffle(rng);
        Frame { state, neighbors, next: 0 }
    }

    /// The next neighbour that is still unpainted at this moment.
    fn next_unpainted(&mut self, grid: &Grid) -> Option<TileCoord> {
        while self.next < self.neighbors.len() {
            let (x, y) = self.neighbors[self.next];
            self.next += 1;
            let coord = TileCoord::new(x, y);
            if !grid.is_painted(coord) {
                return Some(coord);
            }
        }
        None
    }
}

/// Paint one cell and return the state its neighbours inherit.
fn paint_cell<R: Rng>(
    grid: &mut Grid,
    coord: TileCoord,
    inherited: FillState,
    params: &GenerationParams,
    rng: &mut R,
    switches: &mut usize,
) -> FillState {
    let draw: f64 = rng.gen();
    if draw <= inherited.continuation {
        grid.paint(coord, inherited.terrain);
        FillState {
            terrain: inherited.terrain,
            continuation: (inherited.continuation - inherited.decay).max(0.0),
            decay: inherited.decay + params.decay_increment,
        }
    } else {
        let terrain = weighted_choice(inherited.terrain.transitions(), rng).unwrap_or(inherited.terrain);
        grid.paint(coord, terrain);
        *switches += 1;
        FillState::fresh(terrain, params)
    }
}

/// Generate a fully painted `width` x `height` grid.
///
/// A zero-area request yields an empty grid. The origin terrain must be a
/// biome (have a transition table). Output depends entirely on `rng`: seed it
/// to reproduce a map.
pub fn generate<R: Rng>(
    width: usize,
    height: usize,
    origin_terrain: Terrain,
    tileset: Tileset,
    params: &GenerationParams,
    rng: &mut R,
) -> MapResult<Grid> {
    if !origin_terrain.is_biome() {
        return Err(MapError::NotABiome(origin_terrain));
    }

    let mut grid = Grid::new(width, height, tileset);
    grid.set_selected_terrain(origin_terrain);
    if grid.is_empty() {
        return Ok(grid);
    }

    let mut switches = 0usize;
    let mut max_depth = 0usize;

    let origin = TileCoord::new(0, 0);
    let state = paint_cell(&mut grid, origin, FillState::fresh(origin_terrain, params), params, rng, &mut switches);
    let mut stack = vec![Frame::new(origin, state, &grid, rng)];

    while let Some(frame) = stack.last_mut() {
        match frame.next_unpainted(&grid) {
            Some(coord) => {
                let inherited = frame.state;
                let state = paint_cell(&mut grid, coord, inherited, params, rng, &mut switches);
                let child = Frame::new(coord, state, &grid, rng);
                stack.push(child);
                max_depth = max_depth.max(stack.len());
            }
            None => {
                stack.pop();
            }
        }
    }

    debug_assert!(grid.is_fully_painted());
    debug!(width, height, origin = %origin_terrain, switches, max_depth, "generated biome map");

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn gen(width: usize, height: usize, seed: u64) -> Grid {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        generate(width, height, Terrain::Dirt, Tileset::Default, &GenerationParams::default(), &mut rng).unwrap()
    }

    #[test]
    fn test_every_cell_painted_with_a_biome() {
        for (w, h) in [(1, 1), (1, 30), (30, 1), (17, 9), (80, 24)] {
            let grid = gen(w, h, 42);
            assert_eq!(grid.dimensions(), (w, h));
            assert!(grid.is_fully_painted(), "{}x{} left holes", w, h);
            for (_, _, cell) in grid.cells().iter() {
                let terrain = cell.terrain().unwrap();
                assert!(terrain.is_biome(), "generator produced {}", terrain);
            }
        }
    }

    #[test]
    fn test_zero_area_is_empty_grid() {
        for (w, h) in [(0, 0), (0, 10), (10, 0)] {
            let grid = gen(w, h, 1);
            assert!(grid.is_empty());
            assert_eq!(grid.dimensions(), (w, h));
        }
    }

    #[test]
    fn test_non_biome_origin_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let result = generate(5, 5, Terrain::Wall, Tileset::Default, &GenerationParams::default(), &mut rng);
        assert_eq!(result.unwrap_err(), MapError::NotABiome(Terrain::Wall));

        // Rejected even when there is nothing to paint.
        let result = generate(0, 0, Terrain::Road, Tileset::Default, &GenerationParams::default(), &mut rng);
        assert!(result.is_err());
    }

    #[test]
    fn test_large_map_does_not_overflow_stack() {
        let grid = gen(400, 400, 9);
        assert!(grid.is_fully_painted());
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = gen(40, 20, 1234);
        let b = gen(40, 20, 1234);
        let c = gen(40, 20, 4321);
        assert_eq!(a.cells(), b.cells());
        assert_ne!(a.cells(), c.cells());
    }

    #[test]
    fn test_unbroken_run_keeps_origin_terrain() {
        let params = GenerationParams {
            initial_continuation: 2.0,
            initial_decay: 0.0,
            decay_increment: 0.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let grid = generate(12, 7, Terrain::Water, Tileset::Moon, &params, &mut rng).unwrap();
        assert!(grid.cells().iter().all(|(_, _, c)| *c == Cell::Terrain(Terrain::Water)));
        assert_eq!(grid.selected_terrain(), Terrain::Water);
        assert_eq!(grid.tileset(), Tileset::Moon);
    }

    #[test]
    fn test_biomes_form_patches() {
        // Independent per-cell draws would match a neighbour roughly a
        // quarter of the time; runs should push that well above.
        let mut same = 0usize;
        let mut pairs = 0usize;
        for seed in 0..5 {
            let grid = gen(60, 30, seed);
            let cells = grid.cells();
            for (x, y, cell) in cells.iter() {
                for (nx, ny) in [(x + 1, y), (x, y + 1)] {
                    if let Some(other) = cells.try_get(nx, ny) {
                        pairs += 1;
                        if other == cell {
                            same += 1;
                        }
                    }
                }
            }
        }
        let ratio = same as f64 / pairs as f64;
        assert!(ratio > 0.35, "neighbour agreement only {:.2}", ratio);
    }

    #[test]
    fn test_maps_use_several_biomes() {
        let grid = gen(80, 24, 77);
        let mut seen: Vec<Terrain> = grid.cells().iter().filter_map(|(_, _, c)| c.terrain()).collect();
        seen.sort();
        seen.dedup();
        assert!(seen.len() >= 3, "only saw {:?}", seen);
    }

    proptest! {
        #[test]
        fn prop_full_coverage(width in 1usize..40, height in 1usize..40, seed in any::<u64>()) {
            let grid = gen(width, height, seed);
            prop_assert!(grid.is_fully_painted());
            prop_assert_eq!(grid.cells().len(), width * height);
        }
    }
}
