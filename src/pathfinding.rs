//! Neighbour queries, distances and A* search over a [`Grid`].

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::error::MapResult;
use crate::grid::{Grid, TileCoord};

/// Every in-bounds coordinate within a square of `radius` around `center`,
/// excluding the center itself. With `filter_passable`, impassable cells are
/// left out; unpainted cells count as passable.
pub fn neighbors(grid: &Grid, center: TileCoord, radius: usize, filter_passable: bool) -> HashSet<TileCoord> {
    let r = radius as i64;
    let mut result = HashSet::new();

    for dy in -r..=r {
        for dx in -r..=r {
            if dx == 0 && dy == 0 {
                continue;
            }
            let Some(coord) = center.offset(dx, dy) else {
                continue;
            };
            if !grid.in_bounds(coord) {
                continue;
            }
            if filter_passable && !grid.is_passable(coord.x, coord.y) {
                continue;
            }
            result.insert(coord);
        }
    }

    result
}

/// Euclidean distance between two cells, rounded up when `round_up` is set.
pub fn distance(a: TileCoord, b: TileCoord, round_up: bool) -> f64 {
    let dx = b.x as f64 - a.x as f64;
    let dy = b.y as f64 - a.y as f64;
    let d = (dx * dx + dy * dy).sqrt();
    if round_up {
        d.ceil()
    } else {
        d
    }
}

/// Frontier entry. The heap pops the lowest f-score first, and among equal
/// scores the lowest row, then the lowest column.
#[derive(Clone, Copy, Debug)]
struct OpenNode {
    f: f64,
    coord: TileCoord,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other.f.total_cmp(&self.f)
            .then_with(|| other.coord.y.cmp(&self.coord.y))
            .then_with(|| other.coord.x.cmp(&self.coord.x))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

/// A* search from `start` to `goal` over 8-connected cells.
///
/// Returns the path including both endpoints, or `Ok(None)` when the goal
/// cannot be reached. Endpoints outside the grid are rejected before any
/// searching happens.
///
/// Steps cost their exact Euclidean length. The heuristic is the rounded-up
/// straight-line distance to the goal, computed once when a cell is first
/// discovered.
pub fn find_path(
    start: TileCoord,
    goal: TileCoord,
    grid: &Grid,
    filter_passable: bool,
) -> MapResult<Option<Vec<TileCoord>>> {
    grid.check_bounds(start)?;
    grid.check_bounds(goal)?;

    let mut open = BinaryHeap::new();
    let mut closed: HashSet<TileCoord> = HashSet::new();
    let mut came_from: HashMap<TileCoord, TileCoord> = HashMap::new();
    let mut g_score: HashMap<TileCoord, f64> = HashMap::new();
    let mut h_score: HashMap<TileCoord, f64> = HashMap::new();

    let h_start = distance(start, goal, true);
    g_score.insert(start, 0.0);
    h_score.insert(start, h_start);
    open.push(OpenNode { f: h_start, coord: start });

    while let Some(OpenNode { coord: current, .. }) = open.pop() {
        // Improved scores push duplicates; only the first pop counts.
        if !closed.insert(current) {
            continue;
        }

        if current == goal {
            return Ok(Some(reconstruct_path(&came_from, goal)));
        }

        let current_g = g_score[&current];

        let mut candidates: Vec<TileCoord> = neighbors(grid, current, 1, filter_passable)
            .into_iter()
            .filter(|n| !closed.contains(n))
            .collect();
        candidates.sort_by_key(|c| (c.y, c.x));

        for neighbor in candidates {
            let tentative_g = current_g + distance(current, neighbor, false);

            let is_better = match g_score.get(&neighbor) {
                None => {
                    h_score.insert(neighbor, distance(neighbor, goal, true));
                    true
                }
                Some(&known) => tentative_g < known,
            };

            if is_better {
                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative_g);
                open.push(OpenNode {
                    f: tentative_g + h_score[&neighbor],
                    coord: neighbor,
                });
            }
        }
    }

    Ok(None)
}

fn reconstruct_path(came_from: &HashMap<TileCoord, TileCoord>, goal: TileCoord) -> Vec<TileCoord> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Closest cell to `from` (by square ring) that a physical entity could be
/// placed on: passable and unoccupied. Rings are scanned row by row.
pub fn nearest_open_cell(grid: &Grid, from: TileCoord) -> Option<TileCoord> {
    if grid.is_empty() {
        return None;
    }
    let is_open = |c: TileCoord| grid.is_passable(c.x, c.y) && grid.occupant_at(c).is_none();

    if grid.in_bounds(from) && is_open(from) {
        return Some(from);
    }

    let max_radius = grid.width().max(grid.height());
    for radius in 1..=max_radius {
        let r = radius as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx.abs() != r && dy.abs() != r {
                    continue;
                }
                if let Some(c) = from.offset(dx, dy) {
                    if grid.in_bounds(c) && is_open(c) {
                        return Some(c);
                    }
                }
            }
        }
    }
    None
}
