use std::collections::VecDeque;

use crate::grid::{Grid, TileCoord};

// Expansion order is part of the determinism contract: +x, -x, +y, -y.
const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Breadth-first shortest path over 4-connected walkable tiles.
///
/// Returns the steps after `start` up to and including `goal`. An empty result
/// means "no route": start == goal, either end is solid or out of bounds, the
/// goal is unreachable, or `max_visited` nodes were expanded first.
pub fn shortest_path(
    grid: &Grid,
    start: TileCoord,
    goal: TileCoord,
    max_visited: usize,
) -> Vec<TileCoord> {
    let (Some(start_index), Some(goal_index)) = (grid.index_of(start), grid.index_of(goal)) else {
        return Vec::new();
    };
    if grid.is_solid(start) || grid.is_solid(goal) || start == goal {
        return Vec::new();
    }

    let node_count = grid.width() as usize * grid.height() as usize;
    let mut discovered = vec![false; node_count];
    let mut parent = vec![None::<usize>; node_count];
    let mut open = VecDeque::new();
    open.push_back(start_index);
    discovered[start_index] = true;

    let mut visited = 0usize;
    while let Some(current_index) = open.pop_front() {
        if visited >= max_visited {
            break;
        }
        visited = visited.saturating_add(1);

        let current = grid.coord_of(current_index);
        for (dx, dy) in NEIGHBOR_OFFSETS {
            let neighbor = TileCoord::new(current.x + dx, current.y + dy);
            let Some(neighbor_index) = grid.index_of(neighbor) else {
                continue;
            };
            if discovered[neighbor_index] || grid.is_solid(neighbor) {
                continue;
            }
            discovered[neighbor_index] = true;
            parent[neighbor_index] = Some(current_index);
            if neighbor_index == goal_index {
                return reconstruct_tile_path(grid, &parent, start_index, goal_index);
            }
            open.push_back(neighbor_index);
        }
    }

    Vec::new()
}

fn reconstruct_tile_path(
    grid: &Grid,
    parent: &[Option<usize>],
    start_index: usize,
    goal_index: usize,
) -> Vec<TileCoord> {
    let mut cursor = goal_index;
    let mut indices = Vec::new();

    while cursor != start_index {
        indices.push(cursor);
        match parent.get(cursor).copied().flatten() {
            Some(next) => cursor = next,
            None => return Vec::new(),
        }
    }
    indices.reverse();
    indices
        .into_iter()
        .map(|index| grid.coord_of(index))
        .collect()
}
