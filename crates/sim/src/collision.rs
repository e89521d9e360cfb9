use crate::grid::{Grid, TileCoord};
use crate::math::{clamp, Vec2};

const LOS_SAMPLE_SPACING_PX: f32 = 10.0;
const LOS_MIN_STEPS: u32 = 8;
const LOS_MIN_DISTANCE: f32 = 1e-4;

/// Tiles under the bounding box of a circle, clipped to the grid.
pub fn nearby_tiles(grid: &Grid, center: Vec2, radius: f32) -> Vec<TileCoord> {
    let tile = grid.tile_size();
    let max_x = grid.width() as i32 - 1;
    let max_y = grid.height() as i32 - 1;
    let min_tx = (((center.x - radius) / tile).floor() as i32).max(0);
    let max_tx = (((center.x + radius) / tile).floor() as i32).min(max_x);
    let min_ty = (((center.y - radius) / tile).floor() as i32).max(0);
    let max_ty = (((center.y + radius) / tile).floor() as i32).min(max_y);

    let mut out = Vec::new();
    for ty in min_ty..=max_ty {
        for tx in min_tx..=max_tx {
            out.push(TileCoord::new(tx, ty));
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

pub fn tile_rect(grid: &Grid, coord: TileCoord) -> TileRect {
    let size = grid.tile_size();
    let left = coord.x as f32 * size;
    let top = coord.y as f32 * size;
    TileRect {
        left,
        top,
        right: left + size,
        bottom: top + size,
    }
}

/// Closest-point test. Always false for walkable tiles; touching counts as overlap.
pub fn circle_intersects_tile(grid: &Grid, center: Vec2, radius: f32, coord: TileCoord) -> bool {
    if !grid.is_solid(coord) {
        return false;
    }
    let rect = tile_rect(grid, coord);
    let closest = Vec2::new(
        clamp(center.x, rect.left, rect.right),
        clamp(center.y, rect.top, rect.bottom),
    );
    center.distance_squared(closest) <= radius * radius
}

pub fn circle_hits_solid(grid: &Grid, center: Vec2, radius: f32) -> bool {
    nearby_tiles(grid, center, radius)
        .into_iter()
        .any(|coord| circle_intersects_tile(grid, center, radius, coord))
}

/// Sampled ray march between two points, one sample per 10 px with at least 8 steps.
///
/// Not exact: a segment that only clips the corner of a wall tile between two
/// samples is reported visible, so treat the result as a gameplay heuristic.
pub fn line_of_sight(grid: &Grid, from: Vec2, to: Vec2) -> bool {
    let delta = to - from;
    let distance = delta.length();
    if distance < LOS_MIN_DISTANCE {
        return true;
    }

    let steps = ((distance / LOS_SAMPLE_SPACING_PX) as u32).max(LOS_MIN_STEPS);
    let step = delta * (1.0 / steps as f32);
    let mut sample = from;
    for _ in 0..=steps {
        let coord = grid.tile_at_px(sample);
        if grid.in_bounds(coord) && grid.is_solid(coord) {
            return false;
        }
        sample += step;
    }
    true
}
