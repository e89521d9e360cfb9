use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::grid::{Grid, Tile, TileCoord};
use crate::math::Vec2;
use crate::nav::shortest_path;

/// Tiles kept clear of the border ring when sampling interior positions.
const INTERIOR_MARGIN: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    Candy,
    Gem,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub kind: PickupKind,
    pub position: Vec2,
    pub collected: bool,
}

impl Pickup {
    pub fn new(kind: PickupKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            collected: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    pub position: Vec2,
}

#[derive(Debug, Clone)]
pub struct World {
    grid: Grid,
    rng: StdRng,
    seed: u64,
    start: TileCoord,
    exit: TileCoord,
    used_fallback_endpoints: bool,
    pickups: Vec<Pickup>,
    holes: Vec<Hole>,
}

impl World {
    /// Wraps an existing grid without running generation. Start and exit are
    /// taken as given.
    pub fn from_grid(grid: Grid, start: TileCoord, exit: TileCoord, seed: u64) -> Self {
        Self {
            grid,
            rng: StdRng::seed_from_u64(seed),
            seed,
            start,
            exit,
            used_fallback_endpoints: false,
            pickups: Vec::new(),
            holes: Vec::new(),
        }
    }

    pub fn with_pickups(mut self, pickups: Vec<Pickup>) -> Self {
        self.pickups = pickups;
        self
    }

    pub fn with_holes(mut self, holes: Vec<Hole>) -> Self {
        self.holes = holes;
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn start_tile(&self) -> TileCoord {
        self.start
    }

    pub fn exit_tile(&self) -> TileCoord {
        self.exit
    }

    pub fn start_px(&self) -> Vec2 {
        self.grid.tile_center(self.start)
    }

    pub fn exit_px(&self) -> Vec2 {
        self.grid.tile_center(self.exit)
    }

    pub fn used_fallback_endpoints(&self) -> bool {
        self.used_fallback_endpoints
    }

    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    pub(crate) fn pickups_mut(&mut self) -> &mut [Pickup] {
        &mut self.pickups
    }

    pub fn holes(&self) -> &[Hole] {
        &self.holes
    }

    pub fn gem_count(&self) -> usize {
        self.pickups
            .iter()
            .filter(|pickup| pickup.kind == PickupKind::Gem)
            .count()
    }

    pub fn walkable_count(&self) -> usize {
        self.grid.walkable_count()
    }

    /// Uniform tile in the interior band `2..size-2` on both axes.
    pub(crate) fn sample_interior_tile(&mut self) -> TileCoord {
        let width = self.grid.width() as i32;
        let height = self.grid.height() as i32;
        sample_interior(&mut self.rng, width, height)
    }
}

fn sample_interior(rng: &mut StdRng, width: i32, height: i32) -> TileCoord {
    let x = rng.gen_range(INTERIOR_MARGIN..(width - INTERIOR_MARGIN).max(INTERIOR_MARGIN + 1));
    let y = rng.gen_range(INTERIOR_MARGIN..(height - INTERIOR_MARGIN).max(INTERIOR_MARGIN + 1));
    TileCoord::new(x, y)
}

/// Builds a world for `seed`. Total: every retry loop is capped and falls back
/// deterministically, so this never fails and never hangs.
pub fn generate(seed: u64, config: &SimConfig) -> World {
    let width = config.world_width;
    let height = config.world_height;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut grid = Grid::filled(width, height, config.tile_size, Tile::Floor);

    stamp_border(&mut grid);
    stamp_wall_clusters(&mut grid, &mut rng, config);
    carve_corridors(&mut grid, &mut rng, config);
    debug!(seed, walkable = grid.walkable_count(), "maze_carved");

    let (start, exit, used_fallback_endpoints) = choose_endpoints(&mut grid, &mut rng, config);
    if used_fallback_endpoints {
        warn!(seed, start = ?start, exit = ?exit, "endpoint_fallback_used");
    }

    let mut world = World {
        grid,
        rng,
        seed,
        start,
        exit,
        used_fallback_endpoints,
        pickups: Vec::new(),
        holes: Vec::new(),
    };

    place_pickups(&mut world, PickupKind::Candy, config.candy_count, config);
    place_pickups(&mut world, PickupKind::Gem, config.gem_count, config);
    place_holes(&mut world, config.hole_count, config);

    info!(
        seed,
        start = ?world.start,
        exit = ?world.exit,
        pickups = world.pickups.len(),
        gems = world.gem_count(),
        holes = world.holes.len(),
        walkable = world.walkable_count(),
        "world_generated"
    );
    world
}

fn stamp_border(grid: &mut Grid) {
    let width = grid.width() as i32;
    let height = grid.height() as i32;
    for x in 0..width {
        grid.set(TileCoord::new(x, 0), Tile::Wall);
        grid.set(TileCoord::new(x, height - 1), Tile::Wall);
    }
    for y in 0..height {
        grid.set(TileCoord::new(0, y), Tile::Wall);
        grid.set(TileCoord::new(width - 1, y), Tile::Wall);
    }
}

fn stamp_wall_clusters(grid: &mut Grid, rng: &mut StdRng, config: &SimConfig) {
    let width = grid.width() as i32;
    let height = grid.height() as i32;
    let max_size = config.wall_cluster_max_size.max(1) as i32;
    for _ in 0..config.wall_cluster_count {
        let origin = sample_interior(rng, width, height);
        let cluster_w = rng.gen_range(1..=max_size);
        let cluster_h = rng.gen_range(1..=max_size);
        for y in origin.y..(origin.y + cluster_h).min(height - 1) {
            for x in origin.x..(origin.x + cluster_w).min(width - 1) {
                if rng.gen::<f32>() < config.wall_cluster_fill_probability {
                    grid.set(TileCoord::new(x, y), Tile::Wall);
                }
            }
        }
    }
}

fn carve_corridors(grid: &mut Grid, rng: &mut StdRng, config: &SimConfig) {
    let width = grid.width() as i32;
    let height = grid.height() as i32;

    for _ in 0..config.horizontal_corridors {
        let y = rng.gen_range(3..(height - 3).max(4));
        for x in INTERIOR_MARGIN..width - INTERIOR_MARGIN {
            if rng.gen::<f32>() < config.corridor_open_probability {
                grid.set(TileCoord::new(x, y), Tile::Floor);
            }
        }
    }
    for _ in 0..config.vertical_corridors {
        let x = rng.gen_range(3..(width - 3).max(4));
        for y in INTERIOR_MARGIN..height - INTERIOR_MARGIN {
            if rng.gen::<f32>() < config.corridor_open_probability {
                grid.set(TileCoord::new(x, y), Tile::Floor);
            }
        }
    }
}

fn choose_endpoints(
    grid: &mut Grid,
    rng: &mut StdRng,
    config: &SimConfig,
) -> (TileCoord, TileCoord, bool) {
    let width = grid.width() as i32;
    let height = grid.height() as i32;
    let min_distance = (grid.width() + grid.height()) / 2;

    for attempt in 0..config.endpoint_attempts {
        let a = sample_interior(rng, width, height);
        let b = sample_interior(rng, width, height);
        if grid.is_solid(a) || grid.is_solid(b) {
            continue;
        }
        if a.manhattan(b) < min_distance {
            continue;
        }
        if !shortest_path(grid, a, b, config.endpoint_path_visit_cap).is_empty() {
            debug!(attempt, start = ?a, exit = ?b, "endpoints_selected");
            return (a, b, false);
        }
    }

    let start = TileCoord::new(INTERIOR_MARGIN, INTERIOR_MARGIN);
    let exit = TileCoord::new(width - 1 - INTERIOR_MARGIN, height - 1 - INTERIOR_MARGIN);
    carve_fallback_route(grid, start, exit);
    (start, exit, true)
}

// L-shaped route along the start row then the exit column; stays inside the border.
fn carve_fallback_route(grid: &mut Grid, start: TileCoord, exit: TileCoord) {
    let (x0, x1) = (start.x.min(exit.x), start.x.max(exit.x));
    for x in x0..=x1 {
        grid.set(TileCoord::new(x, start.y), Tile::Floor);
    }
    let (y0, y1) = (start.y.min(exit.y), start.y.max(exit.y));
    for y in y0..=y1 {
        grid.set(TileCoord::new(exit.x, y), Tile::Floor);
    }
}

fn place_pickups(world: &mut World, kind: PickupKind, count: u32, config: &SimConfig) {
    let spacing = config.tile_size * config.pickup_spacing_tiles;
    let min_endpoint = config.pickup_min_endpoint_distance;
    let mut placed = 0u32;
    let mut iterations = 0u32;

    while placed < count && iterations < config.placement_iteration_cap {
        iterations += 1;
        let Some(position) = sample_placement(world, min_endpoint) else {
            continue;
        };
        let too_close = world
            .pickups
            .iter()
            .any(|pickup| pickup.position.distance_squared(position) < spacing * spacing);
        if too_close {
            continue;
        }
        world.pickups.push(Pickup::new(kind, position));
        placed += 1;
    }

    if placed < count {
        warn!(?kind, requested = count, placed, "pickup_placement_underfilled");
    }
}

fn place_holes(world: &mut World, count: u32, config: &SimConfig) {
    let spacing = config.tile_size * config.hole_spacing_tiles;
    let min_endpoint = config.hole_min_endpoint_distance;
    let mut placed = 0u32;
    let mut iterations = 0u32;

    while placed < count && iterations < config.placement_iteration_cap {
        iterations += 1;
        let Some(position) = sample_placement(world, min_endpoint) else {
            continue;
        };
        let too_close = world
            .holes
            .iter()
            .any(|hole| hole.position.distance_squared(position) < spacing * spacing);
        if too_close {
            continue;
        }
        world.holes.push(Hole { position });
        placed += 1;
    }

    if placed < count {
        warn!(requested = count, placed, "hole_placement_underfilled");
    }
}

fn sample_placement(world: &mut World, min_endpoint_distance: u32) -> Option<Vec2> {
    let tile = world.sample_interior_tile();
    if world.grid.is_solid(tile)
        || tile.manhattan(world.start) < min_endpoint_distance
        || tile.manhattan(world.exit) < min_endpoint_distance
    {
        return None;
    }
    Some(world.grid.tile_center(tile))
}
