use std::collections::BTreeSet;

use babuland_sim::collision::line_of_sight;
use babuland_sim::{
    shortest_path, Intent, PickupKind, SessionStatus, Simulation, TileCoord, Vec2,
};
use tracing::debug;

const REPLAN_INTERVAL_TICKS: u32 = 45;
const STUCK_TICKS_BEFORE_REPLAN: u32 = 20;
const STUCK_EPSILON_PX: f32 = 0.25;
const WAYPOINT_THRESHOLD_TILES: f32 = 0.2;
const AIM_CONE_MIN_DOT: f32 = 0.9;

/// Scripted intent source for headless sessions: walks BFS routes to the
/// nearest gem, then to the exit, and shoots enemies it is already facing.
#[derive(Debug)]
pub(crate) struct Autopilot {
    max_rounds: u32,
    round: Option<u32>,
    goal: Option<TileCoord>,
    path: Vec<TileCoord>,
    cursor: usize,
    replan_in: u32,
    stuck_ticks: u32,
    last_position: Vec2,
    unreachable: BTreeSet<TileCoord>,
}

impl Autopilot {
    pub(crate) fn new(max_rounds: u32) -> Self {
        Self {
            max_rounds,
            round: None,
            goal: None,
            path: Vec::new(),
            cursor: 0,
            replan_in: 0,
            stuck_ticks: 0,
            last_position: Vec2::ZERO,
            unreachable: BTreeSet::new(),
        }
    }

    /// True once the final allowed round has ended.
    pub(crate) fn is_finished(&self, simulation: &Simulation) -> bool {
        simulation.status() != SessionStatus::Playing && !self.has_rounds_left(simulation)
    }

    fn has_rounds_left(&self, simulation: &Simulation) -> bool {
        simulation.round().saturating_add(1) < self.max_rounds
    }

    pub(crate) fn decide(&mut self, simulation: &Simulation) -> Intent {
        if simulation.status() != SessionStatus::Playing {
            return Intent {
                restart: self.has_rounds_left(simulation),
                ..Intent::idle()
            };
        }
        if self.round != Some(simulation.round()) {
            self.start_round(simulation);
        }

        let player = simulation.player_state();
        let grid = simulation.grid();
        let here = grid.tile_at_px(player.position);

        let goal = self.pick_goal(simulation, here);
        if goal != self.goal {
            self.goal = goal;
            self.replan_in = 0;
        }

        if player.position.distance(self.last_position) < STUCK_EPSILON_PX && !self.path.is_empty()
        {
            self.stuck_ticks += 1;
        } else {
            self.stuck_ticks = 0;
        }
        self.last_position = player.position;

        if self.replan_in == 0 || self.stuck_ticks >= STUCK_TICKS_BEFORE_REPLAN {
            self.replan(simulation, here);
        } else {
            self.replan_in -= 1;
        }

        Intent {
            movement: self.heading(simulation, here),
            fire: should_fire(simulation),
            ..Intent::idle()
        }
    }

    fn start_round(&mut self, simulation: &Simulation) {
        self.round = Some(simulation.round());
        self.goal = None;
        self.path.clear();
        self.cursor = 0;
        self.replan_in = 0;
        self.stuck_ticks = 0;
        self.last_position = simulation.player_state().position;
        self.unreachable.clear();
    }

    fn pick_goal(&self, simulation: &Simulation, here: TileCoord) -> Option<TileCoord> {
        let exit = simulation.world().exit_tile();
        if simulation.exit_open() {
            return Some(exit);
        }
        let grid = simulation.grid();
        simulation
            .world()
            .pickups()
            .iter()
            .filter(|pickup| !pickup.collected && pickup.kind == PickupKind::Gem)
            .map(|pickup| grid.tile_at_px(pickup.position))
            .filter(|tile| !self.unreachable.contains(tile))
            .min_by_key(|tile| (tile.manhattan(here), tile.y, tile.x))
    }

    fn replan(&mut self, simulation: &Simulation, here: TileCoord) {
        self.replan_in = REPLAN_INTERVAL_TICKS;
        self.stuck_ticks = 0;
        self.cursor = 0;
        self.path.clear();
        let Some(goal) = self.goal else {
            return;
        };
        if goal == here {
            return;
        }

        let grid = simulation.grid();
        let cap = grid.width() as usize * grid.height() as usize;
        self.path = shortest_path(grid, here, goal, cap);
        if self.path.is_empty() {
            debug!(goal = ?goal, "autopilot_goal_unreachable");
            self.unreachable.insert(goal);
            self.goal = None;
        }
    }

    fn heading(&mut self, simulation: &Simulation, here: TileCoord) -> Vec2 {
        let grid = simulation.grid();
        let position = simulation.player_state().position;
        let threshold = grid.tile_size() * WAYPOINT_THRESHOLD_TILES;

        while let Some(&waypoint) = self.path.get(self.cursor) {
            let offset = grid.tile_center(waypoint) - position;
            if offset.length() > threshold {
                return offset.normalized();
            }
            self.cursor += 1;
        }

        // Path done: settle onto the goal tile's center so triggers overlap.
        match self.goal {
            Some(goal) if goal == here => {
                let offset = grid.tile_center(goal) - position;
                if offset.length() > threshold {
                    offset.normalized()
                } else {
                    Vec2::ZERO
                }
            }
            _ => Vec2::ZERO,
        }
    }
}

fn should_fire(simulation: &Simulation) -> bool {
    let player = simulation.player_state();
    let range = simulation.config().shoot_range;
    simulation.enemy_states().iter().any(|enemy| {
        let offset = enemy.position - player.position;
        let distance = offset.length();
        distance < range
            && offset.normalized().dot(player.aim) >= AIM_CONE_MIN_DOT
            && line_of_sight(simulation.grid(), player.position, enemy.position)
    })
}
