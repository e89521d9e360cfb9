use std::collections::BTreeSet;

use babuland_sim::{BulletOwner, PickupKind, SimEvent, Simulation, TileCoord, ViewMode};
use serde::{Deserialize, Serialize};

const IDLE_SPEED_PX_PER_SECOND: f32 = 8.0;
const THREAT_RADIUS_PX: f32 = 210.0;
const MAX_SKILL: f32 = 99.0;

/// Aggregates session telemetry from drained events and per-frame reads of
/// the simulation. Time only advances while the simulation is ticking.
#[derive(Debug, Default)]
pub(crate) struct SessionStats {
    seconds: f32,
    top_view_seconds: f32,
    side_view_seconds: f32,
    idle_seconds: f32,
    threat_seconds: f32,

    player_shots: u32,
    player_hits: u32,
    enemy_shots: u32,
    enemy_hits: u32,
    candies: u32,
    gems: u32,
    bumps: u32,
    deaths: u32,
    escapes: u32,
    restarts: u32,
    hole_triggers: u32,
    view_switches: u32,
    rotations: u32,
    actions: u32,

    distance: f32,
    first_gem_seconds: Option<f32>,
    first_switch_seconds: Option<f32>,

    threatened: bool,
    threat_started_at: f32,
    reaction_sum: f32,
    reactions: u32,

    round: Option<u32>,
    round_walkable: usize,
    visited: BTreeSet<TileCoord>,
    visited_previous_rounds: usize,
    walkable_previous_rounds: usize,
    last_tick: u64,
    last_distance: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct SessionSummary {
    pub(crate) player_name: String,
    pub(crate) seed: u64,
    pub(crate) rounds_played: u32,
    pub(crate) score: u32,
    pub(crate) best_score: u32,
    pub(crate) final_hp: u32,
    pub(crate) seconds: f32,
    pub(crate) top_view_seconds: f32,
    pub(crate) side_view_seconds: f32,
    pub(crate) player_shots: u32,
    pub(crate) player_hits: u32,
    pub(crate) enemy_shots: u32,
    pub(crate) enemy_hits: u32,
    pub(crate) candies: u32,
    pub(crate) gems: u32,
    pub(crate) wall_bumps: u32,
    pub(crate) deaths: u32,
    pub(crate) escapes: u32,
    pub(crate) restarts: u32,
    pub(crate) hole_triggers: u32,
    pub(crate) view_switches: u32,
    pub(crate) rotations: u32,
    pub(crate) distance_px: f32,
    pub(crate) idle_seconds: f32,
    pub(crate) threat_seconds: f32,
    pub(crate) unique_tiles_visited: usize,
    pub(crate) walkable_tiles: usize,
    pub(crate) time_to_first_gem: Option<f32>,
    pub(crate) time_to_first_switch: Option<f32>,
    pub(crate) reaction_avg_seconds: f32,
    pub(crate) accuracy: f32,
    pub(crate) enemy_accuracy: f32,
    pub(crate) exploration: f32,
    pub(crate) actions_per_minute: f32,
    pub(crate) skill: u32,
}

impl SessionStats {
    pub(crate) fn record_events(&mut self, events: &[SimEvent]) {
        for event in events {
            match *event {
                SimEvent::ShotFired {
                    owner: BulletOwner::Player,
                } => {
                    self.player_shots += 1;
                    self.actions += 1;
                }
                SimEvent::ShotFired {
                    owner: BulletOwner::Enemy,
                } => self.enemy_shots += 1,
                SimEvent::EnemyDefeated { .. } => {
                    self.player_hits += 1;
                    self.record_reaction();
                }
                SimEvent::PlayerHit { .. } => {
                    self.enemy_hits += 1;
                    self.actions += 1;
                }
                SimEvent::PickupCollected { pickup } => {
                    match pickup {
                        PickupKind::Candy => self.candies += 1,
                        PickupKind::Gem => {
                            self.gems += 1;
                            self.first_gem_seconds.get_or_insert(self.seconds);
                        }
                    }
                    self.record_reaction();
                }
                // Holes are the only source of view toggles.
                SimEvent::ViewToggled { .. } => {
                    self.hole_triggers += 1;
                    self.view_switches += 1;
                    self.first_switch_seconds.get_or_insert(self.seconds);
                    self.record_reaction();
                }
                SimEvent::ViewRotated { .. } => {
                    self.rotations += 1;
                    self.record_reaction();
                }
                SimEvent::WallBump => self.bumps += 1,
                SimEvent::PlayerDied => self.deaths += 1,
                SimEvent::ExitReached => self.escapes += 1,
                SimEvent::Restarted { .. } => self.restarts += 1,
                SimEvent::ExitOpened => {}
            }
        }
    }

    fn record_reaction(&mut self) {
        self.actions += 1;
        if self.threatened {
            self.reaction_sum += (self.seconds - self.threat_started_at).max(0.0);
            self.reactions += 1;
            self.threatened = false;
        }
    }

    /// Samples the simulation after a batch of ticks. `fixed_dt` converts the
    /// number of ticks run since the last sample into simulated seconds.
    pub(crate) fn record_frame(&mut self, simulation: &Simulation, fixed_dt: f32) {
        if self.round != Some(simulation.round()) {
            self.visited_previous_rounds += self.visited.len();
            self.walkable_previous_rounds += self.round_walkable;
            self.visited.clear();
            self.round = Some(simulation.round());
            self.round_walkable = simulation.world().walkable_count();
            self.threatened = false;
        }

        let tick = simulation.tick_count();
        let ticks = tick.saturating_sub(self.last_tick);
        self.last_tick = tick;
        let distance = simulation.distance_travelled();
        let moved = (distance - self.last_distance).max(0.0);
        self.last_distance = distance;
        if ticks == 0 {
            return;
        }

        let dt = ticks as f32 * fixed_dt;
        self.seconds += dt;
        self.distance += moved;
        if moved / dt < IDLE_SPEED_PX_PER_SECOND {
            self.idle_seconds += dt;
        }
        match simulation.view().mode {
            ViewMode::Top => self.top_view_seconds += dt,
            ViewMode::Side => self.side_view_seconds += dt,
        }

        let player = simulation.player_state();
        let in_threat = simulation
            .enemy_states()
            .iter()
            .any(|enemy| enemy.position.distance(player.position) <= THREAT_RADIUS_PX);
        if in_threat {
            self.threat_seconds += dt;
            if !self.threatened {
                self.threatened = true;
                self.threat_started_at = self.seconds;
            }
        } else {
            self.threatened = false;
        }

        self.visited
            .insert(simulation.grid().tile_at_px(player.position));
    }

    pub(crate) fn finish(
        &self,
        simulation: &Simulation,
        player_name: &str,
        seed: u64,
    ) -> SessionSummary {
        let current_walkable = match self.round {
            Some(round) if round == simulation.round() => self.round_walkable,
            _ => simulation.world().walkable_count(),
        };
        let walkable_tiles = self.walkable_previous_rounds + current_walkable;
        let unique_tiles_visited = self.visited_previous_rounds + self.visited.len();
        let accuracy = ratio(self.player_hits as f32, self.player_shots as f32);
        let exploration = ratio(unique_tiles_visited as f32, walkable_tiles as f32).min(1.0);
        let threat_ratio = ratio(self.threat_seconds, self.seconds);
        let player = simulation.player_state();
        let scoreboard = simulation.scoreboard();
        let minutes = self.seconds / 60.0;

        SessionSummary {
            player_name: player_name.to_string(),
            seed,
            rounds_played: simulation.round() + 1,
            score: scoreboard.score(),
            best_score: scoreboard.best(),
            final_hp: player.hp,
            seconds: self.seconds,
            top_view_seconds: self.top_view_seconds,
            side_view_seconds: self.side_view_seconds,
            player_shots: self.player_shots,
            player_hits: self.player_hits,
            enemy_shots: self.enemy_shots,
            enemy_hits: self.enemy_hits,
            candies: self.candies,
            gems: self.gems,
            wall_bumps: self.bumps,
            deaths: self.deaths,
            escapes: self.escapes,
            restarts: self.restarts,
            hole_triggers: self.hole_triggers,
            view_switches: self.view_switches,
            rotations: self.rotations,
            distance_px: self.distance,
            idle_seconds: self.idle_seconds,
            threat_seconds: self.threat_seconds,
            unique_tiles_visited,
            walkable_tiles,
            time_to_first_gem: self.first_gem_seconds,
            time_to_first_switch: self.first_switch_seconds,
            reaction_avg_seconds: ratio(self.reaction_sum, self.reactions as f32),
            accuracy,
            enemy_accuracy: ratio(self.enemy_hits as f32, self.enemy_shots as f32),
            exploration,
            actions_per_minute: ratio(self.actions as f32, minutes),
            skill: skill_score(
                accuracy,
                exploration,
                player.hp,
                simulation.config().initial_hp,
                threat_ratio,
            ),
        }
    }
}

fn ratio(numerator: f32, denominator: f32) -> f32 {
    if denominator <= f32::EPSILON {
        0.0
    } else {
        numerator / denominator
    }
}

/// 0..=99 blend of accuracy, exploration, remaining health and time spent
/// outside enemy reach.
pub(crate) fn skill_score(
    accuracy: f32,
    exploration: f32,
    hp: u32,
    initial_hp: u32,
    threat_ratio: f32,
) -> u32 {
    let health = ratio(hp as f32, initial_hp as f32);
    let skill = accuracy * 55.0
        + exploration * 35.0
        + health * 20.0
        + (1.0 - threat_ratio.min(1.0)) * 10.0;
    skill.round().clamp(0.0, MAX_SKILL) as u32
}
