mod types;

#[cfg(test)]
mod tests;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::ai::{self, EnemyMode};
use crate::config::{ConfigError, SimConfig};
use crate::entities::{BulletOwner, Enemy, Player};
use crate::events::{EventBus, SimEvent};
use crate::fixed_step::FixedStepTarget;
use crate::grid::Grid;
use crate::input::Intent;
use crate::math::Vec2;
use crate::projectiles::ProjectileSystem;
use crate::world::{self, Hole, PickupKind, World};

pub use types::{
    BulletState, EnemyState, HoleState, PickupState, PlayerState, Scoreboard, SessionStatus,
    SimSnapshot, ViewMode, ViewState,
};

const ENEMY_REPLAN_JITTER_SECONDS: f32 = 0.4;
const ENEMY_SHOOT_JITTER_SECONDS: f32 = 0.6;

/// Owns one play session: the current round's world and entities plus the
/// state that survives restarts (score, round counter).
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    base_seed: u64,
    round: u32,
    world: World,
    player: Player,
    enemies: Vec<Enemy>,
    projectiles: ProjectileSystem,
    events: EventBus,
    scoreboard: Scoreboard,
    view: ViewState,
    status: SessionStatus,
    intent: Intent,
    exit_open: bool,
    gems_collected: u32,
    gems_required: u32,
    hole_cooldown: f32,
    tick: u64,
    round_seconds: f32,
    distance_travelled: f32,
    crowd: Vec<Vec2>,
}

impl Simulation {
    pub fn new(config: SimConfig, seed: u64, scoreboard: Scoreboard) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut world = world::generate(seed, &config);
        let enemies = spawn_enemies(&mut world, &config);
        Ok(Self::assemble(config, seed, 0, world, enemies, scoreboard))
    }

    /// Starts round 0 on a prebuilt world. Later rounds are generated from
    /// the world's seed like any other session.
    pub fn from_world(
        config: SimConfig,
        world: World,
        enemies: Vec<Enemy>,
        scoreboard: Scoreboard,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = world.seed();
        Ok(Self::assemble(config, seed, 0, world, enemies, scoreboard))
    }

    fn assemble(
        config: SimConfig,
        base_seed: u64,
        round: u32,
        world: World,
        enemies: Vec<Enemy>,
        scoreboard: Scoreboard,
    ) -> Self {
        let mut simulation = Self {
            player: Player::new(world.start_px(), config.player_radius, config.initial_hp),
            config,
            base_seed,
            round,
            world,
            enemies,
            projectiles: ProjectileSystem::default(),
            events: EventBus::default(),
            scoreboard,
            view: ViewState::default(),
            status: SessionStatus::Playing,
            intent: Intent::idle(),
            exit_open: false,
            gems_collected: 0,
            gems_required: 0,
            hole_cooldown: 0.0,
            tick: 0,
            round_seconds: 0.0,
            distance_travelled: 0.0,
            crowd: Vec::new(),
        };
        simulation.reset_round_progress();
        simulation
    }

    fn reset_round_progress(&mut self) {
        let gems_placed = u32::try_from(self.world.gem_count()).unwrap_or(u32::MAX);
        self.gems_required = self.config.gems_to_open_exit.min(gems_placed);
        self.gems_collected = 0;
        self.exit_open = self.gems_required == 0;
        self.hole_cooldown = 0.0;
        self.round_seconds = 0.0;
        self.status = SessionStatus::Playing;
        self.view = ViewState::default();
        self.projectiles.clear();
        info!(
            round = self.round,
            seed = self.world.seed(),
            enemies = self.enemies.len(),
            gems_required = self.gems_required,
            exit_open = self.exit_open,
            "round_started"
        );
    }

    /// Discards the current world and entities and builds the next round from
    /// `base_seed + round`. Score and distance carry over.
    pub fn restart(&mut self) {
        self.round = self.round.saturating_add(1);
        let seed = self.round_seed();
        let mut world = world::generate(seed, &self.config);
        self.enemies = spawn_enemies(&mut world, &self.config);
        self.player = Player::new(
            world.start_px(),
            self.config.player_radius,
            self.config.initial_hp,
        );
        self.world = world;
        self.reset_round_progress();
        self.events.emit(SimEvent::Restarted {
            round: self.round,
            seed,
        });
    }

    fn round_seed(&self) -> u64 {
        self.base_seed.wrapping_add(u64::from(self.round))
    }

    pub fn apply_intent(&mut self, intent: Intent) {
        self.intent = intent;
    }

    /// Advances one fixed tick using the intent applied since the last step.
    pub fn step(&mut self, dt: f32) {
        let intent = std::mem::take(&mut self.intent);
        if intent.restart {
            self.restart();
            self.events.finish_tick_rollover();
            return;
        }
        if self.status != SessionStatus::Playing {
            self.events.finish_tick_rollover();
            return;
        }

        self.tick = self.tick.saturating_add(1);
        self.round_seconds += dt;

        self.step_player(&intent, dt);
        self.step_player_fire(&intent);
        self.step_enemies(dt);
        self.step_projectiles(dt);
        self.step_pickups();
        self.step_holes();
        self.step_exit();
        self.step_death();

        self.events.finish_tick_rollover();
    }

    fn step_player(&mut self, intent: &Intent, dt: f32) {
        self.player.tick(dt);
        self.hole_cooldown = (self.hole_cooldown - dt).max(0.0);

        let outcome = self.player.steer(
            self.world.grid(),
            intent.movement,
            self.config.player_speed,
            dt,
        );
        self.distance_travelled += outcome.distance;
        if outcome.bumps() > 0 {
            self.events.emit(SimEvent::WallBump);
        }

        if intent.rotate_steps != 0 {
            let degrees = self
                .view
                .rotate(intent.rotate_steps.saturating_mul(self.config.rotation_step_degrees));
            self.events.emit(SimEvent::ViewRotated { degrees });
        }
    }

    fn step_player_fire(&mut self, intent: &Intent) {
        if !intent.fire || self.player.fire_cooldown > 0.0 {
            return;
        }
        let spawned = self.projectiles.spawn(
            self.player.position,
            self.player.aim,
            BulletOwner::Player,
            &self.config,
        );
        if spawned {
            self.player.fire_cooldown = self.config.player_fire_cooldown_seconds;
            self.events.emit(SimEvent::ShotFired {
                owner: BulletOwner::Player,
            });
        }
    }

    fn step_enemies(&mut self, dt: f32) {
        self.crowd.clear();
        self.crowd.extend(
            self.enemies
                .iter()
                .filter(|enemy| enemy.alive)
                .map(|enemy| enemy.position),
        );

        for enemy in self.enemies.iter_mut().filter(|enemy| enemy.alive) {
            enemy.tick(dt);
            let outcome = ai::think(
                enemy,
                &mut self.world,
                &self.player,
                &self.crowd,
                &self.config,
                dt,
            );
            let Some(shot) = outcome.shot else {
                continue;
            };
            if self.projectiles.spawn(
                shot.origin,
                shot.direction,
                BulletOwner::Enemy,
                &self.config,
            ) {
                self.events.emit(SimEvent::ShotFired {
                    owner: BulletOwner::Enemy,
                });
            }
        }
    }

    fn step_projectiles(&mut self, dt: f32) {
        let home = self.world.start_px();
        let report = self.projectiles.update(
            self.world.grid(),
            &mut self.player,
            &mut self.enemies,
            home,
            &self.config,
            dt,
            &mut self.events,
        );
        self.scoreboard
            .add(report.enemies_defeated.saturating_mul(self.config.enemy_score));
    }

    fn step_pickups(&mut self) {
        let reach = self.player.radius + self.config.pickup_radius_tiles * self.config.tile_size;
        let player_position = self.player.position;

        for pickup in self.world.pickups_mut() {
            if pickup.collected || pickup.position.distance(player_position) >= reach {
                continue;
            }
            pickup.collected = true;
            self.events.emit(SimEvent::PickupCollected {
                pickup: pickup.kind,
            });
            match pickup.kind {
                PickupKind::Candy => self.scoreboard.add(self.config.candy_score),
                PickupKind::Gem => {
                    self.scoreboard.add(self.config.gem_score);
                    self.player.has_gem = true;
                    self.gems_collected = self.gems_collected.saturating_add(1);
                }
            }
        }

        if !self.exit_open && self.gems_collected >= self.gems_required {
            self.exit_open = true;
            self.events.emit(SimEvent::ExitOpened);
            info!(
                round = self.round,
                gems_collected = self.gems_collected,
                "exit_opened"
            );
        }
    }

    fn step_holes(&mut self) {
        if self.hole_cooldown > 0.0 {
            return;
        }
        let reach = self.player.radius + self.config.hole_radius_tiles * self.config.tile_size;
        let on_hole = self
            .world
            .holes()
            .iter()
            .any(|hole| hole.position.distance(self.player.position) < reach);
        if !on_hole {
            return;
        }
        let mode = self.view.toggle();
        self.hole_cooldown = self.config.hole_cooldown_seconds;
        self.events.emit(SimEvent::ViewToggled { mode });
        debug!(?mode, "view_toggled");
    }

    fn step_exit(&mut self) {
        if !self.exit_open || !self.player.is_alive() {
            return;
        }
        let reach = self.player.radius + self.config.exit_radius_tiles * self.config.tile_size;
        if self.player.position.distance(self.world.exit_px()) >= reach {
            return;
        }
        self.status = SessionStatus::Escaped;
        self.events.emit(SimEvent::ExitReached);
        info!(
            round = self.round,
            score = self.scoreboard.score(),
            seconds = self.round_seconds,
            "exit_reached"
        );
    }

    fn step_death(&mut self) {
        if self.player.is_alive() || self.status != SessionStatus::Playing {
            return;
        }
        self.status = SessionStatus::Dead;
        self.events.emit(SimEvent::PlayerDied);
        info!(
            round = self.round,
            score = self.scoreboard.score(),
            seconds = self.round_seconds,
            "player_died"
        );
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn grid(&self) -> &Grid {
        self.world.grid()
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn seed(&self) -> u64 {
        self.world.seed()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn scoreboard(&self) -> Scoreboard {
        self.scoreboard
    }

    pub fn exit_open(&self) -> bool {
        self.exit_open
    }

    pub fn gems_collected(&self) -> u32 {
        self.gems_collected
    }

    pub fn gems_required(&self) -> u32 {
        self.gems_required
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn round_seconds(&self) -> f32 {
        self.round_seconds
    }

    /// Total distance the player has moved this session, across restarts.
    pub fn distance_travelled(&self) -> f32 {
        self.distance_travelled
    }

    pub fn player_state(&self) -> PlayerState {
        PlayerState {
            position: self.player.position,
            hp: self.player.hp,
            aim: self.player.aim,
            has_gem: self.player.has_gem,
            alive: self.player.is_alive(),
        }
    }

    pub fn enemy_states(&self) -> Vec<EnemyState> {
        self.enemies
            .iter()
            .enumerate()
            .filter(|(_, enemy)| enemy.alive)
            .map(|(index, enemy)| EnemyState {
                index,
                position: enemy.position,
                chasing: matches!(enemy.mode, EnemyMode::Chase),
            })
            .collect()
    }

    pub fn bullet_states(&self) -> Vec<BulletState> {
        self.projectiles
            .bullets()
            .iter()
            .map(|bullet| BulletState {
                position: bullet.position,
                owner: bullet.owner,
            })
            .collect()
    }

    pub fn pickup_states(&self) -> Vec<PickupState> {
        self.world
            .pickups()
            .iter()
            .map(|pickup| PickupState {
                kind: pickup.kind,
                position: pickup.position,
                collected: pickup.collected,
            })
            .collect()
    }

    pub fn hole_states(&self) -> Vec<HoleState> {
        self.world
            .holes()
            .iter()
            .map(|Hole { position }| HoleState {
                position: *position,
            })
            .collect()
    }

    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            tick: self.tick,
            round: self.round,
            seed: self.world.seed(),
            status: self.status,
            score: self.scoreboard.score(),
            best_score: self.scoreboard.best(),
            exit_open: self.exit_open,
            gems_collected: self.gems_collected,
            gems_required: self.gems_required,
            view: self.view,
            player: self.player_state(),
            enemies: self.enemy_states(),
            bullets: self.bullet_states(),
        }
    }
}

impl FixedStepTarget for Simulation {
    fn apply_intent(&mut self, intent: Intent) {
        Simulation::apply_intent(self, intent);
    }

    fn step(&mut self, dt: f32) {
        Simulation::step(self, dt);
    }
}

/// Draws the enemy count and spawn tiles from the world stream, keeping every
/// spawn at least `enemy_spawn_min_distance` tiles from the start.
fn spawn_enemies(world: &mut World, config: &SimConfig) -> Vec<Enemy> {
    let requested = world
        .rng_mut()
        .gen_range(config.enemy_count_min..=config.enemy_count_max);
    let start = world.start_tile();
    let mut enemies = Vec::with_capacity(requested as usize);
    let mut iterations = 0u32;

    while (enemies.len() as u32) < requested && iterations < config.placement_iteration_cap {
        iterations = iterations.saturating_add(1);
        let tile = world.sample_interior_tile();
        if !world.grid().is_walkable(tile) || tile.manhattan(start) < config.enemy_spawn_min_distance
        {
            continue;
        }
        let replan_timer = world.rng_mut().gen_range(0.0..ENEMY_REPLAN_JITTER_SECONDS);
        let shoot_timer = world.rng_mut().gen_range(0.0..ENEMY_SHOOT_JITTER_SECONDS);
        enemies.push(Enemy::new(
            world.grid().tile_center(tile),
            config.enemy_radius,
            replan_timer,
            shoot_timer,
        ));
    }

    if (enemies.len() as u32) < requested {
        warn!(requested, placed = enemies.len(), "enemy_spawn_underfilled");
    }
    enemies
}
