use super::*;
use crate::grid::{Grid, TileCoord};
use crate::world::Pickup;

const DT: f32 = 1.0 / 60.0;

fn strip_grid() -> Grid {
    Grid::from_ascii(
        &[
            "##############",
            "#............#",
            "#............#",
            "#............#",
            "##############",
        ],
        28.0,
    )
}

fn strip_world() -> World {
    World::from_grid(strip_grid(), TileCoord::new(2, 2), TileCoord::new(12, 2), 7)
}

fn center(tile: (i32, i32)) -> Vec2 {
    strip_grid().tile_center(TileCoord::new(tile.0, tile.1))
}

fn idle_enemy(tile: (i32, i32)) -> Enemy {
    Enemy::new(center(tile), 11.0, 100.0, 100.0)
}

fn simulation_with(world: World, enemies: Vec<Enemy>, config: SimConfig) -> Simulation {
    Simulation::from_world(config, world, enemies, Scoreboard::new()).expect("simulation")
}

fn run(simulation: &mut Simulation, intent: Intent, ticks: usize) -> Vec<SimEvent> {
    for _ in 0..ticks {
        simulation.apply_intent(intent);
        simulation.step(DT);
    }
    simulation.drain_events()
}

fn count(events: &[SimEvent], wanted: fn(&SimEvent) -> bool) -> usize {
    events.iter().filter(|event| wanted(*event)).count()
}

#[test]
fn bullet_at_stationary_enemy_defeats_it_once() {
    let mut simulation = simulation_with(
        strip_world(),
        vec![idle_enemy((8, 2))],
        SimConfig::default(),
    );

    let mut events = run(
        &mut simulation,
        Intent {
            fire: true,
            ..Intent::idle()
        },
        1,
    );
    events.extend(run(&mut simulation, Intent::idle(), 60));

    assert_eq!(
        count(&events, |event| matches!(event, SimEvent::EnemyDefeated { .. })),
        1
    );
    assert_eq!(
        count(&events, |event| matches!(
            event,
            SimEvent::ShotFired {
                owner: BulletOwner::Player
            }
        )),
        1
    );
    assert!(simulation.bullet_states().is_empty());
    assert!(simulation.enemy_states().is_empty());
    assert_eq!(
        simulation.scoreboard().score(),
        SimConfig::default().enemy_score
    );
}

#[test]
fn fire_respects_cooldown() {
    let mut simulation = simulation_with(strip_world(), Vec::new(), SimConfig::default());
    let events = run(
        &mut simulation,
        Intent {
            fire: true,
            ..Intent::idle()
        },
        10,
    );
    // 0.16 s cooldown at 60 ticks per second allows shots on ticks 1 and 11 only.
    assert_eq!(
        count(&events, |event| matches!(event, SimEvent::ShotFired { .. })),
        1
    );
}

#[test]
fn standing_on_hole_toggles_once_per_cooldown_window() {
    let world = strip_world().with_holes(vec![Hole {
        position: center((2, 2)),
    }]);
    let mut simulation = simulation_with(world, Vec::new(), SimConfig::default());

    let first_half_second = run(&mut simulation, Intent::idle(), 30);
    assert_eq!(
        count(&first_half_second, |event| matches!(
            event,
            SimEvent::ViewToggled { .. }
        )),
        1
    );
    assert_eq!(simulation.view().mode, ViewMode::Side);

    let next_second = run(&mut simulation, Intent::idle(), 60);
    assert_eq!(
        count(&next_second, |event| matches!(event, SimEvent::ViewToggled { .. })),
        1
    );
    assert_eq!(simulation.view().mode, ViewMode::Top);
}

#[test]
fn collecting_required_gems_opens_exit_for_good() {
    let world = strip_world().with_pickups(vec![
        Pickup::new(PickupKind::Gem, center((4, 2))),
        Pickup::new(PickupKind::Candy, center((5, 2))),
        Pickup::new(PickupKind::Gem, center((6, 2))),
        Pickup::new(PickupKind::Gem, center((8, 2))),
        Pickup::new(PickupKind::Gem, center((10, 1))),
    ]);
    let mut simulation = simulation_with(world, Vec::new(), SimConfig::default());
    assert_eq!(simulation.gems_required(), 3);
    assert!(!simulation.exit_open());

    let right = Intent::moving(Vec2::new(1.0, 0.0));
    let mut events = Vec::new();
    let mut was_open = false;
    for _ in 0..200 {
        events.extend(run(&mut simulation, right, 1));
        if simulation.gems_collected() < 3 {
            assert!(!simulation.exit_open());
        }
        if was_open {
            assert!(simulation.exit_open());
        }
        was_open = simulation.exit_open();
    }

    assert!(simulation.exit_open());
    assert!(simulation.player_state().has_gem);
    assert_eq!(simulation.gems_collected(), 3);
    assert_eq!(
        count(&events, |event| matches!(event, SimEvent::ExitOpened)),
        1
    );
    assert_eq!(
        count(&events, |event| matches!(event, SimEvent::ExitReached)),
        1
    );
    assert_eq!(simulation.status(), SessionStatus::Escaped);
    let config = SimConfig::default();
    assert_eq!(
        simulation.scoreboard().score(),
        config.gem_score * 3 + config.candy_score
    );
}

#[test]
fn world_without_gems_starts_with_exit_open() {
    let mut simulation = simulation_with(strip_world(), Vec::new(), SimConfig::default());
    assert!(simulation.exit_open());
    let events = run(&mut simulation, Intent::idle(), 5);
    assert_eq!(
        count(&events, |event| matches!(event, SimEvent::ExitOpened)),
        0
    );
}

#[test]
fn lethal_hit_ends_round_until_restart() {
    let mut simulation = simulation_with(strip_world(), Vec::new(), SimConfig::default());
    simulation.scoreboard.add(40);
    simulation.player.hp = 1;
    let position = simulation.player.position;
    simulation.projectiles.spawn(
        position - Vec2::new(5.0, 0.0),
        Vec2::new(1.0, 0.0),
        BulletOwner::Enemy,
        &simulation.config,
    );

    let events = run(&mut simulation, Intent::idle(), 1);
    assert_eq!(
        events,
        vec![SimEvent::PlayerHit { hp: 0 }, SimEvent::PlayerDied]
    );
    assert_eq!(simulation.status(), SessionStatus::Dead);

    let tick = simulation.tick_count();
    let after_death = run(&mut simulation, Intent::moving(Vec2::new(1.0, 0.0)), 10);
    assert!(after_death.is_empty());
    assert_eq!(simulation.tick_count(), tick);
    assert_eq!(simulation.player_state().position, position);

    let restarted = run(
        &mut simulation,
        Intent {
            restart: true,
            ..Intent::idle()
        },
        1,
    );
    assert_eq!(
        restarted,
        vec![SimEvent::Restarted { round: 1, seed: 8 }]
    );
    assert_eq!(simulation.status(), SessionStatus::Playing);
    assert_eq!(simulation.round(), 1);
    assert_eq!(simulation.seed(), 8);
    assert_eq!(simulation.player_state().hp, simulation.config().initial_hp);
    assert_eq!(simulation.scoreboard().score(), 40);
}

#[test]
fn wall_bump_and_rotation_emit_events() {
    let mut simulation = simulation_with(strip_world(), Vec::new(), SimConfig::default());
    let events = run(
        &mut simulation,
        Intent {
            movement: Vec2::new(0.0, -1.0),
            rotate_steps: -2,
            ..Intent::idle()
        },
        30,
    );
    assert!(count(&events, |event| matches!(event, SimEvent::WallBump)) > 0);
    assert_eq!(
        events
            .iter()
            .find(|event| matches!(event, SimEvent::ViewRotated { .. })),
        Some(&SimEvent::ViewRotated { degrees: 330 })
    );
    assert!(simulation.distance_travelled() > 0.0);
}

#[test]
fn new_rejects_invalid_config() {
    let config = SimConfig {
        initial_hp: 0,
        ..SimConfig::default()
    };
    assert!(matches!(
        Simulation::new(config, 1, Scoreboard::new()),
        Err(ConfigError::ZeroHp)
    ));
}

#[test]
fn generated_round_spawns_enemies_away_from_start() {
    let config = SimConfig::default();
    let simulation = Simulation::new(config.clone(), 42, Scoreboard::new()).expect("simulation");
    let enemies = simulation.enemy_states();
    assert!(enemies.len() >= config.enemy_count_min as usize);
    assert!(enemies.len() <= config.enemy_count_max as usize);

    let grid = simulation.grid();
    let start = simulation.world().start_tile();
    for enemy in enemies {
        let tile = grid.tile_at_px(enemy.position);
        assert!(grid.is_walkable(tile));
        assert!(tile.manhattan(start) >= config.enemy_spawn_min_distance);
    }
    assert_eq!(simulation.hole_states().len(), simulation.world().holes().len());
    assert_eq!(
        simulation.pickup_states().len(),
        simulation.world().pickups().len()
    );
}

#[test]
fn same_seed_and_intents_replay_identically() {
    let script = |tick: usize| Intent {
        movement: Vec2::new(
            if tick % 90 < 45 { 1.0 } else { -1.0 },
            if tick % 60 < 30 { 1.0 } else { 0.0 },
        ),
        fire: tick % 7 == 0,
        ..Intent::idle()
    };

    let mut first = Simulation::new(SimConfig::default(), 99, Scoreboard::new()).expect("first");
    let mut second =
        Simulation::new(SimConfig::default(), 99, Scoreboard::new()).expect("second");
    for tick in 0..600 {
        first.apply_intent(script(tick));
        first.step(DT);
        second.apply_intent(script(tick));
        second.step(DT);
    }

    assert_eq!(first.snapshot(), second.snapshot());
    assert_eq!(first.drain_events(), second.drain_events());
}
