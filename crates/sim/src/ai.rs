use tracing::trace;

use crate::collision::line_of_sight;
use crate::config::SimConfig;
use crate::entities::{Enemy, Kinematic, MoveOutcome, Player};
use crate::grid::TileCoord;
use crate::math::Vec2;
use crate::nav::shortest_path;
use crate::world::World;

const SEPARATION_MIN_DISTANCE: f32 = 1e-3;

/// Enemy behavior mode, re-decided at every replan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyMode {
    /// Walking toward a sampled tile; `None` while no reachable target was found.
    Patrol { target: Option<TileCoord> },
    Chase,
}

impl EnemyMode {
    pub fn is_chasing(self) -> bool {
        matches!(self, EnemyMode::Chase)
    }
}

/// Chase is acquired by seeing the player inside the chase radius and kept
/// while the player stays inside it, visible or not.
pub fn should_chase(current: EnemyMode, distance: f32, visible: bool, chase_radius: f32) -> bool {
    if distance > chase_radius {
        return false;
    }
    visible || current.is_chasing()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub origin: Vec2,
    pub direction: Vec2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThinkOutcome {
    pub moved: MoveOutcome,
    pub shot: Option<Shot>,
    pub replanned: bool,
}

/// One AI tick for one enemy: replan if due, steer along the cached path with
/// crowd separation, then shoot if the player is in range and visible.
///
/// `crowd` holds positions of living enemies captured before the AI phase; the
/// enemy's own entry is skipped by the minimum-distance check.
pub fn think(
    enemy: &mut Enemy,
    world: &mut World,
    player: &Player,
    crowd: &[Vec2],
    config: &SimConfig,
    dt: f32,
) -> ThinkOutcome {
    let mut outcome = ThinkOutcome::default();
    if !enemy.alive {
        return outcome;
    }

    let to_player = player.position - enemy.position;
    let distance = to_player.length();

    if enemy.replan_timer <= 0.0 {
        replan(enemy, world, player, distance, config);
        outcome.replanned = true;
    }

    let heading = path_heading(enemy, world, to_player, config);
    let separation = separation(enemy.position, crowd, config.separation_radius);
    let direction = (heading.normalized() + separation * config.separation_weight).normalized();
    enemy.velocity = direction * config.enemy_speed;
    outcome.moved = enemy.move_with_collision(world.grid(), enemy.velocity * dt);

    // Range and sight are both judged from the post-move position.
    let distance = enemy.position.distance(player.position);
    if distance < config.shoot_range
        && enemy.shoot_timer <= 0.0
        && line_of_sight(world.grid(), enemy.position, player.position)
    {
        enemy.shoot_timer = config.enemy_fire_cooldown_seconds;
        let aim_point = player.position + player.aim * config.enemy_aim_lead_px;
        let direction = (aim_point - enemy.position).normalized();
        if !direction.is_zero() {
            outcome.shot = Some(Shot {
                origin: enemy.position + direction * (enemy.radius + config.muzzle_offset),
                direction,
            });
        }
    }

    outcome
}

fn replan(enemy: &mut Enemy, world: &mut World, player: &Player, distance: f32, config: &SimConfig) {
    let visible = distance <= config.chase_radius
        && line_of_sight(world.grid(), enemy.position, player.position);
    let chase = should_chase(enemy.mode, distance, visible, config.chase_radius);
    let from = world.grid().tile_at_px(enemy.position);

    if chase {
        enemy.replan_timer = config.replan_interval_chase_seconds;
        enemy.mode = EnemyMode::Chase;
        let goal = world.grid().tile_at_px(player.position);
        let path = shortest_path(world.grid(), from, goal, config.enemy_path_visit_cap);
        enemy.set_path(path);
        return;
    }

    enemy.replan_timer = config.replan_interval_patrol_seconds;
    let mut target = None;
    let mut path = Vec::new();
    for _ in 0..config.patrol_target_attempts {
        let candidate = world.sample_interior_tile();
        if world.grid().is_solid(candidate)
            || candidate.manhattan(from) < config.patrol_min_tile_distance
        {
            continue;
        }
        path = shortest_path(world.grid(), from, candidate, config.enemy_path_visit_cap);
        if !path.is_empty() {
            target = Some(candidate);
            break;
        }
    }
    if target.is_none() {
        trace!(from = ?from, "patrol_target_not_found");
    }
    enemy.mode = EnemyMode::Patrol { target };
    enemy.set_path(path);
}

fn path_heading(enemy: &mut Enemy, world: &World, to_player: Vec2, config: &SimConfig) -> Vec2 {
    if let Some(waypoint) = enemy.next_waypoint() {
        let center = world.grid().tile_center(waypoint);
        let to_waypoint = center - enemy.position;
        if to_waypoint.length() < config.waypoint_threshold {
            enemy.advance_waypoint();
        }
        return to_waypoint;
    }
    if enemy.mode.is_chasing() {
        return to_player;
    }
    Vec2::ZERO
}

/// Push away from neighbors closer than `radius`, weighted `(radius - d) / radius`.
pub fn separation(position: Vec2, crowd: &[Vec2], radius: f32) -> Vec2 {
    let mut push = Vec2::ZERO;
    for other in crowd {
        let away = position - *other;
        let distance = away.length();
        if distance < SEPARATION_MIN_DISTANCE || distance >= radius {
            continue;
        }
        let weight = (radius - distance) / radius;
        push += away * (weight / distance);
    }
    push
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    const TILE: f32 = 28.0;

    fn open_world() -> World {
        let grid = Grid::from_ascii(
            &[
                "##############",
                "#............#",
                "#............#",
                "#............#",
                "#............#",
                "#............#",
                "##############",
            ],
            TILE,
        );
        World::from_grid(grid, TileCoord::new(1, 1), TileCoord::new(12, 5), 9)
    }

    fn enemy_at(world: &World, tile: TileCoord) -> Enemy {
        Enemy::new(world.grid().tile_center(tile), 11.0, 0.0, 0.0)
    }

    #[test]
    fn chase_requires_sight_to_start_but_not_to_continue() {
        let patrol = EnemyMode::Patrol { target: None };
        assert!(!should_chase(patrol, 100.0, false, 330.0));
        assert!(should_chase(patrol, 100.0, true, 330.0));
        assert!(should_chase(EnemyMode::Chase, 100.0, false, 330.0));
        assert!(!should_chase(EnemyMode::Chase, 400.0, true, 330.0));
    }

    #[test]
    fn visible_player_in_radius_triggers_chase_path() {
        let mut world = open_world();
        let config = SimConfig::default();
        let mut enemy = enemy_at(&world, TileCoord::new(2, 3));
        let player = Player::new(world.grid().tile_center(TileCoord::new(8, 3)), 11.0, 3);

        let outcome = think(&mut enemy, &mut world, &player, &[], &config, 1.0 / 60.0);

        assert!(outcome.replanned);
        assert_eq!(enemy.mode, EnemyMode::Chase);
        assert_eq!(enemy.path.last(), Some(&TileCoord::new(8, 3)));
        assert_eq!(enemy.replan_timer, config.replan_interval_chase_seconds);
        assert!(enemy.position.x > world.grid().tile_center(TileCoord::new(2, 3)).x);
    }

    #[test]
    fn far_player_leads_to_patrol_target() {
        let mut world = open_world();
        let config = SimConfig {
            chase_radius: 10.0,
            patrol_min_tile_distance: 3,
            ..SimConfig::default()
        };
        let mut enemy = enemy_at(&world, TileCoord::new(2, 2));
        let player = Player::new(world.grid().tile_center(TileCoord::new(12, 5)), 11.0, 3);

        think(&mut enemy, &mut world, &player, &[], &config, 1.0 / 60.0);

        match enemy.mode {
            EnemyMode::Patrol { target: Some(target) } => {
                assert!(world.grid().is_walkable(target));
                assert!(target.manhattan(TileCoord::new(2, 2)) >= 3);
                assert_eq!(enemy.path.last(), Some(&target));
            }
            other => panic!("expected patrol with target, got {other:?}"),
        }
        assert_eq!(enemy.replan_timer, config.replan_interval_patrol_seconds);
    }

    #[test]
    fn enemy_shoots_only_when_cooldown_elapsed() {
        let mut world = open_world();
        let config = SimConfig::default();
        let mut enemy = enemy_at(&world, TileCoord::new(2, 3));
        let player = Player::new(world.grid().tile_center(TileCoord::new(7, 3)), 11.0, 3);

        let first = think(&mut enemy, &mut world, &player, &[], &config, 1.0 / 60.0);
        let shot = first.shot.expect("first tick should fire");
        assert!(shot.direction.x > 0.99);
        assert!(shot.origin.x > enemy.position.x);
        assert_eq!(enemy.shoot_timer, config.enemy_fire_cooldown_seconds);

        let second = think(&mut enemy, &mut world, &player, &[], &config, 1.0 / 60.0);
        assert!(second.shot.is_none());
    }

    #[test]
    fn shot_range_uses_position_after_moving() {
        let mut world = open_world();
        let config = SimConfig {
            shoot_range: 300.0,
            ..SimConfig::default()
        };
        let mut enemy = enemy_at(&world, TileCoord::new(1, 3));
        let player = Player::new(world.grid().tile_center(TileCoord::new(12, 3)), 11.0, 3);
        assert!(enemy.position.distance(player.position) > config.shoot_range);

        // 0.1 s at enemy speed closes 13 px of the 308 px gap.
        let outcome = think(&mut enemy, &mut world, &player, &[], &config, 0.1);

        assert_eq!(enemy.mode, EnemyMode::Chase);
        assert!(enemy.position.distance(player.position) < config.shoot_range);
        assert!(outcome.shot.is_some());
    }

    #[test]
    fn wall_blocks_shooting() {
        let grid = Grid::from_ascii(
            &[
                "##########", //
                "#....#...#", //
                "#....#...#", //
                "#....#...#", //
                "##########",
            ],
            TILE,
        );
        let mut world = World::from_grid(grid, TileCoord::new(1, 1), TileCoord::new(8, 3), 4);
        let config = SimConfig::default();
        let mut enemy = enemy_at(&world, TileCoord::new(3, 2));
        let player = Player::new(world.grid().tile_center(TileCoord::new(7, 2)), 11.0, 3);

        let outcome = think(&mut enemy, &mut world, &player, &[], &config, 1.0 / 60.0);

        assert!(outcome.shot.is_none());
        assert!(!enemy.mode.is_chasing());
    }

    #[test]
    fn separation_pushes_away_from_close_neighbors() {
        let me = Vec2::new(100.0, 100.0);
        let crowd = [me, Vec2::new(110.0, 100.0), Vec2::new(200.0, 100.0)];
        let push = separation(me, &crowd, 30.0);
        assert!(push.x < 0.0);
        assert!(push.y.abs() < 1e-6);
        assert!((push.x + 20.0 / 30.0).abs() < 1e-5);
    }

    #[test]
    fn dead_enemy_does_nothing() {
        let mut world = open_world();
        let config = SimConfig::default();
        let mut enemy = enemy_at(&world, TileCoord::new(2, 3));
        enemy.alive = false;
        let before = enemy.clone();
        let player = Player::new(world.grid().tile_center(TileCoord::new(4, 3)), 11.0, 3);
        let outcome = think(&mut enemy, &mut world, &player, &[], &config, 1.0 / 60.0);
        assert_eq!(outcome, ThinkOutcome::default());
        assert_eq!(enemy, before);
    }
}
