use serde::{Deserialize, Serialize};

use crate::ai::EnemyMode;
use crate::collision::{circle_hits_solid, nearby_tiles, tile_rect};
use crate::grid::{Grid, TileCoord};
use crate::math::{clamp, Vec2};

/// Gap left between a resolved circle and the wall it was pushed out of, so the
/// next overlap test does not report a touching contact.
pub const SEPARATION_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveOutcome {
    pub bumped_x: bool,
    pub bumped_y: bool,
    pub distance: f32,
}

impl MoveOutcome {
    pub fn bumps(&self) -> u32 {
        self.bumped_x as u32 + self.bumped_y as u32
    }
}

pub trait Kinematic {
    fn position(&self) -> Vec2;
    fn set_position(&mut self, position: Vec2);
    fn radius(&self) -> f32;

    fn move_with_collision(&mut self, grid: &Grid, delta: Vec2) -> MoveOutcome {
        let (position, outcome) = resolve_move(grid, self.position(), self.radius(), delta);
        self.set_position(position);
        outcome
    }
}

/// Moves a circle X then Y, pushing it back out of any wall it ran into along
/// the axis it was moving on, then clamps it inside the world.
pub fn resolve_move(grid: &Grid, start: Vec2, radius: f32, delta: Vec2) -> (Vec2, MoveOutcome) {
    let mut position = start;
    let mut outcome = MoveOutcome::default();

    if delta.x != 0.0 {
        let previous_x = position.x;
        position.x += delta.x;
        if circle_hits_solid(grid, position, radius) {
            let resolved = push_out(grid, position, radius, previous_x, delta.x, Axis::X);
            outcome.bumped_x = resolved != position.x;
            position.x = resolved;
        }
    }

    if delta.y != 0.0 {
        let previous_y = position.y;
        position.y += delta.y;
        if circle_hits_solid(grid, position, radius) {
            let resolved = push_out(grid, position, radius, previous_y, delta.y, Axis::Y);
            outcome.bumped_y = resolved != position.y;
            position.y = resolved;
        }
    }

    position = clamp_to_world(grid, position, radius);
    outcome.distance = start.distance(position);
    (position, outcome)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

fn push_out(
    grid: &Grid,
    position: Vec2,
    radius: f32,
    previous: f32,
    step: f32,
    axis: Axis,
) -> f32 {
    let (mut moving, cross) = match axis {
        Axis::X => (position.x, position.y),
        Axis::Y => (position.y, position.x),
    };

    for coord in nearby_tiles(grid, position, radius) {
        if !grid.is_solid(coord) {
            continue;
        }
        let rect = tile_rect(grid, coord);
        let (near, far, cross_min, cross_max) = match axis {
            Axis::X => (rect.left, rect.right, rect.top, rect.bottom),
            Axis::Y => (rect.top, rect.bottom, rect.left, rect.right),
        };
        let cross_gap = axis_gap(cross, cross_min, cross_max);
        if cross_gap >= radius {
            continue;
        }
        // Only the perpendicular offset is subtracted, so corner contacts push out
        // just far enough to clear the corner.
        let reach = (radius * radius - cross_gap * cross_gap).sqrt();
        if step > 0.0 && near >= previous {
            moving = moving.min(near - reach - SEPARATION_EPSILON);
        } else if step < 0.0 && far <= previous {
            moving = moving.max(far + reach + SEPARATION_EPSILON);
        }
    }
    moving
}

fn axis_gap(value: f32, min: f32, max: f32) -> f32 {
    (value - clamp(value, min, max)).abs()
}

pub fn clamp_to_world(grid: &Grid, position: Vec2, radius: f32) -> Vec2 {
    Vec2::new(
        clamp(position.x, radius, grid.width_px() - radius),
        clamp(position.y, radius, grid.height_px() - radius),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub hp: u32,
    pub aim: Vec2,
    pub fire_cooldown: f32,
    pub has_gem: bool,
}

impl Player {
    pub fn new(position: Vec2, radius: f32, hp: u32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            radius,
            hp,
            aim: Vec2::new(1.0, 0.0),
            fire_cooldown: 0.0,
            has_gem: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn tick(&mut self, dt: f32) {
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
    }

    /// Normalizes `movement` so diagonals are not faster, and remembers the
    /// direction as the aim when it is non-zero.
    pub fn steer(&mut self, grid: &Grid, movement: Vec2, speed: f32, dt: f32) -> MoveOutcome {
        let direction = movement.normalized();
        if !direction.is_zero() {
            self.aim = direction;
        }
        self.velocity = direction * speed;
        self.move_with_collision(grid, self.velocity * dt)
    }

    pub fn take_hit(&mut self) {
        self.hp = self.hp.saturating_sub(1);
    }
}

impl Kinematic for Player {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub alive: bool,
    pub replan_timer: f32,
    pub shoot_timer: f32,
    pub mode: EnemyMode,
    pub path: Vec<TileCoord>,
    pub path_cursor: usize,
}

impl Enemy {
    pub fn new(position: Vec2, radius: f32, replan_timer: f32, shoot_timer: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            radius,
            alive: true,
            replan_timer,
            shoot_timer,
            mode: EnemyMode::Patrol { target: None },
            path: Vec::new(),
            path_cursor: 0,
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.replan_timer = (self.replan_timer - dt).max(0.0);
        self.shoot_timer = (self.shoot_timer - dt).max(0.0);
    }

    pub fn next_waypoint(&self) -> Option<TileCoord> {
        self.path.get(self.path_cursor).copied()
    }

    pub fn set_path(&mut self, path: Vec<TileCoord>) {
        self.path = path;
        self.path_cursor = 0;
    }

    pub fn advance_waypoint(&mut self) {
        if self.path_cursor < self.path.len() {
            self.path_cursor = self.path_cursor.saturating_add(1);
        }
    }
}

impl Kinematic for Enemy {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BulletOwner {
    Player,
    Enemy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub owner: BulletOwner,
    pub life: f32,
}

impl Kinematic for Bullet {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}
