use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MIN_WORLD_TILES: u32 = 8;

/// Tuning values for one simulation session. Pixel units unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub tile_size: f32,
    pub world_width: u32,
    pub world_height: u32,

    pub wall_cluster_count: u32,
    pub wall_cluster_max_size: u32,
    pub wall_cluster_fill_probability: f32,
    pub horizontal_corridors: u32,
    pub vertical_corridors: u32,
    pub corridor_open_probability: f32,
    pub endpoint_attempts: u32,
    pub endpoint_path_visit_cap: usize,

    pub candy_count: u32,
    pub gem_count: u32,
    pub hole_count: u32,
    /// Manhattan distance in tiles from start and exit.
    pub pickup_min_endpoint_distance: u32,
    pub hole_min_endpoint_distance: u32,
    /// Euclidean spacing in tiles between items of a compatible kind.
    pub pickup_spacing_tiles: f32,
    pub hole_spacing_tiles: f32,
    pub placement_iteration_cap: u32,

    pub player_radius: f32,
    pub enemy_radius: f32,
    pub bullet_radius: f32,
    pub player_speed: f32,
    pub enemy_speed: f32,
    pub player_bullet_speed: f32,
    pub enemy_bullet_speed: f32,
    pub bullet_lifetime_seconds: f32,
    pub player_fire_cooldown_seconds: f32,
    pub enemy_fire_cooldown_seconds: f32,
    pub initial_hp: u32,
    pub respawn_on_hit: bool,

    pub enemy_count_min: u32,
    pub enemy_count_max: u32,
    pub enemy_spawn_min_distance: u32,
    pub chase_radius: f32,
    pub shoot_range: f32,
    pub replan_interval_chase_seconds: f32,
    pub replan_interval_patrol_seconds: f32,
    pub enemy_path_visit_cap: usize,
    pub waypoint_threshold: f32,
    pub patrol_min_tile_distance: u32,
    pub patrol_target_attempts: u32,
    pub separation_radius: f32,
    pub separation_weight: f32,
    pub muzzle_offset: f32,
    pub enemy_aim_lead_px: f32,

    pub pickup_radius_tiles: f32,
    pub hole_radius_tiles: f32,
    pub exit_radius_tiles: f32,
    pub hole_cooldown_seconds: f32,
    pub gems_to_open_exit: u32,
    pub rotation_step_degrees: i32,

    pub candy_score: u32,
    pub gem_score: u32,
    pub enemy_score: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tile_size: 28.0,
            world_width: 72,
            world_height: 46,

            wall_cluster_count: 58,
            wall_cluster_max_size: 4,
            wall_cluster_fill_probability: 0.85,
            horizontal_corridors: 6,
            vertical_corridors: 4,
            corridor_open_probability: 0.55,
            endpoint_attempts: 200,
            endpoint_path_visit_cap: 20_000,

            candy_count: 18,
            gem_count: 8,
            hole_count: 4,
            pickup_min_endpoint_distance: 6,
            hole_min_endpoint_distance: 8,
            pickup_spacing_tiles: 0.7,
            hole_spacing_tiles: 2.0,
            placement_iteration_cap: 20_000,

            player_radius: 11.0,
            enemy_radius: 11.0,
            bullet_radius: 3.5,
            player_speed: 190.0,
            enemy_speed: 130.0,
            player_bullet_speed: 420.0,
            enemy_bullet_speed: 378.0,
            bullet_lifetime_seconds: 1.6,
            player_fire_cooldown_seconds: 0.16,
            enemy_fire_cooldown_seconds: 0.9,
            initial_hp: 3,
            respawn_on_hit: false,

            enemy_count_min: 7,
            enemy_count_max: 11,
            enemy_spawn_min_distance: 10,
            chase_radius: 330.0,
            shoot_range: 290.0,
            replan_interval_chase_seconds: 0.35,
            replan_interval_patrol_seconds: 0.7,
            enemy_path_visit_cap: 16_000,
            waypoint_threshold: 8.0,
            patrol_min_tile_distance: 8,
            patrol_target_attempts: 40,
            separation_radius: 30.0,
            separation_weight: 0.9,
            muzzle_offset: 6.0,
            enemy_aim_lead_px: 0.0,

            pickup_radius_tiles: 0.35,
            hole_radius_tiles: 0.4,
            exit_radius_tiles: 0.4,
            hole_cooldown_seconds: 1.0,
            gems_to_open_exit: 3,
            rotation_step_degrees: 15,

            candy_score: 5,
            gem_score: 20,
            enemy_score: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("world must be at least {min}x{min} tiles, got {width}x{height}")]
    WorldTooSmall { width: u32, height: u32, min: u32 },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must be zero or positive, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} must be within 0..=1, got {value}")]
    NotProbability { field: &'static str, value: f32 },
    #[error("{field} ({radius}) must be smaller than half a tile ({half_tile})")]
    RadiusTooLarge {
        field: &'static str,
        radius: f32,
        half_tile: f32,
    },
    #[error("enemy_count_min ({min}) exceeds enemy_count_max ({max})")]
    EnemyCountRange { min: u32, max: u32 },
    #[error("initial_hp must be at least 1")]
    ZeroHp,
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world_width < MIN_WORLD_TILES || self.world_height < MIN_WORLD_TILES {
            return Err(ConfigError::WorldTooSmall {
                width: self.world_width,
                height: self.world_height,
                min: MIN_WORLD_TILES,
            });
        }

        for (field, value) in [
            ("tile_size", self.tile_size),
            ("player_radius", self.player_radius),
            ("enemy_radius", self.enemy_radius),
            ("bullet_radius", self.bullet_radius),
            ("player_speed", self.player_speed),
            ("enemy_speed", self.enemy_speed),
            ("player_bullet_speed", self.player_bullet_speed),
            ("enemy_bullet_speed", self.enemy_bullet_speed),
            ("bullet_lifetime_seconds", self.bullet_lifetime_seconds),
            (
                "replan_interval_chase_seconds",
                self.replan_interval_chase_seconds,
            ),
            (
                "replan_interval_patrol_seconds",
                self.replan_interval_patrol_seconds,
            ),
            ("player_fire_cooldown_seconds", self.player_fire_cooldown_seconds),
            ("enemy_fire_cooldown_seconds", self.enemy_fire_cooldown_seconds),
            ("chase_radius", self.chase_radius),
            ("shoot_range", self.shoot_range),
            ("waypoint_threshold", self.waypoint_threshold),
            ("separation_radius", self.separation_radius),
            ("pickup_radius_tiles", self.pickup_radius_tiles),
            ("hole_radius_tiles", self.hole_radius_tiles),
            ("exit_radius_tiles", self.exit_radius_tiles),
            ("hole_cooldown_seconds", self.hole_cooldown_seconds),
        ] {
            ensure_positive(field, value)?;
        }

        for (field, value) in [
            ("separation_weight", self.separation_weight),
            ("muzzle_offset", self.muzzle_offset),
            ("enemy_aim_lead_px", self.enemy_aim_lead_px),
            ("pickup_spacing_tiles", self.pickup_spacing_tiles),
            ("hole_spacing_tiles", self.hole_spacing_tiles),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::Negative { field, value });
            }
        }

        for (field, value) in [
            (
                "wall_cluster_fill_probability",
                self.wall_cluster_fill_probability,
            ),
            ("corridor_open_probability", self.corridor_open_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::NotProbability { field, value });
            }
        }

        let half_tile = self.tile_size * 0.5;
        for (field, radius) in [
            ("player_radius", self.player_radius),
            ("enemy_radius", self.enemy_radius),
        ] {
            if radius >= half_tile {
                return Err(ConfigError::RadiusTooLarge {
                    field,
                    radius,
                    half_tile,
                });
            }
        }

        if self.enemy_count_min > self.enemy_count_max {
            return Err(ConfigError::EnemyCountRange {
                min: self.enemy_count_min,
                max: self.enemy_count_max,
            });
        }
        if self.initial_hp == 0 {
            return Err(ConfigError::ZeroHp);
        }
        Ok(())
    }

    pub fn world_width_px(&self) -> f32 {
        self.world_width as f32 * self.tile_size
    }

    pub fn world_height_px(&self) -> f32 {
        self.world_height as f32 * self.tile_size
    }
}

fn ensure_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 8,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

impl LoopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("target_tps", self.target_tps as f32)?;
        ensure_positive("max_ticks_per_frame", self.max_ticks_per_frame as f32)?;
        ensure_positive("max_frame_delta", self.max_frame_delta.as_secs_f32())
    }

    pub fn fixed_dt(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_tps.max(1)))
    }
}
