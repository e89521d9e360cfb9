pub mod ai;
pub mod collision;
pub mod config;
pub mod entities;
pub mod events;
pub mod fixed_step;
pub mod grid;
pub mod input;
pub mod math;
pub mod metrics;
pub mod nav;
pub mod projectiles;
pub mod simulation;
pub mod world;

pub use ai::EnemyMode;
pub use config::{ConfigError, LoopConfig, SimConfig};
pub use entities::{Bullet, BulletOwner, Enemy, Kinematic, MoveOutcome, Player};
pub use events::{EventBus, SimEvent, SimEventCounts, SimEventKind};
pub use fixed_step::{plan_sim_steps, FixedStepLoop, FixedStepTarget, FrameReport, StepPlan};
pub use grid::{Grid, GridError, Tile, TileCoord};
pub use input::{ActionStates, InputAction, Intent};
pub use math::Vec2;
pub use metrics::{LoopMetricsSnapshot, MetricsAccumulator};
pub use nav::shortest_path;
pub use projectiles::{ProjectileReport, ProjectileSystem};
pub use simulation::{
    BulletState, EnemyState, HoleState, PickupState, PlayerState, Scoreboard, SessionStatus,
    SimSnapshot, Simulation, ViewMode, ViewState,
};
pub use world::{generate, Hole, Pickup, PickupKind, World};
