use serde::{Deserialize, Serialize};

use crate::entities::BulletOwner;
use crate::math::{wrap_degrees, Vec2};
use crate::world::PickupKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Playing,
    Dead,
    Escaped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Top,
    Side,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Top => ViewMode::Side,
            ViewMode::Side => ViewMode::Top,
        }
    }
}

/// Presentation hints the simulation owns so hole triggers and rotation
/// requests stay deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub mode: ViewMode,
    pub rotation_deg: i32,
}

impl ViewState {
    pub fn toggle(&mut self) -> ViewMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    pub fn rotate(&mut self, delta_degrees: i32) -> i32 {
        self.rotation_deg = wrap_degrees(self.rotation_deg.saturating_add(delta_degrees));
        self.rotation_deg
    }
}

/// Running score owned by the caller and lent to each simulation. The score
/// carries across restarts; `best` only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    score: u32,
    best: u32,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_best(best: u32) -> Self {
        Self { score: 0, best }
    }

    pub fn add(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        self.best = self.best.max(self.score);
    }

    pub fn reset(&mut self) {
        self.score = 0;
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best(&self) -> u32 {
        self.best
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayerState {
    pub position: Vec2,
    pub hp: u32,
    pub aim: Vec2,
    pub has_gem: bool,
    pub alive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnemyState {
    pub index: usize,
    pub position: Vec2,
    pub chasing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BulletState {
    pub position: Vec2,
    pub owner: BulletOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PickupState {
    pub kind: PickupKind,
    pub position: Vec2,
    pub collected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HoleState {
    pub position: Vec2,
}

/// Everything a presenter needs for one frame, taken after a batch of ticks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimSnapshot {
    pub tick: u64,
    pub round: u32,
    pub seed: u64,
    pub status: SessionStatus,
    pub score: u32,
    pub best_score: u32,
    pub exit_open: bool,
    pub gems_collected: u32,
    pub gems_required: u32,
    pub view: ViewState,
    pub player: PlayerState,
    pub enemies: Vec<EnemyState>,
    pub bullets: Vec<BulletState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_wraps_both_directions() {
        let mut view = ViewState::default();
        assert_eq!(view.rotate(-15), 345);
        assert_eq!(view.rotate(30), 15);
        assert_eq!(view.rotate(720), 15);
    }

    #[test]
    fn toggle_alternates_modes() {
        let mut view = ViewState::default();
        assert_eq!(view.toggle(), ViewMode::Side);
        assert_eq!(view.toggle(), ViewMode::Top);
    }

    #[test]
    fn best_score_survives_reset() {
        let mut board = Scoreboard::new();
        board.add(20);
        board.add(5);
        board.reset();
        board.add(10);
        assert_eq!(board.score(), 10);
        assert_eq!(board.best(), 25);
    }
}
