use serde::Serialize;

use crate::entities::BulletOwner;
use crate::simulation::ViewMode;
use crate::world::PickupKind;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimEvent {
    WallBump,
    ShotFired { owner: BulletOwner },
    EnemyDefeated { enemy_index: usize },
    PlayerHit { hp: u32 },
    PickupCollected { pickup: PickupKind },
    ExitOpened,
    ViewToggled { mode: ViewMode },
    ViewRotated { degrees: i32 },
    PlayerDied,
    ExitReached,
    Restarted { round: u32, seed: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimEventKind {
    WallBump,
    ShotFired,
    EnemyDefeated,
    PlayerHit,
    PickupCollected,
    ExitOpened,
    ViewToggled,
    ViewRotated,
    PlayerDied,
    ExitReached,
    Restarted,
}

impl SimEvent {
    pub fn kind(&self) -> SimEventKind {
        match self {
            Self::WallBump => SimEventKind::WallBump,
            Self::ShotFired { .. } => SimEventKind::ShotFired,
            Self::EnemyDefeated { .. } => SimEventKind::EnemyDefeated,
            Self::PlayerHit { .. } => SimEventKind::PlayerHit,
            Self::PickupCollected { .. } => SimEventKind::PickupCollected,
            Self::ExitOpened => SimEventKind::ExitOpened,
            Self::ViewToggled { .. } => SimEventKind::ViewToggled,
            Self::ViewRotated { .. } => SimEventKind::ViewRotated,
            Self::PlayerDied => SimEventKind::PlayerDied,
            Self::ExitReached => SimEventKind::ExitReached,
            Self::Restarted { .. } => SimEventKind::Restarted,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SimEventCounts {
    pub total: u32,
    pub wall_bump: u32,
    pub shot_fired: u32,
    pub enemy_defeated: u32,
    pub player_hit: u32,
    pub pickup_collected: u32,
    pub exit_opened: u32,
    pub view_toggled: u32,
    pub view_rotated: u32,
    pub player_died: u32,
    pub exit_reached: u32,
    pub restarted: u32,
}

impl SimEventCounts {
    fn record(&mut self, kind: SimEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = match kind {
            SimEventKind::WallBump => &mut self.wall_bump,
            SimEventKind::ShotFired => &mut self.shot_fired,
            SimEventKind::EnemyDefeated => &mut self.enemy_defeated,
            SimEventKind::PlayerHit => &mut self.player_hit,
            SimEventKind::PickupCollected => &mut self.pickup_collected,
            SimEventKind::ExitOpened => &mut self.exit_opened,
            SimEventKind::ViewToggled => &mut self.view_toggled,
            SimEventKind::ViewRotated => &mut self.view_rotated,
            SimEventKind::PlayerDied => &mut self.player_died,
            SimEventKind::ExitReached => &mut self.exit_reached,
            SimEventKind::Restarted => &mut self.restarted,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Events emitted since the last drain. Counts cover the last finished tick so
/// per-tick logging does not need to walk the pending list.
#[derive(Debug, Default)]
pub struct EventBus {
    pending: Vec<SimEvent>,
    tick_start: usize,
    last_tick_counts: SimEventCounts,
}

impl EventBus {
    pub fn emit(&mut self, event: SimEvent) {
        self.pending.push(event);
    }

    pub fn iter_pending(&self) -> impl Iterator<Item = &SimEvent> {
        self.pending.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn finish_tick_rollover(&mut self) {
        let mut counts = SimEventCounts::default();
        for event in &self.pending[self.tick_start..] {
            counts.record(event.kind());
        }
        self.last_tick_counts = counts;
        self.tick_start = self.pending.len();
    }

    pub fn last_tick_counts(&self) -> SimEventCounts {
        self.last_tick_counts
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        self.tick_start = 0;
        std::mem::take(&mut self.pending)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.tick_start = 0;
        self.last_tick_counts = SimEventCounts::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollover_counts_only_the_last_tick() {
        let mut bus = EventBus::default();
        bus.emit(SimEvent::WallBump);
        bus.emit(SimEvent::ShotFired {
            owner: BulletOwner::Player,
        });
        bus.finish_tick_rollover();
        assert_eq!(bus.last_tick_counts().total, 2);
        assert_eq!(bus.last_tick_counts().wall_bump, 1);

        bus.emit(SimEvent::PlayerHit { hp: 2 });
        bus.finish_tick_rollover();
        let counts = bus.last_tick_counts();
        assert_eq!(counts.total, 1);
        assert_eq!(counts.player_hit, 1);
        assert_eq!(counts.wall_bump, 0);
        assert_eq!(bus.pending_len(), 3);
    }

    #[test]
    fn drain_returns_events_in_emission_order() {
        let mut bus = EventBus::default();
        bus.emit(SimEvent::PickupCollected {
            pickup: PickupKind::Gem,
        });
        bus.emit(SimEvent::ExitOpened);
        bus.finish_tick_rollover();

        let drained = bus.drain();
        assert_eq!(
            drained,
            vec![
                SimEvent::PickupCollected {
                    pickup: PickupKind::Gem
                },
                SimEvent::ExitOpened,
            ]
        );
        assert_eq!(bus.pending_len(), 0);

        bus.emit(SimEvent::ExitReached);
        bus.finish_tick_rollover();
        assert_eq!(bus.last_tick_counts().exit_reached, 1);
        assert_eq!(bus.last_tick_counts().total, 1);
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let json = serde_json::to_string(&SimEvent::ViewRotated { degrees: 15 })
            .expect("serialize event");
        assert_eq!(json, r#"{"kind":"view_rotated","degrees":15}"#);
    }
}
