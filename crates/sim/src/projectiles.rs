use tracing::debug;

use crate::config::SimConfig;
use crate::entities::{Bullet, BulletOwner, Enemy, Player};
use crate::events::{EventBus, SimEvent};
use crate::grid::Grid;
use crate::math::Vec2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectileReport {
    pub enemies_defeated: u32,
    pub player_hits: u32,
}

#[derive(Debug, Default)]
pub struct ProjectileSystem {
    bullets: Vec<Bullet>,
}

impl ProjectileSystem {
    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    pub fn len(&self) -> usize {
        self.bullets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bullets.is_empty()
    }

    pub fn clear(&mut self) {
        self.bullets.clear();
    }

    /// Returns false when `direction` has no length and nothing was spawned.
    pub fn spawn(
        &mut self,
        position: Vec2,
        direction: Vec2,
        owner: BulletOwner,
        config: &SimConfig,
    ) -> bool {
        let direction = direction.normalized();
        if direction.is_zero() {
            return false;
        }
        let speed = match owner {
            BulletOwner::Player => config.player_bullet_speed,
            BulletOwner::Enemy => config.enemy_bullet_speed,
        };
        self.bullets.push(Bullet {
            position,
            velocity: direction * speed,
            radius: config.bullet_radius,
            owner,
            life: config.bullet_lifetime_seconds,
        });
        true
    }

    /// Ages, moves and resolves every bullet. A bullet hits at most one target
    /// per tick: the first living enemy in slice order, or the player.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        grid: &Grid,
        player: &mut Player,
        enemies: &mut [Enemy],
        home: Vec2,
        config: &SimConfig,
        dt: f32,
        events: &mut EventBus,
    ) -> ProjectileReport {
        let mut report = ProjectileReport::default();

        self.bullets.retain_mut(|bullet| {
            bullet.life -= dt;
            if bullet.life <= 0.0 {
                return false;
            }
            bullet.position += bullet.velocity * dt;
            if grid.is_solid(grid.tile_at_px(bullet.position)) {
                return false;
            }

            match bullet.owner {
                BulletOwner::Player => {
                    let hit = enemies.iter().position(|enemy| {
                        enemy.alive
                            && touches(bullet.position, bullet.radius, enemy.position, enemy.radius)
                    });
                    let Some(enemy_index) = hit else {
                        return true;
                    };
                    enemies[enemy_index].alive = false;
                    report.enemies_defeated = report.enemies_defeated.saturating_add(1);
                    events.emit(SimEvent::EnemyDefeated { enemy_index });
                    debug!(enemy_index, "enemy_defeated");
                    false
                }
                BulletOwner::Enemy => {
                    if !player.is_alive()
                        || !touches(bullet.position, bullet.radius, player.position, player.radius)
                    {
                        return true;
                    }
                    player.take_hit();
                    report.player_hits = report.player_hits.saturating_add(1);
                    events.emit(SimEvent::PlayerHit { hp: player.hp });
                    debug!(hp = player.hp, "player_hit");
                    if config.respawn_on_hit && player.is_alive() {
                        player.position = home;
                    }
                    false
                }
            }
        });

        report
    }
}

// Contact counts as a hit.
fn touches(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    a.distance_squared(b) <= reach * reach
}
