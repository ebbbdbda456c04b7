//! Live enemy state and path following.

use glam::Vec2;
use reef_defence_core::{EnemyId, EnemySnapshot, EnemyTemplate, WaveNumber};

/// Distance under which an enemy counts as having reached its waypoint.
pub(crate) const ARRIVAL_EPSILON: f32 = 0.1;

/// Enemy tracked by the world until it dies or leaks.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) wave: WaveNumber,
    pub(crate) position: Vec2,
    pub(crate) speed: f32,
    pub(crate) health: f32,
    pub(crate) reward: u32,
    pub(crate) leak_damage: u32,
    pub(crate) radius: f32,
    waypoint: usize,
}

impl Enemy {
    pub(crate) fn spawn(
        id: EnemyId,
        template: &EnemyTemplate,
        wave: WaveNumber,
        position: Vec2,
    ) -> Self {
        Self {
            id,
            wave,
            position,
            speed: template.speed.max(0.0),
            health: template.health.max(0.0),
            reward: template.reward,
            leak_damage: template.leak_damage,
            radius: template.radius.max(0.0),
            waypoint: 0,
        }
    }

    /// Moves toward the current waypoint, advancing and wrapping the index on arrival.
    pub(crate) fn advance(&mut self, waypoints: &[Vec2], dt: f32) {
        if waypoints.is_empty() {
            return;
        }
        if self.waypoint >= waypoints.len() {
            self.waypoint = 0;
        }

        let target = waypoints[self.waypoint];
        let offset = target - self.position;
        let distance = offset.length();
        let step = self.speed * dt;
        if distance <= step {
            self.position = target;
        } else if distance > 0.0 {
            self.position += offset / distance * step;
        }

        if self.position.distance(target) < ARRIVAL_EPSILON {
            self.waypoint = (self.waypoint + 1) % waypoints.len();
        }
    }

    /// Subtracts damage and reports whether the enemy crossed into death.
    ///
    /// Non-positive or non-finite amounts leave the enemy untouched.
    pub(crate) fn take_damage(&mut self, amount: f32) -> bool {
        if !amount.is_finite() || amount <= 0.0 {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        self.health <= 0.0
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            position: self.position,
            health: self.health,
            radius: self.radius,
        }
    }
}
