//! Projectile flight, ageing and first-hit resolution.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use reef_defence_core::{
    segment_circle_entry, Category, Collider, EnemyId, ProjectileId, ProjectileSpec, TowerId,
};

use crate::{enemies::Enemy, towers::TowerRegistry};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Motion {
    /// Moves along its direction every tick and collides as a disc.
    Travelling { speed: f32 },
    /// Occupies a fixed segment of length `reach` from the muzzle.
    Instant { reach: f32 },
}

/// Projectile tracked by the world until it resolves.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) tower: TowerId,
    pub(crate) position: Vec2,
    pub(crate) direction: Vec2,
    pub(crate) damage: f32,
    origin: Vec2,
    motion: Motion,
    radius: f32,
    barriers: Vec<Category>,
    age: Duration,
    swept: bool,
    grace: Duration,
    max_lifetime: Duration,
}

/// First body a projectile touched during a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Hit {
    Barrier,
    Enemy(EnemyId),
}

impl Projectile {
    /// Launches a projectile from `origin`; instant shots reach `reach` units.
    pub(crate) fn launch(
        id: ProjectileId,
        tower: TowerId,
        origin: Vec2,
        direction: Vec2,
        damage: f32,
        reach: f32,
        spec: &ProjectileSpec,
    ) -> Self {
        let direction = direction.try_normalize().unwrap_or(Vec2::Y);
        let motion = if spec.is_instant() {
            Motion::Instant {
                reach: reach.max(0.0),
            }
        } else {
            Motion::Travelling { speed: spec.speed }
        };

        Self {
            id,
            tower,
            position: origin,
            direction,
            damage,
            origin,
            motion,
            radius: spec.radius.max(0.0),
            barriers: spec.barrier_categories.clone(),
            age: Duration::ZERO,
            swept: false,
            grace: spec.grace_window(),
            max_lifetime: spec.max_lifetime(),
        }
    }

    /// Reports whether the projectile still ignores its own tower.
    pub(crate) fn is_newly_spawned(&self) -> bool {
        self.age <= self.grace
    }

    /// Instant shots live for one collision step, travelling ones until the lifetime fallback.
    pub(crate) fn is_expired(&self) -> bool {
        let spent = self.swept && matches!(self.motion, Motion::Instant { .. });
        spent || self.age >= self.max_lifetime
    }

    /// Ages the projectile and returns the segment it swept during the step.
    pub(crate) fn step(&mut self, dt: Duration) -> (Vec2, Vec2) {
        self.age = self.age.saturating_add(dt);
        self.swept = true;
        match self.motion {
            Motion::Travelling { speed } => {
                let start = self.position;
                self.position += self.direction * speed * dt.as_secs_f32();
                (start, self.position)
            }
            Motion::Instant { reach } => (self.origin, self.origin + self.direction * reach),
        }
    }

    /// Finds the first body along `start..end`, preferring barriers on ties.
    pub(crate) fn first_hit(
        &self,
        (start, end): (Vec2, Vec2),
        colliders: &[Collider],
        towers: &TowerRegistry,
        enemies: &BTreeMap<EnemyId, Enemy>,
    ) -> Option<Hit> {
        let barrier = self.first_barrier(start, end, colliders, towers);

        let mut enemy: Option<(f32, EnemyId)> = None;
        for candidate in enemies.values() {
            let Some(entry) =
                segment_circle_entry(start, end, candidate.position, candidate.radius + self.radius)
            else {
                continue;
            };
            if enemy.map_or(true, |(best, _)| entry < best) {
                enemy = Some((entry, candidate.id));
            }
        }

        match (barrier, enemy) {
            (Some(barrier), Some((entry, id))) if entry < barrier => Some(Hit::Enemy(id)),
            (Some(_), _) => Some(Hit::Barrier),
            (None, Some((_, id))) => Some(Hit::Enemy(id)),
            (None, None) => None,
        }
    }

    fn first_barrier(
        &self,
        start: Vec2,
        end: Vec2,
        colliders: &[Collider],
        towers: &TowerRegistry,
    ) -> Option<f32> {
        let statics = colliders
            .iter()
            .filter(|collider| self.barriers.contains(&collider.category))
            .filter_map(|collider| collider.shape.segment_entry(start, end, self.radius));

        let grace = self.is_newly_spawned();
        let bodies = towers
            .iter()
            .filter(|_| self.barriers.contains(&Category::Tower))
            .filter(|tower| !(grace && tower.id == self.tower))
            .filter_map(|tower| {
                segment_circle_entry(start, end, tower.position, tower.body_radius + self.radius)
            });

        statics.chain(bodies).reduce(f32::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reef_defence_core::{
        AttackStyle, ColliderId, EnemyTemplate, Shape, TowerTemplate, TowerTemplateId, WaveNumber,
    };
    use reef_defence_progression::Progression;

    fn spec(speed: f32, barriers: Vec<Category>) -> ProjectileSpec {
        ProjectileSpec {
            speed,
            barrier_categories: barriers,
            ..ProjectileSpec::default()
        }
    }

    fn enemy_at(id: u32, position: Vec2) -> (EnemyId, Enemy) {
        let template = EnemyTemplate {
            name: "Eel".into(),
            speed: 0.0,
            health: 10.0,
            reward: 1,
            leak_damage: 1,
            radius: 0.25,
        };
        let id = EnemyId::new(id);
        (
            id,
            Enemy::spawn(id, &template, WaveNumber::new(1), position),
        )
    }

    fn towers_with_one_at_origin() -> TowerRegistry {
        let template = TowerTemplate {
            name: "Coral".into(),
            damage: 1.0,
            range: 5.0,
            attack_speed: 1.0,
            cost: 0,
            unit_cap: 1,
            upgrade_cost: 1,
            max_level: 5,
            placement_radius: 0.5,
            attack: AttackStyle::default(),
        };
        let mut towers = TowerRegistry::new();
        let _ = towers.insert(
            TowerTemplateId::new(0),
            &template,
            Vec2::ZERO,
            Progression::seeded(&template),
        );
        towers
    }

    #[test]
    fn instant_shot_hits_the_nearest_enemy_on_the_segment() {
        let projectile = Projectile::launch(
            ProjectileId::new(0),
            TowerId::new(0),
            Vec2::ZERO,
            Vec2::X,
            5.0,
            10.0,
            &spec(0.0, vec![Category::Barrier]),
        );
        let enemies: BTreeMap<_, _> = [
            enemy_at(0, Vec2::new(6.0, 0.0)),
            enemy_at(1, Vec2::new(3.0, 0.0)),
        ]
        .into_iter()
        .collect();
        let mut fired = projectile.clone();
        let segment = fired.step(Duration::from_millis(16));

        let hit = projectile.first_hit(segment, &[], &TowerRegistry::new(), &enemies);

        assert_eq!(hit, Some(Hit::Enemy(EnemyId::new(1))));
    }

    #[test]
    fn barrier_in_front_of_enemy_absorbs_the_shot() {
        let mut projectile = Projectile::launch(
            ProjectileId::new(0),
            TowerId::new(0),
            Vec2::ZERO,
            Vec2::X,
            5.0,
            10.0,
            &spec(0.0, vec![Category::Barrier]),
        );
        let wall = Collider::new(
            ColliderId::new(0),
            Category::Barrier,
            Shape::Rect {
                min: Vec2::new(1.0, -1.0),
                max: Vec2::new(1.5, 1.0),
            },
        );
        let enemies: BTreeMap<_, _> = [enemy_at(0, Vec2::new(3.0, 0.0))].into_iter().collect();

        let segment = projectile.step(Duration::from_millis(16));
        let hit = projectile.first_hit(segment, &[wall], &TowerRegistry::new(), &enemies);

        assert_eq!(hit, Some(Hit::Barrier));
    }

    #[test]
    fn own_tower_is_ignored_only_while_newly_spawned() {
        let towers = towers_with_one_at_origin();
        let mut projectile = Projectile::launch(
            ProjectileId::new(0),
            TowerId::new(0),
            Vec2::ZERO,
            Vec2::X,
            5.0,
            0.0,
            &spec(0.5, vec![Category::Tower]),
        );

        let segment = projectile.step(Duration::from_millis(100));
        assert!(projectile.is_newly_spawned());
        assert_eq!(
            projectile.first_hit(segment, &[], &towers, &BTreeMap::new()),
            None
        );

        let segment = projectile.step(Duration::from_millis(500));
        assert!(!projectile.is_newly_spawned());
        assert_eq!(
            projectile.first_hit(segment, &[], &towers, &BTreeMap::new()),
            Some(Hit::Barrier)
        );
    }

    #[test]
    fn travelling_projectile_moves_and_expires() {
        let mut projectile = Projectile::launch(
            ProjectileId::new(0),
            TowerId::new(0),
            Vec2::ZERO,
            Vec2::new(0.0, 2.0),
            5.0,
            3.0,
            &spec(4.0, vec![Category::Barrier]),
        );

        let (start, end) = projectile.step(Duration::from_millis(500));
        assert_eq!(start, Vec2::ZERO);
        assert!((end - Vec2::new(0.0, 2.0)).length() < 1e-6);
        assert!(!projectile.is_expired());

        let _ = projectile.step(Duration::from_secs(5));
        assert!(projectile.is_expired());
    }

    #[test]
    fn missed_instant_shot_expires_after_its_first_step() {
        let mut projectile = Projectile::launch(
            ProjectileId::new(0),
            TowerId::new(0),
            Vec2::ZERO,
            Vec2::X,
            5.0,
            10.0,
            &spec(0.0, vec![Category::Barrier]),
        );
        assert!(!projectile.is_expired());

        let segment = projectile.step(Duration::from_millis(16));
        let hit = projectile.first_hit(segment, &[], &TowerRegistry::new(), &BTreeMap::new());

        assert_eq!(hit, None);
        assert!(projectile.is_expired(), "a missed ray must not linger");
    }
}
