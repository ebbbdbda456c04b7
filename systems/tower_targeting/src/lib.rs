#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.
//!
//! A tower keeps engaging its current enemy for as long as that enemy is alive
//! and within range. Otherwise the nearest enemy in range is engaged, with ties
//! broken by the smaller enemy identifier.

use std::collections::BTreeMap;

use glam::Vec2;
use reef_defence_core::{EnemyId, EnemyView, TowerId, TowerTarget, TowerView};

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    tower_workspace: Vec<TowerWorkspace>,
    enemy_workspace: Vec<EnemyCandidate>,
    engagements: BTreeMap<TowerId, EnemyId>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enemy currently engaged by the tower, if any.
    #[must_use]
    pub fn engaged(&self, tower: TowerId) -> Option<EnemyId> {
        self.engagements.get(&tower).copied()
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments.
    pub fn handle(&mut self, towers: &TowerView, enemies: &EnemyView, out: &mut Vec<TowerTarget>) {
        out.clear();

        self.prepare_tower_workspace(towers);
        self.engagements
            .retain(|tower, _| self.tower_workspace.iter().any(|entry| entry.id == *tower));
        if self.tower_workspace.is_empty() {
            return;
        }

        self.prepare_enemy_workspace(enemies);
        if self.enemy_workspace.is_empty() {
            self.engagements.clear();
            return;
        }

        for tower in &self.tower_workspace {
            let max_distance = tower.range * tower.range;

            let engaged = self
                .engagements
                .get(&tower.id)
                .and_then(|enemy| {
                    self.enemy_workspace
                        .binary_search_by_key(enemy, |candidate| candidate.id)
                        .ok()
                })
                .map(|index| self.enemy_workspace[index])
                .filter(|candidate| {
                    candidate.position.distance_squared(tower.position) <= max_distance
                });

            let selected = engaged.or_else(|| {
                let mut best: Option<BestCandidate> = None;
                for candidate in &self.enemy_workspace {
                    let distance_sq = candidate.position.distance_squared(tower.position);
                    if distance_sq > max_distance {
                        continue;
                    }

                    let current = BestCandidate {
                        distance_sq,
                        candidate: *candidate,
                    };
                    match &mut best {
                        Some(existing) => {
                            if current.precedes(existing) {
                                *existing = current;
                            }
                        }
                        None => best = Some(current),
                    }
                }
                best.map(|best| best.candidate)
            });

            match selected {
                Some(candidate) => {
                    let _ = self.engagements.insert(tower.id, candidate.id);
                    out.push(TowerTarget {
                        tower: tower.id,
                        enemy: candidate.id,
                        tower_position: tower.position,
                        enemy_position: candidate.position,
                    });
                }
                None => {
                    let _ = self.engagements.remove(&tower.id);
                }
            }
        }
    }

    fn prepare_tower_workspace(&mut self, towers: &TowerView) {
        self.tower_workspace.clear();
        let (lower, _) = towers.iter().size_hint();
        self.tower_workspace.reserve(lower);

        for snapshot in towers.iter() {
            let range = snapshot.stats.range;
            if !range.is_finite() || range < 0.0 {
                continue;
            }

            self.tower_workspace.push(TowerWorkspace {
                id: snapshot.id,
                position: snapshot.position,
                range,
            });
        }
    }

    fn prepare_enemy_workspace(&mut self, enemies: &EnemyView) {
        self.enemy_workspace.clear();
        self.enemy_workspace.reserve(enemies.len());

        for snapshot in enemies.iter() {
            self.enemy_workspace.push(EnemyCandidate {
                id: snapshot.id,
                position: snapshot.position,
            });
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TowerWorkspace {
    id: TowerId,
    position: Vec2,
    range: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EnemyCandidate {
    id: EnemyId,
    position: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    distance_sq: f32,
    candidate: EnemyCandidate,
}

impl BestCandidate {
    fn precedes(&self, other: &Self) -> bool {
        if self.distance_sq != other.distance_sq {
            return self.distance_sq < other.distance_sq;
        }

        self.candidate.id < other.candidate.id
    }
}

#[cfg(test)]
mod tests {
    use super::{TowerTarget, TowerTargeting};
    use glam::Vec2;
    use reef_defence_core::{
        EnemyId, EnemySnapshot, EnemyView, TowerId, TowerSnapshot, TowerStats, TowerTemplateId,
        TowerView,
    };

    fn tower_view(snapshots: Vec<TowerSnapshot>) -> TowerView {
        TowerView::from_snapshots(snapshots)
    }

    fn enemy_view(snapshots: Vec<EnemySnapshot>) -> EnemyView {
        EnemyView::from_snapshots(snapshots)
    }

    fn tower_snapshot(id: u32, position: (f32, f32), range: f32) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            template: TowerTemplateId::new(0),
            position: Vec2::new(position.0, position.1),
            stats: TowerStats::new(10.0, range, 1.0),
            level: 1,
        }
    }

    fn enemy_snapshot(id: u32, position: (f32, f32)) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            position: Vec2::new(position.0, position.1),
            health: 10.0,
            radius: 0.25,
        }
    }

    #[test]
    fn targets_enemy_within_range() {
        let mut system = TowerTargeting::new();
        let towers = tower_view(vec![tower_snapshot(1, (4.0, 4.0), 3.0)]);
        let enemies = enemy_view(vec![enemy_snapshot(2, (6.0, 5.0))]);

        let mut out = Vec::new();
        system.handle(&towers, &enemies, &mut out);

        assert_eq!(
            out,
            vec![TowerTarget {
                tower: TowerId::new(1),
                enemy: EnemyId::new(2),
                tower_position: Vec2::new(4.0, 4.0),
                enemy_position: Vec2::new(6.0, 5.0),
            }]
        );
    }

    #[test]
    fn range_boundary_is_inclusive() {
        let mut system = TowerTargeting::new();
        let towers = tower_view(vec![tower_snapshot(1, (0.0, 0.0), 3.0)]);
        let enemies = enemy_view(vec![enemy_snapshot(2, (3.0, 0.0))]);

        let mut out = Vec::new();
        system.handle(&towers, &enemies, &mut out);

        assert_eq!(out.len(), 1);
    }

    #[test]
    fn enemy_outside_range_is_ignored() {
        let mut system = TowerTargeting::new();
        let towers = tower_view(vec![tower_snapshot(1, (0.0, 0.0), 3.0)]);
        let enemies = enemy_view(vec![enemy_snapshot(2, (20.0, 20.0))]);

        let mut out = Vec::new();
        system.handle(&towers, &enemies, &mut out);

        assert!(out.is_empty());
        assert_eq!(system.engaged(TowerId::new(1)), None);
    }

    #[test]
    fn smaller_enemy_id_is_preferred_when_distances_match() {
        let mut system = TowerTargeting::new();
        let towers = tower_view(vec![tower_snapshot(1, (2.0, 2.0), 5.0)]);
        let enemies = enemy_view(vec![
            enemy_snapshot(20, (4.0, 2.0)),
            enemy_snapshot(10, (0.0, 2.0)),
        ]);

        let mut out = Vec::new();
        system.handle(&towers, &enemies, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].enemy, EnemyId::new(10));
    }

    #[test]
    fn engaged_enemy_is_kept_while_in_range() {
        let mut system = TowerTargeting::new();
        let towers = tower_view(vec![tower_snapshot(1, (0.0, 0.0), 5.0)]);
        let mut out = Vec::new();

        system.handle(
            &towers,
            &enemy_view(vec![enemy_snapshot(3, (4.0, 0.0))]),
            &mut out,
        );
        assert_eq!(out[0].enemy, EnemyId::new(3));

        let closer = enemy_view(vec![
            enemy_snapshot(3, (4.5, 0.0)),
            enemy_snapshot(4, (1.0, 0.0)),
        ]);
        system.handle(&towers, &closer, &mut out);
        assert_eq!(out[0].enemy, EnemyId::new(3), "engagement is sticky");

        let escaped = enemy_view(vec![
            enemy_snapshot(3, (5.5, 0.0)),
            enemy_snapshot(4, (1.0, 0.0)),
        ]);
        system.handle(&towers, &escaped, &mut out);
        assert_eq!(out[0].enemy, EnemyId::new(4));
        assert_eq!(system.engaged(TowerId::new(1)), Some(EnemyId::new(4)));
    }

    #[test]
    fn dead_engaged_enemy_is_replaced() {
        let mut system = TowerTargeting::new();
        let towers = tower_view(vec![tower_snapshot(1, (0.0, 0.0), 5.0)]);
        let mut out = Vec::new();

        system.handle(
            &towers,
            &enemy_view(vec![
                enemy_snapshot(1, (1.0, 0.0)),
                enemy_snapshot(2, (3.0, 0.0)),
            ]),
            &mut out,
        );
        assert_eq!(out[0].enemy, EnemyId::new(1));

        system.handle(
            &towers,
            &enemy_view(vec![enemy_snapshot(2, (3.0, 0.0))]),
            &mut out,
        );
        assert_eq!(out[0].enemy, EnemyId::new(2));
    }

    #[test]
    fn empty_collections_produce_no_targets() {
        let mut system = TowerTargeting::new();
        let towers = tower_view(Vec::new());
        let enemies = enemy_view(vec![enemy_snapshot(1, (1.0, 1.0))]);

        let mut out = Vec::new();
        system.handle(&towers, &enemies, &mut out);
        assert!(out.is_empty());

        let towers = tower_view(vec![tower_snapshot(1, (0.0, 0.0), 2.0)]);
        let enemies = enemy_view(Vec::new());
        system.handle(&towers, &enemies, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn upgraded_range_brings_enemy_into_reach() {
        let mut system = TowerTargeting::new();
        let enemies = enemy_view(vec![enemy_snapshot(1, (3.3, 0.0))]);

        let mut out = Vec::new();
        system.handle(
            &tower_view(vec![tower_snapshot(1, (0.0, 0.0), 3.0)]),
            &enemies,
            &mut out,
        );
        assert!(out.is_empty());

        system.handle(
            &tower_view(vec![tower_snapshot(1, (0.0, 0.0), 3.45)]),
            &enemies,
            &mut out,
        );
        assert_eq!(out.len(), 1, "range growth takes effect immediately");
    }
}
