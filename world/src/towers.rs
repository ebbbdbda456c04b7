//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use reef_defence_core::{
    AttackStyle, Delivery, TowerCooldownSnapshot, TowerId, TowerRecord, TowerSnapshot, TowerStats,
    TowerTemplate, TowerTemplateId,
};
use reef_defence_progression::{Progression, StatsObserver};

/// Stats a tower currently fights with, replaced only by its progression.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct LiveStats {
    pub(crate) stats: TowerStats,
    pub(crate) level: u32,
}

impl StatsObserver for LiveStats {
    fn apply_stats(&mut self, stats: TowerStats, level: u32) {
        self.stats = stats;
        self.level = level;
    }
}

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Template the tower was constructed from.
    pub(crate) template: TowerTemplateId,
    /// Centre of the tower body.
    pub(crate) position: Vec2,
    /// Radius of the tower body.
    pub(crate) body_radius: f32,
    /// Damage delivery copied from the template.
    pub(crate) attack: AttackStyle,
    /// Level and stat record driving the live stats.
    pub(crate) progression: Progression,
    /// Stats pushed by the progression record.
    pub(crate) live: LiveStats,
    /// Time left before the tower may fire again.
    pub(crate) cooldown: Duration,
}

impl TowerState {
    pub(crate) fn delivery(&self) -> Delivery {
        match &self.attack {
            AttackStyle::Projectile { pattern, .. } => Delivery::Volley(*pattern),
            AttackStyle::Direct => Delivery::Strike,
        }
    }

    /// Reports whether the tower can fire right now.
    pub(crate) fn is_ready(&self) -> bool {
        self.cooldown.is_zero() && self.live.stats.fire_interval().is_some()
    }

    /// Restarts the cooldown after a shot.
    pub(crate) fn reload(&mut self) {
        self.cooldown = self.live.stats.fire_interval().unwrap_or(Duration::ZERO);
    }

    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            template: self.template,
            position: self.position,
            stats: self.live.stats,
            level: self.live.level,
        }
    }

    pub(crate) fn cooldown_snapshot(&self) -> TowerCooldownSnapshot {
        TowerCooldownSnapshot {
            tower: self.id,
            ready_in: self.cooldown,
            armed: self.live.stats.fire_interval().is_some(),
            delivery: self.delivery(),
        }
    }

    pub(crate) fn record(&self) -> TowerRecord {
        TowerRecord {
            template: self.template,
            position: self.position,
            level: self.progression.level(),
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    placed: BTreeMap<TowerTemplateId, u32>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            placed: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Builds a tower from its template and progression record and stores it.
    pub(crate) fn insert(
        &mut self,
        template_id: TowerTemplateId,
        template: &TowerTemplate,
        position: Vec2,
        progression: Progression,
    ) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));

        let live = LiveStats {
            stats: progression.stats(),
            level: progression.level(),
        };
        let state = TowerState {
            id,
            template: template_id,
            position,
            body_radius: template.placement_radius.max(0.0),
            attack: template.attack.clone(),
            progression,
            live,
            cooldown: Duration::ZERO,
        };
        let _ = self.entries.insert(id, state);

        let placed = self.placed.entry(template_id).or_insert(0);
        *placed = placed.saturating_add(1);
        id
    }

    /// Removes a tower, releasing its slot under the template's unit cap.
    pub(crate) fn remove(&mut self, id: TowerId) -> Option<TowerState> {
        let state = self.entries.remove(&id)?;
        if let Some(placed) = self.placed.get_mut(&state.template) {
            *placed = placed.saturating_sub(1);
        }
        Some(state)
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }

    /// Number of towers currently standing for the template.
    pub(crate) fn placed_count(&self, template: TowerTemplateId) -> u32 {
        self.placed.get(&template).copied().unwrap_or(0)
    }
}
