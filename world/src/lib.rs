#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Reef Defence.
//!
//! The world owns every live enemy, tower and projectile together with the
//! currencies and the player's health. It changes only through [`apply`] and
//! exposes read-only snapshots through the [`query`] module.

mod enemies;
mod projectiles;
mod towers;

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use reef_defence_core::{
    Arena, AttackStyle, Category, Command, EnemyId, EnemyTemplateId, EntityRef, Event, Ledger,
    PlacementError, ProjectileId, ProjectileOutcome, SpatialQuery, TowerId, TowerTemplate,
    TowerTemplateId, UpgradeError, Wallet, WaveNumber, WaypointProvider, WELCOME_BANNER,
};
use reef_defence_progression::Progression;
use tracing::{debug, info, warn};

use crate::{
    enemies::Enemy,
    projectiles::{Hit, Projectile},
    towers::TowerRegistry,
};

/// Represents the authoritative Reef Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    arena: Arena,
    waypoints: Vec<Vec2>,
    coins: Box<dyn Ledger>,
    pending_pearls: Wallet,
    banked_pearls: Wallet,
    player_health: u32,
    defeated: bool,
    victorious: bool,
    enemies: BTreeMap<EnemyId, Enemy>,
    next_enemy_id: EnemyId,
    towers: TowerRegistry,
    projectiles: BTreeMap<ProjectileId, Projectile>,
    next_projectile_id: ProjectileId,
}

impl World {
    /// Creates an empty world with no arena content and an empty purse.
    #[must_use]
    pub fn new() -> Self {
        Self::with_arena(Arena::default(), Box::new(Wallet::default()))
    }

    /// Creates a world simulating `arena` and spending from the injected coin ledger.
    #[must_use]
    pub fn with_arena(arena: Arena, coins: Box<dyn Ledger>) -> Self {
        let waypoints = arena.path.ordered_waypoints();
        if waypoints.is_empty() {
            warn!("arena path has no waypoints; enemies will stand still");
        }
        if arena.spawn_points.is_empty() {
            warn!("arena has no spawn points; waves will pass without enemies");
        }

        Self {
            banner: WELCOME_BANNER,
            player_health: arena.player_health,
            arena,
            waypoints,
            coins,
            pending_pearls: Wallet::default(),
            banked_pearls: Wallet::default(),
            defeated: false,
            victorious: false,
            enemies: BTreeMap::new(),
            next_enemy_id: EnemyId::new(0),
            towers: TowerRegistry::new(),
            projectiles: BTreeMap::new(),
            next_projectile_id: ProjectileId::new(0),
        }
    }

    fn advance_clock(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        out_events.push(Event::TimeAdvanced { dt });

        for tower in self.towers.iter_mut() {
            tower.cooldown = tower.cooldown.saturating_sub(dt);
        }

        self.move_enemies(dt.as_secs_f32(), out_events);
        self.resolve_projectiles(dt, out_events);
    }

    fn move_enemies(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        for enemy in self.enemies.values_mut() {
            enemy.advance(&self.waypoints, dt);
        }

        let leaked: Vec<EnemyId> = self
            .enemies
            .values()
            .filter(|enemy| {
                !self
                    .find_in_radius(enemy.position, enemy.radius, Category::Leak)
                    .is_empty()
            })
            .map(|enemy| enemy.id)
            .collect();

        for id in leaked {
            let Some(enemy) = self.enemies.remove(&id) else {
                continue;
            };
            debug!(
                enemy = id.get(),
                wave = enemy.wave.get(),
                damage = enemy.leak_damage,
                "enemy leaked"
            );
            out_events.push(Event::EnemyLeaked {
                enemy: id,
                damage: enemy.leak_damage,
            });
            self.damage_player(enemy.leak_damage, out_events);
        }
    }

    fn damage_player(&mut self, amount: u32, out_events: &mut Vec<Event>) {
        self.player_health = self.player_health.saturating_sub(amount);
        out_events.push(Event::PlayerDamaged {
            health: self.player_health,
        });

        if self.player_health == 0 && !self.defeated {
            self.defeated = true;
            info!("player health exhausted");
            out_events.push(Event::PlayerDefeated);
        }
    }

    fn resolve_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let ids: Vec<ProjectileId> = self.projectiles.keys().copied().collect();
        for id in ids {
            let Some(projectile) = self.projectiles.get_mut(&id) else {
                continue;
            };
            let segment = projectile.step(dt);
            let hit = projectile.first_hit(
                segment,
                &self.arena.colliders,
                &self.towers,
                &self.enemies,
            );
            let expired = projectile.is_expired();
            let damage = projectile.damage;

            let outcome = match hit {
                Some(Hit::Barrier) => ProjectileOutcome::Barrier,
                Some(Hit::Enemy(enemy)) => {
                    self.damage_enemy(enemy, damage, out_events);
                    ProjectileOutcome::Enemy { enemy, damage }
                }
                None if expired => ProjectileOutcome::Expired,
                None => continue,
            };

            let _ = self.projectiles.remove(&id);
            out_events.push(Event::ProjectileResolved {
                projectile: id,
                outcome,
            });
        }
    }

    /// Applies damage, removing and rewarding the enemy the moment it dies.
    fn damage_enemy(&mut self, id: EnemyId, amount: f32, out_events: &mut Vec<Event>) {
        let Some(enemy) = self.enemies.get_mut(&id) else {
            return;
        };

        if !enemy.take_damage(amount) {
            out_events.push(Event::EnemyDamaged {
                enemy: id,
                amount,
                health: enemy.health,
            });
            return;
        }

        let position = enemy.position;
        let reward = enemy.reward;
        let wave = enemy.wave;
        let _ = self.enemies.remove(&id);
        self.coins.add(reward);
        debug!(enemy = id.get(), wave = wave.get(), reward, "enemy died");
        out_events.push(Event::EnemyDied {
            enemy: id,
            position,
            reward,
        });
    }

    fn spawn_enemy(
        &mut self,
        template_id: EnemyTemplateId,
        spawn_point: usize,
        wave: WaveNumber,
        out_events: &mut Vec<Event>,
    ) {
        let Some(template) = self.arena.enemy(template_id) else {
            warn!(template = template_id.get(), "spawn requested for unknown enemy template");
            return;
        };
        let Some(position) = self.arena.spawn_points.get(spawn_point).copied() else {
            warn!(spawn_point, "spawn requested at unknown spawn point");
            return;
        };

        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        let enemy = Enemy::spawn(id, template, wave, position);
        let _ = self.enemies.insert(id, enemy);
        out_events.push(Event::EnemySpawned {
            enemy: id,
            template: template_id,
            position,
        });
    }

    fn fire_volley(
        &mut self,
        tower_id: TowerId,
        target: EnemyId,
        directions: Vec<Vec2>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(tower) = self.towers.get_mut(tower_id) else {
            warn!(tower = tower_id.get(), "volley requested for unknown tower");
            return;
        };
        let AttackStyle::Projectile { projectile: spec, .. } = &tower.attack else {
            warn!(tower = tower_id.get(), "direct tower cannot fire a volley");
            return;
        };
        if !tower.is_ready() || directions.is_empty() || !self.enemies.contains_key(&target) {
            debug!(tower = tower_id.get(), "volley ignored");
            return;
        }

        let stats = tower.live.stats;
        for direction in directions {
            let id = self.next_projectile_id;
            self.next_projectile_id = ProjectileId::new(id.get().saturating_add(1));
            let projectile = Projectile::launch(
                id,
                tower_id,
                tower.position,
                direction,
                stats.damage,
                stats.range,
                spec,
            );
            out_events.push(Event::ProjectileFired {
                projectile: id,
                tower: tower_id,
                direction: projectile.direction,
            });
            let _ = self.projectiles.insert(id, projectile);
        }
        tower.reload();
    }

    fn strike_enemy(&mut self, tower_id: TowerId, target: EnemyId, out_events: &mut Vec<Event>) {
        let Some(tower) = self.towers.get_mut(tower_id) else {
            warn!(tower = tower_id.get(), "strike requested for unknown tower");
            return;
        };
        if !matches!(tower.attack, AttackStyle::Direct) {
            warn!(tower = tower_id.get(), "projectile tower cannot strike directly");
            return;
        }
        let Some(enemy) = self.enemies.get(&target) else {
            return;
        };
        let stats = tower.live.stats;
        if !tower.is_ready() || tower.position.distance(enemy.position) > stats.range {
            debug!(tower = tower_id.get(), "strike ignored");
            return;
        }

        tower.reload();
        self.damage_enemy(target, stats.damage, out_events);
    }

    fn place_tower(
        &mut self,
        template_id: TowerTemplateId,
        position: Vec2,
        out_events: &mut Vec<Event>,
    ) {
        match self.try_place(template_id, position) {
            Ok(tower) => {
                info!(tower = tower.get(), template = template_id.get(), "tower placed");
                out_events.push(Event::TowerPlaced {
                    tower,
                    template: template_id,
                    position,
                });
                self.dismantle_if_degenerate(tower, out_events);
            }
            Err(reason) => {
                info!(template = template_id.get(), %reason, "tower placement rejected");
                out_events.push(Event::TowerPlacementRejected {
                    template: template_id,
                    position,
                    reason,
                });
            }
        }
    }

    fn try_place(
        &mut self,
        template_id: TowerTemplateId,
        position: Vec2,
    ) -> Result<TowerId, PlacementError> {
        let template = self
            .arena
            .tower(template_id)
            .ok_or(PlacementError::UnknownTemplate)?;
        self.check_site(template, position)?;

        if self.towers.placed_count(template_id) >= template.unit_cap {
            return Err(PlacementError::UnitCapReached);
        }
        if !self.coins.try_spend(template.cost) {
            return Err(PlacementError::InsufficientFunds);
        }

        Ok(self.towers.insert(
            template_id,
            template,
            position,
            Progression::seeded(template),
        ))
    }

    /// Spatial placement rules: clear of obstacles, then inside a placable zone.
    fn check_site(&self, template: &TowerTemplate, position: Vec2) -> Result<(), PlacementError> {
        let radius = template.placement_radius.max(0.0);
        if !self
            .find_in_radius(position, radius, Category::Obstacle)
            .is_empty()
        {
            return Err(PlacementError::NearObstacle);
        }

        let on_zone = self.arena.colliders.iter().any(|collider| {
            collider.category == Category::Placable && collider.shape.contains(position)
        });
        if !on_zone {
            return Err(PlacementError::NotPlacable);
        }

        Ok(())
    }

    fn restore_tower(
        &mut self,
        template_id: TowerTemplateId,
        position: Vec2,
        level: u32,
        out_events: &mut Vec<Event>,
    ) {
        let Some(template) = self.arena.tower(template_id) else {
            warn!(template = template_id.get(), "saved tower references unknown template");
            out_events.push(Event::TowerPlacementRejected {
                template: template_id,
                position,
                reason: PlacementError::UnknownTemplate,
            });
            return;
        };

        let progression = Progression::restored(template, level);
        let tower = self
            .towers
            .insert(template_id, template, position, progression);
        debug!(tower = tower.get(), level, "tower restored");
        out_events.push(Event::TowerPlaced {
            tower,
            template: template_id,
            position,
        });
        self.dismantle_if_degenerate(tower, out_events);
    }

    fn upgrade_tower(&mut self, tower_id: TowerId, out_events: &mut Vec<Event>) {
        let Some(tower) = self.towers.get_mut(tower_id) else {
            out_events.push(Event::TowerUpgradeRejected {
                tower: tower_id,
                reason: UpgradeError::UnknownTower,
            });
            return;
        };

        match tower
            .progression
            .upgrade_and_notify(self.coins.as_mut(), &mut tower.live)
        {
            Ok(receipt) => {
                out_events.push(Event::TowerUpgraded {
                    tower: tower_id,
                    level: receipt.level,
                    stats: receipt.stats,
                    next_cost: receipt.next_cost,
                });
                self.dismantle_if_degenerate(tower_id, out_events);
            }
            Err(reason) => out_events.push(Event::TowerUpgradeRejected {
                tower: tower_id,
                reason,
            }),
        }
    }

    fn dismantle_if_degenerate(&mut self, tower_id: TowerId, out_events: &mut Vec<Event>) {
        let degenerate = self
            .towers
            .get(tower_id)
            .is_some_and(|tower| tower.progression.is_degenerate());
        if !degenerate {
            return;
        }

        if self.towers.remove(tower_id).is_some() {
            warn!(tower = tower_id.get(), "tower has all-zero stats and was dismantled");
            out_events.push(Event::TowerDismantled { tower: tower_id });
        }
    }

    fn grant_wave_reward(
        &mut self,
        wave: WaveNumber,
        coins: u32,
        pearls: u32,
        out_events: &mut Vec<Event>,
    ) {
        self.coins.add(coins);
        self.pending_pearls.add(pearls);
        info!(wave = wave.get(), coins, pearls, "wave rewarded");
        out_events.push(Event::WaveRewarded {
            wave,
            coins,
            pearls,
        });
    }

    fn declare_victory(&mut self, bonus_pearls: u32, out_events: &mut Vec<Event>) {
        if self.victorious {
            debug!("victory already declared");
            return;
        }

        self.victorious = true;
        self.pending_pearls.add(bonus_pearls);
        let banked_pearls = self.pending_pearls.drain();
        self.banked_pearls.add(banked_pearls);
        info!(banked_pearls, "victory");
        out_events.push(Event::Victory { banked_pearls });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialQuery for World {
    fn find_in_radius(&self, center: Vec2, radius: f32, category: Category) -> Vec<EntityRef> {
        let mut found: Vec<EntityRef> = match category {
            Category::Enemy => self
                .enemies
                .values()
                .filter(|enemy| enemy.position.distance(center) <= enemy.radius + radius)
                .map(|enemy| EntityRef::Enemy(enemy.id))
                .collect(),
            Category::Tower => self
                .towers
                .iter()
                .filter(|tower| tower.position.distance(center) <= tower.body_radius + radius)
                .map(|tower| EntityRef::Tower(tower.id))
                .collect(),
            _ => Vec::new(),
        };

        found.extend(
            self.arena
                .colliders
                .iter()
                .filter(|collider| {
                    collider.category == category && collider.shape.overlaps_circle(center, radius)
                })
                .map(|collider| EntityRef::Collider(collider.id)),
        );
        found.sort();
        found
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.advance_clock(dt, out_events),
        Command::SpawnEnemy {
            template,
            spawn_point,
            wave,
        } => world.spawn_enemy(template, spawn_point, wave, out_events),
        Command::FireVolley {
            tower,
            target,
            directions,
        } => world.fire_volley(tower, target, directions, out_events),
        Command::StrikeEnemy { tower, target } => world.strike_enemy(tower, target, out_events),
        Command::PlaceTower { template, position } => {
            world.place_tower(template, position, out_events);
        }
        Command::RestoreTower {
            template,
            position,
            level,
        } => world.restore_tower(template, position, level, out_events),
        Command::UpgradeTower { tower } => world.upgrade_tower(tower, out_events),
        Command::GrantWaveReward {
            wave,
            coins,
            pearls,
        } => world.grant_wave_reward(wave, coins, pearls, out_events),
        Command::DeclareVictory { bonus_pearls } => {
            world.declare_victory(bonus_pearls, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use reef_defence_core::{
        EnemyView, Ledger, PlacementError, PlacementPreview, ProjectileId, TowerCooldownView,
        TowerId, TowerRecord, TowerTemplateId, TowerView,
    };
    use reef_defence_progression::Progression;

    use super::World;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.values().map(|enemy| enemy.snapshot()).collect())
    }

    /// Number of enemies currently alive in the arena.
    #[must_use]
    pub fn enemy_population(world: &World) -> usize {
        world.enemies.len()
    }

    /// Number of spawn points enemies may appear at.
    #[must_use]
    pub fn spawn_point_count(world: &World) -> usize {
        world.arena.spawn_points.len()
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Captures the firing readiness of every tower.
    #[must_use]
    pub fn tower_cooldowns(world: &World) -> TowerCooldownView {
        TowerCooldownView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| tower.cooldown_snapshot())
                .collect(),
        )
    }

    /// Progression record of a placed tower.
    #[must_use]
    pub fn tower_progression(world: &World, tower: TowerId) -> Option<&Progression> {
        world.towers.get(tower).map(|tower| &tower.progression)
    }

    /// Persistable description of every placed tower, ordered by identifier.
    #[must_use]
    pub fn tower_records(world: &World) -> Vec<TowerRecord> {
        world.towers.iter().map(|tower| tower.record()).collect()
    }

    /// Number of additional towers of the template that may still be placed.
    #[must_use]
    pub fn remaining_units(world: &World, template: TowerTemplateId) -> Option<u32> {
        let cap = world.arena.tower(template)?.unit_cap;
        Some(cap.saturating_sub(world.towers.placed_count(template)))
    }

    /// Evaluates the spatial placement rules without mutating the world.
    #[must_use]
    pub fn placement_preview(
        world: &World,
        template: TowerTemplateId,
        position: Vec2,
    ) -> PlacementPreview {
        let rejection = match world.arena.tower(template) {
            Some(definition) => world.check_site(definition, position).err(),
            None => Some(PlacementError::UnknownTemplate),
        };

        PlacementPreview {
            template,
            position,
            rejection,
        }
    }

    /// Current balance of the coin ledger.
    #[must_use]
    pub fn coins(world: &World) -> u32 {
        world.coins.balance()
    }

    /// Pearls earned this run that have not been banked yet.
    #[must_use]
    pub fn pending_pearls(world: &World) -> u32 {
        world.pending_pearls.balance()
    }

    /// Pearls banked by a victory.
    #[must_use]
    pub fn banked_pearls(world: &World) -> u32 {
        world.banked_pearls.balance()
    }

    /// Remaining player health.
    #[must_use]
    pub fn player_health(world: &World) -> u32 {
        world.player_health
    }

    /// Reports whether the player's health was exhausted.
    #[must_use]
    pub fn is_defeated(world: &World) -> bool {
        world.defeated
    }

    /// Reports whether victory was declared.
    #[must_use]
    pub fn is_victorious(world: &World) -> bool {
        world.victorious
    }

    /// Captures every projectile still in flight, ordered by identifier.
    #[must_use]
    pub fn projectile_view(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .values()
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                tower: projectile.tower,
                position: projectile.position,
                direction: projectile.direction,
                newly_spawned: projectile.is_newly_spawned(),
            })
            .collect()
    }

    /// Immutable representation of a projectile in flight.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ProjectileSnapshot {
        /// Identifier assigned to the projectile.
        pub id: ProjectileId,
        /// Tower that fired the projectile.
        pub tower: TowerId,
        /// Current position.
        pub position: Vec2,
        /// Normalised travel direction.
        pub direction: Vec2,
        /// Whether the projectile still ignores its own tower.
        pub newly_spawned: bool,
    }
}
