#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Reef Defence simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod economy;
mod geometry;
mod templates;

pub use economy::{Ledger, Wallet};
pub use geometry::{rotate_degrees, segment_circle_entry, Collider, Shape};
pub use templates::{
    Arena, AttackStyle, EnemyTemplate, FirePattern, Path, ProjectileSpec, SpawnInstruction,
    TowerStats, TowerTemplate, Wave, Waypoint, WaypointProvider,
};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Reef Defence.";

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

identifier!(
    /// Unique identifier assigned to a live enemy.
    EnemyId
);
identifier!(
    /// Unique identifier assigned to a placed tower.
    TowerId
);
identifier!(
    /// Unique identifier assigned to a projectile in flight.
    ProjectileId
);
identifier!(
    /// Identifier of a static collider within an arena.
    ColliderId
);
identifier!(
    /// Index into the arena's enemy template table.
    EnemyTemplateId
);
identifier!(
    /// Index into the arena's tower template table.
    TowerTemplateId
);
identifier!(
    /// One-based number of a wave.
    WaveNumber
);

/// Collision categories bodies are grouped into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Hostile units walking the path.
    Enemy,
    /// Placed towers.
    Tower,
    /// Terrain that blocks tower placement.
    Obstacle,
    /// Zones towers may be placed on.
    Placable,
    /// Bodies that absorb projectiles.
    Barrier,
    /// End of the path where enemies damage the player.
    Leak,
}

/// Reference to any body a spatial query can return.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityRef {
    /// A live enemy.
    Enemy(EnemyId),
    /// A placed tower.
    Tower(TowerId),
    /// A static collider.
    Collider(ColliderId),
}

/// Radius query over every body registered with the world.
pub trait SpatialQuery {
    /// Bodies of `category` overlapping the disc, in ascending reference order.
    fn find_in_radius(&self, center: Vec2, radius: f32, category: Category) -> Vec<EntityRef>;
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// An obstacle lies within the tower's placement radius.
    #[error("an obstacle blocks the placement")]
    NearObstacle,
    /// The position is not covered by a placable zone.
    #[error("the position is not on a placable zone")]
    NotPlacable,
    /// Every unit of this tower type is already on the board.
    #[error("the unit cap for this tower type has been reached")]
    UnitCapReached,
    /// The coin ledger cannot cover the placement cost.
    #[error("not enough coins to place the tower")]
    InsufficientFunds,
    /// The requested template does not exist.
    #[error("unknown tower template")]
    UnknownTemplate,
}

/// Reasons an upgrade request may be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum UpgradeError {
    /// The tower already reached its highest level.
    #[error("the tower is already at max level")]
    MaxLevel,
    /// The coin ledger cannot cover the upgrade cost.
    #[error("not enough coins to upgrade")]
    InsufficientFunds,
    /// No tower with the provided identifier exists.
    #[error("unknown tower")]
    UnknownTower,
}

/// Side-effect free evaluation of a prospective tower position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementPreview {
    /// Template proposed for placement.
    pub template: TowerTemplateId,
    /// Position under evaluation.
    pub position: Vec2,
    /// Spatial reason the position is refused, if any.
    pub rejection: Option<PlacementError>,
}

impl PlacementPreview {
    /// Reports whether the position passes the spatial checks.
    #[must_use]
    pub const fn placeable(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Saved description of a placed tower.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerRecord {
    /// Template the tower was built from.
    pub template: TowerTemplateId,
    /// Position of the tower centre.
    pub position: Vec2,
    /// Level the tower reached.
    pub level: u32,
}

/// Final outcome of a projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProjectileOutcome {
    /// The projectile struck a barrier and dealt no damage.
    Barrier,
    /// The projectile damaged an enemy.
    Enemy {
        /// Enemy that received the damage.
        enemy: EnemyId,
        /// Damage applied.
        damage: f32,
    },
    /// The projectile outlived its maximum lifetime without a hit.
    Expired,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a new enemy appear at one of the arena's spawn points.
    SpawnEnemy {
        /// Template describing the enemy.
        template: EnemyTemplateId,
        /// Index into the arena's spawn point list.
        spawn_point: usize,
        /// Wave the enemy belongs to.
        wave: WaveNumber,
    },
    /// Requests that a tower launch a volley of projectiles.
    FireVolley {
        /// Tower firing the volley.
        tower: TowerId,
        /// Enemy the volley is aimed at.
        target: EnemyId,
        /// Normalised direction of each projectile.
        directions: Vec<Vec2>,
    },
    /// Requests that a direct-damage tower hit its target immediately.
    StrikeEnemy {
        /// Tower delivering the strike.
        tower: TowerId,
        /// Enemy receiving the strike.
        target: EnemyId,
    },
    /// Requests placement of a tower at the provided position.
    PlaceTower {
        /// Template of the tower to construct.
        template: TowerTemplateId,
        /// World position of the tower centre.
        position: Vec2,
    },
    /// Recreates a previously saved tower without charging for it.
    RestoreTower {
        /// Template of the saved tower.
        template: TowerTemplateId,
        /// World position of the saved tower.
        position: Vec2,
        /// Level the tower had reached.
        level: u32,
    },
    /// Requests an upgrade of an existing tower.
    UpgradeTower {
        /// Tower to upgrade.
        tower: TowerId,
    },
    /// Grants the rewards for a completed or skipped wave.
    GrantWaveReward {
        /// Wave that was completed.
        wave: WaveNumber,
        /// Coins credited to the coin ledger.
        coins: u32,
        /// Pearls credited to the pending pearl ledger.
        pearls: u32,
    },
    /// Declares victory after the final wave, banking every pending pearl.
    DeclareVictory {
        /// One-time pearl bonus added before banking.
        bonus_pearls: u32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy entered the arena.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Template the enemy was built from.
        template: EnemyTemplateId,
        /// Spawn location.
        position: Vec2,
    },
    /// Reports damage applied to an enemy that survived it.
    EnemyDamaged {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Damage applied.
        amount: f32,
        /// Health left after the hit.
        health: f32,
    },
    /// Reports that an enemy died; adapters play the death effect here.
    EnemyDied {
        /// Enemy that died.
        enemy: EnemyId,
        /// Location of the death effect.
        position: Vec2,
        /// Coins granted for the kill.
        reward: u32,
    },
    /// Reports that an enemy reached a leak zone.
    EnemyLeaked {
        /// Enemy that leaked.
        enemy: EnemyId,
        /// Player health removed.
        damage: u32,
    },
    /// Reports a change to the player's health pool.
    PlayerDamaged {
        /// Health left after the damage.
        health: u32,
    },
    /// Reports that the player's health pool is exhausted.
    PlayerDefeated,
    /// Confirms that a projectile was launched.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Tower that fired it.
        tower: TowerId,
        /// Travel or reach direction.
        direction: Vec2,
    },
    /// Reports how a projectile ended.
    ProjectileResolved {
        /// Projectile that resolved.
        projectile: ProjectileId,
        /// What it hit, if anything.
        outcome: ProjectileOutcome,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Template of the tower.
        template: TowerTemplateId,
        /// World position of the tower centre.
        position: Vec2,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Template requested for placement.
        template: TowerTemplateId,
        /// Position provided in the request.
        position: Vec2,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower reached a new level.
    TowerUpgraded {
        /// Tower that was upgraded.
        tower: TowerId,
        /// Level after the upgrade.
        level: u32,
        /// Stats pushed to the tower.
        stats: TowerStats,
        /// Cost of the following upgrade, absent at max level.
        next_cost: Option<u32>,
    },
    /// Reports that an upgrade request was refused.
    TowerUpgradeRejected {
        /// Tower targeted by the request.
        tower: TowerId,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Reports that a tower with all-zero stats was torn down.
    TowerDismantled {
        /// Tower that was removed.
        tower: TowerId,
    },
    /// Confirms the rewards granted for a wave.
    WaveRewarded {
        /// Wave that was rewarded.
        wave: WaveNumber,
        /// Coins granted.
        coins: u32,
        /// Pearls granted.
        pearls: u32,
    },
    /// Announces that the final wave was rewarded.
    Victory {
        /// Pearls moved into the banked ledger.
        banked_pearls: u32,
    },
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Current position.
    pub position: Vec2,
    /// Remaining health.
    pub health: f32,
    /// Collision radius.
    pub radius: f32,
}

/// Read-only snapshot describing all live enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a specific enemy.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Template the tower was built from.
    pub template: TowerTemplateId,
    /// Position of the tower centre.
    pub position: Vec2,
    /// Live stats last pushed by the tower's progression.
    pub stats: TowerStats,
    /// Current level.
    pub level: u32,
}

/// Read-only snapshot describing all towers placed within the arena.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// How a ready tower delivers its next shot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Launches projectiles spread by the pattern.
    Volley(FirePattern),
    /// Damages the target immediately.
    Strike,
}

/// Snapshot describing the firing readiness of a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerCooldownSnapshot {
    /// Tower described by the snapshot.
    pub tower: TowerId,
    /// Time left before the tower may fire again.
    pub ready_in: Duration,
    /// Whether the tower can fire at all with its current stats.
    pub armed: bool,
    /// How the tower delivers damage.
    pub delivery: Delivery,
}

/// Read-only snapshot of every tower's firing readiness.
#[derive(Clone, Debug, Default)]
pub struct TowerCooldownView {
    snapshots: Vec<TowerCooldownSnapshot>,
}

impl TowerCooldownView {
    /// Creates a new cooldown view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerCooldownSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.tower);
        Self { snapshots }
    }

    /// Consumes the view, yielding the snapshots sorted by tower.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerCooldownSnapshot> {
        self.snapshots
    }
}

/// Target assignment produced by the targeting system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Tower engaging the enemy.
    pub tower: TowerId,
    /// Enemy being engaged.
    pub enemy: EnemyId,
    /// Position of the tower centre.
    pub tower_position: Vec2,
    /// Position of the enemy.
    pub enemy_position: Vec2,
}

impl TowerTarget {
    /// Normalised direction from the tower to the enemy.
    ///
    /// Falls back to +Y when both share a position.
    #[must_use]
    pub fn direction(&self) -> Vec2 {
        let direction = (self.enemy_position - self.tower_position).normalize_or_zero();
        if direction == Vec2::ZERO {
            Vec2::Y
        } else {
            direction
        }
    }
}
