//! Static templates describing enemies, towers, waves and the arena layout.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{geometry::rotate_degrees, Category, Collider, EnemyTemplateId, TowerTemplateId};

const DEFAULT_MAX_LEVEL: u32 = 5;
const DEFAULT_PLACEMENT_RADIUS: f32 = 0.5;
const DEFAULT_ENEMY_RADIUS: f32 = 0.25;
const DEFAULT_LEAK_DAMAGE: u32 = 10;
const DEFAULT_PROJECTILE_RADIUS: f32 = 0.2;
const DEFAULT_GRACE_WINDOW_SECS: f32 = 0.5;
const DEFAULT_MAX_LIFETIME_SECS: f32 = 5.0;
const DEFAULT_PLAYER_HEALTH: u32 = 100;

const SINGLE_OFFSETS: [f32; 1] = [0.0];
const QUAD_OFFSETS: [f32; 4] = [0.0, 90.0, 180.0, 270.0];
const OCTO_OFFSETS: [f32; 8] = [0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0];

/// Supplies the ordered waypoints enemies walk along.
pub trait WaypointProvider {
    /// Waypoints in traversal order.
    fn ordered_waypoints(&self) -> Vec<Vec2>;
}

/// Named point along the enemy path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Display name of the waypoint.
    pub name: String,
    /// Location of the waypoint in world units.
    pub position: Vec2,
}

/// Ordered sequence of named waypoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    waypoints: Vec<Waypoint>,
}

impl Path {
    /// Creates a path from the provided waypoints.
    #[must_use]
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    /// Names of the waypoints in traversal order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.waypoints.iter().map(|waypoint| waypoint.name.as_str())
    }

    /// Looks up a waypoint by name, ignoring ASCII case.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<Vec2> {
        self.waypoints
            .iter()
            .find(|waypoint| waypoint.name.eq_ignore_ascii_case(name))
            .map(|waypoint| waypoint.position)
    }
}

impl WaypointProvider for Path {
    fn ordered_waypoints(&self) -> Vec<Vec2> {
        self.names().filter_map(|name| self.by_name(name)).collect()
    }
}

/// Combat statistics a tower fights with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Damage dealt by each hit.
    pub damage: f32,
    /// Targeting radius in world units.
    pub range: f32,
    /// Shots per second.
    pub attack_speed: f32,
}

impl TowerStats {
    /// Creates a stat block from explicit values.
    #[must_use]
    pub const fn new(damage: f32, range: f32, attack_speed: f32) -> Self {
        Self {
            damage,
            range,
            attack_speed,
        }
    }

    /// Delay between consecutive shots, `None` when the tower cannot fire.
    #[must_use]
    pub fn fire_interval(&self) -> Option<Duration> {
        if !self.attack_speed.is_finite() || self.attack_speed <= 0.0 {
            return None;
        }

        Duration::try_from_secs_f32(1.0 / self.attack_speed).ok()
    }

    /// Reports whether every stat is exactly zero.
    #[must_use]
    pub fn is_zeroed(&self) -> bool {
        self.damage == 0.0 && self.range == 0.0 && self.attack_speed == 0.0
    }
}

/// Angular spread of a projectile volley.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirePattern {
    /// One projectile straight at the target.
    #[default]
    Single,
    /// Four projectiles at quarter turns from the target direction.
    Quad,
    /// Eight projectiles at eighth turns from the target direction.
    Octo,
}

impl FirePattern {
    /// Angular offsets, in degrees, applied to the direction to the target.
    #[must_use]
    pub fn offsets_degrees(self) -> &'static [f32] {
        match self {
            Self::Single => &SINGLE_OFFSETS,
            Self::Quad => &QUAD_OFFSETS,
            Self::Octo => &OCTO_OFFSETS,
        }
    }

    /// Rotates `base` by every offset of the pattern.
    #[must_use]
    pub fn directions(self, base: Vec2) -> Vec<Vec2> {
        self.offsets_degrees()
            .iter()
            .map(|offset| rotate_degrees(base, *offset))
            .collect()
    }
}

/// Parameters of the projectiles a tower launches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileSpec {
    /// Travel speed in world units per second; zero fires instant shots.
    pub speed: f32,
    /// Collision radius of the projectile.
    pub radius: f32,
    /// Categories that destroy the projectile without dealing damage.
    pub barrier_categories: Vec<Category>,
    /// Seconds during which a fresh projectile ignores its own tower.
    pub grace_window_secs: f32,
    /// Seconds after which an unresolved projectile expires.
    pub max_lifetime_secs: f32,
}

impl ProjectileSpec {
    /// Reports whether projectiles resolve without travelling.
    #[must_use]
    pub fn is_instant(&self) -> bool {
        self.speed <= 0.0
    }

    /// Grace window expressed as a duration.
    #[must_use]
    pub fn grace_window(&self) -> Duration {
        Duration::try_from_secs_f32(self.grace_window_secs).unwrap_or(Duration::ZERO)
    }

    /// Lifetime fallback expressed as a duration.
    #[must_use]
    pub fn max_lifetime(&self) -> Duration {
        Duration::try_from_secs_f32(self.max_lifetime_secs).unwrap_or(Duration::ZERO)
    }
}

impl Default for ProjectileSpec {
    fn default() -> Self {
        Self {
            speed: 0.0,
            radius: DEFAULT_PROJECTILE_RADIUS,
            barrier_categories: vec![Category::Barrier],
            grace_window_secs: DEFAULT_GRACE_WINDOW_SECS,
            max_lifetime_secs: DEFAULT_MAX_LIFETIME_SECS,
        }
    }
}

/// How a tower delivers damage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum AttackStyle {
    /// Fires projectiles that resolve through collisions.
    Projectile {
        /// Spread of each volley.
        #[serde(default)]
        pattern: FirePattern,
        /// Projectile parameters.
        #[serde(default)]
        projectile: ProjectileSpec,
    },
    /// Damages the engaged target immediately.
    Direct,
}

impl Default for AttackStyle {
    fn default() -> Self {
        Self::Projectile {
            pattern: FirePattern::Single,
            projectile: ProjectileSpec::default(),
        }
    }
}

/// Static description of a placeable tower type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerTemplate {
    /// Display name of the tower type.
    pub name: String,
    /// Damage at level one.
    pub damage: f32,
    /// Range at level one.
    pub range: f32,
    /// Attack speed at level one.
    pub attack_speed: f32,
    /// Placement cost.
    pub cost: u32,
    /// Maximum number of towers of this type on the board.
    pub unit_cap: u32,
    /// Cost of the first upgrade.
    pub upgrade_cost: u32,
    /// Highest reachable level.
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    /// Radius kept clear of obstacles when placing.
    #[serde(default = "default_placement_radius")]
    pub placement_radius: f32,
    /// Damage delivery of the tower.
    #[serde(default)]
    pub attack: AttackStyle,
}

impl TowerTemplate {
    /// Level-one stat snapshot of the template.
    #[must_use]
    pub const fn stats(&self) -> TowerStats {
        TowerStats::new(self.damage, self.range, self.attack_speed)
    }
}

/// Static description of an enemy type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    /// Display name of the enemy type.
    pub name: String,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Starting health.
    pub health: f32,
    /// Coins granted when the enemy dies.
    pub reward: u32,
    /// Player health removed when the enemy leaks.
    #[serde(default = "default_leak_damage")]
    pub leak_damage: u32,
    /// Collision radius of the enemy body.
    #[serde(default = "default_enemy_radius")]
    pub radius: f32,
}

/// Single spawn instruction inside a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnInstruction {
    /// Enemy template to spawn.
    pub template: EnemyTemplateId,
    /// Number of enemies to spawn.
    pub count: u32,
}

/// Ordered batch of spawn instructions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    /// Instructions consumed front to back.
    #[serde(default)]
    pub spawns: Vec<SpawnInstruction>,
}

impl Wave {
    /// Creates a wave from the provided instructions.
    #[must_use]
    pub fn new(spawns: Vec<SpawnInstruction>) -> Self {
        Self { spawns }
    }

    /// Total number of enemies the wave spawns.
    #[must_use]
    pub fn total_enemies(&self) -> u32 {
        self.spawns
            .iter()
            .fold(0_u32, |total, spawn| total.saturating_add(spawn.count))
    }
}

/// Complete static layout the world simulates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    /// Path walked by every enemy.
    #[serde(default)]
    pub path: Path,
    /// Locations where enemies appear.
    #[serde(default)]
    pub spawn_points: Vec<Vec2>,
    /// Static colliders (obstacles, placable zones, barriers, leak zones).
    #[serde(default)]
    pub colliders: Vec<Collider>,
    /// Enemy table addressed by [`EnemyTemplateId`].
    #[serde(default)]
    pub enemies: Vec<EnemyTemplate>,
    /// Tower table addressed by [`TowerTemplateId`].
    #[serde(default)]
    pub towers: Vec<TowerTemplate>,
    /// Starting health of the player.
    #[serde(default = "default_player_health")]
    pub player_health: u32,
}

impl Arena {
    /// Looks up an enemy template.
    #[must_use]
    pub fn enemy(&self, id: EnemyTemplateId) -> Option<&EnemyTemplate> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.enemies.get(index))
    }

    /// Looks up a tower template.
    #[must_use]
    pub fn tower(&self, id: TowerTemplateId) -> Option<&TowerTemplate> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.towers.get(index))
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            path: Path::default(),
            spawn_points: Vec::new(),
            colliders: Vec::new(),
            enemies: Vec::new(),
            towers: Vec::new(),
            player_health: DEFAULT_PLAYER_HEALTH,
        }
    }
}

const fn default_max_level() -> u32 {
    DEFAULT_MAX_LEVEL
}

const fn default_placement_radius() -> f32 {
    DEFAULT_PLACEMENT_RADIUS
}

const fn default_leak_damage() -> u32 {
    DEFAULT_LEAK_DAMAGE
}

const fn default_enemy_radius() -> f32 {
    DEFAULT_ENEMY_RADIUS
}

const fn default_player_health() -> u32 {
    DEFAULT_PLAYER_HEALTH
}
