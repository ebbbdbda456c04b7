#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tower level, stat curve and upgrade economy.
//!
//! A [`Progression`] record is seeded from a tower template when the tower is
//! placed and only changes through [`Progression::upgrade`]. Successful
//! upgrades push the new stats into the owning tower through
//! [`StatsObserver`], so towers never mutate their stats on their own.

use reef_defence_core::{Ledger, TowerStats, TowerTemplate, UpgradeError};
use tracing::{debug, info};

const DAMAGE_GROWTH: f32 = 1.35;
const RANGE_GROWTH: f32 = 1.15;
const ATTACK_SPEED_GROWTH: f32 = 1.10;
const UPGRADE_COST_GROWTH: f32 = 1.8;

/// Receives the stats pushed by a progression record after an upgrade.
pub trait StatsObserver {
    /// Replaces the observer's live stats.
    fn apply_stats(&mut self, stats: TowerStats, level: u32);
}

/// Result of a successful upgrade transaction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpgradeReceipt {
    /// Level reached by the upgrade.
    pub level: u32,
    /// Stats at the new level.
    pub stats: TowerStats,
    /// Coins charged for the upgrade.
    pub spent: u32,
    /// Cost of the following upgrade, absent at max level.
    pub next_cost: Option<u32>,
}

/// Persistent level and stat record of a placed tower.
#[derive(Clone, Debug, PartialEq)]
pub struct Progression {
    level: u32,
    max_level: u32,
    stats: TowerStats,
    upgrade_cost: u32,
}

impl Progression {
    /// Creates a level-one record from the template's stat snapshot.
    #[must_use]
    pub fn seeded(template: &TowerTemplate) -> Self {
        Self {
            level: 1,
            max_level: template.max_level.max(1),
            stats: template.stats(),
            upgrade_cost: template.upgrade_cost,
        }
    }

    /// Rebuilds a record at `level` by replaying the upgrade curve for free.
    ///
    /// Levels outside `1..=max_level` are clamped.
    #[must_use]
    pub fn restored(template: &TowerTemplate, level: u32) -> Self {
        let mut progression = Self::seeded(template);
        let target = level.clamp(1, progression.max_level);
        while progression.level < target {
            progression.advance();
        }
        progression
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Stats at the current level.
    #[must_use]
    pub const fn stats(&self) -> TowerStats {
        self.stats
    }

    /// Reports whether no further upgrade is possible.
    #[must_use]
    pub const fn is_max_level(&self) -> bool {
        self.level >= self.max_level
    }

    /// Cost of the next upgrade, absent once the max level is reached.
    #[must_use]
    pub const fn upgrade_cost(&self) -> Option<u32> {
        if self.is_max_level() {
            None
        } else {
            Some(self.upgrade_cost)
        }
    }

    /// Reports whether the record carries all-zero stats.
    ///
    /// Such records come from malformed templates and their towers are torn
    /// down by the world.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.stats.is_zeroed()
    }

    /// Attempts to buy the next level from the ledger.
    ///
    /// Refusals leave both the record and the ledger untouched.
    pub fn upgrade(&mut self, ledger: &mut dyn Ledger) -> Result<UpgradeReceipt, UpgradeError> {
        debug!(
            damage = self.stats.damage,
            range = self.stats.range,
            attack_speed = self.stats.attack_speed,
            level = self.level,
            "upgrade requested"
        );

        if self.is_max_level() {
            info!(level = self.level, "tower is already at max level");
            return Err(UpgradeError::MaxLevel);
        }

        let cost = self.upgrade_cost;
        if ledger.balance() < cost || !ledger.try_spend(cost) {
            info!(cost, balance = ledger.balance(), "not enough coins to upgrade");
            return Err(UpgradeError::InsufficientFunds);
        }

        self.advance();
        debug!(level = self.level, next_cost = self.upgrade_cost, "tower upgraded");

        Ok(UpgradeReceipt {
            level: self.level,
            stats: self.stats,
            spent: cost,
            next_cost: self.upgrade_cost(),
        })
    }

    /// Upgrades and pushes the new stats into `observer` on success.
    pub fn upgrade_and_notify(
        &mut self,
        ledger: &mut dyn Ledger,
        observer: &mut dyn StatsObserver,
    ) -> Result<UpgradeReceipt, UpgradeError> {
        let receipt = self.upgrade(ledger)?;
        observer.apply_stats(receipt.stats, receipt.level);
        Ok(receipt)
    }

    /// Text lines an upgrade panel renders for this record.
    #[must_use]
    pub fn display(&self) -> ProgressionDisplay {
        let upgrade_cost = match self.upgrade_cost() {
            Some(cost) => format!("Upgrade Cost: {cost}"),
            None => "Max Upgraded".to_owned(),
        };

        ProgressionDisplay {
            damage: format!("Damage: {:.2}", self.stats.damage),
            range: format!("Range: {:.2}", self.stats.range),
            attack_speed: format!("Attack Speed: {:.2}", self.stats.attack_speed),
            level: self.level.to_string(),
            upgrade_cost,
        }
    }

    fn advance(&mut self) {
        self.stats.damage *= DAMAGE_GROWTH;
        self.stats.range *= RANGE_GROWTH;
        self.stats.attack_speed *= ATTACK_SPEED_GROWTH;
        self.level += 1;
        self.upgrade_cost = next_upgrade_cost(self.upgrade_cost);
    }
}

/// Rendered text of a progression record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressionDisplay {
    /// Damage line, two decimals.
    pub damage: String,
    /// Range line, two decimals.
    pub range: String,
    /// Attack speed line, two decimals.
    pub attack_speed: String,
    /// Current level.
    pub level: String,
    /// Upgrade cost line or the max-level notice.
    pub upgrade_cost: String,
}

fn next_upgrade_cost(cost: u32) -> u32 {
    let scaled = (cost as f32 * UPGRADE_COST_GROWTH).ceil();
    if scaled >= u32::MAX as f32 {
        u32::MAX
    } else {
        scaled as u32
    }
}
