//! Scenario files describing an arena, its waves and the scheduler cadence.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use reef_defence_core::{Arena, Wave};
use reef_defence_system_wave_scheduler::Config;
use serde::Deserialize;

const DEFAULT_SCENARIO: &str = include_str!("../scenarios/default.toml");

/// Complete description of a playable session.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct Scenario {
    /// Coins in the purse before the first wave.
    #[serde(default)]
    pub(crate) starting_coins: u32,
    /// Wave scheduler cadence and reward table.
    #[serde(default)]
    pub(crate) scheduler: SchedulerSettings,
    /// Static layout and template tables.
    pub(crate) arena: Arena,
    /// Waves in play order.
    #[serde(default)]
    pub(crate) waves: Vec<Wave>,
}

impl Scenario {
    /// Parses the scenario bundled with the binary.
    pub(crate) fn bundled() -> Result<Self> {
        Self::parse(DEFAULT_SCENARIO).context("bundled scenario is invalid")
    }

    /// Reads and parses a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to load scenario at {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let scenario: Self =
            toml::from_str(contents).context("failed to parse scenario toml contents")?;

        for (index, wave) in scenario.waves.iter().enumerate() {
            for spawn in &wave.spawns {
                if scenario.arena.enemy(spawn.template).is_none() {
                    bail!(
                        "wave {} references unknown enemy template {}",
                        index + 1,
                        spawn.template.get()
                    );
                }
            }
        }

        let mut ids: Vec<u32> = scenario
            .arena
            .colliders
            .iter()
            .map(|collider| collider.id.get())
            .collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|pair| pair[0] == pair[1]) {
            bail!("scenario contains duplicate collider id {}", pair[0]);
        }

        Ok(scenario)
    }
}

/// Scheduler cadence expressed in scenario units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct SchedulerSettings {
    spawn_interval_ms: u64,
    wave_cooldown_ms: u64,
    skip_unlock_delay_ms: u64,
    seed: u64,
    base_reward: u32,
    reward_increment: u32,
    pearls_per_wave: u32,
    victory_bonus_pearls: u32,
}

impl SchedulerSettings {
    /// Builds the scheduler configuration described by the settings.
    pub(crate) const fn config(&self) -> Config {
        Config::new(
            Duration::from_millis(self.spawn_interval_ms),
            Duration::from_millis(self.wave_cooldown_ms),
            self.seed,
        )
        .with_rewards(
            self.base_reward,
            self.reward_increment,
            self.pearls_per_wave,
            self.victory_bonus_pearls,
        )
        .with_skip_unlock_delay(Duration::from_millis(self.skip_unlock_delay_ms))
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            spawn_interval_ms: 500,
            wave_cooldown_ms: 5_000,
            skip_unlock_delay_ms: 0,
            seed: 0,
            base_reward: 350,
            reward_increment: 100,
            pearls_per_wave: 50,
            victory_bonus_pearls: 100,
        }
    }
}
