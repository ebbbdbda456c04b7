#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduler that walks the wave list and emits spawn and
//! reward commands.
//!
//! The scheduler is a pure system: it observes `TimeAdvanced` events, the
//! player's wave inputs and the live enemy population reported by the world,
//! and answers with [`Command::SpawnEnemy`], [`Command::GrantWaveReward`] and
//! [`Command::DeclareVictory`].

use std::{fmt, time::Duration};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use reef_defence_core::{Command, EnemyTemplateId, Event, Wave, WaveNumber};
use tracing::{debug, info, warn};

const DEFAULT_SPAWN_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_WAVE_COOLDOWN: Duration = Duration::from_secs(5);
const DEFAULT_BASE_REWARD: u32 = 350;
const DEFAULT_REWARD_INCREMENT: u32 = 100;
const DEFAULT_PEARLS_PER_WAVE: u32 = 50;
const DEFAULT_VICTORY_BONUS: u32 = 100;
const DEFAULT_RNG_SEED: u64 = 0x5eed_c0a1_d00d_f00d;

/// Configuration parameters required to construct the wave scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    spawn_interval: Duration,
    wave_cooldown: Duration,
    base_reward: u32,
    reward_increment: u32,
    pearls_per_wave: u32,
    victory_bonus_pearls: u32,
    skip_unlock_delay: Duration,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration with the provided cadence and seed and the
    /// default reward table.
    #[must_use]
    pub const fn new(spawn_interval: Duration, wave_cooldown: Duration, rng_seed: u64) -> Self {
        Self {
            spawn_interval,
            wave_cooldown,
            base_reward: DEFAULT_BASE_REWARD,
            reward_increment: DEFAULT_REWARD_INCREMENT,
            pearls_per_wave: DEFAULT_PEARLS_PER_WAVE,
            victory_bonus_pearls: DEFAULT_VICTORY_BONUS,
            skip_unlock_delay: Duration::ZERO,
            rng_seed,
        }
    }

    /// Replaces the reward table.
    #[must_use]
    pub const fn with_rewards(
        mut self,
        base_reward: u32,
        reward_increment: u32,
        pearls_per_wave: u32,
        victory_bonus_pearls: u32,
    ) -> Self {
        self.base_reward = base_reward;
        self.reward_increment = reward_increment;
        self.pearls_per_wave = pearls_per_wave;
        self.victory_bonus_pearls = victory_bonus_pearls;
        self
    }

    /// Delays the skip input until the wave has run for `delay`.
    #[must_use]
    pub const fn with_skip_unlock_delay(mut self, delay: Duration) -> Self {
        self.skip_unlock_delay = delay;
        self
    }

    /// Coins granted for completing `wave`.
    #[must_use]
    pub const fn coin_reward(&self, wave: WaveNumber) -> u32 {
        let steps = wave.get().saturating_sub(1);
        self.base_reward
            .saturating_add(steps.saturating_mul(self.reward_increment))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SPAWN_INTERVAL, DEFAULT_WAVE_COOLDOWN, DEFAULT_RNG_SEED)
    }
}

/// Life-cycle phase of the current wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for the player to start the first wave.
    Idle,
    /// Emitting the wave's spawn instructions.
    Spawning,
    /// Waiting for the live population to reach zero.
    AwaitingClear,
    /// Granting the wave's rewards.
    Rewarding,
    /// Pausing before the next wave.
    Cooldown,
    /// Every wave has been rewarded.
    Completed,
}

/// Player inputs relevant to the wave life cycle for a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaveInput {
    /// Start button pressed.
    pub start: bool,
    /// Skip button pressed.
    pub skip: bool,
}

/// Wave counter rendered as `current/total`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveProgress {
    /// One-based number of the current wave, zero before the first starts.
    pub current: u32,
    /// Number of waves in the sequence.
    pub total: u32,
}

impl fmt::Display for WaveProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.total)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct SpawnCursor {
    instruction: usize,
    emitted: u32,
    remaining: u32,
}

/// Pure system that drives waves from start to victory.
#[derive(Debug)]
pub struct WaveScheduler {
    config: Config,
    waves: Vec<Wave>,
    phase: Phase,
    wave_index: usize,
    cursor: SpawnCursor,
    timer: Duration,
    wave_elapsed: Duration,
    rng: ChaCha8Rng,
}

impl WaveScheduler {
    /// Creates a scheduler that will walk `waves` front to back.
    #[must_use]
    pub fn new(config: Config, waves: Vec<Wave>) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
            waves,
            phase: Phase::Idle,
            wave_index: 0,
            cursor: SpawnCursor::default(),
            timer: Duration::ZERO,
            wave_elapsed: Duration::ZERO,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Wave counter for the progress display.
    #[must_use]
    pub fn progress(&self) -> WaveProgress {
        let total = u32::try_from(self.waves.len()).unwrap_or(u32::MAX);
        let current = match self.phase {
            Phase::Idle => 0,
            _ => self.current_wave().get(),
        };
        WaveProgress { current, total }
    }

    /// Reports whether the skip input would currently be honoured.
    ///
    /// The final wave can only end by being cleared.
    #[must_use]
    pub fn skip_available(&self) -> bool {
        matches!(self.phase, Phase::Spawning | Phase::AwaitingClear)
            && self.wave_index + 1 < self.waves.len()
            && self.wave_elapsed >= self.config.skip_unlock_delay
    }

    /// Consumes events, inputs and the world's live population to emit commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        input: WaveInput,
        live_population: usize,
        spawn_points: usize,
        out: &mut Vec<Command>,
    ) {
        let dt = elapsed(events);

        if matches!(self.phase, Phase::Spawning | Phase::AwaitingClear) {
            self.wave_elapsed = self.wave_elapsed.saturating_add(dt);
            if input.skip && self.skip_available() {
                info!(wave = self.current_wave().get(), "wave skipped");
                self.cursor.remaining = 0;
                self.phase = Phase::Rewarding;
            }
        }

        match self.phase {
            Phase::Idle => {
                if input.start {
                    self.begin_wave(0, spawn_points, out);
                }
            }
            Phase::Spawning => self.advance_spawning(dt, spawn_points, out),
            Phase::AwaitingClear => {
                if live_population == 0 {
                    debug!(wave = self.current_wave().get(), "wave cleared");
                    self.phase = Phase::Rewarding;
                }
            }
            Phase::Cooldown => {
                self.timer = self.timer.saturating_add(dt);
                if self.timer >= self.config.wave_cooldown {
                    let next = self.wave_index + 1;
                    if next < self.waves.len() {
                        self.begin_wave(next, spawn_points, out);
                    } else {
                        info!("all waves completed");
                        self.phase = Phase::Completed;
                    }
                }
            }
            Phase::Rewarding => self.grant_rewards(out),
            Phase::Completed => {}
        }
    }

    fn current_wave(&self) -> WaveNumber {
        let number = u32::try_from(self.wave_index + 1).unwrap_or(u32::MAX);
        WaveNumber::new(number)
    }

    fn begin_wave(&mut self, index: usize, spawn_points: usize, out: &mut Vec<Command>) {
        let Some(wave) = self.waves.get(index) else {
            warn!("no waves configured");
            self.phase = Phase::Completed;
            return;
        };

        self.wave_index = index;
        self.timer = Duration::ZERO;
        self.wave_elapsed = Duration::ZERO;
        self.cursor = SpawnCursor {
            remaining: wave.total_enemies(),
            ..SpawnCursor::default()
        };
        info!(
            wave = self.current_wave().get(),
            enemies = self.cursor.remaining,
            "wave started"
        );

        if spawn_points == 0 {
            warn!("arena has no spawn points; wave passes without enemies");
            self.cursor.remaining = 0;
        }
        if self.cursor.remaining == 0 {
            self.phase = Phase::Rewarding;
            return;
        }

        self.phase = Phase::Spawning;
        self.emit_spawn(spawn_points, out);
    }

    fn advance_spawning(&mut self, dt: Duration, spawn_points: usize, out: &mut Vec<Command>) {
        self.timer = self.timer.saturating_add(dt);
        while self.timer >= self.config.spawn_interval {
            self.timer -= self.config.spawn_interval;
            if self.cursor.remaining == 0 {
                self.phase = Phase::AwaitingClear;
                return;
            }
            self.emit_spawn(spawn_points, out);
        }
    }

    fn emit_spawn(&mut self, spawn_points: usize, out: &mut Vec<Command>) {
        if spawn_points == 0 {
            warn!("spawn points vanished; cancelling remaining spawns");
            self.cursor.remaining = 0;
            return;
        }
        let Some(template) = self.next_template() else {
            self.cursor.remaining = 0;
            return;
        };

        let spawn_point = self.rng.gen_range(0..spawn_points);
        self.cursor.remaining = self.cursor.remaining.saturating_sub(1);
        debug!(
            template = template.get(),
            spawn_point,
            remaining = self.cursor.remaining,
            "enemy spawn scheduled"
        );
        out.push(Command::SpawnEnemy {
            template,
            spawn_point,
            wave: self.current_wave(),
        });
    }

    fn next_template(&mut self) -> Option<EnemyTemplateId> {
        let wave = self.waves.get(self.wave_index)?;
        while let Some(instruction) = wave.spawns.get(self.cursor.instruction) {
            if self.cursor.emitted < instruction.count {
                self.cursor.emitted += 1;
                return Some(instruction.template);
            }
            self.cursor.instruction += 1;
            self.cursor.emitted = 0;
        }
        None
    }

    fn grant_rewards(&mut self, out: &mut Vec<Command>) {
        let wave = self.current_wave();
        let coins = self.config.coin_reward(wave);
        let pearls = self.config.pearls_per_wave;
        info!(wave = wave.get(), coins, pearls, "granting wave rewards");
        out.push(Command::GrantWaveReward {
            wave,
            coins,
            pearls,
        });

        if self.wave_index + 1 >= self.waves.len() {
            out.push(Command::DeclareVictory {
                bonus_pearls: self.config.victory_bonus_pearls,
            });
        }

        self.phase = Phase::Cooldown;
        self.timer = Duration::ZERO;
    }
}

fn elapsed(events: &[Event]) -> Duration {
    events
        .iter()
        .filter_map(|event| match event {
            Event::TimeAdvanced { dt } => Some(*dt),
            _ => None,
        })
        .fold(Duration::ZERO, Duration::saturating_add)
}
