//! Frame loop wiring the world to the pure systems.

use std::time::Duration;

use glam::Vec2;
use reef_defence_core::{Command, Event, TowerId, TowerRecord, TowerTarget, Wallet};
use reef_defence_system_placement::{Placement, PlacementInput};
use reef_defence_system_tower_combat::TowerCombat;
use reef_defence_system_tower_targeting::TowerTargeting;
use reef_defence_system_wave_scheduler::{WaveInput, WaveScheduler};
use reef_defence_world::{self as world, query, World};
use tracing::{debug, info};

use crate::scenario::Scenario;

/// Player input collected for a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct FrameInput {
    /// Wave start and skip requests.
    pub(crate) wave: WaveInput,
    /// Placement arming, cancel and confirm requests.
    pub(crate) placement: PlacementInput,
    /// Cursor position in world units, used for the placement preview.
    pub(crate) cursor: Option<Vec2>,
    /// Tower the player asked to upgrade.
    pub(crate) upgrade: Option<TowerId>,
}

/// Running totals reported once the session ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Tally {
    pub(crate) kills: u32,
    pub(crate) leaks: u32,
    pub(crate) projectiles: u32,
    pub(crate) placements: u32,
    pub(crate) rejections: u32,
}

impl Tally {
    fn record(&mut self, event: &Event) {
        match event {
            Event::EnemyDied { .. } => self.kills += 1,
            Event::EnemyLeaked { .. } => self.leaks += 1,
            Event::ProjectileFired { .. } => self.projectiles += 1,
            Event::TowerPlaced { .. } => self.placements += 1,
            Event::TowerPlacementRejected { .. } | Event::TowerUpgradeRejected { .. } => {
                self.rejections += 1;
            }
            _ => {}
        }
    }
}

/// Session combining the authoritative world with every pure system.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    scheduler: WaveScheduler,
    targeting: TowerTargeting,
    combat: TowerCombat,
    placement: Placement,
    carried_events: Vec<Event>,
    targets: Vec<TowerTarget>,
    tally: Tally,
}

impl Simulation {
    /// Builds a session from the scenario with a fresh coin purse.
    pub(crate) fn new(scenario: Scenario) -> Self {
        let config = scenario.scheduler.config();
        let coins = Wallet::with_balance(scenario.starting_coins);
        Self {
            world: World::with_arena(scenario.arena, Box::new(coins)),
            scheduler: WaveScheduler::new(config, scenario.waves),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            placement: Placement::new(),
            carried_events: Vec::new(),
            targets: Vec::new(),
            tally: Tally::default(),
        }
    }

    /// Read-only access to the world for queries.
    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn scheduler(&self) -> &WaveScheduler {
        &self.scheduler
    }

    pub(crate) fn tally(&self) -> Tally {
        self.tally
    }

    /// Reports whether the session reached victory or defeat.
    pub(crate) fn is_over(&self) -> bool {
        query::is_defeated(&self.world) || query::is_victorious(&self.world)
    }

    /// Recreates saved towers for free.
    pub(crate) fn restore(&mut self, records: &[TowerRecord]) {
        let commands = records.iter().map(|record| Command::RestoreTower {
            template: record.template,
            position: record.position,
            level: record.level,
        });
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        self.absorb(&events);
        self.carried_events.extend(events);
    }

    /// Advances the session by one frame of `dt`.
    pub(crate) fn step(&mut self, dt: Duration, input: FrameInput) {
        let mut events = std::mem::take(&mut self.carried_events);
        let carried = events.len();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);
        if let Some(tower) = input.upgrade {
            world::apply(&mut self.world, Command::UpgradeTower { tower }, &mut events);
        }

        let mut commands = Vec::new();
        self.scheduler.handle(
            &events,
            input.wave,
            query::enemy_population(&self.world),
            query::spawn_point_count(&self.world),
            &mut commands,
        );

        self.targeting.handle(
            &query::tower_view(&self.world),
            &query::enemy_view(&self.world),
            &mut self.targets,
        );
        self.combat.handle(
            query::tower_cooldowns(&self.world),
            &self.targets,
            &mut commands,
        );

        let armed = input.placement.arm.or(self.placement.armed());
        let preview = armed
            .zip(input.cursor)
            .map(|(template, cursor)| query::placement_preview(&self.world, template, cursor));
        let world = &self.world;
        self.placement.handle(
            &events,
            input.placement,
            |template| query::remaining_units(world, template),
            preview,
            &mut commands,
        );

        self.absorb(&events[carried..]);

        let mut produced = Vec::new();
        for command in commands {
            debug!(?command, "applying command");
            world::apply(&mut self.world, command, &mut produced);
        }
        self.absorb(&produced);
        self.carried_events = produced;
    }

    /// Folds events into the tally and logs the milestones among them.
    fn absorb(&mut self, events: &[Event]) {
        for event in events {
            self.tally.record(event);
            match event {
                Event::WaveRewarded { wave, coins, pearls } => {
                    info!(wave = wave.get(), coins, pearls, "wave rewarded");
                }
                Event::Victory { banked_pearls } => info!(banked_pearls, "victory"),
                Event::PlayerDefeated => info!("the reef has fallen"),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reef_defence_core::TowerTemplateId;
    use reef_defence_system_wave_scheduler::Phase;

    const FRAME: Duration = Duration::from_millis(100);

    fn simulation() -> Simulation {
        Simulation::new(Scenario::bundled().expect("bundled scenario parses"))
    }

    fn start() -> FrameInput {
        FrameInput {
            wave: WaveInput {
                start: true,
                skip: false,
            },
            ..FrameInput::default()
        }
    }

    #[test]
    fn armed_confirm_places_a_tower_and_disarms() {
        let mut simulation = simulation();
        let harpoon = TowerTemplateId::new(0);

        simulation.step(
            FRAME,
            FrameInput {
                placement: PlacementInput::new(Some(harpoon), false, true),
                cursor: Some(Vec2::new(-6.0, -2.0)),
                ..FrameInput::default()
            },
        );
        assert_eq!(query::coins(simulation.world()), 700);
        assert_eq!(query::tower_view(simulation.world()).iter().count(), 1);

        simulation.step(FRAME, FrameInput::default());
        assert_eq!(simulation.placement.armed(), None);
        assert_eq!(simulation.tally().placements, 1);
    }

    #[test]
    fn waves_spawn_enemies_that_towers_engage() {
        let mut simulation = simulation();
        simulation.restore(&[TowerRecord {
            template: TowerTemplateId::new(3),
            position: Vec2::new(-8.0, -1.5),
            level: 1,
        }]);

        simulation.step(FRAME, start());
        assert_eq!(simulation.scheduler().phase(), Phase::Spawning);
        for _ in 0..50 {
            simulation.step(FRAME, FrameInput::default());
        }

        assert!(simulation.tally().kills > 0, "the eel should land strikes");
        assert!(query::coins(simulation.world()) > 1000);
    }

    #[test]
    fn undefended_reef_eventually_leaks() {
        let mut simulation = simulation();
        simulation.step(FRAME, start());
        for _ in 0..400 {
            simulation.step(FRAME, FrameInput::default());
        }

        assert!(simulation.tally().leaks > 0);
        assert!(query::player_health(simulation.world()) < 100);
    }
}
