#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Reef Defence session headlessly.

mod layout_transfer;
mod scenario;
mod simulation;

use std::{collections::VecDeque, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use glam::Vec2;
use reef_defence_core::{TowerId, TowerTemplateId};
use reef_defence_system_placement::PlacementInput;
use reef_defence_system_wave_scheduler::WaveInput;
use reef_defence_world::query;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    layout_transfer::TowerLayoutSnapshot,
    scenario::Scenario,
    simulation::{FrameInput, Simulation},
};

/// Command-line arguments for the Reef Defence simulation.
#[derive(Debug, Parser)]
#[command(name = "reef-defence", about = "Headless Reef Defence simulation")]
struct Args {
    /// Scenario file to load instead of the bundled reef.
    #[arg(long, value_name = "PATH")]
    scenario: Option<PathBuf>,
    /// Simulated seconds to run before stopping.
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,
    /// Length of a simulation frame in milliseconds.
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    frame_ms: u64,
    /// Tower to place before the first wave, as `TEMPLATE@X,Y`.
    #[arg(long = "place", value_name = "TEMPLATE@X,Y", value_parser = parse_placement)]
    placements: Vec<PlacementRequest>,
    /// Tower identifier to upgrade once before the first wave.
    #[arg(long = "upgrade", value_name = "TOWER")]
    upgrades: Vec<u32>,
    /// Simulated second at which to skip the running wave.
    #[arg(long = "skip-at", value_name = "SECONDS")]
    skips: Vec<f32>,
    /// Layout string produced by `--export` to restore before playing.
    #[arg(long = "import", value_name = "LAYOUT")]
    import: Option<String>,
    /// Print the final tower layout as a transfer string.
    #[arg(long)]
    export: bool,
    /// Default log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Scripted tower placement requested on the command line.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PlacementRequest {
    template: TowerTemplateId,
    position: Vec2,
}

fn parse_placement(value: &str) -> Result<PlacementRequest, String> {
    let (template, position) = value
        .split_once('@')
        .ok_or_else(|| format!("expected TEMPLATE@X,Y, got `{value}`"))?;
    let (x, y) = position
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y coordinates, got `{position}`"))?;

    let template = template
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid template `{template}`: {error}"))?;
    let x = x
        .trim()
        .parse::<f32>()
        .map_err(|error| format!("invalid x coordinate `{x}`: {error}"))?;
    let y = y
        .trim()
        .parse::<f32>()
        .map_err(|error| format!("invalid y coordinate `{y}`: {error}"))?;

    Ok(PlacementRequest {
        template: TowerTemplateId::new(template),
        position: Vec2::new(x, y),
    })
}

/// Entry point for the Reef Defence command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::bundled()?,
    };
    if !args.seconds.is_finite() || args.seconds < 0.0 {
        bail!("--seconds must be a non-negative number");
    }

    let mut simulation = Simulation::new(scenario);
    println!("{}", query::welcome_banner(simulation.world()));

    if let Some(layout) = &args.import {
        let snapshot =
            TowerLayoutSnapshot::decode(layout).context("failed to import tower layout")?;
        info!(towers = snapshot.towers.len(), "restoring imported layout");
        simulation.restore(&snapshot.towers);
    }

    run(&mut simulation, &args);
    report(&simulation);

    if args.export {
        let snapshot = TowerLayoutSnapshot {
            towers: query::tower_records(simulation.world()),
        };
        println!(
            "{}",
            snapshot.encode().context("failed to export tower layout")?
        );
    }

    Ok(())
}

fn init_tracing(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .with_context(|| format!("invalid log filter `{default_level}`"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow::anyhow!(error))
        .context("failed to install tracing subscriber")
}

fn run(simulation: &mut Simulation, args: &Args) {
    let frame = Duration::from_millis(args.frame_ms);

    for request in &args.placements {
        simulation.step(
            frame,
            FrameInput {
                placement: PlacementInput::new(Some(request.template), false, true),
                cursor: Some(request.position),
                ..FrameInput::default()
            },
        );
        // Disarm in case the placement was refused.
        simulation.step(
            frame,
            FrameInput {
                placement: PlacementInput::new(None, true, false),
                ..FrameInput::default()
            },
        );
    }

    for tower in &args.upgrades {
        simulation.step(
            frame,
            FrameInput {
                upgrade: Some(TowerId::new(*tower)),
                ..FrameInput::default()
            },
        );
    }

    let mut skips: Vec<f32> = args.skips.clone();
    skips.sort_by(f32::total_cmp);
    let mut skips: VecDeque<f32> = skips.into();

    let mut elapsed = 0.0_f32;
    let mut first = true;
    while elapsed < args.seconds && !simulation.is_over() {
        let skip = skips.front().is_some_and(|at| *at <= elapsed);
        if skip {
            let _ = skips.pop_front();
        }

        simulation.step(
            frame,
            FrameInput {
                wave: WaveInput { start: first, skip },
                ..FrameInput::default()
            },
        );
        first = false;
        elapsed += frame.as_secs_f32();
    }

    // One more frame applies the commands produced by the final tick.
    simulation.step(frame, FrameInput::default());
}

fn report(simulation: &Simulation) {
    let world = simulation.world();
    let tally = simulation.tally();
    let scheduler = simulation.scheduler();

    println!("Wave {} ({:?})", scheduler.progress(), scheduler.phase());
    println!(
        "Health: {}  Coins: {}  Pearls: {} pending, {} banked",
        query::player_health(world),
        query::coins(world),
        query::pending_pearls(world),
        query::banked_pearls(world)
    );
    println!(
        "Kills: {}  Leaks: {}  Projectiles: {}  Towers placed: {}  Refusals: {}",
        tally.kills, tally.leaks, tally.projectiles, tally.placements, tally.rejections
    );

    for tower in query::tower_view(world).iter() {
        let Some(progression) = query::tower_progression(world, tower.id) else {
            continue;
        };
        let display = progression.display();
        println!(
            "Tower {} at ({:.1}, {:.1}) level {}: {}, {}, {}, {}",
            tower.id.get(),
            tower.position.x,
            tower.position.y,
            display.level,
            display.damage,
            display.range,
            display.attack_speed,
            display.upgrade_cost
        );
    }

    if query::is_victorious(world) {
        println!("The reef holds.");
    } else if query::is_defeated(world) {
        println!("The reef has fallen.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_argument_parses_template_and_position() {
        assert_eq!(
            parse_placement("2@-6.5, 3"),
            Ok(PlacementRequest {
                template: TowerTemplateId::new(2),
                position: Vec2::new(-6.5, 3.0),
            })
        );
    }

    #[test]
    fn malformed_placement_arguments_are_rejected() {
        assert!(parse_placement("harpoon@1,2").is_err());
        assert!(parse_placement("1@1").is_err());
        assert!(parse_placement("1").is_err());
    }

    #[test]
    fn arguments_parse_with_defaults() {
        let args = Args::try_parse_from(["reef-defence", "--place", "0@-6,-2", "--export"])
            .expect("arguments parse");

        assert_eq!(args.frame_ms, 50);
        assert_eq!(args.placements.len(), 1);
        assert!(args.export);
        assert!(args.scenario.is_none());
    }
}
