#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns target assignments into firing commands.

use reef_defence_core::{
    Command, Delivery, TowerCooldownSnapshot, TowerCooldownView, TowerId, TowerTarget,
};

/// Tower combat system that queues firing commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireVolley` or `Command::StrikeEnemy` for every armed
    /// tower whose cooldown has elapsed.
    ///
    /// Volleys are spread by the tower's pattern around the direction to the
    /// target.
    pub fn handle(
        &mut self,
        tower_cooldowns: TowerCooldownView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        if tower_targets.is_empty() {
            return;
        }

        let cooldowns = tower_cooldowns.into_vec();
        if cooldowns.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in tower_targets {
            let Some(snapshot) = find_cooldown(&cooldowns, target.tower) else {
                continue;
            };
            if !snapshot.armed || !snapshot.ready_in.is_zero() {
                continue;
            }

            let command = match snapshot.delivery {
                Delivery::Volley(pattern) => Command::FireVolley {
                    tower: target.tower,
                    target: target.enemy,
                    directions: pattern.directions(target.direction()),
                },
                Delivery::Strike => Command::StrikeEnemy {
                    tower: target.tower,
                    target: target.enemy,
                },
            };
            self.scratch.push(command);
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

fn find_cooldown(
    cooldowns: &[TowerCooldownSnapshot],
    tower: TowerId,
) -> Option<&TowerCooldownSnapshot> {
    cooldowns
        .binary_search_by_key(&tower, |snapshot| snapshot.tower)
        .ok()
        .map(|index| &cooldowns[index])
}
