#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure placement-mode system that arms tower templates and emits placement commands.

use reef_defence_core::{Command, Event, PlacementPreview, TowerTemplateId};

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlacementInput {
    /// Template the player selected this frame, toggling it when already armed.
    pub arm: Option<TowerTemplateId>,
    /// Indicates whether the player cancelled placement on this frame.
    pub cancel: bool,
    /// Indicates whether the player confirmed a placement on this frame.
    pub confirm: bool,
}

impl PlacementInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(arm: Option<TowerTemplateId>, cancel: bool, confirm: bool) -> Self {
        Self {
            arm,
            cancel,
            confirm,
        }
    }
}

/// Placement system that translates preview + input into placement commands.
#[derive(Clone, Debug, Default)]
pub struct Placement {
    armed: Option<TowerTemplateId>,
}

impl Placement {
    /// Creates a new placement system with nothing armed.
    #[must_use]
    pub const fn new() -> Self {
        Self { armed: None }
    }

    /// Template currently armed for placement.
    #[must_use]
    pub const fn armed(&self) -> Option<TowerTemplateId> {
        self.armed
    }

    /// Consumes world events and adapter-derived input to emit placement commands.
    ///
    /// The `remaining_units` closure should mirror the world's
    /// `query::remaining_units` helper. `preview` is the world's evaluation of
    /// the armed template at the cursor.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        input: PlacementInput,
        mut remaining_units: F,
        preview: Option<PlacementPreview>,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(TowerTemplateId) -> Option<u32>,
    {
        for event in events {
            if let Event::TowerPlaced { template, .. } = event {
                if self.armed == Some(*template) {
                    self.armed = None;
                }
            }
        }

        if input.cancel {
            self.armed = None;
        }

        if let Some(template) = input.arm {
            if self.armed == Some(template) {
                self.armed = None;
            } else if remaining_units(template).is_some_and(|remaining| remaining > 0) {
                self.armed = Some(template);
            }
        }

        if !input.confirm {
            return;
        }

        let Some(armed) = self.armed else {
            return;
        };
        if let Some(preview) = preview {
            if preview.template == armed && preview.placeable() {
                out.push(Command::PlaceTower {
                    template: armed,
                    position: preview.position,
                });
            }
        }
    }
}
