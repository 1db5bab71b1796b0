//! Per-crop growth state machine.

use std::rc::Rc;

use furrow_bus::EventBus;
use furrow_core::{CropAdvanced, CropConfig, CropId, CropState};

/// A single crop instance recycled through the crop pool.
///
/// The crop owns its own state, grow timer, and visual-stage selection.
/// Transitions run through [`Crop::set_state`], which publishes exactly
/// one [`CropAdvanced`] notification per call after all side effects are
/// applied, whether the transition came from a timer expiry or an
/// external command.
#[derive(Debug, Default)]
pub struct Crop {
    id: Option<CropId>,
    config: Option<Rc<CropConfig>>,
    state: CropState,
    grow_timer: u32,
    pending: CropState,
    visual: Option<usize>,
}

impl Crop {
    /// Current growth state.
    #[must_use]
    pub fn state(&self) -> CropState {
        self.state
    }

    /// Configuration of the planted kind; `None` while the crop sits in
    /// the pool.
    #[must_use]
    pub fn config(&self) -> Option<&Rc<CropConfig>> {
        self.config.as_ref()
    }

    /// Index of the active visual stage, if any stage has been applied.
    #[must_use]
    pub fn visual(&self) -> Option<usize> {
        self.visual
    }

    /// Remaining ticks until the pending automatic transition fires.
    /// Meaningful only while a pending state is set.
    #[must_use]
    pub fn grow_timer(&self) -> u32 {
        self.grow_timer
    }

    /// State the crop will enter automatically when the timer expires,
    /// or `CropState::None` when advancement requires an external command.
    #[must_use]
    pub fn pending(&self) -> CropState {
        self.pending
    }

    /// Binds crop data and enters the first growth state.
    pub(crate) fn initialize(&mut self, id: CropId, config: Rc<CropConfig>, bus: &EventBus) {
        self.id = Some(id);
        self.config = Some(config);
        self.set_state(CropState::Seed, bus);
    }

    /// Transitions the crop into a new state, applying timer and visual
    /// side effects before the notification fires.
    pub(crate) fn set_state(&mut self, state: CropState, bus: &EventBus) {
        let (Some(id), Some(config)) = (self.id, self.config.clone()) else {
            return;
        };

        self.state = state;
        self.pending = CropState::None;

        match self.state {
            CropState::Seed => {
                self.visual = Some(0);
                self.grow_timer = config.growth_time_seed();
                self.pending = CropState::WaterNeeded;
            }
            CropState::Sprout => {
                self.visual = Some(1);
                self.grow_timer = config.growth_time_sprout();
                self.pending = CropState::HarvestNeeded;
            }
            CropState::HarvestNeeded => {
                self.visual = Some(2);
            }
            _ => {}
        }

        bus.publish(&CropAdvanced {
            crop: id,
            kind: config.kind(),
            state: self.state,
        });
    }

    /// Advances the crop toward the pending state if one is set and its
    /// timer has expired. No-op while the crop awaits an external command.
    pub(crate) fn tick(&mut self, bus: &EventBus) {
        if self.pending == CropState::None {
            return;
        }

        self.grow_timer = self.grow_timer.saturating_sub(1);
        if self.grow_timer > 0 {
            return;
        }

        self.set_state(self.pending, bus);
    }

    /// Clears all fields without publishing; runs when the pool takes the
    /// crop back.
    pub(crate) fn reset(&mut self) {
        self.id = None;
        self.config = None;
        self.state = CropState::None;
        self.grow_timer = 0;
        self.pending = CropState::None;
        self.visual = None;
    }
}
