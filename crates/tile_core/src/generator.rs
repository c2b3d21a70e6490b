//! Generator control surface.
//!
//! Wraps a [`CollapseScheduler`] with the lifecycle a host drives: `start`
//! a run over a catalog, `tick` it with frame time or `run_to_completion`,
//! `stop` it. After every step the host's [`FeedbackSink`] receives the
//! outcome and a view of every cell.

use crate::catalog::{Catalog, PrototypeId};
use crate::cell::VisualHandle;
use crate::config::GeneratorConfig;
use crate::error::GeneratorError;
use crate::grid::{Grid, Position};
use crate::playback::PlaybackState;
use crate::possibility::{PossibilityId, PossibilitySpace};
use crate::rng::StdRandom;
use crate::scheduler::{CollapseScheduler, SchedulerState, StepOutcome};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// What a renderer needs to know about one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellView {
    pub position: Position,
    /// Remaining possibility count.
    pub entropy: usize,
    pub resolved: Option<PossibilityId>,
    pub handle: Option<VisualHandle>,
    /// Set on an emptied cell, and on a resolved cell the run contradicted
    /// at. The latter keeps its possibility, so `entropy` alone misses it.
    #[serde(default)]
    pub failed: bool,
}

/// Receives per-step feedback from a running generator.
pub trait FeedbackSink {
    fn on_step(&mut self, step: usize, outcome: &StepOutcome, cells: &[CellView]);
}

/// Sink that ignores every step.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FeedbackSink for NullSink {
    fn on_step(&mut self, _step: usize, _outcome: &StepOutcome, _cells: &[CellView]) {}
}

pub struct Generator {
    config: GeneratorConfig,
    catalog: Option<Catalog>,
    scheduler: Option<CollapseScheduler>,
    playback: PlaybackState,
    steps: usize,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        let playback = PlaybackState::new(config.tick_interval());
        Self {
            config,
            catalog: None,
            scheduler: None,
            playback,
            steps: 0,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Seed used by the next `start`.
    pub fn set_seed(&mut self, seed: u64) {
        self.config.seed = seed;
    }

    pub fn set_tick_interval(&mut self, tick_interval: Duration) {
        self.config.tick_interval_ms = tick_interval.as_millis() as u64;
        self.playback.set_tick_interval(tick_interval);
    }

    /// Begin a new run. A run already in progress is discarded.
    pub fn start(
        &mut self,
        width: usize,
        height: usize,
        catalog: &Catalog,
    ) -> Result<(), GeneratorError> {
        if self.is_running() {
            warn!("Generator restarted while a run was in progress; discarding it");
        }
        self.scheduler = None;
        self.catalog = None;

        let space = PossibilitySpace::build(catalog, self.config.blank_prototypes)?;
        let possibilities = space.len();
        let grid = Grid::new(width, height, space, self.config.entropy_formula)?;
        let rng = StdRandom::from_seed(self.config.seed);

        self.scheduler = Some(CollapseScheduler::new(grid, Box::new(rng)));
        self.catalog = Some(catalog.clone());
        self.steps = 0;
        self.playback.reset();
        self.playback.play();

        info!(
            "Started {}x{} run with {} possibilities (seed {})",
            width, height, possibilities, self.config.seed
        );
        Ok(())
    }

    /// Halt between ticks. The partial grid stays readable.
    pub fn stop(&mut self) {
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.stop();
            debug!("Generator stopped after {} steps", self.steps);
        }
        self.playback.pause();
    }

    /// Feed host frame time and run the steps that are due. Returns the
    /// last outcome, or `None` if no step was due.
    pub fn tick(
        &mut self,
        elapsed: Duration,
        sink: &mut dyn FeedbackSink,
    ) -> Result<Option<StepOutcome>, GeneratorError> {
        if self.scheduler.is_none() {
            return Err(GeneratorError::NotStarted);
        }

        let due = self.playback.advance(elapsed);
        let mut last = None;
        for _ in 0..due {
            let outcome = self.step_once(sink)?;
            last = Some(outcome);
            if outcome.is_terminal() {
                self.playback.complete();
                break;
            }
        }
        Ok(last)
    }

    /// Step until the run resolves, contradicts or is stopped.
    pub fn run_to_completion(
        &mut self,
        sink: &mut dyn FeedbackSink,
    ) -> Result<StepOutcome, GeneratorError> {
        if self.scheduler.is_none() {
            return Err(GeneratorError::NotStarted);
        }
        loop {
            let outcome = self.step_once(sink)?;
            if outcome.is_terminal() {
                self.playback.complete();
                return Ok(outcome);
            }
        }
    }

    fn step_once(&mut self, sink: &mut dyn FeedbackSink) -> Result<StepOutcome, GeneratorError> {
        let scheduler = self.scheduler.as_mut().ok_or(GeneratorError::NotStarted)?;
        let outcome = scheduler.step()?;
        self.steps += 1;
        let views = self.cell_views();
        sink.on_step(self.steps, &outcome, &views);
        Ok(outcome)
    }

    /// Change a prototype's weight for the rest of the run.
    pub fn set_weight(
        &mut self,
        prototype: PrototypeId,
        weight: u32,
    ) -> Result<(), GeneratorError> {
        let (Some(catalog), Some(scheduler)) = (self.catalog.as_mut(), self.scheduler.as_mut())
        else {
            return Err(GeneratorError::NotStarted);
        };
        catalog.set_weight(prototype, weight)?;
        scheduler.set_prototype_weight(prototype, weight);
        Ok(())
    }

    /// Attach a host handle to a cell. Returns false if out of bounds or
    /// not started.
    pub fn set_handle(&mut self, position: Position, handle: Option<VisualHandle>) -> bool {
        self.scheduler
            .as_mut()
            .is_some_and(|s| s.set_handle(position, handle))
    }

    pub fn cell_views(&self) -> Vec<CellView> {
        let Some(grid) = self.grid() else {
            return Vec::new();
        };
        let contradicted = match self.state() {
            Some(SchedulerState::Contradicted { position }) => Some(position),
            _ => None,
        };
        grid.cells()
            .iter()
            .map(|cell| CellView {
                position: cell.position(),
                entropy: cell.entropy(),
                resolved: cell.resolved(),
                handle: cell.handle(),
                failed: cell.is_failed() || contradicted == Some(cell.position()),
            })
            .collect()
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.scheduler.as_ref().map(CollapseScheduler::grid)
    }

    pub fn state(&self) -> Option<SchedulerState> {
        self.scheduler.as_ref().map(CollapseScheduler::state)
    }

    pub fn is_running(&self) -> bool {
        self.state().is_some_and(|s| !s.is_terminal())
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    /// Steps reported to sinks since `start`.
    pub fn steps(&self) -> usize {
        self.steps
    }
}
