//! Collapse scheduler: the observe/propagate step loop.
//!
//! Each step picks the unresolved cell with the fewest possibilities,
//! collapses it with a weighted random draw and propagates the change. The
//! run fails fast: the first contradiction is terminal.

use crate::catalog::PrototypeId;
use crate::cell::VisualHandle;
use crate::error::CellError;
use crate::grid::{Grid, Position};
use crate::possibility::PossibilityId;
use crate::propagation::Propagator;
use crate::rng::TileRng;
use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

/// Lifecycle of a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Created, initial propagation not run yet.
    Idle,
    Running,
    /// Every cell holds exactly one possibility.
    Resolved,
    /// A cell ran out of possibilities.
    Contradicted { position: Position },
    /// Halted by the caller; the grid is left as it was.
    Stopped,
}

impl SchedulerState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SchedulerState::Idle | SchedulerState::Running)
    }
}

/// Result of one scheduler step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepOutcome {
    Collapsed {
        position: Position,
        possibility: PossibilityId,
    },
    Resolved,
    Contradicted {
        position: Position,
    },
    Stopped,
}

impl StepOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepOutcome::Collapsed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            StepOutcome::Collapsed { .. } => "collapsed",
            StepOutcome::Resolved => "resolved",
            StepOutcome::Contradicted { .. } => "contradicted",
            StepOutcome::Stopped => "stopped",
        }
    }
}

pub struct CollapseScheduler {
    grid: Grid,
    propagator: Propagator,
    rng: Box<dyn TileRng>,
    state: SchedulerState,
    collapses: usize,
}

impl CollapseScheduler {
    pub fn new(grid: Grid, rng: Box<dyn TileRng>) -> Self {
        let propagator = Propagator::new(grid.space(), grid.len());
        Self {
            grid,
            propagator,
            rng,
            state: SchedulerState::Idle,
            collapses: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Number of cells collapsed by a random draw so far.
    pub fn collapses(&self) -> usize {
        self.collapses
    }

    /// Halt the run. Later steps report `Stopped` and leave the grid alone.
    /// Has no effect on a run that already finished.
    pub fn stop(&mut self) {
        if !self.state.is_terminal() {
            self.state = SchedulerState::Stopped;
        }
    }

    /// Apply a live weight change. Later draws and entropy use the new weight.
    pub fn set_prototype_weight(&mut self, prototype: PrototypeId, weight: u32) {
        self.grid.set_prototype_weight(prototype, weight);
    }

    /// Attach a host handle to a cell. Returns false if out of bounds.
    pub fn set_handle(&mut self, position: Position, handle: Option<VisualHandle>) -> bool {
        self.grid.set_handle(position, handle)
    }

    /// Advance the run by one collapse.
    ///
    /// On a finished or stopped scheduler the terminal outcome is returned
    /// again and nothing changes.
    pub fn step(&mut self) -> Result<StepOutcome, CellError> {
        match self.state {
            SchedulerState::Resolved => return Ok(StepOutcome::Resolved),
            SchedulerState::Contradicted { position } => {
                return Ok(StepOutcome::Contradicted { position })
            }
            SchedulerState::Stopped => return Ok(StepOutcome::Stopped),
            SchedulerState::Idle => {
                self.state = SchedulerState::Running;
                let result = self.propagator.propagate_all(&mut self.grid);
                if let Some(outcome) = self.settle(result)? {
                    return Ok(outcome);
                }
            }
            SchedulerState::Running => {}
        }

        if let Some(position) = self.grid.first_failed() {
            return Ok(self.contradicted(position));
        }

        let Some(index) = self.next_unobserved() else {
            self.state = SchedulerState::Resolved;
            info!(
                "Grid {}x{} resolved after {} collapses",
                self.grid.width(),
                self.grid.height(),
                self.collapses
            );
            return Ok(StepOutcome::Resolved);
        };

        let position = self.grid.position_of(index);
        let possibility = self.draw(index);
        self.grid.resolve_to(position, possibility)?;
        self.collapses += 1;
        trace!("Collapsed {} to {}", position, possibility);

        let result = self.propagator.propagate_from(&mut self.grid, position);
        if let Some(outcome) = self.settle(result)? {
            return Ok(outcome);
        }

        Ok(StepOutcome::Collapsed {
            position,
            possibility,
        })
    }

    /// Step until a terminal outcome.
    pub fn run_to_completion(&mut self) -> Result<StepOutcome, CellError> {
        loop {
            let outcome = self.step()?;
            if outcome.is_terminal() {
                return Ok(outcome);
            }
        }
    }

    /// Turn a propagation result into an early outcome. Contradictions end
    /// the run; other errors are contract violations and pass through.
    fn settle<T>(
        &mut self,
        result: Result<T, CellError>,
    ) -> Result<Option<StepOutcome>, CellError> {
        match result {
            Ok(_) => Ok(None),
            Err(CellError::Contradiction { position }) => Ok(Some(self.contradicted(position))),
            Err(e) => Err(e),
        }
    }

    fn contradicted(&mut self, position: Position) -> StepOutcome {
        self.state = SchedulerState::Contradicted { position };
        warn!(
            "Contradiction at {} after {} collapses",
            position, self.collapses
        );
        StepOutcome::Contradicted { position }
    }

    /// Unresolved cell with the fewest possibilities. Ties go to the lowest
    /// Shannon entropy, then the lowest row-major index.
    fn next_unobserved(&self) -> Option<usize> {
        let formula = self.grid.formula();
        let mut best: Option<(usize, usize, f64)> = None;

        for (index, cell) in self.grid.cells().iter().enumerate() {
            if !cell.is_unresolved() {
                continue;
            }
            let count = cell.entropy();
            let shannon = cell.shannon_entropy(formula);
            let better = match best {
                None => true,
                Some((_, best_count, best_shannon)) => {
                    count < best_count
                        || (count == best_count && shannon.total_cmp(&best_shannon).is_lt())
                }
            };
            if better {
                best = Some((index, count, shannon));
            }
        }

        best.map(|(index, _, _)| index)
    }

    /// Weighted random pick among the cell's remaining possibilities.
    fn draw(&mut self, index: usize) -> PossibilityId {
        let cell = self.grid.cell_at(index);
        let space = self.grid.space();
        let threshold = self.rng.next_double() * cell.total_weight();

        let mut cumulative = 0.0;
        let mut last = None;
        for id in cell.possibilities() {
            cumulative += space.weight(id) as f64;
            if cumulative > threshold {
                return id;
            }
            last = Some(id);
        }

        // Rounding left the threshold at the very top of the range.
        last.unwrap_or(PossibilityId(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, TilePrototype};
    use crate::cell::EntropyFormula;
    use crate::edge::{EdgeAssignment, EdgePrototype};
    use crate::possibility::{BlankPrototypePolicy, PossibilitySpace};
    use crate::rng::{ScriptedRandom, StdRandom};

    fn plain_catalog(weights: &[u32]) -> Catalog {
        let x = EdgeAssignment::typed("x");
        let tiles = weights
            .iter()
            .enumerate()
            .map(|(i, &w)| TilePrototype::uniform(format!("t{}", i), w, x.clone()))
            .collect();
        Catalog::new(vec![EdgePrototype::symmetrical("x")], tiles).unwrap()
    }

    fn grid_for(catalog: &Catalog, width: usize, height: usize) -> Grid {
        let space = PossibilitySpace::build(catalog, BlankPrototypePolicy::default()).unwrap();
        Grid::new(width, height, space, EntropyFormula::default()).unwrap()
    }

    fn scheduler(grid: Grid, seed: u64) -> CollapseScheduler {
        CollapseScheduler::new(grid, Box::new(StdRandom::from_seed(seed)))
    }

    #[test]
    fn test_first_step_collapses_first_cell() {
        let catalog = plain_catalog(&[1, 1]);
        let mut s = scheduler(grid_for(&catalog, 3, 2), 1);
        assert_eq!(s.state(), SchedulerState::Idle);
        match s.step().unwrap() {
            StepOutcome::Collapsed { position, .. } => assert_eq!(position, Position::new(0, 0)),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(s.state(), SchedulerState::Running);
        assert_eq!(s.collapses(), 1);
    }

    #[test]
    fn test_selects_fewest_possibilities() {
        let catalog = plain_catalog(&[1, 1, 1]);
        let mut grid = grid_for(&catalog, 3, 1);
        grid.remove_possibility(Position::new(2, 0), PossibilityId(0)).unwrap();
        let mut s = scheduler(grid, 3);
        match s.step().unwrap() {
            StepOutcome::Collapsed { position, .. } => assert_eq!(position, Position::new(2, 0)),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_shannon_entropy_breaks_count_ties() {
        let catalog = plain_catalog(&[1, 1, 8]);
        let mut grid = grid_for(&catalog, 3, 1);
        // (0, 0) keeps {1, 1}; (1, 0) keeps {1, 8}, which is less uncertain.
        grid.remove_possibility(Position::new(0, 0), PossibilityId(2)).unwrap();
        grid.remove_possibility(Position::new(1, 0), PossibilityId(1)).unwrap();
        let mut s = scheduler(grid, 9);
        match s.step().unwrap() {
            StepOutcome::Collapsed { position, .. } => assert_eq!(position, Position::new(1, 0)),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_weighted_draw_uses_cumulative_weight() {
        let catalog = plain_catalog(&[10, 1]);
        let low = CollapseScheduler::new(
            grid_for(&catalog, 1, 1),
            Box::new(ScriptedRandom::new(vec![0.5])),
        );
        let high = CollapseScheduler::new(
            grid_for(&catalog, 1, 1),
            Box::new(ScriptedRandom::new(vec![0.95])),
        );
        for (mut s, expected) in [(low, PossibilityId(0)), (high, PossibilityId(1))] {
            assert_eq!(
                s.step().unwrap(),
                StepOutcome::Collapsed {
                    position: Position::new(0, 0),
                    possibility: expected
                }
            );
        }
    }

    #[test]
    fn test_weighted_draw_frequencies() {
        let catalog = plain_catalog(&[10, 1]);
        let runs = 2000;
        let mut heavy = 0;
        for seed in 0..runs {
            let mut s = scheduler(grid_for(&catalog, 1, 1), seed);
            if let StepOutcome::Collapsed { possibility, .. } = s.step().unwrap() {
                if possibility == PossibilityId(0) {
                    heavy += 1;
                }
            }
        }
        let share = heavy as f64 / runs as f64;
        assert!((0.87..0.95).contains(&share), "heavy share {}", share);
    }

    #[test]
    fn test_terminal_outcomes_repeat() {
        let catalog = plain_catalog(&[1, 2]);
        let mut s = scheduler(grid_for(&catalog, 2, 2), 5);
        assert_eq!(s.run_to_completion().unwrap(), StepOutcome::Resolved);
        assert_eq!(s.collapses(), 4);
        let layout = s.grid().resolved_layout();
        assert_eq!(s.step().unwrap(), StepOutcome::Resolved);
        assert_eq!(s.grid().resolved_layout(), layout);
        assert_eq!(s.collapses(), 4);
    }

    #[test]
    fn test_stop_keeps_partial_grid() {
        let catalog = plain_catalog(&[1, 1]);
        let mut s = scheduler(grid_for(&catalog, 3, 3), 11);
        s.step().unwrap();
        s.step().unwrap();
        s.stop();
        assert_eq!(s.state(), SchedulerState::Stopped);
        assert_eq!(s.step().unwrap(), StepOutcome::Stopped);
        assert_eq!(s.grid().resolved_count(), 2);

        // Stopping a finished run keeps its result.
        let mut done = scheduler(grid_for(&catalog, 1, 1), 2);
        done.run_to_completion().unwrap();
        done.stop();
        assert_eq!(done.state(), SchedulerState::Resolved);
    }

    #[test]
    fn test_initial_propagation_contradiction() {
        let catalog = Catalog::new(
            vec![
                EdgePrototype::asymmetrical("ramp"),
                EdgePrototype::asymmetrical("stair"),
            ],
            vec![
                TilePrototype::uniform("ramp", 1, EdgeAssignment::typed("ramp")),
                TilePrototype::uniform("stair", 1, EdgeAssignment::typed("stair")),
            ],
        )
        .unwrap();
        let mut s = scheduler(grid_for(&catalog, 2, 1), 0);
        let outcome = s.step().unwrap();
        assert!(matches!(outcome, StepOutcome::Contradicted { .. }));
        assert!(matches!(s.state(), SchedulerState::Contradicted { .. }));
        assert_eq!(s.collapses(), 0);
        assert_eq!(s.step().unwrap(), outcome);
    }

    #[test]
    fn test_resolved_layouts_match_edges() {
        let land = EdgeAssignment::typed("land");
        let sea = EdgeAssignment::typed("sea");
        let catalog = Catalog::new(
            vec![
                EdgePrototype::symmetrical("land"),
                EdgePrototype::symmetrical("sea"),
            ],
            vec![
                TilePrototype::uniform("land", 3, land.clone()),
                TilePrototype::uniform("sea", 3, sea.clone()),
                TilePrototype::new("coast", 1, [land.clone(), land, sea.clone(), sea]),
            ],
        )
        .unwrap();

        let mut resolved_runs = 0;
        for seed in 0..20 {
            let mut s = scheduler(grid_for(&catalog, 4, 4), seed);
            if s.run_to_completion().unwrap() != StepOutcome::Resolved {
                continue;
            }
            resolved_runs += 1;
            let grid = s.grid();
            for cell in grid.cells() {
                let p = cell.resolved().unwrap();
                for (direction, neighbor) in grid.neighbors(cell.position()) {
                    let q = grid.cell(neighbor).unwrap().resolved().unwrap();
                    assert!(grid.space().compatible(p, q, direction));
                }
            }
        }
        assert!(resolved_runs > 0);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let catalog = plain_catalog(&[1, 2, 3]);
        let mut a = scheduler(grid_for(&catalog, 5, 5), 77);
        let mut b = scheduler(grid_for(&catalog, 5, 5), 77);
        a.run_to_completion().unwrap();
        b.run_to_completion().unwrap();
        assert_eq!(a.grid().resolved_layout(), b.grid().resolved_layout());
    }
}
