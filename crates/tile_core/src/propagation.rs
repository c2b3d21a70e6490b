//! Edge-compatibility propagation.
//!
//! The propagator holds `compatible[d][p]`: every possibility that may sit
//! in direction `d` of possibility `p`. Propagation is AC-3 over the
//! 4-neighbor grid with a FIFO worklist of cells whose sets shrank. For
//! each neighbor of a dequeued cell, possibilities with no supporter left
//! in that cell are removed in one batch; a neighbor that shrank is queued
//! in turn. The total possibility count only decreases, so the loop ends.

use crate::edge::Direction;
use crate::error::CellError;
use crate::grid::{Grid, Position};
use crate::possibility::{PossibilityId, PossibilitySpace};
use std::collections::VecDeque;
use tracing::trace;

/// Work done by one propagation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationStats {
    /// Cells taken off the worklist.
    pub cells_processed: usize,
    /// Possibilities removed from neighbors.
    pub removed: usize,
}

#[derive(Debug, Clone)]
pub struct Propagator {
    compatible: [Vec<Vec<PossibilityId>>; 4],
    queue: VecDeque<usize>,
    queued: Vec<bool>,
    /// Scratch: which neighbor possibilities still have a supporter.
    support: Vec<bool>,
}

impl Propagator {
    /// Precompute compatibility lists for `space` and size the worklist for
    /// a grid of `cell_count` cells.
    pub fn new(space: &PossibilitySpace, cell_count: usize) -> Self {
        let compatible = Direction::ALL.map(|direction| {
            space
                .ids()
                .map(|p| {
                    space
                        .ids()
                        .filter(|&q| space.compatible(p, q, direction))
                        .collect()
                })
                .collect()
        });

        Self {
            compatible,
            queue: VecDeque::with_capacity(cell_count),
            queued: vec![false; cell_count],
            support: vec![false; space.len()],
        }
    }

    /// Possibilities allowed in `direction` of `p`.
    pub fn compatible(&self, direction: Direction, p: PossibilityId) -> &[PossibilityId] {
        &self.compatible[direction.index()][p.0]
    }

    /// Propagate after a change to the cell at `position`.
    pub fn propagate_from(
        &mut self,
        grid: &mut Grid,
        position: Position,
    ) -> Result<PropagationStats, CellError> {
        let index = grid.index_of(position).ok_or(CellError::OutOfBounds { position })?;
        self.enqueue(index);
        self.run(grid)
    }

    /// Propagate from every cell, in row-major order. Makes a fresh grid
    /// arc-consistent before the first collapse.
    pub fn propagate_all(&mut self, grid: &mut Grid) -> Result<PropagationStats, CellError> {
        for index in 0..grid.len() {
            self.enqueue(index);
        }
        self.run(grid)
    }

    fn enqueue(&mut self, index: usize) {
        if !self.queued[index] {
            self.queued[index] = true;
            self.queue.push_back(index);
        }
    }

    fn clear(&mut self) {
        self.queue.clear();
        self.queued.fill(false);
    }

    fn run(&mut self, grid: &mut Grid) -> Result<PropagationStats, CellError> {
        let mut stats = PropagationStats::default();

        while let Some(index) = self.queue.pop_front() {
            self.queued[index] = false;
            stats.cells_processed += 1;
            let position = grid.position_of(index);

            for direction in Direction::ALL {
                let Some(neighbor) = grid.neighbor(position, direction) else {
                    continue;
                };
                let Some(neighbor_index) = grid.index_of(neighbor) else {
                    continue;
                };

                self.support.fill(false);
                let table = &self.compatible[direction.index()];
                for p in grid.cell_at(index).possibilities() {
                    for &q in &table[p.0] {
                        self.support[q.0] = true;
                    }
                }

                let target = grid.cell_at(neighbor_index);
                let unsupported: Vec<PossibilityId> = target
                    .possibilities()
                    .filter(|q| !self.support[q.0])
                    .collect();
                if unsupported.is_empty() {
                    continue;
                }

                if target.is_resolved() {
                    // A resolved cell is never changed; losing its only
                    // possibility is the contradiction.
                    self.clear();
                    return Err(CellError::Contradiction { position: neighbor });
                }

                let (cell, space) = grid.cell_and_space_mut(neighbor_index);
                match cell.remove_possibilities(unsupported, space) {
                    Ok(removed) => {
                        stats.removed += removed;
                        self.enqueue(neighbor_index);
                    }
                    Err(e) => {
                        self.clear();
                        return Err(e);
                    }
                }
            }
        }

        trace!(
            "Propagation reached fixed point: {} cells processed, {} possibilities removed",
            stats.cells_processed,
            stats.removed
        );
        Ok(stats)
    }
}

/// Brute-force check that every remaining possibility of every cell has a
/// compatible counterpart in each neighbor.
pub fn is_arc_consistent(grid: &Grid) -> bool {
    let space = grid.space();
    grid.cells().iter().all(|cell| {
        grid.neighbors(cell.position()).all(|(direction, neighbor)| {
            let Some(other) = grid.cell(neighbor) else {
                return true;
            };
            cell.possibilities().all(|p| {
                other
                    .possibilities()
                    .any(|q| space.compatible(p, q, direction))
            })
        })
    })
}
