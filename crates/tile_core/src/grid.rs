//! Rectangular grid of cells.
//!
//! Indexing is row-major: `index = x + y * width`. North is `+y`.

use crate::catalog::PrototypeId;
use crate::cell::{Cell, EntropyFormula, VisualHandle};
use crate::edge::Direction;
use crate::error::{CellError, GridError};
use crate::possibility::{PossibilityId, PossibilitySpace};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Owns every cell of a run and the possibility space they draw from.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    space: PossibilitySpace,
    formula: EntropyFormula,
}

impl Grid {
    /// A grid whose every cell holds the full space.
    pub fn new(
        width: usize,
        height: usize,
        space: PossibilitySpace,
        formula: EntropyFormula,
    ) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyGrid { width, height });
        }
        let Some(len) = width.checked_mul(height) else {
            return Err(GridError::TooLarge { width, height });
        };
        let cells = (0..len)
            .map(|i| Cell::new(Position::new(i % width, i / width), &space))
            .collect();
        Ok(Self {
            width,
            height,
            cells,
            space,
            formula,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn space(&self) -> &PossibilitySpace {
        &self.space
    }

    pub fn formula(&self) -> EntropyFormula {
        self.formula
    }

    #[inline]
    pub fn index_of(&self, position: Position) -> Option<usize> {
        if position.x < self.width && position.y < self.height {
            Some(position.x + position.y * self.width)
        } else {
            None
        }
    }

    #[inline]
    pub fn position_of(&self, index: usize) -> Position {
        Position::new(index % self.width, index / self.width)
    }

    pub fn cell(&self, position: Position) -> Option<&Cell> {
        self.index_of(position).map(|i| &self.cells[i])
    }

    pub fn cell_at(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// The in-bounds neighbor of `position` in `direction`.
    pub fn neighbor(&self, position: Position, direction: Direction) -> Option<Position> {
        let (dx, dy) = direction.offset();
        let x = position.x.checked_add_signed(dx as isize)?;
        let y = position.y.checked_add_signed(dy as isize)?;
        let neighbor = Position::new(x, y);
        self.index_of(neighbor).map(|_| neighbor)
    }

    /// In-bounds neighbors in north, east, south, west order.
    pub fn neighbors(
        &self,
        position: Position,
    ) -> impl Iterator<Item = (Direction, Position)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |d| self.neighbor(position, d).map(|n| (d, n)))
    }

    /// Mutable cell plus the space, for callers that mutate by index.
    pub(crate) fn cell_and_space_mut(&mut self, index: usize) -> (&mut Cell, &PossibilitySpace) {
        (&mut self.cells[index], &self.space)
    }

    fn checked_index(&self, position: Position) -> Result<usize, CellError> {
        self.index_of(position).ok_or(CellError::OutOfBounds { position })
    }

    pub fn remove_possibility(
        &mut self,
        position: Position,
        id: PossibilityId,
    ) -> Result<bool, CellError> {
        let index = self.checked_index(position)?;
        let (cell, space) = self.cell_and_space_mut(index);
        cell.remove_possibility(id, space)
    }

    pub fn remove_possibilities<I>(
        &mut self,
        position: Position,
        ids: I,
    ) -> Result<usize, CellError>
    where
        I: IntoIterator<Item = PossibilityId>,
    {
        let index = self.checked_index(position)?;
        let (cell, space) = self.cell_and_space_mut(index);
        cell.remove_possibilities(ids, space)
    }

    pub fn resolve_to(&mut self, position: Position, id: PossibilityId) -> Result<(), CellError> {
        let index = self.checked_index(position)?;
        let (cell, space) = self.cell_and_space_mut(index);
        cell.resolve_to(id, space)
    }

    pub fn set_handle(&mut self, position: Position, handle: Option<VisualHandle>) -> bool {
        match self.index_of(position) {
            Some(i) => {
                self.cells[i].set_handle(handle);
                true
            }
            None => false,
        }
    }

    /// Change a prototype's weight mid-run. Cached entropy of every cell is
    /// recomputed; resolved cells keep their choice.
    pub fn set_prototype_weight(&mut self, prototype: PrototypeId, weight: u32) {
        self.space.set_weight(prototype, weight);
        for cell in &mut self.cells {
            cell.invalidate(&self.space);
        }
    }

    pub fn first_failed(&self) -> Option<Position> {
        self.cells
            .iter()
            .find(|c| c.is_failed())
            .map(Cell::position)
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.cells.iter().all(Cell::is_resolved)
    }

    pub fn resolved_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_resolved()).count()
    }

    /// Resolved possibility per cell in row-major order.
    pub fn resolved_layout(&self) -> Vec<Option<PossibilityId>> {
        self.cells.iter().map(Cell::resolved).collect()
    }
}
