//! A single grid cell and its shrinking set of possibilities.
//!
//! Membership is a flat `Vec<bool>` over the possibility space, the same
//! layout a WFC wave uses per cell. The weight sums behind the Shannon
//! entropy are plain fields refreshed by [`Cell::invalidate`] after every
//! mutation.

use crate::error::CellError;
use crate::grid::Position;
use crate::possibility::{PossibilityId, PossibilitySpace};
use serde::{Deserialize, Serialize};

/// Opaque host identifier attached to a cell. Never interpreted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u64);

/// Formula used for the weighted tie-break entropy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntropyFormula {
    /// `ln(Σw) - Σ(w ln w) / Σw`
    #[default]
    Standard,
    /// `Σw - Σ(w ln w) / Σw`, which ranks cells by total weight first.
    Reference,
}

impl EntropyFormula {
    pub fn evaluate(self, sum_of_weights: f64, sum_of_weight_log_weights: f64) -> f64 {
        if sum_of_weights <= 0.0 {
            return 0.0;
        }
        let spread = sum_of_weight_log_weights / sum_of_weights;
        match self {
            EntropyFormula::Standard => sum_of_weights.ln() - spread,
            EntropyFormula::Reference => sum_of_weights - spread,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cell {
    position: Position,
    possible: Vec<bool>,
    remaining: usize,
    sum_of_weights: f64,
    sum_of_weight_log_weights: f64,
    handle: Option<VisualHandle>,
}

impl Cell {
    /// A cell holding the whole space.
    pub fn new(position: Position, space: &PossibilitySpace) -> Self {
        let mut cell = Self {
            position,
            possible: vec![true; space.len()],
            remaining: space.len(),
            sum_of_weights: 0.0,
            sum_of_weight_log_weights: 0.0,
            handle: None,
        };
        cell.invalidate(space);
        cell
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn handle(&self) -> Option<VisualHandle> {
        self.handle
    }

    pub fn set_handle(&mut self, handle: Option<VisualHandle>) {
        self.handle = handle;
    }

    /// Number of remaining possibilities.
    #[inline]
    pub fn entropy(&self) -> usize {
        self.remaining
    }

    pub fn shannon_entropy(&self, formula: EntropyFormula) -> f64 {
        formula.evaluate(self.sum_of_weights, self.sum_of_weight_log_weights)
    }

    /// Total weight of the remaining possibilities.
    pub fn total_weight(&self) -> f64 {
        self.sum_of_weights
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.remaining == 1
    }

    #[inline]
    pub fn is_unresolved(&self) -> bool {
        self.remaining > 1
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        self.remaining == 0
    }

    pub fn is_untouched(&self) -> bool {
        self.remaining == self.possible.len()
    }

    #[inline]
    pub fn contains(&self, id: PossibilityId) -> bool {
        self.possible.get(id.0).copied().unwrap_or(false)
    }

    /// Remaining possibilities in ascending id order.
    pub fn possibilities(&self) -> impl Iterator<Item = PossibilityId> + '_ {
        self.possible
            .iter()
            .enumerate()
            .filter(|(_, p)| **p)
            .map(|(i, _)| PossibilityId(i))
    }

    /// The single remaining possibility of a resolved cell.
    pub fn resolved(&self) -> Option<PossibilityId> {
        if self.is_resolved() {
            self.possibilities().next()
        } else {
            None
        }
    }

    /// Remove one possibility. Returns whether it was present.
    ///
    /// An emptied cell stays empty and reports a contradiction.
    pub fn remove_possibility(
        &mut self,
        id: PossibilityId,
        space: &PossibilitySpace,
    ) -> Result<bool, CellError> {
        if self.is_resolved() {
            return Err(CellError::AlreadyResolved {
                position: self.position,
            });
        }
        let removed = self.take(id);
        if removed {
            self.invalidate(space);
        }
        self.check_contradiction()?;
        Ok(removed)
    }

    /// Remove every id in `ids`, then check for a contradiction once.
    /// Returns how many were present.
    pub fn remove_possibilities<I>(
        &mut self,
        ids: I,
        space: &PossibilitySpace,
    ) -> Result<usize, CellError>
    where
        I: IntoIterator<Item = PossibilityId>,
    {
        if self.is_resolved() {
            return Err(CellError::AlreadyResolved {
                position: self.position,
            });
        }
        let removed = ids.into_iter().filter(|&id| self.take(id)).count();
        if removed > 0 {
            self.invalidate(space);
        }
        self.check_contradiction()?;
        Ok(removed)
    }

    /// Collapse to exactly `id`. Re-resolving to the same id does nothing.
    pub fn resolve_to(
        &mut self,
        id: PossibilityId,
        space: &PossibilitySpace,
    ) -> Result<(), CellError> {
        if self.is_resolved() {
            if self.contains(id) {
                return Ok(());
            }
            return Err(CellError::AlreadyResolved {
                position: self.position,
            });
        }
        if !self.contains(id) {
            return Err(CellError::InvalidPossibility {
                position: self.position,
                possibility: id,
            });
        }
        for (i, p) in self.possible.iter_mut().enumerate() {
            *p = i == id.0;
        }
        self.remaining = 1;
        self.invalidate(space);
        Ok(())
    }

    /// Recompute the cached weight sums from the current membership.
    pub fn invalidate(&mut self, space: &PossibilitySpace) {
        let mut sum = 0.0;
        let mut sum_log = 0.0;
        for id in self.possibilities() {
            let w = space.weight(id) as f64;
            sum += w;
            sum_log += w * w.ln();
        }
        self.sum_of_weights = sum;
        self.sum_of_weight_log_weights = sum_log;
    }

    fn take(&mut self, id: PossibilityId) -> bool {
        match self.possible.get_mut(id.0) {
            Some(slot) if *slot => {
                *slot = false;
                self.remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn check_contradiction(&self) -> Result<(), CellError> {
        if self.is_failed() {
            Err(CellError::Contradiction {
                position: self.position,
            })
        } else {
            Ok(())
        }
    }
}
