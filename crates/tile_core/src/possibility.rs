//! Placeable tile variants.
//!
//! A [`Possibility`] is one prototype in one orientation, with its sides
//! already rotated into grid directions. The [`PossibilitySpace`] is built
//! once from a catalog and shared read-only by every cell of a run.

use crate::catalog::{Catalog, PrototypeId};
use crate::edge::{Direction, EdgeAssignment};
use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Index of a possibility within its space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PossibilityId(pub usize);

impl fmt::Display for PossibilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Clockwise rotation of a tile about its center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    pub fn quarter_turns(self) -> usize {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 1,
            Rotation::R180 => 2,
            Rotation::R270 => 3,
        }
    }

    pub fn degrees(self) -> u32 {
        self.quarter_turns() as u32 * 90
    }

    /// Row-major 2x2 matrix for a clockwise rotation in a `+y` north frame.
    pub fn matrix(self) -> [[i32; 2]; 2] {
        match self {
            Rotation::R0 => [[1, 0], [0, 1]],
            Rotation::R90 => [[0, 1], [-1, 0]],
            Rotation::R180 => [[-1, 0], [0, -1]],
            Rotation::R270 => [[0, -1], [1, 0]],
        }
    }

    /// Rotate a side tuple. The side facing `d` ends up facing
    /// `d.rotated(quarter_turns)`; `reversed` flags travel with the side.
    pub fn apply(self, edges: &[EdgeAssignment; 4]) -> [EdgeAssignment; 4] {
        let k = self.quarter_turns();
        std::array::from_fn(|d| edges[(d + 4 - k) % 4].clone())
    }
}

/// What to do with prototypes that have no assigned side at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlankPrototypePolicy {
    /// Keep one unrotated variant that fits next to anything.
    #[default]
    Unconstrained,
    /// Leave the prototype out of the space.
    Exclude,
    /// Fail the build with [`CatalogError::BlankPrototype`].
    Reject,
}

/// One prototype in one orientation.
#[derive(Debug, Clone, Serialize)]
pub struct Possibility {
    pub prototype: PrototypeId,
    pub name: String,
    /// Sides aligned to north, east, south, west after rotation.
    pub edges: [EdgeAssignment; 4],
    pub orientation: Rotation,
    pub weight: u32,
    pub cost: f64,
    /// Blank prototype kept under [`BlankPrototypePolicy::Unconstrained`].
    pub unconstrained: bool,
}

impl Possibility {
    pub fn edge(&self, direction: Direction) -> &EdgeAssignment {
        &self.edges[direction.index()]
    }
}

impl PartialEq for Possibility {
    fn eq(&self, other: &Self) -> bool {
        self.prototype == other.prototype && self.orientation == other.orientation
    }
}

impl Eq for Possibility {}

impl fmt::Display for Possibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.orientation.degrees())
    }
}

/// Every placeable variant of a catalog.
#[derive(Debug, Clone)]
pub struct PossibilitySpace {
    possibilities: Vec<Possibility>,
    /// Symmetry flag per possibility side, `None` where unassigned.
    symmetry: Vec<[Option<bool>; 4]>,
}

impl PossibilitySpace {
    /// Enumerate the distinct rotations of every prototype, in catalog order.
    pub fn build(catalog: &Catalog, policy: BlankPrototypePolicy) -> Result<Self, CatalogError> {
        let mut possibilities = Vec::new();

        for (index, tile) in catalog.tiles().iter().enumerate() {
            let prototype = PrototypeId(index);

            if tile.is_blank() {
                match policy {
                    BlankPrototypePolicy::Reject => {
                        return Err(CatalogError::BlankPrototype(tile.name.clone()));
                    }
                    BlankPrototypePolicy::Exclude => {
                        warn!("Excluding tile '{}': no assigned edges", tile.name);
                        continue;
                    }
                    BlankPrototypePolicy::Unconstrained => {
                        possibilities.push(Possibility {
                            prototype,
                            name: tile.name.clone(),
                            edges: tile.edges.clone(),
                            orientation: Rotation::R0,
                            weight: tile.weight,
                            cost: tile.cost,
                            unconstrained: true,
                        });
                        continue;
                    }
                }
            }

            let mut seen: Vec<[EdgeAssignment; 4]> = Vec::with_capacity(4);
            for rotation in Rotation::ALL {
                let edges = rotation.apply(&tile.edges);
                if seen.contains(&edges) {
                    continue;
                }
                seen.push(edges.clone());
                possibilities.push(Possibility {
                    prototype,
                    name: tile.name.clone(),
                    edges,
                    orientation: rotation,
                    weight: tile.weight,
                    cost: tile.cost,
                    unconstrained: false,
                });
            }
            debug!("Tile '{}' has {} orientations", tile.name, seen.len());
        }

        if possibilities.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }

        let symmetry = possibilities
            .iter()
            .map(|p| {
                std::array::from_fn(|d| {
                    p.edges[d]
                        .edge_type
                        .as_deref()
                        .and_then(|id| catalog.is_symmetrical(id))
                })
            })
            .collect();

        Ok(Self {
            possibilities,
            symmetry,
        })
    }

    pub fn len(&self) -> usize {
        self.possibilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.possibilities.is_empty()
    }

    pub fn get(&self, id: PossibilityId) -> &Possibility {
        &self.possibilities[id.0]
    }

    pub fn ids(&self) -> impl Iterator<Item = PossibilityId> {
        (0..self.possibilities.len()).map(PossibilityId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PossibilityId, &Possibility)> {
        self.possibilities
            .iter()
            .enumerate()
            .map(|(i, p)| (PossibilityId(i), p))
    }

    pub fn weight(&self, id: PossibilityId) -> u32 {
        self.possibilities[id.0].weight
    }

    /// Possibilities derived from `prototype`.
    pub fn variants_of(&self, prototype: PrototypeId) -> Vec<PossibilityId> {
        self.iter()
            .filter(|(_, p)| p.prototype == prototype)
            .map(|(id, _)| id)
            .collect()
    }

    /// Whether `a` may sit with `b` as its neighbor in `direction`.
    pub fn compatible(&self, a: PossibilityId, b: PossibilityId, direction: Direction) -> bool {
        let pa = &self.possibilities[a.0];
        let pb = &self.possibilities[b.0];
        if pa.unconstrained || pb.unconstrained {
            return true;
        }
        let facing = direction.opposite();
        let symmetrical = self.symmetry[a.0][direction.index()];
        pa.edge(direction).matches(pb.edge(facing), |_| symmetrical)
    }

    /// Update the weight of every variant of `prototype`.
    pub(crate) fn set_weight(&mut self, prototype: PrototypeId, weight: u32) {
        for p in &mut self.possibilities {
            if p.prototype == prototype {
                p.weight = weight;
            }
        }
    }
}
