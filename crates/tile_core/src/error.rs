//! Error types for catalog loading, grid construction and cell mutation.

use crate::grid::Position;
use crate::possibility::PossibilityId;
use std::fmt;
use std::io;

/// Errors raised by the cell mutation API.
///
/// `Contradiction` is the only one a correct caller can expect to see: it
/// ends the current run. The others are contract violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    /// A cell's possibility set became empty.
    Contradiction { position: Position },
    /// `resolve_to` was given a possibility the cell no longer holds.
    InvalidPossibility {
        position: Position,
        possibility: PossibilityId,
    },
    /// A resolved cell was asked to change.
    AlreadyResolved { position: Position },
    /// No cell exists at the position.
    OutOfBounds { position: Position },
}

impl CellError {
    /// Position of the cell the error refers to.
    pub fn position(&self) -> Position {
        match self {
            CellError::Contradiction { position }
            | CellError::InvalidPossibility { position, .. }
            | CellError::AlreadyResolved { position }
            | CellError::OutOfBounds { position } => *position,
        }
    }

    pub fn is_contradiction(&self) -> bool {
        matches!(self, CellError::Contradiction { .. })
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellError::Contradiction { position } => write!(
                f,
                "contradiction: cell {} has no possibilities left",
                position
            ),
            CellError::InvalidPossibility {
                position,
                possibility,
            } => write!(
                f,
                "possibility {} is not available in cell {}",
                possibility, position
            ),
            CellError::AlreadyResolved { position } => {
                write!(f, "cell {} is already resolved", position)
            }
            CellError::OutOfBounds { position } => write!(f, "no cell at {}", position),
        }
    }
}

impl std::error::Error for CellError {}

/// Errors raised while building, editing or loading a catalog.
#[derive(Debug)]
pub enum CatalogError {
    /// A tile side references an edge type that is not in the catalog.
    UnknownEdgeType { tile: String, edge_type: String },
    /// Two edge prototypes share an id.
    DuplicateEdgeType(String),
    /// Edit or removal of an edge type id that does not exist.
    MissingEdgeType(String),
    /// Tile index out of range.
    UnknownTile(usize),
    /// Tile weights must be positive.
    InvalidWeight { tile: String, weight: u32 },
    /// Tile costs must be finite and non-negative.
    InvalidCost { tile: String, cost: f64 },
    /// A tile with no assigned edges under the `Reject` policy.
    BlankPrototype(String),
    /// The catalog produced no possibilities.
    EmptyCatalog,
    /// Catalog file could not be read.
    Io(io::Error),
    /// Catalog file could not be parsed.
    Parse(serde_json::Error),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::UnknownEdgeType { tile, edge_type } => write!(
                f,
                "tile '{}' references unknown edge type '{}'",
                tile, edge_type
            ),
            CatalogError::DuplicateEdgeType(id) => write!(f, "duplicate edge type '{}'", id),
            CatalogError::MissingEdgeType(id) => write!(f, "no edge type named '{}'", id),
            CatalogError::UnknownTile(index) => write!(f, "no tile at index {}", index),
            CatalogError::InvalidWeight { tile, weight } => {
                write!(f, "tile '{}' has invalid weight {}", tile, weight)
            }
            CatalogError::InvalidCost { tile, cost } => {
                write!(f, "tile '{}' has invalid cost {}", tile, cost)
            }
            CatalogError::BlankPrototype(tile) => {
                write!(f, "tile '{}' has no assigned edges", tile)
            }
            CatalogError::EmptyCatalog => write!(f, "catalog produced no possibilities"),
            CatalogError::Io(e) => write!(f, "I/O error: {}", e),
            CatalogError::Parse(e) => write!(f, "catalog parse error: {}", e),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(e) => Some(e),
            CatalogError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CatalogError {
    fn from(e: io::Error) -> Self {
        CatalogError::Io(e)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Parse(e)
    }
}

/// Error type for grid construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Width or height is zero.
    EmptyGrid { width: usize, height: usize },
    /// `width * height` does not fit in `usize`.
    TooLarge { width: usize, height: usize },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::EmptyGrid { width, height } => {
                write!(f, "grid must be at least 1x1, got {}x{}", width, height)
            }
            GridError::TooLarge { width, height } => {
                write!(f, "grid {}x{} has too many cells", width, height)
            }
        }
    }
}

impl std::error::Error for GridError {}

/// Errors surfaced by the generator control surface.
#[derive(Debug)]
pub enum GeneratorError {
    Catalog(CatalogError),
    Grid(GridError),
    Cell(CellError),
    /// `tick`, `run_to_completion` or `set_weight` before `start`.
    NotStarted,
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorError::Catalog(e) => write!(f, "catalog error: {}", e),
            GeneratorError::Grid(e) => write!(f, "grid error: {}", e),
            GeneratorError::Cell(e) => write!(f, "cell error: {}", e),
            GeneratorError::NotStarted => write!(f, "generator has not been started"),
        }
    }
}

impl std::error::Error for GeneratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeneratorError::Catalog(e) => Some(e),
            GeneratorError::Grid(e) => Some(e),
            GeneratorError::Cell(e) => Some(e),
            GeneratorError::NotStarted => None,
        }
    }
}

impl From<CatalogError> for GeneratorError {
    fn from(e: CatalogError) -> Self {
        GeneratorError::Catalog(e)
    }
}

impl From<GridError> for GeneratorError {
    fn from(e: GridError) -> Self {
        GeneratorError::Grid(e)
    }
}

impl From<CellError> for GeneratorError {
    fn from(e: CellError) -> Self {
        GeneratorError::Cell(e)
    }
}

/// Errors raised while loading a [`GeneratorConfig`](crate::config::GeneratorConfig).
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error: {}", e),
            ConfigError::Parse(e) => write!(f, "config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors raised while saving or loading a run recording.
#[derive(Debug)]
pub enum RecordingError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::Io(e) => write!(f, "I/O error: {}", e),
            RecordingError::Json(e) => write!(f, "recording JSON error: {}", e),
        }
    }
}

impl std::error::Error for RecordingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecordingError::Io(e) => Some(e),
            RecordingError::Json(e) => Some(e),
        }
    }
}

impl From<io::Error> for RecordingError {
    fn from(e: io::Error) -> Self {
        RecordingError::Io(e)
    }
}

impl From<serde_json::Error> for RecordingError {
    fn from(e: serde_json::Error) -> Self {
        RecordingError::Json(e)
    }
}
