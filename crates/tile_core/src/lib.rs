//! Edge-matching tile grid generation.
//!
//! This crate provides:
//! - Edge prototypes and tile catalogs, with a JSON catalog reader
//! - The possibility space: every distinct rotation of every tile
//! - Cells with possibility sets and entropy metrics
//! - Arc-consistency propagation over a 4-neighbor grid
//! - The collapse scheduler (minimum entropy, weighted random choice)
//! - A generator control surface with tick cadence and per-step feedback
//! - Run recording to JSON
//!
//! # Example
//!
//! ```ignore
//! use tile_core::{CatalogSource, Generator, GeneratorConfig, JsonCatalog, NullSink};
//!
//! let catalog = JsonCatalog::new("catalog.json").load_catalog()?;
//! let mut generator = Generator::new(GeneratorConfig::default());
//! generator.start(16, 16, &catalog)?;
//! let outcome = generator.run_to_completion(&mut NullSink)?;
//! ```

pub mod catalog;
pub mod cell;
pub mod config;
pub mod edge;
pub mod error;
pub mod generator;
pub mod grid;
pub mod playback;
pub mod possibility;
pub mod propagation;
pub mod recording;
pub mod rng;
pub mod scheduler;

pub use catalog::{Catalog, CatalogSource, JsonCatalog, PrototypeId, TilePrototype};
pub use cell::{Cell, EntropyFormula, VisualHandle};
pub use config::GeneratorConfig;
pub use edge::{Direction, EdgeAssignment, EdgePrototype};
pub use error::{CatalogError, CellError, ConfigError, GeneratorError, GridError, RecordingError};
pub use generator::{CellView, FeedbackSink, Generator, NullSink};
pub use grid::{Grid, Position};
pub use playback::PlaybackState;
pub use possibility::{BlankPrototypePolicy, Possibility, PossibilityId, PossibilitySpace, Rotation};
pub use propagation::{is_arc_consistent, PropagationStats, Propagator};
pub use recording::{Frame, RunRecorder, RunRecording};
pub use rng::{StdRandom, TileRng};
pub use scheduler::{CollapseScheduler, SchedulerState, StepOutcome};
