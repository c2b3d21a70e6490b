//! Run recording.
//!
//! A [`RunRecorder`] is a [`FeedbackSink`] that keeps one frame per step.
//! The finished [`RunRecording`] saves to and loads from pretty JSON.
//!
//! ```ignore
//! let mut recorder = RunRecorder::new(width, height, seed);
//! generator.run_to_completion(&mut recorder)?;
//! recorder.into_recording().save("run.json")?;
//! ```

use crate::error::RecordingError;
use crate::generator::{CellView, FeedbackSink};
use crate::possibility::PossibilityId;
use crate::scheduler::StepOutcome;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Grid state after one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub step: usize,
    pub outcome: StepOutcome,
    pub cells: Vec<CellView>,
}

impl Frame {
    pub fn label(&self) -> &'static str {
        self.outcome.label()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecording {
    pub width: usize,
    pub height: usize,
    pub seed: u64,
    pub frames: Vec<Frame>,
}

impl RunRecording {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Outcome of the last recorded step.
    pub fn final_outcome(&self) -> Option<StepOutcome> {
        self.frames.last().map(|f| f.outcome)
    }

    /// Resolved possibility per cell in the last frame, row-major.
    pub fn final_layout(&self) -> Vec<Option<PossibilityId>> {
        self.frames
            .last()
            .map(|f| f.cells.iter().map(|c| c.resolved).collect())
            .unwrap_or_default()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), RecordingError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RecordingError> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), RecordingError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, RecordingError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Records generator steps as frames.
pub struct RunRecorder {
    width: usize,
    height: usize,
    seed: u64,
    frames: Vec<Frame>,
}

impl RunRecorder {
    pub fn new(width: usize, height: usize, seed: u64) -> Self {
        Self {
            width,
            height,
            seed,
            frames: Vec::new(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Clear all recorded frames, keeping the run parameters.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn into_recording(self) -> RunRecording {
        RunRecording {
            width: self.width,
            height: self.height,
            seed: self.seed,
            frames: self.frames,
        }
    }
}

impl FeedbackSink for RunRecorder {
    fn on_step(&mut self, step: usize, outcome: &StepOutcome, cells: &[CellView]) {
        self.frames.push(Frame {
            step,
            outcome: *outcome,
            cells: cells.to_vec(),
        });
    }
}
