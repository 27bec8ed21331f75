//! Chroma extraction modules
//!
//! Extract pitch-class distribution (12 semitones) from audio:
//! - Constant-Q style spectral transform (2+ bins per semitone)
//! - Octave folding into 12 pitch classes
//! - Per-frame normalization and time aggregation

pub mod extractor;
pub mod normalization;

pub use extractor::{compute_stft, extract_chroma, extract_chromagram, ConstantQKernel};
pub use normalization::ChromaNorm;

use serde::Serialize;

use crate::error::AnalysisError;

/// Time-aggregated pitch-class energy (C, C#, D, ..., B)
///
/// Values are finite and non-negative. Construct with [`Chromagram::new`]
/// or [`Chromagram::from_slice`], which enforce that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Chromagram {
    values: [f32; 12],
}

impl Chromagram {
    /// Wrap 12 pitch-class energies
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if any value is negative or not finite.
    pub fn new(values: [f32; 12]) -> Result<Self, AnalysisError> {
        if let Some((i, v)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(AnalysisError::InvalidInput(format!(
                "Chroma value at index {} must be finite and >= 0, got {}",
                i, v
            )));
        }
        Ok(Self { values })
    }

    /// Build from a slice that must hold exactly 12 values
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` on a length mismatch or invalid value.
    pub fn from_slice(values: &[f32]) -> Result<Self, AnalysisError> {
        let values: [f32; 12] = values.try_into().map_err(|_| {
            AnalysisError::InvalidInput(format!(
                "Chromagram must have 12 elements, got {}",
                values.len()
            ))
        })?;
        Self::new(values)
    }

    /// Sum per-frame chroma vectors in frame order
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if a frame holds an invalid value.
    pub fn from_frames(frames: &[[f32; 12]]) -> Result<Self, AnalysisError> {
        let mut values = [0.0f32; 12];
        for frame in frames {
            for (acc, &v) in values.iter_mut().zip(frame.iter()) {
                *acc += v;
            }
        }
        Self::new(values)
    }

    /// The 12 pitch-class energies
    pub fn values(&self) -> &[f32; 12] {
        &self.values
    }

    /// Total energy across pitch classes
    pub fn total_energy(&self) -> f32 {
        self.values.iter().sum()
    }

    /// True if every pitch class is exactly zero
    pub fn is_silent(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }

    /// Transpose up by `semitones`: energy at pitch class `p` moves to `p + semitones`
    pub fn rotated(&self, semitones: usize) -> Self {
        let k = semitones % 12;
        let mut values = [0.0f32; 12];
        for (p, &v) in self.values.iter().enumerate() {
            values[(p + k) % 12] = v;
        }
        Self { values }
    }

    /// Pitch class with the most energy (lowest index on ties)
    pub fn dominant_pitch_class(&self) -> usize {
        self.values
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0
    }
}
