//! Configuration parameters for key estimation

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::features::chroma::normalization::ChromaNorm;
use crate::features::key::AlternatePolicy;

/// Pitch of C1 in Hz (MIDI note 24), the lowest constant-Q bin by default
pub const C1_HZ: f32 = 32.703_197;

/// Largest accepted `n_octaves`
pub const MAX_OCTAVES: usize = 10;

/// Largest accepted `bins_per_octave`
pub const MAX_BINS_PER_OCTAVE: usize = 120;

/// Analysis configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Framing
    /// FFT frame length in samples (default: 8192)
    ///
    /// Long frames are needed to resolve quarter-tones in the lowest octaves.
    pub frame_size: usize,

    /// Hop between successive frames in samples (default: 512)
    pub hop_size: usize,

    // Constant-Q transform
    /// Centre frequency of the lowest constant-Q bin in Hz (default: C1)
    pub fmin: f32,

    /// Number of octaves covered by the constant-Q bins (default: 7)
    pub n_octaves: usize,

    /// Constant-Q bins per octave (default: 24, two per semitone)
    /// Must be a multiple of 12 and at least 24
    pub bins_per_octave: usize,

    // Chroma
    /// Per-frame chroma normalization (default: Max)
    pub norm: ChromaNorm,

    /// Frames whose loudest constant-Q bin is below this level are silent
    /// (default: -90.0 dBFS)
    pub min_amplitude_db: f32,

    // Key selection
    /// Decimal digits kept in correlation scores (default: 3)
    pub score_precision: u32,

    /// A candidate is a plausible alternate when its score exceeds
    /// `alternate_ratio * primary score` (default: 0.9)
    pub alternate_ratio: f64,

    /// How the alternate key is chosen among qualifying candidates
    pub alternate_policy: AlternatePolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_size: 8192,
            hop_size: 512,
            fmin: C1_HZ,
            n_octaves: 7,
            bins_per_octave: 24,
            norm: ChromaNorm::Max,
            min_amplitude_db: -90.0,
            score_precision: 3,
            alternate_ratio: 0.9,
            alternate_policy: AlternatePolicy::BestQualifying,
        }
    }
}

impl AnalysisConfig {
    /// Check parameter ranges
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` naming the first invalid field.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.frame_size < 16 {
            return Err(AnalysisError::InvalidInput(format!(
                "frame_size must be >= 16, got {}",
                self.frame_size
            )));
        }

        if self.hop_size == 0 {
            return Err(AnalysisError::InvalidInput(
                "hop_size must be > 0".to_string(),
            ));
        }

        if !self.fmin.is_finite() || self.fmin <= 0.0 {
            return Err(AnalysisError::InvalidInput(format!(
                "fmin must be a positive frequency, got {}",
                self.fmin
            )));
        }

        if self.n_octaves == 0 || self.n_octaves > MAX_OCTAVES {
            return Err(AnalysisError::InvalidInput(format!(
                "n_octaves must be in 1..={}, got {}",
                MAX_OCTAVES, self.n_octaves
            )));
        }

        if self.bins_per_octave < 24
            || self.bins_per_octave > MAX_BINS_PER_OCTAVE
            || self.bins_per_octave % 12 != 0
        {
            return Err(AnalysisError::InvalidInput(format!(
                "bins_per_octave must be a multiple of 12 in 24..={}, got {}",
                MAX_BINS_PER_OCTAVE, self.bins_per_octave
            )));
        }

        if !self.min_amplitude_db.is_finite() {
            return Err(AnalysisError::InvalidInput(
                "min_amplitude_db must be finite".to_string(),
            ));
        }

        if self.score_precision > 6 {
            return Err(AnalysisError::InvalidInput(format!(
                "score_precision must be <= 6, got {}",
                self.score_precision
            )));
        }

        if !(self.alternate_ratio > 0.0 && self.alternate_ratio <= 1.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "alternate_ratio must be in (0, 1], got {}",
                self.alternate_ratio
            )));
        }

        Ok(())
    }

    /// Silence floor as a linear amplitude
    pub fn min_amplitude(&self) -> f32 {
        10.0_f32.powf(self.min_amplitude_db / 20.0)
    }
}
