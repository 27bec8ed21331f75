//! Key detection modules
//!
//! Detect musical key using:
//! - Krumhansl-Kessler templates (24 keys)
//! - Pearson correlation against each rotated template
//! - Primary / alternate candidate selection

pub mod detector;
pub mod templates;

pub use detector::{detect_key, score_keys};
pub use templates::{KeyProfile, KeyTemplates};

use serde::{Deserialize, Serialize};

/// How the alternate key is picked when several candidates qualify
///
/// A candidate qualifies when its score exceeds `alternate_ratio` times the
/// primary score and differs from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlternatePolicy {
    /// Highest-scoring qualifying candidate (first in candidate order on ties)
    #[default]
    BestQualifying,
    /// Last qualifying candidate in candidate order (major 0..11, then minor 0..11)
    LastQualifying,
}
