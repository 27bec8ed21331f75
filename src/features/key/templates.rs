//! Krumhansl-Kessler key templates
//!
//! Two reference profiles (major, minor) give the expected weight of each
//! scale degree relative to the tonic. Rotating each to the 12 tonics yields
//! the 24 candidate key profiles.
//!
//! # Reference
//!
//! Krumhansl, C. L., & Kessler, E. J. (1982). Tracing the Dynamic Changes in Perceived
//! Tonal Organization in a Spatial Representation of Musical Keys. *Psychological Review*,
//! 89(4), 334-368.

use crate::analysis::result::{Key, Mode};

/// Major profile, scale degree 0 (tonic) through 11
pub const MAJOR_PROFILE: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Minor profile, scale degree 0 (tonic) through 11
pub const MINOR_PROFILE: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Key templates for all 24 keys
///
/// Zero-sized: the profiles are compile-time constants shared by every
/// thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyTemplates;

impl KeyTemplates {
    /// Create key templates with Krumhansl-Kessler profiles
    pub fn new() -> Self {
        Self
    }

    /// Unrotated reference profile of a mode (index 0 = tonic)
    pub fn base_profile(&self, mode: Mode) -> &'static [f32; 12] {
        match mode {
            Mode::Major => &MAJOR_PROFILE,
            Mode::Minor => &MINOR_PROFILE,
        }
    }

    /// Profile of `key` indexed by absolute pitch class (index 0 = C)
    pub fn profile(&self, key: Key) -> KeyProfile {
        KeyProfile::for_key(key)
    }

    /// All 24 rotated profiles in candidate order (major 0..11, minor 0..11)
    pub fn profiles(&self) -> Vec<KeyProfile> {
        Key::all().map(KeyProfile::for_key).collect()
    }
}

/// A reference profile rotated to a specific tonic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyProfile {
    /// Key this profile represents
    pub key: Key,
    /// Weight of each absolute pitch class (0 = C)
    pub weights: [f32; 12],
}

impl KeyProfile {
    /// Rotate the mode's reference profile so degree 0 lands on the key's tonic
    ///
    /// # Example
    ///
    /// ```
    /// use keyscope::analysis::result::Key;
    /// use keyscope::features::key::templates::{KeyProfile, MAJOR_PROFILE};
    ///
    /// let g_major = KeyProfile::for_key(Key::Major(7));
    /// assert_eq!(g_major.weights[7], MAJOR_PROFILE[0]);
    /// assert_eq!(g_major.weights[2], MAJOR_PROFILE[7]); // D is the dominant of G
    /// ```
    pub fn for_key(key: Key) -> Self {
        let base = KeyTemplates.base_profile(key.mode());
        let tonic = key.tonic() as usize;
        let mut weights = [0.0f32; 12];
        for (degree, &w) in base.iter().enumerate() {
            weights[(tonic + degree) % 12] = w;
        }
        Self { key, weights }
    }
}
