//! Feature extraction modules
//!
//! This module contains the two estimation stages:
//! - Chroma extraction (waveform → 12-bin pitch-class energy)
//! - Key detection (chromagram → best and alternate key)

pub mod chroma;
pub mod key;
