//! # keyscope
//!
//! Musical key estimation from audio: tonic pitch class plus major/minor
//! mode, computed from the harmonic content of a mono waveform.
//!
//! ## Features
//!
//! - **Chroma Extraction**: constant-Q style transform with 24 bins per octave,
//!   folded into 12 pitch classes and summed over time
//! - **Key Detection**: Pearson correlation against the 24 rotated
//!   Krumhansl-Kessler profiles, with a best key and an optional close alternate
//! - **Batch Estimation**: independent segments analyzed in parallel
//!
//! ## Quick Start
//!
//! ```no_run
//! use keyscope::estimate_key;
//!
//! // Mono f32 samples at a known sample rate
//! let samples: Vec<f32> = vec![]; // Your audio data
//! let sample_rate = 44100;
//!
//! let estimate = estimate_key(&samples, sample_rate, None, None)?;
//!
//! println!("Key: {} (confidence: {:.3})", estimate.key, estimate.confidence);
//! if let Some(alt) = estimate.alternative_key {
//!     println!("Alternative: {}", alt);
//! }
//! # Ok::<(), keyscope::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! AudioSegment → ChromaExtractor → Chromagram → KeyEstimator → KeyEstimate
//! ```
//!
//! Every stage is a pure function of its inputs; the reference profiles are
//! compile-time constants, so estimations can run on any number of threads.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;

use rayon::prelude::*;

// Re-export main types
pub use analysis::result::{Key, KeyEstimate, Mode};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use features::chroma::Chromagram;
pub use features::key::AlternatePolicy;
pub use io::segment::AudioSegment;

/// Estimate the key of a mono waveform
///
/// Uses [`AnalysisConfig::default`]. Samples should be mono; 44100 Hz is
/// recommended for reproducible results.
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz
/// * `start_time` - Optional start of the analyzed region in seconds
/// * `end_time` - Optional end of the analyzed region in seconds
///
/// # Errors
///
/// - `InvalidSegment` if nothing remains after trimming or the input is malformed
/// - `IndeterminateKey` if the segment is silent
///
/// # Example
///
/// ```no_run
/// use keyscope::estimate_key;
///
/// let samples = vec![0.0f32; 44100 * 30];
/// let estimate = estimate_key(&samples, 44100, Some(5.0), Some(20.0));
/// assert!(estimate.is_err()); // silence has no key
/// ```
pub fn estimate_key(
    samples: &[f32],
    sample_rate: u32,
    start_time: Option<f64>,
    end_time: Option<f64>,
) -> Result<KeyEstimate, AnalysisError> {
    let segment = AudioSegment::new(samples, sample_rate).with_bounds(start_time, end_time);
    estimate_key_with_config(&segment, &AnalysisConfig::default())
}

/// Estimate the key of an audio segment with explicit configuration
///
/// # Errors
///
/// - `InvalidSegment` if nothing remains after trimming or the input is malformed
/// - `IndeterminateKey` if the segment is silent
/// - `InvalidInput` if the configuration is invalid
pub fn estimate_key_with_config(
    segment: &AudioSegment<'_>,
    config: &AnalysisConfig,
) -> Result<KeyEstimate, AnalysisError> {
    use std::time::Instant;
    let start = Instant::now();

    log::debug!(
        "Starting key estimation: {} samples at {} Hz, bounds {:?}..{:?}",
        segment.samples().len(),
        segment.sample_rate(),
        segment.start_time(),
        segment.end_time()
    );

    config.validate()?;
    let duration = segment.duration_seconds()?;

    let chromagram = features::chroma::extractor::aggregate_chroma(segment, config)?;
    let estimate = features::key::detector::select_key(&chromagram, config)?;

    log::debug!(
        "Key estimation of {:.2} s finished in {:.2} ms: {} ({:.3})",
        duration,
        start.elapsed().as_secs_f32() * 1000.0,
        estimate.key,
        estimate.confidence
    );

    Ok(estimate)
}

/// Estimate keys for many segments in parallel
///
/// Each segment is analyzed independently; results are returned in input
/// order and a failure for one segment does not affect the others.
pub fn estimate_keys_batch(
    segments: &[AudioSegment<'_>],
    config: &AnalysisConfig,
) -> Vec<Result<KeyEstimate, AnalysisError>> {
    log::debug!("Estimating keys for {} segments", segments.len());

    segments
        .par_iter()
        .map(|segment| estimate_key_with_config(segment, config))
        .collect()
}
