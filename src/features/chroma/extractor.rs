//! Chroma vector extraction
//!
//! Converts a mono waveform into 12-element chroma vectors through a
//! constant-Q style transform:
//!
//! 1. Centered Hann-windowed frames, FFT magnitude (`compute_stft`)
//! 2. Log-spaced constant-Q bins (`bins_per_octave` per octave, from `fmin`),
//!    each a triangular-weighted average of the FFT magnitudes inside its band
//! 3. Octave folding: every `bins_per_octave / 12` adjacent bins merge into
//!    one pitch class
//! 4. Per-frame normalization, then summation over frames
//!
//! With 24 bins per octave the quarter-tone bins separate neighbouring pitch
//! classes better than a linear-frequency spectrum does.
//!
//! # Reference
//!
//! Brown, J. C., & Puckette, M. S. (1992). An efficient algorithm for the
//! calculation of a constant Q transform. *JASA*, 92(5), 2698-2701.

use std::f32::consts::PI;

use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::normalization::normalize_frame;
use super::Chromagram;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::io::sample_buffer::SampleBuffer;
use crate::io::segment::AudioSegment;

/// Compute the magnitude spectrogram of centered, Hann-windowed frames
///
/// Frame `i` is centered on sample `i * hop_size` with zero padding at both
/// ends. Magnitudes are scaled by `2 / sum(window)` so a full-scale sinusoid
/// peaks near 1.0.
///
/// # Arguments
///
/// * `samples` - Audio samples
/// * `frame_size` - FFT frame size (default: 8192)
/// * `hop_size` - Hop size (default: 512)
///
/// # Returns
///
/// One magnitude vector of `frame_size / 2 + 1` bins per frame
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `samples` is empty or a size is zero.
pub fn compute_stft(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
) -> Result<Vec<Vec<f32>>, AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Empty audio samples".to_string(),
        ));
    }

    let buffer = SampleBuffer::new(samples, frame_size, hop_size)?;
    let spectrum = Spectrum::new(frame_size);

    log::debug!(
        "Computing STFT: {} samples, frame={}, hop={}, {} frames",
        samples.len(),
        frame_size,
        hop_size,
        buffer.num_frames()
    );

    let frames = (0..buffer.num_frames())
        .into_par_iter()
        .map_init(
            || spectrum.workspace(),
            |ws, i| {
                buffer.fill_frame(i, &mut ws.frame);
                spectrum.magnitudes(ws);
                ws.magnitudes.clone()
            },
        )
        .collect();

    Ok(frames)
}

/// Extract per-frame chroma vectors from an audio segment
///
/// # Arguments
///
/// * `segment` - Mono audio segment (bounds are applied first)
/// * `config` - Analysis configuration
///
/// # Returns
///
/// One 12-element chroma vector per frame, in frame order. Silent frames are
/// all-zero.
///
/// # Errors
///
/// - `InvalidSegment` if the segment is empty after trimming or malformed
/// - `InvalidInput` if the configuration is invalid or no constant-Q bin fits
///   below the Nyquist frequency
///
/// # Example
///
/// ```no_run
/// use keyscope::features::chroma::extractor::extract_chroma;
/// use keyscope::io::segment::AudioSegment;
/// use keyscope::AnalysisConfig;
///
/// let samples = vec![0.0f32; 44100 * 5];
/// let segment = AudioSegment::new(&samples, 44100);
/// let frames = extract_chroma(&segment, &AnalysisConfig::default())?;
/// # Ok::<(), keyscope::AnalysisError>(())
/// ```
pub fn extract_chroma(
    segment: &AudioSegment<'_>,
    config: &AnalysisConfig,
) -> Result<Vec<[f32; 12]>, AnalysisError> {
    config.validate()?;
    chroma_frames(segment, config)
}

/// Per-frame chroma for a configuration that has already been validated
pub(crate) fn chroma_frames(
    segment: &AudioSegment<'_>,
    config: &AnalysisConfig,
) -> Result<Vec<[f32; 12]>, AnalysisError> {
    let samples = segment.trimmed()?;
    let sample_rate = segment.sample_rate();

    log::debug!(
        "Extracting chroma: {} samples at {} Hz ({} bins/octave from {:.2} Hz)",
        samples.len(),
        sample_rate,
        config.bins_per_octave,
        config.fmin
    );

    if config.hop_size > config.frame_size {
        log::warn!(
            "hop_size ({}) exceeds frame_size ({}); some samples will not be analyzed",
            config.hop_size,
            config.frame_size
        );
    }

    let buffer = SampleBuffer::new(samples, config.frame_size, config.hop_size)?;
    let spectrum = Spectrum::new(buffer.frame_size());
    let kernel = ConstantQKernel::build(sample_rate, buffer.frame_size(), config)?;
    let floor = config.min_amplitude();

    // Collect in frame order so the later sum does not depend on scheduling
    let frames: Vec<[f32; 12]> = (0..buffer.num_frames())
        .into_par_iter()
        .map_init(
            || (spectrum.workspace(), vec![0.0f32; kernel.num_bins()]),
            |(ws, cq), i| {
                buffer.fill_frame(i, &mut ws.frame);
                spectrum.magnitudes(ws);
                kernel.apply(&ws.magnitudes, cq);

                let peak = cq.iter().fold(0.0f32, |m, &x| m.max(x));
                if peak < floor {
                    return [0.0f32; 12];
                }

                let mut chroma = kernel.fold(cq);
                normalize_frame(&mut chroma, config.norm);
                chroma
            },
        )
        .collect();

    let silent = frames
        .iter()
        .filter(|f| f.iter().all(|&x| x == 0.0))
        .count();
    log::debug!(
        "Extracted {} chroma frames ({} silent)",
        frames.len(),
        silent
    );

    Ok(frames)
}

/// Extract the time-aggregated chromagram of an audio segment
///
/// Sums the per-frame vectors from [`extract_chroma`].
///
/// # Errors
///
/// Same as [`extract_chroma`].
pub fn extract_chromagram(
    segment: &AudioSegment<'_>,
    config: &AnalysisConfig,
) -> Result<Chromagram, AnalysisError> {
    config.validate()?;
    aggregate_chroma(segment, config)
}

/// Summed chromagram for a configuration that has already been validated
pub(crate) fn aggregate_chroma(
    segment: &AudioSegment<'_>,
    config: &AnalysisConfig,
) -> Result<Chromagram, AnalysisError> {
    let frames = chroma_frames(segment, config)?;
    let chromagram = Chromagram::from_frames(&frames)?;

    if chromagram.is_silent() {
        log::warn!(
            "Segment is silent (all {} frames below {:.1} dB); key will be indeterminate",
            frames.len(),
            config.min_amplitude_db
        );
    }

    log::debug!("Chromagram: {:?}", chromagram.values());
    Ok(chromagram)
}

/// Windowed FFT magnitude computation shared across worker threads
struct Spectrum {
    fft: std::sync::Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,
    scale: f32,
}

/// Per-thread buffers for [`Spectrum`]
struct SpectrumWorkspace {
    frame: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl Spectrum {
    fn new(frame_size: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(frame_size);
        let window = hann_window(frame_size);
        let sum: f32 = window.iter().sum();
        let scale = if sum > 0.0 { 2.0 / sum } else { 0.0 };
        Self { fft, window, scale }
    }

    fn workspace(&self) -> SpectrumWorkspace {
        let n = self.window.len();
        SpectrumWorkspace {
            frame: vec![0.0; n],
            buffer: vec![Complex::new(0.0, 0.0); n],
            scratch: vec![Complex::new(0.0, 0.0); self.fft.get_inplace_scratch_len()],
            magnitudes: vec![0.0; n / 2 + 1],
        }
    }

    fn magnitudes(&self, ws: &mut SpectrumWorkspace) {
        for ((dst, &x), &w) in ws.buffer.iter_mut().zip(ws.frame.iter()).zip(self.window.iter()) {
            *dst = Complex::new(x * w, 0.0);
        }
        self.fft.process_with_scratch(&mut ws.buffer, &mut ws.scratch);
        for (m, c) in ws.magnitudes.iter_mut().zip(ws.buffer.iter()) {
            *m = c.norm() * self.scale;
        }
    }
}

/// Periodic Hann window
fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / n as f32).cos())
        .collect()
}

/// Constant-Q spectral kernel over an FFT magnitude spectrum
///
/// Each constant-Q bin `k` is centered at `fmin * 2^(k / bins_per_octave)`
/// with half-bandwidth `f_k * (2^(1 / bins_per_octave) - 1)`. Its value is a
/// triangular-weighted mean of the FFT bins inside the band; in the low
/// octaves, where the band is narrower than the FFT bin spacing, the
/// magnitude spectrum is linearly interpolated at `f_k` instead.
#[derive(Debug, Clone)]
pub struct ConstantQKernel {
    /// Sparse (fft bin, weight) rows, weights summing to 1
    rows: Vec<Vec<(usize, f32)>>,
    /// Pitch class of each constant-Q bin
    pitch_classes: Vec<usize>,
    /// Centre frequency of each constant-Q bin in Hz
    frequencies: Vec<f32>,
    n_fft_bins: usize,
}

impl ConstantQKernel {
    /// Build the kernel for a sample rate and FFT size
    ///
    /// Bins whose band reaches past the Nyquist frequency are dropped.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the sample rate is zero, the
    /// configuration is invalid, or no bin fits below Nyquist.
    pub fn new(
        sample_rate: u32,
        frame_size: usize,
        config: &AnalysisConfig,
    ) -> Result<Self, AnalysisError> {
        config.validate()?;
        Self::build(sample_rate, frame_size, config)
    }

    fn build(
        sample_rate: u32,
        frame_size: usize,
        config: &AnalysisConfig,
    ) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "Invalid sample rate: 0".to_string(),
            ));
        }
        if frame_size < 16 {
            return Err(AnalysisError::InvalidInput(format!(
                "frame_size must be >= 16, got {}",
                frame_size
            )));
        }

        let bpo = config.bins_per_octave;
        let n_bins = config.n_octaves.checked_mul(bpo).ok_or_else(|| {
            AnalysisError::InvalidInput(format!(
                "n_octaves ({}) x bins_per_octave ({}) overflows",
                config.n_octaves, bpo
            ))
        })?;
        let n_merge = bpo / 12;
        let n_fft_bins = frame_size / 2 + 1;
        let df = sample_rate as f32 / frame_size as f32;
        let nyquist = sample_rate as f32 / 2.0;
        let bandwidth_ratio = 2.0_f32.powf(1.0 / bpo as f32) - 1.0;
        let pc_offset = pitch_class_of(config.fmin);

        let mut rows = Vec::new();
        let mut pitch_classes = Vec::new();
        let mut frequencies = Vec::new();

        for k in 0..n_bins {
            let fk = config.fmin * 2.0_f32.powf(k as f32 / bpo as f32);
            let bw = fk * bandwidth_ratio;
            if fk + bw > nyquist {
                break;
            }

            let lo = ((fk - bw) / df).ceil().max(0.0) as usize;
            let hi = (((fk + bw) / df).floor() as usize).min(n_fft_bins - 1);

            let mut row: Vec<(usize, f32)> = (lo..=hi)
                .filter_map(|j| {
                    let w = 1.0 - (j as f32 * df - fk).abs() / bw;
                    (w > 0.0).then_some((j, w))
                })
                .collect();

            if row.is_empty() {
                let pos = fk / df;
                let j0 = pos.floor() as usize;
                let frac = pos - j0 as f32;
                row.push((j0, 1.0 - frac));
                if j0 + 1 < n_fft_bins && frac > 0.0 {
                    row.push((j0 + 1, frac));
                }
            }

            let total: f32 = row.iter().map(|(_, w)| w).sum();
            for (_, w) in row.iter_mut() {
                *w /= total;
            }

            rows.push(row);
            pitch_classes.push((pc_offset + (k + n_merge / 2) / n_merge) % 12);
            frequencies.push(fk);
        }

        if rows.is_empty() {
            return Err(AnalysisError::InvalidInput(format!(
                "No constant-Q bin fits below Nyquist ({:.1} Hz) starting from {:.2} Hz",
                nyquist, config.fmin
            )));
        }

        if rows.len() < n_bins {
            log::debug!(
                "Constant-Q kernel truncated to {} of {} bins by Nyquist ({:.1} Hz)",
                rows.len(),
                n_bins,
                nyquist
            );
        }

        Ok(Self {
            rows,
            pitch_classes,
            frequencies,
            n_fft_bins,
        })
    }

    /// Number of constant-Q bins
    pub fn num_bins(&self) -> usize {
        self.rows.len()
    }

    /// Centre frequency of bin `k` in Hz
    pub fn frequency(&self, k: usize) -> Option<f32> {
        self.frequencies.get(k).copied()
    }

    /// Pitch class (0 = C) that bin `k` folds into
    pub fn pitch_class(&self, k: usize) -> Option<usize> {
        self.pitch_classes.get(k).copied()
    }

    /// Map an FFT magnitude spectrum onto the constant-Q bins
    ///
    /// `spectrum` must hold `frame_size / 2 + 1` magnitudes and `out` must
    /// hold [`ConstantQKernel::num_bins`] values.
    pub fn apply(&self, spectrum: &[f32], out: &mut [f32]) {
        debug_assert_eq!(spectrum.len(), self.n_fft_bins);
        for (dst, row) in out.iter_mut().zip(self.rows.iter()) {
            *dst = row
                .iter()
                .map(|&(j, w)| spectrum.get(j).copied().unwrap_or(0.0) * w)
                .sum();
        }
    }

    /// Fold constant-Q magnitudes into 12 pitch classes
    pub fn fold(&self, cq: &[f32]) -> [f32; 12] {
        let mut chroma = [0.0f32; 12];
        for (&pc, &m) in self.pitch_classes.iter().zip(cq.iter()) {
            chroma[pc] += m;
        }
        chroma
    }
}

/// Nearest pitch class (0 = C) of a frequency
fn pitch_class_of(freq: f32) -> usize {
    let midi = 69.0 + 12.0 * (freq / 440.0).log2();
    (midi.round() as i64).rem_euclid(12) as usize
}
