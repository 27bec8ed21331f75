//! Audio segments: a mono waveform plus optional time bounds

use std::ops::Range;

use crate::error::AnalysisError;

/// A bounded slice of a mono waveform to analyze
///
/// Borrows the caller's sample buffer. Bounds are given in seconds and are
/// converted to sample indices by truncation (`floor(t * sample_rate)`).
///
/// # Example
///
/// ```
/// use keyscope::io::segment::AudioSegment;
///
/// let samples = vec![0.1f32; 44100 * 4];
/// let segment = AudioSegment::new(&samples, 44100).with_bounds(Some(1.0), Some(2.5));
/// assert_eq!(segment.trimmed()?.len(), 66150);
/// # Ok::<(), keyscope::AnalysisError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AudioSegment<'a> {
    samples: &'a [f32],
    sample_rate: u32,
    start_time: Option<f64>,
    end_time: Option<f64>,
}

impl<'a> AudioSegment<'a> {
    /// Segment covering the whole buffer
    pub fn new(samples: &'a [f32], sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            start_time: None,
            end_time: None,
        }
    }

    /// Restrict the segment to `[start_time, end_time)` seconds
    ///
    /// `None` leaves that side open. Bounds are validated lazily by
    /// [`AudioSegment::sample_range`].
    pub fn with_bounds(mut self, start_time: Option<f64>, end_time: Option<f64>) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    /// Full, untrimmed sample buffer
    pub fn samples(&self) -> &'a [f32] {
        self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Requested start time in seconds
    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    /// Requested end time in seconds
    pub fn end_time(&self) -> Option<f64> {
        self.end_time
    }

    /// Sample index range selected by the bounds
    ///
    /// The end index is clamped to the buffer length.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidSegment` if:
    /// - the sample rate is zero
    /// - a bound is negative or not finite
    /// - start is after end
    /// - no samples remain after trimming
    pub fn sample_range(&self) -> Result<Range<usize>, AnalysisError> {
        if self.sample_rate == 0 {
            return Err(AnalysisError::InvalidSegment(
                "sample rate must be > 0".to_string(),
            ));
        }

        let start = match self.start_time {
            Some(t) => self.time_to_samples(t, "start")?,
            None => 0,
        };
        let end = match self.end_time {
            Some(t) => self.time_to_samples(t, "end")?,
            None => self.samples.len(),
        };

        if let (Some(s), Some(e)) = (self.start_time, self.end_time) {
            if s > e {
                return Err(AnalysisError::InvalidSegment(format!(
                    "start time {:.3}s is after end time {:.3}s",
                    s, e
                )));
            }
        }

        let end = end.min(self.samples.len());
        if start >= end {
            return Err(AnalysisError::InvalidSegment(format!(
                "segment is empty after trimming ({} samples, range {}..{})",
                self.samples.len(),
                start,
                end
            )));
        }

        Ok(start..end)
    }

    /// Samples inside the bounds
    ///
    /// # Errors
    ///
    /// Same conditions as [`AudioSegment::sample_range`], plus
    /// `InvalidSegment` if any selected sample is NaN or infinite.
    pub fn trimmed(&self) -> Result<&'a [f32], AnalysisError> {
        let range = self.sample_range()?;
        let samples = &self.samples[range.clone()];

        if let Some(pos) = samples.iter().position(|s| !s.is_finite()) {
            return Err(AnalysisError::InvalidSegment(format!(
                "non-finite sample at index {}",
                range.start + pos
            )));
        }

        Ok(samples)
    }

    /// Length of the trimmed segment in seconds
    pub fn duration_seconds(&self) -> Result<f64, AnalysisError> {
        let range = self.sample_range()?;
        Ok(range.len() as f64 / self.sample_rate as f64)
    }

    fn time_to_samples(&self, t: f64, which: &str) -> Result<usize, AnalysisError> {
        if !t.is_finite() || t < 0.0 {
            return Err(AnalysisError::InvalidSegment(format!(
                "{} time must be a non-negative number of seconds, got {}",
                which, t
            )));
        }
        Ok((t * self.sample_rate as f64).floor() as usize)
    }
}
