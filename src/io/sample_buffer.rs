//! Centered, zero-padded analysis framing

use crate::error::AnalysisError;

/// Frame view over a sample slice
///
/// Frame `i` is centered on sample `i * hop_size`; samples outside the slice
/// read as zero. This yields `1 + len / hop_size` frames, so even a segment
/// shorter than one frame produces at least one frame.
#[derive(Debug, Clone, Copy)]
pub struct SampleBuffer<'a> {
    data: &'a [f32],
    frame_size: usize,
    hop_size: usize,
}

impl<'a> SampleBuffer<'a> {
    /// Create a new frame view
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if `frame_size` or `hop_size` is zero.
    pub fn new(data: &'a [f32], frame_size: usize, hop_size: usize) -> Result<Self, AnalysisError> {
        if frame_size == 0 {
            return Err(AnalysisError::InvalidInput(
                "Frame size must be > 0".to_string(),
            ));
        }
        if hop_size == 0 {
            return Err(AnalysisError::InvalidInput(
                "Hop size must be > 0".to_string(),
            ));
        }
        Ok(Self {
            data,
            frame_size,
            hop_size,
        })
    }

    /// Samples per frame
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Number of frames
    pub fn num_frames(&self) -> usize {
        1 + self.data.len() / self.hop_size
    }

    /// Copy frame `index` into `out`, zero-padding outside the data
    ///
    /// `out` must hold `frame_size` samples; extra space is left untouched.
    pub fn fill_frame(&self, index: usize, out: &mut [f32]) {
        let n = self.frame_size.min(out.len());
        let start = (index * self.hop_size) as isize - (self.frame_size / 2) as isize;

        for (j, slot) in out.iter_mut().take(n).enumerate() {
            let pos = start + j as isize;
            *slot = if pos >= 0 && (pos as usize) < self.data.len() {
                self.data[pos as usize]
            } else {
                0.0
            };
        }
    }
}
