//! Chroma normalization strategies

use serde::{Deserialize, Serialize};

const EPSILON: f32 = 1e-10;

/// Per-frame chroma normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChromaNorm {
    /// Keep raw constant-Q magnitudes (loud frames dominate the sum)
    None,
    /// Scale so the strongest pitch class is 1.0 (L-infinity)
    Max,
    /// Scale so the values sum to 1.0
    L1,
    /// Scale to unit Euclidean length
    L2,
}

/// Normalize a 12-element chroma frame in place
///
/// Frames whose norm is below `1e-10` are left unchanged, so an all-zero
/// frame stays all-zero.
pub fn normalize_frame(chroma: &mut [f32; 12], norm: ChromaNorm) {
    let scale = match norm {
        ChromaNorm::None => return,
        ChromaNorm::Max => chroma.iter().fold(0.0f32, |m, &x| m.max(x.abs())),
        ChromaNorm::L1 => chroma.iter().map(|x| x.abs()).sum(),
        ChromaNorm::L2 => chroma.iter().map(|&x| x * x).sum::<f32>().sqrt(),
    };

    if scale > EPSILON {
        for x in chroma.iter_mut() {
            *x /= scale;
        }
    }
}
