//! Key detection algorithm
//!
//! Correlates a chromagram against the 24 Krumhansl-Kessler key profiles and
//! selects the best-fitting key plus an optional close alternate.
//!
//! For each tonic `t` and mode, the chromagram is read starting at `t`
//! (`x[m] = chroma[(t + m) % 12]`) and compared with the mode's unrotated
//! profile using the Pearson correlation coefficient. Scores are rounded to
//! `score_precision` decimals so that candidate comparison and output are
//! reproducible.

use super::templates::KeyTemplates;
use super::AlternatePolicy;
use crate::analysis::result::{Key, KeyEstimate};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::chroma::Chromagram;

/// Correlation score of every candidate key
///
/// # Arguments
///
/// * `chromagram` - Aggregated pitch-class energy
/// * `precision` - Decimal digits kept in each score (3 by default)
///
/// # Returns
///
/// 24 `(key, score)` pairs in candidate order: major tonics 0..11, then
/// minor tonics 0..11. Scores lie in [-1.0, 1.0]. A chromagram with energy
/// but no variance (every pitch class equal) scores 0.0 everywhere.
///
/// # Errors
///
/// Returns `AnalysisError::IndeterminateKey` if the chromagram is all-zero.
pub fn score_keys(
    chromagram: &Chromagram,
    precision: u32,
) -> Result<Vec<(Key, f32)>, AnalysisError> {
    if chromagram.is_silent() {
        return Err(AnalysisError::IndeterminateKey(
            "chromagram has no energy; correlation is undefined".to_string(),
        ));
    }

    let templates = KeyTemplates::new();
    let values = chromagram.values();

    let mut scores = Vec::with_capacity(24);
    let mut degenerate = false;

    for key in Key::all() {
        let tonic = key.tonic() as usize;
        let aligned: [f64; 12] =
            std::array::from_fn(|m| f64::from(values[(tonic + m) % 12]));
        let profile = templates.base_profile(key.mode());

        let score = match pearson(profile, &aligned) {
            Some(r) => round_score(r, precision).clamp(-1.0, 1.0),
            None => {
                degenerate = true;
                0.0
            }
        };
        scores.push((key, score as f32));
    }

    if degenerate {
        log::debug!("Chromagram has zero variance; all candidates score 0.0");
    }

    Ok(scores)
}

/// Detect the musical key of a chromagram
///
/// Picks the highest-scoring candidate as the primary key (first in
/// candidate order on ties). Any other candidate scoring above
/// `config.alternate_ratio * primary` and not equal to it qualifies as the
/// alternate; `config.alternate_policy` decides which one is reported.
///
/// # Errors
///
/// - `IndeterminateKey` if the chromagram is all-zero
/// - `InvalidInput` if the configuration is invalid
///
/// # Example
///
/// ```
/// use keyscope::features::chroma::Chromagram;
/// use keyscope::features::key::detect_key;
/// use keyscope::analysis::result::Key;
/// use keyscope::AnalysisConfig;
///
/// let mut values = [1.0f32; 12];
/// values[0] = 10.0;
/// let chroma = Chromagram::new(values)?;
/// let estimate = detect_key(&chroma, &AnalysisConfig::default())?;
///
/// assert_eq!(estimate.key, Key::Major(0));
/// assert!(estimate.alternative_key.is_none());
/// # Ok::<(), keyscope::AnalysisError>(())
/// ```
pub fn detect_key(
    chromagram: &Chromagram,
    config: &AnalysisConfig,
) -> Result<KeyEstimate, AnalysisError> {
    config.validate()?;
    select_key(chromagram, config)
}

/// Primary and alternate selection for an already validated configuration
pub(crate) fn select_key(
    chromagram: &Chromagram,
    config: &AnalysisConfig,
) -> Result<KeyEstimate, AnalysisError> {
    let scores = score_keys(chromagram, config.score_precision)?;
    let scale = 10f64.powi(config.score_precision as i32);

    // Compare in integer units of the rounding step so equality and the
    // ratio threshold are exact
    let units: Vec<i64> = scores
        .iter()
        .map(|(_, s)| (f64::from(*s) * scale).round() as i64)
        .collect();

    let best_idx = units
        .iter()
        .enumerate()
        .fold(0, |best, (i, &u)| if u > units[best] { i } else { best });
    let (key, confidence) = scores[best_idx];
    let best_units = units[best_idx];
    let threshold = best_units as f64 * config.alternate_ratio;

    let qualifying = units
        .iter()
        .enumerate()
        .filter(|&(_, &u)| u != best_units && u as f64 > threshold)
        .map(|(i, _)| i);

    let alternate_idx = match config.alternate_policy {
        AlternatePolicy::LastQualifying => qualifying.last(),
        AlternatePolicy::BestQualifying => {
            qualifying.fold(None, |best: Option<usize>, i| match best {
                Some(b) if units[b] >= units[i] => Some(b),
                _ => Some(i),
            })
        }
    };

    let (alternative_key, alternative_confidence) = match alternate_idx {
        Some(i) => (Some(scores[i].0), Some(scores[i].1)),
        None => (None, None),
    };

    log::debug!(
        "Detected key: {} (score {:.3}), alternate: {}",
        key,
        confidence,
        alternative_key.map_or_else(|| "none".to_string(), |k| k.to_string())
    );

    Ok(KeyEstimate {
        key,
        confidence,
        alternative_key,
        alternative_confidence,
        scores,
    })
}

/// Round to `precision` decimals from the exact binary value
///
/// `0.0045` is stored just below the half step and rounds down to `0.004`,
/// whereas scaling first (`0.0045 * 1000.0 == 4.5`) would round it up.
fn round_score(r: f64, precision: u32) -> f64 {
    let rounded = format!("{:.*}", precision as usize, r)
        .parse::<f64>()
        .unwrap_or(r);
    // Drop negative zero
    rounded + 0.0
}

/// Pearson correlation coefficient, `None` when either input has zero variance
fn pearson(profile: &[f32; 12], values: &[f64; 12]) -> Option<f64> {
    let n = 12.0;
    let mean_p = profile.iter().map(|&p| f64::from(p)).sum::<f64>() / n;
    let mean_v = values.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_p = 0.0;
    let mut var_v = 0.0;
    for (&p, &v) in profile.iter().zip(values.iter()) {
        let dp = f64::from(p) - mean_p;
        let dv = v - mean_v;
        cov += dp * dv;
        var_p += dp * dp;
        var_v += dv * dv;
    }

    let denom = (var_p * var_v).sqrt();
    if !(denom.is_finite() && denom > 0.0) {
        return None;
    }

    let r = cov / denom;
    r.is_finite().then_some(r)
}
