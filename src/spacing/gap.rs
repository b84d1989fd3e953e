//! Adaptive gap threshold between intra-word and inter-word spacing.
//!
//! Kerning gaps inside a word and real word gaps form two populations whose
//! separation depends on font and scale. Instead of a fixed margin, the gaps
//! of one line are split into two clusters with a scalar two-centroid
//! iteration and the threshold is placed at the midpoint of the cluster means:
//!
//! ```text
//! c1 = min(gaps), c2 = max(gaps)
//! repeat up to max_iterations:
//!     assign each gap to the nearer centroid (ties go to c1)
//!     recompute means, stop when both move less than epsilon
//! threshold = (c1 + c2) / 2
//! ```
//!
//! When the line has fewer than two gaps, a cluster ends up empty, or the
//! means are closer than `min_separation_ratio * median_char_width`, the
//! threshold falls back to `median_char_width * fallback_ratio`.

use crate::config::GapConfig;

/// How a threshold was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdSource {
    /// Midpoint of two separated clusters
    Clustered,
    /// Fewer than two gaps on the line
    TooFewGaps,
    /// All gaps fell into one cluster
    SingleCluster,
    /// Cluster means too close to indicate a word boundary
    NotSeparated,
}

/// A gap threshold with its provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapThreshold {
    /// Gaps strictly larger than this value are word boundaries
    pub value: f32,
    /// How the value was obtained
    pub source: ThresholdSource,
}

impl GapThreshold {
    /// Whether the threshold is the ratio-based fallback.
    pub fn is_fallback(&self) -> bool {
        self.source != ThresholdSource::Clustered
    }
}

/// Two-cluster gap threshold estimator.
#[derive(Debug, Clone, Default)]
pub struct GapThresholdEstimator {
    config: GapConfig,
}

fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f32>() / values.len() as f32)
    }
}

impl GapThresholdEstimator {
    /// Create an estimator with the given settings.
    pub fn new(config: GapConfig) -> Self {
        Self { config }
    }

    /// Settings in use.
    pub fn config(&self) -> &GapConfig {
        &self.config
    }

    fn fallback(&self, median_char_width: f32, source: ThresholdSource) -> GapThreshold {
        GapThreshold {
            value: median_char_width * self.config.fallback_ratio,
            source,
        }
    }

    /// Estimate the word-boundary threshold for one line.
    ///
    /// # Arguments
    ///
    /// * `gaps` - Non-negative horizontal gaps between consecutive items
    /// * `median_char_width` - Median width of the line's non-space glyphs
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_spacefix::spacing::gap::GapThresholdEstimator;
    ///
    /// let estimator = GapThresholdEstimator::default();
    /// let threshold = estimator.estimate(&[1.0, 0.9, 1.1, 4.0, 4.1], 2.0);
    /// assert!(threshold.value > 1.1 && threshold.value < 4.0);
    /// assert!(!threshold.is_fallback());
    /// ```
    pub fn estimate(&self, gaps: &[f32], median_char_width: f32) -> GapThreshold {
        let gaps: Vec<f32> = gaps.iter().copied().filter(|g| g.is_finite()).collect();
        if gaps.len() < 2 {
            return self.fallback(median_char_width, ThresholdSource::TooFewGaps);
        }

        let mut c1 = gaps.iter().copied().fold(f32::INFINITY, f32::min);
        let mut c2 = gaps.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut near: Vec<f32> = Vec::with_capacity(gaps.len());
        let mut far: Vec<f32> = Vec::with_capacity(gaps.len());

        for _ in 0..self.config.max_iterations.max(1) {
            near.clear();
            far.clear();
            for &g in &gaps {
                if (g - c1).abs() <= (g - c2).abs() {
                    near.push(g);
                } else {
                    far.push(g);
                }
            }
            let new_c1 = mean(&near).unwrap_or(c1);
            let new_c2 = mean(&far).unwrap_or(c2);
            if (new_c1 - c1).abs() < self.config.epsilon && (new_c2 - c2).abs() < self.config.epsilon
            {
                break;
            }
            c1 = new_c1;
            c2 = new_c2;
        }

        if near.is_empty() || far.is_empty() {
            return self.fallback(median_char_width, ThresholdSource::SingleCluster);
        }
        if (c2 - c1).abs() < median_char_width * self.config.min_separation_ratio {
            return self.fallback(median_char_width, ThresholdSource::NotSeparated);
        }

        GapThreshold {
            value: (c1 + c2) / 2.0,
            source: ThresholdSource::Clustered,
        }
    }
}
