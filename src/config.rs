//! Configuration for spacing and cell repair.
//!
//! Every heuristic threshold used by the classifier, the reconstructor, the
//! replacement policy, the reconciler and the selection loop lives here, so a
//! run can be reproduced from one serialized [`RepairConfig`].
//!
//! # Examples
//!
//! ```
//! use pdf_spacefix::config::{GapConfig, RepairConfig};
//!
//! let config = RepairConfig::default()
//!     .with_gap(GapConfig::default().with_fallback_ratio(0.4));
//! assert!(config.validate().is_ok());
//! assert_eq!(config.gap.fallback_ratio, 0.4);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Gap-threshold estimator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    /// Threshold as a fraction of the median character width when clustering
    /// is not possible (fewer than two gaps, or clusters not separated).
    pub fallback_ratio: f32,
    /// Minimum distance between the two cluster means, as a fraction of the
    /// median character width.
    pub min_separation_ratio: f32,
    /// Iteration cap for the two-centroid split.
    pub max_iterations: usize,
    /// Centroid movement below which the split is considered converged.
    pub epsilon: f32,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            fallback_ratio: 0.35,
            min_separation_ratio: 0.3,
            max_iterations: 8,
            epsilon: 1e-3,
        }
    }
}

impl GapConfig {
    /// Set the fallback ratio.
    pub fn with_fallback_ratio(mut self, ratio: f32) -> Self {
        self.fallback_ratio = ratio;
        self
    }

    /// Set the minimum cluster separation ratio.
    pub fn with_min_separation_ratio(mut self, ratio: f32) -> Self {
        self.min_separation_ratio = ratio;
        self
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }
}

/// Line reconstruction and clip settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    /// Line grouping tolerance as a fraction of the median glyph height.
    pub line_ratio: f32,
    /// Explicit whitespace glyphs narrower than this fraction of the median
    /// width do not produce a space.
    pub space_width_ratio: f32,
    /// Padding added around a span's bbox before querying glyphs.
    pub clip_pad: f32,
    /// Pad multiplier used when re-querying for clipped trailing glyphs.
    pub suffix_pad_multiplier: f32,
    /// Minimum share of a sample's own area that must fall inside the clip
    /// for a cached sample to be returned.
    pub min_clip_overlap: f32,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            line_ratio: 0.6,
            space_width_ratio: 0.6,
            clip_pad: 1.0,
            suffix_pad_multiplier: 3.0,
            min_clip_overlap: 0.2,
        }
    }
}

impl ReconstructionConfig {
    /// Set the line grouping ratio.
    pub fn with_line_ratio(mut self, ratio: f32) -> Self {
        self.line_ratio = ratio;
        self
    }

    /// Set the explicit-space width ratio.
    pub fn with_space_width_ratio(mut self, ratio: f32) -> Self {
        self.space_width_ratio = ratio;
        self
    }

    /// Set the clip padding.
    pub fn with_clip_pad(mut self, pad: f32) -> Self {
        self.clip_pad = pad;
        self
    }
}

/// Weights of the spacing badness score.
///
/// The score is a heuristic linear combination; the weights are meant to be
/// tuned against a corpus rather than treated as constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadnessWeights {
    /// Average token length above which each extra character adds one point.
    pub neutral_token_length: f32,
    /// Token length from which a token counts as very long.
    pub long_token_length: usize,
    /// Points per very long token.
    pub long_token_weight: f32,
    /// Points when an unbroken letter run is present.
    pub run_on_weight: f32,
    /// Points when fused digit/letter blocks are present.
    pub merged_alnum_weight: f32,
    /// Points when the text is classified as spaced.
    pub spaced_weight: f32,
}

impl Default for BadnessWeights {
    fn default() -> Self {
        Self {
            neutral_token_length: 6.0,
            long_token_length: 18,
            long_token_weight: 1.5,
            run_on_weight: 4.0,
            merged_alnum_weight: 3.0,
            spaced_weight: 4.0,
        }
    }
}

/// Replacement policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplacementConfig {
    /// Badness score weights.
    pub badness: BadnessWeights,
    /// Required badness improvement before an otherwise undecided candidate wins.
    pub badness_margin: f32,
    /// Absolute floor for the candidate length guard.
    pub min_candidate_length: usize,
    /// Candidate must keep at least this share of the original length.
    pub min_length_ratio: f32,
    /// Candidate must keep at least this share of the original token count.
    pub min_token_ratio: f32,
    /// In table mode, a damaged original whose candidate shrinks to this share
    /// of the token count is accepted.
    pub table_token_ratio: f32,
    /// Longest suffix (in characters) accepted as a completion of the original.
    pub max_suffix_extension: usize,
    /// Most digits a numeric cell may gain when the original is not suspect.
    pub max_extra_digits: usize,
}

impl Default for ReplacementConfig {
    fn default() -> Self {
        Self {
            badness: BadnessWeights::default(),
            badness_margin: 0.5,
            min_candidate_length: 8,
            min_length_ratio: 0.4,
            min_token_ratio: 0.6,
            table_token_ratio: 0.6,
            max_suffix_extension: 3,
            max_extra_digits: 2,
        }
    }
}

impl ReplacementConfig {
    /// Set the badness weights.
    pub fn with_badness(mut self, badness: BadnessWeights) -> Self {
        self.badness = badness;
        self
    }

    /// Set the badness margin.
    pub fn with_badness_margin(mut self, margin: f32) -> Self {
        self.badness_margin = margin;
        self
    }
}

/// Cross-extraction spatial matching settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Minimum share of the base cell covered by the alternate cell.
    pub min_base_coverage: f32,
    /// Minimum share of the alternate cell covered by the base cell.
    pub min_alternate_coverage: f32,
    /// Score weight of the base coverage.
    pub base_weight: f32,
    /// Score weight of the alternate coverage.
    pub alternate_weight: f32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            min_base_coverage: 0.5,
            min_alternate_coverage: 0.15,
            base_weight: 0.7,
            alternate_weight: 0.3,
        }
    }
}

/// Extraction retry policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Fast extraction with fewer characters per page triggers a retry.
    pub min_chars_per_page: f32,
    /// Fast extraction with a higher spaced-cell ratio triggers a retry.
    pub max_spaced_ratio: f32,
    /// Retry wins when its spaced ratio is below this fraction of the fast one.
    pub spaced_improvement_factor: f32,
    /// Retry wins when its text is longer than this multiple of the fast one.
    pub min_length_gain: f32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_chars_per_page: 200.0,
            max_spaced_ratio: 0.04,
            spaced_improvement_factor: 0.5,
            min_length_gain: 1.2,
        }
    }
}

impl SelectionConfig {
    /// Set the characters-per-page floor.
    pub fn with_min_chars_per_page(mut self, chars: f32) -> Self {
        self.min_chars_per_page = chars;
        self
    }

    /// Set the spaced-cell ratio floor.
    pub fn with_max_spaced_ratio(mut self, ratio: f32) -> Self {
        self.max_spaced_ratio = ratio;
        self
    }
}

/// Currency column alignment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// Currency codes recognized when aligning columns.
    pub codes: Vec<String>,
    /// Share of a column's samples the dominant code must reach.
    pub dominance: f32,
    /// Minimum number of currency-bearing cells in a column.
    pub min_samples: usize,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            codes: vec!["RON".to_string(), "EUR".to_string()],
            dominance: 0.7,
            min_samples: 2,
        }
    }
}

/// Allow-lists that keep the classifier from flagging legitimate text.
///
/// Both lists are corpus-specific carve-outs, so they are data rather than
/// literals in the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    /// Single-letter tokens that are real words ("a", "i", "o").
    pub single_letter_words: Vec<String>,
    /// Regex patterns of legitimate word + single-letter suffixes in table
    /// cells (the accounting "Sold C" / "Sold D" columns).
    pub table_suffix_exemptions: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            single_letter_words: ["a", "A", "i", "I", "o", "O"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            table_suffix_exemptions: vec![r"(?i)\bSOLD\s+[CD]\b".to_string()],
        }
    }
}

impl Lexicon {
    /// Add a legitimate single-letter word.
    pub fn with_single_letter_word(mut self, word: impl Into<String>) -> Self {
        self.single_letter_words.push(word.into());
        self
    }

    /// Add a table suffix exemption pattern.
    pub fn with_table_suffix_exemption(mut self, pattern: impl Into<String>) -> Self {
        self.table_suffix_exemptions.push(pattern.into());
        self
    }
}

/// Complete repair configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Gap-threshold estimator settings
    pub gap: GapConfig,
    /// Line reconstruction settings
    pub reconstruction: ReconstructionConfig,
    /// Replacement policy settings
    pub replacement: ReplacementConfig,
    /// Cross-extraction matching settings
    pub reconcile: ReconcileConfig,
    /// Extraction retry settings
    pub selection: SelectionConfig,
    /// Currency alignment settings
    pub currency: CurrencyConfig,
    /// Classifier allow-lists
    pub lexicon: Lexicon,
    /// Picture date cleanup settings
    pub cleanup: CleanupConfig,
}

/// Document cleanup settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Share of a date item's area that must lie inside a picture for the
    /// item to be treated as picture noise.
    pub picture_date_overlap: f32,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            picture_date_overlap: 0.6,
        }
    }
}

fn check_ratio(name: &str, value: f32) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Config(format!(
            "{} must be a finite non-negative number, got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_fraction(name: &str, value: f32) -> Result<()> {
    check_ratio(name, value)?;
    if value > 1.0 {
        return Err(Error::Config(format!("{} must be within [0, 1], got {}", name, value)));
    }
    Ok(())
}

impl RepairConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the gap estimator settings.
    pub fn with_gap(mut self, gap: GapConfig) -> Self {
        self.gap = gap;
        self
    }

    /// Replace the reconstruction settings.
    pub fn with_reconstruction(mut self, reconstruction: ReconstructionConfig) -> Self {
        self.reconstruction = reconstruction;
        self
    }

    /// Replace the replacement policy settings.
    pub fn with_replacement(mut self, replacement: ReplacementConfig) -> Self {
        self.replacement = replacement;
        self
    }

    /// Replace the reconciler settings.
    pub fn with_reconcile(mut self, reconcile: ReconcileConfig) -> Self {
        self.reconcile = reconcile;
        self
    }

    /// Replace the selection settings.
    pub fn with_selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = selection;
        self
    }

    /// Replace the currency alignment settings.
    pub fn with_currency(mut self, currency: CurrencyConfig) -> Self {
        self.currency = currency;
        self
    }

    /// Replace the classifier allow-lists.
    pub fn with_lexicon(mut self, lexicon: Lexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    /// Check every value for range and consistency.
    ///
    /// # Returns
    ///
    /// `Error::Config` naming the first offending field, or
    /// `Error::InvalidPattern` when an exemption pattern does not compile.
    pub fn validate(&self) -> Result<()> {
        check_ratio("gap.fallback_ratio", self.gap.fallback_ratio)?;
        check_ratio("gap.min_separation_ratio", self.gap.min_separation_ratio)?;
        check_ratio("gap.epsilon", self.gap.epsilon)?;
        if self.gap.max_iterations == 0 {
            return Err(Error::Config("gap.max_iterations must be at least 1".to_string()));
        }

        let rc = &self.reconstruction;
        check_ratio("reconstruction.line_ratio", rc.line_ratio)?;
        check_ratio("reconstruction.space_width_ratio", rc.space_width_ratio)?;
        check_ratio("reconstruction.clip_pad", rc.clip_pad)?;
        check_fraction("reconstruction.min_clip_overlap", rc.min_clip_overlap)?;
        if !(rc.suffix_pad_multiplier.is_finite() && rc.suffix_pad_multiplier >= 1.0) {
            return Err(Error::Config(format!(
                "reconstruction.suffix_pad_multiplier must be >= 1, got {}",
                rc.suffix_pad_multiplier
            )));
        }

        let rp = &self.replacement;
        check_ratio("replacement.badness_margin", rp.badness_margin)?;
        check_fraction("replacement.min_length_ratio", rp.min_length_ratio)?;
        check_fraction("replacement.min_token_ratio", rp.min_token_ratio)?;
        check_fraction("replacement.table_token_ratio", rp.table_token_ratio)?;

        let rec = &self.reconcile;
        check_fraction("reconcile.min_base_coverage", rec.min_base_coverage)?;
        check_fraction("reconcile.min_alternate_coverage", rec.min_alternate_coverage)?;
        check_ratio("reconcile.base_weight", rec.base_weight)?;
        check_ratio("reconcile.alternate_weight", rec.alternate_weight)?;

        let sel = &self.selection;
        check_ratio("selection.min_chars_per_page", sel.min_chars_per_page)?;
        check_fraction("selection.max_spaced_ratio", sel.max_spaced_ratio)?;
        check_fraction("selection.spaced_improvement_factor", sel.spaced_improvement_factor)?;
        check_ratio("selection.min_length_gain", sel.min_length_gain)?;

        check_fraction("currency.dominance", self.currency.dominance)?;
        if self.currency.codes.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::Config("currency.codes must not contain empty codes".to_string()));
        }

        check_fraction("cleanup.picture_date_overlap", self.cleanup.picture_date_overlap)?;

        for pattern in &self.lexicon.table_suffix_exemptions {
            regex::Regex::new(pattern).map_err(|source| Error::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RepairConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        log::debug!("Loaded repair configuration from {}", path.as_ref().display());
        Ok(config)
    }
}
