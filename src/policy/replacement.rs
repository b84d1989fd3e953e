//! Replacement policy: should a candidate reconstruction overwrite the
//! original span text?
//!
//! Rules are evaluated in order and the first one that fires decides. When no
//! rule is conclusive the candidate must beat the original's spacing badness
//! by a margin, so ambiguous cases keep the original.

use crate::config::{RepairConfig, ReplacementConfig};
use crate::error::Result;
use crate::policy::cell_cleanup::clean_table_cell_text;
use crate::text::classifier::{
    has_merged_alnum, has_run_on, is_alpha_token, word_tokens, SpacingClassifier,
};
use crate::text::numeric::{
    digits_only, extract_currency_number, is_negative_number_text, is_numeric_only,
    is_suspect_currency_cell, number_grouping_is_valid,
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SUSPICIOUS_NUMERIC: Regex = Regex::new(r"^[.,]?\d[.,]?$").unwrap();
    static ref ALPHA_TOKEN: Regex = Regex::new(r"[A-Za-zĂÂÎăâîșțȚȘ]+").unwrap();
    static ref DEFAULT_POLICY: ReplacementPolicy = ReplacementPolicy::default();
}

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u', 'A', 'E', 'I', 'O', 'U', 'ă', 'â', 'î', 'Ă', 'Â', 'Î'];

/// Minimum length of a token that may be a clipped word.
const SUFFIX_MIN_TOKEN_LEN: usize = 6;

/// Outcome of a replacement decision, naming the rule that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Candidate accepted
    Accept(AcceptReason),
    /// Candidate rejected
    Reject(RejectReason),
}

impl Decision {
    /// Whether the candidate should replace the original.
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept(_))
    }
}

/// Rule that accepted a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptReason {
    /// Original was blank
    BlankOriginal,
    /// Candidate extends the original by a few characters
    SuffixCompletion,
    /// Table damage healed into fewer tokens
    TableTokensHealed,
    /// Suspect numeric original gained digits
    NumericRepair,
    /// Currency cell gained plausible leading digits
    NumericCellRepair,
    /// One- or two-letter fragment expanded
    ShortTextRepair,
    /// Original was damaged, candidate is clean
    DamageRemoved,
    /// Candidate has clearly lower spacing badness
    LowerBadness,
}

/// Rule that rejected a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Candidate empty or identical to the original
    NoChange,
    /// Candidate much shorter than the original
    TooShort,
    /// Candidate lost too many tokens
    TooFewTokens,
    /// Candidate not clearly better
    NotBetter,
}

/// Replacement policy bound to a classifier and thresholds.
#[derive(Debug, Clone, Default)]
pub struct ReplacementPolicy {
    config: ReplacementConfig,
    classifier: SpacingClassifier,
}

/// Whether a cell is numeric-only and looks truncated: blank, at most two
/// digits, a lone digit with a separator, or a leading separator.
pub fn needs_numeric_repair(text: &str) -> bool {
    if !is_numeric_only(text) {
        return false;
    }
    let stripped = text.trim();
    let digits = digits_only(stripped);
    digits.len() <= 2
        || SUSPICIOUS_NUMERIC.is_match(stripped)
        || (stripped.starts_with(['.', ',']) && digits.len() <= 4)
}

/// Blank text, or a one- or two-letter alphabetic fragment.
pub fn needs_short_text_repair(text: &str) -> bool {
    let stripped = text.trim();
    stripped.is_empty() || (is_alpha_token(stripped) && stripped.chars().count() <= 2)
}

/// Whether the text ends in what looks like a clipped word: a final letter
/// token of six or more characters that does not end in a vowel.
///
/// # Examples
///
/// ```
/// use pdf_spacefix::policy::replacement::needs_suffix_completion;
///
/// assert!(needs_suffix_completion("11.10. Alte cheltuiel"));
/// assert!(!needs_suffix_completion("Alte cheltuieli"));
/// ```
pub fn needs_suffix_completion(text: &str) -> bool {
    let stripped = text.trim();
    if stripped.chars().count() < SUFFIX_MIN_TOKEN_LEN {
        return false;
    }
    let Some(last) = ALPHA_TOKEN.find_iter(stripped).last() else {
        return false;
    };
    let token = last.as_str();
    if token.chars().count() < SUFFIX_MIN_TOKEN_LEN {
        return false;
    }
    token.chars().next_back().is_some_and(|c| !VOWELS.contains(&c))
}

impl ReplacementPolicy {
    /// Create a policy.
    pub fn new(config: ReplacementConfig, classifier: SpacingClassifier) -> Self {
        Self { config, classifier }
    }

    /// Build a policy from a full configuration.
    pub fn from_config(config: &RepairConfig) -> Result<Self> {
        Ok(Self::new(
            config.replacement.clone(),
            SpacingClassifier::new(&config.lexicon)?,
        ))
    }

    /// Classifier used by the policy.
    pub fn classifier(&self) -> &SpacingClassifier {
        &self.classifier
    }

    /// Thresholds in use.
    pub fn config(&self) -> &ReplacementConfig {
        &self.config
    }

    /// Heuristic spacing badness; higher is worse, zero for typical prose.
    ///
    /// ```text
    /// max(0, avg_token_len - neutral) + long_tokens * long_weight
    ///     + run_on + merged_alnum + spaced
    /// ```
    pub fn spacing_badness(&self, text: &str) -> f32 {
        let tokens = word_tokens(text);
        if tokens.is_empty() {
            return 0.0;
        }
        let w = &self.config.badness;
        let lengths: Vec<usize> = tokens.iter().map(|t| t.chars().count()).collect();
        let avg = lengths.iter().sum::<usize>() as f32 / lengths.len() as f32;
        let long_tokens = lengths.iter().filter(|&&l| l >= w.long_token_length).count();

        let mut badness = (avg - w.neutral_token_length).max(0.0);
        badness += long_tokens as f32 * w.long_token_weight;
        if has_run_on(text) {
            badness += w.run_on_weight;
        }
        if has_merged_alnum(text) {
            badness += w.merged_alnum_weight;
        }
        if self.classifier.is_spaced(text) {
            badness += w.spaced_weight;
        }
        badness
    }

    /// Whether a table cell should be routed through reconstruction.
    pub fn needs_table_cell_repair(&self, text: &str) -> bool {
        self.classifier.needs_table_fix(text)
            || needs_numeric_repair(text)
            || needs_short_text_repair(text)
            || needs_suffix_completion(text)
    }

    fn is_suffix_extension(&self, original: &str, candidate: &str) -> bool {
        if !candidate.starts_with(original) {
            return false;
        }
        let extra = candidate.chars().count() - original.chars().count();
        extra > 0 && extra <= self.config.max_suffix_extension
    }

    /// Decide whether `candidate` should replace `original`.
    pub fn decide(&self, original: &str, candidate: &str, table_mode: bool) -> Decision {
        if candidate.is_empty() || candidate == original {
            return Decision::Reject(RejectReason::NoChange);
        }
        if original.trim().is_empty() {
            return Decision::Accept(AcceptReason::BlankOriginal);
        }
        if self.is_suffix_extension(original, candidate) {
            return Decision::Accept(AcceptReason::SuffixCompletion);
        }

        let old_tokens = word_tokens(original).len();
        let new_tokens = word_tokens(candidate).len();
        let table_damaged = table_mode && self.classifier.needs_table_fix(original);

        if table_damaged && old_tokens > 0 {
            let limit = ((old_tokens as f32 * self.config.table_token_ratio) as usize).max(1);
            if new_tokens <= limit {
                return Decision::Accept(AcceptReason::TableTokensHealed);
            }
        }

        if needs_numeric_repair(original)
            && is_numeric_only(candidate)
            && digits_only(candidate).len() > digits_only(original).len()
        {
            return Decision::Accept(AcceptReason::NumericRepair);
        }

        if table_mode && self.should_replace_numeric_cell(original, candidate) {
            return Decision::Accept(AcceptReason::NumericCellRepair);
        }

        if needs_short_text_repair(original) && candidate.chars().count() > original.chars().count() {
            return Decision::Accept(AcceptReason::ShortTextRepair);
        }

        let original_spaced = self.classifier.is_spaced(original);
        let original_numeric = is_numeric_only(original);

        let old_len = original.chars().count();
        let min_len = self
            .config
            .min_candidate_length
            .max((old_len as f32 * self.config.min_length_ratio) as usize);
        if candidate.chars().count() < min_len && !(original_spaced || original_numeric) {
            return Decision::Reject(RejectReason::TooShort);
        }

        if old_tokens > 0 {
            let min_tokens = ((old_tokens as f32 * self.config.min_token_ratio) as usize).max(1);
            if new_tokens < min_tokens && !(original_spaced || original_numeric || table_damaged) {
                return Decision::Reject(RejectReason::TooFewTokens);
            }
        }

        if self.classifier.needs_fix(original) && !self.classifier.needs_fix(candidate) {
            return Decision::Accept(AcceptReason::DamageRemoved);
        }
        if table_damaged && !self.classifier.needs_table_fix(candidate) {
            return Decision::Accept(AcceptReason::DamageRemoved);
        }

        if self.spacing_badness(candidate) + self.config.badness_margin
            < self.spacing_badness(original)
        {
            return Decision::Accept(AcceptReason::LowerBadness);
        }
        Decision::Reject(RejectReason::NotBetter)
    }

    /// Whether `candidate` should replace `original`.
    pub fn should_replace(&self, original: &str, candidate: &str, table_mode: bool) -> bool {
        let decision = self.decide(original, candidate, table_mode);
        log::trace!("{:?} -> {:?}: {:?}", original, candidate, decision);
        decision.is_accept()
    }

    /// Numeric cell rule: accept a candidate that parses to the same currency
    /// and sign with strictly more digits and valid grouping, when the
    /// original is a suspect currency cell or the candidate only adds up to
    /// `max_extra_digits` leading digits.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_spacefix::policy::replacement::ReplacementPolicy;
    ///
    /// let policy = ReplacementPolicy::default();
    /// assert!(policy.should_replace_numeric_cell("RON 71.371", "RON 471.371"));
    /// assert!(!policy.should_replace_numeric_cell("RON 71.371", "RON 1.371.000"));
    /// ```
    pub fn should_replace_numeric_cell(&self, original: &str, candidate: &str) -> bool {
        if original.is_empty() || candidate.is_empty() {
            return false;
        }
        if self.classifier.is_spaced(candidate) {
            return false;
        }
        let base_clean = clean_table_cell_text(original);
        let cand_clean = clean_table_cell_text(candidate);
        if base_clean == cand_clean {
            return false;
        }
        let (Some(base), Some(cand)) = (
            extract_currency_number(&base_clean),
            extract_currency_number(&cand_clean),
        ) else {
            return false;
        };
        if base.currency != cand.currency {
            return false;
        }
        if is_negative_number_text(&base_clean) != is_negative_number_text(&cand_clean) {
            return false;
        }

        let base_digits = digits_only(&base.number);
        let cand_digits = digits_only(&cand.number);
        if base_digits.is_empty() || cand_digits.len() <= base_digits.len() {
            return false;
        }
        if !number_grouping_is_valid(&cand.number) {
            return false;
        }
        if is_suspect_currency_cell(&base_clean) {
            return true;
        }
        cand_digits.ends_with(&base_digits)
            && cand_digits.len() - base_digits.len() <= self.config.max_extra_digits
    }
}

/// The policy built from default settings.
pub fn default_policy() -> &'static ReplacementPolicy {
    &DEFAULT_POLICY
}

/// [`ReplacementPolicy::should_replace`] with default settings.
pub fn should_replace(original: &str, candidate: &str, table_mode: bool) -> bool {
    DEFAULT_POLICY.should_replace(original, candidate, table_mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decide(original: &str, candidate: &str, table_mode: bool) -> Decision {
        ReplacementPolicy::default().decide(original, candidate, table_mode)
    }

    #[test]
    fn test_no_change() {
        assert_eq!(decide("abc", "abc", false), Decision::Reject(RejectReason::NoChange));
        assert_eq!(decide("abc", "", false), Decision::Reject(RejectReason::NoChange));
    }

    #[test]
    fn test_blank_original() {
        assert_eq!(decide("  ", "Total", false), Decision::Accept(AcceptReason::BlankOriginal));
    }

    #[test]
    fn test_suffix_completion() {
        assert_eq!(
            decide("cheltuiel", "cheltuieli", true),
            Decision::Accept(AcceptReason::SuffixCompletion)
        );
        // Four extra characters is not a completion
        assert_ne!(
            decide("cheltu", "cheltuieli", false),
            Decision::Accept(AcceptReason::SuffixCompletion)
        );
    }

    #[test]
    fn test_table_tokens_healed() {
        assert_eq!(
            decide(
                "Vi t e z a de ro t a ț ie a a ct i v e l or",
                "Viteza de rotație a activelor",
                true
            ),
            Decision::Accept(AcceptReason::TableTokensHealed)
        );
    }

    #[test]
    fn test_numeric_repair() {
        assert_eq!(decide(".96", "6.961", true), Decision::Accept(AcceptReason::NumericRepair));
        assert_eq!(decide("7", "17", false), Decision::Accept(AcceptReason::NumericRepair));
    }

    #[test]
    fn test_numeric_cell_repair_only_in_table_mode() {
        assert_eq!(
            decide("RON 71.371", "RON 471.371", true),
            Decision::Accept(AcceptReason::NumericCellRepair)
        );
        assert!(!should_replace("RON 71.371", "RON 1.371.000", true));
    }

    #[test]
    fn test_short_text_repair() {
        assert_eq!(decide("Ve", "Venituri", false), Decision::Accept(AcceptReason::ShortTextRepair));
    }

    #[test]
    fn test_too_short() {
        assert_eq!(
            decide("Rezultatul net al exercitiului", "Rezultat", false),
            Decision::Reject(RejectReason::TooShort)
        );
    }

    #[test]
    fn test_too_few_tokens() {
        assert_eq!(
            decide("Rezultatul net al exercitiului financiar", "Rezultatul exercitiului", false),
            Decision::Reject(RejectReason::TooFewTokens)
        );
    }

    #[test]
    fn test_damage_removed() {
        assert_eq!(
            decide("situatia finan c iara a grupului", "situatia financiara a grupului", false),
            Decision::Accept(AcceptReason::DamageRemoved)
        );
    }

    #[test]
    fn test_not_better() {
        assert_eq!(
            decide("Venituri din vanzari", "Venituri din vanzare", false),
            Decision::Reject(RejectReason::NotBetter)
        );
    }

    #[test]
    fn test_badness_scores() {
        let policy = ReplacementPolicy::default();
        assert_eq!(policy.spacing_badness("Text normal cu spatii"), 0.0);
        assert_eq!(policy.spacing_badness(""), 0.0);
        let fused = policy.spacing_badness("politicacompanieideoptimizareastructuriidatoriilor");
        assert!(fused > 40.0);
    }

    #[test]
    fn test_needs_numeric_repair() {
        assert!(needs_numeric_repair("12"));
        assert!(needs_numeric_repair(".5"));
        assert!(needs_numeric_repair(".961"));
        assert!(!needs_numeric_repair("12.345"));
        assert!(!needs_numeric_repair("RON 1"));
    }

    #[test]
    fn test_needs_suffix_completion() {
        assert!(needs_suffix_completion("Alte cheltuiel"));
        assert!(!needs_suffix_completion("Total"));
        assert!(!needs_suffix_completion("cheltuieli"));
        assert!(!needs_suffix_completion("123456"));
    }

    #[test]
    fn test_needs_table_cell_repair() {
        let policy = ReplacementPolicy::default();
        assert!(policy.needs_table_cell_repair("E U"));
        assert!(policy.needs_table_cell_repair("7"));
        assert!(policy.needs_table_cell_repair(""));
        assert!(!policy.needs_table_cell_repair("RON 168.506.901"));
    }
}
