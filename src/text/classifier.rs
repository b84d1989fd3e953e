//! Spacing damage classification.
//!
//! Decides whether a string shows artificial inter-letter spacing
//! ("f i n a n c i a r"), run-on fusion ("politicacompanieide..."), or the
//! stricter table-cell damage patterns. All checks are pure and run on the
//! text alone; geometry is never consulted.
//!
//! Legitimate single-letter words and the table suffix carve-outs come from a
//! [`Lexicon`], so corpus-specific exceptions can be swapped without touching
//! the rules.
//!
//! # Examples
//!
//! ```
//! use pdf_spacefix::text::classifier::{is_collapsed, is_spaced, needs_table_fix};
//!
//! assert!(is_spaced("finan c iar"));
//! assert!(!is_spaced("Group a inregistrat rezultate"));
//! assert!(is_collapsed("politicacompanieideoptimizareastructuriidatoriilor"));
//! assert!(!needs_table_fix("Sold C"));
//! ```

use crate::config::Lexicon;
use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

/// Letters of the table-cell patterns (ASCII plus Romanian diacritics).
pub(crate) const LETTER_CLASS: &str = "A-Za-zĂÂÎȘȚăâîșț";

lazy_static! {
    // Runs of single word characters: "E U", "s p a c e"
    static ref SPACED_TEXT: Regex = Regex::new(r"(?:\b\w\b\s+)+\b\w\b").unwrap();

    // Three or more single digits separated by spaces: "1 2 3"
    static ref SPACED_DIGIT: Regex = Regex::new(r"(?:\b\d\b\s+){2,}\b\d\b").unwrap();

    // Separator split from its digits: "1. 2", "1 . 2", "3 /4"
    static ref SPACED_NUMBER: Regex = Regex::new(r"\d[.,/]\s+\d|\d\s+[.,/]\s*\d").unwrap();

    // A word broken around a single character: "finan c iar"
    static ref SPLIT_WORD: Regex = Regex::new(r"\b(\w{2,})\s+(\w)\s+(\w{2,})\b").unwrap();

    static ref RUNON_LETTERS: Regex = Regex::new(r"[^\W\d_]{20,}").unwrap();

    static ref RUNON_MERGED_ALNUM: Regex =
        Regex::new(r"[^\W\d_]{6,}\d{2,}[^\W\d_]{2,}|\d{2,}[^\W\d_]{6,}").unwrap();

    static ref WORD_TOKEN: Regex = Regex::new(r"\w+").unwrap();

    static ref SHORT_ALPHA_SEQ: Regex = Regex::new(&format!(
        r"(?:\b[{l}]{{1,2}}\b\s+){{2,}}\b[{l}]{{1,2}}\b",
        l = LETTER_CLASS
    ))
    .unwrap();

    static ref TRAILING_SINGLE_ALPHA: Regex =
        Regex::new(&format!(r"\b[{l}]{{2,}}\s+[{l}]\b", l = LETTER_CLASS)).unwrap();

    static ref DEFAULT_CLASSIFIER: SpacingClassifier = SpacingClassifier::default();
}

/// Minimum length (in characters) before the word-level spaced heuristics apply.
const MIN_SPACED_LEN: usize = 6;
/// Minimum length before the run-on token statistics apply.
const MIN_COLLAPSED_LEN: usize = 60;
/// Minimum `\w` token count for run-on token statistics.
const MIN_COLLAPSED_TOKENS: usize = 8;
const COLLAPSED_AVG_TOKEN_LEN: f32 = 9.0;
const COLLAPSED_LONG_TOKEN_LEN: usize = 18;
const COLLAPSED_LONG_TOKENS: usize = 2;
const LOW_SPACE_DENSITY_LEN: usize = 120;
const LOW_SPACE_DENSITY: f32 = 0.05;

/// Whether every character of a non-empty token is alphabetic.
pub(crate) fn is_alpha_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}

/// Spacing classifier bound to a lexicon of legitimate short words.
#[derive(Debug, Clone)]
pub struct SpacingClassifier {
    single_letter_words: HashSet<String>,
    table_suffix_exemptions: Vec<Regex>,
}

impl Default for SpacingClassifier {
    fn default() -> Self {
        let lexicon = Lexicon::default();
        let table_suffix_exemptions = lexicon
            .table_suffix_exemptions
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self {
            single_letter_words: lexicon.single_letter_words.into_iter().collect(),
            table_suffix_exemptions,
        }
    }
}

impl SpacingClassifier {
    /// Build a classifier from a lexicon.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPattern` if an exemption pattern does not compile.
    pub fn new(lexicon: &Lexicon) -> Result<Self> {
        let mut table_suffix_exemptions = Vec::with_capacity(lexicon.table_suffix_exemptions.len());
        for pattern in &lexicon.table_suffix_exemptions {
            let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            table_suffix_exemptions.push(regex);
        }
        Ok(Self {
            single_letter_words: lexicon.single_letter_words.iter().cloned().collect(),
            table_suffix_exemptions,
        })
    }

    fn is_common_single(&self, token: &str) -> bool {
        self.single_letter_words.contains(token)
    }

    fn is_rare_alpha(&self, token: &str) -> bool {
        is_alpha_token(token) && !self.is_common_single(token)
    }

    /// A run of single characters containing a letter outside the lexicon.
    fn has_rare_letter_run(&self, text: &str) -> bool {
        SPACED_TEXT
            .find_iter(text)
            .any(|m| m.as_str().split_whitespace().any(|tok| self.is_rare_alpha(tok)))
    }

    /// Detect artificial inter-character spacing.
    ///
    /// Spaced digit runs and separators split from their digits are flagged
    /// at any length. Text shorter than six characters is otherwise never
    /// spaced; longer text is checked for runs of single characters
    /// containing a letter outside the lexicon, words broken around a single
    /// letter and the share of one-character tokens.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_spacefix::text::classifier::SpacingClassifier;
    ///
    /// let classifier = SpacingClassifier::default();
    /// assert!(classifier.is_spaced("1 2 3"));
    /// assert!(!classifier.is_spaced("E U"));
    /// assert!(classifier.is_spaced("E U R O"));
    /// ```
    pub fn is_spaced(&self, text: &str) -> bool {
        if SPACED_DIGIT.is_match(text) || SPACED_NUMBER.is_match(text) {
            return true;
        }

        if text.chars().count() < MIN_SPACED_LEN {
            return false;
        }

        if self.has_rare_letter_run(text) {
            return true;
        }

        let mut has_split = false;
        for caps in SPLIT_WORD.captures_iter(text) {
            has_split = true;
            if let Some(middle) = caps.get(2) {
                if self.is_rare_alpha(middle.as_str()) {
                    return true;
                }
            }
        }

        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() < 4 {
            return false;
        }
        let singles: Vec<&str> = tokens
            .iter()
            .copied()
            .filter(|tok| {
                let mut chars = tok.chars();
                matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphanumeric())
            })
            .collect();
        if singles.len() as f32 / tokens.len() as f32 >= 0.5 {
            return true;
        }

        if has_split {
            let rare = singles.iter().filter(|tok| self.is_rare_alpha(tok)).count();
            if rare >= 2 {
                return true;
            }
            if !singles.is_empty() && rare as f32 / singles.len() as f32 >= 0.5 {
                return true;
            }
        }
        false
    }

    /// Detect run-on text with missing spaces.
    pub fn is_collapsed(&self, text: &str) -> bool {
        is_collapsed(text)
    }

    /// Whether generic text should be routed through spacing repair.
    pub fn needs_fix(&self, text: &str) -> bool {
        self.is_spaced(text) || is_collapsed(text)
    }

    /// Stricter check for table cells.
    ///
    /// Besides [`SpacingClassifier::needs_fix`], flags single letters split
    /// apart at any length ("E U"), sequences of short letter fragments
    /// ("Vi t e") and a lone trailing letter after a word ("Cheltuiel i"),
    /// unless a lexicon exemption matches. Purely numeric cells are never
    /// flagged here.
    pub fn needs_table_fix(&self, text: &str) -> bool {
        if self.needs_fix(text) {
            return true;
        }
        if text.is_empty() {
            return false;
        }
        let has_digit = text.chars().any(|c| c.is_numeric());
        let has_letter = text.chars().any(char::is_alphabetic);
        if has_digit && !has_letter {
            return false;
        }
        if self.has_rare_letter_run(text) || SHORT_ALPHA_SEQ.is_match(text) {
            return true;
        }
        if TRAILING_SINGLE_ALPHA.is_match(text) {
            if self.table_suffix_exemptions.iter().any(|re| re.is_match(text)) {
                log::trace!("Table suffix exemption matched: {:?}", text);
                return false;
            }
            return true;
        }
        false
    }
}

/// The classifier built from the default lexicon.
pub fn default_classifier() -> &'static SpacingClassifier {
    &DEFAULT_CLASSIFIER
}

/// [`SpacingClassifier::is_spaced`] with the default lexicon.
pub fn is_spaced(text: &str) -> bool {
    DEFAULT_CLASSIFIER.is_spaced(text)
}

/// Detect run-on text where spaces are likely missing between words.
///
/// Flags an unbroken letter run of 20+ characters, fused letter/digit blocks,
/// and, for text of at least 60 characters with 8+ word tokens, a high average
/// token length, several very long tokens, or very sparse spacing.
pub fn is_collapsed(text: &str) -> bool {
    if RUNON_LETTERS.is_match(text) || RUNON_MERGED_ALNUM.is_match(text) {
        return true;
    }
    let len = text.chars().count();
    if len < MIN_COLLAPSED_LEN {
        return false;
    }
    let tokens: Vec<&str> = WORD_TOKEN.find_iter(text).map(|m| m.as_str()).collect();
    if tokens.len() < MIN_COLLAPSED_TOKENS {
        return false;
    }
    let lengths: Vec<usize> = tokens.iter().map(|t| t.chars().count()).collect();
    let avg = lengths.iter().sum::<usize>() as f32 / lengths.len() as f32;
    let long_tokens = lengths
        .iter()
        .filter(|&&l| l >= COLLAPSED_LONG_TOKEN_LEN)
        .count();
    let space_ratio = text.chars().filter(|&c| c == ' ').count() as f32 / len.max(1) as f32;

    avg >= COLLAPSED_AVG_TOKEN_LEN
        || long_tokens >= COLLAPSED_LONG_TOKENS
        || (len > LOW_SPACE_DENSITY_LEN && space_ratio < LOW_SPACE_DENSITY)
}

/// [`SpacingClassifier::needs_fix`] with the default lexicon.
pub fn needs_fix(text: &str) -> bool {
    DEFAULT_CLASSIFIER.needs_fix(text)
}

/// [`SpacingClassifier::needs_table_fix`] with the default lexicon.
pub fn needs_table_fix(text: &str) -> bool {
    DEFAULT_CLASSIFIER.needs_table_fix(text)
}

/// Whether a letter run or fused letter/digit block is present.
pub(crate) fn has_run_on(text: &str) -> bool {
    RUNON_LETTERS.is_match(text)
}

/// Whether fused letter/digit blocks are present.
pub(crate) fn has_merged_alnum(text: &str) -> bool {
    RUNON_MERGED_ALNUM.is_match(text)
}

/// `\w+` tokens of a string.
pub(crate) fn word_tokens(text: &str) -> Vec<&str> {
    WORD_TOKEN.find_iter(text).map(|m| m.as_str()).collect()
}
