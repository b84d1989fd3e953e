//! Text-only analysis: damage classification, normalization and numeric
//! token handling.
//!
//! Nothing in this module looks at geometry; every function takes a string
//! and returns a decision or a cleaned string.

pub mod classifier;
pub mod normalize;
pub mod numeric;

pub use classifier::{
    default_classifier, is_collapsed, is_spaced, needs_fix, needs_table_fix, SpacingClassifier,
};
pub use normalize::{
    is_multi_space, normalize_document_text, normalize_ligatures, normalize_mojibake,
    normalize_text_whitespace,
};
pub use numeric::{compact_numeric_spacing, extract_currency_number, CurrencyNumber};
