//! Integration tests for spacing classification and text normalization.
//!
//! Covers the public classifier entry points on realistic report fragments,
//! lexicon overrides loaded through configuration, and property checks for
//! invariants that must hold for any input.

use pdf_spacefix::config::{Lexicon, RepairConfig};
use pdf_spacefix::geometry::{area, intersection_area, overlap_ratio, BBox};
use pdf_spacefix::text::classifier::SpacingClassifier;
use pdf_spacefix::text::{
    is_collapsed, is_multi_space, is_spaced, needs_fix, needs_table_fix, normalize_ligatures,
    normalize_text_whitespace,
};
use proptest::prelude::*;

// ============================================================================
// Realistic fragments
// ============================================================================

#[test]
fn test_spaced_headings_detected() {
    assert!(is_spaced("S I T U A T I A  F I N A N C I A R A"));
    assert!(is_spaced("Cheltuieli de ex p loatare"));
    assert!(is_spaced("1 2 3 4 5"));
    assert!(is_spaced("12. 345"));
}

#[test]
fn test_clean_prose_not_flagged() {
    let prose = "Societatea a inregistrat o crestere a veniturilor in anul 2024";
    assert!(!is_spaced(prose));
    assert!(!is_collapsed(prose));
    assert!(!needs_fix(prose));
}

#[test]
fn test_run_on_text_flagged() {
    assert!(needs_fix("Situatiaconsolidataapozitieifinanciare"));
    assert!(needs_fix("Profitul2024net"));
}

#[test]
fn test_table_specific_damage() {
    assert!(needs_table_fix("Alte cheltuiel i"));
    assert!(needs_table_fix("Ve n it"));
    assert!(!needs_table_fix("Sold C"));
    assert!(!needs_table_fix("1.234.567"));
    assert!(!needs_table_fix("Total active"));
}

#[test]
fn test_short_fragments_are_table_damage_only() {
    for text in ["E U", "a b c", "x y"] {
        assert!(!is_spaced(text), "{:?}", text);
        assert!(!needs_fix(text), "{:?}", text);
        assert!(needs_table_fix(text), "{:?}", text);
    }
    assert!(is_spaced("1 2 3"));
    assert!(is_spaced("3 /4"));
}

#[test]
fn test_lexicon_from_config_json() {
    let json = r#"{
        "lexicon": {
            "single_letter_words": ["a", "e", "i", "o"],
            "table_suffix_exemptions": ["(?i)\\bCLASA\\s+[A-Z]\\b"]
        }
    }"#;
    let config = RepairConfig::from_json_str(json).unwrap();
    let classifier = SpacingClassifier::new(&config.lexicon).unwrap();

    assert!(!classifier.is_spaced("totul e bine"));
    assert!(!classifier.needs_table_fix("Clasa B"));
    // the default SOLD exemption was replaced, not extended
    assert!(classifier.needs_table_fix("Sold C"));
}

#[test]
fn test_default_lexicon_matches_free_functions() {
    let classifier = SpacingClassifier::new(&Lexicon::default()).unwrap();
    for text in ["E U", "finan c iar", "Group a inregistrat", "Sold D", "Cheltuiel i"] {
        assert_eq!(classifier.is_spaced(text), is_spaced(text), "{:?}", text);
        assert_eq!(classifier.needs_table_fix(text), needs_table_fix(text), "{:?}", text);
    }
}

#[test]
fn test_normalization_leaves_damage_detection_meaningful() {
    let text = "Total  \t venituri   din   exploatare";
    assert!(is_multi_space(text));
    let normalized = normalize_text_whitespace(text);
    assert_eq!(normalized, "Total venituri din exploatare");
    assert!(!needs_fix(&normalized));
}

#[test]
fn test_ligatures() {
    assert_eq!(normalize_ligatures("pro\u{FB01}t \u{FB02}ux"), "profit flux");
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_single_word_never_spaced(word in "[a-zA-Z]{1,15}") {
        prop_assert!(!is_spaced(&word));
    }

    #[test]
    fn prop_grouped_numbers_never_table_damage(
        head in "[1-9][0-9]{0,2}",
        groups in prop::collection::vec("[0-9]{3}", 0..4),
    ) {
        let mut number = head;
        for group in &groups {
            number.push('.');
            number.push_str(group);
        }
        prop_assert!(!needs_table_fix(&number));
    }

    #[test]
    fn prop_whitespace_normalization_idempotent(text in "[a-z \t]{0,40}") {
        let once = normalize_text_whitespace(&text);
        prop_assert_eq!(normalize_text_whitespace(&once), once.clone());
        prop_assert!(!is_multi_space(&once));
    }

    #[test]
    fn prop_overlap_ratio_bounded(
        l1 in 0.0f32..500.0, t1 in 0.0f32..500.0, w1 in 0.0f32..100.0, h1 in 0.0f32..100.0,
        l2 in 0.0f32..500.0, t2 in 0.0f32..500.0, w2 in 0.0f32..100.0, h2 in 0.0f32..100.0,
    ) {
        let a = BBox::new(l1, t1, l1 + w1, t1 + h1);
        let b = BBox::new(l2, t2, l2 + w2, t2 + h2);
        let ratio = overlap_ratio(&a, &b);
        prop_assert!((0.0..=1.0 + 1e-5).contains(&ratio));
        prop_assert!(area(&a) >= 0.0);
        prop_assert!((intersection_area(&a, &b) - intersection_area(&b, &a)).abs() < 1e-3);
    }
}
