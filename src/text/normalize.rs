//! Text normalization for encoding artifacts and benign whitespace.
//!
//! Three independent fixes, all of which leave clean text untouched:
//!
//! - multi-space runs between tokens collapse to a single space
//! - typographic ligatures expand to their ASCII letters
//! - UTF-8 text that was decoded as windows-1252 or Latin-1 is round-tripped
//!   back, but only when the result is measurably cleaner

use crate::model::{DocumentModel, RepairSet};
use encoding_rs::WINDOWS_1252;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref HORIZONTAL_RUN: Regex = Regex::new(r"[ \t]{2,}").unwrap();
}

const LIGATURES: &[(char, &str)] = &[
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB00}', "ff"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

const ROMANIAN_DIACRITICS: &[char] = &['ă', 'â', 'î', 'ș', 'ț', 'Ă', 'Â', 'Î', 'Ș', 'Ț'];

/// Latin-1 supplement letters that are legitimate in Romanian text.
const ALLOWED_LATIN1: &[char] = &['â', 'î', 'Â', 'Î'];

const MIN_MOJIBAKE_LEN: usize = 4;

/// Whether the `[ \t]` run at `start..end` sits between two non-whitespace
/// characters.
fn is_between_tokens(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    matches!((before, after), (Some(b), Some(a)) if !b.is_whitespace() && !a.is_whitespace())
}

/// Detect runs of two or more spaces/tabs between tokens.
pub fn is_multi_space(text: &str) -> bool {
    HORIZONTAL_RUN
        .find_iter(text)
        .any(|m| is_between_tokens(text, m.start(), m.end()))
}

/// Collapse runs of spaces/tabs between tokens to one space.
///
/// Leading and trailing whitespace, and runs next to line breaks, are kept.
///
/// # Examples
///
/// ```
/// use pdf_spacefix::text::normalize::normalize_text_whitespace;
///
/// assert_eq!(normalize_text_whitespace("Total  \t venituri"), "Total venituri");
/// assert_eq!(normalize_text_whitespace("  indentat"), "  indentat");
/// ```
pub fn normalize_text_whitespace(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    HORIZONTAL_RUN
        .replace_all(text, |caps: &Captures| {
            let m = caps.get(0).map(|m| (m.start(), m.end(), m.as_str()));
            match m {
                Some((start, end, _)) if is_between_tokens(text, start, end) => " ".to_string(),
                Some((_, _, run)) => run.to_string(),
                None => String::new(),
            }
        })
        .into_owned()
}

/// Replace typographic ligatures with ASCII letters.
pub fn normalize_ligatures(text: &str) -> String {
    if !text.chars().any(|c| LIGATURES.iter().any(|(lig, _)| *lig == c)) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 4);
    for c in text.chars() {
        match LIGATURES.iter().find(|(lig, _)| *lig == c) {
            Some((_, expansion)) => out.push_str(expansion),
            None => out.push(c),
        }
    }
    out
}

/// Heuristic mojibake score: C1 controls weigh 3, unexpected Latin-1
/// supplement letters 1, replacement characters 4.
pub fn mojibake_score(text: &str) -> usize {
    text.chars()
        .map(|c| match c as u32 {
            0x80..=0x9F => 3,
            0xC0..=0xFF if !ALLOWED_LATIN1.contains(&c) => 1,
            0xFFFD => 4,
            _ => 0,
        })
        .sum()
}

fn romanian_diacritic_count(text: &str) -> usize {
    text.chars()
        .filter(|c| ROMANIAN_DIACRITICS.contains(c))
        .count()
}

fn reencode_windows_1252(text: &str) -> Option<String> {
    let (bytes, _, unmappable) = WINDOWS_1252.encode(text);
    if unmappable {
        return None;
    }
    std::str::from_utf8(&bytes).ok().map(str::to_string)
}

fn reencode_latin1(text: &str) -> Option<String> {
    let bytes: Option<Vec<u8>> = text
        .chars()
        .map(|c| u8::try_from(c as u32).ok())
        .collect();
    String::from_utf8(bytes?).ok()
}

/// Undo UTF-8 text decoded through a single-byte codepage.
///
/// Tries windows-1252 and Latin-1 round trips and keeps the best candidate
/// that lowers the mojibake score, gains a Romanian diacritic (unless it is
/// nearly clean), and keeps at least 90% of the original length.
///
/// # Examples
///
/// ```
/// use pdf_spacefix::text::normalize::normalize_mojibake;
///
/// assert_eq!(normalize_mojibake("situaÈ›ia financiarÄƒ"), "situația financiară");
/// assert_eq!(normalize_mojibake("text curat"), "text curat");
/// ```
pub fn normalize_mojibake(text: &str) -> String {
    let len = text.chars().count();
    if len < MIN_MOJIBAKE_LEN {
        return text.to_string();
    }
    let base_score = mojibake_score(text);
    if base_score == 0 {
        return text.to_string();
    }
    let base_diacritics = romanian_diacritic_count(text);
    let min_len = MIN_MOJIBAKE_LEN.max((len as f32 * 0.9) as usize);

    let mut best: Option<String> = None;
    let mut best_score = base_score;
    let candidates = [reencode_windows_1252(text), reencode_latin1(text)];
    for candidate in candidates.into_iter().flatten() {
        if candidate == text {
            continue;
        }
        let score = mojibake_score(&candidate);
        if score >= best_score {
            continue;
        }
        if romanian_diacritic_count(&candidate) < base_diacritics + 1 && score >= 2 {
            continue;
        }
        if candidate.chars().count() < min_len {
            continue;
        }
        best_score = score;
        best = Some(candidate);
    }

    match best {
        Some(fixed) => {
            log::trace!("Mojibake repaired: {:?} -> {:?}", text, fixed);
            fixed
        },
        None => text.to_string(),
    }
}

/// Mojibake, ligature and whitespace normalization for one string.
pub fn normalize_text(text: &str) -> String {
    let fixed = normalize_mojibake(text);
    let fixed = normalize_ligatures(&fixed);
    normalize_text_whitespace(&fixed)
}

/// Normalize every free text item of a document.
pub fn normalize_document_text(doc: &DocumentModel) -> RepairSet {
    let mut edits = RepairSet::new();
    for (id, item) in doc.text_items() {
        let normalized = normalize_text(&item.text);
        if normalized != item.text {
            edits.insert(id, normalized);
        }
    }
    if !edits.is_empty() {
        log::info!("Normalized {} text items", edits.len());
    }
    edits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocItem, SpanId, TextItem};

    #[test]
    fn test_multi_space_detection() {
        assert!(is_multi_space("foo  bar"));
        assert!(is_multi_space("foo\t\tbar"));
        assert!(!is_multi_space("foo bar"));
        assert!(!is_multi_space("  foo"));
        assert!(!is_multi_space("foo  \nbar"));
    }

    #[test]
    fn test_whitespace_keeps_edges() {
        assert_eq!(normalize_text_whitespace("a  b   c"), "a b c");
        assert_eq!(normalize_text_whitespace("a  "), "a  ");
        assert_eq!(normalize_text_whitespace("a\n   b"), "a\n   b");
    }

    #[test]
    fn test_ligatures() {
        assert_eq!(normalize_ligatures("pro\u{FB01}t"), "profit");
        assert_eq!(normalize_ligatures("a\u{FB04}uent"), "affluent");
        assert_eq!(normalize_ligatures("plain"), "plain");
    }

    #[test]
    fn test_mojibake_short_text_untouched() {
        assert_eq!(normalize_mojibake("Ä"), "Ä");
    }

    #[test]
    fn test_mojibake_latin1_path() {
        // "ă" (C4 83) decoded as Latin-1 leaves a C1 control
        let broken = "activ\u{00C4}\u{0083} total";
        assert_eq!(normalize_mojibake(broken), "activă total");
    }

    #[test]
    fn test_mojibake_legit_latin_text_untouched() {
        // Valid French text does not round-trip to valid UTF-8
        assert_eq!(normalize_mojibake("déjà vu"), "déjà vu");
    }

    #[test]
    fn test_mojibake_score() {
        assert_eq!(mojibake_score("abc"), 0);
        assert_eq!(mojibake_score("înâ"), 0);
        assert_eq!(mojibake_score("\u{FFFD}"), 4);
        assert_eq!(mojibake_score("\u{0083}é"), 4);
    }

    #[test]
    fn test_normalize_document_text() {
        let mut doc = DocumentModel::new();
        doc.push(DocItem::Text(TextItem {
            label: Default::default(),
            text: "Bene\u{FB01}cii  nete".to_string(),
            page_no: Some(1),
            bbox: None,
        }));
        doc.push(DocItem::Text(TextItem {
            label: Default::default(),
            text: "curat".to_string(),
            page_no: Some(1),
            bbox: None,
        }));
        let edits = normalize_document_text(&doc);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits.get(SpanId::text(0)), Some("Beneficii nete"));
    }
}
