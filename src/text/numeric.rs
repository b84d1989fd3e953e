//! Numeric and currency token helpers shared by reconstruction, cell cleanup
//! and the replacement policy.
//!
//! Numbers in the target documents use `.` as the thousands separator and `,`
//! as the decimal mark ("RON 1.234.567,89"), but OCR output mixes both
//! conventions, so grouping checks accept either order.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

lazy_static! {
    static ref NUMERIC_ONLY: Regex = Regex::new(r"^[0-9\s.,/%()-]+$").unwrap();
    static ref NUMERICISH: Regex = Regex::new(r"^[0-9\s.,()%+A-Z-]+$").unwrap();
    static ref MULTI_WHITESPACE: Regex = Regex::new(r"\s{2,}").unwrap();

    /// Currency codes recognized by cell cleanup.
    pub(crate) static ref CURRENCY_TOKEN: Regex = Regex::new(r"\b(RON|EUR)\b").unwrap();

    static ref NUMBER_TOKEN: Regex = Regex::new(r"[+-]?\(?[.,]?\d[\d.,]*\)?").unwrap();
}

/// A cell reduced to its currency code and its single number token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyNumber {
    /// Currency code, if the cell carries one
    pub currency: Option<String>,
    /// Raw number token, possibly with sign, parentheses and separators
    pub number: String,
}

/// Keep only the ASCII digits of a string.
pub fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Whether the trimmed text consists only of digits, separators, percent
/// signs, parentheses, dashes and whitespace.
pub fn is_numeric_only(text: &str) -> bool {
    NUMERIC_ONLY.is_match(text.trim())
}

/// Looser numeric test used by cell cleanup: digits and separators plus
/// upper-case letters (currency codes and their fragments).
pub fn is_numericish(text: &str) -> bool {
    NUMERICISH.is_match(&text.to_uppercase())
}

/// Drop every whitespace run whose left neighbour satisfies `left` and right
/// neighbour satisfies `right`.
pub(crate) fn remove_spaces_between<L, R>(text: &str, left: L, right: R) -> String
where
    L: Fn(char) -> bool,
    R: Fn(char) -> bool,
{
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_whitespace() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        let before = start.checked_sub(1).map(|idx| chars[idx]);
        let after = chars.get(i).copied();
        let drop = matches!((before, after), (Some(b), Some(a)) if left(b) && right(a));
        if !drop {
            out.extend(&chars[start..i]);
        }
    }
    out
}

fn collapse_and_trim(text: &str) -> String {
    MULTI_WHITESPACE.replace_all(text, " ").trim().to_string()
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Remove stray spaces inside a numeric-only reconstruction.
///
/// Spaces between digits, and between digits and `.,/%`, are dropped; other
/// text is returned unchanged.
///
/// # Examples
///
/// ```
/// use pdf_spacefix::text::numeric::compact_numeric_spacing;
///
/// assert_eq!(compact_numeric_spacing("1 234 . 5 %"), "1234.5%");
/// assert_eq!(compact_numeric_spacing("RON 1 234"), "RON 1 234");
/// ```
pub fn compact_numeric_spacing(text: &str) -> String {
    if !is_numeric_only(text) {
        return text.to_string();
    }
    let is_sep = |c: char| matches!(c, '.' | ',' | '/' | '%');
    let text = remove_spaces_between(text, is_digit, is_digit);
    let text = remove_spaces_between(&text, is_digit, is_sep);
    let text = remove_spaces_between(&text, is_sep, is_digit);
    collapse_and_trim(&text)
}

/// Cell-cleanup variant of [`compact_numeric_spacing`]: applies to
/// numeric-ish cells (currency codes allowed) and only around `.` and `,`.
pub fn compact_number_spacing(text: &str) -> String {
    if !is_numericish(text) {
        return text.to_string();
    }
    let is_sep = |c: char| matches!(c, '.' | ',');
    let text = remove_spaces_between(text, is_digit, is_digit);
    let text = remove_spaces_between(&text, is_digit, is_sep);
    let text = remove_spaces_between(&text, is_sep, is_digit);
    collapse_and_trim(&text)
}

/// Split a cell into a currency code and exactly one number token.
///
/// With a currency present, exactly one distinct code and one number are
/// required. Without one, the cell must contain no letters and one number.
pub fn extract_currency_number(text: &str) -> Option<CurrencyNumber> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let currencies: BTreeSet<&str> = CURRENCY_TOKEN
        .captures_iter(&normalized)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let numbers: Vec<&str> = NUMBER_TOKEN
        .find_iter(&normalized)
        .map(|m| m.as_str())
        .filter(|n| n.chars().any(|c| c.is_ascii_digit()))
        .collect();
    if numbers.is_empty() {
        return None;
    }
    if !currencies.is_empty() {
        if currencies.len() != 1 || numbers.len() != 1 {
            return None;
        }
        return Some(CurrencyNumber {
            currency: currencies.iter().next().map(|c| c.to_string()),
            number: numbers[0].to_string(),
        });
    }
    if normalized.chars().any(char::is_alphabetic) || numbers.len() != 1 {
        return None;
    }
    Some(CurrencyNumber {
        currency: None,
        number: numbers[0].to_string(),
    })
}

/// Strip parentheses, sign and spaces from a number token.
fn normalize_number_token(token: &str) -> String {
    token
        .trim()
        .trim_matches(|c| c == '(' || c == ')')
        .trim_start_matches(['+', '-'])
        .replace(' ', "")
}

fn has_edge_separator(token: &str) -> bool {
    let is_sep = |c: Option<char>| matches!(c, Some('.') | Some(','));
    is_sep(token.chars().next()) || is_sep(token.chars().next_back())
}

/// Whether a number token has well-formed thousands grouping.
///
/// The decimal part (after the last `,` when it follows the last `.`, or a
/// lone `,`) is ignored; every `.`-separated group after the first must have
/// exactly three digits.
pub fn number_grouping_is_valid(token: &str) -> bool {
    let mut normalized = normalize_number_token(token);
    if normalized.is_empty() || has_edge_separator(&normalized) {
        return false;
    }
    let has_comma = normalized.contains(',');
    let has_dot = normalized.contains('.');
    if has_comma && has_dot {
        let last_comma = normalized.rfind(',').unwrap_or(0);
        let last_dot = normalized.rfind('.').unwrap_or(0);
        if last_comma > last_dot {
            if let Some(idx) = normalized.find(',') {
                normalized.truncate(idx);
            }
        } else {
            normalized = normalized.replace(',', "");
        }
    } else if has_comma {
        if normalized.matches(',').count() == 1 {
            if let Some(idx) = normalized.find(',') {
                normalized.truncate(idx);
            }
        }
        normalized = normalized.replace(',', "");
    }

    if !normalized.contains('.') {
        return true;
    }
    let mut groups = normalized.split('.');
    match groups.next() {
        Some(first) if !first.is_empty() => groups.all(|g| g.len() == 3),
        _ => false,
    }
}

/// Leading minus or accounting parentheses.
pub fn is_negative_number_text(text: &str) -> bool {
    let stripped = text.trim();
    stripped.starts_with('-') || (stripped.contains('(') && stripped.contains(')'))
}

/// Whether a (cleaned) cell looks like a truncated currency value: a number
/// with a dangling separator or broken thousands grouping.
pub fn is_suspect_currency_cell(text: &str) -> bool {
    let Some(data) = extract_currency_number(text) else {
        return false;
    };
    let normalized = normalize_number_token(&data.number);
    if normalized.is_empty() {
        return false;
    }
    if has_edge_separator(&normalized) {
        return true;
    }
    !number_grouping_is_valid(&normalized)
}
