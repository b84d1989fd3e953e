//! Numeric, currency and header cleanup for table cells.
//!
//! These passes fix artifacts that survive spacing repair: duplicated
//! percentages and thousands groups, currency codes split from or repeated
//! around their value, a garbled `RON`, glued or repeated dates, and
//! duplicated header labels. Every function is pure; the document-level
//! helpers return a [`RepairSet`] and never touch the model.

use crate::model::{DocumentModel, RepairSet};
use crate::text::normalize::{normalize_ligatures, normalize_mojibake};
use crate::text::numeric::{
    compact_number_spacing, digits_only, is_numericish, is_suspect_currency_cell,
    remove_spaces_between,
};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Thousands-grouped value with an optional decimal tail.
const GROUPED_VALUE: &str = r"\d{1,3}(?:\.\d{3})+(?:[.,]\d+)?";

lazy_static! {
    static ref DELTA_PERCENT: Regex = Regex::new(r"^(?:ƒ\^\+%|∆\s*%|Δ\s*%)$").unwrap();
    static ref DUP_PERCENT: Regex =
        Regex::new(r"\b(\d+(?:[.,]\d+)?)\s*%\s+(\d+(?:[.,]\d+)?)\s*%").unwrap();
    static ref SPACED_PERCENT: Regex = Regex::new(r"\b(\d+(?:[.,]\d+)?)\s*%").unwrap();
    static ref DUP_GROUP: Regex = Regex::new(r"\b(\d{1,3})\s+(\d{1,3})((?:\.\d{3})+)\b").unwrap();
    static ref LEADING_GROUP: Regex = Regex::new(r"\b(\d{1,2})\s+(\d{3}(?:\.\d{3})+)\b").unwrap();

    static ref DATE: Regex = Regex::new(r"\d{1,2}[./-]\d{1,2}[./-]\d{2,4}").unwrap();
    static ref DATE_FUZZY_AT_START: Regex = Regex::new(r"^\d{1,3}[./-]\d{1,2}[./-]\d{2,4}").unwrap();
    static ref DATE_SEP: Regex = Regex::new(r"[./-]").unwrap();
    static ref DATE_CHARS_ONLY: Regex = Regex::new(r"^[\d\s./-]+$").unwrap();

    static ref CURRENCY_SUFFIX: Regex =
        Regex::new(&format!(r"^({GROUPED_VALUE})\s+(RON|EUR)$")).unwrap();
    static ref CURRENCY_MISSING_R: Regex =
        Regex::new(&format!(r"^({GROUPED_VALUE})\s+ON$")).unwrap();
    static ref RO_TOKEN: Regex = Regex::new(r"\bRO\b").unwrap();
    static ref CURRENCY_TRAILING_SHORT: Regex =
        Regex::new(r"^(\d{1,3}(?:\.\d{3})+)\s+(RON|EUR)\s+(\d{1,2})$").unwrap();
    static ref CURRENCY_PREFIX_DUP: Regex =
        Regex::new(r"^(\d{1,3}(?:[.,]\d{1,3})?[.,]?)\s+(RON|EUR)\s+(\d{1,3}(?:\.\d{3})+)$").unwrap();

    static ref REPEAT_PREFIX: Regex = Regex::new(&format!(
        r"^(RON|EUR)\s+({GROUPED_VALUE})\s+(RON|EUR)\s+({GROUPED_VALUE})$"
    ))
    .unwrap();
    static ref REPEAT_SUFFIX: Regex = Regex::new(&format!(
        r"^({GROUPED_VALUE})\s+(RON|EUR)\s+({GROUPED_VALUE})\s+(RON|EUR)$"
    ))
    .unwrap();
    static ref EXTRA_PREFIX: Regex = Regex::new(&format!(
        r"^(\d{{1,3}})\s+(RON|EUR)\s+({GROUPED_VALUE})\s+(RON|EUR)$"
    ))
    .unwrap();
    static ref ON_MIDDLE: Regex = Regex::new(&format!(
        r"^(\d{{1,3}}(?:[.,]\d+)?)\s+ON\s+({GROUPED_VALUE})\s+(RON|EUR)$"
    ))
    .unwrap();
    static ref PREFIX_ONLY: Regex =
        Regex::new(&format!(r"^(\d{{1,2}})\s+(RON|EUR)\s+({GROUPED_VALUE})$")).unwrap();
}

const DELTA_PERCENT_LABEL: &str = "Δ%";

fn group<'t>(caps: &Captures<'t>, idx: usize) -> &'t str {
    caps.get(idx).map_or("", |m| m.as_str())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Drop the spaces between a free-standing minus sign and its digits.
fn join_negative_sign(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        if c != '-' {
            continue;
        }
        let free_standing = i < 2 || !is_word_char(chars[i - 2]);
        let mut j = i;
        while j < chars.len() && chars[j].is_whitespace() {
            j += 1;
        }
        if free_standing && j > i && chars.get(j).is_some_and(|c| c.is_ascii_digit()) {
            i = j;
        }
    }
    out
}

/// Left-to-right replacement where `rewrite` may decline a match.
///
/// A declined match does not consume its text: the search resumes one
/// character after its start, so a repeat overlapping it ("1 % 2 % 2 %")
/// is still found.
fn replace_matching<F>(re: &Regex, text: &str, mut rewrite: F) -> String
where
    F: FnMut(&Captures<'_>) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;
    while pos <= text.len() {
        let Some(caps) = re.captures_at(text, pos) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        let step = text[whole.start()..].chars().next().map_or(1, char::len_utf8);
        match rewrite(&caps) {
            Some(replacement) => {
                out.push_str(&text[copied..whole.start()]);
                out.push_str(&replacement);
                copied = whole.end();
                pos = whole.end().max(whole.start() + step);
            },
            None => pos = whole.start() + step,
        }
    }
    out.push_str(&text[copied..]);
    out
}

fn dedupe_percent(text: &str) -> String {
    let text = replace_matching(&DUP_PERCENT, text, |caps| {
        (group(caps, 1) == group(caps, 2)).then(|| format!("{}%", group(caps, 1)))
    });
    SPACED_PERCENT.replace_all(&text, "${1}%").into_owned()
}

fn merge_number_groups(text: &str) -> String {
    let text = replace_matching(&DUP_GROUP, text, |caps| {
        (group(caps, 1) == group(caps, 2)).then(|| format!("{}{}", group(caps, 1), group(caps, 3)))
    });
    LEADING_GROUP
        .replace_all(&text, |caps: &Captures<'_>| {
            let (lead, tail) = (group(caps, 1), group(caps, 2));
            if tail.matches('.').count() >= 2 {
                tail.to_string()
            } else {
                format!("{lead}.{tail}")
            }
        })
        .into_owned()
}

fn tighten_parentheses(text: &str) -> String {
    let is_digit = |c: char| c.is_ascii_digit();
    let text = remove_spaces_between(text, |c| c == '(', is_digit);
    remove_spaces_between(&text, is_digit, |c| c == ')')
}

fn currency_suffix_to_prefix(text: &str) -> String {
    match CURRENCY_SUFFIX.captures(text) {
        Some(caps) => format!("{} {}", group(&caps, 2), group(&caps, 1)),
        None => text.to_string(),
    }
}

fn fix_missing_currency_letter(text: &str) -> String {
    if let Some(caps) = CURRENCY_MISSING_R.captures(text) {
        return format!("RON {}", group(&caps, 1));
    }
    if is_numericish(text) && RO_TOKEN.is_match(text) && !text.contains("RON") {
        return RO_TOKEN.replace_all(text, "RON").into_owned();
    }
    text.to_string()
}

fn strip_trailing_short_token(text: &str) -> String {
    match CURRENCY_TRAILING_SHORT.captures(text) {
        Some(caps) => format!("{} {}", group(&caps, 2), group(&caps, 1)),
        None => text.to_string(),
    }
}

fn year_len(date: &str) -> usize {
    DATE_SEP.split(date).last().map_or(0, str::len)
}

fn day_len(date: &str) -> usize {
    DATE_SEP.split(date).next().map_or(0, str::len)
}

/// Keep one date when a numeric cell holds several: the longest year wins,
/// then the longest token.
fn dedupe_dates_in_cell(text: &str) -> String {
    let dates: Vec<&str> = DATE.find_iter(text).map(|m| m.as_str()).collect();
    if dates.len() < 2 || text.chars().any(char::is_alphabetic) {
        return text.to_string();
    }
    dates
        .into_iter()
        .max_by(|a, b| (year_len(a), a.len(), *a).cmp(&(year_len(b), b.len(), *b)))
        .map_or_else(|| text.to_string(), str::to_string)
}

fn strip_trailing_currency_fragment(text: &str) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 3 {
        return text.to_string();
    }
    let last = tokens[tokens.len() - 1];
    if !matches!(last, "R" | "E" | "N" | "ON") {
        return text.to_string();
    }
    let has_currency = if last == "ON" {
        tokens.contains(&"RON")
    } else {
        tokens.contains(&"RON") || tokens.contains(&"EUR")
    };
    if !has_currency || digits_only(tokens[tokens.len() - 2]).is_empty() {
        return text.to_string();
    }
    tokens[..tokens.len() - 1].join(" ")
}

fn strip_currency_prefix_dup(text: &str) -> String {
    let Some(caps) = CURRENCY_PREFIX_DUP.captures(text) else {
        return text.to_string();
    };
    let prefix = digits_only(group(&caps, 1));
    let value = digits_only(group(&caps, 3));
    if !prefix.is_empty() && value.starts_with(&prefix) {
        format!("{} {}", group(&caps, 2), group(&caps, 3))
    } else {
        text.to_string()
    }
}

fn strip_duplicate_currency_suffix(text: &str) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 3 || !matches!(tokens[0], "RON" | "EUR") {
        return text.to_string();
    }
    if tokens[tokens.len() - 1] != tokens[0] || !tokens[1].chars().any(|c| c.is_ascii_digit()) {
        return text.to_string();
    }
    tokens[..tokens.len() - 1].join(" ")
}

fn dedupe_repeated_currency_value(text: &str) -> String {
    if let Some(caps) = REPEAT_PREFIX.captures(text) {
        if group(&caps, 1) == group(&caps, 3) && group(&caps, 2) == group(&caps, 4) {
            return format!("{} {}", group(&caps, 1), group(&caps, 2));
        }
    }
    if let Some(caps) = REPEAT_SUFFIX.captures(text) {
        if group(&caps, 1) == group(&caps, 3) && group(&caps, 2) == group(&caps, 4) {
            return format!("{} {}", group(&caps, 2), group(&caps, 1));
        }
    }
    if let Some(caps) = EXTRA_PREFIX.captures(text) {
        if group(&caps, 2) == group(&caps, 4) {
            return format!("{} {}", group(&caps, 2), group(&caps, 3));
        }
    }
    if let Some(caps) = ON_MIDDLE.captures(text) {
        let prefix = digits_only(group(&caps, 1));
        let value = digits_only(group(&caps, 2));
        if !prefix.is_empty() && value.starts_with(&prefix) {
            return format!("{} {}", group(&caps, 3), group(&caps, 2));
        }
    }
    if let Some(caps) = PREFIX_ONLY.captures(text) {
        let prefix = digits_only(group(&caps, 1));
        let value = digits_only(group(&caps, 3));
        if !prefix.is_empty() && !value.starts_with(&prefix) {
            return format!("{} {}", group(&caps, 2), group(&caps, 3));
        }
    }
    text.to_string()
}

/// Clean a table cell's text.
///
/// Normalizes encoding damage and ligatures, then applies the numeric and
/// currency fixes in a fixed order. Text without any of the handled
/// artifacts comes back trimmed but otherwise unchanged.
///
/// # Examples
///
/// ```
/// use pdf_spacefix::policy::cell_cleanup::clean_table_cell_text;
///
/// assert_eq!(clean_table_cell_text("84 % 84 %"), "84%");
/// assert_eq!(clean_table_cell_text("168.506.901 ON"), "RON 168.506.901");
/// assert_eq!(clean_table_cell_text("- 45,40%"), "-45,40%");
/// ```
pub fn clean_table_cell_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let cleaned = normalize_ligatures(&normalize_mojibake(text));
    let cleaned = cleaned.trim();
    if DELTA_PERCENT.is_match(cleaned) {
        return DELTA_PERCENT_LABEL.to_string();
    }

    let cleaned = dedupe_percent(cleaned);
    let cleaned = join_negative_sign(&cleaned);
    let cleaned = merge_number_groups(&cleaned);
    let mut cleaned = collapse_whitespace(&cleaned);
    if cleaned.chars().any(|c| c.is_ascii_digit()) {
        cleaned = cleaned.trim_matches(['[', ']']).to_string();
    }
    let mut cleaned = compact_number_spacing(&cleaned);
    if is_numericish(&cleaned) {
        cleaned = tighten_parentheses(&cleaned);
    }

    let cleaned = currency_suffix_to_prefix(&cleaned);
    let cleaned = fix_missing_currency_letter(&cleaned);
    let cleaned = strip_trailing_short_token(&cleaned);
    let cleaned = dedupe_dates_in_cell(&cleaned);
    let cleaned = strip_trailing_currency_fragment(&cleaned);
    let cleaned = strip_currency_prefix_dup(&cleaned);
    let cleaned = strip_duplicate_currency_suffix(&cleaned);
    dedupe_repeated_currency_value(&cleaned)
}

/// Pick one date among candidates `(start, text)`: prefer a four-digit
/// year, then a two-digit day, then the last occurrence.
fn choose_date_match<'t>(candidates: &[(usize, &'t str)]) -> Option<&'t str> {
    let mut pool: Vec<(usize, &str)> = candidates.to_vec();
    if pool.iter().any(|(_, d)| year_len(d) == 4) {
        pool.retain(|(_, d)| year_len(d) == 4);
    }
    if pool.iter().any(|(_, d)| day_len(d) == 2) {
        pool.retain(|(_, d)| day_len(d) == 2);
    }
    pool.into_iter().max_by_key(|(start, _)| *start).map(|(_, d)| d)
}

/// Every fuzzy date match, including overlapping ones.
fn overlapping_fuzzy_dates(text: &str) -> Vec<(usize, &str)> {
    text.char_indices()
        .filter_map(|(idx, _)| {
            DATE_FUZZY_AT_START
                .find(&text[idx..])
                .map(|m| (idx, m.as_str()))
        })
        .collect()
}

/// Trim day and month of a glued date to their last two digits.
fn repair_fuzzy_date(date: &str) -> String {
    let Some(sep) = DATE_SEP.find(date) else {
        return date.to_string();
    };
    let parts: Vec<&str> = DATE_SEP.split(date).collect();
    if parts.len() != 3 {
        return date.to_string();
    }
    let last_two = |part: &str| -> String {
        let chars: Vec<char> = part.chars().collect();
        chars[chars.len().saturating_sub(2)..].iter().collect()
    };
    [last_two(parts[0]), last_two(parts[1]), parts[2].to_string()].join(sep.as_str())
}

/// Clean a header (row 0) cell: whitespace, Δ% labels, duplicated or glued
/// dates, and labels repeated twice.
///
/// # Examples
///
/// ```
/// use pdf_spacefix::policy::cell_cleanup::clean_header_text;
///
/// assert_eq!(clean_header_text("Indicatori Indicatori"), "Indicatori");
/// assert_eq!(clean_header_text("3130/09/2025"), "30/09/2025");
/// ```
pub fn clean_header_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let normalized = collapse_whitespace(&normalize_ligatures(&normalize_mojibake(text)));
    if DELTA_PERCENT.is_match(&normalized) {
        return DELTA_PERCENT_LABEL.to_string();
    }

    let date_only = DATE_CHARS_ONLY.is_match(&normalized);
    let matches: Vec<(usize, &str)> = DATE
        .find_iter(&normalized)
        .map(|m| (m.start(), m.as_str()))
        .collect();
    let mut chosen_year_len = 0;
    if let Some(chosen) = choose_date_match(&matches) {
        chosen_year_len = year_len(chosen);
        let has_full_year = matches.iter().any(|(_, d)| year_len(d) == 4);
        if matches.len() > 1 && (has_full_year || chosen_year_len == 4) {
            return chosen.to_string();
        }
        if normalized != chosen && date_only && chosen_year_len == 4 {
            return chosen.to_string();
        }
    }

    let separators = normalized.chars().filter(|c| matches!(c, '/' | '.' | '-')).count();
    if chosen_year_len < 4 && separators > 2 {
        let fuzzy = overlapping_fuzzy_dates(&normalized);
        if let Some(chosen) = choose_date_match(&fuzzy) {
            let repaired = repair_fuzzy_date(chosen);
            if normalized != repaired && date_only {
                return repaired;
            }
        }
    }

    let words: Vec<&str> = normalized.split_whitespace().collect();
    if !words.is_empty() && words.len() % 2 == 0 {
        let (first, second) = words.split_at(words.len() / 2);
        if first == second {
            return first.join(" ");
        }
    }
    normalized
}

/// Header cleanup for every row-0 cell of every table.
pub fn normalize_document_table_headers(doc: &DocumentModel) -> RepairSet {
    let mut edits = RepairSet::new();
    for (id, _table, cell) in doc.table_cells() {
        if cell.row_start != 0 {
            continue;
        }
        let cleaned = clean_header_text(&cell.text);
        if cleaned != cell.text {
            edits.insert(id, cleaned);
        }
    }
    log::info!("Normalized {} table header cells", edits.len());
    edits
}

/// Cell cleanup for every table cell.
pub fn clean_document_table_cells(doc: &DocumentModel) -> RepairSet {
    let mut edits = RepairSet::new();
    for (id, _table, cell) in doc.table_cells() {
        let cleaned = clean_table_cell_text(&cell.text);
        if cleaned != cell.text {
            log::trace!("Cell {} cleaned: {:?} -> {:?}", id, cell.text, cleaned);
            edits.insert(id, cleaned);
        }
    }
    log::info!("Cleaned {} table cells", edits.len());
    edits
}

/// Number of cells that still look like truncated currency values after
/// cleanup.
pub fn count_suspect_table_cells(doc: &DocumentModel) -> usize {
    doc.table_cells()
        .filter(|(_, _, cell)| !cell.text.is_empty())
        .filter(|(_, _, cell)| is_suspect_currency_cell(&clean_table_cell_text(&cell.text)))
        .count()
}
