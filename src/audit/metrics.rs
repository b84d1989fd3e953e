//! Fidelity metrics comparing a document model with a rendered text.
//!
//! The document side is the model's plain-text export; the other side is any
//! rendering of it (usually Markdown). Coverage is measured on word tokens,
//! normalized numbers and date tokens, and the model's tables and text items
//! are scanned for spacing damage.

use crate::model::{DocItem, DocumentModel, Table};
use crate::text::{is_collapsed, is_multi_space, is_spaced, needs_fix};
use crate::utils::safe_float_cmp;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Page separator emitted by the Markdown exporter.
pub const PAGE_BREAK: &str = "<!-- page break -->";

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\w+").unwrap();
    static ref NUMBER: Regex =
        Regex::new(r"^[+-]?(?:\d{1,3}(?:[ .]\d{3})+|\d+)(?:[.,]\d+)?%?").unwrap();
    static ref DATE: Regex = Regex::new(r"\b\d{1,2}[./-]\d{1,2}[./-]\d{2,4}\b").unwrap();
}

/// Document-wide fidelity and spacing statistics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuditMetrics {
    /// Share of document word tokens present in the rendered text
    pub token_coverage: f32,
    /// Share of distinct document numbers present in the rendered text
    pub numeric_recall: f32,
    /// Share of distinct document dates present in the rendered text
    pub date_recall: f32,
    /// Tables in the model, table-of-contents grids excluded
    pub table_count_doc: usize,
    /// Tables in the rendered Markdown
    pub table_count_md: usize,
    /// Grid cells (rows × columns) over the counted tables
    pub table_cells_doc: usize,
    /// Title and section-heading items in the model
    pub heading_count_doc: usize,
    /// Heading lines in the rendered Markdown
    pub heading_count_md: usize,
    /// Characters in the model's text export
    pub doc_text_length: usize,
    /// Characters in the rendered text
    pub md_text_length: usize,
    /// Table cells flagged as spaced
    pub spaced_table_cells: usize,
    /// Table cells inspected
    pub total_table_cells: usize,
    /// Text items with spacing damage beyond benign multi-space runs
    pub spaced_text_items: usize,
    /// Text items containing multi-space runs
    pub multi_space_text_items: usize,
    /// Non-empty text items inspected
    pub total_text_items: usize,
}

impl AuditMetrics {
    /// Share of inspected table cells flagged as spaced.
    pub fn spaced_cell_ratio(&self) -> f32 {
        if self.total_table_cells == 0 {
            return 0.0;
        }
        self.spaced_table_cells as f32 / self.total_table_cells as f32
    }
}

impl fmt::Display for AuditMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "token_coverage={:.2}%, numeric_recall={:.2}%, date_recall={:.2}%, ",
            self.token_coverage * 100.0,
            self.numeric_recall * 100.0,
            self.date_recall * 100.0
        )?;
        write!(
            f,
            "tables_doc={}, tables_md={}, table_cells_doc={}, headings_doc={}, headings_md={}, ",
            self.table_count_doc,
            self.table_count_md,
            self.table_cells_doc,
            self.heading_count_doc,
            self.heading_count_md
        )?;
        write!(
            f,
            "doc_text_len={}, md_text_len={}, spaced_cells={}/{}, ",
            self.doc_text_length, self.md_text_length, self.spaced_table_cells, self.total_table_cells
        )?;
        write!(
            f,
            "spacing_issue_text_items={}/{}, multi_space_text_items={}/{}",
            self.spaced_text_items,
            self.total_text_items,
            self.multi_space_text_items,
            self.total_text_items
        )
    }
}

/// Coverage statistics for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageAudit {
    /// Page number in the model
    pub page_no: u32,
    /// Share of page word tokens present in the page's rendered text
    pub token_coverage: f32,
    /// Share of distinct page numbers present in the rendered text
    pub numeric_recall: f32,
    /// Share of distinct page dates present in the rendered text
    pub date_recall: f32,
    /// Characters in the page's text export
    pub doc_text_length: usize,
    /// Characters in the page's rendered text
    pub md_text_length: usize,
}

impl fmt::Display for PageAudit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page {}: token_coverage={:.2}%, numeric_recall={:.2}%, date_recall={:.2}%, doc_text_len={}, md_text_len={}",
            self.page_no,
            self.token_coverage * 100.0,
            self.numeric_recall * 100.0,
            self.date_recall * 100.0,
            self.doc_text_length,
            self.md_text_length
        )
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Case-folded word tokens with surrounding underscores trimmed.
pub fn tokenize(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase().trim_matches('_').to_string())
        .collect()
}

/// Normalize a number token across separator conventions.
///
/// With both separators present the later one is the decimal mark; a lone
/// comma is a decimal mark; spaces are dropped. A trailing `%` is kept.
///
/// # Examples
///
/// ```
/// use pdf_spacefix::audit::metrics::normalize_number;
///
/// assert_eq!(normalize_number("1.234,50"), "1234.50");
/// assert_eq!(normalize_number("1,234.50"), "1234.50");
/// assert_eq!(normalize_number("12,5%"), "12.5%");
/// assert_eq!(normalize_number("1 234"), "1234");
/// ```
pub fn normalize_number(token: &str) -> String {
    let token = token.trim();
    let percent = if token.ends_with('%') { "%" } else { "" };
    let token = token.trim_end_matches('%');

    let normalized = match (token.rfind(','), token.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => token.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => token.replace(',', ""),
        _ => {
            let single_comma = token.matches(',').count() == 1 && !token.contains('.');
            let token = if single_comma {
                token.replace(',', ".")
            } else {
                token.to_string()
            };
            token.replace(' ', "")
        },
    };
    format!("{}{}", normalized, percent)
}

/// Distinct normalized numbers of a text.
///
/// A number never starts right after a word character, so digits glued to
/// letters ("T2", "abc123") are not counted.
pub fn extract_numbers(text: &str) -> HashSet<String> {
    let mut numbers = HashSet::new();
    let mut prev: Option<char> = None;
    let mut idx = 0;
    while idx < text.len() {
        let Some(ch) = text[idx..].chars().next() else {
            break;
        };
        if !prev.is_some_and(is_word_char) {
            if let Some(m) = NUMBER.find(&text[idx..]) {
                numbers.insert(normalize_number(m.as_str()));
                prev = m.as_str().chars().next_back();
                idx += m.end();
                continue;
            }
        }
        prev = Some(ch);
        idx += ch.len_utf8();
    }
    numbers
}

/// Distinct date tokens (`dd.mm.yyyy` and friends) of a text.
pub fn extract_dates(text: &str) -> HashSet<String> {
    DATE.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Share of `reference` items found in `candidate`; 1.0 for an empty
/// reference.
pub fn coverage<'a, I>(reference: I, candidate: &HashSet<String>) -> f32
where
    I: IntoIterator<Item = &'a String>,
{
    let mut total = 0usize;
    let mut matched = 0usize;
    for item in reference {
        total += 1;
        if candidate.contains(item) {
            matched += 1;
        }
    }
    if total == 0 {
        return 1.0;
    }
    matched as f32 / total as f32
}

/// Markdown tables: a `|---` separator line directly under a pipe line.
pub fn markdown_table_count(markdown: &str) -> usize {
    let lines: Vec<&str> = markdown.lines().collect();
    lines
        .windows(2)
        .filter(|pair| {
            let line = pair[1].trim();
            pair[0].contains('|') && line.starts_with('|') && line.contains("---")
        })
        .count()
}

/// Markdown heading lines.
pub fn markdown_heading_count(markdown: &str) -> usize {
    markdown
        .lines()
        .filter(|line| line.trim_start().starts_with('#'))
        .count()
}

/// Whether a table looks like a table of contents: two columns, at least six
/// rows, mostly letters, and mostly small page numbers.
pub fn is_toc_like_table(table: &Table) -> bool {
    if table.num_cols != 2 || table.num_rows < 6 {
        return false;
    }
    let texts: Vec<&str> = table
        .cells
        .iter()
        .map(|c| c.text.as_str())
        .filter(|t| !t.is_empty())
        .collect();
    if texts.is_empty() {
        return false;
    }

    let digits = texts.iter().flat_map(|t| t.chars()).filter(|c| c.is_numeric()).count();
    let letters = texts.iter().flat_map(|t| t.chars()).filter(|c| c.is_alphabetic()).count();
    let digit_ratio = digits as f32 / (digits + letters).max(1) as f32;
    if digit_ratio > 0.25 {
        return false;
    }

    let numbers = extract_numbers(&texts.join(" "));
    if numbers.is_empty() {
        return false;
    }
    let small = numbers
        .iter()
        .filter(|n| n.chars().filter(|c| c.is_ascii_digit()).count() <= 3)
        .count();
    small as f32 / numbers.len() as f32 >= 0.7
}

/// Share of all table cells the classifier flags as spaced.
pub fn spaced_cell_ratio(doc: &DocumentModel) -> f32 {
    let mut total = 0usize;
    let mut spaced = 0usize;
    for (_, _, cell) in doc.table_cells() {
        total += 1;
        if is_spaced(&cell.text) {
            spaced += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    spaced as f32 / total as f32
}

/// Whether a text item has spacing damage that is not just multi-space runs.
fn has_spacing_issue(text: &str) -> bool {
    needs_fix(text) && !(is_multi_space(text) && !is_spaced(text) && !is_collapsed(text))
}

/// Compare a document model with its rendered Markdown.
///
/// # Arguments
///
/// * `doc` - The positioned document model
/// * `markdown` - The rendered text to audit
///
/// # Returns
///
/// Coverage and spacing statistics. Table-of-contents grids are left out of
/// both the table counts and the spaced-cell counts.
pub fn audit_document(doc: &DocumentModel, markdown: &str) -> AuditMetrics {
    let doc_text = doc.export_text();
    let doc_tokens = tokenize(&doc_text);
    let md_tokens: HashSet<String> = tokenize(markdown).into_iter().collect();

    let mut metrics = AuditMetrics {
        token_coverage: coverage(&doc_tokens, &md_tokens),
        numeric_recall: coverage(&extract_numbers(&doc_text), &extract_numbers(markdown)),
        date_recall: coverage(&extract_dates(&doc_text), &extract_dates(markdown)),
        table_count_md: markdown_table_count(markdown),
        heading_count_md: markdown_heading_count(markdown),
        doc_text_length: doc_text.chars().count(),
        md_text_length: markdown.chars().count(),
        ..AuditMetrics::default()
    };

    for item in &doc.items {
        match item {
            DocItem::Table(table) => {
                if is_toc_like_table(table) {
                    continue;
                }
                metrics.table_count_doc += 1;
                metrics.table_cells_doc += table.num_rows * table.num_cols;
                for cell in &table.cells {
                    metrics.total_table_cells += 1;
                    if is_spaced(&cell.text) {
                        metrics.spaced_table_cells += 1;
                    }
                }
            },
            DocItem::Text(text) => {
                if text.label.is_heading() {
                    metrics.heading_count_doc += 1;
                }
                if text.text.is_empty() {
                    continue;
                }
                metrics.total_text_items += 1;
                if is_multi_space(&text.text) {
                    metrics.multi_space_text_items += 1;
                }
                if has_spacing_issue(&text.text) {
                    metrics.spaced_text_items += 1;
                }
            },
            DocItem::Picture(_) => {},
        }
    }

    log::debug!("Audit: {}", metrics);
    metrics
}

/// Split rendered Markdown into trimmed, non-empty page chunks.
///
/// Text without the placeholder is returned whole as a single page.
pub fn split_pages<'a>(markdown: &'a str, placeholder: &str) -> Vec<&'a str> {
    if !markdown.contains(placeholder) {
        return vec![markdown];
    }
    markdown
        .split(placeholder)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Per-page coverage, pairing the model's pages in order with the Markdown
/// page chunks. Pages without a chunk are audited against empty text.
pub fn audit_per_page(doc: &DocumentModel, markdown: &str) -> Vec<PageAudit> {
    let md_pages = split_pages(markdown, PAGE_BREAK);
    doc.pages
        .keys()
        .enumerate()
        .map(|(idx, &page_no)| {
            let page_doc = doc.filter_pages(&BTreeSet::from([page_no]));
            let doc_text = page_doc.export_text();
            let md_text = md_pages.get(idx).copied().unwrap_or("");
            let md_tokens: HashSet<String> = tokenize(md_text).into_iter().collect();
            PageAudit {
                page_no,
                token_coverage: coverage(&tokenize(&doc_text), &md_tokens),
                numeric_recall: coverage(&extract_numbers(&doc_text), &extract_numbers(md_text)),
                date_recall: coverage(&extract_dates(&doc_text), &extract_dates(md_text)),
                doc_text_length: doc_text.chars().count(),
                md_text_length: md_text.chars().count(),
            }
        })
        .collect()
}

/// The `n` lowest-fidelity pages, by token coverage then numeric recall.
pub fn worst_pages(audits: &[PageAudit], n: usize) -> Vec<&PageAudit> {
    let mut ranked: Vec<&PageAudit> = audits.iter().collect();
    ranked.sort_by(|a, b| {
        safe_float_cmp(a.token_coverage, b.token_coverage)
            .then_with(|| safe_float_cmp(a.numeric_recall, b.numeric_recall))
    });
    ranked.truncate(n);
    ranked
}
