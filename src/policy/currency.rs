//! Currency column alignment.
//!
//! OCR occasionally misreads a currency code in a single row ("EUR" in a
//! column of "RON" values). When a column clearly agrees on one code, the
//! minority cells are rewritten to it; numbers are never touched.

use crate::config::CurrencyConfig;
use crate::error::{Error, Result};
use crate::model::{DocumentModel, RepairSet, SpanId, Table};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;

/// Aligns currency codes within table columns.
#[derive(Debug, Clone)]
pub struct CurrencyAligner {
    config: CurrencyConfig,
    token: Regex,
}

impl CurrencyAligner {
    /// Build an aligner for the configured currency codes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when no codes are configured.
    pub fn new(config: CurrencyConfig) -> Result<Self> {
        if config.codes.is_empty() {
            return Err(Error::Config("currency.codes must not be empty".to_string()));
        }
        let alternatives = config
            .codes
            .iter()
            .map(|code| regex::escape(code))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"\b({alternatives})\b");
        let token = Regex::new(&pattern).map_err(|source| Error::InvalidPattern { pattern, source })?;
        Ok(Self { config, token })
    }

    fn first_code<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.token
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Dominant code per column of one table.
    ///
    /// Header row cells and cells spanning several columns are not sampled.
    /// A code dominates when the column has at least `min_samples` coded cells
    /// and the code's share reaches `dominance`.
    pub fn dominant_codes(&self, table: &Table) -> HashMap<usize, String> {
        let mut counts: HashMap<usize, IndexMap<&str, usize>> = HashMap::new();
        for cell in &table.cells {
            if cell.row_start == 0 || !cell.is_single_column() {
                continue;
            }
            if let Some(code) = self.first_code(&cell.text) {
                *counts.entry(cell.col_start).or_default().entry(code).or_insert(0) += 1;
            }
        }

        let mut dominant = HashMap::new();
        for (col, counter) in counts {
            let total: usize = counter.values().sum();
            // First-seen code wins ties
            let Some((code, freq)) = counter
                .iter()
                .fold(None, |best: Option<(&str, usize)>, (code, &freq)| match best {
                    Some((_, best_freq)) if best_freq >= freq => best,
                    _ => Some((code, freq)),
                })
            else {
                continue;
            };
            if total >= self.config.min_samples
                && freq as f32 / total as f32 >= self.config.dominance
            {
                dominant.insert(col, code.to_string());
            }
        }
        dominant
    }

    /// Rewrite minority currency codes of one table.
    pub fn align_table(&self, item: usize, table: &Table) -> RepairSet {
        let dominant = self.dominant_codes(table);
        let mut edits = RepairSet::new();
        if dominant.is_empty() {
            return edits;
        }
        for (idx, cell) in table.cells.iter().enumerate() {
            if cell.row_start == 0 || !cell.is_single_column() {
                continue;
            }
            let Some(desired) = dominant.get(&cell.col_start) else {
                continue;
            };
            match self.first_code(&cell.text) {
                Some(code) if code != desired => {
                    let updated = self.token.replace_all(&cell.text, desired.as_str());
                    if updated != cell.text {
                        log::debug!(
                            "Currency aligned in cell {}: {:?} -> {:?}",
                            SpanId::cell(item, idx),
                            cell.text,
                            updated
                        );
                        edits.insert(SpanId::cell(item, idx), updated.into_owned());
                    }
                },
                _ => {},
            }
        }
        edits
    }

    /// Align currency codes across every table of a document.
    pub fn align_document(&self, doc: &DocumentModel) -> RepairSet {
        let mut edits = RepairSet::new();
        for (item, table) in doc.tables() {
            edits.merge(self.align_table(item, table));
        }
        log::info!("Aligned currency codes in {} cells", edits.len());
        edits
    }
}

impl Default for CurrencyAligner {
    fn default() -> Self {
        Self {
            config: CurrencyConfig::default(),
            token: crate::text::numeric::CURRENCY_TOKEN.clone(),
        }
    }
}

/// Align currency codes across a document with default settings.
pub fn normalize_document_table_currencies(doc: &DocumentModel) -> RepairSet {
    CurrencyAligner::default().align_document(doc)
}
