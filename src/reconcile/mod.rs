//! Cross-extraction table reconciliation.
//!
//! Given a base document model and an alternate extraction of the same pages
//! (for example an OCR-assisted retry), damaged base cells are replaced by
//! their counterparts in the alternate model. Counterparts are found in two
//! tiers:
//!
//! 1. **Shape**: the first unused alternate table on the same page with the
//!    same `(rows, cols)`; cells are matched by grid key.
//! 2. **Spatial**: for cells still damaged, the alternate cell on the same page
//!    that covers enough of the base cell (and is covered enough by it), scored
//!    as `base_weight * base_cover + alternate_weight * alternate_cover`.
//!
//! Both models are read-only; replacements come back as a [`RepairSet`] for
//! the base model.

use crate::config::{ReconcileConfig, RepairConfig};
use crate::error::Result;
use crate::geometry::{area, intersection_area, BBox};
use crate::model::{DocumentModel, RepairSet, SpanId, Table};
use crate::policy::replacement::ReplacementPolicy;
use indexmap::IndexMap;

type TablesByPage<'a> = IndexMap<u32, Vec<(usize, &'a Table)>>;

fn tables_by_page(doc: &DocumentModel) -> TablesByPage<'_> {
    let mut pages: TablesByPage<'_> = IndexMap::new();
    for (idx, table) in doc.tables() {
        if let Some(page_no) = table.page_no {
            pages.entry(page_no).or_default().push((idx, table));
        }
    }
    pages
}

/// Alternate cells with a usable box, in top-left coordinates, per page.
fn cells_by_page(doc: &DocumentModel) -> IndexMap<u32, Vec<(BBox, &str)>> {
    let mut pages: IndexMap<u32, Vec<(BBox, &str)>> = IndexMap::new();
    for (_, table) in doc.tables() {
        let Some(page_no) = table.page_no else {
            continue;
        };
        for cell in &table.cells {
            let Some(bbox) = cell.bbox.and_then(|b| doc.top_left_bbox(&b, page_no)) else {
                continue;
            };
            pages.entry(page_no).or_default().push((bbox, cell.text.as_str()));
        }
    }
    pages
}

/// Matches damaged base cells against an alternate extraction.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconcileConfig,
    policy: ReplacementPolicy,
}

impl Reconciler {
    /// Build a reconciler from a full configuration.
    pub fn new(config: &RepairConfig) -> Result<Self> {
        Ok(Self {
            config: config.reconcile.clone(),
            policy: ReplacementPolicy::from_config(config)?,
        })
    }

    /// Best spatially overlapping candidate for a base cell box.
    fn best_spatial_match<'a>(&self, bbox: &BBox, candidates: &[(BBox, &'a str)]) -> Option<&'a str> {
        let base_area = area(bbox);
        if base_area <= 0.0 {
            return None;
        }
        let mut best: Option<(f32, &str)> = None;
        for (alt_bbox, text) in candidates {
            if text.is_empty() || self.policy.classifier().is_spaced(text) {
                continue;
            }
            let inter = intersection_area(bbox, alt_bbox);
            let alt_area = area(alt_bbox);
            if inter <= 0.0 || alt_area <= 0.0 {
                continue;
            }
            let base_cover = inter / base_area;
            let alt_cover = inter / alt_area;
            if base_cover < self.config.min_base_coverage
                || alt_cover < self.config.min_alternate_coverage
            {
                continue;
            }
            let score = self.config.base_weight * base_cover + self.config.alternate_weight * alt_cover;
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, *text));
            }
        }
        best.map(|(_, text)| text)
    }

    /// Two-tier matching shared by every merge. `flagged` selects base cells
    /// (by current text) and `accept` gates each candidate. Accepted
    /// replacements are added to `edits`; returns how many.
    fn merge_cells<F, A>(
        &self,
        base: &DocumentModel,
        alternate: &DocumentModel,
        edits: &mut RepairSet,
        flagged: F,
        accept: A,
    ) -> usize
    where
        F: Fn(&str) -> bool,
        A: Fn(&str, &str) -> bool,
    {
        let base_pages = tables_by_page(base);
        let alt_pages = tables_by_page(alternate);
        let mut replaced = 0;

        for (page_no, base_tables) in &base_pages {
            let Some(alt_tables) = alt_pages.get(page_no) else {
                continue;
            };
            let mut used = vec![false; alt_tables.len()];
            for (item, table) in base_tables {
                let Some(pos) = alt_tables
                    .iter()
                    .enumerate()
                    .position(|(i, (_, alt))| !used[i] && alt.shape() == table.shape())
                else {
                    continue;
                };
                used[pos] = true;
                let alt_cells = alt_tables[pos].1.cells_by_key();
                for (cell_idx, cell) in table.cells.iter().enumerate() {
                    let id = SpanId::cell(*item, cell_idx);
                    let current = edits.get(id).unwrap_or(cell.text.as_str()).to_string();
                    if !flagged(&current) {
                        continue;
                    }
                    let Some(candidate) = alt_cells.get(&cell.key()).copied().filter(|t| !t.is_empty())
                    else {
                        continue;
                    };
                    if accept(&current, candidate) {
                        log::debug!("Cell {} matched by shape: {:?} -> {:?}", id, current, candidate);
                        edits.insert(id, candidate);
                        replaced += 1;
                    }
                }
            }
        }

        let alt_cells = cells_by_page(alternate);
        for (page_no, base_tables) in &base_pages {
            let Some(candidates) = alt_cells.get(page_no) else {
                continue;
            };
            for (item, table) in base_tables {
                for (cell_idx, cell) in table.cells.iter().enumerate() {
                    let id = SpanId::cell(*item, cell_idx);
                    let current = edits.get(id).unwrap_or(cell.text.as_str()).to_string();
                    if !flagged(&current) {
                        continue;
                    }
                    let Some(bbox) = cell.bbox.and_then(|b| base.top_left_bbox(&b, *page_no)) else {
                        continue;
                    };
                    let Some(candidate) = self.best_spatial_match(&bbox, candidates) else {
                        continue;
                    };
                    if accept(&current, candidate) {
                        log::debug!("Cell {} matched by overlap: {:?} -> {:?}", id, current, candidate);
                        edits.insert(id, candidate);
                        replaced += 1;
                    }
                }
            }
        }
        replaced
    }

    /// Replace spaced base cells with unspaced alternate counterparts.
    ///
    /// # Returns
    ///
    /// `(edits, replaced, total_spaced)`, where `total_spaced` counts spaced
    /// cells across all base tables. With `ratio_only` nothing is replaced
    /// and only the count is computed.
    pub fn merge_spaced_table_cells(
        &self,
        base: &DocumentModel,
        alternate: &DocumentModel,
        ratio_only: bool,
    ) -> (RepairSet, usize, usize) {
        let classifier = self.policy.classifier();
        let total_spaced = base
            .table_cells()
            .filter(|(_, _, cell)| classifier.is_spaced(&cell.text))
            .count();
        let mut edits = RepairSet::new();
        if ratio_only {
            return (edits, 0, total_spaced);
        }
        let replaced = self.merge_cells(
            base,
            alternate,
            &mut edits,
            |text| classifier.is_spaced(text),
            |original, candidate| {
                !classifier.is_spaced(candidate) && self.policy.should_replace(original, candidate, true)
            },
        );
        log::info!("Replaced {} of {} spaced table cells", replaced, total_spaced);
        (edits, replaced, total_spaced)
    }

    /// Replace suspect numeric base cells using the numeric cell rule.
    pub fn merge_suspect_table_cells(&self, base: &DocumentModel, alternate: &DocumentModel) -> RepairSet {
        let mut edits = RepairSet::new();
        let replaced = self.merge_cells(
            base,
            alternate,
            &mut edits,
            |text| !text.is_empty(),
            |original, candidate| self.policy.should_replace_numeric_cell(original, candidate),
        );
        log::info!("Replaced {} suspect numeric table cells", replaced);
        edits
    }

    /// Spaced-cell merge followed by the numeric merge on the updated text.
    pub fn reconcile(&self, base: &DocumentModel, alternate: &DocumentModel) -> RepairSet {
        let (mut edits, _, _) = self.merge_spaced_table_cells(base, alternate, false);
        let classifier = self.policy.classifier();
        self.merge_cells(
            base,
            alternate,
            &mut edits,
            |text| !text.is_empty(),
            |original, candidate| {
                !classifier.is_spaced(candidate)
                    && self.policy.should_replace_numeric_cell(original, candidate)
            },
        );
        edits
    }
}
