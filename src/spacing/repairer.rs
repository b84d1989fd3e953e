//! Glyph-backed spacing repair for table cells and text items.
//!
//! For every span the classifier flags, the glyphs under the span's padded
//! bounding box are re-read from a [`GlyphSource`] and the text is rebuilt,
//! first from word samples and then from character samples. A candidate is
//! kept only when the [`ReplacementPolicy`] accepts it. Words that look
//! clipped at the right edge are retried with a wider clip.
//!
//! Failures of the glyph source are logged and skip the affected span only.

use crate::config::{RepairConfig, ReconstructionConfig};
use crate::error::Result;
use crate::geometry::BBox;
use crate::model::{DocItem, DocumentModel, RepairSet, SpanId};
use crate::policy::replacement::{needs_suffix_completion, ReplacementPolicy};
use crate::spacing::glyph_source::{GlyphSource, PageGlyphCache};
use crate::spacing::reconstruct::LineReconstructor;
use crate::text::numeric::compact_numeric_spacing;
use std::collections::BTreeSet;

/// Counts reported by one repair pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpacingFixReport {
    /// Table cells whose text was replaced
    pub table_cells: usize,
    /// Text items whose text was replaced
    pub text_items: usize,
    /// Size of the page filter, zero when every page was eligible
    pub pages_processed: usize,
}

impl SpacingFixReport {
    /// Total number of replaced spans.
    pub fn total(&self) -> usize {
        self.table_cells + self.text_items
    }
}

/// Rebuilds damaged spans from glyph positions.
#[derive(Debug, Clone, Default)]
pub struct SpacingRepairer {
    config: ReconstructionConfig,
    reconstructor: LineReconstructor,
    policy: ReplacementPolicy,
}

impl SpacingRepairer {
    /// Build a repairer from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a lexicon pattern does not compile.
    pub fn new(config: &RepairConfig) -> Result<Self> {
        Ok(Self {
            config: config.reconstruction.clone(),
            reconstructor: LineReconstructor::new(config.reconstruction.clone(), config.gap.clone()),
            policy: ReplacementPolicy::from_config(config)?,
        })
    }

    /// Policy used to accept candidates.
    pub fn policy(&self) -> &ReplacementPolicy {
        &self.policy
    }

    /// Repair every flagged span of `doc`.
    ///
    /// # Arguments
    ///
    /// * `doc` - Model to read; it is not modified
    /// * `source` - Glyph backend for the document's pages
    /// * `pages` - Optional page filter; an empty filter repairs nothing
    ///
    /// # Returns
    ///
    /// The accepted replacements and a summary report.
    pub fn repair<S: GlyphSource + ?Sized>(
        &self,
        doc: &DocumentModel,
        source: &S,
        pages: Option<&BTreeSet<u32>>,
    ) -> (RepairSet, SpacingFixReport) {
        let mut edits = RepairSet::new();
        let mut report = SpacingFixReport::default();
        if pages.is_some_and(|p| p.is_empty()) {
            return (edits, report);
        }
        let cache = PageGlyphCache::new(source, self.config.min_clip_overlap);
        let page_selected =
            |page_no: u32| pages.map_or(true, |selected| selected.contains(&page_no));

        for (idx, item) in doc.items.iter().enumerate() {
            match item {
                DocItem::Table(table) => {
                    let Some(page_no) = table.page_no.filter(|p| page_selected(*p)) else {
                        continue;
                    };
                    for (cell_idx, cell) in table.cells.iter().enumerate() {
                        let Some(bbox) = cell.bbox else {
                            continue;
                        };
                        if !self.policy.needs_table_cell_repair(&cell.text) {
                            continue;
                        }
                        if let Some(text) = self.repair_cell(&cache, page_no, &bbox, &cell.text) {
                            log::debug!(
                                "Cell {} on page {}: {:?} -> {:?}",
                                SpanId::cell(idx, cell_idx),
                                page_no,
                                cell.text,
                                text
                            );
                            edits.insert(SpanId::cell(idx, cell_idx), text);
                            report.table_cells += 1;
                        }
                    }
                },
                DocItem::Text(text_item) => {
                    if text_item.text.is_empty()
                        || !self.policy.classifier().needs_fix(&text_item.text)
                    {
                        continue;
                    }
                    let Some(page_no) = text_item.page_no.filter(|p| page_selected(*p)) else {
                        continue;
                    };
                    let Some(bbox) = text_item.bbox else {
                        continue;
                    };
                    if let Some(text) = self.repair_text(&cache, page_no, &bbox, &text_item.text) {
                        log::debug!(
                            "Text {} on page {}: {:?} -> {:?}",
                            SpanId::text(idx),
                            page_no,
                            text_item.text,
                            text
                        );
                        edits.insert(SpanId::text(idx), text);
                        report.text_items += 1;
                    }
                },
                DocItem::Picture(_) => {},
            }
        }

        report.pages_processed = pages.map_or(0, BTreeSet::len);
        log::info!(
            "Spacing repair: {} table cells, {} text items ({} pages cached)",
            report.table_cells,
            report.text_items,
            cache.cached_pages()
        );
        (edits, report)
    }

    /// Padded clip in top-left page coordinates, `None` when it falls off
    /// the page or the page is unavailable.
    fn clip<S: GlyphSource + ?Sized>(&self, source: &S, page_no: u32, bbox: &BBox, pad: f32) -> Option<BBox> {
        if let Err(err) = bbox.validate() {
            log::warn!("Skipping span on page {}: {}", page_no, err);
            return None;
        }
        let bounds = match source.page_bounds(page_no) {
            Ok(bounds) => bounds,
            Err(err) => {
                log::warn!("Skipping span on page {}: {}", page_no, err);
                return None;
            },
        };
        bbox.to_top_left(bounds.height()).padded(pad).clamp_to(&bounds)
    }

    fn reconstruct_words<S: GlyphSource + ?Sized>(&self, source: &S, page_no: u32, clip: &BBox) -> Option<String> {
        match source.words(page_no, clip) {
            Ok(words) => {
                let text = compact_numeric_spacing(&self.reconstructor.reconstruct_words(&words));
                (!text.is_empty()).then_some(text)
            },
            Err(err) => {
                log::warn!("Word query failed on page {}: {}", page_no, err);
                None
            },
        }
    }

    fn reconstruct_chars<S: GlyphSource + ?Sized>(&self, source: &S, page_no: u32, clip: &BBox) -> Option<String> {
        match source.chars(page_no, clip) {
            Ok(chars) => {
                let text = compact_numeric_spacing(&self.reconstructor.reconstruct_chars(&chars));
                (!text.is_empty()).then_some(text)
            },
            Err(err) => {
                log::warn!("Glyph query failed on page {}: {}", page_no, err);
                None
            },
        }
    }

    /// Retry with a wider clip when `base` ends in a clipped word.
    fn expand_suffix<S: GlyphSource + ?Sized>(
        &self,
        source: &S,
        page_no: u32,
        bbox: &BBox,
        base: String,
    ) -> String {
        if !needs_suffix_completion(&base) {
            return base;
        }
        let pad = self.config.clip_pad * self.config.suffix_pad_multiplier;
        let Some(clip) = self.clip(source, page_no, bbox, pad) else {
            return base;
        };
        if let Some(text) = self.reconstruct_words(source, page_no, &clip) {
            if self.policy.should_replace(&base, &text, true) {
                return text;
            }
        }
        if let Some(text) = self.reconstruct_chars(source, page_no, &clip) {
            if self.policy.should_replace(&base, &text, true) {
                return text;
            }
        }
        base
    }

    fn repair_cell<S: GlyphSource + ?Sized>(
        &self,
        source: &S,
        page_no: u32,
        bbox: &BBox,
        original: &str,
    ) -> Option<String> {
        let clip = self.clip(source, page_no, bbox, self.config.clip_pad)?;

        if let Some(text) = self.reconstruct_words(source, page_no, &clip) {
            if !self.policy.classifier().needs_fix(&text) {
                let text = self.expand_suffix(source, page_no, bbox, text);
                if self.policy.should_replace(original, &text, true) {
                    return Some(text);
                }
            }
        }

        if let Some(text) = self.reconstruct_chars(source, page_no, &clip) {
            let text = self.expand_suffix(source, page_no, bbox, text);
            if self.policy.should_replace(original, &text, true) {
                return Some(text);
            }
        }

        if needs_suffix_completion(original) {
            let text = self.expand_suffix(source, page_no, bbox, original.to_string());
            if self.policy.should_replace(original, &text, true) {
                return Some(text);
            }
        }
        None
    }

    fn repair_text<S: GlyphSource + ?Sized>(
        &self,
        source: &S,
        page_no: u32,
        bbox: &BBox,
        original: &str,
    ) -> Option<String> {
        let clip = self.clip(source, page_no, bbox, self.config.clip_pad)?;

        if let Some(text) = self.reconstruct_words(source, page_no, &clip) {
            if !self.policy.classifier().needs_fix(&text) {
                return self
                    .policy
                    .should_replace(original, &text, false)
                    .then_some(text);
            }
        }
        self.reconstruct_chars(source, page_no, &clip)
            .filter(|text| self.policy.should_replace(original, text, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CoordOrigin;
    use crate::model::{Table, TableCell, TextItem};
    use crate::spacing::glyph_source::{GlyphSample, InMemoryGlyphSource, WordSample};

    const PAGE: BBox = BBox {
        left: 0.0,
        top: 0.0,
        right: 600.0,
        bottom: 800.0,
        origin: CoordOrigin::TopLeft,
    };

    /// Glyphs for `text` starting at `(x, y)`, 5pt wide with 1pt kerning and
    /// a 6pt word gap.
    fn glyph_run(text: &str, x: f32, y: f32) -> Vec<GlyphSample> {
        let mut out = Vec::new();
        let mut cursor = x;
        for (i, word) in text.split(' ').enumerate() {
            if i > 0 {
                cursor += 5.0;
            }
            for c in word.chars() {
                out.push(GlyphSample::new(
                    c.to_string(),
                    BBox::new(cursor, y, cursor + 5.0, y + 10.0),
                ));
                cursor += 6.0;
            }
        }
        out
    }

    fn spaced_doc(cell_text: &str, bbox: BBox) -> DocumentModel {
        let mut doc = DocumentModel::new();
        doc.add_page(1, 600.0, 800.0);
        doc.push(DocItem::Table(Table {
            page_no: Some(1),
            bbox: None,
            num_rows: 1,
            num_cols: 1,
            cells: vec![TableCell::new(cell_text, 0, 0).with_bbox(bbox)],
        }));
        doc
    }

    #[test]
    fn test_table_cell_repaired_from_chars() {
        let mut source = InMemoryGlyphSource::new();
        source.add_page(1, PAGE, Vec::new(), glyph_run("Viteza de rotatie", 100.0, 100.0));
        let doc = spaced_doc("Vi t e z a de ro t a t ie", BBox::new(99.0, 99.0, 210.0, 111.0));

        let (edits, report) = SpacingRepairer::default().repair(&doc, &source, None);
        assert_eq!(report.table_cells, 1);
        assert_eq!(report.pages_processed, 0);
        assert_eq!(edits.get(SpanId::cell(0, 0)), Some("Viteza de rotatie"));
    }

    #[test]
    fn test_clean_cell_untouched() {
        let mut source = InMemoryGlyphSource::new();
        source.add_page(1, PAGE, Vec::new(), glyph_run("Venituri", 100.0, 100.0));
        let doc = spaced_doc("Venituri", BBox::new(99.0, 99.0, 150.0, 111.0));
        let (edits, report) = SpacingRepairer::default().repair(&doc, &source, None);
        assert!(edits.is_empty());
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn test_text_item_from_ordinal_words() {
        let mut source = InMemoryGlyphSource::new();
        let words = vec![
            WordSample::new("situatia", BBox::new(100.0, 100.0, 140.0, 110.0)).with_ordinal(0, 0, 0),
            WordSample::new("financiara", BBox::new(145.0, 100.0, 195.0, 110.0)).with_ordinal(0, 0, 1),
            WordSample::new("anuala", BBox::new(200.0, 100.0, 230.0, 110.0)).with_ordinal(0, 0, 2),
        ];
        source.add_page(1, PAGE, words, Vec::new());

        let mut doc = DocumentModel::new();
        doc.add_page(1, 600.0, 800.0);
        doc.push(DocItem::Text(TextItem {
            label: Default::default(),
            text: "situatia finan c iara anuala".to_string(),
            page_no: Some(1),
            bbox: Some(BBox::new(99.0, 99.0, 231.0, 111.0)),
        }));

        let (edits, report) = SpacingRepairer::default().repair(&doc, &source, None);
        assert_eq!(report.text_items, 1);
        assert_eq!(edits.get(SpanId::text(0)), Some("situatia financiara anuala"));
    }

    #[test]
    fn test_bottom_left_boxes_converted() {
        let mut source = InMemoryGlyphSource::new();
        source.add_page(1, PAGE, Vec::new(), glyph_run("Total active", 100.0, 100.0));
        // Same region as top-left (100, 100)-(170, 110) on an 800pt page
        let bbox = BBox::with_origin(99.0, 701.0, 175.0, 689.0, CoordOrigin::BottomLeft);
        let doc = spaced_doc("T o t a l active", bbox);
        let (edits, _) = SpacingRepairer::default().repair(&doc, &source, None);
        assert_eq!(edits.get(SpanId::cell(0, 0)), Some("Total active"));
    }

    #[test]
    fn test_page_filter() {
        let mut source = InMemoryGlyphSource::new();
        source.add_page(1, PAGE, Vec::new(), glyph_run("Viteza de rotatie", 100.0, 100.0));
        let doc = spaced_doc("Vi t e z a de ro t a t ie", BBox::new(99.0, 99.0, 210.0, 111.0));
        let repairer = SpacingRepairer::default();

        let other: BTreeSet<u32> = [2].into_iter().collect();
        let (edits, report) = repairer.repair(&doc, &source, Some(&other));
        assert!(edits.is_empty());
        assert_eq!(report.pages_processed, 1);

        let empty = BTreeSet::new();
        let (_, report) = repairer.repair(&doc, &source, Some(&empty));
        assert_eq!(report, SpacingFixReport::default());
    }

    #[test]
    fn test_missing_page_skips_span() {
        let source = InMemoryGlyphSource::new();
        let doc = spaced_doc("Vi t e z a", BBox::new(99.0, 99.0, 210.0, 111.0));
        let (edits, report) = SpacingRepairer::default().repair(&doc, &source, None);
        assert!(edits.is_empty());
        assert_eq!(report.total(), 0);
    }
}
