//! Integration tests for geometry-driven reconstruction.
//!
//! These tests drive the gap estimator, the line reconstructor and the
//! document-level spacing repairer with in-memory glyph sources that mimic a
//! PDF backend's word and character dumps.

use pdf_spacefix::config::{GapConfig, RepairConfig};
use pdf_spacefix::error::{Error, Result};
use pdf_spacefix::geometry::BBox;
use pdf_spacefix::model::{DocItem, DocumentModel, ItemLabel, SpanId, Table, TableCell, TextItem};
use pdf_spacefix::spacing::{
    GapThresholdEstimator, GlyphSample, GlyphSource, InMemoryGlyphSource, LineReconstructor,
    SpacingRepairer, ThresholdSource, WordSample,
};
use std::cell::Cell;
use std::collections::BTreeSet;

// ============================================================================
// Helper Functions for Creating Mock Data
// ============================================================================

fn page_box() -> BBox {
    BBox::new(0.0, 0.0, 600.0, 800.0)
}

/// Glyphs 5pt wide with 1pt kerning inside words and a 6pt gap between words.
fn glyph_run(text: &str, x: f32, y: f32) -> Vec<GlyphSample> {
    let mut out = Vec::new();
    let mut cursor = x;
    for (i, word) in text.split(' ').enumerate() {
        if i > 0 {
            cursor += 5.0;
        }
        for c in word.chars() {
            out.push(GlyphSample::new(c.to_string(), BBox::new(cursor, y, cursor + 5.0, y + 10.0)));
            cursor += 6.0;
        }
    }
    out
}

fn table_doc(cells: Vec<TableCell>) -> DocumentModel {
    let mut doc = DocumentModel::new();
    doc.add_page(1, 600.0, 800.0);
    doc.push(DocItem::Table(Table {
        page_no: Some(1),
        bbox: None,
        num_rows: cells.len(),
        num_cols: 1,
        cells,
    }));
    doc
}

/// Source whose word queries always fail, as with backends that only expose
/// characters.
struct CharsOnlySource {
    inner: InMemoryGlyphSource,
}

impl GlyphSource for CharsOnlySource {
    fn page_bounds(&self, page_no: u32) -> Result<BBox> {
        self.inner.page_bounds(page_no)
    }

    fn words(&self, page_no: u32, _clip: &BBox) -> Result<Vec<WordSample>> {
        Err(Error::GlyphSource {
            page: page_no,
            message: "word extraction unsupported".to_string(),
        })
    }

    fn chars(&self, page_no: u32, clip: &BBox) -> Result<Vec<GlyphSample>> {
        self.inner.chars(page_no, clip)
    }
}

/// Source counting how often each page-level query reaches it.
struct CountingSource {
    inner: InMemoryGlyphSource,
    word_queries: Cell<usize>,
    char_queries: Cell<usize>,
}

impl GlyphSource for CountingSource {
    fn page_bounds(&self, page_no: u32) -> Result<BBox> {
        self.inner.page_bounds(page_no)
    }

    fn words(&self, page_no: u32, clip: &BBox) -> Result<Vec<WordSample>> {
        self.word_queries.set(self.word_queries.get() + 1);
        self.inner.words(page_no, clip)
    }

    fn chars(&self, page_no: u32, clip: &BBox) -> Result<Vec<GlyphSample>> {
        self.char_queries.set(self.char_queries.get() + 1);
        self.inner.chars(page_no, clip)
    }
}

// ============================================================================
// Gap estimation and line layout
// ============================================================================

#[test]
fn test_gap_estimator_separates_kerning_from_word_gaps() {
    let estimator = GapThresholdEstimator::new(GapConfig::default());
    let threshold = estimator.estimate(&[1.0, 1.0, 1.2, 0.8, 6.0, 1.0, 6.2], 5.0);
    assert_eq!(threshold.source, ThresholdSource::Clustered);
    assert!(threshold.value > 1.2 && threshold.value < 6.0);
}

#[test]
fn test_gap_estimator_falls_back_on_uniform_gaps() {
    let estimator = GapThresholdEstimator::default();
    let threshold = estimator.estimate(&[2.0, 2.0, 2.0], 5.0);
    assert!(threshold.is_fallback());
    assert!((threshold.value - 5.0 * 0.35).abs() < 1e-6);
}

#[test]
fn test_positioned_words_without_ordinals() {
    let words = vec![
        WordSample::new("Total", BBox::new(100.0, 100.0, 125.0, 110.0)),
        WordSample::new("active", BBox::new(131.0, 100.0, 161.0, 110.0)),
        WordSample::new("curente", BBox::new(167.0, 100.0, 202.0, 110.0)),
    ];
    let text = LineReconstructor::default().reconstruct_words(&words);
    assert_eq!(text, "Total active curente");
}

#[test]
fn test_words_on_two_lines_join_in_reading_order() {
    let words = vec![
        WordSample::new("curente", BBox::new(100.0, 120.0, 135.0, 130.0)),
        WordSample::new("Datorii", BBox::new(60.0, 120.0, 95.0, 130.0)),
        WordSample::new("Active", BBox::new(60.0, 100.0, 90.0, 110.0)),
    ];
    let text = LineReconstructor::default().reconstruct_words(&words);
    assert_eq!(text, "Active Datorii curente");
}

#[test]
fn test_space_glyph_width_decides_space() {
    let glyph = |c: &str, left: f32, right: f32| GlyphSample::new(c, BBox::new(left, 0.0, right, 10.0));
    let reconstructor = LineReconstructor::default();

    let wide = vec![glyph("a", 0.0, 5.0), glyph("b", 6.0, 11.0), glyph(" ", 11.0, 14.0), glyph("c", 15.0, 20.0)];
    assert_eq!(reconstructor.reconstruct_chars(&wide), "ab c");

    let narrow = vec![glyph("a", 0.0, 5.0), glyph("b", 6.0, 11.0), glyph(" ", 11.0, 12.0), glyph("c", 13.0, 18.0)];
    assert_eq!(reconstructor.reconstruct_chars(&narrow), "abc");
}

// ============================================================================
// Document repair
// ============================================================================

#[test]
fn test_repair_cells_and_text_items() {
    let mut source = InMemoryGlyphSource::new();
    let mut chars = glyph_run("Cheltuieli totale", 100.0, 100.0);
    chars.extend(glyph_run("Venituri totale", 100.0, 140.0));
    source.add_page(1, page_box(), Vec::new(), chars);
    source.add_page(2, page_box(), Vec::new(), glyph_run("Raportul administratorilor", 50.0, 300.0));

    let mut doc = table_doc(vec![
        TableCell::new("C h e l t u i e l i totale", 0, 0).with_bbox(BBox::new(99.0, 99.0, 201.0, 111.0)),
        TableCell::new("V e n i t u r i totale", 1, 0).with_bbox(BBox::new(99.0, 139.0, 189.0, 151.0)),
        TableCell::new("Total", 2, 0).with_bbox(BBox::new(99.0, 179.0, 130.0, 191.0)),
    ]);
    doc.add_page(2, 600.0, 800.0);
    doc.push(DocItem::Text(TextItem {
        label: ItemLabel::Text,
        text: "R a p o r t u l administratorilor".to_string(),
        page_no: Some(2),
        bbox: Some(BBox::new(49.0, 299.0, 210.0, 311.0)),
    }));

    let (edits, report) = SpacingRepairer::default().repair(&doc, &source, None);
    assert_eq!(report.table_cells, 2);
    assert_eq!(report.text_items, 1);
    assert_eq!(edits.get(SpanId::cell(0, 0)), Some("Cheltuieli totale"));
    assert_eq!(edits.get(SpanId::cell(0, 1)), Some("Venituri totale"));
    assert_eq!(edits.get(SpanId::cell(0, 2)), None);
    assert_eq!(edits.get(SpanId::text(1)), Some("Raportul administratorilor"));

    let original = doc.clone();
    assert_eq!(edits.apply(&mut doc), 3);
    assert_eq!(doc.span_text(SpanId::cell(0, 1)), Some("Venituri totale"));
    assert_ne!(doc, original);
}

#[test]
fn test_page_filter_limits_repair() {
    let mut source = InMemoryGlyphSource::new();
    source.add_page(1, page_box(), Vec::new(), glyph_run("Cheltuieli totale", 100.0, 100.0));
    source.add_page(2, page_box(), Vec::new(), glyph_run("Raportul administratorilor", 50.0, 300.0));

    let mut doc = table_doc(vec![
        TableCell::new("C h e l t u i e l i totale", 0, 0).with_bbox(BBox::new(99.0, 99.0, 201.0, 111.0)),
    ]);
    doc.add_page(2, 600.0, 800.0);
    doc.push(DocItem::Text(TextItem {
        label: ItemLabel::Text,
        text: "R a p o r t u l administratorilor".to_string(),
        page_no: Some(2),
        bbox: Some(BBox::new(49.0, 299.0, 210.0, 311.0)),
    }));

    let pages: BTreeSet<u32> = [2].into_iter().collect();
    let (edits, report) = SpacingRepairer::default().repair(&doc, &source, Some(&pages));
    assert_eq!(edits.len(), 1);
    assert_eq!(report.pages_processed, 1);
    assert_eq!(report.table_cells, 0);
    assert_eq!(report.text_items, 1);
}

#[test]
fn test_word_failures_fall_back_to_chars() {
    let mut inner = InMemoryGlyphSource::new();
    inner.add_page(1, page_box(), Vec::new(), glyph_run("Cheltuieli totale", 100.0, 100.0));
    let source = CharsOnlySource { inner };
    let doc = table_doc(vec![
        TableCell::new("C h e l t u i e l i totale", 0, 0).with_bbox(BBox::new(99.0, 99.0, 201.0, 111.0)),
    ]);

    let (edits, _) = SpacingRepairer::default().repair(&doc, &source, None);
    assert_eq!(edits.get(SpanId::cell(0, 0)), Some("Cheltuieli totale"));
}

#[test]
fn test_inverted_span_box_is_skipped() {
    let mut source = InMemoryGlyphSource::new();
    source.add_page(1, page_box(), Vec::new(), glyph_run("Cheltuieli totale", 100.0, 100.0));
    let doc = table_doc(vec![
        TableCell::new("C h e l t u i e l i totale", 0, 0).with_bbox(BBox::new(201.0, 99.0, 99.0, 111.0)),
    ]);

    let (edits, report) = SpacingRepairer::default().repair(&doc, &source, None);
    assert!(edits.is_empty());
    assert_eq!(report.table_cells, 0);
    assert!(matches!(
        BBox::new(201.0, 99.0, 99.0, 111.0).validate(),
        Err(Error::InvalidGeometry(_))
    ));
}

#[test]
fn test_each_page_is_queried_once_per_pass() {
    let mut inner = InMemoryGlyphSource::new();
    let mut chars = glyph_run("Cheltuieli totale", 100.0, 100.0);
    chars.extend(glyph_run("Venituri totale", 100.0, 140.0));
    inner.add_page(1, page_box(), Vec::new(), chars);
    let source = CountingSource {
        inner,
        word_queries: Cell::new(0),
        char_queries: Cell::new(0),
    };
    let doc = table_doc(vec![
        TableCell::new("C h e l t u i e l i totale", 0, 0).with_bbox(BBox::new(99.0, 99.0, 201.0, 111.0)),
        TableCell::new("V e n i t u r i totale", 1, 0).with_bbox(BBox::new(99.0, 139.0, 189.0, 151.0)),
    ]);

    let (edits, _) = SpacingRepairer::default().repair(&doc, &source, None);
    assert_eq!(edits.len(), 2);
    assert_eq!(source.word_queries.get(), 1);
    assert_eq!(source.char_queries.get(), 1);
}

#[test]
fn test_repair_from_json_word_dump() {
    let json = r#"{
        "pages": {
            "1": {
                "bounds": {"left": 0, "top": 0, "right": 600, "bottom": 800},
                "words": [
                    {"text": "Total", "bbox": {"left": 100, "top": 100, "right": 125, "bottom": 110},
                     "ordinal": {"block": 0, "line": 0, "word": 0}},
                    {"text": "active", "bbox": {"left": 131, "top": 100, "right": 161, "bottom": 110},
                     "ordinal": {"block": 0, "line": 0, "word": 1}}
                ]
            }
        }
    }"#;
    let source = InMemoryGlyphSource::from_json_str(json).unwrap();
    let doc = table_doc(vec![
        TableCell::new("T o t a l active", 0, 0).with_bbox(BBox::new(99.0, 99.0, 162.0, 111.0)),
    ]);

    let repairer = SpacingRepairer::new(&RepairConfig::default()).unwrap();
    let (edits, report) = repairer.repair(&doc, &source, None);
    assert_eq!(report.table_cells, 1);
    assert_eq!(edits.get(SpanId::cell(0, 0)), Some("Total active"));
}
