//! Integration tests for reconciling two extractions of the same document.
//!
//! Both models are loaded from JSON dumps the way a pipeline would hand them
//! over, including boxes expressed in bottom-left page coordinates.

use pdf_spacefix::audit::spaced_cell_ratio;
use pdf_spacefix::config::RepairConfig;
use pdf_spacefix::model::{DocumentModel, SpanId};
use pdf_spacefix::Reconciler;
use serde_json::json;

fn base_model() -> DocumentModel {
    let value = json!({
        "pages": {"1": {"page_no": 1, "width": 600.0, "height": 800.0}},
        "items": [
            {"kind": "table", "page_no": 1, "num_rows": 2, "num_cols": 2, "cells": [
                {"text": "Indicator", "row_start": 0, "row_end": 1, "col_start": 0, "col_end": 1},
                {"text": "RON 71.371", "row_start": 0, "row_end": 1, "col_start": 1, "col_end": 2},
                {"text": "Vi t e z a", "row_start": 1, "row_end": 2, "col_start": 0, "col_end": 1},
                {"text": "RON 5.000", "row_start": 1, "row_end": 2, "col_start": 1, "col_end": 2}
            ]},
            {"kind": "table", "page_no": 1, "num_rows": 2, "num_cols": 1, "cells": [
                {"text": "Indicator", "row_start": 0, "row_end": 1, "col_start": 0, "col_end": 1},
                {"text": "Ve n it u r i", "row_start": 1, "row_end": 2, "col_start": 0, "col_end": 1}
            ]},
            {"kind": "table", "page_no": 1, "num_rows": 1, "num_cols": 1, "cells": [
                {"text": "C h e l t u i e l i", "row_start": 0, "row_end": 1, "col_start": 0, "col_end": 1,
                 "bbox": {"left": 100.0, "top": 100.0, "right": 200.0, "bottom": 120.0}}
            ]}
        ]
    });
    serde_json::from_value(value).unwrap()
}

fn alternate_model(with_pages: bool) -> DocumentModel {
    let pages = if with_pages {
        json!({"1": {"page_no": 1, "width": 600.0, "height": 800.0}})
    } else {
        json!({})
    };
    let value = json!({
        "pages": pages,
        "items": [
            {"kind": "table", "page_no": 1, "num_rows": 2, "num_cols": 2, "cells": [
                {"text": "Indicator", "row_start": 0, "row_end": 1, "col_start": 0, "col_end": 1},
                {"text": "RON 471.371", "row_start": 0, "row_end": 1, "col_start": 1, "col_end": 2},
                {"text": "Viteza", "row_start": 1, "row_end": 2, "col_start": 0, "col_end": 1},
                {"text": "RON 1.371.000", "row_start": 1, "row_end": 2, "col_start": 1, "col_end": 2}
            ]},
            {"kind": "table", "page_no": 1, "num_rows": 2, "num_cols": 1, "cells": [
                {"text": "Indicator", "row_start": 0, "row_end": 1, "col_start": 0, "col_end": 1},
                {"text": "Venituri", "row_start": 1, "row_end": 2, "col_start": 0, "col_end": 1}
            ]},
            {"kind": "table", "page_no": 1, "num_rows": 3, "num_cols": 1, "cells": [
                {"text": "Cheltuieli", "row_start": 0, "row_end": 1, "col_start": 0, "col_end": 1,
                 "bbox": {"left": 99.0, "top": 701.0, "right": 201.0, "bottom": 679.0, "origin": "bottom_left"}},
                {"text": "Total", "row_start": 1, "row_end": 2, "col_start": 0, "col_end": 1},
                {"text": "Sold", "row_start": 2, "row_end": 3, "col_start": 0, "col_end": 1}
            ]}
        ]
    });
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_reconcile_shape_spatial_and_numeric() {
    let mut base = base_model();
    let alternate = alternate_model(true);
    assert!(spaced_cell_ratio(&base) > 0.0);

    let edits = Reconciler::default().reconcile(&base, &alternate);
    assert_eq!(edits.len(), 4);
    assert_eq!(edits.get(SpanId::cell(0, 1)), Some("RON 471.371"));
    assert_eq!(edits.get(SpanId::cell(0, 2)), Some("Viteza"));
    assert_eq!(edits.get(SpanId::cell(0, 3)), None);
    assert_eq!(edits.get(SpanId::cell(1, 1)), Some("Venituri"));
    assert_eq!(edits.get(SpanId::cell(2, 0)), Some("Cheltuieli"));

    edits.apply(&mut base);
    assert_eq!(spaced_cell_ratio(&base), 0.0);
}

#[test]
fn test_spaced_merge_counts() {
    let base = base_model();
    let alternate = alternate_model(true);
    let reconciler = Reconciler::default();

    let (edits, replaced, total) = reconciler.merge_spaced_table_cells(&base, &alternate, true);
    assert!(edits.is_empty());
    assert_eq!((replaced, total), (0, 3));

    let (edits, replaced, total) = reconciler.merge_spaced_table_cells(&base, &alternate, false);
    assert_eq!((replaced, total), (3, 3));
    assert_eq!(edits.cell_count(), 3);
}

#[test]
fn test_bottom_left_box_needs_page_height() {
    let base = base_model();
    let alternate = alternate_model(false);
    let (edits, replaced, _) = Reconciler::default().merge_spaced_table_cells(&base, &alternate, false);
    // grid matches still apply; the spatial match cannot be placed
    assert_eq!(replaced, 2);
    assert_eq!(edits.get(SpanId::cell(2, 0)), None);
}

#[test]
fn test_coverage_threshold_from_config() {
    let config = RepairConfig::from_json_str(r#"{"reconcile": {"min_alternate_coverage": 0.95}}"#).unwrap();
    let reconciler = Reconciler::new(&config).unwrap();
    let (edits, _, _) = reconciler.merge_spaced_table_cells(&base_model(), &alternate_model(true), false);
    assert_eq!(edits.get(SpanId::cell(0, 2)), Some("Viteza"));
    assert_eq!(edits.get(SpanId::cell(2, 0)), None);
}

#[test]
fn test_suspect_merge_leaves_plausible_values() {
    let edits = Reconciler::default().merge_suspect_table_cells(&base_model(), &alternate_model(true));
    assert_eq!(edits.len(), 1);
    assert_eq!(edits.get(SpanId::cell(0, 1)), Some("RON 471.371"));
}
