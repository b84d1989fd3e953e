//! Integration tests for candidate acceptance and table-cell cleanup.

use pdf_spacefix::config::{CurrencyConfig, RepairConfig};
use pdf_spacefix::model::{DocItem, DocumentModel, SpanId, Table, TableCell};
use pdf_spacefix::policy::{
    clean_document_table_cells, clean_table_cell_text, count_suspect_table_cells,
    normalize_document_table_headers, should_replace, AcceptReason, CurrencyAligner, Decision,
    RejectReason, ReplacementPolicy,
};

fn statement_table(cells: Vec<TableCell>, rows: usize, cols: usize) -> DocumentModel {
    let mut doc = DocumentModel::new();
    doc.add_page(1, 600.0, 800.0);
    doc.push(DocItem::Table(Table {
        page_no: Some(1),
        bbox: None,
        num_rows: rows,
        num_cols: cols,
        cells,
    }));
    doc
}

// ============================================================================
// Replacement decisions
// ============================================================================

#[test]
fn test_spaced_cell_replaced_by_healed_text() {
    assert!(should_replace(
        "Vi t e z a de ro t a ț ie a a ct i v e l or",
        "Viteza de rotație a activelor",
        true
    ));
}

#[test]
fn test_clean_text_is_not_degraded() {
    assert!(!should_replace("Venituri din vanzari", "Venituri din vanzare", false));
    assert!(!should_replace(
        "Rezultatul net al exercitiului financiar",
        "Rezultatul exercitiului",
        false
    ));
}

#[test]
fn test_numeric_cell_rule_is_table_only() {
    let policy = ReplacementPolicy::default();
    assert_eq!(
        policy.decide("RON 71.371", "RON 471.371", true),
        Decision::Accept(AcceptReason::NumericCellRepair)
    );
    assert!(!policy.decide("RON 71.371", "RON 471.371", false).is_accept());
    assert!(!policy.should_replace_numeric_cell("RON 71.371", "RON 1.371.000"));
    assert!(!policy.should_replace_numeric_cell("RON 71.371", "EUR 471.371"));
}

#[test]
fn test_numeric_cell_rule_respects_configured_digit_limit() {
    let config = RepairConfig::from_json_str(r#"{"replacement": {"max_extra_digits": 0}}"#).unwrap();
    let policy = ReplacementPolicy::from_config(&config).unwrap();
    assert!(!policy.should_replace_numeric_cell("RON 71.371", "RON 471.371"));
    assert_eq!(
        policy.decide("RON 71.371", "RON 471.371", true),
        Decision::Reject(RejectReason::NotBetter)
    );
}

#[test]
fn test_truncated_values_completed() {
    assert!(should_replace(".96", "6.961", true));
    assert!(should_replace("Ve", "Venituri", false));
    assert!(should_replace("cheltuiel", "cheltuieli", true));
}

#[test]
fn test_invalid_replacement_config_rejected() {
    assert!(RepairConfig::from_json_str(r#"{"replacement": {"min_token_ratio": 1.5}}"#).is_err());
}

// ============================================================================
// Cell cleanup and currency alignment
// ============================================================================

#[test]
fn test_cell_cleanup_examples() {
    assert_eq!(clean_table_cell_text("168.506.901 ON"), "RON 168.506.901");
    assert_eq!(clean_table_cell_text("- 45,40%"), "-45,40%");
    assert_eq!(clean_table_cell_text("1 % 2 % 2 %"), "1% 2%");
    assert_eq!(clean_table_cell_text("1.234 RON 1.234 RON"), "RON 1.234");
    assert_eq!(clean_table_cell_text("  Venituri din vanzari "), "Venituri din vanzari");
}

#[test]
fn test_statement_cleanup_pipeline() {
    let mut doc = statement_table(
        vec![
            TableCell::new("Indicatori Indicatori", 0, 0),
            TableCell::new("Sold", 0, 1),
            TableCell::new("Venituri", 1, 0),
            TableCell::new("168.506.901 ON", 1, 1),
            TableCell::new("Cheltuieli", 2, 0),
            TableCell::new("RON 3.400", 2, 1),
            TableCell::new("Marja", 3, 0),
            TableCell::new("RON 5.600", 3, 1),
            TableCell::new("Alte", 4, 0),
            TableCell::new("EUR 7.800", 4, 1),
        ],
        5,
        2,
    );

    let cleaned = clean_document_table_cells(&doc);
    assert_eq!(cleaned.get(SpanId::cell(0, 3)), Some("RON 168.506.901"));
    cleaned.apply(&mut doc);

    normalize_document_table_headers(&doc).apply(&mut doc);
    assert_eq!(doc.span_text(SpanId::cell(0, 0)), Some("Indicatori"));

    let aligned = CurrencyAligner::new(CurrencyConfig::default())
        .unwrap()
        .align_document(&doc);
    assert_eq!(aligned.len(), 1);
    aligned.apply(&mut doc);
    assert_eq!(doc.span_text(SpanId::cell(0, 9)), Some("RON 7.800"));
    assert_eq!(doc.span_text(SpanId::cell(0, 5)), Some("RON 3.400"));
}

#[test]
fn test_suspect_cells_counted() {
    let doc = statement_table(
        vec![
            TableCell::new("Indicatori Indicatori", 0, 0),
            TableCell::new("RON 1.200", 0, 1),
            TableCell::new("84 % 84 %", 1, 0),
            TableCell::new("RON 139.36", 1, 1),
        ],
        2,
        2,
    );
    assert_eq!(count_suspect_table_cells(&doc), 1);
}
