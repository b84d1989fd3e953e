//! Fidelity auditing and extraction selection.
//!
//! - [`metrics`]: token, number and date coverage of a rendering against the
//!   model, plus spacing-damage counts
//! - [`quality`]: a cheap score for ranking backend probes
//! - [`selection`]: the fast-then-OCR extraction retry loop

pub mod metrics;
pub mod quality;
pub mod selection;

pub use metrics::{
    audit_document, audit_per_page, spaced_cell_ratio, split_pages, worst_pages, AuditMetrics,
    PageAudit, PAGE_BREAK,
};
pub use quality::{score_markdown, select_best_probe, QualityReport};
pub use selection::{
    select_extraction, ExtractionMode, ExtractionStats, Extractor, SelectionOutcome,
    SelectionReason,
};
