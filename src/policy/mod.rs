//! Acceptance rules for candidate repairs and table-cell cleanup.
//!
//! - [`replacement`]: ordered rules deciding whether a candidate replaces the
//!   original span text
//! - [`cell_cleanup`]: numeric, currency, date and header fixes for cells
//! - [`currency`]: per-column currency code alignment

pub mod cell_cleanup;
pub mod currency;
pub mod replacement;

pub use cell_cleanup::{
    clean_document_table_cells, clean_header_text, clean_table_cell_text,
    count_suspect_table_cells, normalize_document_table_headers,
};
pub use currency::{normalize_document_table_currencies, CurrencyAligner};
pub use replacement::{
    default_policy, should_replace, AcceptReason, Decision, RejectReason, ReplacementPolicy,
};
