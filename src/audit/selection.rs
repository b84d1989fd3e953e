//! Extraction retry policy.
//!
//! A cheap extraction runs first. When it yields too little text per page or
//! too many spaced table cells, an OCR-assisted extraction is attempted and
//! adopted only when it is measurably better.

use crate::audit::metrics::spaced_cell_ratio;
use crate::config::SelectionConfig;
use crate::error::Result;
use crate::model::DocumentModel;
use std::fmt;

/// How an extraction should be performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionMode {
    /// Text layer only
    Fast,
    /// Full-page OCR assisting the text layer
    OcrAssisted,
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::Fast => write!(f, "fast"),
            ExtractionMode::OcrAssisted => write!(f, "ocr"),
        }
    }
}

/// A document pipeline able to produce a positioned model.
pub trait Extractor {
    /// Run one extraction.
    ///
    /// # Errors
    ///
    /// Any pipeline failure; it is propagated unchanged by
    /// [`select_extraction`].
    fn extract(&mut self, mode: ExtractionMode) -> Result<DocumentModel>;
}

impl<F> Extractor for F
where
    F: FnMut(ExtractionMode) -> Result<DocumentModel>,
{
    fn extract(&mut self, mode: ExtractionMode) -> Result<DocumentModel> {
        self(mode)
    }
}

/// Size and damage figures of one extraction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExtractionStats {
    /// Characters in the text export
    pub text_length: usize,
    /// Characters per page (page count floored at one)
    pub chars_per_page: f32,
    /// Share of table cells flagged as spaced
    pub spaced_ratio: f32,
}

impl ExtractionStats {
    /// Measure a model.
    pub fn measure(doc: &DocumentModel) -> Self {
        let text_length = doc.export_text().chars().count();
        let pages = doc.page_count().max(1);
        Self {
            text_length,
            chars_per_page: text_length as f32 / pages as f32,
            spaced_ratio: spaced_cell_ratio(doc),
        }
    }
}

/// Why an extraction was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    /// The fast extraction was dense and clean enough; no retry
    FastSufficient,
    /// The OCR extraction had far fewer spaced cells
    FewerSpacedCells,
    /// The OCR extraction recovered materially more text
    MoreText,
    /// The OCR extraction was not better; the fast one was kept
    RetryNotBetter,
}

/// Outcome of [`select_extraction`].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionOutcome {
    /// Mode of the returned model
    pub mode: ExtractionMode,
    /// Why that model was chosen
    pub reason: SelectionReason,
    /// Figures of the fast extraction
    pub fast: ExtractionStats,
    /// Figures of the OCR extraction, when one ran
    pub retry: Option<ExtractionStats>,
}

/// Whether a fast extraction should be retried with OCR.
pub fn needs_retry(stats: &ExtractionStats, config: &SelectionConfig) -> bool {
    stats.chars_per_page < config.min_chars_per_page || stats.spaced_ratio > config.max_spaced_ratio
}

/// Whether a retry beats the fast extraction.
fn retry_wins(
    fast: &ExtractionStats,
    retry: &ExtractionStats,
    config: &SelectionConfig,
) -> Option<SelectionReason> {
    if retry.spaced_ratio < fast.spaced_ratio * config.spaced_improvement_factor {
        return Some(SelectionReason::FewerSpacedCells);
    }
    if retry.text_length as f32 > fast.text_length as f32 * config.min_length_gain {
        return Some(SelectionReason::MoreText);
    }
    None
}

/// Run the fast extraction and, when it looks poor, an OCR retry.
///
/// # Arguments
///
/// * `extractor` - The document pipeline
/// * `config` - Retry thresholds
///
/// # Returns
///
/// The chosen model with a [`SelectionOutcome`] describing the decision.
///
/// # Errors
///
/// Extraction failures of either attempt are propagated.
///
/// # Examples
///
/// ```
/// use pdf_spacefix::audit::selection::{select_extraction, ExtractionMode, SelectionReason};
/// use pdf_spacefix::config::SelectionConfig;
/// use pdf_spacefix::model::DocumentModel;
///
/// let mut calls = Vec::new();
/// let mut extractor = |mode: ExtractionMode| {
///     calls.push(mode);
///     Ok::<_, pdf_spacefix::Error>(DocumentModel::new())
/// };
/// let (_, outcome) = select_extraction(&mut extractor, &SelectionConfig::default()).unwrap();
/// assert_eq!(outcome.reason, SelectionReason::RetryNotBetter);
/// assert_eq!(calls, vec![ExtractionMode::Fast, ExtractionMode::OcrAssisted]);
/// ```
pub fn select_extraction<E: Extractor + ?Sized>(
    extractor: &mut E,
    config: &SelectionConfig,
) -> Result<(DocumentModel, SelectionOutcome)> {
    let fast_doc = extractor.extract(ExtractionMode::Fast)?;
    let fast = ExtractionStats::measure(&fast_doc);
    log::info!(
        "Fast extraction: {:.0} chars/page, spaced cell ratio {:.3}",
        fast.chars_per_page,
        fast.spaced_ratio
    );

    if !needs_retry(&fast, config) {
        return Ok((
            fast_doc,
            SelectionOutcome {
                mode: ExtractionMode::Fast,
                reason: SelectionReason::FastSufficient,
                fast,
                retry: None,
            },
        ));
    }

    let retry_doc = extractor.extract(ExtractionMode::OcrAssisted)?;
    let retry = ExtractionStats::measure(&retry_doc);
    log::info!(
        "OCR extraction: {} chars, spaced cell ratio {:.3}",
        retry.text_length,
        retry.spaced_ratio
    );

    match retry_wins(&fast, &retry, config) {
        Some(reason) => {
            log::info!("Adopting OCR extraction ({:?})", reason);
            Ok((
                retry_doc,
                SelectionOutcome {
                    mode: ExtractionMode::OcrAssisted,
                    reason,
                    fast,
                    retry: Some(retry),
                },
            ))
        },
        None => Ok((
            fast_doc,
            SelectionOutcome {
                mode: ExtractionMode::Fast,
                reason: SelectionReason::RetryNotBetter,
                fast,
                retry: Some(retry),
            },
        )),
    }
}
