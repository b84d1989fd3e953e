//! Geometry-driven spacing repair.
//!
//! This module rebuilds word boundaries from positioned glyphs:
//!
//! - [`gap`]: adaptive intra-word / inter-word gap threshold per line
//! - [`glyph_source`]: the backend seam and its per-page cache
//! - [`reconstruct`]: line grouping and text reconstruction
//! - [`repairer`]: the document pass tying them to the replacement policy

pub mod gap;
pub mod glyph_source;
pub mod reconstruct;
pub mod repairer;

pub use gap::{GapThreshold, GapThresholdEstimator, ThresholdSource};
pub use glyph_source::{
    GlyphSample, GlyphSource, InMemoryGlyphSource, PageGlyphCache, PageGlyphs, WordOrdinal,
    WordSample,
};
pub use reconstruct::{reconstruct_from_ordinals, LineReconstructor};
pub use repairer::{SpacingFixReport, SpacingRepairer};
