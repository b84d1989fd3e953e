//! Replacement texts produced by repair passes.

use super::{DocumentModel, SpanId};
use std::collections::{BTreeMap, BTreeSet};

/// A mapping from span identifier to its repaired text.
///
/// Later inserts for the same span overwrite earlier ones, so passes can be
/// chained by reading [`RepairSet::current_text`] before proposing a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairSet {
    edits: BTreeMap<SpanId, String>,
}

impl RepairSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a replacement.
    pub fn insert(&mut self, id: SpanId, text: impl Into<String>) {
        self.edits.insert(id, text.into());
    }

    /// Replacement recorded for a span.
    pub fn get(&self, id: SpanId) -> Option<&str> {
        self.edits.get(&id).map(String::as_str)
    }

    /// Text of a span after this set's edits, falling back to the model.
    pub fn current_text<'a>(&'a self, doc: &'a DocumentModel, id: SpanId) -> Option<&'a str> {
        self.get(id).or_else(|| doc.span_text(id))
    }

    /// Number of edited spans.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Whether no span was edited.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Edits in span order.
    pub fn iter(&self) -> impl Iterator<Item = (SpanId, &str)> {
        self.edits.iter().map(|(id, text)| (*id, text.as_str()))
    }

    /// Fold another set into this one; its edits win on conflict.
    pub fn merge(&mut self, other: RepairSet) {
        self.edits.extend(other.edits);
    }

    /// Number of edits targeting table cells.
    pub fn cell_count(&self) -> usize {
        self.edits.keys().filter(|id| id.cell.is_some()).count()
    }

    /// Pages holding at least one edited span.
    pub fn pages_touched(&self, doc: &DocumentModel) -> BTreeSet<u32> {
        self.edits
            .keys()
            .filter_map(|id| doc.items.get(id.item).and_then(|item| item.page_no()))
            .collect()
    }

    /// Write the edits into `doc` and return how many spans changed.
    pub fn apply(&self, doc: &mut DocumentModel) -> usize {
        let mut changed = 0;
        for (id, text) in &self.edits {
            if doc.span_text(*id) == Some(text.as_str()) {
                continue;
            }
            if doc.set_span_text(*id, text.clone()) {
                changed += 1;
            } else {
                log::warn!("Dropping edit for unknown span {}", id);
            }
        }
        changed
    }
}

impl FromIterator<(SpanId, String)> for RepairSet {
    fn from_iter<I: IntoIterator<Item = (SpanId, String)>>(iter: I) -> Self {
        Self {
            edits: iter.into_iter().collect(),
        }
    }
}
