//! Positioned document model handed over by the layout pipeline.
//!
//! The model is a flat, reading-ordered list of items (free text, tables and
//! pictures) plus per-page dimensions. Repair passes never mutate it directly:
//! they return a [`RepairSet`] keyed by [`SpanId`], which the orchestrator
//! applies in a single pass.
//!
//! # Examples
//!
//! ```
//! use pdf_spacefix::model::DocumentModel;
//!
//! let json = r#"{
//!     "pages": {"1": {"page_no": 1, "width": 595.0, "height": 842.0}},
//!     "items": [
//!         {"kind": "text", "text": "Raport anual", "page_no": 1}
//!     ]
//! }"#;
//! let doc = DocumentModel::from_json_str(json).unwrap();
//! assert_eq!(doc.page_count(), 1);
//! assert_eq!(doc.export_text(), "Raport anual");
//! ```

mod edits;

pub use edits::RepairSet;

use crate::error::Result;
use crate::geometry::{BBox, CoordOrigin};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier of a repairable span: a text item, or one cell of a table item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpanId {
    /// Index of the item in [`DocumentModel::items`]
    pub item: usize,
    /// Index of the cell within the table, `None` for text items
    pub cell: Option<usize>,
}

impl SpanId {
    /// Identifier of a free text item.
    pub fn text(item: usize) -> Self {
        Self { item, cell: None }
    }

    /// Identifier of a table cell.
    pub fn cell(item: usize, cell: usize) -> Self {
        Self {
            item,
            cell: Some(cell),
        }
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell {
            Some(cell) => write!(f, "#{}/{}", self.item, cell),
            None => write!(f, "#{}", self.item),
        }
    }
}

/// Page dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Page number (1-based, as reported by the pipeline)
    pub page_no: u32,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
}

impl PageInfo {
    /// Full page rectangle in top-left coordinates.
    pub fn bounds(&self) -> BBox {
        BBox::new(0.0, 0.0, self.width, self.height)
    }
}

/// Layout label of a free text item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemLabel {
    /// Body paragraph
    #[default]
    Text,
    /// Document title
    Title,
    /// Section heading
    SectionHeader,
    /// List entry
    ListItem,
    /// Figure or table caption
    Caption,
    /// Footnote
    Footnote,
    /// Running page header
    PageHeader,
    /// Running page footer
    PageFooter,
}

impl ItemLabel {
    /// Titles and section headings.
    pub fn is_heading(&self) -> bool {
        matches!(self, ItemLabel::Title | ItemLabel::SectionHeader)
    }
}

/// A free text item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    /// Layout label
    #[serde(default)]
    pub label: ItemLabel,
    /// Extracted text
    pub text: String,
    /// Page the item sits on
    #[serde(default)]
    pub page_no: Option<u32>,
    /// Item bounding box
    #[serde(default)]
    pub bbox: Option<BBox>,
}

bitflags! {
    /// Structural roles of a table cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CellRoles: u8 {
        /// Cell labels a column
        const COLUMN_HEADER = 0b0001;
        /// Cell labels a row
        const ROW_HEADER = 0b0010;
        /// Cell starts a row section
        const ROW_SECTION = 0b0100;
        /// Cell is a form field
        const FILLABLE = 0b1000;
    }
}

/// One cell of a table grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Extracted text
    pub text: String,
    /// Cell bounding box
    #[serde(default)]
    pub bbox: Option<BBox>,
    /// First row covered
    pub row_start: usize,
    /// One past the last row covered
    pub row_end: usize,
    /// First column covered
    pub col_start: usize,
    /// One past the last column covered
    pub col_end: usize,
    /// Structural roles
    #[serde(default)]
    pub roles: CellRoles,
}

/// Grid key used to match cells across extractions with the same table shape.
pub type CellKey = (usize, usize, usize, usize);

impl TableCell {
    /// Create a single-slot cell at `(row, col)`.
    pub fn new(text: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            text: text.into(),
            bbox: None,
            row_start: row,
            row_end: row + 1,
            col_start: col,
            col_end: col + 1,
            roles: CellRoles::empty(),
        }
    }

    /// Attach a bounding box.
    pub fn with_bbox(mut self, bbox: BBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Set the spanned rows and columns.
    pub fn with_span(mut self, row_end: usize, col_end: usize) -> Self {
        self.row_end = row_end;
        self.col_end = col_end;
        self
    }

    /// Set structural roles.
    pub fn with_roles(mut self, roles: CellRoles) -> Self {
        self.roles = roles;
        self
    }

    /// Grid placement key.
    pub fn key(&self) -> CellKey {
        (self.row_start, self.row_end, self.col_start, self.col_end)
    }

    /// Whether the cell covers exactly one column.
    pub fn is_single_column(&self) -> bool {
        self.col_end == self.col_start + 1
    }
}

/// A table with its cell grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Page the table sits on
    #[serde(default)]
    pub page_no: Option<u32>,
    /// Table bounding box
    #[serde(default)]
    pub bbox: Option<BBox>,
    /// Grid row count
    pub num_rows: usize,
    /// Grid column count
    pub num_cols: usize,
    /// Cells in reading order
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

impl Table {
    /// Grid shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows, self.num_cols)
    }

    /// Cell texts keyed by grid placement.
    pub fn cells_by_key(&self) -> BTreeMap<CellKey, &str> {
        self.cells
            .iter()
            .map(|cell| (cell.key(), cell.text.as_str()))
            .collect()
    }

    /// Plain-text rendering: one line per row, cells separated by spaces.
    pub fn export_text(&self) -> String {
        let mut rows: BTreeMap<usize, Vec<&TableCell>> = BTreeMap::new();
        for cell in &self.cells {
            rows.entry(cell.row_start).or_default().push(cell);
        }
        rows.into_values()
            .map(|mut cells| {
                cells.sort_by_key(|c| c.col_start);
                cells
                    .iter()
                    .map(|c| c.text.trim())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A picture region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Picture {
    /// Page the picture sits on
    #[serde(default)]
    pub page_no: Option<u32>,
    /// Picture bounding box
    #[serde(default)]
    pub bbox: Option<BBox>,
}

/// One item of the document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocItem {
    /// Free text
    Text(TextItem),
    /// Table grid
    Table(Table),
    /// Picture region
    Picture(Picture),
}

impl DocItem {
    /// Page number of the item, if known.
    pub fn page_no(&self) -> Option<u32> {
        match self {
            DocItem::Text(t) => t.page_no,
            DocItem::Table(t) => t.page_no,
            DocItem::Picture(p) => p.page_no,
        }
    }
}

/// A positioned document model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentModel {
    /// Page dimensions keyed by page number
    #[serde(default)]
    pub pages: BTreeMap<u32, PageInfo>,
    /// Items in reading order
    #[serde(default)]
    pub items: Vec<DocItem>,
}

impl DocumentModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON dump of the model.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` for malformed input and `Error::InvalidGeometry`
    /// when any item or cell box is inverted.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: DocumentModel = serde_json::from_str(json)?;
        doc.validate_geometry()?;
        Ok(doc)
    }

    /// Check every item, cell and picture box.
    pub fn validate_geometry(&self) -> Result<()> {
        for item in &self.items {
            match item {
                DocItem::Text(t) => t.bbox.iter().try_for_each(BBox::validate)?,
                DocItem::Picture(p) => p.bbox.iter().try_for_each(BBox::validate)?,
                DocItem::Table(t) => {
                    t.bbox.iter().try_for_each(BBox::validate)?;
                    for cell in &t.cells {
                        cell.bbox.iter().try_for_each(BBox::validate)?;
                    }
                },
            }
        }
        Ok(())
    }

    /// Register a page.
    pub fn add_page(&mut self, page_no: u32, width: f32, height: f32) {
        self.pages.insert(
            page_no,
            PageInfo {
                page_no,
                width,
                height,
            },
        );
    }

    /// Append an item and return its index.
    pub fn push(&mut self, item: DocItem) -> usize {
        self.items.push(item);
        self.items.len() - 1
    }

    /// Number of known pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Height of a page, used for origin conversion.
    pub fn page_height(&self, page_no: u32) -> Option<f32> {
        self.pages.get(&page_no).map(|p| p.height)
    }

    /// Free text items with their identifiers.
    pub fn text_items(&self) -> impl Iterator<Item = (SpanId, &TextItem)> {
        self.items.iter().enumerate().filter_map(|(idx, item)| match item {
            DocItem::Text(t) => Some((SpanId::text(idx), t)),
            _ => None,
        })
    }

    /// Tables with their item index.
    pub fn tables(&self) -> impl Iterator<Item = (usize, &Table)> {
        self.items.iter().enumerate().filter_map(|(idx, item)| match item {
            DocItem::Table(t) => Some((idx, t)),
            _ => None,
        })
    }

    /// Pictures with their item index.
    pub fn pictures(&self) -> impl Iterator<Item = (usize, &Picture)> {
        self.items.iter().enumerate().filter_map(|(idx, item)| match item {
            DocItem::Picture(p) => Some((idx, p)),
            _ => None,
        })
    }

    /// Every table cell with its identifier and owning table.
    pub fn table_cells(&self) -> impl Iterator<Item = (SpanId, &Table, &TableCell)> {
        self.tables().flat_map(|(idx, table)| {
            table
                .cells
                .iter()
                .enumerate()
                .map(move |(cell_idx, cell)| (SpanId::cell(idx, cell_idx), table, cell))
        })
    }

    /// Current text of a span.
    pub fn span_text(&self, id: SpanId) -> Option<&str> {
        match (self.items.get(id.item)?, id.cell) {
            (DocItem::Text(t), None) => Some(t.text.as_str()),
            (DocItem::Table(t), Some(cell)) => t.cells.get(cell).map(|c| c.text.as_str()),
            _ => None,
        }
    }

    /// Overwrite the text of a span. Returns `false` for unknown identifiers.
    pub fn set_span_text(&mut self, id: SpanId, text: String) -> bool {
        match (self.items.get_mut(id.item), id.cell) {
            (Some(DocItem::Text(t)), None) => {
                t.text = text;
                true
            },
            (Some(DocItem::Table(t)), Some(cell)) => match t.cells.get_mut(cell) {
                Some(c) => {
                    c.text = text;
                    true
                },
                None => false,
            },
            _ => false,
        }
    }

    /// Drop items by index. Indices of later items shift down.
    pub fn remove_items(&mut self, indices: &BTreeSet<usize>) -> usize {
        let before = self.items.len();
        let mut idx = 0;
        self.items.retain(|_| {
            let keep = !indices.contains(&idx);
            idx += 1;
            keep
        });
        before - self.items.len()
    }

    /// Copy of the model restricted to the given pages.
    pub fn filter_pages(&self, pages: &BTreeSet<u32>) -> DocumentModel {
        DocumentModel {
            pages: self
                .pages
                .iter()
                .filter(|(no, _)| pages.contains(no))
                .map(|(no, info)| (*no, *info))
                .collect(),
            items: self
                .items
                .iter()
                .filter(|item| item.page_no().is_some_and(|p| pages.contains(&p)))
                .cloned()
                .collect(),
        }
    }

    /// Plain-text export: text items and tables in reading order, separated by
    /// blank lines. Pictures contribute nothing.
    pub fn export_text(&self) -> String {
        self.items
            .iter()
            .filter_map(|item| match item {
                DocItem::Text(t) => Some(t.text.trim().to_string()),
                DocItem::Table(t) => Some(t.export_text()),
                DocItem::Picture(_) => None,
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Convert a bbox to top-left coordinates using the page height.
    ///
    /// Returns `None` when the box is bottom-left but the page is unknown.
    pub fn top_left_bbox(&self, bbox: &BBox, page_no: u32) -> Option<BBox> {
        match bbox.origin {
            CoordOrigin::TopLeft => Some(*bbox),
            CoordOrigin::BottomLeft => self.page_height(page_no).map(|h| bbox.to_top_left(h)),
        }
    }
}
