//! Positioned glyph and word samples, and the collaborator that supplies them.
//!
//! A [`GlyphSource`] answers "which words / characters lie inside this clip
//! on this page", in top-left page coordinates. Queries are expensive for
//! real backends, so [`PageGlyphCache`] fetches each page once per pass and
//! answers clip queries from memory.

use crate::error::{Error, Result};
use crate::geometry::{area, overlap_ratio, BBox};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Reading-order position of a word as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WordOrdinal {
    /// Text block number
    pub block: u32,
    /// Line number within the block
    pub line: u32,
    /// Word number within the line
    pub word: u32,
}

/// A word-granularity sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordSample {
    /// Word text
    pub text: String,
    /// Word box in top-left page coordinates
    pub bbox: BBox,
    /// Backend ordinals, when the backend reports them
    #[serde(default)]
    pub ordinal: Option<WordOrdinal>,
}

impl WordSample {
    /// Create a word sample without ordinals.
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            bbox,
            ordinal: None,
        }
    }

    /// Attach backend ordinals.
    pub fn with_ordinal(mut self, block: u32, line: u32, word: u32) -> Self {
        self.ordinal = Some(WordOrdinal { block, line, word });
        self
    }
}

/// A character-granularity sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphSample {
    /// Character text (usually one char; whitespace glyphs are kept)
    pub text: String,
    /// Glyph box in top-left page coordinates
    pub bbox: BBox,
}

impl GlyphSample {
    /// Create a glyph sample.
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }

    /// Whether the glyph is whitespace.
    pub fn is_space(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(char::is_whitespace)
    }
}

/// Backend that yields positioned samples for a page region.
pub trait GlyphSource {
    /// Full page rectangle in top-left coordinates.
    fn page_bounds(&self, page_no: u32) -> Result<BBox>;

    /// Word samples inside `clip`.
    fn words(&self, page_no: u32, clip: &BBox) -> Result<Vec<WordSample>>;

    /// Character samples inside `clip`.
    fn chars(&self, page_no: u32, clip: &BBox) -> Result<Vec<GlyphSample>>;
}

/// Whether a sample box belongs to a clip.
///
/// Boxes with area need `min_overlap` of their own area inside the clip;
/// zero-area boxes need their top-left corner inside it.
pub(crate) fn sample_in_clip(bbox: &BBox, clip: &BBox, min_overlap: f32) -> bool {
    if area(bbox) <= 0.0 {
        let (lo, hi) = clip.vertical_span();
        return bbox.left >= clip.left && bbox.left <= clip.right && bbox.top >= lo && bbox.top <= hi;
    }
    overlap_ratio(bbox, clip) >= min_overlap
}

/// Samples of one page, as stored by [`InMemoryGlyphSource`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageGlyphs {
    /// Page rectangle
    pub bounds: Option<BBox>,
    /// Word samples
    #[serde(default)]
    pub words: Vec<WordSample>,
    /// Character samples
    #[serde(default)]
    pub chars: Vec<GlyphSample>,
}

/// A glyph source backed by a pre-extracted dump, for example a JSON export
/// of a PDF backend's words and characters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryGlyphSource {
    /// Samples keyed by page number
    pub pages: BTreeMap<u32, PageGlyphs>,
    /// Overlap required for a sample to count as inside a clip
    #[serde(default = "default_min_overlap")]
    pub min_overlap: f32,
}

fn default_min_overlap() -> f32 {
    0.5
}

impl InMemoryGlyphSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
            min_overlap: default_min_overlap(),
        }
    }

    /// Parse a JSON dump.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` for malformed input and `Error::InvalidGeometry`
    /// when page bounds or a sample box is inverted.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let source: InMemoryGlyphSource = serde_json::from_str(json)?;
        for page in source.pages.values() {
            page.bounds.iter().try_for_each(BBox::validate)?;
            page.words.iter().try_for_each(|w| w.bbox.validate())?;
            page.chars.iter().try_for_each(|c| c.bbox.validate())?;
        }
        Ok(source)
    }

    /// Register a page and its samples.
    pub fn add_page(&mut self, page_no: u32, bounds: BBox, words: Vec<WordSample>, chars: Vec<GlyphSample>) {
        self.pages.insert(
            page_no,
            PageGlyphs {
                bounds: Some(bounds),
                words,
                chars,
            },
        );
    }

    fn page(&self, page_no: u32) -> Result<&PageGlyphs> {
        self.pages.get(&page_no).ok_or(Error::PageNotFound(page_no))
    }
}

impl GlyphSource for InMemoryGlyphSource {
    fn page_bounds(&self, page_no: u32) -> Result<BBox> {
        self.page(page_no)?.bounds.ok_or_else(|| Error::GlyphSource {
            page: page_no,
            message: "page has no bounds".to_string(),
        })
    }

    fn words(&self, page_no: u32, clip: &BBox) -> Result<Vec<WordSample>> {
        Ok(self
            .page(page_no)?
            .words
            .iter()
            .filter(|w| sample_in_clip(&w.bbox, clip, self.min_overlap))
            .cloned()
            .collect())
    }

    fn chars(&self, page_no: u32, clip: &BBox) -> Result<Vec<GlyphSample>> {
        Ok(self
            .page(page_no)?
            .chars
            .iter()
            .filter(|c| sample_in_clip(&c.bbox, clip, self.min_overlap))
            .cloned()
            .collect())
    }
}

/// Per-pass cache that queries each page of the wrapped source once.
///
/// The first query for a page fetches all of its samples with a full-page
/// clip; later clip queries filter the cached samples. Failed fetches are not
/// cached.
pub struct PageGlyphCache<'a, S: GlyphSource + ?Sized> {
    source: &'a S,
    min_overlap: f32,
    bounds: RefCell<HashMap<u32, BBox>>,
    words: RefCell<HashMap<u32, Rc<Vec<WordSample>>>>,
    chars: RefCell<HashMap<u32, Rc<Vec<GlyphSample>>>>,
}

impl<'a, S: GlyphSource + ?Sized> PageGlyphCache<'a, S> {
    /// Wrap a source.
    ///
    /// # Arguments
    ///
    /// * `source` - Backend to query
    /// * `min_overlap` - Share of a sample's area that must fall inside a clip
    pub fn new(source: &'a S, min_overlap: f32) -> Self {
        Self {
            source,
            min_overlap,
            bounds: RefCell::new(HashMap::new()),
            words: RefCell::new(HashMap::new()),
            chars: RefCell::new(HashMap::new()),
        }
    }

    /// Number of pages whose word samples are cached.
    pub fn cached_pages(&self) -> usize {
        self.words.borrow().len().max(self.chars.borrow().len())
    }

    fn page_words(&self, page_no: u32) -> Result<Rc<Vec<WordSample>>> {
        if let Some(words) = self.words.borrow().get(&page_no) {
            return Ok(Rc::clone(words));
        }
        let bounds = self.page_bounds(page_no)?;
        let words = Rc::new(self.source.words(page_no, &bounds)?);
        log::trace!("Cached {} words for page {}", words.len(), page_no);
        self.words.borrow_mut().insert(page_no, Rc::clone(&words));
        Ok(words)
    }

    fn page_chars(&self, page_no: u32) -> Result<Rc<Vec<GlyphSample>>> {
        if let Some(chars) = self.chars.borrow().get(&page_no) {
            return Ok(Rc::clone(chars));
        }
        let bounds = self.page_bounds(page_no)?;
        let chars = Rc::new(self.source.chars(page_no, &bounds)?);
        log::trace!("Cached {} glyphs for page {}", chars.len(), page_no);
        self.chars.borrow_mut().insert(page_no, Rc::clone(&chars));
        Ok(chars)
    }
}

impl<S: GlyphSource + ?Sized> GlyphSource for PageGlyphCache<'_, S> {
    fn page_bounds(&self, page_no: u32) -> Result<BBox> {
        if let Some(bounds) = self.bounds.borrow().get(&page_no) {
            return Ok(*bounds);
        }
        let bounds = self.source.page_bounds(page_no)?;
        self.bounds.borrow_mut().insert(page_no, bounds);
        Ok(bounds)
    }

    fn words(&self, page_no: u32, clip: &BBox) -> Result<Vec<WordSample>> {
        let words = self.page_words(page_no)?;
        Ok(words
            .iter()
            .filter(|w| sample_in_clip(&w.bbox, clip, self.min_overlap))
            .cloned()
            .collect())
    }

    fn chars(&self, page_no: u32, clip: &BBox) -> Result<Vec<GlyphSample>> {
        let chars = self.page_chars(page_no)?;
        Ok(chars
            .iter()
            .filter(|c| sample_in_clip(&c.bbox, clip, self.min_overlap))
            .cloned()
            .collect())
    }
}
