//! Text reconstruction from positioned words and glyphs.
//!
//! Three reconstructions are available, from cheapest to most precise:
//!
//! 1. **Ordinal words**: words grouped by the backend's (block, line)
//!    ordinals, ordered by word number and joined with single spaces.
//! 2. **Positioned words**: words grouped into lines by vertical center and
//!    joined with a space only where the horizontal gap exceeds the line's
//!    adaptive threshold. Used when the backend reports no ordinals.
//! 3. **Characters**: glyphs grouped into lines by vertical center, with a
//!    space emitted where the gap exceeds the threshold or where an explicit
//!    whitespace glyph is wide enough.
//!
//! Lines are joined with single spaces in every mode.

use crate::config::{GapConfig, ReconstructionConfig};
use crate::geometry::{median, BBox};
use crate::spacing::gap::GapThresholdEstimator;
use crate::spacing::glyph_source::{GlyphSample, WordOrdinal, WordSample};
use crate::utils::safe_float_cmp;
use std::collections::BTreeMap;

/// Join words by their backend ordinals.
///
/// # Examples
///
/// ```
/// use pdf_spacefix::geometry::BBox;
/// use pdf_spacefix::spacing::glyph_source::WordSample;
/// use pdf_spacefix::spacing::reconstruct::reconstruct_from_ordinals;
///
/// let b = BBox::new(0.0, 0.0, 1.0, 1.0);
/// let words = vec![
///     WordSample::new("financiar", b).with_ordinal(0, 0, 1),
///     WordSample::new("Raport", b).with_ordinal(0, 0, 0),
///     WordSample::new("2024", b).with_ordinal(0, 1, 0),
/// ];
/// assert_eq!(reconstruct_from_ordinals(&words), "Raport financiar 2024");
/// ```
pub fn reconstruct_from_ordinals(words: &[WordSample]) -> String {
    let mut lines: BTreeMap<(u32, u32), Vec<(u32, &str)>> = BTreeMap::new();
    for word in words {
        if word.text.is_empty() {
            continue;
        }
        let ordinal = word.ordinal.unwrap_or(WordOrdinal {
            block: 0,
            line: 0,
            word: 0,
        });
        lines
            .entry((ordinal.block, ordinal.line))
            .or_default()
            .push((ordinal.word, word.text.as_str()));
    }

    let out: Vec<String> = lines
        .into_values()
        .filter_map(|mut items| {
            items.sort_by_key(|(idx, _)| *idx);
            let line = items
                .iter()
                .map(|(_, text)| *text)
                .collect::<Vec<_>>()
                .join(" ");
            let line = line.trim();
            (!line.is_empty()).then(|| line.to_string())
        })
        .collect();
    out.join(" ").trim().to_string()
}

/// One positioned item being laid out on a line.
struct LineItem<'a> {
    text: &'a str,
    bbox: BBox,
    is_space: bool,
    /// Width of one character, for median estimation
    char_width: f32,
}

/// Line reconstructor combining line grouping with the adaptive gap threshold.
#[derive(Debug, Clone, Default)]
pub struct LineReconstructor {
    config: ReconstructionConfig,
    estimator: GapThresholdEstimator,
}

impl LineReconstructor {
    /// Create a reconstructor.
    pub fn new(config: ReconstructionConfig, gap: GapConfig) -> Self {
        Self {
            config,
            estimator: GapThresholdEstimator::new(gap),
        }
    }

    /// Reconstruction settings in use.
    pub fn config(&self) -> &ReconstructionConfig {
        &self.config
    }

    /// Reconstruct from word samples, by ordinals when every word has them and
    /// by position otherwise.
    pub fn reconstruct_words(&self, words: &[WordSample]) -> String {
        if words.is_empty() {
            return String::new();
        }
        if words.iter().all(|w| w.ordinal.is_some()) {
            reconstruct_from_ordinals(words)
        } else {
            self.reconstruct_positioned_words(words)
        }
    }

    /// Reconstruct from word samples using their positions only.
    pub fn reconstruct_positioned_words(&self, words: &[WordSample]) -> String {
        let items: Vec<LineItem<'_>> = words
            .iter()
            .filter(|w| !w.text.trim().is_empty())
            .map(|w| {
                let chars = w.text.chars().count().max(1) as f32;
                LineItem {
                    text: w.text.trim(),
                    bbox: w.bbox,
                    is_space: false,
                    char_width: w.bbox.width() / chars,
                }
            })
            .collect();
        self.layout(items)
    }

    /// Reconstruct from character samples.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_spacefix::geometry::BBox;
    /// use pdf_spacefix::spacing::glyph_source::GlyphSample;
    /// use pdf_spacefix::spacing::reconstruct::LineReconstructor;
    ///
    /// // "ab cd" with tight kerning inside words and a wide word gap
    /// let glyph = |c: &str, x: f32| GlyphSample::new(c, BBox::new(x, 0.0, x + 5.0, 10.0));
    /// let chars = vec![glyph("a", 0.0), glyph("b", 5.5), glyph("c", 14.0), glyph("d", 19.5)];
    /// assert_eq!(LineReconstructor::default().reconstruct_chars(&chars), "ab cd");
    /// ```
    pub fn reconstruct_chars(&self, chars: &[GlyphSample]) -> String {
        let items: Vec<LineItem<'_>> = chars
            .iter()
            .filter(|c| !c.text.is_empty())
            .map(|c| LineItem {
                text: c.text.as_str(),
                bbox: c.bbox,
                is_space: c.is_space(),
                char_width: c.bbox.width(),
            })
            .collect();
        self.layout(items)
    }

    fn group_lines<'a>(&self, mut items: Vec<LineItem<'a>>) -> Vec<Vec<LineItem<'a>>> {
        let heights: Vec<f32> = items.iter().map(|i| i.bbox.height()).collect();
        let line_tol = median(&heights, 1.0) * self.config.line_ratio;

        items.sort_by(|a, b| {
            safe_float_cmp(a.bbox.center_y(), b.bbox.center_y())
                .then_with(|| safe_float_cmp(a.bbox.left, b.bbox.left))
        });

        let mut lines: Vec<(f32, Vec<LineItem<'a>>)> = Vec::new();
        for item in items {
            let y = item.bbox.center_y();
            match lines.last_mut() {
                Some((line_y, line)) if (y - *line_y).abs() <= line_tol => line.push(item),
                _ => lines.push((y, vec![item])),
            }
        }
        lines
            .into_iter()
            .map(|(_, mut line)| {
                line.sort_by(|a, b| safe_float_cmp(a.bbox.left, b.bbox.left));
                line
            })
            .collect()
    }

    fn layout(&self, items: Vec<LineItem<'_>>) -> String {
        if items.is_empty() {
            return String::new();
        }
        let mut line_texts = Vec::new();
        for line in self.group_lines(items) {
            let text = self.layout_line(&line);
            let text = text.trim();
            if !text.is_empty() {
                line_texts.push(text.to_string());
            }
        }
        line_texts.join(" ").trim().to_string()
    }

    fn layout_line(&self, line: &[LineItem<'_>]) -> String {
        let widths: Vec<f32> = line
            .iter()
            .filter(|i| !i.is_space)
            .map(|i| i.char_width)
            .collect();
        let median_width = median(&widths, 1.0);
        let gaps: Vec<f32> = line
            .windows(2)
            .map(|pair| pair[1].bbox.left - pair[0].bbox.right)
            .filter(|gap| *gap >= 0.0)
            .collect();
        let threshold = self.estimator.estimate(&gaps, median_width);
        log::trace!(
            "Line of {} items: median width {:.2}, gap threshold {:.2} ({:?})",
            line.len(),
            median_width,
            threshold.value,
            threshold.source
        );
        let min_space_width = median_width * self.config.space_width_ratio;

        let mut out = String::new();
        let mut prev: Option<&BBox> = None;
        let mut pending_space: Option<f32> = None;
        for item in line {
            if item.is_space {
                let width = pending_space.unwrap_or(0.0).max(item.bbox.width());
                pending_space = Some(width);
                continue;
            }
            match (prev, pending_space.take()) {
                (_, Some(space_width)) => {
                    if space_width >= min_space_width {
                        out.push(' ');
                    }
                },
                (Some(prev_bbox), None) => {
                    if item.bbox.left - prev_bbox.right > threshold.value {
                        out.push(' ');
                    }
                },
                (None, None) => {},
            }
            out.push_str(item.text);
            prev = Some(&item.bbox);
        }
        out
    }
}
