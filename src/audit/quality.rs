//! Heuristic quality score for rendered Markdown.
//!
//! Used to rank competing backend probes: fragmented short lines, repeated
//! boilerplate and stray control characters all lower the score.

use std::collections::HashMap;
use std::fmt;

const BASE_SCORE: i64 = 100;
const SHORT_LINE_PENALTY: i64 = 5;
const REPEATED_LINE_PENALTY: i64 = 2;
const SHORT_LINE_MAX_CHARS: usize = 4;
const REPEATED_LINE_MIN_CHARS: usize = 6;
const REPEATED_LINE_MIN_COUNT: usize = 3;

/// Score and penalty counts for one rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QualityReport {
    /// Final score in `0..=100`
    pub score: u32,
    /// Lines of at most four non-space characters containing a letter
    pub short_line_count: usize,
    /// Distinct lines seen three or more times
    pub repeated_line_count: usize,
    /// Control characters other than newline and tab
    pub control_char_count: usize,
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "score={} short_lines={} repeated_lines={} control_chars={}",
            self.score, self.short_line_count, self.repeated_line_count, self.control_char_count
        )
    }
}

/// Lines that never count as repeated: blanks, placeholders and headings.
fn is_noise_line(line: &str) -> bool {
    line.is_empty()
        || line.starts_with("<!-- image")
        || line.starts_with("<!-- page break")
        || line.starts_with('#')
}

/// Score a Markdown rendering.
///
/// # Examples
///
/// ```
/// use pdf_spacefix::audit::quality::score_markdown;
///
/// let clean = score_markdown("# Raport\n\nVeniturile au crescut.");
/// assert_eq!(clean.score, 100);
///
/// let broken = score_markdown("Ve\nnit\nuri");
/// assert_eq!(broken.short_line_count, 3);
/// assert_eq!(broken.score, 85);
/// ```
pub fn score_markdown(text: &str) -> QualityReport {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    let short_line_count = lines
        .iter()
        .filter(|line| {
            !line.is_empty()
                && line.chars().filter(|c| *c != ' ').count() <= SHORT_LINE_MAX_CHARS
                && line.chars().any(char::is_alphabetic)
        })
        .count();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for line in &lines {
        if line.chars().count() >= REPEATED_LINE_MIN_CHARS && !is_noise_line(line) {
            *counts.entry(line.to_lowercase()).or_insert(0) += 1;
        }
    }
    let repeated_line_count = counts
        .values()
        .filter(|&&count| count >= REPEATED_LINE_MIN_COUNT)
        .count();

    let control_char_count = text
        .chars()
        .filter(|&c| (c as u32) < 32 && c != '\n' && c != '\t')
        .count();

    let score = BASE_SCORE
        - SHORT_LINE_PENALTY * short_line_count as i64
        - REPEATED_LINE_PENALTY * repeated_line_count as i64
        - control_char_count as i64;

    QualityReport {
        score: score.max(0) as u32,
        short_line_count,
        repeated_line_count,
        control_char_count,
    }
}

/// Pick the best-scoring probe. Ties go to the earliest probe.
///
/// # Examples
///
/// ```
/// use pdf_spacefix::audit::quality::{score_markdown, select_best_probe};
///
/// let probes = vec![
///     ("fast", score_markdown("a\nb\nc")),
///     ("layout", score_markdown("Text curat pe un rand.")),
/// ];
/// assert_eq!(select_best_probe(&probes).map(|(name, _)| *name), Some("layout"));
/// ```
pub fn select_best_probe<K>(probes: &[(K, QualityReport)]) -> Option<&(K, QualityReport)> {
    let best = probes
        .iter()
        .fold(None, |best: Option<&(K, QualityReport)>, probe| match best {
            Some(current) if current.1.score >= probe.1.score => Some(current),
            _ => Some(probe),
        });
    if let Some((_, report)) = best {
        log::info!("Best probe: {}", report);
    }
    best
}
