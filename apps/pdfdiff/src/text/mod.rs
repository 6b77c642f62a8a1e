//! Text similarity
//!
//! Scores two extracted page texts with the Ratcliff/Obershelp ratio
//! `2 * M / T`, where `M` is the length matched by longest-match-first
//! alignment and `T` the combined length in characters.

mod matcher;

use std::fmt;

use serde::Serialize;

pub use matcher::{MatchingBlock, SequenceMatcher};

/// Outcome of a text comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextMatchResult {
    /// Similarity in `[0, 1]`
    pub ratio: f64,
    /// `ratio == 1.0`
    pub is_exact: bool,
}

impl TextMatchResult {
    pub fn from_ratio(ratio: f64) -> Self {
        Self {
            ratio,
            is_exact: ratio == 1.0,
        }
    }

    /// Ratio as a percentage
    pub fn percent(&self) -> f64 {
        self.ratio * 100.0
    }
}

impl fmt::Display for TextMatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Match: {:.2}%", self.percent())
    }
}

/// Text comparer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextDiffer {
    /// Ignore characters that make up more than 1% of a long second text
    /// when picking match anchors.
    pub autojunk: bool,
}

impl TextDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_autojunk(mut self, autojunk: bool) -> Self {
        self.autojunk = autojunk;
        self
    }

    pub fn ratio(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        SequenceMatcher::new(&a, &b, self.autojunk).ratio()
    }

    pub fn compare(&self, a: &str, b: &str) -> TextMatchResult {
        let result = TextMatchResult::from_ratio(self.ratio(a, b));
        tracing::trace!(
            left_len = a.len(),
            right_len = b.len(),
            ratio = result.ratio,
            "Text compared"
        );
        result
    }

    /// Matched runs between `a` and `b`, in character offsets
    pub fn matching_blocks(&self, a: &str, b: &str) -> Vec<MatchingBlock> {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        SequenceMatcher::new(&a, &b, self.autojunk).matching_blocks()
    }
}

/// Similarity ratio of two strings with default options
pub fn compare_text(a: &str, b: &str) -> f64 {
    TextDiffer::default().ratio(a, b)
}
