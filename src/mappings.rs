//! The value types making up a diff result.
//!
//! A diff is described on three levels: [`SequenceDiff`]s pair up raw
//! offset ranges of two abstract sequences, [`RangeMapping`]s pair up
//! position ranges of two documents, and [`DetailedLineRangeMapping`]s
//! group character level mappings under a line level hunk.  Moved blocks
//! are reported separately as [`MovedText`]s.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{LineRange, OffsetRange, TextRange};

/// A pair of offsets, one per sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetPair {
    pub offset1: usize,
    pub offset2: usize,
}

impl OffsetPair {
    pub const ZERO: OffsetPair = OffsetPair {
        offset1: 0,
        offset2: 0,
    };
    pub const MAX: OffsetPair = OffsetPair {
        offset1: usize::MAX,
        offset2: usize::MAX,
    };

    pub fn new(offset1: usize, offset2: usize) -> OffsetPair {
        OffsetPair { offset1, offset2 }
    }
}

/// A differing region between two sequences, as a pair of half open offset
/// ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceDiff {
    pub seq1: OffsetRange,
    pub seq2: OffsetRange,
}

impl SequenceDiff {
    pub fn new(seq1: OffsetRange, seq2: OffsetRange) -> SequenceDiff {
        SequenceDiff { seq1, seq2 }
    }

    /// The diff spanning from one offset pair to another.
    pub fn from_offset_pairs(start: OffsetPair, end: OffsetPair) -> SequenceDiff {
        SequenceDiff {
            seq1: OffsetRange::new(start.offset1, end.offset1),
            seq2: OffsetRange::new(start.offset2, end.offset2),
        }
    }

    pub fn starts(&self) -> OffsetPair {
        OffsetPair::new(self.seq1.start, self.seq2.start)
    }

    pub fn ends(&self) -> OffsetPair {
        OffsetPair::new(self.seq1.end, self.seq2.end)
    }

    /// Swaps the two sides.
    pub fn swap(&self) -> SequenceDiff {
        SequenceDiff {
            seq1: self.seq2,
            seq2: self.seq1,
        }
    }

    /// The smallest diff containing both diffs.
    pub fn join(&self, other: SequenceDiff) -> SequenceDiff {
        SequenceDiff {
            seq1: self.seq1.join(other.seq1),
            seq2: self.seq2.join(other.seq2),
        }
    }

    /// Restricts the diff to the given diff on both sides.
    pub fn intersect(&self, other: SequenceDiff) -> Option<SequenceDiff> {
        let seq1 = self.seq1.intersect(other.seq1)?;
        let seq2 = self.seq2.intersect(other.seq2)?;
        Some(SequenceDiff { seq1, seq2 })
    }

    pub fn delta(&self, offset: isize) -> SequenceDiff {
        SequenceDiff {
            seq1: self.seq1.delta(offset),
            seq2: self.seq2.delta(offset),
        }
    }

    pub fn delta_start(&self, offset: isize) -> SequenceDiff {
        SequenceDiff {
            seq1: self.seq1.delta_start(offset),
            seq2: self.seq2.delta_start(offset),
        }
    }

    pub fn delta_end(&self, offset: isize) -> SequenceDiff {
        SequenceDiff {
            seq1: self.seq1.delta_end(offset),
            seq2: self.seq2.delta_end(offset),
        }
    }
}

impl fmt::Display for SequenceDiff {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} <-> {}", self.seq1, self.seq2)
    }
}

/// A pair of position ranges asserting that the original range should be
/// replaced with the modified range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RangeMapping {
    pub original: TextRange,
    pub modified: TextRange,
}

impl RangeMapping {
    pub fn new(original: TextRange, modified: TextRange) -> RangeMapping {
        RangeMapping { original, modified }
    }

    /// The mapping in the opposite direction.
    pub fn flip(&self) -> RangeMapping {
        RangeMapping {
            original: self.modified,
            modified: self.original,
        }
    }
}

impl fmt::Display for RangeMapping {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{{} -> {}}}", self.original, self.modified)
    }
}

/// A pair of line ranges asserting that the original lines should be
/// replaced with the modified lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineRangeMapping {
    pub original: LineRange,
    pub modified: LineRange,
}

impl LineRangeMapping {
    pub fn new(original: LineRange, modified: LineRange) -> LineRangeMapping {
        LineRangeMapping { original, modified }
    }

    pub fn join(&self, other: LineRangeMapping) -> LineRangeMapping {
        LineRangeMapping {
            original: self.original.join(other.original),
            modified: self.modified.join(other.modified),
        }
    }

    pub fn flip(&self) -> LineRangeMapping {
        LineRangeMapping {
            original: self.modified,
            modified: self.original,
        }
    }
}

impl fmt::Display for LineRangeMapping {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{{} -> {}}}", self.original, self.modified)
    }
}

/// A line level hunk together with the character level mappings inside it.
///
/// The inner mappings are ordered and contained in the outer line ranges.
/// They are empty only for hunks whose two sides carry identical text,
/// which happens for refined moves.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetailedLineRangeMapping {
    pub original: LineRange,
    pub modified: LineRange,
    pub inner: Vec<RangeMapping>,
}

impl DetailedLineRangeMapping {
    pub fn new(
        original: LineRange,
        modified: LineRange,
        inner: Vec<RangeMapping>,
    ) -> DetailedLineRangeMapping {
        DetailedLineRangeMapping {
            original,
            modified,
            inner,
        }
    }

    pub fn line_range_mapping(&self) -> LineRangeMapping {
        LineRangeMapping::new(self.original, self.modified)
    }

    pub fn flip(&self) -> DetailedLineRangeMapping {
        DetailedLineRangeMapping {
            original: self.modified,
            modified: self.original,
            inner: self.inner.iter().map(|m| m.flip()).collect(),
        }
    }
}

impl fmt::Display for DetailedLineRangeMapping {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{{} -> {}}}", self.original, self.modified)
    }
}

/// A block of lines that was relocated rather than edited.
///
/// The original and modified line ranges have equal length; the inner
/// changes describe the (usually small) edits within the moved block.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MovedText {
    mapping: LineRangeMapping,
    changes: Vec<DetailedLineRangeMapping>,
}

impl MovedText {
    pub fn new(mapping: LineRangeMapping, changes: Vec<DetailedLineRangeMapping>) -> MovedText {
        debug_assert!(
            mapping.original.len() == mapping.modified.len(),
            "moves are shape preserving"
        );
        MovedText { mapping, changes }
    }

    /// The relocated line ranges.
    pub fn line_range_mapping(&self) -> LineRangeMapping {
        self.mapping
    }

    /// The edits within the moved block.
    pub fn changes(&self) -> &[DetailedLineRangeMapping] {
        &self.changes
    }
}

/// The result of a diff computation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinesDiff {
    /// The changes, strictly ordered on both sides with at least one
    /// unchanged line between any two of them.
    pub changes: Vec<DetailedLineRangeMapping>,
    /// Detected moves.  Empty unless move computation was requested.
    pub moves: Vec<MovedText>,
    /// `true` if the time budget expired and the result is degraded.
    pub hit_timeout: bool,
}

impl LinesDiff {
    pub fn new(
        changes: Vec<DetailedLineRangeMapping>,
        moves: Vec<MovedText>,
        hit_timeout: bool,
    ) -> LinesDiff {
        LinesDiff {
            changes,
            moves,
            hit_timeout,
        }
    }

    /// `true` if the documents are identical.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.moves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Position;

    #[test]
    fn test_sequence_diff_join_and_swap() {
        let a = SequenceDiff::new(OffsetRange::new(0, 2), OffsetRange::new(1, 1));
        let b = SequenceDiff::new(OffsetRange::new(4, 5), OffsetRange::new(2, 6));
        assert_eq!(
            a.join(b),
            SequenceDiff::new(OffsetRange::new(0, 5), OffsetRange::new(1, 6))
        );
        assert_eq!(a.swap().seq1, a.seq2);
    }

    #[test]
    fn test_sequence_diff_intersect() {
        let a = SequenceDiff::new(OffsetRange::new(0, 4), OffsetRange::new(0, 4));
        let clamp = SequenceDiff::from_offset_pairs(OffsetPair::new(2, 1), OffsetPair::MAX);
        assert_eq!(
            a.intersect(clamp),
            Some(SequenceDiff::new(
                OffsetRange::new(2, 4),
                OffsetRange::new(1, 4)
            ))
        );
    }

    #[test]
    fn test_range_mapping_flip() {
        let m = RangeMapping::new(
            TextRange::new(Position::new(1, 1), Position::new(1, 3)),
            TextRange::new(Position::new(2, 1), Position::new(2, 1)),
        );
        assert_eq!(m.flip().flip(), m);
        assert_eq!(m.to_string(), "{[1:1, 1:3) -> [2:1, 2:1)}");
    }
}
