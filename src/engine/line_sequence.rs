//! A document as a sequence of per-line hashes.

use crate::algorithms::Sequence;
use crate::geometry::OffsetRange;

/// A view of a document as one element per line.
///
/// Elements are perfect hashes of the *trimmed* line text, so lines that
/// differ only in leading or trailing whitespace compare equal at this
/// level.  [`Sequence::is_strongly_equal`] still compares the untrimmed
/// text, which the optimization passes use to avoid shifting diffs across
/// whitespace-only differences.
#[derive(Debug)]
pub struct LineSequence<'a> {
    trimmed_hashes: Vec<usize>,
    lines: &'a [&'a str],
}

impl<'a> LineSequence<'a> {
    pub fn new(trimmed_hashes: Vec<usize>, lines: &'a [&'a str]) -> LineSequence<'a> {
        debug_assert_eq!(trimmed_hashes.len(), lines.len());
        LineSequence {
            trimmed_hashes,
            lines,
        }
    }

    /// The text of the lines in `range`, joined with `\n`.
    pub fn text_between(&self, range: OffsetRange) -> String {
        self.lines[range.start..range.end].join("\n")
    }
}

impl<'a> Sequence for LineSequence<'a> {
    fn len(&self) -> usize {
        self.lines.len()
    }

    fn element(&self, offset: usize) -> usize {
        self.trimmed_hashes[offset]
    }

    /// Prefers boundaries next to lines with low indentation, where blocks
    /// typically begin and end.
    fn boundary_score(&self, offset: usize) -> isize {
        let indentation_before = if offset == 0 {
            0
        } else {
            indentation(self.lines[offset - 1])
        };
        let indentation_after = if offset == self.lines.len() {
            0
        } else {
            indentation(self.lines[offset])
        };
        1000 - (indentation_before + indentation_after) as isize
    }

    fn is_strongly_equal(&self, offset1: usize, offset2: usize) -> bool {
        self.lines[offset1] == self.lines[offset2]
    }
}

fn indentation(line: &str) -> usize {
    line.chars().take_while(|&c| c == ' ' || c == '\t').count()
}
