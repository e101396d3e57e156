//! A slice of document lines as a flat sequence of characters.

use crate::algorithms::Sequence;
use crate::geometry::{OffsetRange, Position, TextRange};

/// A view of a range of lines as a flat character sequence with `\n`
/// separators, usable as kernel input for character level refinement.
///
/// The view keeps per-line offset tables so that any flat offset can be
/// translated back into a 1-based `(line, column)` position of the
/// underlying document, also when whitespace trimming removed characters
/// from the flat text.
#[derive(Debug)]
pub struct CharSliceSequence {
    line_range: OffsetRange,
    elements: Vec<char>,
    /// Element offset at which each line of the slice begins.  Carries one
    /// extra trailing entry whenever the slice ends in a separator.
    first_char_offset_by_line: Vec<usize>,
    /// Count of characters trimmed from the front of each line.
    additional_offset_by_line: Vec<usize>,
}

impl CharSliceSequence {
    /// Creates the view over `lines[line_range]`.
    ///
    /// When `consider_whitespace_changes` is false every line contributes
    /// its trimmed text.  A slice that ends at the end of the document but
    /// does not start at its beginning is extended one line backwards with
    /// that line fully trimmed away; this keeps the number of separators at
    /// one per line of the requested range, so that diffing against an
    /// empty slice still aligns on line boundaries.
    pub fn new(
        lines: &[&str],
        line_range: OffsetRange,
        consider_whitespace_changes: bool,
    ) -> CharSliceSequence {
        let mut line_range = line_range;
        let mut trim_first_line_fully = false;
        if line_range.start > 0 && line_range.end >= lines.len() {
            line_range = OffsetRange::new(line_range.start - 1, line_range.end);
            trim_first_line_fully = true;
        }

        let mut elements: Vec<char> = Vec::new();
        let mut first_char_offset_by_line = vec![0];
        let mut additional_offset_by_line = Vec::new();

        for i in line_range.start..line_range.end {
            let mut line = lines[i];
            let mut offset = 0;
            if trim_first_line_fully {
                offset = line.chars().count();
                line = "";
                trim_first_line_fully = false;
            } else if !consider_whitespace_changes {
                let trimmed_start = line.trim_start();
                offset = line.chars().count() - trimmed_start.chars().count();
                line = trimmed_start.trim_end();
            }
            additional_offset_by_line.push(offset);
            elements.extend(line.chars());

            // Don't add a separator that does not exist in the document.
            if i < lines.len() - 1 {
                elements.push('\n');
                first_char_offset_by_line.push(elements.len());
            }
        }
        // To account for the position after the last line.
        additional_offset_by_line.push(0);

        CharSliceSequence {
            line_range,
            elements,
            first_char_offset_by_line,
            additional_offset_by_line,
        }
    }

    /// Translates a flat offset in `[0, len]` into a document position.
    pub fn translate_offset(&self, offset: usize) -> Position {
        if self.line_range.is_empty() {
            return Position::new(self.line_range.start + 1, 1);
        }
        let i = self
            .first_char_offset_by_line
            .partition_point(|&first| first <= offset)
            - 1;
        Position::new(
            self.line_range.start + i + 1,
            offset - self.first_char_offset_by_line[i] + self.additional_offset_by_line[i] + 1,
        )
    }

    /// Translates a flat offset range into a document range.
    pub fn translate_range(&self, range: OffsetRange) -> TextRange {
        TextRange::new(
            self.translate_offset(range.start),
            self.translate_offset(range.end),
        )
    }

    /// The maximal run of word characters containing `offset`, if any.
    pub fn find_word_containing(&self, offset: usize) -> Option<OffsetRange> {
        if offset >= self.elements.len() || !is_word_char(self.elements[offset]) {
            return None;
        }
        let mut start = offset;
        while start > 0 && is_word_char(self.elements[start - 1]) {
            start -= 1;
        }
        let mut end = offset;
        while end < self.elements.len() && is_word_char(self.elements[end]) {
            end += 1;
        }
        Some(OffsetRange::new(start, end))
    }

    /// Widens a range to the smallest enclosing range whose endpoints sit
    /// on line boundaries.
    pub fn extend_to_full_lines(&self, range: OffsetRange) -> OffsetRange {
        let start_idx = self
            .first_char_offset_by_line
            .partition_point(|&first| first <= range.start);
        let start = if start_idx == 0 {
            0
        } else {
            self.first_char_offset_by_line[start_idx - 1]
        };
        let end_idx = self
            .first_char_offset_by_line
            .partition_point(|&first| first < range.end);
        let end = self
            .first_char_offset_by_line
            .get(end_idx)
            .copied()
            .unwrap_or(self.elements.len());
        OffsetRange::new(start, end)
    }

    /// The number of separators crossed by the range.
    pub fn count_lines_in(&self, range: OffsetRange) -> usize {
        self.translate_offset(range.end).line - self.translate_offset(range.start).line
    }

    /// The flat text of the range.
    pub fn text_between(&self, range: OffsetRange) -> String {
        self.elements[range.start..range.end].iter().collect()
    }
}

impl Sequence for CharSliceSequence {
    fn len(&self) -> usize {
        self.elements.len()
    }

    fn element(&self, offset: usize) -> usize {
        self.elements[offset] as usize
    }

    fn boundary_score(&self, offset: usize) -> isize {
        let prev_category = char_category(if offset > 0 {
            self.elements.get(offset - 1).copied()
        } else {
            None
        });
        let next_category = char_category(self.elements.get(offset).copied());

        if prev_category == CharCategory::LineBreakCr && next_category == CharCategory::LineBreakLf
        {
            // Never split between \r and \n.
            return 0;
        }

        let mut score = 0;
        if prev_category != next_category {
            score += 10;
            if next_category == CharCategory::WordUpper {
                score += 1;
            }
        }
        score += category_boundary_score(prev_category);
        score += category_boundary_score(next_category);
        score
    }

    fn is_strongly_equal(&self, offset1: usize, offset2: usize) -> bool {
        match (self.elements.get(offset1), self.elements.get(offset2)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharCategory {
    WordLower,
    WordUpper,
    WordNumber,
    Space,
    Other,
    LineBreakCr,
    LineBreakLf,
    /// Out of range.
    End,
}

fn char_category(c: Option<char>) -> CharCategory {
    match c {
        None => CharCategory::End,
        Some('\r') => CharCategory::LineBreakCr,
        Some('\n') => CharCategory::LineBreakLf,
        Some(c) if c.is_ascii_lowercase() => CharCategory::WordLower,
        Some(c) if c.is_ascii_uppercase() => CharCategory::WordUpper,
        Some(c) if c.is_ascii_digit() => CharCategory::WordNumber,
        Some(c) if c.is_whitespace() => CharCategory::Space,
        Some(_) => CharCategory::Other,
    }
}

fn category_boundary_score(category: CharCategory) -> isize {
    match category {
        CharCategory::WordLower | CharCategory::WordUpper | CharCategory::WordNumber => 0,
        CharCategory::Other => 2,
        CharCategory::Space => 3,
        CharCategory::LineBreakCr | CharCategory::LineBreakLf => 10,
        CharCategory::End => 10,
    }
}
