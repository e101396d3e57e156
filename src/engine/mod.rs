//! The diff engine.
//!
//! [`compute_diff`] turns two documents, given as line arrays, into a
//! [`LinesDiff`]: ordered line range mappings with character level inner
//! mappings, plus optionally a list of moved blocks.  The pipeline is
//! line alignment (kernel selected by size), heuristic post-processing,
//! character level refinement of each hunk, aggregation back to line
//! ranges, and move detection.
//!
//! Everything is synchronous and deterministic; a wall-clock deadline can
//! degrade the result (flagged via [`LinesDiff::hit_timeout`]) but never
//! fails it.

pub(crate) mod char_sequence;
pub(crate) mod line_sequence;
pub(crate) mod moves;
pub(crate) mod optimize;

use std::collections::HashMap;

use crate::algorithms::{dynamic, myers, Sequence};
use crate::deadline::{millis_to_deadline, Deadline};
use crate::engine::char_sequence::CharSliceSequence;
use crate::engine::line_sequence::LineSequence;
use crate::geometry::{LineRange, OffsetRange, Position, TextRange};
use crate::mappings::{
    DetailedLineRangeMapping, LinesDiff, MovedText, RangeMapping, SequenceDiff,
};

/// Options for [`compute_diff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOptions {
    /// When true, lines that differ only in leading or trailing
    /// whitespace are treated as equal and not refined further.
    pub ignore_trim_whitespace: bool,
    /// When true, move detection runs and fills [`LinesDiff::moves`].
    pub compute_moves: bool,
    /// Time budget in milliseconds; `0` means no limit.
    pub max_computation_time_ms: u64,
}

impl Default for DiffOptions {
    fn default() -> DiffOptions {
        DiffOptions {
            ignore_trim_whitespace: true,
            compute_moves: false,
            max_computation_time_ms: 0,
        }
    }
}

/// Below this combined line count the line alignment uses the dynamic
/// programming kernel, above it Myers.
const MYERS_LINE_CUTOFF: usize = 1700;
/// Same cutoff for the character level refinement kernels.
const DYNAMIC_CHAR_CUTOFF: usize = 500;
/// Alignment score of two equal empty lines.  Kept low so that the
/// dynamic kernel does not anchor alignments on arbitrary blank lines.
const EMPTY_LINE_ALIGNMENT_SCORE: f64 = 0.1;

/// Diffs two documents given as line arrays.
///
/// An empty slice is treated as the single-empty-line document.  The
/// returned changes are ordered on both sides with at least one unchanged
/// line between any two of them.
pub fn compute_diff(
    original_lines: &[&str],
    modified_lines: &[&str],
    options: &DiffOptions,
) -> LinesDiff {
    let original_lines = if original_lines.is_empty() {
        &[""][..]
    } else {
        original_lines
    };
    let modified_lines = if modified_lines.is_empty() {
        &[""][..]
    } else {
        modified_lines
    };

    if original_lines.len() <= 1 && original_lines == modified_lines {
        return LinesDiff::new(Vec::new(), Vec::new(), false);
    }

    // A single empty line on either side: everything maps onto
    // everything, no alignment worth computing.
    if (original_lines.len() == 1 && original_lines[0].is_empty())
        || (modified_lines.len() == 1 && modified_lines[0].is_empty())
    {
        return LinesDiff::new(
            vec![DetailedLineRangeMapping::new(
                LineRange::of_document(original_lines.len()),
                LineRange::of_document(modified_lines.len()),
                vec![RangeMapping::new(
                    whole_document_range(original_lines),
                    whole_document_range(modified_lines),
                )],
            )],
            Vec::new(),
            false,
        );
    }

    let deadline = millis_to_deadline(options.max_computation_time_ms);
    let consider_whitespace_changes = !options.ignore_trim_whitespace;

    // One perfect hash table shared by both documents: equal ids iff the
    // trimmed line texts are equal.
    let mut perfect_hashes: HashMap<&str, usize> = HashMap::new();
    let original_hashes: Vec<usize> = original_lines
        .iter()
        .map(|l| {
            let text = l.trim();
            let next = perfect_hashes.len();
            *perfect_hashes.entry(text).or_insert(next)
        })
        .collect();
    let modified_hashes: Vec<usize> = modified_lines
        .iter()
        .map(|l| {
            let text = l.trim();
            let next = perfect_hashes.len();
            *perfect_hashes.entry(text).or_insert(next)
        })
        .collect();

    let sequence1 = LineSequence::new(original_hashes.clone(), original_lines);
    let sequence2 = LineSequence::new(modified_hashes.clone(), modified_lines);

    let line_result = if sequence1.len() + sequence2.len() < MYERS_LINE_CUTOFF {
        dynamic::compute_with_score(&sequence1, &sequence2, deadline, |offset1, offset2| {
            if original_lines[offset1] == modified_lines[offset2] {
                if modified_lines[offset2].is_empty() {
                    EMPTY_LINE_ALIGNMENT_SCORE
                } else {
                    1.0 + (1.0 + modified_lines[offset2].chars().count() as f64).ln()
                }
            } else {
                // Trimmed-equal but not equal: almost as good as a match.
                0.99
            }
        })
    } else {
        myers::compute(&sequence1, &sequence2, deadline)
    };

    let mut hit_timeout = line_result.hit_timeout;
    let line_diffs = optimize::optimize_sequence_diffs(&sequence1, &sequence2, line_result.diffs);
    let line_diffs = optimize::remove_random_line_matches(&sequence1, line_diffs);

    let mut alignments: Vec<RangeMapping> = Vec::new();
    let mut seq1_last_start = 0;
    let mut seq2_last_start = 0;

    for diff in &line_diffs {
        debug_assert_eq!(
            diff.seq1.start - seq1_last_start,
            diff.seq2.start - seq2_last_start
        );
        let equal_lines_count = diff.seq1.start - seq1_last_start;

        if consider_whitespace_changes {
            scan_for_whitespace_changes(
                original_lines,
                modified_lines,
                seq1_last_start,
                seq2_last_start,
                equal_lines_count,
                deadline,
                &mut alignments,
                &mut hit_timeout,
            );
        }

        seq1_last_start = diff.seq1.end;
        seq2_last_start = diff.seq2.end;

        let refined = refine_diff(
            original_lines,
            modified_lines,
            *diff,
            deadline,
            consider_whitespace_changes,
        );
        if refined.hit_timeout {
            hit_timeout = true;
        }
        alignments.extend(refined.mappings);
    }
    if consider_whitespace_changes {
        scan_for_whitespace_changes(
            original_lines,
            modified_lines,
            seq1_last_start,
            seq2_last_start,
            original_lines.len() - seq1_last_start,
            deadline,
            &mut alignments,
            &mut hit_timeout,
        );
    }

    let changes =
        line_range_mappings_from_range_mappings(&alignments, original_lines, modified_lines, false);

    let moves = if options.compute_moves {
        compute_moves(
            &changes,
            original_lines,
            modified_lines,
            &original_hashes,
            &modified_hashes,
            deadline,
            consider_whitespace_changes,
        )
    } else {
        Vec::new()
    };

    debug_assert!(validate_result(&changes, original_lines, modified_lines));

    LinesDiff::new(changes, moves, hit_timeout)
}

/// Diffs two documents given as text, splitting them into lines first.
///
/// Both `\n` and `\r\n` terminate lines; a trailing terminator yields a
/// final empty line, matching the line model of [`compute_diff`].
pub fn compute_diff_from_text(original: &str, modified: &str, options: &DiffOptions) -> LinesDiff {
    let original_lines = split_lines(original);
    let modified_lines = split_lines(modified);
    compute_diff(&original_lines, &modified_lines, options)
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

fn whole_document_range(lines: &[&str]) -> TextRange {
    TextRange::new(
        Position::new(1, 1),
        Position::new(lines.len(), lines[lines.len() - 1].chars().count() + 1),
    )
}

/// Within a run of trimmed-equal lines, refines every pair that differs
/// in whitespace into character mappings.
#[allow(clippy::too_many_arguments)]
fn scan_for_whitespace_changes(
    original_lines: &[&str],
    modified_lines: &[&str],
    seq1_start: usize,
    seq2_start: usize,
    equal_lines_count: usize,
    deadline: Deadline,
    alignments: &mut Vec<RangeMapping>,
    hit_timeout: &mut bool,
) {
    for i in 0..equal_lines_count {
        let seq1_offset = seq1_start + i;
        let seq2_offset = seq2_start + i;
        if original_lines[seq1_offset] != modified_lines[seq2_offset] {
            let refined = refine_diff(
                original_lines,
                modified_lines,
                SequenceDiff::new(
                    OffsetRange::new(seq1_offset, seq1_offset + 1),
                    OffsetRange::new(seq2_offset, seq2_offset + 1),
                ),
                deadline,
                true,
            );
            alignments.extend(refined.mappings);
            if refined.hit_timeout {
                *hit_timeout = true;
            }
        }
    }
}

struct RefineResult {
    mappings: Vec<RangeMapping>,
    hit_timeout: bool,
}

/// Refines one line level hunk into character level mappings.
fn refine_diff(
    original_lines: &[&str],
    modified_lines: &[&str],
    diff: SequenceDiff,
    deadline: Deadline,
    consider_whitespace_changes: bool,
) -> RefineResult {
    let slice1 = CharSliceSequence::new(original_lines, diff.seq1, consider_whitespace_changes);
    let slice2 = CharSliceSequence::new(modified_lines, diff.seq2, consider_whitespace_changes);

    let result = if slice1.len() + slice2.len() < DYNAMIC_CHAR_CUTOFF {
        dynamic::compute(&slice1, &slice2, deadline)
    } else {
        myers::compute(&slice1, &slice2, deadline)
    };

    let diffs = optimize::optimize_sequence_diffs(&slice1, &slice2, result.diffs);
    let diffs = optimize::cover_full_words(&slice1, &slice2, diffs);
    let diffs = optimize::remove_short_matches(diffs);
    let diffs = optimize::remove_random_matches(&slice1, &slice2, diffs);

    let mappings = diffs
        .iter()
        .map(|d| {
            RangeMapping::new(slice1.translate_range(d.seq1), slice2.translate_range(d.seq2))
        })
        .collect();

    RefineResult {
        mappings,
        hit_timeout: result.hit_timeout,
    }
}

#[allow(clippy::too_many_arguments)]
fn compute_moves(
    changes: &[DetailedLineRangeMapping],
    original_lines: &[&str],
    modified_lines: &[&str],
    original_hashes: &[usize],
    modified_hashes: &[usize],
    deadline: Deadline,
    consider_whitespace_changes: bool,
) -> Vec<MovedText> {
    let line_mappings: Vec<_> = changes.iter().map(|c| c.line_range_mapping()).collect();
    let moved = moves::compute_moved_lines(
        &line_mappings,
        original_lines,
        modified_lines,
        original_hashes,
        modified_hashes,
        deadline,
    );

    moved
        .into_iter()
        .map(|mapping| {
            let refined = refine_diff(
                original_lines,
                modified_lines,
                SequenceDiff::new(
                    mapping.original.to_offset_range(),
                    mapping.modified.to_offset_range(),
                ),
                deadline,
                consider_whitespace_changes,
            );
            let changes = line_range_mappings_from_range_mappings(
                &refined.mappings,
                original_lines,
                modified_lines,
                true,
            );
            MovedText::new(mapping, changes)
        })
        .collect()
}

/// Groups character mappings into line level changes.
///
/// Mappings whose derived line ranges overlap or touch on either side
/// collapse into one change spanning their joined ranges.
fn line_range_mappings_from_range_mappings(
    alignments: &[RangeMapping],
    original_lines: &[&str],
    modified_lines: &[&str],
    allow_start_mismatch: bool,
) -> Vec<DetailedLineRangeMapping> {
    let mut changes: Vec<DetailedLineRangeMapping> = Vec::new();
    for mapping in alignments {
        let (original, modified) = line_ranges_of(mapping, original_lines, modified_lines);
        match changes.last_mut() {
            Some(last)
                if last.original.overlap_or_touch(original)
                    || last.modified.overlap_or_touch(modified) =>
            {
                last.original = last.original.join(original);
                last.modified = last.modified.join(modified);
                last.inner.push(*mapping);
            }
            _ => changes.push(DetailedLineRangeMapping::new(
                original,
                modified,
                vec![*mapping],
            )),
        }
    }

    debug_assert!(
        allow_start_mismatch
            || check_line_mapping_invariants(&changes, original_lines, modified_lines)
    );
    changes
}

/// Derives the line ranges covered by a character mapping.
fn line_ranges_of(
    mapping: &RangeMapping,
    original_lines: &[&str],
    modified_lines: &[&str],
) -> (LineRange, LineRange) {
    let original = &mapping.original;
    let modified = &mapping.modified;

    let mut line_start_delta = 0usize;
    let mut line_end_delta = 0isize;

    // Both sides end before their line's first character: the trailing
    // separator is unchanged and does not belong to the change.
    if modified.end.column == 1
        && original.end.column == 1
        && original.start.line <= original.end.line
        && modified.start.line <= modified.end.line
    {
        line_end_delta = -1;
    }

    // Both sides start past their line's last character: the leading
    // separator is unchanged as well.  Only applied while the ranges stay
    // non-empty.
    if modified.start.column - 1 >= modified_lines[modified.start.line - 1].chars().count()
        && original.start.column - 1 >= original_lines[original.start.line - 1].chars().count()
        && original.start.line as isize <= original.end.line as isize + line_end_delta
        && modified.start.line as isize <= modified.end.line as isize + line_end_delta
    {
        line_start_delta = 1;
    }

    let original_range = LineRange::new(
        original.start.line + line_start_delta,
        (original.end.line as isize + 1 + line_end_delta) as usize,
    );
    let modified_range = LineRange::new(
        modified.start.line + line_start_delta,
        (modified.end.line as isize + 1 + line_end_delta) as usize,
    );
    (original_range, modified_range)
}

fn check_line_mapping_invariants(
    changes: &[DetailedLineRangeMapping],
    original_lines: &[&str],
    modified_lines: &[&str],
) -> bool {
    if let (Some(first), Some(last)) = (changes.first(), changes.last()) {
        if first.original.start != first.modified.start {
            return false;
        }
        if original_lines.len() as isize - last.original.end as isize
            != modified_lines.len() as isize - last.modified.end as isize
        {
            return false;
        }
    }
    changes.windows(2).all(|pair| {
        let (m1, m2) = (&pair[0], &pair[1]);
        // Equal unchanged line counts on both sides, and at least one
        // unchanged line in between.
        m1.original.end < m2.original.start
            && m1.modified.end < m2.modified.start
            && m2.original.start - m1.original.end == m2.modified.start - m1.modified.end
    })
}

fn validate_result(
    changes: &[DetailedLineRangeMapping],
    original_lines: &[&str],
    modified_lines: &[&str],
) -> bool {
    fn valid_position(pos: Position, lines: &[&str]) -> bool {
        pos.line >= 1
            && pos.line <= lines.len()
            && pos.column >= 1
            && pos.column <= lines[pos.line - 1].chars().count() + 1
    }
    fn valid_line_range(range: LineRange, lines: &[&str]) -> bool {
        range.start >= 1 && range.end <= lines.len() + 1
    }

    changes.iter().all(|c| {
        valid_line_range(c.original, original_lines)
            && valid_line_range(c.modified, modified_lines)
            && c.inner.iter().all(|inner| {
                valid_position(inner.original.start, original_lines)
                    && valid_position(inner.original.end, original_lines)
                    && valid_position(inner.modified.start, modified_lines)
                    && valid_position(inner.modified.end, modified_lines)
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::LineRangeSet;
    use crate::mappings::LineRangeMapping;

    fn diff(original: &[&str], modified: &[&str]) -> LinesDiff {
        compute_diff(original, modified, &DiffOptions::default())
    }

    fn lr(start: usize, end: usize) -> LineRange {
        LineRange::new(start, end)
    }

    fn range(sl: usize, sc: usize, el: usize, ec: usize) -> TextRange {
        TextRange::new(Position::new(sl, sc), Position::new(el, ec))
    }

    #[test]
    fn test_equal_inputs() {
        let result = diff(&["a", "b", "c"], &["a", "b", "c"]);
        assert!(result.changes.is_empty());
        assert!(result.moves.is_empty());
        assert!(!result.hit_timeout);
    }

    #[test]
    fn test_equal_single_line() {
        assert!(diff(&["hello"], &["hello"]).is_empty());
        assert!(diff(&[""], &[""]).is_empty());
    }

    #[test]
    fn test_pure_insert_at_end() {
        let result = diff(&["a"], &["a", "b"]);
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].original, lr(2, 2));
        assert_eq!(result.changes[0].modified, lr(2, 3));
    }

    #[test]
    fn test_pure_delete_at_end() {
        let result = diff(&["a", "b"], &["a"]);
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].original, lr(2, 3));
        assert_eq!(result.changes[0].modified, lr(2, 2));
    }

    #[test]
    fn test_empty_document_against_content() {
        let result = diff(&[""], &["a", "b"]);
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].original, lr(1, 2));
        assert_eq!(result.changes[0].modified, lr(1, 3));
        assert_eq!(
            result.changes[0].inner,
            vec![RangeMapping::new(range(1, 1, 1, 1), range(1, 1, 2, 2))]
        );
    }

    #[test]
    fn test_whitespace_only_edit_is_refined() {
        let options = DiffOptions {
            ignore_trim_whitespace: false,
            ..DiffOptions::default()
        };
        let result = compute_diff(&["  foo"], &["foo"], &options);
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].original, lr(1, 2));
        assert_eq!(result.changes[0].modified, lr(1, 2));
        assert_eq!(
            result.changes[0].inner,
            vec![RangeMapping::new(range(1, 1, 1, 3), range(1, 1, 1, 1))]
        );
    }

    #[test]
    fn test_whitespace_only_edit_is_ignored_by_default() {
        let result = diff(&["  foo"], &["foo"]);
        assert!(result.changes.is_empty());
    }

    #[test]
    fn test_word_level_coalescing() {
        // Two separate one-character edits inside one word come back as a
        // single inner mapping.
        let result = diff(&["abXcdYef"], &["abPcdQef"]);
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].inner.len(), 1);
        assert_eq!(
            result.changes[0].inner[0],
            RangeMapping::new(range(1, 3, 1, 7), range(1, 3, 1, 7))
        );
    }

    #[test]
    fn test_simple_replacement() {
        let result = compute_diff_from_text("a\nb", "a\nc", &DiffOptions::default());
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].original, lr(2, 3));
        assert_eq!(result.changes[0].modified, lr(2, 3));
    }

    #[test]
    fn test_moved_block_is_detected() {
        let original = [
            "ctx one;",
            "ctx two;",
            "ctx three;",
            "ctx four;",
            "alpha;",
            "bravo;",
            "charlie;",
        ];
        let modified = [
            "alpha;",
            "bravo;",
            "charlie;",
            "ctx one;",
            "ctx two;",
            "ctx three;",
            "ctx four;",
        ];
        let options = DiffOptions {
            compute_moves: true,
            ..DiffOptions::default()
        };
        let result = compute_diff(&original, &modified, &options);

        assert_eq!(result.moves.len(), 1);
        assert_eq!(
            result.moves[0].line_range_mapping(),
            LineRangeMapping::new(lr(5, 8), lr(1, 4))
        );
        // The moved block itself is untouched, so the changes are the
        // insertion and deletion the move explains.
        assert_eq!(result.changes.len(), 2);
        assert_eq!(result.changes[0].original, lr(1, 1));
        assert_eq!(result.changes[0].modified, lr(1, 4));
        assert_eq!(result.changes[1].original, lr(5, 8));
        assert_eq!(result.changes[1].modified, lr(8, 8));
    }

    #[test]
    fn test_moves_not_computed_by_default() {
        let original = ["ctx one;", "ctx two;", "ctx three;", "ctx four;", "alpha;"];
        let modified = ["alpha;", "ctx one;", "ctx two;", "ctx three;", "ctx four;"];
        let result = diff(&original, &modified);
        assert!(result.moves.is_empty());
    }

    #[test]
    fn test_timeout_degrades_gracefully() {
        let original_owned: Vec<String> = (0..5000).map(|i| format!("original line {}", i * 7)).collect();
        let modified_owned: Vec<String> = (0..5000).map(|i| format!("modified line {}", i * 13)).collect();
        let original: Vec<&str> = original_owned.iter().map(|s| s.as_str()).collect();
        let modified: Vec<&str> = modified_owned.iter().map(|s| s.as_str()).collect();

        let options = DiffOptions {
            max_computation_time_ms: 1,
            ..DiffOptions::default()
        };
        let result = compute_diff(&original, &modified, &options);
        assert!(result.hit_timeout);
        // Still a well-formed result covering the whole edit.
        assert!(!result.changes.is_empty());
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\nb"), vec!["a", "b"]);
        assert_eq!(split_lines("a\n"), vec!["a", ""]);
        assert_eq!(split_lines("a\r\nb"), vec!["a", "b"]);
        assert_eq!(split_lines(""), vec![""]);
    }

    /// Replays the changes of a diff onto the original lines.
    fn apply_changes(
        original: &[&str],
        modified: &[&str],
        changes: &[DetailedLineRangeMapping],
    ) -> Vec<String> {
        let mut result: Vec<String> = Vec::new();
        let mut next_original_line = 1;
        for change in changes {
            for line in next_original_line..change.original.start {
                result.push(original[line - 1].to_string());
            }
            for line in change.modified.iter() {
                result.push(modified[line - 1].to_string());
            }
            next_original_line = change.original.end;
        }
        for line in next_original_line..=original.len() {
            result.push(original[line - 1].to_string());
        }
        result
    }

    #[test]
    fn test_changes_reconstruct_modified() {
        let original = ["fn main() {", "    old();", "}", "", "// tail"];
        let modified = ["fn main() {", "    new();", "    more();", "}", "// tail"];
        let options = DiffOptions {
            ignore_trim_whitespace: false,
            ..DiffOptions::default()
        };
        let result = compute_diff(&original, &modified, &options);
        assert_eq!(apply_changes(&original, &modified, &result.changes), modified);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_lines() -> impl Strategy<Value = Vec<String>> {
            prop::collection::vec(
                prop_oneof![
                    Just(String::new()),
                    Just("a".to_string()),
                    Just("  a".to_string()),
                    Just("b b".to_string()),
                    Just("fn f() {".to_string()),
                    Just("    body();".to_string()),
                    Just("}".to_string()),
                    "[a-c ]{0,6}",
                ],
                1..10,
            )
        }

        proptest! {
            #[test]
            fn changes_reconstruct_modified(
                original in arb_lines(),
                modified in arb_lines()
            ) {
                let original: Vec<&str> = original.iter().map(|s| s.as_str()).collect();
                let modified: Vec<&str> = modified.iter().map(|s| s.as_str()).collect();
                let options = DiffOptions {
                    ignore_trim_whitespace: false,
                    ..DiffOptions::default()
                };
                let result = compute_diff(&original, &modified, &options);
                prop_assert_eq!(
                    apply_changes(&original, &modified, &result.changes),
                    modified
                );
            }

            #[test]
            fn changes_are_ordered_with_equal_gaps(
                original in arb_lines(),
                modified in arb_lines()
            ) {
                let original: Vec<&str> = original.iter().map(|s| s.as_str()).collect();
                let modified: Vec<&str> = modified.iter().map(|s| s.as_str()).collect();
                let result = compute_diff(&original, &modified, &DiffOptions::default());

                for pair in result.changes.windows(2) {
                    prop_assert!(pair[0].original.end < pair[1].original.start);
                    prop_assert!(pair[0].modified.end < pair[1].modified.start);
                    prop_assert_eq!(
                        pair[1].original.start - pair[0].original.end,
                        pair[1].modified.start - pair[0].modified.end
                    );
                }
                for change in &result.changes {
                    for inner in &change.inner {
                        // Inner mappings stay within the outer line ranges,
                        // except that a boundary may sit on the separator
                        // one line outside.
                        prop_assert!(inner.original.start.line + 1 >= change.original.start);
                        prop_assert!(inner.original.end.line <= change.original.end);
                        prop_assert!(inner.modified.start.line + 1 >= change.modified.start);
                        prop_assert!(inner.modified.end.line <= change.modified.end);
                    }
                }
            }

            #[test]
            fn moves_are_disjoint_and_shape_preserving(
                original in arb_lines(),
                modified in arb_lines()
            ) {
                let original: Vec<&str> = original.iter().map(|s| s.as_str()).collect();
                let modified: Vec<&str> = modified.iter().map(|s| s.as_str()).collect();
                let options = DiffOptions {
                    compute_moves: true,
                    ..DiffOptions::default()
                };
                let result = compute_diff(&original, &modified, &options);

                let mut original_taken = LineRangeSet::new();
                let mut modified_taken = LineRangeSet::new();
                for m in &result.moves {
                    let mapping = m.line_range_mapping();
                    prop_assert_eq!(mapping.original.len(), mapping.modified.len());
                    for line in mapping.original.iter() {
                        prop_assert!(!original_taken.contains(line));
                    }
                    for line in mapping.modified.iter() {
                        prop_assert!(!modified_taken.contains(line));
                    }
                    original_taken.add_range(mapping.original);
                    modified_taken.add_range(mapping.modified);
                }
            }
        }
    }
}
