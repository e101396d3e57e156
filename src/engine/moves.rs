//! Detection of moved blocks.
//!
//! Two complementary heuristics over the computed changes:
//!
//! 1. A pure deletion and a pure insertion with near-identical character
//!    histograms are almost certainly the same block at a new location.
//! 2. Within the remaining changes, runs of three or more consecutive
//!    lines whose trimmed hashes reappear on the other side are collected
//!    as move candidates and reconciled greedily along their diagonals.
//!
//! Candidates are then joined, filtered, and handed back as plain line
//! range mappings; the engine refines each one into a
//! [`MovedText`](crate::mappings::MovedText).

use std::collections::HashMap;

use crate::deadline::{deadline_exceeded, Deadline};
use crate::geometry::{LineRange, LineRangeSet};
use crate::mappings::LineRangeMapping;

/// Minimum number of lines a block must have to participate in move
/// detection.
const MIN_MOVED_LINES: usize = 3;
/// Histogram similarity above which a deletion/insertion pair counts as
/// relocated.
const MIN_SIMILARITY: f64 = 0.90;
/// Minimum trimmed character content of a reported move.
const MIN_MOVED_TEXT_LEN: usize = 11;

/// Computes moved blocks among `changes`.
///
/// Returns plain line range mappings with equal-length sides, ordered by
/// original start line.  An expired deadline yields an empty list; moves
/// are advisory and never degrade the diff itself.
pub fn compute_moved_lines(
    changes: &[LineRangeMapping],
    original_lines: &[&str],
    modified_lines: &[&str],
    original_hashes: &[usize],
    modified_hashes: &[usize],
    deadline: Deadline,
) -> Vec<LineRangeMapping> {
    let (mut moves, excluded) =
        moves_from_deletions_to_insertions(changes, original_lines, modified_lines, deadline);

    if deadline_exceeded(deadline) {
        return Vec::new();
    }

    let remaining: Vec<LineRangeMapping> = changes
        .iter()
        .enumerate()
        .filter(|(i, _)| !excluded.contains(i))
        .map(|(_, c)| *c)
        .collect();
    moves.extend(unchanged_trigram_moves(
        &remaining,
        original_hashes,
        modified_hashes,
        deadline,
    ));

    moves.sort_by_key(|m| m.original.start);
    let mut moves = join_close_consecutive_moves(moves);
    // Joining takes outer bounds; a join that skewed the two sides no
    // longer describes a relocation.
    moves.retain(|m| m.original.len() == m.modified.len());
    moves.retain(|m| {
        let range = m.original.to_offset_range();
        let content: usize = original_lines[range.start..range.end]
            .iter()
            .map(|l| l.trim().chars().count())
            .sum();
        content + range.len().saturating_sub(1) >= MIN_MOVED_TEXT_LEN
    });
    remove_moves_implied_by_changes(changes, moves)
}

/// Pairs up simple deletions with simple insertions by character
/// histogram similarity (greedy, best match first).
fn moves_from_deletions_to_insertions(
    changes: &[LineRangeMapping],
    original_lines: &[&str],
    modified_lines: &[&str],
    deadline: Deadline,
) -> (Vec<LineRangeMapping>, Vec<usize>) {
    let mut keys = CharKeys::default();

    let deletions: Vec<LineRangeFragment> = changes
        .iter()
        .enumerate()
        .filter(|(_, c)| c.modified.is_empty() && c.original.len() >= MIN_MOVED_LINES)
        .map(|(i, c)| LineRangeFragment::new(&mut keys, c.original, original_lines, i))
        .collect();
    let mut insertions: Vec<LineRangeFragment> = changes
        .iter()
        .enumerate()
        .filter(|(_, c)| c.original.is_empty() && c.modified.len() >= MIN_MOVED_LINES)
        .map(|(i, c)| LineRangeFragment::new(&mut keys, c.modified, modified_lines, i))
        .collect();

    let mut moves = Vec::new();
    let mut excluded = Vec::new();

    for deletion in &deletions {
        let mut best_similarity = -1.0;
        let mut best = None;
        for (idx, insertion) in insertions.iter().enumerate() {
            let similarity = deletion.similarity(insertion);
            if similarity > best_similarity {
                best_similarity = similarity;
                best = Some(idx);
            }
        }

        if best_similarity > MIN_SIMILARITY {
            if let Some(idx) = best {
                let insertion = insertions.remove(idx);
                moves.push(LineRangeMapping::new(deletion.range, insertion.range));
                excluded.push(deletion.source);
                excluded.push(insertion.source);
            }
        }

        if deadline_exceeded(deadline) {
            return (moves, excluded);
        }
    }

    (moves, excluded)
}

/// A per-call table assigning stable small indices to characters, so that
/// fragment histograms stay dense.
#[derive(Debug, Default)]
struct CharKeys {
    keys: HashMap<char, usize>,
}

impl CharKeys {
    fn key(&mut self, chr: char) -> usize {
        let next = self.keys.len();
        *self.keys.entry(chr).or_insert(next)
    }
}

/// A character histogram over a range of lines, including one `\n` per
/// line.
#[derive(Debug)]
struct LineRangeFragment {
    range: LineRange,
    histogram: Vec<usize>,
    total: usize,
    /// Index of the change this fragment was built from.
    source: usize,
}

impl LineRangeFragment {
    fn new(
        keys: &mut CharKeys,
        range: LineRange,
        lines: &[&str],
        source: usize,
    ) -> LineRangeFragment {
        let mut histogram: Vec<usize> = Vec::new();
        let mut total = 0;
        let mut bump = |key: usize| {
            if key >= histogram.len() {
                histogram.resize(key + 1, 0);
            }
            histogram[key] += 1;
        };
        for i in range.start - 1..range.end - 1 {
            for chr in lines[i].chars() {
                total += 1;
                bump(keys.key(chr));
            }
            total += 1;
            bump(keys.key('\n'));
        }
        LineRangeFragment {
            range,
            histogram,
            total,
            source,
        }
    }

    fn similarity(&self, other: &LineRangeFragment) -> f64 {
        let len = self.histogram.len().max(other.histogram.len());
        let mut sum_differences = 0;
        for i in 0..len {
            let a = self.histogram.get(i).copied().unwrap_or(0);
            let b = other.histogram.get(i).copied().unwrap_or(0);
            sum_differences += a.abs_diff(b);
        }
        1.0 - sum_differences as f64 / (self.total + other.total) as f64
    }
}

/// Finds relocated runs of unchanged lines within the changes by indexing
/// trigrams of trimmed-line hashes on the original side and sweeping the
/// modified side.
fn unchanged_trigram_moves(
    changes: &[LineRangeMapping],
    original_hashes: &[usize],
    modified_hashes: &[usize],
    deadline: Deadline,
) -> Vec<LineRangeMapping> {
    type Trigram = (usize, usize, usize);

    let mut original_trigrams: HashMap<Trigram, Vec<LineRange>> = HashMap::new();
    for change in changes {
        let r = change.original;
        if r.len() >= MIN_MOVED_LINES {
            for i in r.start..r.end - 2 {
                let key = (
                    original_hashes[i - 1],
                    original_hashes[i],
                    original_hashes[i + 1],
                );
                original_trigrams
                    .entry(key)
                    .or_default()
                    .push(LineRange::new(i, i + 3));
            }
        }
    }

    #[derive(Debug, Clone, Copy)]
    struct PossibleMapping {
        original: LineRange,
        modified: LineRange,
    }

    let mut by_modified: Vec<&LineRangeMapping> = changes.iter().collect();
    by_modified.sort_by_key(|c| c.modified.start);

    let mut possible: Vec<PossibleMapping> = Vec::new();
    for change in &by_modified {
        let r = change.modified;
        let mut last_mappings: Vec<PossibleMapping> = Vec::new();
        if r.len() >= MIN_MOVED_LINES {
            for i in r.start..r.end - 2 {
                let key = (
                    modified_hashes[i - 1],
                    modified_hashes[i],
                    modified_hashes[i + 1],
                );
                let current_modified = LineRange::new(i, i + 3);

                let mut next_mappings: Vec<PossibleMapping> = Vec::new();
                if let Some(ranges) = original_trigrams.get(&key) {
                    for &range in ranges {
                        // A candidate whose windows both ended one line
                        // earlier continues through this window.
                        let extended = last_mappings.iter().find(|last| {
                            last.original.end + 1 == range.end
                                && last.modified.end + 1 == current_modified.end
                        });
                        let mapping = match extended {
                            Some(last) => PossibleMapping {
                                original: LineRange::new(last.original.start, range.end),
                                modified: LineRange::new(
                                    last.modified.start,
                                    current_modified.end,
                                ),
                            },
                            None => PossibleMapping {
                                original: range,
                                modified: current_modified,
                            },
                        };
                        possible.push(mapping);
                        next_mappings.push(mapping);
                    }
                }
                last_mappings = next_mappings;
            }
        }

        if deadline_exceeded(deadline) {
            return Vec::new();
        }
    }

    // Longest candidates claim their lines first.
    possible.sort_by(|a, b| b.modified.len().cmp(&a.modified.len()));

    let mut moves = Vec::new();
    let mut modified_taken = LineRangeSet::new();
    let mut original_taken = LineRangeSet::new();

    for mapping in &possible {
        let diagonal = mapping.modified.start as isize - mapping.original.start as isize;
        let modified_sections = modified_taken.subtract_from(mapping.modified);
        let original_translated = original_taken
            .subtract_from(mapping.original)
            .with_delta(diagonal);

        for &section in modified_sections
            .intersection(&original_translated)
            .ranges()
        {
            if section.len() < MIN_MOVED_LINES {
                continue;
            }
            let modified_range = section;
            let original_range = section.delta(-diagonal);
            moves.push(LineRangeMapping::new(original_range, modified_range));
            modified_taken.add_range(modified_range);
            original_taken.add_range(original_range);
        }
    }

    moves
}

/// Joins consecutive moves separated by at most two lines in total.
fn join_close_consecutive_moves(moves: Vec<LineRangeMapping>) -> Vec<LineRangeMapping> {
    if moves.is_empty() {
        return moves;
    }

    let mut result = vec![moves[0]];
    for &current in &moves[1..] {
        let last = *result.last().unwrap();
        let original_dist = current.original.start as isize - last.original.end as isize;
        let modified_dist = current.modified.start as isize - last.modified.end as isize;
        if original_dist >= 0 && modified_dist >= 0 && original_dist + modified_dist <= 2 {
            *result.last_mut().unwrap() = last.join(current);
            continue;
        }
        result.push(current);
    }
    result
}

/// Drops moves that sit inside a single change at the offset that change
/// already implies; such a block has not actually moved.
fn remove_moves_implied_by_changes(
    changes: &[LineRangeMapping],
    moves: Vec<LineRangeMapping>,
) -> Vec<LineRangeMapping> {
    moves
        .into_iter()
        .filter(|m| {
            let idx_original = changes.partition_point(|c| c.original.start < m.original.end);
            let idx_modified = changes.partition_point(|c| c.modified.start < m.modified.end);
            if idx_original != idx_modified || idx_original == 0 {
                // Anchored to two different changes (or to none): a real
                // relocation.
                return idx_original != idx_modified;
            }
            let anchor = &changes[idx_original - 1];
            let original_dist = m.original.start as isize - anchor.original.start as isize;
            let modified_dist = m.modified.start as isize - anchor.modified.start as isize;
            original_dist != modified_dist
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lrm(original: (usize, usize), modified: (usize, usize)) -> LineRangeMapping {
        LineRangeMapping::new(
            LineRange::new(original.0, original.1),
            LineRange::new(modified.0, modified.1),
        )
    }

    #[test]
    fn test_deletion_insertion_pairing() {
        // "alpha;/bravo;/charlie;" deleted at lines 2-4, inserted at 3-5.
        let original = ["stable one", "alpha;", "bravo;", "charlie;", "stable two"];
        let modified = ["stable one", "stable two", "alpha;", "bravo;", "charlie;"];
        let original_hashes = vec![0, 1, 2, 3, 4];
        let modified_hashes = vec![0, 4, 1, 2, 3];
        let changes = [lrm((2, 5), (2, 2)), lrm((6, 6), (3, 6))];

        let moves = compute_moved_lines(
            &changes,
            &original,
            &modified,
            &original_hashes,
            &modified_hashes,
            None,
        );
        assert_eq!(moves, vec![lrm((2, 5), (3, 6))]);
    }

    #[test]
    fn test_dissimilar_blocks_are_not_paired() {
        let original = ["stable", "alpha;", "bravo;", "charlie;", "tail"];
        let modified = ["stable", "tail", "xxxxx1", "yyyyy2", "zzzzz3"];
        let changes = [lrm((2, 5), (2, 2)), lrm((6, 6), (3, 6))];

        let moves = compute_moved_lines(
            &changes,
            &original,
            &modified,
            &[0, 1, 2, 3, 4],
            &[0, 4, 5, 6, 7],
            None,
        );
        assert!(moves.is_empty());
    }

    #[test]
    fn test_trigram_move_inside_large_change() {
        // One big hunk on both sides; four of its original lines resurface
        // verbatim (by trimmed hash) at a shifted position.
        let original = [
            "edited a", "keep one;", "keep two;", "keep three;", "keep four;", "edited b",
        ];
        let modified = [
            "fresh a", "fresh b", "keep one;", "keep two;", "keep three;", "keep four;",
        ];
        let original_hashes = vec![10, 1, 2, 3, 4, 11];
        let modified_hashes = vec![20, 21, 1, 2, 3, 4];
        let changes = [lrm((1, 7), (1, 7))];

        let moves = compute_moved_lines(
            &changes,
            &original,
            &modified,
            &original_hashes,
            &modified_hashes,
            None,
        );
        assert_eq!(moves, vec![lrm((2, 6), (3, 7))]);
    }

    #[test]
    fn test_short_moves_are_dropped() {
        // Histogram-identical, but only five trimmed characters.
        let original = ["s", "A", "B", "C", "t"];
        let modified = ["s", "t", "A", "B", "C"];
        let changes = [lrm((2, 5), (2, 2)), lrm((6, 6), (3, 6))];

        let moves = compute_moved_lines(
            &changes,
            &original,
            &modified,
            &[0, 1, 2, 3, 4],
            &[0, 4, 1, 2, 3],
            None,
        );
        assert!(moves.is_empty());
    }

    #[test]
    fn test_expired_deadline_yields_no_moves() {
        let original = ["stable", "alpha;", "bravo;", "charlie;", "tail"];
        let modified = ["stable", "tail", "alpha;", "bravo;", "charlie;"];
        let changes = [lrm((2, 5), (2, 2)), lrm((6, 6), (3, 6))];
        let deadline = Some(std::time::Instant::now() - std::time::Duration::from_millis(10));

        let moves = compute_moved_lines(
            &changes,
            &original,
            &modified,
            &[0, 1, 2, 3, 4],
            &[0, 4, 1, 2, 3],
            deadline,
        );
        assert!(moves.is_empty());
    }

    #[test]
    fn test_join_close_consecutive_moves() {
        let joined = join_close_consecutive_moves(vec![lrm((2, 5), (10, 13)), lrm((6, 9), (14, 17))]);
        assert_eq!(joined, vec![lrm((2, 9), (10, 17))]);

        let separate =
            join_close_consecutive_moves(vec![lrm((2, 5), (10, 13)), lrm((9, 12), (17, 20))]);
        assert_eq!(separate.len(), 2);
    }
}
