//! Heuristic post-processing of raw kernel diffs.
//!
//! Kernels minimize edits; humans read diffs.  The passes in this module
//! reshape a raw diff list into something closer to what a reader expects:
//! equivalent alignments are shifted onto natural boundaries, edits inside
//! a single word are widened to the whole word, and coincidental tiny
//! matches inside heavily edited regions are given up.
//!
//! Every pass maps an ordered diff list over a pair of sequences to
//! another such list and keeps the lists ordered and non-overlapping.

use crate::algorithms::Sequence;
use crate::engine::char_sequence::CharSliceSequence;
use crate::engine::line_sequence::LineSequence;
use crate::geometry::OffsetRange;
use crate::mappings::{OffsetPair, SequenceDiff};

/// Shifts and joins diffs so that their edges land on the highest scoring
/// boundaries.  Ties resolve to the earliest position.
pub fn optimize_sequence_diffs<S1, S2>(
    seq1: &S1,
    seq2: &S2,
    diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff>
where
    S1: Sequence + ?Sized,
    S2: Sequence + ?Sized,
{
    let diffs = join_diffs_by_shifting(seq1, seq2, diffs);
    // A second round can join diffs that only became adjacent through the
    // first one.
    let diffs = join_diffs_by_shifting(seq1, seq2, diffs);
    shift_diffs(seq1, seq2, diffs)
}

/// Joins insertions/deletions that describe one contiguous edit split by a
/// coincidental interior match, by sliding them onto each other.
fn join_diffs_by_shifting<S1, S2>(
    seq1: &S1,
    seq2: &S2,
    diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff>
where
    S1: Sequence + ?Sized,
    S2: Sequence + ?Sized,
{
    if diffs.is_empty() {
        return diffs;
    }

    // Slide empty-sided diffs as far left as their content allows; a diff
    // that reaches its predecessor merges into it.
    let mut result: Vec<SequenceDiff> = Vec::with_capacity(diffs.len());
    result.push(diffs[0]);
    for &diff in &diffs[1..] {
        let prev = *result.last().unwrap();
        let mut cur = diff;

        if cur.seq1.is_empty() || cur.seq2.is_empty() {
            let length = cur.seq1.start - prev.seq1.end;
            let mut d = 1;
            while d <= length {
                if seq1.element(cur.seq1.start - d) != seq1.element(cur.seq1.end - d)
                    || seq2.element(cur.seq2.start - d) != seq2.element(cur.seq2.end - d)
                {
                    break;
                }
                d += 1;
            }
            d -= 1;

            if d == length {
                *result.last_mut().unwrap() = SequenceDiff::new(
                    OffsetRange::new(prev.seq1.start, cur.seq1.end - length),
                    OffsetRange::new(prev.seq2.start, cur.seq2.end - length),
                );
                continue;
            }

            cur = cur.delta(-(d as isize));
        }

        result.push(cur);
    }

    // Then slide them right, joining with the successor where possible.
    let mut result2: Vec<SequenceDiff> = Vec::with_capacity(result.len());
    for i in 0..result.len().saturating_sub(1) {
        let next = result[i + 1];
        let mut cur = result[i];

        if cur.seq1.is_empty() || cur.seq2.is_empty() {
            let length = next.seq1.start - cur.seq1.end;
            let mut d = 0;
            while d < length {
                if !seq1.is_strongly_equal(cur.seq1.start + d, cur.seq1.end + d)
                    || !seq2.is_strongly_equal(cur.seq2.start + d, cur.seq2.end + d)
                {
                    break;
                }
                d += 1;
            }

            if d == length {
                result[i + 1] = SequenceDiff::new(
                    OffsetRange::new(cur.seq1.start + length, next.seq1.end),
                    OffsetRange::new(cur.seq2.start + length, next.seq2.end),
                );
                continue;
            }

            if d > 0 {
                cur = cur.delta(d as isize);
            }
        }

        result2.push(cur);
    }
    if let Some(&last) = result.last() {
        result2.push(last);
    }

    result2
}

fn shift_diffs<S1, S2>(seq1: &S1, seq2: &S2, mut diffs: Vec<SequenceDiff>) -> Vec<SequenceDiff>
where
    S1: Sequence + ?Sized,
    S2: Sequence + ?Sized,
{
    for i in 0..diffs.len() {
        let prev = if i > 0 { Some(diffs[i - 1]) } else { None };
        let diff = diffs[i];
        let next = if i + 1 < diffs.len() {
            Some(diffs[i + 1])
        } else {
            None
        };

        // Shifting must not run into the neighbouring diffs.
        let seq1_valid = OffsetRange::new(
            prev.map(|d| d.seq1.end + 1).unwrap_or(0),
            next.map(|d| d.seq1.start - 1).unwrap_or_else(|| seq1.len()),
        );
        let seq2_valid = OffsetRange::new(
            prev.map(|d| d.seq2.end + 1).unwrap_or(0),
            next.map(|d| d.seq2.start - 1).unwrap_or_else(|| seq2.len()),
        );

        if diff.seq1.is_empty() {
            diffs[i] = shift_to_better_position(diff, seq1, seq2, seq1_valid, seq2_valid);
        } else if diff.seq2.is_empty() {
            diffs[i] =
                shift_to_better_position(diff.swap(), seq2, seq1, seq2_valid, seq1_valid).swap();
        }
    }
    diffs
}

/// Slides a pure insertion (`diff.seq1` empty) within the valid window to
/// the position with the best summed boundary score.
fn shift_to_better_position<SA, SB>(
    diff: SequenceDiff,
    seq_a: &SA,
    seq_b: &SB,
    a_valid: OffsetRange,
    b_valid: OffsetRange,
) -> SequenceDiff
where
    SA: Sequence + ?Sized,
    SB: Sequence + ?Sized,
{
    const MAX_SHIFT_LIMIT: usize = 100;

    let mut delta_before = 1;
    while diff.seq1.start >= a_valid.start + delta_before
        && diff.seq2.start >= b_valid.start + delta_before
        && seq_b.is_strongly_equal(
            diff.seq2.start - delta_before,
            diff.seq2.end - delta_before,
        )
        && delta_before < MAX_SHIFT_LIMIT
    {
        delta_before += 1;
    }
    delta_before -= 1;

    let mut delta_after = 0;
    while diff.seq1.start + delta_after < a_valid.end
        && diff.seq2.end + delta_after < b_valid.end
        && seq_b.is_strongly_equal(diff.seq2.start + delta_after, diff.seq2.end + delta_after)
        && delta_after < MAX_SHIFT_LIMIT
    {
        delta_after += 1;
    }

    if delta_before == 0 && delta_after == 0 {
        return diff;
    }

    let mut best_delta = 0;
    let mut best_score = -1;
    let mut delta = -(delta_before as isize);
    while delta <= delta_after as isize {
        let b_start = (diff.seq2.start as isize + delta) as usize;
        let b_end = (diff.seq2.end as isize + delta) as usize;
        let a_offset = (diff.seq1.start as isize + delta) as usize;

        let score = seq_a.boundary_score(a_offset)
            + seq_b.boundary_score(b_start)
            + seq_b.boundary_score(b_end);
        if score > best_score {
            best_score = score;
            best_delta = delta;
        }
        delta += 1;
    }

    diff.delta(best_delta)
}

/// Widens diffs to whole words when the density of edits justifies
/// presenting the word as replaced rather than patched.
pub fn cover_full_words(
    seq1: &CharSliceSequence,
    seq2: &CharSliceSequence,
    diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    let mut additional: Vec<SequenceDiff> = Vec::new();
    let mut last_word: Option<AccumulatedWord> = None;

    for s in &diffs {
        let w1_before = s
            .seq1
            .start
            .checked_sub(1)
            .and_then(|o| seq1.find_word_containing(o));
        let w2_before = s
            .seq2
            .start
            .checked_sub(1)
            .and_then(|o| seq2.find_word_containing(o));
        let w1_after = seq1.find_word_containing(s.seq1.end);
        let w2_after = seq2.find_word_containing(s.seq2.end);

        match (w1_before, w1_after, w2_before, w2_after) {
            (Some(w1b), Some(w1a), Some(w2b), Some(w2a)) if w1b == w1a && w2b == w2a => {
                // The diff sits inside one word on both sides.
                process_word(&mut last_word, &mut additional, w1b, w2b, s);
            }
            _ => {
                if let (Some(w1b), Some(w2b)) = (w1_before, w2_before) {
                    process_word(&mut last_word, &mut additional, w1b, w2b, s);
                }
                if let (Some(w1a), Some(w2a)) = (w1_after, w2_after) {
                    process_word(&mut last_word, &mut additional, w1a, w2a, s);
                }
            }
        }
    }
    flush_word(&mut last_word, &mut additional);

    merge_sequence_diffs(diffs, additional)
}

/// The rolling word accumulator of [`cover_full_words`].
///
/// `deleted` and `added` count the characters actually changed within the
/// accumulated word ranges on each side; `count` is the number of diffs
/// folded in.  The two sides may end up with different lengths; that is
/// tolerated.
#[derive(Debug)]
struct AccumulatedWord {
    s1: OffsetRange,
    s2: OffsetRange,
    deleted: usize,
    added: usize,
    count: usize,
}

fn process_word(
    last_word: &mut Option<AccumulatedWord>,
    additional: &mut Vec<SequenceDiff>,
    s1_range: OffsetRange,
    s2_range: OffsetRange,
    s: &SequenceDiff,
) {
    let contained = match last_word {
        Some(w) => w.s1.contains_range(s1_range) && w.s2.contains_range(s2_range),
        None => false,
    };
    if !contained {
        let extends = match last_word {
            Some(w) => !(w.s1.end < s1_range.start && w.s2.end < s2_range.start),
            None => false,
        };
        if extends {
            let w = last_word.as_mut().unwrap();
            w.deleted += OffsetRange::try_new(w.s1.end, s1_range.start)
                .map(|r| r.len())
                .unwrap_or(0);
            w.added += OffsetRange::try_new(w.s2.end, s2_range.start)
                .map(|r| r.len())
                .unwrap_or(0);
            w.s1 = w.s1.join(s1_range);
            w.s2 = w.s2.join(s2_range);
        } else {
            flush_word(last_word, additional);
            *last_word = Some(AccumulatedWord {
                s1: s1_range,
                s2: s2_range,
                deleted: 0,
                added: 0,
                count: 0,
            });
        }
    }

    let w = last_word.as_mut().unwrap();
    w.count += 1;
    w.deleted += s1_range.intersect(s.seq1).map(|r| r.len()).unwrap_or(0);
    w.added += s2_range.intersect(s.seq2).map(|r| r.len()).unwrap_or(0);
}

fn flush_word(last_word: &mut Option<AccumulatedWord>, additional: &mut Vec<SequenceDiff>) {
    if let Some(w) = last_word.take() {
        let unchanged1 = w.s1.len().saturating_sub(w.deleted);
        if w.deleted.max(w.added) + (w.count - 1) > unchanged1 {
            additional.push(SequenceDiff::new(w.s1, w.s2));
        }
    }
}

/// Merges two ordered diff lists, joining results that touch or overlap.
fn merge_sequence_diffs(a: Vec<SequenceDiff>, b: Vec<SequenceDiff>) -> Vec<SequenceDiff> {
    let mut result: Vec<SequenceDiff> = Vec::with_capacity(a.len() + b.len());
    let mut ai = 0;
    let mut bi = 0;
    while ai < a.len() || bi < b.len() {
        let next = if ai < a.len() && (bi >= b.len() || a[ai].seq1.start < b[bi].seq1.start) {
            ai += 1;
            a[ai - 1]
        } else {
            bi += 1;
            b[bi - 1]
        };
        match result.last_mut() {
            Some(last) if last.seq1.end >= next.seq1.start => {
                *last = last.join(next);
            }
            _ => result.push(next),
        }
    }
    result
}

/// Joins diffs that are separated by very small unchanged runs.
///
/// The gaps are signed: word coverage can leave diffs overlapping on one
/// side, and those must join as well.
pub fn remove_short_matches(diffs: Vec<SequenceDiff>) -> Vec<SequenceDiff> {
    let mut result: Vec<SequenceDiff> = Vec::with_capacity(diffs.len());
    for s in diffs {
        match result.last_mut() {
            Some(last)
                if s.seq1.start as isize - last.seq1.end as isize <= 2
                    || s.seq2.start as isize - last.seq2.end as isize <= 2 =>
            {
                *last = last.join(s);
            }
            _ => result.push(s),
        }
    }
    result
}

/// Swallows accidental tiny matches between long character diffs and marks
/// short non-word prefixes/suffixes of long diffs as changed.
pub fn remove_random_matches(
    seq1: &CharSliceSequence,
    seq2: &CharSliceSequence,
    mut diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    if diffs.is_empty() {
        return diffs;
    }

    let mut counter = 0;
    loop {
        let mut should_repeat = false;
        let mut result = vec![diffs[0]];
        for &cur in &diffs[1..] {
            let last = *result.last().unwrap();
            if should_join_random_match(seq1, seq2, last, cur) {
                should_repeat = true;
                *result.last_mut().unwrap() = last.join(cur);
            } else {
                result.push(cur);
            }
        }
        diffs = result;
        counter += 1;
        if counter >= 10 || !should_repeat {
            break;
        }
    }

    // A long diff that stops just short of the line edge over a couple of
    // insignificant characters reads better when it covers them too.
    let mut new_diffs: Vec<SequenceDiff> = Vec::new();
    for i in 0..diffs.len() {
        let prev = if i > 0 { Some(diffs[i - 1]) } else { None };
        let next = if i + 1 < diffs.len() {
            Some(diffs[i + 1])
        } else {
            None
        };
        let cur = diffs[i];
        let mut new_diff = cur;

        let is_long = cur.seq1.len() + cur.seq2.len() > 100;
        let should_mark =
            |text: &str| !text.is_empty() && text.trim().chars().count() <= 3 && is_long;

        let full_range1 = seq1.extend_to_full_lines(cur.seq1);
        let prefix = seq1.text_between(OffsetRange::new(full_range1.start, cur.seq1.start));
        if should_mark(&prefix) {
            let d = prefix
                .chars()
                .count()
                .min(new_diff.seq1.start)
                .min(new_diff.seq2.start);
            new_diff = new_diff.delta_start(-(d as isize));
        }
        let suffix = seq1.text_between(OffsetRange::new(cur.seq1.end, full_range1.end));
        if should_mark(&suffix) {
            let d = suffix
                .chars()
                .count()
                .min(seq1.len() - new_diff.seq1.end)
                .min(seq2.len() - new_diff.seq2.end);
            new_diff = new_diff.delta_end(d as isize);
        }

        // Clamp against the already extended predecessor, not just the
        // original one, so two extensions cannot overlap in the gap.
        let lower = new_diffs
            .last()
            .map(|l| l.ends())
            .or_else(|| prev.map(|p| p.ends()))
            .unwrap_or(OffsetPair::ZERO);
        let available = SequenceDiff::from_offset_pairs(
            lower,
            next.map(|n| n.starts()).unwrap_or(OffsetPair::MAX),
        );
        let clamped = new_diff
            .intersect(available)
            .expect("diffs are ordered, the neighbour gap cannot be disjoint");
        match new_diffs.last_mut() {
            Some(last) if clamped.starts() == last.ends() => {
                *last = last.join(clamped);
            }
            _ => new_diffs.push(clamped),
        }
    }

    new_diffs
}

fn should_join_random_match(
    seq1: &CharSliceSequence,
    seq2: &CharSliceSequence,
    before: SequenceDiff,
    after: SequenceDiff,
) -> bool {
    let unchanged = OffsetRange::new(before.seq1.end, after.seq1.start);
    if seq1.count_lines_in(unchanged) > 5 || unchanged.len() > 500 {
        return false;
    }

    let text = seq1.text_between(unchanged);
    let trimmed = text.trim();
    if trimmed.chars().count() > 20 || trimmed.contains('\n') || trimmed.contains('\r') {
        return false;
    }

    // Weigh the surrounding diffs: many lines or characters on either
    // side make the tiny unchanged run between them look coincidental.
    let max = 2.0 * 40.0 + 50.0;
    let cap = |v: f64| v.min(max);
    let weigh = |seq: &CharSliceSequence, range: OffsetRange| {
        cap((seq.count_lines_in(range) * 40 + range.len()) as f64)
    };

    let before_weight =
        (weigh(seq1, before.seq1).powf(1.5) + weigh(seq2, before.seq2).powf(1.5)).powf(1.5);
    let after_weight =
        (weigh(seq1, after.seq1).powf(1.5) + weigh(seq2, after.seq2).powf(1.5)).powf(1.5);
    before_weight + after_weight > max.powf(1.5).powf(1.5) * 1.3
}

/// Joins line level diffs whose unchanged gap carries almost no text.
///
/// Keeping a tiny unchanged island inside one hunk both reads better and
/// lets move detection see short relocated blocks as a whole.
pub fn remove_random_line_matches(
    seq1: &LineSequence,
    mut diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    if diffs.is_empty() {
        return diffs;
    }

    let mut counter = 0;
    loop {
        let mut should_repeat = false;
        let mut result = vec![diffs[0]];
        for &cur in &diffs[1..] {
            let last = *result.last().unwrap();
            let unchanged = OffsetRange::new(last.seq1.end, cur.seq1.start);
            let significant = seq1
                .text_between(unchanged)
                .chars()
                .filter(|c| !c.is_whitespace())
                .count();
            if significant <= 4 {
                should_repeat = true;
                *result.last_mut().unwrap() = last.join(cur);
            } else {
                result.push(cur);
            }
        }
        diffs = result;
        counter += 1;
        if counter >= 10 || !should_repeat {
            break;
        }
    }
    diffs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sd(s1: (usize, usize), s2: (usize, usize)) -> SequenceDiff {
        SequenceDiff::new(OffsetRange::new(s1.0, s1.1), OffsetRange::new(s2.0, s2.1))
    }

    fn char_seq(lines: &[&str]) -> CharSliceSequence {
        CharSliceSequence::new(lines, OffsetRange::of_length(lines.len()), true)
    }

    #[test]
    fn test_shift_insertion_to_word_boundary() {
        let old = ["x ab x"];
        let new = ["x ab ab x"];
        let seq1 = char_seq(&old);
        let seq2 = char_seq(&new);
        // A mid-word placement of the inserted "b a" slides onto the
        // earliest equivalent word boundary.
        let diffs = optimize_sequence_diffs(&seq1, &seq2, vec![sd((3, 3), (3, 6))]);
        assert_eq!(diffs, vec![sd((1, 1), (1, 4))]);
    }

    #[test]
    fn test_join_by_shifting_merges_split_insertion() {
        let old = ["x y"];
        let new = ["x, z y"];
        let seq1 = char_seq(&old);
        let seq2 = char_seq(&new);
        // One edit split around the coincidentally matching space: the
        // join pass slides the second insertion onto the first.
        let diffs =
            optimize_sequence_diffs(&seq1, &seq2, vec![sd((1, 1), (1, 2)), sd((2, 2), (3, 5))]);
        assert_eq!(diffs, vec![sd((1, 1), (1, 4))]);
    }

    #[test]
    fn test_remove_short_matches_joins_close_diffs() {
        let diffs = remove_short_matches(vec![sd((2, 3), (2, 3)), sd((5, 6), (5, 6))]);
        assert_eq!(diffs, vec![sd((2, 6), (2, 6))]);

        let kept = remove_short_matches(vec![sd((2, 3), (2, 3)), sd((9, 10), (9, 10))]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_cover_full_words_extends_dense_edit() {
        let old = ["abcd"];
        let new = ["wxyd"];
        let seq1 = char_seq(&old);
        let seq2 = char_seq(&new);
        // Three of four word characters changed: the whole word is
        // presented as replaced.
        let diffs = cover_full_words(&seq1, &seq2, vec![sd((0, 3), (0, 3))]);
        assert_eq!(diffs, vec![sd((0, 4), (0, 4))]);
    }

    #[test]
    fn test_cover_full_words_keeps_sparse_edit() {
        let old = ["abcdefgh"];
        let new = ["abXdefgh"];
        let seq1 = char_seq(&old);
        let seq2 = char_seq(&new);
        let input = vec![sd((2, 3), (2, 3))];
        assert_eq!(cover_full_words(&seq1, &seq2, input.clone()), input);
    }

    #[test]
    fn test_remove_random_line_matches_swallows_tiny_gap() {
        let lines = ["x", "A", "B", "C", "y"];
        let seq = LineSequence::new(vec![0, 1, 2, 3, 4], &lines);
        let diffs =
            remove_random_line_matches(&seq, vec![sd((0, 1), (0, 0)), sd((4, 4), (3, 4))]);
        assert_eq!(diffs, vec![sd((0, 4), (0, 4))]);
    }

    #[test]
    fn test_remove_random_line_matches_keeps_significant_gap() {
        let lines = ["x", "alpha", "beta!", "y"];
        let seq = LineSequence::new(vec![0, 1, 2, 3], &lines);
        let input = vec![sd((0, 1), (0, 1)), sd((3, 4), (3, 4))];
        assert_eq!(remove_random_line_matches(&seq, input.clone()), input);
    }
}
