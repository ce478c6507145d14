//! Longest-matching-block sequence comparison.
//!
//! Finds the longest contiguous matching block, then recurses on the
//! pieces to its left and right. The matching blocks give both a
//! similarity ratio (`2 * matches / total_len`) and an edit script of
//! equal / replace / delete / insert runs. Used for word similarity
//! (over characters) and phoneme alignment (over phoneme symbols).
//!
//! No elements are treated as junk.

use std::collections::HashMap;
use std::hash::Hash;

use crate::model::EditOp;

/// A run of matching elements: `a[a_start..a_start + len] == b[b_start..b_start + len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub len: usize,
}

/// One step of the edit script: `a[i1..i2]` becomes `b[j1..j2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub op: EditOp,
    pub i1: usize,
    pub i2: usize,
    pub j1: usize,
    pub j2: usize,
}

/// Compares two sequences of hashable elements.
pub struct SequenceMatcher<'a, T> {
    a: &'a [T],
    b: &'a [T],
    b2j: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + Hash> SequenceMatcher<'a, T> {
    pub fn new(a: &'a [T], b: &'a [T]) -> Self {
        let mut b2j: HashMap<&'a T, Vec<usize>> = HashMap::new();
        for (j, elem) in b.iter().enumerate() {
            b2j.entry(elem).or_default().push(j);
        }
        Self { a, b, b2j }
    }

    /// Longest matching block in `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchingBlock {
        let mut best = MatchingBlock {
            a_start: alo,
            b_start: blo,
            len: 0,
        };
        // j2len[j] = length of the match ending at a[i - 1] and b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > best.len {
                        best = MatchingBlock {
                            a_start: i + 1 - k,
                            b_start: j + 1 - k,
                            len: k,
                        };
                    }
                }
            }
            j2len = next;
        }

        best
    }

    /// All maximal matching blocks in increasing order, adjacent blocks merged.
    ///
    /// Does not include the zero-length terminator some implementations append.
    pub fn matching_blocks(&self) -> Vec<MatchingBlock> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.len == 0 {
                continue;
            }
            blocks.push(m);
            if alo < m.a_start && blo < m.b_start {
                queue.push((alo, m.a_start, blo, m.b_start));
            }
            if m.a_start + m.len < ahi && m.b_start + m.len < bhi {
                queue.push((m.a_start + m.len, ahi, m.b_start + m.len, bhi));
            }
        }
        blocks.sort_by_key(|m| (m.a_start, m.b_start));

        let mut merged: Vec<MatchingBlock> = Vec::with_capacity(blocks.len());
        for block in blocks {
            match merged.last_mut() {
                Some(last)
                    if last.a_start + last.len == block.a_start
                        && last.b_start + last.len == block.b_start =>
                {
                    last.len += block.len;
                }
                _ => merged.push(block),
            }
        }
        merged
    }

    /// Edit script turning `a` into `b`.
    pub fn opcodes(&self) -> Vec<Opcode> {
        let mut ops = Vec::new();
        let (mut i, mut j) = (0, 0);

        let terminator = MatchingBlock {
            a_start: self.a.len(),
            b_start: self.b.len(),
            len: 0,
        };
        for block in self.matching_blocks().into_iter().chain(std::iter::once(terminator)) {
            let op = match (i < block.a_start, j < block.b_start) {
                (true, true) => Some(EditOp::Replace),
                (true, false) => Some(EditOp::Delete),
                (false, true) => Some(EditOp::Insert),
                (false, false) => None,
            };
            if let Some(op) = op {
                ops.push(Opcode {
                    op,
                    i1: i,
                    i2: block.a_start,
                    j1: j,
                    j2: block.b_start,
                });
            }
            i = block.a_start + block.len;
            j = block.b_start + block.len;
            if block.len > 0 {
                ops.push(Opcode {
                    op: EditOp::Equal,
                    i1: block.a_start,
                    i2: i,
                    j1: block.b_start,
                    j2: j,
                });
            }
        }
        ops
    }

    /// Similarity in `[0, 1]`: twice the matched elements over the combined length.
    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matches: usize = self.matching_blocks().iter().map(|m| m.len).sum();
        2.0 * matches as f64 / total as f64
    }
}

/// Character-level similarity ratio of two strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    SequenceMatcher::new(&a, &b).ratio()
}
