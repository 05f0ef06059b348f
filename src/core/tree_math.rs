//! Closed-form arithmetic over a left-balanced binary tree in BFS layout.
//!
//! Every function here is O(1) (modulo `bsr`, which is itself O(1) via a
//! hardware instruction). No function in this module ever descends the
//! tree; that is the whole point of `tree_math` existing separately from
//! `construct`.

use super::bitops::bsr;

/// Index of the first node at depth `l`: `2^l - 1`.
#[inline]
pub fn first_at_depth(l: usize) -> usize {
    (1usize << l) - 1
}

/// Left child of node `s`.
#[inline]
pub fn l_child(s: usize) -> usize {
    2 * s + 1
}

/// Right child of node `s`.
#[inline]
pub fn r_child(s: usize) -> usize {
    2 * s + 2
}

/// Number of BFS levels in a left-balanced tree of `n` nodes: `⌊log2 n⌋ + 1`.
#[inline]
pub fn num_levels(n: usize) -> usize {
    bsr(n) as usize + 1
}

/// Depth of node `s`: `⌊log2(s+1)⌋`.
#[inline]
fn depth_of(s: usize) -> usize {
    bsr(s + 1) as usize
}

/// Size of the subtree rooted at node `s` in a left-balanced tree of `n`
/// nodes, via the closed form in spec.md section 3.
pub fn subtree_size(s: usize, n: usize, l_levels: usize) -> usize {
    if s >= n {
        return 0;
    }
    let l = depth_of(s);
    let shift = l_levels - l - 1;
    let fllc = !((!s) << shift);
    let nn = (n.saturating_sub(fllc)).min(1usize << shift);
    (1usize << shift) - 1 + nn
}

/// Reference recursive definition of `subtree_size`, used only to verify the
/// closed form (P1) — not used on any hot path.
pub fn subtree_size_recursive(s: usize, n: usize) -> usize {
    if s >= n {
        return 0;
    }
    1 + subtree_size_recursive(l_child(s), n) + subtree_size_recursive(r_child(s), n)
}

/// Left-side rank of node `s` within its depth: the number of array
/// positions occupied by nodes at the same level that lie to the left of
/// `s`'s subtree, via the closed form in spec.md section 3.
pub fn left_boundary(s: usize, n: usize, l_levels: usize) -> usize {
    let l = depth_of(s);
    let nls = s - first_at_depth(l);
    let shift = l_levels - l - 1;
    let full_subtree = (1usize << shift) - 1;
    let term = (nls * (1usize << shift)).min(n.saturating_sub((1usize << (l_levels - 1)).saturating_sub(1)));
    first_at_depth(l) + nls * full_subtree + term
}

/// Reference scan-based definition of `left_boundary`, used only to verify
/// the closed form (P2).
pub fn left_boundary_scan(s: usize, n: usize) -> usize {
    let l = depth_of(s);
    let start = first_at_depth(l);
    let mut acc = start;
    for i in start..s {
        acc += subtree_size_recursive(i, n);
    }
    acc
}
