//! Comparator-based sort over an opaque payload, per spec.md section 4.4.
//!
//! `construct` is the only caller: every level of the build sorts the
//! current range by `(tag, split-axis value)` before deriving the next
//! level's tags. The sort itself never looks at points or tags directly —
//! it only calls `less`/`swap` on a [`Payload`], the way the original
//! templated `bsort`/`bmerge` over a `payload` struct did.

use crate::exec::Parallelism;

/// A raw pointer that asserts `Send` across a fork/join boundary. Sound only
/// because the two forked closures that use it touch disjoint index ranges.
#[derive(Clone, Copy)]
struct SendPtr<P>(*mut P);
unsafe impl<P> Send for SendPtr<P> {}

/// A comparator/mutator pair over positions `[0, n)`. `construct` implements
/// this over `(tags, points)` co-permuted; `less`/`swap` must agree on which
/// positions are equivalent so a stable total preorder results.
pub trait Payload {
    /// Strict weak order: is the element at `i` ordered before the one at `j`?
    fn less(&self, i: usize, j: usize) -> bool;
    /// Swaps the elements at `i` and `j` (and anything co-permuted with them).
    fn swap(&mut self, i: usize, j: usize);
}

/// Sorts positions `[n0, n1)` ascending under `p.less`. Always dispatches to
/// `bitonic_sort`, whose merge step (`pow2_le`) already tolerates lengths
/// that aren't a power of two — matching `sort.hpp`, whose two branches on
/// `n & (n - 1)` both call `bitonic::sort` unconditionally. `odd_even_sort`
/// is not used here; it's kept directly callable as a test oracle.
///
/// Panics if `n1 < n0` (invalid-range, per spec.md section 7). A no-op if
/// `n1 == n0`.
pub fn sort<P: Payload, C: Parallelism>(p: &mut P, n0: usize, n1: usize, ctx: &C) {
    assert!(n1 >= n0, "sort: invalid-range [{n0}, {n1})");
    if n1 == n0 {
        return;
    }
    let max_fork_depth = if ctx.hint() > 1 {
        (usize::BITS - ctx.hint().leading_zeros() - 1) as usize
    } else {
        0
    };
    bitonic_sort(p, n0, n1, true, ctx, max_fork_depth);
}

/// Recursive bitonic sort over `[lo, hi)`, ascending if `dir` is true.
/// Forks the first recursive call via `ctx.join` while `fork_depth > 0`, and
/// runs sequentially once the depth budget (`≈ log2(nthreads)`) is spent.
fn bitonic_sort<P: Payload, C: Parallelism>(
    p: &mut P,
    lo: usize,
    hi: usize,
    dir: bool,
    ctx: &C,
    fork_depth: usize,
) {
    let len = hi - lo;
    if len <= 1 {
        return;
    }
    let mid = lo + len / 2;

    // `bitonic_sort`'s two recursive calls only ever touch disjoint index
    // ranges of `p` (`[lo, mid)` and `[mid, hi)`), but `Payload` is accessed
    // through trait methods rather than a slice, so the borrow checker can't
    // see that disjointness the way `split_at_mut` lets `cluster.rs` prove it.
    // We assert it ourselves with a raw pointer, the same invariant, carried
    // across the `ctx.join` boundary explicitly instead of implicitly.
    let p_ptr = SendPtr(p as *mut P);
    if fork_depth > 0 {
        let left = move || {
            let p: &mut P = unsafe { &mut *p_ptr.0 };
            bitonic_sort(p, lo, mid, !dir, ctx, fork_depth - 1);
        };
        let right = move || {
            let p: &mut P = unsafe { &mut *p_ptr.0 };
            bitonic_sort(p, mid, hi, dir, ctx, fork_depth - 1);
        };
        ctx.join(left, right);
    } else {
        bitonic_sort(p, lo, mid, !dir, ctx, 0);
        bitonic_sort(p, mid, hi, dir, ctx, 0);
    }
    bitonic_merge(p, lo, hi, dir);
}

/// Merges a bitonic sequence over `[lo, hi)`. Tolerates non-power-of-two
/// lengths by splitting at `pow2_le(len)` rather than the midpoint.
fn bitonic_merge<P: Payload>(p: &mut P, lo: usize, hi: usize, dir: bool) {
    let len = hi - lo;
    if len <= 1 {
        return;
    }
    let split = pow2_le(len);
    for i in lo..(hi - split) {
        compare_swap(p, i, i + split, dir);
    }
    bitonic_merge(p, lo, lo + split, dir);
    bitonic_merge(p, lo + split, hi, dir);
}

#[inline]
fn compare_swap<P: Payload>(p: &mut P, i: usize, j: usize, dir: bool) {
    if p.less(j, i) == dir {
        p.swap(i, j);
    }
}

/// Largest power of two `<= len`.
fn pow2_le(len: usize) -> usize {
    debug_assert!(len > 0);
    1usize << (usize::BITS - len.leading_zeros() - 1)
}

/// Odd-even transposition sort over `[lo, hi)`: two interleaved passes
/// (even-indexed pairs, then odd-indexed pairs) per round until a round
/// makes no swaps. Used as the fallback for non-power-of-two ranges and as
/// a verification oracle against `bitonic_sort` in tests.
pub fn odd_even_sort<P: Payload>(p: &mut P, lo: usize, hi: usize) {
    if hi <= lo + 1 {
        return;
    }
    loop {
        let mut swapped = false;

        let mut i = lo;
        while i + 1 < hi {
            if p.less(i + 1, i) {
                p.swap(i, i + 1);
                swapped = true;
            }
            i += 2;
        }

        let mut i = lo + 1;
        while i + 1 < hi {
            if p.less(i + 1, i) {
                p.swap(i, i + 1);
                swapped = true;
            }
            i += 2;
        }

        if !swapped {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::Sequential;

    struct VecPayload(Vec<i32>);

    impl Payload for VecPayload {
        fn less(&self, i: usize, j: usize) -> bool {
            self.0[i] < self.0[j]
        }
        fn swap(&mut self, i: usize, j: usize) {
            self.0.swap(i, j);
        }
    }

    #[test]
    fn test_odd_even_sort_matches_sorted() {
        let mut p = VecPayload(vec![5, 3, 8, 1, 9, 2, 7, 4, 6, 0]);
        odd_even_sort(&mut p, 0, 10);
        assert_eq!(p.0, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_bitonic_sort_power_of_two() {
        let mut p = VecPayload(vec![5, 3, 8, 1, 9, 2, 7, 4]);
        sort(&mut p, 0, 8, &Sequential);
        assert_eq!(p.0, vec![1, 2, 3, 4, 5, 7, 8, 9]);
    }

    #[test]
    fn test_sort_non_power_of_two_via_bitonic() {
        let mut p = VecPayload(vec![9, 2, 7, 4, 6, 0, 3]);
        sort(&mut p, 0, 7, &Sequential);
        assert_eq!(p.0, vec![0, 2, 3, 4, 6, 7, 9]);
    }

    #[test]
    fn test_sort_empty_range_is_noop() {
        let mut p = VecPayload(vec![3, 1, 2]);
        sort(&mut p, 1, 1, &Sequential);
        assert_eq!(p.0, vec![3, 1, 2]);
    }

    #[test]
    #[should_panic(expected = "invalid-range")]
    fn test_sort_invalid_range_panics() {
        let mut p = VecPayload(vec![3, 1, 2]);
        sort(&mut p, 2, 1, &Sequential);
    }

    /// P9: sorting an already sorted subrange is a no-op.
    #[test]
    fn test_sort_idempotence() {
        let mut p = VecPayload(vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let before = p.0.clone();
        sort(&mut p, 0, 8, &Sequential);
        assert_eq!(p.0, before);
    }

    #[test]
    fn test_bitonic_matches_odd_even_many_sizes() {
        use rand::prelude::*;
        use rand_chacha::ChaCha8Rng;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for &n in &[1usize, 2, 4, 8, 16, 32, 64] {
            let values: Vec<i32> = (0..n).map(|_| rng.gen_range(-100..100)).collect();
            let mut a = VecPayload(values.clone());
            let mut b = VecPayload(values);
            sort(&mut a, 0, n, &Sequential);
            odd_even_sort(&mut b, 0, n);
            assert_eq!(a.0, b.0, "mismatch at n={n}");
        }
    }
}
