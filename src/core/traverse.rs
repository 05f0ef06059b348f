//! The stateless iterative query skeleton shared by `nn` and `knn`, per
//! spec.md section 4.6.
//!
//! No heap-allocated stack: the walk carries only two cursors (`curr`,
//! `prev`) and recomputes whichever of the two children it came from on
//! every step, rather than remembering a path.

use crate::core::bitops::bsr;
use crate::core::layout::PointCloud;
use crate::number::Number;

/// Receives one call per tree node visited (in pre-order, first touch only)
/// and exposes the current pruning radius (squared distance) the traversal
/// should respect.
pub trait Visitor<V> {
    /// Called the first time `curr` is reached from its parent.
    fn visit(&mut self, i: usize);
    /// Current squared-distance upper bound; traversal prunes subtrees whose
    /// split-axis gap exceeds it.
    fn rmax(&self) -> V;
}

/// Split axis at node `curr`'s own depth: `bsr(curr + 1) mod d`, matching
/// the axis `construct::build` assigned when it placed that node.
#[inline]
fn split_axis(curr: usize, d: usize) -> usize {
    (bsr((curr + 1) as u64) as usize) % d
}

/// Walks the implicit tree rooted at position 0, invoking `visitor` once per
/// node on the way down and pruning subtrees the visitor's `rmax` rules out.
///
/// The original's pruning test compares the raw split-axis gap against
/// `rmax` without squaring; we square it here (`sign_dist * sign_dist`)
/// since `rmax` is documented as a squared-distance bound and the
/// unsquared comparison is only correct when every split gap is <= 1.
pub fn traverse<V, C, Vi>(points: &C, q: &[V], d: usize, visitor: &mut Vi)
where
    V: Number,
    C: PointCloud<V>,
    Vi: Visitor<V>,
{
    assert_eq!(q.len(), d, "query dimensionality mismatch");
    let n = points.n() as i64;

    let mut curr: i64 = 0;
    let mut prev: i64 = -1;

    loop {
        let parent = (curr + 1) / 2 - 1;

        if curr >= n {
            prev = curr;
            curr = parent;
            if curr < 0 {
                return;
            }
            continue;
        }

        if prev < curr {
            visitor.visit(curr as usize);
        }

        let s_dim = split_axis(curr as usize, d);
        let s_pos = points.get(curr as usize, s_dim).as_f64();
        let q_pos = q[s_dim].as_f64();
        let sign_dist = q_pos - s_pos;
        let close = if sign_dist > 0.0 { 1 } else { 0 };
        let close_child = 2 * curr + 1 + close;
        let far_child = 2 * curr + 2 - close;

        let rmax = visitor.rmax().as_f64();
        let far_in_range = sign_dist * sign_dist <= rmax;

        let next = if prev < curr {
            close_child
        } else if prev == close_child {
            if far_in_range {
                far_child
            } else {
                parent
            }
        } else {
            parent
        };

        if next < 0 {
            return;
        }

        prev = curr;
        curr = next;
    }
}
