//! The single-nearest-neighbor visitor, per spec.md section 4.7.

use crate::core::layout::PointCloud;
use crate::core::traverse::{traverse, Visitor};
use crate::number::Number;

struct NnVisitor<'a, V, C> {
    points: &'a C,
    q: &'a [V],
    best_dist: V,
    best_idx: Option<usize>,
}

pub(crate) fn squared_distance<V: Number, C: PointCloud<V>>(points: &C, i: usize, q: &[V]) -> V {
    let mut acc = V::zero();
    for axis in 0..points.d() {
        let diff = points.get(i, axis) - q[axis];
        acc += diff * diff;
    }
    acc
}

impl<'a, V: Number, C: PointCloud<V>> Visitor<V> for NnVisitor<'a, V, C> {
    fn visit(&mut self, i: usize) {
        let d = squared_distance(self.points, i, self.q);
        if d <= self.best_dist {
            self.best_dist = d;
            self.best_idx = Some(i);
        }
    }

    fn rmax(&self) -> V {
        self.best_dist
    }
}

/// Returns the index of the point in `points` nearest `q` under squared
/// Euclidean distance, bounded by `rmax` (a squared-distance radius; `None`
/// means unbounded). `None` if `points` is empty or no point lies within
/// `rmax`.
///
/// Unlike the original's sentinel index `0` (indistinguishable from a real
/// nearest match at position 0), a miss returns `None` rather than a
/// fabricated answer.
pub fn nn<V: Number, C: PointCloud<V>>(points: &C, q: &[V], rmax: Option<V>) -> Option<usize> {
    if points.n() == 0 {
        return None;
    }
    let mut visitor = NnVisitor {
        points,
        q,
        best_dist: rmax.unwrap_or_else(V::sentinel_max),
        best_idx: None,
    };
    traverse(points, q, points.d(), &mut visitor);
    visitor.best_idx
}
