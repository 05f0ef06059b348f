//! Level-by-level in-place construction of the implicit left-balanced
//! k-d tree, per spec.md section 4.5.
//!
//! This is the module the rest of the crate exists to support: after
//! `build` returns, position `i` of the point cloud holds the BFS node
//! with id `i`, and every tree invariant in spec.md section 3 holds.

use crate::core::layout::PointCloud;
use crate::core::sort::{sort, Payload};
use crate::core::tree_math::{first_at_depth, l_child, left_boundary, num_levels, subtree_size};
use crate::exec::Parallelism;
use crate::number::Number;

/// Co-permutes a point cloud and its transient tag array under one `sort`
/// call, ordering by `(tag, split-axis value)` lexicographically, per the
/// total order in spec.md section 4.5.
struct LevelPayload<'a, V, C: PointCloud<V>> {
    points: &'a mut C,
    tags: &'a mut [usize],
    axis: usize,
    _marker: std::marker::PhantomData<V>,
}

impl<'a, V: Number, C: PointCloud<V>> Payload for LevelPayload<'a, V, C> {
    fn less(&self, i: usize, j: usize) -> bool {
        let (ti, tj) = (self.tags[i], self.tags[j]);
        if ti != tj {
            return ti < tj;
        }
        self.points.get(i, self.axis) < self.points.get(j, self.axis)
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.tags.swap(i, j);
        self.points.swap_rows(i, j);
    }
}

/// Builds the implicit tree in place. Panics if `n == 0` or `d == 0`
/// (invalid-argument, per spec.md section 7 / SPEC_FULL.md section 2.2).
///
/// Logs a `trace!` per level and a `debug!` once construction completes, so
/// a build of a large point cloud is observable without instrumenting the
/// caller.
pub fn build<V: Number, C: PointCloud<V>, P: Parallelism>(points: &mut C, ctx: &P) {
    let n = points.n();
    let d = points.d();
    assert!(n > 0, "construct: n must be positive");
    assert!(d > 0, "construct: dimension must be positive");

    let mut tags = vec![0usize; n];
    let l_levels = num_levels(n);

    for l in 0..l_levels {
        let axis = l % d;
        {
            let mut payload = LevelPayload {
                points,
                tags: &mut tags,
                axis,
                _marker: std::marker::PhantomData,
            };
            sort(&mut payload, 0, n, ctx);
        }
        update_tags(&mut tags, n, l, l_levels, ctx);
        log::trace!("build: level {l} of {l_levels} complete (axis {axis})");
    }

    log::debug!("build: construction complete for n={n}, d={d}");
}

/// Rewrites `tags[i]` for `i` in `[F(l), n)` from the parent's BFS id to
/// whichever child now owns position `i`, per spec.md section 4.5.
/// Embarrassingly parallel over `i`: each task reads and writes only its own
/// index, sharing only the immutable `tags`/`n`/`l_levels` otherwise.
fn update_tags<P: Parallelism>(tags: &mut [usize], n: usize, l: usize, l_levels: usize, ctx: &P) {
    let start = first_at_depth(l);
    if start >= n {
        return;
    }

    // Tags are read and written at disjoint indices by disjoint chunks, so a
    // shared raw pointer across the fork boundary is sound; see `sort.rs`'s
    // `SendPtr` for the same pattern applied to a `Payload`.
    let tags_ptr = tags.as_mut_ptr() as usize;
    let f = move |chunk_start: usize, chunk_end: usize| {
        let tags = unsafe { std::slice::from_raw_parts_mut(tags_ptr as *mut usize, n) };
        for i in chunk_start.max(start)..chunk_end {
            let c = tags[i];
            let left = l_child(c);
            let pivot = left_boundary(c, n, l_levels) + subtree_size(left, n, l_levels);
            tags[i] = match i.cmp(&pivot) {
                std::cmp::Ordering::Less => left,
                std::cmp::Ordering::Equal => c,
                std::cmp::Ordering::Greater => left + 1,
            };
        }
    };
    ctx.for_each_chunk(n, &f);
}
