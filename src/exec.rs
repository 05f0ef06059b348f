//! The execution context: an opaque parallelism hint, per spec.md section
//! 4.9 and design note 9.3.
//!
//! The original C++ implementation threaded a `kdtree::context` carrying
//! `nthreads` through every call. Here that collapses to a single trait,
//! the way `clam`'s `Cluster::par_partition` threads `rayon::join` through
//! recursive calls without a bespoke context object — we keep the context
//! as an explicit value instead, since `construct`'s tag-update pass needs
//! an explicit chunk count, not just a boolean "parallel or not".

use rayon::prelude::*;

/// A parallelism hint plus the two fork primitives `sort` and `construct`
/// need: a binary fork/join (for bitonic recursion) and a chunked
/// embarrassingly-parallel loop (for the per-level tag rewrite).
pub trait Parallelism: Send + Sync {
    /// Thread count or equivalent; `1` means "run everything sequentially".
    fn hint(&self) -> usize;

    /// Runs `a` and `b`, possibly concurrently, and returns both results.
    fn join<A, B, RA, RB>(&self, a: A, b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send;

    /// Splits `0..n` into roughly `hint()` contiguous chunks and calls `f`
    /// with the `[start, end)` bounds of each, across however many worker
    /// threads the implementation cares to use.
    fn for_each_chunk(&self, n: usize, f: &(dyn Fn(usize, usize) + Sync));
}

/// Forks via `rayon::join`, exactly as `cluster.rs`'s `par_partition` does.
#[derive(Debug, Clone, Copy)]
pub struct RayonContext {
    nthreads: usize,
}

impl RayonContext {
    /// Uses rayon's global thread pool size as the hint.
    pub fn new() -> Self {
        Self {
            nthreads: rayon::current_num_threads(),
        }
    }

    /// Overrides the hint (e.g. for deterministic benchmarking).
    pub fn with_hint(nthreads: usize) -> Self {
        Self {
            nthreads: nthreads.max(1),
        }
    }
}

impl Default for RayonContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Parallelism for RayonContext {
    fn hint(&self) -> usize {
        self.nthreads
    }

    fn join<A, B, RA, RB>(&self, a: A, b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        if self.nthreads > 1 {
            rayon::join(a, b)
        } else {
            (a(), b())
        }
    }

    fn for_each_chunk(&self, n: usize, f: &(dyn Fn(usize, usize) + Sync)) {
        if n == 0 {
            return;
        }
        let chunks = self.nthreads.max(1);
        if chunks <= 1 {
            log::debug!("execution context hint is 1; tag update runs sequentially");
            f(0, n);
            return;
        }
        let chunk_len = n.div_ceil(chunks);
        (0..chunks).into_par_iter().for_each(|c| {
            let start = c * chunk_len;
            if start >= n {
                return;
            }
            let end = (start + chunk_len).min(n);
            f(start, end);
        });
    }
}

/// No forking at all: a single caller-thread fallback, used for the
/// deterministic seed scenarios in spec.md section 8 and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl Parallelism for Sequential {
    fn hint(&self) -> usize {
        1
    }

    fn join<A, B, RA, RB>(&self, a: A, b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        (a(), b())
    }

    fn for_each_chunk(&self, n: usize, f: &(dyn Fn(usize, usize) + Sync)) {
        f(0, n);
    }
}
