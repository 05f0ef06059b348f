//! flat-kdtree: an implicit, left-balanced k-d tree packed into a flat
//! array, built in place with no auxiliary tree structure.

mod exec;
mod number;
#[cfg(test)]
mod test_util;

pub mod core;
pub mod prelude;

pub use core::knn::knn;
pub use core::layout::{FlatPoints, Layout, NestedPoints, PointCloud};
pub use core::nn::nn;
pub use exec::{Parallelism, RayonContext, Sequential};
pub use number::Number;

/// Builds the implicit tree in place over `points`, using `ctx` for
/// whatever parallelism the build should use.
pub fn build<V, C, P>(points: &mut C, ctx: &P)
where
    V: Number,
    C: PointCloud<V>,
    P: Parallelism,
{
    core::construct::build(points, ctx)
}
