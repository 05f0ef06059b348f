//! The spatial-index core: bit tricks, tree arithmetic, layout, sort,
//! construction, traversal, and the two query visitors, per spec.md
//! section 2.

pub mod bitops;
pub mod construct;
pub mod knn;
pub mod layout;
pub mod nn;
pub mod sort;
pub mod traverse;
pub mod tree_math;
