//! Common imports.

pub use crate::build;
pub use crate::knn;
pub use crate::nn;
pub use crate::{FlatPoints, Layout, NestedPoints, PointCloud};
pub use crate::{Parallelism, RayonContext, Sequential};
pub use crate::Number;
