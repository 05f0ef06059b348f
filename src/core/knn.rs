//! The bounded max-heap k-nearest-neighbors visitor, per spec.md section 4.8.

use crate::core::layout::PointCloud;
use crate::core::nn::squared_distance;
use crate::core::traverse::{traverse, Visitor};
use crate::number::Number;

struct KnnVisitor<'a, V, C> {
    points: &'a C,
    q: &'a [V],
    idx: Vec<usize>,
    dst: Vec<V>,
    /// Tracks which heap slots have ever been replaced by a real visit, so a
    /// caller-supplied `rmax` tighter than the true k-th distance doesn't
    /// leave sentinel-seeded slots in the result.
    filled: Vec<bool>,
}

impl<'a, V: Number, C: PointCloud<V>> KnnVisitor<'a, V, C> {
    /// Restores the max-heap property at `i`, treating only the prefix
    /// `[0, heap_len)` as live.
    fn maxheapify(&mut self, mut i: usize, heap_len: usize) {
        loop {
            let l = 2 * i + 1;
            let r = 2 * i + 2;
            let mut largest = i;
            if l < heap_len && self.dst[l] > self.dst[largest] {
                largest = l;
            }
            if r < heap_len && self.dst[r] > self.dst[largest] {
                largest = r;
            }
            if largest == i {
                break;
            }
            self.dst.swap(i, largest);
            self.idx.swap(i, largest);
            self.filled.swap(i, largest);
            i = largest;
        }
    }

    /// Sorts `idx`/`dst` ascending by distance via in-place heap-sort,
    /// per spec.md section 4.8.
    fn heap_sort(&mut self) {
        let k = self.dst.len();
        if k == 0 {
            return;
        }
        for i in (0..=k / 2).rev() {
            self.maxheapify(i, k);
        }
        for i in (1..k).rev() {
            self.dst.swap(0, i);
            self.idx.swap(0, i);
            self.filled.swap(0, i);
            self.maxheapify(0, i);
        }
    }
}

impl<'a, V: Number, C: PointCloud<V>> Visitor<V> for KnnVisitor<'a, V, C> {
    fn visit(&mut self, i: usize) {
        let d = squared_distance(self.points, i, self.q);
        if d <= self.dst[0] {
            self.dst[0] = d;
            self.idx[0] = i;
            self.filled[0] = true;
            let heap_len = self.dst.len();
            self.maxheapify(0, heap_len);
        }
    }

    fn rmax(&self) -> V {
        self.dst[0]
    }
}

/// Returns up to `k` indices into `points` nearest `q`, sorted ascending by
/// squared distance and bounded by `rmax` (a squared-distance radius; `None`
/// means unbounded). Shorter than `k` when `points` has fewer than `k`
/// points, or when `rmax` rules out some of the `k` closest — never padded
/// with a sentinel index, unlike the original's zero-filled output.
///
/// Panics if `k == 0` (invalid-argument, per spec.md section 7).
pub fn knn<V: Number, C: PointCloud<V>>(points: &C, q: &[V], k: usize, rmax: Option<V>) -> Vec<usize> {
    assert!(k > 0, "knn: k must be positive");
    let effective_k = k.min(points.n());
    if effective_k == 0 {
        return vec![];
    }
    let seed = rmax.unwrap_or_else(V::sentinel_max);

    let mut visitor = KnnVisitor {
        points,
        q,
        idx: vec![0; effective_k],
        dst: vec![seed; effective_k],
        filled: vec![false; effective_k],
    };
    traverse(points, q, points.d(), &mut visitor);
    visitor.heap_sort();
    visitor
        .idx
        .into_iter()
        .zip(visitor.filled)
        .filter_map(|(i, f)| f.then_some(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::construct::build;
    use crate::core::layout::{FlatPoints, Layout};
    use crate::core::nn::nn;
    use crate::exec::Sequential;

    fn brute_force_knn(points: &FlatPoints<'_, f64>, q: &[f64], k: usize) -> Vec<usize> {
        let mut all: Vec<(usize, f64)> = (0..points.n()).map(|i| (i, squared_distance(points, i, q))).collect();
        all.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        all.into_iter().take(k).map(|(i, _)| i).collect()
    }

    /// Seed scenario from spec.md section 8: k=4 query agrees with
    /// brute-force (P8), and is sorted ascending by distance (P6).
    #[test]
    fn test_knn_seed_scenario() {
        let mut data = vec![
            10.0, 10.0, 20.0, 80.0, 30.0, 30.0, 40.0, 60.0, 50.0, 50.0, 60.0, 20.0, 70.0, 90.0, 80.0, 40.0, 90.0, 70.0, 15.0, 15.0,
        ];
        let mut cloud = FlatPoints::new(&mut data, 10, 2, Layout::RowMajor);
        build(&mut cloud, &Sequential);

        let q = [50.0, 50.0];
        let result = knn(&cloud, &q, 4, None);
        let expected_set: std::collections::HashSet<_> = brute_force_knn(&cloud, &q, 4).into_iter().collect();
        let actual_set: std::collections::HashSet<_> = result.iter().copied().collect();
        assert_eq!(actual_set, expected_set);

        let dists: Vec<f64> = result.iter().map(|&i| squared_distance(&cloud, i, &q)).collect();
        for w in dists.windows(2) {
            assert!(w[0] <= w[1], "knn result not sorted ascending: {dists:?}");
        }
    }

    /// P7: `nn(q)` equals `knn(q, 1)[0]`.
    #[test]
    fn test_nn_matches_knn_k1() {
        let mut data: Vec<f64> = vec![
            10.0, 10.0, 20.0, 80.0, 30.0, 30.0, 40.0, 60.0, 50.0, 50.0, 60.0, 20.0, 70.0, 90.0, 80.0, 40.0, 90.0, 70.0, 15.0, 15.0,
        ];
        let mut cloud = FlatPoints::new(&mut data, 10, 2, Layout::RowMajor);
        build(&mut cloud, &Sequential);

        for q in &[[50.0, 50.0], [70.0, 20.0], [100.0, 100.0]] {
            let nn_idx = nn(&cloud, q, None).unwrap();
            let knn_idx = knn(&cloud, q, 1, None);
            assert_eq!(knn_idx, vec![nn_idx]);
        }
    }

    #[test]
    fn test_knn_k_greater_than_n_returns_all() {
        let mut data = vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0];
        let mut cloud = FlatPoints::new(&mut data, 3, 2, Layout::RowMajor);
        build(&mut cloud, &Sequential);

        let result = knn(&cloud, &[0.0, 0.0], 10, None);
        assert_eq!(result.len(), 3);
    }

    #[test]
    #[should_panic(expected = "k must be positive")]
    fn test_knn_zero_k_panics() {
        let mut data = vec![1.0, 1.0];
        let cloud = FlatPoints::new(&mut data, 1, 2, Layout::RowMajor);
        knn(&cloud, &[0.0, 0.0], 0, None);
    }

    /// A tight `rmax` can exclude some of the true k nearest, so the result
    /// is shorter than `k` rather than padded with sentinel-seeded slots.
    #[test]
    fn test_knn_rmax_bounds_and_shortens_result() {
        let mut data = vec![
            10.0, 10.0, 20.0, 80.0, 30.0, 30.0, 40.0, 60.0, 50.0, 50.0, 60.0, 20.0, 70.0, 90.0, 80.0, 40.0, 90.0, 70.0, 15.0, 15.0,
        ];
        let mut cloud = FlatPoints::new(&mut data, 10, 2, Layout::RowMajor);
        build(&mut cloud, &Sequential);

        let q = [50.0, 50.0];
        let expected = brute_force_knn(&cloud, &q, 4);
        let dists: Vec<f64> = expected.iter().map(|&i| squared_distance(&cloud, i, &q)).collect();

        // rmax wide enough for only the closest 2 of the 4 nearest.
        let rmax = (dists[1] + dists[2]) / 2.0;
        let bounded = knn(&cloud, &q, 4, Some(rmax));
        assert_eq!(bounded.len(), 2);
        let bounded_set: std::collections::HashSet<_> = bounded.into_iter().collect();
        let expected_set: std::collections::HashSet<_> = expected[..2].iter().copied().collect();
        assert_eq!(bounded_set, expected_set);

        // rmax covering all 4 recovers the unbounded answer.
        let unbounded = knn(&cloud, &q, 4, Some(dists[3] + 1.0));
        assert_eq!(unbounded.len(), 4);
    }

    /// P6 + P8 over random inputs.
    #[test]
    fn test_knn_random_agrees_with_brute_force() {
        use rand::prelude::*;
        use rand_chacha::ChaCha8Rng;
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let n = 60;
        let d = 4;
        let mut data: Vec<f64> = (0..n * d).map(|_| rng.gen_range(-50.0..50.0)).collect();
        let mut cloud = FlatPoints::new(&mut data, n, d, Layout::RowMajor);
        build(&mut cloud, &Sequential);

        for _ in 0..10 {
            let q: Vec<f64> = (0..d).map(|_| rng.gen_range(-50.0..50.0)).collect();
            let k = 5;
            let expected: std::collections::HashSet<_> = brute_force_knn(&cloud, &q, k).into_iter().collect();
            let actual = knn(&cloud, &q, k, None);
            assert_eq!(actual.len(), k);
            let actual_set: std::collections::HashSet<_> = actual.iter().copied().collect();
            assert_eq!(actual_set, expected);

            let dists: Vec<f64> = actual.iter().map(|&i| squared_distance(&cloud, i, &q)).collect();
            for w in dists.windows(2) {
                assert!(w[0] <= w[1]);
            }
        }
    }

    /// P10: `build` followed by `knn` returns the same indices regardless
    /// of whether the point cloud is stored row- or column-major.
    #[test]
    fn test_knn_layout_independent() {
        use rand::prelude::*;
        use rand_chacha::ChaCha8Rng;
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let n = 40;
        let d = 5;
        let row_major: Vec<f64> = (0..n * d).map(|_| rng.gen_range(-200.0..200.0)).collect();

        let mut col_major = vec![0.0; n * d];
        for i in 0..n {
            for j in 0..d {
                col_major[n * j + i] = row_major[d * i + j];
            }
        }

        let mut row_data = row_major.clone();
        let mut row_cloud = FlatPoints::new(&mut row_data, n, d, Layout::RowMajor);
        build(&mut row_cloud, &Sequential);

        let mut col_data = col_major.clone();
        let mut col_cloud = FlatPoints::new(&mut col_data, n, d, Layout::ColMajor);
        build(&mut col_cloud, &Sequential);

        for _ in 0..10 {
            let q: Vec<f64> = (0..d).map(|_| rng.gen_range(-200.0..200.0)).collect();
            let k = 6;

            // Compare by the original point values each returned index maps
            // to, since the two clouds' internal permutations need not match
            // position-for-position — only the set of nearest points found.
            let row_result: Vec<f64> = knn(&row_cloud, &q, k, None)
                .into_iter()
                .flat_map(|i| (0..d).map(move |j| row_cloud.get(i, j)))
                .collect();
            let col_result: Vec<f64> = knn(&col_cloud, &q, k, None)
                .into_iter()
                .flat_map(|i| (0..d).map(move |j| col_cloud.get(i, j)))
                .collect();
            assert_eq!(row_result, col_result, "layout-dependent knn result for query {q:?}");
        }
    }
}
