//! Agglomerative linkage algorithms.
//!
//! Three strategies, selected per method:
//!
//! - **MST** (single linkage only): Prim's algorithm on the complete graph; the
//!   sorted MST edges are exactly the single-linkage merges. O(n²) time.
//! - **Nearest-neighbor chain** (reducible methods): follow nearest neighbors
//!   until two clusters are mutual nearest neighbors, then merge them. Merges are
//!   discovered out of order and sorted afterwards. O(n²) time.
//! - **Generic** (any method): a min-heap of candidate pairs with lazy deletion.
//!   Needed for centroid and median linkage, where merging can bring a third
//!   cluster closer than the merged pair was. O(n² log n) time.
//!
//! All three work on a private copy of the condensed matrix, update it in place
//! with the Lance–Williams formula, and keep a merged cluster in the slot of its
//! higher-indexed member.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::str::FromStr;

use ordered_float::OrderedFloat;
use tracing::{debug, trace, warn};

use super::condensed::{condensed_index, pdist, CondensedMatrix, Metric};
use super::dendrogram::Dendrogram;
use super::method::Method;
use super::util;
use crate::error::{Error, Result};

/// Which algorithm computes the merges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Fastest algorithm that supports the method.
    #[default]
    Auto,
    /// Minimum spanning tree (single linkage only).
    Mst,
    /// Nearest-neighbor chain (reducible methods only).
    NnChain,
    /// Heap-based search (all methods).
    Generic,
}

impl Algorithm {
    /// Short name used in logs and parsing.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Auto => "auto",
            Algorithm::Mst => "mst",
            Algorithm::NnChain => "nn_chain",
            Algorithm::Generic => "generic",
        }
    }

    /// Whether this algorithm can compute `method` exactly.
    pub fn supports(self, method: Method) -> bool {
        match self {
            Algorithm::Auto | Algorithm::Generic => true,
            Algorithm::Mst => method == Method::Single,
            Algorithm::NnChain => method.is_reducible(),
        }
    }

    fn resolve(self, method: Method) -> Algorithm {
        match self {
            Algorithm::Auto => match method {
                Method::Single => Algorithm::Mst,
                m if m.is_reducible() => Algorithm::NnChain,
                _ => Algorithm::Generic,
            },
            other => other,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Algorithm::Auto),
            "mst" => Ok(Algorithm::Mst),
            "nn_chain" => Ok(Algorithm::NnChain),
            "generic" => Ok(Algorithm::Generic),
            _ => Err(Error::InvalidParameter {
                name: "algorithm",
                message: "expected one of auto, mst, nn_chain, generic",
            }),
        }
    }
}

/// Hierarchical agglomerative clustering.
#[derive(Debug, Clone)]
pub struct Linkage {
    method: Method,
    metric: Metric,
    algorithm: Algorithm,
}

impl Linkage {
    /// Create a linkage with the given method, Euclidean metric and automatic
    /// algorithm selection.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            metric: Metric::Euclidean,
            algorithm: Algorithm::Auto,
        }
    }

    /// Set the linkage method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the metric used by [`fit`](Self::fit) to compare raw observations.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Force a specific algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Configured method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Configured metric.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Configured algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Cluster observations given their condensed pairwise distances.
    pub fn fit_condensed(&self, distances: &CondensedMatrix) -> Result<Dendrogram> {
        if !self.algorithm.supports(self.method) {
            return Err(Error::InvalidParameter {
                name: "algorithm",
                message: "algorithm does not support this linkage method",
            });
        }

        let algorithm = self.algorithm.resolve(self.method);
        let n = distances.observations();
        debug!(n, method = %self.method, %algorithm, "computing linkage");

        let dendrogram = match algorithm {
            Algorithm::Mst => mst_single(distances),
            Algorithm::NnChain => nn_chain(distances, self.method),
            Algorithm::Generic | Algorithm::Auto => generic(distances, self.method),
        };

        debug!(
            n,
            height = dendrogram.heights().last().copied().unwrap_or(0.0),
            monotonic = dendrogram.is_monotonic(),
            "linkage complete"
        );
        Ok(dendrogram)
    }

    /// Cluster raw observation vectors, comparing them with the configured metric.
    pub fn fit(&self, data: &[Vec<f64>]) -> Result<Dendrogram> {
        if self.method.requires_euclidean() && self.metric != Metric::Euclidean {
            warn!(
                method = %self.method,
                metric = %self.metric,
                "linkage method assumes Euclidean distances"
            );
        }
        let distances = pdist(data, self.metric)?;
        self.fit_condensed(&distances)
    }
}

impl Default for Linkage {
    fn default() -> Self {
        Self::new(Method::Single)
    }
}

fn mst_single(distances: &CondensedMatrix) -> Dendrogram {
    let n = distances.observations();
    let edges = util::prim_mst(n, |i, j| distances.get(i, j));
    for &(u, v, d) in &edges {
        trace!(u, v, d, "mst edge");
    }
    Dendrogram::from_unordered_merges(edges, n)
}

fn nn_chain(distances: &CondensedMatrix, method: Method) -> Dendrogram {
    let n = distances.observations();
    let mut dist = distances.as_slice().to_vec();
    // Zero marks a slot whose cluster has been merged away.
    let mut size = vec![1usize; n];
    let mut chain: Vec<usize> = Vec::with_capacity(n);
    let mut merges = Vec::with_capacity(n - 1);

    for _ in 0..n - 1 {
        if chain.is_empty() {
            let start = size.iter().position(|&s| s > 0).unwrap_or(0);
            chain.push(start);
        }

        let (x, y, d_xy) = loop {
            let x = chain[chain.len() - 1];
            let prev = (chain.len() > 1).then(|| chain[chain.len() - 2]);

            // Start from the previous chain element so ties never form a cycle.
            let (mut y, mut best) = match prev {
                Some(p) => (p, dist[condensed_index(x, p, n)]),
                None => (usize::MAX, f64::INFINITY),
            };
            for i in 0..n {
                if size[i] == 0 || i == x {
                    continue;
                }
                let d = dist[condensed_index(x, i, n)];
                if d < best {
                    best = d;
                    y = i;
                }
            }

            if prev == Some(y) {
                break (x, y, best);
            }
            chain.push(y);
        };
        chain.truncate(chain.len() - 2);

        let (x, y) = if x < y { (x, y) } else { (y, x) };
        trace!(x, y, d = d_xy, "merge");
        merges.push((x, y, d_xy));
        merge_slots(&mut dist, &mut size, method, x, y, d_xy);
    }

    Dendrogram::from_unordered_merges(merges, n)
}

/// Heap entry: distance, slot pair (low, high), and the slots' stamps at push time.
type Candidate = Reverse<(OrderedFloat<f64>, usize, usize, u32, u32)>;

fn generic(distances: &CondensedMatrix, method: Method) -> Dendrogram {
    let n = distances.observations();
    let mut dist = distances.as_slice().to_vec();
    let mut size = vec![1usize; n];
    // Bumped whenever a slot's cluster changes, invalidating older heap entries.
    let mut stamp = vec![0u32; n];
    let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(dist.len());
    let mut merges = Vec::with_capacity(n - 1);

    for i in 0..n {
        for j in (i + 1)..n {
            heap.push(Reverse((
                OrderedFloat(dist[condensed_index(i, j, n)]),
                i,
                j,
                0,
                0,
            )));
        }
    }

    for _ in 0..n - 1 {
        let (x, y, d_xy) = loop {
            match heap.pop() {
                Some(Reverse((d, i, j, si, sj))) => {
                    if size[i] > 0 && size[j] > 0 && stamp[i] == si && stamp[j] == sj {
                        break (i, j, d.into_inner());
                    }
                }
                None => unreachable!("candidate heap exhausted with clusters left to merge"),
            }
        };

        trace!(x, y, d = d_xy, "merge");
        merges.push((x, y, d_xy));
        merge_slots(&mut dist, &mut size, method, x, y, d_xy);
        stamp[y] += 1;

        for k in 0..n {
            if size[k] == 0 || k == y {
                continue;
            }
            let (lo, hi) = if k < y { (k, y) } else { (y, k) };
            heap.push(Reverse((
                OrderedFloat(dist[condensed_index(lo, hi, n)]),
                lo,
                hi,
                stamp[lo],
                stamp[hi],
            )));
        }
    }

    Dendrogram::from_merges(&merges, n)
}

/// Merge the cluster in slot `x` into slot `y`, updating `y`'s distances to every
/// other live slot.
fn merge_slots(
    dist: &mut [f64],
    size: &mut [usize],
    method: Method,
    x: usize,
    y: usize,
    d_xy: f64,
) {
    let n = size.len();
    let (n_x, n_y) = (size[x] as f64, size[y] as f64);
    for k in 0..n {
        if size[k] == 0 || k == x || k == y {
            continue;
        }
        let kx = condensed_index(k, x, n);
        let ky = condensed_index(k, y, n);
        dist[ky] = method.update(dist[kx], dist[ky], d_xy, n_x, n_y, size[k] as f64);
    }
    size[y] += size[x];
    size[x] = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const DEMO: [f64; 6] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];

    fn demo() -> CondensedMatrix {
        CondensedMatrix::new(DEMO.to_vec()).unwrap()
    }

    fn assert_rows(d: &Dendrogram, expected: &[(usize, usize, f64, usize)]) {
        assert_eq!(d.len(), expected.len());
        for (step, &(a, b, dist, size)) in d.steps().iter().zip(expected) {
            assert_eq!((step.cluster1, step.cluster2, step.size), (a, b, size));
            assert!(
                (step.dissimilarity - dist).abs() < 1e-12,
                "{} != {}",
                step.dissimilarity,
                dist
            );
        }
    }

    #[test]
    fn ward_on_four_points() {
        let expected = [
            (0, 1, 0.1, 2),
            (2, 4, 0.13f64.sqrt(), 3),
            (3, 5, 0.315f64.sqrt(), 4),
        ];
        for algorithm in [Algorithm::Auto, Algorithm::NnChain, Algorithm::Generic] {
            let d = Linkage::new(Method::Ward)
                .with_algorithm(algorithm)
                .fit_condensed(&demo())
                .unwrap();
            assert_rows(&d, &expected);
        }
    }

    #[test]
    fn single_on_four_points() {
        let expected = [(0, 1, 0.1, 2), (2, 4, 0.2, 3), (3, 5, 0.3, 4)];
        for algorithm in [Algorithm::Mst, Algorithm::NnChain, Algorithm::Generic] {
            let d = Linkage::new(Method::Single)
                .with_algorithm(algorithm)
                .fit_condensed(&demo())
                .unwrap();
            assert_rows(&d, &expected);
        }
    }

    #[test]
    fn complete_and_average_on_four_points() {
        let d = Linkage::new(Method::Complete).fit_condensed(&demo()).unwrap();
        assert_rows(&d, &[(0, 1, 0.1, 2), (2, 4, 0.4, 3), (3, 5, 0.6, 4)]);

        let d = Linkage::new(Method::Average).fit_condensed(&demo()).unwrap();
        // {0,1} to 2: (0.2 + 0.4) / 2; {0,1,2} to 3: (0.3 + 0.5 + 0.6) / 3.
        assert_rows(&d, &[(0, 1, 0.1, 2), (2, 4, 0.3, 3), (3, 5, 1.4 / 3.0, 4)]);
    }

    #[test]
    fn two_observations() {
        let m = CondensedMatrix::new(vec![2.5]).unwrap();
        for method in Method::ALL {
            let d = Linkage::new(method).fit_condensed(&m).unwrap();
            assert_rows(&d, &[(0, 1, 2.5, 2)]);
        }
    }

    #[test]
    fn all_zero_distances() {
        // Every tie resolves to the lowest slot, so each algorithm chains the
        // observations in index order.
        let m = CondensedMatrix::new(vec![0.0; 10]).unwrap();
        let expected = array![
            [0.0, 1.0, 0.0, 2.0],
            [2.0, 5.0, 0.0, 3.0],
            [3.0, 6.0, 0.0, 4.0],
            [4.0, 7.0, 0.0, 5.0],
        ];
        for method in Method::ALL {
            for algorithm in [Algorithm::Mst, Algorithm::NnChain, Algorithm::Generic] {
                if !algorithm.supports(method) {
                    continue;
                }
                let d = Linkage::new(method)
                    .with_algorithm(algorithm)
                    .fit_condensed(&m)
                    .unwrap();
                assert_eq!(d.to_array(), expected, "{method} / {algorithm}");
            }
        }
    }

    #[test]
    fn huge_distances_stay_finite() {
        let big = 1e200;
        let m = CondensedMatrix::new(vec![big; 3]).unwrap();
        for (method, top) in [
            (Method::Ward, 1.0),
            (Method::Centroid, 0.75f64.sqrt()),
            (Method::Median, 0.75f64.sqrt()),
        ] {
            let z = Linkage::new(method).fit_condensed(&m).unwrap().to_array();
            assert_eq!(z.column(0).to_vec(), vec![0.0, 2.0], "{method}");
            assert_eq!(z.column(1).to_vec(), vec![1.0, 3.0], "{method}");
            assert_eq!(z.column(3).to_vec(), vec![2.0, 3.0], "{method}");
            assert!((z[[0, 2]] / big - 1.0).abs() < 1e-12, "{method}: {}", z[[0, 2]]);
            assert!((z[[1, 2]] / big - top).abs() < 1e-12, "{method}: {}", z[[1, 2]]);
        }
    }

    #[test]
    fn centroid_can_invert() {
        // Equilateral triangle: the centroid of two corners is closer to the third
        // corner than the corners were to each other.
        let m = CondensedMatrix::new(vec![1.0, 1.0, 1.0]).unwrap();
        let d = Linkage::new(Method::Centroid).fit_condensed(&m).unwrap();
        assert_eq!(d.len(), 2);
        assert!(d.steps()[1].dissimilarity < d.steps()[0].dissimilarity);
        assert!((d.steps()[1].dissimilarity - 0.75f64.sqrt()).abs() < 1e-12);
        assert!(!d.is_monotonic());
    }

    #[test]
    fn unsupported_algorithm_is_rejected() {
        let err = Linkage::new(Method::Ward)
            .with_algorithm(Algorithm::Mst)
            .fit_condensed(&demo());
        assert!(matches!(err, Err(Error::InvalidParameter { name: "algorithm", .. })));

        let err = Linkage::new(Method::Median)
            .with_algorithm(Algorithm::NnChain)
            .fit_condensed(&demo());
        assert!(err.is_err());
    }

    #[test]
    fn fit_from_observations() {
        let data = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![10.0, 0.0], vec![10.0, 2.0]];
        let d = Linkage::new(Method::Complete).fit(&data).unwrap();
        assert_rows(
            &d,
            &[(0, 1, 1.0, 2), (2, 3, 2.0, 2), (4, 5, 104.0f64.sqrt(), 4)],
        );

        let d = Linkage::new(Method::Single)
            .with_metric(Metric::Cityblock)
            .fit(&data)
            .unwrap();
        assert_eq!(d.heights(), vec![1.0, 2.0, 10.0]);
    }

    #[test]
    fn algorithm_names_parse() {
        for a in [Algorithm::Auto, Algorithm::Mst, Algorithm::NnChain, Algorithm::Generic] {
            assert_eq!(a.name().parse::<Algorithm>().unwrap(), a);
        }
        assert!("fast".parse::<Algorithm>().is_err());
    }

    #[test]
    fn builder_accessors() {
        let l = Linkage::default()
            .with_method(Method::Weighted)
            .with_metric(Metric::Chebyshev)
            .with_algorithm(Algorithm::Generic);
        assert_eq!(l.method(), Method::Weighted);
        assert_eq!(l.metric(), Metric::Chebyshev);
        assert_eq!(l.algorithm(), Algorithm::Generic);
    }
}
