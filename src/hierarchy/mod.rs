//! Hierarchical agglomerative clustering.
//!
//! Bottom-up: start with each observation as its own cluster, repeatedly merge
//! the two closest clusters until one remains. The merge history forms a
//! **dendrogram**, a binary tree you can cut at any height to get flat clusters.
//!
//! ## Linkage methods
//!
//! The method determines the distance between clusters. After each merge, the
//! distance from every other cluster `k` to the new cluster `i ∪ j` is computed
//! from the old distances alone (the Lance–Williams recurrence), so the input
//! only ever needs to be a condensed pairwise distance matrix.
//!
//! | Method | Distance | Effect |
//! |--------|----------|--------|
//! | Single | min(pairwise) | Chaining; elongated clusters |
//! | Complete | max(pairwise) | Compact clusters |
//! | Average | mean(pairwise) | Balanced compromise |
//! | Weighted | mean of the two halves | Like average, ignores sizes |
//! | Ward | Variance increase | Minimizes within-cluster variance |
//! | Centroid | Centroid distance | Can produce inversions |
//! | Median | Unweighted centroid distance | Can produce inversions |
//!
//! ## Output
//!
//! [`Dendrogram::to_array`] yields the SciPy linkage matrix: one row
//! `[id1, id2, distance, size]` per merge, where ids below `n` are observations
//! and id `n + s` is the cluster created by row `s`.
//!
//! ## Usage
//!
//! ```rust
//! use rust_fast_cluster::hierarchy::{cut_tree, CondensedMatrix, Linkage, Method};
//!
//! // Four points; pairs (0,1), (0,2), (0,3), (1,2), (1,3), (2,3).
//! let d = CondensedMatrix::new(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).unwrap();
//! let tree = Linkage::new(Method::Ward).fit_condensed(&d).unwrap();
//!
//! assert_eq!(tree.len(), 3);
//! assert_eq!(tree.steps()[0].cluster2, 1);
//! assert_eq!(cut_tree(&tree, 2).unwrap(), vec![0, 0, 0, 1]);
//! ```
//!
//! ## References
//!
//! Müllner, D. (2011). "Modern hierarchical, agglomerative clustering algorithms."
//! arXiv:1109.2378.

mod condensed;
mod dendrogram;
mod flat;
mod linkage;
mod method;
mod traits;
mod util;

pub use condensed::{condensed_index, observations_for_len, pdist, CondensedMatrix, Metric};
pub use dendrogram::{Dendrogram, Step};
pub use flat::{cut_tree, fcluster, Agglomerative, Criterion};
pub use linkage::{Algorithm, Linkage};
pub use method::Method;
pub use traits::Clustering;
