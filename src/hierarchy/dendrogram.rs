//! Linkage matrices.
//!
//! A dendrogram over `n` observations is a sequence of `n - 1` merge steps in the
//! SciPy layout. Ids `0..n` are observations; the cluster formed at step `s` gets
//! id `n + s`. Every id except the root (`2n - 2`) is consumed by exactly one
//! later step.

use ndarray::{Array2, ArrayView2};

use super::condensed::{condensed_index, CondensedMatrix};
use super::util::UnionFind;
use crate::error::{Error, Result};

/// One merge in a dendrogram.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    /// Smaller of the two merged ids.
    pub cluster1: usize,
    /// Larger of the two merged ids.
    pub cluster2: usize,
    /// Distance at which the merge happened.
    pub dissimilarity: f64,
    /// Number of observations in the merged cluster.
    pub size: usize,
}

/// A full merge history.
#[derive(Clone, Debug, PartialEq)]
pub struct Dendrogram {
    steps: Vec<Step>,
    observations: usize,
}

impl Dendrogram {
    /// Build a dendrogram from raw merges between observation representatives.
    ///
    /// Each merge `(a, b, dist)` names any observation inside each of the two
    /// clusters being joined. Merges must already be in merge order.
    pub(crate) fn from_merges(merges: &[(usize, usize, f64)], observations: usize) -> Self {
        let mut uf = UnionFind::new(observations);
        // UF root -> current dendrogram id.
        let mut comp_id: Vec<usize> = (0..observations).collect();
        let mut sizes: Vec<usize> = vec![1; observations];
        let mut steps = Vec::with_capacity(merges.len());

        for (s, &(a, b, dist)) in merges.iter().enumerate() {
            let ra = uf.find(a);
            let rb = uf.find(b);
            debug_assert_ne!(ra, rb, "merge joins a cluster with itself");

            let (id_a, id_b) = (comp_id[ra], comp_id[rb]);
            let size = sizes[id_a] + sizes[id_b];
            steps.push(Step {
                cluster1: id_a.min(id_b),
                cluster2: id_a.max(id_b),
                dissimilarity: dist,
                size,
            });

            let root = uf.union_roots(ra, rb);
            comp_id[root] = observations + s;
            sizes.push(size);
        }

        Self {
            steps,
            observations,
        }
    }

    /// Like [`from_merges`](Self::from_merges), but stable-sorts the merges by
    /// distance first. Valid for MST and nearest-neighbor-chain output, where
    /// merges are discovered out of order.
    pub(crate) fn from_unordered_merges(
        mut merges: Vec<(usize, usize, f64)>,
        observations: usize,
    ) -> Self {
        merges.sort_by(|a, b| a.2.total_cmp(&b.2));
        Self::from_merges(&merges, observations)
    }

    /// Validate and wrap an `(n - 1) x 4` linkage matrix.
    pub fn from_array(z: ArrayView2<'_, f64>) -> Result<Self> {
        let (rows, cols) = z.dim();
        if cols != 4 {
            return Err(Error::InvalidLinkage {
                row: 0,
                message: "linkage matrix must have 4 columns",
            });
        }
        if rows == 0 {
            return Err(Error::InvalidLinkage {
                row: 0,
                message: "linkage matrix must have at least one row",
            });
        }

        let n = rows + 1;
        let mut used = vec![false; 2 * n - 1];
        let mut sizes: Vec<usize> = vec![1; n];
        let mut steps = Vec::with_capacity(rows);

        for row in 0..rows {
            let mut ids = [0usize; 2];
            for (col, id) in ids.iter_mut().enumerate() {
                let v = z[[row, col]];
                if !v.is_finite() || v < 0.0 || v.fract() != 0.0 {
                    return Err(Error::InvalidLinkage {
                        row,
                        message: "cluster ids must be non-negative integers",
                    });
                }
                let v = v as usize;
                if v >= n + row {
                    return Err(Error::InvalidLinkage {
                        row,
                        message: "cluster id refers to a cluster not formed yet",
                    });
                }
                *id = v;
            }
            if ids[0] == ids[1] {
                return Err(Error::InvalidLinkage {
                    row,
                    message: "cluster is merged with itself",
                });
            }
            for &id in &ids {
                if used[id] {
                    return Err(Error::InvalidLinkage {
                        row,
                        message: "cluster id is merged more than once",
                    });
                }
                used[id] = true;
            }

            let dist = z[[row, 2]];
            if !dist.is_finite() || dist < 0.0 {
                return Err(Error::InvalidLinkage {
                    row,
                    message: "distances must be finite and non-negative",
                });
            }

            let size = sizes[ids[0]] + sizes[ids[1]];
            if z[[row, 3]] != size as f64 {
                return Err(Error::InvalidLinkage {
                    row,
                    message: "cluster size does not match its children",
                });
            }
            sizes.push(size);

            steps.push(Step {
                cluster1: ids[0].min(ids[1]),
                cluster2: ids[0].max(ids[1]),
                dissimilarity: dist,
                size,
            });
        }

        Ok(Self {
            steps,
            observations: n,
        })
    }

    /// The `(n - 1) x 4` matrix `[cluster1, cluster2, dissimilarity, size]`.
    pub fn to_array(&self) -> Array2<f64> {
        let mut z = Array2::<f64>::zeros((self.steps.len(), 4));
        for (row, step) in self.steps.iter().enumerate() {
            z[[row, 0]] = step.cluster1 as f64;
            z[[row, 1]] = step.cluster2 as f64;
            z[[row, 2]] = step.dissimilarity;
            z[[row, 3]] = step.size as f64;
        }
        z
    }

    /// Number of merge steps (`n - 1`).
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// `true` only for a dendrogram over a single observation.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of observations (leaves).
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Merge steps in order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Id of the root node.
    pub fn root(&self) -> usize {
        self.observations + self.steps.len() - 1
    }

    /// Merge distances in step order.
    pub fn heights(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.dissimilarity).collect()
    }

    /// Whether merge distances never decrease.
    ///
    /// Always holds for reducible methods; centroid and median linkage can
    /// produce inversions.
    pub fn is_monotonic(&self) -> bool {
        self.steps
            .windows(2)
            .all(|w| w[0].dissimilarity <= w[1].dissimilarity)
    }

    /// Children of an internal node, or `None` for a leaf.
    pub(crate) fn children(&self, id: usize) -> Option<(usize, usize)> {
        id.checked_sub(self.observations)
            .map(|s| (self.steps[s].cluster1, self.steps[s].cluster2))
    }

    /// Observations under node `id`, in leaf order.
    ///
    /// Returns `None` when `id` is past the root.
    pub fn members(&self, id: usize) -> Option<Vec<usize>> {
        (id <= self.root()).then(|| self.collect_members(id))
    }

    pub(crate) fn collect_members(&self, id: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            match self.children(node) {
                // Right pushed first so the left subtree is visited first.
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => out.push(node),
            }
        }
        out
    }

    /// Observations in dendrogram leaf order (left to right).
    pub fn leaves_list(&self) -> Vec<usize> {
        self.collect_members(self.root())
    }

    /// Cophenetic distances: for each pair of observations, the height of the
    /// merge that first puts them in the same cluster.
    pub fn cophenetic(&self) -> Result<CondensedMatrix> {
        let n = self.observations;
        let mut out = vec![0.0; n * (n - 1) / 2];
        let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();

        for step in &self.steps {
            let left = std::mem::take(&mut members[step.cluster1]);
            let right = std::mem::take(&mut members[step.cluster2]);
            for &i in &left {
                for &j in &right {
                    out[condensed_index(i, j, n)] = step.dissimilarity;
                }
            }
            let mut merged = left;
            merged.extend(right);
            members.push(merged);
        }

        CondensedMatrix::new(out)
    }
}
