//! Flat clusterings cut from a dendrogram.

use std::collections::HashMap;

use super::condensed::Metric;
use super::dendrogram::Dendrogram;
use super::linkage::Linkage;
use super::method::Method;
use super::traits::Clustering;
use super::util::UnionFind;
use crate::error::{Error, Result};

/// Rule for turning a dendrogram into flat clusters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Criterion {
    /// Cut wherever a subtree's largest merge distance exceeds the threshold.
    Distance(f64),
    /// Use the smallest threshold that leaves at most this many clusters.
    MaxClust(usize),
}

/// Assign flat cluster labels to every observation.
///
/// Labels are 0-based and numbered in dendrogram leaf order. A node becomes a
/// flat cluster when no merge anywhere below it is above the threshold, so
/// inversions from centroid or median linkage never split a cluster that an
/// ancestor keeps together.
pub fn fcluster(dendrogram: &Dendrogram, criterion: Criterion) -> Result<Vec<usize>> {
    let n = dendrogram.observations();
    let max_dists = max_dists(dendrogram);

    let threshold = match criterion {
        Criterion::Distance(t) => {
            if !t.is_finite() || t < 0.0 {
                return Err(Error::InvalidParameter {
                    name: "t",
                    message: "threshold must be finite and non-negative",
                });
            }
            t
        }
        Criterion::MaxClust(k) => {
            if k == 0 || k > n {
                return Err(Error::InvalidClusterCount {
                    requested: k,
                    n_items: n,
                });
            }
            maxclust_threshold(&max_dists, k)
        }
    };

    Ok(cut_at(dendrogram, &max_dists, threshold))
}

/// Cut the dendrogram into exactly `k` clusters by replaying its first `n - k`
/// merges.
///
/// Labels are numbered by first appearance over observation index.
pub fn cut_tree(dendrogram: &Dendrogram, k: usize) -> Result<Vec<usize>> {
    let n = dendrogram.observations();
    if k == 0 || k > n {
        return Err(Error::InvalidClusterCount {
            requested: k,
            n_items: n,
        });
    }

    let mut uf = UnionFind::new(n);
    // Dendrogram id -> any observation inside it.
    let mut rep: Vec<usize> = (0..n).collect();
    for step in &dendrogram.steps()[..n - k] {
        let (a, b) = (rep[step.cluster1], rep[step.cluster2]);
        uf.union(a, b);
        rep.push(a);
    }

    let mut labels = Vec::with_capacity(n);
    let mut seen: HashMap<usize, usize> = HashMap::with_capacity(k);
    for i in 0..n {
        let root = uf.find(i);
        let next = seen.len();
        labels.push(*seen.entry(root).or_insert(next));
    }
    Ok(labels)
}

/// For each step, the largest merge distance in its subtree.
fn max_dists(dendrogram: &Dendrogram) -> Vec<f64> {
    let n = dendrogram.observations();
    let mut out: Vec<f64> = Vec::with_capacity(dendrogram.len());
    for step in dendrogram.steps() {
        let mut m = step.dissimilarity;
        for child in [step.cluster1, step.cluster2] {
            if child >= n {
                m = m.max(out[child - n]);
            }
        }
        out.push(m);
    }
    out
}

/// Smallest candidate threshold leaving at most `k` clusters.
///
/// `max_dists` grows toward the root, so the number of clusters at threshold `t`
/// is one more than the number of nodes whose `max_dist` exceeds `t`.
fn maxclust_threshold(max_dists: &[f64], k: usize) -> f64 {
    let n = max_dists.len() + 1;
    if k >= n {
        return f64::NEG_INFINITY;
    }

    let mut sorted = max_dists.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    for &t in &sorted {
        let above = sorted.len() - sorted.partition_point(|&m| m <= t);
        if above < k {
            return t;
        }
    }
    sorted.last().copied().unwrap_or(0.0)
}

fn cut_at(dendrogram: &Dendrogram, max_dists: &[f64], threshold: f64) -> Vec<usize> {
    let n = dendrogram.observations();
    let mut labels = vec![0usize; n];
    let mut next = 0;
    let mut stack = vec![dendrogram.root()];

    while let Some(node) = stack.pop() {
        match dendrogram.children(node) {
            Some((left, right)) if max_dists[node - n] > threshold => {
                stack.push(right);
                stack.push(left);
            }
            _ => {
                for leaf in dendrogram.collect_members(node) {
                    labels[leaf] = next;
                }
                next += 1;
            }
        }
    }
    labels
}

/// Agglomerative clustering into a fixed number of clusters.
#[derive(Debug, Clone)]
pub struct Agglomerative {
    n_clusters: usize,
    method: Method,
    metric: Metric,
}

impl Agglomerative {
    /// Create a clusterer producing `n_clusters` clusters with Ward linkage.
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            method: Method::Ward,
            metric: Metric::Euclidean,
        }
    }

    /// Set the linkage method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the distance metric between points.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Build the full dendrogram without cutting it.
    pub fn fit_dendrogram(&self, data: &[Vec<f32>]) -> Result<Dendrogram> {
        let data: Vec<Vec<f64>> = data
            .iter()
            .map(|p| p.iter().map(|&x| f64::from(x)).collect())
            .collect();
        Linkage::new(self.method)
            .with_metric(self.metric)
            .fit(&data)
    }
}

impl Default for Agglomerative {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Clustering for Agglomerative {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>> {
        let n = data.len();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.n_clusters == 0 || self.n_clusters > n {
            return Err(Error::InvalidClusterCount {
                requested: self.n_clusters,
                n_items: n,
            });
        }
        if n == 1 {
            return Ok(vec![0]);
        }

        let dendrogram = self.fit_dendrogram(data)?;
        cut_tree(&dendrogram, self.n_clusters)
    }

    fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}
