//! Linkage methods and the Lance–Williams update.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// How the distance between two clusters is defined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    /// Nearest pair of members.
    Single,
    /// Farthest pair of members.
    Complete,
    /// Mean over all member pairs (UPGMA).
    Average,
    /// Mean of the two merged clusters' distances (WPGMA).
    Weighted,
    /// Increase in within-cluster variance.
    Ward,
    /// Distance between centroids (UPGMC).
    Centroid,
    /// Distance between unweighted centroids (WPGMC).
    Median,
}

impl Method {
    /// Every method, in SciPy's documentation order.
    pub const ALL: [Method; 7] = [
        Method::Single,
        Method::Complete,
        Method::Average,
        Method::Weighted,
        Method::Centroid,
        Method::Median,
        Method::Ward,
    ];

    /// SciPy name of the method.
    pub fn name(self) -> &'static str {
        match self {
            Method::Single => "single",
            Method::Complete => "complete",
            Method::Average => "average",
            Method::Weighted => "weighted",
            Method::Ward => "ward",
            Method::Centroid => "centroid",
            Method::Median => "median",
        }
    }

    /// Whether merging two mutual nearest neighbors can never bring a third
    /// cluster closer than either of them was. Reducible methods produce
    /// monotone dendrograms and admit the nearest-neighbor chain.
    pub fn is_reducible(self) -> bool {
        !matches!(self, Method::Centroid | Method::Median)
    }

    /// Whether the update formula is only geometrically meaningful for
    /// Euclidean input distances.
    pub fn requires_euclidean(self) -> bool {
        matches!(self, Method::Ward | Method::Centroid | Method::Median)
    }

    /// Distance from cluster `k` to the union of clusters `i` and `j`.
    ///
    /// `d_ki`, `d_kj` and `d_ij` are the current inter-cluster distances and
    /// `n_i`, `n_j`, `n_k` the cluster sizes.
    #[inline]
    pub fn update(self, d_ki: f64, d_kj: f64, d_ij: f64, n_i: f64, n_j: f64, n_k: f64) -> f64 {
        match self {
            Method::Single => d_ki.min(d_kj),
            Method::Complete => d_ki.max(d_kj),
            Method::Average => {
                let s = n_i + n_j;
                (n_i / s) * d_ki + (n_j / s) * d_kj
            }
            Method::Weighted => 0.5 * d_ki + 0.5 * d_kj,
            Method::Ward | Method::Centroid | Method::Median => {
                // Squares overflow past ~1.3e154; work on distances scaled into [0, 1].
                let scale = d_ki.max(d_kj).max(d_ij);
                if scale == 0.0 {
                    return 0.0;
                }
                let (a, b, c) = (d_ki / scale, d_kj / scale, d_ij / scale);
                scale * self.squared_update(a, b, c, n_i, n_j, n_k)
            }
        }
    }

    /// Square-root form of the geometric updates, on pre-scaled distances.
    fn squared_update(self, d_ki: f64, d_kj: f64, d_ij: f64, n_i: f64, n_j: f64, n_k: f64) -> f64 {
        let radicand = match self {
            Method::Ward => {
                let t = n_i + n_j + n_k;
                ((n_i + n_k) * d_ki * d_ki + (n_j + n_k) * d_kj * d_kj - n_k * d_ij * d_ij) / t
            }
            Method::Centroid => {
                let s = n_i + n_j;
                (n_i * d_ki * d_ki + n_j * d_kj * d_kj) / s - n_i * n_j * d_ij * d_ij / (s * s)
            }
            _ => 0.5 * d_ki * d_ki + 0.5 * d_kj * d_kj - 0.25 * d_ij * d_ij,
        };
        clamped_sqrt(radicand)
    }
}

// Rounding can push the radicand a hair below zero; NaN passes through.
#[inline]
fn clamped_sqrt(x: f64) -> f64 {
    if x < 0.0 {
        0.0
    } else {
        x.sqrt()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "single" => Ok(Method::Single),
            "complete" => Ok(Method::Complete),
            "average" => Ok(Method::Average),
            "weighted" => Ok(Method::Weighted),
            "ward" => Ok(Method::Ward),
            "centroid" => Ok(Method::Centroid),
            "median" => Ok(Method::Median),
            other => Err(Error::UnknownMethod(other.to_string())),
        }
    }
}
