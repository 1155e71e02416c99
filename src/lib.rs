//! Fast hierarchical clustering.
//!
//! `rust_fast_cluster` computes SciPy-compatible linkage matrices from condensed
//! distance matrices, using the algorithms from Müllner's `fastcluster`:
//! a minimum spanning tree for single linkage, the nearest-neighbor chain for the
//! other reducible methods, and a heap-based search for centroid and median.
//!
//! The primary entry point mirrors `scipy.cluster.hierarchy.linkage`:
//!
//! ```rust
//! let d = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
//! let z = rust_fast_cluster::linkage(&d, "ward").unwrap();
//! assert_eq!(z.dim(), (3, 4));
//! assert_eq!(z[[2, 3]], 4.0);
//! ```
//!
//! Typed building blocks (methods, metrics, dendrogram queries, flat clusters)
//! live under [`hierarchy`]. With the `python` feature the crate also builds the
//! `_rust_fast_cluster` extension module.

#![forbid(unsafe_code)]

pub mod error;
pub mod hierarchy;

#[cfg(feature = "python")]
mod python;

use ndarray::Array2;

pub use error::{Error, Result};
pub use hierarchy::{
    Agglomerative, Algorithm, Clustering, CondensedMatrix, Criterion, Dendrogram, Linkage, Method,
    Metric, Step,
};

/// Hierarchical clustering of a condensed distance vector.
///
/// `d` holds the upper triangle of an `n x n` distance matrix (length
/// `n * (n - 1) / 2`). `method` is one of `single`, `complete`, `average`,
/// `weighted`, `ward`, `centroid`, `median`.
///
/// Returns the `(n - 1) x 4` linkage matrix.
pub fn linkage(d: &[f64], method: &str) -> Result<Array2<f64>> {
    let method: Method = method.parse()?;
    let distances = CondensedMatrix::new(d.to_vec())?;
    Ok(Linkage::new(method).fit_condensed(&distances)?.to_array())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn linkage_matches_scipy_ward() {
        let z = linkage(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6], "ward").unwrap();
        let expected = array![
            [0.0, 1.0, 0.1, 2.0],
            [2.0, 4.0, 0.13f64.sqrt(), 3.0],
            [3.0, 5.0, 0.315f64.sqrt(), 4.0]
        ];
        assert_eq!(z.dim(), (3, 4));
        for (a, b) in z.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12, "{z}");
        }
    }

    #[test]
    fn linkage_reports_bad_input() {
        assert!(matches!(
            linkage(&[0.1, 0.2, 0.3], "nearest"),
            Err(Error::UnknownMethod(_))
        ));
        assert!(matches!(
            linkage(&[0.1, 0.2], "ward"),
            Err(Error::InvalidCondensedLength { len: 2 })
        ));
        assert!(matches!(linkage(&[], "single"), Err(Error::EmptyInput)));
        assert!(matches!(
            linkage(&[0.1, f64::NAN, 0.3], "single"),
            Err(Error::NonFiniteDistance { index: 1 })
        ));
    }
}
