//! Condensed distance matrices.
//!
//! A symmetric `n x n` distance matrix with a zero diagonal carries only
//! `n * (n - 1) / 2` useful values. The condensed form stores the upper triangle
//! row by row:
//!
//! ```text
//! (0,1) (0,2) ... (0,n-1) (1,2) ... (1,n-1) ... (n-2,n-1)
//! ```
//!
//! This is the layout SciPy's `pdist`/`squareform` use, and the input format of
//! [`linkage`](crate::linkage).

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};

const SQUARE_TOLERANCE: f64 = 1e-10;

/// Number of observations `n` such that `n * (n - 1) / 2 == len`, if one exists.
///
/// Returns `None` for lengths that are not triangular numbers, and for `len == 0`
/// (a single observation has nothing to cluster).
pub fn observations_for_len(len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let n = ((1.0 + (1.0 + 8.0 * len as f64).sqrt()) / 2.0).round() as usize;
    if n >= 2 && n * (n - 1) / 2 == len {
        Some(n)
    } else {
        None
    }
}

/// Flat index of the pair `(i, j)` in a condensed matrix over `n` observations.
///
/// The pair is unordered; `i` and `j` must differ.
#[inline]
pub fn condensed_index(i: usize, j: usize, n: usize) -> usize {
    debug_assert!(i != j && i < n && j < n);
    let (i, j) = if i < j { (i, j) } else { (j, i) };
    n * i - i * (i + 1) / 2 + (j - i - 1)
}

/// Validated upper-triangle distance storage.
#[derive(Clone, Debug, PartialEq)]
pub struct CondensedMatrix {
    data: Vec<f64>,
    n: usize,
}

impl CondensedMatrix {
    /// Wrap a condensed distance vector.
    ///
    /// Every entry must be finite and non-negative, and the length must be
    /// `n * (n - 1) / 2` for some `n >= 2`.
    pub fn new(data: Vec<f64>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        let n = observations_for_len(data.len())
            .ok_or(Error::InvalidCondensedLength { len: data.len() })?;

        for (index, &value) in data.iter().enumerate() {
            if !value.is_finite() {
                return Err(Error::NonFiniteDistance { index });
            }
            if value < 0.0 {
                return Err(Error::NegativeDistance { index, value });
            }
        }

        Ok(Self { data, n })
    }

    /// Condense a full square distance matrix.
    ///
    /// The matrix must be square, symmetric and have a zero diagonal.
    pub fn from_square(square: ArrayView2<'_, f64>) -> Result<Self> {
        let (rows, cols) = square.dim();
        if rows != cols {
            return Err(Error::DimensionMismatch {
                expected: rows,
                found: cols,
            });
        }
        if rows < 2 {
            return Err(Error::TooFewObservations { n: rows });
        }

        let mut data = Vec::with_capacity(rows * (rows - 1) / 2);
        for i in 0..rows {
            if square[[i, i]].abs() > SQUARE_TOLERANCE {
                return Err(Error::InvalidParameter {
                    name: "square",
                    message: "diagonal must be zero",
                });
            }
            for j in (i + 1)..rows {
                let upper = square[[i, j]];
                if (upper - square[[j, i]]).abs() > SQUARE_TOLERANCE {
                    return Err(Error::InvalidParameter {
                        name: "square",
                        message: "matrix must be symmetric",
                    });
                }
                data.push(upper);
            }
        }

        Self::new(data)
    }

    /// Number of observations.
    pub fn observations(&self) -> usize {
        self.n
    }

    /// Number of stored pairwise distances.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false`: a valid matrix covers at least one pair.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Distance between observations `i` and `j` (0 on the diagonal).
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i == j {
            0.0
        } else {
            self.data[condensed_index(i, j, self.n)]
        }
    }

    /// The raw condensed vector.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume the matrix, returning the condensed vector.
    pub fn into_inner(self) -> Vec<f64> {
        self.data
    }

    /// Expand to the full symmetric `n x n` matrix.
    pub fn to_square(&self) -> Array2<f64> {
        let n = self.n;
        let mut out = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            for j in (i + 1)..n {
                let d = self.data[condensed_index(i, j, n)];
                out[[i, j]] = d;
                out[[j, i]] = d;
            }
        }
        out
    }
}

/// Distance between two observation vectors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Metric {
    /// `sqrt(sum((a - b)^2))`
    #[default]
    Euclidean,
    /// `sum((a - b)^2)`
    SqEuclidean,
    /// `sum(|a - b|)`
    Cityblock,
    /// `max(|a - b|)`
    Chebyshev,
    /// `1 - a.b / (|a| |b|)`
    Cosine,
}

impl Metric {
    /// SciPy name of the metric.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Euclidean => "euclidean",
            Metric::SqEuclidean => "sqeuclidean",
            Metric::Cityblock => "cityblock",
            Metric::Chebyshev => "chebyshev",
            Metric::Cosine => "cosine",
        }
    }

    /// Distance between `a` and `b`. Both slices must have the same length.
    pub fn distance(self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        let diffs = a.iter().zip(b.iter()).map(|(x, y)| x - y);
        match self {
            Metric::Euclidean => diffs.map(|d| d * d).sum::<f64>().sqrt(),
            Metric::SqEuclidean => diffs.map(|d| d * d).sum(),
            Metric::Cityblock => diffs.map(f64::abs).sum(),
            Metric::Chebyshev => diffs.map(f64::abs).fold(0.0, f64::max),
            Metric::Cosine => cosine_distance(a, b),
        }
    }
}

fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        // Zero vectors have no direction: equal to each other, orthogonal to the rest.
        return if na == nb { 0.0 } else { 1.0 };
    }
    (1.0 - dot / (na * nb)).max(0.0)
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "euclidean" => Ok(Metric::Euclidean),
            "sqeuclidean" => Ok(Metric::SqEuclidean),
            "cityblock" | "manhattan" => Ok(Metric::Cityblock),
            "chebyshev" => Ok(Metric::Chebyshev),
            "cosine" => Ok(Metric::Cosine),
            other => Err(Error::UnknownMetric(other.to_string())),
        }
    }
}

/// Pairwise distances between observations, in condensed form.
pub fn pdist(data: &[Vec<f64>], metric: Metric) -> Result<CondensedMatrix> {
    let n = data.len();
    if n == 0 {
        return Err(Error::EmptyInput);
    }
    if n < 2 {
        return Err(Error::TooFewObservations { n });
    }

    let d = data[0].len();
    if d == 0 {
        return Err(Error::InvalidParameter {
            name: "dimension",
            message: "must be at least 1",
        });
    }
    for point in data.iter().skip(1) {
        if point.len() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: point.len(),
            });
        }
    }

    let mut out = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            out.push(metric.distance(&data[i], &data[j]));
        }
    }
    CondensedMatrix::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn observation_count_from_length() {
        assert_eq!(observations_for_len(1), Some(2));
        assert_eq!(observations_for_len(3), Some(3));
        assert_eq!(observations_for_len(6), Some(4));
        assert_eq!(observations_for_len(4950), Some(100));
        assert_eq!(observations_for_len(0), None);
        assert_eq!(observations_for_len(2), None);
        assert_eq!(observations_for_len(7), None);
    }

    #[test]
    fn index_follows_pair_enumeration() {
        let n = 4;
        let pairs = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];
        for (expected, &(i, j)) in pairs.iter().enumerate() {
            assert_eq!(condensed_index(i, j, n), expected);
            assert_eq!(condensed_index(j, i, n), expected);
        }
    }

    #[test]
    fn rejects_bad_vectors() {
        assert!(matches!(CondensedMatrix::new(vec![]), Err(Error::EmptyInput)));
        assert!(matches!(
            CondensedMatrix::new(vec![1.0, 2.0]),
            Err(Error::InvalidCondensedLength { len: 2 })
        ));
        assert!(matches!(
            CondensedMatrix::new(vec![1.0, f64::NAN, 2.0]),
            Err(Error::NonFiniteDistance { index: 1 })
        ));
        assert!(matches!(
            CondensedMatrix::new(vec![1.0, 2.0, f64::INFINITY]),
            Err(Error::NonFiniteDistance { index: 2 })
        ));
        assert!(matches!(
            CondensedMatrix::new(vec![1.0, -2.0, 3.0]),
            Err(Error::NegativeDistance { index: 1, .. })
        ));
    }

    #[test]
    fn square_round_trip_preserves_entries() {
        let m = CondensedMatrix::new(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).unwrap();
        assert_eq!(m.observations(), 4);
        assert_eq!(m.get(2, 1), 0.4);
        assert_eq!(m.get(3, 3), 0.0);

        let square = m.to_square();
        assert_eq!(square[[3, 0]], 0.3);
        assert_eq!(square[[0, 3]], 0.3);
        let back = CondensedMatrix::from_square(square.view()).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn from_square_rejects_asymmetry() {
        let square = array![[0.0, 1.0], [2.0, 0.0]];
        assert!(CondensedMatrix::from_square(square.view()).is_err());

        let diag = array![[1.0, 1.0], [1.0, 0.0]];
        assert!(CondensedMatrix::from_square(diag.view()).is_err());

        let rect = array![[0.0, 1.0, 2.0], [1.0, 0.0, 3.0]];
        assert!(matches!(
            CondensedMatrix::from_square(rect.view()),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn metrics_on_a_right_triangle() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert_eq!(Metric::Euclidean.distance(&a, &b), 5.0);
        assert_eq!(Metric::SqEuclidean.distance(&a, &b), 25.0);
        assert_eq!(Metric::Cityblock.distance(&a, &b), 7.0);
        assert_eq!(Metric::Chebyshev.distance(&a, &b), 4.0);

        assert!(Metric::Cosine.distance(&[1.0, 0.0], &[2.0, 0.0]).abs() < 1e-12);
        assert!((Metric::Cosine.distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-12);
        assert_eq!(Metric::Cosine.distance(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
        assert_eq!(Metric::Cosine.distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[test]
    fn metric_names_parse() {
        for m in [
            Metric::Euclidean,
            Metric::SqEuclidean,
            Metric::Cityblock,
            Metric::Chebyshev,
            Metric::Cosine,
        ] {
            assert_eq!(m.name().parse::<Metric>().unwrap(), m);
        }
        assert_eq!("manhattan".parse::<Metric>().unwrap(), Metric::Cityblock);
        assert!(matches!(
            "hamming".parse::<Metric>(),
            Err(Error::UnknownMetric(_))
        ));
    }

    #[test]
    fn pdist_validates_input() {
        let data: Vec<Vec<f64>> = vec![];
        assert!(matches!(pdist(&data, Metric::Euclidean), Err(Error::EmptyInput)));
        assert!(matches!(
            pdist(&[vec![1.0]], Metric::Euclidean),
            Err(Error::TooFewObservations { n: 1 })
        ));
        assert!(matches!(
            pdist(&[vec![1.0, 2.0], vec![1.0]], Metric::Euclidean),
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            pdist(&[vec![], vec![]], Metric::Euclidean),
            Err(Error::InvalidParameter {
                name: "dimension",
                ..
            })
        ));

        let m = pdist(&[vec![0.0], vec![1.0], vec![3.0]], Metric::Euclidean).unwrap();
        assert_eq!(m.as_slice(), &[1.0, 3.0, 2.0]);
    }
}
