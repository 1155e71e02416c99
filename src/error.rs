use thiserror::Error;

/// Errors returned by the linkage routines in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Input slice is empty.
    #[error("empty input")]
    EmptyInput,

    /// Condensed vector length is not `n * (n - 1) / 2` for any integer `n >= 2`.
    #[error("invalid condensed matrix length {len}: must be n * (n - 1) / 2 for some n >= 2")]
    InvalidCondensedLength {
        /// Length of the rejected vector.
        len: usize,
    },

    /// Clustering needs at least two observations.
    #[error("at least two observations are required, got {n}")]
    TooFewObservations {
        /// Number of observations supplied.
        n: usize,
    },

    /// A distance is NaN or infinite.
    #[error("non-finite distance at condensed index {index}")]
    NonFiniteDistance {
        /// Position in the condensed vector.
        index: usize,
    },

    /// A distance is negative.
    #[error("negative distance {value} at condensed index {index}")]
    NegativeDistance {
        /// Position in the condensed vector.
        index: usize,
        /// Offending value.
        value: f64,
    },

    /// Linkage method name is not recognized.
    #[error("unknown linkage method {0:?}")]
    UnknownMethod(String),

    /// Distance metric name is not recognized.
    #[error("unknown distance metric {0:?}")]
    UnknownMetric(String),

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Requested cluster count is incompatible with the dataset.
    #[error("invalid cluster count: requested {requested}, but dataset has {n_items} items")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of items in the dataset.
        n_items: usize,
    },

    /// Points in a dataset have inconsistent dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// A linkage matrix does not describe a valid dendrogram.
    #[error("invalid linkage matrix at row {row}: {message}")]
    InvalidLinkage {
        /// Offending row.
        row: usize,
        /// Human-readable explanation.
        message: &'static str,
    },
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
