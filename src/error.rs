use thiserror::Error;

/// Result alias for `clade`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the clustering engine.
///
/// Every variant describes malformed or out-of-range input. Nothing in the
/// engine repairs input on the caller's behalf.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Input had no entities or no features.
    #[error("empty input provided")]
    EmptyInput,

    /// Fewer entities than the operation needs.
    #[error("too few entities: need at least {min}, found {found}")]
    TooFewEntities {
        /// Minimum number of entities.
        min: usize,
        /// Number of entities supplied.
        found: usize,
    },

    /// Rows (or paired inputs) have inconsistent length.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// A feature value was NaN or infinite.
    #[error("non-finite value at row {row}, column {col}")]
    NonFinite {
        /// Entity index.
        row: usize,
        /// Feature index.
        col: usize,
    },

    /// Two entities share a label.
    #[error("duplicate entity label '{0}'")]
    DuplicateLabel(String),

    /// Label count differs from the number of entities.
    #[error("expected {expected} labels, found {found}")]
    LabelCount {
        /// Number of entities.
        expected: usize,
        /// Number of labels supplied.
        found: usize,
    },

    /// A dissimilarity matrix was not square.
    #[error("dissimilarity matrix is not square: {rows}x{cols}")]
    NotSquare {
        /// Row count.
        rows: usize,
        /// Column count.
        cols: usize,
    },

    /// A dissimilarity matrix was not symmetric.
    #[error("dissimilarity matrix is not symmetric at ({row}, {col})")]
    NotSymmetric {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
    },

    /// A dissimilarity was negative, non-finite, or a diagonal entry was non-zero.
    #[error("invalid dissimilarity {value} at ({row}, {col})")]
    InvalidDistance {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// Offending value.
        value: f64,
    },

    /// Invalid number of clusters requested.
    #[error("cannot create {requested} clusters from {n_items} items")]
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// A built-in metric overflowed `f64` on finite features.
    #[error("distance between entities {row} and {col} overflows f64; rescale the features")]
    DistanceOverflow {
        /// First entity.
        row: usize,
        /// Second entity.
        col: usize,
    },

    /// A feature column spans more than `f64` can represent.
    #[error("range of feature column {col} overflows f64; rescale the features")]
    RangeOverflow {
        /// Feature index.
        col: usize,
    },

    /// Cut height was negative or NaN.
    #[error("invalid cut height {0}")]
    InvalidHeight(f64),

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// A linkage needs the raw feature vectors but only distances were given.
    #[error("{0} linkage needs the feature matrix")]
    MissingFeatures(&'static str),

    /// A validity method could not recommend a cluster count.
    #[error("{0} gave no recommendation for the number of clusters")]
    NoRecommendation(&'static str),
}

/// Non-fatal conditions raised while clustering.
///
/// Warnings travel with the result instead of aborting it. They are also
/// emitted as `tracing` events at `WARN` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Warning {
    /// K-means hit its iteration cap while assignments were still changing.
    NotConverged {
        /// Restart index.
        restart: usize,
        /// Iterations performed.
        iterations: usize,
    },
    /// A k-means centroid lost all members and kept its previous position.
    DegenerateCluster {
        /// Restart index.
        restart: usize,
        /// Iteration at which the cluster was empty.
        iteration: usize,
        /// Centroid index within the restart.
        cluster: usize,
    },
}
