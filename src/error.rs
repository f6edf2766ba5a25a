use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
pub enum KdIndexError {
    /// A point or query whose coordinate count disagrees with the dimension
    /// the index was constructed with.
    #[error("Dimension mismatch: index holds {expected}-dimensional points, got {actual} coordinates.")]
    DimensionMismatch {
        /// The dimension of the index.
        expected: usize,
        /// The number of coordinates actually supplied.
        actual: usize,
    },
}

/// Alias for `std::result::Result` with this crate's error type.
pub type Result<T> = std::result::Result<T, KdIndexError>;
