use thiserror::Error;

/// Errors surfaced by the normalization pipeline.
///
/// Near-zero denominators inside the NMF updates are floored rather than
/// reported; everything here is a precondition or configuration failure.
#[derive(Debug, Error)]
pub enum StainNormError {
    /// The factorization needs at least three color channels.
    #[error("pixel block must have at least 3 channels, got {0}")]
    TooFewChannels(usize),

    /// A zero-pixel region is a caller contract violation.
    #[error("pixel block contains no pixels")]
    EmptyRegion,

    /// The pixel colors are too uniform to yield another extreme color; every
    /// candidate fell at or below the squared-magnitude floor.
    #[error("pixel colors too uniform to extract distinguisher {slot}")]
    DegenerateImage { slot: usize },

    /// V, W and H (or a reference palette and an output block) disagree on
    /// channel count, pixel count or basis size.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("linear algebra failure: {0}")]
    Linalg(#[from] ndarray_linalg::error::LinalgError),
}
