use crate::error::StainNormError;
use crate::float_trait::StainFloat;
use ndarray::{Array2, ArrayView3, Axis};

/// Flatten a pixel block into a channel-by-pixel matrix.
///
/// The block has shape `(rows, cols, channels)`; the result V has shape
/// `(channels, rows * cols)` with one column per pixel, in row-major pixel
/// order. Values are copied as-is: the caller guarantees they are already
/// non-negative (raw intensities or an optical-density-like representation).
pub fn image_to_matrix<F: StainFloat>(
    block: ArrayView3<'_, F>,
) -> Result<Array2<F>, StainNormError> {
    let (rows, cols, channels) = block.dim();
    if channels < 3 {
        return Err(StainNormError::TooFewChannels(channels));
    }
    let n_pixels = rows * cols;
    if n_pixels == 0 {
        return Err(StainNormError::EmptyRegion);
    }

    let mut v = Array2::<F>::zeros((channels, n_pixels));
    for (p, pixel) in block.lanes(Axis(2)).into_iter().enumerate() {
        for (ch, &value) in pixel.iter().enumerate() {
            v[[ch, p]] = value;
        }
    }
    Ok(v)
}
