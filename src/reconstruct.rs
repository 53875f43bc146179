use crate::error::StainNormError;
use crate::float_trait::StainFloat;
use ndarray::{Array3, ArrayView1, ArrayView2};
use num_traits::Float;
use rayon::prelude::*;

/// Recolor source concentrations with a reference palette.
///
/// Each output pixel is the reference basis colors mixed with the *source*
/// pixel's concentration weights: the block keeps its own tissue structure
/// but takes on the reference image's staining palette. Computes
/// `W_ref · H`, clamps every channel into `[0, unstained_ref[c]]` (the
/// factorization may overshoot, and nothing in a stained pixel is brighter
/// than the background), and reshapes into an output block of the given
/// `(rows, cols, channels)` shape, pixels in the same row-major order as the
/// concentration columns.
///
/// # Arguments
///
/// * `concentrations`      – `(3 × N)` source concentration matrix.
/// * `reference_basis`     – `(channels × 3)` reference basis, canonical
///                            column order unstained, Hematoxylin, Eosin.
/// * `reference_unstained` – the reference background color, length `channels`.
/// * `shape`               – `(rows, cols, channels)` of the output block,
///                            with `rows · cols = N`.
pub fn nmfs_to_image<F: StainFloat>(
    concentrations: &ArrayView2<'_, F>,
    reference_basis: &ArrayView2<'_, F>,
    reference_unstained: &ArrayView1<'_, F>,
    shape: (usize, usize, usize),
) -> Result<Array3<F>, StainNormError> {
    let (rows, cols, channels) = shape;
    if reference_basis.nrows() != channels || reference_unstained.len() != channels {
        return Err(StainNormError::DimensionMismatch(format!(
            "output block has {} channels but the reference palette has {} (unstained {})",
            channels,
            reference_basis.nrows(),
            reference_unstained.len()
        )));
    }
    if reference_basis.ncols() != concentrations.nrows() {
        return Err(StainNormError::DimensionMismatch(format!(
            "reference basis has {} columns but concentrations have {} rows",
            reference_basis.ncols(),
            concentrations.nrows()
        )));
    }
    let n_pixels = rows * cols;
    if concentrations.ncols() != n_pixels {
        return Err(StainNormError::DimensionMismatch(format!(
            "output block has {} pixels but concentrations have {} columns",
            n_pixels,
            concentrations.ncols()
        )));
    }

    // (N × channels), one row per output pixel
    let flat = concentrations.t().dot(&reference_basis.t());

    let zero = F::zero();
    let mut data: Vec<F> = vec![zero; n_pixels * channels];
    data.par_chunks_mut(channels).enumerate().for_each(|(p, pixel)| {
        for ch in 0..channels {
            pixel[ch] = Float::min(
                Float::max(flat[[p, ch]], zero),
                reference_unstained[ch],
            );
        }
    });

    Array3::from_shape_vec((rows, cols, channels), data)
        .map_err(|e| StainNormError::DimensionMismatch(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn palette() -> (ndarray::Array2<f64>, ndarray::Array1<f64>) {
        let basis = array![
            [1.0, 0.1, 0.95],
            [1.0, 0.2, 0.40],
            [1.0, 0.9, 0.55],
        ];
        let unstained = array![1.0, 1.0, 1.0];
        (basis, unstained)
    }

    #[test]
    fn mixes_reference_colors_with_source_weights() {
        let (basis, unstained) = palette();
        let h = array![[1.0, 0.0], [0.0, 0.5], [0.0, 0.5]];
        let out = nmfs_to_image(&h.view(), &basis.view(), &unstained.view(), (1, 2, 3))
            .unwrap();
        // pixel 0: pure unstained
        for ch in 0..3 {
            assert_abs_diff_eq!(out[[0, 0, ch]], 1.0, epsilon = 1e-12);
        }
        // pixel 1: equal mix of the two stains
        assert_abs_diff_eq!(out[[0, 1, 0]], 0.525, epsilon = 1e-12);
        assert_abs_diff_eq!(out[[0, 1, 1]], 0.30, epsilon = 1e-12);
        assert_abs_diff_eq!(out[[0, 1, 2]], 0.725, epsilon = 1e-12);
    }

    #[test]
    fn clamps_overshoot_into_the_valid_range() {
        let (basis, unstained) = palette();
        // overshooting unstained weight would exceed the background color
        let h = array![[2.0], [0.0], [0.0]];
        let out = nmfs_to_image(&h.view(), &basis.view(), &unstained.view(), (1, 1, 3))
            .unwrap();
        for ch in 0..3 {
            assert_abs_diff_eq!(out[[0, 0, ch]], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_pixel_count_mismatch() {
        let (basis, unstained) = palette();
        let h = ndarray::Array2::<f64>::zeros((3, 4));
        match nmfs_to_image(&h.view(), &basis.view(), &unstained.view(), (1, 2, 3)) {
            Err(StainNormError::DimensionMismatch(_)) => {}
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn rejects_channel_mismatch() {
        let (basis, unstained) = palette();
        let h = ndarray::Array2::<f64>::zeros((3, 1));
        match nmfs_to_image(&h.view(), &basis.view(), &unstained.view(), (1, 1, 4)) {
            Err(StainNormError::DimensionMismatch(_)) => {}
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
    }
}
