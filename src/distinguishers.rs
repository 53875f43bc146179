use crate::config::NUMBER_OF_DISTINGUISHERS;
use crate::error::StainNormError;
use crate::float_trait::StainFloat;
use crate::linalg::{normalized, outer, squared_magnitudes};
use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Find the `NUMBER_OF_DISTINGUISHERS` extreme color vectors of V — the
/// approximate vertices of the simplex containing the observed color cloud
/// (pure unstained background plus each pure stain).
///
/// Iterative extreme-ray search: each slot recenters V against the current
/// anchor (the centroid at first, then the first extreme found), projects the
/// recentered columns onto the orthogonal complement of the directions already
/// claimed, and takes the column of maximal residual magnitude. Returns a
/// `(channels × 3)` matrix with one distinguisher per column, in discovery
/// order; classification into roles happens downstream.
pub fn matrix_to_distinguishers<F: StainFloat>(
    v: &ArrayView2<'_, F>,
    epsilon2: F,
) -> Result<Array2<F>, StainNormError> {
    let channels = v.nrows();
    let n_pixels = v.ncols();

    let inv_n = F::one() / F::from(n_pixels).unwrap();
    let mut anchor: Array1<F> = v.sum_axis(Axis(1)).mapv(|x| x * inv_n);
    let mut kernel = Array2::<F>::eye(channels);
    let mut distinguishers = Array2::<F>::zeros((channels, NUMBER_OF_DISTINGUISHERS));

    for slot in 0..NUMBER_OF_DISTINGUISHERS {
        let centered = recenter_matrix(v, &anchor.view());
        let projected = project_matrix(&kernel, &centered);
        let idx = matrix_to_one_distinguisher(&projected.view(), epsilon2)
            .ok_or(StainNormError::DegenerateImage { slot })?;
        distinguishers.column_mut(slot).assign(&v.column(idx));

        if slot == 0 {
            // later searches measure distance from the first extreme point,
            // not from the centroid
            anchor.assign(&v.column(idx));
        } else if slot + 1 < NUMBER_OF_DISTINGUISHERS {
            // deflate the kernel so the next extreme is linearly independent
            // of the directions already claimed
            let direction = normalized(&projected.column(idx), epsilon2)
                .ok_or(StainNormError::DegenerateImage { slot })?;
            kernel = &kernel - &outer(&direction.view(), &direction.view());
        }
    }

    debug!(
        "extracted {NUMBER_OF_DISTINGUISHERS} distinguishers from {n_pixels} pixels ({channels} channels)"
    );
    Ok(distinguishers)
}

/// Re-express each column of V relative to the anchor point.
pub fn recenter_matrix<F: StainFloat>(
    v: &ArrayView2<'_, F>,
    anchor: &ArrayView1<'_, F>,
) -> Array2<F> {
    v - &anchor.to_owned().insert_axis(Axis(1))
}

/// Project the recentered columns through the kernel — the orthogonal
/// complement of the subspace spanned by previously found distinguishers.
pub fn project_matrix<F: StainFloat>(kernel: &Array2<F>, centered: &Array2<F>) -> Array2<F> {
    kernel.dot(centered)
}

/// Index of the column with maximal squared magnitude, excluding columns at or
/// below the `epsilon2` floor (numerically zero, likely sensor noise).
/// `None` when every column is excluded.
pub fn matrix_to_one_distinguisher<F: StainFloat>(
    m: &ArrayView2<'_, F>,
    epsilon2: F,
) -> Option<usize> {
    let magnitudes = squared_magnitudes(m);
    let mut best: Option<(usize, F)> = None;
    for (i, &sq) in magnitudes.iter().enumerate() {
        if sq > epsilon2 && best.map_or(true, |(_, b)| sq > b) {
            best = Some((i, sq));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EPSILON2;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    const UNSTAINED: [f64; 3] = [0.95, 0.97, 0.99];
    const HEMATOXYLIN: [f64; 3] = [0.20, 0.35, 0.85];
    const EOSIN: [f64; 3] = [0.90, 0.45, 0.60];

    fn mix(w: [f64; 3]) -> [f64; 3] {
        let mut out = [0.0; 3];
        for ch in 0..3 {
            out[ch] =
                w[0] * UNSTAINED[ch] + w[1] * HEMATOXYLIN[ch] + w[2] * EOSIN[ch];
        }
        out
    }

    fn color_matrix(pixels: &[[f64; 3]]) -> Array2<f64> {
        let mut v = Array2::zeros((3, pixels.len()));
        for (p, px) in pixels.iter().enumerate() {
            for ch in 0..3 {
                v[[ch, p]] = px[ch];
            }
        }
        v
    }

    #[test]
    fn recovers_simplex_vertices() {
        let pixels = [
            mix([1.0, 0.0, 0.0]),
            mix([0.0, 1.0, 0.0]),
            mix([0.0, 0.0, 1.0]),
            mix([0.5, 0.5, 0.0]),
            mix([0.25, 0.25, 0.5]),
            mix([0.2, 0.6, 0.2]),
        ];
        let v = color_matrix(&pixels);
        let d = matrix_to_distinguishers(&v.view(), EPSILON2).unwrap();

        // each pure color must appear among the three columns
        for pure in [UNSTAINED, HEMATOXYLIN, EOSIN] {
            let found = (0..3).any(|k| {
                (0..3).all(|ch| (d[[ch, k]] - pure[ch]).abs() < 1e-9)
            });
            assert!(found, "pure color {pure:?} not recovered: {d:?}");
        }
    }

    #[test]
    fn distinguishers_are_pairwise_independent() {
        let pixels = [
            mix([1.0, 0.0, 0.0]),
            mix([0.0, 1.0, 0.0]),
            mix([0.0, 0.0, 1.0]),
            mix([0.4, 0.3, 0.3]),
        ];
        let v = color_matrix(&pixels);
        let d = matrix_to_distinguishers(&v.view(), EPSILON2).unwrap();
        for a in 0..3 {
            for b in (a + 1)..3 {
                let ca = d.column(a);
                let cb = d.column(b);
                let cosine =
                    ca.dot(&cb) / (ca.dot(&ca) * cb.dot(&cb)).sqrt();
                assert!(cosine.abs() < 0.999, "columns {a} and {b} collinear");
            }
        }
    }

    #[test]
    fn uniform_block_is_degenerate() {
        let pixels = [[0.5, 0.5, 0.5]; 8];
        let v = color_matrix(&pixels);
        match matrix_to_distinguishers(&v.view(), EPSILON2) {
            Err(StainNormError::DegenerateImage { slot: 0 }) => {}
            other => panic!("expected DegenerateImage at slot 0, got {other:?}"),
        }
    }

    #[test]
    fn one_distinguisher_ignores_columns_below_floor() {
        let m = array![[1e-8, 0.3, 0.0], [0.0, 0.4, 1e-8]];
        assert_eq!(matrix_to_one_distinguisher(&m.view(), EPSILON2), Some(1));

        let tiny = array![[1e-8, 0.0], [0.0, 1e-8]];
        assert_eq!(matrix_to_one_distinguisher(&tiny.view(), EPSILON2), None);
    }

    #[test]
    fn recenter_subtracts_anchor_from_every_column() {
        let v = array![[1.0, 2.0], [3.0, 4.0]];
        let anchor = array![1.0, 3.0];
        let c = recenter_matrix(&v.view(), &anchor.view());
        assert_abs_diff_eq!(c[[0, 0]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c[[1, 1]], 1.0, epsilon = 1e-12);
    }
}
