use crate::config::{NUMBER_OF_DISTINGUISHERS, NUMBER_OF_STAINS};
use crate::error::StainNormError;
use crate::float_trait::StainFloat;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use ndarray_linalg::Inverse;
use num_traits::Float;
use rayon::prelude::*;

/// Role assignment for the three distinguishers: indices into the
/// discovery-order distinguisher list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StainRoles {
    pub unstained: usize,
    pub hematoxylin: usize,
    pub eosin: usize,
}

/// Classify the distinguishers into unstained / Hematoxylin / Eosin roles.
///
/// The brightest vector (largest channel sum) is the unstained background.
/// Of the remaining two, Hematoxylin stains blue-purple and Eosin pink, so
/// the vector whose first channel exceeds its last channel the least is
/// Hematoxylin (blue-dominant) and the other is Eosin (red-dominant).
pub fn distinguishers_to_colors<F: StainFloat>(
    distinguishers: &ArrayView2<'_, F>,
) -> StainRoles {
    let mut unstained = 0;
    for k in 1..NUMBER_OF_DISTINGUISHERS {
        if distinguishers.column(k).sum() > distinguishers.column(unstained).sum() {
            unstained = k;
        }
    }

    let rest: Vec<usize> = (0..NUMBER_OF_DISTINGUISHERS)
        .filter(|&k| k != unstained)
        .collect();
    let skew = |k: usize| {
        let col = distinguishers.column(k);
        col[0] - col[col.len() - 1]
    };
    let (hematoxylin, eosin) = if skew(rest[0]) <= skew(rest[1]) {
        (rest[0], rest[1])
    } else {
        (rest[1], rest[0])
    };

    StainRoles { unstained, hematoxylin, eosin }
}

/// Build the initial factorization from classified distinguishers.
///
/// W gets the canonical column order unstained, Hematoxylin, Eosin,
/// independent of discovery order. H is seeded per pixel by least squares
/// with the unstained color as additive origin:
///
///     v ≈ u + a·(h − u) + b·(e − u),   a, b ≥ 0
///
/// which rearranges to v ≈ W·(1 − a − b, a, b)ᵀ, so V ≈ W·H already holds at
/// the seed for colors inside the distinguisher simplex. Negative solutions
/// are clamped to zero. Returns `(W, H, unstained color)`.
pub fn distinguishers_to_nmf_seeds<F: StainFloat>(
    distinguishers: &ArrayView2<'_, F>,
    roles: StainRoles,
    v: &ArrayView2<'_, F>,
) -> Result<(Array2<F>, Array2<F>, Array1<F>), StainNormError> {
    let channels = distinguishers.nrows();
    if v.nrows() != channels {
        return Err(StainNormError::DimensionMismatch(format!(
            "pixel matrix has {} channels but distinguishers have {}",
            v.nrows(),
            channels
        )));
    }
    let n_pixels = v.ncols();

    let unstained = distinguishers.column(roles.unstained).to_owned();
    let mut w = Array2::<F>::zeros((channels, NUMBER_OF_DISTINGUISHERS));
    w.column_mut(0).assign(&unstained);
    w.column_mut(1).assign(&distinguishers.column(roles.hematoxylin));
    w.column_mut(2).assign(&distinguishers.column(roles.eosin));

    // stain difference vectors relative to the unstained origin
    let mut stain_dirs = Array2::<F>::zeros((channels, NUMBER_OF_STAINS));
    for (j, stain) in [roles.hematoxylin, roles.eosin].into_iter().enumerate() {
        for i in 0..channels {
            stain_dirs[[i, j]] = distinguishers[[i, stain]] - unstained[i];
        }
    }

    // normal-equations pseudoinverse of the (channels × 2) stain system
    let gram = stain_dirs.t().dot(&stain_dirs);
    let pseudoinverse = gram.inv()?.dot(&stain_dirs.t());

    let mut h = Array2::<F>::zeros((NUMBER_OF_DISTINGUISHERS, n_pixels));
    h.axis_iter_mut(Axis(1))
        .into_par_iter()
        .enumerate()
        .for_each(|(p, mut weights)| {
            let diff = &v.column(p) - &unstained;
            let theta = pseudoinverse.dot(&diff);
            let a = Float::max(theta[0], F::zero());
            let b = Float::max(theta[1], F::zero());
            weights[0] = Float::max(F::one() - a - b, F::zero());
            weights[1] = a;
            weights[2] = b;
        });

    Ok((w, h, unstained))
}
