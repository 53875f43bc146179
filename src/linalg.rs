use crate::float_trait::StainFloat;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use num_traits::Float;
use rayon::prelude::*;

/// Squared L2 magnitude of each column vector in a matrix.
pub fn squared_magnitudes<F: StainFloat>(m: &ArrayView2<F>) -> Array1<F> {
    let v: Vec<F> = (0..m.ncols())
        .into_par_iter()
        .map(|i| m.column(i).dot(&m.column(i)))
        .collect();
    Array1::from(v)
}

/// Unit-normalize a vector; `None` when its squared magnitude is at or below
/// `floor` (numerically zero, direction meaningless).
pub fn normalized<F: StainFloat>(v: &ArrayView1<F>, floor: F) -> Option<Array1<F>> {
    let sq = v.dot(v);
    if sq <= floor {
        None
    } else {
        let norm = Float::sqrt(sq);
        Some(v.mapv(|x| x / norm))
    }
}

/// Outer product a·bᵀ.
pub fn outer<F: StainFloat>(a: &ArrayView1<F>, b: &ArrayView1<F>) -> Array2<F> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j])
}
