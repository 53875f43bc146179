use crate::config::{NmfConfig, UpdateRule};
use crate::error::StainNormError;
use crate::float_trait::StainFloat;
use log::debug;
use ndarray::{Array2, ArrayView2, Axis, Zip};
use num_traits::Float;

/// Refine a seeded factorization by multiplicative updates.
///
/// Runs exactly `config.iterations` rounds with no early stopping; each round
/// updates H against the current factors and then, when `config.refine_basis`
/// is set, updates W. Multiplicative updates preserve the non-negativity of
/// the seed, and every denominator is floored at `config.epsilon` before
/// division, so the iteration can never divide by zero even when a factor
/// row or column degenerates. Returns the refined `(W, H)`.
pub fn solve<F: StainFloat>(
    v: &ArrayView2<'_, F>,
    w: Array2<F>,
    h: Array2<F>,
    config: &NmfConfig<F>,
) -> Result<(Array2<F>, Array2<F>), StainNormError> {
    check_shapes(v, &w, &h)?;
    let mut w = w;
    let mut h = h;
    for _ in 0..config.iterations {
        match config.rule {
            UpdateRule::Euclidean => {
                update_euclidean_h(v, &w.view(), &mut h, config.lambda, config.epsilon);
                if config.refine_basis {
                    update_euclidean_w(v, &mut w, &h.view(), config.epsilon);
                }
            }
            UpdateRule::KlDivergence => {
                update_kl_h(v, &w.view(), &mut h, config.lambda, config.epsilon);
                if config.refine_basis {
                    update_kl_w(v, &mut w, &h.view(), config.epsilon);
                }
            }
        }
    }
    debug!(
        "nmf solve finished: {} iterations, rule {:?}, refine_basis {}",
        config.iterations, config.rule, config.refine_basis
    );
    Ok((w, h))
}

/// One multiplicative update of H under the squared Euclidean objective with
/// an L1 (Lasso) penalty of weight `lambda` on H:
///
///     H ← H ∘ (WᵀV) ⊘ (WᵀW·H + λ)
pub fn update_euclidean_h<F: StainFloat>(
    v: &ArrayView2<'_, F>,
    w: &ArrayView2<'_, F>,
    h: &mut Array2<F>,
    lambda: F,
    epsilon: F,
) {
    let numer = w.t().dot(v);
    let denom = w.t().dot(w).dot(&*h);
    Zip::from(&mut *h).and(&numer).and(&denom).for_each(|hv, &nu, &de| {
        *hv = *hv * nu / Float::max(de + lambda, epsilon);
    });
}

/// One multiplicative update of W under the squared Euclidean objective:
///
///     W ← W ∘ (V·Hᵀ) ⊘ (W·H·Hᵀ)
pub fn update_euclidean_w<F: StainFloat>(
    v: &ArrayView2<'_, F>,
    w: &mut Array2<F>,
    h: &ArrayView2<'_, F>,
    epsilon: F,
) {
    let numer = v.dot(&h.t());
    let denom = w.dot(&h.dot(&h.t()));
    Zip::from(&mut *w).and(&numer).and(&denom).for_each(|wv, &nu, &de| {
        *wv = *wv * nu / Float::max(de, epsilon);
    });
}

/// One multiplicative update of H under the generalized Kullback–Leibler
/// divergence, with the same L1 penalty on H:
///
///     H ← H ∘ (Wᵀ(V ⊘ W·H)) ⊘ (Wᵀ𝟙 + λ)
pub fn update_kl_h<F: StainFloat>(
    v: &ArrayView2<'_, F>,
    w: &ArrayView2<'_, F>,
    h: &mut Array2<F>,
    lambda: F,
    epsilon: F,
) {
    let ratio = model_ratio(v, w, &h.view(), epsilon);
    let numer = w.t().dot(&ratio);
    let column_sums = w.sum_axis(Axis(0));
    for (k, mut row) in h.axis_iter_mut(Axis(0)).enumerate() {
        let de = Float::max(column_sums[k] + lambda, epsilon);
        for (j, hv) in row.iter_mut().enumerate() {
            *hv = *hv * numer[[k, j]] / de;
        }
    }
}

/// One multiplicative update of W under the generalized Kullback–Leibler
/// divergence:
///
///     W ← W ∘ ((V ⊘ W·H)·Hᵀ) ⊘ (𝟙·Hᵀ)
pub fn update_kl_w<F: StainFloat>(
    v: &ArrayView2<'_, F>,
    w: &mut Array2<F>,
    h: &ArrayView2<'_, F>,
    epsilon: F,
) {
    let ratio = model_ratio(v, &w.view(), h, epsilon);
    let numer = ratio.dot(&h.t());
    let row_sums = h.sum_axis(Axis(1));
    for (k, mut col) in w.axis_iter_mut(Axis(1)).enumerate() {
        let de = Float::max(row_sums[k], epsilon);
        for (i, wv) in col.iter_mut().enumerate() {
            *wv = *wv * numer[[i, k]] / de;
        }
    }
}

/// Squared Frobenius residual ‖V − W·H‖².
pub fn residual<F: StainFloat>(
    v: &ArrayView2<'_, F>,
    w: &ArrayView2<'_, F>,
    h: &ArrayView2<'_, F>,
) -> F {
    let model = w.dot(h);
    Zip::from(v).and(&model).fold(F::zero(), |acc, &vv, &mv| {
        let d = vv - mv;
        acc + d * d
    })
}

/// Elementwise V ⊘ (W·H) with the model floored at `epsilon`.
fn model_ratio<F: StainFloat>(
    v: &ArrayView2<'_, F>,
    w: &ArrayView2<'_, F>,
    h: &ArrayView2<'_, F>,
    epsilon: F,
) -> Array2<F> {
    let model = w.dot(h);
    Zip::from(v)
        .and(&model)
        .map_collect(|&vv, &mv| vv / Float::max(mv, epsilon))
}

fn check_shapes<F: StainFloat>(
    v: &ArrayView2<'_, F>,
    w: &Array2<F>,
    h: &Array2<F>,
) -> Result<(), StainNormError> {
    if w.nrows() != v.nrows() || h.ncols() != v.ncols() || w.ncols() != h.nrows() {
        return Err(StainNormError::DimensionMismatch(format!(
            "V is {:?}, W is {:?}, H is {:?}",
            v.dim(),
            w.dim(),
            h.dim()
        )));
    }
    Ok(())
}
