use crate::float_trait::StainFloat;

/// Number of stains separated by the factorization. The algorithm is defined
/// for H&E (Hematoxylin and Eosin); the geometry would generalize, but the
/// role classification would not.
pub const NUMBER_OF_STAINS: usize = 2;

/// Number of basis columns: one per stain plus the unstained background.
pub const NUMBER_OF_DISTINGUISHERS: usize = NUMBER_OF_STAINS + 1;

/// Fixed iteration budget for the NMF solve. There is no early-stopping
/// criterion, so runtime per block is deterministic.
pub const NUMBER_OF_ITERATIONS: usize = 300;

/// Lasso (L1) penalty weight on the concentration matrix; pushes most pixels
/// toward a single dominant stain.
pub const LAMBDA: f64 = 0.02;

/// A very small matrix element; solver denominators are floored here.
pub const EPSILON: f64 = 1e-6;

/// A very small squared magnitude for a vector.
pub const EPSILON2: f64 = EPSILON * EPSILON;

/// Multiplicative-update variant used by the NMF solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateRule {
    /// Lee–Seung updates for the squared Euclidean objective.
    Euclidean,
    /// Updates for the generalized Kullback–Leibler divergence.
    KlDivergence,
}

/// Tunables for one decomposition.
#[derive(Debug, Clone, Copy)]
pub struct NmfConfig<F: StainFloat> {
    pub rule: UpdateRule,
    pub iterations: usize,
    /// Sparsity weight on H.
    pub lambda: F,
    /// Numerical floor for denominators.
    pub epsilon: F,
    /// Refine the basis W during the solve. When `false` (the default), W
    /// stays fixed at the distinguisher seed and only H is refined; the
    /// distinguisher colors are already high-confidence extremes.
    pub refine_basis: bool,
}

impl<F: StainFloat> Default for NmfConfig<F> {
    fn default() -> Self {
        Self {
            rule: UpdateRule::Euclidean,
            iterations: NUMBER_OF_ITERATIONS,
            lambda: F::from(LAMBDA).unwrap(),
            epsilon: F::from(EPSILON).unwrap(),
            refine_basis: false,
        }
    }
}

impl<F: StainFloat> NmfConfig<F> {
    /// Squared-magnitude floor below which a vector is treated as zero.
    pub fn epsilon2(&self) -> F {
        self.epsilon * self.epsilon
    }
}
