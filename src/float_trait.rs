use cauchy::Scalar;
use lax::Lapack;
use num_traits::Float;

/// Supertrait combining all bounds needed by the generic normalization pipeline.
///
/// Implemented for `f32` and `f64` only — these are the two types supported by
/// LAPACK (via `ndarray-linalg`), which backs the small linear solves in the
/// seeding stage.
pub trait StainFloat: Float + Scalar<Real = Self> + Lapack + Send + Sync + 'static {}

impl StainFloat for f32 {}
impl StainFloat for f64 {}
