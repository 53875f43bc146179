use crate::config::NmfConfig;
use crate::distinguishers::matrix_to_distinguishers;
use crate::error::StainNormError;
use crate::float_trait::StainFloat;
use crate::image_matrix::image_to_matrix;
use crate::nmf::solve;
use crate::reconstruct::nmfs_to_image;
use crate::seeds::{distinguishers_to_colors, distinguishers_to_nmf_seeds};
use log::debug;
use ndarray::{Array1, Array2, Array3, ArrayView3};

/// A full stain decomposition of one pixel block: V ≈ basis · concentrations.
#[derive(Debug, Clone)]
pub struct StainDecomposition<F: StainFloat> {
    /// `(channels × 3)` pure colors; canonical column order unstained,
    /// Hematoxylin, Eosin.
    pub basis: Array2<F>,
    /// `(3 × N)` per-pixel stain weights, one column per pixel. This is the
    /// half of the factorization that encodes spatial structure.
    pub concentrations: Array2<F>,
    /// The unstained background color, tracked separately because recoloring
    /// treats it specially.
    pub unstained: Array1<F>,
}

impl<F: StainFloat> StainDecomposition<F> {
    /// The palette half of the decomposition, for recoloring other blocks.
    pub fn palette(&self) -> ReferencePalette<F> {
        ReferencePalette {
            basis: self.basis.clone(),
            unstained: self.unstained.clone(),
        }
    }
}

/// The long-lived reference statistics: basis colors and unstained color of
/// a designated reference image. Immutable once computed, so block workers
/// may share it by plain reference; the reference image's own concentration
/// matrix is not retained.
#[derive(Debug, Clone)]
pub struct ReferencePalette<F: StainFloat> {
    pub basis: Array2<F>,
    pub unstained: Array1<F>,
}

/// Decompose one pixel block into stain basis, concentrations and unstained
/// color: flatten to a channel-by-pixel matrix, extract the extreme color
/// vectors, seed the factorization from them and refine it with the
/// configured multiplicative-update rule.
pub fn image_to_nmf<F: StainFloat>(
    block: ArrayView3<'_, F>,
    config: &NmfConfig<F>,
) -> Result<StainDecomposition<F>, StainNormError> {
    let v = image_to_matrix(block)?;
    let distinguishers = matrix_to_distinguishers(&v.view(), config.epsilon2())?;
    let roles = distinguishers_to_colors(&distinguishers.view());
    let (w, h, unstained) =
        distinguishers_to_nmf_seeds(&distinguishers.view(), roles, &v.view())?;
    let (basis, concentrations) = solve(&v.view(), w, h, config)?;

    let (rows, cols, _) = block.dim();
    debug!("decomposed {rows}×{cols} block into {} basis colors", basis.ncols());
    Ok(StainDecomposition { basis, concentrations, unstained })
}

/// Normalizes source blocks to a reference image's staining palette while
/// preserving each block's own concentration structure.
///
/// The reference statistics are computed once by [`ColorNormalizer::fit`] and
/// are read-only afterwards; a `&ColorNormalizer` can be handed to any number
/// of block workers concurrently.
#[derive(Debug, Clone)]
pub struct ColorNormalizer<F: StainFloat> {
    config: NmfConfig<F>,
    reference: ReferencePalette<F>,
}

impl<F: StainFloat> ColorNormalizer<F> {
    /// Compute the reference statistics from the reference image.
    pub fn fit(
        reference_block: ArrayView3<'_, F>,
        config: NmfConfig<F>,
    ) -> Result<Self, StainNormError> {
        let decomposition = image_to_nmf(reference_block, &config)?;
        Ok(Self { config, reference: decomposition.palette() })
    }

    /// Reuse previously computed reference statistics.
    pub fn from_palette(reference: ReferencePalette<F>, config: NmfConfig<F>) -> Self {
        Self { config, reference }
    }

    pub fn reference(&self) -> &ReferencePalette<F> {
        &self.reference
    }

    /// Decompose a source block and recolor its structure with the reference
    /// palette. The output block has the same shape as the input.
    pub fn normalize_block(
        &self,
        block: ArrayView3<'_, F>,
    ) -> Result<Array3<F>, StainNormError> {
        let decomposition = image_to_nmf(block, &self.config)?;
        nmfs_to_image(
            &decomposition.concentrations.view(),
            &self.reference.basis.view(),
            &self.reference.unstained.view(),
            block.dim(),
        )
    }
}
