//! Structure-preserving color normalization for H&E-stained histology images.
//!
//! Matches the color appearance of a multi-channel (≥ 3 channels) image to a
//! reference image's staining palette while preserving the tissue structure
//! of the original. Each pixel block is flattened into a non-negative
//! channel-by-pixel matrix, its extreme "pure" colors (unstained background,
//! Hematoxylin, Eosin) are found geometrically, and a sparsity-penalized
//! non-negative matrix factorization V ≈ W·H separates basis colors from
//! per-pixel concentrations. Reconstruction reuses the source block's
//! concentrations H with the *reference* basis, recoloring structure without
//! moving it.
//!
//! The crate deals only in in-memory `ndarray` blocks of shape
//! `(rows, cols, channels)`; tiling, I/O and pipeline plumbing belong to the
//! caller. [`ColorNormalizer`] owns the one-time reference statistics and is
//! safe to share across block workers by reference.

mod config;
mod distinguishers;
mod error;
mod filter;
mod float_trait;
mod image_matrix;
mod linalg;
mod nmf;
mod reconstruct;
mod seeds;

pub use config::{
    NmfConfig, UpdateRule, EPSILON, EPSILON2, LAMBDA, NUMBER_OF_DISTINGUISHERS,
    NUMBER_OF_ITERATIONS, NUMBER_OF_STAINS,
};
pub use distinguishers::{
    matrix_to_distinguishers, matrix_to_one_distinguisher, project_matrix,
    recenter_matrix,
};
pub use error::StainNormError;
pub use filter::{image_to_nmf, ColorNormalizer, ReferencePalette, StainDecomposition};
pub use float_trait::StainFloat;
pub use image_matrix::image_to_matrix;
pub use nmf::{
    residual, solve, update_euclidean_h, update_euclidean_w, update_kl_h, update_kl_w,
};
pub use reconstruct::nmfs_to_image;
pub use seeds::{distinguishers_to_colors, distinguishers_to_nmf_seeds, StainRoles};
