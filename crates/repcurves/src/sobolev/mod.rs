//! Fractional-Sobolev metric used to precondition the energy gradient.
//!
//! Purpose
//! - `weights`: per-geometry edge-pair weights `W` (order `σ = (β-1)/α`) and
//!   `W0` (a low-order regularizer with fixed kernel shape α=2, β=4).
//! - `gram`: folds them into the N×N form `A = B + B0` and exposes the 3N×3N
//!   coordinate-replicated `A_bar` as an operator.
//!
//! Assumptions and conventions
//! - Everything here is recomputed every step and owned by that step.
//! - `A` is symmetric positive semi-definite; its kernel contains the per-axis
//!   constant vectors (translations), which the descent step gauges away.
//! - Near-coincident point pairs (`d < NEAR_COINCIDENT`) contribute the fixed
//!   `COINCIDENT_WEIGHT` instead of a singular value. This is a crude patch for
//!   numerically self-intersecting input, not a limit of the kernel.

mod gram;
mod weights;

pub use gram::SobolevGram;
pub use weights::{pair_weights, PairWeights};

/// Distance below which a point pair counts as coincident.
pub(crate) const NEAR_COINCIDENT: f64 = 1e-8;
/// Accumulator increment used for coincident pairs (finite, "large").
pub(crate) const COINCIDENT_WEIGHT: f64 = 1e8;
