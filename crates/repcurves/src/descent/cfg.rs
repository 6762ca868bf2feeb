//! Descent parameters and fixed line-search constants.
//!
//! Policy
//! - Caller-facing knobs live in `DescentCfg` (energy shape, Armijo constants,
//!   projection tolerance). Ranges are the caller's responsibility.
//! - The step-size floor and trial cap are fixed constants, not knobs.

use crate::energy::TangentPointKernel;

/// Line search gives up (`Stalled`) once the step size drops below this.
pub(crate) const MIN_STEP: f64 = 1e-10;
/// Hard cap on line-search trials, so `b_const ≥ 1` cannot loop forever.
pub(crate) const MAX_TRIALS: usize = 200;

/// Parameters for one constrained descent step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DescentCfg {
    /// Tangent-point exponent on `|T × d|` (`> 1`).
    pub alpha: f64,
    /// Tangent-point exponent on `|d|` (`> alpha`).
    pub beta: f64,
    /// Armijo sufficient-decrease constant, in (0, 0.5).
    pub a_const: f64,
    /// Step shrink factor, in (0, 1).
    pub b_const: f64,
    /// Constraint residual norm accepted by the projection.
    pub threshold: f64,
    /// Newton correction rounds per trial step.
    pub max_iters: usize,
}

impl Default for DescentCfg {
    fn default() -> Self {
        Self {
            alpha: 3.0,
            beta: 6.0,
            a_const: 0.1,
            b_const: 0.5,
            threshold: 1e-6,
            max_iters: 10,
        }
    }
}

impl DescentCfg {
    #[inline]
    pub fn kernel(&self) -> TangentPointKernel {
        TangentPointKernel::new(self.alpha, self.beta)
    }
}
