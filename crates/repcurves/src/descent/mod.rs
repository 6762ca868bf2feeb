//! Constrained fractional-Sobolev descent on the tangent-point energy.
//!
//! Purpose
//! - `step`: one pure compute step (vertices in, vertices out) following the
//!   BUILD → TRIAL_STEP → PROJECT → ACCEPT/SHRINK iteration.
//! - `Flow`: a session holding the topology, the load-time vertices (for
//!   `reset`) and the current vertices, for callers that step repeatedly.
//!
//! Why this design (short)
//! - Every matrix is request-scoped: nothing outlives one `step` call, nothing
//!   borrows caller buffers past it, so steps are reentrant and testable alone.
//! - The saddle-point matrix is factorized once per step (dense LU) and reused
//!   for every projection round; only the right-hand side changes.
//!
//! Errors
//! - `DegenerateGeometry` (zero-length edge, checked before any assembly) and
//!   `SingularSystem` are fatal for the step and leave the caller's curve as is.
//! - A stalled line search is not an error: `StepStatus::Stalled`, input returned.
//!
//! References
//! - Code cross-refs: `sobolev::SobolevGram`, `energy::energy_gradient`,
//!   `constraints::ConstraintSet`

mod cfg;
mod flow;
mod kkt;
mod step;

pub use cfg::DescentCfg;
pub use flow::Flow;
pub use step::{energy, step};

use std::fmt;

use crate::curve::{DegenerateEdge, Vec3};

/// Outcome of a step that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    /// A trial point passed the Armijo test; vertices were updated and recentered.
    Accepted,
    /// The step size fell below the floor; vertices are returned unchanged.
    Stalled,
}

/// Result of one descent step.
#[derive(Clone, Debug)]
pub struct StepReport {
    pub vertices: Vec<Vec3>,
    pub status: StepStatus,
    /// Accepted step size (or the last one tried when stalled).
    pub step_size: f64,
    pub energy_before: f64,
    pub energy_after: f64,
    /// Newton projection rounds used by the accepted trial.
    pub projection_iters: usize,
    /// Constraint residual norm of the returned vertices (before recentering).
    pub residual: f64,
    /// Line-search trials evaluated.
    pub trials: usize,
}

impl StepReport {
    #[inline]
    pub fn accepted(&self) -> bool {
        self.status == StepStatus::Accepted
    }
}

/// Which saddle-point solve failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveStage {
    Factorize,
    Direction,
    Projection,
}

impl fmt::Display for SolveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStage::Factorize => "factorization",
            SolveStage::Direction => "descent direction solve",
            SolveStage::Projection => "projection solve",
        };
        f.write_str(s)
    }
}

/// Fatal step errors.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    DegenerateGeometry(DegenerateEdge),
    SingularSystem { stage: SolveStage },
    /// Vertex count does not match the topology.
    ShapeMismatch { expected: usize, got: usize },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::DegenerateGeometry(e) => write!(f, "degenerate geometry: {e}"),
            StepError::SingularSystem { stage } => {
                write!(f, "singular saddle-point system ({stage})")
            }
            StepError::ShapeMismatch { expected, got } => write!(
                f,
                "vertex count {got} does not match topology ({expected} vertices)"
            ),
        }
    }
}

impl std::error::Error for StepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StepError::DegenerateGeometry(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DegenerateEdge> for StepError {
    fn from(e: DegenerateEdge) -> Self {
        StepError::DegenerateGeometry(e)
    }
}

#[cfg(test)]
mod tests;
