//! One constrained descent step: BUILD → TRIAL_STEP → PROJECT → ACCEPT/SHRINK.

use nalgebra::DVector;
use tracing::{debug, trace, warn};

use super::cfg::{DescentCfg, MAX_TRIALS, MIN_STEP};
use super::kkt::SaddleSystem;
use super::{StepError, StepReport, StepStatus};
use crate::constraints::ConstraintSet;
use crate::curve::{recenter, Geometry, Vec3};
use crate::energy::{energy_gradient, tangent_point_energy, TangentPointKernel};
use crate::sobolev::{pair_weights, SobolevGram};
use crate::topology::Topology;

/// Take one descent step from `vertices`; the input is never modified.
///
/// - BUILD: geometry, weights, Gram matrix, gradient and constraint Jacobian at
///   `vertices`; factorize the saddle-point matrix once and solve for the
///   direction `g`.
/// - TRIAL_STEP: `V' = V + t g`, starting at `t = 1`.
/// - PROJECT: Newton rounds `V' += Left⁻¹[0; -r]` until `|r| ≤ threshold` or
///   `max_iters` rounds, then continue with the lowest-residual `V'` seen.
/// - ACCEPT if `E(V') ≤ E(V) + a t ⟨g, ∇E⟩`, recentering `V'`; else SHRINK
///   `t ← b t`. Below `MIN_STEP` the step is `Stalled` and returns `V` unchanged.
pub fn step(cfg: &DescentCfg, topo: &Topology, vertices: &[Vec3]) -> Result<StepReport, StepError> {
    if vertices.len() != topo.num_vertices() {
        return Err(StepError::ShapeMismatch {
            expected: topo.num_vertices(),
            got: vertices.len(),
        });
    }
    let kernel = cfg.kernel();

    // BUILD
    let geom = Geometry::compute(topo.edges(), vertices)?;
    let weights = pair_weights(&kernel, topo, vertices, &geom);
    let gram = SobolevGram::assemble(topo, &geom, &weights);
    let deriv = energy_gradient(&kernel, topo, vertices, &geom);
    let constraints = ConstraintSet::new(topo);
    let jac = constraints.jacobian(topo, vertices, &geom);
    let system = SaddleSystem::assemble(&gram, &jac)?;
    let direction = -system.solve_gradient(&deriv)?;
    let slope = direction.dot(&deriv);
    let energy_before = tangent_point_energy(&kernel, topo, vertices, &geom);

    let mut t = 1.0;
    let mut trials = 0;
    while t >= MIN_STEP && trials < MAX_TRIALS {
        trials += 1;

        // TRIAL_STEP
        let mut trial = displaced(vertices, &direction, t);

        // PROJECT
        let (projection_iters, residual) =
            project(cfg, topo, &constraints, &system, &mut trial)?;

        // ACCEPT / SHRINK
        let energy_after = energy_at(&kernel, topo, &trial);
        let bound = energy_before + cfg.a_const * t * slope;
        trace!(t, energy_after, bound, residual, "line search trial");
        if energy_after.is_finite() && energy_after <= bound {
            recenter(topo.edges(), &mut trial);
            debug!(
                t,
                energy_before, energy_after, projection_iters, residual, trials, "step accepted"
            );
            return Ok(StepReport {
                vertices: trial,
                status: StepStatus::Accepted,
                step_size: t,
                energy_before,
                energy_after,
                projection_iters,
                residual,
                trials,
            });
        }
        t *= cfg.b_const;
    }

    debug!(t, energy_before, trials, "line search stalled");
    Ok(StepReport {
        vertices: vertices.to_vec(),
        status: StepStatus::Stalled,
        step_size: t,
        energy_before,
        energy_after: energy_before,
        projection_iters: 0,
        residual: constraints.residual(topo, vertices).norm(),
        trials,
    })
}

/// Tangent-point energy of `vertices` for the topology's edges.
///
/// Errors only on degenerate geometry (zero-length edge).
pub fn energy(cfg: &DescentCfg, topo: &Topology, vertices: &[Vec3]) -> Result<f64, StepError> {
    let geom = Geometry::compute(topo.edges(), vertices)?;
    Ok(tangent_point_energy(&cfg.kernel(), topo, vertices, &geom))
}

fn displaced(vertices: &[Vec3], direction: &DVector<f64>, t: f64) -> Vec<Vec3> {
    vertices
        .iter()
        .enumerate()
        .map(|(p, v)| v + direction.fixed_rows::<3>(3 * p) * t)
        .collect()
}

/// Newton-style constraint projection reusing the step's factorization.
///
/// Rounds stop at `threshold`, at `max_iters`, or on a non-finite residual. If the
/// threshold was not reached, `trial` is left at the lowest-residual iterate seen.
/// Returns the number of correction rounds run and the residual norm of `trial`.
pub(super) fn project(
    cfg: &DescentCfg,
    topo: &Topology,
    constraints: &ConstraintSet,
    system: &SaddleSystem,
    trial: &mut [Vec3],
) -> Result<(usize, f64), StepError> {
    let mut r = constraints.residual(topo, trial);
    let mut norm = r.norm();
    let mut best = trial.to_vec();
    let mut best_norm = norm;
    let mut iters = 0;
    while norm.is_finite() && norm > cfg.threshold && iters < cfg.max_iters {
        let dx = system.solve_correction(&r)?;
        for (p, v) in trial.iter_mut().enumerate() {
            *v += dx.fixed_rows::<3>(3 * p);
        }
        r = constraints.residual(topo, trial);
        norm = r.norm();
        iters += 1;
        if norm < best_norm {
            best.copy_from_slice(trial);
            best_norm = norm;
        }
    }
    if !(norm <= best_norm) {
        trial.copy_from_slice(&best);
        norm = best_norm;
    }
    if !(norm <= cfg.threshold) {
        warn!(
            residual = norm,
            max_iters = cfg.max_iters,
            "projection did not reach threshold"
        );
    }
    Ok((iters, norm))
}

/// Energy at a trial point; degenerate trial geometry counts as +∞ (forces a shrink).
fn energy_at(kernel: &TangentPointKernel, topo: &Topology, vertices: &[Vec3]) -> f64 {
    match Geometry::compute(topo.edges(), vertices) {
        Ok(geom) => tangent_point_energy(kernel, topo, vertices, &geom),
        Err(_) => f64::INFINITY,
    }
}
