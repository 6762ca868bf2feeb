//! Stepping session over one curve load.

use tracing::info;

use super::{energy, step, DescentCfg, StepError, StepReport, StepStatus};
use crate::curve::{Curve, Vec3};
use crate::topology::{Topology, TopologyError};

/// Curve under descent: topology built once, vertices advanced by `step`.
///
/// Invariants:
/// - `topology` matches `initial` and `vertices` in vertex count.
/// - `reset` restores `initial` and keeps the topology (edges never change).
#[derive(Clone, Debug)]
pub struct Flow {
    cfg: DescentCfg,
    topology: Topology,
    initial: Vec<Vec3>,
    vertices: Vec<Vec3>,
    steps_taken: usize,
}

impl Flow {
    pub fn new(curve: &Curve, cfg: DescentCfg) -> Result<Self, TopologyError> {
        let topology = Topology::from_curve(curve)?;
        Ok(Self {
            cfg,
            topology,
            initial: curve.vertices.clone(),
            vertices: curve.vertices.clone(),
            steps_taken: 0,
        })
    }

    #[inline]
    pub fn cfg(&self) -> &DescentCfg {
        &self.cfg
    }

    /// Change parameters between steps (e.g. retry after `Stalled`).
    #[inline]
    pub fn set_cfg(&mut self, cfg: DescentCfg) {
        self.cfg = cfg;
    }

    #[inline]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    #[inline]
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// Snapshot of the current state as a standalone curve.
    pub fn curve(&self) -> Curve {
        Curve::new(self.vertices.clone(), self.topology.edges().to_vec())
    }

    pub fn energy(&self) -> Result<f64, StepError> {
        energy(&self.cfg, &self.topology, &self.vertices)
    }

    /// One descent step; on error the current vertices are left untouched.
    pub fn step(&mut self) -> Result<StepReport, StepError> {
        let report = step(&self.cfg, &self.topology, &self.vertices)?;
        if report.status == StepStatus::Accepted {
            self.vertices.clone_from(&report.vertices);
            self.steps_taken += 1;
        }
        Ok(report)
    }

    /// Step until `max_steps` accepted steps or the first stall (included in the output).
    pub fn run(&mut self, max_steps: usize) -> Result<Vec<StepReport>, StepError> {
        let mut reports = Vec::with_capacity(max_steps);
        for _ in 0..max_steps {
            let report = self.step()?;
            let stalled = report.status == StepStatus::Stalled;
            reports.push(report);
            if stalled {
                break;
            }
        }
        info!(
            steps = reports.len(),
            total_steps = self.steps_taken,
            "flow run finished"
        );
        Ok(reports)
    }

    /// Restore the load-time vertices; the topology is reused.
    pub fn reset(&mut self) {
        self.vertices.clone_from(&self.initial);
        self.steps_taken = 0;
    }
}
