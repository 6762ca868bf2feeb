//! Curated surface for the CLI and experiments.
//!
//! Re-exports the pieces callers normally touch, plus `tangent_point_energy_of`
//! for one-off energy queries that do not need a `Flow`.

pub use crate::constraints::ConstraintSet;
pub use crate::curve::polyline::{
    parse_polyline, read_polyline, write_polyline, write_polyline_file, ParseError,
    PolylineIoError,
};
pub use crate::curve::rand::{jittered_loop, open_polyline, torus_knot, LoopCfg, ReplayToken};
pub use crate::curve::{
    length_weighted_barycenter, recenter, total_length, Curve, DegenerateEdge, Geometry,
};
pub use crate::descent::{
    energy, step, DescentCfg, Flow, SolveStage, StepError, StepReport, StepStatus,
};
pub use crate::energy::{energy_gradient, tangent_point_energy, TangentPointKernel};
pub use crate::sobolev::{pair_weights, PairWeights, SobolevGram};
pub use crate::topology::{Topology, TopologyError};

/// Energy of a standalone curve: builds the topology, then evaluates.
///
/// Returns `Ok(None)` for topologies it cannot evaluate on (degenerate edges),
/// `Err` for malformed edge lists.
pub fn tangent_point_energy_of(
    curve: &Curve,
    kernel: TangentPointKernel,
) -> Result<Option<f64>, TopologyError> {
    let topo = Topology::from_curve(curve)?;
    Ok(Geometry::compute(&curve.edges, &curve.vertices)
        .ok()
        .map(|geom| tangent_point_energy(&kernel, &topo, &curve.vertices, &geom)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vec3;

    #[test]
    fn energy_of_square_and_degenerate() {
        let mut c = Curve::closed_loop(vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ]);
        let k = TangentPointKernel::new(3.0, 6.0);
        let e = tangent_point_energy_of(&c, k).unwrap().unwrap();
        assert!((e - 1.125).abs() < 1e-12);
        c.vertices[1] = c.vertices[0];
        assert_eq!(tangent_point_energy_of(&c, k).unwrap(), None);
        c.edges.push([0, 9]);
        assert!(tangent_point_energy_of(&c, k).is_err());
    }
}
