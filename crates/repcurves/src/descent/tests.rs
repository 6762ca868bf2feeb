use nalgebra::DVector;

use super::kkt::SaddleSystem;
use super::step::project;
use super::*;
use crate::constraints::ConstraintSet;
use crate::curve::rand::{jittered_loop, LoopCfg, ReplayToken};
use crate::curve::{edge_lengths, length_weighted_barycenter, total_length, Curve, Geometry};
use crate::energy::energy_gradient;
use crate::sobolev::{pair_weights, SobolevGram};
use crate::topology::Topology;

fn unit_square() -> Curve {
    Curve::closed_loop(vec![
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(-1.0, 1.0, 0.0),
    ])
}

/// Mildly perturbed circle: far from stationary, but small enough steps for the projection.
fn wobbly_loop(index: u64) -> Curve {
    jittered_loop(
        LoopCfg {
            vertex_count: 12,
            angle_jitter_frac: 0.1,
            radial_jitter: 0.05,
            vertical_jitter: 0.05,
            radius: 1.0,
        },
        ReplayToken::new(2024, index),
    )
}

fn theta_network() -> Curve {
    let vertices = vec![
        Vec3::new(0.0, 0.0, -1.5),
        Vec3::new(0.0, 0.0, 1.5),
        Vec3::new(1.1, 0.1, -0.5),
        Vec3::new(0.9, -0.2, 0.6),
        Vec3::new(-0.6, 0.9, -0.4),
        Vec3::new(-0.5, 1.0, 0.5),
        Vec3::new(-0.4, -1.0, -0.6),
        Vec3::new(-0.7, -0.8, 0.5),
    ];
    let edges = vec![
        [0, 2],
        [2, 3],
        [3, 1],
        [0, 4],
        [4, 5],
        [5, 1],
        [0, 6],
        [6, 7],
        [7, 1],
    ];
    Curve::new(vertices, edges)
}

/// BUILD stage of a step: constraints, factorized saddle system, energy
/// derivative and the (unnegated) constrained direction.
fn build(
    cfg: &DescentCfg,
    topo: &Topology,
    vertices: &[Vec3],
) -> (ConstraintSet, SaddleSystem, DVector<f64>, DVector<f64>) {
    let kernel = cfg.kernel();
    let geom = Geometry::compute(topo.edges(), vertices).unwrap();
    let weights = pair_weights(&kernel, topo, vertices, &geom);
    let gram = SobolevGram::assemble(topo, &geom, &weights);
    let deriv = energy_gradient(&kernel, topo, vertices, &geom);
    let constraints = ConstraintSet::new(topo);
    let jac = constraints.jacobian(topo, vertices, &geom);
    let system = SaddleSystem::assemble(&gram, &jac).unwrap();
    let direction = system.solve_gradient(&deriv).unwrap();
    (constraints, system, deriv, direction)
}

fn test_cfg() -> DescentCfg {
    DescentCfg {
        max_iters: 30,
        ..DescentCfg::default()
    }
}

#[test]
fn unit_square_is_stationary_under_the_length_constraint() {
    let c = unit_square();
    let topo = Topology::from_curve(&c).unwrap();
    let cfg = DescentCfg {
        alpha: 3.0,
        beta: 6.0,
        ..test_cfg()
    };

    // The unconstrained energy gradient is radial and nonzero, but radial motion is
    // exactly what the perimeter constraint forbids: the constrained direction vanishes.
    let (_, _, deriv, direction) = build(&cfg, &topo, &c.vertices);
    assert!(deriv.norm() > 1e-3, "deriv {}", deriv.norm());
    assert!(direction.norm() < 1e-8, "direction {}", direction.norm());

    let report = step(&cfg, &topo, &c.vertices).unwrap();
    assert!((report.energy_before - 1.125).abs() < 1e-12);
    match report.status {
        StepStatus::Stalled => {
            assert_eq!(report.vertices, c.vertices);
            assert_eq!(report.energy_after, report.energy_before);
        }
        StepStatus::Accepted => {
            // Round-off sized step: nothing moves.
            for (a, b) in report.vertices.iter().zip(&c.vertices) {
                assert!((a - b).norm() < 1e-8);
            }
            assert!((report.energy_after - report.energy_before).abs() < 1e-12);
        }
    }
    let perimeter = total_length(&c.edges, &report.vertices);
    assert!((perimeter - 8.0).abs() <= cfg.threshold);
}

#[test]
fn accepted_step_lowers_energy_and_conserves_length() {
    let c = wobbly_loop(0);
    let topo = Topology::from_curve(&c).unwrap();
    let cfg = test_cfg();
    let report = step(&cfg, &topo, &c.vertices).unwrap();
    assert_eq!(report.status, StepStatus::Accepted);
    assert!(report.energy_after < report.energy_before);
    assert!(report.residual <= cfg.threshold);

    let before = topo.rest_total_length();
    let after = total_length(&c.edges, &report.vertices);
    assert!((after - before).abs() <= cfg.threshold);

    // Reported energy is the energy of the returned (recentered) vertices.
    let e = energy(&cfg, &topo, &report.vertices).unwrap();
    assert!((e - report.energy_after).abs() < 1e-9 * e);
}

#[test]
fn accepted_step_is_recentered() {
    let mut c = wobbly_loop(1);
    for v in c.vertices.iter_mut() {
        *v += Vec3::new(5.0, -3.0, 2.0);
    }
    let topo = Topology::from_curve(&c).unwrap();
    let report = step(&test_cfg(), &topo, &c.vertices).unwrap();
    assert!(report.accepted());
    let bary = length_weighted_barycenter(&c.edges, &report.vertices).unwrap();
    assert!(bary.norm() < 1e-10, "barycenter {bary:?}");
}

#[test]
fn step_leaves_input_untouched() {
    let c = wobbly_loop(2);
    let snapshot = c.vertices.clone();
    let topo = Topology::from_curve(&c).unwrap();
    let _ = step(&test_cfg(), &topo, &c.vertices).unwrap();
    assert_eq!(c.vertices, snapshot);
}

#[test]
fn degenerate_edge_is_rejected() {
    let mut c = unit_square();
    let topo = Topology::from_curve(&c).unwrap();
    c.vertices[2] = c.vertices[1];
    let err = step(&test_cfg(), &topo, &c.vertices).unwrap_err();
    assert_eq!(
        err,
        StepError::DegenerateGeometry(crate::curve::DegenerateEdge {
            edge: 1,
            length: 0.0
        })
    );
}

#[test]
fn vertex_count_must_match_topology() {
    let c = unit_square();
    let topo = Topology::from_curve(&c).unwrap();
    let err = step(&test_cfg(), &topo, &c.vertices[..3]).unwrap_err();
    assert_eq!(
        err,
        StepError::ShapeMismatch {
            expected: 4,
            got: 3
        }
    );
}

#[test]
fn duplicate_branch_edge_makes_system_singular() {
    // Edges 0 and 1 coincide and both touch the branch vertex 0: identical constraint rows.
    let c = Curve::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.5, 0.5, 2.0),
            Vec3::new(1.5, 0.5, 2.5),
        ],
        vec![[0, 1], [0, 1], [0, 2], [0, 3], [3, 4], [4, 5]],
    );
    let topo = Topology::from_curve(&c).unwrap();
    let err = step(&test_cfg(), &topo, &c.vertices).unwrap_err();
    assert_eq!(
        err,
        StepError::SingularSystem {
            stage: SolveStage::Factorize
        }
    );
}

#[test]
fn impossible_armijo_constant_stalls() {
    let c = wobbly_loop(3);
    let topo = Topology::from_curve(&c).unwrap();
    let cfg = DescentCfg {
        a_const: 1e6,
        ..test_cfg()
    };
    let report = step(&cfg, &topo, &c.vertices).unwrap();
    assert_eq!(report.status, StepStatus::Stalled);
    assert_eq!(report.vertices, c.vertices);
    assert!(report.step_size < 1e-10);
    assert_eq!(report.energy_after, report.energy_before);
}

#[test]
fn branch_edges_keep_their_lengths() {
    let c = theta_network();
    let topo = Topology::from_curve(&c).unwrap();
    assert_eq!(topo.constrained_edges(), &[0, 2, 3, 5, 6, 8]);
    let cfg = test_cfg();
    let report = step(&cfg, &topo, &c.vertices).unwrap();
    assert!(report.accepted());
    assert!(report.energy_after < report.energy_before);
    // A far-from-equilibrium network may take a large first step; the length
    // bounds hold up to whatever residual the projection reached.
    assert!(report.residual < 1e-3, "residual {}", report.residual);
    let tol = cfg.threshold.max(report.residual);
    let lengths = edge_lengths(&c.edges, &report.vertices);
    for &i in topo.constrained_edges() {
        assert!(
            (lengths[i] - topo.rest_lengths()[i]).abs() <= tol,
            "edge {i}"
        );
    }
    let total: f64 = lengths.iter().sum();
    assert!((total - topo.rest_total_length()).abs() <= tol);
}

#[test]
fn flow_descends_and_resets() {
    let c = wobbly_loop(4);
    let mut flow = Flow::new(&c, test_cfg()).unwrap();
    let e0 = flow.energy().unwrap();
    let reports = flow.run(3).unwrap();
    assert!(!reports.is_empty());
    let mut last = e0;
    for r in &reports {
        assert!(r.energy_after <= last);
        last = r.energy_after;
    }
    assert!(flow.energy().unwrap() < e0);
    let accepted = reports.iter().filter(|r| r.accepted()).count();
    assert_eq!(flow.steps_taken(), accepted);
    assert!((total_length(&c.edges, flow.vertices()) - flow.topology().rest_total_length()).abs() < 1e-5);

    flow.reset();
    assert_eq!(flow.vertices(), &c.vertices[..]);
    assert_eq!(flow.steps_taken(), 0);
    assert_eq!(flow.curve(), c);
}

#[test]
fn step_goes_ahead_without_projection_rounds() {
    let c = wobbly_loop(0);
    let topo = Topology::from_curve(&c).unwrap();
    let cfg = DescentCfg {
        max_iters: 0,
        ..test_cfg()
    };
    let report = step(&cfg, &topo, &c.vertices).unwrap();
    assert_eq!(report.status, StepStatus::Accepted);
    assert_eq!(report.projection_iters, 0);
    assert!(report.residual > cfg.threshold, "residual {}", report.residual);
    // Recentering moves every vertex equally, so lengths (and the residual) are unchanged.
    let r = ConstraintSet::new(&topo).residual(&topo, &report.vertices).norm();
    assert!((r - report.residual).abs() < 1e-12);
}

#[test]
fn step_with_exhausted_projection_reports_its_rounds() {
    let c = wobbly_loop(0);
    let topo = Topology::from_curve(&c).unwrap();
    let cfg = DescentCfg {
        max_iters: 1,
        threshold: 1e-14,
        ..test_cfg()
    };
    let report = step(&cfg, &topo, &c.vertices).unwrap();
    assert_eq!(report.status, StepStatus::Accepted);
    assert_eq!(report.projection_iters, cfg.max_iters);
    assert!(report.residual > cfg.threshold, "residual {}", report.residual);
    assert!(report.energy_after < report.energy_before);
}

#[test]
fn projection_keeps_lowest_residual_iterate() {
    let c = wobbly_loop(5);
    let topo = Topology::from_curve(&c).unwrap();
    let base = test_cfg();
    let (constraints, system, _, direction) = build(&base, &topo, &c.vertices);
    // Full trial step (t = 1) off the constraint set.
    let start: Vec<Vec3> = c
        .vertices
        .iter()
        .enumerate()
        .map(|(p, v)| v - direction.fixed_rows::<3>(3 * p))
        .collect();
    let initial = constraints.residual(&topo, &start).norm();

    let mut previous = initial;
    for max_iters in 0..6 {
        let cfg = DescentCfg {
            threshold: 0.0,
            max_iters,
            ..base
        };
        let mut trial = start.clone();
        let (iters, norm) = project(&cfg, &topo, &constraints, &system, &mut trial).unwrap();
        assert!(iters <= max_iters);
        // The returned point is the one whose residual is reported.
        assert_eq!(constraints.residual(&topo, &trial).norm(), norm);
        // More rounds never report a worse point than fewer rounds did.
        assert!(norm <= previous, "max_iters {max_iters}: {norm} > {previous}");
        previous = norm;
    }
    assert!(previous < initial);
}
