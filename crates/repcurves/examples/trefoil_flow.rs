//! Trefoil untangling probe: energy and timing over a short flow.
//!
//! Purpose
//! - Provide a reproducible, code-backed data point for "how fast does the
//!   tangent-point energy of a coarse trefoil drop, and what does a step cost?"
//!
//! Run: `cargo run --release -p repcurves --example trefoil_flow`

use std::time::Instant;

use repcurves::api::{torus_knot, total_length, DescentCfg, Flow, StepStatus};

fn main() {
    let curve = torus_knot(2, 3, 48);
    let mut flow = Flow::new(&curve, DescentCfg::default()).expect("trefoil topology is valid");
    let e0 = flow.energy().expect("trefoil has no degenerate edges");
    println!(
        "vertices={} edges={} length={:.6} energy={e0:.6}",
        curve.num_vertices(),
        curve.num_edges(),
        total_length(&curve.edges, &curve.vertices)
    );

    for k in 0..20 {
        let start = Instant::now();
        let report = flow.step().expect("step succeeds");
        let ms = start.elapsed().as_secs_f64() * 1e3;
        println!(
            "step={k} status={:?} t={:.3e} energy={:.6} residual={:.2e} time_ms={ms:.2}",
            report.status, report.step_size, report.energy_after, report.residual
        );
        if report.status == StepStatus::Stalled {
            break;
        }
    }
    println!(
        "final_length={:.6}",
        total_length(flow.topology().edges(), flow.vertices())
    );
}
