mod config;
mod provenance;
mod trace;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use repcurves::api::{
    read_polyline, tangent_point_energy_of, total_length, write_polyline_file, Curve, DescentCfg,
    Flow, TangentPointKernel,
};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::fmt::SubscriberBuilder;

use crate::config::RunSettings;

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Repulsive-curve flow runner")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Run the constrained descent flow on a polyline and write the result
    Run(RunArgs),
    /// Print energy, total length and counts of a polyline as JSON
    Energy {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        alpha: Option<f64>,
        #[arg(long)]
        beta: Option<f64>,
    },
    /// Print a small provenance JSON block
    Report,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    out: PathBuf,
    /// Maximum accepted steps (stops early on a stalled line search)
    #[arg(long)]
    steps: Option<usize>,
    /// JSON settings file; flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    alpha: Option<f64>,
    #[arg(long)]
    beta: Option<f64>,
    /// Per-step trace CSV
    #[arg(long)]
    trace: Option<PathBuf>,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Run(args) => run(args).map(|_| ()),
        Action::Energy { input, alpha, beta } => {
            let curve = load(&input)?;
            let summary = energy_summary(&curve, alpha, beta)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Action::Report => {
            let block = provenance::Provenance::new(json!({}));
            println!("{}", serde_json::to_string_pretty(&block)?);
            Ok(())
        }
    }
}

fn load(input: &Path) -> Result<Curve> {
    read_polyline(input).with_context(|| format!("loading polyline {}", input.display()))
}

/// Returns the path of the provenance sidecar.
fn run(args: RunArgs) -> Result<PathBuf> {
    let mut settings = match &args.config {
        Some(path) => RunSettings::load(path)?,
        None => RunSettings::default(),
    };
    settings.override_with(args.alpha, args.beta, args.steps);
    let cfg = settings.descent_cfg();
    let steps = settings.steps();

    let curve = load(&args.input)?;
    info!(
        input = %args.input.display(),
        vertices = curve.num_vertices(),
        edges = curve.num_edges(),
        steps,
        "run"
    );
    let mut flow = Flow::new(&curve, cfg).context("building curve topology")?;
    let energy_start = flow.energy()?;
    let reports = flow.run(steps)?;
    for (k, r) in reports.iter().enumerate() {
        info!(
            step = k,
            status = ?r.status,
            step_size = r.step_size,
            energy = r.energy_after,
            residual = r.residual,
            projection_iters = r.projection_iters,
            "step"
        );
    }
    let energy_end = flow.energy()?;

    ensure_parent(&args.out)?;
    write_polyline_file(&args.out, &flow.curve())
        .with_context(|| format!("writing polyline {}", args.out.display()))?;
    let mut extra = Vec::new();
    if let Some(path) = &args.trace {
        trace::write_trace_csv(path, &reports)?;
        extra.push(path.as_path());
    }

    let params = json!({
        "input": args.input.to_string_lossy(),
        "config": args.config.as_ref().map(|p| p.to_string_lossy().into_owned()),
        "descent": cfg_json(&cfg),
        "steps_requested": steps,
        "steps_accepted": flow.steps_taken(),
        "energy_start": energy_start,
        "energy_end": energy_end,
    });
    let sidecar = provenance::write_sidecar(&args.out, params, &extra)?;
    info!(
        out = %args.out.display(),
        energy_start,
        energy_end,
        accepted = flow.steps_taken(),
        "run finished"
    );
    Ok(sidecar)
}

fn energy_summary(curve: &Curve, alpha: Option<f64>, beta: Option<f64>) -> Result<Value> {
    let d = DescentCfg::default();
    let kernel = TangentPointKernel::new(alpha.unwrap_or(d.alpha), beta.unwrap_or(d.beta));
    let energy = tangent_point_energy_of(curve, kernel).context("building curve topology")?;
    Ok(json!({
        "energy": energy,
        "total_length": total_length(&curve.edges, &curve.vertices),
        "vertices": curve.num_vertices(),
        "edges": curve.num_edges(),
        "alpha": kernel.alpha,
        "beta": kernel.beta,
    }))
}

fn cfg_json(cfg: &DescentCfg) -> Value {
    json!({
        "alpha": cfg.alpha,
        "beta": cfg.beta,
        "a_const": cfg.a_const,
        "b_const": cfg.b_const,
        "threshold": cfg.threshold,
        "max_iters": cfg.max_iters,
    })
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output dir {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use repcurves::api::{jittered_loop, LoopCfg, ReplayToken};
    use repcurves::Vec3;
    use tempfile::tempdir;

    #[test]
    fn energy_summary_of_square() {
        let square = Curve::closed_loop(vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ]);
        let v = energy_summary(&square, None, None).unwrap();
        assert!((v["energy"].as_f64().unwrap() - 1.125).abs() < 1e-12);
        assert!((v["total_length"].as_f64().unwrap() - 8.0).abs() < 1e-12);
        assert_eq!(v["vertices"], 4);
        assert_eq!(v["edges"], 4);
    }

    #[test]
    fn energy_summary_rejects_bad_edges() {
        let bad = Curve::new(vec![Vec3::zeros(), Vec3::x()], vec![[0, 5]]);
        assert!(energy_summary(&bad, None, None).is_err());
    }

    #[test]
    fn run_writes_curve_trace_and_sidecar() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("loop.obj");
        let curve = jittered_loop(LoopCfg::default(), ReplayToken::new(11, 0));
        write_polyline_file(&input, &curve).unwrap();
        let cfg_path = dir.path().join("cfg.json");
        fs::write(&cfg_path, r#"{"max_iters": 20, "steps": 5}"#).unwrap();

        let out = dir.path().join("runs").join("loop_out.obj");
        let trace_path = dir.path().join("runs").join("trace.csv");
        let sidecar = run(RunArgs {
            input: input.clone(),
            out: out.clone(),
            steps: Some(2),
            config: Some(cfg_path),
            alpha: None,
            beta: None,
            trace: Some(trace_path.clone()),
        })
        .unwrap();

        let result = read_polyline(&out).unwrap();
        assert_eq!(result.edges, curve.edges);
        assert!(trace_path.exists());
        let doc: Value = serde_json::from_slice(&fs::read(&sidecar).unwrap()).unwrap();
        assert_eq!(doc["params"]["steps_requested"], 2);
        assert_eq!(doc["params"]["descent"]["max_iters"], 20);
        assert!(
            doc["params"]["energy_end"].as_f64().unwrap()
                <= doc["params"]["energy_start"].as_f64().unwrap()
        );
        assert_eq!(doc["outputs"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn run_reports_missing_input() {
        let dir = tempdir().unwrap();
        let err = run(RunArgs {
            input: dir.path().join("nope.obj"),
            out: dir.path().join("out.obj"),
            steps: None,
            config: None,
            alpha: None,
            beta: None,
            trace: None,
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("loading polyline"));
    }
}
