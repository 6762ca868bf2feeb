//! Per-step trace table (one row per `StepReport`) written as CSV via polars.

use anyhow::{Context, Result};
use polars::prelude::*;
use repcurves::api::{StepReport, StepStatus};
use std::fs::{self, File};
use std::path::Path;

pub fn trace_frame(reports: &[StepReport]) -> PolarsResult<DataFrame> {
    let step: Vec<u32> = (0..reports.len() as u32).collect();
    let status: Vec<&str> = reports
        .iter()
        .map(|r| match r.status {
            StepStatus::Accepted => "accepted",
            StepStatus::Stalled => "stalled",
        })
        .collect();
    df!(
        "step" => step,
        "status" => status,
        "step_size" => reports.iter().map(|r| r.step_size).collect::<Vec<f64>>(),
        "energy_before" => reports.iter().map(|r| r.energy_before).collect::<Vec<f64>>(),
        "energy_after" => reports.iter().map(|r| r.energy_after).collect::<Vec<f64>>(),
        "projection_iters" => reports.iter().map(|r| r.projection_iters as u32).collect::<Vec<u32>>(),
        "residual" => reports.iter().map(|r| r.residual).collect::<Vec<f64>>(),
        "trials" => reports.iter().map(|r| r.trials as u32).collect::<Vec<u32>>()
    )
}

pub fn write_trace_csv<P: AsRef<Path>>(path: P, reports: &[StepReport]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating trace dir {}", parent.display()))?;
        }
    }
    let mut df = trace_frame(reports)?;
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
