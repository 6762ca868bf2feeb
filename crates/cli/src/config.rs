//! Run settings file: JSON with every field optional, layered over `DescentCfg::default()`.
//!
//! Precedence: defaults < config file < command-line flags.

use anyhow::{Context, Result};
use repcurves::api::DescentCfg;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Flow steps when neither the file nor the flags say otherwise.
pub const DEFAULT_STEPS: usize = 10;

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunSettings {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub a_const: Option<f64>,
    pub b_const: Option<f64>,
    pub threshold: Option<f64>,
    pub max_iters: Option<usize>,
    pub steps: Option<usize>,
}

impl RunSettings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Flags win over whatever the file set.
    pub fn override_with(&mut self, alpha: Option<f64>, beta: Option<f64>, steps: Option<usize>) {
        self.alpha = alpha.or(self.alpha);
        self.beta = beta.or(self.beta);
        self.steps = steps.or(self.steps);
    }

    pub fn descent_cfg(&self) -> DescentCfg {
        let d = DescentCfg::default();
        DescentCfg {
            alpha: self.alpha.unwrap_or(d.alpha),
            beta: self.beta.unwrap_or(d.beta),
            a_const: self.a_const.unwrap_or(d.a_const),
            b_const: self.b_const.unwrap_or(d.b_const),
            threshold: self.threshold.unwrap_or(d.threshold),
            max_iters: self.max_iters.unwrap_or(d.max_iters),
        }
    }

    #[inline]
    pub fn steps(&self) -> usize {
        self.steps.unwrap_or(DEFAULT_STEPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_file_means_defaults() {
        let s: RunSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(s.descent_cfg(), DescentCfg::default());
        assert_eq!(s.steps(), DEFAULT_STEPS);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let s: RunSettings = serde_json::from_str(r#"{"beta": 4.5, "max_iters": 25}"#).unwrap();
        let cfg = s.descent_cfg();
        assert_eq!(cfg.beta, 4.5);
        assert_eq!(cfg.max_iters, 25);
        assert_eq!(cfg.alpha, DescentCfg::default().alpha);
        assert_eq!(cfg.threshold, DescentCfg::default().threshold);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<RunSettings>(r#"{"alhpa": 2.0}"#).is_err());
    }

    #[test]
    fn flags_beat_file() {
        let mut s = RunSettings {
            alpha: Some(2.5),
            steps: Some(4),
            ..RunSettings::default()
        };
        s.override_with(Some(2.0), None, None);
        assert_eq!(s.alpha, Some(2.0));
        assert_eq!(s.beta, None);
        assert_eq!(s.steps(), 4);
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(&path, r#"{"threshold": 1e-8, "steps": 3}"#).unwrap();
        let s = RunSettings::load(&path).unwrap();
        assert_eq!(s.descent_cfg().threshold, 1e-8);
        assert_eq!(s.steps(), 3);
        assert!(RunSettings::load(dir.path().join("missing.json")).is_err());
    }
}
