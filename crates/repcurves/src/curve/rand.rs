//! Random and parametric test curves (radial jitter + replay tokens).
//!
//! Purpose
//! - Provide small, deterministic curve families for tests, benches and CLI demos.
//! - Determinism uses a replay token `(seed, index)` mixed into a single RNG, so
//!   a failing draw can be regenerated from two integers.
//!
//! Model
//! - `jittered_loop`: `n` equally spaced angles on a circle, bounded angular,
//!   radial and vertical jitter, joined into a closed loop.
//! - `open_polyline`: the same sampler without the closing edge.
//! - `torus_knot`: deterministic (p, q) torus knot sampled at `n` points.

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Curve;

/// Jittered-circle sampler configuration.
#[derive(Clone, Copy, Debug)]
pub struct LoopCfg {
    pub vertex_count: usize,
    /// Angular jitter as a fraction of the base spacing Δ=2π/n. Clamped to [0, 0.45].
    pub angle_jitter_frac: f64,
    /// Radii are `radius * (1 + u)`, with `u ∈ [-radial_jitter, radial_jitter]`.
    pub radial_jitter: f64,
    /// Vertical offsets are uniform in `[-vertical_jitter, vertical_jitter] * radius`.
    pub vertical_jitter: f64,
    pub radius: f64,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            vertex_count: 12,
            angle_jitter_frac: 0.2,
            radial_jitter: 0.15,
            vertical_jitter: 0.2,
            radius: 1.0,
        }
    }
}

/// Replay token to make draws reproducible and indexable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}

impl ReplayToken {
    #[inline]
    pub fn new(seed: u64, index: u64) -> Self {
        Self { seed, index }
    }

    #[inline]
    fn to_std_rng(self) -> StdRng {
        // SplitMix64-style mixing, cheap and stable.
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        let k = mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15)));
        StdRng::seed_from_u64(k)
    }
}

fn jittered_points(cfg: LoopCfg, tok: ReplayToken) -> Vec<Vector3<f64>> {
    let mut rng = tok.to_std_rng();
    let n = cfg.vertex_count.max(3);
    let aj = cfg.angle_jitter_frac.clamp(0.0, 0.45);
    let rj = cfg.radial_jitter.clamp(0.0, 0.9);
    let zj = cfg.vertical_jitter.max(0.0);
    let r0 = cfg.radius.max(1e-9);
    let delta = std::f64::consts::TAU / (n as f64);
    (0..n)
        .map(|k| {
            let th = (k as f64) * delta + (rng.gen::<f64>() * 2.0 - 1.0) * aj * delta;
            let r = r0 * (1.0 + (rng.gen::<f64>() * 2.0 - 1.0) * rj);
            let z = r0 * zj * (rng.gen::<f64>() * 2.0 - 1.0);
            Vector3::new(th.cos() * r, th.sin() * r, z)
        })
        .collect()
}

/// Draw a closed, non-planar loop around the z axis.
///
/// Angles stay sorted (jitter < Δ/2), so consecutive vertices never coincide.
pub fn jittered_loop(cfg: LoopCfg, tok: ReplayToken) -> Curve {
    Curve::closed_loop(jittered_points(cfg, tok))
}

/// Draw an open chain; the last vertex is not joined back to the first.
pub fn open_polyline(cfg: LoopCfg, tok: ReplayToken) -> Curve {
    Curve::open_chain(jittered_points(cfg, tok))
}

/// Closed (p, q) torus knot with `n` samples (major radius 2, minor radius 1).
///
/// `p=2, q=3` gives the trefoil.
pub fn torus_knot(p: u32, q: u32, n: usize) -> Curve {
    let n = n.max(3);
    let (p, q) = (p as f64, q as f64);
    let pts = (0..n)
        .map(|k| {
            let s = std::f64::consts::TAU * (k as f64) / (n as f64);
            let r = 2.0 + (q * s).cos();
            Vector3::new(r * (p * s).cos(), r * (p * s).sin(), -(q * s).sin())
        })
        .collect();
    Curve::closed_loop(pts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_token_is_deterministic() {
        let a = jittered_loop(LoopCfg::default(), ReplayToken::new(7, 3));
        let b = jittered_loop(LoopCfg::default(), ReplayToken::new(7, 3));
        let c = jittered_loop(LoopCfg::default(), ReplayToken::new(7, 4));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn loop_and_chain_edge_counts() {
        let cfg = LoopCfg {
            vertex_count: 9,
            ..LoopCfg::default()
        };
        let tok = ReplayToken::new(1, 0);
        assert_eq!(jittered_loop(cfg, tok).num_edges(), 9);
        assert_eq!(open_polyline(cfg, tok).num_edges(), 8);
    }

    #[test]
    fn trefoil_has_no_short_edges() {
        let k = torus_knot(2, 3, 60);
        let lens = crate::curve::edge_lengths(&k.edges, &k.vertices);
        assert!(lens.iter().all(|&l| l > 1e-3));
    }
}
