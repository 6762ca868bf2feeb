//! Edge-pair weights `W` (order σ) and `W0` (fixed-shape regularizer).

use nalgebra::DMatrix;

use super::{COINCIDENT_WEIGHT, NEAR_COINCIDENT};
use crate::curve::{Geometry, Vec3};
use crate::energy::TangentPointKernel;
use crate::topology::Topology;

/// Pair weights, populated only at `(I, J)` with `J ∈ Ac[I]` (zero elsewhere).
///
/// `high` is symmetric; `low` uses `T_I` and is not.
#[derive(Clone, Debug)]
pub struct PairWeights {
    pub high: DMatrix<f64>,
    pub low: DMatrix<f64>,
}

/// Build `W` and `W0` for the current geometry.
///
/// For each ordered disjoint pair and each endpoint combination with `d = p - q`:
/// - `W  += 1 / |d|^(2σ+1)`
/// - `W0 += (|d × T_I|² / |d|⁴) / |d|^(2σ+1)` (the α=2, β=4 kernel, whatever the caller's shape)
///
/// then both are scaled by `¼ L_I L_J`. Points closer than `NEAR_COINCIDENT` add
/// `COINCIDENT_WEIGHT` to both sums instead of dividing by ~0.
pub fn pair_weights(
    kernel: &TangentPointKernel,
    topo: &Topology,
    vertices: &[Vec3],
    geom: &Geometry,
) -> PairWeights {
    let m = topo.num_edges();
    let edges = topo.edges();
    let exponent = 2.0 * kernel.sobolev_order() + 1.0;
    let mut high = DMatrix::zeros(m, m);
    let mut low = DMatrix::zeros(m, m);
    for (i, &[a0, a1]) in edges.iter().enumerate() {
        let t_i = geom.tangents[i];
        for &j in topo.disjoint(i) {
            let [b0, b1] = edges[j];
            let mut elt1 = 0.0;
            let mut elt2 = 0.0;
            for p in [a0, a1] {
                for q in [b0, b1] {
                    let diff = vertices[p] - vertices[q];
                    let d = diff.norm();
                    if d < NEAR_COINCIDENT {
                        elt1 += COINCIDENT_WEIGHT;
                        elt2 += COINCIDENT_WEIGHT;
                        continue;
                    }
                    let inv = d.powf(-exponent);
                    elt1 += inv;
                    elt2 += diff.cross(&t_i).norm_squared() / d.powi(4) * inv;
                }
            }
            let scale = 0.25 * geom.lengths[i] * geom.lengths[j];
            high[(i, j)] = scale * elt1;
            low[(i, j)] = scale * elt2;
        }
    }
    PairWeights { high, low }
}
