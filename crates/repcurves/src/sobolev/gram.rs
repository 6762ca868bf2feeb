//! Sobolev Gram matrix: `A = B + B0` (N×N) and its 3-fold replication `A_bar`.

use nalgebra::{DMatrix, DVector};

use super::weights::PairWeights;
use crate::curve::Geometry;
use crate::topology::Topology;

/// The fractional-Sobolev inner product on vertex displacements.
///
/// Coordinates are interleaved (`[x0, y0, z0, x1, ...]`), so
/// `A_bar[3p+a, 3q+b] = δ_ab A[p, q]`: the three coordinate groups never couple.
/// Only the N×N block is stored; `apply` acts on 3N vectors as an operator.
#[derive(Clone, Debug)]
pub struct SobolevGram {
    block: DMatrix<f64>,
}

impl SobolevGram {
    /// Fold the pair weights into the symmetric N×N form `A = B + B0`.
    ///
    /// Per ordered disjoint pair (I, J) and endpoint slots a, b with `s = (-1)^(a+b)`:
    /// - `B[I_a, I_b] += s W/L_I²`, `B[J_a, J_b] += s W/L_J²`
    /// - `B[I_a, J_b] -= s W ⟨T_I, T_J⟩ / (L_I L_J)` and its transpose
    /// - `B0` gets `±¼ W0` on the same four blocks (+ on I-I/J-J, - on I-J/J-I).
    pub fn assemble(topo: &Topology, geom: &Geometry, weights: &PairWeights) -> Self {
        let n = topo.num_vertices();
        let edges = topo.edges();
        let mut a = DMatrix::zeros(n, n);
        for (i, e_i) in edges.iter().enumerate() {
            let l_i = geom.lengths[i];
            for &j in topo.disjoint(i) {
                let e_j = &edges[j];
                let l_j = geom.lengths[j];
                let w = weights.high[(i, j)];
                let w0 = 0.25 * weights.low[(i, j)];
                let tt = geom.tangents[i].dot(&geom.tangents[j]);
                let self_i = w / (l_i * l_i);
                let self_j = w / (l_j * l_j);
                let cross = w * tt / (l_i * l_j);
                for sa in 0..2 {
                    for sb in 0..2 {
                        let s = if (sa + sb) % 2 == 0 { 1.0 } else { -1.0 };
                        a[(e_i[sa], e_i[sb])] += s * self_i + w0;
                        a[(e_j[sa], e_j[sb])] += s * self_j + w0;
                        a[(e_i[sa], e_j[sb])] -= s * cross + w0;
                        a[(e_j[sb], e_i[sa])] -= s * cross + w0;
                    }
                }
            }
        }
        Self { block: a }
    }

    /// The N×N block `A`.
    #[inline]
    pub fn block(&self) -> &DMatrix<f64> {
        &self.block
    }

    /// Side length of `A_bar` (3N).
    #[inline]
    pub fn dim(&self) -> usize {
        3 * self.block.nrows()
    }

    /// Entry `A_bar[r, c]`.
    #[inline]
    pub fn get(&self, r: usize, c: usize) -> f64 {
        if r % 3 == c % 3 {
            self.block[(r / 3, c / 3)]
        } else {
            0.0
        }
    }

    /// `A_bar x` without materializing `A_bar`: `A` applied to each coordinate slice.
    pub fn apply(&self, x: &DVector<f64>) -> DVector<f64> {
        let n = self.block.nrows();
        let mut out = DVector::zeros(3 * n);
        for axis in 0..3 {
            let slice = DVector::from_iterator(n, (0..n).map(|p| x[3 * p + axis]));
            let y = &self.block * slice;
            for p in 0..n {
                out[3 * p + axis] = y[p];
            }
        }
        out
    }

    /// Write `A_bar` into the top-left 3N×3N corner of `target` (other entries untouched).
    pub fn write_into(&self, target: &mut DMatrix<f64>) {
        let n = self.block.nrows();
        for p in 0..n {
            for q in 0..n {
                let v = self.block[(p, q)];
                for axis in 0..3 {
                    target[(3 * p + axis, 3 * q + axis)] = v;
                }
            }
        }
    }

    /// Materialized `A_bar` (tests and diagnostics).
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut out = DMatrix::zeros(self.dim(), self.dim());
        self.write_into(&mut out);
        out
    }
}
