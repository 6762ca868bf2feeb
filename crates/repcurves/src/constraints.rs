//! Length constraints: total curve length plus per-edge lengths at branch vertices.
//!
//! Constraint values `φ` (zero when satisfied):
//! - total: `φ_0 = L0_total - Σ_I L_I`
//! - per constrained edge `I`: `φ_i = L0[I] - L_I`
//!
//! `jacobian` returns `C = ∂φ/∂x` (rows × 3N, interleaved coordinates). For edge
//! `I = (a, b)`, `∂L_I/∂x_b = T_I` and `∂L_I/∂x_a = -T_I`, so every row holds
//! `-(x_p - x_other)/L_I` at each endpoint `p`.
//!
//! When every edge is branch-constrained the total row equals minus the sum of
//! the per-edge rows; it is dropped in that case so `[C; ...]` keeps full row rank.

use nalgebra::{DMatrix, DVector};

use crate::curve::{edge_lengths, Geometry, Vec3};
use crate::topology::Topology;

/// Which constraints are active for a topology, with their target values.
#[derive(Clone, Debug)]
pub struct ConstraintSet {
    total_length: Option<f64>,
    edges: Vec<usize>,
    targets: Vec<f64>,
}

impl ConstraintSet {
    pub fn new(topo: &Topology) -> Self {
        let edges = topo.constrained_edges().to_vec();
        let targets = edges.iter().map(|&i| topo.rest_lengths()[i]).collect();
        let total_length = if edges.len() < topo.num_edges() {
            Some(topo.rest_total_length())
        } else {
            None
        };
        Self {
            total_length,
            edges,
            targets,
        }
    }

    /// Number of constraint rows `k`.
    #[inline]
    pub fn len(&self) -> usize {
        usize::from(self.total_length.is_some()) + self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn has_total_length(&self) -> bool {
        self.total_length.is_some()
    }

    /// Branch-constrained edge indices, in row order.
    #[inline]
    pub fn constrained_edges(&self) -> &[usize] {
        &self.edges
    }

    /// Constraint Jacobian `C` at the geometry `geom` (rows × 3N).
    pub fn jacobian(&self, topo: &Topology, vertices: &[Vec3], geom: &Geometry) -> DMatrix<f64> {
        let edges = topo.edges();
        let mut c = DMatrix::zeros(self.len(), 3 * topo.num_vertices());
        let mut row = 0;
        if self.total_length.is_some() {
            for p in 0..topo.num_vertices() {
                let mut acc = Vec3::zeros();
                for &i in topo.incident(p) {
                    acc -= outward(edges[i], p, vertices) / geom.lengths[i];
                }
                for axis in 0..3 {
                    c[(row, 3 * p + axis)] = acc[axis];
                }
            }
            row += 1;
        }
        for &i in &self.edges {
            let [a, b] = edges[i];
            for p in [a, b] {
                let g = -outward(edges[i], p, vertices) / geom.lengths[i];
                for axis in 0..3 {
                    c[(row, 3 * p + axis)] = g[axis];
                }
            }
            row += 1;
        }
        c
    }

    /// Constraint values `φ` at `vertices` (the projection residual).
    pub fn residual(&self, topo: &Topology, vertices: &[Vec3]) -> DVector<f64> {
        let lengths = edge_lengths(topo.edges(), vertices);
        let mut r = DVector::zeros(self.len());
        let mut row = 0;
        if let Some(total) = self.total_length {
            r[row] = total - lengths.iter().sum::<f64>();
            row += 1;
        }
        for (&i, &target) in self.edges.iter().zip(&self.targets) {
            r[row] = target - lengths[i];
            row += 1;
        }
        r
    }
}

/// `x_p - x_other` for edge `e` with endpoint `p`.
#[inline]
fn outward(e: [usize; 2], p: usize, vertices: &[Vec3]) -> Vec3 {
    let other = if e[0] == p { e[1] } else { e[0] };
    vertices[p] - vertices[other]
}
