//! Discrete tangent-point energy and its analytic gradient.
//!
//! Energy
//! - `E = Σ_I Σ_{J∈Ac[I]} ¼ L_I L_J Σ_{i,j∈{0,1}} k(x_{I,i} - x_{J,j}, T_I)`, summed over
//!   ordered disjoint pairs, with `k` the tangent-point kernel. The pair term is not
//!   symmetric (`T_I` is the tangent of the first edge).
//!
//! Gradient
//! - Assembled per vertex `p`: for every edge `I ∋ p` and every `J ∈ Ac[I]` we add the
//!   derivative of both ordered terms `e_IJ` (p on the tangent edge) and `e_JI` (p on
//!   the partner edge). Every ordered pair reaches each of its four vertices exactly
//!   once this way.
//! - `e_IJ` depends on `p = x_{I,s}` through `L_I` (`∂L_I = ±T_I`), through the point
//!   differences `x_{I,s} - x_{J,j}`, and through `T_I` (`∂T_I = ±(Id - T_I T_Iᵀ)/L_I`).
//! - `e_JI` depends on `p` through `L_I` and the differences `x_{J,j} - x_{I,s}`.
//! - The sign `±` is `+` when `p` is the head of `I`, `-` when it is the tail. Swapping
//!   it yields a plausible but wrong gradient; `tests.rs` checks against finite differences.

mod kernel;

pub use kernel::TangentPointKernel;

use nalgebra::{DVector, Matrix3};

use crate::curve::{Geometry, Vec3};
use crate::topology::Topology;

/// Tangent-point energy for the current vertices.
pub fn tangent_point_energy(
    kernel: &TangentPointKernel,
    topo: &Topology,
    vertices: &[Vec3],
    geom: &Geometry,
) -> f64 {
    let edges = topo.edges();
    let mut total = 0.0;
    for (i, &[a0, a1]) in edges.iter().enumerate() {
        let t_i = geom.tangents[i];
        for &j in topo.disjoint(i) {
            let [b0, b1] = edges[j];
            let mut sum = 0.0;
            for p in [a0, a1] {
                for q in [b0, b1] {
                    sum += kernel.value(&(vertices[p] - vertices[q]), &t_i);
                }
            }
            total += 0.25 * geom.lengths[i] * geom.lengths[j] * sum;
        }
    }
    total
}

/// Gradient of `tangent_point_energy` with respect to the flattened coordinates
/// (`[x0, y0, z0, x1, ...]`, length `3N`).
pub fn energy_gradient(
    kernel: &TangentPointKernel,
    topo: &Topology,
    vertices: &[Vec3],
    geom: &Geometry,
) -> DVector<f64> {
    let edges = topo.edges();
    let mut deriv = DVector::zeros(3 * topo.num_vertices());
    for p in 0..topo.num_vertices() {
        let mut acc = Vec3::zeros();
        for &i in topo.incident(p) {
            let [a0, a1] = edges[i];
            let sign = if a1 == p { 1.0 } else { -1.0 };
            let x_p = vertices[p];
            let t_i = geom.tangents[i];
            let l_i = geom.lengths[i];
            let proj = Matrix3::identity() - t_i * t_i.transpose();
            for &j in topo.disjoint(i) {
                let [b0, b1] = edges[j];
                let t_j = geom.tangents[j];
                let l_j = geom.lengths[j];

                // e_IJ: kernel sums over all four endpoint combinations.
                let mut s_own = 0.0;
                let mut g_t = Vec3::zeros();
                // e_JI: same combinations seen from J.
                let mut s_partner = 0.0;
                for a in [a0, a1] {
                    for b in [b0, b1] {
                        let d = vertices[a] - vertices[b];
                        s_own += kernel.value(&d, &t_i);
                        g_t += kernel.grad_t(&d, &t_i);
                        s_partner += kernel.value(&(-d), &t_j);
                    }
                }
                // Point-difference terms where p is the moving endpoint.
                let mut g_own = Vec3::zeros();
                let mut g_partner = Vec3::zeros();
                for b in [b0, b1] {
                    let d = x_p - vertices[b];
                    g_own += kernel.grad_d(&d, &t_i);
                    g_partner -= kernel.grad_d(&(-d), &t_j);
                }

                let own = t_i * (sign * s_own) + g_own * l_i + proj * g_t * sign;
                let partner = t_i * (sign * s_partner) + g_partner * l_i;
                acc += (own + partner) * (0.25 * l_j);
            }
        }
        deriv.fixed_rows_mut::<3>(3 * p).copy_from(&acc);
    }
    deriv
}
