//! Polyline curves in R³ and their per-step geometry snapshot.
//!
//! Purpose
//! - Hold the caller-owned state (`Curve`: vertices + edges) and compute the
//!   transient quantities every descent step starts from: edge lengths and unit
//!   tangents (`Geometry`).
//! - Provide the translation helpers used after an accepted step
//!   (length-weighted barycenter, recentering).
//!
//! Assumptions and conventions
//! - Edges are unordered in meaning but stored as `[tail, head]`; the tangent of
//!   edge `I` points from `tail` to `head`.
//! - Indices are 0-based. Validation of indices happens in `crate::topology`.
//! - Zero-length (or non-finite) edges are a precondition violation and are
//!   reported as `DegenerateEdge` before any matrix work.
//!
//! References
//! - Code cross-refs: `topology::Topology`, `descent::step`

pub mod polyline;
pub mod rand;

use std::fmt;

use nalgebra::Vector3;

/// Point/vector type used throughout the crate.
pub type Vec3 = Vector3<f64>;

/// A piecewise-linear curve (closed loops, open chains, or networks with branch vertices).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Curve {
    pub vertices: Vec<Vec3>,
    pub edges: Vec<[usize; 2]>,
}

impl Curve {
    #[inline]
    pub fn new(vertices: Vec<Vec3>, edges: Vec<[usize; 2]>) -> Self {
        Self { vertices, edges }
    }

    /// Closed loop through all vertices in order: edges `(k, k+1 mod n)`.
    pub fn closed_loop(vertices: Vec<Vec3>) -> Self {
        let n = vertices.len();
        let edges = (0..n).map(|k| [k, (k + 1) % n]).collect();
        Self { vertices, edges }
    }

    /// Open chain through all vertices in order: edges `(k, k+1)`.
    pub fn open_chain(vertices: Vec<Vec3>) -> Self {
        let n = vertices.len();
        let edges = (1..n).map(|k| [k - 1, k]).collect();
        Self { vertices, edges }
    }

    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }
}

/// An edge whose length is zero (or not finite).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DegenerateEdge {
    pub edge: usize,
    pub length: f64,
}

impl fmt::Display for DegenerateEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "edge {} is degenerate (length {:e}); coincident endpoints are not allowed",
            self.edge, self.length
        )
    }
}

impl std::error::Error for DegenerateEdge {}

/// Lengths and unit tangents for the current vertex positions.
///
/// Invariants:
/// - `lengths[i] > 0` and finite for every edge.
/// - `tangents[i]` is unit length and points from `edges[i][0]` to `edges[i][1]`.
#[derive(Clone, Debug)]
pub struct Geometry {
    pub lengths: Vec<f64>,
    pub tangents: Vec<Vec3>,
}

impl Geometry {
    /// Compute the snapshot; fails on the first degenerate edge.
    pub fn compute(edges: &[[usize; 2]], vertices: &[Vec3]) -> Result<Self, DegenerateEdge> {
        let mut lengths = Vec::with_capacity(edges.len());
        let mut tangents = Vec::with_capacity(edges.len());
        for (i, &[a, b]) in edges.iter().enumerate() {
            let e = vertices[b] - vertices[a];
            let len = e.norm();
            if !len.is_finite() || len <= 0.0 {
                return Err(DegenerateEdge {
                    edge: i,
                    length: len,
                });
            }
            lengths.push(len);
            tangents.push(e / len);
        }
        Ok(Self { lengths, tangents })
    }

    #[inline]
    pub fn total_length(&self) -> f64 {
        self.lengths.iter().sum()
    }
}

/// Edge lengths without the tangent computation or degeneracy check.
pub fn edge_lengths(edges: &[[usize; 2]], vertices: &[Vec3]) -> Vec<f64> {
    edges
        .iter()
        .map(|&[a, b]| (vertices[b] - vertices[a]).norm())
        .collect()
}

/// Sum of edge lengths.
pub fn total_length(edges: &[[usize; 2]], vertices: &[Vec3]) -> f64 {
    edge_lengths(edges, vertices).iter().sum()
}

/// Length-weighted barycenter of edge midpoints: `Σ L_I (a+b)/2 / Σ L_I`.
///
/// Returns `None` when the total length is zero.
pub fn length_weighted_barycenter(edges: &[[usize; 2]], vertices: &[Vec3]) -> Option<Vec3> {
    let mut weighted = Vec3::zeros();
    let mut total = 0.0;
    for &[a, b] in edges {
        let len = (vertices[b] - vertices[a]).norm();
        weighted += (vertices[a] + vertices[b]) * (0.5 * len);
        total += len;
    }
    if total > 0.0 && total.is_finite() {
        Some(weighted / total)
    } else {
        None
    }
}

/// Translate `vertices` so the length-weighted barycenter sits at the origin.
///
/// Returns the translation that was subtracted (zero if the barycenter is undefined).
pub fn recenter(edges: &[[usize; 2]], vertices: &mut [Vec3]) -> Vec3 {
    let Some(bary) = length_weighted_barycenter(edges, vertices) else {
        return Vec3::zeros();
    };
    for v in vertices.iter_mut() {
        *v -= bary;
    }
    bary
}
