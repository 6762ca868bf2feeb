//! Topology cache: disjoint-edge lists, vertex→edge incidence, rest lengths.
//!
//! Purpose
//! - Precompute, once per curve load, everything that depends only on the edge
//!   list (plus the load-time lengths that serve as constraint targets).
//! - Store the variable-length lists CSR-style (one contiguous arena plus an
//!   offset table) so row access is O(1) without nested `Vec`s.
//!
//! Invariants
//! - `disjoint(i)` never contains `i`, and `j ∈ disjoint(i) ⇔ i ∈ disjoint(j)`.
//! - `incident(p)` lists exactly the edges with `p` as an endpoint, ascending.
//! - `constrained_edges()` lists (ascending, deduplicated) every edge touching a
//!   vertex of degree > 2.
//!
//! Complexity: O(M²) for the disjoint lists, O(M + N) for the rest.

use std::fmt;

use crate::curve::{edge_lengths, Curve, Vec3};

/// Compressed rows of indices (`offsets.len() == rows + 1`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Csr {
    offsets: Vec<usize>,
    items: Vec<usize>,
}

impl Csr {
    fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoIterator<Item = usize>,
    {
        let mut offsets = vec![0];
        let mut items = Vec::new();
        for row in rows {
            items.extend(row);
            offsets.push(items.len());
        }
        Self { offsets, items }
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[usize] {
        &self.items[self.offsets[i]..self.offsets[i + 1]]
    }

    /// Total number of stored indices.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.items.len()
    }
}

/// Malformed input rejected while building a topology (`InvalidTopology`).
#[derive(Clone, Debug, PartialEq)]
pub enum TopologyError {
    /// No edges at all.
    Empty,
    /// Edge references a vertex index `>= num_vertices`.
    EdgeOutOfRange {
        edge: usize,
        vertex: usize,
        num_vertices: usize,
    },
    /// Edge connects a vertex to itself.
    SelfLoop { edge: usize, vertex: usize },
    /// Vertex coordinate is NaN or infinite.
    NonFiniteVertex { vertex: usize },
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyError::Empty => write!(f, "invalid topology: curve has no edges"),
            TopologyError::EdgeOutOfRange {
                edge,
                vertex,
                num_vertices,
            } => write!(
                f,
                "invalid topology: edge {edge} references vertex {vertex} but only {num_vertices} vertices exist"
            ),
            TopologyError::SelfLoop { edge, vertex } => {
                write!(f, "invalid topology: edge {edge} is a self-loop at vertex {vertex}")
            }
            TopologyError::NonFiniteVertex { vertex } => {
                write!(f, "invalid topology: vertex {vertex} has a non-finite coordinate")
            }
        }
    }
}

impl std::error::Error for TopologyError {}

/// Edge-list-derived data, immutable while the edges are fixed.
#[derive(Clone, Debug)]
pub struct Topology {
    edges: Vec<[usize; 2]>,
    num_vertices: usize,
    disjoint: Csr,
    incident: Csr,
    rest_lengths: Vec<f64>,
    constrained: Vec<usize>,
}

impl Topology {
    /// Validate `edges` against `vertices` and build all lists.
    pub fn build(edges: &[[usize; 2]], vertices: &[Vec3]) -> Result<Self, TopologyError> {
        if edges.is_empty() {
            return Err(TopologyError::Empty);
        }
        let n = vertices.len();
        if let Some(vertex) = vertices
            .iter()
            .position(|v| !v.iter().all(|c| c.is_finite()))
        {
            return Err(TopologyError::NonFiniteVertex { vertex });
        }
        for (edge, &[a, b]) in edges.iter().enumerate() {
            for vertex in [a, b] {
                if vertex >= n {
                    return Err(TopologyError::EdgeOutOfRange {
                        edge,
                        vertex,
                        num_vertices: n,
                    });
                }
            }
            if a == b {
                return Err(TopologyError::SelfLoop { edge, vertex: a });
            }
        }

        let m = edges.len();
        let disjoint = Csr::from_rows((0..m).map(|i| {
            let [a0, a1] = edges[i];
            (0..m).filter(move |&j| {
                let [b0, b1] = edges[j];
                j != i && a0 != b0 && a0 != b1 && a1 != b0 && a1 != b1
            })
        }));

        let mut by_vertex: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, &[a, b]) in edges.iter().enumerate() {
            by_vertex[a].push(i);
            by_vertex[b].push(i);
        }
        let mut constrained: Vec<usize> = by_vertex
            .iter()
            .filter(|inc| inc.len() > 2)
            .flatten()
            .copied()
            .collect();
        constrained.sort_unstable();
        constrained.dedup();
        let incident = Csr::from_rows(by_vertex);

        Ok(Self {
            edges: edges.to_vec(),
            num_vertices: n,
            disjoint,
            incident,
            rest_lengths: edge_lengths(edges, vertices),
            constrained,
        })
    }

    /// Convenience wrapper over `build` for a whole curve.
    #[inline]
    pub fn from_curve(curve: &Curve) -> Result<Self, TopologyError> {
        Self::build(&curve.edges, &curve.vertices)
    }

    #[inline]
    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Edges sharing no endpoint with edge `i` (`Ac[i]`).
    #[inline]
    pub fn disjoint(&self, i: usize) -> &[usize] {
        self.disjoint.row(i)
    }

    /// Edges incident to vertex `p` (`Eadj[p]`).
    #[inline]
    pub fn incident(&self, p: usize) -> &[usize] {
        self.incident.row(p)
    }

    #[inline]
    pub fn degree(&self, p: usize) -> usize {
        self.incident.row(p).len()
    }

    /// Load-time edge lengths (`L0`).
    #[inline]
    pub fn rest_lengths(&self) -> &[f64] {
        &self.rest_lengths
    }

    #[inline]
    pub fn rest_total_length(&self) -> f64 {
        self.rest_lengths.iter().sum()
    }

    /// Edges touching a branch vertex (degree > 2); each gets its own length constraint.
    #[inline]
    pub fn constrained_edges(&self) -> &[usize] {
        &self.constrained
    }

    /// Number of ordered disjoint pairs (`Σ |Ac[i]|`).
    #[inline]
    pub fn num_disjoint_pairs(&self) -> usize {
        self.disjoint.nnz()
    }
}
