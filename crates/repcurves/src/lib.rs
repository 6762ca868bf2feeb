//! Repulsive curves: constrained fractional-Sobolev descent on the tangent-point energy.
//!
//! Pipeline per step
//! - `topology` (built once per curve load) → `curve::Geometry` (lengths, tangents)
//!   → `sobolev` (pair weights, Gram matrix) → `energy` (gradient) + `constraints`
//!   (Jacobian) → `descent` (saddle-point solve, line search, projection, recentering).
//!
//! API Policy
//! - `descent::step` is a pure compute step: it borrows the caller's vertices for
//!   the duration of the call only and returns new vertices.
//! - File formats stay at the edge (`curve::polyline`); the CLI crate owns I/O policy.

pub mod api;
pub mod constraints;
pub mod curve;
pub mod descent;
pub mod energy;
pub mod sobolev;
pub mod topology;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use curve::Vec3;

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::curve::polyline::{parse_polyline, read_polyline, write_polyline};
    pub use crate::curve::{Curve, Geometry};
    pub use crate::descent::{step, DescentCfg, Flow, StepError, StepReport, StepStatus};
    pub use crate::topology::{Topology, TopologyError};
    pub use crate::curve::Vec3;
}
