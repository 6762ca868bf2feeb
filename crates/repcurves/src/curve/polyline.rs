//! Plain-text polyline format (`v x y z` / `l i j ...`, 1-based indices).
//!
//! - `v` lines add a vertex; extra coordinates beyond three are ignored.
//! - `l` lines add edges; a chain `l a b c` yields `(a,b)` and `(b,c)`.
//! - `#` starts a comment; blank lines and unknown tags are skipped.
//!
//! Index range checks are left to `Topology::build`, which sees the full vertex count.

use std::fmt;
use std::fs;
use std::path::Path;

use super::{Curve, Vec3};

/// Malformed line in a polyline file (`line` is 1-based).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub reason: String,
}

impl ParseError {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

impl std::error::Error for ParseError {}

/// Errors from the file helpers.
#[derive(Debug)]
pub enum PolylineIoError {
    Io(std::io::Error),
    Parse(ParseError),
}

impl fmt::Display for PolylineIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolylineIoError::Io(err) => write!(f, "polyline io: {err}"),
            PolylineIoError::Parse(err) => write!(f, "polyline parse: {err}"),
        }
    }
}

impl std::error::Error for PolylineIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PolylineIoError::Io(err) => Some(err),
            PolylineIoError::Parse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for PolylineIoError {
    fn from(err: std::io::Error) -> Self {
        PolylineIoError::Io(err)
    }
}

impl From<ParseError> for PolylineIoError {
    fn from(err: ParseError) -> Self {
        PolylineIoError::Parse(err)
    }
}

/// Parse the text form into a `Curve` (0-based edges).
pub fn parse_polyline(text: &str) -> Result<Curve, ParseError> {
    let mut curve = Curve::default();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let coords = tokens
                    .take(3)
                    .map(|t| {
                        t.parse::<f64>()
                            .map_err(|_| ParseError::new(line_no, format!("bad coordinate {t:?}")))
                    })
                    .collect::<Result<Vec<f64>, _>>()?;
                if coords.len() < 3 {
                    return Err(ParseError::new(line_no, "vertex needs 3 coordinates"));
                }
                curve.vertices.push(Vec3::new(coords[0], coords[1], coords[2]));
            }
            Some("l") => {
                let ids = tokens
                    .map(|t| parse_index(t, line_no))
                    .collect::<Result<Vec<usize>, _>>()?;
                if ids.len() < 2 {
                    return Err(ParseError::new(line_no, "line needs at least 2 indices"));
                }
                for pair in ids.windows(2) {
                    curve.edges.push([pair[0], pair[1]]);
                }
            }
            _ => {}
        }
    }
    Ok(curve)
}

fn parse_index(token: &str, line_no: usize) -> Result<usize, ParseError> {
    // Accept `i/j` style references by keeping the vertex part only.
    let head = token.split('/').next().unwrap_or(token);
    let one_based: usize = head
        .parse()
        .map_err(|_| ParseError::new(line_no, format!("bad index {token:?}")))?;
    if one_based == 0 {
        return Err(ParseError::new(line_no, "indices are 1-based; got 0"));
    }
    Ok(one_based - 1)
}

/// Format a curve as text (1-based, one `l` line per edge).
pub fn write_polyline(curve: &Curve) -> String {
    let mut out = String::with_capacity(32 * (curve.vertices.len() + curve.edges.len()));
    for v in &curve.vertices {
        out.push_str(&format!("v {} {} {}\n", v.x, v.y, v.z));
    }
    for &[a, b] in &curve.edges {
        out.push_str(&format!("l {} {}\n", a + 1, b + 1));
    }
    out
}

/// Read and parse a polyline file.
pub fn read_polyline<P: AsRef<Path>>(path: P) -> Result<Curve, PolylineIoError> {
    let text = fs::read_to_string(path)?;
    Ok(parse_polyline(&text)?)
}

/// Write a polyline file, replacing any existing content.
pub fn write_polyline_file<P: AsRef<Path>>(path: P, curve: &Curve) -> Result<(), PolylineIoError> {
    fs::write(path, write_polyline(curve))?;
    Ok(())
}
