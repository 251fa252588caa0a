//! Minimal Wavefront OBJ reader: vertex positions and faces only.

use std::fmt;

pub type Vec3 = [f32; 3];

/// Triangle mesh read from an OBJ file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    /// Unique undirected edges, for wireframe rendering.
    pub fn edges(&self) -> Vec<(u32, u32)> {
        let mut edges: Vec<(u32, u32)> = self
            .triangles
            .iter()
            .flat_map(|&[a, b, c]| [(a, b), (b, c), (c, a)])
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjError {
    pub message: String,
    /// 1-based source line.
    pub line: usize,
}

impl ObjError {
    fn new(msg: impl Into<String>, line: usize) -> Self {
        Self { message: msg.into(), line }
    }
}

impl fmt::Display for ObjError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj parse error at line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ObjError {}

/// Parses `v` and `f` statements; everything else is skipped.
///
/// Faces with more than three corners are fan-triangulated. Negative indices
/// count back from the last vertex defined so far.
pub fn parse(src: &str) -> Result<Mesh, ObjError> {
    let mut mesh = Mesh::default();

    for (i, raw) in src.lines().enumerate() {
        let line = i + 1;
        let stmt = raw.split('#').next().unwrap_or("").trim();
        let mut tokens = stmt.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let mut coord = [0.0f32; 3];
                for c in &mut coord {
                    let tok = tokens
                        .next()
                        .ok_or_else(|| ObjError::new("vertex needs 3 coordinates", line))?;
                    *c = tok
                        .parse()
                        .map_err(|_| ObjError::new(format!("invalid coordinate '{tok}'"), line))?;
                }
                mesh.vertices.push(coord);
            }
            Some("f") => {
                let corners = tokens
                    .map(|tok| resolve_index(tok, mesh.vertices.len(), line))
                    .collect::<Result<Vec<_>, _>>()?;
                if corners.len() < 3 {
                    return Err(ObjError::new("face needs at least 3 vertices", line));
                }
                for k in 1..corners.len() - 1 {
                    mesh.triangles.push([corners[0], corners[k], corners[k + 1]]);
                }
            }
            _ => {}
        }
    }

    Ok(mesh)
}

/// Resolves one face corner (`v`, `v/vt`, `v//vn` or `v/vt/vn`) to a
/// zero-based vertex index.
fn resolve_index(tok: &str, defined: usize, line: usize) -> Result<u32, ObjError> {
    let head = tok.split('/').next().unwrap_or(tok);
    let n: i64 = head
        .parse()
        .map_err(|_| ObjError::new(format!("invalid vertex reference '{tok}'"), line))?;

    let index = match n {
        0 => None,
        n if n > 0 => Some(n - 1),
        n => Some(defined as i64 + n),
    };

    index
        .filter(|&i| (0..defined as i64).contains(&i))
        .and_then(|i| u32::try_from(i).ok())
        .ok_or_else(|| ObjError::new(format!("vertex reference {n} out of range"), line))
}
