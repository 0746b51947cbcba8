//! STL encoding and decoding: binary and ASCII.
//!
//! Binary layout:
//! - 80 bytes: header
//! - 4 bytes: u32 LE triangle count
//! - Per triangle (50 bytes each):
//!   - 12 bytes: normal vector (3 × f32 LE)
//!   - 36 bytes: 3 vertices (3 × 3 × f32 LE)
//!   - 2 bytes: attribute byte count (0u16)
//!
//! Decoding welds bit-identical positions, so a decoded mesh is indexed.

use mesh_types::mesh::triangle_normal;
use mesh_types::TriangleMesh;
use serde::{Deserialize, Serialize};

use crate::errors::{ExportError, LoadError};

const HEADER_SIZE: usize = 80;
const TRIANGLE_SIZE: usize = 50;

/// Which STL flavour to write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StlEncoding {
    #[default]
    Binary,
    Ascii,
}

/// Encode `mesh` as binary STL. The header carries `name`.
pub fn encode_binary(mesh: &TriangleMesh, name: &str) -> Result<Vec<u8>, ExportError> {
    mesh.validate()?;

    let tri_count = mesh.triangle_count();
    let mut buf = Vec::with_capacity(HEADER_SIZE + 4 + tri_count * TRIANGLE_SIZE);

    let header = format!("binary STL: {}", name);
    let header_bytes = header.as_bytes();
    buf.extend_from_slice(&header_bytes[..header_bytes.len().min(HEADER_SIZE)]);
    buf.resize(HEADER_SIZE, 0u8);

    buf.extend_from_slice(&(tri_count as u32).to_le_bytes());

    for [v0, v1, v2] in mesh.triangle_positions() {
        for c in triangle_normal(v0, v1, v2) {
            buf.extend_from_slice(&c.to_le_bytes());
        }
        for v in [v0, v1, v2] {
            for c in v {
                buf.extend_from_slice(&c.to_le_bytes());
            }
        }
        // Attribute byte count
        buf.extend_from_slice(&0u16.to_le_bytes());
    }

    Ok(buf)
}

/// Encode `mesh` as ASCII STL.
pub fn encode_ascii(mesh: &TriangleMesh, name: &str) -> Result<String, ExportError> {
    mesh.validate()?;

    let name = header_name(name);
    let mut out = String::with_capacity(mesh.triangle_count() * 300);
    out.push_str(&format!("solid {}\n", name));

    for [v0, v1, v2] in mesh.triangle_positions() {
        let [nx, ny, nz] = triangle_normal(v0, v1, v2);
        out.push_str(&format!("  facet normal {:e} {:e} {:e}\n", nx, ny, nz));
        out.push_str("    outer loop\n");
        for v in [v0, v1, v2] {
            // `{:e}` keeps full f32 precision so decoding welds the same vertices.
            out.push_str(&format!("      vertex {:e} {:e} {:e}\n", v[0], v[1], v[2]));
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    }

    out.push_str(&format!("endsolid {}\n", name));
    Ok(out)
}

/// `name` as a single whitespace-free token for the `solid`/`endsolid` lines.
fn header_name(name: &str) -> String {
    let joined = name.split_whitespace().collect::<Vec<_>>().join("_");
    if joined.is_empty() {
        "mesh".to_string()
    } else {
        joined
    }
}

/// Whether `bytes` look like a binary STL.
///
/// Some binary exporters start their header with `solid`, so the size
/// formula decides first and the keyword only breaks ties.
pub fn is_binary(bytes: &[u8]) -> bool {
    if bytes.len() < HEADER_SIZE + 4 {
        return false;
    }
    let count = read_u32(bytes, HEADER_SIZE) as usize;
    let expected = count
        .checked_mul(TRIANGLE_SIZE)
        .and_then(|n| n.checked_add(HEADER_SIZE + 4));
    if expected == Some(bytes.len()) {
        return true;
    }
    !starts_with_solid(bytes)
}

fn starts_with_solid(bytes: &[u8]) -> bool {
    let trimmed = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|start| &bytes[start..])
        .unwrap_or(&[]);
    trimmed.starts_with(b"solid")
}

/// Decode an STL of either flavour.
pub fn decode(bytes: &[u8]) -> Result<TriangleMesh, LoadError> {
    if is_binary(bytes) {
        decode_binary(bytes)
    } else if starts_with_solid(bytes) {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| LoadError::MalformedStl(format!("ASCII STL is not UTF-8: {e}")))?;
        decode_ascii(text)
    } else {
        Err(LoadError::MalformedStl(format!(
            "file too short for binary STL ({} bytes)",
            bytes.len()
        )))
    }
}

/// Decode a binary STL.
pub fn decode_binary(bytes: &[u8]) -> Result<TriangleMesh, LoadError> {
    if bytes.len() < HEADER_SIZE + 4 {
        return Err(LoadError::MalformedStl(format!(
            "file too short for binary STL ({} bytes)",
            bytes.len()
        )));
    }
    let count = read_u32(bytes, HEADER_SIZE) as usize;
    let body = &bytes[HEADER_SIZE + 4..];
    let needed = count.checked_mul(TRIANGLE_SIZE).unwrap_or(usize::MAX);
    if body.len() < needed {
        return Err(LoadError::MalformedStl(format!(
            "header declares {} triangles but only {} bytes follow",
            count,
            body.len()
        )));
    }

    let triangles = body[..needed].chunks_exact(TRIANGLE_SIZE).map(|record| {
        // Skip the stored normal; it is recomputed on export.
        let corner = |i: usize| {
            let base = 12 + i * 12;
            [
                read_f32(record, base),
                read_f32(record, base + 4),
                read_f32(record, base + 8),
            ]
        };
        [corner(0), corner(1), corner(2)]
    });
    Ok(TriangleMesh::from_triangle_soup(triangles))
}

/// Decode an ASCII STL.
pub fn decode_ascii(text: &str) -> Result<TriangleMesh, LoadError> {
    let header = text
        .trim_start()
        .strip_prefix("solid")
        .ok_or_else(|| LoadError::MalformedStl("missing 'solid' keyword".to_string()))?;
    // The rest of the header line is a free-form name.
    let body = header.split_once('\n').map_or("", |(_, body)| body);
    let mut tokens = body.split_whitespace();

    let mut triangles: Vec<[[f32; 3]; 3]> = Vec::new();
    let mut corners: Vec<[f32; 3]> = Vec::with_capacity(3);
    let mut in_loop = false;

    while let Some(token) = tokens.next() {
        match token {
            "outer" => {
                if tokens.next() != Some("loop") {
                    return Err(LoadError::MalformedStl("expected 'loop' after 'outer'".to_string()));
                }
                in_loop = true;
                corners.clear();
            }
            "vertex" => {
                if !in_loop {
                    return Err(LoadError::MalformedStl("vertex outside of a loop".to_string()));
                }
                let mut v = [0.0f32; 3];
                for c in v.iter_mut() {
                    let raw = tokens.next().ok_or_else(|| {
                        LoadError::MalformedStl("truncated vertex".to_string())
                    })?;
                    *c = raw.parse().map_err(|_| {
                        LoadError::MalformedStl(format!("invalid coordinate '{raw}'"))
                    })?;
                }
                corners.push(v);
            }
            "endloop" => {
                if corners.len() != 3 {
                    return Err(LoadError::MalformedStl(format!(
                        "facet with {} vertices (expected 3)",
                        corners.len()
                    )));
                }
                triangles.push([corners[0], corners[1], corners[2]]);
                in_loop = false;
            }
            "endsolid" => {
                return if in_loop {
                    Err(LoadError::MalformedStl("unterminated loop".to_string()))
                } else {
                    Ok(TriangleMesh::from_triangle_soup(triangles))
                };
            }
            // facet / normal / endfacet / names / normal components
            _ => {}
        }
    }

    Err(LoadError::MalformedStl("missing 'endsolid'".to_string()))
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_f32(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
