//! Binary glTF 2.0 (GLB) encoding and decoding for single triangle meshes.
//!
//! The writer emits one scene with one node, one mesh and one primitive
//! (POSITION, NORMAL and u32 indices) plus a neutral default material.
//! The reader accepts any GLB whose primitives are indexed or non-indexed
//! triangle lists with float VEC3 positions, and merges them into one mesh.

use std::borrow::Cow;
use std::collections::HashMap;

use mesh_types::TriangleMesh;
use serde::Deserialize;

use crate::errors::{ExportError, LoadError};

/// GLB magic number: "glTF"
const GLB_MAGIC: u32 = 0x46546C67;
/// GLB version 2
const GLB_VERSION: u32 = 2;
/// JSON chunk type
const CHUNK_TYPE_JSON: u32 = 0x4E4F534A;
/// BIN chunk type
const CHUNK_TYPE_BIN: u32 = 0x004E4942;

/// glTF component types
const UNSIGNED_BYTE: u32 = 5121;
const UNSIGNED_SHORT: u32 = 5123;
const UNSIGNED_INT: u32 = 5125;
const FLOAT: u32 = 5126;

/// glTF buffer view targets
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

/// glTF primitive mode for triangle lists
const MODE_TRIANGLES: u32 = 4;

/// Build a complete GLB file holding `mesh` as a single node named `name`.
pub fn encode(mesh: &TriangleMesh, name: &str) -> Result<Vec<u8>, ExportError> {
    mesh.validate()?;

    let mesh: Cow<'_, TriangleMesh> = if mesh.has_normals() {
        Cow::Borrowed(mesh)
    } else {
        let mut with_normals = mesh.clone();
        with_normals.compute_vertex_normals();
        Cow::Owned(with_normals)
    };

    let bounds = mesh.bounds().ok_or(ExportError::EmptyMesh)?;
    let vertex_count = mesh.vertex_count();
    let index_count = mesh.indices.len();

    // ── Phase 1: Build binary buffer ─────────────────────────
    let mut bin_data: Vec<u8> = Vec::new();

    let pos_offset = bin_data.len();
    bin_data.extend_from_slice(&floats_to_bytes(&mesh.positions));
    let pos_length = bin_data.len() - pos_offset;

    let norm_offset = bin_data.len();
    bin_data.extend_from_slice(&floats_to_bytes(&mesh.normals));
    let norm_length = bin_data.len() - norm_offset;

    let idx_offset = bin_data.len();
    bin_data.extend_from_slice(&u32s_to_bytes(&mesh.indices));
    let idx_length = bin_data.len() - idx_offset;

    // ── Phase 2: Build glTF JSON ─────────────────────────────
    let gltf_json = serde_json::json!({
        "asset": {
            "version": "2.0",
            "generator": "mesh-convert"
        },
        "scene": 0,
        "scenes": [{
            "name": "Scene",
            "nodes": [0]
        }],
        "nodes": [{
            "name": name,
            "mesh": 0
        }],
        "meshes": [{
            "name": name,
            "primitives": [{
                "attributes": {
                    "POSITION": 0,
                    "NORMAL": 1
                },
                "indices": 2,
                "material": 0,
                "mode": MODE_TRIANGLES
            }]
        }],
        "accessors": [
            {
                "bufferView": 0,
                "byteOffset": 0,
                "componentType": FLOAT,
                "count": vertex_count,
                "type": "VEC3",
                "min": [bounds.min[0] as f32, bounds.min[1] as f32, bounds.min[2] as f32],
                "max": [bounds.max[0] as f32, bounds.max[1] as f32, bounds.max[2] as f32]
            },
            {
                "bufferView": 1,
                "byteOffset": 0,
                "componentType": FLOAT,
                "count": vertex_count,
                "type": "VEC3"
            },
            {
                "bufferView": 2,
                "byteOffset": 0,
                "componentType": UNSIGNED_INT,
                "count": index_count,
                "type": "SCALAR"
            }
        ],
        "bufferViews": [
            {
                "buffer": 0,
                "byteOffset": pos_offset,
                "byteLength": pos_length,
                "target": ARRAY_BUFFER
            },
            {
                "buffer": 0,
                "byteOffset": norm_offset,
                "byteLength": norm_length,
                "target": ARRAY_BUFFER
            },
            {
                "buffer": 0,
                "byteOffset": idx_offset,
                "byteLength": idx_length,
                "target": ELEMENT_ARRAY_BUFFER
            }
        ],
        "buffers": [{
            "byteLength": bin_data.len()
        }],
        "materials": [{
            "name": "Default",
            "pbrMetallicRoughness": {
                "baseColorFactor": [0.8, 0.8, 0.8, 1.0],
                "metallicFactor": 0.0,
                "roughnessFactor": 0.6
            },
            "doubleSided": true
        }]
    });

    let json_str =
        serde_json::to_string(&gltf_json).map_err(|e| ExportError::Encode(e.to_string()))?;
    let mut json_bytes = json_str.into_bytes();

    // Pad JSON to 4-byte alignment with spaces
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }

    // Pad BIN to 4-byte alignment with zeros
    while bin_data.len() % 4 != 0 {
        bin_data.push(0);
    }

    // ── Phase 3: Assemble GLB ────────────────────────────────
    let json_chunk_length = json_bytes.len() as u32;
    let bin_chunk_length = bin_data.len() as u32;

    let total_length: u32 = 12 // header
        + 8 + json_chunk_length  // JSON chunk header + data
        + 8 + bin_chunk_length; // BIN chunk header + data

    let mut glb = Vec::with_capacity(total_length as usize);

    glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&total_length.to_le_bytes());

    glb.extend_from_slice(&json_chunk_length.to_le_bytes());
    glb.extend_from_slice(&CHUNK_TYPE_JSON.to_le_bytes());
    glb.extend_from_slice(&json_bytes);

    glb.extend_from_slice(&bin_chunk_length.to_le_bytes());
    glb.extend_from_slice(&CHUNK_TYPE_BIN.to_le_bytes());
    glb.extend_from_slice(&bin_data);

    Ok(glb)
}

fn floats_to_bytes(data: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(data.len() * 4);
    for &f in data {
        bytes.extend_from_slice(&f.to_le_bytes());
    }
    bytes
}

fn u32s_to_bytes(data: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(data.len() * 4);
    for &v in data {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

// ── Decoding ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfDocument {
    asset: GltfAsset,
    #[serde(default)]
    meshes: Vec<GltfMesh>,
    #[serde(default)]
    accessors: Vec<GltfAccessor>,
    #[serde(default)]
    buffer_views: Vec<GltfBufferView>,
}

#[derive(Debug, Deserialize)]
struct GltfAsset {
    version: String,
}

#[derive(Debug, Deserialize)]
struct GltfMesh {
    primitives: Vec<GltfPrimitive>,
}

#[derive(Debug, Deserialize)]
struct GltfPrimitive {
    attributes: HashMap<String, usize>,
    indices: Option<usize>,
    mode: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfAccessor {
    buffer_view: Option<usize>,
    #[serde(default)]
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfBufferView {
    buffer: usize,
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<usize>,
}

fn malformed(reason: impl Into<String>) -> LoadError {
    LoadError::MalformedGlb(reason.into())
}

/// Split a GLB container into its JSON text and optional BIN chunk.
fn split_chunks(bytes: &[u8]) -> Result<(&str, Option<&[u8]>), LoadError> {
    if bytes.len() < 12 {
        return Err(malformed("file shorter than the 12-byte header"));
    }
    if read_u32(bytes, 0) != GLB_MAGIC {
        return Err(malformed("missing 'glTF' magic"));
    }
    let version = read_u32(bytes, 4);
    if version != GLB_VERSION {
        return Err(malformed(format!("unsupported container version {version}")));
    }
    let total = read_u32(bytes, 8) as usize;
    if total > bytes.len() {
        return Err(malformed(format!(
            "header declares {total} bytes but file has {}",
            bytes.len()
        )));
    }

    let mut json = None;
    let mut bin = None;
    let mut at = 12;
    while at + 8 <= total {
        let length = read_u32(bytes, at) as usize;
        let kind = read_u32(bytes, at + 4);
        let start = at + 8;
        let end = start
            .checked_add(length)
            .filter(|&end| end <= total)
            .ok_or_else(|| malformed("chunk runs past end of file"))?;
        match kind {
            CHUNK_TYPE_JSON if json.is_none() => json = Some(&bytes[start..end]),
            CHUNK_TYPE_BIN if bin.is_none() => bin = Some(&bytes[start..end]),
            // Unknown chunks must be ignored.
            _ => {}
        }
        at = end;
    }

    let json = json.ok_or_else(|| malformed("missing JSON chunk"))?;
    let text = std::str::from_utf8(json).map_err(|e| malformed(format!("JSON chunk: {e}")))?;
    Ok((text, bin))
}

/// Decode every triangle primitive of a GLB into one mesh.
pub fn decode(bytes: &[u8]) -> Result<TriangleMesh, LoadError> {
    let (json, bin) = split_chunks(bytes)?;
    let doc: GltfDocument =
        serde_json::from_str(json.trim_end()).map_err(|e| malformed(format!("JSON: {e}")))?;
    if !doc.asset.version.starts_with('2') {
        return Err(malformed(format!(
            "unsupported glTF version {}",
            doc.asset.version
        )));
    }
    let bin = bin.unwrap_or(&[]);

    let mut mesh = TriangleMesh::new();
    for gltf_mesh in &doc.meshes {
        for primitive in &gltf_mesh.primitives {
            let mode = primitive.mode.unwrap_or(MODE_TRIANGLES);
            if mode != MODE_TRIANGLES {
                return Err(malformed(format!("primitive mode {mode} is not a triangle list")));
            }
            let position = *primitive
                .attributes
                .get("POSITION")
                .ok_or_else(|| malformed("primitive without POSITION"))?;

            let positions = read_vec3_floats(&doc, bin, position)?;
            let vertex_count = positions.len() / 3;
            let indices = match primitive.indices {
                Some(accessor) => read_indices(&doc, bin, accessor)?,
                None => (0..vertex_count as u32).collect(),
            };

            let part = TriangleMesh {
                positions,
                normals: Vec::new(),
                indices,
            };
            part.validate()
                .map_err(|e| malformed(format!("primitive geometry: {e}")))?;
            mesh.merge(&part);
        }
    }

    Ok(mesh)
}

/// A resolved accessor: raw bytes, element stride and element count.
struct AccessorView<'a> {
    data: &'a [u8],
    stride: usize,
    count: usize,
    component_type: u32,
}

fn view<'a>(
    doc: &GltfDocument,
    bin: &'a [u8],
    index: usize,
    expected_kind: &str,
) -> Result<AccessorView<'a>, LoadError> {
    let accessor = doc
        .accessors
        .get(index)
        .ok_or_else(|| malformed(format!("accessor {index} does not exist")))?;
    if accessor.kind != expected_kind {
        return Err(malformed(format!(
            "accessor {index} has type {} (expected {expected_kind})",
            accessor.kind
        )));
    }
    let components = if expected_kind == "VEC3" { 3 } else { 1 };
    let component_size = match accessor.component_type {
        UNSIGNED_BYTE => 1,
        UNSIGNED_SHORT => 2,
        UNSIGNED_INT | FLOAT => 4,
        other => return Err(malformed(format!("unsupported component type {other}"))),
    };
    let element_size = components * component_size;

    let view_index = accessor
        .buffer_view
        .ok_or_else(|| malformed(format!("accessor {index} has no bufferView")))?;
    let buffer_view = doc
        .buffer_views
        .get(view_index)
        .ok_or_else(|| malformed(format!("bufferView {view_index} does not exist")))?;
    if buffer_view.buffer != 0 {
        return Err(malformed("only the embedded BIN buffer is supported"));
    }

    let view_end = buffer_view
        .byte_offset
        .checked_add(buffer_view.byte_length)
        .filter(|&end| end <= bin.len())
        .ok_or_else(|| malformed(format!("bufferView {view_index} runs past BIN chunk")))?;
    let view_bytes = &bin[buffer_view.byte_offset..view_end];

    let stride = buffer_view.byte_stride.unwrap_or(element_size);
    if stride < element_size {
        return Err(malformed(format!("bufferView {view_index} stride too small")));
    }
    if accessor.count > 0 {
        let needed = stride
            .checked_mul(accessor.count - 1)
            .and_then(|n| n.checked_add(element_size))
            .and_then(|n| n.checked_add(accessor.byte_offset));
        if !matches!(needed, Some(n) if n <= view_bytes.len()) {
            return Err(malformed(format!("accessor {index} runs past its bufferView")));
        }
    }

    Ok(AccessorView {
        data: &view_bytes[accessor.byte_offset.min(view_bytes.len())..],
        stride,
        count: accessor.count,
        component_type: accessor.component_type,
    })
}

fn read_vec3_floats(doc: &GltfDocument, bin: &[u8], index: usize) -> Result<Vec<f32>, LoadError> {
    let v = view(doc, bin, index, "VEC3")?;
    if v.component_type != FLOAT {
        return Err(malformed(format!("accessor {index} positions are not floats")));
    }
    let mut out = Vec::with_capacity(v.count * 3);
    for i in 0..v.count {
        let base = i * v.stride;
        for c in 0..3 {
            out.push(read_f32(v.data, base + c * 4));
        }
    }
    Ok(out)
}

fn read_indices(doc: &GltfDocument, bin: &[u8], index: usize) -> Result<Vec<u32>, LoadError> {
    let v = view(doc, bin, index, "SCALAR")?;
    let mut out = Vec::with_capacity(v.count);
    for i in 0..v.count {
        let at = i * v.stride;
        let value = match v.component_type {
            UNSIGNED_BYTE => v.data[at] as u32,
            UNSIGNED_SHORT => u16::from_le_bytes([v.data[at], v.data[at + 1]]) as u32,
            UNSIGNED_INT => read_u32(v.data, at),
            other => return Err(malformed(format!("index component type {other}"))),
        };
        out.push(value);
    }
    Ok(out)
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_f32(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> TriangleMesh {
        let mut mesh = TriangleMesh::new();
        mesh.add_vertex([0.0, 0.0, 0.0]);
        mesh.add_vertex([2.0, 0.0, 0.0]);
        mesh.add_vertex([2.0, 1.0, 0.0]);
        mesh.add_vertex([0.0, 1.0, 0.0]);
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(0, 2, 3);
        mesh
    }

    fn json_of(glb: &[u8]) -> serde_json::Value {
        let (json, _) = split_chunks(glb).unwrap();
        serde_json::from_str(json.trim_end()).unwrap()
    }

    #[test]
    fn header_and_alignment() {
        let glb = encode(&quad(), "quad").unwrap();
        assert_eq!(&glb[0..4], b"glTF");
        assert_eq!(read_u32(&glb, 4), 2);
        assert_eq!(read_u32(&glb, 8) as usize, glb.len());
        assert_eq!(glb.len() % 4, 0);

        let json_len = read_u32(&glb, 12) as usize;
        assert_eq!(json_len % 4, 0);
        assert_eq!(read_u32(&glb, 16), CHUNK_TYPE_JSON);
        assert_eq!(read_u32(&glb, 20 + json_len + 4), CHUNK_TYPE_BIN);
    }

    #[test]
    fn json_describes_one_node_and_accessor_bounds() {
        let glb = encode(&quad(), "quad").unwrap();
        let json = json_of(&glb);
        assert_eq!(json["asset"]["version"], "2.0");
        assert_eq!(json["nodes"][0]["name"], "quad");
        assert_eq!(json["accessors"][0]["count"], 4);
        assert_eq!(json["accessors"][2]["count"], 6);
        assert_eq!(json["accessors"][0]["max"][0], 2.0);
        assert_eq!(json["accessors"][0]["min"][1], 0.0);
    }

    #[test]
    fn decode_recovers_positions_and_indices() {
        let glb = encode(&quad(), "quad").unwrap();
        let mesh = decode(&glb).unwrap();
        assert_eq!(mesh.positions, quad().positions);
        assert_eq!(mesh.indices, quad().indices);
    }

    /// Wrap a glTF JSON document and BIN payload in a GLB container.
    fn assemble(json: &serde_json::Value, bin: &[u8]) -> Vec<u8> {
        let mut json_bytes = serde_json::to_vec(json).unwrap();
        while json_bytes.len() % 4 != 0 {
            json_bytes.push(b' ');
        }
        let total = 12 + 8 + json_bytes.len() + 8 + bin.len();
        let mut glb = Vec::new();
        glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
        glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_TYPE_JSON.to_le_bytes());
        glb.extend_from_slice(&json_bytes);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_TYPE_BIN.to_le_bytes());
        glb.extend_from_slice(bin);
        glb
    }

    fn one_triangle(count: u64, byte_offset: u64) -> Vec<u8> {
        let positions: Vec<f32> = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let bin = floats_to_bytes(&positions);
        let json = serde_json::json!({
            "asset": {"version": "2.0"},
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
            "accessors": [{
                "bufferView": 0,
                "byteOffset": byte_offset,
                "componentType": FLOAT,
                "count": count,
                "type": "VEC3"
            }],
            "bufferViews": [{"buffer": 0, "byteLength": bin.len()}],
            "buffers": [{"byteLength": bin.len()}]
        });
        assemble(&json, &bin)
    }

    #[test]
    fn non_indexed_primitive_is_accepted() {
        let mesh = decode(&one_triangle(3, 0)).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn oversized_accessor_is_malformed_not_a_panic() {
        for (count, offset) in [(1u64 << 62, 0u64), (u64::MAX, 0), (3, u64::MAX), (4, 0)] {
            assert!(
                matches!(decode(&one_triangle(count, offset)), Err(LoadError::MalformedGlb(_))),
                "count {count}, offset {offset}"
            );
        }
    }

    #[test]
    fn rejects_bad_magic_and_truncation() {
        let glb = encode(&quad(), "quad").unwrap();
        let mut bad = glb.clone();
        bad[0] = b'x';
        assert!(matches!(decode(&bad), Err(LoadError::MalformedGlb(_))));
        assert!(decode(&glb[..glb.len() - 8]).is_err());
        assert!(decode(&glb[..8]).is_err());
    }

    #[test]
    fn empty_mesh_is_export_error() {
        assert!(matches!(
            encode(&TriangleMesh::new(), "empty"),
            Err(ExportError::EmptyMesh)
        ));
    }
}
