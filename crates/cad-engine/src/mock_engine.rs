//! MockEngine: deterministic test double implementing CadEngine.
//!
//! Documents are registered up front under a source path. Every shape is an
//! axis-aligned box that tessellates into 8 vertices and 12 triangles, so
//! tests can predict exact counts and bounds without STEP files.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use mesh_types::TriangleMesh;

use crate::tessellation::{check_deflection, finish_mesh};
use crate::traits::CadEngine;
use crate::types::*;

/// Synthetic solid geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockShape {
    /// Axis-aligned box with its minimum corner at `origin`.
    Box { origin: [f64; 3], size: [f64; 3] },
}

impl MockShape {
    fn tessellate(&self) -> TriangleMesh {
        let MockShape::Box { origin, size } = *self;
        let mut mesh = TriangleMesh::new();
        for corner in 0..8u32 {
            let pick = |axis: usize| {
                let bit = (corner >> axis) & 1;
                (origin[axis] + size[axis] * bit as f64) as f32
            };
            mesh.add_vertex([pick(0), pick(1), pick(2)]);
        }
        // Corner index = x | y << 1 | z << 2; outward counter-clockwise winding.
        const FACES: [[u32; 4]; 6] = [
            [0, 2, 3, 1], // -z
            [4, 5, 7, 6], // +z
            [0, 1, 5, 4], // -y
            [2, 6, 7, 3], // +y
            [0, 4, 6, 2], // -x
            [1, 3, 7, 5], // +x
        ];
        for [a, b, c, d] in FACES {
            mesh.add_triangle(a, b, c);
            mesh.add_triangle(a, c, d);
        }
        mesh
    }
}

/// One object of a registered mock document.
#[derive(Debug, Clone, PartialEq)]
pub struct MockObject {
    pub name: String,
    pub shape: Option<MockShape>,
}

impl MockObject {
    pub fn solid(name: impl Into<String>, shape: MockShape) -> Self {
        Self {
            name: name.into(),
            shape: Some(shape),
        }
    }

    /// An object without a shape attribute (annotation, group, ...).
    pub fn annotation(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: None,
        }
    }
}

#[derive(Debug, Clone)]
enum MockEntry {
    Leaf(MockShape),
    Compound(Vec<u64>),
}

#[derive(Debug, Clone)]
struct MockDocument {
    name: String,
    objects: Vec<(String, Option<u64>)>,
    shapes: HashMap<u64, MockEntry>,
    fail_tessellation: bool,
}

/// Deterministic test double for the CAD engine.
#[derive(Debug, Default)]
pub struct MockEngine {
    next_id: u64,
    sources: HashMap<PathBuf, Vec<MockObject>>,
    failing: HashSet<PathBuf>,
    documents: HashMap<u64, MockDocument>,
    opened: Vec<String>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Register a document that `open_document(path, ..)` will load.
    pub fn with_document(mut self, path: impl Into<PathBuf>, objects: Vec<MockObject>) -> Self {
        self.sources.insert(path.into(), objects);
        self
    }

    /// Register a document holding a single box.
    pub fn with_box(self, path: impl Into<PathBuf>, origin: [f64; 3], size: [f64; 3]) -> Self {
        self.with_document(
            path,
            vec![MockObject::solid("Body", MockShape::Box { origin, size })],
        )
    }

    /// Make tessellation of any shape from this source fail.
    pub fn with_failing_tessellation(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing.insert(path.into());
        self
    }

    /// Every document name ever opened, in order.
    pub fn opened_names(&self) -> &[String] {
        &self.opened
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn document(&self, handle: &DocumentHandle) -> Result<&MockDocument, EngineError> {
        self.documents
            .get(&handle.id())
            .ok_or_else(|| EngineError::DocumentNotFound {
                name: handle.name().to_string(),
            })
    }

    fn collect_leaves(
        doc: &MockDocument,
        id: u64,
        out: &mut Vec<MockShape>,
        handle: ShapeHandle,
    ) -> Result<(), EngineError> {
        match doc.shapes.get(&id) {
            Some(MockEntry::Leaf(shape)) => out.push(*shape),
            Some(MockEntry::Compound(children)) => {
                for &child in children {
                    Self::collect_leaves(doc, child, out, handle)?;
                }
            }
            None => return Err(EngineError::ShapeNotFound { handle }),
        }
        Ok(())
    }
}

impl CadEngine for MockEngine {
    fn open_document(&mut self, path: &Path, name: &str) -> Result<DocumentHandle, EngineError> {
        if self.documents.values().any(|d| d.name == name) {
            return Err(EngineError::DuplicateDocument {
                name: name.to_string(),
            });
        }
        let objects = self
            .sources
            .get(path)
            .cloned()
            .ok_or_else(|| EngineError::LoadFailed {
                path: path.to_path_buf(),
                reason: "file not found".to_string(),
            })?;

        let doc_id = self.alloc_id();
        let mut doc = MockDocument {
            name: name.to_string(),
            objects: Vec::with_capacity(objects.len()),
            shapes: HashMap::new(),
            fail_tessellation: self.failing.contains(path),
        };
        for object in objects {
            let shape_id = match object.shape {
                Some(shape) => {
                    let id = self.alloc_id();
                    doc.shapes.insert(id, MockEntry::Leaf(shape));
                    Some(id)
                }
                None => None,
            };
            doc.objects.push((object.name, shape_id));
        }

        self.documents.insert(doc_id, doc);
        self.opened.push(name.to_string());
        Ok(DocumentHandle::new(doc_id, name))
    }

    fn objects(&self, document: &DocumentHandle) -> Result<Vec<DocumentObject>, EngineError> {
        let doc = self.document(document)?;
        Ok(doc
            .objects
            .iter()
            .map(|(name, shape)| DocumentObject {
                name: name.clone(),
                shape: shape.map(|id| ShapeHandle::new(document.id(), id)),
            })
            .collect())
    }

    fn make_compound(
        &mut self,
        document: &DocumentHandle,
        shapes: &[ShapeHandle],
    ) -> Result<ShapeHandle, EngineError> {
        if shapes.is_empty() {
            return Err(EngineError::EmptyCompound);
        }
        {
            let doc = self.document(document)?;
            if let Some(missing) = shapes
                .iter()
                .find(|s| s.document != document.id() || !doc.shapes.contains_key(&s.id))
            {
                return Err(EngineError::ShapeNotFound { handle: *missing });
            }
        }

        let id = self.alloc_id();
        let doc = self
            .documents
            .get_mut(&document.id())
            .ok_or_else(|| EngineError::DocumentNotFound {
                name: document.name().to_string(),
            })?;
        doc.shapes
            .insert(id, MockEntry::Compound(shapes.iter().map(|s| s.id).collect()));
        Ok(ShapeHandle::new(document.id(), id))
    }

    fn tessellate(
        &mut self,
        shape: &ShapeHandle,
        deflection: f64,
    ) -> Result<TriangleMesh, EngineError> {
        check_deflection(deflection)?;
        let doc = self
            .documents
            .get(&shape.document)
            .ok_or(EngineError::ShapeNotFound { handle: *shape })?;
        if doc.fail_tessellation {
            return Err(EngineError::TessellationFailed {
                reason: "mock tessellation failure".to_string(),
            });
        }

        let mut leaves = Vec::new();
        Self::collect_leaves(doc, shape.id, &mut leaves, *shape)?;

        let mut mesh = TriangleMesh::new();
        for leaf in &leaves {
            mesh.merge(&leaf.tessellate());
        }
        finish_mesh(mesh)
    }

    fn close_document(&mut self, document: &DocumentHandle) -> Result<(), EngineError> {
        self.documents
            .remove(&document.id())
            .map(|_| ())
            .ok_or_else(|| EngineError::DocumentNotFound {
                name: document.name().to_string(),
            })
    }

    fn open_documents(&self) -> Vec<String> {
        let mut names: Vec<String> = self.documents.values().map(|d| d.name.clone()).collect();
        names.sort();
        names
    }
}
