//! TruckEngine: STEP import and tessellation on top of truck.
//!
//! A document is the parsed STEP entity table. Every shell entity in the
//! table is one document object; it carries a shape only when truck can
//! rebuild its geometry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use mesh_types::TriangleMesh;
use tracing::{debug, warn};
use truck_meshalgo::prelude::*;
use truck_stepio::r#in::Table;

use crate::tessellation::{append_polygon_mesh, check_deflection, finish_mesh};
use crate::traits::CadEngine;
use crate::types::*;

enum TruckShape {
    /// A shell entity of the STEP table, by entity id.
    Shell(u64),
    /// Shapes grouped without a boolean union.
    Compound(Vec<u64>),
}

struct StepDocument {
    name: String,
    path: PathBuf,
    table: Table,
    objects: Vec<(String, Option<u64>)>,
    shapes: HashMap<u64, TruckShape>,
}

/// Real CAD engine backed by truck-stepio and truck-meshalgo.
pub struct TruckEngine {
    next_id: u64,
    documents: HashMap<u64, StepDocument>,
}

impl TruckEngine {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            documents: HashMap::new(),
        }
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn parse_table(path: &Path) -> Result<Table, EngineError> {
        let load_failed = |reason: String| EngineError::LoadFailed {
            path: path.to_path_buf(),
            reason,
        };

        let step_string = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                load_failed("file not found".to_string())
            } else {
                load_failed(e.to_string())
            }
        })?;

        let exchange = truck_stepio::r#in::ruststep::parser::parse(&step_string)
            .map_err(|e| load_failed(format!("failed to parse STEP file: {e}")))?;

        let data = exchange
            .data
            .first()
            .ok_or_else(|| load_failed("STEP file contains no data sections".to_string()))?;

        Ok(Table::from_data_section(data))
    }

    /// Shell entity ids reachable from `shape`, in insertion order.
    fn shell_ids(
        doc: &StepDocument,
        id: u64,
        handle: ShapeHandle,
        out: &mut Vec<u64>,
    ) -> Result<(), EngineError> {
        match doc.shapes.get(&id) {
            Some(TruckShape::Shell(entity)) => out.push(*entity),
            Some(TruckShape::Compound(children)) => {
                for &child in children {
                    Self::shell_ids(doc, child, handle, out)?;
                }
            }
            None => return Err(EngineError::ShapeNotFound { handle }),
        }
        Ok(())
    }
}

impl Default for TruckEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CadEngine for TruckEngine {
    fn open_document(&mut self, path: &Path, name: &str) -> Result<DocumentHandle, EngineError> {
        if self.documents.values().any(|d| d.name == name) {
            return Err(EngineError::DuplicateDocument {
                name: name.to_string(),
            });
        }

        let table = Self::parse_table(path)?;

        // HashMap order is arbitrary; entity ids give a stable document order.
        let mut entity_ids: Vec<u64> = table.shell.keys().copied().collect();
        entity_ids.sort_unstable();

        let doc_id = self.alloc_id();
        let mut objects = Vec::with_capacity(entity_ids.len());
        let mut shapes = HashMap::new();
        for entity in entity_ids {
            let object_name = format!("Shell#{entity}");
            let usable = table
                .shell
                .get(&entity)
                .map(|holder| table.to_compressed_shell(holder).is_ok())
                .unwrap_or(false);
            if usable {
                let shape_id = self.alloc_id();
                shapes.insert(shape_id, TruckShape::Shell(entity));
                objects.push((object_name, Some(shape_id)));
            } else {
                warn!(document = %name, object = %object_name, "shell has no usable geometry");
                objects.push((object_name, None));
            }
        }

        debug!(
            document = %name,
            objects = objects.len(),
            shapes = shapes.len(),
            "STEP document imported"
        );

        self.documents.insert(
            doc_id,
            StepDocument {
                name: name.to_string(),
                path: path.to_path_buf(),
                table,
                objects,
                shapes,
            },
        );
        Ok(DocumentHandle::new(doc_id, name))
    }

    fn objects(&self, document: &DocumentHandle) -> Result<Vec<DocumentObject>, EngineError> {
        let doc = self
            .documents
            .get(&document.id())
            .ok_or_else(|| EngineError::DocumentNotFound {
                name: document.name().to_string(),
            })?;
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
        let id = self.alloc_id();
        let doc = self
            .documents
            .get_mut(&document.id())
            .ok_or_else(|| EngineError::DocumentNotFound {
                name: document.name().to_string(),
            })?;
        if let Some(missing) = shapes
            .iter()
            .find(|s| s.document != document.id() || !doc.shapes.contains_key(&s.id))
        {
            return Err(EngineError::ShapeNotFound { handle: *missing });
        }
        doc.shapes.insert(
            id,
            TruckShape::Compound(shapes.iter().map(|s| s.id).collect()),
        );
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

        let mut entities = Vec::new();
        Self::shell_ids(doc, shape.id, *shape, &mut entities)?;

        let mut mesh = TriangleMesh::new();
        for entity in entities {
            let holder = doc
                .table
                .shell
                .get(&entity)
                .ok_or(EngineError::ShapeNotFound { handle: *shape })?;
            let shell =
                doc.table
                    .to_compressed_shell(holder)
                    .map_err(|e| EngineError::TessellationFailed {
                        reason: format!("shell #{entity} of '{}': {e:?}", doc.path.display()),
                    })?;
            let poly = shell.robust_triangulation(deflection).to_polygon();
            append_polygon_mesh(&poly, &mut mesh);
        }

        debug!(
            document = %doc.name,
            triangles = mesh.triangle_count(),
            vertices = mesh.vertex_count(),
            deflection,
            "tessellated"
        );
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
