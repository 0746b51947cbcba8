use std::path::Path;

use mesh_types::TriangleMesh;

use crate::types::*;

/// CAD engine contract used by the solid-to-mesh stage.
/// Implemented by TruckEngine (STEP via truck) and MockEngine (deterministic test double).
pub trait CadEngine {
    /// Import a source file into a new document called `name`.
    /// Names must be unique among open documents.
    fn open_document(&mut self, path: &Path, name: &str) -> Result<DocumentHandle, EngineError>;

    /// List every object of the document, with or without a shape.
    fn objects(&self, document: &DocumentHandle) -> Result<Vec<DocumentObject>, EngineError>;

    /// Group shapes of one document into a compound. No boolean union is performed.
    fn make_compound(
        &mut self,
        document: &DocumentHandle,
        shapes: &[ShapeHandle],
    ) -> Result<ShapeHandle, EngineError>;

    /// Tessellate a shape; `deflection` bounds the distance between triangles and surface.
    fn tessellate(
        &mut self,
        shape: &ShapeHandle,
        deflection: f64,
    ) -> Result<TriangleMesh, EngineError>;

    /// Release a document and every shape it owns.
    fn close_document(&mut self, document: &DocumentHandle) -> Result<(), EngineError>;

    /// Names of the documents currently open.
    fn open_documents(&self) -> Vec<String>;
}
