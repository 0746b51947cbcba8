//! Scoped access to one open CAD document.

use std::path::Path;

use mesh_types::TriangleMesh;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::traits::CadEngine;
use crate::types::*;

/// An open document bound to the engine that owns it.
///
/// The document is closed by [`DocumentSession::close`] or, if that was never
/// called (early return, `?`, panic unwinding), when the session is dropped.
pub struct DocumentSession<'e, E: CadEngine + ?Sized> {
    engine: &'e mut E,
    handle: DocumentHandle,
    closed: bool,
}

impl<'e, E: CadEngine + ?Sized> DocumentSession<'e, E> {
    /// Open `path` in a fresh document named `<label>-<uuid>`.
    pub fn open(engine: &'e mut E, path: &Path, label: &str) -> Result<Self, EngineError> {
        let name = format!("{}-{}", label, Uuid::new_v4());
        let handle = engine.open_document(path, &name)?;
        debug!(document = %name, path = %path.display(), "document opened");
        Ok(Self {
            engine,
            handle,
            closed: false,
        })
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn objects(&self) -> Result<Vec<DocumentObject>, EngineError> {
        self.engine.objects(&self.handle)
    }

    /// Shapes of every object that carries one, in document order.
    pub fn shapes(&self) -> Result<Vec<ShapeHandle>, EngineError> {
        Ok(self
            .objects()?
            .into_iter()
            .filter_map(|object| object.shape)
            .collect())
    }

    /// The single tessellation input for this document.
    ///
    /// `None` when no object has a shape; the shape itself when there is
    /// exactly one; otherwise a compound of all of them.
    pub fn merged_shape(&mut self) -> Result<Option<ShapeHandle>, EngineError> {
        let shapes = self.shapes()?;
        match shapes.len() {
            0 => Ok(None),
            1 => Ok(Some(shapes[0])),
            n => {
                debug!(document = %self.name(), shapes = n, "building compound");
                self.engine.make_compound(&self.handle, &shapes).map(Some)
            }
        }
    }

    pub fn tessellate(
        &mut self,
        shape: &ShapeHandle,
        deflection: f64,
    ) -> Result<TriangleMesh, EngineError> {
        self.engine.tessellate(shape, deflection)
    }

    /// Close the document now and report the engine's answer.
    pub fn close(mut self) -> Result<(), EngineError> {
        self.closed = true;
        let result = self.engine.close_document(&self.handle);
        if result.is_ok() {
            debug!(document = %self.name(), "document closed");
        }
        result
    }
}

impl<E: CadEngine + ?Sized> Drop for DocumentSession<'_, E> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        match self.engine.close_document(&self.handle) {
            Ok(()) => debug!(document = %self.handle.name(), "document closed on drop"),
            Err(e) => warn!(document = %self.handle.name(), error = %e, "failed to close document"),
        }
    }
}
