use std::path::PathBuf;

/// Opaque handle to an open document.
/// Valid until the document is closed; NEVER reused afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentHandle {
    pub(crate) id: u64,
    pub(crate) name: String,
}

impl DocumentHandle {
    pub(crate) fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// The unique document name chosen when it was opened.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Opaque handle to a shape owned by an open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHandle {
    pub(crate) document: u64,
    pub(crate) id: u64,
}

impl ShapeHandle {
    pub(crate) fn new(document: u64, id: u64) -> Self {
        Self { document, id }
    }
}

/// One entry of a document's object list.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentObject {
    /// Label of the object inside the document.
    pub name: String,
    /// Solid shape carried by the object, if any.
    pub shape: Option<ShapeHandle>,
}

impl DocumentObject {
    pub fn has_shape(&self) -> bool {
        self.shape.is_some()
    }
}

/// Errors from engine operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("failed to load '{}': {reason}", .path.display())]
    LoadFailed { path: PathBuf, reason: String },

    #[error("a document named '{name}' is already open")]
    DuplicateDocument { name: String },

    #[error("document not open: {name}")]
    DocumentNotFound { name: String },

    #[error("shape not found: {handle:?}")]
    ShapeNotFound { handle: ShapeHandle },

    #[error("compound needs at least one shape")]
    EmptyCompound,

    #[error("linear deflection must be finite and positive, got {value}")]
    InvalidDeflection { value: f64 },

    #[error("tessellation failed: {reason}")]
    TessellationFailed { reason: String },
}
