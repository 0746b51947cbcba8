pub mod bounds;
pub mod mesh;
pub mod model_id;

pub use bounds::Bounds;
pub use mesh::{MeshError, TriangleMesh};
pub use model_id::{ModelId, ModelIdError};
