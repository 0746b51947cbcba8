//! CAD document access for the conversion pipeline.
//!
//! A [`CadEngine`] opens STEP files as in-memory documents, lists the
//! objects that carry solid shapes, groups shapes into compounds and
//! tessellates them into [`mesh_types::TriangleMesh`]es.
//!
//! - [`TruckEngine`] reads STEP through truck-stepio and meshes with truck-meshalgo.
//! - [`MockEngine`] serves synthetic box documents for tests.
//! - [`DocumentSession`] scopes one open document and closes it on drop.

pub mod mock_engine;
pub mod primitives;
pub mod session;
pub mod tessellation;
pub mod traits;
pub mod truck_engine;
pub mod types;

pub use mock_engine::{MockEngine, MockObject, MockShape};
pub use session::DocumentSession;
pub use traits::CadEngine;
pub use truck_engine::TruckEngine;
pub use types::*;
