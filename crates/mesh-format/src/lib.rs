//! Mesh interchange formats for the conversion pipeline.
//!
//! - [`stl`]: binary and ASCII STL, read (auto-detected) and write
//! - [`glb`]: binary glTF 2.0 container, read and write
//! - [`io`]: path-based [`load_mesh`] / [`save_mesh`] with the format
//!   inferred from the file extension

pub mod errors;
pub mod format;
pub mod glb;
pub mod io;
pub mod stl;

pub use errors::{ExportError, LoadError};
pub use format::MeshFormat;
pub use io::{load_mesh, save_mesh, SaveOptions};
pub use stl::StlEncoding;
