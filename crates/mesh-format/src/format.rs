use std::path::Path;

/// Mesh file formats understood by [`crate::load_mesh`] and [`crate::save_mesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    Stl,
    Glb,
}

impl MeshFormat {
    /// Infer the format from a file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "stl" => Some(Self::Stl),
            "glb" => Some(Self::Glb),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_from_extension() {
        assert_eq!(MeshFormat::from_path(Path::new("a/b.stl")), Some(MeshFormat::Stl));
        assert_eq!(MeshFormat::from_path(Path::new("B.GLB")), Some(MeshFormat::Glb));
        assert_eq!(MeshFormat::from_path(Path::new("model.obj")), None);
        assert_eq!(MeshFormat::from_path(Path::new("noext")), None);
    }
}
