use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a string was rejected as a model identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelIdError {
    #[error("model id is empty")]
    Empty,

    #[error("model id '{id}' contains '{ch}' (allowed: letters, digits, '_' and '-')")]
    InvalidChar { id: String, ch: char },
}

/// File-stem-safe identifier of one model, e.g. `iphone_14_pro`.
///
/// Output artifacts are named `<model_id>.stl` and `<model_id>.glb`,
/// so the id may only contain ASCII letters, digits, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Result<Self, ModelIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ModelIdError::Empty);
        }
        if let Some(ch) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(ModelIdError::InvalidChar { id, ch });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<id>.<extension>`
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.0, extension)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ModelId {
    type Error = ModelIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ModelId::new(value)
    }
}

impl From<ModelId> for String {
    fn from(id: ModelId) -> Self {
        id.0
    }
}

impl AsRef<str> for ModelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_file_stem_characters() {
        let id = ModelId::new("iphone_14-pro").unwrap();
        assert_eq!(id.as_str(), "iphone_14-pro");
        assert_eq!(id.file_name("glb"), "iphone_14-pro.glb");
        assert_eq!(id.to_string(), "iphone_14-pro");
    }

    #[test]
    fn rejects_empty_and_path_characters() {
        assert_eq!(ModelId::new(""), Err(ModelIdError::Empty));
        assert!(matches!(
            ModelId::new("../evil"),
            Err(ModelIdError::InvalidChar { ch: '.', .. })
        ));
        assert!(matches!(
            ModelId::new("iphone 14"),
            Err(ModelIdError::InvalidChar { ch: ' ', .. })
        ));
    }
}
