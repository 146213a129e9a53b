use crate::layout::{LayoutError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Addresses exactly one exported artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileDescriptor {
    pub base_dir: PathBuf,
    pub org: String,
    pub space: String,
    pub name: String,
    pub extension: String,
}

impl FileDescriptor {
    pub fn new(base_dir: &Path, org: &str, space: &str, name: &str, extension: &str) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            org: org.to_string(),
            space: space.to_string(),
            name: name.to_string(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Another artifact of the same instance
    pub fn with_extension(&self, extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_string(),
            ..self.clone()
        }
    }

    pub fn dir(&self) -> PathBuf {
        self.base_dir.join(&self.org).join(&self.space)
    }

    pub fn path(&self) -> PathBuf {
        if self.extension.is_empty() {
            self.dir().join(&self.name)
        } else {
            self.dir().join(format!("{}.{}", self.name, self.extension))
        }
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    pub fn read_yaml<T: DeserializeOwned>(&self) -> Result<T> {
        let path = self.path();
        let content = self.read_to_string()?;
        serde_yaml::from_str(&content).map_err(|e| LayoutError::Decode {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Create parent directories as needed and overwrite any previous file.
    pub fn write_yaml<T: Serialize>(&self, value: &T) -> Result<()> {
        let path = self.path();
        let content = serde_yaml::to_string(value).map_err(|e| LayoutError::Encode {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.write_string(&content)
    }

    pub fn read_to_string(&self) -> Result<String> {
        let path = self.path();
        if !path.is_file() {
            return Err(LayoutError::NotFound {
                path: path.display().to_string(),
            });
        }
        std::fs::read_to_string(&path).map_err(|e| LayoutError::io(&path, e))
    }

    pub fn write_string(&self, content: &str) -> Result<()> {
        let dir = self.dir();
        std::fs::create_dir_all(&dir).map_err(|e| LayoutError::io(&dir, e))?;
        let path = self.path();
        std::fs::write(&path, content).map_err(|e| LayoutError::io(&path, e))
    }
}
