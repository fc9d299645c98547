//! Plain-text reference material shared by all three roles.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

/// Reference text stored in a single file. A missing file means no
/// reference material.
#[derive(Debug, Clone)]
pub struct ReferenceMaterial {
    path: PathBuf,
}

impl ReferenceMaterial {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current text, or an empty string when none is stored.
    pub fn load(&self) -> Result<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to read reference material {}", self.path.display())
            }),
        }
    }

    /// Replace the stored text.
    pub fn store(&self, text: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&self.path, text).with_context(|| {
            format!("Failed to write reference material {}", self.path.display())
        })?;
        info!(
            path = %self.path.display(),
            chars = text.chars().count(),
            "Reference material stored"
        );
        Ok(())
    }

    /// Remove the stored text. Returns whether anything was removed.
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Reference material cleared");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to clear reference material {}", self.path.display())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let reference = ReferenceMaterial::new(dir.path().join("extracted_text.txt"));
        assert_eq!(reference.load().unwrap(), "");
        assert!(!reference.clear().unwrap());
    }

    #[test]
    fn test_store_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let reference = ReferenceMaterial::new(dir.path().join("nested").join("ref.txt"));

        reference.store("Water boils at 100C at sea level.").unwrap();
        assert_eq!(reference.load().unwrap(), "Water boils at 100C at sea level.");

        assert!(reference.clear().unwrap());
        assert_eq!(reference.load().unwrap(), "");
    }
}
