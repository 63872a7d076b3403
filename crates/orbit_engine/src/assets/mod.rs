//! Asset loading
//!
//! Text assets (geometry files, shader sources) are read relative to a root
//! directory.

pub mod obj_loader;

pub use obj_loader::{Bounds, GeometryFile, ObjError};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// The asset could not be read
    #[error("Failed to read asset {path}: {source}")]
    Unreadable {
        /// Resolved asset path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
}

/// Reads named assets from a root directory
#[derive(Debug, Clone)]
pub struct AssetReader {
    root: PathBuf,
}

impl AssetReader {
    /// Reader rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of a named asset
    pub fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Read a whole text asset
    pub fn read_to_string(&self, name: &str) -> Result<String, AssetError> {
        let path = self.resolve(name);
        log::debug!("Reading asset {}", path.display());
        std::fs::read_to_string(&path).map_err(|source| AssetError::Unreadable { path, source })
    }
}
