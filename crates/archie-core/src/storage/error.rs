//! # Archie Core Storage Errors
//!
//! [`StorageSystemError`] is raised while a module manifest is located, read
//! and decoded. Once a manifest is parsed, problems with its content are
//! reported as plugin system errors instead.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageSystemError {
    #[error("manifest not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("could not read manifest '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {format} manifest: {source}")]
    Parse {
        format: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("no manifest format is known for '{}'", .0.display())]
    UnsupportedFormat(PathBuf),
}

impl StorageSystemError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            StorageSystemError::NotFound(path.into())
        } else {
            StorageSystemError::Read { path: path.into(), source }
        }
    }
}
