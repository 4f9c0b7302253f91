//! Artifact directory management.
//!
//! Each test gets a writable directory for whatever it wants to leave behind
//! (captures, dumps, downloaded files). The engine only asks that the
//! directory exist before execution starts; it never manages the contents.

use crate::case::TestIdentity;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the artifact-directory collaborator.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Directory could not be created.
    #[error("failed to create artifact directory {path}: {source}")]
    Create {
        /// The directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

/// Provides a per-test writable directory.
pub trait ArtifactPaths: Send + Sync {
    /// Returns the directory for the given test, creating it if needed.
    fn test_dir(&self, test: &TestIdentity) -> Result<PathBuf, ArtifactError>;
}

/// Filesystem-backed artifact layout: `base/<category segments>/<test name>`.
#[derive(Debug, Clone)]
pub struct DirArtifacts {
    base: PathBuf,
}

impl DirArtifacts {
    /// Creates a provider rooted at `base`.
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }
}

impl ArtifactPaths for DirArtifacts {
    fn test_dir(&self, test: &TestIdentity) -> Result<PathBuf, ArtifactError> {
        let mut path = self.base.clone();
        for segment in test.category_segments() {
            path.push(sanitize(segment));
        }
        path.push(sanitize(&test.name));

        fs::create_dir_all(&path).map_err(|source| ArtifactError::Create {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Replaces path-hostile characters so a test name maps to one directory.
fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}
