//! Error types for project persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while saving or loading a project file.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse or serialize JSON
    #[error("invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A node in the file references a type the catalog does not know
    #[error("project references unknown node type: {0}")]
    UnknownNodeType(String),
}

impl ProjectError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProjectError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProjectError::WriteFile {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn read_file_display_carries_path() {
        let err = ProjectError::read_file("/a/b.json", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("failed to read file"), "got: {msg}");
        assert!(msg.contains("/a/b.json"), "got: {msg}");
        assert!(err.source().is_some());
    }

    #[test]
    fn write_file_display_carries_path() {
        let err = ProjectError::write_file("/a/b.json", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("failed to write file"), "got: {msg}");
        assert!(msg.contains("/a/b.json"), "got: {msg}");
        assert!(err.source().is_some());
    }

    #[test]
    fn unknown_node_type_display() {
        let err = ProjectError::UnknownNodeType("warbler".to_string());
        assert_eq!(err.to_string(), "project references unknown node type: warbler");
        assert!(err.source().is_none());
    }
}
