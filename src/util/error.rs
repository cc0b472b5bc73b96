//! Error types for MDAL.
//!
//! Hard failures abort the requested operation and map onto one of the
//! error [`Status`] codes. Soft problems are [`Warning`](crate::core::Warning)s
//! and never show up here.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::Status;

/// Main error type for MDAL operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Allocation of a buffer or structure failed
    #[error("Not enough memory: {0}")]
    NotEnoughMemory(String),

    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// No registered driver recognises the file
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// Datasets cannot be attached to this mesh
    #[error("Incompatible mesh: {0}")]
    IncompatibleMesh(String),

    /// Structural data in the source is invalid
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Dataset does not match its group (location, shape or value count)
    #[error("Incompatible dataset: {0}")]
    IncompatibleDataset(String),

    /// Dataset group does not match its mesh
    #[error("Incompatible dataset group: {0}")]
    IncompatibleDatasetGroup(String),

    /// Requested driver is not registered or is disabled
    #[error("Missing driver: {0}")]
    MissingDriver(String),

    /// Handle refers to a closed mesh or a released element
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Element index out of bounds
    #[error("Index {index} out of bounds (count: {count})")]
    IndexOutOfBounds { index: usize, count: usize },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Configuration file could not be parsed
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Status code recorded for this error at the handle boundary.
    pub fn status(&self) -> Status {
        match self {
            Self::NotEnoughMemory(_) => Status::ErrNotEnoughMemory,
            Self::FileNotFound(_) => Status::ErrFileNotFound,
            Self::UnknownFormat(_) => Status::ErrUnknownFormat,
            Self::IncompatibleMesh(_) | Self::InvalidHandle(_) => Status::ErrIncompatibleMesh,
            Self::IncompatibleDataset(_) => Status::ErrIncompatibleDataset,
            Self::IncompatibleDatasetGroup(_) => Status::ErrIncompatibleDatasetGroup,
            Self::MissingDriver(_) => Status::ErrMissingDriver,
            Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound => Status::ErrFileNotFound,
            Self::Io(e) if e.kind() == std::io::ErrorKind::OutOfMemory => Status::ErrNotEnoughMemory,
            Self::Io(_) => Status::ErrFileNotFound,
            Self::InvalidData(_)
            | Self::IndexOutOfBounds { .. }
            | Self::Utf8(_)
            | Self::Json(_)
            | Self::Other(_) => Status::ErrInvalidData,
        }
    }
}

/// Result type alias for MDAL operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::UnknownFormat("mesh.xyz".into());
        assert!(e.to_string().contains("mesh.xyz"));

        let e = Error::IndexOutOfBounds { index: 5, count: 3 };
        assert!(e.to_string().contains("5"));
        assert!(e.to_string().contains("3"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.status(), Status::ErrFileNotFound);
    }

    #[test]
    fn test_error_status() {
        assert_eq!(Error::MissingDriver("X".into()).status(), Status::ErrMissingDriver);
        assert_eq!(Error::invalid("bad").status(), Status::ErrInvalidData);
        assert_eq!(
            Error::InvalidHandle("closed".into()).status(),
            Status::ErrIncompatibleMesh
        );
        assert!(Error::other("x").status().is_error());
    }
}
