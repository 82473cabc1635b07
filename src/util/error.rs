//! Error types for the DTS library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for shape decoding and encoding.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Format version byte outside the accepted range
    #[error("Unsupported DTS version: {0}")]
    UnsupportedVersion(u32),

    /// Input ended before a field was complete
    #[error("Unexpected end of stream while reading {what} at position {position}")]
    TruncatedStream { what: &'static str, position: u64 },

    /// A guard checkpoint did not carry the expected counter value.
    ///
    /// Reader and writer disagree about the field layout; this is an
    /// internal-consistency failure, not a recoverable data error.
    #[error("Guard mismatch in {lane} lane: expected {expected}, found {found}")]
    GuardMismatch { lane: &'static str, expected: i32, found: i32 },

    /// The copying pass drifted from the layout measured by the sizing pass
    #[error("Pass divergence at checkpoint {checkpoint}: sized {sized} bytes, copied {copied} bytes")]
    PassDivergence { checkpoint: usize, sized: usize, copied: usize },

    /// Material list carries a different binary version
    #[error("Material list version mismatch: expected {expected}, got {found}")]
    MaterialVersionMismatch { expected: u8, found: u8 },

    /// Mesh type tag is not one of the known types
    #[error("Unknown mesh type: {0}")]
    UnknownMeshType(u32),

    /// A mesh shares data with a mesh that was not decoded before it
    #[error("Mesh {mesh} shares data with invalid mesh {parent}")]
    InvalidSharedMesh { mesh: usize, parent: i32 },

    /// Index outside a fixed-capacity container
    #[error("Index {index} out of bounds (count: {count})")]
    IndexOutOfBounds { index: usize, count: usize },

    /// Invalid data structure in file
    #[error("Invalid file structure: {0}")]
    InvalidStructure(String),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a truncation error.
    pub fn truncated(what: &'static str, position: u64) -> Self {
        Self::TruncatedStream { what, position }
    }

    /// True for reader/writer logic divergence rather than malformed data.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::GuardMismatch { .. } | Self::PassDivergence { .. })
    }
}

/// Result type alias for DTS operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::UnsupportedVersion(18);
        assert!(e.to_string().contains("18"));

        let e = Error::GuardMismatch { lane: "16-bit", expected: 3, found: 7 };
        assert!(e.to_string().contains("16-bit"));
        assert!(e.to_string().contains('3'));
        assert!(e.to_string().contains('7'));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_internal_classification() {
        assert!(Error::PassDivergence { checkpoint: 1, sized: 4, copied: 8 }.is_internal());
        assert!(!Error::truncated("header", 0).is_internal());
        assert!(!Error::MaterialVersionMismatch { expected: 1, found: 2 }.is_internal());
    }
}
