//! Unified error types for the conversion toolkit
//!
//! [`SwmmError`] covers the fatal failure classes shared by the schema,
//! codec, reconciler and network builders. Library entry points in
//! `swmm-io` return `anyhow::Result`, so a `SwmmError` raised deep inside a
//! conversion can still be recovered with `downcast_ref::<SwmmError>()`.
//!
//! # Example
//!
//! ```
//! use swmm_core::{SwmmError, SwmmResult};
//!
//! fn lookup(name: &str) -> SwmmResult<()> {
//!     Err(SwmmError::UnknownSection(name.to_string()))
//! }
//!
//! let err = lookup("Gutters").unwrap_err();
//! assert_eq!(err.to_string(), "Unable to find section: Gutters");
//! ```

use thiserror::Error;

/// Unified error type for all conversion operations.
#[derive(Error, Debug)]
pub enum SwmmError {
    /// I/O errors (file access, permissions, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed `.inp` text or layer values
    #[error("Parse error: {0}")]
    Parse(String),

    /// A section name that is not part of the schema catalog
    #[error("Unable to find section: {0}")]
    UnknownSection(String),

    /// An auxiliary file is missing required column headings
    #[error("Unable to find headings {headings:?} in file: {file}")]
    MissingHeadings { headings: Vec<String>, file: String },

    /// An input layer does not carry enough columns for its positional schema
    #[error("Layer {source_name} has {found} columns but the {schema} schema requires {expected}")]
    LayerSchema {
        source_name: String,
        schema: String,
        expected: usize,
        found: usize,
    },

    /// Dangling or duplicated object references
    #[error("Reference error: {0}")]
    Reference(String),

    /// Degenerate or missing geometry
    #[error("Geometry error: {0}")]
    Geometry(String),

    /// Raised through `Feedback::report_error(.., true)`
    #[error("{0}")]
    Fatal(String),

    /// Layer store failures (GeoPackage, memory store)
    #[error("Layer store error: {0}")]
    Store(String),

    /// The feedback object requested cancellation
    #[error("Operation canceled")]
    Canceled,

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using SwmmError.
pub type SwmmResult<T> = Result<T, SwmmError>;

impl From<anyhow::Error> for SwmmError {
    fn from(err: anyhow::Error) -> Self {
        SwmmError::Other(err.to_string())
    }
}

impl From<String> for SwmmError {
    fn from(s: String) -> Self {
        SwmmError::Other(s)
    }
}

impl From<&str> for SwmmError {
    fn from(s: &str) -> Self {
        SwmmError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_section_message() {
        let err = SwmmError::UnknownSection("FOO".into());
        assert_eq!(err.to_string(), "Unable to find section: FOO");
    }

    #[test]
    fn test_missing_headings_names_file() {
        let err = SwmmError::MissingHeadings {
            headings: vec!["depth".into(), "flow".into()],
            file: "pit_curve.csv".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("depth"));
        assert!(msg.contains("pit_curve.csv"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SwmmError = io_err.into();
        assert!(matches!(err, SwmmError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> SwmmResult<()> {
            Err(SwmmError::Reference("Conduit C1 -> J9".into()))
        }

        fn outer() -> SwmmResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
