//! Error types for svgtint library.

use std::io;
use thiserror::Error;

/// Result type alias for svgtint operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading or rasterizing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is neither SVG text nor gzip-compressed SVG.
    #[error("Unknown file format: not a valid SVG")]
    UnknownFormat,

    /// A rasterization call was made before any document was loaded.
    #[error("No SVG document loaded")]
    DocumentNotLoaded,

    /// A requested raster size has a non-positive dimension.
    #[error("Invalid size for rasterization: {width}x{height}")]
    InvalidSize {
        /// Requested width
        width: i32,
        /// Requested height
        height: i32,
    },

    /// The named symbol is not part of the loaded document.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// No element with the given id exists in the loaded document.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The shader handed to a shader rasterization is missing or unusable.
    #[error("Invalid shader: {0}")]
    InvalidShader(String),

    /// The document source could not be parsed.
    #[error("SVG parsing error: {0}")]
    Parse(String),

    /// The renderer produced no usable bitmap.
    #[error("Rendering error: {0}")]
    Render(String),

    /// A color string could not be parsed.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error is a precondition failure that aborted the call
    /// before any cache or override state was touched.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::DocumentNotLoaded
                | Error::InvalidSize { .. }
                | Error::SymbolNotFound(_)
                | Error::ElementNotFound(_)
                | Error::InvalidShader(_)
        )
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<resvg::usvg::Error> for Error {
    fn from(err: resvg::usvg::Error) -> Self {
        Error::Render(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", err))
    }
}
