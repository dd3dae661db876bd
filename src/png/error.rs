//! Errors produced by the PNG codec.

/// Decode and encode failures.
///
/// `Format` covers malformed input, `Unsupported` covers valid PNG features
/// this codec does not handle.
#[derive(Debug, thiserror::Error)]
pub enum PngError {
    #[error("png: invalid format: {0}")]
    Format(&'static str),

    #[error("png: unsupported feature: {0}")]
    Unsupported(String),

    #[error("png: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PngError>;
