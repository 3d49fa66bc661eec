use thiserror::Error;

/// Failures of the run-length mask decoder.
///
/// Every variant is raised before a partial grid could escape, so a
/// mismatched payload is never mistaken for a valid mask.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaskError {
    #[error("invalid mask dimensions: {height}x{width}")]
    InvalidDimensions { height: i64, width: i64 },

    #[error("negative run length {value} at index {index}")]
    InvalidRunLength { index: usize, value: i64 },

    #[error("run lengths cover {covered} pixels, expected {expected}")]
    MalformedRunLength { expected: u64, covered: u64 },

    #[error("pixel buffer holds {actual} pixels, expected {expected}")]
    PixelCount { expected: usize, actual: usize },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Mask(#[from] MaskError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PNG decoding error: {0}")]
    PngDecode(#[from] png::DecodingError),

    #[error("PNG encoding error: {0}")]
    PngEncode(#[from] png::EncodingError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Frame error: {0}")]
    Frame(String),

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("Dimension mismatch: expected {expected_height}x{expected_width}, got {height}x{width}")]
    DimensionMismatch {
        expected_height: usize,
        expected_width: usize,
        height: usize,
        width: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
