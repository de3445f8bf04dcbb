use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Pixel buffer holds {actual} samples, expected {expected}")]
    PixelCount { expected: usize, actual: usize },

    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Terminal initialization failed: {0}")]
    TerminalInit(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ViewError>;
