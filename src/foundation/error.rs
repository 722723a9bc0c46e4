use crate::surface::format::PixelFormat;

/// Convenience result type used across brushfire.
pub type PaintResult<T> = Result<T, PaintError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum PaintError {
    /// Invalid caller-provided data (sizes, buffers, configuration).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Allocation failure in the arena or while growing a pixel buffer.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// Pixel format that cannot be used for the requested operation.
    #[error("unsupported pixel format: {0:?}")]
    UnsupportedFormat(PixelFormat),

    /// A pattern that cannot be turned into a fetch context.
    #[error("pattern error: {0}")]
    Pattern(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PaintError {
    /// Build a [`PaintError::InvalidArgument`] value.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Build a [`PaintError::OutOfMemory`] value.
    pub fn out_of_memory(msg: impl Into<String>) -> Self {
        Self::OutOfMemory(msg.into())
    }

    /// Build a [`PaintError::Pattern`] value.
    pub fn pattern(msg: impl Into<String>) -> Self {
        Self::Pattern(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
