/// Errors surfaced by the display core and its hosting surface.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Fade duration must be a finite number of seconds greater than zero.
    #[error("invalid fade duration: {0} s")]
    InvalidFadeDuration(f64),

    /// A raster with zero scanlines or zero samples per scanline.
    #[error("empty raster ({width}x{height})")]
    EmptyRaster { width: usize, height: usize },

    /// Sample count does not match the declared raster dimensions.
    #[error("raster shape mismatch: {width}x{height} needs {expected} samples, got {actual}")]
    RasterShape {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    /// Texture realization failed because the raster exceeds the texel budget.
    #[error("texture too large: {texels} texels exceeds budget of {budget}")]
    TextureTooLarge { texels: usize, budget: usize },

    /// Count-based eviction needs room for at least one record.
    #[error("buffer capacity must be at least 1")]
    ZeroCapacity,

    /// The presenting surface failed.
    #[error("surface error: {0}")]
    Surface(String),

    /// The render thread has gone away.
    #[error("sector feed disconnected")]
    FeedDisconnected,
}

impl Error {
    /// Returns true if the error only concerns a single record and the
    /// render loop can carry on.
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            Error::EmptyRaster { .. } | Error::RasterShape { .. } | Error::TextureTooLarge { .. }
        )
    }
}

impl From<softbuffer::SoftBufferError> for Error {
    fn from(err: softbuffer::SoftBufferError) -> Self {
        Error::Surface(err.to_string())
    }
}

/// Result type for display operations.
pub type Result<T> = std::result::Result<T, Error>;
