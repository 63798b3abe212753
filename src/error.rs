//! Error type for the plate detection library.
//!
//! Absent results are not errors here: a frame with no plausible plate
//! region or a plate crop with no glyph boxes flows back as `Ok(None)` or an
//! empty collection. The variants below cover the conditions that genuinely
//! abort a detection run.

use thiserror::Error;

/// Plate detection error.
#[derive(Error, Debug)]
pub enum Error {
    /// Input raster has a zero dimension.
    #[error("empty input raster: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    /// Digit template file missing or unreadable.
    #[error("template for '{symbol}' could not be loaded from {path}")]
    TemplateLoad {
        symbol: char,
        path: String,
        #[source]
        source: image::ImageError,
    },

    /// The external OCR capability failed outright. Empty OCR output is not
    /// an error; this covers transport and backend failures only.
    #[error("ocr backend failed")]
    Ocr(#[source] anyhow::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
