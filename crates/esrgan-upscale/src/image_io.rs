//! Decoding and encoding image files
//!
//! The codec is chosen from the file contents on decode and from the extension on
//! encode. Channel count and bit depth pass through unchanged.

use crate::{PixelBuffer, UpscaleError};
use std::path::Path;

/// Decodes an image file into a pixel buffer
///
/// # Errors
/// Returns `Decode` if the file cannot be read or its format is not recognized
pub fn decode(path: impl AsRef<Path>) -> Result<PixelBuffer, UpscaleError> {
    let path = path.as_ref();
    // Sniff the format from the contents, falling back to the extension
    let image = image::ImageReader::open(path)
        .map_err(image::ImageError::IoError)
        .and_then(|reader| reader.with_guessed_format().map_err(image::ImageError::IoError))
        .and_then(|reader| reader.decode())
        .map_err(|source| UpscaleError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::debug!(width = image.width(), height = image.height(), color = ?image.color(), "decoded {}", path.display());
    PixelBuffer::from_dynamic(image)
}

/// Encodes a pixel buffer to an image file, picking the format from the extension
///
/// # Errors
/// Returns `Encode` if the extension is unsupported, the format cannot hold the
/// buffer's channel layout, or the file cannot be written
pub fn encode(buffer: &PixelBuffer, path: impl AsRef<Path>) -> Result<(), UpscaleError> {
    let path = path.as_ref();
    buffer.clone().into_dynamic()?.save(path).map_err(|source| UpscaleError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("encoded {}", path.display());
    Ok(())
}
