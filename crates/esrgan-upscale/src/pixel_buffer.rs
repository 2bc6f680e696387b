//! In-memory pixel buffers
//!
//! A [`PixelBuffer`] is a dense, row-major, interleaved H × W × C image with 1, 3 or 4
//! channels and 8-bit or 16-bit samples. It is the unit passed between image I/O
//! and the upsampler.

use crate::UpscaleError;
use image::DynamicImage;

/// Sample bit depth of a pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    /// 8-bit unsigned samples
    Eight,
    /// 16-bit unsigned samples
    Sixteen,
}

impl BitDepth {
    /// Returns the largest sample value representable at this depth
    pub fn max_value(&self) -> f32 {
        match self {
            BitDepth::Eight => u8::MAX as f32,
            BitDepth::Sixteen => u16::MAX as f32,
        }
    }
}

/// Raw interleaved samples of a pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Samples {
    U8(Vec<u8>),
    U16(Vec<u16>),
}

impl Samples {
    fn len(&self) -> usize {
        match self {
            Samples::U8(data) => data.len(),
            Samples::U16(data) => data.len(),
        }
    }
}

/// A dense interleaved image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    samples: Samples,
}

impl PixelBuffer {
    /// Creates a pixel buffer, checking that the sample count matches the dimensions
    ///
    /// # Arguments
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `channels` - Interleaved channel count (1, 3 or 4)
    /// * `samples` - Row-major interleaved samples
    ///
    /// # Errors
    /// Returns `UnsupportedShape` for empty images or other channel counts, and `InvalidBuffer` when the
    /// sample count is not `width * height * channels`
    pub fn new(width: u32, height: u32, channels: u8, samples: Samples) -> Result<Self, UpscaleError> {
        if width == 0 || height == 0 {
            return Err(UpscaleError::UnsupportedShape(format!("{width}x{height} image has no pixels")));
        }
        if !matches!(channels, 1 | 3 | 4) {
            return Err(UpscaleError::UnsupportedShape(format!("{channels} channels (expected 1, 3 or 4)")));
        }

        let expected = width as usize * height as usize * channels as usize;
        if samples.len() != expected {
            return Err(UpscaleError::InvalidBuffer { expected, actual: samples.len() });
        }

        Ok(Self { width, height, channels, samples })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Returns the sample bit depth
    pub fn bit_depth(&self) -> BitDepth {
        match self.samples {
            Samples::U8(_) => BitDepth::Eight,
            Samples::U16(_) => BitDepth::Sixteen,
        }
    }

    /// Returns all samples normalized to `[0, 1]`, still interleaved
    pub fn to_unit_f32(&self) -> Vec<f32> {
        let max = self.bit_depth().max_value();
        match &self.samples {
            Samples::U8(data) => data.iter().map(|&v| v as f32 / max).collect(),
            Samples::U16(data) => data.iter().map(|&v| v as f32 / max).collect(),
        }
    }

    /// Quantizes interleaved `[0, 1]` samples into a pixel buffer of the given depth
    ///
    /// Values are clamped and rounded to the nearest representable sample.
    pub fn from_unit_f32(width: u32, height: u32, channels: u8, bit_depth: BitDepth, data: &[f32]) -> Result<Self, UpscaleError> {
        let max = bit_depth.max_value();
        let samples = match bit_depth {
            BitDepth::Eight => Samples::U8(data.iter().map(|&v| (v.clamp(0.0, 1.0) * max).round() as u8).collect()),
            BitDepth::Sixteen => Samples::U16(data.iter().map(|&v| (v.clamp(0.0, 1.0) * max).round() as u16).collect()),
        };
        Self::new(width, height, channels, samples)
    }

    /// Converts a decoded image into a pixel buffer
    ///
    /// Gray+alpha images are widened to RGBA and floating point images are narrowed
    /// to 16-bit so that every buffer has 1, 3 or 4 integer channels.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self, UpscaleError> {
        let (width, height) = (image.width(), image.height());
        // Widen or narrow layouts the pipeline does not handle directly
        let (channels, samples) = match image {
            DynamicImage::ImageLuma8(buffer) => (1, Samples::U8(buffer.into_raw())),
            DynamicImage::ImageRgb8(buffer) => (3, Samples::U8(buffer.into_raw())),
            DynamicImage::ImageRgba8(buffer) => (4, Samples::U8(buffer.into_raw())),
            DynamicImage::ImageLumaA8(_) => (4, Samples::U8(image.to_rgba8().into_raw())),
            DynamicImage::ImageLuma16(buffer) => (1, Samples::U16(buffer.into_raw())),
            DynamicImage::ImageRgb16(buffer) => (3, Samples::U16(buffer.into_raw())),
            DynamicImage::ImageRgba16(buffer) => (4, Samples::U16(buffer.into_raw())),
            DynamicImage::ImageLumaA16(_) => (4, Samples::U16(image.to_rgba16().into_raw())),
            DynamicImage::ImageRgb32F(_) => (3, Samples::U16(image.to_rgb16().into_raw())),
            _ => (4, Samples::U16(image.to_rgba16().into_raw())),
        };
        Self::new(width, height, channels, samples)
    }

    /// Converts the pixel buffer back into an image the codec can write
    pub fn into_dynamic(self) -> Result<DynamicImage, UpscaleError> {
        let expected = self.width as usize * self.height as usize * self.channels as usize;
        let actual = self.samples.len();
        let invalid = || UpscaleError::InvalidBuffer { expected, actual };
        let (width, height) = (self.width, self.height);

        // Pick the image variant matching the channel count and sample type
        let image = match (self.channels, self.samples) {
            (1, Samples::U8(data)) => DynamicImage::ImageLuma8(image::GrayImage::from_raw(width, height, data).ok_or_else(invalid)?),
            (3, Samples::U8(data)) => DynamicImage::ImageRgb8(image::RgbImage::from_raw(width, height, data).ok_or_else(invalid)?),
            (4, Samples::U8(data)) => DynamicImage::ImageRgba8(image::RgbaImage::from_raw(width, height, data).ok_or_else(invalid)?),
            (1, Samples::U16(data)) => DynamicImage::ImageLuma16(image::ImageBuffer::from_raw(width, height, data).ok_or_else(invalid)?),
            (3, Samples::U16(data)) => DynamicImage::ImageRgb16(image::ImageBuffer::from_raw(width, height, data).ok_or_else(invalid)?),
            (4, Samples::U16(data)) => DynamicImage::ImageRgba16(image::ImageBuffer::from_raw(width, height, data).ok_or_else(invalid)?),
            (channels, _) => return Err(UpscaleError::UnsupportedShape(format!("{channels} channels (expected 1, 3 or 4)"))),
        };

        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_sample_count() {
        let result = PixelBuffer::new(2, 2, 3, Samples::U8(vec![0; 11]));
        assert!(matches!(result, Err(UpscaleError::InvalidBuffer { expected: 12, actual: 11 })));
    }

    #[test]
    fn test_new_rejects_empty_image() {
        assert!(matches!(PixelBuffer::new(0, 5, 3, Samples::U8(vec![])), Err(UpscaleError::UnsupportedShape(_))));
        assert!(matches!(PixelBuffer::new(5, 0, 1, Samples::U16(vec![])), Err(UpscaleError::UnsupportedShape(_))));
    }

    #[test]
    fn test_new_rejects_two_channels() {
        let result = PixelBuffer::new(1, 1, 2, Samples::U8(vec![0; 2]));
        assert!(matches!(result, Err(UpscaleError::UnsupportedShape(_))));
    }

    #[test]
    fn test_unit_conversion_8bit() {
        let buffer = PixelBuffer::new(1, 1, 3, Samples::U8(vec![0, 51, 255])).unwrap();
        let unit = buffer.to_unit_f32();
        assert_eq!(unit[0], 0.0);
        assert!((unit[1] - 0.2).abs() < 1e-6);
        assert_eq!(unit[2], 1.0);

        let back = PixelBuffer::from_unit_f32(1, 1, 3, BitDepth::Eight, &unit).unwrap();
        assert_eq!(back, buffer);
    }

    #[test]
    fn test_from_unit_clamps_out_of_range() {
        let buffer = PixelBuffer::from_unit_f32(1, 1, 1, BitDepth::Sixteen, &[1.5]).unwrap();
        assert_eq!(buffer.samples(), &Samples::U16(vec![u16::MAX]));

        let buffer = PixelBuffer::from_unit_f32(1, 1, 1, BitDepth::Eight, &[-0.3]).unwrap();
        assert_eq!(buffer.samples(), &Samples::U8(vec![0]));
    }

    #[test]
    fn test_luma_alpha_widened_to_rgba() {
        let image = DynamicImage::ImageLumaA8(image::GrayAlphaImage::from_raw(1, 1, vec![10, 200]).unwrap());
        let buffer = PixelBuffer::from_dynamic(image).unwrap();
        assert_eq!(buffer.channels(), 4);
        assert_eq!(buffer.samples(), &Samples::U8(vec![10, 10, 10, 200]));
    }

    #[test]
    fn test_dynamic_preserves_16bit() {
        let image = DynamicImage::ImageRgb16(image::ImageBuffer::from_raw(1, 2, vec![1u16, 2, 3, 4, 5, 6]).unwrap());
        let buffer = PixelBuffer::from_dynamic(image).unwrap();
        assert_eq!(buffer.bit_depth(), BitDepth::Sixteen);
        assert_eq!((buffer.width(), buffer.height(), buffer.channels()), (1, 2, 3));

        let back = buffer.into_dynamic().unwrap();
        assert!(matches!(back, DynamicImage::ImageRgb16(_)));
    }
}
