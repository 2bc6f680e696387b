//! Real-ESRGAN style inference wrapper
//!
//! [`RealEsrGaner`] binds an [`RrdbNetDescriptor`] and an [`UpsamplerConfig`] to a
//! [`SuperResolutionModel`] and turns a decoded [`PixelBuffer`] into its upscaled
//! counterpart. Around the forward pass it handles sample normalization, grayscale
//! and alpha inputs, reflect padding, and the optional `outscale` resize.

use crate::{NchwTensor, OrtModel, PixelBuffer, RrdbNetDescriptor, SuperResolutionModel, UpscaleError};
use image::imageops::FilterType;
use std::path::PathBuf;

/// Default location of the ONNX export of the Real-ESRGAN x4plus weights
pub const DEFAULT_WEIGHTS_PATH: &str = "RealESRGAN_x4plus.onnx";

/// How the alpha channel of RGBA inputs is upscaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaUpsampler {
    /// Run the alpha plane through the network as a gray image
    #[default]
    Model,
    /// Resize the alpha plane with a bilinear filter
    Bilinear,
}

/// How the input image was interpreted by [`RealEsrGaner::enhance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMode {
    /// Single channel, replicated to RGB for the network
    Gray,
    /// Three color channels
    Rgb,
    /// Three color channels plus alpha
    Rgba,
}

impl ImageMode {
    fn detect(channels: u8) -> Result<Self, UpscaleError> {
        match channels {
            1 => Ok(ImageMode::Gray),
            3 => Ok(ImageMode::Rgb),
            4 => Ok(ImageMode::Rgba),
            other => Err(UpscaleError::UnsupportedShape(format!("{other} channels (expected 1, 3 or 4)"))),
        }
    }
}

/// Inference wrapper parameters
#[derive(Debug, Clone, PartialEq)]
pub struct UpsamplerConfig {
    /// Upscale factor of the model
    pub scale: usize,
    /// Path of the ONNX weights file
    pub model_path: PathBuf,
    /// Tile edge length; 0 processes the whole image at once
    pub tile: usize,
    /// Overlap between tiles; fixed, since only whole-image inference is supported
    pub tile_pad: usize,
    /// Reflect padding added to the bottom and right before inference
    pub pre_pad: usize,
    /// Expect a half precision weights export
    pub half: bool,
    /// Strategy for the alpha channel of RGBA inputs
    pub alpha_upsampler: AlphaUpsampler,
}

impl Default for UpsamplerConfig {
    fn default() -> Self {
        Self {
            scale: 4,
            model_path: PathBuf::from(DEFAULT_WEIGHTS_PATH),
            tile: 0,
            tile_pad: 10,
            pre_pad: 0,
            half: false,
            alpha_upsampler: AlphaUpsampler::Model,
        }
    }
}

impl UpsamplerConfig {
    /// Checks the configuration against the network descriptor
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the scale is zero or differs from the descriptor,
    /// or if tiling is requested
    pub fn validate(&self, descriptor: &RrdbNetDescriptor) -> Result<(), UpscaleError> {
        if self.scale == 0 {
            return Err(UpscaleError::InvalidConfig("scale must be at least 1".to_string()));
        }
        if self.scale != descriptor.scale {
            return Err(UpscaleError::InvalidConfig(format!("scale {} does not match the network's native scale {}", self.scale, descriptor.scale)));
        }
        if self.tile != 0 {
            return Err(UpscaleError::InvalidConfig(format!("tile size {} requested, only whole-image inference (tile = 0) is supported", self.tile)));
        }
        Ok(())
    }

    /// Returns the extra bottom/right padding needed so that the model input is a
    /// multiple of what the network's pixel-unshuffle stem expects
    fn mod_pad(&self, height: usize, width: usize) -> (usize, usize) {
        let modulus = match self.scale {
            2 => 2,
            1 => 4,
            _ => return (0, 0),
        };
        let pad = |len: usize| (modulus - len % modulus) % modulus;
        (pad(height), pad(width))
    }
}

/// Super-resolution inference wrapper
pub struct RealEsrGaner {
    descriptor: RrdbNetDescriptor,
    config: UpsamplerConfig,
    model: Box<dyn SuperResolutionModel>,
}

impl RealEsrGaner {
    /// Validates the configuration and loads the weights with ONNX Runtime
    ///
    /// # Errors
    /// Returns `InvalidConfig` for unusable configurations and the errors of
    /// [`OrtModel::load`] for missing or malformed weights
    pub fn new(descriptor: RrdbNetDescriptor, config: UpsamplerConfig) -> Result<Self, UpscaleError> {
        config.validate(&descriptor)?;
        let model = OrtModel::load(&config.model_path, &descriptor, config.half)?;
        Ok(Self {
            descriptor,
            config,
            model: Box::new(model),
        })
    }

    /// Binds an already constructed model
    pub fn with_model(descriptor: RrdbNetDescriptor, config: UpsamplerConfig, model: impl SuperResolutionModel + 'static) -> Result<Self, UpscaleError> {
        config.validate(&descriptor)?;
        Ok(Self {
            descriptor,
            config,
            model: Box::new(model),
        })
    }

    /// Upscales an image
    ///
    /// # Arguments
    /// * `image` - Decoded input image
    /// * `outscale` - Final size relative to the input; `None` keeps the model's native scale
    ///
    /// # Returns
    /// The upscaled image, with the input's channel count and bit depth, and the
    /// mode the input was processed in
    ///
    /// # Errors
    /// Propagates model failures and rejects non-positive `outscale` values
    pub fn enhance(&mut self, image: &PixelBuffer, outscale: Option<f64>) -> Result<(PixelBuffer, ImageMode), UpscaleError> {
        let mode = ImageMode::detect(image.channels())?;
        let (height, width) = (image.height() as usize, image.width() as usize);
        let stride = image.channels() as usize;
        let unit = image.to_unit_f32();

        tracing::debug!(width, height, ?mode, bit_depth = ?image.bit_depth(), "enhancing image");

        // Gray images are replicated to RGB; the alpha plane is handled separately
        let color_channels: &[usize] = match mode {
            ImageMode::Gray => &[0, 0, 0],
            ImageMode::Rgb | ImageMode::Rgba => &[0, 1, 2],
        };
        let color = self.process(NchwTensor::from_interleaved(&unit, stride, height, width, color_channels))?;

        // Upscale alpha with the configured strategy
        let alpha = match (mode, self.config.alpha_upsampler) {
            (ImageMode::Rgba, AlphaUpsampler::Model) => {
                let alpha = self.process(NchwTensor::from_interleaved(&unit, stride, height, width, &[3, 3, 3]))?;
                Some(alpha.luma())
            }
            (ImageMode::Rgba, AlphaUpsampler::Bilinear) => {
                let plane = NchwTensor::from_interleaved(&unit, stride, height, width, &[3]);
                Some(resize_plane(plane.data(), width, height, color.width(), color.height())?)
            }
            _ => None,
        };

        // Interleave the planes back, collapsing gray output to a single channel
        let (out_height, out_width) = (color.height(), color.width());
        let pixels = out_height * out_width;
        let mut interleaved = Vec::with_capacity(pixels * stride);
        match mode {
            ImageMode::Gray => interleaved.extend(color.luma()),
            ImageMode::Rgb | ImageMode::Rgba => {
                let (r, g, b) = (color.plane(0), color.plane(1), color.plane(2));
                for pixel in 0..pixels {
                    interleaved.extend([r[pixel], g[pixel], b[pixel]]);
                    if let Some(alpha) = &alpha {
                        interleaved.push(alpha[pixel]);
                    }
                }
            }
        }

        // Quantize back to the input bit depth
        let output = PixelBuffer::from_unit_f32(out_width as u32, out_height as u32, image.channels(), image.bit_depth(), &interleaved)?;

        // Resize relative to the input size when the caller asks for a different scale
        let output = match outscale {
            Some(outscale) if outscale != self.config.scale as f64 => resize_to_outscale(output, width, height, outscale)?,
            _ => output,
        };

        tracing::info!("upscaled {}x{} to {}x{}", width, height, output.width(), output.height());

        Ok((output, mode))
    }

    /// Pads, runs the model, and removes the padding again
    fn process(&mut self, input: NchwTensor) -> Result<NchwTensor, UpscaleError> {
        let (height, width) = (input.height(), input.width());
        let pre_pad = self.config.pre_pad;
        // Reflect-pad the bottom and right edges; mod padding only applies to x1 and x2 networks
        let (mod_pad_h, mod_pad_w) = self.config.mod_pad(height + pre_pad, width + pre_pad);

        let padded = input.reflect_pad(pre_pad + mod_pad_h, pre_pad + mod_pad_w);
        tracing::debug!(pre_pad, mod_pad_h, mod_pad_w, shape = ?padded.shape(), "running forward pass");

        let output = self.model.forward(&padded)?;

        // Reject outputs that do not match the descriptor before cropping
        let scale = self.config.scale;
        let expected = [1, self.descriptor.num_out_ch, padded.height() * scale, padded.width() * scale];
        if output.shape() != expected {
            return Err(UpscaleError::UnsupportedShape(format!("model returned {:?}, expected {:?}", output.shape(), expected)));
        }

        // Drop the padding, now multiplied by the scale
        Ok(output.crop(height * scale, width * scale).clamp_unit())
    }
}

/// Resizes a single `[0, 1]` plane with a bilinear filter
fn resize_plane(plane: &[f32], width: usize, height: usize, new_width: usize, new_height: usize) -> Result<Vec<f32>, UpscaleError> {
    let source = image::ImageBuffer::<image::Luma<f32>, Vec<f32>>::from_raw(width as u32, height as u32, plane.to_vec()).ok_or(UpscaleError::InvalidBuffer {
        expected: width * height,
        actual: plane.len(),
    })?;
    let resized = image::imageops::resize(&source, new_width as u32, new_height as u32, FilterType::Triangle);
    Ok(resized.into_raw())
}

/// Resizes the upscaled image to `outscale` times the input size
fn resize_to_outscale(output: PixelBuffer, input_width: usize, input_height: usize, outscale: f64) -> Result<PixelBuffer, UpscaleError> {
    if !outscale.is_finite() || outscale <= 0.0 {
        return Err(UpscaleError::InvalidConfig(format!("outscale must be positive, got {outscale}")));
    }

    let new_width = (input_width as f64 * outscale) as u32;
    let new_height = (input_height as f64 * outscale) as u32;
    if new_width == 0 || new_height == 0 {
        return Err(UpscaleError::InvalidConfig(format!("outscale {outscale} shrinks {input_width}x{input_height} to nothing")));
    }

    tracing::debug!(new_width, new_height, outscale, "resizing to outscale");
    let resized = output.into_dynamic()?.resize_exact(new_width, new_height, FilterType::Lanczos3);
    PixelBuffer::from_dynamic(resized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Samples;

    /// Nearest-neighbour stand-in for the network
    struct NearestModel {
        scale: usize,
    }

    impl SuperResolutionModel for NearestModel {
        fn forward(&mut self, input: &NchwTensor) -> Result<NchwTensor, UpscaleError> {
            let (channels, height, width) = (input.channels(), input.height() * self.scale, input.width() * self.scale);
            let mut data = Vec::with_capacity(channels * height * width);
            for channel in 0..channels {
                let plane = input.plane(channel);
                for y in 0..height {
                    for x in 0..width {
                        data.push(plane[(y / self.scale) * input.width() + x / self.scale]);
                    }
                }
            }
            NchwTensor::new(channels, height, width, data)
        }
    }

    /// Returns its input unchanged, ignoring the scale factor
    struct WrongShapeModel;

    impl SuperResolutionModel for WrongShapeModel {
        fn forward(&mut self, input: &NchwTensor) -> Result<NchwTensor, UpscaleError> {
            Ok(input.clone())
        }
    }

    fn upsampler(config: UpsamplerConfig) -> RealEsrGaner {
        RealEsrGaner::with_model(RrdbNetDescriptor::x4plus(), config, NearestModel { scale: 4 }).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = UpsamplerConfig::default();
        assert_eq!(config.scale, 4);
        assert_eq!(config.model_path, PathBuf::from("RealESRGAN_x4plus.onnx"));
        assert_eq!((config.tile, config.tile_pad, config.pre_pad, config.half), (0, 10, 0, false));
        assert_eq!(config.alpha_upsampler, AlphaUpsampler::Model);
        assert!(config.validate(&RrdbNetDescriptor::x4plus()).is_ok());
    }

    #[test]
    fn test_validate_rejects_tiling_and_scale_mismatch() {
        let descriptor = RrdbNetDescriptor::x4plus();

        let tiled = UpsamplerConfig { tile: 256, ..Default::default() };
        assert!(matches!(tiled.validate(&descriptor), Err(UpscaleError::InvalidConfig(_))));

        let mismatched = UpsamplerConfig { scale: 2, ..Default::default() };
        assert!(matches!(mismatched.validate(&descriptor), Err(UpscaleError::InvalidConfig(_))));
    }

    #[test]
    fn test_mod_pad() {
        let config = UpsamplerConfig { scale: 2, ..Default::default() };
        assert_eq!(config.mod_pad(5, 6), (1, 0));
        let config = UpsamplerConfig { scale: 1, ..Default::default() };
        assert_eq!(config.mod_pad(5, 6), (3, 2));
        assert_eq!(UpsamplerConfig::default().mod_pad(5, 6), (0, 0));
    }

    #[test]
    fn test_enhance_rgb_scales_by_four() {
        let input = PixelBuffer::new(3, 2, 3, Samples::U8((0..18).map(|v| v * 10).collect())).unwrap();
        let (output, mode) = upsampler(UpsamplerConfig::default()).enhance(&input, None).unwrap();

        assert_eq!(mode, ImageMode::Rgb);
        assert_eq!((output.width(), output.height(), output.channels()), (12, 8, 3));
        // Nearest-neighbour model: the top-left 4x4 block repeats the first input pixel
        let Samples::U8(data) = output.samples() else { panic!("expected 8-bit output") };
        assert_eq!(&data[..3], &[0, 10, 20]);
        assert_eq!(&data[3 * 3..3 * 3 + 3], &[0, 10, 20]);
        assert_eq!(&data[4 * 3..4 * 3 + 3], &[30, 40, 50]);
    }

    #[test]
    fn test_enhance_gray_keeps_single_channel() {
        let input = PixelBuffer::new(2, 2, 1, Samples::U8(vec![0, 64, 128, 255])).unwrap();
        let (output, mode) = upsampler(UpsamplerConfig::default()).enhance(&input, None).unwrap();

        assert_eq!(mode, ImageMode::Gray);
        assert_eq!((output.width(), output.height(), output.channels()), (8, 8, 1));
        let Samples::U8(data) = output.samples() else { panic!("expected 8-bit output") };
        assert_eq!(data[0], 0);
        assert_eq!(data[4], 64);
        assert_eq!(data[8 * 4], 128);
        assert_eq!(data[8 * 4 + 4], 255);
    }

    #[test]
    fn test_enhance_rgba_keeps_alpha() {
        let input = PixelBuffer::new(1, 1, 4, Samples::U16(vec![1000, 2000, 3000, 40000])).unwrap();

        for alpha_upsampler in [AlphaUpsampler::Model, AlphaUpsampler::Bilinear] {
            let config = UpsamplerConfig { alpha_upsampler, ..Default::default() };
            let (output, mode) = upsampler(config).enhance(&input, None).unwrap();

            assert_eq!(mode, ImageMode::Rgba);
            assert_eq!((output.width(), output.height(), output.channels()), (4, 4, 4));
            let Samples::U16(data) = output.samples() else { panic!("expected 16-bit output") };
            for pixel in data.chunks_exact(4) {
                assert_eq!(&pixel[..3], &[1000, 2000, 3000]);
                assert!((pixel[3] as i32 - 40000).abs() <= 1, "alpha {} drifted", pixel[3]);
            }
        }
    }

    #[test]
    fn test_enhance_pre_pad_is_removed() {
        let input = PixelBuffer::new(3, 3, 3, Samples::U8(vec![7; 27])).unwrap();
        let config = UpsamplerConfig { pre_pad: 2, ..Default::default() };
        let (output, _) = upsampler(config).enhance(&input, None).unwrap();

        assert_eq!((output.width(), output.height()), (12, 12));
        assert_eq!(output.samples(), &Samples::U8(vec![7; 12 * 12 * 3]));
    }

    #[test]
    fn test_enhance_outscale_is_relative_to_input() {
        let input = PixelBuffer::new(4, 2, 3, Samples::U8(vec![100; 24])).unwrap();
        let mut upsampler = upsampler(UpsamplerConfig::default());

        let (output, _) = upsampler.enhance(&input, Some(2.0)).unwrap();
        assert_eq!((output.width(), output.height()), (8, 4));

        let (output, _) = upsampler.enhance(&input, Some(1.0)).unwrap();
        assert_eq!((output.width(), output.height()), (4, 2));

        let (output, _) = upsampler.enhance(&input, Some(4.0)).unwrap();
        assert_eq!((output.width(), output.height()), (16, 8));

        assert!(matches!(upsampler.enhance(&input, Some(0.0)), Err(UpscaleError::InvalidConfig(_))));
    }

    #[test]
    fn test_enhance_rejects_wrong_model_output() {
        let mut upsampler = RealEsrGaner::with_model(RrdbNetDescriptor::x4plus(), UpsamplerConfig::default(), WrongShapeModel).unwrap();
        let input = PixelBuffer::new(2, 2, 3, Samples::U8(vec![0; 12])).unwrap();
        assert!(matches!(upsampler.enhance(&input, None), Err(UpscaleError::UnsupportedShape(_))));
    }
}
