//! Single-image super-resolution with Real-ESRGAN
//!
//! This crate upscales images with a pretrained RRDBNet (Real-ESRGAN x4plus) network
//! executed by ONNX Runtime. It provides the network descriptor, the inference
//! wrapper that prepares images for the network, and image file I/O.
//!
//! ```no_run
//! use esrgan_upscale::{RealEsrGaner, RrdbNetDescriptor, UpsamplerConfig, image_io};
//!
//! let mut upsampler = RealEsrGaner::new(RrdbNetDescriptor::x4plus(), UpsamplerConfig::default())?;
//! let image = image_io::decode("cat.png")?;
//! let (output, _) = upsampler.enhance(&image, None)?;
//! image_io::encode(&output, "cat_up.png")?;
//! # Ok::<(), esrgan_upscale::UpscaleError>(())
//! ```

mod error;
mod model;
mod pixel_buffer;
mod rrdbnet;
mod tensor;
mod upsampler;

pub mod image_io;

pub use error::UpscaleError;
pub use model::{OrtModel, SuperResolutionModel};
pub use pixel_buffer::{BitDepth, PixelBuffer, Samples};
pub use rrdbnet::RrdbNetDescriptor;
pub use tensor::NchwTensor;
pub use upsampler::{AlphaUpsampler, DEFAULT_WEIGHTS_PATH, ImageMode, RealEsrGaner, UpsamplerConfig};
