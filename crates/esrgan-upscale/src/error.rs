//! Error types for the upscaling pipeline
//!
//! Every failure of the pipeline surfaces as an [`UpscaleError`]. Errors from the
//! image codec and from ONNX Runtime are kept as sources so the caller can print
//! the full chain.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the model, decoding, enhancing or encoding an image
#[derive(Error, Debug)]
pub enum UpscaleError {
    /// The input file could not be read or its format was not recognized
    #[error("failed to decode image {}", .path.display())]
    Decode {
        /// Path of the input image
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The output file could not be written
    #[error("failed to encode image {}", .path.display())]
    Encode {
        /// Path of the output image
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The weights file does not exist
    #[error("weights file not found: {}", .0.display())]
    MissingWeights(PathBuf),

    /// ONNX Runtime rejected the weights file
    #[error("failed to load model from {}", .path.display())]
    ModelLoad {
        /// Path of the weights file
        path: PathBuf,
        #[source]
        source: ort::Error,
    },

    /// The forward pass failed inside ONNX Runtime
    #[error("inference failed")]
    Inference(#[from] ort::Error),

    /// A tensor or model had a shape the pipeline cannot handle
    #[error("unsupported shape: {0}")]
    UnsupportedShape(String),

    /// A pixel buffer's sample count does not match its dimensions
    #[error("invalid pixel buffer: expected {expected} samples, got {actual}")]
    InvalidBuffer {
        /// Samples implied by width, height and channel count
        expected: usize,
        /// Samples actually present
        actual: usize,
    },

    /// The upsampler configuration is not usable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
