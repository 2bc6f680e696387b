//! Forward pass through the super-resolution network
//!
//! [`SuperResolutionModel`] is the seam between the upsampler and whatever runs the
//! network. [`OrtModel`] runs an ONNX export of the weights with ONNX Runtime.

use crate::{NchwTensor, RrdbNetDescriptor, UpscaleError};
use half::f16;
use ort::{
    session::Session,
    tensor::TensorElementType,
    value::{Tensor, ValueType},
};
use std::path::{Path, PathBuf};

/// A network mapping a `[1, C, H, W]` tensor to `[1, C', H * s, W * s]`
pub trait SuperResolutionModel: Send {
    /// Runs one forward pass
    fn forward(&mut self, input: &NchwTensor) -> Result<NchwTensor, UpscaleError>;
}

/// An ONNX Runtime session loaded from a weights file
pub struct OrtModel {
    session: Session,
    input_name: String,
    output_name: String,
    half: bool,
}

impl OrtModel {
    /// Loads the weights file and checks it against the descriptor
    ///
    /// # Arguments
    /// * `path` - Path of the ONNX weights file
    /// * `descriptor` - Architecture the weights are expected to implement
    /// * `half` - Whether the weights are expected to be a half precision export
    ///
    /// # Errors
    /// * `MissingWeights` if the file does not exist
    /// * `ModelLoad` if ONNX Runtime cannot build a session from it
    /// * `UnsupportedShape` if the model's declared input is not a float tensor with the descriptor's channel count
    /// * `InvalidConfig` if `half` disagrees with the precision the model declares
    pub fn load(path: impl AsRef<Path>, descriptor: &RrdbNetDescriptor, half: bool) -> Result<Self, UpscaleError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(UpscaleError::MissingWeights(path.to_path_buf()));
        }

        let model_load_error = |source| UpscaleError::ModelLoad {
            path: PathBuf::from(path),
            source,
        };
        let session = Session::builder().and_then(|builder| builder.commit_from_file(path)).map_err(model_load_error)?;

        let input = session.inputs.first().ok_or_else(|| UpscaleError::UnsupportedShape("model declares no inputs".to_string()))?;
        let output = session.outputs.first().ok_or_else(|| UpscaleError::UnsupportedShape("model declares no outputs".to_string()))?;

        // Precision follows the declared input element type; the weights are never converted
        let declared_half = match &input.input_type {
            ValueType::Tensor { ty: TensorElementType::Float32, .. } => false,
            ValueType::Tensor { ty: TensorElementType::Float16, .. } => true,
            other => return Err(UpscaleError::UnsupportedShape(format!("model input {} is {other:?}, expected a float32 or float16 tensor", input.name))),
        };
        if declared_half != half {
            let precision = |half: bool| if half { "float16" } else { "float32" };
            return Err(UpscaleError::InvalidConfig(format!(
                "{} precision requested but {} declares a {} input",
                precision(half),
                path.display(),
                precision(declared_half)
            )));
        }

        // Dynamic axes are reported as -1
        let declared_channels = input.input_type.tensor_shape().and_then(|shape| shape.get(1).copied());
        if let Some(channels) = declared_channels.filter(|&channels| channels > 0) {
            if channels as usize != descriptor.num_in_ch {
                return Err(UpscaleError::UnsupportedShape(format!("model input has {channels} channels, descriptor expects {}", descriptor.num_in_ch)));
            }
        }

        tracing::debug!(input = %input.name, output = %output.name, half, "loaded model from {}", path.display());

        Ok(Self {
            input_name: input.name.clone(),
            output_name: output.name.clone(),
            session,
            half,
        })
    }

    /// Returns whether the model runs on half precision tensors
    pub fn is_half(&self) -> bool {
        self.half
    }

    fn forward_f32(&mut self, input: &NchwTensor) -> Result<(Vec<usize>, Vec<f32>), UpscaleError> {
        let tensor = Tensor::from_array((input.shape(), input.data().to_vec()))?;
        let outputs = self.session.run(ort::inputs![self.input_name.as_str() => tensor])?;
        let (shape, data) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;
        Ok((shape.iter().map(|&d| d as usize).collect(), data.to_vec()))
    }

    fn forward_f16(&mut self, input: &NchwTensor) -> Result<(Vec<usize>, Vec<f32>), UpscaleError> {
        let halves: Vec<f16> = input.data().iter().map(|&v| f16::from_f32(v)).collect();
        let tensor = Tensor::from_array((input.shape(), halves))?;
        let outputs = self.session.run(ort::inputs![self.input_name.as_str() => tensor])?;
        let (shape, data) = outputs[self.output_name.as_str()].try_extract_tensor::<f16>()?;
        Ok((shape.iter().map(|&d| d as usize).collect(), data.iter().map(|v| v.to_f32()).collect()))
    }
}

impl SuperResolutionModel for OrtModel {
    fn forward(&mut self, input: &NchwTensor) -> Result<NchwTensor, UpscaleError> {
        let (shape, data) = if self.half { self.forward_f16(input)? } else { self.forward_f32(input)? };

        match shape.as_slice() {
            &[1, channels, height, width] => NchwTensor::new(channels, height, width, data),
            other => Err(UpscaleError::UnsupportedShape(format!("model output shape {other:?} is not [1, C, H, W]"))),
        }
    }
}
