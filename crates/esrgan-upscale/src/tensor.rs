//! Planar float tensors exchanged with the model
//!
//! The network consumes and produces `[1, C, H, W]` float tensors with values in
//! `[0, 1]`. This module converts between interleaved pixels and planar tensors and
//! implements the reflect padding and cropping applied around the forward pass.

use crate::UpscaleError;

/// Rec.601 luma weights applied when collapsing RGB output back to one channel
const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// A single-batch planar tensor of shape `[1, channels, height, width]`
#[derive(Debug, Clone, PartialEq)]
pub struct NchwTensor {
    channels: usize,
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl NchwTensor {
    /// Creates a tensor from planar data
    ///
    /// # Errors
    /// Returns `InvalidBuffer` if `data.len() != channels * height * width`
    pub fn new(channels: usize, height: usize, width: usize, data: Vec<f32>) -> Result<Self, UpscaleError> {
        let expected = channels * height * width;
        if data.len() != expected {
            return Err(UpscaleError::InvalidBuffer { expected, actual: data.len() });
        }
        Ok(Self { channels, height, width, data })
    }

    /// Gathers `channel_indices` from interleaved pixels into planes
    ///
    /// An index may repeat, which is how single-channel planes are replicated to RGB.
    ///
    /// # Arguments
    /// * `interleaved` - Row-major interleaved samples
    /// * `stride` - Number of interleaved channels per pixel
    /// * `height` - Image height
    /// * `width` - Image width
    /// * `channel_indices` - Source channel for each output plane
    pub fn from_interleaved(interleaved: &[f32], stride: usize, height: usize, width: usize, channel_indices: &[usize]) -> Self {
        let plane = height * width;
        let mut data = vec![0.0; channel_indices.len() * plane];
        for (plane_index, &channel) in channel_indices.iter().enumerate() {
            let dst = &mut data[plane_index * plane..(plane_index + 1) * plane];
            for (pixel, value) in dst.iter_mut().enumerate() {
                *value = interleaved[pixel * stride + channel];
            }
        }
        Self {
            channels: channel_indices.len(),
            height,
            width,
            data,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the `[1, C, H, W]` shape as ONNX Runtime expects it
    pub fn shape(&self) -> [usize; 4] {
        [1, self.channels, self.height, self.width]
    }

    /// Returns one channel plane
    pub fn plane(&self, channel: usize) -> &[f32] {
        let size = self.height * self.width;
        &self.data[channel * size..(channel + 1) * size]
    }

    /// Pads the bottom and right edges by mirroring interior rows and columns
    ///
    /// The edge row/column itself is not repeated, matching `reflect` padding in
    /// common deep learning frameworks.
    pub fn reflect_pad(&self, bottom: usize, right: usize) -> Self {
        if bottom == 0 && right == 0 {
            return self.clone();
        }

        let height = self.height + bottom;
        let width = self.width + right;
        let mut data = Vec::with_capacity(self.channels * height * width);
        for channel in 0..self.channels {
            let plane = self.plane(channel);
            for y in 0..height {
                let src_y = reflect_index(y, self.height);
                for x in 0..width {
                    data.push(plane[src_y * self.width + reflect_index(x, self.width)]);
                }
            }
        }

        Self {
            channels: self.channels,
            height,
            width,
            data,
        }
    }

    /// Keeps the top-left `height × width` region
    pub fn crop(&self, height: usize, width: usize) -> Self {
        if height == self.height && width == self.width {
            return self.clone();
        }

        let height = height.min(self.height);
        let width = width.min(self.width);
        let mut data = Vec::with_capacity(self.channels * height * width);
        for channel in 0..self.channels {
            let plane = self.plane(channel);
            for y in 0..height {
                data.extend_from_slice(&plane[y * self.width..y * self.width + width]);
            }
        }

        Self {
            channels: self.channels,
            height,
            width,
            data,
        }
    }

    /// Clamps every value into `[0, 1]`
    pub fn clamp_unit(mut self) -> Self {
        for value in &mut self.data {
            *value = value.clamp(0.0, 1.0);
        }
        self
    }

    /// Collapses a 3-channel RGB tensor into a single luma plane
    pub fn luma(&self) -> Vec<f32> {
        let (r, g, b) = (self.plane(0), self.plane(1), self.plane(2));
        r.iter()
            .zip(g)
            .zip(b)
            .map(|((&r, &g), &b)| LUMA_WEIGHTS[0] * r + LUMA_WEIGHTS[1] * g + LUMA_WEIGHTS[2] * b)
            .collect()
    }
}

/// Maps an index past the end of `len` back inside by reflection
fn reflect_index(index: usize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let folded = index % period;
    if folded < len { folded } else { period - folded }
}
