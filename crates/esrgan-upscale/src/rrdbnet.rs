//! RRDBNet architecture descriptor
//!
//! The network itself lives in the weights file. This descriptor records the
//! hyper-parameters the weights were trained with so the upsampler can check the
//! model it loads and knows the native scale factor.

/// Hyper-parameters of a residual-in-residual dense block network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RrdbNetDescriptor {
    /// Channels of the input image
    pub num_in_ch: usize,
    /// Channels of the output image
    pub num_out_ch: usize,
    /// Base feature width
    pub num_feat: usize,
    /// Number of RRDB blocks
    pub num_block: usize,
    /// Channel growth inside each dense block
    pub num_grow_ch: usize,
    /// Native upscale factor
    pub scale: usize,
}

impl RrdbNetDescriptor {
    /// Returns the descriptor of the Real-ESRGAN x4plus network
    pub const fn x4plus() -> Self {
        Self {
            num_in_ch: 3,
            num_out_ch: 3,
            num_feat: 64,
            num_block: 23,
            num_grow_ch: 32,
            scale: 4,
        }
    }
}

impl Default for RrdbNetDescriptor {
    fn default() -> Self {
        Self::x4plus()
    }
}
