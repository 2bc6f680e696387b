//! Image comparison utilities for verification
//!
//! This module provides functions for comparing two upscaled outputs sample by
//! sample.

use esrgan_upscale::{PixelBuffer, Samples};

/// Result of comparing two images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareResult {
    /// Images match exactly
    Match,
    /// Images have different dimensions or channel counts
    ShapeMismatch {
        /// (width, height, channels) of the first output
        first: (u32, u32, u8),
        /// (width, height, channels) of the second output
        second: (u32, u32, u8),
    },
    /// One image has 8-bit samples and the other 16-bit
    DepthMismatch,
    /// Images have matching shapes but different sample values
    SampleMismatch {
        /// Number of samples that differ
        mismatched: usize,
        /// Largest absolute difference between two samples
        max_difference: u16,
    },
}

/// Compares two pixel buffers sample by sample
///
/// # Arguments
/// * `first` - Output of the first run
/// * `second` - Output of the second run
///
/// # Returns
/// A `CompareResult` indicating whether the images match and details about any differences
pub fn compare_images(first: &PixelBuffer, second: &PixelBuffer) -> CompareResult {
    let shape = |image: &PixelBuffer| (image.width(), image.height(), image.channels());
    if shape(first) != shape(second) {
        return CompareResult::ShapeMismatch {
            first: shape(first),
            second: shape(second),
        };
    }

    let differences: Vec<u16> = match (first.samples(), second.samples()) {
        (Samples::U8(a), Samples::U8(b)) => a.iter().zip(b).map(|(&a, &b)| a.abs_diff(b) as u16).collect(),
        (Samples::U16(a), Samples::U16(b)) => a.iter().zip(b).map(|(&a, &b)| a.abs_diff(b)).collect(),
        _ => return CompareResult::DepthMismatch,
    };

    let mismatched = differences.iter().filter(|&&d| d != 0).count();
    if mismatched == 0 {
        CompareResult::Match
    } else {
        CompareResult::SampleMismatch {
            mismatched,
            max_difference: differences.into_iter().max().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(samples: Vec<u8>) -> PixelBuffer {
        PixelBuffer::new(2, 1, 3, Samples::U8(samples)).unwrap()
    }

    #[test]
    fn test_identical_images_match() {
        let image = rgb(vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(compare_images(&image, &image.clone()), CompareResult::Match);
    }

    #[test]
    fn test_sample_mismatch_reports_count_and_maximum() {
        let result = compare_images(&rgb(vec![1, 2, 3, 4, 5, 6]), &rgb(vec![1, 9, 3, 4, 5, 0]));
        assert_eq!(result, CompareResult::SampleMismatch { mismatched: 2, max_difference: 7 });
    }

    #[test]
    fn test_shape_and_depth_mismatch() {
        let gray = PixelBuffer::new(2, 1, 1, Samples::U8(vec![0, 0])).unwrap();
        assert_eq!(
            compare_images(&rgb(vec![0; 6]), &gray),
            CompareResult::ShapeMismatch {
                first: (2, 1, 3),
                second: (2, 1, 1)
            }
        );

        let deep = PixelBuffer::new(2, 1, 3, Samples::U16(vec![0; 6])).unwrap();
        assert_eq!(compare_images(&rgb(vec![0; 6]), &deep), CompareResult::DepthMismatch);
    }
}
