//! Determinism verification binary
//!
//! Upscales the same image twice with freshly loaded models and checks that both
//! runs produce identical samples.

use esrgan_upscale::{RealEsrGaner, RrdbNetDescriptor, UpsamplerConfig, image_io};
use esrgan_upscale_verification::compare::{CompareResult, compare_images};
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <input_image> [weights.onnx]", args[0]);
        return Ok(());
    }

    let input_image = image_io::decode(&args[1])?;
    let mut config = UpsamplerConfig::default();
    if let Some(weights) = args.get(2) {
        config.model_path = weights.into();
    }

    let mut outputs = Vec::with_capacity(2);
    for run in 1..=2 {
        let mut upsampler = RealEsrGaner::new(RrdbNetDescriptor::x4plus(), config.clone())?;
        let start = Instant::now();
        let (output, _) = upsampler.enhance(&input_image, None)?;
        println!("Run {run}: {}x{} in {:.2?}", output.width(), output.height(), start.elapsed());
        outputs.push(output);
    }

    match compare_images(&outputs[0], &outputs[1]) {
        CompareResult::Match => println!("✓ Outputs match"),
        CompareResult::ShapeMismatch { first, second } => {
            eprintln!("✗ Shape mismatch: first {first:?}, second {second:?}");
            std::process::exit(1);
        }
        CompareResult::DepthMismatch => {
            eprintln!("✗ Bit depth mismatch");
            std::process::exit(1);
        }
        CompareResult::SampleMismatch { mismatched, max_difference } => {
            eprintln!("✗ Sample mismatch: {mismatched} samples differ, max difference {max_difference}");
            std::process::exit(1);
        }
    }

    Ok(())
}
