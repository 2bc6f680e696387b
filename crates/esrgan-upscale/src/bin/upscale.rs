//! Real-ESRGAN CLI Image Upscaler
//!
//! Upscales one image file with the Real-ESRGAN x4plus network and writes the result.
//!
//! # Usage
//! ```bash
//! upscale cat.png cat_up.png
//! upscale cat.png cat_up.png --model weights/RealESRGAN_x4plus.onnx --outscale 2
//! ```

use clap::Parser;
use esrgan_upscale::{AlphaUpsampler, DEFAULT_WEIGHTS_PATH, RealEsrGaner, RrdbNetDescriptor, UpsamplerConfig, image_io};
use std::path::PathBuf;

/// Command-line arguments for the Real-ESRGAN image upscaler
#[derive(Parser)]
#[command(version, about = "CLI tool for upscaling images using Real-ESRGAN")]
struct Args {
    /// Input image file path
    input: PathBuf,

    /// Output image file path; the format follows the extension
    output: PathBuf,

    /// ONNX weights file of the RRDBNet x4plus network
    #[arg(long, short, default_value = DEFAULT_WEIGHTS_PATH)]
    model: PathBuf,

    /// Final size relative to the input (e.g., 2.0); defaults to the network's native 4x
    #[arg(long, short)]
    outscale: Option<f64>,

    /// Reflect padding added to the bottom and right edges before inference
    #[arg(long, default_value_t = 0)]
    pre_pad: usize,

    /// Expect a half precision (float16) weights export; loading fails if the file declares another input type
    #[arg(long)]
    half: bool,

    /// Alpha channel upsampler (model, bilinear)
    #[arg(long, default_value = "model")]
    alpha_upsampler: String,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let alpha_upsampler = match args.alpha_upsampler.to_lowercase().as_str() {
        "model" | "realesrgan" => AlphaUpsampler::Model,
        "bilinear" => AlphaUpsampler::Bilinear,
        _ => {
            eprintln!("Invalid alpha upsampler '{}'. Valid values: model, bilinear", args.alpha_upsampler);
            std::process::exit(1);
        }
    };

    let config = UpsamplerConfig {
        model_path: args.model,
        pre_pad: args.pre_pad,
        half: args.half,
        alpha_upsampler,
        ..Default::default()
    };

    tracing::info!("Loading model from {}", config.model_path.display());
    let mut upsampler = RealEsrGaner::new(RrdbNetDescriptor::x4plus(), config)?;

    tracing::info!("Loading image from {}", args.input.display());
    let input = image_io::decode(&args.input)?;

    let (output, mode) = upsampler.enhance(&input, args.outscale)?;

    tracing::info!("Saving {mode:?} result to {}", args.output.display());
    image_io::encode(&output, &args.output)?;

    tracing::info!("Successfully upscaled image from {}x{} to {}x{}", input.width(), input.height(), output.width(), output.height());

    Ok(())
}
