//! Verification utilities for esrgan-upscale
//!
//! This crate provides tools for checking that repeated upscaling runs produce
//! identical results.

pub mod compare;
