//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, EncodedImage, ImageBackend};
use super::params::{Bounds, Quality, ResizeParams};
use std::collections::BTreeMap;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, bytes: &[u8]) -> Result<(u32, u32)> {
    let dims = backend.identify(bytes)?;
    Ok((dims.width, dims.height))
}

/// One variant to produce: its configured name and resize parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPlan {
    pub name: String,
    pub params: ResizeParams,
}

/// A generated variant, ready to be written.
#[derive(Debug, Clone)]
pub struct GeneratedVariant {
    pub name: String,
    pub image: EncodedImage,
}

/// Plan one resize per configured variant. No ordering is implied between
/// the plans; each can run on its own worker.
pub fn plan_variants(variants: &BTreeMap<String, Bounds>, quality: Quality) -> Vec<VariantPlan> {
    variants
        .iter()
        .map(|(name, bounds)| VariantPlan {
            name: name.clone(),
            params: ResizeParams::fit_within(*bounds).with_quality(quality),
        })
        .collect()
}

/// Decode the upload once so every variant can share it.
pub fn decode_source<B: ImageBackend>(backend: &B, bytes: &[u8]) -> Result<B::Decoded> {
    backend.decode(bytes)
}

/// Produce a single variant from the shared decoded source.
///
/// `source` is borrowed immutably; each call resizes into its own buffer.
pub fn create_variant<B: ImageBackend>(
    backend: &B,
    source: &B::Decoded,
    plan: &VariantPlan,
) -> Result<GeneratedVariant> {
    let image = backend.resize(source, &plan.params)?;
    Ok(GeneratedVariant {
        name: plan.name.clone(),
        image,
    })
}
