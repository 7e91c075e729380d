//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*. They sit between the
//! [`operations`](super::operations) module (which decides which variants to
//! create) and the [`backend`](super::backend) (which does the pixel work), so
//! a mock backend can stand in for tests without touching the operation logic.
//!
//! ## Types
//!
//! - [`Bounds`]: A maximum bounding box (width × height) for shrink-to-fit.
//! - [`OutputCodec`]: The single codec every variant is emitted in.
//! - [`Quality`]: Lossy encoding quality (1-100, default 75). Clamped on construction.
//! - [`ResizeParams`]: Full specification for one variant: bounds, codec, quality.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A maximum bounding box. Images are scaled down to fit inside it, never up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Codec every variant is re-encoded into, independent of the upload's format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputCodec {
    #[default]
    WebP,
}

impl OutputCodec {
    pub fn extension(self) -> &'static str {
        match self {
            OutputCodec::WebP => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputCodec::WebP => "image/webp",
        }
    }
}

/// Quality setting for lossy variant encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// Parameters for a single variant resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeParams {
    pub bounds: Bounds,
    pub codec: OutputCodec,
    pub quality: Quality,
}

impl ResizeParams {
    pub fn fit_within(bounds: Bounds) -> Self {
        Self {
            bounds,
            codec: OutputCodec::default(),
            quality: Quality::default(),
        }
    }

    pub fn with_quality(self, quality: Quality) -> Self {
        Self { quality, ..self }
    }
}
