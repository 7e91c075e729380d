//! Image processing: decode, shrink-to-fit, re-encode, EXIF tags.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **EXIF tags** | `kamadak-exif` (IFD0 + Exif + GPS) |
//! | **Decode** | `image::load_from_memory`, once per upload |
//! | **Resize → WebP** | Lanczos3 + lossy libwebp encode (`webp` crate) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{
    BackendError, Dimensions, EncodedImage, ExifTags, GeoLocation, ImageBackend,
};
pub use calculations::{fit_within, fits};
pub use operations::{
    GeneratedVariant, VariantPlan, create_variant, decode_source, get_dimensions, plan_variants,
};
pub use params::{Bounds, OutputCodec, Quality, ResizeParams};
pub use rust_backend::RustBackend;
