//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the capability boundary between the store and
//! whatever library does the pixel and tag work:
//!
//! | Operation | Capability |
//! |---|---|
//! | `identify` | read the header far enough to know the dimensions |
//! | `decode` | decode the full raster once per upload |
//! | `resize` | shrink-to-fit a decoded source, re-encode in the output codec |
//! | `read_tags` | read the IFD0 / Exif / GPS tag directories |
//!
//! Nothing here touches the filesystem. A decoded source is immutable and
//! `Sync`, so every variant job borrows the same one and resizes into its own
//! buffer.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::ResizeParams;
use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Tag read failed: {0}")]
    Tags(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A re-encoded variant and the size it was emitted at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Signed decimal-degree coordinates (south and west are negative).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// The EXIF fields the store cares about.
///
/// Field sources:
/// - `make`, `model`: IFD0 (`Make` 0x010F, `Model` 0x0110)
/// - `captured_at`: Exif sub-IFD (`DateTimeOriginal` 0x9003)
/// - `location`: GPS IFD, only when both latitude and longitude resolve
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifTags {
    pub make: Option<String>,
    pub model: Option<String>,
    pub captured_at: Option<NaiveDateTime>,
    pub location: Option<GeoLocation>,
}

impl ExifTags {
    pub fn is_empty(&self) -> bool {
        self.make.is_none()
            && self.model.is_none()
            && self.captured_at.is_none()
            && self.location.is_none()
    }
}

/// Trait for image processing backends.
///
/// `Sync` because the store fans variant generation out across rayon workers
/// that all share one backend reference and one decoded source.
pub trait ImageBackend: Sync {
    /// A fully decoded source image.
    type Decoded: Sync;

    /// Get image dimensions.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode the upload bytes.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Decoded, BackendError>;

    /// Shrink `source` to fit `params.bounds` and encode it in `params.codec`.
    /// The source is left untouched.
    fn resize(
        &self,
        source: &Self::Decoded,
        params: &ResizeParams,
    ) -> Result<EncodedImage, BackendError>;

    /// Read embedded EXIF tags. Images without an EXIF block are an error here;
    /// the metadata extractor decides how to absorb it.
    fn read_tags(&self, bytes: &[u8]) -> Result<ExifTags, BackendError>;
}
