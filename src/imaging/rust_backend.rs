//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, WebP) | `image::load_from_memory` (format sniffed from bytes) |
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3`, target from [`fit_within`] |
//! | Encode → WebP | `webp::Encoder` (libwebp, lossy at the requested quality) |
//! | EXIF tags | `kamadak-exif` (`exif::Reader::read_from_container`) |

use super::backend::{BackendError, Dimensions, EncodedImage, ExifTags, GeoLocation, ImageBackend};
use super::calculations::fit_within;
use super::params::{OutputCodec, Quality, ResizeParams};
use chrono::{NaiveDate, NaiveDateTime};
use exif::{In, Tag, Value};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` and `kamadak-exif` crates.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode an image from memory, sniffing the format from its magic bytes.
fn load_image(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))
}

fn encode(img: &DynamicImage, codec: OutputCodec, quality: Quality) -> Result<Vec<u8>, BackendError> {
    match codec {
        OutputCodec::WebP => encode_webp(img, quality),
    }
}

/// Lossy WebP. libwebp only takes 8-bit RGB(A), so 16-bit and palette
/// sources are normalized first; alpha survives only if the source has it.
fn encode_webp(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let (width, height) = (img.width(), img.height());
    let quality = quality.value() as f32;
    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), width, height).encode_simple(false, quality)
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode_simple(false, quality)
    };
    encoded
        .map(|memory| memory.to_vec())
        .map_err(|e| BackendError::Encode(format!("WebP encode failed: {e:?}")))
}

impl ImageBackend for RustBackend {
    type Decoded = DynamicImage;

    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("Failed to read dimensions: {e}")))?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        load_image(bytes)
    }

    fn resize(
        &self,
        source: &DynamicImage,
        params: &ResizeParams,
    ) -> Result<EncodedImage, BackendError> {
        let size = (source.width(), source.height());
        let (width, height) = fit_within(size, params.bounds);

        let resized;
        let frame = if (width, height) == size {
            source
        } else {
            resized = source.resize_exact(width, height, FilterType::Lanczos3);
            &resized
        };

        Ok(EncodedImage {
            bytes: encode(frame, params.codec, params.quality)?,
            width,
            height,
        })
    }

    fn read_tags(&self, bytes: &[u8]) -> Result<ExifTags, BackendError> {
        let exif = exif::Reader::new()
            .read_from_container(&mut Cursor::new(bytes))
            .map_err(|e| BackendError::Tags(e.to_string()))?;

        let location = match (
            read_coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, "S", 90.0),
            read_coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, "W", 180.0),
        ) {
            (Some(latitude), Some(longitude)) => Some(GeoLocation {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Ok(ExifTags {
            make: read_ascii(&exif, Tag::Make),
            model: read_ascii(&exif, Tag::Model),
            captured_at: read_datetime(&exif, Tag::DateTimeOriginal),
            location,
        })
    }
}

/// First ASCII component of a tag, trimmed. Empty strings count as absent.
fn read_ascii(exif: &exif::Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|v| String::from_utf8_lossy(v).trim_matches(char::from(0)).trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn read_datetime(exif: &exif::Exif, tag: Tag) -> Option<NaiveDateTime> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let Value::Ascii(parts) = &field.value else {
        return None;
    };
    let dt = exif::DateTime::from_ascii(parts.first()?).ok()?;
    NaiveDate::from_ymd_opt(dt.year.into(), dt.month.into(), dt.day.into())?.and_hms_opt(
        dt.hour.into(),
        dt.minute.into(),
        dt.second.into(),
    )
}

/// Read a GPS degrees/minutes/seconds triple plus its hemisphere reference
/// as signed decimal degrees.
fn read_coordinate(
    exif: &exif::Exif,
    value_tag: Tag,
    ref_tag: Tag,
    negative_ref: &str,
    limit: f64,
) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let Value::Rational(dms) = &field.value else {
        return None;
    };
    let degrees = dms_to_decimal(dms)?;
    let hemisphere = read_ascii(exif, ref_tag)?;
    let signed = if hemisphere.eq_ignore_ascii_case(negative_ref) {
        -degrees
    } else {
        degrees
    };
    (signed.abs() <= limit).then_some(signed)
}

fn dms_to_decimal(dms: &[exif::Rational]) -> Option<f64> {
    if dms.len() < 3 {
        return None;
    }
    let value = dms[0].to_f64() + dms[1].to_f64() / 60.0 + dms[2].to_f64() / 3600.0;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Bounds;
    use crate::test_helpers::{
        ExifFixture, jpeg_bytes, jpeg_with_exif, photo_jpeg_bytes, png_rgba_bytes,
    };

    fn resize_bytes(bytes: &[u8], params: &ResizeParams) -> EncodedImage {
        let backend = RustBackend::new();
        let source = backend.decode(bytes).unwrap();
        backend.resize(&source, params).unwrap()
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let backend = RustBackend::new();
        let dims = backend.identify(&jpeg_bytes(200, 150)).unwrap();
        assert_eq!(dims, Dimensions { width: 200, height: 150 });
    }

    #[test]
    fn identify_garbage_errors() {
        let backend = RustBackend::new();
        let result = backend.identify(b"definitely not an image");
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn resize_shrinks_into_bounds_as_webp() {
        let out = resize_bytes(
            &jpeg_bytes(400, 300),
            &ResizeParams::fit_within(Bounds::new(200, 200)),
        );

        assert_eq!((out.width, out.height), (200, 150));
        assert_eq!(&out.bytes[0..4], b"RIFF");
        assert_eq!(&out.bytes[8..12], b"WEBP");

        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 150));
    }

    #[test]
    fn resize_never_upscales() {
        let out = resize_bytes(
            &jpeg_bytes(120, 90),
            &ResizeParams::fit_within(Bounds::new(1920, 1080)),
        );
        assert_eq!((out.width, out.height), (120, 90));
    }

    #[test]
    fn one_decode_serves_every_variant() {
        let backend = RustBackend::new();
        let source = backend.decode(&jpeg_bytes(400, 300)).unwrap();

        let small = backend
            .resize(&source, &ResizeParams::fit_within(Bounds::new(100, 100)))
            .unwrap();
        let large = backend
            .resize(&source, &ResizeParams::fit_within(Bounds::new(1000, 1000)))
            .unwrap();

        assert_eq!((small.width, small.height), (100, 75));
        assert_eq!((large.width, large.height), (400, 300));
        assert_eq!((source.width(), source.height()), (400, 300));
    }

    #[test]
    fn lower_quality_encodes_smaller() {
        let backend = RustBackend::new();
        let source = backend.decode(&photo_jpeg_bytes(400, 300)).unwrap();
        let params = ResizeParams::fit_within(Bounds::new(400, 300));

        let low = backend.resize(&source, &params.with_quality(Quality::new(30))).unwrap();
        let high = backend.resize(&source, &params.with_quality(Quality::new(95))).unwrap();
        assert!(
            low.bytes.len() < high.bytes.len(),
            "q30 {} bytes, q95 {} bytes",
            low.bytes.len(),
            high.bytes.len()
        );
    }

    #[test]
    fn resize_keeps_alpha_sources_decodable() {
        let out = resize_bytes(
            &png_rgba_bytes(300, 600),
            &ResizeParams::fit_within(Bounds::new(640, 480)),
        );
        assert_eq!((out.width, out.height), (240, 480));
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert!(decoded.color().has_alpha());
    }

    #[test]
    fn decode_garbage_is_decode_error() {
        let backend = RustBackend::new();
        let result = backend.decode(b"GIF89a-truncated");
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn read_tags_without_exif_errors() {
        let backend = RustBackend::new();
        assert!(backend.read_tags(&jpeg_bytes(64, 48)).is_err());
    }

    #[test]
    fn read_tags_full_block() {
        let backend = RustBackend::new();
        let bytes = jpeg_with_exif(64, 48, &ExifFixture::acme_x1());
        let tags = backend.read_tags(&bytes).unwrap();

        assert_eq!(tags.make.as_deref(), Some("Acme"));
        assert_eq!(tags.model.as_deref(), Some("X1"));
        assert_eq!(
            tags.captured_at.map(|t| t.to_string()).as_deref(),
            Some("2023-06-01 12:30:45")
        );
        let location = tags.location.unwrap();
        // 52° 30' 0" N, 13° 24' 36" W
        assert!((location.latitude - 52.5).abs() < 1e-9);
        assert!((location.longitude + 13.41).abs() < 1e-9);
    }

    #[test]
    fn read_tags_camera_only_has_no_location() {
        let backend = RustBackend::new();
        let fixture = ExifFixture {
            gps: None,
            captured_at: None,
            ..ExifFixture::acme_x1()
        };
        let tags = backend.read_tags(&jpeg_with_exif(32, 32, &fixture)).unwrap();
        assert_eq!(tags.model.as_deref(), Some("X1"));
        assert!(tags.location.is_none());
        assert!(tags.captured_at.is_none());
    }

    #[test]
    fn dms_conversion() {
        let dms = [
            exif::Rational { num: 40, denom: 1 },
            exif::Rational { num: 30, denom: 1 },
            exif::Rational { num: 36, denom: 1 },
        ];
        assert!((dms_to_decimal(&dms).unwrap() - 40.51).abs() < 1e-9);
        assert_eq!(dms_to_decimal(&dms[..2]), None);
    }

    #[test]
    fn dms_zero_denominator_is_rejected() {
        let dms = [
            exif::Rational { num: 40, denom: 0 },
            exif::Rational { num: 0, denom: 1 },
            exif::Rational { num: 0, denom: 1 },
        ];
        assert_eq!(dms_to_decimal(&dms), None);
    }
}
