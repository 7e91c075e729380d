//! Shared test utilities for the image-depot test suite.
//!
//! Synthesizes fixture images in memory so no binary fixtures need to live
//! in the repository.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let plain = jpeg_bytes(2000, 1500);
//! let tagged = jpeg_with_exif(2000, 1500, &ExifFixture::acme_x1());
//! ```

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{ImageEncoder, RgbImage, RgbaImage};

// =========================================================================
// Plain images
// =========================================================================

/// A gradient JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// A JPEG with photo-like texture: smooth gradients plus fine grain, saved at
/// high quality the way a camera would.
pub fn photo_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let grain = (x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663))
            .wrapping_mul(2_654_435_761)
            >> 27;
        let shade = |base: u32| (base + grain).min(255) as u8;
        image::Rgb([
            shade(x * 200 / width.max(1)),
            shade(y * 200 / height.max(1)),
            shade((x + y) * 100 / (width + height).max(1)),
        ])
    });
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 92)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// A PNG with a real alpha channel.
pub fn png_rgba_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, 64, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .unwrap();
    out
}

// =========================================================================
// EXIF fixtures
// =========================================================================

/// EXIF content to embed in a fixture JPEG.
#[derive(Debug, Clone)]
pub struct ExifFixture {
    pub make: Option<&'static str>,
    pub model: Option<&'static str>,
    /// `YYYY:MM:DD HH:MM:SS`
    pub captured_at: Option<&'static str>,
    /// ((deg, min, sec, ref), (deg, min, sec, ref))
    pub gps: Option<((u32, u32, u32, &'static str), (u32, u32, u32, &'static str))>,
}

impl ExifFixture {
    /// "Acme X1", shot 2023-06-01 12:30:45 at 52°30'0"N 13°24'36"W.
    pub fn acme_x1() -> Self {
        Self {
            make: Some("Acme"),
            model: Some("X1"),
            captured_at: Some("2023:06:01 12:30:45"),
            gps: Some(((52, 30, 0, "N"), (13, 24, 36, "W"))),
        }
    }
}

fn ascii(tag: Tag, value: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![value.as_bytes().to_vec()]),
    }
}

fn dms(tag: Tag, d: u32, m: u32, s: u32) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(vec![
            Rational { num: d, denom: 1 },
            Rational { num: m, denom: 1 },
            Rational { num: s, denom: 1 },
        ]),
    }
}

/// Serialize the fixture as a TIFF-structured EXIF payload.
pub fn exif_payload(fixture: &ExifFixture) -> Vec<u8> {
    let mut fields = Vec::new();
    if let Some(make) = fixture.make {
        fields.push(ascii(Tag::Make, make));
    }
    if let Some(model) = fixture.model {
        fields.push(ascii(Tag::Model, model));
    }
    if let Some(ts) = fixture.captured_at {
        fields.push(ascii(Tag::DateTimeOriginal, ts));
    }
    if let Some(((lat_d, lat_m, lat_s, lat_ref), (lon_d, lon_m, lon_s, lon_ref))) = fixture.gps {
        fields.push(dms(Tag::GPSLatitude, lat_d, lat_m, lat_s));
        fields.push(ascii(Tag::GPSLatitudeRef, lat_ref));
        fields.push(dms(Tag::GPSLongitude, lon_d, lon_m, lon_s));
        fields.push(ascii(Tag::GPSLongitudeRef, lon_ref));
    }

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut buf = std::io::Cursor::new(Vec::new());
    writer.write(&mut buf, false).unwrap();
    buf.into_inner()
}

/// A JPEG with an APP1 `Exif` segment inserted right after SOI.
pub fn jpeg_with_exif(width: u32, height: u32, fixture: &ExifFixture) -> Vec<u8> {
    let jpeg = jpeg_bytes(width, height);
    assert_eq!(&jpeg[0..2], &[0xFF, 0xD8], "encoder must emit SOI first");

    let payload = exif_payload(fixture);
    let segment_len = u16::try_from(2 + 6 + payload.len()).unwrap();

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 10);
    out.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}
