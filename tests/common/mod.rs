//! Fixture builders shared by the integration tests.
//!
//! Images are synthesized in memory; EXIF blocks are serialized with
//! kamadak-exif's writer and spliced into the JPEG as an APP1 segment.

#![allow(dead_code)]

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{ImageEncoder, RgbImage, RgbaImage};

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    });
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Gradients plus per-pixel grain, saved at JPEG quality 92: compresses like
/// a camera photo rather than a flat test card.
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

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, 200, (y % 256) as u8, 255])
    });
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .unwrap();
    out
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

/// A JPEG shot on an "Acme X1" with a capture time and a GPS fix.
pub fn acme_x1_jpeg(width: u32, height: u32) -> Vec<u8> {
    let fields = [
        ascii(Tag::Make, "Acme"),
        ascii(Tag::Model, "X1"),
        ascii(Tag::DateTimeOriginal, "2023:06:01 12:30:45"),
        dms(Tag::GPSLatitude, 52, 30, 0),
        ascii(Tag::GPSLatitudeRef, "N"),
        dms(Tag::GPSLongitude, 13, 24, 36),
        ascii(Tag::GPSLongitudeRef, "E"),
    ];
    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut payload = std::io::Cursor::new(Vec::new());
    writer.write(&mut payload, false).unwrap();
    let payload = payload.into_inner();

    let jpeg = jpeg_bytes(width, height);
    let segment_len = u16::try_from(2 + 6 + payload.len()).unwrap();
    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 10);
    out.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}
