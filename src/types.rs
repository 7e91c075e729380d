//! Records shared between the store, the storage layout, and callers.
//!
//! [`ImageRecord`] is persisted as `metadata.json` in each image directory and
//! returned verbatim by `get_metadata`. [`UploadManifest`] is what an upload
//! hands back to the caller.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One stored variant: where it lives and the size it was emitted at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantFile {
    /// Path relative to the storage root, e.g. `3f2a…/phone.webp`.
    pub relative_path: String,
    pub width: u32,
    pub height: u32,
}

/// Metadata for one logical image. Written once at the end of an upload and
/// never modified afterwards.
///
/// EXIF-derived fields are `None` (serialized as `null`) when the source had
/// no usable value; they are never defaulted to zero or empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: String,
    pub original_file_name: String,
    /// Size of the uploaded content in bytes.
    pub file_size: u64,
    pub content_type: String,
    pub upload_timestamp: DateTime<Utc>,
    /// EXIF `DateTimeOriginal`. EXIF carries no time zone, so this is naive.
    pub capture_timestamp: Option<NaiveDateTime>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Original pixel dimensions.
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// SHA-256 of the original bytes, lowercase hex.
    pub checksum: String,
    pub original_relative_path: String,
    /// Variant name → stored file.
    pub variants: BTreeMap<String, VariantFile>,
}

impl ImageRecord {
    /// A record with only the upload-time fields set.
    pub fn new(original_file_name: impl Into<String>, upload_timestamp: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            original_file_name: original_file_name.into(),
            file_size: 0,
            content_type: String::new(),
            upload_timestamp,
            capture_timestamp: None,
            camera_make: None,
            camera_model: None,
            latitude: None,
            longitude: None,
            width: None,
            height: None,
            checksum: String::new(),
            original_relative_path: String::new(),
            variants: BTreeMap::new(),
        }
    }
}

/// Returned from a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadManifest {
    pub id: String,
    pub original_file_name: String,
    /// Variant name → caller-facing retrieval reference.
    pub variant_urls: BTreeMap<String, String>,
    pub metadata_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> ImageRecord {
        let mut record = ImageRecord::new(
            "holiday.jpg",
            Utc.with_ymd_and_hms(2024, 3, 9, 8, 0, 0).unwrap(),
        );
        record.id = "abc123".into();
        record.file_size = 2048;
        record.content_type = "image/jpeg".into();
        record.original_relative_path = "abc123/original.jpg".into();
        record.variants.insert(
            "phone".into(),
            VariantFile {
                relative_path: "abc123/phone.webp".into(),
                width: 640,
                height: 480,
            },
        );
        record
    }

    #[test]
    fn record_uses_camel_case_keys() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["originalFileName"], "holiday.jpg");
        assert_eq!(json["fileSize"], 2048);
        assert_eq!(json["originalRelativePath"], "abc123/original.jpg");
        assert_eq!(json["variants"]["phone"]["relativePath"], "abc123/phone.webp");
    }

    #[test]
    fn missing_exif_serializes_as_null() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json["cameraMake"].is_null());
        assert!(json["captureTimestamp"].is_null());
        assert!(json["latitude"].is_null());
    }

    #[test]
    fn record_survives_json() {
        let record = sample();
        let json = serde_json::to_string(&record).unwrap();
        let back: ImageRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
