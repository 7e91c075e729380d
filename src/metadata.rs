//! Best-effort descriptive metadata for an upload.
//!
//! [`extract`] always produces a record. It sets the original file name and
//! the upload timestamp unconditionally, then asks the backend for two things:
//!
//! - **Dimensions**: decoded original width and height.
//! - **EXIF tags**: camera make/model from IFD0, capture time from the Exif
//!   sub-IFD, signed decimal-degree coordinates from the GPS IFD.
//!
//! Either lookup may fail (no EXIF block, corrupt tags, unknown format). A
//! failure is logged at debug level and the affected fields stay `None`. The
//! caller learns which way it went from [`ExtractionOutcome`], never from an
//! error.
//!
//! Empty strings from the tag reader are treated like absent values so a
//! record never carries `""` where it means "unknown".

use crate::imaging::{ExifTags, ImageBackend, get_dimensions};
use crate::types::ImageRecord;
use chrono::{DateTime, Utc};

/// Whether any EXIF-derived field made it into the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// At least one of make, model, capture time or location was read.
    Populated,
    /// The record is valid but every EXIF-derived field is unset.
    Empty,
}

/// A partial record plus how extraction went.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: ImageRecord,
    pub outcome: ExtractionOutcome,
}

/// Build a partial [`ImageRecord`] from the upload bytes.
pub fn extract(
    backend: &impl ImageBackend,
    bytes: &[u8],
    original_file_name: &str,
    uploaded_at: DateTime<Utc>,
) -> Extraction {
    let mut record = ImageRecord::new(original_file_name, uploaded_at);

    match get_dimensions(backend, bytes) {
        Ok((width, height)) => {
            record.width = Some(width);
            record.height = Some(height);
        }
        Err(e) => {
            tracing::debug!(file = original_file_name, error = %e, "could not identify image");
        }
    }

    let tags = match backend.read_tags(bytes) {
        Ok(tags) => tags,
        Err(e) => {
            tracing::debug!(file = original_file_name, error = %e, "no usable EXIF data");
            ExifTags::default()
        }
    };

    let outcome = apply_tags(&mut record, tags);
    Extraction { record, outcome }
}

fn apply_tags(record: &mut ImageRecord, tags: ExifTags) -> ExtractionOutcome {
    let tags = ExifTags {
        make: non_empty(tags.make),
        model: non_empty(tags.model),
        ..tags
    };
    let outcome = if tags.is_empty() {
        ExtractionOutcome::Empty
    } else {
        ExtractionOutcome::Populated
    };

    record.camera_make = tags.make;
    record.camera_model = tags.model;
    record.capture_timestamp = tags.captured_at;
    if let Some(location) = tags.location {
        record.latitude = Some(location.latitude);
        record.longitude = Some(location.longitude);
    }
    outcome
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
