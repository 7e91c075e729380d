//! CLI output formatting.
//!
//! # Information-First Display
//!
//! The primary line for every entity is its identity (image id, variant
//! name); paths and details follow as indented context lines.
//!
//! ## Upload
//!
//! ```text
//! 3f2a9c0d4b5e4f60a1b2c3d4e5f60718 holiday.jpg
//!     desktop: /api/images/3f2a…/desktop
//!     phone: /api/images/3f2a…/phone
//!     tablet: /api/images/3f2a…/tablet
//!     metadata: /api/images/3f2a…/metadata
//! ```
//!
//! ## Metadata
//!
//! ```text
//! 3f2a9c0d4b5e4f60a1b2c3d4e5f60718 holiday.jpg
//!     Size: 2.4 MiB (image/jpeg), 2000x1500
//!     Uploaded: 2024-03-09 08:00:00 UTC
//!     Camera: Acme X1
//!     Captured: 2023-06-01 12:30:45
//!     Location: 52.500000, -13.410000
//!     Original: 3f2a…/original.jpg
//!     desktop: 1440x1080 3f2a…/desktop.webp
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::types::{ImageRecord, UploadManifest};

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count, binary units.
///
/// ```text
/// 512       → "512 B"
/// 2048      → "2.0 KiB"
/// 10485760  → "10.0 MiB"
/// ```
fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}

fn camera_line(record: &ImageRecord) -> Option<String> {
    match (record.camera_make.as_deref(), record.camera_model.as_deref()) {
        (Some(make), Some(model)) if model.starts_with(make) => Some(model.to_string()),
        (Some(make), Some(model)) => Some(format!("{make} {model}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Upload
// ============================================================================

/// Format an upload manifest: id header, one line per variant, then metadata.
pub fn format_manifest(manifest: &UploadManifest) -> Vec<String> {
    let mut lines = vec![format!("{} {}", manifest.id, manifest.original_file_name)];
    for (name, url) in &manifest.variant_urls {
        lines.push(format!("{}{}: {}", indent(1), name, url));
    }
    lines.push(format!("{}metadata: {}", indent(1), manifest.metadata_url));
    lines
}

pub fn print_manifest(manifest: &UploadManifest) {
    print_lines(format_manifest(manifest));
}

// ============================================================================
// Metadata
// ============================================================================

/// Format a stored record. Unset EXIF fields are left out.
pub fn format_record(record: &ImageRecord) -> Vec<String> {
    let mut lines = vec![format!("{} {}", record.id, record.original_file_name)];

    let mut size = format!(
        "{}Size: {} ({})",
        indent(1),
        format_size(record.file_size),
        record.content_type
    );
    if let (Some(w), Some(h)) = (record.width, record.height) {
        size.push_str(&format!(", {w}x{h}"));
    }
    lines.push(size);
    lines.push(format!(
        "{}Uploaded: {}",
        indent(1),
        record.upload_timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if let Some(camera) = camera_line(record) {
        lines.push(format!("{}Camera: {}", indent(1), camera));
    }
    if let Some(captured) = record.capture_timestamp {
        lines.push(format!(
            "{}Captured: {}",
            indent(1),
            captured.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    if let (Some(lat), Some(lon)) = (record.latitude, record.longitude) {
        lines.push(format!("{}Location: {:.6}, {:.6}", indent(1), lat, lon));
    }

    lines.push(format!(
        "{}Original: {}",
        indent(1),
        record.original_relative_path
    ));
    for (name, variant) in &record.variants {
        lines.push(format!(
            "{}{}: {}x{} {}",
            indent(1),
            name,
            variant.width,
            variant.height,
            variant.relative_path
        ));
    }
    lines
}

pub fn print_record(record: &ImageRecord) {
    print_lines(format_record(record));
}

// ============================================================================
// Maintenance
// ============================================================================

/// One id per line, followed by a count.
pub fn format_list(ids: &[String]) -> Vec<String> {
    let mut lines: Vec<String> = ids.to_vec();
    let noun = if ids.len() == 1 { "image" } else { "images" };
    lines.push(format!("{} {}", ids.len(), noun));
    lines
}

pub fn print_list(ids: &[String]) {
    print_lines(format_list(ids));
}

pub fn format_sweep(removed: usize) -> String {
    match removed {
        0 => "No incomplete uploads".to_string(),
        1 => "Removed 1 incomplete upload".to_string(),
        n => format!("Removed {n} incomplete uploads"),
    }
}
