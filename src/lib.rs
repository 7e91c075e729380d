//! # Image Depot
//!
//! Image ingestion and storage. An upload is validated, described, resized
//! into a fixed set of variants, and written to its own directory under a
//! storage root. Variants and metadata are then served back by opaque id.
//!
//! # Architecture: Directory Per Image
//!
//! ```text
//! storage/
//! └── 3f2a9c0d4b5e4f60a1b2c3d4e5f60718/
//!     ├── original.jpg        # the upload, byte for byte
//!     ├── phone.webp          # ≤ 640×480
//!     ├── tablet.webp         # ≤ 1024×768
//!     ├── desktop.webp        # ≤ 1920×1080
//!     └── metadata.json       # written last; the image exists once this does
//! ```
//!
//! The filesystem is the database. There is no index to keep in sync: listing
//! images is listing directories, deleting an image is deleting a directory.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`validation`] | Upload admissibility (size ceiling, extension allow-list) and identifier safety |
//! | [`imaging`] | Backend trait plus the pure-Rust backend: identify, shrink-to-fit WebP, EXIF tags |
//! | [`metadata`] | Best-effort record extraction that never fails the upload |
//! | [`types`] | `ImageRecord` and `UploadManifest` |
//! | [`storage`] | `StorageLayout` trait and the filesystem layout |
//! | [`store`] | `ImageStore`: the upload state machine, retrieval, deletion, sweep |
//! | [`config`] | `depot.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Output Codec
//!
//! Every variant is WebP regardless of what was uploaded. Callers get one MIME
//! type for every variant and never have to negotiate formats. Variants are
//! encoded lossy through libwebp at the configured `quality` (75 by default),
//! so a device variant is smaller than the photo it came from.
//!
//! ## Metadata Last
//!
//! The record references every variant path, so it is written after all
//! variants. A directory without `metadata.json` is an upload that never
//! finished; `image-depot sweep` removes those.
//!
//! ## Buffered Uploads
//!
//! Uploads are capped (10 MiB by default) and held in memory. The upload is
//! decoded once and every variant job resizes from that shared, immutable
//! image, so nothing depends on re-reading a stream.

pub mod config;
pub mod imaging;
pub mod metadata;
pub mod output;
pub mod storage;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_helpers;
