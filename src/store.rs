//! The image store: upload, retrieve, delete.
//!
//! [`ImageStore`] composes validation, metadata extraction, variant generation
//! and a [`StorageLayout`]. An upload moves through these states:
//!
//! ```text
//! Validate ─► GenerateId ─► CreateDirectory ─► ExtractMetadata ─► PersistOriginal
//!          ─► GenerateVariants (parallel) ─► PersistMetadata ─► Completed
//!                     any failure after CreateDirectory ─► cleanup ─► Failed
//! ```
//!
//! Validation runs before anything touches disk. The upload is decoded once;
//! variants are then generated on the rayon pool, one job per configured
//! variant, each resizing the same borrowed decoded image into its own buffer. The metadata record is written only after every variant it
//! references is on disk, which makes `metadata.json` the commit marker: an
//! image directory without one is an incomplete upload and
//! [`ImageStore::sweep_incomplete`] may remove it.
//!
//! A failing variant fails the whole upload. The store then makes one
//! best-effort attempt to remove the directory; if that fails too, the sweep
//! picks it up later.

use crate::config::StoreConfig;
use crate::imaging::{
    BackendError, ImageBackend, OutputCodec, Quality, RustBackend, create_variant, decode_source,
    plan_variants,
};
use crate::metadata::{self, ExtractionOutcome};
use crate::storage::{FsLayout, StorageError, StorageLayout};
use crate::types::{ImageRecord, UploadManifest, VariantFile};
use crate::validation::{UploadLimits, content_type_for_extension, extension_of, is_admissible};
use chrono::Utc;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error("Could not encode variant: {0}")]
    Encode(String),
    #[error("Corrupt metadata record: {0}")]
    CorruptRecord(String),
    #[error("Storage IO error: {0}")]
    StorageIo(#[from] std::io::Error),
}

impl StoreError {
    /// Whether the caller caused this error (bad file, bad name, unknown variant).
    pub fn is_client_error(&self) -> bool {
        matches!(self, StoreError::InvalidInput(_) | StoreError::Decode(_))
    }

    /// Message safe to hand back to the caller.
    ///
    /// Server-side failures collapse to a fixed string; the details only go
    /// to the log.
    pub fn public_message(&self) -> String {
        match self {
            StoreError::InvalidInput(msg) => msg.clone(),
            StoreError::Decode(_) => "the uploaded file is not a supported image".to_string(),
            StoreError::NotFound(_) => "image not found".to_string(),
            StoreError::Encode(_) | StoreError::CorruptRecord(_) | StoreError::StorageIo(_) => {
                "internal storage error".to_string()
            }
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidId(id) => {
                StoreError::InvalidInput(format!("invalid identifier {id:?}"))
            }
            StorageError::NotFound(what) => StoreError::NotFound(what),
            StorageError::CorruptRecord { id, source } => {
                StoreError::CorruptRecord(format!("{id}: {source}"))
            }
            StorageError::AlreadyExists(id) => StoreError::StorageIo(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("image directory {id} already exists"),
            )),
            StorageError::Io(e) => StoreError::StorageIo(e),
        }
    }
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Decode(msg) | BackendError::Tags(msg) => StoreError::Decode(msg),
            BackendError::Encode(msg) => StoreError::Encode(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Upload, retrieval and deletion of images over a storage layout.
pub struct ImageStore<B: ImageBackend, L: StorageLayout> {
    config: StoreConfig,
    limits: UploadLimits,
    backend: B,
    layout: L,
}

impl ImageStore<RustBackend, FsLayout> {
    /// A store on the local filesystem at `config.storage_root`.
    pub fn open(config: StoreConfig) -> Self {
        let layout = FsLayout::new(config.storage_root());
        Self::new(config, RustBackend::new(), layout)
    }
}

impl<B: ImageBackend, L: StorageLayout> ImageStore<B, L> {
    pub fn new(config: StoreConfig, backend: B, layout: L) -> Self {
        let limits = config.upload_limits();
        Self {
            config,
            limits,
            backend,
            layout,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// Store an upload and all its variants.
    ///
    /// `content_type` is the caller's declared type; when absent it is
    /// derived from the file extension.
    pub fn upload(
        &self,
        bytes: &[u8],
        file_name: &str,
        content_type: Option<&str>,
    ) -> Result<UploadManifest> {
        self.check_admissible(bytes, file_name)?;

        let start = Instant::now();
        let id = Uuid::new_v4().simple().to_string();
        self.layout.create_directory(&id)?;

        match self.persist(&id, bytes, file_name, content_type) {
            Ok(manifest) => {
                tracing::info!(
                    id = %id,
                    file = file_name,
                    size_bytes = bytes.len(),
                    variants = manifest.variant_urls.len(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "upload completed"
                );
                Ok(manifest)
            }
            Err(e) => {
                tracing::warn!(id = %id, file = file_name, error = %e, "upload failed");
                if let Err(cleanup) = self.layout.delete(&id) {
                    tracing::warn!(id = %id, error = %cleanup, "cleanup of failed upload failed");
                }
                Err(e)
            }
        }
    }

    fn check_admissible(&self, bytes: &[u8], file_name: &str) -> Result<()> {
        if bytes.is_empty() {
            return Err(StoreError::InvalidInput("no file uploaded".into()));
        }
        let size = bytes.len() as u64;
        if is_admissible(file_name, size, &self.limits) {
            return Ok(());
        }
        if size > self.limits.max_bytes {
            return Err(StoreError::InvalidInput(format!(
                "file is {size} bytes, the limit is {} bytes",
                self.limits.max_bytes
            )));
        }
        Err(StoreError::InvalidInput(format!(
            "file type not allowed; accepted extensions: {}",
            self.limits.allowed_extensions.join(", ")
        )))
    }

    fn persist(
        &self,
        id: &str,
        bytes: &[u8],
        file_name: &str,
        content_type: Option<&str>,
    ) -> Result<UploadManifest> {
        let extension = extension_of(file_name)
            .ok_or_else(|| StoreError::InvalidInput("file name has no extension".into()))?;

        let extraction = metadata::extract(&self.backend, bytes, file_name, Utc::now());
        if extraction.outcome == ExtractionOutcome::Empty {
            tracing::debug!(id, "no EXIF metadata");
        }
        let mut record = extraction.record;
        record.id = id.to_string();
        record.file_size = bytes.len() as u64;
        record.content_type = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| content_type_for_extension(&extension))
            .to_string();
        record.checksum = format!("{:x}", Sha256::digest(bytes));
        record.original_relative_path = self.layout.write_original(id, bytes, &extension)?;

        record.variants = self.generate_variants(id, bytes)?;
        self.layout.write_metadata(id, &record)?;

        Ok(self.manifest(&record))
    }

    /// Decode once, then generate and write every configured variant in parallel.
    fn generate_variants(&self, id: &str, bytes: &[u8]) -> Result<BTreeMap<String, VariantFile>> {
        let source = decode_source(&self.backend, bytes)?;
        let quality = Quality::new(self.config.quality);
        plan_variants(&self.config.variants, quality)
            .par_iter()
            .map(|plan| -> Result<(String, VariantFile)> {
                let start = Instant::now();
                let variant = create_variant(&self.backend, &source, plan)?;
                let relative_path = self
                    .layout
                    .write_variant(id, &variant.name, &variant.image.bytes)?;
                tracing::debug!(
                    id,
                    variant = %variant.name,
                    size_bytes = variant.image.bytes.len(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "variant written"
                );
                Ok((
                    variant.name,
                    VariantFile {
                        relative_path,
                        width: variant.image.width,
                        height: variant.image.height,
                    },
                ))
            })
            .collect()
    }

    fn manifest(&self, record: &ImageRecord) -> UploadManifest {
        UploadManifest {
            id: record.id.clone(),
            original_file_name: record.original_file_name.clone(),
            variant_urls: record
                .variants
                .keys()
                .map(|name| (name.clone(), self.config.variant_url(&record.id, name)))
                .collect(),
            metadata_url: self.config.metadata_url(&record.id),
        }
    }

    /// Bytes of one variant and its MIME type.
    ///
    /// Unconfigured variant names are rejected before storage is consulted.
    pub fn get_variant(&self, id: &str, variant: &str) -> Result<(Vec<u8>, &'static str)> {
        if !self.config.variants.contains_key(variant) {
            return Err(StoreError::InvalidInput(format!(
                "unknown variant {variant:?}"
            )));
        }
        let bytes = self.layout.read_variant(id, variant)?;
        Ok((bytes, OutputCodec::default().mime_type()))
    }

    pub fn get_metadata(&self, id: &str) -> Result<ImageRecord> {
        Ok(self.layout.read_metadata(id)?)
    }

    /// The original upload and its recorded content type.
    pub fn get_original(&self, id: &str) -> Result<(Vec<u8>, String)> {
        let record = self.layout.read_metadata(id)?;
        let extension = extension_of(&record.original_relative_path).ok_or_else(|| {
            StoreError::CorruptRecord(format!("{id}: original path has no extension"))
        })?;
        let bytes = self.layout.read_original(id, &extension)?;
        Ok((bytes, record.content_type))
    }

    /// Remove an image and everything stored for it. `false` if it did not exist.
    pub fn delete_image(&self, id: &str) -> Result<bool> {
        Ok(self.layout.delete(id)?)
    }

    /// Identifiers of completed uploads.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for id in self.layout.list_ids()? {
            if self.layout.has_metadata(&id)? {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Remove image directories that never received a metadata record.
    ///
    /// An upload in flight has no record yet either, so only run this when no
    /// uploads are in progress against the same storage root.
    pub fn sweep_incomplete(&self) -> Result<usize> {
        let mut removed = 0;
        for id in self.layout.list_ids()? {
            if self.layout.has_metadata(&id)? {
                continue;
            }
            if self.layout.delete(&id)? {
                tracing::info!(id = %id, "removed incomplete upload");
                removed += 1;
            }
        }
        Ok(removed)
    }
}
