//! Directory-per-image storage.
//!
//! [`StorageLayout`] is a key-value-of-files abstraction: an identifier maps
//! to one original, N variants and one metadata record. The store only talks
//! to the trait, so the filesystem implementation can be swapped for an object
//! store without touching the orchestrator.
//!
//! ## On-disk layout ([`FsLayout`])
//!
//! ```text
//! <root>/<id>/original.<ext>
//! <root>/<id>/<variant>.webp       one per configured variant
//! <root>/<id>/metadata.json        written last; the commit marker
//! ```
//!
//! Every identifier and variant name passes [`is_safe_component`] before a
//! path is built from it, so nothing can resolve outside the root.
//!
//! Files are written to a hidden temporary sibling, synced, then renamed into
//! place. A reader sees either the previous file or the complete new one.

use crate::imaging::OutputCodec;
use crate::types::ImageRecord;
use crate::validation::is_safe_component;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use walkdir::WalkDir;

pub const METADATA_FILE: &str = "metadata.json";
pub const ORIGINAL_STEM: &str = "original";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid identifier: {0:?}")]
    InvalidId(String),
    #[error("Directory already exists for {0}")]
    AlreadyExists(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Corrupt metadata for {id}: {source}")]
    CorruptRecord {
        id: String,
        source: serde_json::Error,
    },
    #[error("Storage IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Per-identifier file storage.
///
/// `Sync` because variant writes for one upload happen from several rayon
/// workers at once.
pub trait StorageLayout: Sync {
    /// Create a fresh, empty directory for `id`. Fails with
    /// [`StorageError::AlreadyExists`] if it is already there.
    fn create_directory(&self, id: &str) -> Result<()>;

    /// Write the original upload. Returns its path relative to the root.
    fn write_original(&self, id: &str, bytes: &[u8], extension: &str) -> Result<String>;

    /// Write one variant. Returns its path relative to the root.
    fn write_variant(&self, id: &str, variant: &str, bytes: &[u8]) -> Result<String>;

    /// Write the metadata record, overwriting any previous one.
    fn write_metadata(&self, id: &str, record: &ImageRecord) -> Result<()>;

    fn read_original(&self, id: &str, extension: &str) -> Result<Vec<u8>>;

    fn read_variant(&self, id: &str, variant: &str) -> Result<Vec<u8>>;

    /// Fails with [`StorageError::NotFound`] when the record is absent and
    /// [`StorageError::CorruptRecord`] when it does not parse.
    fn read_metadata(&self, id: &str) -> Result<ImageRecord>;

    /// Whether the metadata record for `id` exists.
    fn has_metadata(&self, id: &str) -> Result<bool>;

    /// Remove the whole directory for `id`. `Ok(false)` if there was none.
    fn delete(&self, id: &str) -> Result<bool>;

    /// Identifiers of every directory under the root, sorted.
    fn list_ids(&self) -> Result<Vec<String>>;
}

/// [`StorageLayout`] on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsLayout {
    root: PathBuf,
    variant_codec: OutputCodec,
}

impl FsLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            variant_codec: OutputCodec::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn image_dir(&self, id: &str) -> Result<PathBuf> {
        if !is_safe_component(id) {
            return Err(StorageError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(id))
    }

    fn variant_file_name(&self, variant: &str) -> Result<String> {
        if !is_safe_component(variant) {
            return Err(StorageError::InvalidId(variant.to_string()));
        }
        Ok(format!("{variant}.{}", self.variant_codec.extension()))
    }

    fn write_file(&self, id: &str, file_name: &str, bytes: &[u8]) -> Result<String> {
        let dir = self.image_dir(id)?;
        if !dir.is_dir() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let start = Instant::now();
        write_atomic(&dir.join(file_name), bytes)?;
        tracing::debug!(
            id,
            file = file_name,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "wrote file"
        );
        Ok(format!("{id}/{file_name}"))
    }

    fn read_file(&self, id: &str, file_name: &str) -> Result<Vec<u8>> {
        let path = self.image_dir(id)?.join(file_name);
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(format!("{id}/{file_name}")),
            _ => StorageError::Io(e),
        })
    }
}

impl StorageLayout for FsLayout {
    fn create_directory(&self, id: &str) -> Result<()> {
        let dir = self.image_dir(id)?;
        fs::create_dir_all(&self.root)?;
        fs::create_dir(&dir).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(id.to_string()),
            _ => StorageError::Io(e),
        })
    }

    fn write_original(&self, id: &str, bytes: &[u8], extension: &str) -> Result<String> {
        if !is_safe_component(extension) {
            return Err(StorageError::InvalidId(extension.to_string()));
        }
        self.write_file(id, &format!("{ORIGINAL_STEM}.{extension}"), bytes)
    }

    fn write_variant(&self, id: &str, variant: &str, bytes: &[u8]) -> Result<String> {
        let file_name = self.variant_file_name(variant)?;
        self.write_file(id, &file_name, bytes)
    }

    fn write_metadata(&self, id: &str, record: &ImageRecord) -> Result<()> {
        let json = serde_json::to_vec_pretty(record).map_err(io::Error::other)?;
        self.write_file(id, METADATA_FILE, &json)?;
        Ok(())
    }

    fn read_original(&self, id: &str, extension: &str) -> Result<Vec<u8>> {
        if !is_safe_component(extension) {
            return Err(StorageError::InvalidId(extension.to_string()));
        }
        self.read_file(id, &format!("{ORIGINAL_STEM}.{extension}"))
    }

    fn read_variant(&self, id: &str, variant: &str) -> Result<Vec<u8>> {
        let file_name = self.variant_file_name(variant)?;
        self.read_file(id, &file_name)
    }

    fn read_metadata(&self, id: &str) -> Result<ImageRecord> {
        let bytes = self.read_file(id, METADATA_FILE)?;
        serde_json::from_slice(&bytes).map_err(|source| StorageError::CorruptRecord {
            id: id.to_string(),
            source,
        })
    }

    fn has_metadata(&self, id: &str) -> Result<bool> {
        Ok(self.image_dir(id)?.join(METADATA_FILE).is_file())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let dir = self.image_dir(id)?;
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::info!(id, "deleted image directory");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_dir() {
                continue;
            }
            match entry.file_name().to_str() {
                Some(name) if is_safe_component(name) => ids.push(name.to_string()),
                _ => {}
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Write `bytes` to `path` via a synced temporary sibling and a rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    let result = (|| {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
