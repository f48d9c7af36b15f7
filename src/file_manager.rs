//! # File Management Module
//!
//! Questo modulo gestisce i file temporanei (scratch) su cui lavorano i driver.
//!
//! ## Responsabilità:
//! - Allocazione di nomi univoci nella scratch directory configurata
//! - Copia del file sorgente in un file temporaneo ("staging")
//! - Lettura della dimensione aggiornata dopo l'esecuzione del tool
//! - Utilità per calcoli dimensioni e percentuali
//!
//! ## Ciclo di vita dei file temporanei:
//! - Il file sorgente non viene mai modificato né cancellato
//! - Il file temporaneo appartiene al driver durante `compress()`
//! - In caso di successo il path del temporaneo è il risultato: il chiamante ne diventa proprietario
//! - In caso di fallimento il temporaneo NON viene cancellato (pulizia a carico dell'applicazione)
//!
//! ## Naming:
//! `<scratch_dir>/<sha256(nanos, pid, counter, salt)[..32]>.<ext>`
//!
//! ## Esempio:
//! ```rust,ignore
//! let store = TempFileStore::new(std::env::temp_dir().join("compressit"));
//! let staged = store.stage(Path::new("photo.png"), "png").await?;
//! println!("{} -> {} bytes", staged.path.display(), staged.size);
//! ```

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tracing::debug;

static NAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A scratch copy of a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    /// Size of the copy right after staging
    pub size: u64,
}

/// Allocates and fills scratch files under one directory
#[derive(Debug, Clone)]
pub struct TempFileStore {
    dir: PathBuf,
}

impl TempFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Allocate a fresh path with the given extension (without the dot)
    pub fn allocate(&self, extension: &str) -> PathBuf {
        self.allocate_salted(extension, b"")
    }

    fn allocate_salted(&self, extension: &str, salt: &[u8]) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let counter = NAME_COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut hasher = Sha256::new();
        hasher.update(nanos.to_le_bytes());
        hasher.update(std::process::id().to_le_bytes());
        hasher.update(counter.to_le_bytes());
        hasher.update(salt);
        let digest = hex::encode(hasher.finalize());

        self.dir.join(format!("{}.{}", &digest[..32], extension))
    }

    /// Copy `source` into a freshly allocated scratch file
    pub async fn stage(&self, source: &Path, extension: &str) -> Result<StagedFile> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.allocate_salted(extension, source.as_os_str().as_encoded_bytes());
        fs::copy(source, &path).await?;
        let size = fs::metadata(&path).await?.len();

        debug!("Staged {} -> {} ({})", source.display(), path.display(), format_size(size));
        Ok(StagedFile { path, size })
    }

    /// Overwrite a scratch file with tool output
    pub async fn replace_contents(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents).await?;
        Ok(())
    }

    /// Size of `path` from a fresh stat, or `None` if it no longer exists
    pub async fn current_size(&self, path: &Path) -> Result<Option<u64>> {
        match fs::metadata(path).await {
            Ok(metadata) => Ok(Some(metadata.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for TempFileStore {
    fn default() -> Self {
        Self::new(std::env::temp_dir().join("compressit"))
    }
}

/// Get human-readable file size
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// `round((1 - compressed / original) * 100)`, 0 for an empty original
pub fn calculate_savings(original_size: u64, compressed_size: u64) -> i64 {
    if original_size == 0 {
        0
    } else {
        ((1.0 - compressed_size as f64 / original_size as f64) * 100.0).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_allocate_unique_names() {
        let store = TempFileStore::new("/scratch");
        let a = store.allocate("png");
        let b = store.allocate("png");
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(Path::new("/scratch")));
        assert_eq!(a.extension().unwrap(), "png");
        assert_eq!(a.file_stem().unwrap().len(), 32);
    }

    #[tokio::test]
    async fn test_stage_copies_without_touching_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("input.gif");
        std::fs::write(&source, vec![7u8; 1234]).unwrap();

        let store = TempFileStore::new(dir.path().join("scratch"));
        let staged = store.stage(&source, "gif").await.unwrap();

        assert_eq!(staged.size, 1234);
        assert!(staged.path.starts_with(dir.path().join("scratch")));
        assert_eq!(std::fs::read(&staged.path).unwrap(), vec![7u8; 1234]);
        assert_eq!(std::fs::read(&source).unwrap(), vec![7u8; 1234]);
    }

    #[tokio::test]
    async fn test_replace_and_fresh_size() {
        let dir = TempDir::new().unwrap();
        let store = TempFileStore::new(dir.path());
        let path = store.allocate("png");

        assert_eq!(store.current_size(&path).await.unwrap(), None);
        store.replace_contents(&path, &[1, 2, 3]).await.unwrap();
        assert_eq!(store.current_size(&path).await.unwrap(), Some(3));
        store.replace_contents(&path, &[1]).await.unwrap();
        assert_eq!(store.current_size(&path).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_stage_missing_source_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = TempFileStore::new(dir.path());
        let err = store.stage(&dir.path().join("nope.png"), "png").await.unwrap_err();
        assert!(matches!(err, crate::error::CompressError::Io(_)));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }

    #[test]
    fn test_calculate_savings() {
        assert_eq!(calculate_savings(10_000, 6_000), 40);
        assert_eq!(calculate_savings(2048, 1800), 12);
        assert_eq!(calculate_savings(3, 2), 33);
        assert_eq!(calculate_savings(0, 0), 0);
    }
}
