//! Writing and re-reading JSON documents

use crate::snapshot::Document;
use serde::{de::DeserializeOwned, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Refusing to overwrite existing file {0}")]
    AlreadyExists(PathBuf),

    #[error("Cannot create directory {0}: {1}")]
    CreateDirectory(PathBuf, io::Error),

    #[error("I/O error on {0}: {1}")]
    Io(PathBuf, io::Error),

    #[error("Invalid JSON in {0}: {1}")]
    Json(PathBuf, serde_json::Error),

    #[error("Failed to serialize {0}: {1}")]
    Serialize(&'static str, serde_json::Error),

    #[error("{kind} at {path} holds {found} records, expected {expected}")]
    CountMismatch {
        kind: &'static str,
        path: PathBuf,
        expected: usize,
        found: usize,
    },
}

/// Output formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Single line, no whitespace
    Compact,

    /// Indented by four spaces
    Pretty,
}

pub fn to_json_bytes<T: Serialize>(value: &T, layout: Layout) -> serde_json::Result<Vec<u8>> {
    match layout {
        Layout::Compact => serde_json::to_vec(value),
        Layout::Pretty => {
            let mut buf = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
            let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
            value.serialize(&mut serializer)?;
            Ok(buf)
        }
    }
}

/// Write a document to a fresh file.
/// The data is first written to a `.partial` sibling and linked into place
/// once flushed, so a failed write never leaves a truncated document behind
/// and a file that appears at `path` meanwhile is never replaced.
pub async fn write_document<D: Document>(
    path: &Path,
    document: &D,
    layout: Layout,
) -> Result<(), PersistError> {
    if path.exists() {
        return Err(PersistError::AlreadyExists(path.to_path_buf()));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PersistError::CreateDirectory(parent.to_path_buf(), e))?;
    }

    let bytes = to_json_bytes(document, layout).map_err(|e| PersistError::Serialize(D::KIND, e))?;
    let tmp_path = path.with_extension("partial");

    let written = async {
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await
    }
    .await;

    match written {
        Ok(()) => publish(&tmp_path, path).await?,
        Err(e) => {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(PersistError::Io(path.to_path_buf(), e));
        }
    }

    info!("Saved {} to {}", D::KIND, path.display());
    Ok(())
}

/// Move a finished `.partial` file to `path`, failing if `path` exists.
/// The partial file is removed either way.
async fn publish(tmp_path: &Path, path: &Path) -> Result<(), PersistError> {
    let linked = tokio::fs::hard_link(tmp_path, path).await;
    if let Err(e) = tokio::fs::remove_file(tmp_path).await {
        warn!("Failed to remove {}: {e}", tmp_path.display());
    }

    match linked {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            Err(PersistError::AlreadyExists(path.to_path_buf()))
        }
        Err(e) => Err(PersistError::Io(path.to_path_buf(), e)),
    }
}

pub async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, PersistError> {
    let data = tokio::fs::read(path).await.map_err(|e| PersistError::Io(path.to_path_buf(), e))?;
    serde_json::from_slice(&data).map_err(|e| PersistError::Json(path.to_path_buf(), e))
}

/// Write a document, read it back, and check the persisted record count.
/// Returns the document as it was read from disk.
pub async fn write_verified<D: Document>(
    path: &Path,
    document: &D,
    layout: Layout,
    expected: usize,
) -> Result<D, PersistError> {
    write_document(path, document, layout).await?;

    let persisted: D = read_document(path).await?;
    let found = persisted.record_count();
    if found != expected {
        return Err(PersistError::CountMismatch {
            kind: D::KIND,
            path: path.to_path_buf(),
            expected,
            found,
        });
    }

    info!("Verified {found} records in {}", path.display());
    Ok(persisted)
}
