//! File-backed persistence for the collection pipeline's boundary state.
//!
//! The pipeline core never touches disk; this crate owns the seen-fingerprint
//! snapshot on either side of a run plus the atomic-write primitive the run
//! reports go through.

use std::path::{Path, PathBuf};

use anyhow::Context;
use closer_core::SeenFingerprintSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

pub const CRATE_NAME: &str = "closer-storage";

/// On-disk schema version for the seen-set file.
pub const SEEN_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SeenStoreError {
    #[error("unsupported seen-set schema version {0} (expected {SEEN_SCHEMA_VERSION})")]
    UnsupportedSchema(u32),
}

#[derive(Debug, Serialize, Deserialize)]
struct SeenSetFile {
    schema_version: u32,
    fingerprints: SeenFingerprintSet,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Write bytes via a temp file + rename so readers never observe a partial
/// file, and a crashed run never corrupts the previous snapshot.
pub async fn write_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> anyhow::Result<()> {
    let path = path.as_ref();
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&parent)
        .await
        .with_context(|| format!("creating directory {}", parent.display()))?;

    let temp_path = parent.join(format!(".{}.tmp", Uuid::new_v4()));
    let mut file = fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&temp_path)
        .await
        .with_context(|| format!("opening temp file {}", temp_path.display()))?;
    file.write_all(bytes)
        .await
        .with_context(|| format!("writing temp file {}", temp_path.display()))?;
    file.flush()
        .await
        .with_context(|| format!("flushing temp file {}", temp_path.display()))?;
    drop(file);

    if let Err(err) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(err)
            .with_context(|| format!("renaming {} -> {}", temp_path.display(), path.display()));
    }
    Ok(())
}

/// Persisted set of fingerprints from all prior accepted records.
///
/// The store loads a snapshot before a run and persists the updated set
/// after; serializing concurrent runs' merges is the caller's discipline
/// (single writer), the store itself only guarantees atomic replacement.
#[derive(Debug, Clone)]
pub struct SeenSetStore {
    path: PathBuf,
}

impl SeenSetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the seen set. A missing file is an empty set (first run), a
    /// present-but-unreadable file is an error: silently starting from
    /// empty would re-emit every previously seen posting.
    pub async fn load(&self) -> anyhow::Result<SeenFingerprintSet> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no seen-set file yet, starting empty");
                return Ok(SeenFingerprintSet::new());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("reading seen set {}", self.path.display()))
            }
        };

        let file: SeenSetFile = serde_json::from_str(&text)
            .with_context(|| format!("parsing seen set {}", self.path.display()))?;
        if file.schema_version != SEEN_SCHEMA_VERSION {
            return Err(SeenStoreError::UnsupportedSchema(file.schema_version).into());
        }
        Ok(file.fingerprints)
    }

    pub async fn persist(&self, seen: &SeenFingerprintSet) -> anyhow::Result<()> {
        let file = SeenSetFile {
            schema_version: SEEN_SCHEMA_VERSION,
            fingerprints: seen.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&file).context("serializing seen set")?;
        write_atomic(&self.path, &bytes)
            .await
            .with_context(|| format!("persisting seen set {}", self.path.display()))?;
        debug!(path = %self.path.display(), fingerprints = seen.len(), "persisted seen set");
        Ok(())
    }
}
