//! The canonical mix slot.
//!
//! Every request encodes into its own staging file inside the uploads
//! directory, then moves it over [`CANONICAL_MIX_NAME`]. Concurrent requests
//! still overwrite each other (last writer wins), but the slot only ever
//! holds a complete file.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::{MixError, Result};

/// File name of the single shared mix output.
pub const CANONICAL_MIX_NAME: &str = "mix_ia_final.mp3";

const STAGING_PREFIX: &str = ".djmix-staging-";

/// How a mix was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MixStrategy {
    /// Analyzed, aligned and crossfaded.
    Smart,
    /// Produced by the remote mixing service.
    Remote,
    /// Local equal-weight overlay.
    Naive,
}

impl MixStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MixStrategy::Smart => "smart",
            MixStrategy::Remote => "remote",
            MixStrategy::Naive => "naive",
        }
    }
}

impl fmt::Display for MixStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A finished mix in the canonical slot.
#[derive(Debug, Clone, Serialize)]
pub struct MixArtifact {
    /// Always [`CANONICAL_MIX_NAME`].
    pub name: String,
    pub path: PathBuf,
    pub strategy: MixStrategy,
    /// Hex SHA-256 of the file contents.
    pub sha256: String,
    pub size_bytes: u64,
}

/// Path of the canonical slot in `uploads_dir`.
pub fn canonical_path(uploads_dir: &Path) -> PathBuf {
    uploads_dir.join(CANONICAL_MIX_NAME)
}

/// Request-private output file, promoted to the canonical slot on success.
///
/// Dropping an unfinished staging file deletes it.
#[derive(Debug)]
pub struct StagedMix {
    file: NamedTempFile,
    uploads_dir: PathBuf,
}

impl StagedMix {
    /// Creates an empty staging file in `uploads_dir`.
    pub fn create(uploads_dir: &Path) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(".mp3")
            .tempfile_in(uploads_dir)
            .map_err(|e| {
                MixError::io(
                    format!("Failed to create staging file in {}", uploads_dir.display()),
                    e,
                )
            })?;
        Ok(Self {
            file,
            uploads_dir: uploads_dir.to_path_buf(),
        })
    }

    /// Where strategies write their output.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Moves the staged output into the canonical slot.
    ///
    /// An empty staging file is rejected. Rename is used where possible;
    /// otherwise the file is copied and the staging file removed.
    pub fn finalize(self, strategy: MixStrategy) -> Result<MixArtifact> {
        let size_bytes = fs::metadata(self.file.path())
            .map_err(|e| MixError::io("Failed to stat staged mix", e))?
            .len();
        if size_bytes == 0 {
            return Err(MixError::compose_failed("mix output is empty"));
        }

        let sha256 = file_sha256(self.file.path())?;
        let dest = canonical_path(&self.uploads_dir);

        if let Err(persist_err) = self.file.persist(&dest) {
            log::warn!(
                "rename into {} failed ({}), copying instead",
                dest.display(),
                persist_err.error
            );
            // persist_err.file is dropped after the copy, removing the source.
            fs::copy(persist_err.file.path(), &dest)
                .map_err(|e| MixError::io(format!("Failed to write {}", dest.display()), e))?;
        }

        log::info!(
            "mix ready: {} ({}, {} bytes, sha256 {})",
            dest.display(),
            strategy,
            size_bytes,
            &sha256[..12]
        );

        Ok(MixArtifact {
            name: CANONICAL_MIX_NAME.to_string(),
            path: dest,
            strategy,
            sha256,
            size_bytes,
        })
    }
}

/// Streams a file through SHA-256.
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)
        .map_err(|e| MixError::io(format!("Failed to open {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buffer)
            .map_err(|e| MixError::io(format!("Failed to read {}", path.display()), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// True for names owned by the mixer (canonical slot or staging files).
pub fn is_mixer_file(name: &str) -> bool {
    name == CANONICAL_MIX_NAME || name.starts_with(STAGING_PREFIX)
}
