use crate::embed;
use crate::error::{Result, VizError};
use crate::OutputFormat;
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Flat directory of rendered artifacts named `viz_<8 hex>.<ext>`.
///
/// The store only ever creates files. Existing artifacts are never overwritten or removed.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Open (creating if needed) the output directory and pin its absolute path.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| VizError::ArtifactWrite {
            path: dir.to_path_buf(),
            source,
        })?;
        let dir = std::fs::canonicalize(dir).map_err(|source| VizError::ArtifactWrite {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` under a fresh name and return the absolute path.
    ///
    /// The bytes land in a temporary file first and are linked into place only once
    /// fully written, so callers never observe a partial artifact. A name that already
    /// exists is reported as an error rather than replaced.
    pub fn persist(&self, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(generate_filename(OutputFormat::Png));
        let write_err = |source| VizError::ArtifactWrite {
            path: path.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist_noclobber(&path)
            .map_err(|e| write_err(e.error))?;

        info!("Saved visualization {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Path of an existing artifact named by a reference, or `None`.
    /// Names outside the reference grammar never resolve.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        if !embed::is_valid_filename(filename) {
            return None;
        }
        let path = self.dir.join(filename);
        path.is_file().then_some(path)
    }
}

/// `viz_` + first 8 hex chars of a v4 UUID + extension.
pub fn generate_filename(format: OutputFormat) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("viz_{}.{}", &id[..8], format.extension())
}
