/// Snapshot persistence.
///
/// The snapshot is written as indented JSON with typed scalars tagged (see
/// `tagged`). A run replaces the previous file wholesale; the new document
/// is written next to the target and renamed over it so readers never see
/// a half-written snapshot.

pub mod tagged;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::logging::{self, DataSource};
use crate::model::Snapshot;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid snapshot JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        StorageError::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Writes the snapshot to `path`, replacing any previous snapshot.
///
/// On failure the staging file is removed and any previous snapshot at
/// `path` is left untouched.
pub fn write_snapshot(path: impl AsRef<Path>, snapshot: &Snapshot) -> Result<(), StorageError> {
    let path = path.as_ref();
    let staging = staging_path(path);

    if let Err(e) = write_staged(path, &staging, snapshot) {
        if staging.exists() {
            let _ = fs::remove_file(&staging);
        }
        logging::error(DataSource::Storage, None, &format!("Snapshot not written: {}", e));
        return Err(e);
    }

    logging::debug(
        DataSource::Storage,
        None,
        &format!("Wrote {} site(s) to {}", snapshot.len(), path.display()),
    );
    Ok(())
}

fn write_staged(path: &Path, staging: &Path, snapshot: &Snapshot) -> Result<(), StorageError> {
    let file = File::create(staging).map_err(|e| StorageError::io(staging, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, snapshot).map_err(|e| StorageError::json(path, e))?;
    writer.write_all(b"\n").map_err(|e| StorageError::io(staging, e))?;
    writer.flush().map_err(|e| StorageError::io(staging, e))?;
    drop(writer);

    fs::rename(staging, path).map_err(|e| StorageError::io(path, e))
}

/// Reads a snapshot written by `write_snapshot`.
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<Snapshot, StorageError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| StorageError::json(path, e))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
