use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// SHA-256 of a collection file's bytes, used to detect writes by other sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision(String);

impl Revision {
    pub fn of(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Missing,
    Empty,
    Loaded,
    Corrupt(String),
}

#[derive(Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub outcome: LoadOutcome,
    pub revision: Option<Revision>,
}

/// Reads a collection file. Missing, blank and unparseable files all yield `default`; only real
/// I/O failures are returned as errors.
pub fn load<T: DeserializeOwned>(path: &Path, default: T) -> Result<Loaded<T>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(Loaded {
                value: default,
                outcome: LoadOutcome::Missing,
                revision: None,
            })
        }
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let revision = Some(Revision::of(&bytes));
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Loaded {
            value: default,
            outcome: LoadOutcome::Empty,
            revision,
        });
    }

    match serde_json::from_slice::<T>(&bytes) {
        Ok(value) => Ok(Loaded {
            value,
            outcome: LoadOutcome::Loaded,
            revision,
        }),
        Err(e) => Ok(Loaded {
            value: default,
            outcome: LoadOutcome::Corrupt(e.to_string()),
            revision,
        }),
    }
}

/// Revision of whatever is on disk right now, without decoding it.
pub fn current_revision(path: &Path) -> Result<Option<Revision>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(Revision::of(&bytes))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes a full snapshot: temp file, fsync, rename. The live file is either the old snapshot or
/// the new one, never a truncated mix.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<Revision, StoreError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StoreError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp = sibling(path, "tmp");
    let written = write_synced(&tmp, &bytes).and_then(|_| fs::rename(&tmp, path));
    if let Err(source) = written {
        let _ = fs::remove_file(&tmp);
        return Err(StoreError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(Revision::of(&bytes))
}

/// Copies a damaged collection file aside before it gets overwritten.
pub fn preserve_corrupt(path: &Path) -> Result<Option<PathBuf>, StoreError> {
    if !path.is_file() {
        return Ok(None);
    }
    let dst = sibling(path, "corrupt");
    fs::copy(path, &dst).map_err(|source| StoreError::Write {
        path: dst.clone(),
        source,
    })?;
    Ok(Some(dst))
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut f = File::create(path)?;
    f.write_all(bytes)?;
    f.sync_all()
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
