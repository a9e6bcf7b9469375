//! Directory-backed storage backend.

use super::StorageBackend;
use crate::error::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Persistent backend storing one file per key under a directory.
///
/// Keys are escaped into file names (`[A-Za-z0-9-]` kept, every other byte becomes
/// `_XX`), so any string key is accepted. Writes land in a temporary file first and are
/// renamed into place, which keeps readers from observing half-written entries.
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl FileBackend {
    /// Open (and create if needed) a backend rooted at `root`.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            Error::BackendError(format!(
                "Failed to create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;

        debug!("✓ File backend opened at {}", root.display());

        Ok(FileBackend {
            root,
            tmp_counter: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(encode_key(key))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::BackendError(format!(
                "File GET failed for key {}: {}",
                key, e
            ))),
        }
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let path = self.path_for(key);
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let tmp = self.root.join(tmp_name(key, std::process::id(), n));

        fs::write(&tmp, &value)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| {
                let _ = fs::remove_file(&tmp);
                Error::BackendError(format!("File SET failed for key {}: {}", key, e))
            })?;

        trace!("file SET {} ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::BackendError(format!(
                "File REMOVE failed for key {}: {}",
                key, e
            ))),
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.path_for(key).is_file())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for dirent in fs::read_dir(&self.root)? {
            let dirent = dirent?;
            let name = dirent.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            // temp files carry a '.', which encoded keys never do
            if name.contains('.') {
                continue;
            }
            if let Some(key) = decode_key(name) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

/// Temporary file for a write; unique across processes sharing the directory.
fn tmp_name(key: &str, pid: u32, n: u64) -> String {
    format!("{}.{}.{}.tmp", encode_key(key), pid, n)
}

fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{:02X}", byte));
        }
    }
    out
}

fn decode_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'_' {
            let hex = name.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
