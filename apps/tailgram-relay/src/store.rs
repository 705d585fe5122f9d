//! Append-only storage for the two relay logs.
//!
//! Each role maps to one flat text file under the data directory
//! (`me.log`, `them.log`). Files are created lazily so a missing log is
//! never an error, and every append is a single write on a handle
//! opened in append mode: the OS append primitive is what keeps
//! concurrent requests from interleaving partial lines, so no lock is
//! held around the store. The `them` log is normally written by an
//! external counterpart process; this store only ever appends to `me`,
//! but the primitives are role-agnostic.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

use tailgram_wire::{format_line, Role, StampedLine};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to prepare data directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("log io for {role}: {source}")]
    Log {
        role: Role,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct LogStore {
    root: PathBuf,
}

impl LogStore {
    /// Open a store rooted at `root`, creating the directory and both
    /// (empty) logs if they do not exist yet.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| StoreError::Prepare {
                path: root.clone(),
                source,
            })?;
        let store = Self { root };
        store.create_empty(Role::Mine).await?;
        store.create_empty(Role::Theirs).await?;
        Ok(store)
    }

    /// Construct without touching the filesystem; every operation still
    /// creates missing logs on first access.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, role: Role) -> PathBuf {
        self.root.join(format!("{}.log", role.wire_name()))
    }

    /// Encode `text` as a stamped line and append it. One call writes
    /// one complete line (terminator included) in a single operation.
    pub async fn append(&self, role: Role, text: &str) -> Result<StampedLine, StoreError> {
        let stamped = format_line(text, role);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(role))
            .await
            .map_err(|source| self.log_err(role, source))?;
        let mut payload = stamped.line.clone().into_bytes();
        payload.push(b'\n');
        file.write_all(&payload)
            .await
            .map_err(|source| self.log_err(role, source))?;
        file.flush()
            .await
            .map_err(|source| self.log_err(role, source))?;
        debug!(role = %role, bytes = payload.len(), "appended line");
        Ok(stamped)
    }

    /// Current byte length of the role's log; a missing log is created
    /// empty and reported as 0.
    pub async fn size(&self, role: Role) -> Result<u64, StoreError> {
        match fs::metadata(self.path(role)).await {
            Ok(meta) => Ok(meta.len()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.create_empty(role).await?;
                Ok(0)
            }
            Err(err) => Err(self.log_err(role, err)),
        }
    }

    /// Full current content, used only for history reconciliation.
    /// Non-UTF-8 bytes (possible in the externally written log) are
    /// replaced rather than rejected.
    pub async fn read_all(&self, role: Role) -> Result<String, StoreError> {
        match fs::read(self.path(role)).await {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.create_empty(role).await?;
                Ok(String::new())
            }
            Err(err) => Err(self.log_err(role, err)),
        }
    }

    /// Exactly the bytes in `[from, to)`. `from == to` yields an empty
    /// buffer without touching the file.
    pub async fn read_range(&self, role: Role, from: u64, to: u64) -> Result<Vec<u8>, StoreError> {
        if to <= from {
            return Ok(Vec::new());
        }
        let mut file = match fs::File::open(self.path(role)).await {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.create_empty(role).await?;
                return Ok(Vec::new());
            }
            Err(err) => return Err(self.log_err(role, err)),
        };
        file.seek(io::SeekFrom::Start(from))
            .await
            .map_err(|source| self.log_err(role, source))?;
        let mut buf = Vec::with_capacity((to - from) as usize);
        file.take(to - from)
            .read_to_end(&mut buf)
            .await
            .map_err(|source| self.log_err(role, source))?;
        Ok(buf)
    }

    async fn create_empty(&self, role: Role) -> Result<(), StoreError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(role))
            .await
            .map(|_| ())
            .map_err(|source| self.log_err(role, source))
    }

    fn log_err(&self, role: Role, source: io::Error) -> StoreError {
        StoreError::Log { role, source }
    }
}
