//! File-system sink: destination directory, unique naming, streaming write, OS open.
//!
//! A failed write never leaves a partial file behind: on any error after the
//! file was created it is removed before the error is returned.

mod filename;

pub use filename::{DUPLICATE_SUFFIX_START, MAX_STEM_CHARS, build_book_filename};

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use crate::fetch::{ByteStream, FetchError};
use filename::numbered_filename;

/// Subdirectory of the user's download directory used by default.
const DEFAULT_SUBDIR: &str = "bookfetch";

/// Upper bound on duplicate suffixes tried before giving up.
const MAX_DUPLICATES: usize = 1000;

/// Errors raised while persisting or opening a file.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The destination directory could not be created.
    #[error("cannot create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Creating, writing, or flushing the file failed.
    #[error("write failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The body stream failed while writing.
    #[error("download of {} was interrupted: {source}", path.display())]
    Stream {
        path: PathBuf,
        #[source]
        source: FetchError,
    },

    /// Every duplicate name was taken.
    #[error("no free file name near {}", path.display())]
    NameExhausted { path: PathBuf },

    /// The OS default-application launcher could not be started.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SinkError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A file written by a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedFile {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Destination for downloaded bytes.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Writes `body` under a name derived from `filename`.
    ///
    /// Never overwrites: a taken name gets a numeric suffix.
    async fn persist(&self, body: ByteStream, filename: &str) -> Result<PersistedFile, SinkError>;

    /// Opens `path` with the OS default application.
    fn open(&self, path: &Path) -> Result<(), SinkError>;
}

/// [`Sink`] writing into one directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the first free `filename`, `filename_2`, `filename_3`, ...
    async fn create_unique(&self, filename: &str) -> Result<(File, PathBuf), SinkError> {
        let names = std::iter::once(filename.to_string()).chain(
            (DUPLICATE_SUFFIX_START..MAX_DUPLICATES).map(|n| numbered_filename(filename, n)),
        );
        for name in names {
            let path = self.dir.join(&name);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((file, path)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "name taken");
                }
                Err(e) => return Err(SinkError::io(path, e)),
            }
        }
        Err(SinkError::NameExhausted {
            path: self.dir.join(filename),
        })
    }
}

#[async_trait]
impl Sink for FileSink {
    #[instrument(skip(self, body), fields(dir = %self.dir.display()))]
    async fn persist(&self, body: ByteStream, filename: &str) -> Result<PersistedFile, SinkError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| SinkError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;

        let (file, path) = self.create_unique(filename).await?;
        match stream_to_file(file, body, &path).await {
            Ok(bytes) => {
                info!(path = %path.display(), bytes, "file saved");
                Ok(PersistedFile { path, bytes })
            }
            Err(error) => {
                debug!(path = %path.display(), "cleaning up partial file after error");
                if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %cleanup, "partial file cleanup failed");
                }
                Err(error)
            }
        }
    }

    fn open(&self, path: &Path) -> Result<(), SinkError> {
        open_with_default_app(path)
    }
}

async fn stream_to_file(file: File, mut body: ByteStream, path: &Path) -> Result<u64, SinkError> {
    let mut writer = BufWriter::new(file);
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|source| SinkError::Stream {
            path: path.to_path_buf(),
            source,
        })?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| SinkError::io(path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer.flush().await.map_err(|e| SinkError::io(path, e))?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(|e| SinkError::io(path, e))?;

    Ok(bytes_written)
}

/// Launches the platform's default-application opener without waiting for it.
fn open_with_default_app(path: &Path) -> Result<(), SinkError> {
    #[cfg(target_os = "macos")]
    let mut command = {
        let mut command = std::process::Command::new("open");
        command.arg(path);
        command
    };

    #[cfg(target_os = "windows")]
    let mut command = {
        let mut command = std::process::Command::new("cmd");
        command.args(["/C", "start", ""]).arg(path);
        command
    };

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = {
        let mut command = std::process::Command::new("xdg-open");
        command.arg(path);
        command
    };

    command
        .spawn()
        .map(|_| ())
        .map_err(|source| SinkError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// `<downloads>/bookfetch`, falling back to `~/Downloads/bookfetch`, then `./bookfetch`.
#[must_use]
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_SUBDIR)
}
