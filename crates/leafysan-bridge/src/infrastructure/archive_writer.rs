//! Daily CSV archive on disk.
//!
//! [`ArchiveWriter`] owns the data directory.  Each tick appends one row to
//! the file for the current local day, writing the header first when the file
//! is new.  Dashboards read a whole day back through [`ArchiveWriter::read_day`].

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::debug;

use leafysan_core::ChannelValues;

use crate::application::archive::{archive_file_name, archive_record, ARCHIVE_HEADER};

/// Error type for archive file operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing archive at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV writer failed.
    #[error("failed to write archive row to {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Reads and appends the daily `data_Y-M-D.csv` files in one directory.
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    dir: PathBuf,
}

impl ArchiveWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the archive for `date`.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(archive_file_name(date))
    }

    /// Appends one row stamped with `now` to that day's file.
    ///
    /// Creates the data directory and the file as needed; a new (or empty)
    /// file gets the header row first.  Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Io`] if the directory or file cannot be
    /// created or opened, and [`ArchiveError::Csv`] if the row cannot be
    /// written.
    pub fn append(
        &self,
        now: NaiveDateTime,
        values: &ChannelValues,
    ) -> Result<PathBuf, ArchiveError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| ArchiveError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(now.date());
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ArchiveError::Io {
                path: path.clone(),
                source,
            })?;
        let is_new = file
            .metadata()
            .map_err(|source| ArchiveError::Io {
                path: path.clone(),
                source,
            })?
            .len()
            == 0;

        let csv_err = |source| ArchiveError::Csv {
            path: path.clone(),
            source,
        };
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            debug!("starting archive file {}", path.display());
            writer.write_record(ARCHIVE_HEADER).map_err(csv_err)?;
        }
        writer
            .write_record(archive_record(now.time(), values))
            .map_err(csv_err)?;
        writer.flush().map_err(|source| ArchiveError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }

    /// Reads the archive for `date`, or `None` when that day has no file.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Io`] for file-system errors other than
    /// "not found".
    pub fn read_day(&self, date: NaiveDate) -> Result<Option<String>, ArchiveError> {
        let path = self.path_for(date);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ArchiveError::Io { path, source }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
